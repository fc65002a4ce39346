//! AddressBook XML.
//!
//! ```text
//! <AddressBook>
//!   <pbgroup><id>4</id><name>Blocklist</name></pbgroup>
//!   ...
//!   <Contact>
//!     <FirstName/> <LastName/>
//!     <Phone type="Mobile"><phonenumber/></Phone>
//!     <Group>6</Group>*
//!     <Company/>
//!   </Contact>
//! </AddressBook>
//! ```

use std::collections::HashMap;
use std::io;
use std::path::Path;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use tracing::debug;

use super::{Decoded, Warning};
use crate::contact::Contact;
use crate::directory::{Directory, GroupId, GROUP_ID_OFFSET};
use crate::error::{Error, Result};
use crate::phone::PhoneType;

const ROOT: &str = "AddressBook";
const GROUP_DESCRIPTOR: &str = "pbgroup";
const GROUP_DESCRIPTOR_ID: &str = "id";
const GROUP_DESCRIPTOR_NAME: &str = "name";
const CONTACT: &str = "Contact";
const FIRST_NAME: &str = "FirstName";
const LAST_NAME: &str = "LastName";
const PHONE: &str = "Phone";
const PHONE_TYPE_ATTR: &str = "type";
const PHONE_NUMBER: &str = "phonenumber";
const GROUP_REF: &str = "Group";
const COMPANY: &str = "Company";

pub fn encode(directory: &Directory) -> Result<Vec<u8>> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    emit(&mut writer, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    emit(&mut writer, Event::Start(BytesStart::new(ROOT)))?;

    for group in directory.groups() {
        emit(&mut writer, Event::Start(BytesStart::new(GROUP_DESCRIPTOR)))?;
        text_element(&mut writer, GROUP_DESCRIPTOR_ID, &group.id.to_string())?;
        text_element(&mut writer, GROUP_DESCRIPTOR_NAME, &group.name)?;
        emit(&mut writer, Event::End(BytesEnd::new(GROUP_DESCRIPTOR)))?;
    }

    for contact in directory.contacts() {
        emit(&mut writer, Event::Start(BytesStart::new(CONTACT)))?;
        text_element(&mut writer, FIRST_NAME, &contact.first_name)?;
        text_element(&mut writer, LAST_NAME, &contact.last_name)?;

        let mut phone = BytesStart::new(PHONE);
        phone.push_attribute((PHONE_TYPE_ATTR, contact.phone_type.as_str()));
        emit(&mut writer, Event::Start(phone))?;
        text_element(&mut writer, PHONE_NUMBER, &contact.phone_number)?;
        emit(&mut writer, Event::End(BytesEnd::new(PHONE)))?;

        let mut written: Vec<GroupId> = Vec::with_capacity(contact.groups.len());
        for group in &contact.groups {
            let id = directory.group_name_to_id(group)?;
            if written.contains(&id) {
                continue;
            }
            written.push(id);
            text_element(&mut writer, GROUP_REF, &id.to_string())?;
        }

        text_element(&mut writer, COMPANY, &contact.company)?;
        emit(&mut writer, Event::End(BytesEnd::new(CONTACT)))?;
    }

    emit(&mut writer, Event::End(BytesEnd::new(ROOT)))?;

    let mut bytes = writer.into_inner();
    bytes.push(b'\n');
    Ok(bytes)
}

fn emit(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<()> {
    writer.write_event(event).map_err(|err| {
        Error::io(
            Path::new("<xml buffer>"),
            io::Error::other(err.to_string()),
        )
    })
}

fn text_element(writer: &mut Writer<Vec<u8>>, name: &str, text: &str) -> Result<()> {
    emit(writer, Event::Start(BytesStart::new(name)))?;
    emit(writer, Event::Text(BytesText::new(text)))?;
    emit(writer, Event::End(BytesEnd::new(name)))
}

/// Decode an address book. A file carrying `pbgroup` descriptors defines
/// the whole group table; `template` only supplies groups for files that
/// have none.
pub fn decode(input: &[u8], template: &Directory) -> Result<Decoded<Directory>> {
    let root = parse_tree(input)?;
    let mut warnings = Vec::new();

    if root.name != ROOT {
        warnings.push(Warning::UnexpectedRoot(root.name.clone()));
    }

    let mut directory = if root.children_named(GROUP_DESCRIPTOR).next().is_some() {
        Directory::without_groups()
    } else {
        template.empty_like()
    };
    let file_groups = register_groups(&root, &mut directory, &mut warnings);

    let mut contacts = Vec::new();
    for element in root.children_named(CONTACT) {
        let phone = element.child(PHONE);
        let phone_type = phone
            .and_then(|phone| phone.attribute(PHONE_TYPE_ATTR))
            .filter(|kind| !kind.trim().is_empty())
            .map(PhoneType::parse)
            .unwrap_or_default();
        let phone_number = phone
            .map(|phone| phone.child_text(PHONE_NUMBER))
            .unwrap_or_default();

        let mut groups = Vec::new();
        for group_ref in element.children_named(GROUP_REF) {
            let raw = group_ref.text.trim();
            let Ok(id) = raw.parse::<u32>() else {
                warnings.push(Warning::InvalidGroupRef(raw.to_string()));
                continue;
            };
            let name = file_groups
                .get(&id)
                .map(String::as_str)
                .or_else(|| directory.group_id_to_name(GroupId(id)));
            match name {
                Some(name) => groups.push(name.to_string()),
                None => warnings.push(Warning::UnknownGroupId(id)),
            }
        }

        contacts.push(Contact {
            first_name: element.child_text(FIRST_NAME),
            last_name: element.child_text(LAST_NAME),
            phone_type,
            phone_number,
            groups,
            company: element.child_text(COMPANY),
        });
    }

    directory.extend(contacts)?;
    debug!(
        contacts = directory.len(),
        warnings = warnings.len(),
        "decoded address book XML"
    );

    Ok(Decoded {
        value: directory,
        warnings,
    })
}

/// Merge the file's group descriptors into `directory` and return the file's
/// own id-to-name table. The first descriptor for an id owns it.
fn register_groups(
    root: &Element,
    directory: &mut Directory,
    warnings: &mut Vec<Warning>,
) -> HashMap<u32, String> {
    let mut file_groups = HashMap::new();

    for descriptor in root.children_named(GROUP_DESCRIPTOR) {
        let name = descriptor.child_text(GROUP_DESCRIPTOR_NAME);
        let raw_id = descriptor.child_text(GROUP_DESCRIPTOR_ID);
        let id = match raw_id.trim().parse::<u32>() {
            Ok(id) if id >= GROUP_ID_OFFSET => id,
            _ => {
                warnings.push(Warning::InvalidGroupRef(raw_id));
                continue;
            }
        };
        if name.is_empty() {
            continue;
        }

        file_groups.entry(id).or_insert_with(|| name.clone());
        if directory.has_group(&name) {
            continue;
        }
        if !directory.insert_group_with_id(GroupId(id), &name) {
            directory.add_group(name.clone());
            warnings.push(Warning::GroupIdConflict {
                id: GroupId(id),
                name,
            });
        }
    }

    file_groups
}

/// Minimal element tree; the format is small enough to hold in memory.
#[derive(Debug, Default)]
struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    text: String,
    children: Vec<Element>,
}

impl Element {
    fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|child| child.name == name)
    }

    fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |child| child.name == name)
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Text of the first child called `name`; missing children read as "".
    fn child_text(&self, name: &str) -> String {
        self.child(name)
            .map(|child| child.text.clone())
            .unwrap_or_default()
    }
}

fn parse_tree(input: &[u8]) -> Result<Element> {
    let mut reader = Reader::from_reader(input);
    let mut buf = Vec::new();
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = reader.read_event_into(&mut buf).map_err(|err| {
            Error::Parse(format!("at byte {}: {err}", reader.buffer_position()))
        })?;
        match event {
            Event::Start(start) => stack.push(open_element(&start)?),
            Event::Empty(start) => {
                let element = open_element(&start)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| Error::Parse("unbalanced closing tag".to_string()))?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(text) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&text.unescape().map_err(Error::parse)?);
                }
            }
            Event::CData(data) => {
                if let Some(current) = stack.last_mut() {
                    current
                        .text
                        .push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if let Some(open) = stack.last() {
        return Err(Error::Parse(format!("unclosed element <{}>", open.name)));
    }
    root.ok_or_else(|| Error::Parse("document has no root element".to_string()))
}

fn open_element(start: &BytesStart<'_>) -> Result<Element> {
    let mut element = Element {
        name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
        ..Default::default()
    };
    for attribute in start.attributes() {
        let attribute = attribute.map_err(Error::parse)?;
        let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        let value = attribute.unescape_value().map_err(Error::parse)?.into_owned();
        element.attributes.push((key, value));
    }
    Ok(element)
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => return Err(Error::Parse("multiple root elements".to_string())),
    }
    Ok(())
}
