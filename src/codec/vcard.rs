//! vCard 3.0, the subset this tool writes.
//!
//! The reader is a two-state line machine (outside/inside a card) that
//! ignores anything it does not recognise, since vCard producers vary a lot.

use tracing::debug;

use super::{Decoded, Warning};
use crate::contact::Contact;
use crate::directory::Directory;
use crate::error::{Error, Result};
use crate::name;
use crate::phone::PhoneType;

const BEGIN_VCARD: &str = "BEGIN:VCARD";
const END_VCARD: &str = "END:VCARD";
const VERSION: &str = "VERSION:3.0";

pub fn encode(directory: &Directory) -> String {
    directory.contacts().iter().map(card).collect()
}

fn card(contact: &Contact) -> String {
    let mut lines = vec![
        BEGIN_VCARD.to_string(),
        VERSION.to_string(),
        format!("N:{};{};;;", contact.last_name, contact.first_name),
        format!("FN:{} {}", contact.first_name, contact.last_name),
        format!("TEL;TYPE={}:{}", contact.phone_type, contact.phone_number),
    ];
    if !contact.company.is_empty() {
        lines.push(format!("ORG:{}", contact.company));
    }
    if !contact.groups.is_empty() {
        lines.push(format!("CATEGORIES:{}", contact.groups.join(",")));
    }
    lines.push(END_VCARD.to_string());

    let mut out = lines.join("\n");
    out.push_str("\n\n");
    out
}

/// Decode raw bytes; input that is not UTF-8 is unreadable.
pub fn decode_bytes(input: &[u8], template: &Directory) -> Result<Decoded<Directory>> {
    let text = std::str::from_utf8(input)
        .map_err(|err| Error::Parse(format!("vCard stream is not valid UTF-8: {err}")))?;
    decode(text, template)
}

/// Decode cards against `template`'s group table. Categories that do not
/// name an existing group are dropped; groups are never created.
pub fn decode(input: &str, template: &Directory) -> Result<Decoded<Directory>> {
    let mut directory = template.empty_like();
    let mut warnings = Vec::new();
    let mut contacts = Vec::new();
    let mut pending: Option<PendingCard> = None;

    for raw_line in input.lines() {
        let line = raw_line.trim();

        if line.eq_ignore_ascii_case(BEGIN_VCARD) {
            if let Some(card) = pending.take() {
                contacts.push(card.finish());
            }
            pending = Some(PendingCard::default());
            continue;
        }
        if line.eq_ignore_ascii_case(END_VCARD) {
            if let Some(card) = pending.take() {
                contacts.push(card.finish());
            }
            continue;
        }

        let Some(card) = pending.as_mut() else {
            continue;
        };
        card.apply(line, &directory, &mut warnings);
    }

    if let Some(card) = pending.take() {
        contacts.push(card.finish());
    }

    directory.extend(contacts)?;
    debug!(
        contacts = directory.len(),
        warnings = warnings.len(),
        "decoded vCard stream"
    );

    Ok(Decoded {
        value: directory,
        warnings,
    })
}

#[derive(Debug, Default)]
struct PendingCard {
    contact: Contact,
    has_name: bool,
    has_phone: bool,
    formatted_name: Option<String>,
}

impl PendingCard {
    fn apply(&mut self, line: &str, directory: &Directory, warnings: &mut Vec<Warning>) {
        if let Some(value) = line.strip_prefix("N:") {
            let parts: Vec<&str> = value.split(';').collect();
            if parts.len() >= 2 {
                self.contact.last_name = parts[0].to_string();
                self.contact.first_name = parts[1].to_string();
                self.has_name = true;
            }
        } else if let Some(value) = line.strip_prefix("FN:") {
            self.formatted_name = Some(value.to_string());
        } else if line.starts_with("TEL;") || line.starts_with("TEL:") {
            if self.has_phone {
                return;
            }
            self.has_phone = true;
            if let Some(kind) = tel_type(line) {
                self.contact.phone_type = PhoneType::parse(kind);
            }
            if let Some((_, number)) = line.rsplit_once(':') {
                self.contact.phone_number = number.to_string();
            }
        } else if let Some(value) = line.strip_prefix("ORG:") {
            self.contact.company = value.to_string();
        } else if let Some(value) = line.strip_prefix("CATEGORIES:") {
            for category in value.split(',').map(str::trim).filter(|c| !c.is_empty()) {
                if directory.has_group(category) {
                    self.contact.groups.push(category.to_string());
                } else {
                    warnings.push(Warning::UnknownCategory(category.to_string()));
                }
            }
        }
    }

    fn finish(mut self) -> Contact {
        if !self.has_name {
            if let Some(formatted) = self.formatted_name.as_deref() {
                let (first, last) = name::resolve(formatted);
                self.contact.first_name = first;
                self.contact.last_name = last;
            }
        }
        self.contact
    }
}

/// Value of the `TYPE=` parameter, up to the next `:`, `;` or `,`.
fn tel_type(line: &str) -> Option<&str> {
    let (_, rest) = line.split_once("TYPE=")?;
    let end = rest.find([':', ';', ',']).unwrap_or(rest.len());
    let kind = &rest[..end];
    (!kind.is_empty()).then_some(kind)
}
