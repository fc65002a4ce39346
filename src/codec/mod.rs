//! Interchange formats for a [`Directory`](crate::directory::Directory).
//!
//! Both decoders are permissive: anything they cannot make sense of is
//! dropped and reported as a [`Warning`] next to the decoded value. Only
//! malformed XML or unreadable input is a hard error.

use std::fmt;
use std::path::Path;

use clap::ValueEnum;

use crate::directory::GroupId;

pub mod vcard;
pub mod xml;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// AddressBook XML
    Xml,
    /// vCard 3.0
    Vcard,
}

impl Format {
    /// Guess the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "xml" => Some(Format::Xml),
            "vcf" | "vcard" => Some(Format::Vcard),
            _ => None,
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Xml => f.write_str("xml"),
            Format::Vcard => f.write_str("vcard"),
        }
    }
}

/// A decoded value plus whatever was dropped along the way.
#[derive(Debug, Clone)]
pub struct Decoded<T> {
    pub value: T,
    pub warnings: Vec<Warning>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// A contact referenced a group id nothing resolves.
    UnknownGroupId(u32),
    /// A group reference that is not a number.
    InvalidGroupRef(String),
    /// A vCard category with no matching group.
    UnknownCategory(String),
    /// A group descriptor whose id was already taken by another group.
    GroupIdConflict { id: GroupId, name: String },
    /// The XML root element was not `AddressBook`.
    UnexpectedRoot(String),
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::UnknownGroupId(id) => write!(f, "dropped reference to unknown group id {id}"),
            Warning::InvalidGroupRef(raw) => write!(f, "dropped malformed group reference `{raw}`"),
            Warning::UnknownCategory(name) => write!(f, "dropped unknown category `{name}`"),
            Warning::GroupIdConflict { id, name } => {
                write!(f, "group `{name}` reassigned from id {id}, which was already in use")
            }
            Warning::UnexpectedRoot(name) => {
                write!(f, "expected <AddressBook> root element, found <{name}>")
            }
        }
    }
}
