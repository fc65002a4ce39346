//! The in-memory phone book: contacts plus the group table the file formats
//! reference by numeric id.

use std::fmt;

use crate::contact::Contact;
use crate::error::{Error, Result};

/// Ids 0-3 are reserved by the address-book file format.
pub const GROUP_ID_OFFSET: u32 = 4;

pub const DEFAULT_GROUPS: [&str; 7] = [
    "Blocklist",
    "Allowlist",
    "Work",
    "Friends",
    "Family",
    "Blacklist",
    "Whitelist",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupId(pub u32);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named tag. The id is assigned once, when the group is created, and
/// survives removal or reordering of other groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directory {
    contacts: Vec<Contact>,
    groups: Vec<Group>,
}

impl Default for Directory {
    fn default() -> Self {
        Self::with_groups(DEFAULT_GROUPS)
    }
}

impl Directory {
    /// An empty directory whose groups receive ids `4, 5, ...` in order.
    pub fn with_groups<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut directory = Self::without_groups();
        for name in names {
            directory.add_group(name);
        }
        directory
    }

    /// No contacts and no groups; the table is filled in from a file.
    pub(crate) fn without_groups() -> Self {
        Directory {
            contacts: Vec::new(),
            groups: Vec::new(),
        }
    }

    /// A directory with the same group table and no contacts.
    pub fn empty_like(&self) -> Self {
        Directory {
            contacts: Vec::new(),
            groups: self.groups.clone(),
        }
    }

    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    pub fn has_group(&self, name: &str) -> bool {
        self.groups.iter().any(|group| group.name == name)
    }

    pub fn group_name_to_id(&self, name: &str) -> Result<GroupId> {
        self.groups
            .iter()
            .find(|group| group.name == name)
            .map(|group| group.id)
            .ok_or_else(|| Error::UnknownGroup(name.to_string()))
    }

    /// Resolve a persisted id. Reserved and unknown ids resolve to `None`.
    pub fn group_id_to_name(&self, id: GroupId) -> Option<&str> {
        if id.0 < GROUP_ID_OFFSET {
            return None;
        }
        self.groups
            .iter()
            .find(|group| group.id == id)
            .map(|group| group.name.as_str())
    }

    /// One past the highest id in use. A file may have claimed `u32::MAX`,
    /// in which case the lowest unused id is handed out instead.
    fn next_group_id(&self) -> GroupId {
        let Some(highest) = self.groups.iter().map(|group| group.id.0).max() else {
            return GroupId(GROUP_ID_OFFSET);
        };
        match highest.checked_add(1) {
            Some(next) => GroupId(next.max(GROUP_ID_OFFSET)),
            None => self.lowest_free_group_id(),
        }
    }

    fn lowest_free_group_id(&self) -> GroupId {
        let mut taken: Vec<u32> = self.groups.iter().map(|group| group.id.0).collect();
        taken.sort_unstable();

        let mut candidate = GROUP_ID_OFFSET;
        for id in taken {
            if id == candidate {
                candidate = candidate.saturating_add(1);
            } else if id > candidate {
                break;
            }
        }
        GroupId(candidate)
    }

    /// Create a group, or return the id of the existing group with that name.
    pub fn add_group(&mut self, name: impl Into<String>) -> GroupId {
        let name = name.into();
        if let Ok(id) = self.group_name_to_id(&name) {
            return id;
        }
        let id = self.next_group_id();
        self.groups.push(Group { id, name });
        id
    }

    /// Register a group under a specific id, as read from a file. Returns
    /// `false` when the id is reserved or already taken.
    pub(crate) fn insert_group_with_id(&mut self, id: GroupId, name: &str) -> bool {
        if id.0 < GROUP_ID_OFFSET || self.groups.iter().any(|group| group.id == id) {
            return false;
        }
        self.groups.push(Group {
            id,
            name: name.to_string(),
        });
        true
    }

    /// Remove a group and every membership in it. Other ids are untouched.
    pub fn remove_group(&mut self, name: &str) -> Result<()> {
        let position = self
            .groups
            .iter()
            .position(|group| group.name == name)
            .ok_or_else(|| Error::UnknownGroup(name.to_string()))?;
        self.groups.remove(position);
        for contact in &mut self.contacts {
            contact.groups.retain(|group| group != name);
        }
        Ok(())
    }

    pub fn add_contact(&mut self, contact: Contact) -> Result<()> {
        let contact = self.admit(contact)?;
        self.contacts.push(contact);
        self.sort();
        Ok(())
    }

    /// Add several contacts, sorting once. Fails on the first contact with
    /// an unknown group and adds nothing in that case.
    pub fn extend<I>(&mut self, contacts: I) -> Result<()>
    where
        I: IntoIterator<Item = Contact>,
    {
        let admitted = contacts
            .into_iter()
            .map(|contact| self.admit(contact))
            .collect::<Result<Vec<_>>>()?;
        self.contacts.extend(admitted);
        self.sort();
        Ok(())
    }

    /// Replace the whole record at `index` (display order). Returns the
    /// previous record, or `None` when the index is out of range.
    pub fn replace_contact(&mut self, index: usize, contact: Contact) -> Result<Option<Contact>> {
        let contact = self.admit(contact)?;
        let Some(slot) = self.contacts.get_mut(index) else {
            return Ok(None);
        };
        let previous = std::mem::replace(slot, contact);
        self.sort();
        Ok(Some(previous))
    }

    pub fn remove_contact(&mut self, index: usize) -> Option<Contact> {
        if index < self.contacts.len() {
            Some(self.contacts.remove(index))
        } else {
            None
        }
    }

    pub fn find_by_phone(&self, number: &str) -> Option<&Contact> {
        self.contacts
            .iter()
            .find(|contact| contact.phone_number == number)
    }

    fn admit(&self, mut contact: Contact) -> Result<Contact> {
        contact.dedup_groups();
        if let Some(unknown) = contact.groups.iter().find(|group| !self.has_group(group)) {
            return Err(Error::UnknownGroup(unknown.clone()));
        }
        Ok(contact)
    }

    fn sort(&mut self) {
        self.contacts.sort_by_cached_key(Contact::sort_key);
    }
}
