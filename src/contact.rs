use crate::name;
use crate::phone::{self, PhoneType};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Contact {
    pub first_name: String,
    pub last_name: String,
    pub phone_type: PhoneType,
    pub phone_number: String,
    /// Group names, not ids. Kept free of duplicates by the directory.
    pub groups: Vec<String>,
    pub company: String,
}

impl Contact {
    /// Build a contact from a free-form display name and a raw phone number,
    /// as found in third-party exports.
    pub fn from_raw(display_name: &str, raw_phone: &str, group: &str) -> Self {
        let (first_name, last_name) = name::resolve(display_name);
        Contact {
            first_name,
            last_name,
            phone_type: phone::classify(raw_phone),
            phone_number: phone::strip(raw_phone),
            groups: vec![group.to_string()],
            company: String::new(),
        }
    }

    /// `first last`, the string name searches run against. A missing half
    /// leaves no stray space, so a nameless contact yields "".
    pub fn full_name(&self) -> String {
        match (self.first_name.is_empty(), self.last_name.is_empty()) {
            (false, false) => format!("{} {}", self.first_name, self.last_name),
            (false, true) => self.first_name.clone(),
            (true, false) => self.last_name.clone(),
            (true, true) => String::new(),
        }
    }

    pub fn formatted_groups(&self) -> String {
        self.groups.join(", ")
    }

    pub(crate) fn dedup_groups(&mut self) {
        let mut seen: Vec<String> = Vec::with_capacity(self.groups.len());
        self.groups.retain(|group| {
            if seen.contains(group) {
                false
            } else {
                seen.push(group.clone());
                true
            }
        });
    }

    pub(crate) fn sort_key(&self) -> (String, String) {
        (self.last_name.to_lowercase(), self.first_name.to_lowercase())
    }
}
