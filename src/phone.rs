use std::fmt;

/// Label attached to a contact's phone number.
///
/// The three known labels are matched case-insensitively; anything else a
/// file carries is kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PhoneType {
    Home,
    Work,
    #[default]
    Mobile,
    Other(String),
}

impl PhoneType {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "home" => PhoneType::Home,
            "work" => PhoneType::Work,
            "mobile" => PhoneType::Mobile,
            _ => PhoneType::Other(raw.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            PhoneType::Home => "Home",
            PhoneType::Work => "Work",
            PhoneType::Mobile => "Mobile",
            PhoneType::Other(label) => label,
        }
    }
}

impl fmt::Display for PhoneType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Checked in order, first match wins. "61" is the Australian country code
// and "2" a landline area digit; both mark a home number.
const HOME_PREFIXES: &[&str] = &["61", "2"];

/// Classify a raw number by its leading digits.
pub fn classify(raw: &str) -> PhoneType {
    if HOME_PREFIXES.iter().any(|prefix| raw.starts_with(*prefix)) {
        PhoneType::Home
    } else {
        PhoneType::Mobile
    }
}

/// Strip the prefix matched by [`classify`]. No validation is performed.
pub fn strip(raw: &str) -> String {
    HOME_PREFIXES
        .iter()
        .find_map(|prefix| raw.strip_prefix(*prefix))
        .unwrap_or(raw)
        .to_string()
}
