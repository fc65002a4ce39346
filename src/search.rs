//! Field-scoped exact and fuzzy matching over a directory.

use std::collections::BTreeSet;

use clap::ValueEnum;
use serde::Serialize;
use strsim::normalized_levenshtein;

use crate::contact::Contact;
use crate::directory::Directory;

/// Minimum token-set score (0-100) for a fuzzy match.
pub const FUZZY_THRESHOLD: u8 = 75;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Scope {
    #[default]
    All,
    Name,
    Phone,
    Company,
    Groups,
}

#[derive(Debug, Clone, Default)]
pub struct Query {
    pub text: String,
    pub scope: Scope,
    pub case_sensitive: bool,
    pub exact: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Visibility {
    pub index: usize,
    pub visible: bool,
}

enum Field {
    Text(String),
    Phone(String),
}

/// One entry per contact, in directory order.
pub fn filter(directory: &Directory, query: &Query) -> Vec<Visibility> {
    let needle = fold_case(&query.text, query.case_sensitive);
    directory
        .contacts()
        .iter()
        .enumerate()
        .map(|(index, contact)| Visibility {
            index,
            visible: is_visible(contact, &needle, query),
        })
        .collect()
}

/// `needle` must already be case-folded according to `query`.
fn is_visible(contact: &Contact, needle: &str, query: &Query) -> bool {
    let name_exact = query.scope == Scope::Name && query.exact;
    if needle.is_empty() && !name_exact {
        return true;
    }

    if query.scope == Scope::Name {
        let full_name = fold_case(&contact.full_name(), query.case_sensitive);
        return if query.exact {
            full_name == needle
        } else {
            token_set_ratio(needle, &full_name) >= FUZZY_THRESHOLD
        };
    }

    fields(contact, query.scope).into_iter().any(|field| match field {
        Field::Phone(value) => {
            let value = fold_case(&value, query.case_sensitive);
            if query.exact {
                value == needle
            } else {
                value.contains(needle)
            }
        }
        Field::Text(value) => {
            let value = fold_case(&value, query.case_sensitive);
            if query.exact {
                value == needle
            } else {
                token_set_ratio(needle, &value) >= FUZZY_THRESHOLD
            }
        }
    })
}

fn fields(contact: &Contact, scope: Scope) -> Vec<Field> {
    match scope {
        Scope::All => vec![
            Field::Text(contact.first_name.clone()),
            Field::Text(contact.last_name.clone()),
            Field::Text(contact.phone_type.to_string()),
            Field::Phone(contact.phone_number.clone()),
            Field::Text(contact.formatted_groups()),
            Field::Text(contact.company.clone()),
        ],
        Scope::Name => vec![Field::Text(contact.full_name())],
        Scope::Phone => vec![Field::Phone(contact.phone_number.clone())],
        Scope::Company => vec![Field::Text(contact.company.clone())],
        Scope::Groups => vec![Field::Text(contact.formatted_groups())],
    }
}

fn fold_case(value: &str, case_sensitive: bool) -> String {
    if case_sensitive {
        value.to_string()
    } else {
        value.to_lowercase()
    }
}

/// Token-set similarity, 0-100.
///
/// Both sides are lower-cased, so fuzzy scoring ignores case even for a
/// case-sensitive query; case only matters for exact and phone matching.
/// Each side is split into alphanumeric tokens and deduplicated. When one
/// token set contains the other the score is 100; otherwise the shared tokens
/// are compared against each side's full token list and the best pairwise
/// score wins. Word order and repetition therefore do not matter.
pub fn token_set_ratio(a: &str, b: &str) -> u8 {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    let left = tokens(&a);
    let right = tokens(&b);
    if left.is_empty() || right.is_empty() {
        return 0;
    }

    let common: Vec<&str> = left.intersection(&right).copied().collect();
    let only_left: Vec<&str> = left.difference(&right).copied().collect();
    let only_right: Vec<&str> = right.difference(&left).copied().collect();

    if !common.is_empty() && (only_left.is_empty() || only_right.is_empty()) {
        return 100;
    }

    let base = common.join(" ");
    let with_left = join_words(&base, &only_left);
    let with_right = join_words(&base, &only_right);

    [
        ratio(&base, &with_left),
        ratio(&base, &with_right),
        ratio(&with_left, &with_right),
    ]
    .into_iter()
    .max()
    .unwrap_or(0)
}

fn tokens(value: &str) -> BTreeSet<&str> {
    value
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .collect()
}

fn join_words(base: &str, extra: &[&str]) -> String {
    let extra = extra.join(" ");
    match (base.is_empty(), extra.is_empty()) {
        (true, _) => extra,
        (false, true) => base.to_string(),
        (false, false) => format!("{base} {extra}"),
    }
}

fn ratio(a: &str, b: &str) -> u8 {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    (normalized_levenshtein(a, b) * 100.0).round() as u8
}
