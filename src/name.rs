//! Display-name heuristics.
//!
//! Turns loosely structured names such as `"Kate Katherine Jones (work)"`
//! into a `(first, last)` pair. Never fails: odd input degrades to a best
//! effort split.

/// Nickname to formal-name table used to drop a leading nickname.
const NICKNAMES: &[(&str, &[&str])] = &[
    ("kate", &["kathryn", "katherine", "kathleen"]),
    ("kathy", &["kathryn", "katherine"]),
    ("katie", &["katherine", "kathryn"]),
    ("beth", &["elizabeth"]),
    ("liz", &["elizabeth"]),
    ("lizzy", &["elizabeth"]),
    ("betty", &["elizabeth"]),
    ("meg", &["margaret"]),
    ("maggie", &["margaret"]),
    ("peggy", &["margaret"]),
    ("abby", &["abigail"]),
    ("gabby", &["gabriella"]),
    ("maddie", &["madeline"]),
    ("madi", &["madeleine"]),
    ("alex", &["alexandra", "alexandria"]),
    ("sandy", &["sandra"]),
    ("becky", &["rebecca"]),
    ("vicky", &["victoria"]),
    ("val", &["valerie"]),
    ("sue", &["susan"]),
    ("susie", &["susan"]),
    ("tom", &["thomas"]),
    ("sam", &["samuel"]),
    ("mike", &["michael"]),
    ("mick", &["michael"]),
    ("jim", &["james"]),
    ("jimmy", &["james"]),
    ("bob", &["robert"]),
    ("rob", &["robert"]),
    ("dick", &["richard"]),
    ("rick", &["richard"]),
    ("bill", &["william"]),
    ("will", &["william"]),
    ("matt", &["matthew"]),
    ("chris", &["christopher"]),
    ("tony", &["anthony"]),
    ("don", &["donald"]),
    ("ed", &["edward"]),
    ("ted", &["edward"]),
    ("joe", &["joseph"]),
    ("pete", &["peter"]),
    ("dan", &["daniel"]),
    ("danny", &["daniel"]),
    ("nick", &["nicholas"]),
    ("dave", &["david"]),
    ("steve", &["stephen", "steven"]),
    ("andy", &["andrew"]),
    ("drew", &["andrew"]),
    ("fred", &["frederick"]),
    ("ben", &["benjamin"]),
    ("charlie", &["charles"]),
    ("chuck", &["charles"]),
];

/// Resolve a raw display name into `(first, last)`.
pub fn resolve(raw: &str) -> (String, String) {
    let stripped = strip_parentheticals(raw);
    let mut parts: Vec<&str> = stripped.split_whitespace().collect();

    if parts.len() >= 2 && is_nickname_of(parts[0], parts[1]) {
        parts.remove(0);
    }

    let mut parts: Vec<String> = parts.into_iter().map(capitalize).collect();

    match parts.len() {
        0 => (String::new(), String::new()),
        1 => (parts.remove(0), String::new()),
        _ => {
            let last = parts.pop().unwrap_or_default();
            (parts.join(" "), last)
        }
    }
}

/// Remove every `(...)` annotation. An unmatched `(` is kept as text.
fn strip_parentheticals(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(open) = rest.find('(') {
        match rest[open..].find(')') {
            Some(close) => {
                out.push_str(&rest[..open]);
                rest = &rest[open + close + 1..];
            }
            None => break,
        }
    }
    out.push_str(rest);
    out
}

fn is_nickname_of(candidate: &str, next: &str) -> bool {
    let candidate = candidate.to_lowercase();
    let next = next.to_lowercase();

    let in_table = NICKNAMES
        .iter()
        .find(|(nick, _)| *nick == candidate)
        .map(|(_, formals)| formals.contains(&next.as_str()))
        .unwrap_or(false);

    in_table || (candidate.chars().count() >= 2 && next.contains(&candidate))
}

/// Upper-case the first letter, lower-case the rest.
fn capitalize(part: &str) -> String {
    let mut chars = part.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
