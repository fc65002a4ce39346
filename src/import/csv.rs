//! Import from a third-party CSV export.
//!
//! The export has a header row followed by rows where column 2 holds the
//! phone number and column 3 the display name. Rows are deduplicated by
//! normalized phone number against the directory and earlier rows.

use std::io::Read;

use ::csv::ReaderBuilder;
use tracing::{debug, info};

use super::ImportSummary;
use crate::contact::Contact;
use crate::directory::Directory;
use crate::error::{Error, Result};
use crate::phone;

const PHONE_COLUMN: usize = 2;
const NAME_COLUMN: usize = 3;
const MIN_COLUMNS: usize = 4;

#[derive(Debug, Clone)]
pub struct CsvOptions {
    /// Group every imported contact is placed in.
    pub group: String,
    pub delimiter: u8,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            group: "Work".to_string(),
            delimiter: b',',
        }
    }
}

pub fn import<R: Read>(
    input: R,
    directory: &mut Directory,
    options: &CsvOptions,
) -> Result<ImportSummary> {
    if !directory.has_group(&options.group) {
        return Err(Error::UnknownGroup(options.group.clone()));
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .delimiter(options.delimiter)
        .from_reader(input);

    let mut summary = ImportSummary::default();
    let mut fresh: Vec<Contact> = Vec::new();

    for (index, record) in reader.records().enumerate() {
        let record = record?;
        if record.len() < MIN_COLUMNS {
            // +2: one for the header, one for 1-based numbering.
            debug!(row = index + 2, columns = record.len(), "skipping short CSV row");
            continue;
        }

        let raw_phone = &record[PHONE_COLUMN];
        let number = phone::strip(raw_phone);
        let known = directory.find_by_phone(&number).is_some()
            || fresh.iter().any(|contact| contact.phone_number == number);
        if known {
            summary.duplicates += 1;
            continue;
        }

        fresh.push(Contact::from_raw(&record[NAME_COLUMN], raw_phone, &options.group));
        summary.added += 1;
    }

    directory.extend(fresh)?;
    info!(
        added = summary.added,
        duplicates = summary.duplicates,
        "CSV import finished"
    );
    Ok(summary)
}
