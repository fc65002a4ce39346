//! File-level operations on phone books: open, save, import and convert.
//!
//! Every function opens its file immediately before use and closes it before
//! returning; nothing holds on to a handle or to the directory.

use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::codec::{vcard, xml, Decoded, Format};
use crate::directory::Directory;
use crate::error::{Error, Result};
use crate::import::csv::{self, CsvOptions};
use crate::import::ImportSummary;
use crate::search::{self, Query, Visibility};

/// Read a phone book. `template` provides the group table the file's
/// references are resolved against.
pub fn open(path: &Path, format: Format, template: &Directory) -> Result<Decoded<Directory>> {
    let bytes = fs::read(path).map_err(|err| Error::io(path, err))?;
    let decoded = match format {
        Format::Xml => xml::decode(&bytes, template)?,
        Format::Vcard => vcard::decode_bytes(&bytes, template)?,
    };
    debug!(path = %path.display(), %format, contacts = decoded.value.len(), "opened phone book");
    Ok(decoded)
}

/// Encode and write atomically, creating parent directories as needed.
pub fn save(directory: &Directory, path: &Path, format: Format) -> Result<()> {
    let bytes = match format {
        Format::Xml => xml::encode(directory)?,
        Format::Vcard => vcard::encode(directory).into_bytes(),
    };
    write_atomic(path, &bytes)?;
    info!(path = %path.display(), %format, contacts = directory.len(), "saved phone book");
    Ok(())
}

/// Merge a CSV export into `directory`.
pub fn import_csv(
    directory: &mut Directory,
    path: &Path,
    options: &CsvOptions,
) -> Result<ImportSummary> {
    let file = File::open(path).map_err(|err| Error::io(path, err))?;
    csv::import(BufReader::new(file), directory, options)
}

/// Decode `source` into a transient directory and write it as `dest_format`.
///
/// `template` seeds the group table, which matters for vCard input: its
/// categories can only resolve to groups that already exist.
pub fn convert(
    source: &Path,
    source_format: Format,
    dest: &Path,
    dest_format: Format,
    template: &Directory,
) -> Result<Decoded<Directory>> {
    let decoded = open(source, source_format, template)?;
    save(&decoded.value, dest, dest_format)?;
    Ok(decoded)
}

pub fn query(directory: &Directory, query: &Query) -> Vec<Visibility> {
    search::filter(directory, query)
}

/// Write through a hidden sibling temp file and rename over the target.
pub fn write_atomic(target: &Path, data: &[u8]) -> Result<()> {
    let parent = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent).map_err(|err| Error::io(&parent, err))?;

    let file_name = target
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("phonebook");

    let mut counter: u32 = 0;
    let temp_path = loop {
        let candidate = if counter == 0 {
            parent.join(format!(".{file_name}.tmp"))
        } else {
            parent.join(format!(".{file_name}.{counter}.tmp"))
        };
        if !candidate.exists() {
            break candidate;
        }
        counter += 1;
    };

    let written = (|| {
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_path)?;
        file.write_all(data)?;
        file.sync_all()
    })();
    if let Err(err) = written {
        let _ = fs::remove_file(&temp_path);
        return Err(Error::io(&temp_path, err));
    }

    fs::rename(&temp_path, target).map_err(|err| {
        let _ = fs::remove_file(&temp_path);
        Error::io(target, err)
    })
}
