//! Error taxonomy shared by the codecs, the CSV importer and the directory.
//!
//! Name and phone normalization never fail; everything else reports the
//! first error it hits through [`Error`].

use std::fmt::Display;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Opening, creating, reading or writing a file failed.
    #[error("I/O failure on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Malformed XML or an unreadable vCard stream.
    #[error("parse failure: {0}")]
    Parse(String),

    /// The CSV decoder rejected the structure of a row.
    #[error("CSV format failure: {0}")]
    Format(String),

    /// A contact references a group the directory does not know.
    #[error("unknown group `{0}`")]
    UnknownGroup(String),
}

impl Error {
    pub fn io(path: &Path, source: io::Error) -> Self {
        Error::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn parse(err: impl Display) -> Self {
        Error::Parse(err.to_string())
    }
}

/// Row-level decoder errors are format failures; an I/O error underneath
/// the CSV reader stays an I/O failure.
impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        if err.is_io_error() {
            if let csv::ErrorKind::Io(source) = err.into_kind() {
                return Error::io(Path::new("<csv stream>"), source);
            }
            return Error::Format("CSV stream failed".to_string());
        }
        Error::Format(err.to_string())
    }
}
