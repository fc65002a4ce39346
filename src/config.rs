use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use directories::BaseDirs;
use serde::Deserialize;

use crate::directory::{Directory, DEFAULT_GROUPS};
use crate::import::csv::CsvOptions;

const CONFIG_FILE_NAME: &str = "config.toml";
const APP_NAME: &str = "phonebooker";

#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Where the configuration was read from, if a file existed.
    pub config_path: Option<PathBuf>,
    /// Default phone book used when `--book` is not given.
    pub book: Option<PathBuf>,
    /// Groups appended to the default list for every directory.
    pub extra_groups: Vec<String>,
    pub import: CsvOptions,
}

impl Config {
    /// An empty directory carrying the default and configured groups.
    pub fn template(&self) -> Directory {
        Directory::with_groups(
            DEFAULT_GROUPS
                .iter()
                .map(|name| name.to_string())
                .chain(self.extra_groups.iter().cloned()),
        )
    }
}

// =============================================================================
// File Deserialization
// =============================================================================

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    book: Option<PathBuf>,
    extra_groups: Vec<String>,
    import: ImportFile,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ImportFile {
    group: Option<String>,
    delimiter: Option<String>,
}

impl ImportFile {
    fn into_options(self) -> Result<CsvOptions> {
        let mut options = CsvOptions::default();
        if let Some(group) = self.group {
            let group = group.trim();
            if group.is_empty() {
                bail!("import.group must not be empty");
            }
            options.group = group.to_string();
        }
        if let Some(delimiter) = self.delimiter {
            let bytes = delimiter.as_bytes();
            if bytes.len() != 1 {
                bail!(
                    "import.delimiter must be a single ASCII character, got {:?}",
                    delimiter
                );
            }
            options.delimiter = bytes[0];
        }
        Ok(options)
    }
}

/// Expand ~ to home directory in paths
fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Some(home) = home::home_dir() {
            return home.join(stripped);
        }
    }
    path.to_path_buf()
}

fn config_root() -> Result<PathBuf> {
    let base = BaseDirs::new().context("unable to determine base directories")?;
    Ok(base.config_dir().join(APP_NAME))
}

pub fn default_config_path() -> Result<PathBuf> {
    Ok(config_root()?.join(CONFIG_FILE_NAME))
}

/// Load configuration. An explicit path must exist; the default location
/// may be absent, in which case defaults apply.
pub fn load(explicit: Option<&Path>) -> Result<Config> {
    let path = match explicit {
        Some(path) => {
            if !path.exists() {
                bail!("configuration file not found at {}", path.display());
            }
            path.to_path_buf()
        }
        None => {
            let path = default_config_path()?;
            if !path.exists() {
                return Ok(Config::default());
            }
            path
        }
    };

    let raw = fs::read_to_string(&path)
        .with_context(|| format!("failed to read configuration file at {}", path.display()))?;
    let mut config = parse(&raw).with_context(|| format!("invalid configuration in {}", path.display()))?;
    config.config_path = Some(path);
    Ok(config)
}

fn parse(raw: &str) -> Result<Config> {
    let value: toml::Value = toml::from_str(raw).context("failed to parse configuration as TOML")?;

    warn_unknown_keys(&value);

    let file: ConfigFile = value
        .try_into()
        .context("failed to deserialize configuration")?;

    let extra_groups = file
        .extra_groups
        .into_iter()
        .map(|group| group.trim().to_string())
        .filter(|group| !group.is_empty())
        .collect();

    Ok(Config {
        config_path: None,
        book: file.book.as_deref().map(expand_tilde),
        extra_groups,
        import: file.import.into_options()?,
    })
}

// =============================================================================
// Unknown key warnings
// =============================================================================

fn warn_unknown_keys(value: &toml::Value) {
    let Some(table) = value.as_table() else {
        return;
    };

    let known = HashSet::from(["book", "extra_groups", "import"]);
    for key in table.keys() {
        if !known.contains(key.as_str()) {
            eprintln!("warning: unknown configuration key `{}`", key);
        }
    }

    if let Some(import) = table.get("import").and_then(|v| v.as_table()) {
        let known = HashSet::from(["group", "delimiter"]);
        for key in import.keys() {
            if !known.contains(key.as_str()) {
                eprintln!("warning: unknown configuration key `import.{}`", key);
            }
        }
    }
}
