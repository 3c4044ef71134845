//! Credentials file loader.
//!
//! The file is plain text with one `KEY=VALUE` pair per line. Blank lines and lines
//! starting with `#` are ignored, lines without `=` are skipped, and both key and value
//! are trimmed. Only the first `=` splits, so values may themselves contain `=`.
//!
//! The loader does not check which keys are present; the session reports an absent
//! credential as `MissingCredential` at the step that needs it.
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::ScannerError;
use crate::result::Result;

/// Brokerage API key.
pub const API_KEY: &str = "API_KEY";
/// Brokerage API secret.
pub const SECRET_KEY: &str = "SECRET_KEY";
/// Path to the signing certificate.
pub const CA_PATH: &str = "CA_PATH";
/// Password of the signing certificate.
pub const CA_PASSWD: &str = "CA_PASSWD";

/// Default credentials file name, relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "config.txt";

/// Immutable key/value credentials loaded from a config file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    values: HashMap<String, String>,
}

impl Config {
    /// Load and parse the file at `path`.
    ///
    /// Fails with `ConfigNotFound` if the path does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScannerError::ConfigNotFound(path.to_path_buf()));
        }
        let file = File::open(path)?;
        Self::parse(BufReader::new(file))
    }

    /// Parse `KEY=VALUE` lines from a buffered reader.
    pub fn parse<R: BufRead>(reader: R) -> Result<Self> {
        let mut values = HashMap::new();

        for line_result in reader.lines() {
            let line = line_result.map_err(ScannerError::Io)?;
            let trimmed_line = line.trim();
            if trimmed_line.is_empty() || trimmed_line.starts_with('#') {
                continue;
            }
            if let Some((key, value)) = trimmed_line.split_once('=') {
                values.insert(key.trim().to_string(), value.trim().to_string());
            }
        }
        Ok(Config { values })
    }

    /// Value for `key`, if present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Value for `key`, or `MissingCredential` when absent or blank.
    pub fn require(&self, key: &str) -> Result<&str> {
        match self.get(key) {
            Some(value) if !value.is_empty() => Ok(value),
            _ => Err(ScannerError::MissingCredential(key.to_string())),
        }
    }

    /// Number of parsed entries.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the file contained no usable entries.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(String, String)> for Config {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Config {
            values: iter.into_iter().collect(),
        }
    }
}
