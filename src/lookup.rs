//! Key/value lookup capability backing the partner and entitlement tables.
//!
//! Both tables are read-only for the lifetime of the process. Values may hold
//! several comma-separated entries; adding the same key twice appends to the
//! existing value, matching how the tables were originally populated.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

/// A read-only lookup from key to an optional comma-separated value.
///
/// Keys are matched case-sensitively.
pub trait Lookup: Send + Sync {
    /// Returns the value stored under `key`, if any.
    fn lookup(&self, key: &str) -> Option<String>;
}

/// In-memory lookup table.
///
/// # Examples
///
/// ```
/// use feed_access::{Lookup, StaticLookup};
///
/// let table = StaticLookup::new()
///     .with("TargetBase", "Client")
///     .with("TargetBase", "Patient");
///
/// assert_eq!(table.lookup("TargetBase").as_deref(), Some("Client,Patient"));
/// assert_eq!(table.lookup("targetbase"), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticLookup {
    entries: HashMap<String, String>,
}

impl StaticLookup {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a value under `key`, appending with a comma if the key exists.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Adds a value under `key`, appending with a comma if the key exists.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let value = value.into();
        self.entries
            .entry(key.into())
            .and_modify(|existing| {
                existing.push(',');
                existing.push_str(&value);
            })
            .or_insert(value);
    }

    /// Builds a table from already-joined entries.
    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut table = Self::new();
        for (k, v) in entries {
            table.insert(k, v);
        }
        table
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the table has no keys.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Lookup for StaticLookup {
    fn lookup(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }
}

/// A value in a lookup file: either a single string or a list of strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FileValue {
    One(String),
    Many(Vec<String>),
}

impl FileValue {
    fn joined(self) -> String {
        match self {
            FileValue::One(v) => v,
            FileValue::Many(vs) => vs.join(","),
        }
    }
}

/// Lookup table persisted as a JSON object on disk.
///
/// Each key maps to either a string or a list of strings:
///
/// ```json
/// { "TargetBase": ["client", "patient"], "Acme": "client" }
/// ```
///
/// The file is read once on [`FileLookup::open`].
#[derive(Debug, Clone)]
pub struct FileLookup {
    path: PathBuf,
    table: StaticLookup,
}

impl FileLookup {
    /// Loads the table at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the file cannot be read or is not a JSON
    /// object of strings / string lists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let raw = std::fs::read_to_string(&path)
            .map_err(|e| Error::Config(format!("reading {}: {}", path.display(), e)))?;
        let parsed: BTreeMap<String, FileValue> = serde_json::from_str(&raw)
            .map_err(|e| Error::Config(format!("parsing {}: {}", path.display(), e)))?;

        let table = StaticLookup::from_entries(parsed.into_iter().map(|(k, v)| (k, v.joined())));
        tracing::debug!(path = %path.display(), keys = table.len(), "loaded lookup table");

        Ok(Self { path, table })
    }

    /// Path the table was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Lookup for FileLookup {
    fn lookup(&self, key: &str) -> Option<String> {
        self.table.lookup(key)
    }
}
