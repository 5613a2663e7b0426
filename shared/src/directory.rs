//! Stylist → calendar directory.
//!
//! Loaded once at cold start from deployment configuration and never mutated
//! afterwards. Keys are the canonical `stylist_<name>` slugs sent by the
//! booking form.

use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use crate::{Error, Result};

/// Immutable mapping from stylist identifier to calendar identifier.
#[derive(Debug, Clone)]
pub struct StylistDirectory {
    calendars: HashMap<String, String>,
}

impl StylistDirectory {
    /// Build a directory from `(stylist_id, calendar_id)` pairs.
    ///
    /// Rejects empty identifiers, duplicate stylist ids and empty directories.
    pub fn new<I, K, V>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut calendars = HashMap::new();

        for (stylist_id, calendar_id) in entries {
            let stylist_id = stylist_id.into();
            let calendar_id = calendar_id.into();

            if stylist_id.trim().is_empty() || calendar_id.trim().is_empty() {
                return Err(Error::Config(format!(
                    "Stylist directory entry \"{}\" has an empty identifier",
                    stylist_id
                )));
            }
            if calendars.insert(stylist_id.clone(), calendar_id).is_some() {
                return Err(Error::Config(format!(
                    "Stylist \"{}\" is listed more than once",
                    stylist_id
                )));
            }
        }

        if calendars.is_empty() {
            return Err(Error::Config("Stylist directory is empty".to_string()));
        }

        Ok(Self { calendars })
    }

    /// Parse a JSON object of `{"stylist_id": "calendar_id"}`.
    ///
    /// Entries are kept in file order, so a repeated key is rejected rather
    /// than silently overwritten.
    pub fn from_json(json: &str) -> Result<Self> {
        let entries: DirectoryEntries = serde_json::from_str(json)?;
        Self::new(entries.0)
    }

    /// Read and parse the directory file.
    pub async fn load(path: &Path) -> Result<Self> {
        let json = tokio::fs::read_to_string(path).await.map_err(|e| {
            Error::Config(format!(
                "Failed to read stylist directory {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&json)
    }

    /// Resolve a stylist id. Exact, case-sensitive match.
    pub fn calendar_for(&self, stylist_id: &str) -> Option<&str> {
        self.calendars.get(stylist_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.calendars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calendars.is_empty()
    }
}

/// Raw `(stylist_id, calendar_id)` pairs as they appear in the file.
struct DirectoryEntries(Vec<(String, String)>);

impl<'de> Deserialize<'de> for DirectoryEntries {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = DirectoryEntries;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object mapping stylist ids to calendar ids")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry::<String, String>()? {
                    entries.push(entry);
                }
                Ok(DirectoryEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}
