//! Flat-file JSON store backing the crawl cache and the report ledger.
//!
//! Every pipeline stage persists its output as one named JSON document under
//! a fixed data directory, and the article ledger lives in the same place.
//! A document that does not exist yet is initialized to the empty-ledger
//! shape `{"items": []}` before its first read, so "file exists" and
//! "document is well-formed" always hold together.
//!
//! The store is deliberately not transactional: documents are read in full,
//! mutated in memory, and written back whole. The crawler is strictly
//! sequential, so the single-writer assumption holds without locking.

use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::models::SUCCESS_STATUS;

/// Errors raised by [`JsonStore`] operations.
///
/// I/O and parse faults are propagated to the caller rather than logged and
/// swallowed: the store holds the crawl state, and continuing with an
/// undefined document would corrupt the ledger.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on store document '{name}': {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSON in store document '{name}': {source}")]
    Json {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("store document '{name}' has no 'items' array to append to")]
    Shape { name: String },
}

/// A directory of named, pretty-printed JSON documents.
#[derive(Debug, Clone)]
pub struct JsonStore {
    dir: PathBuf,
}

impl JsonStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
            name: dir.display().to_string(),
            source,
        })?;
        info!(dir = %dir.display(), "Opened JSON store");
        Ok(Self { dir })
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }

    /// Read the document backing `name`, initializing a missing file to the
    /// empty-ledger shape first. Reading the same absent name twice yields
    /// the same empty document and creates exactly one file.
    #[instrument(level = "debug", skip(self))]
    pub fn read(&self, name: &str) -> Result<Value, StoreError> {
        let path = self.path_for(name);
        self.initialize_if_missing(name, &path)?;

        let raw = fs::read_to_string(&path).map_err(|source| StoreError::Io {
            name: name.to_string(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| StoreError::Json {
            name: name.to_string(),
            source,
        })
    }

    /// Overwrite the document backing `name` with `document`, pretty-printed
    /// and with non-ASCII characters preserved verbatim.
    #[instrument(level = "debug", skip(self, document))]
    pub fn write(&self, name: &str, document: &Value) -> Result<(), StoreError> {
        let path = self.path_for(name);
        self.initialize_if_missing(name, &path)?;

        let serialized =
            serde_json::to_string_pretty(document).map_err(|source| StoreError::Json {
                name: name.to_string(),
                source,
            })?;
        fs::write(&path, serialized).map_err(|source| StoreError::Io {
            name: name.to_string(),
            source,
        })?;
        debug!(name, path = %path.display(), "Wrote store document");
        Ok(())
    }

    /// Append `item` to the `items` sequence of the document backing `name`,
    /// writing the whole document back. Read-modify-write, not atomic.
    pub fn append_item(&self, name: &str, item: Value) -> Result<(), StoreError> {
        let mut document = self.read(name)?;
        let items = document
            .get_mut("items")
            .and_then(Value::as_array_mut)
            .ok_or_else(|| StoreError::Shape {
                name: name.to_string(),
            })?;
        items.push(item);
        self.write(name, &document)
    }

    /// Whether the document backing `name` already holds an item with this
    /// `url` and a success status. A non-200 record for the same URL does
    /// not count and will be retried on a later run.
    pub fn exists_with_success(&self, name: &str, url: &str) -> Result<bool, StoreError> {
        let document = self.read(name)?;
        let found = document
            .get("items")
            .and_then(Value::as_array)
            .map(|items| {
                items.iter().any(|item| {
                    item.get("url").and_then(Value::as_str) == Some(url)
                        && item.get("response").and_then(Value::as_u64)
                            == Some(SUCCESS_STATUS as u64)
                })
            })
            .unwrap_or(false);
        Ok(found)
    }

    fn initialize_if_missing(&self, name: &str, path: &Path) -> Result<(), StoreError> {
        if path.exists() {
            return Ok(());
        }
        info!(name, path = %path.display(), "Initializing empty store document");
        fs::write(path, "{\n    \"items\": []\n}").map_err(|source| StoreError::Io {
            name: name.to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn store() -> (TempDir, JsonStore) {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::open(dir.path()).unwrap();
        (dir, store)
    }

    #[test]
    fn test_read_initializes_missing_document() {
        let (dir, store) = store();

        let first = store.read("ledger").unwrap();
        let second = store.read("ledger").unwrap();

        assert_eq!(first, json!({"items": []}));
        assert_eq!(first, second);
        let files: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_write_read_round_trip_preserves_utf8() {
        let (_dir, store) = store();
        let document = json!({"items": [{"bezirk": "Neukölln", "headline": "Straßenraub"}]});

        store.write("ledger", &document).unwrap();
        assert_eq!(store.read("ledger").unwrap(), document);

        let raw = std::fs::read_to_string(store.path_for("ledger")).unwrap();
        assert!(raw.contains("Neukölln"));
        assert!(!raw.contains("\\u"));
    }

    #[test]
    fn test_write_accepts_bare_list_documents() {
        let (_dir, store) = store();
        let cache = json!(["/archiv/2019/", "/archiv/2020/"]);

        store.write("archives_by_year", &cache).unwrap();
        assert_eq!(store.read("archives_by_year").unwrap(), cache);
    }

    #[test]
    fn test_append_item_grows_items_in_order() {
        let (_dir, store) = store();

        store.append_item("ledger", json!({"url": "a"})).unwrap();
        store.append_item("ledger", json!({"url": "b"})).unwrap();

        let document = store.read("ledger").unwrap();
        let items = document["items"].as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["url"], "a");
        assert_eq!(items[1]["url"], "b");
    }

    #[test]
    fn test_append_item_rejects_itemless_document() {
        let (_dir, store) = store();
        store.write("cache", &json!(["just", "a", "list"])).unwrap();

        let err = store.append_item("cache", json!({"url": "a"})).unwrap_err();
        assert!(matches!(err, StoreError::Shape { .. }));
    }

    #[test]
    fn test_exists_with_success_requires_status_200() {
        let (_dir, store) = store();
        store
            .append_item("ledger", json!({"url": "X", "response": 200}))
            .unwrap();
        store
            .append_item("ledger", json!({"url": "Y", "response": 404}))
            .unwrap();

        assert!(store.exists_with_success("ledger", "X").unwrap());
        assert!(!store.exists_with_success("ledger", "Y").unwrap());
        assert!(!store.exists_with_success("ledger", "Z").unwrap());
    }

    #[test]
    fn test_read_rejects_malformed_document() {
        let (dir, store) = store();
        std::fs::write(dir.path().join("broken.json"), "{not json").unwrap();

        let err = store.read("broken").unwrap_err();
        assert!(matches!(err, StoreError::Json { .. }));
    }
}
