//! Path-addressed JSON file persistence.

use serde_json::{Map, Value};
use std::path::PathBuf;

use crate::error::{Error, Result};

/// Persistence collaborator for the queue store.
///
/// Paths are slash-separated ("/queues/{id}", "/layout"); "/" addresses the
/// whole document.
pub trait PathStore: Send {
    /// Load the whole document, or None if nothing has been written yet.
    fn load(&self) -> Result<Option<Value>>;

    /// Write `value` at `path`, creating intermediate objects as needed.
    fn upsert(&mut self, path: &str, value: &Value) -> Result<()>;

    /// Remove the node at `path`. Fails with `Error::NotFound` if there is
    /// nothing there.
    fn delete(&mut self, path: &str) -> Result<()>;
}

/// [`PathStore`] backed by a single pretty-printed JSON file.
pub struct JsonFileDb {
    path: PathBuf,
}

impl JsonFileDb {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    fn read_document(&self) -> Result<Option<Value>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn write_document(&self, document: &Value) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(document)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

fn path_segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

impl PathStore for JsonFileDb {
    fn load(&self) -> Result<Option<Value>> {
        self.read_document()
    }

    fn upsert(&mut self, path: &str, value: &Value) -> Result<()> {
        let mut root = match self.read_document()? {
            Some(document) => document,
            None => Value::Object(Map::new()),
        };

        let segments = path_segments(path);
        match segments.split_last() {
            None => {
                // Root path replaces the whole document.
                root = value.clone();
            }
            Some((last, parents)) => {
                let mut node = &mut root;
                for segment in parents {
                    let map = node.as_object_mut().ok_or_else(|| {
                        Error::Store(format!("Path {} does not address an object", path))
                    })?;
                    node = map
                        .entry(segment.to_string())
                        .or_insert_with(|| Value::Object(Map::new()));
                }
                let map = node.as_object_mut().ok_or_else(|| {
                    Error::Store(format!("Path {} does not address an object", path))
                })?;
                map.insert(last.to_string(), value.clone());
            }
        }

        self.write_document(&root)
    }

    fn delete(&mut self, path: &str) -> Result<()> {
        let mut root = self
            .read_document()?
            .ok_or_else(|| Error::NotFound(format!("No data at {}", path)))?;

        let segments = path_segments(path);
        match segments.split_last() {
            None => {
                root = Value::Object(Map::new());
            }
            Some((last, parents)) => {
                let mut node = &mut root;
                for segment in parents {
                    node = node
                        .get_mut(*segment)
                        .ok_or_else(|| Error::NotFound(format!("No data at {}", path)))?;
                }
                let map = node.as_object_mut().ok_or_else(|| {
                    Error::Store(format!("Path {} does not address an object", path))
                })?;
                if map.remove(*last).is_none() {
                    return Err(Error::NotFound(format!("No data at {}", path)));
                }
            }
        }

        self.write_document(&root)
    }
}
