//! Key-value storage areas that hold site records.
//!
//! A storage area maps string keys to JSON values. Writes go through a
//! [`WriteBatch`] so that a record, the ordered index and the ID counter can
//! change together or not at all.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::{Error, Result};

/// A set of puts and deletes applied in one step
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    puts: Vec<(String, Value)>,
    deletes: Vec<String>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, key: impl Into<String>, value: Value) -> &mut Self {
        self.puts.push((key.into(), value));
        self
    }

    pub fn delete(&mut self, key: impl Into<String>) -> &mut Self {
        self.deletes.push(key.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.puts.is_empty() && self.deletes.is_empty()
    }

    /// Apply to an in-memory map. Puts land first, then deletes.
    fn apply_to(self, map: &mut BTreeMap<String, Value>) {
        for (k, v) in self.puts {
            map.insert(k, v);
        }
        for k in self.deletes {
            map.remove(&k);
        }
    }
}

/// Storage backend consumed by [`crate::SiteStore`]
pub trait StorageArea: Send {
    /// Read a single value
    fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Enumerate every key currently stored
    fn keys(&self) -> Result<Vec<String>>;

    /// Apply a batch atomically: on error nothing in it is visible
    fn apply(&mut self, batch: WriteBatch) -> Result<()>;
}

/// Storage area held entirely in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: BTreeMap<String, Value>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageArea for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.items.get(key).cloned())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.items.keys().cloned().collect())
    }

    fn apply(&mut self, batch: WriteBatch) -> Result<()> {
        batch.apply_to(&mut self.items);
        Ok(())
    }
}

/// Storage area persisted as a single JSON object on disk.
///
/// The file is read once on open. Each batch is written to a sibling temp
/// file which then replaces the original, so a crash mid-write leaves the
/// previous contents intact.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    items: BTreeMap<String, Value>,
}

impl FileStorage {
    /// Open the area at `path`. A missing file is an empty area.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let items = match fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => BTreeMap::new(),
            Ok(text) => serde_json::from_str(&text).map_err(|e| {
                Error::Storage(format!("Unreadable storage file {}: {}", path.display(), e))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, items })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, items: &BTreeMap<String, Value>) -> Result<()> {
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        let body = serde_json::to_vec_pretty(items)?;
        fs::write(&tmp, body)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl StorageArea for FileStorage {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.items.get(key).cloned())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.items.keys().cloned().collect())
    }

    fn apply(&mut self, batch: WriteBatch) -> Result<()> {
        let mut next = self.items.clone();
        batch.apply_to(&mut next);
        self.persist(&next)?;
        self.items = next;
        Ok(())
    }
}
