//! Filesystem cache backend.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tollgate_error::{CacheError, CacheErrorKind, TollgateResult};
use tollgate_interface::Cache;

use crate::namespace::escape_component;

/// On-disk record: the value plus optional metadata.
#[derive(Debug, Serialize, Deserialize)]
struct Record {
    value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    metadata: Option<Value>,
}

/// Cache storing one JSON file per key.
///
/// Layout: `{root}/{child}/.../{key}.json`, with child names percent-escaped
/// so every name gets its own directory. Writes go to a temporary file in
/// the same directory and are renamed into place, so readers never observe a
/// partially written entry.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use tollgate_cache::FileCache;
/// use tollgate_interface::Cache;
///
/// let dir = tempfile::tempdir().unwrap();
/// let cache = FileCache::new(dir.path()).unwrap();
/// let embeddings = cache.child("text-embedding-3-small");
///
/// embeddings.set("embedding_ab12", json!([0.1, 0.2]), None).unwrap();
/// assert_eq!(embeddings.get("embedding_ab12").unwrap(), Some(json!([0.1, 0.2])));
/// assert!(dir.path().join("text-embedding-3-small/embedding_ab12.json").exists());
/// ```
#[derive(Debug, Clone)]
pub struct FileCache {
    root: PathBuf,
}

impl FileCache {
    /// Open a cache rooted at `root`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the directory cannot be created.
    #[tracing::instrument(skip(root))]
    pub fn new(root: impl Into<PathBuf>) -> TollgateResult<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| io_error(&root, e))?;
        tracing::debug!(path = %root.display(), "Opened file cache");
        Ok(Self { root })
    }

    /// Directory holding this cache's entries.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> TollgateResult<PathBuf> {
        if !is_safe_component(key) {
            return Err(CacheError::new(CacheErrorKind::InvalidKey(key.to_string())).into());
        }
        Ok(self.root.join(format!("{}.json", key)))
    }

    fn read_record(&self, key: &str) -> TollgateResult<Option<Record>> {
        let path = self.path_for(key)?;
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error(&path, e).into()),
        };
        let record = serde_json::from_slice(&bytes).map_err(|e| {
            CacheError::new(CacheErrorKind::Decode(format!("{}: {}", path.display(), e)))
        })?;
        Ok(Some(record))
    }
}

/// Whether `name` maps onto exactly one path component.
fn is_safe_component(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}

fn io_error(path: &Path, e: std::io::Error) -> CacheError {
    CacheError::new(CacheErrorKind::Io(format!("{}: {}", path.display(), e)))
}

impl Cache for FileCache {
    fn has(&self, key: &str) -> TollgateResult<bool> {
        Ok(self.path_for(key)?.is_file())
    }

    fn get(&self, key: &str) -> TollgateResult<Option<Value>> {
        Ok(self.read_record(key)?.map(|record| record.value))
    }

    #[tracing::instrument(skip(self, value, metadata), fields(root = %self.root.display()))]
    fn set(&self, key: &str, value: Value, metadata: Option<Value>) -> TollgateResult<()> {
        let path = self.path_for(key)?;
        let body = serde_json::to_vec(&Record { value, metadata })
            .map_err(|e| CacheError::new(CacheErrorKind::Serialization(e.to_string())))?;

        std::fs::create_dir_all(&self.root).map_err(|e| io_error(&self.root, e))?;
        let mut temp =
            tempfile::NamedTempFile::new_in(&self.root).map_err(|e| io_error(&self.root, e))?;
        temp.write_all(&body).map_err(|e| io_error(temp.path(), e))?;
        temp.persist(&path).map_err(|e| io_error(&path, e.error))?;

        tracing::debug!(path = %path.display(), size = body.len(), "Stored cache entry");
        Ok(())
    }

    fn remove(&self, key: &str) -> TollgateResult<()> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(&path, e).into()),
        }
    }

    fn clear(&self) -> TollgateResult<()> {
        match std::fs::remove_dir_all(&self.root) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(io_error(&self.root, e).into()),
        }
        std::fs::create_dir_all(&self.root).map_err(|e| io_error(&self.root, e))?;
        tracing::info!(path = %self.root.display(), "Cleared file cache");
        Ok(())
    }

    fn child(&self, name: &str) -> Arc<dyn Cache> {
        // Created lazily on first write
        Arc::new(Self {
            root: self.root.join(&*escape_component(name)),
        })
    }
}
