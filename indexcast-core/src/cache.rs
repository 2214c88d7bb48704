// Per-domain URL snapshots, written by a crawl and read back for submission

use crate::error::CacheError;
use serde_json::Value;
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Named blobs of bytes. Writes replace the whole blob.
pub trait BlobStore {
    /// `Ok(None)` when no blob exists under `key`.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;
    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), CacheError>;
}

/// Blobs as files under a root directory, keys being relative paths.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, key: &str) -> Result<PathBuf, CacheError> {
        let relative = Path::new(key);
        let is_plain = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));

        if key.is_empty() || !is_plain {
            return Err(CacheError::Io {
                key: key.to_string(),
                source: io::Error::new(io::ErrorKind::InvalidInput, "key must be a relative path"),
            });
        }

        Ok(self.root.join(relative))
    }
}

impl BlobStore for FsBlobStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let path = self.path_for(key)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(CacheError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), CacheError> {
        let path = self.path_for(key)?;
        let io_err = |source| CacheError::Io {
            key: key.to_string(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        // Write beside the target, then rename over it
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let staging = path.with_file_name(format!(".{}.tmp", file_name));
        fs::write(&staging, bytes).map_err(io_err)?;
        fs::rename(&staging, &path).map_err(io_err)?;

        debug!(path = %path.display(), bytes = bytes.len(), "Wrote blob");
        Ok(())
    }
}

/// The URL snapshot of each domain, stored as a pretty-printed JSON array.
#[derive(Debug, Clone)]
pub struct UrlCache<S = FsBlobStore> {
    store: S,
}

impl<S: BlobStore> UrlCache<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn key(domain: &str) -> String {
        format!("indexnow/{}.json", domain)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Replace the domain's snapshot with `urls`.
    pub fn save(&self, domain: &str, urls: &BTreeSet<String>) -> Result<(), CacheError> {
        let key = Self::key(domain);
        let json = serde_json::to_vec_pretty(urls).map_err(|source| CacheError::Json {
            key: key.clone(),
            source,
        })?;
        self.store.put(&key, &json)
    }

    /// Read the domain's snapshot.
    ///
    /// `Ok(None)` means the domain was never crawled; `Ok(Some(vec![]))` means a
    /// crawl ran and found nothing. Non-string members are ignored.
    pub fn load(&self, domain: &str) -> Result<Option<Vec<String>>, CacheError> {
        let key = Self::key(domain);
        let Some(bytes) = self.store.get(&key)? else {
            return Ok(None);
        };

        let value: Value = serde_json::from_slice(&bytes).map_err(|source| CacheError::Json {
            key: key.clone(),
            source,
        })?;

        let members: Vec<Value> = match value {
            Value::Array(items) => items,
            // older snapshots were written as {"0": "...", "3": "..."}
            Value::Object(map) => map.into_iter().map(|(_, v)| v).collect(),
            _ => return Err(CacheError::Shape { key }),
        };

        Ok(Some(
            members
                .into_iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect(),
        ))
    }
}
