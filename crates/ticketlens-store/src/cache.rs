//! Content-addressed, get-or-compute result cache.
//!
//! Entries are keyed by the SHA-256 of a batch's texts and are permanent: an
//! entry is written once on a miss and only read afterwards. Nothing
//! invalidates entries; deleting files from the cache directory is the only
//! way to force recomputation.
//!
//! Storage is behind [`CacheBackend`] so the addressing scheme is independent
//! of where bytes live ([`FsBackend`] on disk, [`MemoryBackend`] for tests).

use std::collections::HashMap;
use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use ring::digest;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::StoreError;

/// Hit count interval between progress log lines.
const HIT_LOG_INTERVAL: u64 = 100;

/// Hex SHA-256 digest of a batch's texts joined by a single space.
///
/// Batches whose joined text is identical share a key, and therefore share
/// one cached result.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub const SEPARATOR: &'static str = " ";

    pub fn for_texts<'a, I>(texts: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut ctx = digest::Context::new(&digest::SHA256);
        for (i, text) in texts.into_iter().enumerate() {
            if i > 0 {
                ctx.update(Self::SEPARATOR.as_bytes());
            }
            ctx.update(text.as_bytes());
        }
        Self(hex::encode(ctx.finish()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Byte storage for cache entries.
pub trait CacheBackend {
    fn contains(&self, key: &CacheKey) -> Result<bool, StoreError>;
    fn load(&self, key: &CacheKey) -> Result<Vec<u8>, StoreError>;
    fn store(&mut self, key: &CacheKey, bytes: &[u8]) -> Result<(), StoreError>;
}

impl<B: CacheBackend + ?Sized> CacheBackend for &mut B {
    fn contains(&self, key: &CacheKey) -> Result<bool, StoreError> {
        (**self).contains(key)
    }

    fn load(&self, key: &CacheKey) -> Result<Vec<u8>, StoreError> {
        (**self).load(key)
    }

    fn store(&mut self, key: &CacheKey, bytes: &[u8]) -> Result<(), StoreError> {
        (**self).store(key, bytes)
    }
}

/// One file per key, named by the hex digest, inside a cache directory.
///
/// Writes go to a temporary file in the same directory and are renamed into
/// place, so a reader never sees a half-written entry from this process.
#[derive(Debug, Clone)]
pub struct FsBackend {
    dir: PathBuf,
}

impl FsBackend {
    /// Use `dir` as the cache directory, creating it if needed.
    pub fn open(dir: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(key.as_str())
    }
}

impl CacheBackend for FsBackend {
    fn contains(&self, key: &CacheKey) -> Result<bool, StoreError> {
        Ok(self.path_for(key).try_exists()?)
    }

    fn load(&self, key: &CacheKey) -> Result<Vec<u8>, StoreError> {
        Ok(std::fs::read(self.path_for(key))?)
    }

    fn store(&mut self, key: &CacheKey, bytes: &[u8]) -> Result<(), StoreError> {
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(self.path_for(key)).map_err(|e| e.error)?;
        Ok(())
    }
}

/// In-process backend.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    entries: HashMap<CacheKey, Vec<u8>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CacheBackend for MemoryBackend {
    fn contains(&self, key: &CacheKey) -> Result<bool, StoreError> {
        Ok(self.entries.contains_key(key))
    }

    fn load(&self, key: &CacheKey) -> Result<Vec<u8>, StoreError> {
        self.entries.get(key).cloned().ok_or_else(|| {
            StoreError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no cache entry {key}"),
            ))
        })
    }

    fn store(&mut self, key: &CacheKey, bytes: &[u8]) -> Result<(), StoreError> {
        self.entries.insert(key.clone(), bytes.to_vec());
        Ok(())
    }
}

/// Whether a lookup had to compute its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    Created,
    Reused,
}

/// Get-or-compute front end over a [`CacheBackend`], counting hits.
pub struct CacheStore<B> {
    backend: B,
    hits: u64,
    created: u64,
}

impl<B: CacheBackend> CacheStore<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            hits: 0,
            created: 0,
        }
    }

    /// Return the cached value for `key`, running `compute` and persisting
    /// its result first if no entry exists.
    ///
    /// The value is always read back from the backend, so fresh and reused
    /// results go through the same deserialization. An entry that does not
    /// deserialize is a [`StoreError::CorruptEntry`]; it is never recomputed
    /// silently.
    pub fn get_or_compute<T, E, F>(
        &mut self,
        key: &CacheKey,
        compute: F,
    ) -> Result<(T, CacheOutcome), E>
    where
        T: Serialize + DeserializeOwned,
        E: From<StoreError>,
        F: FnOnce() -> Result<T, E>,
    {
        let outcome = if self.backend.contains(key)? {
            CacheOutcome::Reused
        } else {
            debug!(key = %key, "creating cache entry");
            let value = compute()?;
            let bytes = serde_json::to_vec(&value).map_err(StoreError::from)?;
            self.backend.store(key, &bytes)?;
            self.created += 1;
            CacheOutcome::Created
        };

        let bytes = self.backend.load(key)?;
        let value = serde_json::from_slice(&bytes).map_err(|source| StoreError::CorruptEntry {
            key: key.to_string(),
            source,
        })?;

        if outcome == CacheOutcome::Reused {
            debug!(key = %key, "using cache entry");
            self.hits += 1;
            if self.hits % HIT_LOG_INTERVAL == 0 {
                self.summary();
            }
        }
        Ok((value, outcome))
    }

    /// Lookups answered from an existing entry.
    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// Entries written by this store.
    pub fn created(&self) -> u64 {
        self.created
    }

    pub fn summary(&self) {
        info!(hits = self.hits, "used {} cache files", self.hits);
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }
}
