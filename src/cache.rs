//! Memoization of loaded datasets keyed by source content.
//!
//! The expensive step is parsing and deriving, not reading bytes, so every
//! lookup reads the source, fingerprints it and only runs the pipeline on a
//! miss. Entries live until [`DatasetCache::invalidate`] or
//! [`DatasetCache::clear`] ("refresh data").

use std::{collections::HashMap, fmt, path::Path, sync::Arc};

use log::{debug, info};
use sha2::{Digest, Sha256};

use crate::{config::SourceOptions, error::DataLoadError, io_utils, pipeline::Dataset};

/// SHA-256 over the source options and the source bytes, hex encoded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of(bytes: &[u8], options: &SourceOptions) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(options.signature().as_bytes());
        hasher.update([0u8]);
        hasher.update(bytes);
        Fingerprint(format!("{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn short(&self) -> &str {
        &self.0[..12.min(self.0.len())]
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Default)]
pub struct DatasetCache {
    entries: HashMap<Fingerprint, Arc<Dataset>>,
    loads: usize,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_load(
        &mut self,
        path: &Path,
        options: &SourceOptions,
    ) -> Result<Arc<Dataset>, DataLoadError> {
        let bytes = io_utils::read_source(path)?;
        debug!("Read {} byte(s) from '{}'", bytes.len(), path.display());
        self.get_or_load_bytes(&bytes, options)
    }

    /// Failed loads are not cached; the next call retries.
    pub fn get_or_load_bytes(
        &mut self,
        bytes: &[u8],
        options: &SourceOptions,
    ) -> Result<Arc<Dataset>, DataLoadError> {
        let fingerprint = Fingerprint::of(bytes, options);
        if let Some(hit) = self.entries.get(&fingerprint) {
            debug!("Dataset cache hit for {}", fingerprint.short());
            return Ok(Arc::clone(hit));
        }
        let dataset = Arc::new(Dataset::from_bytes(bytes, options, fingerprint.clone())?);
        self.loads += 1;
        info!("Cached dataset {}", fingerprint.short());
        self.entries.insert(fingerprint, Arc::clone(&dataset));
        Ok(dataset)
    }

    /// Drops one entry; outstanding `Arc`s stay valid.
    pub fn invalidate(&mut self, fingerprint: &Fingerprint) -> bool {
        let removed = self.entries.remove(fingerprint).is_some();
        if removed {
            info!("Invalidated dataset {}", fingerprint.short());
        }
        removed
    }

    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            info!("Cleared {} cached dataset(s)", self.entries.len());
        }
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of times the pipeline actually ran.
    pub fn loads(&self) -> usize {
        self.loads
    }
}
