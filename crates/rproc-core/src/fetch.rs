//! Firmware blob fetching
//!
//! Acquiring a processor kicks off an asynchronous fetch of its
//! firmware by name; the fetcher is the pluggable source of those
//! bytes. [`DirFetcher`] reads images from a directory on disk,
//! [`MemFetcher`] serves them from memory for tests and demos.

use std::collections::HashMap;
use std::path::PathBuf;

use parking_lot::RwLock;
use tracing::warn;

use crate::error::{Error, Result};

/// Source of firmware images, looked up by name.
///
/// `fetch` runs on the loader's worker thread and may block.
pub trait FirmwareFetcher: Send + Sync {
    fn fetch(&self, name: &str) -> Result<Vec<u8>>;
}

/// Fetch firmware images as files under a root directory.
#[derive(Debug, Clone)]
pub struct DirFetcher {
    root: PathBuf,
}

impl DirFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }
}

impl FirmwareFetcher for DirFetcher {
    fn fetch(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.root.join(name);
        std::fs::read(&path).map_err(|e| {
            warn!("can't read firmware {}: {}", path.display(), e);
            Error::FetchFailed {
                name: name.to_string(),
                reason: e.to_string(),
            }
        })
    }
}

/// In-memory firmware table for tests and demos.
#[derive(Debug, Default)]
pub struct MemFetcher {
    images: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) an image under `name`.
    pub fn insert(&self, name: impl Into<String>, bytes: Vec<u8>) {
        self.images.write().insert(name.into(), bytes);
    }
}

impl FirmwareFetcher for MemFetcher {
    fn fetch(&self, name: &str) -> Result<Vec<u8>> {
        self.images
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| Error::FetchFailed {
                name: name.to_string(),
                reason: "no such image".to_string(),
            })
    }
}
