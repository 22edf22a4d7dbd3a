//! Blob storage for Depot.
//!
//! This module provides physical file storage:
//! - Id-derived blob naming (`<id><original extension>`)
//! - Durable write, streamed read, and delete operations
//! - Disk usage reporting for the backing volume

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::warn;

use crate::{DepotError, Result};

/// Blob storage service for managing stored file content.
///
/// Blobs live flat in one content directory; the namespace is already
/// unique because blob names are derived from server-generated UUIDs.
#[derive(Debug, Clone)]
pub struct BlobStore {
    /// Base directory for blob storage.
    base_path: PathBuf,
}

impl BlobStore {
    /// Create a new BlobStore with the given base path.
    ///
    /// The base directory will be created if it doesn't exist.
    pub fn new(base_path: impl Into<PathBuf>) -> Result<Self> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path)?;

        Ok(Self { base_path })
    }

    /// Get the base path of this store.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Get the full path for a stored name.
    pub fn file_path(&self, stored_name: &str) -> PathBuf {
        self.base_path.join(stored_name)
    }

    /// Write blob content, creating or overwriting.
    ///
    /// Returns only after the content is flushed to disk.
    pub fn write(&self, stored_name: &str, content: &[u8]) -> Result<()> {
        let path = self.file_path(stored_name);

        let mut file = fs::File::create(&path)?;
        file.write_all(content)?;
        file.sync_all()?;

        Ok(())
    }

    /// Open a blob for sequential reading from offset 0.
    pub async fn open(&self, stored_name: &str) -> Result<tokio::fs::File> {
        let path = self.file_path(stored_name);

        match tokio::fs::File::open(&path).await {
            Ok(file) => Ok(file),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(DepotError::NotFound(format!("blob {stored_name}")))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Read a whole blob into memory.
    pub fn read(&self, stored_name: &str) -> Result<Vec<u8>> {
        let path = self.file_path(stored_name);

        match fs::read(&path) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(DepotError::NotFound(format!("blob {stored_name}")))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Delete a blob.
    ///
    /// Returns `true` if the blob was deleted, `false` if it didn't
    /// exist (not an error).
    pub fn delete(&self, stored_name: &str) -> Result<bool> {
        let path = self.file_path(stored_name);

        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Check if a blob exists.
    pub fn exists(&self, stored_name: &str) -> bool {
        self.file_path(stored_name).exists()
    }

    /// Get the size of a stored blob.
    pub fn file_size(&self, stored_name: &str) -> Result<u64> {
        match fs::metadata(self.file_path(stored_name)) {
            Ok(m) => Ok(m.len()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(DepotError::NotFound(format!("blob {stored_name}")))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Report capacity of the volume backing the content directory.
    ///
    /// Any failure yields a zeroed report rather than an error.
    pub fn disk_usage(&self) -> DiskUsage {
        match rustix::fs::statvfs(&self.base_path) {
            Ok(stat) => {
                let total = stat.f_frsize * stat.f_blocks;
                let free = stat.f_frsize * stat.f_bavail;
                let used = total.saturating_sub(free);
                let percent = if total == 0 {
                    0.0
                } else {
                    used as f64 / total as f64 * 100.0
                };

                DiskUsage {
                    total,
                    used,
                    free,
                    percent,
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to stat content volume");
                DiskUsage::default()
            }
        }
    }
}

/// Capacity report for the content volume.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DiskUsage {
    /// Total volume capacity in bytes.
    pub total: u64,
    /// Used bytes.
    pub used: u64,
    /// Free bytes (available to unprivileged writers).
    pub free: u64,
    /// Used percentage of total.
    pub percent: f64,
}
