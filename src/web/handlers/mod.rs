//! API handlers for the Web API.

pub mod files;
pub mod upload;

pub use files::*;
pub use upload::*;

use std::sync::Arc;

use crate::db::Database;
use crate::file::{BlobStore, ChunkAssembler, FileService};

/// Default maximum request body size (50MB).
const DEFAULT_MAX_UPLOAD_SIZE: u64 = 50 * 1024 * 1024;

/// Shared application state for the web layer.
pub struct AppState {
    /// Metadata store.
    pub db: Arc<Database>,
    /// Blob content store.
    pub blobs: BlobStore,
    /// Chunk staging and assembly.
    pub chunks: ChunkAssembler,
    /// Maximum request body size in bytes.
    pub max_upload_size: u64,
}

impl AppState {
    /// Create a new AppState.
    pub fn new(db: Arc<Database>, blobs: BlobStore, chunks: ChunkAssembler) -> Self {
        Self {
            db,
            blobs,
            chunks,
            max_upload_size: DEFAULT_MAX_UPLOAD_SIZE,
        }
    }

    /// Set the maximum request body size in bytes.
    pub fn with_max_upload_size(mut self, bytes: u64) -> Self {
        self.max_upload_size = bytes;
        self
    }

    /// Build a file service borrowing this state's stores.
    pub fn service(&self) -> FileService<'_> {
        FileService::new(&self.db, &self.blobs, &self.chunks)
    }
}
