//! File management module for Depot.
//!
//! This module provides the storage side of the depot:
//! - Blob storage with id-derived naming
//! - Chunked upload staging and assembly
//! - The file service tying storage and metadata together

mod chunks;
mod service;
mod storage;

pub use chunks::ChunkAssembler;
pub use service::FileService;
pub use storage::{BlobStore, DiskUsage};

/// Maximum length for a filename (in characters).
pub const MAX_FILENAME_LENGTH: usize = 255;

/// Maximum length for a remark (in characters).
pub const MAX_REMARK_LENGTH: usize = 1000;
