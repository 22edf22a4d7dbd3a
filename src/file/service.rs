//! File service for Depot.
//!
//! This module ties the metadata store, blob store and chunk assembler
//! together into the operations the API exposes:
//! - Single-shot and chunked upload
//! - Listing, rename, remark updates
//! - Download as a byte stream
//! - Single and bulk delete

use futures::future::join_all;
use tracing::{debug, warn};

use crate::db::{dot_extension, Database, DescriptorUpdate, FileDescriptor, FileRepository};
use crate::{DepotError, Result};

use super::chunks::ChunkAssembler;
use super::storage::{BlobStore, DiskUsage};
use super::{MAX_FILENAME_LENGTH, MAX_REMARK_LENGTH};

/// File service coordinating uploads and file operations.
pub struct FileService<'a> {
    db: &'a Database,
    blobs: &'a BlobStore,
    chunks: &'a ChunkAssembler,
}

impl<'a> FileService<'a> {
    /// Create a new FileService.
    pub fn new(db: &'a Database, blobs: &'a BlobStore, chunks: &'a ChunkAssembler) -> Self {
        Self { db, blobs, chunks }
    }

    fn repo(&self) -> FileRepository<'_> {
        FileRepository::new(self.db.pool())
    }

    /// Validate a user-supplied filename.
    fn validate_name(name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(DepotError::Validation("file name is empty".to_string()));
        }
        if name.chars().count() > MAX_FILENAME_LENGTH {
            return Err(DepotError::Validation(format!(
                "file name exceeds {MAX_FILENAME_LENGTH} characters"
            )));
        }
        Ok(())
    }

    /// Validate a user-supplied remark, normalizing empty to None.
    fn validate_remark(remark: Option<&str>) -> Result<Option<String>> {
        match remark {
            Some(r) if !r.trim().is_empty() => {
                if r.chars().count() > MAX_REMARK_LENGTH {
                    return Err(DepotError::Validation(format!(
                        "remark exceeds {MAX_REMARK_LENGTH} characters"
                    )));
                }
                Ok(Some(r.to_string()))
            }
            _ => Ok(None),
        }
    }

    /// Upload a file in one shot: write the blob, then register the
    /// descriptor. No staging is involved.
    pub async fn upload(
        &self,
        name: &str,
        mime_type: &str,
        remark: Option<&str>,
        content: &[u8],
    ) -> Result<FileDescriptor> {
        Self::validate_name(name)?;
        let remark = Self::validate_remark(remark)?;

        let mut descriptor = FileDescriptor::new(name, content.len() as i64, mime_type);
        descriptor.remark = remark;

        self.blobs.write(&descriptor.stored_name, content)?;

        if let Err(e) = self.repo().insert(&descriptor).await {
            // Best-effort cleanup of the just-written blob
            let _ = self.blobs.delete(&descriptor.stored_name);
            return Err(e);
        }

        debug!(id = %descriptor.id, name = %descriptor.name, size = descriptor.size, "File uploaded");
        Ok(descriptor)
    }

    /// Start a chunked upload session.
    pub fn begin_chunked(&self) -> Result<String> {
        self.chunks.begin_session()
    }

    /// Persist one chunk of an in-flight upload.
    pub fn push_chunk(&self, upload_id: &str, index: u32, content: &[u8]) -> Result<()> {
        self.chunks.write_chunk(upload_id, index, content)
    }

    /// Abandon an in-flight upload, discarding its staging area.
    pub fn abandon(&self, upload_id: &str) -> Result<()> {
        self.chunks.abandon(upload_id)
    }

    /// Finalize a chunked upload: assemble the staged chunks into a new
    /// blob in index order, then register the descriptor.
    ///
    /// The descriptor's size is the byte count actually assembled. If
    /// the metadata insert fails after assembly, the blob stays on disk
    /// without a record; this window is logged, not reconciled.
    pub async fn complete_chunked(
        &self,
        upload_id: &str,
        name: &str,
        mime_type: &str,
        total_chunks: u32,
        remark: Option<&str>,
    ) -> Result<FileDescriptor> {
        Self::validate_name(name)?;
        let remark = Self::validate_remark(remark)?;
        if total_chunks == 0 {
            return Err(DepotError::Validation(
                "total_chunks must be at least 1".to_string(),
            ));
        }

        let mut descriptor = FileDescriptor::new(name, 0, mime_type);
        descriptor.remark = remark;

        let dest = self.blobs.file_path(&descriptor.stored_name);
        let written = self.chunks.assemble(upload_id, total_chunks, &dest)?;
        descriptor.size = written as i64;

        if let Err(e) = self.repo().insert(&descriptor).await {
            warn!(
                stored_name = %descriptor.stored_name,
                error = %e,
                "Metadata insert failed after assembly; blob left orphaned"
            );
            return Err(e);
        }

        debug!(
            id = %descriptor.id,
            upload_id = %upload_id,
            chunks = total_chunks,
            size = descriptor.size,
            "Chunked upload completed"
        );
        Ok(descriptor)
    }

    /// List all stored files, newest first.
    pub async fn list(&self) -> Result<Vec<FileDescriptor>> {
        self.repo().list_all().await
    }

    /// Get one descriptor by id.
    pub async fn get(&self, id: &str) -> Result<FileDescriptor> {
        self.repo()
            .get_by_id(id)
            .await?
            .ok_or_else(|| DepotError::NotFound(format!("file {id}")))
    }

    /// Rename a file.
    ///
    /// If the new name's extension is missing or differs from the
    /// current one, the current extension is appended, so the stored
    /// blob name's extension always matches the visible name's.
    pub async fn rename(&self, id: &str, new_name: &str) -> Result<FileDescriptor> {
        Self::validate_name(new_name)?;

        let current = self.get(id).await?;

        let current_ext = dot_extension(&current.name);
        let new_ext = dot_extension(new_name);

        let name = if new_ext.is_empty() || new_ext != current_ext {
            format!("{new_name}{current_ext}")
        } else {
            new_name.to_string()
        };

        self.repo()
            .update(id, &DescriptorUpdate::new().name(name))
            .await?
            .ok_or_else(|| DepotError::NotFound(format!("file {id}")))
    }

    /// Update a file's remark. An empty remark clears it.
    pub async fn update_remark(&self, id: &str, remark: Option<&str>) -> Result<FileDescriptor> {
        let remark = Self::validate_remark(remark)?;

        self.repo()
            .update(id, &DescriptorUpdate::new().remark(remark))
            .await?
            .ok_or_else(|| DepotError::NotFound(format!("file {id}")))
    }

    /// Delete one file.
    ///
    /// The blob is removed best-effort first; the metadata record is
    /// authoritative and is removed even when the blob delete fails.
    pub async fn delete(&self, id: &str) -> Result<()> {
        let descriptor = self.get(id).await?;

        if let Err(e) = self.blobs.delete(&descriptor.stored_name) {
            warn!(stored_name = %descriptor.stored_name, error = %e, "Failed to delete blob");
        }

        self.repo().delete_many(&[descriptor.id]).await?;
        Ok(())
    }

    /// Delete several files at once.
    ///
    /// Blob deletions run in parallel and are fire-and-forget; the
    /// metadata records are removed in one atomic statement. Absent ids
    /// are ignored. Returns the number of records removed.
    pub async fn delete_many(&self, ids: &[String]) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let descriptors = self.repo().get_many(ids).await?;

        let deletions = descriptors.into_iter().map(|d| {
            let blobs = self.blobs.clone();
            tokio::task::spawn_blocking(move || {
                if let Err(e) = blobs.delete(&d.stored_name) {
                    warn!(stored_name = %d.stored_name, error = %e, "Failed to delete blob");
                }
            })
        });
        join_all(deletions).await;

        self.repo().delete_many(ids).await
    }

    /// Open a file for download.
    ///
    /// Returns the descriptor together with the blob opened at offset 0.
    pub async fn download(&self, id: &str) -> Result<(FileDescriptor, tokio::fs::File)> {
        let descriptor = self.get(id).await?;
        let file = self.blobs.open(&descriptor.stored_name).await?;
        Ok((descriptor, file))
    }

    /// Report capacity of the content volume.
    pub fn disk_usage(&self) -> DiskUsage {
        self.blobs.disk_usage()
    }
}
