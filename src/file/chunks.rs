//! Chunk staging and assembly for Depot.
//!
//! Each in-flight chunked upload owns a staging directory named after
//! its upload id, holding one `chunk-<index>` file per received chunk.
//! Chunks may arrive in any order and may be retried; assembly always
//! concatenates in index order. A chunk file is written to a `.part`
//! name and renamed into place, so finalize never observes a
//! half-written chunk.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use uuid::Uuid;

use crate::{DepotError, Result};

/// Manager for per-upload staging areas.
#[derive(Debug, Clone)]
pub struct ChunkAssembler {
    /// Base directory holding one subdirectory per upload session.
    staging_path: PathBuf,
}

impl ChunkAssembler {
    /// Create a new ChunkAssembler with the given staging path.
    ///
    /// The staging directory will be created if it doesn't exist.
    pub fn new(staging_path: impl Into<PathBuf>) -> Result<Self> {
        let staging_path = staging_path.into();
        fs::create_dir_all(&staging_path)?;

        Ok(Self { staging_path })
    }

    /// Get the base staging path.
    pub fn staging_path(&self) -> &Path {
        &self.staging_path
    }

    /// Allocate a fresh upload session with its staging directory.
    pub fn begin_session(&self) -> Result<String> {
        let upload_id = Uuid::new_v4().to_string();
        fs::create_dir_all(self.staging_path.join(&upload_id))?;

        debug!(upload_id = %upload_id, "Upload session started");
        Ok(upload_id)
    }

    /// Resolve the staging directory for an upload id.
    ///
    /// Upload ids are server-generated UUIDs; anything else (including
    /// path separators) is rejected before touching the filesystem.
    fn session_dir(&self, upload_id: &str) -> Result<PathBuf> {
        Uuid::parse_str(upload_id)
            .map_err(|_| DepotError::NotFound(format!("upload session {upload_id}")))?;
        Ok(self.staging_path.join(upload_id))
    }

    /// Persist one chunk into the session's staging area.
    ///
    /// Rewriting the same index overwrites it; out-of-order arrival is
    /// expected. The chunk becomes visible under its final name only
    /// once fully written and flushed.
    pub fn write_chunk(&self, upload_id: &str, index: u32, content: &[u8]) -> Result<()> {
        let dir = self.session_dir(upload_id)?;
        if !dir.is_dir() {
            return Err(DepotError::NotFound(format!("upload session {upload_id}")));
        }

        let part_path = dir.join(format!("chunk-{index}.part"));
        let final_path = dir.join(format!("chunk-{index}"));

        let mut file = fs::File::create(&part_path)?;
        file.write_all(content)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&part_path, &final_path)?;

        Ok(())
    }

    /// Concatenate chunks `0..total_chunks` in index order into `dest`.
    ///
    /// All indices are verified present before `dest` is created; a
    /// missing index aborts with `IncompleteUpload` and leaves `dest`
    /// absent. On success the staging directory is removed and the
    /// total number of bytes written is returned.
    pub fn assemble(&self, upload_id: &str, total_chunks: u32, dest: &Path) -> Result<u64> {
        let dir = self.session_dir(upload_id)?;
        if !dir.is_dir() {
            return Err(DepotError::NotFound(format!("upload session {upload_id}")));
        }

        // Verify completeness before creating the destination
        for index in 0..total_chunks {
            if !dir.join(format!("chunk-{index}")).is_file() {
                return Err(DepotError::IncompleteUpload { index });
            }
        }

        let written = match Self::concat_chunks(&dir, total_chunks, dest) {
            Ok(written) => written,
            Err(e) => {
                // Don't leave a partial destination behind
                let _ = fs::remove_file(dest);
                return Err(e);
            }
        };

        if let Err(e) = fs::remove_dir_all(&dir) {
            warn!(upload_id = %upload_id, error = %e, "Failed to remove staging directory");
        }

        debug!(upload_id = %upload_id, chunks = total_chunks, bytes = written, "Upload assembled");
        Ok(written)
    }

    /// Stream each chunk file into the destination, open-once and
    /// sequential. An individual chunk is bounded in size, the whole
    /// file is not, so chunks are never buffered together in memory.
    fn concat_chunks(dir: &Path, total_chunks: u32, dest: &Path) -> Result<u64> {
        let mut out = fs::File::create(dest)?;
        let mut written = 0u64;

        for index in 0..total_chunks {
            let mut chunk = fs::File::open(dir.join(format!("chunk-{index}")))?;
            written += io::copy(&mut chunk, &mut out)?;
        }

        out.sync_all()?;
        Ok(written)
    }

    /// Remove a session's staging area without producing a blob.
    ///
    /// Missing staging (already finalized or never begun) is a no-op.
    pub fn abandon(&self, upload_id: &str) -> Result<()> {
        let dir = self.session_dir(upload_id)?;

        match fs::remove_dir_all(&dir) {
            Ok(()) => {
                debug!(upload_id = %upload_id, "Upload session abandoned");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Check whether a session's staging directory exists.
    pub fn session_exists(&self, upload_id: &str) -> bool {
        self.session_dir(upload_id)
            .map(|dir| dir.is_dir())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, ChunkAssembler) {
        let temp_dir = TempDir::new().unwrap();
        let assembler = ChunkAssembler::new(temp_dir.path().join("staging")).unwrap();
        (temp_dir, assembler)
    }

    #[test]
    fn test_begin_session_creates_directory() {
        let (_temp_dir, assembler) = setup();

        let upload_id = assembler.begin_session().unwrap();

        assert!(assembler.session_exists(&upload_id));
    }

    #[test]
    fn test_write_chunk_unknown_session() {
        let (_temp_dir, assembler) = setup();

        let missing = Uuid::new_v4().to_string();
        let result = assembler.write_chunk(&missing, 0, b"data");
        assert!(matches!(result, Err(DepotError::NotFound(_))));
    }

    #[test]
    fn test_write_chunk_rejects_non_uuid_id() {
        let (_temp_dir, assembler) = setup();

        let result = assembler.write_chunk("../escape", 0, b"data");
        assert!(matches!(result, Err(DepotError::NotFound(_))));
    }

    #[test]
    fn test_assemble_in_index_order_regardless_of_arrival() {
        let (temp_dir, assembler) = setup();

        let upload_id = assembler.begin_session().unwrap();
        // Arrival order 1, 0 - assembly order must still be 0, 1
        assembler.write_chunk(&upload_id, 1, b"BB").unwrap();
        assembler.write_chunk(&upload_id, 0, b"AA").unwrap();

        let dest = temp_dir.path().join("out.bin");
        let written = assembler.assemble(&upload_id, 2, &dest).unwrap();

        assert_eq!(written, 4);
        assert_eq!(fs::read(&dest).unwrap(), b"AABB");
    }

    #[test]
    fn test_assemble_many_chunks_interleaved() {
        let (temp_dir, assembler) = setup();

        let upload_id = assembler.begin_session().unwrap();
        for index in [3u32, 0, 4, 1, 2] {
            let content = vec![b'a' + index as u8; 3];
            assembler.write_chunk(&upload_id, index, &content).unwrap();
        }

        let dest = temp_dir.path().join("out.bin");
        assembler.assemble(&upload_id, 5, &dest).unwrap();

        assert_eq!(fs::read(&dest).unwrap(), b"aaabbbcccdddeee");
    }

    #[test]
    fn test_rewrite_chunk_is_idempotent() {
        let (temp_dir, assembler) = setup();

        let upload_id = assembler.begin_session().unwrap();
        assembler.write_chunk(&upload_id, 0, b"old").unwrap();
        assembler.write_chunk(&upload_id, 0, b"new").unwrap();
        assembler.write_chunk(&upload_id, 1, b"!").unwrap();

        let dest = temp_dir.path().join("out.bin");
        assembler.assemble(&upload_id, 2, &dest).unwrap();

        assert_eq!(fs::read(&dest).unwrap(), b"new!");
    }

    #[test]
    fn test_assemble_missing_chunk_leaves_no_destination() {
        let (temp_dir, assembler) = setup();

        let upload_id = assembler.begin_session().unwrap();
        assembler.write_chunk(&upload_id, 0, b"AA").unwrap();
        assembler.write_chunk(&upload_id, 2, b"CC").unwrap();

        let dest = temp_dir.path().join("out.bin");
        let result = assembler.assemble(&upload_id, 3, &dest);

        assert!(matches!(
            result,
            Err(DepotError::IncompleteUpload { index: 1 })
        ));
        assert!(!dest.exists());
        // Staging survives so the client can resend and retry
        assert!(assembler.session_exists(&upload_id));
    }

    #[test]
    fn test_retry_after_incomplete_finalize() {
        let (temp_dir, assembler) = setup();

        let upload_id = assembler.begin_session().unwrap();
        assembler.write_chunk(&upload_id, 1, b"BB").unwrap();

        let dest = temp_dir.path().join("out.bin");
        assert!(assembler.assemble(&upload_id, 2, &dest).is_err());

        // Send the missing chunk and retry
        assembler.write_chunk(&upload_id, 0, b"AA").unwrap();
        assembler.assemble(&upload_id, 2, &dest).unwrap();

        assert_eq!(fs::read(&dest).unwrap(), b"AABB");
    }

    #[test]
    fn test_assemble_removes_staging() {
        let (temp_dir, assembler) = setup();

        let upload_id = assembler.begin_session().unwrap();
        assembler.write_chunk(&upload_id, 0, b"X").unwrap();

        let dest = temp_dir.path().join("out.bin");
        assembler.assemble(&upload_id, 1, &dest).unwrap();

        assert!(!assembler.session_exists(&upload_id));
    }

    #[test]
    fn test_assemble_unknown_session() {
        let (temp_dir, assembler) = setup();

        let dest = temp_dir.path().join("out.bin");
        let missing = Uuid::new_v4().to_string();
        let result = assembler.assemble(&missing, 1, &dest);

        assert!(matches!(result, Err(DepotError::NotFound(_))));
        assert!(!dest.exists());
    }

    #[test]
    fn test_abandon_removes_staging() {
        let (_temp_dir, assembler) = setup();

        let upload_id = assembler.begin_session().unwrap();
        assembler.write_chunk(&upload_id, 0, b"data").unwrap();

        assembler.abandon(&upload_id).unwrap();

        assert!(!assembler.session_exists(&upload_id));
    }

    #[test]
    fn test_abandon_missing_session_is_noop() {
        let (_temp_dir, assembler) = setup();

        let missing = Uuid::new_v4().to_string();
        assembler.abandon(&missing).unwrap();
    }

    #[test]
    fn test_empty_chunk_allowed() {
        let (temp_dir, assembler) = setup();

        let upload_id = assembler.begin_session().unwrap();
        assembler.write_chunk(&upload_id, 0, b"").unwrap();

        let dest = temp_dir.path().join("out.bin");
        let written = assembler.assemble(&upload_id, 1, &dest).unwrap();

        assert_eq!(written, 0);
        assert_eq!(fs::read(&dest).unwrap(), b"");
    }

    #[test]
    fn test_no_part_files_visible_after_write() {
        let (_temp_dir, assembler) = setup();

        let upload_id = assembler.begin_session().unwrap();
        assembler.write_chunk(&upload_id, 0, b"data").unwrap();

        let dir = assembler.staging_path().join(&upload_id);
        let names: Vec<String> = fs::read_dir(&dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();

        assert_eq!(names, vec!["chunk-0".to_string()]);
    }
}
