//! One-time import of the legacy flat-file metadata export.
//!
//! Earlier deployments kept all file metadata in a single JSON array on
//! disk. The import runs on every start but only does work when the
//! `files` table is empty and the export file exists, so it is safe to
//! call unconditionally. Legacy data is best-effort: a record that fails
//! to import is logged and skipped, the rest still commit.

use std::path::Path;

use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use super::{FileDescriptor, FileRepository};
use crate::{DepotError, Result};

/// One record of the legacy JSON export, in the shape the old system
/// wrote (camelCase keys, `path` holding the blob name).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyRecord {
    id: String,
    name: String,
    size: i64,
    #[serde(rename = "type")]
    mime_type: String,
    upload_date: String,
    #[serde(default)]
    remark: Option<String>,
    path: String,
}

impl From<LegacyRecord> for FileDescriptor {
    fn from(record: LegacyRecord) -> Self {
        FileDescriptor {
            id: record.id,
            name: record.name,
            size: record.size,
            mime_type: record.mime_type,
            uploaded_at: record.upload_date,
            remark: record.remark,
            stored_name: record.path,
        }
    }
}

/// Import the legacy export at `json_path` if the `files` table is empty.
///
/// Returns the number of records imported (0 when the gate does not
/// fire). Individual record failures are logged and skipped.
pub async fn import_if_empty(pool: &SqlitePool, json_path: impl AsRef<Path>) -> Result<u64> {
    let json_path = json_path.as_ref();
    let repo = FileRepository::new(pool);

    if repo.count().await? > 0 {
        debug!("Metadata store is not empty, skipping legacy import");
        return Ok(0);
    }

    if !json_path.exists() {
        debug!("No legacy export at {:?}, skipping import", json_path);
        return Ok(0);
    }

    let content = std::fs::read_to_string(json_path)?;
    let records: Vec<LegacyRecord> = serde_json::from_str(&content)
        .map_err(|e| DepotError::Validation(format!("legacy export: {e}")))?;

    if records.is_empty() {
        return Ok(0);
    }

    info!(
        "Importing {} records from legacy export {:?}",
        records.len(),
        json_path
    );

    let mut imported = 0u64;
    for record in records {
        let descriptor = FileDescriptor::from(record);
        match repo.insert(&descriptor).await {
            Ok(()) => imported += 1,
            Err(e) => {
                warn!(id = %descriptor.id, error = %e, "Skipping legacy record");
            }
        }
    }

    info!("Legacy import complete ({imported} records)");
    Ok(imported)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    const LEGACY_JSON: &str = r#"[
        {
            "id": "0191e4a0-0000-7000-8000-000000000001",
            "name": "notes.txt",
            "size": 12,
            "type": "text/plain",
            "uploadDate": "2024-03-01T10:00:00.000Z",
            "remark": "first",
            "path": "0191e4a0-0000-7000-8000-000000000001.txt"
        },
        {
            "id": "0191e4a0-0000-7000-8000-000000000002",
            "name": "photo.png",
            "size": 2048,
            "type": "image/png",
            "uploadDate": "2024-03-02T10:00:00.000Z",
            "remark": "",
            "path": "0191e4a0-0000-7000-8000-000000000002.png"
        },
        {
            "id": "0191e4a0-0000-7000-8000-000000000003",
            "name": "archive",
            "size": 0,
            "type": "application/octet-stream",
            "uploadDate": "2024-03-03T10:00:00.000Z",
            "path": "0191e4a0-0000-7000-8000-000000000003"
        }
    ]"#;

    fn write_export(dir: &tempfile::TempDir, content: &str) -> std::path::PathBuf {
        let path = dir.path().join("files.json");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[tokio::test]
    async fn test_import_all_records() {
        let db = Database::open_in_memory().await.unwrap();
        let dir = tempfile::TempDir::new().unwrap();
        let path = write_export(&dir, LEGACY_JSON);

        let imported = import_if_empty(db.pool(), &path).await.unwrap();
        assert_eq!(imported, 3);

        let repo = FileRepository::new(db.pool());
        let first = repo
            .get_by_id("0191e4a0-0000-7000-8000-000000000001")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first.name, "notes.txt");
        assert_eq!(first.size, 12);
        assert_eq!(first.mime_type, "text/plain");
        assert_eq!(first.uploaded_at, "2024-03-01T10:00:00.000Z");
        assert_eq!(first.remark, Some("first".to_string()));
        assert_eq!(
            first.stored_name,
            "0191e4a0-0000-7000-8000-000000000001.txt"
        );

        // Record without a remark key imports with None
        let third = repo
            .get_by_id("0191e4a0-0000-7000-8000-000000000003")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(third.remark, None);
    }

    #[tokio::test]
    async fn test_rerun_is_noop() {
        let db = Database::open_in_memory().await.unwrap();
        let dir = tempfile::TempDir::new().unwrap();
        let path = write_export(&dir, LEGACY_JSON);

        assert_eq!(import_if_empty(db.pool(), &path).await.unwrap(), 3);
        assert_eq!(import_if_empty(db.pool(), &path).await.unwrap(), 0);

        let repo = FileRepository::new(db.pool());
        assert_eq!(repo.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_skips_on_non_empty_store() {
        let db = Database::open_in_memory().await.unwrap();
        let dir = tempfile::TempDir::new().unwrap();
        let path = write_export(&dir, LEGACY_JSON);

        let repo = FileRepository::new(db.pool());
        repo.insert(&FileDescriptor::new("existing.txt", 1, "text/plain"))
            .await
            .unwrap();

        assert_eq!(import_if_empty(db.pool(), &path).await.unwrap(), 0);
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_missing_export_is_noop() {
        let db = Database::open_in_memory().await.unwrap();
        let dir = tempfile::TempDir::new().unwrap();

        let imported = import_if_empty(db.pool(), dir.path().join("files.json"))
            .await
            .unwrap();
        assert_eq!(imported, 0);
    }

    #[tokio::test]
    async fn test_bad_record_is_skipped() {
        let db = Database::open_in_memory().await.unwrap();
        let dir = tempfile::TempDir::new().unwrap();

        // Second record reuses the first id and fails to insert; the
        // rest still commit.
        let path = write_export(
            &dir,
            r#"[
                {"id": "dup", "name": "a.txt", "size": 1, "type": "text/plain",
                 "uploadDate": "2024-01-01T00:00:00Z", "path": "dup.txt"},
                {"id": "dup", "name": "b.txt", "size": 2, "type": "text/plain",
                 "uploadDate": "2024-01-02T00:00:00Z", "path": "dup.txt"},
                {"id": "ok", "name": "c.txt", "size": 3, "type": "text/plain",
                 "uploadDate": "2024-01-03T00:00:00Z", "path": "ok.txt"}
            ]"#,
        );

        let imported = import_if_empty(db.pool(), &path).await.unwrap();
        assert_eq!(imported, 2);

        let repo = FileRepository::new(db.pool());
        assert_eq!(repo.count().await.unwrap(), 2);
        assert_eq!(
            repo.get_by_id("dup").await.unwrap().unwrap().name,
            "a.txt"
        );
    }

    #[tokio::test]
    async fn test_malformed_export_fails() {
        let db = Database::open_in_memory().await.unwrap();
        let dir = tempfile::TempDir::new().unwrap();
        let path = write_export(&dir, "not json");

        let result = import_if_empty(db.pool(), &path).await;
        assert!(matches!(result, Err(DepotError::Validation(_))));
    }
}
