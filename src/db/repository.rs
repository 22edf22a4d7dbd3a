//! File metadata repository for Depot.
//!
//! This module provides CRUD operations for file descriptors in the
//! database. Ordering, filtering and pagination are caller concerns;
//! `list_all` returns newest-first purely as a convenience.

use sqlx::{QueryBuilder, SqlitePool};

use super::descriptor::{DescriptorUpdate, FileDescriptor};
use crate::{DepotError, Result};

const SELECT_COLUMNS: &str =
    "SELECT id, name, size, mime_type, uploaded_at, remark, stored_name FROM files";

/// Repository for file descriptor CRUD operations.
pub struct FileRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> FileRepository<'a> {
    /// Create a new FileRepository with the given database pool reference.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new descriptor.
    ///
    /// Ids are generated server-side, so a unique violation here is an
    /// invariant violation and maps to [`DepotError::Duplicate`].
    pub async fn insert(&self, descriptor: &FileDescriptor) -> Result<()> {
        sqlx::query(
            "INSERT INTO files (id, name, size, mime_type, uploaded_at, remark, stored_name)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&descriptor.id)
        .bind(&descriptor.name)
        .bind(descriptor.size)
        .bind(&descriptor.mime_type)
        .bind(&descriptor.uploaded_at)
        .bind(&descriptor.remark)
        .bind(&descriptor.stored_name)
        .execute(self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                DepotError::Duplicate(descriptor.id.clone())
            }
            _ => DepotError::Database(e.to_string()),
        })?;

        Ok(())
    }

    /// Get a descriptor by id.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<FileDescriptor>> {
        let result = sqlx::query_as::<_, FileDescriptor>(&format!("{SELECT_COLUMNS} WHERE id = ?"))
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| DepotError::Database(e.to_string()))?;

        Ok(result)
    }

    /// List all descriptors, newest first.
    pub async fn list_all(&self) -> Result<Vec<FileDescriptor>> {
        let files = sqlx::query_as::<_, FileDescriptor>(&format!(
            "{SELECT_COLUMNS} ORDER BY uploaded_at DESC, id DESC"
        ))
        .fetch_all(self.pool)
        .await
        .map_err(|e| DepotError::Database(e.to_string()))?;

        Ok(files)
    }

    /// Get all descriptors matching the given ids. Absent ids are
    /// silently skipped.
    pub async fn get_many(&self, ids: &[String]) -> Result<Vec<FileDescriptor>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut query: QueryBuilder<sqlx::Sqlite> =
            QueryBuilder::new(format!("{SELECT_COLUMNS} WHERE id IN ("));
        let mut separated = query.separated(", ");
        for id in ids {
            separated.push_bind(id);
        }
        query.push(")");

        let files = query
            .build_query_as::<FileDescriptor>()
            .fetch_all(self.pool)
            .await
            .map_err(|e| DepotError::Database(e.to_string()))?;

        Ok(files)
    }

    /// Update a descriptor by id.
    ///
    /// Only fields that are set in the update will be modified.
    /// Returns the updated descriptor, or None if not found.
    pub async fn update(
        &self,
        id: &str,
        update: &DescriptorUpdate,
    ) -> Result<Option<FileDescriptor>> {
        if update.is_empty() {
            return self.get_by_id(id).await;
        }

        let mut query: QueryBuilder<sqlx::Sqlite> = QueryBuilder::new("UPDATE files SET ");
        let mut separated = query.separated(", ");

        if let Some(ref name) = update.name {
            separated.push("name = ");
            separated.push_bind_unseparated(name);
        }
        if let Some(ref remark) = update.remark {
            separated.push("remark = ");
            separated.push_bind_unseparated(remark.clone());
        }

        query.push(" WHERE id = ");
        query.push_bind(id);

        let result = query
            .build()
            .execute(self.pool)
            .await
            .map_err(|e| DepotError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get_by_id(id).await
    }

    /// Delete all descriptors matching the given ids in one statement.
    ///
    /// Absent ids are silently ignored. Returns the number of records
    /// actually removed.
    pub async fn delete_many(&self, ids: &[String]) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let mut query: QueryBuilder<sqlx::Sqlite> =
            QueryBuilder::new("DELETE FROM files WHERE id IN (");
        let mut separated = query.separated(", ");
        for id in ids {
            separated.push_bind(id);
        }
        query.push(")");

        let result = query
            .build()
            .execute(self.pool)
            .await
            .map_err(|e| DepotError::Database(e.to_string()))?;

        Ok(result.rows_affected())
    }

    /// Count all descriptors.
    pub async fn count(&self) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM files")
            .fetch_one(self.pool)
            .await
            .map_err(|e| DepotError::Database(e.to_string()))?;
        Ok(count.0)
    }
}
