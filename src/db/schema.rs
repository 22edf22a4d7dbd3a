//! Database schema and migrations for Depot.
//!
//! This module contains all database migrations that will be applied
//! sequentially when the database is first opened or upgraded.

/// Database migrations.
///
/// Each migration is a SQL script that will be executed in order.
/// The schema_version table tracks which migrations have been applied.
pub const MIGRATIONS: &[&str] = &[
    // v1: Initial schema - files table
    r#"
-- Metadata for stored files. One row per logical file; the blob on disk
-- is addressed by stored_name, never by the user-visible name.
CREATE TABLE files (
    id           TEXT PRIMARY KEY,        -- server-generated UUID
    name         TEXT NOT NULL,           -- user-visible filename incl. extension
    size         INTEGER NOT NULL,        -- byte length of the stored blob
    mime_type    TEXT NOT NULL,           -- as supplied by the client at upload
    uploaded_at  TEXT NOT NULL,           -- RFC 3339 creation timestamp
    remark       TEXT,                    -- optional free-text annotation
    stored_name  TEXT NOT NULL            -- blob name: <id><original extension>
);

CREATE INDEX idx_files_uploaded_at ON files(uploaded_at);
"#,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_not_empty() {
        assert!(!MIGRATIONS.is_empty());
    }

    #[test]
    fn test_first_migration_creates_files_table() {
        assert!(MIGRATIONS[0].contains("CREATE TABLE files"));
    }
}
