//! File descriptor model for Depot.
//!
//! A descriptor is the metadata record representing one stored file.
//! The blob on disk is addressed by `stored_name`, which is derived from
//! the server-generated id and never changes, even across renames.

use std::path::Path;

use chrono::Utc;
use uuid::Uuid;

/// Metadata record for one stored file.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct FileDescriptor {
    /// Server-generated UUID. Public handle, immutable, never reused.
    pub id: String,
    /// User-visible filename including extension. Mutable via rename.
    pub name: String,
    /// Byte length, set once at creation from the actual written bytes.
    pub size: i64,
    /// MIME type as supplied by the client at creation.
    pub mime_type: String,
    /// RFC 3339 creation timestamp, immutable.
    pub uploaded_at: String,
    /// Optional free-text annotation.
    pub remark: Option<String>,
    /// Internal blob name: `<id><original extension>`. Immutable.
    pub stored_name: String,
}

impl FileDescriptor {
    /// Create a new descriptor with a fresh id and creation timestamp.
    ///
    /// `stored_name` is derived as the id plus the extension of `name`
    /// (no extension, no suffix).
    pub fn new(name: impl Into<String>, size: i64, mime_type: impl Into<String>) -> Self {
        let name = name.into();
        let id = Uuid::new_v4().to_string();
        let stored_name = format!("{id}{}", dot_extension(&name));

        Self {
            id,
            name,
            size,
            mime_type: mime_type.into(),
            uploaded_at: Utc::now().to_rfc3339(),
            remark: None,
            stored_name,
        }
    }

    /// Set the remark.
    pub fn with_remark(mut self, remark: impl Into<String>) -> Self {
        self.remark = Some(remark.into());
        self
    }
}

/// Extension of a filename including the leading dot, or an empty string
/// if the filename has none.
pub fn dot_extension(name: &str) -> String {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_default()
}

/// Builder for partial descriptor updates.
#[derive(Debug, Clone, Default)]
pub struct DescriptorUpdate {
    /// New filename.
    pub name: Option<String>,
    /// New remark.
    pub remark: Option<Option<String>>,
}

impl DescriptorUpdate {
    /// Create a new empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the filename.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the remark.
    pub fn remark(mut self, remark: Option<impl Into<String>>) -> Self {
        self.remark = Some(remark.map(|s| s.into()));
        self
    }

    /// Whether the update changes anything.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.remark.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_generates_unique_ids() {
        let a = FileDescriptor::new("a.txt", 1, "text/plain");
        let b = FileDescriptor::new("a.txt", 1, "text/plain");
        assert_ne!(a.id, b.id);
        assert_ne!(a.stored_name, b.stored_name);
    }

    #[test]
    fn test_stored_name_keeps_extension() {
        let d = FileDescriptor::new("report.pdf", 10, "application/pdf");
        assert_eq!(d.stored_name, format!("{}.pdf", d.id));
    }

    #[test]
    fn test_stored_name_without_extension() {
        let d = FileDescriptor::new("README", 10, "text/plain");
        assert_eq!(d.stored_name, d.id);
    }

    #[test]
    fn test_with_remark() {
        let d = FileDescriptor::new("a.txt", 1, "text/plain").with_remark("note");
        assert_eq!(d.remark, Some("note".to_string()));
    }

    #[test]
    fn test_dot_extension() {
        assert_eq!(dot_extension("test.txt"), ".txt");
        assert_eq!(dot_extension("archive.tar.gz"), ".gz");
        assert_eq!(dot_extension("no_ext"), "");
        // ".hidden" is a filename without an extension
        assert_eq!(dot_extension(".hidden"), "");
        assert_eq!(dot_extension("image.PNG"), ".PNG");
    }

    #[test]
    fn test_update_builder() {
        let update = DescriptorUpdate::new().name("new.txt").remark(Some("note"));
        assert_eq!(update.name, Some("new.txt".to_string()));
        assert_eq!(update.remark, Some(Some("note".to_string())));
        assert!(!update.is_empty());

        assert!(DescriptorUpdate::new().is_empty());
    }
}
