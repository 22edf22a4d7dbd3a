//! Depot - Self-hosted file depot
//!
//! A file storage server with chunked uploads, SQLite-backed metadata
//! and a REST API, implemented in Rust.

pub mod config;
pub mod db;
pub mod error;
pub mod file;
pub mod logging;
pub mod web;

pub use config::Config;
pub use db::{Database, DescriptorUpdate, FileDescriptor, FileRepository};
pub use error::{DepotError, Result};
pub use file::{BlobStore, ChunkAssembler, DiskUsage, FileService};
pub use web::server::WebServer;
