//! Cloudflare R2 storage client.
//!
//! This crate provides:
//! - File and byte uploads to R2 buckets
//! - Presigned GET URL generation
//! - Streaming download of a presigned URL to a local file
//! - Object key layout for rendered clip artifacts

pub mod client;
pub mod error;
pub mod fetch;
pub mod keys;

pub use client::{R2Client, R2Config};
pub use error::{StorageError, StorageResult};
pub use fetch::HttpFetcher;
pub use keys::{clip_object_key, ArtifactKind, ObjectPath};
