//! Firestore REST API client.
//!
//! This crate provides:
//! - Typed repositories for jobs, projects and clip records
//! - Atomic job claims through `updateTime` preconditions
//! - Service account authentication via gcp_auth (or the local emulator)
//! - Merge updates and retry logic

pub mod client;
pub mod error;
pub mod metrics;
pub mod repos;
pub mod retry;
pub mod token_cache;
pub mod types;


pub use client::{FirestoreClient, FirestoreConfig};
pub use error::{FirestoreError, FirestoreResult};
pub use repos::{Claim, ClipRepository, JobRepository, ProjectRepository};
pub use retry::RetryConfig;
pub use types::{Document, FromFirestoreValue, StructuredQuery, ToFirestoreValue, Value};
