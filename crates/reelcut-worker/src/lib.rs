//! Polling clip worker.
//!
//! This crate provides:
//! - The job runner: atomic claims, heartbeats, retries and timeouts
//! - The per-job pipeline: fetch, probe, transcribe, place windows, render
//! - Collaborator traits with Firestore, R2 and ffmpeg implementations
//! - Graceful shutdown between jobs

pub mod backends;
pub mod clip_pipeline;
pub mod config;
pub mod error;
pub mod executor;
pub mod logging;
pub mod metrics;
pub mod processor;
pub mod retry;
pub mod services;

pub use backends::{FfmpegToolkit, FirestoreJobStore, R2ObjectStore};
pub use config::WorkerConfig;
pub use error::{WorkerError, WorkerResult};
pub use executor::{JobOutcome, JobRunner};
pub use logging::JobLogger;
pub use processor::ProcessingContext;
pub use services::{JobStore, MediaToolkit, ObjectStore, PipelineDeps};
