//! Structured job logging.
//!
//! Every lifecycle line carries the job id, the project id and the attempt
//! number so a job can be followed across workers and reclaims.

use tracing::{error, info, warn, Span};

use reelcut_models::Job;

/// Job logger for structured lifecycle lines.
#[derive(Debug, Clone)]
pub struct JobLogger {
    job_id: String,
    project_id: String,
    attempt: u32,
    operation: &'static str,
}

impl JobLogger {
    /// Logger for one claimed run of `job`.
    pub fn new(job: &Job, operation: &'static str) -> Self {
        Self {
            job_id: job.id.to_string(),
            project_id: job.project_id.to_string(),
            attempt: job.attempts,
            operation,
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            project_id = %self.project_id,
            attempt = self.attempt,
            operation = self.operation,
            "Job started: {}", message
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            operation = self.operation,
            "Job progress: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            job_id = %self.job_id,
            operation = self.operation,
            "Job warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            job_id = %self.job_id,
            project_id = %self.project_id,
            attempt = self.attempt,
            operation = self.operation,
            "Job error: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            project_id = %self.project_id,
            operation = self.operation,
            "Job completed: {}", message
        );
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn operation(&self) -> &str {
        self.operation
    }

    /// Span wrapping the whole job run.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "job",
            job_id = %self.job_id,
            project_id = %self.project_id,
            attempt = self.attempt,
            operation = self.operation
        )
    }
}
