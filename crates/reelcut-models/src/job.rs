//! Job definitions for queue processing.

use chrono::{DateTime, Duration, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::project::ProjectId;

/// Unique identifier for a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Job status in the queue.
///
/// `queued -> processing -> {done, error}`. A retryable failure may move a
/// job from `processing` back to `queued`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Waiting for a worker
    #[default]
    Queued,
    /// Claimed by a worker
    Processing,
    /// All clips rendered and persisted
    Done,
    /// Failed permanently
    Error,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Done => "done",
            JobStatus::Error => "error",
        }
    }

    /// Check if this is a terminal state (no more updates expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Error)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(JobStatus::Queued),
            "processing" => Ok(JobStatus::Processing),
            "done" => Ok(JobStatus::Done),
            "error" => Ok(JobStatus::Error),
            other => Err(format!("unknown job status: {}", other)),
        }
    }
}

/// One processing run for a project.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Job {
    /// Unique job ID
    pub id: JobId,

    /// Project whose source video is processed
    pub project_id: ProjectId,

    /// Current status
    pub status: JobStatus,

    /// When the job was enqueued
    pub created_at: DateTime<Utc>,

    /// When the current claim started
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,

    /// Liveness stamp refreshed by the worker holding the claim
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heartbeat_at: Option<DateTime<Utc>>,

    /// When the job reached a terminal state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,

    /// Number of times the job has been claimed
    #[serde(default)]
    pub attempts: u32,

    /// User-visible failure message (terminal `error` only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Message of the last failed attempt, kept across requeues
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl Job {
    /// Create a freshly queued job.
    pub fn new(project_id: impl Into<ProjectId>) -> Self {
        Self {
            id: JobId::new(),
            project_id: project_id.into(),
            status: JobStatus::Queued,
            created_at: Utc::now(),
            started_at: None,
            heartbeat_at: None,
            finished_at: None,
            attempts: 0,
            error: None,
            last_error: None,
        }
    }

    /// Last sign of life of the current claim.
    pub fn last_seen(&self) -> Option<DateTime<Utc>> {
        self.heartbeat_at.or(self.started_at)
    }

    /// A `processing` job whose claim has not been refreshed within `stale_after`.
    pub fn is_stale(&self, now: DateTime<Utc>, stale_after: Duration) -> bool {
        if self.status != JobStatus::Processing {
            return false;
        }
        match self.last_seen() {
            Some(seen) => now - seen > stale_after,
            None => true,
        }
    }

    /// Whether a worker may claim this job right now.
    ///
    /// Queued jobs are always claimable; processing jobs only once their
    /// claim has gone stale. Terminal jobs are never claimable.
    pub fn is_claimable(&self, now: DateTime<Utc>, stale_after: Duration) -> bool {
        match self.status {
            JobStatus::Queued => true,
            JobStatus::Processing => self.is_stale(now, stale_after),
            JobStatus::Done | JobStatus::Error => false,
        }
    }

    /// Whether the retry budget is used up.
    pub fn attempts_exhausted(&self, max_attempts: u32) -> bool {
        self.attempts >= max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_status_roundtrip_str() {
        for status in [
            JobStatus::Queued,
            JobStatus::Processing,
            JobStatus::Done,
            JobStatus::Error,
        ] {
            assert_eq!(status.as_str().parse::<JobStatus>().unwrap(), status);
        }
        assert!("completed".parse::<JobStatus>().is_err());
    }

    #[test]
    fn test_job_status_serde() {
        let json = serde_json::to_string(&JobStatus::Processing).unwrap();
        assert_eq!(json, "\"processing\"");
        assert!(JobStatus::Done.is_terminal());
        assert!(JobStatus::Error.is_terminal());
        assert!(!JobStatus::Queued.is_terminal());
    }

    #[test]
    fn test_queued_job_is_claimable() {
        let job = Job::new("project-1");
        assert!(job.is_claimable(Utc::now(), Duration::seconds(300)));
    }

    #[test]
    fn test_fresh_processing_job_is_not_claimable() {
        let now = Utc::now();
        let mut job = Job::new("project-1");
        job.status = JobStatus::Processing;
        job.started_at = Some(now - Duration::seconds(60));
        job.heartbeat_at = Some(now - Duration::seconds(10));

        assert!(!job.is_stale(now, Duration::seconds(300)));
        assert!(!job.is_claimable(now, Duration::seconds(300)));
    }

    #[test]
    fn test_stale_processing_job_is_claimable() {
        let now = Utc::now();
        let mut job = Job::new("project-1");
        job.status = JobStatus::Processing;
        job.started_at = Some(now - Duration::seconds(900));
        job.heartbeat_at = Some(now - Duration::seconds(600));

        assert!(job.is_stale(now, Duration::seconds(300)));
        assert!(job.is_claimable(now, Duration::seconds(300)));
    }

    #[test]
    fn test_terminal_jobs_are_never_claimable() {
        let now = Utc::now();
        let mut job = Job::new("project-1");
        job.started_at = Some(now - Duration::days(1));

        job.status = JobStatus::Done;
        assert!(!job.is_claimable(now, Duration::seconds(1)));

        job.status = JobStatus::Error;
        assert!(!job.is_claimable(now, Duration::seconds(1)));
    }

    #[test]
    fn test_attempts_exhausted() {
        let mut job = Job::new("project-1");
        job.attempts = 2;
        assert!(!job.attempts_exhausted(3));
        job.attempts = 3;
        assert!(job.attempts_exhausted(3));
    }
}
