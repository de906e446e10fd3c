//! Typed repositories for jobs, projects and clip records.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use reelcut_models::{
    ClipArtifact, Job, JobId, JobStatus, Project, ProjectId, ProjectStatus,
};

use crate::client::FirestoreClient;
use crate::error::{FirestoreError, FirestoreResult};
use crate::metrics::record_claim;
use crate::types::{Document, StructuredQuery, ToFirestoreValue, Value};

const JOBS: &str = "jobs";
const PROJECTS: &str = "projects";
const CLIPS: &str = "clips";

/// Candidates fetched per claim query.
const CLAIM_BATCH: i32 = 5;

/// Outcome of a successful claim attempt.
#[derive(Debug, Clone)]
pub enum Claim {
    /// The job is now `processing` and owned by this worker.
    Claimed(Job),
    /// A stale job had no attempts left and was moved to `error`.
    Abandoned(Job),
}

// =============================================================================
// Jobs
// =============================================================================

/// Repository for job documents.
#[derive(Clone)]
pub struct JobRepository {
    client: FirestoreClient,
}

impl JobRepository {
    pub fn new(client: FirestoreClient) -> Self {
        Self { client }
    }

    /// Get a job by ID.
    pub async fn get(&self, job_id: &JobId) -> FirestoreResult<Option<Job>> {
        let doc = self
            .client
            .with_retry("get_job", || self.client.get_document(JOBS, job_id.as_str()))
            .await?;
        doc.as_ref().map(document_to_job).transpose()
    }

    /// Claim the oldest queued job, or else the oldest stale one.
    ///
    /// Every write carries the candidate's `updateTime` as a precondition, so
    /// of two racing workers exactly one wins; the loser moves on to the next
    /// candidate. A stale job whose attempts are used up is moved to `error`
    /// instead of being claimed.
    pub async fn claim_next(
        &self,
        stale_after: Duration,
        max_attempts: u32,
    ) -> FirestoreResult<Option<Claim>> {
        let queued = StructuredQuery::collection(JOBS)
            .filter("status", "EQUAL", JobStatus::Queued.as_str().to_firestore_value())
            .order_by("created_at", "ASCENDING")
            .limit(CLAIM_BATCH);

        if let Some(claim) = self.claim_from(queued, stale_after, max_attempts).await? {
            return Ok(Some(claim));
        }

        let cutoff = Utc::now() - stale_after;
        let stale = StructuredQuery::collection(JOBS)
            .filter(
                "status",
                "EQUAL",
                JobStatus::Processing.as_str().to_firestore_value(),
            )
            .filter("heartbeat_at", "LESS_THAN", cutoff.to_firestore_value())
            .order_by("heartbeat_at", "ASCENDING")
            .limit(CLAIM_BATCH);

        self.claim_from(stale, stale_after, max_attempts).await
    }

    async fn claim_from(
        &self,
        query: StructuredQuery,
        stale_after: Duration,
        max_attempts: u32,
    ) -> FirestoreResult<Option<Claim>> {
        let docs = self
            .client
            .with_retry("claim_query", || self.client.run_query("", query.clone()))
            .await?;

        for doc in docs {
            let job = match document_to_job(&doc) {
                Ok(job) => job,
                Err(e) => {
                    warn!("Skipping malformed job document: {}", e);
                    continue;
                }
            };
            let now = Utc::now();
            if !job.is_claimable(now, stale_after) {
                continue;
            }
            let Some(update_time) = doc.update_time.as_deref() else {
                warn!(job_id = %job.id, "Job document has no updateTime, skipping");
                continue;
            };

            let abandon = job.status == JobStatus::Processing && job.attempts_exhausted(max_attempts);
            let result = if abandon {
                self.abandon(&job, update_time, now).await
            } else {
                self.claim(&job, update_time, now).await
            };

            match result {
                Ok(claim) => return Ok(Some(claim)),
                Err(e) if e.is_precondition_failed() => {
                    debug!(job_id = %job.id, "Claim conflict, trying next candidate");
                    record_claim("conflict");
                }
                Err(e) => return Err(e),
            }
        }

        Ok(None)
    }

    async fn claim(
        &self,
        job: &Job,
        update_time: &str,
        now: DateTime<Utc>,
    ) -> FirestoreResult<Claim> {
        let attempts = job.attempts + 1;
        let fields = HashMap::from([
            ("status".to_string(), JobStatus::Processing.as_str().to_firestore_value()),
            ("started_at".to_string(), now.to_firestore_value()),
            ("heartbeat_at".to_string(), now.to_firestore_value()),
            ("attempts".to_string(), attempts.to_firestore_value()),
        ]);

        self.client
            .update_document_with_precondition(
                JOBS,
                job.id.as_str(),
                fields.clone(),
                Some(mask(&fields)),
                update_time,
            )
            .await?;

        record_claim("claimed");
        info!(job_id = %job.id, attempts, "Claimed job");

        let mut claimed = job.clone();
        claimed.status = JobStatus::Processing;
        claimed.started_at = Some(now);
        claimed.heartbeat_at = Some(now);
        claimed.attempts = attempts;
        Ok(Claim::Claimed(claimed))
    }

    async fn abandon(
        &self,
        job: &Job,
        update_time: &str,
        now: DateTime<Utc>,
    ) -> FirestoreResult<Claim> {
        let message = format!("Job abandoned after {} attempts", job.attempts);
        let fields = HashMap::from([
            ("status".to_string(), JobStatus::Error.as_str().to_firestore_value()),
            ("error".to_string(), message.to_firestore_value()),
            ("finished_at".to_string(), now.to_firestore_value()),
        ]);

        self.client
            .update_document_with_precondition(
                JOBS,
                job.id.as_str(),
                fields.clone(),
                Some(mask(&fields)),
                update_time,
            )
            .await?;

        record_claim("abandoned");
        warn!(job_id = %job.id, attempts = job.attempts, "Stale job out of attempts, marked error");

        let mut abandoned = job.clone();
        abandoned.status = JobStatus::Error;
        abandoned.error = Some(message);
        abandoned.finished_at = Some(now);
        Ok(Claim::Abandoned(abandoned))
    }

    /// Refresh the liveness stamp of a claimed job.
    pub async fn heartbeat(&self, job_id: &JobId) -> FirestoreResult<()> {
        let fields = HashMap::from([("heartbeat_at".to_string(), Utc::now().to_firestore_value())]);
        self.write("heartbeat_job", job_id, fields).await
    }

    /// Mark a job done.
    pub async fn complete(&self, job_id: &JobId) -> FirestoreResult<()> {
        let fields = HashMap::from([
            ("status".to_string(), JobStatus::Done.as_str().to_firestore_value()),
            ("finished_at".to_string(), Utc::now().to_firestore_value()),
            ("error".to_string(), Value::NullValue(())),
        ]);
        self.write("complete_job", job_id, fields).await
    }

    /// Mark a job permanently failed.
    pub async fn fail(&self, job_id: &JobId, message: &str) -> FirestoreResult<()> {
        let fields = HashMap::from([
            ("status".to_string(), JobStatus::Error.as_str().to_firestore_value()),
            ("error".to_string(), message.to_firestore_value()),
            ("last_error".to_string(), message.to_firestore_value()),
            ("finished_at".to_string(), Utc::now().to_firestore_value()),
        ]);
        self.write("fail_job", job_id, fields).await
    }

    /// Put a job back on the queue after a retryable failure.
    pub async fn requeue(&self, job_id: &JobId, message: &str) -> FirestoreResult<()> {
        let fields = HashMap::from([
            ("status".to_string(), JobStatus::Queued.as_str().to_firestore_value()),
            ("last_error".to_string(), message.to_firestore_value()),
            ("heartbeat_at".to_string(), Value::NullValue(())),
        ]);
        self.write("requeue_job", job_id, fields).await
    }

    async fn write(
        &self,
        operation: &str,
        job_id: &JobId,
        fields: HashMap<String, Value>,
    ) -> FirestoreResult<()> {
        let update_mask = mask(&fields);
        self.client
            .with_retry(operation, || {
                self.client.update_document(
                    JOBS,
                    job_id.as_str(),
                    fields.clone(),
                    Some(update_mask.clone()),
                )
            })
            .await?;
        Ok(())
    }
}

// =============================================================================
// Projects
// =============================================================================

/// Repository for project documents.
#[derive(Clone)]
pub struct ProjectRepository {
    client: FirestoreClient,
}

impl ProjectRepository {
    pub fn new(client: FirestoreClient) -> Self {
        Self { client }
    }

    pub async fn get(&self, project_id: &ProjectId) -> FirestoreResult<Option<Project>> {
        let doc = self
            .client
            .with_retry("get_project", || {
                self.client.get_document(PROJECTS, project_id.as_str())
            })
            .await?;
        doc.as_ref().map(document_to_project).transpose()
    }

    /// Update the status mirror.
    pub async fn set_status(
        &self,
        project_id: &ProjectId,
        status: ProjectStatus,
    ) -> FirestoreResult<()> {
        let fields = HashMap::from([
            ("status".to_string(), status.as_str().to_firestore_value()),
            ("updated_at".to_string(), Utc::now().to_firestore_value()),
        ]);
        let update_mask = mask(&fields);

        self.client
            .with_retry("set_project_status", || {
                self.client.update_document(
                    PROJECTS,
                    project_id.as_str(),
                    fields.clone(),
                    Some(update_mask.clone()),
                )
            })
            .await?;
        Ok(())
    }
}

// =============================================================================
// Clips
// =============================================================================

/// Repository for per-clip records.
#[derive(Clone)]
pub struct ClipRepository {
    client: FirestoreClient,
}

impl ClipRepository {
    pub fn new(client: FirestoreClient) -> Self {
        Self { client }
    }

    /// Document id of a clip record.
    pub fn document_id(project_id: &ProjectId, index: u32) -> String {
        format!("{}-{}", project_id, index)
    }

    /// Write a clip record. Re-running a job overwrites rather than duplicates.
    pub async fn upsert(
        &self,
        project_id: &ProjectId,
        artifact: &ClipArtifact,
    ) -> FirestoreResult<()> {
        let doc_id = Self::document_id(project_id, artifact.index);
        let fields = clip_to_fields(project_id, artifact);

        self.client
            .with_retry("upsert_clip", || {
                self.client.update_document(CLIPS, &doc_id, fields.clone(), None)
            })
            .await?;

        debug!(clip = %doc_id, "Saved clip record");
        Ok(())
    }
}

// =============================================================================
// Conversion helpers
// =============================================================================

fn mask(fields: &HashMap<String, Value>) -> Vec<String> {
    let mut paths: Vec<String> = fields.keys().cloned().collect();
    paths.sort();
    paths
}

fn clip_to_fields(project_id: &ProjectId, artifact: &ClipArtifact) -> HashMap<String, Value> {
    HashMap::from([
        ("project_id".to_string(), project_id.as_str().to_firestore_value()),
        ("idx".to_string(), artifact.index.to_firestore_value()),
        ("duration_sec".to_string(), artifact.duration_secs.to_firestore_value()),
        ("mp4_path".to_string(), artifact.video_path.to_firestore_value()),
        ("srt_path".to_string(), artifact.subtitle_path.to_firestore_value()),
        ("thumb_path".to_string(), artifact.thumbnail_path.to_firestore_value()),
        ("created_at".to_string(), Utc::now().to_firestore_value()),
    ])
}

fn document_to_job(doc: &Document) -> FirestoreResult<Job> {
    let id = doc
        .doc_id()
        .ok_or_else(|| FirestoreError::invalid_response("Job document has no name"))?;

    let project_id: String = doc
        .get("project_id")
        .ok_or_else(|| FirestoreError::invalid_response(format!("Job {} has no project_id", id)))?;

    let status = doc
        .get::<String>("status")
        .unwrap_or_default()
        .parse::<JobStatus>()
        .map_err(|e| FirestoreError::invalid_response(format!("Job {}: {}", id, e)))?;

    let created_at = doc
        .get::<DateTime<Utc>>("created_at")
        .or_else(|| {
            doc.create_time
                .as_deref()
                .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
                .map(|t| t.with_timezone(&Utc))
        })
        .unwrap_or_else(Utc::now);

    Ok(Job {
        id: JobId::from(id),
        project_id: ProjectId::from(project_id),
        status,
        created_at,
        started_at: doc.get("started_at"),
        heartbeat_at: doc.get("heartbeat_at"),
        finished_at: doc.get("finished_at"),
        attempts: doc.get("attempts").unwrap_or(0),
        error: doc.get("error"),
        last_error: doc.get("last_error"),
    })
}

fn document_to_project(doc: &Document) -> FirestoreResult<Project> {
    let id = doc
        .doc_id()
        .ok_or_else(|| FirestoreError::invalid_response("Project document has no name"))?;

    let source_path: String = doc.get("source_path").ok_or_else(|| {
        FirestoreError::invalid_response(format!("Project {} has no source_path", id))
    })?;

    Ok(Project {
        id: ProjectId::from(id),
        source_path,
        platform: doc.get("platform").unwrap_or_default(),
        status: doc
            .get::<String>("status")
            .and_then(|s| s.parse().ok())
            .unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: serde_json::Value) -> Document {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_document_to_job() {
        let job = document_to_job(&doc(json!({
            "name": "projects/p/databases/(default)/documents/jobs/job-7",
            "fields": {
                "project_id": {"stringValue": "proj-1"},
                "status": {"stringValue": "processing"},
                "created_at": {"timestampValue": "2025-03-01T10:00:00Z"},
                "heartbeat_at": {"timestampValue": "2025-03-01T10:05:00Z"},
                "attempts": {"integerValue": "2"},
                "last_error": {"stringValue": "network"}
            },
            "updateTime": "2025-03-01T10:05:00.000001Z"
        })))
        .unwrap();

        assert_eq!(job.id.as_str(), "job-7");
        assert_eq!(job.project_id.as_str(), "proj-1");
        assert_eq!(job.status, JobStatus::Processing);
        assert_eq!(job.attempts, 2);
        assert!(job.heartbeat_at.is_some());
        assert!(job.started_at.is_none());
        assert_eq!(job.last_error.as_deref(), Some("network"));
    }

    #[test]
    fn test_document_to_job_rejects_unknown_status() {
        let result = document_to_job(&doc(json!({
            "name": "projects/p/databases/(default)/documents/jobs/job-8",
            "fields": {
                "project_id": {"stringValue": "proj-1"},
                "status": {"stringValue": "exploded"}
            }
        })));
        assert!(matches!(result, Err(FirestoreError::InvalidResponse(_))));
    }

    #[test]
    fn test_document_to_project_defaults() {
        let project = document_to_project(&doc(json!({
            "name": "projects/p/databases/(default)/documents/projects/proj-1",
            "fields": {
                "source_path": {"stringValue": "uploads/proj-1/source.mp4"}
            }
        })))
        .unwrap();

        assert_eq!(project.id.as_str(), "proj-1");
        assert_eq!(project.platform, "");
        assert_eq!(project.status, ProjectStatus::Uploaded);
    }

    #[test]
    fn test_clip_fields_and_id() {
        let pid = ProjectId::from("proj-1");
        let artifact = ClipArtifact {
            index: 3,
            duration_secs: 30,
            video_path: "clips/projects/proj-1/clip3.mp4".into(),
            subtitle_path: "clips/projects/proj-1/clip3.srt".into(),
            thumbnail_path: "clips/projects/proj-1/clip3.png".into(),
        };
        let fields = clip_to_fields(&pid, &artifact);

        assert_eq!(ClipRepository::document_id(&pid, 3), "proj-1-3");
        assert_eq!(fields["idx"], Value::IntegerValue("3".into()));
        assert_eq!(fields["duration_sec"], Value::IntegerValue("30".into()));
        assert_eq!(
            mask(&fields),
            vec![
                "created_at",
                "duration_sec",
                "idx",
                "mp4_path",
                "project_id",
                "srt_path",
                "thumb_path"
            ]
        );
    }
}
