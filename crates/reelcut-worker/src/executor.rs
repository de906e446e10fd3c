//! Job runner.
//!
//! A single polling loop: claim one job, run it to an outcome, settle its
//! status, poll again. Claims are kept alive by a heartbeat task so other
//! workers only reclaim jobs whose worker has gone away.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn, Instrument};
use uuid::Uuid;

use reelcut_firestore::Claim;
use reelcut_models::{ClipArtifact, Job, JobId, ProjectStatus};

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::logging::JobLogger;
use crate::metrics;
use crate::processor::{process_job, ProcessingContext};
use crate::retry::FailureTracker;
use crate::services::PipelineDeps;

/// How a claimed job ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    /// All clips rendered and recorded
    Done { clips: usize },
    /// Clips recorded but the job could not be marked done; it stays
    /// `processing` and is reclaimed once its claim goes stale
    Unsettled,
    /// Transient failure, job is queued again
    Requeued,
    /// Permanent failure or retry budget used up
    Failed,
    /// Stale claim found with no attempts left
    Abandoned,
}

impl JobOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobOutcome::Done { .. } => "done",
            JobOutcome::Unsettled => "unsettled",
            JobOutcome::Requeued => "requeued",
            JobOutcome::Failed => "failed",
            JobOutcome::Abandoned => "abandoned",
        }
    }
}

/// Polls the job store and processes one job at a time.
pub struct JobRunner {
    ctx: ProcessingContext,
    shutdown: watch::Sender<bool>,
    worker_id: String,
}

impl JobRunner {
    pub fn new(config: WorkerConfig, deps: PipelineDeps) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            ctx: ProcessingContext::new(config, deps),
            shutdown,
            worker_id: format!("worker-{}", Uuid::new_v4()),
        }
    }

    pub fn worker_id(&self) -> &str {
        &self.worker_id
    }

    /// Run until [`shutdown`](Self::shutdown) is called.
    pub async fn run(&self) -> WorkerResult<()> {
        self.run_until(self.shutdown.subscribe()).await
    }

    /// Run until `stop` turns true.
    ///
    /// The stop signal is only checked between jobs; a job in progress is
    /// always carried to an outcome first.
    pub async fn run_until(&self, mut stop: watch::Receiver<bool>) -> WorkerResult<()> {
        let config = &self.ctx.config;
        info!(
            worker_id = %self.worker_id,
            poll_interval_ms = config.poll_interval.as_millis() as u64,
            max_attempts = config.max_attempts,
            "Starting job runner"
        );

        loop {
            if *stop.borrow() {
                info!("Shutdown signal received, stopping runner");
                break;
            }

            let wait = match self.run_once().await {
                Ok(Some(outcome)) => {
                    debug!(outcome = outcome.as_str(), "Job settled, polling again");
                    continue;
                }
                Ok(None) => config.poll_interval,
                Err(e) => {
                    error!("Failed to poll for jobs: {}", e);
                    config.error_backoff
                }
            };

            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                changed = stop.changed() => {
                    if changed.is_err() {
                        // Sender gone, nobody can stop us any more
                        tokio::time::sleep(wait).await;
                    }
                }
            }
        }

        info!(worker_id = %self.worker_id, "Job runner stopped");
        Ok(())
    }

    /// Claim and fully process at most one job.
    ///
    /// Returns `None` when there was nothing to claim. Errors are failures
    /// to talk to the job store while claiming; failures inside a job are
    /// settled on the job and reported through the outcome.
    pub async fn run_once(&self) -> WorkerResult<Option<JobOutcome>> {
        let config = &self.ctx.config;
        let claim = self
            .ctx
            .deps
            .jobs
            .claim_next(config.stale_after(), config.max_attempts)
            .await?;

        let outcome = match claim {
            None => return Ok(None),
            Some(Claim::Abandoned(job)) => self.abandon(&job).await,
            Some(Claim::Claimed(job)) => self.execute(job).await,
        };
        Ok(Some(outcome))
    }

    /// Stop claiming new jobs.
    pub fn shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    async fn abandon(&self, job: &Job) -> JobOutcome {
        let logger = JobLogger::new(job, "clip_job");
        logger.log_error("Stale claim with no attempts left, job abandoned");
        self.set_project_status(job, ProjectStatus::Error, &logger).await;
        metrics::record_job(JobOutcome::Abandoned.as_str(), Duration::ZERO);
        JobOutcome::Abandoned
    }

    async fn execute(&self, job: Job) -> JobOutcome {
        let logger = JobLogger::new(&job, "clip_job");
        let span = logger.create_span();

        async {
            logger.log_start(&format!("attempt {}/{}", job.attempts, self.ctx.config.max_attempts));
            let started = Instant::now();

            let heartbeat = self.spawn_heartbeat(job.id.clone());
            let result = self.run_job(&job, &logger).await;
            heartbeat.abort();

            let outcome = self.settle(&job, result, &logger).await;
            metrics::record_job(outcome.as_str(), started.elapsed());
            outcome
        }
        .instrument(span)
        .await
    }

    /// Run the pipeline in a fresh temporary directory under the time budget.
    async fn run_job(&self, job: &Job, logger: &JobLogger) -> WorkerResult<Vec<ClipArtifact>> {
        let config = &self.ctx.config;
        tokio::fs::create_dir_all(&config.work_dir).await?;
        let work_dir = tempfile::Builder::new()
            .prefix(&format!("job-{}-", job.id))
            .tempdir_in(&config.work_dir)?;

        // The directory is removed when `work_dir` drops, whatever the outcome.
        match tokio::time::timeout(
            config.job_timeout,
            process_job(&self.ctx, job, work_dir.path(), logger),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(WorkerError::JobTimeout(config.job_timeout.as_secs())),
        }
    }

    /// Record the outcome on the job and its project.
    async fn settle(
        &self,
        job: &Job,
        result: WorkerResult<Vec<ClipArtifact>>,
        logger: &JobLogger,
    ) -> JobOutcome {
        let jobs = &self.ctx.deps.jobs;

        match result {
            Ok(clips) => {
                // The project mirrors `done` only once the job itself is done
                if let Err(e) = jobs.complete(&job.id).await {
                    logger.log_error(&format!("Failed to mark job done: {}", e));
                    return JobOutcome::Unsettled;
                }
                self.set_project_status(job, ProjectStatus::Done, logger).await;
                logger.log_completion(&format!("{} clips", clips.len()));
                JobOutcome::Done { clips: clips.len() }
            }
            Err(e) if e.is_retryable() && !job.attempts_exhausted(self.ctx.config.max_attempts) => {
                logger.log_warning(&format!("Attempt failed, requeueing: {}", e));
                if let Err(store_err) = jobs.requeue(&job.id, &e.to_string()).await {
                    logger.log_error(&format!("Failed to requeue job: {}", store_err));
                }
                JobOutcome::Requeued
            }
            Err(e) => {
                logger.log_error(&e.to_string());
                if let Err(store_err) = jobs.fail(&job.id, &e.user_message()).await {
                    logger.log_error(&format!("Failed to mark job failed: {}", store_err));
                }
                self.set_project_status(job, ProjectStatus::Error, logger).await;
                JobOutcome::Failed
            }
        }
    }

    async fn set_project_status(&self, job: &Job, status: ProjectStatus, logger: &JobLogger) {
        if let Err(e) = self
            .ctx
            .deps
            .jobs
            .set_project_status(&job.project_id, status)
            .await
        {
            logger.log_warning(&format!("Failed to set project status to {}: {}", status, e));
        }
    }

    /// Refresh `heartbeat_at` until aborted.
    fn spawn_heartbeat(&self, job_id: JobId) -> JoinHandle<()> {
        let jobs = Arc::clone(&self.ctx.deps.jobs);
        let every = self.ctx.config.job_heartbeat_interval.max(Duration::from_millis(1));

        tokio::spawn(async move {
            let mut tracker = FailureTracker::new(3);
            let mut interval = tokio::time::interval(every);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The claim itself set heartbeat_at
            interval.tick().await;

            loop {
                interval.tick().await;
                match jobs.heartbeat(&job_id).await {
                    Ok(()) => tracker.record_success(),
                    Err(e) => {
                        if tracker.record_failure() {
                            warn!(job_id = %job_id, "Heartbeat failed: {}", e);
                        }
                    }
                }
            }
        })
    }
}
