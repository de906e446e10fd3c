//! Worker metrics.

use std::time::Duration;

use metrics::{counter, histogram};

pub mod names {
    /// Finished job runs by outcome (`done`, `unsettled`, `requeued`, `failed`, `abandoned`).
    pub const JOBS_TOTAL: &str = "reelcut_jobs_total";

    /// Wall time of one job run in seconds.
    pub const JOB_DURATION_SECONDS: &str = "reelcut_job_duration_seconds";

    /// Render time of one clip (subtitles, encode, thumbnail) in seconds.
    pub const CLIP_RENDER_SECONDS: &str = "reelcut_clip_render_seconds";
}

pub fn record_job(outcome: &'static str, elapsed: Duration) {
    counter!(names::JOBS_TOTAL, "outcome" => outcome).increment(1);
    histogram!(names::JOB_DURATION_SECONDS, "outcome" => outcome).record(elapsed.as_secs_f64());
}

pub fn record_render(elapsed: Duration) {
    histogram!(names::CLIP_RENDER_SECONDS).record(elapsed.as_secs_f64());
}
