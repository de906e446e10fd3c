//! Worker configuration.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::retry::RetryConfig;

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Parent directory of the per-job temporary directories
    pub work_dir: PathBuf,
    /// Sleep between polls when the queue is empty
    pub poll_interval: Duration,
    /// Sleep after a failed poll (store unreachable etc.)
    pub error_backoff: Duration,
    /// Upper bound on a whole job
    pub job_timeout: Duration,
    /// A processing job without a heartbeat for this long may be reclaimed
    pub claim_stale_after: Duration,
    /// Interval for refreshing `heartbeat_at` while processing
    pub job_heartbeat_interval: Duration,
    /// Claims per job before it is failed for good
    pub max_attempts: u32,
    /// Windows rendered concurrently within one job
    pub max_parallel_renders: usize,
    /// Lifetime of the presigned source URL
    pub download_url_ttl: Duration,
    /// Timeout for the source download
    pub download_timeout: Duration,
    /// Upper bound on a single ffmpeg invocation
    pub ffmpeg_timeout: Duration,
    /// Duration assumed when the probe reports none
    pub fallback_duration_secs: f64,
    /// Fail instead of assuming `fallback_duration_secs`
    pub strict_probe: bool,
    /// Bucket holding uploaded source videos
    pub source_bucket: String,
    /// Bucket receiving rendered clips
    pub clips_bucket: String,
    /// Key prefix for rendered clips
    pub clips_key_prefix: String,
    /// In-place retry policy for storage and transcription transport
    pub retry: RetryConfig,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("/tmp/reelcut"),
            poll_interval: Duration::from_millis(1500),
            error_backoff: Duration::from_secs(5),
            job_timeout: Duration::from_secs(3600), // 1 hour
            claim_stale_after: Duration::from_secs(300), // 5 minutes
            job_heartbeat_interval: Duration::from_secs(30),
            max_attempts: 3,
            max_parallel_renders: 1,
            download_url_ttl: Duration::from_secs(900),
            download_timeout: Duration::from_secs(600),
            ffmpeg_timeout: Duration::from_secs(1800),
            fallback_duration_secs: 180.0,
            strict_probe: false,
            source_bucket: "videos".to_string(),
            clips_bucket: "clips".to_string(),
            clips_key_prefix: "projects".to_string(),
            retry: RetryConfig::default(),
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let claim_stale_after = Duration::from_secs(env_or("WORKER_CLAIM_STALE_SECS", 300));

        Self {
            work_dir: std::env::var("WORKER_WORK_DIR")
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            poll_interval: Duration::from_millis(env_or("WORKER_POLL_INTERVAL_MS", 1500)),
            error_backoff: Duration::from_millis(env_or("WORKER_ERROR_BACKOFF_MS", 5000)),
            job_timeout: Duration::from_secs(env_or("WORKER_JOB_TIMEOUT", 3600)),
            claim_stale_after,
            job_heartbeat_interval: heartbeat_within(
                Duration::from_secs(env_or("WORKER_JOB_HEARTBEAT_SECS", 30)),
                claim_stale_after,
            ),
            max_attempts: env_or("WORKER_MAX_ATTEMPTS", defaults.max_attempts).max(1),
            max_parallel_renders: env_or("WORKER_MAX_PARALLEL_RENDERS", defaults.max_parallel_renders)
                .max(1),
            download_url_ttl: Duration::from_secs(env_or("WORKER_DOWNLOAD_URL_TTL_SECS", 900)),
            download_timeout: Duration::from_secs(env_or("WORKER_DOWNLOAD_TIMEOUT_SECS", 600)),
            ffmpeg_timeout: Duration::from_secs(env_or("WORKER_FFMPEG_TIMEOUT_SECS", 1800)),
            fallback_duration_secs: env_or(
                "WORKER_FALLBACK_DURATION_SECS",
                defaults.fallback_duration_secs,
            ),
            strict_probe: env_flag("WORKER_STRICT_PROBE"),
            source_bucket: env_string("SOURCE_BUCKET", defaults.source_bucket),
            clips_bucket: env_string("CLIPS_BUCKET", defaults.clips_bucket),
            clips_key_prefix: env_string("CLIPS_KEY_PREFIX", defaults.clips_key_prefix),
            retry: defaults.retry,
        }
    }

    /// Staleness window as a chrono duration, for comparing against timestamps.
    pub fn stale_after(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.claim_stale_after.as_secs() as i64)
    }
}

/// Keep at least two heartbeats inside one staleness window, so a live
/// claim is never reclaimed.
fn heartbeat_within(heartbeat: Duration, stale_after: Duration) -> Duration {
    let limit = stale_after / 2;
    if heartbeat > limit {
        warn!(
            "WORKER_JOB_HEARTBEAT_SECS ({}s) too long for WORKER_CLAIM_STALE_SECS ({}s), using {}ms",
            heartbeat.as_secs(),
            stale_after.as_secs(),
            limit.as_millis()
        );
        return limit;
    }
    heartbeat
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn env_string(name: &str, default: String) -> String {
    std::env::var(name)
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or(default)
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: &[&str] = &[
        "WORKER_WORK_DIR",
        "WORKER_POLL_INTERVAL_MS",
        "WORKER_JOB_TIMEOUT",
        "WORKER_CLAIM_STALE_SECS",
        "WORKER_JOB_HEARTBEAT_SECS",
        "WORKER_MAX_ATTEMPTS",
        "WORKER_MAX_PARALLEL_RENDERS",
        "WORKER_STRICT_PROBE",
        "CLIPS_BUCKET",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        clear_env();
        let config = WorkerConfig::from_env();

        assert_eq!(config.poll_interval, Duration::from_millis(1500));
        assert_eq!(config.job_timeout, Duration::from_secs(3600));
        assert_eq!(config.claim_stale_after, Duration::from_secs(300));
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.max_parallel_renders, 1);
        assert_eq!(config.fallback_duration_secs, 180.0);
        assert!(!config.strict_probe);
        assert_eq!(config.source_bucket, "videos");
        assert_eq!(config.clips_bucket, "clips");
        assert_eq!(config.clips_key_prefix, "projects");
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        clear_env();
        std::env::set_var("WORKER_WORK_DIR", "/var/tmp/clips");
        std::env::set_var("WORKER_CLAIM_STALE_SECS", "60");
        std::env::set_var("WORKER_MAX_PARALLEL_RENDERS", "0");
        std::env::set_var("WORKER_STRICT_PROBE", "true");
        std::env::set_var("CLIPS_BUCKET", "");

        let config = WorkerConfig::from_env();
        assert_eq!(config.work_dir, PathBuf::from("/var/tmp/clips"));
        assert_eq!(config.stale_after(), chrono::Duration::seconds(60));
        assert_eq!(config.max_parallel_renders, 1);
        assert!(config.strict_probe);
        assert_eq!(config.clips_bucket, "clips");
        clear_env();
    }

    #[test]
    #[serial]
    fn test_heartbeat_clamped_below_staleness() {
        clear_env();
        std::env::set_var("WORKER_CLAIM_STALE_SECS", "60");
        std::env::set_var("WORKER_JOB_HEARTBEAT_SECS", "90");

        let config = WorkerConfig::from_env();
        assert_eq!(config.job_heartbeat_interval, Duration::from_secs(30));
        assert!(config.job_heartbeat_interval < config.claim_stale_after);

        std::env::set_var("WORKER_JOB_HEARTBEAT_SECS", "10");
        assert_eq!(WorkerConfig::from_env().job_heartbeat_interval, Duration::from_secs(10));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_unparseable_value_uses_default() {
        clear_env();
        std::env::set_var("WORKER_MAX_ATTEMPTS", "lots");
        assert_eq!(WorkerConfig::from_env().max_attempts, 3);
        clear_env();
    }
}
