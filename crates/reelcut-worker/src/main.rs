//! Clip worker binary.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use reelcut_firestore::FirestoreClient;
use reelcut_media::{check_ffmpeg, check_ffprobe};
use reelcut_storage::{HttpFetcher, R2Client};
use reelcut_transcribe::{build_transcriber, TranscriberConfig};
use reelcut_worker::{
    FfmpegToolkit, FirestoreJobStore, JobRunner, PipelineDeps, R2ObjectStore, WorkerConfig,
};

#[tokio::main]
async fn main() {
    // Install rustls crypto provider (required for TLS/HTTPS)
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    dotenvy::dotenv().ok();

    init_tracing();
    info!("Starting reelcut-worker");

    if let Err(e) = init_metrics() {
        error!("Failed to start metrics exporter: {:#}", e);
        std::process::exit(1);
    }

    let config = WorkerConfig::from_env();
    info!("Worker config: {:?}", config);

    let deps = match build_deps(&config).await {
        Ok(deps) => deps,
        Err(e) => {
            error!("Failed to initialize worker: {:#}", e);
            std::process::exit(1);
        }
    };

    let runner = Arc::new(JobRunner::new(config, deps));

    // Stop claiming on Ctrl-C; the job in progress still finishes
    let signal_runner = Arc::clone(&runner);
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received shutdown signal");
        signal_runner.shutdown();
    });

    if let Err(e) = runner.run().await {
        error!("Runner error: {}", e);
        std::process::exit(1);
    }

    info!("Worker shutdown complete");
}

fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("reelcut=info".parse().expect("static directive"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

/// Serve Prometheus metrics when `METRICS_PORT` is set.
fn init_metrics() -> anyhow::Result<()> {
    let Ok(port) = std::env::var("METRICS_PORT") else {
        return Ok(());
    };
    let port: u16 = port.parse().context("METRICS_PORT must be a port number")?;
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .context("installing Prometheus exporter")?;
    info!("Metrics exporter listening on {}", addr);
    Ok(())
}

async fn build_deps(config: &WorkerConfig) -> anyhow::Result<PipelineDeps> {
    let ffmpeg = check_ffmpeg().context("ffmpeg")?;
    let ffprobe = check_ffprobe().context("ffprobe")?;
    info!("Using {} and {}", ffmpeg.display(), ffprobe.display());

    let firestore = FirestoreClient::from_env()
        .await
        .context("creating Firestore client")?;
    let r2 = R2Client::from_env().context("creating R2 client")?;
    let fetcher = HttpFetcher::new(config.download_timeout).context("creating HTTP fetcher")?;
    let transcriber = TranscriberConfig::from_env()
        .and_then(build_transcriber)
        .context("configuring transcription")?;
    info!(backend = transcriber.name(), "Transcription backend ready");

    Ok(PipelineDeps {
        jobs: Arc::new(FirestoreJobStore::new(firestore)),
        objects: Arc::new(R2ObjectStore::new(r2, fetcher)),
        media: Arc::new(FfmpegToolkit::new(config.ffmpeg_timeout)),
        transcriber,
    })
}
