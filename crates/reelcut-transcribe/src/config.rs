//! Transcription backend configuration.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{TranscribeError, TranscribeResult};

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_ASSEMBLYAI_BASE_URL: &str = "https://api.assemblyai.com";
pub const DEFAULT_OPENAI_MODEL: &str = "whisper-1";

/// Speech-to-text backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Provider {
    /// Single synchronous call
    #[default]
    OpenAi,
    /// Upload, submit, then poll
    AssemblyAi,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::AssemblyAi => "assemblyai",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = TranscribeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" | "whisper" => Ok(Provider::OpenAi),
            "assemblyai" => Ok(Provider::AssemblyAi),
            other => Err(TranscribeError::config(format!(
                "unknown TRANSCRIBE_PROVIDER: {}",
                other
            ))),
        }
    }
}

/// Transcriber configuration.
#[derive(Debug, Clone)]
pub struct TranscriberConfig {
    pub provider: Provider,
    pub api_key: String,
    /// Scheme and host of the API, without a trailing slash
    pub base_url: String,
    /// Model name (Whisper only)
    pub model: String,
    /// Delay between status polls (AssemblyAI only)
    pub poll_interval: Duration,
    /// Poll budget before giving up (AssemblyAI only)
    pub max_polls: u32,
    /// Per-request HTTP timeout
    pub request_timeout: Duration,
}

impl TranscriberConfig {
    /// Defaults for `provider` with the given key.
    pub fn new(provider: Provider, api_key: impl Into<String>) -> Self {
        let base_url = match provider {
            Provider::OpenAi => DEFAULT_OPENAI_BASE_URL,
            Provider::AssemblyAi => DEFAULT_ASSEMBLYAI_BASE_URL,
        };
        Self {
            provider,
            api_key: api_key.into(),
            base_url: base_url.to_string(),
            model: DEFAULT_OPENAI_MODEL.to_string(),
            poll_interval: Duration::from_millis(1500),
            max_polls: 400,
            request_timeout: Duration::from_secs(600),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_polling(mut self, interval: Duration, max_polls: u32) -> Self {
        self.poll_interval = interval;
        self.max_polls = max_polls;
        self
    }

    /// Create config from environment variables.
    ///
    /// The API key of the selected provider is required.
    pub fn from_env() -> TranscribeResult<Self> {
        let provider = match std::env::var("TRANSCRIBE_PROVIDER") {
            Ok(v) if !v.trim().is_empty() => v.parse()?,
            _ => Provider::default(),
        };

        let (key_var, url_var) = match provider {
            Provider::OpenAi => ("OPENAI_API_KEY", "OPENAI_BASE_URL"),
            Provider::AssemblyAi => ("ASSEMBLYAI_API_KEY", "ASSEMBLYAI_BASE_URL"),
        };

        let api_key = std::env::var(key_var)
            .ok()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                TranscribeError::config(format!("{} must be set for provider {}", key_var, provider))
            })?;

        let mut config = Self::new(provider, api_key);

        if let Ok(url) = std::env::var(url_var) {
            if !url.is_empty() {
                config = config.with_base_url(url);
            }
        }
        if let Ok(model) = std::env::var("OPENAI_MODEL") {
            if !model.is_empty() {
                config.model = model;
            }
        }

        config.poll_interval = Duration::from_millis(env_or(
            "TRANSCRIBE_POLL_INTERVAL_MS",
            config.poll_interval.as_millis() as u64,
        ));
        config.max_polls = env_or("TRANSCRIBE_MAX_POLLS", config.max_polls);
        config.request_timeout = Duration::from_secs(env_or(
            "TRANSCRIBE_TIMEOUT_SECS",
            config.request_timeout.as_secs(),
        ));

        Ok(config)
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
