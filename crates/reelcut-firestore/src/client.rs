//! Firestore REST API client.
//!
//! Production-grade client with:
//! - Token caching with refresh margin
//! - HTTP client tuning (pooling, timeouts)
//! - Exponential backoff with jitter
//! - Observability (tracing spans, metrics)
//! - Local emulator support via `FIRESTORE_EMULATOR_HOST`

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use gcp_auth::CustomServiceAccount;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use tracing::{debug, info, info_span, Instrument};

use crate::error::{FirestoreError, FirestoreResult};
use crate::metrics::record_request;
use crate::retry::RetryConfig;
use crate::token_cache::{TokenCache, TokenSource};
use crate::types::{Document, RunQueryRequest, RunQueryResponse, StructuredQuery, Value};

// =============================================================================
// Configuration
// =============================================================================

/// Firestore client configuration.
#[derive(Debug, Clone)]
pub struct FirestoreConfig {
    /// GCP project ID
    pub project_id: String,
    /// Database ID (usually "(default)")
    pub database_id: String,
    /// Request timeout
    pub timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
    /// Retry configuration
    pub retry: RetryConfig,
    /// `host:port` of a local emulator; disables OAuth when set
    pub emulator_host: Option<String>,
}

impl FirestoreConfig {
    /// Create config from environment variables.
    pub fn from_env() -> FirestoreResult<Self> {
        let project_id = std::env::var("GCP_PROJECT_ID")
            .or_else(|_| std::env::var("FIREBASE_PROJECT_ID"))
            .map_err(|_| {
                FirestoreError::auth_error(
                    "GCP_PROJECT_ID or FIREBASE_PROJECT_ID must be set to access Firestore",
                )
            })?;

        if project_id.is_empty() {
            return Err(FirestoreError::auth_error(
                "GCP_PROJECT_ID or FIREBASE_PROJECT_ID cannot be empty",
            ));
        }

        let connect_timeout_secs: u64 = std::env::var("FIRESTORE_CONNECT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5);

        Ok(Self {
            project_id,
            database_id: std::env::var("FIRESTORE_DATABASE_ID")
                .unwrap_or_else(|_| "(default)".to_string()),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(connect_timeout_secs),
            retry: RetryConfig::from_env(),
            emulator_host: std::env::var("FIRESTORE_EMULATOR_HOST")
                .ok()
                .filter(|h| !h.is_empty()),
        })
    }

    /// REST root for documents of this database.
    pub fn base_url(&self) -> String {
        match &self.emulator_host {
            Some(host) => format!(
                "http://{}/v1/projects/{}/databases/{}/documents",
                host, self.project_id, self.database_id
            ),
            None => format!(
                "https://firestore.googleapis.com/v1/projects/{}/databases/{}/documents",
                self.project_id, self.database_id
            ),
        }
    }
}

// =============================================================================
// Client
// =============================================================================

/// Firestore REST API client.
#[derive(Clone)]
pub struct FirestoreClient {
    http: Client,
    config: FirestoreConfig,
    base_url: String,
    token_cache: Arc<TokenCache>,
}

impl FirestoreClient {
    /// Create a new Firestore client.
    pub async fn new(config: FirestoreConfig) -> FirestoreResult<Self> {
        let source = match &config.emulator_host {
            Some(host) => {
                info!(emulator_host = %host, "Using Firestore emulator");
                TokenSource::Static("owner".to_string())
            }
            None => Self::create_auth_provider()?,
        };
        let base_url = config.base_url();
        Self::with_base_url(config, base_url, source)
    }

    /// Create a client against an explicit REST root.
    pub fn with_base_url(
        config: FirestoreConfig,
        base_url: impl Into<String>,
        source: TokenSource,
    ) -> FirestoreResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .user_agent(concat!("reelcut-firestore/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(FirestoreError::Network)?;

        Ok(Self {
            http,
            config,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token_cache: Arc::new(TokenCache::new(source)),
        })
    }

    fn create_auth_provider() -> FirestoreResult<TokenSource> {
        let service_account = CustomServiceAccount::from_env().map_err(|e| {
            FirestoreError::auth_error(format!("Failed to load service account: {}", e))
        })?;

        match service_account {
            Some(sa) => Ok(TokenSource::Provider(Arc::new(sa))),
            None => Err(FirestoreError::auth_error(
                "GOOGLE_APPLICATION_CREDENTIALS not set. \
                 Set it to the path of your service account JSON file.",
            )),
        }
    }

    /// Create from environment variables.
    pub async fn from_env() -> FirestoreResult<Self> {
        let config = FirestoreConfig::from_env()?;
        Self::new(config).await
    }

    pub fn config(&self) -> &FirestoreConfig {
        &self.config
    }

    fn is_access_token_expired(body: &str) -> bool {
        body.contains("ACCESS_TOKEN_EXPIRED") || body.contains("\"UNAUTHENTICATED\"")
    }

    /// Build document path.
    fn document_path(&self, collection: &str, doc_id: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url,
            collection,
            urlencoding::encode(doc_id)
        )
    }

    /// Send a request, refreshing the token once if the server reports it expired.
    async fn send<F>(&self, url: &str, build: F) -> FirestoreResult<Response>
    where
        F: Fn(&str) -> RequestBuilder,
    {
        let token = self.token_cache.get_token().await?;
        let response = build(&token).send().await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        if !Self::is_access_token_expired(&body) {
            return Err(FirestoreError::from_http_status(
                401,
                format!("{} failed: {}", url, body),
            ));
        }

        debug!("Access token expired, refreshing");
        self.token_cache.invalidate().await;
        let token = self.token_cache.get_token().await?;
        Ok(build(&token).send().await?)
    }

    // =========================================================================
    // CRUD Operations
    // =========================================================================

    /// Get a document.
    pub async fn get_document(
        &self,
        collection: &str,
        doc_id: &str,
    ) -> FirestoreResult<Option<Document>> {
        let url = self.document_path(collection, doc_id);

        self.execute_request("get_document", collection, Some(doc_id), async {
            let response = self
                .send(&url, |token| self.http.get(&url).bearer_auth(token))
                .await?;

            match response.status() {
                StatusCode::OK => Ok(Some(response.json().await?)),
                StatusCode::NOT_FOUND => Ok(None),
                status => Err(Self::handle_error_response(status, &url, response).await),
            }
        })
        .await
    }

    /// Update a document (merge).
    ///
    /// Without a precondition PATCH creates the document when it is missing,
    /// which makes this an idempotent upsert.
    pub async fn update_document(
        &self,
        collection: &str,
        doc_id: &str,
        fields: HashMap<String, Value>,
        update_mask: Option<Vec<String>>,
    ) -> FirestoreResult<Document> {
        self.patch("update_document", collection, doc_id, fields, update_mask, None)
            .await
    }

    /// Update with optimistic concurrency control.
    ///
    /// The write only lands if the stored document still has `update_time`;
    /// otherwise `PreconditionFailed` is returned.
    pub async fn update_document_with_precondition(
        &self,
        collection: &str,
        doc_id: &str,
        fields: HashMap<String, Value>,
        update_mask: Option<Vec<String>>,
        update_time: &str,
    ) -> FirestoreResult<Document> {
        self.patch(
            "update_document_precondition",
            collection,
            doc_id,
            fields,
            update_mask,
            Some(update_time),
        )
        .await
    }

    async fn patch(
        &self,
        operation: &str,
        collection: &str,
        doc_id: &str,
        fields: HashMap<String, Value>,
        update_mask: Option<Vec<String>>,
        update_time: Option<&str>,
    ) -> FirestoreResult<Document> {
        let mut url = self.document_path(collection, doc_id);
        let mut params: Vec<String> = Vec::new();

        if let Some(mask) = update_mask {
            params.extend(
                mask.iter()
                    .map(|f| format!("updateMask.fieldPaths={}", urlencoding::encode(f))),
            );
        }
        if let Some(ts) = update_time {
            params.push(format!(
                "currentDocument.updateTime={}",
                urlencoding::encode(ts)
            ));
        }
        if !params.is_empty() {
            url = format!("{}?{}", url, params.join("&"));
        }

        let body = Document::new(fields);

        self.execute_request(operation, collection, Some(doc_id), async {
            let response = self
                .send(&url, |token| self.http.patch(&url).bearer_auth(token).json(&body))
                .await?;

            match response.status() {
                StatusCode::OK => Ok(response.json().await?),
                StatusCode::PRECONDITION_FAILED | StatusCode::CONFLICT
                    if update_time.is_some() =>
                {
                    let body_text = response.text().await.unwrap_or_default();
                    Err(FirestoreError::PreconditionFailed(format!(
                        "{}/{}: {}",
                        collection, doc_id, body_text
                    )))
                }
                StatusCode::NOT_FOUND => Err(FirestoreError::not_found(format!(
                    "{}/{}",
                    collection, doc_id
                ))),
                status => Err(Self::handle_error_response(status, &url, response).await),
            }
        })
        .await
    }

    /// Execute with retry.
    pub async fn with_retry<T, F, Fut>(&self, operation: &str, op: F) -> FirestoreResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = FirestoreResult<T>>,
    {
        crate::retry::with_retry(&self.config.retry, operation, op).await
    }

    // =========================================================================
    // Query Operations
    // =========================================================================

    /// Run a structured query.
    ///
    /// `parent_path` is the document containing the queried collection;
    /// an empty string queries a root collection.
    pub async fn run_query(
        &self,
        parent_path: &str,
        query: StructuredQuery,
    ) -> FirestoreResult<Vec<Document>> {
        let url = if parent_path.is_empty() {
            format!("{}:runQuery", self.base_url)
        } else {
            format!("{}/{}:runQuery", self.base_url, parent_path)
        };
        let collection = query
            .from
            .first()
            .map(|c| c.collection_id.clone())
            .unwrap_or_default();
        let request = RunQueryRequest {
            structured_query: query,
        };

        self.execute_request("run_query", &collection, None, async {
            let response = self
                .send(&url, |token| {
                    self.http.post(&url).bearer_auth(token).json(&request)
                })
                .await?;

            match response.status() {
                StatusCode::OK => {
                    let body = response.text().await.unwrap_or_default();
                    // runQuery returns a JSON array of RunQueryResponse objects
                    let responses: Vec<RunQueryResponse> =
                        serde_json::from_str(&body).map_err(|e| {
                            FirestoreError::invalid_response(format!(
                                "Failed to parse runQuery response: {} (body prefix: {})",
                                e,
                                body.chars().take(200).collect::<String>()
                            ))
                        })?;

                    Ok(responses.into_iter().filter_map(|r| r.document).collect())
                }
                status => Err(Self::handle_error_response(status, &url, response).await),
            }
        })
        .await
    }

    // =========================================================================
    // Internal Helpers
    // =========================================================================

    /// Execute a request with tracing and metrics.
    async fn execute_request<T, F>(
        &self,
        operation: &str,
        collection: &str,
        doc_id: Option<&str>,
        fut: F,
    ) -> FirestoreResult<T>
    where
        F: std::future::Future<Output = FirestoreResult<T>>,
    {
        let span = if let Some(id) = doc_id {
            info_span!("firestore_request", operation = %operation, collection = %collection, doc_id = %id)
        } else {
            info_span!("firestore_request", operation = %operation, collection = %collection)
        };

        let start = Instant::now();
        let result = fut.instrument(span).await;
        let latency_ms = start.elapsed().as_millis() as f64;

        let status = match &result {
            Ok(_) => 200,
            Err(e) => e.http_status().unwrap_or(500),
        };
        record_request(operation, status, latency_ms);

        result
    }

    async fn handle_error_response(status: StatusCode, url: &str, response: Response) -> FirestoreError {
        let body = response.text().await.unwrap_or_default();
        FirestoreError::from_http_status(status.as_u16(), format!("{} failed: {}", url, body))
    }
}

// =============================================================================
// Tests
// =============================================================================
