//! Token caching for Firestore authentication.
//!
//! - Refresh margin so a token never expires mid-request
//! - Single-flight refresh under a write lock
//! - Falls back to the current token while it is still usable
//! - A fixed token for the Firestore emulator

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use gcp_auth::TokenProvider;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::{FirestoreError, FirestoreResult};

/// Refresh a token 60 seconds before it expires.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// OAuth scope for Firestore/Datastore access.
pub const FIRESTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";

/// Where access tokens come from.
#[derive(Clone)]
pub enum TokenSource {
    /// Service-account OAuth tokens
    Provider(Arc<dyn TokenProvider>),
    /// A constant bearer value (the emulator accepts `owner`)
    Static(String),
}

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_valid(&self) -> bool {
        Instant::now() + TOKEN_REFRESH_MARGIN < self.expires_at
    }

    fn is_usable(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// Thread-safe token cache with single-flight refresh.
pub struct TokenCache {
    source: TokenSource,
    cache: RwLock<Option<CachedToken>>,
}

impl TokenCache {
    pub fn new(source: TokenSource) -> Self {
        Self {
            source,
            cache: RwLock::new(None),
        }
    }

    /// Drop the cached token so the next call fetches a fresh one.
    pub async fn invalidate(&self) {
        *self.cache.write().await = None;
    }

    /// Get a valid access token, refreshing if necessary.
    pub async fn get_token(&self) -> FirestoreResult<String> {
        let provider = match &self.source {
            TokenSource::Static(token) => return Ok(token.clone()),
            TokenSource::Provider(p) => p,
        };

        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref().filter(|c| c.is_valid()) {
                return Ok(cached.access_token.clone());
            }
        }

        let mut cache = self.cache.write().await;

        // Another task may have refreshed while we waited for the lock
        if let Some(cached) = cache.as_ref().filter(|c| c.is_valid()) {
            return Ok(cached.access_token.clone());
        }

        match provider.token(&[FIRESTORE_SCOPE]).await {
            Ok(token) => {
                let access_token = token.as_str().to_string();
                let ttl = (token.expires_at() - Utc::now())
                    .to_std()
                    .unwrap_or(Duration::ZERO);

                *cache = Some(CachedToken {
                    access_token: access_token.clone(),
                    expires_at: Instant::now() + ttl,
                });

                debug!(ttl_secs = ttl.as_secs(), "Refreshed Firestore auth token");
                Ok(access_token)
            }
            Err(e) => {
                if let Some(cached) = cache.as_ref().filter(|c| c.is_usable()) {
                    warn!("Token refresh failed, using existing token: {}", e);
                    return Ok(cached.access_token.clone());
                }
                Err(FirestoreError::auth_error(format!(
                    "Failed to obtain auth token: {}",
                    e
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_token_is_returned_verbatim() {
        let cache = TokenCache::new(TokenSource::Static("owner".into()));
        assert_eq!(cache.get_token().await.unwrap(), "owner");
        cache.invalidate().await;
        assert_eq!(cache.get_token().await.unwrap(), "owner");
    }

    #[test]
    fn test_cached_token_margin() {
        let almost_expired = CachedToken {
            access_token: "t".into(),
            expires_at: Instant::now() + Duration::from_secs(30),
        };
        assert!(!almost_expired.is_valid());
        assert!(almost_expired.is_usable());
    }

    #[test]
    fn test_firestore_scope() {
        assert!(FIRESTORE_SCOPE.contains("datastore"));
    }
}
