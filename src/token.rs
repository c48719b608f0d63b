//! Access token acquisition for WeChat API
//!
//! Every privileged call obtains its token through [`TokenProvider`]. By
//! default a fresh stable token is requested for each call. An explicit cache
//! can be enabled with [`TokenProvider::with_cache`]; it holds one token and
//! refreshes it under a single lock shortly before it expires.

use std::time::{Duration, Instant};

use log::{info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::client::WechatClient;
use crate::error::WechatError;
use crate::types::AccessToken;

const REFRESH_BUFFER_SECS: u64 = 5 * 60;
/// Upper bound on how long a cached token is trusted, whatever `expires_in` says.
const MAX_TOKEN_TTL_SECS: u64 = 2 * 60 * 60;

pub struct CachedToken {
    pub token: AccessToken,
    pub expires_at: Instant,
}

impl CachedToken {
    pub fn is_expired(&self, buffer: Duration) -> bool {
        Instant::now() + buffer >= self.expires_at
    }
}

/// Response from `/cgi-bin/token` and `/cgi-bin/stable_token`
#[non_exhaustive]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AccessTokenResponse {
    /// The access token, empty on failure
    #[serde(default)]
    pub access_token: String,
    /// Token lifetime in seconds
    #[serde(default)]
    pub expires_in: i64,
    #[serde(default)]
    pub(crate) errcode: i32,
    #[serde(default)]
    pub(crate) errmsg: String,
}

impl AccessTokenResponse {
    pub fn new(access_token: impl Into<String>, expires_in: i64) -> Self {
        Self {
            access_token: access_token.into(),
            expires_in,
            errcode: 0,
            errmsg: String::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.errcode == 0
    }

    pub fn errcode(&self) -> i32 {
        self.errcode
    }

    pub fn errmsg(&self) -> &str {
        &self.errmsg
    }
}

#[derive(Debug, Serialize)]
struct StableTokenRequest<'a> {
    grant_type: &'a str,
    appid: &'a str,
    secret: &'a str,
    force_refresh: bool,
}

/// Obtains access tokens, optionally keeping the last one
pub struct TokenProvider {
    client: WechatClient,
    cache: Option<Mutex<Option<CachedToken>>>,
    refresh_buffer: Duration,
}

impl std::fmt::Debug for TokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenProvider")
            .field("caching", &self.is_caching())
            .field("refresh_buffer", &self.refresh_buffer)
            .finish_non_exhaustive()
    }
}

impl TokenProvider {
    /// A provider that requests a new token for every call.
    pub fn new(client: WechatClient) -> Self {
        Self {
            client,
            cache: None,
            refresh_buffer: Duration::from_secs(REFRESH_BUFFER_SECS),
        }
    }

    /// A provider that reuses the last stable token until it is close to expiry.
    pub fn with_cache(client: WechatClient) -> Self {
        Self {
            cache: Some(Mutex::new(None)),
            ..Self::new(client)
        }
    }

    pub fn is_caching(&self) -> bool {
        self.cache.is_some()
    }

    /// GET /cgi-bin/token
    ///
    /// # Errors
    /// `ServiceUnavailable` on transport or HTTP failure.
    pub async fn fetch_access_token(&self) -> Result<AccessTokenResponse, WechatError> {
        info!("[TokenProvider] requesting access token");
        let query = [
            ("grant_type", "client_credential"),
            ("appid", self.client.appid()),
            ("secret", self.client.secret()),
        ];
        let response: AccessTokenResponse = self.client.get("/cgi-bin/token", &query).await?;
        log_outcome(&response);
        Ok(response)
    }

    /// POST /cgi-bin/stable_token
    ///
    /// # Errors
    /// `ServiceUnavailable` on transport or HTTP failure.
    pub async fn fetch_stable_token(
        &self,
        force_refresh: bool,
    ) -> Result<AccessTokenResponse, WechatError> {
        info!(
            "[TokenProvider] requesting stable access token (force_refresh={})",
            force_refresh
        );
        let body = StableTokenRequest {
            grant_type: "client_credential",
            appid: self.client.appid(),
            secret: self.client.secret(),
            force_refresh,
        };
        let response: AccessTokenResponse =
            self.client.post("/cgi-bin/stable_token", &body).await?;
        log_outcome(&response);
        Ok(response)
    }

    /// The token to put on a privileged call.
    ///
    /// Failures are logged and yield an empty string; the platform then
    /// rejects the call that carries it.
    pub async fn request_access_token(&self) -> String {
        let Some(cache) = &self.cache else {
            return self.stable_token_or_empty().await;
        };

        let mut cache = cache.lock().await;
        if let Some(cached) = cache.as_ref() {
            if !cached.is_expired(self.refresh_buffer) {
                return cached.token.as_str().to_string();
            }
        }

        match self.fetch_stable_token(false).await {
            Ok(response) if response.is_success() => {
                if let Ok(token) = AccessToken::new(response.access_token.clone()) {
                    *cache = Some(CachedToken {
                        token,
                        expires_at: Instant::now() + token_ttl(response.expires_in),
                    });
                }
                response.access_token
            }
            Ok(response) => response.access_token,
            Err(e) => {
                warn!("[TokenProvider] stable token request failed: {}", e);
                String::new()
            }
        }
    }

    /// Drop any cached token so the next call fetches a new one.
    pub async fn invalidate(&self) {
        if let Some(cache) = &self.cache {
            *cache.lock().await = None;
        }
    }

    async fn stable_token_or_empty(&self) -> String {
        match self.fetch_stable_token(false).await {
            Ok(response) => response.access_token,
            Err(e) => {
                warn!("[TokenProvider] stable token request failed: {}", e);
                String::new()
            }
        }
    }

}

fn token_ttl(expires_in: i64) -> Duration {
    Duration::from_secs(expires_in.clamp(0, MAX_TOKEN_TTL_SECS as i64) as u64)
}

fn log_outcome(response: &AccessTokenResponse) {
    if response.is_success() {
        info!(
            "[TokenProvider] access token issued (expires_in={})",
            response.expires_in
        );
    } else {
        warn!(
            "[TokenProvider] access token refused (errcode={}): {}",
            response.errcode, response.errmsg
        );
    }
}
