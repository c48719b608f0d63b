//! WeChat HTTP Client
//!
//! Provides the HTTP client wrapper and the shared response translation used
//! by every WeChat API call.

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tower::Service;

use crate::config::ClientConfig;
use crate::error::WechatError;

pub(crate) const DEFAULT_BASE_URL: &str = "https://api.weixin.qq.com";
pub(crate) const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub(crate) const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

pub(crate) type MiddlewareFuture =
    Pin<Box<dyn Future<Output = Result<reqwest::Response, reqwest::Error>> + Send>>;
pub(crate) type MiddlewareExecutor =
    Arc<dyn Fn(reqwest::Request) -> MiddlewareFuture + Send + Sync>;

/// WeChat API Client
///
/// Reusable HTTP client for calling WeChat APIs.
/// Built with reqwest for async HTTP requests.
#[derive(Clone)]
pub struct WechatClient {
    http: Client,
    config: ClientConfig,
    base_url: String,
    middleware_executor: Option<MiddlewareExecutor>,
}

impl std::fmt::Debug for WechatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WechatClient")
            .field("appid", self.config.app_id())
            .field("base_url", &self.base_url)
            .field(
                "middleware_executor",
                &self.middleware_executor.as_ref().map(|_| ".."),
            )
            .finish_non_exhaustive()
    }
}

impl WechatClient {
    /// Create a new client builder
    pub fn builder() -> WechatClientBuilder {
        WechatClientBuilder::default()
    }

    /// Get the appid
    pub fn appid(&self) -> &str {
        self.config.app_id().as_str()
    }

    pub(crate) fn secret(&self) -> &str {
        self.config.app_secret().as_str()
    }

    /// Get the client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn append_access_token(path: &str, access_token: &str) -> String {
        let encoded = utf8_percent_encode(access_token, NON_ALPHANUMERIC);
        let separator = if path.contains('?') { '&' } else { '?' };
        format!("{path}{separator}access_token={encoded}")
    }

    pub(crate) fn with_middleware_executor(mut self, executor: MiddlewareExecutor) -> Self {
        self.middleware_executor = Some(executor);
        self
    }

    async fn send_request(
        &self,
        request: reqwest::Request,
    ) -> Result<reqwest::Response, reqwest::Error> {
        if let Some(executor) = &self.middleware_executor {
            (executor)(request).await
        } else {
            self.http.execute(request).await
        }
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        request: reqwest::Request,
    ) -> Result<T, WechatError> {
        let method = request.method().clone();
        let path = request.url().path().to_string();

        let response = self.send_request(request).await.map_err(|e| {
            log::warn!("[WechatClient] {} {} failed: {}", method, path, e);
            WechatError::from(e)
        })?;

        process_response(response).await
    }

    /// Make a GET request to WeChat API
    ///
    /// # Arguments
    /// * `path` - API endpoint path (e.g., "/cgi-bin/token")
    /// * `query` - Query parameters as key-value pairs, sent in the given order
    ///
    /// # Errors
    /// `ServiceUnavailable` for transport failures, non-2xx statuses and
    /// undecodable bodies.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, WechatError> {
        let url = format!("{}{}", self.base_url, path);
        let request = self.http.get(url).query(query).build()?;
        self.execute(request).await
    }

    /// Make a POST request to WeChat API with a JSON body
    ///
    /// # Errors
    /// `ServiceUnavailable` for transport failures, non-2xx statuses and
    /// undecodable bodies.
    pub async fn post<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, WechatError> {
        let url = format!("{}{}", self.base_url, path);
        let request = self.http.post(url).json(body).build()?;
        self.execute(request).await
    }
}

/// Translate a completed HTTP response into a parsed body.
///
/// Any non-2xx status becomes `ServiceUnavailable` carrying the status and
/// the response text. The business `errcode` is left for the caller.
pub(crate) async fn process_response<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, WechatError> {
    let status = response.status();

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let message = if body.trim().is_empty() {
            status.to_string()
        } else {
            format!("{}: {}", status, body.trim())
        };
        return Err(WechatError::ServiceUnavailable {
            status: Some(status.as_u16()),
            message,
        });
    }

    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| WechatError::ServiceUnavailable {
        status: Some(status.as_u16()),
        message: format!("invalid response body: {e}"),
    })
}

impl Service<reqwest::Request> for WechatClient {
    type Response = reqwest::Response;
    type Error = reqwest::Error;
    type Future = MiddlewareFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: reqwest::Request) -> Self::Future {
        let client = self.http.clone();
        Box::pin(async move { client.execute(req).await })
    }
}

/// Builder for WechatClient
///
/// # Example
///
/// ```rust
/// use wechat_miniprogram::client::WechatClient;
/// use wechat_miniprogram::config::ClientConfig;
/// use wechat_miniprogram::types::{AppId, AppSecret};
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = ClientConfig::new(AppId::new("wx123")?, AppSecret::new("secret")?);
///     let client = WechatClient::builder().config(config).build()?;
///     assert_eq!(client.appid(), "wx123");
///     Ok(())
/// }
/// ```
#[derive(Debug, Default)]
pub struct WechatClientBuilder {
    config: Option<ClientConfig>,
    base_url: Option<String>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
}

impl WechatClientBuilder {
    /// Set the credentials
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the base URL for API calls
    ///
    /// Default: `<https://api.weixin.qq.com>`
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the total timeout for requests
    ///
    /// Default: 30 seconds
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the connection timeout
    ///
    /// Default: 10 seconds
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Build the WechatClient
    ///
    /// # Errors
    /// `InvalidParams` if no configuration was given, `Config` if the base
    /// URL is not http(s) or the HTTP client cannot be built.
    pub fn build(self) -> Result<WechatClient, WechatError> {
        let config = self
            .config
            .ok_or_else(|| WechatError::InvalidParams("appid and appsecret are required".into()))?;

        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(WechatError::Config(format!(
                "base_url must start with http:// or https://, got: {}",
                base_url
            )));
        }

        let timeout = self
            .timeout
            .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        let connect_timeout = self
            .connect_timeout
            .unwrap_or(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS));

        let http = Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| WechatError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(WechatClient {
            http,
            config,
            base_url,
            middleware_executor: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AppId, AppSecret};

    fn test_config() -> ClientConfig {
        ClientConfig::new(
            AppId::new("wx1234567890abcdef").unwrap(),
            AppSecret::new("secret1234567890ab").unwrap(),
        )
    }

    #[test]
    fn test_builder_default_values() {
        let client = WechatClient::builder().config(test_config()).build().unwrap();

        assert_eq!(client.appid(), "wx1234567890abcdef");
        assert_eq!(client.secret(), "secret1234567890ab");
        assert_eq!(client.base_url(), DEFAULT_BASE_URL);
    }

    #[test]
    fn test_builder_custom_base_url_trims_slash() {
        let client = WechatClient::builder()
            .config(test_config())
            .base_url("https://custom.api.example.com/")
            .build()
            .unwrap();

        assert_eq!(client.base_url(), "https://custom.api.example.com");
    }

    #[test]
    fn test_builder_custom_timeouts() {
        let client = WechatClient::builder()
            .config(test_config())
            .timeout(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .unwrap();

        assert_eq!(client.base_url(), DEFAULT_BASE_URL);
    }

    #[test]
    fn test_builder_missing_config() {
        let result = WechatClient::builder().build();
        assert!(matches!(result, Err(WechatError::InvalidParams(_))));
    }

    #[test]
    fn test_builder_rejects_bad_scheme() {
        let result = WechatClient::builder()
            .config(test_config())
            .base_url("ftp://example.com")
            .build();
        assert!(matches!(result, Err(WechatError::Config(_))));
    }

    #[test]
    fn test_append_access_token() {
        assert_eq!(
            WechatClient::append_access_token("/wxa/msg_sec_check", "abc"),
            "/wxa/msg_sec_check?access_token=abc"
        );
        assert_eq!(
            WechatClient::append_access_token("/path?x=1", "a+b/c"),
            "/path?x=1&access_token=a%2Bb%2Fc"
        );
        assert_eq!(
            WechatClient::append_access_token("/wxa/checksession", ""),
            "/wxa/checksession?access_token="
        );
    }

    #[test]
    fn test_debug_hides_secret() {
        let client = WechatClient::builder().config(test_config()).build().unwrap();
        let debug = format!("{:?}", client);
        assert!(debug.contains("wx1234567890abcdef"));
        assert!(!debug.contains("secret1234567890ab"));
    }
}
