use std::sync::Arc;
use std::time::Duration;

use reqwest::{Request as ReqwestRequest, Response as ReqwestResponse};
use tower::{Layer, Service};

use crate::api::WechatContext;
use crate::config::ClientConfig;
use crate::crypto::{PayloadCipher, Xxtea};
use crate::error::WechatError;
use crate::token::TokenProvider;
use crate::types::{AppId, AppSecret};

use super::wechat_client::{MiddlewareExecutor, WechatClient};
use super::Miniprogram;

/// Builder for [`Miniprogram`]
///
/// Credentials come either from a [`ClientConfig`] or from
/// [`appid`](Self::appid) + [`secret`](Self::secret).
#[must_use]
pub struct MiniprogramBuilder<M = ()> {
    config: Option<ClientConfig>,
    appid: Option<AppId>,
    secret: Option<AppSecret>,
    base_url: Option<String>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    cache_tokens: bool,
    cipher: Option<Arc<dyn PayloadCipher>>,
    middleware: Option<M>,
}

impl Default for MiniprogramBuilder<()> {
    fn default() -> Self {
        Self {
            config: None,
            appid: None,
            secret: None,
            base_url: None,
            timeout: None,
            connect_timeout: None,
            cache_tokens: false,
            cipher: None,
            middleware: None,
        }
    }
}

impl<M> std::fmt::Debug for MiniprogramBuilder<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiniprogramBuilder")
            .field("config", &self.config)
            .field("appid", &self.appid)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("cache_tokens", &self.cache_tokens)
            .field("middleware", &self.middleware.as_ref().map(|_| ".."))
            .finish_non_exhaustive()
    }
}

impl<M> MiniprogramBuilder<M> {
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn appid(mut self, appid: AppId) -> Self {
        self.appid = Some(appid);
        self
    }

    pub fn secret(mut self, secret: AppSecret) -> Self {
        self.secret = Some(secret);
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Reuse the stable access token until shortly before it expires.
    ///
    /// Off by default: each privileged call then requests its own token.
    pub fn cache_tokens(mut self, enabled: bool) -> Self {
        self.cache_tokens = enabled;
        self
    }

    /// Replace the XXTEA payload cipher.
    pub fn cipher(mut self, cipher: impl PayloadCipher + 'static) -> Self {
        self.cipher = Some(Arc::new(cipher));
        self
    }

    pub fn with_middleware<M2>(self, middleware: M2) -> MiniprogramBuilder<M2>
    where
        M2: Layer<WechatClient> + Clone + Send + Sync + 'static,
    {
        MiniprogramBuilder {
            config: self.config,
            appid: self.appid,
            secret: self.secret,
            base_url: self.base_url,
            timeout: self.timeout,
            connect_timeout: self.connect_timeout,
            cache_tokens: self.cache_tokens,
            cipher: self.cipher,
            middleware: Some(middleware),
        }
    }

    /// Build the client
    ///
    /// # Errors
    /// `InvalidParams` when no credentials were given, `Config` for a bad
    /// base URL or HTTP client setup.
    pub fn build(self) -> Result<Miniprogram, WechatError>
    where
        M: Layer<WechatClient> + Clone + Send + Sync + 'static,
        M::Service: Service<ReqwestRequest, Response = ReqwestResponse, Error = reqwest::Error>
            + Clone
            + Send
            + Sync
            + 'static,
        <M::Service as Service<ReqwestRequest>>::Future: Send + 'static,
    {
        let config = match (self.config, self.appid, self.secret) {
            (Some(config), _, _) => config,
            (None, Some(appid), Some(secret)) => ClientConfig::new(appid, secret),
            (None, None, _) => return Err(WechatError::invalid("appid")),
            (None, Some(_), None) => return Err(WechatError::invalid("appsecret")),
        };

        let mut builder = WechatClient::builder().config(config);
        if let Some(base_url) = self.base_url {
            builder = builder.base_url(base_url);
        }
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(connect_timeout) = self.connect_timeout {
            builder = builder.connect_timeout(connect_timeout);
        }
        let mut client = builder.build()?;

        if let Some(middleware) = self.middleware {
            let service = middleware.layer(client.clone());
            let executor = make_middleware_executor(service);
            client = client.with_middleware_executor(executor);
        }

        let tokens = if self.cache_tokens {
            TokenProvider::with_cache(client.clone())
        } else {
            TokenProvider::new(client.clone())
        };
        let cipher = self.cipher.unwrap_or_else(|| Arc::new(Xxtea));

        let context = Arc::new(WechatContext::new(
            Arc::new(client),
            Arc::new(tokens),
            cipher,
        ));

        Ok(Miniprogram::from(context))
    }
}

fn make_middleware_executor<S>(service: S) -> MiddlewareExecutor
where
    S: Service<ReqwestRequest, Response = ReqwestResponse, Error = reqwest::Error>
        + Clone
        + Send
        + Sync
        + 'static,
    S::Future: Send + 'static,
{
    let service = Arc::new(service);

    Arc::new(move |request: ReqwestRequest| {
        let mut service = (*service).clone();
        Box::pin(async move { service.call(request).await })
    })
}
