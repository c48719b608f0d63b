use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use reqwest::{Request, Response, StatusCode};
use tower::{Layer, Service};

/// Logs each outgoing platform call with credentials redacted.
///
/// Requests and responses go to `info!`, or to `debug!` with a status text
/// in verbose mode. Non-2xx responses are always logged at `warn!`.
#[derive(Debug, Clone, Default)]
pub struct LoggingMiddleware {
    verbose: bool,
}

impl LoggingMiddleware {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn verbose(mut self) -> Self {
        self.verbose = true;
        self
    }
}

impl<S> Layer<S> for LoggingMiddleware
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Service = LoggingService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        LoggingService {
            inner,
            verbose: self.verbose,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoggingService<S> {
    inner: S,
    verbose: bool,
}

/// Query parameters whose values never reach the log.
const REDACTED_PARAMS: &[&str] = &[
    "access_token",
    "secret",
    "appsecret",
    "session_key",
    "js_code",
    "code",
    "signature",
];

fn redact_url(url: &str) -> String {
    let Some((base, query)) = url.split_once('?') else {
        return url.to_string();
    };

    let query = query
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some((key, _)) if REDACTED_PARAMS.iter().any(|p| key.eq_ignore_ascii_case(p)) => {
                format!("{}=***", key)
            }
            _ => pair.to_string(),
        })
        .collect::<Vec<_>>()
        .join("&");

    format!("{}?{}", base, query)
}

fn status_text(status: u16) -> &'static str {
    StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
        .unwrap_or("")
}

fn log_request(method: &str, url: &str, verbose: bool) {
    let url = redact_url(url);
    if verbose {
        debug!("[Miniprogram] >>> {} {}", method, url);
    } else {
        info!("[Miniprogram] {} {}", method, url);
    }
}

fn log_response(status: u16, elapsed: Duration, verbose: bool) {
    if !(200..300).contains(&status) {
        warn!("[Miniprogram] <<< {} {} ({:?})", status, status_text(status), elapsed);
    } else if verbose {
        debug!("[Miniprogram] <<< {} {} ({:?})", status, status_text(status), elapsed);
    } else {
        info!("[Miniprogram] {} ({:?})", status, elapsed);
    }
}

impl<S> Service<Request> for LoggingService<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
    S::Error: std::fmt::Display + Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let method = req.method().as_str().to_string();
        let url = req.url().to_string();
        let verbose = self.verbose;
        let mut inner = self.inner.clone();

        Box::pin(async move {
            log_request(&method, &url, verbose);

            let start = Instant::now();
            match inner.call(req).await {
                Ok(response) => {
                    log_response(response.status().as_u16(), start.elapsed(), verbose);
                    Ok(response)
                }
                Err(e) => {
                    warn!("[Miniprogram] {} {} failed: {}", method, redact_url(&url), e);
                    Err(e)
                }
            }
        })
    }
}
