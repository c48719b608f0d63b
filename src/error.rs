use serde::Serialize;
use thiserror::Error;

/// WeChat client error types
#[derive(Debug, Error)]
pub enum WechatError {
    /// A required argument or configured credential is missing or malformed.
    ///
    /// Always raised before any network call is made.
    #[error("Invalid params: {0}")]
    InvalidParams(String),

    /// The transport failed or the platform answered with a 4xx/5xx status.
    #[error("Service unavailable: {message}")]
    ServiceUnavailable {
        status: Option<u16>,
        message: String,
    },

    /// The platform answered successfully but the business payload signals failure.
    #[error("Operation failed (code={code}): {message}")]
    OperationFailed { code: i32, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Crypto error: {0}")]
    Crypto(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl WechatError {
    /// Numeric code carried alongside the message.
    pub fn code(&self) -> i32 {
        match self {
            Self::InvalidParams(_) => 400,
            Self::ServiceUnavailable { status, .. } => status.map_or(503, i32::from),
            Self::OperationFailed { code, .. } => *code,
            Self::Config(_) | Self::Crypto(_) | Self::Json(_) => 500,
        }
    }

    /// Turns a platform `errcode`/`errmsg` pair into `OperationFailed` when non-zero.
    pub(crate) fn check_api(errcode: i32, errmsg: &str) -> Result<(), WechatError> {
        if errcode != 0 {
            return Err(WechatError::OperationFailed {
                code: errcode,
                message: errmsg.to_string(),
            });
        }
        Ok(())
    }

    pub(crate) fn invalid(param: &str) -> WechatError {
        WechatError::InvalidParams(format!("{param} must not be empty"))
    }
}

impl From<reqwest::Error> for WechatError {
    fn from(e: reqwest::Error) -> Self {
        WechatError::ServiceUnavailable {
            status: e.status().map(|s| s.as_u16()),
            message: e.to_string(),
        }
    }
}

/// Serializable `{code, message}` rendering of a [`WechatError`].
///
/// Suitable for returning to a caller of a web handler as a JSON body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiError {
    pub code: i32,
    pub message: String,
}

impl From<&WechatError> for ApiError {
    fn from(e: &WechatError) -> Self {
        Self {
            code: e.code(),
            message: e.to_string(),
        }
    }
}

impl From<WechatError> for ApiError {
    fn from(e: WechatError) -> Self {
        Self::from(&e)
    }
}
