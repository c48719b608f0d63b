//! WeChat Authentication API
//!
//! Access tokens, login (code2Session) and session checks.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::api::r#trait::{WechatApi, WechatContext};
use crate::crypto::signature::{session_signature, SIG_METHOD};
use crate::error::WechatError;
use crate::token::AccessTokenResponse;

/// Login response from code2Session API
#[non_exhaustive]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionResponse {
    /// User's unique ID under the Mini Program
    #[serde(default)]
    pub openid: String,
    /// Session key for signing and key lookups
    #[serde(default)]
    pub session_key: String,
    /// User's unique ID across the WeChat platform (optional)
    #[serde(default)]
    pub unionid: Option<String>,
    #[serde(default)]
    pub(crate) errcode: i32,
    #[serde(default)]
    pub(crate) errmsg: String,
}

impl SessionResponse {
    pub fn new(
        openid: impl Into<String>,
        session_key: impl Into<String>,
        unionid: Option<String>,
    ) -> Self {
        Self {
            openid: openid.into(),
            session_key: session_key.into(),
            unionid,
            errcode: 0,
            errmsg: String::new(),
        }
    }

    /// Check if the response indicates success
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

/// Response from checkSessionKey
#[non_exhaustive]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CheckSessionResponse {
    #[serde(default)]
    pub(crate) errcode: i32,
    #[serde(default)]
    pub(crate) errmsg: String,
}

impl CheckSessionResponse {
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

/// WeChat authentication API
pub struct AuthApi {
    context: Arc<WechatContext>,
}

impl AuthApi {
    /// Create a new AuthApi instance
    pub fn new(context: Arc<WechatContext>) -> Self {
        Self { context }
    }

    /// Get an access token
    ///
    /// GET /cgi-bin/token
    pub async fn get_access_token(&self) -> Result<AccessTokenResponse, WechatError> {
        self.context.tokens.fetch_access_token().await
    }

    /// Get a stable access token
    ///
    /// POST /cgi-bin/stable_token
    ///
    /// This endpoint does not use an existing access_token. It authenticates
    /// with appid + secret in the request body.
    pub async fn get_stable_access_token(
        &self,
        force_refresh: bool,
    ) -> Result<AccessTokenResponse, WechatError> {
        self.context.tokens.fetch_stable_token(force_refresh).await
    }

    /// Exchange a wx.login() code for openid and session_key
    ///
    /// GET /sns/jscode2session
    ///
    /// # Errors
    /// `InvalidParams` if `js_code` is empty.
    pub async fn code2session(&self, js_code: &str) -> Result<SessionResponse, WechatError> {
        if js_code.is_empty() {
            return Err(WechatError::invalid("code"));
        }

        let query = [
            ("appid", self.context.client.appid()),
            ("secret", self.context.client.secret()),
            ("js_code", js_code),
            ("grant_type", "authorization_code"),
        ];
        self.context.client.get("/sns/jscode2session", &query).await
    }

    /// Check that the platform still holds a valid login state
    ///
    /// GET /wxa/checksession?access_token=ACCESS_TOKEN
    pub async fn check_session_key(&self) -> Result<CheckSessionResponse, WechatError> {
        let access_token = self.context.tokens.request_access_token().await;
        let query = [("access_token", access_token.as_str())];
        self.context.client.get("/wxa/checksession", &query).await
    }

    /// Check one user's session key
    ///
    /// GET /wxa/checksession with openid and a session-key signature
    ///
    /// # Errors
    /// `InvalidParams` if `openid` or `session_key` is empty.
    pub async fn check_user_session_key(
        &self,
        openid: &str,
        session_key: &str,
    ) -> Result<CheckSessionResponse, WechatError> {
        if openid.is_empty() {
            return Err(WechatError::invalid("openid"));
        }
        if session_key.is_empty() {
            return Err(WechatError::invalid("session_key"));
        }

        let signature = session_signature(session_key)?;
        let access_token = self.context.tokens.request_access_token().await;
        let query = [
            ("access_token", access_token.as_str()),
            ("signature", signature.as_str()),
            ("openid", openid),
            ("sig_method", SIG_METHOD),
        ];
        self.context.client.get("/wxa/checksession", &query).await
    }
}

impl WechatApi for AuthApi {
    fn context(&self) -> &WechatContext {
        &self.context
    }

    fn api_name(&self) -> &'static str {
        "auth"
    }
}
