//! Security API
//!
//! Text content moderation.
//!
//! # Endpoints
//!
//! - [`SecurityApi::msg_sec_check`] - Check text content for policy violations

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{WechatApi, WechatContext};
use crate::crypto::signature::session_signature;
use crate::error::WechatError;

/// Moderation scenes accepted by msgSecCheck:
/// 1 = profile, 2 = comment, 3 = forum, 4 = social log
pub const MSG_SEC_SCENES: [u8; 4] = [1, 2, 3, 4];

/// Scene value for profile content; requests in this scene are signed.
pub const SCENE_PROFILE: u8 = 1;

#[derive(Debug, Clone, Serialize)]
struct MsgSecCheckRequest<'a> {
    content: &'a str,
    version: u8,
    scene: u8,
    openid: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    nickname: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    signature: Option<String>,
}

/// Optional fields for msgSecCheck
#[non_exhaustive]
#[derive(Debug, Clone, Default)]
pub struct MsgSecCheckOptions {
    /// Title of the content
    pub title: Option<String>,
    /// User nickname
    pub nickname: Option<String>,
}

impl MsgSecCheckOptions {
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn nickname(mut self, nickname: impl Into<String>) -> Self {
        self.nickname = Some(nickname.into());
        self
    }
}

/// Detail item from message security check
#[non_exhaustive]
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MsgSecCheckDetail {
    #[serde(default)]
    pub strategy: String,
    #[serde(default)]
    pub errcode: i32,
    /// Suggestion: "pass", "risky", or "review"
    #[serde(default)]
    pub suggest: String,
    /// Label classification (100=normal, 10001=ad, etc.)
    #[serde(default)]
    pub label: i32,
    #[serde(default)]
    pub keyword: String,
    /// Confidence probability (0-100)
    #[serde(default)]
    pub prob: i32,
}

/// Result summary from message security check
#[non_exhaustive]
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MsgSecCheckResult {
    /// Suggestion: "pass", "risky", or "review"
    #[serde(default)]
    pub suggest: String,
    #[serde(default)]
    pub label: i32,
}

/// Response from msgSecCheck
#[non_exhaustive]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MsgSecCheckResponse {
    #[serde(default)]
    pub trace_id: String,
    #[serde(default)]
    pub result: MsgSecCheckResult,
    #[serde(default)]
    pub detail: Vec<MsgSecCheckDetail>,
    #[serde(default)]
    pub(crate) errcode: i32,
    #[serde(default)]
    pub(crate) errmsg: String,
}

impl MsgSecCheckResponse {
    pub fn is_success(&self) -> bool {
        self.errcode == 0
    }

    /// Whether the platform suggests letting the content through.
    pub fn is_pass(&self) -> bool {
        self.is_success() && self.result.suggest == "pass"
    }

    pub fn errcode(&self) -> i32 {
        self.errcode
    }

    pub fn errmsg(&self) -> &str {
        &self.errmsg
    }
}

/// Security API
pub struct SecurityApi {
    context: Arc<WechatContext>,
}

impl SecurityApi {
    /// Create a new SecurityApi instance
    pub fn new(context: Arc<WechatContext>) -> Self {
        Self { context }
    }

    /// Check text content for policy violations
    ///
    /// POST /wxa/msg_sec_check?access_token=ACCESS_TOKEN
    ///
    /// # Arguments
    /// * `content` - Text content to check
    /// * `scene` - One of [`MSG_SEC_SCENES`]; profile content is signed with the session key
    /// * `openid` - User's OpenID
    /// * `session_key` - User's session key
    /// * `options` - Title and nickname, sent only when non-empty
    ///
    /// # Errors
    /// `InvalidParams` for empty content, openid or session_key, or an unknown scene.
    pub async fn msg_sec_check(
        &self,
        content: &str,
        scene: u8,
        openid: &str,
        session_key: &str,
        options: Option<MsgSecCheckOptions>,
    ) -> Result<MsgSecCheckResponse, WechatError> {
        if content.is_empty() {
            return Err(WechatError::invalid("content"));
        }
        if !MSG_SEC_SCENES.contains(&scene) {
            return Err(WechatError::InvalidParams(format!(
                "scene must be one of 1, 2, 3, 4, got {}",
                scene
            )));
        }
        if openid.is_empty() {
            return Err(WechatError::invalid("openid"));
        }
        if session_key.is_empty() {
            return Err(WechatError::invalid("session_key"));
        }

        let signature = if scene == SCENE_PROFILE {
            Some(session_signature(session_key)?)
        } else {
            None
        };

        let opts = options.unwrap_or_default();
        let body = MsgSecCheckRequest {
            content,
            version: 2,
            scene,
            openid,
            title: opts.title.as_deref().filter(|t| !t.is_empty()),
            nickname: opts.nickname.as_deref().filter(|n| !n.is_empty()),
            signature,
        };

        let access_token = self.context.tokens.request_access_token().await;
        let path =
            crate::client::WechatClient::append_access_token("/wxa/msg_sec_check", &access_token);

        self.context.client.post(&path, &body).await
    }
}

impl WechatApi for SecurityApi {
    fn context(&self) -> &WechatContext {
        &self.context
    }

    fn api_name(&self) -> &'static str {
        "security"
    }
}
