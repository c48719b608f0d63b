//! Unified WeChat Mini Program client

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::api::auth::{AuthApi, CheckSessionResponse, SessionResponse};
use crate::api::codec::CodecApi;
use crate::api::security::{MsgSecCheckOptions, MsgSecCheckResponse, SecurityApi};
use crate::api::user::{PhoneNumberResponse, UserApi, UserEncryptKeyResponse};
use crate::api::WechatContext;
use crate::crypto::{EncryptedEnvelope, UserSession, UserSessionEnvelope};
use crate::error::WechatError;
use crate::token::AccessTokenResponse;

use super::builder::MiniprogramBuilder;

/// Unified WeChat Mini Program client
///
/// The main entry point of the crate. Every privileged call obtains an access
/// token first, then issues one request to the platform.
///
/// # Example
///
/// ```rust,ignore
/// use wechat_miniprogram::{ClientConfig, Miniprogram};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let mp = Miniprogram::builder()
///         .config(ClientConfig::from_env()?)
///         .build()?;
///
///     let session = mp.code2session("code_from_wx_login").await?;
///     let envelope = mp
///         .encrypt_data(&session.openid, &session.session_key, &serde_json::json!({"score": 42}))
///         .await?;
///     println!("v{} {}", envelope.version, envelope.cipher_text);
///
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct Miniprogram {
    context: Arc<WechatContext>,
}

impl std::fmt::Debug for Miniprogram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Miniprogram")
            .field("appid", &self.appid())
            .finish_non_exhaustive()
    }
}

impl Miniprogram {
    pub fn builder() -> MiniprogramBuilder {
        MiniprogramBuilder::default()
    }

    pub fn appid(&self) -> &str {
        self.context.client.appid()
    }

    pub fn context(&self) -> &Arc<WechatContext> {
        &self.context
    }

    // Credential gateway

    pub async fn get_access_token(&self) -> Result<AccessTokenResponse, WechatError> {
        AuthApi::new(self.context.clone()).get_access_token().await
    }

    pub async fn get_stable_access_token(
        &self,
        force_refresh: bool,
    ) -> Result<AccessTokenResponse, WechatError> {
        AuthApi::new(self.context.clone())
            .get_stable_access_token(force_refresh)
            .await
    }

    /// Clear the cached token, if token caching is enabled.
    pub async fn invalidate_token(&self) {
        self.context.tokens.invalidate().await;
    }

    pub async fn code2session(&self, code: &str) -> Result<SessionResponse, WechatError> {
        AuthApi::new(self.context.clone()).code2session(code).await
    }

    pub async fn check_session_key(&self) -> Result<CheckSessionResponse, WechatError> {
        AuthApi::new(self.context.clone())
            .check_session_key()
            .await
    }

    pub async fn check_user_session_key(
        &self,
        openid: &str,
        session_key: &str,
    ) -> Result<CheckSessionResponse, WechatError> {
        AuthApi::new(self.context.clone())
            .check_user_session_key(openid, session_key)
            .await
    }

    pub async fn get_phone_number(
        &self,
        code: &str,
        openid: &str,
    ) -> Result<PhoneNumberResponse, WechatError> {
        UserApi::new(self.context.clone())
            .get_phone_number(code, openid)
            .await
    }

    pub async fn msg_sec_check(
        &self,
        content: &str,
        scene: u8,
        openid: &str,
        session_key: &str,
        options: Option<MsgSecCheckOptions>,
    ) -> Result<MsgSecCheckResponse, WechatError> {
        SecurityApi::new(self.context.clone())
            .msg_sec_check(content, scene, openid, session_key, options)
            .await
    }

    // Secure payload codec

    pub async fn get_user_encrypt_key(
        &self,
        openid: &str,
        session_key: &str,
    ) -> Result<UserEncryptKeyResponse, WechatError> {
        UserApi::new(self.context.clone())
            .get_user_encrypt_key(openid, session_key)
            .await
    }

    pub async fn encrypt_data<T: Serialize + ?Sized>(
        &self,
        openid: &str,
        session_key: &str,
        data: &T,
    ) -> Result<EncryptedEnvelope, WechatError> {
        CodecApi::new(self.context.clone())
            .encrypt_data(openid, session_key, data)
            .await
    }

    pub async fn decrypt_data(
        &self,
        openid: &str,
        session_key: &str,
        version: i64,
        cipher_text: &str,
    ) -> Result<serde_json::Value, WechatError> {
        CodecApi::new(self.context.clone())
            .decrypt_data(openid, session_key, version, cipher_text)
            .await
    }

    pub async fn decrypt_data_as<T: DeserializeOwned>(
        &self,
        openid: &str,
        session_key: &str,
        version: i64,
        cipher_text: &str,
    ) -> Result<T, WechatError> {
        CodecApi::new(self.context.clone())
            .decrypt_data_as(openid, session_key, version, cipher_text)
            .await
    }

    pub async fn encrypt_user_session(
        &self,
        openid: &str,
        session_key: &str,
    ) -> Result<UserSessionEnvelope, WechatError> {
        CodecApi::new(self.context.clone())
            .encrypt_user_session(openid, session_key)
            .await
    }

    pub async fn decrypt_user_session(
        &self,
        openid: &str,
        session_key: &str,
        version: i64,
        user_session: &str,
    ) -> Result<UserSession, WechatError> {
        CodecApi::new(self.context.clone())
            .decrypt_user_session(openid, session_key, version, user_session)
            .await
    }
}

impl From<Arc<WechatContext>> for Miniprogram {
    fn from(context: Arc<WechatContext>) -> Self {
        Self { context }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::types::{AppId, AppSecret};

    fn create_test_miniprogram() -> Miniprogram {
        Miniprogram::builder()
            .config(ClientConfig::new(
                AppId::new("wx1234567890abcdef").unwrap(),
                AppSecret::new("secret1234567890ab").unwrap(),
            ))
            .build()
            .unwrap()
    }

    #[test]
    fn test_appid() {
        let mp = create_test_miniprogram();
        assert_eq!(mp.appid(), "wx1234567890abcdef");
        assert!(!mp.context().tokens().is_caching());
    }

    #[tokio::test]
    async fn test_validation_happens_before_network() {
        // The default base URL is never contacted: every call below fails validation.
        let mp = create_test_miniprogram();

        assert!(matches!(
            mp.code2session("").await,
            Err(WechatError::InvalidParams(_))
        ));
        assert!(matches!(
            mp.get_phone_number("", "oABC").await,
            Err(WechatError::InvalidParams(_))
        ));
        assert!(matches!(
            mp.get_user_encrypt_key("", "key").await,
            Err(WechatError::InvalidParams(_))
        ));
        assert!(matches!(
            mp.encrypt_data("oABC", "", &serde_json::json!({})).await,
            Err(WechatError::InvalidParams(_))
        ));
        assert!(matches!(
            mp.msg_sec_check("hi", 5, "oABC", "key", None).await,
            Err(WechatError::InvalidParams(_))
        ));
    }

    #[tokio::test]
    async fn test_invalidate_without_cache_is_noop() {
        let mp = create_test_miniprogram();
        mp.invalidate_token().await;
    }
}
