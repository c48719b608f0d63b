//! User API
//!
//! Phone number retrieval and per-user encrypt keys.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::api::r#trait::{WechatApi, WechatContext};
use crate::crypto::signature::{session_signature, SIG_METHOD};
use crate::error::WechatError;
use crate::types::Watermark;

/// Phone number information from getPhoneNumber API
#[non_exhaustive]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PhoneInfo {
    /// User's phone number (with country code, e.g., +8613800138000)
    #[serde(rename = "phoneNumber", alias = "phone_number")]
    pub phone_number: String,
    /// Pure phone number without country code (e.g., 13800138000)
    #[serde(rename = "purePhoneNumber", alias = "pure_phone_number")]
    pub pure_phone_number: String,
    /// Country code (e.g., 86)
    #[serde(rename = "countryCode", alias = "country_code")]
    pub country_code: String,
    pub watermark: Watermark,
}

/// Response from getPhoneNumber API
#[non_exhaustive]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PhoneNumberResponse {
    /// Absent when the platform rejects the code
    #[serde(default)]
    pub phone_info: Option<PhoneInfo>,
    #[serde(default)]
    pub(crate) errcode: i32,
    #[serde(default)]
    pub(crate) errmsg: String,
}

impl PhoneNumberResponse {
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
struct PhoneNumberRequest<'a> {
    code: &'a str,
    openid: &'a str,
}

/// One versioned encrypt key issued for a user
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EncryptKeyInfo {
    /// Base64 key material
    pub encrypt_key: String,
    #[serde(default)]
    pub iv: String,
    pub version: i64,
    /// Remaining lifetime in seconds; zero or less means expired
    #[serde(default)]
    pub expire_in: i64,
    #[serde(default)]
    pub create_time: i64,
}

impl EncryptKeyInfo {
    pub fn new(
        encrypt_key: impl Into<String>,
        iv: impl Into<String>,
        version: i64,
        expire_in: i64,
        create_time: i64,
    ) -> Self {
        Self {
            encrypt_key: encrypt_key.into(),
            iv: iv.into(),
            version,
            expire_in,
            create_time,
        }
    }
}

/// Response from getUserEncryptKey
#[non_exhaustive]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UserEncryptKeyResponse {
    #[serde(default)]
    pub key_info_list: Vec<EncryptKeyInfo>,
    #[serde(default)]
    pub(crate) errcode: i32,
    #[serde(default)]
    pub(crate) errmsg: String,
}

impl UserEncryptKeyResponse {
    pub fn new(key_info_list: Vec<EncryptKeyInfo>) -> Self {
        Self {
            key_info_list,
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

/// User API for phone numbers and encrypt keys
pub struct UserApi {
    context: Arc<WechatContext>,
}

impl UserApi {
    /// Create a new UserApi instance
    pub fn new(context: Arc<WechatContext>) -> Self {
        Self { context }
    }

    /// Get user's phone number
    ///
    /// POST /wxa/business/getuserphonenumber?access_token=ACCESS_TOKEN
    ///
    /// # Arguments
    /// * `code` - The code obtained from button open-type="getPhoneNumber"
    /// * `openid` - Optional user OpenID, sent as-is (may be empty)
    ///
    /// # Errors
    /// `InvalidParams` if `code` is empty.
    pub async fn get_phone_number(
        &self,
        code: &str,
        openid: &str,
    ) -> Result<PhoneNumberResponse, WechatError> {
        if code.is_empty() {
            return Err(WechatError::invalid("code"));
        }

        let access_token = self.context.tokens.request_access_token().await;
        let path = crate::client::WechatClient::append_access_token(
            "/wxa/business/getuserphonenumber",
            &access_token,
        );
        let body = PhoneNumberRequest { code, openid };

        self.context.client.post(&path, &body).await
    }

    /// Get the user's current encrypt keys
    ///
    /// GET /wxa/business/getuserencryptkey
    ///
    /// The returned `errcode` is not checked here.
    ///
    /// # Errors
    /// `InvalidParams` if `openid` or `session_key` is empty.
    pub async fn get_user_encrypt_key(
        &self,
        openid: &str,
        session_key: &str,
    ) -> Result<UserEncryptKeyResponse, WechatError> {
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
            ("openid", openid),
            ("signature", signature.as_str()),
            ("sig_method", SIG_METHOD),
        ];

        self.context
            .client
            .get("/wxa/business/getuserencryptkey", &query)
            .await
    }
}

impl WechatApi for UserApi {
    fn context(&self) -> &WechatContext {
        &self.context
    }

    fn api_name(&self) -> &'static str {
        "user"
    }
}
