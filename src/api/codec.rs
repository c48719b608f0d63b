//! Secure payload codec
//!
//! Seals JSON payloads with the per-user encrypt key issued by the platform.
//! Every operation looks the key list up again; envelopes carry the key
//! version so that payloads sealed before a key rotation stay readable until
//! the old key expires.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::api::r#trait::{WechatApi, WechatContext};
use crate::api::user::{EncryptKeyInfo, UserApi};
use crate::crypto::envelope::{self, EncryptedEnvelope, UserSession, UserSessionEnvelope};
use crate::error::WechatError;

/// `OperationFailed` code: the platform returned no encrypt key.
pub const ENCRYPT_KEY_NOT_FOUND: i32 = 1001;
/// `OperationFailed` code: no live key matches the envelope version.
pub const ENCRYPT_KEY_EXPIRED: i32 = 1002;
/// `OperationFailed` code: a user session belongs to another user.
pub const USER_SESSION_MISMATCH: i32 = 1003;

/// Payload encryption API
pub struct CodecApi {
    context: Arc<WechatContext>,
}

impl CodecApi {
    pub fn new(context: Arc<WechatContext>) -> Self {
        Self { context }
    }

    /// Seal `data` as JSON with the user's newest encrypt key.
    ///
    /// # Errors
    /// - `InvalidParams` for an empty openid or session_key
    /// - `OperationFailed` if the key lookup fails or returns no key
    pub async fn encrypt_data<T: Serialize + ?Sized>(
        &self,
        openid: &str,
        session_key: &str,
        data: &T,
    ) -> Result<EncryptedEnvelope, WechatError> {
        let keys = self.fetch_keys(openid, session_key).await?;
        let info = newest_key(&keys)?;

        let plaintext = serde_json::to_vec(data)?;
        let cipher_text = envelope::seal(
            self.context.cipher(),
            &envelope::key_bytes(info)?,
            &plaintext,
        )?;

        Ok(EncryptedEnvelope {
            version: info.version,
            cipher_text,
        })
    }

    /// Open an envelope produced by [`encrypt_data`](Self::encrypt_data).
    ///
    /// # Errors
    /// - `InvalidParams` for an empty openid, session_key or cipher_text
    /// - `OperationFailed` if the key lookup fails or the version has expired
    /// - `Crypto` if the ciphertext is not valid for the key
    pub async fn decrypt_data(
        &self,
        openid: &str,
        session_key: &str,
        version: i64,
        cipher_text: &str,
    ) -> Result<serde_json::Value, WechatError> {
        self.decrypt_data_as(openid, session_key, version, cipher_text)
            .await
    }

    /// Like [`decrypt_data`](Self::decrypt_data), deserializing into `T`.
    pub async fn decrypt_data_as<T: DeserializeOwned>(
        &self,
        openid: &str,
        session_key: &str,
        version: i64,
        cipher_text: &str,
    ) -> Result<T, WechatError> {
        if cipher_text.is_empty() {
            return Err(WechatError::invalid("cipher_text"));
        }

        let plaintext = self
            .open(openid, session_key, version, cipher_text)
            .await?;
        serde_json::from_slice(&plaintext)
            .map_err(|e| WechatError::Crypto(format!("Invalid JSON: {}", e)))
    }

    /// Seal the user's identity into an opaque session blob.
    pub async fn encrypt_user_session(
        &self,
        openid: &str,
        session_key: &str,
    ) -> Result<UserSessionEnvelope, WechatError> {
        let keys = self.fetch_keys(openid, session_key).await?;
        let info = newest_key(&keys)?;

        let session = UserSession {
            openid: openid.to_string(),
            session_key: session_key.to_string(),
            version: info.version,
            timestamp: unix_now(),
        };
        let plaintext = serde_json::to_vec(&session)?;
        let user_session = envelope::seal(
            self.context.cipher(),
            &envelope::key_bytes(info)?,
            &plaintext,
        )?;

        Ok(UserSessionEnvelope {
            version: info.version,
            user_session,
        })
    }

    /// Open a blob produced by [`encrypt_user_session`](Self::encrypt_user_session).
    ///
    /// # Errors
    /// As [`decrypt_data`](Self::decrypt_data); additionally `OperationFailed`
    /// when the blob was sealed for another openid or key version.
    pub async fn decrypt_user_session(
        &self,
        openid: &str,
        session_key: &str,
        version: i64,
        user_session: &str,
    ) -> Result<UserSession, WechatError> {
        if user_session.is_empty() {
            return Err(WechatError::invalid("user_session"));
        }

        let plaintext = self
            .open(openid, session_key, version, user_session)
            .await?;
        let session: UserSession = serde_json::from_slice(&plaintext)
            .map_err(|e| WechatError::Crypto(format!("Invalid user session: {}", e)))?;

        if session.openid != openid || session.version != version {
            return Err(WechatError::OperationFailed {
                code: USER_SESSION_MISMATCH,
                message: "user session does not belong to this user".to_string(),
            });
        }
        Ok(session)
    }

    async fn open(
        &self,
        openid: &str,
        session_key: &str,
        version: i64,
        cipher_text: &str,
    ) -> Result<Vec<u8>, WechatError> {
        let keys = self.fetch_keys(openid, session_key).await?;
        let info = envelope::select_key(&keys, version).ok_or_else(|| {
            WechatError::OperationFailed {
                code: ENCRYPT_KEY_EXPIRED,
                message: format!("encrypt key expired (version {})", version),
            }
        })?;

        envelope::open(
            self.context.cipher(),
            &envelope::key_bytes(info)?,
            cipher_text,
        )
    }

    async fn fetch_keys(
        &self,
        openid: &str,
        session_key: &str,
    ) -> Result<Vec<EncryptKeyInfo>, WechatError> {
        let response = UserApi::new(self.context.clone())
            .get_user_encrypt_key(openid, session_key)
            .await?;
        WechatError::check_api(response.errcode, &response.errmsg)?;
        Ok(response.key_info_list)
    }
}

fn newest_key(keys: &[EncryptKeyInfo]) -> Result<&EncryptKeyInfo, WechatError> {
    keys.first().ok_or_else(|| WechatError::OperationFailed {
        code: ENCRYPT_KEY_NOT_FOUND,
        message: "no encrypt key issued for this user".to_string(),
    })
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

impl WechatApi for CodecApi {
    fn context(&self) -> &WechatContext {
        &self.context
    }

    fn api_name(&self) -> &'static str {
        "codec"
    }
}
