//! Versioned envelopes sealed with a per-user encrypt key

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};

use crate::api::user::EncryptKeyInfo;
use crate::crypto::xxtea::PayloadCipher;
use crate::error::WechatError;

/// Ciphertext plus the key version that decrypts it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedEnvelope {
    pub version: i64,
    /// Standard base64
    pub cipher_text: String,
}

/// Opaque user session handed to the Mini Program for storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSessionEnvelope {
    pub version: i64,
    pub user_session: String,
}

/// Plaintext carried inside a [`UserSessionEnvelope`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSession {
    pub openid: String,
    pub session_key: String,
    pub version: i64,
    /// Unix seconds at which the session was sealed
    pub timestamp: i64,
}

/// First record of `version` that has not expired.
pub fn select_key(keys: &[EncryptKeyInfo], version: i64) -> Option<&EncryptKeyInfo> {
    keys.iter()
        .find(|k| k.version == version && k.expire_in > 0)
}

/// Raw key bytes of a record (`encrypt_key` is base64 on the wire).
pub fn key_bytes(info: &EncryptKeyInfo) -> Result<Vec<u8>, WechatError> {
    BASE64
        .decode(&info.encrypt_key)
        .map_err(|e| WechatError::Crypto(format!("Invalid encrypt_key: {}", e)))
}

/// Encrypt `plaintext` and base64 the result.
pub fn seal(
    cipher: &dyn PayloadCipher,
    key: &[u8],
    plaintext: &[u8],
) -> Result<String, WechatError> {
    let sealed = cipher.encrypt(plaintext, key)?;
    Ok(BASE64.encode(sealed))
}

/// Reverse of [`seal`].
pub fn open(
    cipher: &dyn PayloadCipher,
    key: &[u8],
    cipher_text: &str,
) -> Result<Vec<u8>, WechatError> {
    let sealed = BASE64
        .decode(cipher_text.trim())
        .map_err(|e| WechatError::Crypto(format!("Invalid cipher_text: {}", e)))?;
    cipher.decrypt(&sealed, key)
}
