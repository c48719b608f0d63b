//! HMAC-SHA256 request signatures

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::WechatError;

type HmacSha256 = Hmac<Sha256>;

/// Value sent as `sig_method` alongside a session signature.
pub const SIG_METHOD: &str = "hmac_sha256";

/// Lower-case hex HMAC-SHA256 of `message` under `key`.
pub fn hmac_sha256_hex(key: &[u8], message: &[u8]) -> Result<String, WechatError> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| WechatError::Crypto(format!("HMAC init failed: {}", e)))?;
    mac.update(message);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Signature proving possession of a user's session key.
///
/// The session key is the HMAC key and the message is the empty string.
pub fn session_signature(session_key: &str) -> Result<String, WechatError> {
    hmac_sha256_hex(session_key.as_bytes(), b"")
}
