//! Cryptography for WeChat Mini Program user payloads
//!
//! - [`signature`]: HMAC-SHA256 signatures proving possession of a session key
//! - [`xxtea`]: the [`PayloadCipher`] strategy and its XXTEA implementation
//! - [`envelope`]: versioned envelopes and encrypt-key selection
//!
//! ## Security
//!
//! Session keys and encrypt keys must stay on the server. Only envelopes are
//! handed to the Mini Program.

pub mod envelope;
pub mod signature;
pub mod xxtea;

pub use envelope::{EncryptedEnvelope, UserSession, UserSessionEnvelope};
pub use signature::session_signature;
pub use xxtea::{PayloadCipher, Xxtea};
