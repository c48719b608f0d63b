//! WeChat Mini Program server-side client
//!
//! Two concerns live in this crate:
//!
//! - **Credential gateway**: access tokens (classic and stable), login via
//!   `code2Session`, session key checks, phone number lookup and text
//!   content moderation.
//! - **Secure payload codec**: sealing JSON payloads and user sessions with
//!   the per-user encrypt key issued by the platform (XXTEA, base64, with an
//!   HMAC-SHA256 session signature on the key lookup).
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use wechat_miniprogram::{ClientConfig, Miniprogram};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // WECHAT_APPID / WECHAT_APPSECRET
//!     let mp = Miniprogram::builder()
//!         .config(ClientConfig::from_env()?)
//!         .cache_tokens(true)
//!         .build()?;
//!
//!     let session = mp.code2session("code_from_wx_login").await?;
//!
//!     let phone = mp.get_phone_number("code_from_button", &session.openid).await?;
//!     if let Some(info) = phone.phone_info {
//!         println!("Phone: {}", info.phone_number);
//!     }
//!
//!     let sealed = mp
//!         .encrypt_user_session(&session.openid, &session.session_key)
//!         .await?;
//!     println!("v{} {}", sealed.version, sealed.user_session);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Every operation returns [`WechatError`]. Its [`code`](WechatError::code)
//! and the serializable [`ApiError`] give callers a stable `{code, message}`
//! pair:
//!
//! ```rust,ignore
//! use wechat_miniprogram::WechatError;
//!
//! match mp.code2session(code).await {
//!     Ok(session) => { /* ... */ }
//!     Err(WechatError::InvalidParams(msg)) => eprintln!("bad input: {}", msg),
//!     Err(WechatError::ServiceUnavailable { status, .. }) => eprintln!("upstream down: {:?}", status),
//!     Err(e) => eprintln!("{} ({})", e, e.code()),
//! }
//! ```
//!
//! ## Logging
//!
//! The crate logs through the [`log`] facade. Install
//! [`middleware::LoggingMiddleware`] to trace each HTTP call with credentials
//! redacted.

pub mod api;
pub mod client;
pub mod config;
pub mod crypto;
pub mod error;
pub mod middleware;
pub mod token;
pub mod types;

pub use client::{Miniprogram, MiniprogramBuilder, WechatClient, WechatClientBuilder};
pub use config::ClientConfig;
pub use error::{ApiError, WechatError};
