//! WeChat Mini Program API modules
//!
//! - [`auth`] - Access tokens, login (code2Session) and session checks
//! - [`user`] - Phone number and per-user encrypt keys
//! - [`security`] - Content security checks
//! - [`codec`] - Payload encryption with per-user encrypt keys
//!
//! Each API is a thin struct over a shared [`WechatContext`]; most callers use
//! the [`Miniprogram`](crate::Miniprogram) facade instead.

pub mod auth;
pub mod codec;
pub mod security;
pub mod r#trait;
pub mod user;

pub use auth::{AuthApi, CheckSessionResponse, SessionResponse};
pub use codec::CodecApi;
pub use r#trait::{WechatApi, WechatContext};
pub use security::{
    MsgSecCheckDetail, MsgSecCheckOptions, MsgSecCheckResponse, MsgSecCheckResult, SecurityApi,
};
pub use user::{EncryptKeyInfo, PhoneInfo, PhoneNumberResponse, UserApi, UserEncryptKeyResponse};
