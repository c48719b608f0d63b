//! WeChat HTTP Client module
//!
//! This module contains the low-level [`WechatClient`] and the
//! [`Miniprogram`] facade built on top of it.

mod wechat_client;
pub use wechat_client::{WechatClient, WechatClientBuilder};

mod miniprogram;
pub use miniprogram::Miniprogram;

mod builder;
pub use builder::MiniprogramBuilder;
