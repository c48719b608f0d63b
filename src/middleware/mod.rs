//! Tower middleware for outgoing platform requests.
//!
//! Layers wrap the [`WechatClient`](crate::client::WechatClient) service and
//! are installed with
//! [`MiniprogramBuilder::with_middleware`](crate::MiniprogramBuilder::with_middleware).
//!
//! ```ignore
//! use wechat_miniprogram::{middleware::LoggingMiddleware, Miniprogram};
//!
//! let mp = Miniprogram::builder()
//!     .config(config)
//!     .with_middleware(LoggingMiddleware::new().verbose())
//!     .build()?;
//! ```

pub use tower::{Layer, Service, ServiceBuilder};

mod logging;

pub use logging::{LoggingMiddleware, LoggingService};
