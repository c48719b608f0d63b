//! Client configuration
//!
//! Credentials are read once from a key-value [`ConfigSource`] and kept in an
//! immutable [`ClientConfig`] for the lifetime of the client.

use std::collections::HashMap;

use crate::error::WechatError;
use crate::types::{AppId, AppSecret};

/// Configuration key holding the Mini Program AppID
pub const APPID_KEY: &str = "wechat.appid";
/// Configuration key holding the Mini Program AppSecret
pub const APPSECRET_KEY: &str = "wechat.appsecret";

/// A key-value source of configuration strings.
pub trait ConfigSource {
    fn get(&self, key: &str) -> Option<String>;
}

impl ConfigSource for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

impl ConfigSource for HashMap<&str, &str> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).map(|v| v.to_string())
    }
}

/// Reads configuration keys from environment variables.
///
/// `wechat.appid` is looked up as `WECHAT_APPID`: dots become underscores and
/// the name is upper-cased, after an optional prefix.
#[derive(Debug, Clone, Default)]
pub struct EnvSource {
    prefix: Option<String>,
}

impl EnvSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepend `prefix` and an underscore to every variable name.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }

    fn var_name(&self, key: &str) -> String {
        let name = key.replace('.', "_").to_ascii_uppercase();
        match &self.prefix {
            Some(prefix) => format!("{}_{}", prefix.to_ascii_uppercase(), name),
            None => name,
        }
    }
}

impl ConfigSource for EnvSource {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(self.var_name(key)).ok()
    }
}

/// Immutable client credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    app_id: AppId,
    app_secret: AppSecret,
}

impl ClientConfig {
    pub fn new(app_id: AppId, app_secret: AppSecret) -> Self {
        Self { app_id, app_secret }
    }

    /// Load `wechat.appid` and `wechat.appsecret` from `source`.
    ///
    /// # Errors
    /// `InvalidParams` when either key is missing or empty.
    pub fn from_source(source: &impl ConfigSource) -> Result<Self, WechatError> {
        let app_id = source.get(APPID_KEY).unwrap_or_default();
        let app_secret = source.get(APPSECRET_KEY).unwrap_or_default();

        Ok(Self {
            app_id: AppId::new(app_id)?,
            app_secret: AppSecret::new(app_secret)?,
        })
    }

    /// Shorthand for [`ClientConfig::from_source`] over [`EnvSource::new`].
    pub fn from_env() -> Result<Self, WechatError> {
        Self::from_source(&EnvSource::new())
    }

    pub fn app_id(&self) -> &AppId {
        &self.app_id
    }

    pub fn app_secret(&self) -> &AppSecret {
        &self.app_secret
    }
}
