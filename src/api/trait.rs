//! WeChat API trait and context
//!
//! Provides the base trait and context for all WeChat API implementations.

use std::sync::Arc;

use crate::client::WechatClient;
use crate::crypto::PayloadCipher;
use crate::token::TokenProvider;

/// Context holding shared resources for WeChat API implementations.
#[derive(Clone)]
pub struct WechatContext {
    /// The WeChat HTTP client for making API requests
    pub(crate) client: Arc<WechatClient>,
    /// Source of access tokens for privileged calls
    pub(crate) tokens: Arc<TokenProvider>,
    /// Cipher sealing user payloads
    pub(crate) cipher: Arc<dyn PayloadCipher>,
}

impl std::fmt::Debug for WechatContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WechatContext")
            .field("client", &self.client)
            .field("tokens", &self.tokens)
            .field("cipher", &"PayloadCipher { .. }")
            .finish()
    }
}

impl WechatContext {
    pub fn new(
        client: Arc<WechatClient>,
        tokens: Arc<TokenProvider>,
        cipher: Arc<dyn PayloadCipher>,
    ) -> Self {
        Self {
            client,
            tokens,
            cipher,
        }
    }

    /// Get a reference to the WeChat HTTP client.
    pub fn client(&self) -> &WechatClient {
        &self.client
    }

    /// Get a reference to the token provider.
    pub fn tokens(&self) -> &TokenProvider {
        &self.tokens
    }

    pub fn cipher(&self) -> &dyn PayloadCipher {
        self.cipher.as_ref()
    }
}

/// Trait for WeChat API implementations.
pub trait WechatApi: Send + Sync {
    /// Get a reference to the WeChat context
    fn context(&self) -> &WechatContext;

    /// Name of this API for logging and error context.
    fn api_name(&self) -> &'static str {
        "unknown"
    }
}
