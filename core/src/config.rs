//! Client configuration.

use std::path::PathBuf;

use crate::client::DEFAULT_BASE_URL;

/// Where the API lives and where a native host keeps the token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub token_path: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token_path: default_token_path(),
        }
    }
}

impl ClientConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_token_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_path = path.into();
        self
    }
}

/// `<config dir>/library-client/token.json`, or a relative fallback when the
/// platform has no config directory.
pub fn default_token_path() -> PathBuf {
    #[cfg(not(target_arch = "wasm32"))]
    let base = dirs::config_dir();
    #[cfg(target_arch = "wasm32")]
    let base: Option<PathBuf> = None;

    base.unwrap_or_else(|| PathBuf::from("."))
        .join("library-client")
        .join("token.json")
}
