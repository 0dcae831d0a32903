// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Request configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::http::UrlMode;

/// Default receive timeout in seconds
pub const DEFAULT_RX_TIMEOUT_SECS: u64 = 3;

/// Default engine receive buffer size
pub const DEFAULT_BUFFER_SIZE: usize = 1040;

/// Default cap on consecutive "try again" results from the engine
pub const DEFAULT_MAX_TRANSIENT_RETRIES: u32 = 64;

/// Per-request configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestConfig {
    /// Receive timeout forwarded to the engine
    pub timeout_secs: u64,
    /// Engine receive buffer size
    pub buffer_size: usize,
    /// PEM certificate for TLS server verification
    pub certificate: Option<Vec<u8>>,
    /// Verify TLS servers against the engine's global CA store
    pub use_global_ca_store: bool,
    /// Target parsing mode
    pub url_mode: UrlMode,
    /// Extra perform attempts allowed after "try again"
    pub max_transient_retries: u32,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_RX_TIMEOUT_SECS,
            buffer_size: DEFAULT_BUFFER_SIZE,
            certificate: None,
            use_global_ca_store: false,
            url_mode: UrlMode::default(),
            max_transient_retries: DEFAULT_MAX_TRANSIENT_RETRIES,
        }
    }
}

impl RequestConfig {
    /// Create a new request config
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in seconds
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Set engine buffer size
    pub fn buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    /// Set the server certificate (PEM)
    pub fn certificate(mut self, pem: impl Into<Vec<u8>>) -> Self {
        self.certificate = Some(pem.into());
        self
    }

    /// Use the global CA store
    pub fn use_global_ca_store(mut self, enabled: bool) -> Self {
        self.use_global_ca_store = enabled;
        self
    }

    /// Set URL parsing mode
    pub fn url_mode(mut self, mode: UrlMode) -> Self {
        self.url_mode = mode;
        self
    }

    /// Set transient retry cap
    pub fn max_transient_retries(mut self, retries: u32) -> Self {
        self.max_transient_retries = retries;
        self
    }

    /// Timeout as a duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Config for strict target validation
    pub fn strict() -> Self {
        Self {
            url_mode: UrlMode::Strict,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_config_builder() {
        let config = RequestConfig::new()
            .timeout_secs(10)
            .certificate(b"-----BEGIN CERTIFICATE-----".to_vec())
            .url_mode(UrlMode::Strict);

        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert!(config.certificate.is_some());
        assert_eq!(config.url_mode, UrlMode::Strict);
        assert_eq!(config.buffer_size, DEFAULT_BUFFER_SIZE);
    }

    #[test]
    fn test_request_config_from_json() {
        let config: RequestConfig =
            serde_json::from_str(r#"{"timeout_secs": 7, "url_mode": "strict"}"#).unwrap();

        assert_eq!(config.timeout_secs, 7);
        assert_eq!(config.url_mode, UrlMode::Strict);
        assert_eq!(config.max_transient_retries, DEFAULT_MAX_TRANSIENT_RETRIES);
        assert!(!config.use_global_ca_store);
    }
}
