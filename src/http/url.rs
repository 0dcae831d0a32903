// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Request target decomposition
//!
//! Splits a target string into scheme, host, port, path and query without
//! normalising anything. The permissive parser never fails; strict mode
//! layers validation on top of the same decomposition.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Scheme used when the target has no `scheme://` prefix
pub const DEFAULT_SCHEME: &str = "HTTP";

/// Scheme that routes a transfer through the admission gate
pub const SECURE_SCHEME: &str = "HTTPS";

const SEGMENT_DELIMITERS: &[char] = &[':', '/', '?'];
const PORT_DELIMITERS: &[char] = &['/', '?'];

/// How `open()` treats malformed targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UrlMode {
    /// Always accept; a host-less target produces an empty host
    #[default]
    Permissive,
    /// Reject targets without a host, with a bad port or unknown scheme
    Strict,
}

/// Decomposed request target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedUrl {
    /// Uppercased scheme, `HTTP` when absent
    pub scheme: String,
    /// Host name or address
    pub host: String,
    /// Port text, empty when absent
    pub port: String,
    /// Path, always starting with `/`
    pub path: String,
    /// Query including the leading `?`, empty when absent
    pub query: String,
}

impl Default for ParsedUrl {
    fn default() -> Self {
        Self {
            scheme: DEFAULT_SCHEME.to_string(),
            host: String::new(),
            port: String::new(),
            path: "/".to_string(),
            query: String::new(),
        }
    }
}

impl ParsedUrl {
    /// Decompose a target. Never fails.
    pub fn parse(url: &str) -> Self {
        let mut parsed = Self::default();
        let mut rest = url;

        let seg = rest.find(SEGMENT_DELIMITERS).unwrap_or(rest.len());
        if rest[seg..].starts_with("://") {
            parsed.scheme = rest[..seg].to_ascii_uppercase();
            rest = &rest[seg + 3..];
        }

        let seg = rest.find(SEGMENT_DELIMITERS).unwrap_or(rest.len());
        parsed.host.push_str(&rest[..seg]);
        rest = &rest[seg..];

        if let Some(after) = rest.strip_prefix(':') {
            let seg = after.find(PORT_DELIMITERS).unwrap_or(after.len());
            parsed.port.push_str(&after[..seg]);
            rest = &after[seg..];
        }

        if let Some(after) = rest.strip_prefix('/') {
            let seg = after.find('?').unwrap_or(after.len());
            parsed.path.push_str(&after[..seg]);
            rest = &after[seg..];
        }

        if rest.starts_with('?') {
            parsed.query.push_str(rest);
        }

        parsed
    }

    /// Decompose and validate a target
    pub fn parse_strict(url: &str) -> Result<Self> {
        let parsed = Self::parse(url);

        if parsed.host.is_empty() {
            return Err(Error::invalid_url(url, "missing host"));
        }
        if parsed.scheme != DEFAULT_SCHEME && parsed.scheme != SECURE_SCHEME {
            return Err(Error::invalid_url(
                url,
                format!("unsupported scheme {}", parsed.scheme),
            ));
        }
        if !parsed.port.is_empty() && parsed.port.parse::<u16>().is_err() {
            return Err(Error::invalid_url(url, format!("invalid port {}", parsed.port)));
        }

        // Host character validation
        url::Url::parse(&parsed.to_string())?;

        Ok(parsed)
    }

    /// Decompose according to `mode`
    pub fn parse_with(url: &str, mode: UrlMode) -> Result<Self> {
        match mode {
            UrlMode::Permissive => Ok(Self::parse(url)),
            UrlMode::Strict => Self::parse_strict(url),
        }
    }

    /// Whether the transfer runs over TLS
    pub fn is_secure(&self) -> bool {
        self.scheme == SECURE_SCHEME
    }

    /// Numeric port, if present and valid
    pub fn port_number(&self) -> Option<u16> {
        self.port.parse().ok()
    }

    /// Path and query as sent on the request line
    pub fn request_target(&self) -> String {
        format!("{}{}", self.path, self.query)
    }
}

impl fmt::Display for ParsedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme.to_ascii_lowercase(), self.host)?;
        if !self.port.is_empty() {
            write!(f, ":{}", self.port)?;
        }
        write!(f, "{}{}", self.path, self.query)
    }
}
