// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Error types for the request adapter
//!
//! Failures detected synchronously inside a public call are returned as
//! [`Error`]. Failures that happen during or after the transfer are reported
//! through the response code instead, using the negative [`InternalCode`]
//! sentinels.

use thiserror::Error;

use crate::request::ReadyState;

/// Result type alias for adapter operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the request adapter
#[derive(Error, Debug)]
pub enum Error {
    /// Method other than GET or POST passed to `open()`
    #[error("Invalid method: {0}")]
    InvalidMethod(String),

    /// Operation not legal in the current ready state
    #[error("Invalid state for operation: {state:?}")]
    InvalidState { state: ReadyState },

    /// URL rejected by strict parsing
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// URL failed validation in strict mode
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Engine could not allocate a transfer handle
    #[error("Transfer engine failed to initialise a handle")]
    EngineInitFailed,

    /// `send()` called without a live engine handle
    #[error("No transfer handle; call open() first")]
    NoTransfer,

    /// Engine perform returned a hard failure
    #[error("Transfer failed after {attempts} attempt(s)")]
    PerformFailed { attempts: u32 },

    /// Allocation for response text failed
    #[error("Out of memory reading {requested} bytes of response")]
    OutOfMemory { requested: usize },

    /// Admission gate semaphore has been closed
    #[error("Admission gate closed")]
    GateClosed,

    /// Global admission gate initialised twice
    #[error("Admission gate already initialised")]
    GateAlreadyInitialized,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create an invalid method error
    pub fn invalid_method(method: impl Into<String>) -> Self {
        Error::InvalidMethod(method.into())
    }

    /// Create an invalid state error
    pub fn invalid_state(state: ReadyState) -> Self {
        Error::InvalidState { state }
    }

    /// Create an invalid URL error
    pub fn invalid_url(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidUrl {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Check if this error was caused by the caller's arguments or call order
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidMethod(_)
                | Error::InvalidState { .. }
                | Error::InvalidUrl { .. }
                | Error::Url(_)
                | Error::NoTransfer
        )
    }

    /// Check if this error came from the transfer itself
    pub fn is_transfer_failure(&self) -> bool {
        matches!(
            self,
            Error::EngineInitFailed | Error::PerformFailed { .. } | Error::OutOfMemory { .. }
        )
    }

    /// Sentinel reported through the response code for this error, if any
    pub fn internal_code(&self) -> Option<InternalCode> {
        match self {
            Error::EngineInitFailed => Some(InternalCode::OpenFailed),
            Error::PerformFailed { .. } => Some(InternalCode::PerformFailed),
            Error::OutOfMemory { .. } => Some(InternalCode::TooLittleMemory),
            _ => None,
        }
    }
}

/// Negative response codes reported when no HTTP status is available
///
/// Engine collaborators may surface the connection-level codes; the adapter
/// itself produces `TooLittleMemory`, `PerformFailed` and `OpenFailed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum InternalCode {
    ConnectionRefused = -1,
    SendHeaderFailed = -2,
    SendPayloadFailed = -3,
    NotConnected = -4,
    ConnectionLost = -5,
    NoStream = -6,
    NoHttpServer = -7,
    TooLittleMemory = -8,
    Encoding = -9,
    StreamWrite = -10,
    Timeout = -11,
    PerformFailed = -12,
    OpenFailed = -13,
}

impl InternalCode {
    /// Numeric value as returned by `response_http_code()`
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Map a response code back to a sentinel
    pub fn from_code(code: i32) -> Option<Self> {
        use InternalCode::*;
        Some(match code {
            -1 => ConnectionRefused,
            -2 => SendHeaderFailed,
            -3 => SendPayloadFailed,
            -4 => NotConnected,
            -5 => ConnectionLost,
            -6 => NoStream,
            -7 => NoHttpServer,
            -8 => TooLittleMemory,
            -9 => Encoding,
            -10 => StreamWrite,
            -11 => Timeout,
            -12 => PerformFailed,
            -13 => OpenFailed,
            _ => return None,
        })
    }
}
