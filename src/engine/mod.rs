// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Transfer engine collaborator interface
//!
//! The engine does the socket work (DNS, connect, TLS, HTTP framing) and
//! reports progress as discrete [`EngineEvent`]s delivered to an
//! [`EventSink`] while `perform` runs. Events may arrive on a thread other
//! than the one that called `perform`.
//!
//! Timeouts are not enforced by the adapter. The configured timeout is
//! forwarded in [`TransferConfig`] and enforcing it is the engine's job.

use std::time::Duration;

use bytes::Bytes;

use crate::http::Method;

#[cfg(test)]
pub(crate) mod scripted;

/// Settings used to create a transfer handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferConfig {
    /// Target exactly as passed to `open()`
    pub url: String,
    pub method: Method,
    /// Engine receive buffer size in bytes
    pub buffer_size: usize,
    /// PEM encoded server certificate
    pub certificate: Option<Vec<u8>>,
    pub use_global_ca_store: bool,
    /// Receive timeout the engine should apply
    pub timeout: Duration,
}

/// Result of one `perform` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerformOutcome {
    /// Transfer completed
    Ok,
    /// Transient condition; call `perform` again
    TryAgain,
    /// Hard failure
    Failed,
}

/// Progress notification from the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineEvent<'a> {
    Connected,
    HeadersSent,
    Header { name: &'a str, value: &'a str },
    Data(&'a [u8]),
    Finished,
    Disconnected,
    Error,
}

impl EngineEvent<'_> {
    /// Short event name for logs
    pub fn name(&self) -> &'static str {
        match self {
            EngineEvent::Connected => "connected",
            EngineEvent::HeadersSent => "headers-sent",
            EngineEvent::Header { .. } => "header",
            EngineEvent::Data(_) => "data",
            EngineEvent::Finished => "finished",
            EngineEvent::Disconnected => "disconnected",
            EngineEvent::Error => "error",
        }
    }
}

/// Receiver of engine events
///
/// Implementations must tolerate being called concurrently with their
/// owner's other methods.
pub trait EventSink: Sync {
    fn on_event(&self, event: EngineEvent<'_>);
}

/// External HTTP/TLS transfer engine
pub trait TransferEngine: Send + Sync {
    /// Opaque transfer handle
    type Handle: Clone + Send + Sync;

    /// Allocate a transfer handle, `None` on failure
    fn init(&self, config: &TransferConfig) -> Option<Self::Handle>;

    fn set_method(&self, handle: &Self::Handle, method: Method);

    fn set_url(&self, handle: &Self::Handle, url: &str);

    fn set_header(&self, handle: &Self::Handle, name: &str, value: &str);

    fn set_body(&self, handle: &Self::Handle, body: Bytes);

    /// Run the transfer, delivering events to `events` before returning
    fn perform(&self, handle: &Self::Handle, events: &dyn EventSink) -> PerformOutcome;

    fn status_code(&self, handle: &Self::Handle) -> i32;

    /// Declared response length, `None` when the response carries none
    fn content_length(&self, handle: &Self::Handle) -> Option<usize>;

    fn is_chunked(&self, handle: &Self::Handle) -> bool;

    /// Close the connection, keeping the handle
    fn close(&self, handle: &Self::Handle);

    /// Release the handle
    fn cleanup(&self, handle: Self::Handle);
}
