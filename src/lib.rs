// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! # xhr-adapter - Browser-style HTTP requests over a transfer engine
//!
//! Exposes the familiar open/send/readyState request model on top of an
//! external, event-driven HTTP/TLS transfer engine.
//!
//! ## Features
//!
//! - Five-state lifecycle with forward-only transitions and change callbacks
//! - Incremental response reads while the body is still arriving
//! - Header list shared between request staging and response capture
//! - Process-wide admission gate bounding concurrent secure transfers
//! - Permissive or strict target parsing
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use xhr_adapter::{AdmissionGate, ReadyState, Request};
//!
//! let gate = Arc::new(AdmissionGate::new(1)?);
//! let request = Request::new(Arc::new(my_engine), gate);
//!
//! request.on_ready_state_change(|req, state| {
//!     if state == ReadyState::Done {
//!         println!("{} {}", req.response_http_code(), req.response_text());
//!     }
//! });
//!
//! request.open("GET", "https://example.com/status");
//! request.set_request_header("Accept", "application/json");
//! request.send();
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod gate;
pub mod http;
pub mod request;

// Re-exports for convenience

// Configuration
pub use config::RequestConfig;

// Engine seam
pub use engine::{EngineEvent, EventSink, PerformOutcome, TransferConfig, TransferEngine};

// Errors
pub use error::{Error, InternalCode, Result};

// Admission gate
pub use gate::{AdmissionGate, GatePermit};

// HTTP data model
pub use http::{Header, HeaderList, Method, ParsedUrl, ResponseBuffer, UrlMode};

// Request
pub use request::{DataCallback, ReadyState, ReadyStateCallback, Request};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
