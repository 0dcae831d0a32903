// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! HTTP data model for the request adapter
//!
//! Target decomposition, the dual-purpose header list and the streamed
//! response buffer. None of these types lock; the request owns them behind
//! its instance lock.

mod buffer;
mod headers;
mod method;
mod url;

pub use buffer::ResponseBuffer;
pub use headers::{Header, HeaderList};
pub use method::Method;
pub use self::url::{ParsedUrl, UrlMode, DEFAULT_SCHEME, SECURE_SCHEME};

/// Header names the adapter sets itself
pub mod names {
    pub const HOST: &str = "host";
    pub const CONTENT_LENGTH: &str = "Content-Length";
}
