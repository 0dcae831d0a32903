// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Streamed response body buffer
//!
//! Bytes delivered by engine data events are appended here and drained by the
//! caller. Nothing is signalled back to the engine: the buffer grows until the
//! caller reads it. On memory-constrained hosts a slow reader can therefore
//! exhaust memory; callers streaming large bodies should drain from the data
//! callback.

use bytes::{Buf, Bytes, BytesMut};

use crate::error::{Error, Result};

/// FIFO of received body bytes with content-length accounting
#[derive(Debug, Default)]
pub struct ResponseBuffer {
    data: BytesMut,
    /// Response uses chunked transfer
    chunked: bool,
    /// Declared length, or under chunked transfer the running total received
    content_length: Option<usize>,
    /// Bytes consumed by the caller
    content_read: usize,
    /// Bytes appended so far
    received: usize,
    started: bool,
    #[cfg(test)]
    pub(crate) fail_next_alloc: bool,
}

impl ResponseBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a data event.
    ///
    /// `declared_length` is only consulted on the first call of a response
    /// that is not chunked.
    pub fn on_data(&mut self, bytes: &[u8], chunked: bool, declared_length: Option<usize>) {
        if !self.started {
            self.started = true;
            self.content_read = 0;
            if !chunked {
                self.content_length = declared_length;
            }
        }
        if chunked && !self.chunked {
            self.chunked = true;
            self.content_length = Some(self.received);
        }

        self.data.extend_from_slice(bytes);
        self.received += bytes.len();
        if self.chunked {
            self.content_length = Some(self.received);
        }
    }

    pub fn is_chunked(&self) -> bool {
        self.chunked
    }

    /// Bytes readable now, bounded by the declared length when known
    pub fn available(&self) -> usize {
        let buffered = self.data.len();
        match self.content_length {
            Some(len) if !self.chunked => buffered.min(len.saturating_sub(self.content_read)),
            _ => buffered,
        }
    }

    /// Declared length, running chunked total, or bytes received so far when
    /// the engine reported no length
    pub fn content_length(&self) -> usize {
        self.content_length.unwrap_or(self.received)
    }

    /// Declared length as reported by the engine
    pub fn declared_length(&self) -> Option<usize> {
        if self.chunked {
            None
        } else {
            self.content_length
        }
    }

    /// Unread bytes held, ignoring the declared length
    pub fn buffered(&self) -> usize {
        self.data.len()
    }

    pub fn content_read(&self) -> usize {
        self.content_read
    }

    pub fn received(&self) -> usize {
        self.received
    }

    /// Drain up to `max_len` readable bytes
    pub fn read(&mut self, max_len: usize) -> Bytes {
        let n = max_len.min(self.available());
        self.content_read += n;
        self.data.split_to(n).freeze()
    }

    /// Drain into `buf`, returning the number of bytes copied
    pub fn read_into(&mut self, buf: &mut [u8]) -> usize {
        let n = buf.len().min(self.available());
        buf[..n].copy_from_slice(&self.data[..n]);
        self.data.advance(n);
        self.content_read += n;
        n
    }

    /// Drain up to `max_len` readable bytes as text.
    ///
    /// Invalid UTF-8 sequences are replaced with U+FFFD; use [`read`] or
    /// [`read_into`] for the raw bytes. Fails with `OutOfMemory` when the text
    /// allocation cannot be made; the buffered bytes are left in place.
    ///
    /// [`read`]: ResponseBuffer::read
    /// [`read_into`]: ResponseBuffer::read_into
    pub fn read_text(&mut self, max_len: usize) -> Result<String> {
        let n = max_len.min(self.available());
        let mut text = self.reserve_text(n)?;
        text.extend_from_slice(&self.data[..n]);
        self.data.advance(n);
        self.content_read += n;

        match String::from_utf8(text) {
            Ok(text) => Ok(text),
            Err(err) => {
                tracing::debug!(
                    len = n,
                    valid_up_to = err.utf8_error().valid_up_to(),
                    "response text is not valid UTF-8, invalid sequences replaced"
                );
                Ok(String::from_utf8_lossy(err.as_bytes()).into_owned())
            }
        }
    }

    fn reserve_text(&mut self, n: usize) -> Result<Vec<u8>> {
        #[cfg(test)]
        if std::mem::take(&mut self.fail_next_alloc) {
            return Err(Error::OutOfMemory { requested: n });
        }

        let mut text = Vec::new();
        text.try_reserve_exact(n)
            .map_err(|_| Error::OutOfMemory { requested: n })?;
        Ok(text)
    }
}
