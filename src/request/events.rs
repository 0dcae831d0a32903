// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Engine event handling for [`Request`]

use super::{Inner, ReadyState, Request};
use crate::engine::{EngineEvent, EventSink, TransferEngine};

impl<E: TransferEngine> EventSink for Request<E> {
    fn on_event(&self, event: EngineEvent<'_>) {
        self.handle_event(event);
    }
}

impl<E: TransferEngine> Request<E> {
    /// Run `f` unless the transfer delivering events was aborted
    fn with_live<R>(&self, f: impl FnOnce(&mut Inner<E>) -> R) -> Option<R> {
        self.with(|inner| {
            if inner.aborted {
                tracing::trace!("event after abort dropped");
                None
            } else {
                Some(f(inner))
            }
        })
    }

    /// Apply one engine event to the request.
    ///
    /// Events arriving after `abort()` detached the running transfer are
    /// ignored.
    pub fn handle_event(&self, event: EngineEvent<'_>) {
        tracing::trace!(event = event.name(), "engine event");
        match event {
            EngineEvent::Connected => {
                if self.with_live(|inner| inner.touch()).is_some() {
                    self.advance_live(ReadyState::Opened);
                }
            }
            EngineEvent::Header { name, value } => {
                tracing::trace!(name, value, "response header");
                self.with_live(|inner| {
                    inner.headers.set_or_replace(name, value);
                    inner.touch();
                });
            }
            EngineEvent::Data(bytes) => {
                self.advance_live(ReadyState::HeadersReceived);
                self.handle_data(bytes);
            }
            EngineEvent::Finished => {
                let live = self.with_live(|inner| {
                    if let Some(handle) = inner.handle.as_ref() {
                        inner.http_code = self.engine.status_code(handle);
                    }
                    inner.request_body = None;
                    inner.touch();
                    tracing::debug!(
                        status = inner.http_code,
                        received = inner.response.received(),
                        elapsed_ms = inner.elapsed_ms(),
                        "transfer finished"
                    );
                });
                if live.is_some() {
                    self.advance_live(ReadyState::Done);
                    self.notify_data();
                }
            }
            EngineEvent::HeadersSent | EngineEvent::Disconnected => {
                self.with_live(|inner| inner.touch());
            }
            EngineEvent::Error => {
                tracing::debug!("engine reported an error");
            }
        }
    }

    fn handle_data(&self, bytes: &[u8]) {
        let has_data = self.with_live(|inner| {
            let (chunked, declared) = match inner.handle.as_ref() {
                Some(handle) => (
                    self.engine.is_chunked(handle),
                    self.engine.content_length(handle),
                ),
                None => (false, None),
            };
            inner.response.on_data(bytes, chunked, declared);
            inner.touch();
            tracing::trace!(
                len = bytes.len(),
                buffered = inner.response.buffered(),
                chunked,
                "response data"
            );
            inner.response.buffered() > 0
        });

        match has_data {
            Some(true) => self.advance_live(ReadyState::Loading),
            Some(false) => {}
            None => return,
        }
        self.notify_data();
    }

    /// Run the data callback while data is readable and the callback keeps
    /// consuming it.
    fn notify_data(&self) {
        let mut last = usize::MAX;
        loop {
            let (callback, available) = self.with(|inner| {
                let available = if inner.ready_state < ReadyState::Loading {
                    0
                } else {
                    inner.response.available()
                };
                (inner.on_data.clone(), available)
            });
            let Some(callback) = callback else {
                return;
            };
            if available == 0 || available >= last {
                return;
            }
            last = available;
            callback(self, available);
        }
    }
}
