// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Browser-style request object
//!
//! A [`Request`] walks the `Unsent → Opened → HeadersReceived → Loading →
//! Done` lifecycle while a [`TransferEngine`] performs the transfer and
//! reports progress as events.
//!
//! # Locking
//!
//! All mutable state sits behind one reentrant lock per instance. Engine
//! events may arrive on another thread while the caller polls, so every
//! accessor takes the lock. The lock is released before user callbacks run
//! and across the blocking engine `perform` call, so callbacks may call back
//! into the request and `abort()` stays usable during `send()`.
//!
//! # Outcome reporting
//!
//! `open()` and the `send*()` family return whether the call was well formed.
//! A transfer that later fails still returns `true` from `send()`; inspect
//! [`Request::response_http_code`] once the state reaches `Done`.

use std::cell::RefCell;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::{Buf, Bytes};
use parking_lot::ReentrantMutex;

use crate::config::RequestConfig;
use crate::engine::{PerformOutcome, TransferConfig, TransferEngine};
use crate::error::{Error, InternalCode, Result};
use crate::gate::{self, AdmissionGate};
use crate::http::{names, HeaderList, Method, ParsedUrl, ResponseBuffer};

mod events;
mod state;

pub use state::ReadyState;

/// Called with the new state after every state change
pub type ReadyStateCallback<E> = Arc<dyn Fn(&Request<E>, ReadyState) + Send + Sync>;

/// Called with the number of readable bytes while response data is pending
pub type DataCallback<E> = Arc<dyn Fn(&Request<E>, usize) + Send + Sync>;

struct Inner<E: TransferEngine> {
    config: RequestConfig,
    url: ParsedUrl,
    method: Method,
    /// Request headers until `send()`, response headers afterwards
    headers: HeaderList,
    /// Between `open()` and `send()`
    staging: bool,
    response: ResponseBuffer,
    ready_state: ReadyState,
    http_code: i32,
    handle: Option<E::Handle>,
    /// An engine perform call is running
    in_flight: bool,
    /// `abort()` detached the handle of the running transfer; its events are
    /// dropped until the next `open()`
    aborted: bool,
    /// POST body kept alive until the transfer finishes
    request_body: Option<Bytes>,
    request_start: Option<Instant>,
    request_end: Option<Instant>,
    last_activity: Option<Instant>,
    on_ready_state_change: Option<ReadyStateCallback<E>>,
    on_data: Option<DataCallback<E>>,
}

impl<E: TransferEngine> Inner<E> {
    fn new(config: RequestConfig) -> Self {
        Self {
            config,
            url: ParsedUrl::default(),
            method: Method::Get,
            headers: HeaderList::new(),
            staging: false,
            response: ResponseBuffer::new(),
            ready_state: ReadyState::Unsent,
            http_code: 0,
            handle: None,
            in_flight: false,
            aborted: false,
            request_body: None,
            request_start: None,
            request_end: None,
            last_activity: None,
            on_ready_state_change: None,
            on_data: None,
        }
    }

    /// Milliseconds since the last `open()`
    fn elapsed_ms(&self) -> u64 {
        self.request_start
            .map(|start| start.elapsed().as_millis() as u64)
            .unwrap_or(0)
    }

    fn touch(&mut self) {
        self.last_activity = Some(Instant::now());
    }

    /// Take the engine handle for release. While a perform call is running
    /// the handle is only detached; `send()` releases it once perform returns.
    fn release_handle(&mut self) -> Option<E::Handle> {
        let handle = self.handle.take();
        if self.in_flight {
            self.aborted |= handle.is_some();
            return None;
        }
        handle
    }

    fn transfer_config(&self, url: &str) -> TransferConfig {
        TransferConfig {
            url: url.to_string(),
            method: self.method,
            buffer_size: self.config.buffer_size,
            certificate: self.config.certificate.clone(),
            use_global_ca_store: self.config.use_global_ca_store,
            timeout: self.config.timeout(),
        }
    }
}

/// Asynchronous-style HTTP request driven by a transfer engine
pub struct Request<E: TransferEngine> {
    engine: Arc<E>,
    gate: Arc<AdmissionGate>,
    inner: ReentrantMutex<RefCell<Inner<E>>>,
}

impl<E: TransferEngine> Request<E> {
    /// Create a request with default configuration
    pub fn new(engine: Arc<E>, gate: Arc<AdmissionGate>) -> Self {
        Self::with_config(engine, gate, RequestConfig::default())
    }

    /// Create a request with custom configuration
    pub fn with_config(engine: Arc<E>, gate: Arc<AdmissionGate>, config: RequestConfig) -> Self {
        tracing::trace!("new request");
        Self {
            engine,
            gate,
            inner: ReentrantMutex::new(RefCell::new(Inner::new(config))),
        }
    }

    /// Create a request sharing the process-wide gate from [`gate::init_global`]
    pub fn from_global(engine: Arc<E>, config: RequestConfig) -> Result<Self> {
        let gate = gate::global()
            .ok_or_else(|| Error::Config("admission gate not initialised".into()))?;
        Ok(Self::with_config(engine, gate, config))
    }

    fn with<R>(&self, f: impl FnOnce(&mut Inner<E>) -> R) -> R {
        let guard = self.inner.lock();
        let mut inner = guard.borrow_mut();
        f(&mut inner)
    }

    /// Move the lifecycle forward. Backward or repeated states are ignored.
    fn advance(&self, new: ReadyState) {
        self.transition(new, false);
    }

    /// [`Request::advance`] for engine events, ignored once the transfer has
    /// been aborted
    fn advance_live(&self, new: ReadyState) {
        self.transition(new, true);
    }

    fn transition(&self, new: ReadyState, from_engine: bool) {
        let callback = {
            let guard = self.inner.lock();
            let mut inner = guard.borrow_mut();
            if new <= inner.ready_state || (from_engine && inner.aborted) {
                return;
            }
            inner.ready_state = new;
            if new == ReadyState::Done {
                inner.request_end = Some(Instant::now());
            }
            tracing::debug!(state = %new, elapsed_ms = inner.elapsed_ms(), "ready state changed");
            inner.on_ready_state_change.clone()
        };
        if let Some(callback) = callback {
            callback(self, new);
        }
    }

    fn report(op: &'static str, result: Result<()>) -> bool {
        match result {
            Ok(()) => true,
            Err(err) => {
                tracing::debug!(op, error = %err, "call rejected");
                false
            }
        }
    }

    /// Start a new request cycle. Only legal in `Unsent` or `Done`.
    pub fn open(&self, method: &str, url: &str) -> bool {
        Self::report("open", self.try_open(method, url))
    }

    /// [`Request::open`] with the failure reason
    pub fn try_open(&self, method: &str, url: &str) -> Result<()> {
        let guard = self.inner.lock();
        let mut inner_ref = guard.borrow_mut();
        let inner = &mut *inner_ref;

        tracing::debug!(method, url, elapsed_ms = inner.elapsed_ms(), "open");
        if inner.in_flight || !inner.ready_state.can_open() {
            return Err(Error::invalid_state(inner.ready_state));
        }
        let method: Method = method.parse()?;
        let parsed = ParsedUrl::parse_with(url, inner.config.url_mode)?;

        inner.request_start = Some(Instant::now());
        inner.request_end = None;
        inner.headers = HeaderList::new();
        inner.response = ResponseBuffer::new();
        inner.request_body = None;
        inner.http_code = 0;
        inner.ready_state = ReadyState::Unsent;
        inner.aborted = false;
        inner.headers.set_or_replace(names::HOST, parsed.host.as_str());
        inner.staging = true;
        inner.method = method;
        tracing::trace!(
            scheme = %parsed.scheme,
            host = %parsed.host,
            port = %parsed.port,
            path = %parsed.path,
            query = %parsed.query,
            "target parsed"
        );
        inner.url = parsed;

        match inner.handle.as_ref() {
            Some(handle) => {
                self.engine.set_method(handle, method);
                self.engine.set_url(handle, url);
            }
            None => {
                let config = inner.transfer_config(url);
                match self.engine.init(&config) {
                    Some(handle) => inner.handle = Some(handle),
                    None => {
                        inner.staging = false;
                        inner.http_code = InternalCode::OpenFailed.code();
                        return Err(Error::EngineInitFailed);
                    }
                }
            }
        }
        inner.touch();
        Ok(())
    }

    /// Stage a request header. Ignored once the request has been sent.
    pub fn set_request_header(&self, name: &str, value: &str) {
        self.with(|inner| {
            if inner.staging && inner.ready_state <= ReadyState::Opened {
                inner.headers.set_or_replace(name, value);
            } else {
                tracing::debug!(name, "request header ignored after send");
            }
        });
    }

    /// Stage a request header with an integer value
    pub fn set_request_header_int(&self, name: &str, value: i64) {
        self.set_request_header(name, &value.to_string());
    }

    /// Send without a body
    pub fn send(&self) -> bool {
        Self::report("send", self.try_send_body(Bytes::new()))
    }

    /// [`Request::send`] with the failure reason
    pub fn try_send(&self) -> Result<()> {
        self.try_send_body(Bytes::new())
    }

    /// Send a text body
    pub fn send_text(&self, body: &str) -> bool {
        Self::report("send", self.try_send_body(Bytes::copy_from_slice(body.as_bytes())))
    }

    /// Send a raw byte body
    pub fn send_bytes(&self, body: &[u8]) -> bool {
        Self::report("send", self.try_send_body(Bytes::copy_from_slice(body)))
    }

    /// Send up to `len` bytes taken from the front of a byte queue
    pub fn send_buf<B: Buf>(&self, body: &mut B, len: usize) -> bool {
        let len = len.min(body.remaining());
        Self::report("send", self.try_send_body(body.copy_to_bytes(len)))
    }

    /// Hand the staged request to the engine and run the transfer.
    ///
    /// Blocks until the engine's perform call returns. `Ok` only means the
    /// call was accepted; transfer failures are reported through the
    /// response code with the state driven to `Done`.
    pub fn try_send_body(&self, body: Bytes) -> Result<()> {
        let (handle, secure, max_retries) = {
            let guard = self.inner.lock();
            let mut inner_ref = guard.borrow_mut();
            let inner = &mut *inner_ref;

            if !inner.staging {
                return Err(Error::invalid_state(inner.ready_state));
            }
            let handle = inner.handle.clone().ok_or(Error::NoTransfer)?;

            if inner.method == Method::Post {
                inner
                    .headers
                    .set_or_replace(names::CONTENT_LENGTH, body.len().to_string());
            }
            for header in inner.headers.drain() {
                self.engine.set_header(&handle, &header.name, &header.value);
            }
            inner.staging = false;
            inner.in_flight = true;

            if !body.is_empty() {
                self.engine.set_body(&handle, body.clone());
                inner.request_body = Some(body);
            }
            inner.touch();
            tracing::debug!(
                method = %inner.method,
                url = %inner.url,
                elapsed_ms = inner.elapsed_ms(),
                "send"
            );
            (
                handle,
                inner.url.is_secure(),
                inner.config.max_transient_retries,
            )
        };

        let result = self.perform(&handle, secure, max_retries);

        let aborted = self.with(|inner| {
            inner.in_flight = false;
            inner.touch();
            inner.aborted
        });
        if aborted {
            // abort() detached the handle while perform was using it
            tracing::debug!("transfer aborted, releasing detached handle");
            self.engine.cleanup(handle);
        } else if let Err(err) = result {
            tracing::warn!(error = %err, "transfer failed");
            self.with(|inner| inner.http_code = InternalCode::PerformFailed.code());
            self.abort();
            self.advance(ReadyState::Done);
        }
        Ok(())
    }

    /// Run the engine, holding a gate slot for secure targets.
    ///
    /// "Try again" results are retried at most `max_retries` times before
    /// being treated as a hard failure.
    fn perform(&self, handle: &E::Handle, secure: bool, max_retries: u32) -> Result<u32> {
        let _permit = if secure {
            Some(self.gate.acquire()?)
        } else {
            None
        };

        let mut attempts = 0u32;
        loop {
            attempts += 1;
            match self.engine.perform(handle, self) {
                PerformOutcome::Ok => return Ok(attempts),
                PerformOutcome::TryAgain if attempts <= max_retries => {
                    tracing::trace!(attempts, "engine asked to try again");
                    std::thread::yield_now();
                }
                PerformOutcome::TryAgain | PerformOutcome::Failed => {
                    return Err(Error::PerformFailed { attempts });
                }
            }
        }
    }

    /// Release the engine transfer handle.
    ///
    /// Does not change the ready state. A perform call already running on
    /// another thread is not interrupted: its handle is only detached here and
    /// released by `send()` once perform returns, and the events it still
    /// delivers are dropped. `open()` is rejected until then.
    pub fn abort(&self) {
        let guard = self.inner.lock();
        let handle = {
            let mut inner = guard.borrow_mut();
            tracing::debug!(
                elapsed_ms = inner.elapsed_ms(),
                in_flight = inner.in_flight,
                "abort"
            );
            inner.release_handle()
        };
        if let Some(handle) = handle {
            self.engine.cleanup(handle);
        }
    }

    pub fn ready_state(&self) -> ReadyState {
        self.with(|inner| inner.ready_state)
    }

    /// HTTP status when positive, [`InternalCode`] sentinel when negative,
    /// zero while no outcome is known
    pub fn response_http_code(&self) -> i32 {
        self.with(|inner| inner.http_code)
    }

    pub fn response_header_count(&self) -> usize {
        self.with(|inner| {
            if inner.ready_state < ReadyState::HeadersReceived {
                0
            } else {
                inner.headers.len()
            }
        })
    }

    pub fn response_header_name(&self, index: usize) -> Option<String> {
        self.with(|inner| {
            if inner.ready_state < ReadyState::HeadersReceived {
                return None;
            }
            inner.headers.get_index(index).map(|h| h.name.clone())
        })
    }

    pub fn response_header_value(&self, name: &str) -> Option<String> {
        self.with(|inner| {
            if inner.ready_state < ReadyState::HeadersReceived {
                return None;
            }
            inner.headers.get(name).map(str::to_string)
        })
    }

    pub fn response_header_value_at(&self, index: usize) -> Option<String> {
        self.with(|inner| {
            if inner.ready_state < ReadyState::HeadersReceived {
                return None;
            }
            inner.headers.get_index(index).map(|h| h.value.clone())
        })
    }

    pub fn response_header_exists(&self, name: &str) -> bool {
        self.with(|inner| {
            inner.ready_state >= ReadyState::HeadersReceived && inner.headers.contains(name)
        })
    }

    /// Current header list rendered as `name: value` lines
    pub fn all_headers_text(&self) -> String {
        self.with(|inner| inner.headers.render_all())
    }

    /// Response bytes readable now
    pub fn available(&self) -> usize {
        self.with(|inner| {
            if inner.ready_state < ReadyState::Loading {
                0
            } else {
                inner.response.available()
            }
        })
    }

    /// Declared length, or bytes received so far for chunked responses
    pub fn response_length(&self) -> usize {
        self.with(|inner| {
            if inner.ready_state < ReadyState::Loading {
                0
            } else {
                inner.response.content_length()
            }
        })
    }

    /// Drain all readable response bytes as text, empty on failure.
    ///
    /// Invalid UTF-8 is replaced with U+FFFD. Binary bodies should be read
    /// with [`Request::response_bytes`] or [`Request::response_read`].
    pub fn response_text(&self) -> String {
        self.try_response_text().unwrap_or_default()
    }

    /// Drain all readable response bytes as text, replacing invalid UTF-8.
    ///
    /// When the text cannot be allocated the request is failed: the code
    /// becomes `TooLittleMemory`, the engine handle is torn down and the
    /// state moves to `Done`.
    pub fn try_response_text(&self) -> Result<String> {
        let guard = self.inner.lock();
        let result = {
            let mut inner = guard.borrow_mut();
            if inner.ready_state < ReadyState::Loading || inner.response.available() == 0 {
                tracing::trace!("response text: no data");
                return Ok(String::new());
            }
            inner.response.read_text(usize::MAX)
        };

        match result {
            Ok(text) => {
                tracing::trace!(len = text.len(), "response text");
                Ok(text)
            }
            Err(err) => {
                tracing::warn!(error = %err, "response text allocation failed");
                let handle = {
                    let mut inner = guard.borrow_mut();
                    inner.http_code = InternalCode::TooLittleMemory.code();
                    inner.release_handle()
                };
                if let Some(handle) = handle {
                    self.engine.close(&handle);
                    self.engine.cleanup(handle);
                }
                drop(guard);
                self.advance(ReadyState::Done);
                Err(err)
            }
        }
    }

    /// Copy readable response bytes into `buf`
    pub fn response_read(&self, buf: &mut [u8]) -> usize {
        self.with(|inner| {
            if inner.ready_state < ReadyState::Loading {
                return 0;
            }
            let n = inner.response.read_into(buf);
            tracing::trace!(len = n, "response read");
            n
        })
    }

    /// Drain up to `max_len` readable response bytes
    pub fn response_bytes(&self, max_len: usize) -> Bytes {
        self.with(|inner| {
            if inner.ready_state < ReadyState::Loading {
                return Bytes::new();
            }
            inner.response.read(max_len)
        })
    }

    /// Time spent on the current or last transfer
    pub fn elapsed_time(&self) -> Duration {
        self.with(|inner| {
            let Some(start) = inner.request_start else {
                return Duration::ZERO;
            };
            match inner.ready_state {
                ReadyState::Unsent | ReadyState::Opened => Duration::ZERO,
                ReadyState::Done => inner
                    .request_end
                    .map(|end| end.saturating_duration_since(start))
                    .unwrap_or_default(),
                _ => start.elapsed(),
            }
        })
    }

    /// Register the state change callback
    pub fn on_ready_state_change<F>(&self, callback: F)
    where
        F: Fn(&Request<E>, ReadyState) + Send + Sync + 'static,
    {
        self.with(|inner| inner.on_ready_state_change = Some(Arc::new(callback)));
    }

    /// Register the data callback.
    ///
    /// It is invoked after each data event and again when the transfer
    /// finishes, repeatedly while it keeps consuming data.
    pub fn on_data<F>(&self, callback: F)
    where
        F: Fn(&Request<E>, usize) + Send + Sync + 'static,
    {
        tracing::trace!("data callback set");
        self.with(|inner| inner.on_data = Some(Arc::new(callback)));
    }

    /// Set the receive timeout in seconds. Applied by the engine, and only to
    /// transfer handles created after the call.
    pub fn set_timeout(&self, seconds: u64) {
        tracing::debug!(seconds, "set timeout");
        self.with(|inner| inner.config.timeout_secs = seconds);
    }

    pub fn timeout(&self) -> Duration {
        self.with(|inner| inner.config.timeout())
    }

    /// Decomposed target of the current cycle
    pub fn url(&self) -> ParsedUrl {
        self.with(|inner| inner.url.clone())
    }

    pub fn method(&self) -> Method {
        self.with(|inner| inner.method)
    }

    pub fn last_activity(&self) -> Option<Instant> {
        self.with(|inner| inner.last_activity)
    }

    pub fn config(&self) -> RequestConfig {
        self.with(|inner| inner.config.clone())
    }

    /// Library version
    pub fn version(&self) -> &'static str {
        crate::VERSION
    }
}

impl<E: TransferEngine> Drop for Request<E> {
    fn drop(&mut self) {
        if let Some(handle) = self.inner.get_mut().get_mut().handle.take() {
            self.engine.cleanup(handle);
        }
    }
}

impl<E: TransferEngine> fmt::Debug for Request<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let guard = self.inner.lock();
        let mut out = f.debug_struct("Request");
        if let Ok(inner) = guard.try_borrow() {
            out.field("method", &inner.method)
                .field("url", &inner.url.to_string())
                .field("ready_state", &inner.ready_state)
                .field("http_code", &inner.http_code);
        }
        out.finish_non_exhaustive()
    }
}
