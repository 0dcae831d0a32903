// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Scripted, instrumented engine for unit tests

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use bytes::Bytes;
use parking_lot::Mutex;

use super::{EngineEvent, EventSink, PerformOutcome, TransferConfig, TransferEngine};
use crate::http::Method;

/// Owned form of an engine event
#[derive(Debug, Clone)]
pub(crate) enum Step {
    Connected,
    HeadersSent,
    Header(String, String),
    Data(Vec<u8>),
    Finished,
    Disconnected,
    Error,
}

impl Step {
    fn as_event(&self) -> EngineEvent<'_> {
        match self {
            Step::Connected => EngineEvent::Connected,
            Step::HeadersSent => EngineEvent::HeadersSent,
            Step::Header(name, value) => EngineEvent::Header { name, value },
            Step::Data(bytes) => EngineEvent::Data(bytes),
            Step::Finished => EngineEvent::Finished,
            Step::Disconnected => EngineEvent::Disconnected,
            Step::Error => EngineEvent::Error,
        }
    }
}

/// What the engine does on each `perform`
#[derive(Debug, Clone)]
pub(crate) struct Script {
    /// Events delivered by a successful perform
    pub steps: Vec<Step>,
    /// Outcomes in order; the last one repeats
    pub outcomes: VecDeque<PerformOutcome>,
    pub status: i32,
    pub content_length: Option<usize>,
    pub chunked: bool,
    /// Time spent inside perform before delivering events
    pub delay: Duration,
    /// Deliver events from a separate thread
    pub threaded: bool,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            steps: Vec::new(),
            outcomes: VecDeque::from([PerformOutcome::Ok]),
            status: 200,
            content_length: None,
            chunked: false,
            delay: Duration::ZERO,
            threaded: false,
        }
    }
}

impl Script {
    /// Plain response with a declared length
    pub fn response(status: i32, headers: &[(&str, &str)], body: &[u8]) -> Self {
        let mut steps = vec![Step::Connected, Step::HeadersSent];
        steps.extend(
            headers
                .iter()
                .map(|(n, v)| Step::Header(n.to_string(), v.to_string())),
        );
        if !body.is_empty() {
            steps.push(Step::Data(body.to_vec()));
        }
        steps.push(Step::Finished);
        steps.push(Step::Disconnected);

        Self {
            steps,
            status,
            content_length: Some(body.len()),
            ..Default::default()
        }
    }

    pub fn outcomes(mut self, outcomes: &[PerformOutcome]) -> Self {
        self.outcomes = outcomes.iter().copied().collect();
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn threaded(mut self) -> Self {
        self.threaded = true;
        self
    }
}

/// Engine stub counting every call it receives
#[derive(Debug, Default)]
pub(crate) struct ScriptedEngine {
    script: Mutex<Script>,
    pub fail_init: AtomicBool,
    pub inits: AtomicUsize,
    pub cleanups: AtomicUsize,
    pub closes: AtomicUsize,
    pub performs: AtomicUsize,
    active: AtomicUsize,
    pub peak_active: AtomicUsize,
    /// Handles inside a perform call right now
    performing: Mutex<HashSet<u64>>,
    /// `cleanup` calls that hit a handle still inside perform
    pub released_in_use: AtomicUsize,
    next_handle: AtomicU64,
    pub configs: Mutex<Vec<TransferConfig>>,
    pub methods: Mutex<Vec<Method>>,
    pub urls: Mutex<Vec<String>>,
    pub headers: Mutex<Vec<(String, String)>>,
    pub bodies: Mutex<Vec<Bytes>>,
}

impl ScriptedEngine {
    pub fn new(script: Script) -> Self {
        Self {
            script: Mutex::new(script),
            ..Default::default()
        }
    }

    pub fn live_handles(&self) -> usize {
        self.inits.load(Ordering::SeqCst) - self.cleanups.load(Ordering::SeqCst)
    }

    fn next_outcome(&self) -> PerformOutcome {
        let mut script = self.script.lock();
        if script.outcomes.len() > 1 {
            script.outcomes.pop_front().unwrap_or(PerformOutcome::Ok)
        } else {
            script.outcomes.front().copied().unwrap_or(PerformOutcome::Ok)
        }
    }
}

impl TransferEngine for ScriptedEngine {
    type Handle = u64;

    fn init(&self, config: &TransferConfig) -> Option<u64> {
        if self.fail_init.load(Ordering::SeqCst) {
            return None;
        }
        self.inits.fetch_add(1, Ordering::SeqCst);
        self.configs.lock().push(config.clone());
        Some(self.next_handle.fetch_add(1, Ordering::SeqCst))
    }

    fn set_method(&self, _handle: &u64, method: Method) {
        self.methods.lock().push(method);
    }

    fn set_url(&self, _handle: &u64, url: &str) {
        self.urls.lock().push(url.to_string());
    }

    fn set_header(&self, _handle: &u64, name: &str, value: &str) {
        self.headers.lock().push((name.to_string(), value.to_string()));
    }

    fn set_body(&self, _handle: &u64, body: Bytes) {
        self.bodies.lock().push(body);
    }

    fn perform(&self, handle: &u64, events: &dyn EventSink) -> PerformOutcome {
        self.performing.lock().insert(*handle);
        self.performs.fetch_add(1, Ordering::SeqCst);
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_active.fetch_max(now, Ordering::SeqCst);

        let script = self.script.lock().clone();
        std::thread::sleep(script.delay);
        let outcome = self.next_outcome();

        let steps: Vec<Step> = match outcome {
            PerformOutcome::Ok => script.steps,
            PerformOutcome::TryAgain => Vec::new(),
            PerformOutcome::Failed => vec![Step::Connected, Step::Error],
        };
        let deliver = || {
            for step in &steps {
                events.on_event(step.as_event());
            }
        };
        if script.threaded {
            std::thread::scope(|s| {
                s.spawn(deliver);
            });
        } else {
            deliver();
        }

        self.active.fetch_sub(1, Ordering::SeqCst);
        self.performing.lock().remove(handle);
        outcome
    }

    fn status_code(&self, _handle: &u64) -> i32 {
        self.script.lock().status
    }

    fn content_length(&self, _handle: &u64) -> Option<usize> {
        self.script.lock().content_length
    }

    fn is_chunked(&self, _handle: &u64) -> bool {
        self.script.lock().chunked
    }

    fn close(&self, _handle: &u64) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }

    fn cleanup(&self, handle: u64) {
        if self.performing.lock().contains(&handle) {
            self.released_in_use.fetch_add(1, Ordering::SeqCst);
        }
        self.cleanups.fetch_add(1, Ordering::SeqCst);
    }
}
