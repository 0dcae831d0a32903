// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Process-wide admission gate for secure transfers
//!
//! Some TLS stacks cannot run concurrent handshakes. Every secure transfer
//! holds one gate slot for the whole blocking perform call. Plain HTTP
//! transfers never touch the gate.
//!
//! The gate is created explicitly, either as a standalone `Arc` handed to
//! each request or once per process through [`init_global`].

use std::sync::{Arc, OnceLock};

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::error::{Error, Result};

/// Default number of concurrent secure transfers
pub const DEFAULT_CAPACITY: usize = 1;

static GLOBAL_GATE: OnceLock<Arc<AdmissionGate>> = OnceLock::new();

/// Counting gate bounding concurrent secure transfers
#[derive(Debug)]
pub struct AdmissionGate {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

/// One held gate slot, released on drop
#[derive(Debug)]
pub struct GatePermit {
    _permit: OwnedSemaphorePermit,
}

impl AdmissionGate {
    /// Create a gate admitting `capacity` concurrent transfers
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::Config("admission gate capacity must be at least 1".into()));
        }
        Ok(Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        })
    }

    /// Take a slot, blocking the calling thread until one is free
    pub fn acquire(&self) -> Result<GatePermit> {
        let permit = futures::executor::block_on(self.semaphore.clone().acquire_owned())
            .map_err(|_| Error::GateClosed)?;
        Ok(GatePermit { _permit: permit })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Refuse further acquisitions. Waiters fail with `GateClosed`.
    pub fn close(&self) {
        self.semaphore.close();
    }
}

impl Default for AdmissionGate {
    fn default() -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(DEFAULT_CAPACITY)),
            capacity: DEFAULT_CAPACITY,
        }
    }
}

/// Create the process-wide gate. Call once at startup.
pub fn init_global(capacity: usize) -> Result<Arc<AdmissionGate>> {
    let gate = Arc::new(AdmissionGate::new(capacity)?);
    GLOBAL_GATE
        .set(gate.clone())
        .map_err(|_| Error::GateAlreadyInitialized)?;
    tracing::debug!(capacity, "admission gate initialised");
    Ok(gate)
}

/// The process-wide gate, if [`init_global`] has run
pub fn global() -> Option<Arc<AdmissionGate>> {
    GLOBAL_GATE.get().cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(matches!(AdmissionGate::new(0), Err(Error::Config(_))));
        assert_eq!(AdmissionGate::default().capacity(), DEFAULT_CAPACITY);
    }

    #[test]
    fn test_permit_released_on_drop() {
        let gate = AdmissionGate::new(1).unwrap();
        let permit = gate.acquire().unwrap();
        drop(permit);
        let _again = gate.acquire().unwrap();
    }

    #[test]
    fn test_gate_bounds_concurrency() {
        let gate = Arc::new(AdmissionGate::new(2).unwrap());
        let inside = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let workers: Vec<_> = (0..6)
            .map(|_| {
                let gate = gate.clone();
                let inside = inside.clone();
                let peak = peak.clone();
                std::thread::spawn(move || {
                    let _permit = gate.acquire().unwrap();
                    let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    std::thread::sleep(Duration::from_millis(10));
                    inside.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[test]
    fn test_closed_gate_fails_acquire() {
        let gate = AdmissionGate::new(1).unwrap();
        gate.close();
        assert!(matches!(gate.acquire(), Err(Error::GateClosed)));
    }

    #[test]
    fn test_global_gate_initialised_once() {
        let first = init_global(3);
        let second = init_global(1);

        // Another test may have installed it first
        assert!(first.is_ok() || matches!(first, Err(Error::GateAlreadyInitialized)));
        assert!(matches!(second, Err(Error::GateAlreadyInitialized)));
        assert!(global().is_some());
    }
}
