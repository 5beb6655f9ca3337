// crates/sandbox-verify-core/src/runtime/observers.rs
// ============================================================================
// Module: Run Observers
// Description: Reference run observers for structured event logging.
// Purpose: Emit run events as JSON lines or fan them out to several sinks.
// Dependencies: crate::interfaces, serde_json, std
// ============================================================================

//! ## Overview
//! [`JsonLinesObserver`] writes one JSON object per event to any writer.
//! Write failures are counted instead of propagated so logging never changes
//! the verdict of a run.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use crate::interfaces::RunEvent;
use crate::interfaces::RunObserver;

// ============================================================================
// SECTION: Noop Observer
// ============================================================================

/// Observer that discards every event.
pub struct NoopObserver;

impl RunObserver for NoopObserver {
    fn record(&self, _event: &RunEvent) {}
}

// ============================================================================
// SECTION: JSON Lines Observer
// ============================================================================

/// Observer writing each event as a single JSON line.
pub struct JsonLinesObserver<W: Write + Send> {
    /// Output writer for event records.
    writer: Mutex<W>,
    /// Number of events that could not be written.
    failures: AtomicU64,
}

impl<W: Write + Send> JsonLinesObserver<W> {
    /// Creates an observer over `writer`.
    pub const fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
            failures: AtomicU64::new(0),
        }
    }

    /// Returns how many events failed to write.
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    /// Consumes the observer and returns the writer.
    pub fn into_inner(self) -> W {
        self.writer.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    /// Writes one event line.
    fn write_event(&self, event: &RunEvent) -> Result<(), String> {
        let mut guard =
            self.writer.lock().map_err(|_| "event writer mutex poisoned".to_string())?;
        serde_json::to_writer(&mut *guard, event).map_err(|err| err.to_string())?;
        guard.write_all(b"\n").map_err(|err| err.to_string())?;
        guard.flush().map_err(|err| err.to_string())?;
        drop(guard);
        Ok(())
    }
}

impl<W: Write + Send> RunObserver for JsonLinesObserver<W> {
    fn record(&self, event: &RunEvent) {
        if self.write_event(event).is_err() {
            self.failures.fetch_add(1, Ordering::Relaxed);
        }
    }
}

// ============================================================================
// SECTION: Composite Observer
// ============================================================================

/// Observer forwarding each event to several observers in order.
#[derive(Default)]
pub struct CompositeObserver {
    /// Downstream observers.
    observers: Vec<Box<dyn RunObserver>>,
}

impl CompositeObserver {
    /// Creates an empty composite observer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an observer.
    #[must_use]
    pub fn with(mut self, observer: Box<dyn RunObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Returns the number of downstream observers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    /// Returns true when no observer is attached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl RunObserver for CompositeObserver {
    fn record(&self, event: &RunEvent) {
        for observer in &self.observers {
            observer.record(event);
        }
    }
}
