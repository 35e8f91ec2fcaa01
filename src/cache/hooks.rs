//! Instrumentation Hook Module
//!
//! The narrow reporting interface the store calls on every operation.
//! Concrete metrics sinks live outside this crate; they only need to
//! implement [`InstrumentationHook`].

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

use crate::error::HookError;

// == Operation ==
/// Store operations that are reported to the hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Get,
    Set,
    Delete,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Get => "get",
            Operation::Set => "set",
            Operation::Delete => "delete",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// == Operation Report ==
/// One completed store operation.
///
/// `success` is true for a get hit, every set, and a delete that removed a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationReport {
    pub operation: Operation,
    pub duration_micros: u64,
    pub success: bool,
}

// == Instrumentation Hook ==
/// Receives per-operation reports and hit/miss counts.
///
/// Calls arrive on a dedicated dispatcher thread, never while the store is
/// locked, so a slow sink only delays its own queue. Errors are logged by
/// the dispatcher and otherwise ignored.
pub trait InstrumentationHook: Send + Sync {
    fn record_operation(&self, report: OperationReport) -> Result<(), HookError>;

    fn record_hit(&self) -> Result<(), HookError>;

    fn record_miss(&self) -> Result<(), HookError>;
}

// == Tracing Hook ==
/// Emits every report as a `tracing` debug event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingHook;

impl InstrumentationHook for TracingHook {
    fn record_operation(&self, report: OperationReport) -> Result<(), HookError> {
        debug!(
            operation = %report.operation,
            duration_micros = report.duration_micros,
            success = report.success,
            "cache operation"
        );
        Ok(())
    }

    fn record_hit(&self) -> Result<(), HookError> {
        debug!("cache hit");
        Ok(())
    }

    fn record_miss(&self) -> Result<(), HookError> {
        debug!("cache miss");
        Ok(())
    }
}

/// Events buffered between the store and its hook.
pub const HOOK_QUEUE_CAPACITY: usize = 1024;

#[derive(Debug, Clone, Copy)]
pub(crate) enum HookEvent {
    Operation(OperationReport),
    Hit,
    Miss,
}

// == Hook Dispatcher ==
/// Fire-and-forget bridge from the store to an [`InstrumentationHook`].
///
/// The store enqueues with `try_send` and moves on; a full queue drops the
/// event. The dispatcher thread exits once the store is dropped.
pub(crate) struct HookDispatcher {
    sender: mpsc::Sender<HookEvent>,
    dropped: AtomicU64,
}

impl HookDispatcher {
    pub(crate) fn spawn(
        hook: Arc<dyn InstrumentationHook>,
        capacity: usize,
    ) -> std::io::Result<Self> {
        let (sender, mut receiver) = mpsc::channel(capacity.max(1));

        std::thread::Builder::new()
            .name("cache-instrumentation".to_string())
            .spawn(move || {
                while let Some(event) = receiver.blocking_recv() {
                    deliver(hook.as_ref(), event);
                }
                debug!("Instrumentation dispatcher stopped");
            })?;

        Ok(Self {
            sender,
            dropped: AtomicU64::new(0),
        })
    }

    pub(crate) fn send(&self, event: HookEvent) {
        match self.sender.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                // Log at 1, 2, 4, 8, ... so a stuck sink doesn't flood the log
                if dropped.is_power_of_two() {
                    warn!("Instrumentation queue full, {} events dropped so far", dropped);
                }
            }
            Err(TrySendError::Closed(_)) => debug!("Instrumentation dispatcher gone, event dropped"),
        }
    }

    pub(crate) fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

fn deliver(hook: &dyn InstrumentationHook, event: HookEvent) {
    let result = match event {
        HookEvent::Operation(report) => hook.record_operation(report),
        HookEvent::Hit => hook.record_hit(),
        HookEvent::Miss => hook.record_miss(),
    };
    if let Err(e) = result {
        warn!("Instrumentation hook error ignored: {}", e);
    }
}
