//! Graceful shutdown handling for pipeline runs.
//!
//! Ctrl+C sets a global flag and kills in-flight generation subprocesses.
//! Pipelines poll a [`ShutdownSignal`] between chunks, during pacing and
//! between submission batches. Extraction then returns
//! `PipelineError::Aborted` without emitting a partial document; estimation
//! returns its report so far marked as aborted. A third Ctrl+C force-quits.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::engine::process::PROCESS_REGISTRY;

/// Global flag set by the Ctrl+C handler.
static SHUTDOWN_REQUESTED: AtomicBool = AtomicBool::new(false);

/// How many times Ctrl+C was pressed.
static INTERRUPT_COUNT: AtomicUsize = AtomicUsize::new(0);

/// Interrupts before force-quitting.
const MAX_INTERRUPTS: usize = 3;

/// Register the Ctrl+C handler. Call once at startup.
pub fn register_handler() -> Result<(), String> {
    ctrlc::set_handler(move || {
        let count = INTERRUPT_COUNT.fetch_add(1, Ordering::SeqCst) + 1;

        if count >= MAX_INTERRUPTS {
            eprintln!("\nForce quit (received {} interrupts)", count);
            std::process::exit(130);
        }

        if count == 1 {
            eprintln!("\nInterrupt received. Abandoning the current run...");
            SHUTDOWN_REQUESTED.store(true, Ordering::SeqCst);
            PROCESS_REGISTRY.kill_all();
        }
        eprintln!("(Press Ctrl+C {} more time(s) to force quit)", MAX_INTERRUPTS - count);
    })
    .map_err(|e| format!("failed to register Ctrl+C handler: {}", e))
}

/// Whether Ctrl+C was pressed or `request()` was called.
pub fn requested() -> bool {
    SHUTDOWN_REQUESTED.load(Ordering::SeqCst)
}

/// Programmatically request shutdown.
pub fn request() {
    SHUTDOWN_REQUESTED.store(true, Ordering::SeqCst);
}

/// Clear the global flag and interrupt counter.
pub fn reset() {
    SHUTDOWN_REQUESTED.store(false, Ordering::SeqCst);
    INTERRUPT_COUNT.store(0, Ordering::SeqCst);
}

/// A cloneable abort handle passed into pipelines and engines.
#[derive(Clone, Debug, Default)]
pub struct ShutdownSignal {
    flag: Arc<AtomicBool>,
    follows_global: bool,
}

impl ShutdownSignal {
    /// A signal that only fires when `trigger()` is called.
    pub fn new() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            follows_global: false,
        }
    }

    /// A signal that also fires when the global Ctrl+C flag is set.
    pub fn global() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            follows_global: true,
        }
    }

    /// Whether an abort has been requested.
    pub fn is_shutdown(&self) -> bool {
        self.flag.load(Ordering::SeqCst) || (self.follows_global && requested())
    }

    /// Request an abort through this signal and all its clones.
    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }
}
