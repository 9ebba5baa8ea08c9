//! Execution context for query operators.
//!
//! The context bundles the per-query resources an operator needs while
//! computing a result: the tracked allocator, the cancellation token, and a
//! printer for rendering ids in descriptors. It is cheap to clone and is
//! handed to operators at construction time.

use crate::result::Vocabulary;
use trellis_db_core::{CancelToken, MemoryTracker};

/// Per-query resources shared by all operators of a plan.
#[derive(Clone, Default)]
pub struct ExecutionContext {
    /// Tracked allocator enforcing the global memory limit.
    pub alloc: MemoryTracker,
    /// Cooperative cancellation flag, polled in hot loops.
    pub cancel: CancelToken,
    /// Printer used for descriptor strings (falls back to `#<bits>`).
    pub printer: Vocabulary,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enforce a global memory limit in bytes.
    pub fn with_memory_limit(mut self, bytes: u64) -> Self {
        self.alloc = MemoryTracker::with_limit(bytes);
        self
    }

    /// Use an externally controlled cancellation token (e.g. wired to a
    /// deadline timer).
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Attach a printer for rendering ids in operator descriptors.
    pub fn with_printer(mut self, printer: Vocabulary) -> Self {
        self.printer = printer;
        self
    }
}
