//! Execution engine interface.
//!
//! The engine that actually runs compiled artifacts is a black box to the
//! gateway; this module pins down the contract it must satisfy. The
//! in-tree implementation is [`ProcessEngine`](crate::process::ProcessEngine);
//! tests use [`RecordingEngine`](crate::testing::RecordingEngine).

use std::path::Path;

use crate::error::Result;

/// How a single artifact execution ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecStatus {
    /// The script ran to completion.
    Completed,
    /// The script ended through a non-local control transfer. Benign:
    /// logged at most, never reported to the caller as a failure.
    Interrupted,
    /// The script raised an uncaught failure; the diagnostic message is
    /// logged with the offending source path and then discarded.
    Uncaught(String),
}

/// Result of running one artifact: the tri-state status plus whatever
/// output the engine produced before it ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution {
    pub status: ExecStatus,
    pub output: Vec<u8>,
}

impl Execution {
    /// A completed execution with the given output.
    pub fn completed(output: impl Into<Vec<u8>>) -> Self {
        Self {
            status: ExecStatus::Completed,
            output: output.into(),
        }
    }
}

/// The shared execution engine.
///
/// One engine instance serves every request thread and the scheduler.
/// `clear` and `load_module` are only ever called inside the reload
/// critical section (a write lock), so they take `&mut self`; `execute`
/// runs concurrently under a shared lock, so implementations must guard
/// any per-execution state (call-stack pool, allocator free list) with
/// their own interior synchronization.
pub trait Engine: Send + Sync {
    /// Discard all loaded modules and any cached compiled code.
    fn clear(&mut self);

    /// Load one compiled module. Called in manifest order; the engine
    /// resolves inter-module references once the final module is loaded.
    fn load_module(&mut self, module: &str) -> Result<()>;

    /// Run one compiled artifact.
    fn execute(&self, artifact: &Path) -> Result<Execution>;
}

impl Engine for Box<dyn Engine> {
    fn clear(&mut self) {
        (**self).clear();
    }

    fn load_module(&mut self, module: &str) -> Result<()> {
        (**self).load_module(module)
    }

    fn execute(&self, artifact: &Path) -> Result<Execution> {
        (**self).execute(artifact)
    }
}
