//! Test support: a recording fake engine.
//!
//! Used by the crate's own tests and by downstream crates (server routes,
//! scheduler) that need a gateway without a real runtime.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::engine::{Engine, Execution};
use crate::error::{Error, Result};

#[derive(Debug, Default)]
struct RecordingState {
    modules: Vec<String>,
    clears: usize,
    loads: usize,
    executed: Vec<PathBuf>,
    results: VecDeque<Result<Execution>>,
}

/// An engine that records every call and replays scripted results.
///
/// All state sits behind an interior mutex, so the engine can be shared as
/// `Arc<RecordingEngine>` with one handle inside the gateway and another
/// kept by the test for inspection.
#[derive(Debug, Default)]
pub struct RecordingEngine {
    state: Mutex<RecordingState>,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the result of the next `execute` call. With nothing queued,
    /// `execute` answers with an empty completed run.
    pub fn push_result(&self, execution: Execution) {
        self.lock().results.push_back(Ok(execution));
    }

    /// Queue an internal engine failure for the next `execute` call.
    pub fn push_failure(&self, error: Error) {
        self.lock().results.push_back(Err(error));
    }

    /// Modules currently loaded, in load order.
    pub fn modules(&self) -> Vec<String> {
        self.lock().modules.clone()
    }

    /// How many times the engine was cleared.
    pub fn clears(&self) -> usize {
        self.lock().clears
    }

    /// Total `load_module` calls across all reloads.
    pub fn loads(&self) -> usize {
        self.lock().loads
    }

    /// Artifacts executed, in order.
    pub fn executed(&self) -> Vec<PathBuf> {
        self.lock().executed.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RecordingState> {
        self.state.lock().expect("recording engine poisoned")
    }

    fn record_clear(&self) {
        let mut state = self.lock();
        state.modules.clear();
        state.clears += 1;
    }

    fn record_load(&self, module: &str) {
        let mut state = self.lock();
        state.modules.push(module.to_string());
        state.loads += 1;
    }

    fn record_execute(&self, artifact: &Path) -> Result<Execution> {
        let mut state = self.lock();
        state.executed.push(artifact.to_path_buf());
        state
            .results
            .pop_front()
            .unwrap_or_else(|| Ok(Execution::completed(Vec::new())))
    }
}

impl Engine for RecordingEngine {
    fn clear(&mut self) {
        self.record_clear();
    }

    fn load_module(&mut self, module: &str) -> Result<()> {
        self.record_load(module);
        Ok(())
    }

    fn execute(&self, artifact: &Path) -> Result<Execution> {
        self.record_execute(artifact)
    }
}

impl Engine for Arc<RecordingEngine> {
    fn clear(&mut self) {
        self.record_clear();
    }

    fn load_module(&mut self, module: &str) -> Result<()> {
        self.record_load(module);
        Ok(())
    }

    fn execute(&self, artifact: &Path) -> Result<Execution> {
        self.record_execute(artifact)
    }
}
