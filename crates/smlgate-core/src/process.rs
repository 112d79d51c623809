//! Subprocess-backed execution engine.
//!
//! Delegates artifact execution to an external runtime command. The loaded
//! module list is handed to the runtime on every invocation (in manifest
//! order) via repeated `--load` flags, followed by the artifact path. The
//! script's page output is whatever the runtime writes to stdout.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::engine::{Engine, ExecStatus, Execution};
use crate::error::{Error, Result};

/// Default runtime command looked up on `PATH`.
pub const DEFAULT_RUNTIME: &str = "smlrun";

/// Exit code by which the runtime signals a benign interrupt.
const INTERRUPT_EXIT: i32 = 130;

/// Engine that runs artifacts in a child process of the runtime command.
///
/// Each execution is its own process, so concurrent executions are
/// isolated from one another; no interior locking is needed beyond what
/// the reload path already provides.
#[derive(Debug)]
pub struct ProcessEngine {
    runtime: PathBuf,
    modules: Vec<String>,
}

impl ProcessEngine {
    pub fn new(runtime: impl Into<PathBuf>) -> Self {
        Self {
            runtime: runtime.into(),
            modules: Vec::new(),
        }
    }

    /// Modules currently loaded, in manifest order.
    pub fn modules(&self) -> &[String] {
        &self.modules
    }
}

impl Default for ProcessEngine {
    fn default() -> Self {
        Self::new(DEFAULT_RUNTIME)
    }
}

impl Engine for ProcessEngine {
    fn clear(&mut self) {
        self.modules.clear();
    }

    fn load_module(&mut self, module: &str) -> Result<()> {
        self.modules.push(module.to_string());
        Ok(())
    }

    fn execute(&self, artifact: &Path) -> Result<Execution> {
        let mut command = Command::new(&self.runtime);
        for module in &self.modules {
            command.arg("--load").arg(module);
        }
        let output = command
            .arg(artifact)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                Error::Engine(format!(
                    "failed to spawn runtime '{}': {}",
                    self.runtime.display(),
                    e
                ))
            })?;

        let status = match output.status.code() {
            Some(0) => ExecStatus::Completed,
            Some(INTERRUPT_EXIT) => ExecStatus::Interrupted,
            Some(code) => ExecStatus::Uncaught(format!(
                "runtime exited with code {}: {}",
                code,
                String::from_utf8_lossy(&output.stderr).trim()
            )),
            None => ExecStatus::Uncaught("runtime terminated by signal".to_string()),
        };

        Ok(Execution {
            status,
            output: output.stdout,
        })
    }
}
