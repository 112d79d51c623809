//! Core pipeline for the smlgate script-execution gateway.
//!
//! This crate provides:
//! - Project layout and request-path resolution
//! - The source-to-artifact name mapping
//! - Manifest reading and the marker-driven live-reload protocol
//! - The execution-engine interface and a subprocess-backed engine
//! - The unified gateway pipeline shared by requests, traps and jobs

pub mod artifact;
pub mod config;
pub mod engine;
pub mod error;
pub mod gateway;
pub mod manifest;
pub mod paths;
pub mod process;
pub mod reload;
pub mod testing;

pub use artifact::{MAX_ARTIFACT_PATH, artifact_path};
pub use config::{DEFAULT_TRAP_SCRIPT, GatewayConfig};
pub use engine::{Engine, ExecStatus, Execution};
pub use error::{Error, Result};
pub use gateway::{NotReadyReason, Outcome, ScriptGateway};
pub use manifest::Manifest;
pub use paths::ProjectLayout;
pub use process::ProcessEngine;
pub use reload::{EngineGuard, EngineSlot, ReloadManager};
