//! Server configuration file.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use smlgate_core::GatewayConfig;

use crate::error::ServerResult;
use crate::scheduler::Job;

/// Everything the server reads from one JSON config file: the gateway
/// settings plus the registered scheduled jobs.
///
/// ```json
/// {
///   "project_id": "demo",
///   "document_root": "/srv/www",
///   "jobs": [
///     {"path": "/sys/cleanup.sml", "cadence": {"kind": "daily", "hour": 3, "minute": 0}}
///   ]
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ServerFileConfig {
    #[serde(flatten)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub jobs: Vec<Job>,
}

impl ServerFileConfig {
    /// Load the combined configuration from a JSON file.
    pub fn load(path: &Path) -> ServerResult<Self> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}
