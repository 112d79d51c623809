//! Gateway configuration.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::process::DEFAULT_RUNTIME;

/// Trap script assumed when none is configured.
pub const DEFAULT_TRAP_SCRIPT: &str = "/sys/trap.sml";

/// Per-project gateway settings, loaded from a JSON file.
///
/// ```json
/// {
///   "project_id": "demo",
///   "document_root": "/srv/www",
///   "extended_typing": true,
///   "init_script": "/init.sml"
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Project identifier; namespaces manifest, marker and artifacts.
    pub project_id: String,
    /// Document root served by the host.
    pub document_root: PathBuf,
    /// Route `.sml` sources to their extended-typing artifact variants.
    #[serde(default)]
    pub extended_typing: bool,
    /// Runtime command the process engine delegates to.
    #[serde(default = "default_runtime")]
    pub runtime: PathBuf,
    /// Script run once at startup; failure is logged, not fatal.
    #[serde(default)]
    pub init_script: Option<String>,
    /// Script run as the global error handler.
    #[serde(default)]
    pub trap_script: Option<String>,
}

fn default_runtime() -> PathBuf {
    PathBuf::from(DEFAULT_RUNTIME)
}

impl GatewayConfig {
    /// Load the configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        serde_json::from_str(&contents)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// The configured trap script, or the documented default.
    pub fn trap_script(&self) -> &str {
        self.trap_script.as_deref().unwrap_or(DEFAULT_TRAP_SCRIPT)
    }
}
