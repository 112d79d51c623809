//! Project directory layout.
//!
//! All compiled state for a project lives in a flat `PM/` directory under
//! the document root, namespaced by project id so several projects can
//! share one root:
//!
//! ```text
//! <document root>/
//! ├── a.sml                    # source scripts, served by URL
//! └── PM/
//!     ├── <project>.ul         # manifest: one compiled module per line
//!     ├── <project>.timestamp  # freshness marker (mtime is the version)
//!     └── <project>-a%sml.uo   # compiled artifacts, escaped flat names
//! ```

use std::path::{Component, Path, PathBuf};

/// Subdirectory of the document root holding manifest, marker and artifacts.
pub const PM_DIR: &str = "PM";

/// File suffix of the module manifest.
pub const MANIFEST_EXT: &str = "ul";

/// File suffix of the freshness marker.
pub const MARKER_EXT: &str = "timestamp";

/// Document root and project identity, from which all on-disk paths derive.
#[derive(Debug, Clone)]
pub struct ProjectLayout {
    document_root: PathBuf,
    project_id: String,
}

impl ProjectLayout {
    /// Create a layout for a project under the given document root.
    pub fn new(document_root: impl Into<PathBuf>, project_id: impl Into<String>) -> Self {
        Self {
            document_root: document_root.into(),
            project_id: project_id.into(),
        }
    }

    pub fn document_root(&self) -> &Path {
        &self.document_root
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// The `PM/` directory holding manifest, marker and artifacts.
    pub fn pm_dir(&self) -> PathBuf {
        self.document_root.join(PM_DIR)
    }

    /// Path of the module manifest, `PM/<project>.ul`.
    pub fn manifest_path(&self) -> PathBuf {
        self.pm_dir()
            .join(format!("{}.{}", self.project_id, MANIFEST_EXT))
    }

    /// Path of the freshness marker, `PM/<project>.timestamp`.
    pub fn marker_path(&self) -> PathBuf {
        self.pm_dir()
            .join(format!("{}.{}", self.project_id, MARKER_EXT))
    }

    /// Resolve a request path to a file under the document root.
    ///
    /// Returns `None` for paths that would escape the root: anything
    /// containing a `..`, root or prefix component is rejected outright
    /// rather than normalized.
    pub fn resolve(&self, request_path: &str) -> Option<PathBuf> {
        let relative = Path::new(request_path.trim_start_matches('/'));
        for component in relative.components() {
            match component {
                Component::Normal(_) | Component::CurDir => {}
                _ => return None,
            }
        }
        Some(self.document_root.join(relative))
    }
}
