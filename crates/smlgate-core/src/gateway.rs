//! The unified request pipeline.
//!
//! Inbound requests, the trap entry point and scheduled jobs all funnel
//! through [`ScriptGateway::run`]: resolve the source, make the engine
//! fresh, map the source to its compiled artifact, execute, classify.

use std::path::Path;

use crate::artifact::artifact_path;
use crate::engine::{Engine, ExecStatus, Execution};
use crate::error::{Error, Result};
use crate::paths::ProjectLayout;
use crate::reload::ReloadManager;

/// Why the service refused to run any script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotReadyReason {
    /// The freshness marker is absent or unreadable.
    MissingMarker,
    /// The module manifest could not be opened.
    MissingManifest,
}

/// What a pipeline run produced, as seen by the dispatcher.
///
/// Engine-level script failures never surface here: by policy they are
/// logged and the run still completes (see [`settle`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The artifact ran; `0` holds whatever output the engine produced.
    Completed(Vec<u8>),
    /// The requested source does not exist under the document root.
    SourceNotFound,
    /// Bad deployment state; nothing was executed.
    NotReady(NotReadyReason),
}

impl Outcome {
    /// Stable label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Completed(_) => "completed",
            Outcome::SourceNotFound => "source_not_found",
            Outcome::NotReady(_) => "not_ready",
        }
    }
}

/// The request-serving core: one instance per server process, shared by
/// every request thread and the scheduler.
pub struct ScriptGateway<E: Engine> {
    layout: ProjectLayout,
    reload: ReloadManager<E>,
    extended_typing: bool,
}

impl<E: Engine> ScriptGateway<E> {
    pub fn new(layout: ProjectLayout, engine: E, extended_typing: bool) -> Self {
        let reload = ReloadManager::new(engine, &layout);
        Self {
            layout,
            reload,
            extended_typing,
        }
    }

    pub fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    /// Run the script named by a request path.
    ///
    /// `Err` is reserved for internal failures (poisoned lock, runtime
    /// spawn failure, manifest read error past open); every outcome with a
    /// defined response, including the not-ready degradations, comes back
    /// as `Ok`.
    pub fn run(&self, request_path: &str) -> Result<Outcome> {
        // A missing source is distinguished from a stale or broken engine:
        // no reload is attempted for it.
        let Some(source) = self.layout.resolve(request_path) else {
            return Ok(Outcome::SourceNotFound);
        };
        if !source.is_file() {
            return Ok(Outcome::SourceNotFound);
        }

        let slot = match self.reload.ensure_fresh() {
            Ok(slot) => slot,
            Err(Error::MissingMarker(path)) => {
                tracing::error!(
                    marker = %path.display(),
                    "freshness marker not readable - web service not working"
                );
                return Ok(Outcome::NotReady(NotReadyReason::MissingMarker));
            }
            Err(Error::MissingManifest(path)) => {
                tracing::error!(
                    manifest = %path.display(),
                    "failed to open manifest for reading"
                );
                return Ok(Outcome::NotReady(NotReadyReason::MissingManifest));
            }
            Err(other) => return Err(other),
        };

        let artifact = match artifact_path(
            self.layout.document_root(),
            &source,
            self.layout.project_id(),
            self.extended_typing,
        ) {
            Ok(artifact) => artifact,
            Err(e) => {
                // Only reachable for overlong or non-UTF-8 names; resolve()
                // already confined the source to the document root.
                tracing::warn!(source = %source.display(), error = %e, "artifact mapping failed");
                return Ok(Outcome::SourceNotFound);
            }
        };

        let execution = slot.engine().execute(&artifact)?;
        Ok(settle(execution, &source))
    }
}

/// Decision table for engine results.
///
/// | engine status | logged           | caller sees            |
/// |---------------|------------------|------------------------|
/// | `Completed`   | —                | `Completed(output)`    |
/// | `Interrupted` | debug            | `Completed(output)`    |
/// | `Uncaught`    | warn with source | `Completed(output)`    |
///
/// Script failures degrade to success on purpose: the output the engine
/// managed to produce (possibly none) is served rather than an error page.
pub fn settle(execution: Execution, source: &Path) -> Outcome {
    match execution.status {
        ExecStatus::Completed => {}
        ExecStatus::Interrupted => {
            tracing::debug!(source = %source.display(), "script ended by interrupt");
        }
        ExecStatus::Uncaught(message) => {
            tracing::warn!("{} raised {}", source.display(), message);
        }
    }
    Outcome::Completed(execution.output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settle_swallows_uncaught_failures() {
        let execution = Execution {
            status: ExecStatus::Uncaught("Div".to_string()),
            output: b"partial".to_vec(),
        };
        let outcome = settle(execution, Path::new("/srv/www/a.sml"));
        assert_eq!(outcome, Outcome::Completed(b"partial".to_vec()));
    }

    #[test]
    fn settle_treats_interrupt_as_benign() {
        let execution = Execution {
            status: ExecStatus::Interrupted,
            output: Vec::new(),
        };
        let outcome = settle(execution, Path::new("/srv/www/a.sml"));
        assert_eq!(outcome, Outcome::Completed(Vec::new()));
    }

    #[test]
    fn labels_are_stable() {
        assert_eq!(Outcome::Completed(Vec::new()).label(), "completed");
        assert_eq!(Outcome::SourceNotFound.label(), "source_not_found");
        assert_eq!(
            Outcome::NotReady(NotReadyReason::MissingMarker).label(),
            "not_ready"
        );
    }
}
