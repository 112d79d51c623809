//! Integration tests for the full gateway pipeline.
//!
//! Exercises resolve → reload → name mapping → execute against a real
//! on-disk project layout, with a recording engine standing in for the
//! runtime.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use smlgate_core::testing::RecordingEngine;
use smlgate_core::{ExecStatus, Execution, NotReadyReason, Outcome, ProjectLayout, ScriptGateway};

use tempfile::TempDir;

/// A throwaway document root with its `PM/` directory.
struct TestProject {
    dir: TempDir,
    layout: ProjectLayout,
    engine: Arc<RecordingEngine>,
}

impl TestProject {
    fn new() -> Self {
        let dir = TempDir::new().expect("create temp dir");
        let layout = ProjectLayout::new(dir.path(), "demo");
        fs::create_dir_all(layout.pm_dir()).expect("create PM dir");
        Self {
            dir,
            layout,
            engine: Arc::new(RecordingEngine::new()),
        }
    }

    fn write_source(&self, name: &str, body: &str) {
        fs::write(self.dir.path().join(name), body).expect("write source");
    }

    fn write_manifest(&self, contents: &str) {
        fs::write(self.layout.manifest_path(), contents).expect("write manifest");
    }

    fn touch_marker(&self) {
        fs::write(self.layout.marker_path(), "").expect("write marker");
    }

    fn gateway(&self, extended_typing: bool) -> ScriptGateway<Arc<RecordingEngine>> {
        ScriptGateway::new(self.layout.clone(), self.engine.clone(), extended_typing)
    }

    fn pm_path(&self, name: &str) -> PathBuf {
        self.layout.pm_dir().join(name)
    }
}

#[test]
fn serves_a_script_end_to_end() {
    let project = TestProject::new();
    project.write_source("a.sml", "val _ = print \"hi\"");
    project.write_manifest("foo\n");
    project.touch_marker();

    let gateway = project.gateway(false);
    project.engine.push_result(Execution::completed(b"hi".to_vec()));

    let outcome = gateway.run("/a.sml").expect("pipeline run");
    assert_eq!(outcome, Outcome::Completed(b"hi".to_vec()));

    // The manifest was loaded before the artifact ran, and the artifact
    // name is the escaped flat form.
    assert_eq!(project.engine.modules(), ["foo"]);
    assert_eq!(project.engine.executed(), [project.pm_path("demo-a%sml.uo")]);
}

#[test]
fn missing_marker_degrades_to_not_ready() {
    let project = TestProject::new();
    project.write_source("a.sml", "");
    project.write_manifest("foo\n");

    let gateway = project.gateway(false);
    let outcome = gateway.run("/a.sml").expect("pipeline run");
    assert_eq!(outcome, Outcome::NotReady(NotReadyReason::MissingMarker));
    assert!(project.engine.executed().is_empty());
}

#[test]
fn missing_manifest_degrades_to_not_ready() {
    let project = TestProject::new();
    project.write_source("a.sml", "");
    project.touch_marker();

    let gateway = project.gateway(false);
    let outcome = gateway.run("/a.sml").expect("pipeline run");
    assert_eq!(outcome, Outcome::NotReady(NotReadyReason::MissingManifest));
    assert!(project.engine.executed().is_empty());
}

#[test]
fn missing_source_skips_the_reload_path() {
    let project = TestProject::new();
    project.write_manifest("foo\n");
    project.touch_marker();

    let gateway = project.gateway(false);
    let outcome = gateway.run("/absent.sml").expect("pipeline run");
    assert_eq!(outcome, Outcome::SourceNotFound);
    // No reload was attempted for a bad URL.
    assert_eq!(project.engine.clears(), 0);
}

#[test]
fn traversal_paths_are_not_found() {
    let project = TestProject::new();
    project.write_manifest("foo\n");
    project.touch_marker();

    let gateway = project.gateway(false);
    let outcome = gateway.run("/../outside.sml").expect("pipeline run");
    assert_eq!(outcome, Outcome::SourceNotFound);
}

#[test]
fn uncaught_script_failure_still_completes() {
    let project = TestProject::new();
    project.write_source("boom.sml", "");
    project.write_manifest("foo\n");
    project.touch_marker();

    let gateway = project.gateway(false);
    project.engine.push_result(Execution {
        status: ExecStatus::Uncaught("Overflow".to_string()),
        output: b"partial page".to_vec(),
    });

    let outcome = gateway.run("/boom.sml").expect("pipeline run");
    assert_eq!(outcome, Outcome::Completed(b"partial page".to_vec()));
}

#[test]
fn extended_typing_routes_to_gen_artifact() {
    let project = TestProject::new();
    project.write_source("a.sml", "");
    project.write_manifest("foo\n");
    project.touch_marker();

    let gateway = project.gateway(true);
    gateway.run("/a.sml").expect("pipeline run");
    assert_eq!(
        project.engine.executed(),
        [project.pm_path("demo-a%gen%sml.uo")]
    );
}

#[test]
fn repeated_runs_reload_at_most_once() {
    let project = TestProject::new();
    project.write_source("a.sml", "");
    project.write_manifest("foo\n");
    project.touch_marker();

    let gateway = project.gateway(false);
    gateway.run("/a.sml").expect("first run");
    gateway.run("/a.sml").expect("second run");

    assert_eq!(project.engine.clears(), 1);
    assert_eq!(project.engine.loads(), 1);
    assert_eq!(project.engine.executed().len(), 2);
}
