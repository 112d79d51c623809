//! Check command implementation: deployment readiness.

use std::path::Path;

use smlgate_core::{Manifest, ProjectLayout};
use smlgate_server::ServerFileConfig;

use crate::colors;

/// Report whether the project can serve scripts right now: marker
/// present, manifest readable. Fails with a nonzero exit when not.
pub fn execute(config_path: &Path) -> anyhow::Result<()> {
    let file = ServerFileConfig::load(config_path)?;
    let layout = ProjectLayout::new(&file.gateway.document_root, &file.gateway.project_id);

    println!(
        "\n{}smlgate check{} - {}",
        colors::BOLD,
        colors::RESET,
        file.gateway.project_id
    );
    println!("{}", "─".repeat(50));

    let marker_ok = layout.marker_path().is_file();
    status_line("freshness marker", &layout.marker_path(), marker_ok, None);

    let manifest = Manifest::read(&layout.manifest_path());
    let manifest_note = manifest
        .as_ref()
        .ok()
        .map(|m| format!("{} modules", m.len()));
    status_line(
        "manifest",
        &layout.manifest_path(),
        manifest.is_ok(),
        manifest_note.as_deref(),
    );

    if !file.jobs.is_empty() {
        println!("  scheduled jobs: {}", file.jobs.len());
    }
    println!("{}", "─".repeat(50));

    if !marker_ok || manifest.is_err() {
        anyhow::bail!("deployment is not ready to serve");
    }

    println!("{}ready to serve{}", colors::GREEN, colors::RESET);
    Ok(())
}

fn status_line(what: &str, path: &Path, ok: bool, note: Option<&str>) {
    let (mark, color) = if ok {
        ("✓", colors::GREEN)
    } else {
        ("✗", colors::RED)
    };
    match note {
        Some(note) => println!("{color}  {mark}{} {what}: {} ({note})", colors::RESET, path.display()),
        None => println!("{color}  {mark}{} {what}: {}", colors::RESET, path.display()),
    }
}
