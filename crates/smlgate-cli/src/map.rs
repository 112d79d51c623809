//! Map command implementation: the name mapper as a CLI utility.

use std::path::Path;

use smlgate_core::{ProjectLayout, artifact_path};

/// Print the compiled-artifact path for a request path.
pub fn execute(
    request_path: &str,
    root: &Path,
    project: &str,
    extended_typing: bool,
) -> anyhow::Result<()> {
    let layout = ProjectLayout::new(root, project);
    let source = layout.resolve(request_path).ok_or_else(|| {
        anyhow::anyhow!("request path {request_path} escapes the document root")
    })?;

    let artifact = artifact_path(
        layout.document_root(),
        &source,
        layout.project_id(),
        extended_typing,
    )?;
    println!("{}", artifact.display());

    Ok(())
}
