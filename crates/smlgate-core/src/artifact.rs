//! Mapping from source-script paths to compiled-artifact paths.
//!
//! A hierarchical source path is flattened into a single file name in the
//! project's `PM/` directory: `/a/b.sml` for project `demo` becomes
//! `PM/demo-a+b%sml.uo`. The escaping keeps distinct real paths distinct
//! while producing names safe for a flat directory.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::paths::PM_DIR;

/// Maximum byte length of a full artifact path.
///
/// Explicit bound on the escaped name; mapping fails closed with
/// [`Error::ArtifactPathTooLong`] instead of truncating.
pub const MAX_ARTIFACT_PATH: usize = 255;

/// Suffix of compiled artifacts.
pub const ARTIFACT_EXT: &str = ".uo";

/// Source extension that selects the extended-typing artifact variant.
pub const SOURCE_EXT: &str = ".sml";

/// Marker spliced into the name when extended typing routes a `.sml`
/// source to its differently-compiled variant.
const GEN_TAG: &str = "%gen";

/// Compute the compiled-artifact path for a source file.
///
/// `source` must be an absolute path under `root`. The remainder after the
/// root prefix (one leading separator skipped) is escaped character by
/// character: `/` becomes `+`, `.` becomes `%`, everything else passes
/// through. With `extended_typing` set, a trailing `.sml` extension gets the
/// `%gen` marker in front of its escaped dot, so `a.sml` maps to
/// `<project>-a%gen%sml.uo`.
///
/// Pure string work: no I/O, and the returned path is not checked for
/// existence (that is the engine's concern).
pub fn artifact_path(
    root: &Path,
    source: &Path,
    project_id: &str,
    extended_typing: bool,
) -> Result<PathBuf> {
    let root_str = root
        .to_str()
        .ok_or_else(|| Error::NonUtf8Path(root.to_path_buf()))?;
    let source_str = source
        .to_str()
        .ok_or_else(|| Error::NonUtf8Path(source.to_path_buf()))?;

    let rest = source_str
        .strip_prefix(root_str)
        .ok_or_else(|| Error::PathOutsideRoot {
            root: root.to_path_buf(),
            path: source.to_path_buf(),
        })?;
    let rest = rest.strip_prefix('/').unwrap_or(rest);

    let mut name = format!(
        "{}/{}/{}-",
        root_str.trim_end_matches('/'),
        PM_DIR,
        project_id
    );
    for (i, ch) in rest.char_indices() {
        match ch {
            '/' => name.push('+'),
            '.' => {
                if extended_typing && &rest[i..] == SOURCE_EXT {
                    name.push_str(GEN_TAG);
                }
                name.push('%');
            }
            _ => name.push(ch),
        }
    }
    name.push_str(ARTIFACT_EXT);

    if name.len() > MAX_ARTIFACT_PATH {
        return Err(Error::ArtifactPathTooLong {
            len: name.len(),
            max: MAX_ARTIFACT_PATH,
        });
    }
    Ok(PathBuf::from(name))
}
