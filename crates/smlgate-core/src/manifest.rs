//! Module manifest reading.
//!
//! The manifest (`PM/<project>.ul`) is a newline-separated list of compiled
//! module identifiers, no other syntax. Order matters: later modules may
//! depend on definitions from earlier ones, so the list is preserved as
//! read. Duplicates are not rejected at this layer; they are simply loaded
//! again in order.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{Error, Result};

/// An ordered list of module identifiers to load into the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    modules: Vec<String>,
}

impl Manifest {
    /// Read a manifest file.
    ///
    /// A file that cannot be opened maps to [`Error::MissingManifest`];
    /// read errors past open propagate as [`Error::Io`]. Each line has a
    /// single trailing newline trimmed and is otherwise taken verbatim.
    pub fn read(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|_| Error::MissingManifest(path.to_path_buf()))?;
        let mut reader = BufReader::new(file);

        let mut modules = Vec::new();
        let mut line = String::new();
        loop {
            line.clear();
            if reader.read_line(&mut line)? == 0 {
                break;
            }
            let module = line.strip_suffix('\n').unwrap_or(&line);
            modules.push(module.to_string());
        }

        Ok(Self { modules })
    }

    /// Modules in file order.
    pub fn modules(&self) -> &[String] {
        &self.modules
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}
