//! Registry of parsed libraries for a single link run
//!
//! Libraries are parsed lazily, the first time anything references them, and
//! cached by name so a file is never read twice. The registry owns every
//! [`Library`] and [`FunctionDefinition`](crate::library::FunctionDefinition)
//! and is dropped when the run ends.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use indexmap::map::Entry;
use indexmap::IndexMap;
use tracing::debug;

use crate::config::Conventions;
use crate::error::{LinkError, Result};
use crate::library::Library;
use crate::scanner::Scanner;

#[derive(Debug)]
pub struct LibraryRegistry<'a> {
    root: PathBuf,
    conventions: &'a Conventions,
    scanner: &'a Scanner,
    /// Keyed by library name, in the order libraries were first loaded
    libraries: IndexMap<String, Library>,
}

impl<'a> LibraryRegistry<'a> {
    pub fn new(root: impl Into<PathBuf>, conventions: &'a Conventions, scanner: &'a Scanner) -> Self {
        Self {
            root: root.into(),
            conventions,
            scanner,
            libraries: IndexMap::new(),
        }
    }

    /// The library named `name`, parsing its file on first use
    pub fn ensure(&mut self, name: &str) -> Result<&mut Library> {
        match self.libraries.entry(name.to_string()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let path = self.conventions.library_path(&self.root, name);
                let library = load_library(name, &path, self.scanner)?;
                Ok(entry.insert(library))
            }
        }
    }

    /// Loaded libraries in discovery order
    pub fn libraries(&self) -> impl Iterator<Item = &Library> {
        self.libraries.values()
    }

    pub fn len(&self) -> usize {
        self.libraries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.libraries.is_empty()
    }

    /// Functions defined across all loaded libraries
    pub fn function_count(&self) -> usize {
        self.libraries.values().map(|lib| lib.functions.len()).sum()
    }

    pub fn visited_count(&self) -> usize {
        self.libraries.values().map(Library::visited_count).sum()
    }
}

fn load_library(name: &str, path: &Path, scanner: &Scanner) -> Result<Library> {
    debug!("Loading library {} from {}", name, path.display());

    let text = std::fs::read_to_string(path).map_err(|source| match source.kind() {
        ErrorKind::NotFound => LinkError::LibraryNotFound {
            library: name.to_string(),
            path: path.to_path_buf(),
            source,
        },
        _ => LinkError::malformed(path, format!("cannot be read: {}", source)),
    })?;

    Library::parse(name, path, &text, scanner)
}
