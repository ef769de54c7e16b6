//! Entry point tying scanning, reachability and flattening together

use std::path::Path;

use tracing::{debug, info};

use crate::config::Conventions;
use crate::discovery::find_library_root;
use crate::error::{LinkError, Result};
use crate::flatten::Flattener;
use crate::reachability::{self, CallSite, UnimportedCall};
use crate::registry::LibraryRegistry;
use crate::scanner::Scanner;

/// Counters describing one link run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkStats {
    pub libraries: usize,
    /// Functions defined in the loaded libraries
    pub available: usize,
    /// Functions emitted into the output
    pub kept: usize,
    pub rounds: usize,
}

impl LinkStats {
    pub fn dropped(&self) -> usize {
        self.available - self.kept
    }
}

#[derive(Debug, Clone)]
pub struct LinkOutput {
    pub text: String,
    pub stats: LinkStats,
    pub unimported: Vec<UnimportedCall>,
}

#[derive(Debug, Clone)]
pub struct Linker {
    conventions: Conventions,
    scanner: Scanner,
    flattener: Flattener,
}

impl Linker {
    pub fn new(conventions: Conventions) -> Result<Self> {
        conventions.validate()?;
        let scanner = Scanner::new(&conventions)?;
        let flattener = Flattener::new(&conventions)?;
        Ok(Self {
            conventions,
            scanner,
            flattener,
        })
    }

    /// Link the script at `entry` against the nearest library root
    pub fn link_file(&self, entry: &Path) -> Result<LinkOutput> {
        let start = entry.canonicalize().unwrap_or_else(|_| entry.to_path_buf());
        let root = find_library_root(&start, &self.conventions.library_dir).ok_or_else(|| {
            LinkError::LibraryRootNotFound {
                start: entry.to_path_buf(),
                library_dir: self.conventions.library_dir.clone(),
            }
        })?;
        debug!("Library root: {}", root.display());

        let script = std::fs::read_to_string(entry).map_err(|source| LinkError::ScriptNotFound {
            path: entry.to_path_buf(),
            source,
        })?;

        self.link_source(&script, &root)
    }

    /// Link `script` text against the libraries in `root`
    pub fn link_source(&self, script: &str, root: &Path) -> Result<LinkOutput> {
        let imports = self.scanner.imports(script);
        let frontier = self.scanner.references(&imports, script);
        let cleaned = self.scanner.strip_directives(script);
        debug!(
            "Entry script imports {:?} and references {} functions",
            imports,
            frontier.len()
        );

        let mut unimported =
            UnimportedCall::scan(&self.scanner, &imports, &CallSite::Script, script);

        let mut registry = LibraryRegistry::new(root, &self.conventions, &self.scanner);
        let reach = reachability::resolve(&mut registry, &self.scanner, frontier)?;
        unimported.extend(reach.unimported);
        let text = self.flattener.merge(&cleaned, &registry);

        let stats = LinkStats {
            libraries: registry.len(),
            available: registry.function_count(),
            kept: registry.visited_count(),
            rounds: reach.rounds,
        };
        info!(
            "Linked {} of {} functions from {} libraries",
            stats.kept, stats.available, stats.libraries
        );

        Ok(LinkOutput {
            text,
            stats,
            unimported,
        })
    }
}
