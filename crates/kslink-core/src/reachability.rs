//! Reachability analysis (tree shaking)
//!
//! Starting from the references an entry script makes, the engine walks the
//! implicit call graph round by round:
//!
//! 1. every `(library, function)` pair of the current frontier is looked up,
//!    loading the library on first use;
//! 2. a function seen for the first time is marked visited and its body is
//!    scanned against the owning library's imports (itself included);
//! 3. the contributions of all newly visited functions form the next
//!    frontier.
//!
//! A function can only be visited once, so the walk ends after at most as
//! many visits as there are functions in the reachable libraries, cycles
//! included.

use std::fmt;
use std::path::PathBuf;

use indexmap::IndexSet;
use tracing::{debug, trace};

use crate::error::Result;
use crate::registry::LibraryRegistry;
use crate::scanner::{DependencySet, Scanner};

/// Where a qualified call was written
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallSite {
    /// The entry script being linked
    Script,
    /// A function of a loaded library
    Function {
        library: String,
        function: String,
        path: PathBuf,
    },
}

impl fmt::Display for CallSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallSite::Script => write!(f, "entry script"),
            CallSite::Function {
                library,
                function,
                path,
            } => write!(f, "{}:{} ({})", library, function, path.display()),
        }
    }
}

/// A qualified call to a library the calling file never imports
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnimportedCall {
    pub site: CallSite,
    pub target_library: String,
    pub target: String,
}

impl UnimportedCall {
    /// Calls in `text` to libraries outside `imports`
    pub fn scan(
        scanner: &Scanner,
        imports: &IndexSet<String>,
        site: &CallSite,
        text: &str,
    ) -> Vec<UnimportedCall> {
        scanner
            .foreign_references(imports, text)
            .into_iter()
            .map(|(target_library, target)| UnimportedCall {
                site: site.clone(),
                target_library,
                target,
            })
            .collect()
    }
}

/// Summary of one traversal
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reachability {
    /// Number of frontier rounds processed
    pub rounds: usize,
    /// Functions newly marked visited by this traversal
    pub visited: usize,
    /// Calls that were not followed because their library is not imported
    pub unimported: Vec<UnimportedCall>,
}

/// Mark every function reachable from `frontier` as visited
pub fn resolve(
    registry: &mut LibraryRegistry<'_>,
    scanner: &Scanner,
    mut frontier: DependencySet,
) -> Result<Reachability> {
    let mut report = Reachability::default();

    while !frontier.is_empty() {
        report.rounds += 1;
        debug!(
            "Reachability round {}: {} references",
            report.rounds,
            frontier.len()
        );

        let mut next = DependencySet::new();
        for (library_name, functions) in frontier {
            let library = registry.ensure(&library_name)?;
            let imports = library.imports.clone();
            let path = library.path.clone();

            for function in functions {
                let Some(def) = library.visit(&function)? else {
                    continue;
                };
                trace!("Visited {}:{}", library_name, function);
                report.visited += 1;

                next.merge(scanner.references(&imports, &def.body));
                let site = CallSite::Function {
                    library: library_name.clone(),
                    function: def.name.clone(),
                    path: path.clone(),
                };
                report
                    .unimported
                    .extend(UnimportedCall::scan(scanner, &imports, &site, &def.body));
            }
        }
        frontier = next;
    }

    debug!(
        "Reachability finished after {} rounds, {} functions visited",
        report.rounds, report.visited
    );
    Ok(report)
}
