//! Locating the library root for an entry script

use std::path::{Path, PathBuf};

use tracing::debug;

/// Walk upward from the directory containing `start` until an ancestor has a
/// `library_dir` subdirectory, and return that subdirectory
pub fn find_library_root(start: &Path, library_dir: &str) -> Option<PathBuf> {
    let dir = start.parent()?;
    dir.ancestors()
        .map(|ancestor| ancestor.join(library_dir))
        .find(|candidate| {
            debug!("Looking for library root at {}", candidate.display());
            candidate.is_dir()
        })
}
