use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, LinkError>;

#[derive(Error, Debug)]
pub enum LinkError {
    #[error("No '{library_dir}' directory found above {}", start.display())]
    LibraryRootNotFound { start: PathBuf, library_dir: String },

    #[error("Cannot read script {}: {source}", path.display())]
    ScriptNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Library '{library}' not found at {}: {source}", path.display())]
    LibraryNotFound {
        library: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed library {}: {reason}", path.display())]
    MalformedLibrary { path: PathBuf, reason: String },

    #[error("Unresolved function '{function}' in library '{library}'")]
    UnresolvedFunction { library: String, function: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Configuration parse error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LinkError {
    pub fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        LinkError::MalformedLibrary {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn unresolved(library: impl Into<String>, function: impl Into<String>) -> Self {
        LinkError::UnresolvedFunction {
            library: library.into(),
            function: function.into(),
        }
    }
}
