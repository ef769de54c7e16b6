//! Textual conventions of the scripting language being linked
//!
//! The defaults describe kOS KerboScript: libraries live in `lib/<name>.ks`,
//! are pulled in with `runoncepath("/lib/<name>").` and declare themselves
//! with `global <name>Lib`. A project can override any of them from a TOML
//! file:
//!
//! ```toml
//! [conventions]
//! library_dir = "lib"
//! separator = "_"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{LinkError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Conventions {
    /// Name of the directory holding library files
    pub library_dir: String,
    /// Script file extension, without the dot
    pub extension: String,
    /// Keyword of the import directive, e.g. `runoncepath`
    pub import_keyword: String,
    /// Global laziness directive, e.g. `@LAZYGLOBAL`
    pub lazy_directive: String,
    /// Suffix every library's declared name carries
    pub library_suffix: String,
    /// Line comment marker
    pub comment_marker: String,
    /// Indentation (in whitespace characters) of top-level library functions
    pub indent: usize,
    /// Joins library and function name into a flat identifier
    pub separator: String,
}

impl Default for Conventions {
    fn default() -> Self {
        Self {
            library_dir: "lib".to_string(),
            extension: "ks".to_string(),
            import_keyword: "runoncepath".to_string(),
            lazy_directive: "@LAZYGLOBAL".to_string(),
            library_suffix: "Lib".to_string(),
            comment_marker: "//".to_string(),
            indent: 4,
            separator: "_".to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    conventions: Conventions,
}

impl Conventions {
    /// Load conventions from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse conventions from TOML text; missing keys keep their defaults
    pub fn parse(content: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(content)?;
        file.conventions.validate()?;
        Ok(file.conventions)
    }

    pub fn validate(&self) -> Result<()> {
        let required = [
            ("library_dir", &self.library_dir),
            ("extension", &self.extension),
            ("import_keyword", &self.import_keyword),
            ("lazy_directive", &self.lazy_directive),
            ("library_suffix", &self.library_suffix),
            ("comment_marker", &self.comment_marker),
        ];
        for (key, value) in required {
            if value.is_empty() {
                return Err(LinkError::InvalidConfig(format!("'{}' must not be empty", key)));
            }
        }

        if self.separator.is_empty() {
            return Err(LinkError::InvalidConfig(
                "'separator' must not be empty".to_string(),
            ));
        }
        // Flat names must stay identifiers, and library and function names
        // are alphanumeric, so only underscores keep every pair distinct.
        if self.separator.chars().any(|c| c != '_') {
            return Err(LinkError::InvalidConfig(format!(
                "separator '{}' may only contain underscores",
                self.separator
            )));
        }

        Ok(())
    }

    /// `lib:func`, the form scripts use to call a library function
    pub fn qualified(&self, library: &str, function: &str) -> String {
        format!("{}:{}", library, function)
    }

    /// The collision-free name a function is emitted under
    pub fn flat(&self, library: &str, function: &str) -> String {
        format!("{}{}{}", library, self.separator, function)
    }

    /// Location of a library's source file under the library root
    pub fn library_path(&self, root: &Path, library: &str) -> PathBuf {
        root.join(format!("{}.{}", library, self.extension))
    }
}
