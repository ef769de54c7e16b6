//! Namespace flattening and final merge
//!
//! The runtime has no namespaces, so every `lib:func` reference becomes the
//! flat identifier `lib_func` (with the configured separator) and each
//! visited function is emitted once as `local function lib_func <body>`
//! ahead of the entry script.

use std::collections::HashMap;

use regex::{Captures, Regex};

use crate::config::Conventions;
use crate::error::Result;
use crate::registry::LibraryRegistry;

#[derive(Debug, Clone)]
pub struct Flattener {
    conventions: Conventions,
    chain: Regex,
}

impl Flattener {
    pub fn new(conventions: &Conventions) -> Result<Self> {
        Ok(Self {
            conventions: conventions.clone(),
            chain: Regex::new(r"\b[A-Za-z][A-Za-z0-9]*(?::[A-Za-z0-9]+)+\b")?,
        })
    }

    /// Qualified name → flat name for every visited function
    pub fn renames(&self, registry: &LibraryRegistry<'_>) -> HashMap<String, String> {
        registry
            .libraries()
            .flat_map(|lib| {
                lib.visited().map(move |def| {
                    (
                        self.conventions.qualified(&lib.name, &def.name),
                        self.conventions.flat(&lib.name, &def.name),
                    )
                })
            })
            .collect()
    }

    /// Emit the visited functions followed by `script`, with every qualified
    /// reference flattened
    pub fn merge(&self, script: &str, registry: &LibraryRegistry<'_>) -> String {
        let mut elements: Vec<String> = registry
            .libraries()
            .flat_map(|lib| {
                lib.visited().map(move |def| {
                    format!(
                        "local function {} {}",
                        self.conventions.flat(&lib.name, &def.name),
                        def.body
                    )
                })
            })
            .collect();
        elements.push(script.to_string());

        self.rename(&elements.join("\n"), &self.renames(registry))
    }

    /// Replace each qualified reference found in `renames` with its flat name
    ///
    /// Whole `a:b:c` suffix chains are matched and each adjacent pair is
    /// looked up in the table, so the order of the table does not matter
    /// and a flattened text has nothing left to replace.
    pub fn rename(&self, text: &str, renames: &HashMap<String, String>) -> String {
        self.chain
            .replace_all(text, |caps: &Captures| {
                let segments: Vec<&str> = caps[0].split(':').collect();
                let mut out = String::new();
                let mut i = 0;
                while i < segments.len() {
                    if i > 0 {
                        out.push(':');
                    }
                    let flat = segments
                        .get(i + 1)
                        .and_then(|next| renames.get(&format!("{}:{}", segments[i], next)));
                    match flat {
                        Some(flat) => {
                            out.push_str(flat);
                            i += 2;
                        }
                        None => {
                            out.push_str(segments[i]);
                            i += 1;
                        }
                    }
                }
                out
            })
            .into_owned()
    }
}
