//! Line-oriented pattern matching over script text
//!
//! The scanner recognizes exactly the lexical conventions the linker needs:
//! import directives, the laziness directive, qualified calls
//! (`lib:func(` or `lib:func@`), the library declaration and the
//! fixed-indentation function blocks of a library file. It never attempts to
//! understand anything else about the language.

use indexmap::{IndexMap, IndexSet};
use regex::{Captures, Regex};

use crate::config::Conventions;
use crate::error::Result;

/// Library name → function names referenced in one block of text
///
/// Keys keep the order libraries were first referenced in, and function
/// sets keep the order their names were first seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencySet {
    entries: IndexMap<String, IndexSet<String>>,
}

impl DependencySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, library: &str, function: &str) {
        self.entries
            .entry(library.to_string())
            .or_default()
            .insert(function.to_string());
    }

    /// Union `other` into this set
    pub fn merge(&mut self, other: DependencySet) {
        for (library, functions) in other.entries {
            self.entries.entry(library).or_default().extend(functions);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of distinct (library, function) pairs
    pub fn len(&self) -> usize {
        self.entries.values().map(IndexSet::len).sum()
    }

    pub fn contains(&self, library: &str, function: &str) -> bool {
        self.entries
            .get(library)
            .is_some_and(|functions| functions.contains(function))
    }

    pub fn functions(&self, library: &str) -> Option<&IndexSet<String>> {
        self.entries.get(library)
    }
}

impl IntoIterator for DependencySet {
    type Item = (String, IndexSet<String>);
    type IntoIter = indexmap::map::IntoIter<String, IndexSet<String>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// A top-level function block found in a library file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionBlock {
    pub name: String,
    /// Everything after the name: parameters, braces and statements
    pub body: String,
}

/// Compiled patterns for one set of conventions
#[derive(Debug, Clone)]
pub struct Scanner {
    import: Regex,
    lazy: Regex,
    qualified_call: Regex,
    bare_call: Regex,
    declaration: Regex,
    function: Regex,
    comment_marker: String,
    library_suffix: String,
}

impl Scanner {
    pub fn new(conventions: &Conventions) -> Result<Self> {
        let import = Regex::new(&format!(
            r#"(?m)^{}\("/{}/([A-Za-z]+)"\)\."#,
            regex::escape(&conventions.import_keyword),
            regex::escape(&conventions.library_dir),
        ))?;
        let lazy = Regex::new(&format!(
            r"(?m)^{} (?:on|off)\.",
            regex::escape(&conventions.lazy_directive),
        ))?;
        let declaration = Regex::new(&format!(
            r"(?m)^global ([A-Za-z]+{})\b",
            regex::escape(&conventions.library_suffix),
        ))?;
        let function = Regex::new(&format!(
            r"(?ms)^[ \t]{{{indent}}}local function ([A-Za-z0-9]+)\s*(.+?\n[ \t]{{{indent}}}\}})",
            indent = conventions.indent,
        ))?;

        Ok(Self {
            import,
            lazy,
            qualified_call: Regex::new(r"\b([A-Za-z][A-Za-z0-9]*):([A-Za-z0-9]+)[(@]")?,
            bare_call: Regex::new(r"([A-Za-z_][A-Za-z0-9_]*)[(@]")?,
            declaration,
            function,
            comment_marker: conventions.comment_marker.clone(),
            library_suffix: conventions.library_suffix.clone(),
        })
    }

    /// Library names named by import directives, in first-seen order
    pub fn imports(&self, text: &str) -> IndexSet<String> {
        self.import
            .captures_iter(text)
            .map(|caps| caps[1].to_string())
            .collect()
    }

    /// Qualified calls into any of `imports`, ignoring commented text
    pub fn references<S: AsRef<str>>(
        &self,
        imports: impl IntoIterator<Item = S>,
        text: &str,
    ) -> DependencySet {
        let calls = self.qualified_calls(text);
        let mut dependencies = DependencySet::new();
        for library in imports {
            let library = library.as_ref();
            for (lib, function) in &calls {
                if lib == library {
                    dependencies.insert(lib, function);
                }
            }
        }
        dependencies
    }

    /// Qualified calls whose qualifier looks like a library but is not in
    /// `imports`; these are never followed.
    pub fn foreign_references(
        &self,
        imports: &IndexSet<String>,
        text: &str,
    ) -> IndexSet<(String, String)> {
        self.qualified_calls(text)
            .into_iter()
            .filter(|(library, _)| {
                library.ends_with(&self.library_suffix) && !imports.contains(library)
            })
            .collect()
    }

    fn qualified_calls(&self, text: &str) -> Vec<(String, String)> {
        let mut calls = Vec::new();
        for line in text.lines() {
            for caps in self.qualified_call.captures_iter(self.code_portion(line)) {
                calls.push((caps[1].to_string(), caps[2].to_string()));
            }
        }
        calls
    }

    /// The part of `line` before its comment marker
    pub fn code_portion<'a>(&self, line: &'a str) -> &'a str {
        match line.find(&self.comment_marker) {
            Some(idx) => &line[..idx],
            None => line,
        }
    }

    /// Remove import and laziness directives, keeping line breaks
    pub fn strip_directives(&self, text: &str) -> String {
        let text = self.lazy.replace_all(text, "");
        self.import.replace_all(&text, "").into_owned()
    }

    /// Name declared by the library's `global <name>` line
    pub fn declaration<'a>(&self, text: &'a str) -> Option<&'a str> {
        self.declaration
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }

    /// Every top-level function block of a library file, in file order
    pub fn functions(&self, text: &str) -> Vec<FunctionBlock> {
        self.function
            .captures_iter(text)
            .map(|caps| FunctionBlock {
                name: caps[1].to_string(),
                body: caps[2].to_string(),
            })
            .collect()
    }

    /// Rewrite unqualified calls to any of `names` into `library:name`
    ///
    /// A call counts only when the identifier is not already qualified and
    /// not the tail of a longer identifier. Commented text is left alone, so
    /// running the rewrite twice changes nothing.
    pub fn qualify_calls(&self, library: &str, names: &IndexSet<String>, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        for line in text.split_inclusive('\n') {
            let code = self.code_portion(line);
            let rest = &line[code.len()..];
            let rewritten = self.bare_call.replace_all(code, |caps: &Captures| {
                let whole = &caps[0];
                let ident = caps.get(1).map_or("", |m| m.as_str());
                let start = caps.get(0).map_or(0, |m| m.start());
                let preceded_by_name = code[..start]
                    .chars()
                    .next_back()
                    .is_some_and(|c| c == ':' || c.is_ascii_alphanumeric() || c == '_');
                if preceded_by_name || !names.contains(ident) {
                    whole.to_string()
                } else {
                    format!("{}:{}", library, whole)
                }
            });
            out.push_str(&rewritten);
            out.push_str(rest);
        }
        out
    }
}
