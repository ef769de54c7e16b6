//! Parsed library files and their functions

use std::path::{Path, PathBuf};

use indexmap::{IndexMap, IndexSet};
use tracing::debug;

use crate::error::{LinkError, Result};
use crate::scanner::Scanner;

/// Whether the reachability pass has marked a function as required
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VisitState {
    #[default]
    Unvisited,
    Visited,
}

#[derive(Debug, Clone)]
pub struct FunctionDefinition {
    pub name: String,
    /// Full function text after its name, with same-library calls qualified
    pub body: String,
    pub state: VisitState,
}

impl FunctionDefinition {
    pub fn new(name: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            body: body.into(),
            state: VisitState::Unvisited,
        }
    }

    pub fn is_visited(&self) -> bool {
        self.state == VisitState::Visited
    }
}

#[derive(Debug, Clone)]
pub struct Library {
    pub name: String,
    pub path: PathBuf,
    /// Libraries this one may call into, always including itself
    pub imports: IndexSet<String>,
    pub functions: IndexMap<String, FunctionDefinition>,
    /// Indices into `functions`, in the order they were visited
    visit_order: Vec<usize>,
}

impl Library {
    /// Parse the source text of library `name` read from `path`
    pub fn parse(name: &str, path: &Path, text: &str, scanner: &Scanner) -> Result<Self> {
        let declared = scanner.declaration(text).ok_or_else(|| {
            LinkError::malformed(path, "missing top-level 'global <name>' declaration")
        })?;
        if declared != name {
            return Err(LinkError::malformed(
                path,
                format!("declares '{}' but is imported as '{}'", declared, name),
            ));
        }

        let mut imports = scanner.imports(text);
        imports.insert(name.to_string());

        let blocks = scanner.functions(text);
        let names: IndexSet<String> = blocks.iter().map(|b| b.name.clone()).collect();
        let functions = blocks
            .into_iter()
            .map(|block| {
                let body = scanner.qualify_calls(name, &names, &block.body);
                (block.name.clone(), FunctionDefinition::new(block.name, body))
            })
            .collect::<IndexMap<_, _>>();

        debug!(
            "Parsed library {} ({} functions, imports: {:?})",
            name,
            functions.len(),
            imports
        );

        Ok(Self {
            name: name.to_string(),
            path: path.to_path_buf(),
            imports,
            functions,
            visit_order: Vec::new(),
        })
    }

    /// Mark `function` as required
    ///
    /// Returns the definition only on its first visit, so callers scan each
    /// body at most once.
    pub fn visit(&mut self, function: &str) -> Result<Option<&FunctionDefinition>> {
        let (index, _, def) = self
            .functions
            .get_full_mut(function)
            .ok_or_else(|| LinkError::unresolved(&self.name, function))?;

        if def.is_visited() {
            return Ok(None);
        }
        def.state = VisitState::Visited;
        self.visit_order.push(index);

        Ok(self.functions.get_index(index).map(|(_, def)| def))
    }

    /// Visited functions in the order they were first visited
    pub fn visited(&self) -> impl Iterator<Item = &FunctionDefinition> {
        self.visit_order
            .iter()
            .filter_map(|&index| self.functions.get_index(index).map(|(_, def)| def))
    }

    pub fn visited_count(&self) -> usize {
        self.visit_order.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Conventions;

    const MATH_LIB: &str = r#"@LAZYGLOBAL off.
runoncepath("/lib/vecLib").
global mathLib is lex(
    "square", square@,
    "cube", cube@
).
{
    local function square {
        parameter x.
        return helper(x) * x.
    }

    local function cube {
        parameter x.
        // square(x) would be slower
        return square(x) * vecLib:len(x).
    }

    local function helper {
        parameter x.
        return x.
    }
}
"#;

    fn parse(text: &str) -> Result<Library> {
        let scanner = Scanner::new(&Conventions::default()).unwrap();
        Library::parse("mathLib", Path::new("lib/mathLib.ks"), text, &scanner)
    }

    #[test]
    fn test_parse_library() {
        let lib = parse(MATH_LIB).unwrap();
        assert_eq!(lib.name, "mathLib");
        let imports: Vec<_> = lib.imports.iter().cloned().collect();
        assert_eq!(imports, vec!["vecLib", "mathLib"]);
        let names: Vec<_> = lib.functions.keys().cloned().collect();
        assert_eq!(names, vec!["square", "cube", "helper"]);
    }

    #[test]
    fn test_same_library_calls_are_qualified() {
        let lib = parse(MATH_LIB).unwrap();
        assert!(lib.functions["square"].body.contains("return mathLib:helper(x) * x."));
        let cube = &lib.functions["cube"].body;
        assert!(cube.contains("return mathLib:square(x) * vecLib:len(x)."));
        assert!(cube.contains("// square(x) would be slower"));
    }

    #[test]
    fn test_missing_declaration() {
        let err = parse("    local function f {\n    }\n").unwrap_err();
        assert!(matches!(err, LinkError::MalformedLibrary { .. }));
    }

    #[test]
    fn test_declaration_must_match_file_name() {
        let err = parse("global vecLib is lex().\n").unwrap_err();
        match err {
            LinkError::MalformedLibrary { reason, .. } => assert!(reason.contains("vecLib")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_visit_marks_once_in_order() {
        let mut lib = parse(MATH_LIB).unwrap();
        assert!(lib.visit("helper").unwrap().is_some());
        assert!(lib.visit("square").unwrap().is_some());
        assert!(lib.visit("helper").unwrap().is_none());

        let visited: Vec<_> = lib.visited().map(|f| f.name.as_str()).collect();
        assert_eq!(visited, vec!["helper", "square"]);
        assert_eq!(lib.functions["cube"].state, VisitState::Unvisited);
    }

    #[test]
    fn test_visit_unknown_function() {
        let mut lib = parse(MATH_LIB).unwrap();
        match lib.visit("missing").unwrap_err() {
            LinkError::UnresolvedFunction { library, function } => {
                assert_eq!(library, "mathLib");
                assert_eq!(function, "missing");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
