//! Deterministic fixture query generator for benchmarks and tests.
//!
//! Generates synthetic main modules with controlled characteristics:
//! prolog namespace declarations, variables and functions, FLWOR nesting
//! depth and bindings per clause. The innermost return calls `probe()`, the
//! node benchmarks resolve against.
//!
//! All output is deterministic so benchmarks are reproducible.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use super::fixture::*;
use crate::syntax::{SyntaxNodeSpec, SyntaxTree};

/// Name of the call placed at the innermost return.
pub const PROBE: &str = "probe";

/// Configuration for generating a fixture query.
#[derive(Debug, Clone)]
pub struct FixtureConfig {
    pub namespace_decls: usize,
    pub prolog_variables: usize,
    pub prolog_functions: usize,
    pub flwor_depth: usize,
    pub bindings_per_clause: usize,
}

impl FixtureConfig {
    /// Small query: 5 namespaces, 5 variables, 5 functions, FLWOR depth 3.
    pub fn small() -> Self {
        Self {
            namespace_decls: 5,
            prolog_variables: 5,
            prolog_functions: 5,
            flwor_depth: 3,
            bindings_per_clause: 2,
        }
    }

    /// Medium query: 20 of each declaration, FLWOR depth 10.
    pub fn medium() -> Self {
        Self {
            namespace_decls: 20,
            prolog_variables: 20,
            prolog_functions: 20,
            flwor_depth: 10,
            bindings_per_clause: 3,
        }
    }

    /// Large query: 100 of each declaration, FLWOR depth 40.
    pub fn large() -> Self {
        Self {
            namespace_decls: 100,
            prolog_variables: 100,
            prolog_functions: 100,
            flwor_depth: 40,
            bindings_per_clause: 4,
        }
    }
}

/// Node description of the generated query.
pub fn generate_query_spec(config: &FixtureConfig) -> SyntaxNodeSpec {
    let mut decls = Vec::new();
    for i in 0..config.namespace_decls {
        decls.push(namespace_decl(
            Some(&format!("ns{i}")),
            Some(&format!("urn:fixture:{i}")),
        ));
    }
    for i in 0..config.prolog_variables {
        decls.push(var_decl(&format!("global{i}"), Some(num(&i.to_string()))));
    }
    for i in 0..config.prolog_functions {
        let params = (0..=i % 3).map(|p| param(&format!("p{p}"))).collect();
        decls.push(function_decl(&format!("local:f{i}"), params, Some(empty_expr())));
    }

    // Build the FLWOR nest inside out.
    let mut body = call(PROBE, Vec::new());
    for depth in (0..config.flwor_depth).rev() {
        let is_for = depth % 2 == 0;
        let bindings = (0..config.bindings_per_clause)
            .map(|b| {
                let name = format!("v{depth}_{b}");
                let value = num(&b.to_string());
                match (is_for, b % 2 == 0) {
                    (true, true) => for_binding(&name, Some(&format!("{name}_at")), value),
                    (true, false) => for_binding(&name, None, value),
                    (false, _) => let_binding(&name, value),
                }
            })
            .collect();
        let clause = if is_for {
            for_clause(bindings)
        } else {
            let_clause(bindings)
        };
        body = flwor(vec![clause], body);
    }

    main_module_spec(decls, body)
}

pub fn generate_query(config: &FixtureConfig) -> SyntaxTree {
    SyntaxTree::from_spec(&generate_query_spec(config)).expect("generated fixtures are well formed")
}

/// Write the generated query as JSON into a fresh temporary directory.
///
/// Returns the directory (cleaned up on drop) and the file path.
pub fn create_fixture_file(config: &FixtureConfig) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temp directory for fixture query");
    let path = write_fixture_file(temp_dir.path(), config);
    (temp_dir, path)
}

/// Write the generated query as a `query.json` node list into `dir`.
pub fn write_fixture_file(dir: &Path, config: &FixtureConfig) -> PathBuf {
    let path = dir.join("query.json");
    let json = generate_query(config).to_json().expect("fixture trees serialize");
    std::fs::write(&path, json)
        .unwrap_or_else(|e| panic!("Failed to write fixture file {}: {}", path.display(), e));
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::SyntaxKind;
    use crate::variables::in_scope_variables;

    #[test]
    fn test_small_preset_values() {
        let config = FixtureConfig::small();
        assert_eq!(config.flwor_depth, 3);
        assert_eq!(config.prolog_functions, 5);
    }

    #[test]
    fn test_deterministic_output() {
        let config = FixtureConfig::small();
        assert_eq!(generate_query_spec(&config), generate_query_spec(&config));
    }

    #[test]
    fn test_probe_sees_every_binding() {
        let config = FixtureConfig::small();
        let tree = generate_query(&config);
        let probe = find_token(&tree, SyntaxKind::EQName, PROBE);
        let for_bindings = (config.flwor_depth + 1) / 2 * ((config.bindings_per_clause + 1) / 2);
        let expected = config.flwor_depth * config.bindings_per_clause
            + for_bindings
            + config.prolog_variables;
        assert_eq!(in_scope_variables(probe).len(), expected);
    }

    #[test]
    fn test_fixture_file_loads() {
        let (_dir, path) = create_fixture_file(&FixtureConfig::small());
        let json = std::fs::read_to_string(&path).unwrap();
        let tree = SyntaxTree::from_json_str(&json).unwrap();
        assert_eq!(tree.to_spec(), generate_query_spec(&FixtureConfig::small()));
    }
}
