//
// modules.rs
//
// Registry of library modules available to `import module`
//

use std::path::Path;

use anyhow::{bail, Context};
use indexmap::IndexMap;

use crate::syntax::{SyntaxKind, SyntaxTree};

/// A parsed library module and the namespace it declares.
#[derive(Debug)]
pub struct LibraryModule {
    namespace_uri: String,
    location: Option<String>,
    tree: SyntaxTree,
}

impl LibraryModule {
    /// Wrap a parsed tree whose root is a `LibraryModule` with a complete
    /// module declaration.
    pub fn new(tree: SyntaxTree, location: Option<String>) -> anyhow::Result<Self> {
        let root = tree.root();
        if root.kind() != SyntaxKind::LibraryModule {
            bail!(
                "Expected a library module{}, found {:?}",
                location.as_deref().map(|l| format!(" at {l}")).unwrap_or_default(),
                root.kind()
            );
        }
        let namespace_uri = root
            .child_of_kind(SyntaxKind::ModuleDecl)
            .and_then(|decl| decl.child_of_kind(SyntaxKind::UriLiteral))
            .and_then(|uri| uri.text())
            .context("Library module has no target namespace")?
            .to_string();
        Ok(Self {
            namespace_uri,
            location,
            tree,
        })
    }

    pub fn namespace_uri(&self) -> &str {
        &self.namespace_uri
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn tree(&self) -> &SyntaxTree {
        &self.tree
    }

    /// A location hint names this module when the registered location ends
    /// with it (`json.xqy` matches `/MarkLogic/json/json.xqy`).
    pub fn matches_hint(&self, hint: &str) -> bool {
        let hint = hint.trim();
        match &self.location {
            Some(location) => !hint.is_empty() && location.ends_with(hint.trim_start_matches("./")),
            None => false,
        }
    }
}

/// Library modules keyed by target namespace, in registration order.
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    modules: IndexMap<String, Vec<LibraryModule>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tree: SyntaxTree, location: Option<String>) -> anyhow::Result<()> {
        let module = LibraryModule::new(tree, location)?;
        log::debug!(
            "Registered library module {} ({})",
            module.namespace_uri,
            module.location.as_deref().unwrap_or("no location")
        );
        self.modules
            .entry(module.namespace_uri.clone())
            .or_default()
            .push(module);
        Ok(())
    }

    /// Load a JSON syntax tree from disk and register it under its path.
    pub fn register_file(&mut self, path: &Path) -> anyhow::Result<()> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read module {}", path.display()))?;
        let tree = SyntaxTree::from_json_str(&json)
            .with_context(|| format!("Failed to load module {}", path.display()))?;
        self.register(tree, Some(path.display().to_string()))
    }

    /// Modules for `namespace_uri`. When any location hint names a
    /// registered module only the named modules are returned.
    pub fn modules_for(&self, namespace_uri: &str, hints: &[&str]) -> Vec<&LibraryModule> {
        let Some(candidates) = self.modules.get(namespace_uri) else {
            return Vec::new();
        };
        let hinted: Vec<_> = candidates
            .iter()
            .filter(|m| hints.iter().any(|h| m.matches_hint(h)))
            .collect();
        if hinted.is_empty() {
            candidates.iter().collect()
        } else {
            hinted
        }
    }

    pub fn namespaces(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.modules.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}
