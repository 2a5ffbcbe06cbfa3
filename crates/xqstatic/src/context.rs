//
// context.rs
//
// Static context queries by node id
//
// `StaticContext` binds a tree to a dialect, an optional module registry and
// an optional cache, and answers the resolver queries for node ids. Unknown
// ids yield empty results.
//

use std::sync::Arc;

use rayon::prelude::*;
use serde::Serialize;

use crate::cache::{CacheKey, ResolutionCache};
use crate::dialect::DialectConfig;
use crate::functions::{self, FunctionDeclaration};
use crate::modules::ModuleRegistry;
use crate::namespaces::{self, DefaultNamespaceEntry, NamespaceBinding};
use crate::perf::{self, TimingGuard};
use crate::qname::QualifiedName;
use crate::syntax::{Node, NodeId, SyntaxTree};
use crate::variables::{self, VariableBinding};

/// Everything the resolvers report for one node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StaticContextSummary {
    pub node: NodeId,
    pub dialect: DialectConfig,
    pub namespaces: Vec<NamespaceBinding>,
    pub default_element_namespace: Vec<DefaultNamespaceEntry>,
    pub default_function_namespace: Vec<DefaultNamespaceEntry>,
    pub variables: Vec<VariableBinding>,
    pub functions: Vec<FunctionDeclaration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_arity: Option<u32>,
}

/// Resolver entry point for one tree.
#[derive(Debug, Clone, Copy)]
pub struct StaticContext<'a> {
    tree: &'a SyntaxTree,
    dialect: DialectConfig,
    modules: Option<&'a ModuleRegistry>,
    cache: Option<&'a ResolutionCache>,
}

impl<'a> StaticContext<'a> {
    pub fn new(tree: &'a SyntaxTree, dialect: DialectConfig) -> Self {
        Self {
            tree,
            dialect,
            modules: None,
            cache: None,
        }
    }

    /// Library modules searched for imported functions.
    pub fn with_modules(mut self, modules: &'a ModuleRegistry) -> Self {
        self.modules = Some(modules);
        self
    }

    /// Cache for namespace and variable results. `None` resolves uncached.
    pub fn with_cache(mut self, cache: impl Into<Option<&'a ResolutionCache>>) -> Self {
        self.cache = cache.into();
        self
    }

    pub fn tree(&self) -> &'a SyntaxTree {
        self.tree
    }

    pub fn dialect(&self) -> DialectConfig {
        self.dialect
    }

    fn node(&self, id: NodeId) -> Option<Node<'a>> {
        let node = self.tree.node(id);
        if node.is_none() {
            log::debug!("Node {} is not in the tree ({} nodes)", id, self.tree.len());
        }
        node
    }

    fn key(&self, id: NodeId) -> CacheKey {
        CacheKey {
            generation: self.tree.generation(),
            node: id,
            dialect: self.dialect,
        }
    }

    /// Statically known namespaces at `id`, nearest first.
    pub fn namespaces(&self, id: NodeId) -> Arc<Vec<NamespaceBinding>> {
        let Some(node) = self.node(id) else {
            return Arc::default();
        };
        let compute = || namespaces::statically_known_namespaces(node, self.dialect);
        match self.cache {
            Some(cache) => {
                let (bindings, hit) = cache.namespaces.fetch(self.key(id), compute);
                perf::record_resolver_call(hit);
                bindings
            }
            None => {
                perf::record_resolver_call(false);
                Arc::new(compute())
            }
        }
    }

    pub fn resolve_prefix(&self, id: NodeId, prefix: &str) -> Option<NamespaceBinding> {
        self.namespaces(id).iter().find(|b| b.prefix == prefix).cloned()
    }

    pub fn default_element_namespace(&self, id: NodeId) -> Vec<DefaultNamespaceEntry> {
        self.node(id)
            .map(namespaces::default_element_or_type_namespace)
            .unwrap_or_default()
    }

    pub fn default_function_namespace(&self, id: NodeId) -> Vec<DefaultNamespaceEntry> {
        self.node(id)
            .map(namespaces::default_function_namespace)
            .unwrap_or_default()
    }

    /// In-scope variables at `id`, nearest binding scope first.
    pub fn in_scope_variables(&self, id: NodeId) -> Arc<Vec<VariableBinding>> {
        let Some(node) = self.node(id) else {
            return Arc::default();
        };
        let compute = || variables::in_scope_variables(node);
        match self.cache {
            Some(cache) => {
                let (bindings, hit) = cache.variables.fetch(self.key(id), compute);
                perf::record_resolver_call(hit);
                bindings
            }
            None => {
                perf::record_resolver_call(false);
                Arc::new(compute())
            }
        }
    }

    /// Candidate declarations for the call-like site at `id`.
    pub fn statically_known_functions(&self, id: NodeId) -> Vec<FunctionDeclaration> {
        perf::record_resolver_call(false);
        self.node(id)
            .map(|node| functions::statically_known_functions(node, self.dialect, self.modules))
            .unwrap_or_default()
    }

    /// Candidates that accept the number of arguments passed at `id`.
    pub fn applicable_functions(&self, id: NodeId) -> Vec<FunctionDeclaration> {
        let Some(arity) = self.call_arity(id) else {
            return Vec::new();
        };
        self.statically_known_functions(id)
            .into_iter()
            .filter(|f| f.accepts(arity))
            .collect()
    }

    pub fn call_arity(&self, id: NodeId) -> Option<u32> {
        self.node(id).and_then(functions::call_arity)
    }

    /// Expanded name carried by the name token at `id`.
    pub fn expand_qname(&self, id: NodeId) -> Option<QualifiedName> {
        self.node(id)
            .and_then(|token| namespaces::expand_qname(token, self.dialect))
    }

    pub fn summary(&self, id: NodeId) -> StaticContextSummary {
        let _guard = TimingGuard::new("static_context_summary");
        StaticContextSummary {
            node: id,
            dialect: self.dialect,
            namespaces: self.namespaces(id).to_vec(),
            default_element_namespace: self.default_element_namespace(id),
            default_function_namespace: self.default_function_namespace(id),
            variables: self.in_scope_variables(id).to_vec(),
            functions: self.statically_known_functions(id),
            call_arity: self.call_arity(id),
        }
    }

    // ========================================================================
    // Batch queries
    // ========================================================================

    /// In-scope variables for many nodes, computed in parallel. Results are
    /// returned in the order of `ids`.
    pub fn in_scope_variables_batch(&self, ids: &[NodeId]) -> Vec<Arc<Vec<VariableBinding>>> {
        let _guard = TimingGuard::with_threshold("in_scope_variables_batch", 100);
        ids.par_iter().map(|&id| self.in_scope_variables(id)).collect()
    }

    pub fn namespaces_batch(&self, ids: &[NodeId]) -> Vec<Arc<Vec<NamespaceBinding>>> {
        let _guard = TimingGuard::with_threshold("namespaces_batch", 100);
        ids.par_iter().map(|&id| self.namespaces(id)).collect()
    }

    pub fn statically_known_functions_batch(&self, ids: &[NodeId]) -> Vec<Vec<FunctionDeclaration>> {
        let _guard = TimingGuard::with_threshold("statically_known_functions_batch", 100);
        ids.par_iter()
            .map(|&id| self.statically_known_functions(id))
            .collect()
    }
}
