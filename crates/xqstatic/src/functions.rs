//
// functions.rs
//
// Function resolution for function calls, named function references and
// arrow function specifiers
//

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::builtins;
use crate::dialect::DialectConfig;
use crate::modules::ModuleRegistry;
use crate::namespaces::{expand_name, NameRole};
use crate::predefined::predefined_namespaces;
use crate::qname::QualifiedName;
use crate::syntax::{Node, NodeId, SyntaxKind};

/// Range of argument counts a function accepts. `max == None` is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArityRange {
    pub min: u32,
    pub max: Option<u32>,
}

impl ArityRange {
    pub const fn new(min: u32, max: Option<u32>) -> Self {
        Self { min, max }
    }

    pub const fn fixed(arity: u32) -> Self {
        Self {
            min: arity,
            max: Some(arity),
        }
    }

    pub const fn variadic(min: u32) -> Self {
        Self { min, max: None }
    }

    pub fn is_variadic(self) -> bool {
        self.max.is_none()
    }

    pub fn contains(self, arity: u32) -> bool {
        arity >= self.min && self.max.map_or(true, |max| arity <= max)
    }
}

impl fmt::Display for ArityRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) => write!(f, "[{},{}]", self.min, max),
            None => write!(f, "[{},∞]", self.min),
        }
    }
}

/// Where a candidate declaration came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FunctionProvenance {
    UserDeclared,
    ModuleImported,
    BuiltIn,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionDeclaration {
    /// Name with its namespace expanded.
    pub name: QualifiedName,
    pub arity: ArityRange,
    pub provenance: FunctionProvenance,
    /// `FunctionDecl` node. For imported functions this indexes the library
    /// module's tree, identified by `module_location`.
    pub declaring_node: Option<NodeId>,
    pub module_location: Option<String>,
}

impl FunctionDeclaration {
    /// Whether a call passing `arity` arguments can bind to this declaration.
    pub fn accepts(&self, arity: u32) -> bool {
        self.arity.contains(arity)
    }
}

// ============================================================================
// Call sites
// ============================================================================

/// The call-like construct `node` is, or names.
fn call_site(node: Node<'_>) -> Option<Node<'_>> {
    if node.kind().is_call_site() {
        return Some(node);
    }
    if node.kind() == SyntaxKind::EQName {
        return node.parent().filter(|p| p.kind().is_call_site());
    }
    None
}

fn argument_count(list: Option<Node<'_>>) -> u32 {
    list.map_or(0, |l| l.children().count() as u32)
}

/// Number of arguments the call-like site at `node` supplies.
///
/// Argument placeholders count as arguments; an arrow specifier counts its
/// left-hand operand. Returns `None` when `node` is not a call-like site.
pub fn call_arity(node: Node<'_>) -> Option<u32> {
    let site = call_site(node)?;
    match site.kind() {
        SyntaxKind::FunctionCall => Some(argument_count(site.child_of_kind(SyntaxKind::ArgumentList))),
        SyntaxKind::NamedFunctionRef => Some(
            site.child_of_kind(SyntaxKind::NumericLiteral)
                .and_then(|n| n.text())
                .and_then(|t| t.trim().parse().ok())
                .unwrap_or(0),
        ),
        SyntaxKind::ArrowFunctionSpecifier => {
            let args = site
                .next_sibling()
                .filter(|n| n.kind() == SyntaxKind::ArgumentList);
            Some(argument_count(args) + 1)
        }
        _ => None,
    }
}

/// Expanded function name at a call-like site.
pub fn call_site_name(node: Node<'_>, dialect: DialectConfig) -> Option<QualifiedName> {
    let token = call_site(node)?.child_of_kind(SyntaxKind::EQName)?;
    let name = QualifiedName::parse(token.text()?)?;
    expand_name(token, &name, NameRole::Function, dialect)
}

// ============================================================================
// Declared functions
// ============================================================================

/// A function declared in a module prolog.
#[derive(Debug, Clone)]
pub struct DeclaredFunction {
    pub name: QualifiedName,
    pub arity: ArityRange,
    pub node: NodeId,
}

/// Parameters with a default value may be omitted by the caller.
fn declared_arity(decl: Node<'_>) -> ArityRange {
    let params: Vec<_> = decl
        .child_of_kind(SyntaxKind::ParamList)
        .into_iter()
        .flat_map(|list| list.children_of_kind(SyntaxKind::Param))
        .collect();
    let required = params
        .iter()
        .filter(|p| {
            !p.children()
                .any(|c| !matches!(c.kind(), SyntaxKind::VarName | SyntaxKind::TypeDeclaration))
        })
        .count();
    ArityRange::new(required as u32, Some(params.len() as u32))
}

/// Function declarations in a module's prolog, in document order, with
/// names expanded where they are declared.
pub fn declared_functions(module: Node<'_>, dialect: DialectConfig) -> Vec<DeclaredFunction> {
    let Some(prolog) = module.child_of_kind(SyntaxKind::Prolog) else {
        return Vec::new();
    };
    prolog
        .children_of_kind(SyntaxKind::FunctionDecl)
        .filter_map(|decl| {
            let token = decl.child_of_kind(SyntaxKind::EQName)?;
            let name = QualifiedName::parse(token.text()?)?;
            let name = expand_name(token, &name, NameRole::Function, dialect)?;
            Some(DeclaredFunction {
                name,
                arity: declared_arity(decl),
                node: decl.id(),
            })
        })
        .collect()
}

/// Prefix the vendor's predefined table binds to `namespace`, used to name
/// built-in functions.
fn canonical_prefix(dialect: DialectConfig, namespace: &str) -> Option<String> {
    predefined_namespaces(dialect.vendor_profile)
        .into_iter()
        .find(|(_, uri)| *uri == namespace)
        .map(|(prefix, _)| prefix.to_string())
}

// ============================================================================
// Function Resolution Resolver
// ============================================================================

/// Candidate declarations for the call-like site at `node`.
///
/// Candidates are listed in precedence order: functions declared in the
/// enclosing module, then functions of imported library modules, then
/// built-ins. Every arity of the name is reported; use
/// [`FunctionDeclaration::accepts`] with [`call_arity`] to narrow the list.
pub fn statically_known_functions(
    node: Node<'_>,
    dialect: DialectConfig,
    modules: Option<&ModuleRegistry>,
) -> Vec<FunctionDeclaration> {
    let Some(name) = call_site_name(node, dialect) else {
        log::trace!("No resolvable function name at {:?}", node);
        return Vec::new();
    };
    let namespace = name.namespace.clone().unwrap_or_default();
    let mut out = Vec::new();

    if let Some(module) = node.module() {
        for f in declared_functions(module, dialect) {
            if f.name.matches_expanded(&name) {
                out.push(FunctionDeclaration {
                    name: f.name,
                    arity: f.arity,
                    provenance: FunctionProvenance::UserDeclared,
                    declaring_node: Some(f.node),
                    module_location: None,
                });
            }
        }

        if let Some(registry) = modules {
            imported_functions(module, &name, dialect, registry, &mut out);
        }
    }

    let prefix = canonical_prefix(dialect, &namespace).or_else(|| name.prefix.clone());
    out.extend(
        builtins::lookup(dialect, &namespace, &name.local_name).map(|sig| FunctionDeclaration {
            name: QualifiedName {
                prefix: prefix.clone(),
                local_name: sig.local_name.to_string(),
                namespace: Some(namespace.clone()),
            },
            arity: sig.arity,
            provenance: FunctionProvenance::BuiltIn,
            declaring_node: None,
            module_location: None,
        }),
    );

    log::trace!("{} candidates for {} at {:?}", out.len(), name, node);
    out
}

fn imported_functions(
    module: Node<'_>,
    name: &QualifiedName,
    dialect: DialectConfig,
    registry: &ModuleRegistry,
    out: &mut Vec<FunctionDeclaration>,
) {
    let namespace = name.namespace.as_deref().unwrap_or("");
    let imports = module
        .child_of_kind(SyntaxKind::Prolog)
        .into_iter()
        .flat_map(|prolog| prolog.children_of_kind(SyntaxKind::ModuleImport))
        .filter(|import| {
            import.child_of_kind(SyntaxKind::UriLiteral).and_then(|u| u.text()) == Some(namespace)
        });

    for import in imports {
        let hints: Vec<&str> = import
            .children_of_kind(SyntaxKind::LocationHint)
            .filter_map(|h| h.text())
            .collect();
        for library in registry.modules_for(namespace, &hints) {
            for f in declared_functions(library.tree().root(), dialect) {
                if f.name.matches_expanded(name) {
                    out.push(FunctionDeclaration {
                        name: f.name,
                        arity: f.arity,
                        provenance: FunctionProvenance::ModuleImported,
                        declaring_node: Some(f.node),
                        module_location: library.location().map(str::to_string),
                    });
                }
            }
        }
    }
}
