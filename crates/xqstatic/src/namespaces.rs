//
// namespaces.rs
//
// Statically known namespaces and default element/type and function namespaces
//

use serde::Serialize;

use crate::dialect::DialectConfig;
use crate::predefined::{predefined_namespaces, DEFAULT_FUNCTION_NAMESPACE};
use crate::qname::QualifiedName;
use crate::syntax::{Node, NodeId, SyntaxKind};

/// A prefix bound to a namespace URI.
///
/// Bindings from the predefined table have no declaring node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamespaceBinding {
    pub prefix: String,
    pub uri: String,
    pub declaring_node: Option<NodeId>,
}

/// Which default namespace an entry overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DefaultNamespaceType {
    ElementOrType,
    Function,
}

/// One level of a default namespace override stack.
///
/// The fallback entry at the end of each stack has no declaring node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DefaultNamespaceEntry {
    pub kind: DefaultNamespaceType,
    pub uri: String,
    pub declaring_node: Option<NodeId>,
}

// ============================================================================
// Declaration extraction
// ============================================================================

fn token_text(node: Node<'_>, kind: SyntaxKind) -> Option<&str> {
    node.child_of_kind(kind).and_then(|n| n.text())
}

/// The `(prefix, uri)` a prolog declaration binds, if it is complete.
fn prolog_namespace_binding(decl: Node<'_>) -> Option<(&str, &str)> {
    let prefix = match decl.kind() {
        SyntaxKind::NamespaceDecl | SyntaxKind::ModuleImport | SyntaxKind::ModuleDecl => {
            token_text(decl, SyntaxKind::NCName)
        }
        SyntaxKind::SchemaImport => decl
            .child_of_kind(SyntaxKind::SchemaPrefix)
            .and_then(|p| token_text(p, SyntaxKind::NCName)),
        _ => return None,
    };
    let uri = token_text(decl, SyntaxKind::UriLiteral);
    match (prefix, uri) {
        (Some(prefix), Some(uri)) => Some((prefix, uri)),
        _ => {
            log::debug!("Skipping incomplete namespace declaration {:?}", decl);
            None
        }
    }
}

/// The default namespace a prolog declaration sets, if any.
fn prolog_default_namespace(decl: Node<'_>) -> Option<(DefaultNamespaceType, &str)> {
    let kind_token = match decl.kind() {
        SyntaxKind::DefaultNamespaceDecl => decl.child_of_kind(SyntaxKind::DefaultNamespaceKind)?,
        SyntaxKind::SchemaImport => decl
            .child_of_kind(SyntaxKind::SchemaPrefix)?
            .child_of_kind(SyntaxKind::DefaultNamespaceKind)?,
        _ => return None,
    };
    let kind = match kind_token.text()? {
        "element" => DefaultNamespaceType::ElementOrType,
        "function" if decl.kind() == SyntaxKind::DefaultNamespaceDecl => {
            DefaultNamespaceType::Function
        }
        _ => return None,
    };
    Some((kind, token_text(decl, SyntaxKind::UriLiteral)?))
}

/// Namespace declaration attributes of a direct element constructor, in
/// document order: `(Some(prefix), uri)` for `xmlns:p` and `(None, uri)` for
/// `xmlns`.
fn namespace_attributes<'t>(
    element: Node<'t>,
) -> impl Iterator<Item = (Option<&'t str>, &'t str, NodeId)> + 't {
    element
        .children_of_kind(SyntaxKind::DirAttributeList)
        .flat_map(|list| list.children_of_kind(SyntaxKind::DirAttribute))
        .filter_map(|attr| {
            let name = QualifiedName::parse(token_text(attr, SyntaxKind::AttributeName)?)?;
            let value = token_text(attr, SyntaxKind::DirAttributeValue)?;
            let prefix = match (name.prefix.as_deref(), name.local_name.as_str()) {
                (Some("xmlns"), _) => Some(attr_local_name(attr)?),
                (None, "xmlns") => None,
                _ => return None,
            };
            Some((prefix, value, attr.id()))
        })
}

fn attr_local_name(attr: Node<'_>) -> Option<&str> {
    token_text(attr, SyntaxKind::AttributeName)?.split_once(':').map(|(_, local)| local.trim())
}

fn prolog_declarations<'t>(module: Node<'t>) -> impl DoubleEndedIterator<Item = Node<'t>> + 't {
    module
        .child_of_kind(SyntaxKind::Prolog)
        .into_iter()
        .flat_map(|prolog| prolog.children())
}

// ============================================================================
// Namespace Resolver
// ============================================================================

/// Every prefix binding visible at `node`, nearest declaration first,
/// followed by the dialect's predefined namespaces.
///
/// Duplicate prefixes are all reported; the first occurrence shadows the
/// rest. Declarations missing their prefix or URI are skipped.
pub fn statically_known_namespaces(node: Node<'_>, dialect: DialectConfig) -> Vec<NamespaceBinding> {
    let mut bindings = Vec::new();

    for scope in node.self_and_ancestors() {
        match scope.kind() {
            SyntaxKind::DirElemConstructor => {
                for (prefix, uri, attr) in namespace_attributes(scope) {
                    if let Some(prefix) = prefix {
                        bindings.push(NamespaceBinding {
                            prefix: prefix.to_string(),
                            uri: uri.to_string(),
                            declaring_node: Some(attr),
                        });
                    }
                }
            }
            SyntaxKind::MainModule | SyntaxKind::LibraryModule => {
                let decls = prolog_declarations(scope)
                    .rev()
                    .chain(scope.child_of_kind(SyntaxKind::ModuleDecl));
                for decl in decls {
                    if let Some((prefix, uri)) = prolog_namespace_binding(decl) {
                        bindings.push(NamespaceBinding {
                            prefix: prefix.to_string(),
                            uri: uri.to_string(),
                            declaring_node: Some(decl.id()),
                        });
                    }
                }
            }
            _ => {}
        }
    }

    log::trace!(
        "{} declared namespace bindings at {:?}",
        bindings.len(),
        node
    );

    bindings.extend(
        predefined_namespaces(dialect.vendor_profile)
            .into_iter()
            .map(|(prefix, uri)| NamespaceBinding {
                prefix: prefix.to_string(),
                uri: uri.to_string(),
                declaring_node: None,
            }),
    );
    bindings
}

/// The binding `prefix` resolves to at `node`, after shadowing.
pub fn resolve_prefix(node: Node<'_>, prefix: &str, dialect: DialectConfig) -> Option<NamespaceBinding> {
    statically_known_namespaces(node, dialect)
        .into_iter()
        .find(|b| b.prefix == prefix)
}

// ============================================================================
// Default Namespace Resolver
// ============================================================================

fn default_namespaces(node: Node<'_>, wanted: DefaultNamespaceType) -> Vec<DefaultNamespaceEntry> {
    let mut entries = Vec::new();

    for scope in node.self_and_ancestors() {
        match scope.kind() {
            SyntaxKind::DirElemConstructor if wanted == DefaultNamespaceType::ElementOrType => {
                for (prefix, uri, attr) in namespace_attributes(scope) {
                    if prefix.is_none() {
                        entries.push(DefaultNamespaceEntry {
                            kind: wanted,
                            uri: uri.to_string(),
                            declaring_node: Some(attr),
                        });
                    }
                }
            }
            SyntaxKind::MainModule | SyntaxKind::LibraryModule => {
                for decl in prolog_declarations(scope).rev() {
                    match prolog_default_namespace(decl) {
                        Some((kind, uri)) if kind == wanted => {
                            entries.push(DefaultNamespaceEntry {
                                kind,
                                uri: uri.to_string(),
                                declaring_node: Some(decl.id()),
                            });
                        }
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }

    let fallback = match wanted {
        DefaultNamespaceType::ElementOrType => "",
        DefaultNamespaceType::Function => DEFAULT_FUNCTION_NAMESPACE,
    };
    entries.push(DefaultNamespaceEntry {
        kind: wanted,
        uri: fallback.to_string(),
        declaring_node: None,
    });
    entries
}

/// Default element/type namespaces in effect at `node`, innermost first,
/// ending with the `""` fallback.
pub fn default_element_or_type_namespace(node: Node<'_>) -> Vec<DefaultNamespaceEntry> {
    default_namespaces(node, DefaultNamespaceType::ElementOrType)
}

/// Default function namespaces in effect at `node`, innermost first, ending
/// with the built-in function namespace.
pub fn default_function_namespace(node: Node<'_>) -> Vec<DefaultNamespaceEntry> {
    default_namespaces(node, DefaultNamespaceType::Function)
}

// ============================================================================
// Name expansion
// ============================================================================

/// What a name token names, which decides how an unprefixed name expands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameRole {
    Function,
    ElementOrType,
    /// Variables, attributes and other names that are in no namespace when
    /// unprefixed.
    NoDefault,
}

impl NameRole {
    /// Role of a name token from its position in the tree.
    pub fn of(token: Node<'_>) -> NameRole {
        match token.parent().map(|p| p.kind()) {
            Some(
                SyntaxKind::FunctionCall
                | SyntaxKind::NamedFunctionRef
                | SyntaxKind::ArrowFunctionSpecifier
                | SyntaxKind::FunctionDecl,
            ) => NameRole::Function,
            Some(SyntaxKind::DirElemConstructor | SyntaxKind::SequenceType | SyntaxKind::TypeDeclaration) => {
                NameRole::ElementOrType
            }
            _ => NameRole::NoDefault,
        }
    }
}

/// Expand `name` as written at `node`.
///
/// Returns `None` when the prefix has no binding in scope.
pub fn expand_name(
    node: Node<'_>,
    name: &QualifiedName,
    role: NameRole,
    dialect: DialectConfig,
) -> Option<QualifiedName> {
    if name.is_uri_qualified() {
        return Some(name.clone());
    }
    let namespace = match &name.prefix {
        Some(prefix) => resolve_prefix(node, prefix, dialect)?.uri,
        None => match role {
            NameRole::Function => default_function_namespace(node).into_iter().next()?.uri,
            NameRole::ElementOrType => default_element_or_type_namespace(node).into_iter().next()?.uri,
            NameRole::NoDefault => return Some(name.clone()),
        },
    };
    Some(name.clone().with_namespace(namespace))
}

/// Expand the name carried by an `EQName`, `VarName` or `AttributeName` token.
pub fn expand_qname(token: Node<'_>, dialect: DialectConfig) -> Option<QualifiedName> {
    let name = QualifiedName::parse(token.text()?)?;
    expand_name(token, &name, NameRole::of(token), dialect)
}
