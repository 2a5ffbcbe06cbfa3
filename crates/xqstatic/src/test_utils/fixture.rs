//! Small DSL for building syntax trees in tests.
//!
//! Each helper returns the node layout documented on `SyntaxKind`, so a
//! test can spell out `for $x in 1 return test()` as nested calls instead of
//! a JSON blob. Missing optional parts are passed as `None`.

use crate::syntax::{Node, SyntaxKind, SyntaxNodeSpec, SyntaxTree};

type Spec = SyntaxNodeSpec;

fn node(kind: SyntaxKind, children: Vec<Spec>) -> Spec {
    SyntaxNodeSpec::node(kind, children)
}

fn token(kind: SyntaxKind, text: &str) -> Spec {
    SyntaxNodeSpec::token(kind, text)
}

fn var_name(name: &str) -> Spec {
    token(SyntaxKind::VarName, name)
}

fn build(spec: &Spec) -> SyntaxTree {
    SyntaxTree::from_spec(spec).expect("fixture trees are well formed")
}

// ============================================================================
// Modules
// ============================================================================

pub fn main_module_spec(decls: Vec<Spec>, body: Spec) -> Spec {
    let mut children = Vec::new();
    if !decls.is_empty() {
        children.push(node(SyntaxKind::Prolog, decls));
    }
    children.push(node(SyntaxKind::QueryBody, vec![body]));
    node(SyntaxKind::MainModule, children)
}

pub fn main_module(decls: Vec<Spec>, body: Spec) -> SyntaxTree {
    build(&main_module_spec(decls, body))
}

/// A main module without a prolog.
pub fn query(body: Spec) -> SyntaxTree {
    main_module(Vec::new(), body)
}

pub fn library_module_spec(prefix: Option<&str>, uri: Option<&str>, decls: Vec<Spec>) -> Spec {
    let mut decl = Vec::new();
    if let Some(prefix) = prefix {
        decl.push(token(SyntaxKind::NCName, prefix));
    }
    if let Some(uri) = uri {
        decl.push(token(SyntaxKind::UriLiteral, uri));
    }
    let mut children = vec![node(SyntaxKind::ModuleDecl, decl)];
    if !decls.is_empty() {
        children.push(node(SyntaxKind::Prolog, decls));
    }
    node(SyntaxKind::LibraryModule, children)
}

pub fn library_module(prefix: &str, uri: &str, decls: Vec<Spec>) -> SyntaxTree {
    build(&library_module_spec(Some(prefix), Some(uri), decls))
}

// ============================================================================
// Prolog declarations
// ============================================================================

fn prefix_and_uri(kind: SyntaxKind, prefix: Option<&str>, uri: Option<&str>, hints: &[&str]) -> Spec {
    let mut children = Vec::new();
    if let Some(prefix) = prefix {
        children.push(token(SyntaxKind::NCName, prefix));
    }
    if let Some(uri) = uri {
        children.push(token(SyntaxKind::UriLiteral, uri));
    }
    children.extend(hints.iter().map(|h| token(SyntaxKind::LocationHint, h)));
    node(kind, children)
}

pub fn namespace_decl(prefix: Option<&str>, uri: Option<&str>) -> Spec {
    prefix_and_uri(SyntaxKind::NamespaceDecl, prefix, uri, &[])
}

pub fn module_import(prefix: Option<&str>, uri: Option<&str>, hints: Vec<&str>) -> Spec {
    prefix_and_uri(SyntaxKind::ModuleImport, prefix, uri, &hints)
}

/// `import schema namespace p = "uri"`
pub fn schema_import(prefix: Option<&str>, uri: Option<&str>) -> Spec {
    let mut children = vec![node(
        SyntaxKind::SchemaPrefix,
        prefix.map(|p| token(SyntaxKind::NCName, p)).into_iter().collect(),
    )];
    if let Some(uri) = uri {
        children.push(token(SyntaxKind::UriLiteral, uri));
    }
    node(SyntaxKind::SchemaImport, children)
}

/// `import schema default element namespace "uri"`
pub fn schema_import_default_element(uri: Option<&str>) -> Spec {
    let mut children = vec![node(
        SyntaxKind::SchemaPrefix,
        vec![token(SyntaxKind::DefaultNamespaceKind, "element")],
    )];
    if let Some(uri) = uri {
        children.push(token(SyntaxKind::UriLiteral, uri));
    }
    node(SyntaxKind::SchemaImport, children)
}

/// `declare default element|function namespace "uri"`
pub fn default_namespace_decl(kind: &str, uri: Option<&str>) -> Spec {
    let mut children = vec![token(SyntaxKind::DefaultNamespaceKind, kind)];
    if let Some(uri) = uri {
        children.push(token(SyntaxKind::UriLiteral, uri));
    }
    node(SyntaxKind::DefaultNamespaceDecl, children)
}

pub fn var_decl(name: &str, value: Option<Spec>) -> Spec {
    let mut children = vec![var_name(name)];
    children.extend(value);
    node(SyntaxKind::VarDecl, children)
}

pub fn param(name: &str) -> Spec {
    node(SyntaxKind::Param, vec![var_name(name)])
}

pub fn param_with_default(name: &str, default: Spec) -> Spec {
    node(SyntaxKind::Param, vec![var_name(name), default])
}

/// `declare function name(params) { body }`; a `None` body is `external`.
pub fn function_decl(name: &str, params: Vec<Spec>, body: Option<Spec>) -> Spec {
    let mut children = vec![
        token(SyntaxKind::EQName, name),
        node(SyntaxKind::ParamList, params),
    ];
    if let Some(body) = body {
        children.push(node(SyntaxKind::FunctionBody, vec![body]));
    }
    node(SyntaxKind::FunctionDecl, children)
}

// ============================================================================
// Expressions
// ============================================================================

/// `()`
pub fn empty_expr() -> Spec {
    node(SyntaxKind::ParenthesizedExpr, Vec::new())
}

pub fn num(value: &str) -> Spec {
    token(SyntaxKind::NumericLiteral, value)
}

pub fn string_lit(value: &str) -> Spec {
    token(SyntaxKind::StringLiteral, value)
}

/// Comma-separated expressions.
pub fn sequence(items: Vec<Spec>) -> Spec {
    node(SyntaxKind::Expr, items)
}

pub fn var_ref(name: &str) -> Spec {
    node(SyntaxKind::VarRef, vec![var_name(name)])
}

pub fn call(name: &str, args: Vec<Spec>) -> Spec {
    node(
        SyntaxKind::FunctionCall,
        vec![token(SyntaxKind::EQName, name), node(SyntaxKind::ArgumentList, args)],
    )
}

/// `?` in an argument list.
pub fn placeholder() -> Spec {
    node(SyntaxKind::ArgumentPlaceholder, Vec::new())
}

/// `name#arity`
pub fn named_function_ref(name: &str, arity: Option<&str>) -> Spec {
    let mut children = vec![token(SyntaxKind::EQName, name)];
    children.extend(arity.map(num));
    node(SyntaxKind::NamedFunctionRef, children)
}

/// `operand => f(args) => g(args)`
pub fn arrow(operand: Spec, steps: Vec<(&str, Vec<Spec>)>) -> Spec {
    let mut children = vec![operand];
    for (name, args) in steps {
        children.push(node(
            SyntaxKind::ArrowFunctionSpecifier,
            vec![token(SyntaxKind::EQName, name)],
        ));
        children.push(node(SyntaxKind::ArgumentList, args));
    }
    node(SyntaxKind::ArrowExpr, children)
}

/// `<name attr="value" ...>{content}</name>`; a `None` value is an
/// attribute whose value failed to parse.
pub fn element(name: &str, attrs: Vec<(&str, Option<&str>)>, content: Vec<Spec>) -> Spec {
    let attributes = attrs
        .into_iter()
        .map(|(name, value)| {
            let mut children = vec![token(SyntaxKind::AttributeName, name)];
            children.extend(value.map(|v| token(SyntaxKind::DirAttributeValue, v)));
            node(SyntaxKind::DirAttribute, children)
        })
        .collect();
    let mut children = vec![
        token(SyntaxKind::EQName, name),
        node(SyntaxKind::DirAttributeList, attributes),
    ];
    if !content.is_empty() {
        children.push(node(SyntaxKind::EnclosedExpr, content));
    }
    node(SyntaxKind::DirElemConstructor, children)
}

/// `function (params) { body }`
pub fn inline_function(params: Vec<Spec>, body: Spec) -> Spec {
    node(
        SyntaxKind::InlineFunctionExpr,
        vec![
            node(SyntaxKind::ParamList, params),
            node(SyntaxKind::FunctionBody, vec![body]),
        ],
    )
}

/// `target(args)` for a non-named target.
pub fn dynamic_call(target: Spec, args: Vec<Spec>) -> Spec {
    node(SyntaxKind::Expr, vec![target, node(SyntaxKind::ArgumentList, args)])
}

/// `block { declare ...; body }`
pub fn block(decls: Vec<Spec>, body: Spec) -> Spec {
    let mut children = decls;
    children.push(body);
    node(SyntaxKind::Block, children)
}

/// `declare $a := ..., $b := ...;` inside a block.
pub fn block_var_decl(entries: Vec<(&str, Option<Spec>)>) -> Spec {
    node(
        SyntaxKind::BlockVarDecl,
        entries
            .into_iter()
            .map(|(name, value)| {
                let mut children = vec![var_name(name)];
                children.extend(value);
                node(SyntaxKind::BlockVarDeclEntry, children)
            })
            .collect(),
    )
}

// ============================================================================
// FLWOR and other binding expressions
// ============================================================================

pub fn flwor(clauses: Vec<Spec>, return_expr: Spec) -> Spec {
    let mut children = clauses;
    children.push(node(SyntaxKind::ReturnClause, vec![return_expr]));
    node(SyntaxKind::FLWORExpr, children)
}

pub fn for_clause(bindings: Vec<Spec>) -> Spec {
    node(SyntaxKind::ForClause, bindings)
}

/// `$name at $positional in expr`
pub fn for_binding(name: &str, positional: Option<&str>, expr: Spec) -> Spec {
    let mut children = vec![var_name(name)];
    children.extend(positional.map(|p| node(SyntaxKind::PositionalVar, vec![var_name(p)])));
    children.push(expr);
    node(SyntaxKind::ForBinding, children)
}

pub fn let_clause(bindings: Vec<Spec>) -> Spec {
    node(SyntaxKind::LetClause, bindings)
}

pub fn let_binding(name: &str, expr: Spec) -> Spec {
    node(SyntaxKind::LetBinding, vec![var_name(name), expr])
}

/// `for tumbling|sliding window $name in expr start ... end ...`
pub fn window_clause(kind: SyntaxKind, name: &str, expr: Spec, start: Spec, end: Option<Spec>) -> Spec {
    let mut children = vec![var_name(name), expr, start];
    children.extend(end);
    node(kind, children)
}

/// `start|end $current at $positional previous $previous next $next when expr`
pub fn window_condition(
    kind: SyntaxKind,
    current: Option<&str>,
    positional: Option<&str>,
    previous: Option<&str>,
    next: Option<&str>,
    when: Spec,
) -> Spec {
    let vars = [
        (SyntaxKind::CurrentItem, current),
        (SyntaxKind::PositionalVar, positional),
        (SyntaxKind::PreviousItem, previous),
        (SyntaxKind::NextItem, next),
    ]
    .into_iter()
    .filter_map(|(kind, name)| name.map(|n| node(kind, vec![var_name(n)])))
    .collect();
    node(kind, vec![node(SyntaxKind::WindowVars, vars), when])
}

pub fn count_clause(name: &str) -> Spec {
    node(SyntaxKind::CountClause, vec![var_name(name)])
}

pub fn group_by(specs: Vec<Spec>) -> Spec {
    node(SyntaxKind::GroupByClause, specs)
}

/// `$name` or `$name := expr`
pub fn grouping_spec(name: &str, value: Option<Spec>) -> Spec {
    let mut children = vec![var_name(name)];
    children.extend(value);
    node(SyntaxKind::GroupingSpec, children)
}

pub fn where_clause(expr: Spec) -> Spec {
    node(SyntaxKind::WhereClause, vec![expr])
}

pub fn order_by(expr: Spec) -> Spec {
    node(SyntaxKind::OrderByClause, vec![expr])
}

/// `some $a in ..., $b in ... satisfies expr`
pub fn quantified(bindings: Vec<Spec>, satisfies: Spec) -> Spec {
    let mut children = bindings;
    children.push(satisfies);
    node(SyntaxKind::QuantifiedExpr, children)
}

pub fn quantified_binding(name: &str, expr: Spec) -> Spec {
    node(SyntaxKind::QuantifiedBinding, vec![var_name(name), expr])
}

pub fn typeswitch(operand: Spec, cases: Vec<Spec>, default: Spec) -> Spec {
    let mut children = vec![operand];
    children.extend(cases);
    children.push(default);
    node(SyntaxKind::TypeswitchExpr, children)
}

/// `case $name as type return expr`
pub fn typeswitch_case(name: Option<&str>, type_name: &str, expr: Spec) -> Spec {
    let mut children: Vec<Spec> = name.map(var_name).into_iter().collect();
    children.push(node(
        SyntaxKind::SequenceType,
        vec![token(SyntaxKind::EQName, type_name)],
    ));
    children.push(expr);
    node(SyntaxKind::TypeswitchCase, children)
}

pub fn typeswitch_default(name: Option<&str>, expr: Spec) -> Spec {
    let mut children: Vec<Spec> = name.map(var_name).into_iter().collect();
    children.push(expr);
    node(SyntaxKind::TypeswitchDefault, children)
}

// ============================================================================
// Finders
// ============================================================================

/// First node of `kind` in document order.
pub fn find_kind(tree: &SyntaxTree, kind: SyntaxKind) -> Node<'_> {
    tree.root()
        .descendants()
        .find(|n| n.kind() == kind)
        .unwrap_or_else(|| panic!("no {kind:?} node in fixture"))
}

/// First `kind` token whose text is `text`.
pub fn find_token<'t>(tree: &'t SyntaxTree, kind: SyntaxKind, text: &str) -> Node<'t> {
    tree.root()
        .descendants()
        .find(|n| n.kind() == kind && n.text() == Some(text))
        .unwrap_or_else(|| panic!("no {kind:?} {text:?} token in fixture"))
}
