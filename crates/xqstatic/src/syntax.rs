//
// syntax.rs
//
// Immutable arena syntax tree consumed by the static context resolvers
//

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{anyhow, bail, Context};
use serde::{Deserialize, Serialize};

/// Every tree snapshot gets a fresh generation so caches keyed by node id
/// never serve results computed for an older tree.
static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

/// Index of a node inside its [`SyntaxTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u32);

impl NodeId {
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u32 {
        self.0
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ============================================================================
// Node kinds
// ============================================================================

/// Closed set of construct kinds produced by the parser.
///
/// The child layout noted on each variant is the contract the resolvers rely
/// on. Optional parts that the source omits (or that failed to parse) are
/// simply absent children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SyntaxKind {
    // Modules and prolog
    /// `ModuleDecl? Prolog? QueryBody?`
    MainModule,
    /// `ModuleDecl Prolog?`
    LibraryModule,
    /// `NCName? UriLiteral?`
    ModuleDecl,
    /// Declarations in document order.
    Prolog,
    QueryBody,
    /// `NCName? UriLiteral?`
    NamespaceDecl,
    /// `DefaultNamespaceKind UriLiteral?`
    DefaultNamespaceDecl,
    /// Token text is `element` or `function`.
    DefaultNamespaceKind,
    /// `SchemaPrefix? UriLiteral? LocationHint*`
    SchemaImport,
    /// `NCName` for `namespace p =`, or `DefaultNamespaceKind` for
    /// `default element namespace`.
    SchemaPrefix,
    /// `NCName? UriLiteral? LocationHint*`
    ModuleImport,
    LocationHint,
    /// `VarName TypeDeclaration? Expr?`
    VarDecl,
    /// `EQName ParamList? TypeDeclaration? FunctionBody?`
    FunctionDecl,
    ParamList,
    /// `VarName TypeDeclaration? Expr?` (the expression is a default value)
    Param,
    FunctionBody,
    TypeDeclaration,
    OptionDecl,

    // Direct constructors
    /// `EQName DirAttributeList? content*`
    DirElemConstructor,
    DirAttributeList,
    /// `AttributeName DirAttributeValue?`
    DirAttribute,
    AttributeName,
    DirAttributeValue,
    EnclosedExpr,

    // FLWOR
    /// Clauses in document order, ending with `ReturnClause`.
    FLWORExpr,
    ForClause,
    /// `VarName PositionalVar? TypeDeclaration? Expr`
    ForBinding,
    LetClause,
    /// `VarName TypeDeclaration? Expr`
    LetBinding,
    /// `VarName`
    PositionalVar,
    /// `VarName TypeDeclaration? Expr WindowStartCondition WindowEndCondition?`
    TumblingWindowClause,
    SlidingWindowClause,
    /// `WindowVars Expr`
    WindowStartCondition,
    WindowEndCondition,
    /// `CurrentItem? PositionalVar? PreviousItem? NextItem?`
    WindowVars,
    CurrentItem,
    PreviousItem,
    NextItem,
    WhereClause,
    /// `GroupingSpec+`
    GroupByClause,
    /// `VarName TypeDeclaration? Expr?`
    GroupingSpec,
    OrderByClause,
    /// `VarName`
    CountClause,
    ReturnClause,

    // Other binding expressions
    /// `QuantifiedBinding+ Expr`
    QuantifiedExpr,
    /// `VarName TypeDeclaration? Expr`
    QuantifiedBinding,
    /// `Expr TypeswitchCase+ TypeswitchDefault`
    TypeswitchExpr,
    /// `VarName? SequenceType+ Expr`
    TypeswitchCase,
    /// `VarName? Expr`
    TypeswitchDefault,
    SequenceType,
    /// `ParamList? TypeDeclaration? FunctionBody`
    InlineFunctionExpr,
    /// `BlockVarDecl* Expr?`
    Block,
    /// `BlockVarDeclEntry+`
    BlockVarDecl,
    /// `VarName TypeDeclaration? Expr?`
    BlockVarDeclEntry,

    // Call-like sites
    /// `EQName ArgumentList`
    FunctionCall,
    /// Arguments in order; placeholders are `ArgumentPlaceholder`.
    ArgumentList,
    ArgumentPlaceholder,
    /// `EQName NumericLiteral?`
    NamedFunctionRef,
    /// `Expr (ArrowFunctionSpecifier ArgumentList)+`
    ArrowExpr,
    /// `EQName`
    ArrowFunctionSpecifier,

    // Generic expressions (no scoping effect)
    Expr,
    ParenthesizedExpr,
    IfExpr,
    PathExpr,
    VarRef,
    ContextItemExpr,

    // Tokens
    NCName,
    /// Lexical QName or `Q{uri}local`.
    EQName,
    /// Variable name, lexical QName or `Q{uri}local`.
    VarName,
    /// Unquoted URI value.
    UriLiteral,
    StringLiteral,
    NumericLiteral,

    /// Parser recovery node.
    Error,
}

impl SyntaxKind {
    pub fn is_module(self) -> bool {
        matches!(self, SyntaxKind::MainModule | SyntaxKind::LibraryModule)
    }

    /// Kinds naming a function at a call-like site.
    pub fn is_call_site(self) -> bool {
        matches!(
            self,
            SyntaxKind::FunctionCall
                | SyntaxKind::NamedFunctionRef
                | SyntaxKind::ArrowFunctionSpecifier
        )
    }
}

// ============================================================================
// Tree storage
// ============================================================================

#[derive(Debug, Clone)]
struct NodeData {
    kind: SyntaxKind,
    text: Option<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// Position among the parent's children.
    slot: u32,
}

/// An immutable syntax tree snapshot.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    nodes: Vec<NodeData>,
    root: NodeId,
    generation: u64,
}

impl SyntaxTree {
    pub fn root(&self) -> Node<'_> {
        Node {
            tree: self,
            id: self.root,
        }
    }

    pub fn node(&self, id: NodeId) -> Option<Node<'_>> {
        (id.index() < self.nodes.len()).then_some(Node { tree: self, id })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Build a tree from a nested node description.
    pub fn from_spec(spec: &SyntaxNodeSpec) -> anyhow::Result<Self> {
        let mut builder = SyntaxTreeBuilder::new();
        push_spec(&mut builder, spec)?;
        builder.finish()
    }

    /// Parse a JSON tree description.
    ///
    /// A top-level array is a flat preorder node list (see
    /// [`SyntaxNodeEntry`]); a top-level object is a nested
    /// [`SyntaxNodeSpec`]. The nested form is limited by serde_json's
    /// recursion limit (about 60 node levels), the flat form is not.
    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        if json.trim_start().starts_with('[') {
            let entries: Vec<SyntaxNodeEntry> =
                serde_json::from_str(json).context("Invalid syntax tree node list")?;
            return Self::from_node_list(&entries);
        }
        let spec: SyntaxNodeSpec =
            serde_json::from_str(json).context("Invalid syntax tree JSON")?;
        Self::from_spec(&spec)
    }

    /// Build a tree from a flat preorder node list.
    ///
    /// The first entry is the root and has no parent. Every other entry names
    /// its parent by list index, which must be an earlier node that is still
    /// open: the root or an ancestor of the previous entry.
    pub fn from_node_list(entries: &[SyntaxNodeEntry]) -> anyhow::Result<Self> {
        let mut builder = SyntaxTreeBuilder::new();
        for (index, entry) in entries.iter().enumerate() {
            match entry.parent {
                None if index > 0 => {
                    bail!("Node {} has no parent; only the first node is the root", index)
                }
                None => {}
                Some(parent) => {
                    let parent = NodeId(parent);
                    while builder.open.last() != Some(&parent) {
                        if builder.open.pop().is_none() {
                            bail!(
                                "Node {} names parent {}, which is not an open ancestor",
                                index,
                                parent
                            );
                        }
                    }
                }
            }
            match &entry.text {
                Some(text) => builder.token(entry.kind, text.as_str()),
                None => builder.start_node(entry.kind),
            };
        }
        builder.open.clear();
        builder.finish()
    }

    /// Flat preorder node list, the inverse of [`SyntaxTree::from_node_list`].
    pub fn to_node_list(&self) -> Vec<SyntaxNodeEntry> {
        let mut position: Vec<Option<u32>> = vec![None; self.nodes.len()];
        let mut entries = Vec::with_capacity(self.nodes.len());
        for node in self.root().descendants() {
            position[node.id.index()] = Some(entries.len() as u32);
            entries.push(SyntaxNodeEntry {
                kind: node.kind(),
                text: node.text().map(str::to_string),
                parent: node.parent().and_then(|p| position[p.id.index()]),
            });
        }
        entries
    }

    /// JSON node list, readable by [`SyntaxTree::from_json_str`] at any depth.
    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string(&self.to_node_list())?)
    }

    /// Nested description of this tree, the inverse of [`SyntaxTree::from_spec`].
    pub fn to_spec(&self) -> SyntaxNodeSpec {
        // Children follow their parent in preorder, so walking the preorder
        // backwards finds every child already described.
        let preorder: Vec<Node<'_>> = self.root().descendants().collect();
        let mut described: Vec<Option<SyntaxNodeSpec>> = vec![None; self.nodes.len()];
        for node in preorder.into_iter().rev() {
            let children = node
                .children()
                .filter_map(|c| described[c.id.index()].take())
                .collect();
            described[node.id.index()] = Some(SyntaxNodeSpec {
                kind: node.kind(),
                text: node.text().map(str::to_string),
                children,
            });
        }
        described[self.root.index()]
            .take()
            .unwrap_or_else(|| SyntaxNodeSpec::node(self.root().kind(), Vec::new()))
    }

    fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.index()]
    }
}

fn push_spec(builder: &mut SyntaxTreeBuilder, root: &SyntaxNodeSpec) -> anyhow::Result<()> {
    let mut pending: Vec<std::slice::Iter<'_, SyntaxNodeSpec>> = Vec::new();
    let mut next = Some(root);
    loop {
        if let Some(spec) = next.take() {
            if spec.children.is_empty() {
                match &spec.text {
                    Some(text) => builder.token(spec.kind, text.as_str()),
                    None => builder.empty(spec.kind),
                };
            } else {
                if spec.text.is_some() {
                    bail!("{:?} node carries both text and children", spec.kind);
                }
                builder.start_node(spec.kind);
                pending.push(spec.children.iter());
            }
        }
        let Some(children) = pending.last_mut() else {
            return Ok(());
        };
        match children.next() {
            Some(child) => next = Some(child),
            None => {
                pending.pop();
                builder.finish_node()?;
            }
        }
    }
}

/// One node of the flat JSON form, in preorder.
///
/// ```json
/// [ { "kind": "FunctionCall" },
///   { "kind": "EQName", "text": "fn:true", "parent": 0 },
///   { "kind": "ArgumentList", "parent": 0 } ]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntaxNodeEntry {
    pub kind: SyntaxKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<u32>,
}

/// Serializable nested description of a syntax node.
///
/// ```json
/// { "kind": "FunctionCall", "children": [
///     { "kind": "EQName", "text": "fn:true" },
///     { "kind": "ArgumentList" } ] }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntaxNodeSpec {
    pub kind: SyntaxKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SyntaxNodeSpec>,
}

impl SyntaxNodeSpec {
    pub fn node(kind: SyntaxKind, children: Vec<SyntaxNodeSpec>) -> Self {
        Self {
            kind,
            text: None,
            children,
        }
    }

    pub fn token(kind: SyntaxKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: Some(text.into()),
            children: Vec::new(),
        }
    }
}

/// Preorder builder used by parsers to emit a [`SyntaxTree`].
///
/// Nodes are opened with [`start_node`](Self::start_node) and closed with
/// [`finish_node`](Self::finish_node); leaves are added with
/// [`token`](Self::token) or [`empty`](Self::empty).
#[derive(Debug, Default)]
pub struct SyntaxTreeBuilder {
    nodes: Vec<NodeData>,
    open: Vec<NodeId>,
    root: Option<NodeId>,
}

impl SyntaxTreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_node(&mut self, kind: SyntaxKind) -> NodeId {
        let id = self.push(kind, None);
        self.open.push(id);
        id
    }

    pub fn finish_node(&mut self) -> anyhow::Result<NodeId> {
        self.open
            .pop()
            .ok_or_else(|| anyhow!("finish_node called with no open node"))
    }

    pub fn token(&mut self, kind: SyntaxKind, text: impl Into<String>) -> NodeId {
        self.push(kind, Some(text.into()))
    }

    /// A leaf without text (e.g. `ArgumentList` for `f()`).
    pub fn empty(&mut self, kind: SyntaxKind) -> NodeId {
        self.push(kind, None)
    }

    pub fn finish(self) -> anyhow::Result<SyntaxTree> {
        if let Some(open) = self.open.last() {
            bail!(
                "Unclosed {:?} node at {}",
                self.nodes[open.index()].kind,
                open
            );
        }
        let root = self.root.ok_or_else(|| anyhow!("Empty syntax tree"))?;
        Ok(SyntaxTree {
            nodes: self.nodes,
            root,
            generation: NEXT_GENERATION.fetch_add(1, Ordering::Relaxed),
        })
    }

    fn push(&mut self, kind: SyntaxKind, text: Option<String>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        let parent = self.open.last().copied();
        let slot = match parent {
            Some(p) => {
                let siblings = &mut self.nodes[p.index()].children;
                siblings.push(id);
                (siblings.len() - 1) as u32
            }
            None => {
                if self.root.is_some() {
                    log::warn!("Second top-level {:?} node ignored as root", kind);
                } else {
                    self.root = Some(id);
                }
                0
            }
        };
        self.nodes.push(NodeData {
            kind,
            text,
            parent,
            children: Vec::new(),
            slot,
        });
        id
    }
}

// ============================================================================
// Node handles
// ============================================================================

/// Borrowed handle to a node of a [`SyntaxTree`].
#[derive(Clone, Copy)]
pub struct Node<'t> {
    tree: &'t SyntaxTree,
    id: NodeId,
}

impl PartialEq for Node<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.id == other.id
    }
}

impl Eq for Node<'_> {}

impl fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.text() {
            Some(text) => write!(f, "{:?}{} {:?}", self.kind(), self.id, text),
            None => write!(f, "{:?}{}", self.kind(), self.id),
        }
    }
}

impl<'t> Node<'t> {
    pub fn id(self) -> NodeId {
        self.id
    }

    pub fn tree(self) -> &'t SyntaxTree {
        self.tree
    }

    pub fn kind(self) -> SyntaxKind {
        self.tree.data(self.id).kind
    }

    pub fn text(self) -> Option<&'t str> {
        self.tree.data(self.id).text.as_deref()
    }

    pub fn parent(self) -> Option<Node<'t>> {
        let tree = self.tree;
        tree.data(self.id).parent.map(|id| Node { tree, id })
    }

    pub fn children(self) -> impl DoubleEndedIterator<Item = Node<'t>> + 't {
        let tree = self.tree;
        tree.data(self.id)
            .children
            .iter()
            .map(move |&id| Node { tree, id })
    }

    pub fn child_of_kind(self, kind: SyntaxKind) -> Option<Node<'t>> {
        self.children().find(|c| c.kind() == kind)
    }

    pub fn children_of_kind(self, kind: SyntaxKind) -> impl Iterator<Item = Node<'t>> + 't {
        self.children().filter(move |c| c.kind() == kind)
    }

    pub fn last_child(self) -> Option<Node<'t>> {
        self.children().next_back()
    }

    /// Siblings before this node, nearest first.
    pub fn preceding_siblings(self) -> impl Iterator<Item = Node<'t>> + 't {
        let tree = self.tree;
        let data = tree.data(self.id);
        let siblings: &'t [NodeId] = match data.parent {
            Some(p) => &tree.data(p).children[..data.slot as usize],
            None => &[],
        };
        siblings.iter().rev().map(move |&id| Node { tree, id })
    }

    pub fn next_sibling(self) -> Option<Node<'t>> {
        let tree = self.tree;
        let data = tree.data(self.id);
        let parent = data.parent?;
        tree.data(parent)
            .children
            .get(data.slot as usize + 1)
            .map(|&id| Node { tree, id })
    }

    /// This node followed by its ancestors up to the root.
    pub fn self_and_ancestors(self) -> impl Iterator<Item = Node<'t>> + 't {
        std::iter::successors(Some(self), |n| n.parent())
    }

    /// The enclosing `MainModule` or `LibraryModule`.
    pub fn module(self) -> Option<Node<'t>> {
        self.self_and_ancestors().find(|n| n.kind().is_module())
    }

    /// Preorder traversal of this node and its descendants.
    pub fn descendants(self) -> impl Iterator<Item = Node<'t>> + 't {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let next = stack.pop()?;
            stack.extend(next.children().rev());
            Some(next)
        })
    }

    /// True when `other` is this node or lies beneath it.
    pub fn contains(self, other: Node<'t>) -> bool {
        other.self_and_ancestors().any(|n| n == self)
    }
}
