// cli/query.rs - `xqstatic query` subcommand
//
// Loads a syntax tree from JSON and prints the static context at one node
// as JSON.
//
// Usage: xqstatic query <tree.json> <node-id> [--what <section>]
//            [--implementation <id>] [--xquery-version <v>]
//            [--config <file>] [--module <file>]...

use std::path::PathBuf;

use anyhow::Context;
use serde_json::{json, Value};

use super::{load_modules, CommonArgs};
use crate::context::StaticContext;
use crate::perf::TimingGuard;
use crate::syntax::{NodeId, SyntaxTree};

/// Sections `--what` can select.
const VALID_SECTIONS: &[&str] = &[
    "all",
    "namespaces",
    "default-element-namespace",
    "default-function-namespace",
    "variables",
    "functions",
    "applicable-functions",
    "expand",
];

#[derive(Debug)]
pub struct QueryArgs {
    pub tree: PathBuf,
    pub node: NodeId,
    pub what: String,
    pub common: CommonArgs,
}

/// Node ids may be written `12` or `#12`.
fn parse_node_id(s: &str) -> Result<NodeId, String> {
    s.trim_start_matches('#')
        .parse::<u32>()
        .map(NodeId::from_raw)
        .map_err(|_| format!("Invalid node id: '{s}'"))
}

pub fn parse_args(args: &mut impl Iterator<Item = String>) -> Result<QueryArgs, String> {
    let mut positional: Vec<String> = Vec::new();
    let mut what = "all".to_string();
    let mut common = CommonArgs::default();

    while let Some(arg) = args.next() {
        if common.parse_flag(&arg, args)? {
            continue;
        }
        match arg.as_str() {
            "--what" => {
                let section = args
                    .next()
                    .ok_or_else(|| "--what requires a section name".to_string())?;
                if !VALID_SECTIONS.contains(&section.as_str()) {
                    return Err(format!(
                        "Unknown section '{}'. Valid sections: {}",
                        section,
                        VALID_SECTIONS.join(", ")
                    ));
                }
                what = section;
            }
            other if other.starts_with('-') && other.len() > 1 => {
                return Err(format!("Unknown flag: '{}'", other));
            }
            _ => positional.push(arg),
        }
    }

    let mut positional = positional.into_iter();
    let tree = positional
        .next()
        .map(PathBuf::from)
        .ok_or_else(|| "Missing required <tree.json> argument".to_string())?;
    let node = positional
        .next()
        .ok_or_else(|| "Missing required <node-id> argument".to_string())
        .and_then(|s| parse_node_id(&s))?;
    if positional.next().is_some() {
        return Err("Too many arguments; expected <tree.json> <node-id>".to_string());
    }

    Ok(QueryArgs {
        tree,
        node,
        what,
        common,
    })
}

/// Resolve the requested sections and return them as JSON.
pub fn run_query(args: &QueryArgs) -> anyhow::Result<Value> {
    let _guard = TimingGuard::new("query");
    let config = args.common.resolver_config()?;

    let json = std::fs::read_to_string(&args.tree)
        .with_context(|| format!("Failed to read {}", args.tree.display()))?;
    let tree = SyntaxTree::from_json_str(&json)
        .with_context(|| format!("Failed to load syntax tree from {}", args.tree.display()))?;
    if tree.node(args.node).is_none() {
        anyhow::bail!("Node {} is not in the tree ({} nodes)", args.node, tree.len());
    }

    let modules = load_modules(&config)?;
    let cache = config.new_cache();
    let ctx = StaticContext::new(&tree, config.dialect)
        .with_modules(&modules)
        .with_cache(cache.as_ref());

    let id = args.node;
    let value = match args.what.as_str() {
        "namespaces" => serde_json::to_value(&*ctx.namespaces(id))?,
        "default-element-namespace" => serde_json::to_value(ctx.default_element_namespace(id))?,
        "default-function-namespace" => serde_json::to_value(ctx.default_function_namespace(id))?,
        "variables" => serde_json::to_value(&*ctx.in_scope_variables(id))?,
        "functions" => serde_json::to_value(ctx.statically_known_functions(id))?,
        "applicable-functions" => json!({
            "call_arity": ctx.call_arity(id),
            "functions": ctx.applicable_functions(id),
        }),
        "expand" => serde_json::to_value(ctx.expand_qname(id))?,
        _ => serde_json::to_value(ctx.summary(id))?,
    };
    Ok(value)
}
