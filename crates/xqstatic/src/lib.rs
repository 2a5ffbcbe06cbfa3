// lib.rs - Static context resolution for XQuery syntax trees.
//
// The resolvers answer, for any node of a parsed query, which namespace
// prefixes, default namespaces, variables and functions are statically
// known there. The binary in main.rs wraps them in a small CLI.

pub mod builtins;
pub mod cache;
pub mod cli;
pub mod config;
pub mod context;
pub mod dialect;
pub mod functions;
pub mod modules;
pub mod namespaces;
pub mod perf;
pub mod predefined;
pub mod qname;
pub mod syntax;
pub mod variables;

// test_utils is available in test builds and when the `test-support` feature is enabled.
// This allows benchmarks and integration tests to import directly instead of #[path] hacks.
#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;


pub use context::{StaticContext, StaticContextSummary};
pub use dialect::{DialectConfig, LanguageVersion, VendorProfile};
pub use syntax::{Node, NodeId, SyntaxKind, SyntaxTree};
