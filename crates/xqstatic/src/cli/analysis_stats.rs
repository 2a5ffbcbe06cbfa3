// cli/analysis_stats.rs - `xqstatic analysis-stats` subcommand
//
// Loads a syntax tree and reports timing metrics for each resolver, run
// over every node of the tree.
//
// Phases measured:
//   1. load: reading and building the tree and library modules
//   2. namespaces: statically known namespaces at every node
//   3. defaults: default element/type and function namespaces
//   4. variables: in-scope variables at every node
//   5. functions: function candidates at every call-like site

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Context;

use super::{load_modules, CommonArgs};
use crate::context::StaticContext;
use crate::modules::ModuleRegistry;
use crate::perf::TimingGuard;
use crate::syntax::{NodeId, SyntaxTree};

/// Parsed arguments for the `analysis-stats` subcommand.
#[derive(Debug)]
pub struct AnalysisStatsArgs {
    pub path: PathBuf,
    pub csv: bool,
    pub only: Option<String>,
    pub common: CommonArgs,
}

/// Result of running a single analysis phase.
pub struct PhaseResult {
    pub name: String,
    pub duration: Duration,
    pub peak_rss_bytes: Option<u64>,
    pub detail: String,
}

/// All valid phase names.
const VALID_PHASES: &[&str] = &["load", "namespaces", "defaults", "variables", "functions"];

/// Parse `analysis-stats` arguments from the remaining CLI args.
///
/// Expected usage: `xqstatic analysis-stats <tree.json> [--csv] [--only <phase>]`
pub fn parse_args(args: &mut impl Iterator<Item = String>) -> Result<AnalysisStatsArgs, String> {
    let mut path: Option<PathBuf> = None;
    let mut csv = false;
    let mut only: Option<String> = None;
    let mut common = CommonArgs::default();

    while let Some(arg) = args.next() {
        if common.parse_flag(&arg, args)? {
            continue;
        }
        match arg.as_str() {
            "--csv" => csv = true,
            "--only" => {
                let phase = args
                    .next()
                    .ok_or_else(|| "--only requires a phase name".to_string())?;
                if !VALID_PHASES.contains(&phase.as_str()) {
                    return Err(format!(
                        "Unknown phase '{}'. Valid phases: {}",
                        phase,
                        VALID_PHASES.join(", ")
                    ));
                }
                only = Some(phase);
            }
            other if other.starts_with('-') => {
                return Err(format!("Unknown flag: '{}'", other));
            }
            _ => {
                if path.is_some() {
                    return Err("Multiple paths provided; expected exactly one".to_string());
                }
                path = Some(PathBuf::from(arg));
            }
        }
    }

    let path = path.ok_or_else(|| "Missing required <tree.json> argument".to_string())?;
    if !path.exists() {
        return Err(format!("Path does not exist: {}", path.display()));
    }

    Ok(AnalysisStatsArgs {
        path,
        csv,
        only,
        common,
    })
}

fn phase(name: &str, start: Instant, detail: String) -> PhaseResult {
    PhaseResult {
        name: name.to_string(),
        duration: start.elapsed(),
        peak_rss_bytes: crate::perf::peak_rss_bytes(),
        detail,
    }
}

/// Run the analysis-stats command and return phase results.
pub fn run_analysis_stats(args: &AnalysisStatsArgs) -> anyhow::Result<Vec<PhaseResult>> {
    let mut results = Vec::new();

    let should_run = |phase: &str| -> bool {
        args.only.as_ref().map_or(true, |only| only == phase)
    };

    // Phase 1: Load - the tree and any library modules. Always needed.
    let config = args.common.resolver_config()?;
    let start = Instant::now();
    let (tree, modules) = {
        let _guard = TimingGuard::new("analysis-stats:load");
        let json = std::fs::read_to_string(&args.path)
            .with_context(|| format!("Failed to read {}", args.path.display()))?;
        let tree = SyntaxTree::from_json_str(&json)?;
        let modules: ModuleRegistry = load_modules(&config)?;
        (tree, modules)
    };
    if should_run("load") {
        let caching = match config.cache_capacity {
            0 => "cache disabled".to_string(),
            n => format!("cache capacity {n}"),
        };
        results.push(phase(
            "load",
            start,
            format!("{} nodes, {} library modules, {}", tree.len(), modules.len(), caching),
        ));
    }

    let cache = config.new_cache();
    let ctx = StaticContext::new(&tree, config.dialect)
        .with_modules(&modules)
        .with_cache(cache.as_ref());
    let all_nodes: Vec<NodeId> = tree.root().descendants().map(|n| n.id()).collect();

    // Phase 2: Namespaces
    if should_run("namespaces") {
        let _guard = TimingGuard::new("analysis-stats:namespaces");
        let start = Instant::now();
        let bindings: usize = ctx.namespaces_batch(&all_nodes).iter().map(|b| b.len()).sum();
        results.push(phase(
            "namespaces",
            start,
            format!("{} nodes, {} bindings", all_nodes.len(), bindings),
        ));
    }

    // Phase 3: Defaults
    if should_run("defaults") {
        let _guard = TimingGuard::new("analysis-stats:defaults");
        let start = Instant::now();
        let mut overridden = 0usize;
        for &id in &all_nodes {
            let element = ctx.default_element_namespace(id);
            let function = ctx.default_function_namespace(id);
            if element.len() > 1 || function.len() > 1 {
                overridden += 1;
            }
        }
        results.push(phase(
            "defaults",
            start,
            format!("{} nodes, {} with declared defaults", all_nodes.len(), overridden),
        ));
    }

    // Phase 4: Variables
    if should_run("variables") {
        let _guard = TimingGuard::new("analysis-stats:variables");
        let start = Instant::now();
        let batch = ctx.in_scope_variables_batch(&all_nodes);
        let total: usize = batch.iter().map(|v| v.len()).sum();
        let max = batch.iter().map(|v| v.len()).max().unwrap_or(0);
        results.push(phase(
            "variables",
            start,
            format!("{} nodes, {} bindings, at most {} at one node", all_nodes.len(), total, max),
        ));
    }

    // Phase 5: Functions - call-like sites only
    if should_run("functions") {
        let _guard = TimingGuard::new("analysis-stats:functions");
        let start = Instant::now();
        let sites: Vec<NodeId> = tree
            .root()
            .descendants()
            .filter(|n| n.kind().is_call_site())
            .map(|n| n.id())
            .collect();
        let candidates = ctx.statically_known_functions_batch(&sites);
        let unresolved = candidates.iter().filter(|c| c.is_empty()).count();
        let total: usize = candidates.iter().map(|c| c.len()).sum();
        results.push(phase(
            "functions",
            start,
            format!("{} call sites, {} candidates, {} unresolved", sites.len(), total, unresolved),
        ));
    }

    Ok(results)
}

/// Print phase results in human-readable format.
pub fn print_results(results: &[PhaseResult]) {
    println!("=== xqstatic Analysis Stats ===\n");
    for result in results {
        let rss_str = match result.peak_rss_bytes {
            Some(bytes) => format_bytes(bytes),
            None => "N/A".to_string(),
        };
        println!(
            "  {:<12} {:>10.2?}   RSS: {:<10}  ({})",
            result.name, result.duration, rss_str, result.detail
        );
    }

    if results.len() > 1 {
        let total: Duration = results.iter().map(|r| r.duration).sum();
        println!("\n  {:<12} {:>10.2?}", "TOTAL", total);
    }
    println!();
}

/// Print phase results in CSV format.
pub fn print_results_csv(results: &[PhaseResult]) {
    println!("phase,duration_ms,peak_rss_bytes,detail");
    for result in results {
        let rss = result
            .peak_rss_bytes
            .map_or(String::new(), |b| b.to_string());
        println!(
            "{},{:.3},{},\"{}\"",
            result.name,
            result.duration.as_secs_f64() * 1000.0,
            rss,
            result.detail.replace('"', "\"\"")
        );
    }
}

/// Format a byte count as a human-readable string (e.g., "12.3 MB").
fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;
    const GB: u64 = 1024 * MB;
    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fixture_query::{create_fixture_file, FixtureConfig};

    fn args_for(path: &std::path::Path, only: Option<&str>) -> AnalysisStatsArgs {
        AnalysisStatsArgs {
            path: path.to_path_buf(),
            csv: false,
            only: only.map(str::to_string),
            common: CommonArgs::default(),
        }
    }

    #[test]
    fn test_parse_args_flags() {
        let (_dir, path) = create_fixture_file(&FixtureConfig::small());
        let mut args = vec![
            path.to_string_lossy().into_owned(),
            "--csv".to_string(),
            "--only".to_string(),
            "variables".to_string(),
            "--xquery-version".to_string(),
            "3.0".to_string(),
        ]
        .into_iter();
        let result = parse_args(&mut args).unwrap();
        assert!(result.csv);
        assert_eq!(result.only.as_deref(), Some("variables"));
        assert!(result.common.version.is_some());
    }

    #[test]
    fn test_parse_args_errors() {
        let mut args = vec!["--csv".to_string()].into_iter();
        assert!(parse_args(&mut args).unwrap_err().contains("Missing required"));

        let mut args = vec![".".to_string(), "--only".to_string(), "parse".to_string()].into_iter();
        assert!(parse_args(&mut args).unwrap_err().contains("Unknown phase"));

        let mut args = vec![".".to_string(), "--only".to_string()].into_iter();
        assert!(parse_args(&mut args)
            .unwrap_err()
            .contains("--only requires a phase name"));

        let mut args = vec!["/nonexistent/tree.json".to_string()].into_iter();
        assert!(parse_args(&mut args).unwrap_err().contains("does not exist"));
    }

    #[test]
    fn test_run_all_phases() {
        let (_dir, path) = create_fixture_file(&FixtureConfig::small());
        let results = run_analysis_stats(&args_for(&path, None)).unwrap();
        let names: Vec<_> = results.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, VALID_PHASES);
        assert!(results[4].detail.contains("1 unresolved"));
    }

    #[test]
    fn test_zero_cache_capacity_runs_uncached() {
        let (dir, path) = create_fixture_file(&FixtureConfig::small());
        let config = dir.path().join("xqstatic.json");
        std::fs::write(&config, r#"{"cacheCapacity": 0}"#).unwrap();

        let mut args = args_for(&path, None);
        args.common.config = Some(config);
        let results = run_analysis_stats(&args).unwrap();
        assert!(results[0].detail.ends_with("cache disabled"));
        // Same answers as the cached run.
        let cached = run_analysis_stats(&args_for(&path, None)).unwrap();
        assert!(cached[0].detail.ends_with("cache capacity 4096"));
        for (a, b) in results.iter().zip(&cached).skip(1) {
            assert_eq!(a.detail, b.detail);
        }
    }

    #[test]
    fn test_run_only_one_phase() {
        let (_dir, path) = create_fixture_file(&FixtureConfig::small());
        let results = run_analysis_stats(&args_for(&path, Some("namespaces"))).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "namespaces");
    }

    #[test]
    fn test_invalid_tree_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("tree.json");
        std::fs::write(&path, "[]").unwrap();
        assert!(run_analysis_stats(&args_for(&path, None)).is_err());
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MB");
    }
}
