//
// main.rs
//
// Command-line entry point for xqstatic
//

use std::env;

use xqstatic::cli::{analysis_stats, query};

fn print_usage() {
    println!(
        "xqstatic {}, static context resolution for XQuery syntax trees.",
        env!("CARGO_PKG_VERSION")
    );
    print!(
        r#"
Usage: xqstatic <COMMAND> [OPTIONS]

Commands:

query <tree.json> <node-id>      Print the static context at a node as JSON
    --what <section>             all, namespaces, default-element-namespace,
                                 default-function-namespace, variables,
                                 functions, applicable-functions, expand
analysis-stats <tree.json>       Time each resolver over every node
    --csv                        Print results as CSV
    --only <phase>               load, namespaces, defaults, variables, functions

Shared options:

--implementation <id>            w3c, marklogic/v6 .. marklogic/v10, basex,
                                 saxon, exist-db
--xquery-version <version>       1.0, 3.0, 3.1, 4.0, 0.9-ml, 1.0-ml
--config <file>                  JSON settings file
--module <file>                  Library module tree (repeatable)

--version                        Print the version
--help                           Print this help message

Set XQSTATIC_PERF=1 (or verbose) to log timings.

"#
    );
}

fn main() -> anyhow::Result<()> {
    let mut argv = env::args();
    argv.next(); // skip executable name

    let Some(command) = argv.next() else {
        print_usage();
        return Ok(());
    };

    env_logger::init();

    match command.as_str() {
        "query" => {
            let args = query::parse_args(&mut argv).map_err(anyhow::Error::msg)?;
            let value = query::run_query(&args)?;
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        "analysis-stats" => {
            let args = analysis_stats::parse_args(&mut argv).map_err(anyhow::Error::msg)?;
            let results = analysis_stats::run_analysis_stats(&args)?;
            if args.csv {
                analysis_stats::print_results_csv(&results);
            } else {
                analysis_stats::print_results(&results);
            }
        }
        "--version" => {
            println!("xqstatic {}", env!("CARGO_PKG_VERSION"));
        }
        "--help" => print_usage(),
        other => {
            return Err(anyhow::anyhow!("Unknown argument: '{other}'"));
        }
    }

    xqstatic::perf::log_summary();
    Ok(())
}
