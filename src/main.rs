use anyhow::{Context, Result};
use callmap::config::ResolverConfig;
use callmap::graph::{CallGraph, Direction};
use callmap::impact::{self, ImpactMapper};
use callmap::indexer::{self, scan::ScanOptions};
use clap::Parser;
use serde_json::json;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::info;

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn build_graph(
    repo: &Path,
    config: ResolverConfig,
    no_ignore: bool,
    output: &Path,
) -> Result<indexer::IndexOutput> {
    let indexer = indexer::Indexer::new_with_options(
        repo.to_path_buf(),
        config,
        ScanOptions::new(no_ignore),
    );
    let built = indexer.build()?;
    let graph_path = impact::graph_path(output);
    built.graph.save(&graph_path)?;
    info!("call graph saved to {}", graph_path.display());
    Ok(built)
}

fn read_diff(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("read diff from stdin")?;
        return Ok(buf);
    }
    callmap::util::read_to_string(path)
}

/// Reloads a saved graph with the project's own exclusions, so edges kept
/// by a narrower `callmap.yaml` survive re-validation.
fn load_graph(path: &Path, repo: &Path, config: Option<&Path>) -> Result<(CallGraph, ResolverConfig)> {
    let resolver_config = ResolverConfig::discover(repo, config)?;
    let graph = CallGraph::load(path, resolver_config.graph_excluded_prefixes.clone())?;
    Ok((graph, resolver_config))
}

fn main() -> Result<()> {
    let args = callmap::cli::Args::parse();
    init_tracing(args.verbose);

    match args.command {
        callmap::cli::Command::Index {
            repo,
            output,
            no_ignore,
            config,
        } => {
            let resolver_config = ResolverConfig::discover(&repo, config.as_deref())?;
            let built = build_graph(&repo, resolver_config, no_ignore, &output)?;
            println!("{}", serde_json::to_string_pretty(&built.stats)?);
            Ok(())
        }
        callmap::cli::Command::Impact {
            repo,
            diff,
            graph,
            output,
            with_source,
            no_ignore,
            config,
        } => {
            let resolver_config = ResolverConfig::discover(&repo, config.as_deref())?;
            let graph_path: PathBuf = graph.unwrap_or_else(|| impact::graph_path(&output));
            let call_graph = if graph_path.exists() {
                CallGraph::load(&graph_path, resolver_config.graph_excluded_prefixes.clone())?
            } else {
                info!("no graph at {}, building one", graph_path.display());
                build_graph(&repo, resolver_config.clone(), no_ignore, &output)?.graph
            };
            let diff_text = read_diff(&diff)?;
            let repo_root = std::fs::canonicalize(&repo).unwrap_or(repo);
            let mapper = ImpactMapper::new(repo_root, &call_graph, &resolver_config)
                .with_source(with_source);
            let report = mapper.analyze_diff(&diff_text);
            let saved = impact::save_report(&report, &output)?;
            info!("impact report saved to {}", saved.display());
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        callmap::cli::Command::Query {
            graph,
            repo,
            config,
            method,
            direction,
        } => {
            let (call_graph, _) = load_graph(&graph, &repo, config.as_deref())?;
            let direction = Direction::from(direction);
            let mut result = json!({
                "method": method,
                "known": call_graph.contains(&method),
                "declarations": call_graph.method(&method).unwrap_or(&[]),
            });
            if direction.includes_callers() {
                result["callers"] = json!(call_graph.callers_of(&method));
            }
            if direction.includes_callees() {
                result["callees"] = json!(call_graph.callees_of(&method));
            }
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        callmap::cli::Command::Stats {
            graph,
            repo,
            config,
        } => {
            let (call_graph, _) = load_graph(&graph, &repo, config.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&call_graph.stats())?);
            Ok(())
        }
        callmap::cli::Command::ChangedFiles {
            repo,
            graph,
            no_ignore,
            config,
        } => {
            let (call_graph, resolver_config) = load_graph(&graph, &repo, config.as_deref())?;
            let indexer = indexer::Indexer::new_with_options(
                repo,
                resolver_config,
                ScanOptions::new(no_ignore),
            );
            let changed = indexer.changed_files(call_graph.files())?;
            if changed.is_empty() {
                info!("no source files changed since {}", graph.display());
            }
            println!("{}", serde_json::to_string_pretty(&changed)?);
            Ok(())
        }
    }
}
