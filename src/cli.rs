use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "callmap",
    version,
    about = "Java call graph and diff impact analyzer",
    after_help = r#"Examples:
  callmap index --repo .
  git diff | callmap impact --repo . --diff -
  callmap query --graph analysis_results/call_graph.json --method com.acme.OrderService.place
  callmap stats --graph analysis_results/call_graph.json
  callmap changed-files --repo .
"#
)]
pub struct Args {
    /// Log at debug level (overridden by RUST_LOG).
    #[arg(long, short, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Build the call graph for a project and save it.
    Index {
        #[arg(long, default_value = ".")]
        repo: PathBuf,
        /// Directory for call_graph.json.
        #[arg(long, default_value = "analysis_results")]
        output: PathBuf,
        /// Include files ignored by .gitignore.
        #[arg(long)]
        no_ignore: bool,
        /// Resolver configuration (defaults to <repo>/callmap.yaml when present).
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Map a unified diff to affected methods and their callers/callees.
    Impact {
        #[arg(long, default_value = ".")]
        repo: PathBuf,
        /// Diff file, or `-` for stdin.
        #[arg(long)]
        diff: PathBuf,
        /// Existing graph; built and saved when missing.
        #[arg(long)]
        graph: Option<PathBuf>,
        #[arg(long, default_value = "analysis_results")]
        output: PathBuf,
        /// Include the source of every affected method.
        #[arg(long)]
        with_source: bool,
        #[arg(long)]
        no_ignore: bool,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Direct callers and callees of one method.
    Query {
        #[arg(long, default_value = "analysis_results/call_graph.json")]
        graph: PathBuf,
        /// Project whose callmap.yaml applies when reloading the graph.
        #[arg(long, default_value = ".")]
        repo: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
        /// Qualified name, e.g. com.acme.OrderService.place
        #[arg(long)]
        method: String,
        #[arg(long, value_enum, default_value_t = QueryDirection::Both)]
        direction: QueryDirection,
    },
    /// Print statistics of a saved graph.
    Stats {
        #[arg(long, default_value = "analysis_results/call_graph.json")]
        graph: PathBuf,
        #[arg(long, default_value = ".")]
        repo: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Show files changed since the graph was generated.
    ChangedFiles {
        #[arg(long, default_value = ".")]
        repo: PathBuf,
        #[arg(long, default_value = "analysis_results/call_graph.json")]
        graph: PathBuf,
        #[arg(long)]
        no_ignore: bool,
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum QueryDirection {
    In,
    Out,
    Both,
}

impl From<QueryDirection> for crate::graph::Direction {
    fn from(direction: QueryDirection) -> Self {
        match direction {
            QueryDirection::In => crate::graph::Direction::In,
            QueryDirection::Out => crate::graph::Direction::Out,
            QueryDirection::Both => crate::graph::Direction::Both,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_impact_arguments() {
        let args = Args::parse_from([
            "callmap",
            "impact",
            "--repo",
            "proj",
            "--diff",
            "-",
            "--with-source",
            "-v",
        ]);
        assert!(args.verbose);
        match args.command {
            Command::Impact {
                repo,
                diff,
                graph,
                with_source,
                ..
            } => {
                assert_eq!(repo, PathBuf::from("proj"));
                assert_eq!(diff, PathBuf::from("-"));
                assert!(graph.is_none());
                assert!(with_source);
            }
            _ => panic!("expected impact"),
        }
    }

    #[test]
    fn query_direction_defaults_to_both() {
        let args = Args::parse_from(["callmap", "query", "--method", "pkg.A.f"]);
        match args.command {
            Command::Query { direction, .. } => assert_eq!(direction, QueryDirection::Both),
            _ => panic!("expected query"),
        }
    }

    #[test]
    fn stats_accepts_project_config() {
        let args = Args::parse_from(["callmap", "stats", "--config", "conf/callmap.yaml"]);
        match args.command {
            Command::Stats { repo, config, .. } => {
                assert_eq!(repo, PathBuf::from("."));
                assert_eq!(config, Some(PathBuf::from("conf/callmap.yaml")));
            }
            _ => panic!("expected stats"),
        }
    }
}
