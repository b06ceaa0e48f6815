//! Diff impact analysis: modified lines to affected declarations and their
//! direct callers and callees.

pub mod diff;
pub mod mapper;
pub mod types;

pub use diff::{parse_diff, parse_diff_detailed, ParsedDiff};
pub use mapper::{affected, ImpactMapper};
pub use types::{ImpactReport, ImpactResult, MethodCalls};

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

pub const DEFAULT_OUTPUT_DIR: &str = "analysis_results";
pub const GRAPH_FILE_NAME: &str = "call_graph.json";

pub fn graph_path(output_dir: &Path) -> PathBuf {
    output_dir.join(GRAPH_FILE_NAME)
}

/// Writes `report` as `analysis_all_files_<timestamp>.json` under
/// `output_dir` and returns the path.
pub fn save_report(report: &ImpactReport, output_dir: &Path) -> Result<PathBuf> {
    let path = output_dir.join(format!(
        "analysis_all_files_{}.json",
        report.metadata.analysis_time
    ));
    crate::util::ensure_parent_dir(&path)?;
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(&path, json).with_context(|| format!("write {}", path.display()))?;
    Ok(path)
}
