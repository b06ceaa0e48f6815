//! Serializable results of diff impact analysis.

use crate::model::LineRange;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpactMetadata {
    pub analyzed_file: String,
    pub analysis_time: String,
    pub modified_lines: Vec<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerList {
    pub callers: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalleeList {
    pub callees: Vec<String>,
}

/// Direct call neighbourhood of every affected declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodCalls {
    pub callers: BTreeMap<String, CallerList>,
    pub callees: BTreeMap<String, CalleeList>,
}

/// Impact of one file's modified lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpactResult {
    pub metadata: ImpactMetadata,
    /// Source order, each name once.
    pub affected_methods: Vec<String>,
    /// Range of every declaration in the file.
    pub method_line_map: BTreeMap<String, LineRange>,
    pub method_calls: MethodCalls,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method_code: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub analysis_time: String,
    pub total_files: usize,
}

/// Impact of a whole diff, one entry per analyzed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpactReport {
    pub metadata: ReportMetadata,
    pub file_analyses: BTreeMap<String, ImpactResult>,
}
