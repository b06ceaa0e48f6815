use crate::config::ResolverConfig;
use crate::error::AnalysisError;
use crate::graph::CallGraph;
use crate::impact::diff::parse_diff_detailed;
use crate::impact::types::{
    CalleeList, CallerList, ImpactMetadata, ImpactReport, ImpactResult, MethodCalls, ReportMetadata,
};
use crate::indexer::declarations::index_unit;
use crate::indexer::imports::{ImportTable, TypeResolver};
use crate::indexer::scan::is_source_file;
use crate::model::LineRange;
use crate::syntax::JavaParser;
use crate::util;
use anyhow::Result;
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Qualified name and range of every declaration in `source`, in source
/// order. Overloads appear once per declaration.
pub fn declaration_ranges(
    parser: &mut JavaParser,
    source: &str,
    rel_path: &str,
    config: &ResolverConfig,
) -> Result<Vec<(String, LineRange)>, AnalysisError> {
    let unit = parser.parse(source, rel_path)?;
    let imports = ImportTable::from_unit(&unit, config);
    let resolver = TypeResolver::new(&imports, config);
    Ok(index_unit(&unit, rel_path, &resolver).ranges())
}

/// Names whose inclusive range contains at least one modified line, in
/// source order. Nested declarations may be reported with their enclosing
/// one.
pub fn affected(ranges: &[(String, LineRange)], modified_lines: &[u32]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    ranges
        .iter()
        .filter(|(_, range)| range.intersects(modified_lines.iter()))
        .filter(|(name, _)| seen.insert(name.clone()))
        .map(|(name, _)| name.clone())
        .collect()
}

/// One range per name. An affected overload takes precedence over an
/// unaffected one; otherwise the first in source order wins.
pub fn line_map(ranges: &[(String, LineRange)], modified_lines: &[u32]) -> BTreeMap<String, LineRange> {
    let mut map: BTreeMap<String, (LineRange, bool)> = BTreeMap::new();
    for (name, range) in ranges {
        let hit = range.intersects(modified_lines.iter());
        let replace = match map.get(name) {
            Some((_, true)) => false,
            Some((_, false)) => hit,
            None => true,
        };
        if replace {
            map.insert(name.clone(), (*range, hit));
        }
    }
    map.into_iter().map(|(name, (range, _))| (name, range)).collect()
}

/// Source of every affected declaration. Affected overloads of one name
/// are joined in source order, separated by a blank line.
pub fn affected_code(
    source: &str,
    ranges: &[(String, LineRange)],
    modified_lines: &[u32],
) -> BTreeMap<String, String> {
    let mut blocks: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, range) in ranges {
        if range.intersects(modified_lines.iter()) {
            blocks
                .entry(name.clone())
                .or_default()
                .push(util::slice_lines(source, range.start_line, range.end_line));
        }
    }
    blocks
        .into_iter()
        .map(|(name, parts)| (name, parts.join("\n\n")))
        .collect()
}

/// Direct neighbourhood from the graph; names missing from it get empty
/// lists.
pub fn method_calls(graph: &CallGraph, names: &[String]) -> MethodCalls {
    let mut calls = MethodCalls::default();
    for name in names {
        let callers = graph.callers_of(name).into_iter().map(str::to_string).collect();
        let callees = graph.callees_of(name).into_iter().map(str::to_string).collect();
        calls.callers.insert(name.clone(), CallerList { callers });
        calls.callees.insert(name.clone(), CalleeList { callees });
    }
    calls
}

/// Maps modified lines to declarations and their call neighbourhood
/// against an already built graph. Read-only, so files can be analyzed in
/// parallel.
pub struct ImpactMapper<'a> {
    repo_root: PathBuf,
    graph: &'a CallGraph,
    config: &'a ResolverConfig,
    with_source: bool,
}

impl<'a> ImpactMapper<'a> {
    pub fn new(repo_root: impl Into<PathBuf>, graph: &'a CallGraph, config: &'a ResolverConfig) -> Self {
        Self {
            repo_root: repo_root.into(),
            graph,
            config,
            with_source: false,
        }
    }

    /// Include the source text of every affected declaration.
    pub fn with_source(mut self, with_source: bool) -> Self {
        self.with_source = with_source;
        self
    }

    pub fn analyze_file(&self, rel_path: &str, modified_lines: &[u32]) -> Result<ImpactResult> {
        let mut parser = JavaParser::new()?;
        Ok(self.analyze_file_with(&mut parser, rel_path, modified_lines)?)
    }

    pub fn analyze_file_with(
        &self,
        parser: &mut JavaParser,
        rel_path: &str,
        modified_lines: &[u32],
    ) -> Result<ImpactResult, AnalysisError> {
        let path = self.repo_root.join(rel_path);
        let source = std::fs::read_to_string(&path).map_err(|err| AnalysisError::io(&path, err))?;
        let ranges = declaration_ranges(parser, &source, rel_path, self.config)?;
        let affected_methods = affected(&ranges, modified_lines);
        let method_line_map = line_map(&ranges, modified_lines);
        debug!("{rel_path}: {} affected of {} declarations", affected_methods.len(), ranges.len());

        let method_code = self
            .with_source
            .then(|| affected_code(&source, &ranges, modified_lines));

        Ok(ImpactResult {
            metadata: ImpactMetadata {
                analyzed_file: rel_path.to_string(),
                analysis_time: util::timestamp(),
                modified_lines: modified_lines.to_vec(),
            },
            method_calls: method_calls(self.graph, &affected_methods),
            affected_methods,
            method_line_map,
            method_code,
        })
    }

    /// Analyzes every Java file named by `diff`. Files that cannot be read
    /// or parsed are logged and left out of the report.
    pub fn analyze_diff(&self, diff: &str) -> ImpactReport {
        let parsed = parse_diff_detailed(diff);
        let total_files = parsed.files.len();
        let targets: Vec<(&String, &Vec<u32>)> = parsed
            .files
            .iter()
            .filter(|(path, _)| is_source_file(Path::new(path.as_str())))
            .collect();

        let results: Vec<(String, Result<ImpactResult, AnalysisError>)> = targets
            .par_iter()
            .map_init(JavaParser::new, |parser, (path, lines)| {
                let result = match parser.as_mut() {
                    Ok(parser) => self.analyze_file_with(parser, path, lines),
                    Err(err) => Err(AnalysisError::parse(path.as_str(), err.to_string())),
                };
                (path.to_string(), result)
            })
            .collect();

        let mut file_analyses = BTreeMap::new();
        for (path, result) in results {
            match result {
                Ok(result) => {
                    file_analyses.insert(path, result);
                }
                Err(err) => warn!("skipping {path}: {err}"),
            }
        }
        info!(
            "analyzed {} of {} changed files",
            file_analyses.len(),
            total_files
        );
        ImpactReport {
            metadata: ReportMetadata {
                analysis_time: util::timestamp(),
                total_files,
            },
            file_analyses,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranges() -> Vec<(String, LineRange)> {
        vec![
            ("pkg.A.run".to_string(), LineRange::new(20, 35)),
            ("pkg.A.Local.go".to_string(), LineRange::new(24, 26)),
            ("pkg.A.f".to_string(), LineRange::new(40, 42)),
            ("pkg.A.f".to_string(), LineRange::new(44, 46)),
        ]
    }

    #[test]
    fn range_containment_is_inclusive() {
        let ranges = vec![("pkg.A.run".to_string(), LineRange::new(20, 35))];
        assert!(affected(&ranges, &[19, 36]).is_empty());
        assert_eq!(affected(&ranges, &[20]), vec!["pkg.A.run"]);
        assert_eq!(affected(&ranges, &[35]), vec!["pkg.A.run"]);
    }

    #[test]
    fn nested_declarations_are_reported_with_their_enclosing_one() {
        assert_eq!(affected(&ranges(), &[25]), vec!["pkg.A.run", "pkg.A.Local.go"]);
    }

    #[test]
    fn overloads_report_one_name() {
        assert_eq!(affected(&ranges(), &[41, 45]), vec!["pkg.A.f"]);
    }

    #[test]
    fn line_map_prefers_affected_overload() {
        let map = line_map(&ranges(), &[45]);
        assert_eq!(map["pkg.A.f"], LineRange::new(44, 46));
        let map = line_map(&ranges(), &[]);
        assert_eq!(map["pkg.A.f"], LineRange::new(40, 42));
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn unknown_names_get_empty_neighbourhoods() {
        let graph = CallGraph::new();
        let calls = method_calls(&graph, &["pkg.A.f".to_string()]);
        assert!(calls.callers["pkg.A.f"].callers.is_empty());
        assert!(calls.callees["pkg.A.f"].callees.is_empty());
    }

    #[test]
    fn source_includes_every_affected_overload() {
        let source = "class A {\n    void f() {\n        a();\n    }\n\n    void f(int n) {\n        b(n);\n    }\n}\n";
        let ranges = vec![
            ("pkg.A.f".to_string(), LineRange::new(2, 4)),
            ("pkg.A.f".to_string(), LineRange::new(6, 8)),
        ];
        let code = affected_code(source, &ranges, &[3, 7]);
        assert_eq!(
            code["pkg.A.f"],
            "    void f() {\n        a();\n    }\n\n    void f(int n) {\n        b(n);\n    }"
        );
        let code = affected_code(source, &ranges, &[7]);
        assert_eq!(code["pkg.A.f"], "    void f(int n) {\n        b(n);\n    }");
        assert!(affected_code(source, &ranges, &[5]).is_empty());
    }

    #[test]
    fn ranges_from_source() {
        let source = "package pkg;\n\nclass A {\n    void f() {\n        g();\n    }\n\n    void g() {}\n}\n";
        let mut parser = JavaParser::new().unwrap();
        let ranges = declaration_ranges(&mut parser, source, "pkg/A.java", &ResolverConfig::default())
            .unwrap();
        assert_eq!(
            ranges,
            vec![
                ("pkg.A.f".to_string(), LineRange::new(4, 6)),
                ("pkg.A.g".to_string(), LineRange::new(8, 8)),
            ]
        );
    }
}
