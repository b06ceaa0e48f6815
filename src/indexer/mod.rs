use crate::config::{Config, ResolverConfig};
use crate::error::AnalysisError;
use crate::graph::CallGraph;
use crate::model::{IndexStats, TypeRecord};
use crate::syntax::{CompilationUnit, JavaParser};
use anyhow::{Context, Result};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info, warn};

pub mod calls;
pub mod context;
pub mod declarations;
pub mod imports;
pub mod locals;
pub mod resolve;
pub mod scan;

use context::{FileContext, ProjectContext};
use declarations::FileDeclarations;
use imports::ImportTable;

/// One file handed to the pipeline.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub rel_path: String,
    pub hash: String,
    pub origin: SourceOrigin,
}

#[derive(Debug, Clone)]
pub enum SourceOrigin {
    Disk(PathBuf),
    Memory(String),
}

impl SourceFile {
    pub fn in_memory(rel_path: impl Into<String>, source: impl Into<String>) -> Self {
        let source = source.into();
        Self {
            rel_path: rel_path.into(),
            hash: blake3::hash(source.as_bytes()).to_hex().to_string(),
            origin: SourceOrigin::Memory(source),
        }
    }

    fn read(&self) -> Result<String, AnalysisError> {
        match &self.origin {
            SourceOrigin::Disk(path) => {
                std::fs::read_to_string(path).map_err(|err| AnalysisError::io(path, err))
            }
            SourceOrigin::Memory(source) => Ok(source.clone()),
        }
    }
}

impl From<scan::ScannedFile> for SourceFile {
    fn from(file: scan::ScannedFile) -> Self {
        Self {
            rel_path: file.rel_path,
            hash: file.hash,
            origin: SourceOrigin::Disk(file.abs_path),
        }
    }
}

struct ParsedFile {
    rel_path: String,
    hash: String,
    unit: CompilationUnit,
    imports: ImportTable,
}

/// Output of a full two-phase build.
#[derive(Debug)]
pub struct IndexOutput {
    pub context: ProjectContext,
    pub graph: CallGraph,
    pub stats: IndexStats,
}

pub struct Indexer {
    repo_root: PathBuf,
    config: ResolverConfig,
    scan_options: scan::ScanOptions,
}

impl Indexer {
    pub fn new(repo_root: PathBuf, config: ResolverConfig) -> Self {
        Self::new_with_options(repo_root, config, scan::ScanOptions::default())
    }

    pub fn new_with_options(
        repo_root: PathBuf,
        config: ResolverConfig,
        scan_options: scan::ScanOptions,
    ) -> Self {
        let repo_root = std::fs::canonicalize(&repo_root).unwrap_or(repo_root);
        Self {
            repo_root,
            config,
            scan_options,
        }
    }

    /// Scans the project and runs both passes. Unreadable or unparsable
    /// files are logged and counted, never fatal.
    pub fn build(&self) -> Result<IndexOutput> {
        let started = Instant::now();
        let scanned = scan::scan_repo_with_options(&self.repo_root, self.scan_options)
            .with_context(|| format!("scan {}", self.repo_root.display()))?;
        let (skipped, unreadable) = (scanned.skipped, scanned.errors);
        let files: Vec<SourceFile> = scanned.files.into_iter().map(SourceFile::from).collect();
        let mut output = run_pool(|| index_sources(&self.config, files))?;
        output.stats.skipped = skipped;
        output.stats.errors += unreadable;
        output.stats.scanned += skipped + unreadable;
        output.stats.duration_ms = started.elapsed().as_millis() as u64;
        info!(
            "indexed {} of {} files: {} methods, {} calls, {} errors in {}ms",
            output.stats.indexed,
            output.stats.scanned,
            output.stats.methods,
            output.stats.calls,
            output.stats.errors,
            output.stats.duration_ms
        );
        Ok(output)
    }

    /// Files added, modified or deleted relative to `previous` hashes.
    pub fn changed_files(&self, previous: &BTreeMap<String, String>) -> Result<scan::FileChanges> {
        let scanned = scan::scan_repo_with_options(&self.repo_root, self.scan_options)?;
        Ok(scan::diff_hashes(previous, &scanned.files))
    }
}

fn run_pool<T: Send>(job: impl FnOnce() -> T + Send) -> Result<T> {
    let threads = Config::get().threads;
    if threads == 0 {
        return Ok(job());
    }
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .context("build worker pool")?;
    Ok(pool.install(job))
}

/// Runs both passes over an explicit file list.
///
/// Phase 1 parses every file and merges declarations into a
/// [`ProjectContext`]. Phase 2 starts only after that snapshot is complete;
/// workers resolve calls per file and a single writer inserts the edges.
pub fn index_sources(config: &ResolverConfig, mut files: Vec<SourceFile>) -> IndexOutput {
    files.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));
    let mut stats = IndexStats {
        scanned: files.len(),
        ..IndexStats::default()
    };

    let results: Vec<Result<ParsedFile, AnalysisError>> = files
        .par_iter()
        .map_init(JavaParser::new, |parser, file| {
            let parser = parser
                .as_mut()
                .map_err(|err| AnalysisError::parse(&file.rel_path, err.to_string()))?;
            parse_file(parser, file, config)
        })
        .collect();

    let mut parsed = Vec::with_capacity(results.len());
    for result in results {
        match result {
            Ok(file) => parsed.push(file),
            Err(err) => {
                warn!("skipping file: {err}");
                stats.errors += 1;
            }
        }
    }
    stats.indexed = parsed.len();

    let context = build_context(config, &parsed);
    stats.types = context.types.len();
    stats.methods = context.methods.declaration_count();
    debug!(
        "declaration pass complete: {} types, {} methods",
        stats.types, stats.methods
    );

    let mut graph = CallGraph::with_excluded_prefixes(config.graph_excluded_prefixes.clone());
    for (name, decls) in context.methods.iter() {
        for decl in decls {
            if let Err(err) = graph.add_method(name, decl.clone()) {
                warn!("skipping declaration in {}: {err}", decl.file_path);
            }
        }
    }

    let per_file: Vec<calls::FileCalls> = parsed
        .par_iter()
        .map(|file| calls::extract_calls(&file.unit, &file.imports, &context))
        .collect();
    for file_calls in per_file {
        stats.unattributed_calls += file_calls.unattributed;
        for edge in file_calls.edges {
            graph.add_call(&edge.caller, &edge.callee);
        }
    }
    stats.calls = graph.edge_count();
    graph.set_files(context.file_hashes());

    IndexOutput {
        context,
        graph,
        stats,
    }
}

fn parse_file(
    parser: &mut JavaParser,
    file: &SourceFile,
    config: &ResolverConfig,
) -> Result<ParsedFile, AnalysisError> {
    let source = file.read()?;
    let unit = parser.parse(&source, &file.rel_path)?;
    let imports = ImportTable::from_unit(&unit, config);
    Ok(ParsedFile {
        rel_path: file.rel_path.clone(),
        hash: file.hash.clone(),
        unit,
        imports,
    })
}

/// Two declaration sweeps: the first only collects type names so the
/// second can resolve wildcard imports against the whole project.
fn build_context(config: &ResolverConfig, parsed: &[ParsedFile]) -> ProjectContext {
    let mut context = ProjectContext::new(config.clone());
    for file in parsed {
        let resolver = imports::TypeResolver::new(&file.imports, config);
        let decls = declarations::index_unit(&file.unit, &file.rel_path, &resolver);
        for ty in decls.types {
            context.types.entry(ty.qualified_name.clone()).or_insert(ty);
        }
    }

    let per_file: Vec<FileDeclarations> = parsed
        .par_iter()
        .map(|file| {
            let resolver = context.resolver(&file.imports);
            declarations::index_unit(&file.unit, &file.rel_path, &resolver)
        })
        .collect();

    // `parsed` is sorted by path, so the merge is deterministic. A type
    // declared twice keeps the first file's record, methods and fields.
    let mut types: BTreeMap<String, TypeRecord> = BTreeMap::new();
    for (file, decls) in parsed.iter().zip(per_file) {
        for ty in decls.types {
            if types.contains_key(&ty.qualified_name) {
                warn!(
                    "duplicate type {} in {}, keeping first declaration",
                    ty.qualified_name, ty.file_path
                );
                continue;
            }
            types.insert(ty.qualified_name.clone(), ty);
        }
        let owned_here = |owner: &str| {
            types
                .get(owner)
                .is_none_or(|ty| ty.file_path == file.rel_path)
        };
        for method in decls.methods {
            if owned_here(&method.owner) {
                context.methods.insert(method);
            }
        }
        for (owner, fields) in decls.fields {
            if owned_here(&owner) {
                context.fields.entry(owner).or_default().extend(fields);
            }
        }
    }
    context.types = types;

    for file in parsed {
        context.files.insert(
            file.rel_path.clone(),
            FileContext {
                imports: file.imports.clone(),
                hash: file.hash.clone(),
            },
        );
    }
    context
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sources() -> Vec<SourceFile> {
        vec![
            SourceFile::in_memory(
                "pkg/A.java",
                "package pkg;\n\nclass A {\n    void f() { g(); }\n    void g() {}\n}\n",
            ),
            SourceFile::in_memory(
                "pkg/B.java",
                "package pkg;\n\nclass B {\n    private A a;\n    void run() { a.f(); }\n}\n",
            ),
            SourceFile::in_memory("pkg/Broken.java", "package pkg;\nclass Broken { void f( }\n"),
        ]
    }

    #[test]
    fn builds_graph_across_files() {
        let output = index_sources(&ResolverConfig::default(), sources());
        assert_eq!(output.graph.callees_of("pkg.A.f"), vec!["pkg.A.g"]);
        assert_eq!(output.graph.callers_of("pkg.A.g"), vec!["pkg.A.f"]);
        assert_eq!(output.graph.callers_of("pkg.A.f"), vec!["pkg.B.run"]);
        assert!(output.context.methods.contains("pkg.A.f"));
    }

    #[test]
    fn counts_broken_files_without_aborting() {
        let output = index_sources(&ResolverConfig::default(), sources());
        assert_eq!(output.stats.scanned, 3);
        assert_eq!(output.stats.indexed, 2);
        assert_eq!(output.stats.errors, 1);
        assert_eq!(output.stats.types, 2);
        assert_eq!(output.stats.methods, 3);
        assert_eq!(output.stats.calls, 2);
    }

    #[test]
    fn unqualified_calls_stay_on_the_calling_type() {
        let files = vec![
            SourceFile::in_memory("pkg/Base.java", "package pkg;\nclass Base { void m() {} }\n"),
            SourceFile::in_memory(
                "pkg/Sub.java",
                "package pkg;\nimport static other.Util.helper;\nclass Sub extends Base {\n    void f() { m(); helper(); }\n}\n",
            ),
            SourceFile::in_memory(
                "other/Util.java",
                "package other;\npublic class Util { public static void helper() {} }\n",
            ),
        ];
        let output = index_sources(&ResolverConfig::default(), files);
        assert_eq!(output.graph.callees_of("pkg.Sub.f"), vec!["pkg.Sub.helper", "pkg.Sub.m"]);
        assert!(output.graph.callers_of("pkg.Base.m").is_empty());
        assert!(output.graph.callers_of("other.Util.helper").is_empty());
    }

    #[test]
    fn unreadable_disk_file_is_counted() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("A.java");
        std::fs::write(&present, "package pkg;\nclass A { void f() {} }\n").unwrap();
        let files = vec![
            SourceFile {
                rel_path: "pkg/A.java".into(),
                hash: "h1".into(),
                origin: SourceOrigin::Disk(present),
            },
            SourceFile {
                rel_path: "pkg/Gone.java".into(),
                hash: "h2".into(),
                origin: SourceOrigin::Disk(dir.path().join("Gone.java")),
            },
        ];
        let output = index_sources(&ResolverConfig::default(), files);
        assert_eq!(output.stats.indexed, 1);
        assert_eq!(output.stats.errors, 1);
        assert!(output.graph.contains("pkg.A.f"));
    }

    #[test]
    fn duplicate_type_keeps_first_file_entirely() {
        let files = vec![
            SourceFile::in_memory(
                "a/Dup.java",
                "package pkg;\nclass Dup {\n    private Helper helper;\n    void first() {}\n}\n",
            ),
            SourceFile::in_memory(
                "b/Dup.java",
                "package pkg;\nclass Dup {\n    private Other helper;\n    void second() {}\n}\n",
            ),
        ];
        let output = index_sources(&ResolverConfig::default(), files);
        let context = &output.context;
        assert_eq!(context.types["pkg.Dup"].file_path, "a/Dup.java");
        assert!(context.methods.contains("pkg.Dup.first"));
        assert!(!context.methods.contains("pkg.Dup.second"));
        assert_eq!(context.field_type("pkg.Dup", "helper"), Some("pkg.Helper"));
    }

    #[test]
    fn records_file_hashes() {
        let output = index_sources(&ResolverConfig::default(), sources());
        let files = output.graph.files();
        assert_eq!(files.len(), 2);
        assert!(files.contains_key("pkg/A.java"));
        assert!(!files.contains_key("pkg/Broken.java"));
    }
}
