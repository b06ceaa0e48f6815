use anyhow::{bail, Context, Result};
use blake3::Hasher;
use ignore::WalkBuilder;
use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct ScannedFile {
    pub rel_path: String,
    pub abs_path: PathBuf,
    pub hash: String,
    pub size: u64,
}

#[derive(Debug, Clone, Copy)]
pub struct ScanOptions {
    pub no_ignore: bool,
    pub max_file_size: u64,
}

impl ScanOptions {
    pub fn new(no_ignore: bool) -> Self {
        Self {
            no_ignore,
            ..Self::default()
        }
    }
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            no_ignore: false,
            max_file_size: crate::config::Config::get().max_file_size_mb * 1024 * 1024,
        }
    }
}

/// Outcome of walking a project: indexable sources, the files left out
/// because of their size, and the files that could not be read.
#[derive(Debug, Default)]
pub struct ScanResult {
    pub files: Vec<ScannedFile>,
    pub skipped: usize,
    pub errors: usize,
}

const SOURCE_EXTENSION: &str = "java";
const SKIPPED_FILE_NAMES: &[&str] = &["package-info.java", "module-info.java"];

/// Walks `repo_root` and hashes every source file. Only a failure to list
/// the project is an error; files that vanish or cannot be read are logged
/// and counted in [`ScanResult::errors`].
pub fn scan_repo_with_options(repo_root: &Path, options: ScanOptions) -> Result<ScanResult> {
    if !repo_root.is_dir() {
        bail!("{} is not a directory", repo_root.display());
    }
    let candidates = source_paths(repo_root, options);
    let result = scan_paths(repo_root, candidates, options);
    debug!(
        "scanned {} source files under {}",
        result.files.len(),
        repo_root.display()
    );
    Ok(result)
}

fn source_paths(repo_root: &Path, options: ScanOptions) -> Vec<PathBuf> {
    let mut builder = WalkBuilder::new(repo_root);
    if options.no_ignore {
        builder
            .ignore(false)
            .git_ignore(false)
            .git_global(false)
            .git_exclude(false)
            .parents(false);
    } else {
        builder
            .ignore(true)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .parents(true)
            .require_git(false);
    }
    let walker = builder
        .hidden(false)
        .filter_entry(|entry| !is_ignored_entry(entry))
        .build();

    let mut paths = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(value) => value,
            Err(err) => {
                warn!("walk error: {err}");
                continue;
            }
        };
        if !entry.file_type().map(|ft| ft.is_file()).unwrap_or(false) {
            continue;
        }
        if is_source_file(entry.path()) {
            paths.push(entry.into_path());
        }
    }
    paths
}

/// Stats and hashes each candidate. Results are sorted by relative path.
pub fn scan_paths(repo_root: &Path, paths: Vec<PathBuf>, options: ScanOptions) -> ScanResult {
    let mut result = ScanResult::default();
    for path in paths {
        match scan_file(repo_root, &path, options.max_file_size) {
            Ok(Some(file)) => result.files.push(file),
            Ok(None) => result.skipped += 1,
            Err(err) => {
                warn!("skipping {}: {err:#}", path.display());
                result.errors += 1;
            }
        }
    }
    result.files.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));
    result
}

fn scan_file(repo_root: &Path, path: &Path, max_file_size: u64) -> Result<Option<ScannedFile>> {
    let metadata = fs::metadata(path).with_context(|| format!("stat {}", path.display()))?;
    let size = metadata.len();
    if size > max_file_size {
        warn!(
            "skipping {}: {} bytes exceeds limit of {} bytes",
            path.display(),
            size,
            max_file_size
        );
        return Ok(None);
    }
    let rel_path = crate::util::normalize_rel_path(repo_root, path)?;
    let hash = hash_file(path).with_context(|| format!("hash {}", path.display()))?;
    Ok(Some(ScannedFile {
        rel_path,
        abs_path: path.to_path_buf(),
        hash,
        size,
    }))
}

fn is_ignored_entry(entry: &ignore::DirEntry) -> bool {
    match entry.file_name() {
        name if name == OsStr::new(".callmap") => true,
        name if name == OsStr::new(".git") => true,
        _ => false,
    }
}

/// Java sources that can contain method declarations.
pub fn is_source_file(path: &Path) -> bool {
    let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
        return false;
    };
    if ext != SOURCE_EXTENSION {
        return false;
    }
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    !SKIPPED_FILE_NAMES.contains(&name)
}

pub fn hash_file(path: &Path) -> Result<String> {
    let data = fs::read(path)?;
    let mut hasher = Hasher::new();
    hasher.update(&data);
    Ok(hasher.finalize().to_hex().to_string())
}

/// How the working tree differs from a previously recorded set of hashes.
#[derive(Debug, Default, Clone, PartialEq, Eq, serde::Serialize)]
pub struct FileChanges {
    pub added: Vec<String>,
    pub modified: Vec<String>,
    pub deleted: Vec<String>,
}

impl FileChanges {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.modified.is_empty() && self.deleted.is_empty()
    }
}

pub fn diff_hashes(previous: &BTreeMap<String, String>, current: &[ScannedFile]) -> FileChanges {
    let mut changes = FileChanges::default();
    let mut seen = std::collections::BTreeSet::new();
    for file in current {
        seen.insert(file.rel_path.as_str());
        match previous.get(&file.rel_path) {
            None => changes.added.push(file.rel_path.clone()),
            Some(hash) if *hash != file.hash => changes.modified.push(file.rel_path.clone()),
            Some(_) => {}
        }
    }
    for path in previous.keys() {
        if !seen.contains(path.as_str()) {
            changes.deleted.push(path.clone());
        }
    }
    changes
}
