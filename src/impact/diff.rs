//! Unified diff to modified-line sets.
//!
//! Line numbers refer to the new version of each file. A removed line is
//! recorded at the position where its content disappeared.

use crate::error::AnalysisError;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

const SYNTHETIC_PREFIXES: &[&str] = &["src://", "dst://"];
const GIT_PREFIXES: &[&str] = &["a/", "b/"];
const NULL_PATH: &str = "/dev/null";

#[derive(Debug, Default)]
pub struct ParsedDiff {
    /// Modified lines per file, ascending and deduplicated.
    pub files: BTreeMap<String, Vec<u32>>,
    /// Headers that did not match the expected grammar and were skipped.
    pub malformed: Vec<AnalysisError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    InFile,
    InHunk,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HunkHeader {
    pub old_start: u32,
    pub old_count: u32,
    pub new_start: u32,
    pub new_count: u32,
}

struct DiffParser {
    state: State,
    current: Option<String>,
    counter: u32,
    old_left: u32,
    new_left: u32,
    files: BTreeMap<String, BTreeSet<u32>>,
    malformed: Vec<AnalysisError>,
}

impl DiffParser {
    fn new() -> Self {
        Self {
            state: State::Idle,
            current: None,
            counter: 0,
            old_left: 0,
            new_left: 0,
            files: BTreeMap::new(),
            malformed: Vec::new(),
        }
    }

    fn hunk_exhausted(&self) -> bool {
        self.old_left == 0 && self.new_left == 0
    }

    fn feed(&mut self, number: usize, line: &str) {
        if line.starts_with("diff ") {
            self.file_header(number, line);
            return;
        }
        if line.starts_with("@@") {
            self.hunk_header(number, line);
            return;
        }
        if self.state != State::InHunk || self.hunk_exhausted() {
            if let Some(path) = line.strip_prefix("+++ ") {
                self.rekey(path);
                return;
            }
            if line.starts_with("--- ") {
                return;
            }
        }
        if self.state == State::InHunk {
            self.hunk_line(line);
        }
    }

    fn file_header(&mut self, number: usize, line: &str) {
        let Some(rest) = line.strip_prefix("diff --git ") else {
            self.reject(number, line);
            return;
        };
        let parts: Vec<&str> = rest.split_whitespace().collect();
        let raw = match parts.as_slice() {
            [_, new] => *new,
            [only] => *only,
            _ => {
                self.reject(number, line);
                return;
            }
        };
        self.start_file(normalize_diff_file(raw));
    }

    fn start_file(&mut self, path: String) {
        debug!("diff file {path}");
        self.files.entry(path.clone()).or_default();
        self.current = Some(path);
        self.state = State::InFile;
        self.counter = 0;
        self.old_left = 0;
        self.new_left = 0;
    }

    /// `+++` names the new side; it wins over the `diff --git` header.
    fn rekey(&mut self, raw: &str) {
        let raw = raw.split('\t').next().unwrap_or(raw).trim();
        if raw == NULL_PATH {
            return;
        }
        let path = normalize_diff_file(raw);
        if let Some(previous) = self.current.take() {
            if previous != path && self.files.get(&previous).is_some_and(BTreeSet::is_empty) {
                self.files.remove(&previous);
            }
        }
        self.start_file(path);
    }

    fn hunk_header(&mut self, number: usize, line: &str) {
        if self.current.is_none() {
            self.reject(number, line);
            return;
        }
        match parse_hunk_header(line) {
            Some(header) => {
                self.state = State::InHunk;
                self.counter = header.new_start;
                self.old_left = header.old_count;
                self.new_left = header.new_count;
            }
            None => {
                self.reject(number, line);
                self.state = State::InFile;
            }
        }
    }

    fn hunk_line(&mut self, line: &str) {
        let Some(path) = self.current.as_ref() else {
            return;
        };
        let Some(lines) = self.files.get_mut(path) else {
            return;
        };
        match line.as_bytes().first() {
            Some(b'+') => {
                lines.insert(self.counter);
                self.counter += 1;
                self.new_left = self.new_left.saturating_sub(1);
            }
            Some(b'-') => {
                lines.insert(self.counter);
                self.old_left = self.old_left.saturating_sub(1);
            }
            Some(b'\\') => {}
            _ => {
                self.counter += 1;
                self.old_left = self.old_left.saturating_sub(1);
                self.new_left = self.new_left.saturating_sub(1);
            }
        }
    }

    fn reject(&mut self, number: usize, line: &str) {
        let err = AnalysisError::DiffFormat {
            line: number,
            text: line.to_string(),
        };
        warn!("{err}");
        self.malformed.push(err);
    }

    fn finish(self) -> ParsedDiff {
        ParsedDiff {
            files: self
                .files
                .into_iter()
                .map(|(path, lines)| (path, lines.into_iter().collect()))
                .collect(),
            malformed: self.malformed,
        }
    }
}

/// Parses `@@ -a[,b] +c[,d] @@`; omitted counts default to 1.
pub fn parse_hunk_header(line: &str) -> Option<HunkHeader> {
    let rest = line.strip_prefix("@@ ")?;
    let (ranges, _) = rest.split_once(" @@")?;
    let mut parts = ranges.split_whitespace();
    let (old_start, old_count) = parse_hunk_range(parts.next()?.strip_prefix('-')?)?;
    let (new_start, new_count) = parse_hunk_range(parts.next()?.strip_prefix('+')?)?;
    if parts.next().is_some() {
        return None;
    }
    Some(HunkHeader {
        old_start,
        old_count,
        new_start,
        new_count,
    })
}

fn parse_hunk_range(range: &str) -> Option<(u32, u32)> {
    match range.split_once(',') {
        Some((start, count)) => Some((start.parse().ok()?, count.parse().ok()?)),
        None => Some((range.parse().ok()?, 1)),
    }
}

/// Strips `src://`/`dst://` markers, or git's `a/`/`b/` sides.
pub fn normalize_diff_file(raw: &str) -> String {
    let raw = raw.trim();
    let stripped = SYNTHETIC_PREFIXES
        .iter()
        .find_map(|prefix| raw.strip_prefix(prefix))
        .or_else(|| GIT_PREFIXES.iter().find_map(|prefix| raw.strip_prefix(prefix)))
        .unwrap_or(raw);
    crate::util::normalize_diff_path(stripped)
}

pub fn parse_diff_detailed(diff: &str) -> ParsedDiff {
    let mut parser = DiffParser::new();
    for (idx, line) in diff.lines().enumerate() {
        parser.feed(idx + 1, line);
    }
    parser.finish()
}

pub fn parse_diff(diff: &str) -> BTreeMap<String, Vec<u32>> {
    parse_diff_detailed(diff).files
}
