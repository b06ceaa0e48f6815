//! Dot-separated qualified names (`pkg.Type.member`).

use crate::error::AnalysisError;

/// Checks the qualified-name invariant: at least two segments, a non-empty
/// root, and every later segment a valid identifier.
pub fn validate(name: &str) -> Result<(), AnalysisError> {
    let invalid = || AnalysisError::InvalidQualifiedName(name.to_string());
    if name
        .chars()
        .any(|ch| matches!(ch, '<' | '>' | '(' | ')' | '{' | '}' | '[' | ']' | '\\' | '/'))
    {
        return Err(invalid());
    }
    let mut segments = name.split('.');
    let Some(root) = segments.next() else {
        return Err(invalid());
    };
    if root.is_empty() {
        return Err(invalid());
    }
    let mut count = 1;
    for segment in segments {
        if !is_identifier(segment) {
            return Err(invalid());
        }
        count += 1;
    }
    if count < 2 {
        return Err(invalid());
    }
    Ok(())
}

pub fn is_valid(name: &str) -> bool {
    validate(name).is_ok()
}

pub fn is_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_alphabetic() || first == '_' || first == '$') {
        return false;
    }
    chars.all(|ch| ch.is_alphanumeric() || ch == '_' || ch == '$')
}

/// Collapses runs of dots and trims dots from both ends.
pub fn normalize(candidate: &str) -> String {
    candidate
        .split('.')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join(".")
}

pub fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

/// Everything before the last dot, or `""` for a single segment.
pub fn parent(name: &str) -> &str {
    name.rsplit_once('.').map(|(head, _)| head).unwrap_or("")
}

pub fn last_segment(name: &str) -> &str {
    name.rsplit_once('.').map(|(_, tail)| tail).unwrap_or(name)
}
