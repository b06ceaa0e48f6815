use std::path::PathBuf;
use thiserror::Error;

/// Failures the analysis core can report for a single file, declaration,
/// edge or diff line. None of them abort a project-wide run.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("parse error in {path}: {message}")]
    Parse { path: String, message: String },

    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid qualified name: {0:?}")]
    InvalidQualifiedName(String),

    #[error("malformed diff header at line {line}: {text}")]
    DiffFormat { line: usize, text: String },
}

impl AnalysisError {
    pub fn parse(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
