use live_select_models::MissingField;
use std::path::PathBuf;
use thiserror::Error;

/// Failures of a selection run. No variant is retried inside the engine.
#[derive(Debug, Error)]
pub enum SelectError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}:{line}: {reason}")]
    Parse {
        path: PathBuf,
        line: u64,
        reason: String,
    },

    #[error("invalid selection settings: {0}")]
    Precondition(String),

    #[error("malformed snapshot: genre {genre_id} entry {index} has no {field}")]
    MalformedSnapshot {
        genre_id: i64,
        index: usize,
        field: MissingField,
    },

    #[error("snapshot supplier failed: {0}")]
    Upstream(String),
}

impl SelectError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn parse(path: impl Into<PathBuf>, line: u64, reason: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            line,
            reason: reason.into(),
        }
    }

    /// Convert a reader/writer error from the tab-separated list files.
    pub(crate) fn from_csv(path: impl Into<PathBuf>, err: csv::Error) -> Self {
        let path = path.into();
        let line = err.position().map(|p| p.line()).unwrap_or(0);
        match err.into_kind() {
            csv::ErrorKind::Io(source) => Self::Io { path, source },
            csv::ErrorKind::Utf8 { err, .. } => Self::parse(path, line, format!("invalid UTF-8: {}", err)),
            other => Self::parse(path, line, format!("{:?}", other)),
        }
    }
}
