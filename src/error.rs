use std::path::PathBuf;

use crate::registry::ResolutionError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("capability resolution failed: {0}")]
    Resolution(#[from] ResolutionError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("cannot read document {}: {message}", path.display())]
    Reader { path: PathBuf, message: String },

    #[error(
        "corrupted cache entry {}: {source} (re-run with --reindex)",
        path.display()
    )]
    CacheCorruption {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },
}

impl Error {
    pub fn reader(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Reader {
            path: path.into(),
            message: message.to_string(),
        }
    }
}
