/// Error taxonomy for the level pipeline.
///
/// Policy: assembly and persistence errors never crash the frame loop.
/// Callers log the diagnostic and degrade to a safe default (empty level,
/// unchanged score, last known in-memory value).

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LevelError {
    /// Level index outside `[0, count)`. The operation is a no-op.
    #[error("invalid level index {index} (collection holds {count})")]
    InvalidIndex { index: usize, count: usize },

    /// Level document absent or unreadable. Caller decides the fallback.
    #[error("no level document at {path}")]
    MissingContent { path: PathBuf },

    /// Level document exists but does not parse.
    #[error("corrupt level document at {path}: {source}")]
    CorruptContent {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Obstacle-type name unresolvable against the catalog.
    /// Assembly skips the slot and continues.
    #[error("unknown obstacle type '{name}'")]
    LookupFailure { name: String },

    /// Storage read/write error. Gameplay continues on in-memory values.
    #[error("persistence failure on {path}: {source}")]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LevelError {
    pub fn persistence(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LevelError::Persistence { path: path.into(), source }
    }
}
