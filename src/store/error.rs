use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to create data directory '{0}'")]
    DataDirCreation(PathBuf, #[source] std::io::Error),

    #[error("Failed to read segment '{0}'")]
    SegmentRead(PathBuf, #[source] std::io::Error),

    // Raised per record during load; the load itself skips the record and
    // continues.
    #[error("Malformed record at line {line} of '{path}': {reason}")]
    MalformedRecord {
        path: PathBuf,
        line: u64,
        reason: String,
    },

    #[error("Failed to encode segment '{0}'")]
    SegmentEncode(PathBuf, #[source] csv::Error),

    #[error("Failed to write segment '{0}'")]
    SegmentWrite(PathBuf, #[source] std::io::Error),

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
