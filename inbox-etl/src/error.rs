use std::path::PathBuf;

use thiserror::Error;

/// Fatal errors for a batch run. Per-row problems are skip counts handled by
/// the normalizer, never errors; anything here aborts the run and leaves the
/// previously published artifacts in place.
#[derive(Error, Debug)]
pub enum EtlError {
    #[error("source data at {path} could not be read: {error}")]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },
    #[error("source data at {path} is not valid JSON: {error}")]
    SourceMalformed {
        path: PathBuf,
        #[source]
        error: serde_json::Error,
    },
    #[error("failed to publish artifact at {path}: {error}")]
    Publish {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },
}
