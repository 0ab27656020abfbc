use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tempfile::NamedTempFile;

use crate::error::EtlError;

/// Write a JSON artifact by way of a temp file in the destination directory
/// followed by a rename. A run that dies mid-write leaves the previous
/// artifact untouched; readers only ever see a complete file.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), EtlError> {
    let publish_error = |error: std::io::Error| EtlError::Publish {
        path: path.to_path_buf(),
        error,
    };

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir).map_err(publish_error)?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(publish_error)?;
    let body = serde_json::to_vec_pretty(value).map_err(|e| publish_error(e.into()))?;
    tmp.write_all(&body).map_err(publish_error)?;
    tmp.flush().map_err(publish_error)?;

    tmp.persist(path).map_err(|e| publish_error(e.error))?;

    Ok(())
}
