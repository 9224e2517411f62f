//! Write rendered digests to disk.

use std::fs;
use std::path::{Path, PathBuf};

use paperwatch_common::Digest;
use paperwatch_db::DbError;
use thiserror::Error;
use tracing::info;

use crate::render::{render, DigestFormat};

#[derive(Debug, Error)]
pub enum DigestError {
    #[error("Store error: {0}")]
    Store(#[from] DbError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// `digest-YYYY-MM-DD.<ext>`, dated by the last day the window covers.
pub fn file_name(digest: &Digest, format: DigestFormat) -> String {
    let last_day = digest.window.end - chrono::Duration::nanoseconds(1);
    format!("digest-{}.{}", last_day.format("%Y-%m-%d"), format.extension())
}

/// Render `digest` in each of `formats` into `dir`, creating it if needed.
/// Existing files of the same name are overwritten. Returns the written paths.
pub fn export(digest: &Digest, dir: &Path, formats: &[DigestFormat]) -> Result<Vec<PathBuf>, DigestError> {
    fs::create_dir_all(dir).map_err(|source| DigestError::Io { path: dir.to_path_buf(), source })?;

    let mut written = Vec::with_capacity(formats.len());
    for &format in formats {
        let path = dir.join(file_name(digest, format));
        let body = render(digest, format)?;
        fs::write(&path, body).map_err(|source| DigestError::Io { path: path.clone(), source })?;
        info!(path = %path.display(), %format, "Digest written");
        written.push(path);
    }
    Ok(written)
}
