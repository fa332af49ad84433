//! Error types for manifest loading.

use std::path::PathBuf;

/// Errors that can occur while reading a module manifest.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    /// The manifest file could not be read.
    #[error("manifest not found: {}: {source}", .path.display())]
    ManifestNotFound {
        /// The manifest path that was tried.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The manifest was read but is not valid.
    #[error("malformed manifest {}: {reason}", .path.display())]
    ManifestMalformed {
        /// The manifest path.
        path: PathBuf,
        /// What is wrong with it.
        reason: String,
    },
}
