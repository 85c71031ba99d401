//! Collector errors.
//!
//! Parsers never fail; an unrecognizable artifact becomes an empty result plus
//! a parse note. Errors here are about the run directory itself.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    #[error("unknown collector platform '{0}' (expected one of: aruba_ap, aruba_controller, aruba_switch)")]
    UnknownPlatform(String),

    #[error("no artifacts directory under {}", .0.display())]
    MissingArtifacts(PathBuf),

    #[error("missing manifest: {}", .0.display())]
    MissingManifest(PathBuf),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("manifest JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CollectError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
