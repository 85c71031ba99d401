//! Probe errors.
//!
//! Only fatal conditions are errors. A command that fails or returns nothing is
//! recorded as an attempt status and never surfaces here.

use std::path::PathBuf;

use netprobe_spec::{BlockedKeyword, SpecError};

use crate::session::SessionError;

#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error(transparent)]
    Spec(#[from] SpecError),

    #[error("run aborted: {0}")]
    Blocked(#[from] BlockedKeyword),

    #[error("transport error: {0}")]
    Transport(#[source] SessionError),

    #[error("session lost mid-run: {source} (partial manifest: {})", partial_manifest.display())]
    TransportLost {
        #[source]
        source: SessionError,
        partial_manifest: PathBuf,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("manifest JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ProbeError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
