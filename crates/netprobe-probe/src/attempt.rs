//! Attempt and artifact records.

use serde::{Deserialize, Serialize};

/// Outcome of exactly one execution. Assigned once, never corrected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    Success,
    Empty,
    Failed,
}

impl AttemptStatus {
    /// Classify bytes the session returned without error.
    pub fn classify(output: &[u8]) -> Self {
        if output.iter().all(|b| b.is_ascii_whitespace()) {
            AttemptStatus::Empty
        } else {
            AttemptStatus::Success
        }
    }

    pub fn is_success(self) -> bool {
        self == AttemptStatus::Success
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AttemptStatus::Success => "success",
            AttemptStatus::Empty => "empty",
            AttemptStatus::Failed => "failed",
        }
    }
}

/// One execution of one rendered command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandAttempt {
    pub command: String,
    pub category: String,
    pub attempt_index: usize,
    pub status: AttemptStatus,
    pub duration_ms: u64,
    pub error: Option<String>,
    /// Relative to the run directory.
    pub artifact_path: String,
    /// Raw output; the artifact file is the persisted copy.
    #[serde(skip)]
    pub output: Vec<u8>,
}

/// Persisted raw output of one attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    /// Relative to the run directory.
    pub path: String,
    pub category: String,
    pub command: String,
    pub checksum: String,
    pub status: AttemptStatus,
    pub duration_ms: u64,
}
