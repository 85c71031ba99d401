//! Artifact integrity check.
//!
//! Recomputes every artifact's content hash and compares it with the value the
//! manifest recorded at capture time.

use std::path::Path;

use netprobe_spec::verify_content_hash;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::ProbeError;
use crate::manifest::RunManifest;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IntegrityReport {
    pub checked: usize,
    /// Artifact paths whose bytes no longer match the recorded checksum.
    pub mismatched: Vec<String>,
    /// Artifact paths listed in the manifest but absent on disk.
    pub missing: Vec<String>,
}

impl IntegrityReport {
    pub fn is_clean(&self) -> bool {
        self.mismatched.is_empty() && self.missing.is_empty()
    }
}

/// Verify a run directory against whichever manifest it holds.
pub fn verify_run(run_dir: &Path) -> Result<IntegrityReport, ProbeError> {
    let manifest = RunManifest::load_from_run_dir(run_dir)?;
    let mut report = IntegrityReport::default();

    for artifact in &manifest.artifacts {
        let path = run_dir.join(&artifact.path);
        report.checked += 1;
        match std::fs::read(&path) {
            Ok(bytes) => {
                if !verify_content_hash(&artifact.checksum, &bytes) {
                    warn!(artifact = %artifact.path, "checksum mismatch");
                    report.mismatched.push(artifact.path.clone());
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(artifact = %artifact.path, "artifact missing");
                report.missing.push(artifact.path.clone());
            }
            Err(e) => return Err(ProbeError::io(path, e)),
        }
    }

    info!(
        run_id = %manifest.run_id,
        checked = report.checked,
        mismatched = report.mismatched.len(),
        missing = report.missing.len(),
        "integrity check finished"
    );
    Ok(report)
}
