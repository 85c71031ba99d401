//! On-disk artifact store for one run.
//!
//! Layout: `<run_dir>/artifacts/<stem>.txt`. Files are written as soon as each
//! attempt completes and are never overwritten within a run.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::ProbeError;

pub const ARTIFACTS_DIR: &str = "artifacts";
pub const ARTIFACT_EXT: &str = "txt";

#[derive(Debug)]
pub struct ArtifactStore {
    run_dir: PathBuf,
    used: HashSet<String>,
}

impl ArtifactStore {
    pub fn create(run_dir: &Path) -> Result<Self, ProbeError> {
        let artifacts = run_dir.join(ARTIFACTS_DIR);
        std::fs::create_dir_all(&artifacts).map_err(|e| ProbeError::io(&artifacts, e))?;
        Ok(Self {
            run_dir: run_dir.to_path_buf(),
            used: HashSet::new(),
        })
    }

    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    /// Claim a file name for `stem`. If the stem was already used in this run
    /// the attempt index is appended, so evidence is never overwritten.
    pub fn claim(&mut self, stem: &str, attempt_index: usize) -> String {
        let mut name = format!("{stem}.{ARTIFACT_EXT}");
        if self.used.contains(&name) {
            name = format!("{stem}_{attempt_index}.{ARTIFACT_EXT}");
            let mut n = 2usize;
            while self.used.contains(&name) {
                name = format!("{stem}_{attempt_index}_{n}.{ARTIFACT_EXT}");
                n += 1;
            }
        }
        self.used.insert(name.clone());
        name
    }

    /// Write raw bytes under a previously claimed name. Returns the path
    /// relative to the run directory.
    pub fn write(&self, file_name: &str, bytes: &[u8]) -> Result<String, ProbeError> {
        let relative = format!("{ARTIFACTS_DIR}/{file_name}");
        let path = self.run_dir.join(&relative);
        std::fs::write(&path, bytes).map_err(|e| ProbeError::io(&path, e))?;
        Ok(relative)
    }
}
