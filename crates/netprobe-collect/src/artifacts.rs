//! Loading a run's raw artifacts for normalization.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::error::CollectError;

pub const ARTIFACTS_DIR: &str = "artifacts";

/// Text of every `artifacts/*.txt` file in a run directory, keyed by file name.
///
/// Bytes that are not valid UTF-8 are replaced rather than rejected; evidence
/// from devices is not guaranteed to be clean text.
#[derive(Debug, Clone, Default)]
pub struct ArtifactSet {
    root: PathBuf,
    files: BTreeMap<String, String>,
}

impl ArtifactSet {
    pub fn load(run_dir: &Path) -> Result<Self, CollectError> {
        let dir = run_dir.join(ARTIFACTS_DIR);
        if !dir.is_dir() {
            return Err(CollectError::MissingArtifacts(run_dir.to_path_buf()));
        }

        let mut files = BTreeMap::new();
        for entry in WalkDir::new(&dir).min_depth(1).max_depth(1).follow_links(false) {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| dir.clone());
                    let source = e
                        .into_io_error()
                        .unwrap_or_else(|| std::io::Error::other("directory walk failed"));
                    return Err(CollectError::io(path, source));
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("txt") {
                continue;
            }
            let bytes = std::fs::read(path).map_err(|e| CollectError::io(path, e))?;
            let name = entry.file_name().to_string_lossy().to_string();
            files.insert(name, String::from_utf8_lossy(&bytes).into_owned());
        }

        debug!(run_dir = %run_dir.display(), artifacts = files.len(), "artifacts loaded");
        Ok(Self {
            root: run_dir.to_path_buf(),
            files,
        })
    }

    /// Build a set directly from `(file name, text)` pairs.
    pub fn from_files<I, K, V>(files: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            root: PathBuf::new(),
            files: files
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.files.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.files.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
