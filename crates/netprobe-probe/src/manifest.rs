//! Run manifests.
//!
//! The builder accumulates category runs as they finish. A complete manifest is
//! produced once, after the session is closed. If the session is lost mid-run
//! the builder can instead produce a partial manifest (`complete: false`) so
//! evidence already on disk stays attributable.

use chrono::{DateTime, Utc};
use netprobe_spec::SafetyPolicy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::attempt::{Artifact, CommandAttempt};
use crate::config::{ProbeConfig, Target};
use crate::engine::CategoryRun;
use crate::error::ProbeError;

pub const RUN_MANIFEST_FILE: &str = "run_manifest.json";
pub const PARTIAL_MANIFEST_FILE: &str = "run_manifest.partial.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryResults {
    pub succeeded: Vec<String>,
    pub failed: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunManifest {
    pub run_id: Uuid,
    pub collected_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub complete: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abort_reason: Option<String>,
    pub target: Target,
    pub tool: ToolInfo,
    pub safety: SafetyPolicy,
    pub attempts: Vec<CommandAttempt>,
    pub artifacts: Vec<Artifact>,
    pub results_by_category: BTreeMap<String, CategoryResults>,
}

impl RunManifest {
    pub fn file_name(&self) -> &'static str {
        if self.complete {
            RUN_MANIFEST_FILE
        } else {
            PARTIAL_MANIFEST_FILE
        }
    }

    /// Serialize into `run_dir`; returns the manifest path.
    pub fn write(&self, run_dir: &Path) -> Result<PathBuf, ProbeError> {
        let path = run_dir.join(self.file_name());
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json).map_err(|e| ProbeError::io(&path, e))?;
        Ok(path)
    }

    pub fn load(path: &Path) -> Result<Self, ProbeError> {
        let text = std::fs::read_to_string(path).map_err(|e| ProbeError::io(path, e))?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Load whichever manifest a run directory holds, complete first.
    pub fn load_from_run_dir(run_dir: &Path) -> Result<Self, ProbeError> {
        let complete = run_dir.join(RUN_MANIFEST_FILE);
        if complete.exists() {
            return Self::load(&complete);
        }
        Self::load(&run_dir.join(PARTIAL_MANIFEST_FILE))
    }
}

#[derive(Debug)]
pub struct RunManifestBuilder {
    run_id: Uuid,
    collected_at: DateTime<Utc>,
    target: Target,
    tool: ToolInfo,
    safety: SafetyPolicy,
    categories: Vec<String>,
    attempts: Vec<CommandAttempt>,
    artifacts: Vec<Artifact>,
}

impl RunManifestBuilder {
    pub fn new(run_id: Uuid, target: Target, config: &ProbeConfig, safety: SafetyPolicy) -> Self {
        Self {
            run_id,
            collected_at: Utc::now(),
            target,
            tool: ToolInfo {
                name: config.tool_name.clone(),
                version: config.tool_version.clone(),
            },
            safety,
            categories: Vec::new(),
            attempts: Vec::new(),
            artifacts: Vec::new(),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Append a category's records. Categories with no attempts still get an
    /// (empty) summary entry.
    pub fn record(&mut self, run: CategoryRun) {
        if !self.categories.contains(&run.category) {
            self.categories.push(run.category);
        }
        self.attempts.extend(run.attempts);
        self.artifacts.extend(run.artifacts);
    }

    pub fn attempts(&self) -> &[CommandAttempt] {
        &self.attempts
    }

    /// Partition attempts on status. `empty` counts as failed.
    pub fn results_by_category(&self) -> BTreeMap<String, CategoryResults> {
        let mut results: BTreeMap<String, CategoryResults> = self
            .categories
            .iter()
            .map(|c| (c.clone(), CategoryResults::default()))
            .collect();
        for attempt in &self.attempts {
            let entry = results.entry(attempt.category.clone()).or_default();
            if attempt.status.is_success() {
                entry.succeeded.push(attempt.command.clone());
            } else {
                entry.failed.push(attempt.command.clone());
            }
        }
        results
    }

    /// Final manifest for a run whose session closed cleanly.
    pub fn finalize(self) -> RunManifest {
        self.build(true, None)
    }

    /// Manifest for a run cut short by a lost session.
    pub fn finalize_partial(self, reason: impl Into<String>) -> RunManifest {
        self.build(false, Some(reason.into()))
    }

    fn build(self, complete: bool, abort_reason: Option<String>) -> RunManifest {
        let results_by_category = self.results_by_category();
        RunManifest {
            run_id: self.run_id,
            collected_at: self.collected_at,
            completed_at: Utc::now(),
            complete,
            abort_reason,
            target: self.target,
            tool: self.tool,
            safety: self.safety,
            attempts: self.attempts,
            artifacts: self.artifacts,
            results_by_category,
        }
    }
}
