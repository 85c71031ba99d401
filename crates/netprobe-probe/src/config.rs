//! Probe configuration.
//!
//! Every path and timing the engine uses comes from here; nothing is read from
//! ambient globals. A config file only needs the fields it overrides.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ProbeError;
use crate::session::SendOptions;

pub const TOOL_NAME: &str = "netprobe";
pub const TOOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Configuration for one probe run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ProbeConfig {
    /// Root directory; each run writes to `<output_root>/<run_id>/`.
    pub output_root: PathBuf,
    /// Delay after sending a command before its output is read.
    pub settle_delay_ms: u64,
    /// Delay after each paging-disable command.
    pub paging_settle_ms: u64,
    /// Delay before draining stale channel output ahead of each command.
    pub flush_delay_ms: u64,
    /// Wall-clock budget for a single command.
    pub command_timeout_ms: u64,
    /// Hard ceiling for `command_timeout_ms`; larger values are clamped.
    pub max_command_timeout_ms: u64,
    pub tool_name: String,
    pub tool_version: String,
    pub expansion: ExpansionRule,
}

/// Describes the category whose commands are expanded per discovered entity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ExpansionRule {
    /// Category that gets the two-phase discover/expand treatment.
    pub category: String,
    /// Placeholder substituted with each discovered id.
    pub placeholder: String,
    /// Command whose first successful output seeds the id list.
    pub summary_command: String,
    /// Artifact stem for the summary command's output.
    pub summary_artifact: String,
    /// Artifact stem prefix for per-entity outputs (`<prefix>_<id>`).
    pub entity_prefix: String,
    /// Rendered commands containing this marker are stored as `<prefix>_<id>_detail`.
    pub detail_marker: String,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            output_root: PathBuf::from("probe_output"),
            settle_delay_ms: 1_500,
            paging_settle_ms: 300,
            flush_delay_ms: 200,
            command_timeout_ms: 30_000,
            max_command_timeout_ms: 120_000,
            tool_name: TOOL_NAME.to_string(),
            tool_version: TOOL_VERSION.to_string(),
            expansion: ExpansionRule::default(),
        }
    }
}

impl Default for ExpansionRule {
    fn default() -> Self {
        Self {
            category: "vlans".to_string(),
            placeholder: "vlan_id".to_string(),
            summary_command: "show vlan".to_string(),
            summary_artifact: "vlan_summary".to_string(),
            entity_prefix: "vlan".to_string(),
            detail_marker: "detail".to_string(),
        }
    }
}

impl ProbeConfig {
    /// Load overrides from a JSON file; missing fields keep their defaults.
    pub fn load(path: &Path) -> Result<Self, ProbeError> {
        let text = std::fs::read_to_string(path).map_err(|source| ProbeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: ProbeConfig = serde_json::from_str(&text)?;
        Ok(config)
    }

    /// Per-command timeout after applying the ceiling.
    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms.min(self.max_command_timeout_ms))
    }

    pub fn flush_delay(&self) -> Duration {
        Duration::from_millis(self.flush_delay_ms)
    }

    pub fn send_options(&self) -> SendOptions {
        self.options_with_settle(self.settle_delay_ms)
    }

    pub fn paging_options(&self) -> SendOptions {
        self.options_with_settle(self.paging_settle_ms)
    }

    /// Settle is capped at half the timeout so every command keeps time to read.
    fn options_with_settle(&self, settle_ms: u64) -> SendOptions {
        let timeout = self.command_timeout();
        SendOptions {
            settle: Duration::from_millis(settle_ms).min(timeout / 2),
            timeout,
        }
    }

    /// Zero delays everywhere; used by replay runs and tests.
    pub fn without_delays(mut self) -> Self {
        self.settle_delay_ms = 0;
        self.paging_settle_ms = 0;
        self.flush_delay_ms = 0;
        self
    }
}

impl ExpansionRule {
    pub fn is_summary(&self, command: &str) -> bool {
        normalize_ws(command).eq_ignore_ascii_case(&normalize_ws(&self.summary_command))
    }
}

fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// The device a run is pointed at, as recorded in the run manifest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Target {
    pub host: String,
    pub port: u16,
    pub transport: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform_guess: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor_guess: Option<String>,
    pub auth_method: String,
}

impl Target {
    pub fn ssh(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: 22,
            transport: "ssh".to_string(),
            platform_guess: None,
            vendor_guess: None,
            auth_method: "key".to_string(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform_guess = Some(platform.into());
        self
    }

    pub fn with_vendor(mut self, vendor: impl Into<String>) -> Self {
        self.vendor_guess = Some(vendor.into());
        self
    }
}
