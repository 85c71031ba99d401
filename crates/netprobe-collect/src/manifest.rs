//! Collector manifest and the normalized records it carries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::capabilities::CapabilityMatrix;
use crate::error::CollectError;

pub const COLLECTOR_MANIFEST_FILE: &str = "collector_manifest.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    pub model: Option<String>,
    pub os_version: Option<String>,
    pub uptime: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial: Option<String>,
    /// Identifier the device uses for itself (hostname or prompt identity).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct License {
    pub key: String,
    pub installed: String,
    pub expires: String,
    pub flags: String,
    pub service: String,
}

/// One wireless client as reported by a controller's user table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub ip: Option<String>,
    pub mac: Option<String>,
    pub name: Option<String>,
    pub role: Option<String>,
    pub auth_age: Option<String>,
    pub ap: Option<String>,
    pub essid: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VlanRecord {
    pub id: u32,
    pub name: Option<String>,
    pub status: Option<String>,
    pub voice: Option<String>,
    pub jumbo: Option<String>,
    /// Per-vlan artifact captured during expansion, if any.
    pub ports_artifact: Option<String>,
    pub detail_artifact: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectorManifest {
    pub collector: String,
    pub collector_version: String,
    pub collected_at: DateTime<Utc>,
    pub capabilities: CapabilityMatrix,
    pub parse_notes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inventory: Option<Inventory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub licenses: Option<Vec<License>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtual_aps: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clients: Option<Vec<Client>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vlans: Option<Vec<VlanRecord>>,
}

impl CollectorManifest {
    pub fn new(collector: &str, collector_version: &str, capabilities: CapabilityMatrix) -> Self {
        Self {
            collector: collector.to_string(),
            collector_version: collector_version.to_string(),
            collected_at: Utc::now(),
            capabilities,
            parse_notes: Vec::new(),
            inventory: None,
            licenses: None,
            ssids: None,
            virtual_aps: None,
            clients: None,
            power: None,
            vlans: None,
        }
    }

    /// Identity of the device this manifest describes, if one was recognized.
    pub fn device_id(&self) -> Option<&str> {
        self.inventory.as_ref()?.device_id.as_deref()
    }

    /// Serialize into `run_dir`; returns the manifest path.
    pub fn write(&self, run_dir: &Path) -> Result<PathBuf, CollectError> {
        let path = run_dir.join(COLLECTOR_MANIFEST_FILE);
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json).map_err(|e| CollectError::io(&path, e))?;
        Ok(path)
    }

    pub fn load_from_run_dir(run_dir: &Path) -> Result<Self, CollectError> {
        let path = run_dir.join(COLLECTOR_MANIFEST_FILE);
        if !path.is_file() {
            return Err(CollectError::MissingManifest(path));
        }
        let text = std::fs::read_to_string(&path).map_err(|e| CollectError::io(&path, e))?;
        Ok(serde_json::from_str(&text)?)
    }
}
