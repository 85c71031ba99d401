//! AP to client correlation across an AP and a controller collector manifest.
//!
//! AP naming is never assumed to be consistent between the two sources. Clients
//! are always grouped by the AP the controller reports, and every gap in the
//! correlation is recorded as an explicit note.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::CollectError;
use crate::manifest::{Client, CollectorManifest};

pub const DERIVED_DIR: &str = "derived";
pub const CORRELATION_FILE: &str = "ap_client_correlation.json";
/// Group for clients whose AP field is missing or blank.
pub const UNKNOWN_AP: &str = "UNKNOWN";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrelationSource {
    pub ap_collector: String,
    pub ap_version: String,
    pub controller_collector: String,
    pub controller_version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrelationSummary {
    pub aps_seen: usize,
    pub clients_seen: usize,
    pub clients_correlated: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrelatedView {
    pub derived_at: DateTime<Utc>,
    pub source: CorrelationSource,
    pub summary: CorrelationSummary,
    pub notes: Vec<String>,
    pub aps: BTreeMap<String, Vec<Client>>,
}

/// Group controller clients by reported AP and count those whose AP matches
/// the AP manifest's own identity (case-insensitive).
pub fn correlate(ap: &CollectorManifest, controller: &CollectorManifest) -> CorrelatedView {
    let clients: &[Client] = controller.clients.as_deref().unwrap_or_default();
    let mut notes = Vec::new();

    if !controller.capabilities.is_supported("clients") {
        notes.push("controller manifest carries no client evidence".to_string());
    }

    let mut aps: BTreeMap<String, Vec<Client>> = BTreeMap::new();
    for client in clients {
        let key = client
            .ap
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(UNKNOWN_AP);
        aps.entry(key.to_string()).or_default().push(client.clone());
    }

    let identities: HashSet<String> = ap
        .device_id()
        .map(|id| id.to_lowercase())
        .into_iter()
        .collect();
    let clients_correlated = clients
        .iter()
        .filter_map(|c| c.ap.as_deref())
        .filter(|name| identities.contains(&name.trim().to_lowercase()))
        .count();

    match ap.device_id() {
        None => notes.push(
            "AP collector emitted no AP identity; AP names cannot be matched to controller client AP fields"
                .to_string(),
        ),
        Some(id) if !clients.is_empty() && clients_correlated == 0 => notes.push(format!(
            "AP identity '{id}' does not match any controller client AP field; AP naming is not compatible between sources"
        )),
        Some(_) => {}
    }

    for note in &notes {
        warn!(note = %note, "correlation gap");
    }

    CorrelatedView {
        derived_at: Utc::now(),
        source: CorrelationSource {
            ap_collector: ap.collector.clone(),
            ap_version: ap.collector_version.clone(),
            controller_collector: controller.collector.clone(),
            controller_version: controller.collector_version.clone(),
        },
        summary: CorrelationSummary {
            aps_seen: aps.len(),
            clients_seen: clients.len(),
            clients_correlated,
        },
        notes,
        aps,
    }
}

/// Where the correlation for an AP run directory is written:
/// `<ap_run_dir>/../derived/ap_client_correlation.json`.
pub fn correlation_path(ap_run_dir: &Path) -> PathBuf {
    ap_run_dir
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(DERIVED_DIR)
        .join(CORRELATION_FILE)
}

/// Load both collector manifests, correlate, and write the derived view.
pub fn derive_ap_client_map(
    ap_run_dir: &Path,
    controller_run_dir: &Path,
) -> Result<(CorrelatedView, PathBuf), CollectError> {
    let ap = CollectorManifest::load_from_run_dir(ap_run_dir)?;
    let controller = CollectorManifest::load_from_run_dir(controller_run_dir)?;
    let view = correlate(&ap, &controller);

    let path = correlation_path(ap_run_dir);
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| CollectError::io(dir, e))?;
    }
    let json = serde_json::to_string_pretty(&view)?;
    std::fs::write(&path, json).map_err(|e| CollectError::io(&path, e))?;

    info!(
        aps_seen = view.summary.aps_seen,
        clients_seen = view.summary.clients_seen,
        clients_correlated = view.summary.clients_correlated,
        output = %path.display(),
        "derived AP to client correlation"
    );
    Ok((view, path))
}
