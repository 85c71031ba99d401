//! Per-platform collectors.
//!
//! A collector reads a run's artifacts and never talks to a device. Each one
//! has a fixed capability key set and a fixed artifact per parsed feature.
//! Feature parsers are pure: text in, [`Parsed`] out, never an error.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::{info, warn};

use crate::artifacts::ArtifactSet;
use crate::capabilities::CapabilityMatrix;
use crate::error::CollectError;
use crate::manifest::CollectorManifest;

pub mod aruba_ap;
pub mod aruba_controller;
pub mod aruba_switch;

// ============================================================================
// Parser results
// ============================================================================

/// Result of one feature parser. `ambiguity` is set when the artifact was
/// present but did not contain what the parser looks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parsed<T> {
    pub value: T,
    pub ambiguity: Option<String>,
}

impl<T> Parsed<T> {
    pub fn ok(value: T) -> Self {
        Self {
            value,
            ambiguity: None,
        }
    }

    pub fn ambiguous(value: T, reason: impl Into<String>) -> Self {
        Self {
            value,
            ambiguity: Some(reason.into()),
        }
    }
}

impl<T> Parsed<Vec<T>> {
    /// Flag an empty row set as ambiguous.
    pub fn rows(rows: Vec<T>, what: &str) -> Self {
        if rows.is_empty() {
            Self::ambiguous(rows, format!("no {what} rows recognized"))
        } else {
            Self::ok(rows)
        }
    }
}

/// Accumulates capabilities and parse notes while a collector runs.
pub(crate) struct ManifestDraft<'a> {
    artifacts: &'a ArtifactSet,
    capabilities: CapabilityMatrix,
    notes: Vec<String>,
}

impl<'a> ManifestDraft<'a> {
    pub(crate) fn new(artifacts: &'a ArtifactSet, keys: &[&str]) -> Self {
        Self {
            artifacts,
            capabilities: CapabilityMatrix::new(keys),
            notes: Vec::new(),
        }
    }

    pub(crate) fn artifacts(&self) -> &'a ArtifactSet {
        self.artifacts
    }

    /// Parse `feature` from the first of `sources` that exists. Without a
    /// source the capability stays `not_supported` and `None` is returned.
    pub(crate) fn feature<T>(
        &mut self,
        feature: &str,
        sources: &[&str],
        parse: impl FnOnce(&str) -> Parsed<T>,
    ) -> Option<T> {
        let artifacts = self.artifacts;
        let text = sources.iter().find_map(|s| artifacts.get(s))?;
        self.capabilities.mark_supported(feature);
        let parsed = parse(text);
        if let Some(reason) = parsed.ambiguity {
            self.note(feature, &reason);
        }
        Some(parsed.value)
    }

    pub(crate) fn note(&mut self, feature: &str, reason: &str) {
        warn!(feature, reason, "parse ambiguity");
        self.notes.push(format!("{feature}: {reason}"));
    }

    pub(crate) fn finish(self, collector: &str, version: &str) -> CollectorManifest {
        let mut manifest = CollectorManifest::new(collector, version, self.capabilities);
        manifest.parse_notes = self.notes;
        manifest
    }
}

// ============================================================================
// Platforms
// ============================================================================

pub trait Collector: Send + Sync {
    fn name(&self) -> &'static str;
    fn version(&self) -> &'static str;
    fn collect(&self, artifacts: &ArtifactSet) -> CollectorManifest;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    ArubaAp,
    ArubaController,
    ArubaSwitch,
}

impl Platform {
    pub const ALL: [Platform; 3] = [
        Platform::ArubaAp,
        Platform::ArubaController,
        Platform::ArubaSwitch,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Platform::ArubaAp => aruba_ap::COLLECTOR_NAME,
            Platform::ArubaController => aruba_controller::COLLECTOR_NAME,
            Platform::ArubaSwitch => aruba_switch::COLLECTOR_NAME,
        }
    }

    pub fn collector(self) -> Box<dyn Collector> {
        match self {
            Platform::ArubaAp => Box::new(aruba_ap::ArubaApCollector),
            Platform::ArubaController => Box::new(aruba_controller::ArubaControllerCollector),
            Platform::ArubaSwitch => Box::new(aruba_switch::ArubaSwitchCollector),
        }
    }
}

impl FromStr for Platform {
    type Err = CollectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        Platform::ALL
            .into_iter()
            .find(|p| p.as_str() == wanted)
            .ok_or_else(|| CollectError::UnknownPlatform(s.to_string()))
    }
}

/// Normalize one run directory and write its `collector_manifest.json`.
pub fn run_collector(
    platform: Platform,
    run_dir: &Path,
) -> Result<(CollectorManifest, PathBuf), CollectError> {
    let artifacts = ArtifactSet::load(run_dir)?;
    let collector = platform.collector();
    let manifest = collector.collect(&artifacts);
    let path = manifest.write(run_dir)?;
    info!(
        collector = collector.name(),
        version = collector.version(),
        run_dir = %run_dir.display(),
        notes = manifest.parse_notes.len(),
        "collection complete"
    );
    Ok((manifest, path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::Capability;

    #[test]
    fn platform_names_parse() {
        assert_eq!("aruba_ap".parse::<Platform>().unwrap(), Platform::ArubaAp);
        assert_eq!(
            "Aruba-Controller".parse::<Platform>().unwrap(),
            Platform::ArubaController
        );
        assert!(matches!(
            "cisco_ios".parse::<Platform>(),
            Err(CollectError::UnknownPlatform(_))
        ));
    }

    #[test]
    fn draft_marks_support_only_when_a_source_exists() {
        let artifacts = ArtifactSet::from_files([("poe_1.txt", "garbage")]);
        let mut draft = ManifestDraft::new(&artifacts, &["inventory", "power"]);

        let inventory: Option<u32> = draft.feature("inventory", &["inventory_1.txt"], |_| {
            Parsed::ok(1)
        });
        let power = draft.feature("power", &["poe_1.txt"], |_| {
            Parsed::ambiguous(0u32, "no key/value lines recognized")
        });
        let manifest = draft.finish("aruba_ap", "1.1");

        assert_eq!(inventory, None);
        assert_eq!(power, Some(0));
        assert_eq!(manifest.capabilities.get("inventory"), Some(Capability::NotSupported));
        assert_eq!(manifest.capabilities.get("power"), Some(Capability::Supported));
        assert_eq!(manifest.parse_notes, vec!["power: no key/value lines recognized"]);
    }
}
