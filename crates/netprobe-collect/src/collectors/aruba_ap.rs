//! Aruba access points (Instant / AOS-10 CLI).
//!
//! AP prompts are the radio MAC (`bc:9f:e4:c3:f2:82#`), which also serves as
//! the AP's identity in the manifest.

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

use super::{Collector, ManifestDraft, Parsed};
use crate::artifacts::ArtifactSet;
use crate::manifest::{CollectorManifest, Inventory};
use crate::text::{capture, key_value_lines, prompt_identity, strip_prompt_lines};

pub const COLLECTOR_NAME: &str = "aruba_ap";
pub const COLLECTOR_VERSION: &str = "1.1";

pub const CAPABILITY_KEYS: &[&str] = &[
    "inventory",
    "power",
    "interfaces",
    "vlans",
    "lldp",
    "clients",
    "ssids",
    "mac_table",
];

const INVENTORY_ARTIFACT: &str = "inventory_1.txt";
const POWER_ARTIFACT: &str = "poe_1.txt";

fn model_version_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"MODEL:\s*([^)]+)\).*Version\s+([\w.\-]+)").expect("model/version regex")
    })
}

fn uptime_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"AP uptime is (.+)").expect("uptime regex"))
}

pub fn parse_inventory(text: &str) -> Parsed<Inventory> {
    let mut inventory = Inventory {
        uptime: capture(uptime_re(), text),
        device_id: prompt_identity(text),
        ..Default::default()
    };
    if let Some(caps) = model_version_re().captures(text) {
        inventory.model = Some(caps[1].trim().to_string());
        inventory.os_version = Some(caps[2].trim().to_string());
    }

    if inventory.model.is_none() && inventory.uptime.is_none() {
        Parsed::ambiguous(inventory, "no version banner recognized")
    } else {
        Parsed::ok(inventory)
    }
}

/// PoE/power status as reported: every `key: value` line, prompts removed.
pub fn parse_power(text: &str) -> Parsed<BTreeMap<String, String>> {
    let power: BTreeMap<String, String> = key_value_lines(&strip_prompt_lines(text))
        .into_iter()
        .collect();
    if power.is_empty() {
        Parsed::ambiguous(power, "no key/value lines recognized")
    } else {
        Parsed::ok(power)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ArubaApCollector;

impl Collector for ArubaApCollector {
    fn name(&self) -> &'static str {
        COLLECTOR_NAME
    }

    fn version(&self) -> &'static str {
        COLLECTOR_VERSION
    }

    fn collect(&self, artifacts: &ArtifactSet) -> CollectorManifest {
        let mut draft = ManifestDraft::new(artifacts, CAPABILITY_KEYS);
        let inventory = draft.feature("inventory", &[INVENTORY_ARTIFACT], parse_inventory);
        let power = draft.feature("power", &[POWER_ARTIFACT], parse_power);

        let mut manifest = draft.finish(COLLECTOR_NAME, COLLECTOR_VERSION);
        manifest.inventory = inventory;
        manifest.power = power;
        manifest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::Capability;

    const SHOW_VERSION: &str = "\
bc:9f:e4:c3:f2:82# show version
Aruba Operating System Software.
ArubaOS (MODEL: 515), Version 8.10.0.6
Copyright (c) 2002-2023, Hewlett Packard Enterprise Development LP.
AP uptime is 12 days 3 hours 15 minutes 2 seconds
Reboot Time and Cause: Reboot caused by power cycle
bc:9f:e4:c3:f2:82# ";

    const SHOW_AP_POWER: &str = "\
bc:9f:e4:c3:f2:82# show ap-power
Current Operational State: POE-AT: No restrictions
----------------------------------------------
Power Drawn: 13.2 W
LLDP Power: 25.5W
bc:9f:e4:c3:f2:82# ";

    #[test]
    fn inventory_from_version_banner() {
        let parsed = parse_inventory(SHOW_VERSION);
        assert_eq!(parsed.ambiguity, None);
        let inv = parsed.value;
        assert_eq!(inv.model.as_deref(), Some("515"));
        assert_eq!(inv.os_version.as_deref(), Some("8.10.0.6"));
        assert_eq!(inv.uptime.as_deref(), Some("12 days 3 hours 15 minutes 2 seconds"));
        assert_eq!(inv.device_id.as_deref(), Some("bc:9f:e4:c3:f2:82"));
    }

    #[test]
    fn power_key_values_without_prompts_or_rules() {
        let power = parse_power(SHOW_AP_POWER).value;
        assert_eq!(power["Current Operational State"], "POE-AT: No restrictions");
        assert_eq!(power["Power Drawn"], "13.2 W");
        assert_eq!(power.len(), 3);
    }

    #[test]
    fn missing_artifact_is_not_supported_but_garbage_is_supported() {
        let artifacts = ArtifactSet::from_files([("poe_1.txt", "% Invalid input detected")]);
        let manifest = ArubaApCollector.collect(&artifacts);

        assert_eq!(manifest.capabilities.get("inventory"), Some(Capability::NotSupported));
        assert!(manifest.inventory.is_none());
        assert_eq!(manifest.capabilities.get("power"), Some(Capability::Supported));
        assert_eq!(manifest.power, Some(BTreeMap::new()));
        assert_eq!(
            manifest.parse_notes,
            vec!["power: no key/value lines recognized"]
        );
        assert_eq!(manifest.capabilities.keys().collect::<Vec<_>>(), CAPABILITY_KEYS);
    }
}
