//! ArubaOS-Switch (ProCurve lineage) access and core switches.

use regex::Regex;
use std::sync::OnceLock;

use super::{Collector, ManifestDraft, Parsed};
use crate::artifacts::ArtifactSet;
use crate::manifest::{CollectorManifest, Inventory, VlanRecord};
use crate::text::{capture, prompt_identity, ColumnLayout};

pub const COLLECTOR_NAME: &str = "aruba_switch";
pub const COLLECTOR_VERSION: &str = "1.0";

pub const CAPABILITY_KEYS: &[&str] = &["inventory", "vlans", "interfaces", "lldp", "poe", "mac_table"];

const INVENTORY_ARTIFACT: &str = "inventory_1.txt";
const VERSION_ARTIFACT: &str = "inventory_2.txt";
/// Expansion summary first; a command set without expansion leaves it as
/// the first `vlans` artifact.
const VLAN_ARTIFACTS: &[&str] = &["vlan_summary.txt", "vlans_1.txt"];

const VLAN_COLUMNS: &[(&str, &str)] = &[
    ("id", "VLAN ID"),
    ("name", "Name"),
    ("status", "Status"),
    ("voice", "Voice"),
    ("jumbo", "Jumbo"),
];

/// `<label> : <value>` where the value ends at a run of 2+ spaces (the
/// second column of `show system`) or end of line.
fn field_re(label: &str) -> Regex {
    Regex::new(&format!(r"(?m){label}[ \t]*:[ \t]*(\S(?:.*?\S)?)(?:[ \t]{{2,}}|[ \t\r]*$)"))
        .expect("field regex")
}

fn software_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| field_re("Software revision"))
}

fn serial_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| field_re("Serial Number"))
}

fn uptime_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| field_re("Up Time"))
}

fn system_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| field_re("System Name"))
}

fn model_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| field_re("(?:Product Name|Product Number|Model)"))
}

fn vlan_row_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*(\d+)\s").expect("vlan row regex"))
}

/// `show system` key/value harvesting.
pub fn parse_inventory(text: &str) -> Parsed<Inventory> {
    let inventory = Inventory {
        model: capture(model_re(), text),
        os_version: capture(software_re(), text),
        uptime: capture(uptime_re(), text),
        serial: capture(serial_re(), text),
        device_id: capture(system_name_re(), text).or_else(|| prompt_identity(text)),
    };
    if inventory.os_version.is_none() && inventory.serial.is_none() && inventory.uptime.is_none() {
        Parsed::ambiguous(inventory, "no system information fields recognized")
    } else {
        Parsed::ok(inventory)
    }
}

/// VLAN table from `show vlan`, sliced on the header's column offsets.
pub fn parse_vlans(text: &str) -> Parsed<Vec<VlanRecord>> {
    let mut lines = text.lines();
    let Some(header) = lines.by_ref().find(|l| l.trim_start().starts_with("VLAN ID")) else {
        return Parsed::ambiguous(Vec::new(), "vlan table header not found");
    };
    let Some(layout) = ColumnLayout::from_header(header, VLAN_COLUMNS) else {
        return Parsed::ambiguous(Vec::new(), "vlan table header not found");
    };

    let vlans = lines
        .filter_map(|line| {
            let id = vlan_row_re().captures(line)?[1].parse::<u32>().ok()?;
            let row = layout.slice(line);
            Some(VlanRecord {
                id,
                name: row.get("name"),
                status: row.get("status"),
                voice: row.get("voice"),
                jumbo: row.get("jumbo"),
                ports_artifact: None,
                detail_artifact: None,
            })
        })
        .collect();
    Parsed::rows(vlans, "vlan")
}

/// Point each record at its per-vlan evidence, where captured.
fn link_vlan_evidence(vlans: &mut [VlanRecord], artifacts: &ArtifactSet) {
    for vlan in vlans {
        let ports = format!("vlan_{}.txt", vlan.id);
        let detail = format!("vlan_{}_detail.txt", vlan.id);
        vlan.ports_artifact = artifacts.contains(&ports).then_some(ports);
        vlan.detail_artifact = artifacts.contains(&detail).then_some(detail);
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ArubaSwitchCollector;

impl Collector for ArubaSwitchCollector {
    fn name(&self) -> &'static str {
        COLLECTOR_NAME
    }

    fn version(&self) -> &'static str {
        COLLECTOR_VERSION
    }

    fn collect(&self, artifacts: &ArtifactSet) -> CollectorManifest {
        let mut draft = ManifestDraft::new(artifacts, CAPABILITY_KEYS);

        let mut inventory = draft.feature("inventory", &[INVENTORY_ARTIFACT], parse_inventory);
        if let Some(inv) = inventory.as_mut() {
            if inv.model.is_none() {
                inv.model = artifacts
                    .get(VERSION_ARTIFACT)
                    .and_then(|text| capture(model_re(), text));
            }
        }

        let mut vlans = draft.feature("vlans", VLAN_ARTIFACTS, parse_vlans);
        if let Some(vlans) = vlans.as_mut() {
            link_vlan_evidence(vlans, artifacts);
        }

        let mut manifest = draft.finish(COLLECTOR_NAME, COLLECTOR_VERSION);
        manifest.inventory = inventory;
        manifest.vlans = vlans;
        manifest
    }
}
