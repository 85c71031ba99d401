//! ArubaOS mobility controllers (e.g. 7210).
//!
//! Evidence sources are fixed by the controller command set's category layout:
//! `show version` is `inventory_1`, `show license` is `inventory_5`, the SSID
//! and virtual-AP profile lists are `vlans_1`/`vlans_2`, and `show user-table`
//! is `mac_table_1`.

use regex::Regex;
use std::sync::OnceLock;

use super::{Collector, ManifestDraft, Parsed};
use crate::artifacts::ArtifactSet;
use crate::manifest::{Client, CollectorManifest, Inventory, License};
use crate::text::{capture, lines_after_marker, prompt_identity, ColumnLayout};

pub const COLLECTOR_NAME: &str = "aruba_controller";
pub const COLLECTOR_VERSION: &str = "1.1";

pub const CAPABILITY_KEYS: &[&str] = &[
    "inventory",
    "licenses",
    "clients",
    "ssids",
    "virtual_aps",
    "interfaces",
    "lldp",
    "poe",
    "vlans",
];

const INVENTORY_ARTIFACT: &str = "inventory_1.txt";
const HARDWARE_ARTIFACT: &str = "inventory_2.txt";
const LICENSE_ARTIFACT: &str = "inventory_5.txt";
const SSID_ARTIFACT: &str = "vlans_1.txt";
const VAP_ARTIFACT: &str = "vlans_2.txt";
const USER_TABLE_ARTIFACT: &str = "mac_table_1.txt";

const LICENSE_MARKER: &str = "License Table";
const SSID_MARKER: &str = "SSID Profile List";
const VAP_MARKER: &str = "Virtual AP profile List";

/// Output keys and the user-table header labels they are sliced from.
const CLIENT_COLUMNS: &[(&str, &str)] = &[
    ("ip", "IP"),
    ("mac", "MAC"),
    ("name", "Name"),
    ("role", "Role"),
    ("auth_age", "Age"),
    ("ap", "AP name"),
    ("essid", "Essid"),
    // Bound the columns above; not reported.
    ("auth", "Auth"),
    ("vpn_link", "VPN link"),
    ("roaming", "Roaming"),
    ("profile", "Profile"),
    ("forward_mode", "Forward mode"),
];

fn version_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"ArubaOS \(MODEL:\s*([^)]+)\), Version ([\d.]+)").expect("version regex")
    })
}

fn uptime_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Switch uptime is (.+)").expect("uptime regex"))
}

fn serial_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)(?:System Serial#|Serial ?#|Serial Number)\s*:\s*(\S+)")
            .expect("serial regex")
    })
}

fn license_row_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Z0-9+/=-]{20,}").expect("license row regex"))
}

fn column_split_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s{2,}").expect("column split regex"))
}

fn profile_row_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\S+\s+\d+").expect("profile row regex"))
}

fn client_row_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*\d+\.\d+\.\d+\.\d+").expect("client row regex"))
}

pub fn parse_inventory(text: &str) -> Parsed<Inventory> {
    let mut inventory = Inventory {
        uptime: capture(uptime_re(), text),
        serial: capture(serial_re(), text),
        device_id: prompt_identity(text),
        ..Default::default()
    };
    if let Some(caps) = version_re().captures(text) {
        inventory.model = Some(caps[1].trim().to_string());
        inventory.os_version = Some(caps[2].to_string());
    }

    if inventory.model.is_none() && inventory.uptime.is_none() {
        Parsed::ambiguous(inventory, "no ArubaOS version banner recognized")
    } else {
        Parsed::ok(inventory)
    }
}

/// Serial number from a hardware inventory listing (`show inventory`).
pub fn parse_serial(text: &str) -> Option<String> {
    capture(serial_re(), text)
}

pub fn parse_licenses(text: &str) -> Parsed<Vec<License>> {
    let Some(lines) = lines_after_marker(text, LICENSE_MARKER) else {
        return Parsed::ambiguous(Vec::new(), format!("marker '{LICENSE_MARKER}' not found"));
    };

    let licenses = lines
        .into_iter()
        .filter(|line| license_row_re().is_match(line))
        .filter_map(|line| {
            let parts: Vec<&str> = column_split_re().split(line.trim()).collect();
            match parts.as_slice() {
                [key, installed, expires, flags, service, ..] => Some(License {
                    key: key.to_string(),
                    installed: installed.to_string(),
                    expires: expires.to_string(),
                    flags: flags.to_string(),
                    service: service.to_string(),
                }),
                _ => None,
            }
        })
        .collect();
    Parsed::rows(licenses, "license")
}

/// Profile names from a `<marker>` listing, excluding `default`.
fn profile_names(text: &str, marker: &str, what: &str) -> Parsed<Vec<String>> {
    let Some(lines) = lines_after_marker(text, marker) else {
        return Parsed::ambiguous(Vec::new(), format!("marker '{marker}' not found"));
    };

    let rows: Vec<&str> = lines
        .into_iter()
        .filter(|line| profile_row_re().is_match(line))
        .filter_map(|line| line.split_whitespace().next())
        .collect();
    if rows.is_empty() {
        return Parsed::ambiguous(Vec::new(), format!("no {what} rows recognized"));
    }
    Parsed::ok(
        rows.into_iter()
            .filter(|name| !name.eq_ignore_ascii_case("default"))
            .map(str::to_string)
            .collect(),
    )
}

pub fn parse_ssids(text: &str) -> Parsed<Vec<String>> {
    profile_names(text, SSID_MARKER, "ssid profile")
}

pub fn parse_virtual_aps(text: &str) -> Parsed<Vec<String>> {
    profile_names(text, VAP_MARKER, "virtual AP profile")
}

/// `show user-table`, sliced on header offsets so blank optional columns do
/// not shift later fields.
pub fn parse_clients(text: &str) -> Parsed<Vec<Client>> {
    let mut lines = text.lines();
    let Some(header) = lines.by_ref().find(|l| l.trim_start().starts_with("IP")) else {
        return Parsed::ambiguous(Vec::new(), "user table header not found");
    };
    let Some(layout) = ColumnLayout::from_header(header, CLIENT_COLUMNS) else {
        return Parsed::ambiguous(Vec::new(), "user table header not found");
    };

    let clients = lines
        .filter(|line| client_row_re().is_match(line))
        .map(|line| {
            let row = layout.slice(line);
            Client {
                ip: row.get("ip"),
                mac: row.get("mac"),
                name: row.get("name"),
                role: row.get("role"),
                auth_age: row.get("auth_age"),
                ap: row.get("ap"),
                essid: row.get("essid"),
            }
        })
        .collect();
    Parsed::rows(clients, "client")
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ArubaControllerCollector;

impl Collector for ArubaControllerCollector {
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
            if inv.serial.is_none() {
                inv.serial = draft.artifacts().get(HARDWARE_ARTIFACT).and_then(parse_serial);
            }
        }
        let licenses = draft.feature("licenses", &[LICENSE_ARTIFACT], parse_licenses);
        let ssids = draft.feature("ssids", &[SSID_ARTIFACT], parse_ssids);
        let virtual_aps = draft.feature("virtual_aps", &[VAP_ARTIFACT], parse_virtual_aps);
        let clients = draft.feature("clients", &[USER_TABLE_ARTIFACT], parse_clients);

        let mut manifest = draft.finish(COLLECTOR_NAME, COLLECTOR_VERSION);
        manifest.inventory = inventory;
        manifest.licenses = licenses;
        manifest.ssids = ssids;
        manifest.virtual_aps = virtual_aps;
        manifest.clients = clients;
        manifest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::Capability;

    const SHOW_VERSION: &str = "\
(MM-7210) #show version
Aruba Operating System Software.
ArubaOS (MODEL: Aruba7210-US), Version 8.6.0.17
Website: http://www.arubanetworks.com
Switch uptime is 45 days 2 hours 10 minutes 30 seconds
Reboot Cause: User reboot.

(MM-7210) #";

    const SHOW_LICENSE: &str = "\
(MM-7210) #show license

License Table
-------------
Key                                            Installed                Expires  Flags  Service Type
---                                            ---------                -------  -----  ------------
QWERTY12ABCD34EFGH56IJKL78MN+/=                2021-03-04 10:11:12      Never    E      Access Points: 32
ZXCV98-SHORT  2021-03-04 10:11:12  Never  E  PEF
";

    const SSID_PROFILES: &str = "\
SSID Profile List
-----------------
Name          References  Profile Status
----          ----------  --------------
corp-ssid     2
default       1
guest-ssid    1

Total:3
";

    const USER_TABLE: &str = "\
Users
-----
    IP              MAC                Name    Role      Age(d:h:m)  Auth     VPN link  AP name     Roaming   Essid/Bssid/Phy
----------          ------------       ------  ----      ----------  ----     --------  -------     -------   ---------------
10.10.20.15         aa:bb:cc:00:11:22  jdoe    employee  00:01:10    802.1x             AP-12       Wireless  corp-ssid/00:11:22:33:44:55/5GHz
10.10.30.7          aa:bb:cc:00:11:99          guest     00:00:02                                    Wireless  guest-ssid/00:11:22:33:44:66/2.4GHz

User Entries: 2/2
";

    #[test]
    fn inventory_from_show_version() {
        let inv = parse_inventory(SHOW_VERSION).value;
        assert_eq!(inv.model.as_deref(), Some("Aruba7210-US"));
        assert_eq!(inv.os_version.as_deref(), Some("8.6.0.17"));
        assert_eq!(inv.uptime.as_deref(), Some("45 days 2 hours 10 minutes 30 seconds"));
        assert_eq!(inv.device_id.as_deref(), Some("MM-7210"));
    }

    #[test]
    fn license_rows_need_long_key_and_five_fields() {
        let parsed = parse_licenses(SHOW_LICENSE);
        assert_eq!(parsed.ambiguity, None);
        assert_eq!(
            parsed.value,
            vec![License {
                key: "QWERTY12ABCD34EFGH56IJKL78MN+/=".into(),
                installed: "2021-03-04 10:11:12".into(),
                expires: "Never".into(),
                flags: "E".into(),
                service: "Access Points: 32".into(),
            }]
        );
    }

    #[test]
    fn license_marker_missing_is_ambiguous() {
        let parsed = parse_licenses("% Invalid input");
        assert!(parsed.value.is_empty());
        assert_eq!(parsed.ambiguity.as_deref(), Some("marker 'License Table' not found"));
    }

    #[test]
    fn ssid_profiles_exclude_default() {
        assert_eq!(parse_ssids(SSID_PROFILES).value, vec!["corp-ssid", "guest-ssid"]);
        assert!(parse_virtual_aps(SSID_PROFILES).ambiguity.is_some());
    }

    #[test]
    fn user_table_slices_on_header_offsets() {
        let clients = parse_clients(USER_TABLE).value;
        assert_eq!(clients.len(), 2);

        assert_eq!(clients[0].ip.as_deref(), Some("10.10.20.15"));
        assert_eq!(clients[0].name.as_deref(), Some("jdoe"));
        assert_eq!(clients[0].role.as_deref(), Some("employee"));
        assert_eq!(clients[0].auth_age.as_deref(), Some("00:01:10"));
        assert_eq!(clients[0].ap.as_deref(), Some("AP-12"));
        assert_eq!(
            clients[0].essid.as_deref(),
            Some("corp-ssid/00:11:22:33:44:55/5GHz")
        );

        assert_eq!(clients[1].name, None);
        assert_eq!(clients[1].role.as_deref(), Some("guest"));
        assert_eq!(clients[1].ap, None);
    }

    const USER_TABLE_8X: &str = "\
Users
-----
IP                  MAC                Name    Role      Age(d:h:m)  Auth     VPN link  AP name     Roaming   Essid/Bssid/Phy                           Profile         Forward mode  Type      Host Name  User Type
--                  ---                ----    ----      ----------  ----     --------  -------     -------   ---------------                           -------         ------------  ----      ---------  ---------
10.10.20.15         aa:bb:cc:00:11:22  jdoe    employee  00:01:10    802.1x             AP-12       Wireless  corp-ssid/00:11:22:33:44:55/5GHz          corp-aaa-prof   tunnel        Win 10    JDOE-LT    WIRELESS
10.10.40.3          aa:bb:cc:00:22:33          logon     00:00:01                       AP-31       Wireless  guest-ssid/00:11:22:33:44:77/2.4GHz       guest-aaa       tunnel                             WIRELESS

User Entries: 2/2
";

    #[test]
    fn essid_stops_before_trailing_columns() {
        let clients = parse_clients(USER_TABLE_8X).value;
        assert_eq!(clients.len(), 2);

        assert_eq!(
            clients[0].essid.as_deref(),
            Some("corp-ssid/00:11:22:33:44:55/5GHz")
        );
        assert_eq!(clients[0].name.as_deref(), Some("jdoe"));
        assert_eq!(clients[0].ap.as_deref(), Some("AP-12"));

        assert_eq!(
            clients[1].essid.as_deref(),
            Some("guest-ssid/00:11:22:33:44:77/2.4GHz")
        );
        assert_eq!(clients[1].name, None);
        assert_eq!(clients[1].role.as_deref(), Some("logon"));
        assert_eq!(clients[1].auth_age.as_deref(), Some("00:00:01"));
    }

    #[test]
    fn minimal_header_with_blank_name() {
        let text = "IP              MAC              Name    Role\n\
                    10.1.1.9        00:11:22:33:44:55        admin\n";
        let clients = parse_clients(text).value;
        assert_eq!(clients[0].name, None);
        assert_eq!(clients[0].role.as_deref(), Some("admin"));
    }

    #[test]
    fn collect_reports_support_by_artifact_presence() {
        let artifacts = ArtifactSet::from_files([
            ("inventory_1.txt", SHOW_VERSION),
            ("inventory_2.txt", "System Serial#        : CV0001234\n"),
            ("mac_table_1.txt", USER_TABLE),
        ]);
        let manifest = ArubaControllerCollector.collect(&artifacts);

        assert_eq!(
            manifest.inventory.as_ref().and_then(|i| i.serial.as_deref()),
            Some("CV0001234")
        );
        assert_eq!(manifest.clients.as_ref().map(Vec::len), Some(2));
        assert_eq!(manifest.capabilities.get("licenses"), Some(Capability::NotSupported));
        assert!(manifest.licenses.is_none());
        assert_eq!(manifest.capabilities.get("vlans"), Some(Capability::NotSupported));
        assert!(manifest.parse_notes.is_empty());
    }
}
