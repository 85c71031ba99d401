//! Collectors over run directories on disk.

use std::path::Path;

use netprobe_collect::{
    run_collector, Capability, CollectError, CollectorManifest, Platform, COLLECTOR_MANIFEST_FILE,
};
use tempfile::tempdir;

fn write_artifacts(run_dir: &Path, files: &[(&str, &str)]) {
    let artifacts = run_dir.join("artifacts");
    std::fs::create_dir_all(&artifacts).unwrap();
    for (name, text) in files {
        std::fs::write(artifacts.join(name), text).unwrap();
    }
}

#[test]
fn absent_evidence_versus_unrecognizable_evidence() {
    let dir = tempdir().unwrap();
    write_artifacts(
        dir.path(),
        &[
            ("inventory_5.txt", "(MM-7210) #show license\n% Invalid input detected at '^' marker.\n"),
            ("vlans_1.txt", "SSID Profile List\n-----------------\nName  References\n----  ----------\n"),
        ],
    );

    let (manifest, path) = run_collector(Platform::ArubaController, dir.path()).unwrap();
    assert_eq!(path, dir.path().join(COLLECTOR_MANIFEST_FILE));

    // No artifact at all.
    assert_eq!(manifest.capabilities.get("clients"), Some(Capability::NotSupported));
    assert!(manifest.clients.is_none());

    // Artifact present, nothing recognizable.
    assert_eq!(manifest.capabilities.get("licenses"), Some(Capability::Supported));
    assert_eq!(manifest.licenses, Some(Vec::new()));
    assert_eq!(manifest.capabilities.get("ssids"), Some(Capability::Supported));
    assert_eq!(manifest.ssids, Some(Vec::new()));

    assert_eq!(
        manifest.parse_notes,
        vec![
            "licenses: marker 'License Table' not found",
            "ssids: no ssid profile rows recognized",
        ]
    );

    let on_disk = CollectorManifest::load_from_run_dir(dir.path()).unwrap();
    assert_eq!(on_disk, manifest);
}

#[test]
fn ap_run_directory_end_to_end() {
    let dir = tempdir().unwrap();
    write_artifacts(
        dir.path(),
        &[
            (
                "inventory_1.txt",
                "bc:9f:e4:c3:f2:82# show version\nArubaOS (MODEL: 535), Version 10.4.0.2\nAP uptime is 3 days\nbc:9f:e4:c3:f2:82# ",
            ),
            ("poe_1.txt", "Power Drawn: 11.0 W\n"),
        ],
    );

    let (manifest, _) = run_collector(Platform::ArubaAp, dir.path()).unwrap();
    let inventory = manifest.inventory.as_ref().unwrap();
    assert_eq!(inventory.model.as_deref(), Some("535"));
    assert_eq!(manifest.device_id(), Some("bc:9f:e4:c3:f2:82"));
    assert_eq!(
        manifest.power.as_ref().and_then(|p| p.get("Power Drawn")).map(String::as_str),
        Some("11.0 W")
    );
    assert!(manifest.parse_notes.is_empty());

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join(COLLECTOR_MANIFEST_FILE)).unwrap())
            .unwrap();
    assert_eq!(json["capabilities"]["mac_table"], "not_supported");
    assert_eq!(json["capabilities"]["power"], "supported");
}

#[test]
fn run_directory_without_artifacts_is_rejected() {
    let dir = tempdir().unwrap();
    let err = run_collector(Platform::ArubaSwitch, dir.path()).unwrap_err();
    assert!(matches!(err, CollectError::MissingArtifacts(_)));
    assert!(!dir.path().join(COLLECTOR_MANIFEST_FILE).exists());
}
