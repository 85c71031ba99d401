//! End-to-end probe runs against scripted and replayed sessions.

use std::collections::HashSet;

use netprobe_probe::{
    run_probe, AttemptStatus, ProbeConfig, ProbeError, ReplayConnector, RunManifest,
    ScriptedSession, Target, PARTIAL_MANIFEST_FILE, RUN_MANIFEST_FILE,
};
use netprobe_spec::CommandSet;
use tempfile::tempdir;

const SWITCH_SET: &str = r#"
version: "1.0"
platform: aruba_switch
safety:
  blocked_keywords: [reload, erase, write memory]
transport:
  ssh:
    paging_disable: ["terminal length 1000"]
commands:
  inventory:
    - command: show system
    - command: show version
  vlans:
    - command: show vlan
    - command: "show vlan {{vlan_id}}"
    - command: show vlan
    - command: "show vlan {{vlan_id}} detail"
"#;

const SHOW_VLAN: &str = "\
  VLAN ID Name                 | Status     Voice Jumbo
  ------- -------------------- + ---------- ----- -----
  1       DEFAULT_VLAN         | Port-based No    No
  30      CAMERAS              | Port-based No    No
";

fn config(root: &std::path::Path) -> ProbeConfig {
    ProbeConfig {
        output_root: root.to_path_buf(),
        ..ProbeConfig::default()
    }
    .without_delays()
}

#[test]
fn expansion_produces_one_artifact_per_template_and_id() {
    let dir = tempdir().unwrap();
    let set = CommandSet::from_yaml_str(SWITCH_SET).unwrap();
    let script = ScriptedSession::new()
        .on_text("show system", "Software revision : WC.16.10.0012\n")
        .on_text("show vlan", SHOW_VLAN)
        .on_text("show vlan 1", "VLAN 1 ports: 1-24\n")
        .on_text("show vlan 30", "VLAN 30 ports: 25-28\n");

    let run = run_probe(&script, &set, &Target::ssh("sw-core"), &config(dir.path())).unwrap();

    let expanded: Vec<&str> = run
        .manifest
        .artifacts
        .iter()
        .filter(|a| a.command.starts_with("show vlan ") && a.category == "vlans")
        .map(|a| a.path.as_str())
        .collect();
    assert_eq!(
        expanded,
        vec![
            "artifacts/vlan_1.txt",
            "artifacts/vlan_30.txt",
            "artifacts/vlan_1_detail.txt",
            "artifacts/vlan_30_detail.txt",
        ]
    );

    let unique: HashSet<&str> = run.manifest.artifacts.iter().map(|a| a.path.as_str()).collect();
    assert_eq!(unique.len(), run.manifest.artifacts.len());

    // The second `show vlan` never takes the summary name.
    let summaries: Vec<&str> = run
        .manifest
        .artifacts
        .iter()
        .filter(|a| a.command == "show vlan")
        .map(|a| a.path.as_str())
        .collect();
    assert_eq!(summaries, vec!["artifacts/vlan_summary.txt", "artifacts/vlans_2.txt"]);

    assert_eq!(
        run.manifest.results_by_category["inventory"].failed,
        vec!["show version"]
    );
    assert!(run.run_dir.join(RUN_MANIFEST_FILE).is_file());
}

#[test]
fn blocked_term_leaves_no_artifact_and_no_manifest() {
    let dir = tempdir().unwrap();
    let set = CommandSet::from_yaml_str(
        r#"
safety:
  blocked_keywords: [reload]
commands:
  inventory:
    - command: show version
  maintenance:
    - command: RELOAD at 02:00
    - command: show clock
"#,
    )
    .unwrap();
    let script = ScriptedSession::new().on_text("show version", "ok\n");

    let err = run_probe(&script, &set, &Target::ssh("sw-edge"), &config(dir.path())).unwrap_err();
    assert!(matches!(err, ProbeError::Blocked(ref hit) if hit.keyword == "reload"));
    assert_eq!(script.sent(), vec!["show version"]);

    let run_dir = std::fs::read_dir(dir.path())
        .unwrap()
        .next()
        .unwrap()
        .unwrap()
        .path();
    assert!(!run_dir.join(RUN_MANIFEST_FILE).exists());
    assert!(!run_dir.join(PARTIAL_MANIFEST_FILE).exists());
    let artifacts: Vec<_> = std::fs::read_dir(run_dir.join("artifacts"))
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(artifacts, vec!["inventory_1.txt"]);
}

#[test]
fn replayed_recordings_drive_a_full_run() {
    let recordings = tempdir().unwrap();
    std::fs::write(recordings.path().join("show_system.txt"), "Serial Number : SG00X\n").unwrap();
    std::fs::write(recordings.path().join("show_vlan.txt"), SHOW_VLAN).unwrap();
    std::fs::write(recordings.path().join("show_vlan_30.txt"), "VLAN 30\n").unwrap();

    let out = tempdir().unwrap();
    let set = CommandSet::from_yaml_str(SWITCH_SET).unwrap();
    let run = run_probe(
        &ReplayConnector::new(recordings.path()),
        &set,
        &Target::ssh("bench"),
        &config(out.path()),
    )
    .unwrap();

    let loaded = RunManifest::load_from_run_dir(&run.run_dir).unwrap();
    assert!(loaded.complete);
    let status_of = |cmd: &str| {
        loaded
            .attempts
            .iter()
            .find(|a| a.command == cmd)
            .map(|a| a.status)
    };
    assert_eq!(status_of("show vlan 30"), Some(AttemptStatus::Success));
    assert_eq!(status_of("show vlan 1"), Some(AttemptStatus::Failed));
    assert_eq!(status_of("show version"), Some(AttemptStatus::Failed));
}
