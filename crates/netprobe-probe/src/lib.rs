//! Netprobe evidence capture
//!
//! Runs a command set against one device over a stateful session and persists
//! every output as raw evidence:
//!
//! ```text
//!   CommandSet ──► safety gate ──► flush ──► send/settle ──► classify
//!                                                              │
//!        run_manifest.json ◄── RunManifestBuilder ◄── artifacts/<stem>.txt
//! ```
//!
//! ## Key Features
//!
//! - **Fail-closed**: a blocked keyword aborts the run before the command is sent
//! - **Two-phase expansion**: `show vlan` seeds ids, `{{vlan_id}}` templates fan out
//! - **Incremental evidence**: artifacts hit disk as each attempt completes
//! - **Sessions**: scripted (tests), replay (recordings) and subprocess (`ssh -tt`)

pub mod attempt;
pub mod config;
pub mod engine;
pub mod error;
pub mod expansion;
pub mod manifest;
pub mod probe;
pub mod process;
pub mod replay;
pub mod session;
pub mod store;
pub mod verify;

pub use attempt::{Artifact, AttemptStatus, CommandAttempt};
pub use config::{ExpansionRule, ProbeConfig, Target, TOOL_NAME, TOOL_VERSION};
pub use engine::{CategoryAbort, CategoryRun, Engine};
pub use error::ProbeError;
pub use expansion::{discover_entity_ids, ArtifactKind};
pub use manifest::{
    CategoryResults, RunManifest, RunManifestBuilder, ToolInfo, PARTIAL_MANIFEST_FILE,
    RUN_MANIFEST_FILE,
};
pub use probe::{run_probe, ProbeRun};
pub use process::{ProcessConnector, ProcessSession};
pub use replay::{file_name_for, ReplayConnector, ReplaySession};
pub use session::{
    Connector, ScriptedReply, ScriptedSession, SendOptions, Session, SessionError, SessionEvent,
};
pub use store::{ArtifactStore, ARTIFACTS_DIR, ARTIFACT_EXT};
pub use verify::{verify_run, IntegrityReport};
