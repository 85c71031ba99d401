//! Netprobe evidence normalization
//!
//! Turns a run's raw artifacts into a `collector_manifest.json` per platform,
//! and derives cross-device views from collector manifests.
//!
//! Normalization is best-effort and never fails on content: a feature whose
//! artifact was not captured is `not_supported`; a feature whose artifact is
//! present but unrecognizable is `supported` with an empty result and a parse
//! note. Collectors never execute commands.

pub mod artifacts;
pub mod capabilities;
pub mod collectors;
pub mod correlate;
pub mod error;
pub mod manifest;
pub mod text;

pub use artifacts::ArtifactSet;
pub use capabilities::{Capability, CapabilityMatrix};
pub use collectors::{run_collector, Collector, Parsed, Platform};
pub use correlate::{
    correlate, correlation_path, derive_ap_client_map, CorrelatedView, CorrelationSource,
    CorrelationSummary, UNKNOWN_AP,
};
pub use error::CollectError;
pub use manifest::{
    Client, CollectorManifest, Inventory, License, VlanRecord, COLLECTOR_MANIFEST_FILE,
};
