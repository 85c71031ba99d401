//! Netprobe command-set model
//!
//! This crate holds the pieces of the probe pipeline that are pure data or pure
//! policy, with no session or filesystem side effects beyond loading a file:
//!
//! - `command_set`: the declarative, versioned command set (YAML/JSON) and its
//!   structural validation,
//! - `safety`: the blocked-keyword gate applied before every execution,
//! - `template`: `{{placeholder}}` detection and rendering for expanded commands,
//! - `digest`: the `sha256:<hex>` content hash recorded for every artifact.

pub mod command_set;
pub mod digest;
pub mod safety;
pub mod template;

pub use command_set::{
    CommandCategory, CommandEntry, CommandSet, SafetyPolicy, SpecError, SshHints, TransportHints,
    ValidationIssue,
};
pub use digest::{content_hash, verify_content_hash, CONTENT_HASH_PREFIX};
pub use safety::{audit_command_set, check_command, BlockedKeyword};
pub use template::CommandTemplate;
