//! Declarative command sets.
//!
//! A command set is the frozen description of what a probe is allowed to run
//! against one platform:
//!
//! ```yaml
//! version: "1.0"
//! platform: aruba_os_switch
//! safety:
//!   blocked_keywords: [reload, erase, "write memory"]
//! transport:
//!   ssh:
//!     paging_disable: ["no page"]
//! commands:
//!   inventory:
//!     - command: show system
//!   vlans:
//!     - command: show vlan
//!     - command: "show vlan {{vlan_id}}"
//! ```
//!
//! Category order is significant (categories execute in declaration order), so
//! `commands` is kept as an ordered list rather than a hash map.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommandSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    pub safety: SafetyPolicy,
    #[serde(default)]
    pub transport: TransportHints,
    #[serde(
        deserialize_with = "deserialize_categories",
        serialize_with = "serialize_categories"
    )]
    pub commands: Vec<CommandCategory>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SafetyPolicy {
    #[serde(default)]
    pub blocked_keywords: Vec<String>,
}

/// Transport-level hints. Paging suppression may be given either flat
/// (`transport.paging_disable`) or under `transport.ssh`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransportHints {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub paging_disable: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh: Option<SshHints>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SshHints {
    #[serde(default)]
    pub paging_disable: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandCategory {
    pub name: String,
    pub entries: Vec<CommandEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommandEntry {
    pub command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TransportHints {
    /// All paging-disable commands, `ssh` block first.
    pub fn paging_disable(&self) -> Vec<&str> {
        self.ssh
            .iter()
            .flat_map(|ssh| ssh.paging_disable.iter())
            .chain(self.paging_disable.iter())
            .map(String::as_str)
            .collect()
    }
}

impl CommandSet {
    pub fn category(&self, name: &str) -> Option<&CommandCategory> {
        self.commands.iter().find(|c| c.name == name)
    }

    /// Total number of declared templates (before expansion).
    pub fn template_count(&self) -> usize {
        self.commands.iter().map(|c| c.entries.len()).sum()
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub path: String,
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

#[derive(Debug, Error)]
pub enum SpecError {
    #[error("failed to read command set {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid command set YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid command set JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("command set failed validation ({} issue(s)): {}", .0.len(), format_issues(.0))]
    Validation(Vec<ValidationIssue>),
}

fn format_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

// ============================================================================
// Loading + validation
// ============================================================================

impl CommandSet {
    pub fn from_yaml_str(text: &str) -> Result<Self, SpecError> {
        let set: CommandSet = serde_yaml::from_str(text)?;
        set.validate()?;
        Ok(set)
    }

    pub fn from_json_str(text: &str) -> Result<Self, SpecError> {
        let set: CommandSet = serde_json::from_str(text)?;
        set.validate()?;
        Ok(set)
    }

    /// Load a command set from disk. `.json` files are read as JSON, anything
    /// else as YAML.
    pub fn load(path: &Path) -> Result<Self, SpecError> {
        let text = std::fs::read_to_string(path).map_err(|source| SpecError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let is_json = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        if is_json {
            Self::from_json_str(&text)
        } else {
            Self::from_yaml_str(&text)
        }
    }

    /// Structural checks that typed deserialization cannot express.
    ///
    /// All issues are collected so an operator can fix a command set in one pass.
    pub fn validate(&self) -> Result<(), SpecError> {
        let mut issues = Vec::new();
        let mut push = |path: String, message: &str| {
            issues.push(ValidationIssue {
                path,
                message: message.to_string(),
            })
        };

        if self.commands.is_empty() {
            push("commands".to_string(), "at least one category is required");
        }

        for (i, keyword) in self.safety.blocked_keywords.iter().enumerate() {
            if keyword.trim().is_empty() {
                push(
                    format!("safety.blocked_keywords[{i}]"),
                    "blocked keyword must not be empty",
                );
            }
        }

        for (i, cmd) in self.transport.paging_disable().iter().enumerate() {
            if cmd.trim().is_empty() {
                push(
                    format!("transport.paging_disable[{i}]"),
                    "paging command must not be empty",
                );
            }
        }

        let mut seen = std::collections::HashSet::new();
        for category in &self.commands {
            if category.name.trim().is_empty() {
                push("commands".to_string(), "category name must not be empty");
            }
            if !seen.insert(category.name.as_str()) {
                push(
                    format!("commands.{}", category.name),
                    "category declared more than once",
                );
            }
            if category.entries.is_empty() {
                push(
                    format!("commands.{}", category.name),
                    "category must declare at least one command",
                );
            }
            for (i, entry) in category.entries.iter().enumerate() {
                if entry.command.trim().is_empty() {
                    push(
                        format!("commands.{}[{i}].command", category.name),
                        "command must not be empty",
                    );
                }
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(SpecError::Validation(issues))
        }
    }
}

// ============================================================================
// Ordered `commands` map
// ============================================================================

fn deserialize_categories<'de, D>(deserializer: D) -> Result<Vec<CommandCategory>, D::Error>
where
    D: Deserializer<'de>,
{
    struct CategoriesVisitor;

    impl<'de> Visitor<'de> for CategoriesVisitor {
        type Value = Vec<CommandCategory>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a map of category name to a list of commands")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut out = Vec::new();
            while let Some((name, entries)) = map.next_entry::<String, Vec<CommandEntry>>()? {
                out.push(CommandCategory { name, entries });
            }
            Ok(out)
        }
    }

    deserializer.deserialize_map(CategoriesVisitor)
}

fn serialize_categories<S>(categories: &[CommandCategory], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let mut map = serializer.serialize_map(Some(categories.len()))?;
    for category in categories {
        map.serialize_entry(&category.name, &category.entries)?;
    }
    map.end()
}
