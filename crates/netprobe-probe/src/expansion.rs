//! Entity discovery and per-entity artifact naming.

use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

use crate::config::ExpansionRule;

fn entity_row_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*(\d+)\s").expect("entity row regex"))
}

/// Scan summary output for entity ids.
///
/// A line contributes an id when it is optional leading whitespace, digits,
/// then whitespace (`"  10   SERVERS ..."`). Ids keep first-seen order and a
/// repeated id is kept once. Ids that do not fit in `u32` are skipped.
pub fn discover_entity_ids(output: &[u8]) -> Vec<u32> {
    let text = String::from_utf8_lossy(output);
    let mut seen = HashSet::new();
    let mut ids = Vec::new();
    for line in text.lines() {
        let Some(caps) = entity_row_re().captures(line) else {
            continue;
        };
        let Ok(id) = caps[1].parse::<u32>() else {
            continue;
        };
        if seen.insert(id) {
            ids.push(id);
        }
    }
    ids
}

/// How an attempt's artifact is named.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// `<category>_<index>`
    Sequential,
    /// The summary command of the expansion category. Falls back to
    /// `Sequential` unless the attempt succeeds.
    Summary,
    /// `<prefix>_<id>`
    Entity(u32),
    /// `<prefix>_<id>_detail`
    EntityDetail(u32),
}

impl ArtifactKind {
    /// Kind for an expanded command, decided on the rendered text.
    pub fn for_rendered(rule: &ExpansionRule, rendered: &str, id: u32) -> Self {
        if !rule.detail_marker.is_empty() && rendered.contains(&rule.detail_marker) {
            ArtifactKind::EntityDetail(id)
        } else {
            ArtifactKind::Entity(id)
        }
    }

    pub fn stem(&self, rule: &ExpansionRule, category: &str, attempt_index: usize) -> String {
        match self {
            ArtifactKind::Sequential => format!("{category}_{attempt_index}"),
            ArtifactKind::Summary => rule.summary_artifact.clone(),
            ArtifactKind::Entity(id) => format!("{}_{id}", rule.entity_prefix),
            ArtifactKind::EntityDetail(id) => format!("{}_{id}_detail", rule.entity_prefix),
        }
    }
}
