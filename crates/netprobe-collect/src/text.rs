//! Text harvesting helpers shared by the collectors.
//!
//! Two techniques cover every parser:
//!
//! - token/regex harvesting over text with prompt echoes removed first,
//! - header-anchored column slicing for fixed-width tables whose optional
//!   columns may be blank (splitting on whitespace would shift every later
//!   field left).

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

// ============================================================================
// Prompt handling
// ============================================================================

fn mac_prompt_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^([0-9a-f]{2}(?::[0-9a-f]{2}){5})#").expect("mac prompt regex")
    })
}

/// `host#`, `host>`, `(host) #`, `host(config)#`; nothing after the delimiter.
fn bare_prompt_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\(?([A-Za-z0-9][A-Za-z0-9_.\-]*)\)?\s*(?:\([^)]*\))?\s*[#>]$")
            .expect("bare prompt regex")
    })
}

fn prompt_match(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    mac_prompt_re()
        .captures(trimmed)
        .or_else(|| bare_prompt_re().captures(trimmed))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Drop device prompt lines. A MAC-address prompt is dropped together with
/// any command echoed after it.
pub fn strip_prompt_lines(text: &str) -> String {
    text.lines()
        .filter(|line| prompt_match(line).is_none())
        .collect::<Vec<_>>()
        .join("\n")
}

/// The device identifier from the first prompt line in `text`.
pub fn prompt_identity(text: &str) -> Option<String> {
    text.lines().find_map(prompt_match).map(str::to_string)
}

// ============================================================================
// Regex / key-value harvesting
// ============================================================================

/// First capture group of `re` in `text`, trimmed; empty captures are `None`.
pub fn capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// `key: value` lines, in order. Lines without a colon and `----` rules are
/// skipped; only the first colon splits.
pub fn key_value_lines(text: &str) -> Vec<(String, String)> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("----"))
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect()
}

/// Lines after the first line containing `marker`, or `None` if absent.
pub fn lines_after_marker<'t>(text: &'t str, marker: &str) -> Option<Vec<&'t str>> {
    let mut lines = text.lines();
    lines.by_ref().find(|l| l.contains(marker))?;
    Some(lines.collect())
}

// ============================================================================
// Header-anchored column slicing
// ============================================================================

/// Column offsets taken from a table header line.
///
/// Each recognized label's character offset in the header marks where its
/// column starts; a column ends where the next (by offset) starts, and the last
/// one runs to end of line. The first column also owns anything left of its
/// label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnLayout {
    columns: Vec<(String, usize)>,
}

impl ColumnLayout {
    /// `labels` maps output keys to header labels. Labels absent from the
    /// header are left out; `None` when none are present.
    pub fn from_header(header: &str, labels: &[(&str, &str)]) -> Option<Self> {
        let mut columns: Vec<(String, usize)> = labels
            .iter()
            .filter_map(|(key, label)| {
                header
                    .find(label)
                    .map(|byte| (key.to_string(), header[..byte].chars().count()))
            })
            .collect();
        if columns.is_empty() {
            return None;
        }
        columns.sort_by_key(|(_, offset)| *offset);
        // Rows may start left of an indented header.
        columns[0].1 = 0;
        Some(Self { columns })
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(k, _)| k.as_str())
    }

    /// Slice one data row. Fields are trimmed of whitespace and `|` separators;
    /// blank fields are omitted.
    pub fn slice(&self, row: &str) -> SlicedRow {
        let chars: Vec<char> = row.chars().collect();
        let mut fields = BTreeMap::new();
        for (i, (key, start)) in self.columns.iter().enumerate() {
            let end = self
                .columns
                .get(i + 1)
                .map(|(_, next)| *next)
                .unwrap_or(chars.len())
                .min(chars.len());
            if *start >= end {
                continue;
            }
            let value: String = chars[*start..end].iter().collect();
            let value = value.trim_matches(|c: char| c.is_whitespace() || c == '|');
            if !value.is_empty() {
                fields.insert(key.clone(), value.to_string());
            }
        }
        SlicedRow { fields }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlicedRow {
    fields: BTreeMap<String, String>,
}

impl SlicedRow {
    pub fn get(&self, key: &str) -> Option<String> {
        self.fields.get(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_mac_and_bare_prompts() {
        let text = "bc:9f:e4:c3:f2:82# show ap-env\nPower: 802.3at\nBC:9F:E4:C3:F2:82#\n(MM-7210) #\nsw-core(config)# \nPort#: 3";
        assert_eq!(strip_prompt_lines(text), "Power: 802.3at\nPort#: 3");
    }

    #[test]
    fn identity_comes_from_first_prompt() {
        assert_eq!(
            prompt_identity("show version\nbc:9f:e4:c3:f2:82# \n").as_deref(),
            Some("bc:9f:e4:c3:f2:82")
        );
        assert_eq!(prompt_identity("(MM-7210) #").as_deref(), Some("MM-7210"));
        assert_eq!(prompt_identity("sw-core# ").as_deref(), Some("sw-core"));
        assert_eq!(prompt_identity("no prompt here"), None);
    }

    #[test]
    fn key_values_split_on_first_colon() {
        let kv = key_value_lines("----------\nUptime: 1:02:03\nnoise line\n  Class : 4 \n");
        assert_eq!(
            kv,
            vec![
                ("Uptime".to_string(), "1:02:03".to_string()),
                ("Class".to_string(), "4".to_string())
            ]
        );
    }

    #[test]
    fn blank_optional_column_stays_blank() {
        let header = "IP              MAC              Name    Role";
        let row = "10.1.20.5       aa:bb:cc:dd:ee:01         guest";
        let layout = ColumnLayout::from_header(
            header,
            &[("ip", "IP"), ("mac", "MAC"), ("name", "Name"), ("role", "Role")],
        )
        .unwrap();
        let sliced = layout.slice(row);
        assert_eq!(sliced.get("ip").as_deref(), Some("10.1.20.5"));
        assert_eq!(sliced.get("mac").as_deref(), Some("aa:bb:cc:dd:ee:01"));
        assert_eq!(sliced.get("name"), None);
        assert_eq!(sliced.get("role").as_deref(), Some("guest"));
    }

    #[test]
    fn offsets_are_characters_not_bytes() {
        let header = "Name    Role";
        let layout =
            ColumnLayout::from_header(header, &[("name", "Name"), ("role", "Role")]).unwrap();
        let sliced = layout.slice("café    admin");
        assert_eq!(sliced.get("name").as_deref(), Some("café"));
        assert_eq!(sliced.get("role").as_deref(), Some("admin"));
    }

    #[test]
    fn labels_are_sorted_by_offset_and_short_rows_are_tolerated() {
        let layout =
            ColumnLayout::from_header("B    A", &[("a", "A"), ("b", "B"), ("z", "Z")]).unwrap();
        assert_eq!(layout.keys().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(layout.slice("x").get("b").as_deref(), Some("x"));
        assert_eq!(layout.slice("x").get("a"), None);
    }

    #[test]
    fn first_column_starts_at_line_start() {
        let layout =
            ColumnLayout::from_header("    IP          MAC", &[("ip", "IP"), ("mac", "MAC")])
                .unwrap();
        assert_eq!(layout.slice("10.9.8.7        aa:bb").get("ip").as_deref(), Some("10.9.8.7"));
    }

    #[test]
    fn marker_scoping() {
        assert_eq!(lines_after_marker("a\nList\nb\nc", "List"), Some(vec!["b", "c"]));
        assert_eq!(lines_after_marker("a\nb", "List"), None);
    }
}
