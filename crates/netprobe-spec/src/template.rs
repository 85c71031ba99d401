//! Command templates with `{{name}}` placeholders.

use regex::{Captures, Regex};
use std::sync::OnceLock;

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("placeholder regex")
    })
}

/// A command string as declared in the command set, possibly parameterized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplate {
    text: String,
}

impl CommandTemplate {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Placeholder names in order of appearance (duplicates kept).
    pub fn placeholders(&self) -> Vec<&str> {
        placeholder_re()
            .captures_iter(&self.text)
            .filter_map(|c| c.get(1).map(|m| m.as_str()))
            .collect()
    }

    pub fn has_placeholder(&self, name: &str) -> bool {
        self.placeholders().iter().any(|p| *p == name)
    }

    pub fn is_parameterized(&self) -> bool {
        placeholder_re().is_match(&self.text)
    }

    /// Substitute every occurrence of `name`; other placeholders are left as-is.
    pub fn render(&self, name: &str, value: &str) -> String {
        placeholder_re()
            .replace_all(&self.text, |caps: &Captures<'_>| {
                if &caps[1] == name {
                    value.to_string()
                } else {
                    caps[0].to_string()
                }
            })
            .into_owned()
    }
}

impl From<&str> for CommandTemplate {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
