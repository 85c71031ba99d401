//! Per-feature capability flags.
//!
//! `not_supported` means there is no evidence for the feature at all (its
//! backing artifact was never captured). `supported` means evidence exists,
//! even if nothing could be recognized in it.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Supported,
    NotSupported,
}

/// Fixed, ordered key set; every key starts as `not_supported`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityMatrix {
    entries: Vec<(String, Capability)>,
}

impl CapabilityMatrix {
    pub fn new(keys: &[&str]) -> Self {
        Self {
            entries: keys
                .iter()
                .map(|k| (k.to_string(), Capability::NotSupported))
                .collect(),
        }
    }

    /// Mark a feature as backed by evidence. Keys outside the fixed set are
    /// ignored.
    pub fn mark_supported(&mut self, key: &str) {
        if let Some((_, cap)) = self.entries.iter_mut().find(|(k, _)| k == key) {
            *cap = Capability::Supported;
        }
    }

    pub fn get(&self, key: &str) -> Option<Capability> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, cap)| *cap)
    }

    pub fn is_supported(&self, key: &str) -> bool {
        self.get(key) == Some(Capability::Supported)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

impl Serialize for CapabilityMatrix {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, cap) in &self.entries {
            map.serialize_entry(key, cap)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for CapabilityMatrix {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MatrixVisitor;

        impl<'de> Visitor<'de> for MatrixVisitor {
            type Value = CapabilityMatrix;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of feature name to capability")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::new();
                while let Some((key, cap)) = access.next_entry::<String, Capability>()? {
                    entries.push((key, cap));
                }
                Ok(CapabilityMatrix { entries })
            }
        }

        deserializer.deserialize_map(MatrixVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_in_declared_order() {
        let mut m = CapabilityMatrix::new(&["inventory", "power", "lldp"]);
        m.mark_supported("power");
        m.mark_supported("not_a_key");
        assert_eq!(
            serde_json::to_string(&m).unwrap(),
            r#"{"inventory":"not_supported","power":"supported","lldp":"not_supported"}"#
        );
        assert_eq!(m.keys().count(), 3);
    }

    #[test]
    fn round_trips_through_json() {
        let mut m = CapabilityMatrix::new(&["clients", "ssids"]);
        m.mark_supported("ssids");
        let back: CapabilityMatrix =
            serde_json::from_str(&serde_json::to_string(&m).unwrap()).unwrap();
        assert_eq!(back, m);
        assert!(back.is_supported("ssids"));
        assert!(!back.is_supported("clients"));
    }
}
