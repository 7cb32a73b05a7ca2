//! Finalized TIC frame representation.

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;
use std::collections::btree_map;

/// One complete decoded frame: a label→value mapping plus diagnostics.
///
/// Labels are unique; when a label repeats within one frame the last
/// occurrence wins. The diagnostics block counts the lines that could not be
/// turned into a field (unreadable, malformed, or checksum-failed) since the
/// frame was opened.
///
/// Serialization mirrors the wire-side JSON shape consumed by downstream
/// collaborators:
///
/// ```text
/// {"_meta":{"invalid_lines":0},"ADCO":"012345678901","PTEC":"HCJB"}
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    fields: BTreeMap<String, String>,
    invalid_lines: u32,
}

impl Frame {
    /// Create an empty frame.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a field. Last write wins on duplicate labels.
    pub fn insert(&mut self, label: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(label.into(), value.into());
    }

    /// Look up a field value by label.
    pub fn get(&self, label: &str) -> Option<&str> {
        self.fields.get(label).map(String::as_str)
    }

    /// Whether the frame contains the given label.
    pub fn contains(&self, label: &str) -> bool {
        self.fields.contains_key(label)
    }

    /// Number of fields in the frame.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the frame holds no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate over the labels present in this frame.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Iterate over (label, value) pairs.
    pub fn iter(&self) -> btree_map::Iter<'_, String, String> {
        self.fields.iter()
    }

    /// Count of invalid lines seen since the frame was opened.
    pub fn invalid_lines(&self) -> u32 {
        self.invalid_lines
    }

    /// Set the invalid-line diagnostic count.
    pub fn set_invalid_lines(&mut self, count: u32) {
        self.invalid_lines = count;
    }
}

impl Serialize for Frame {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(serde::Serialize)]
        struct Meta {
            invalid_lines: u32,
        }

        let mut map = serializer.serialize_map(Some(self.fields.len() + 1))?;
        map.serialize_entry(
            "_meta",
            &Meta {
                invalid_lines: self.invalid_lines,
            },
        )?;
        for (label, value) in &self.fields {
            map.serialize_entry(label, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_write_wins_on_duplicate_labels() {
        let mut frame = Frame::new();
        frame.insert("PAPP", "00750");
        frame.insert("PAPP", "00760");
        assert_eq!(frame.get("PAPP"), Some("00760"));
        assert_eq!(frame.len(), 1);
    }

    #[test]
    fn json_shape_includes_meta_block() {
        let mut frame = Frame::new();
        frame.insert("ADCO", "012345678901");
        frame.insert("PTEC", "HCJB");
        frame.set_invalid_lines(2);

        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["_meta"]["invalid_lines"], 2);
        assert_eq!(json["ADCO"], "012345678901");
        assert_eq!(json["PTEC"], "HCJB");
    }

    #[test]
    fn labels_iteration() {
        let mut frame = Frame::new();
        frame.insert("PTEC", "HCJB");
        frame.insert("ADCO", "012345678901");
        let labels: Vec<&str> = frame.labels().collect();
        assert_eq!(labels, vec!["ADCO", "PTEC"]);
    }

    #[test]
    fn empty_frame() {
        let frame = Frame::new();
        assert!(frame.is_empty());
        assert_eq!(frame.invalid_lines(), 0);
        assert!(!frame.contains("PTEC"));
    }
}
