// src/snapshot.rs
//
// Raw session-recording model (input side of the filter).
//
// A recording file is `{ "events": [...], "colors": {...}, "font-family": {...} }`.
// Only events of kind FULL_SNAPSHOT carry a DOM tree under `data.node`.
//
// Snapshot nodes are decoded leniently: any missing or mistyped
// `tagName`, `attributes`, `class` or `childNodes` becomes empty instead of
// failing the whole recording.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::filter::{FontHints, PaletteHints};
use crate::types::TimestampMs;

/// Event discriminant of a full DOM snapshot.
pub const FULL_SNAPSHOT: i64 = 2;

/// One node of a recorded DOM snapshot.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "Value")]
pub struct SnapshotNode {
    pub tag_name: Option<String>,
    /// Recorder-assigned node id (`None` when absent, zero or empty).
    pub id: Option<i64>,
    pub attributes: Map<String, Value>,
    pub child_nodes: Vec<SnapshotNode>,
}

impl SnapshotNode {
    /// Build a node from arbitrary JSON. Non-objects become empty nodes.
    pub fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::default();
        };

        let tag_name = obj
            .get("tagName")
            .and_then(Value::as_str)
            .map(str::to_string);

        let attributes = obj
            .get("attributes")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        let child_nodes = obj
            .get("childNodes")
            .and_then(Value::as_array)
            .map(|children| children.iter().map(Self::from_value).collect())
            .unwrap_or_default();

        Self {
            tag_name,
            id: obj.get("id").and_then(node_id),
            attributes,
            child_nodes,
        }
    }

    pub fn tag(&self) -> &str {
        self.tag_name.as_deref().unwrap_or("")
    }

    /// Whitespace-separated class tokens.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attributes
            .get("class")
            .and_then(Value::as_str)
            .unwrap_or("")
            .split_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }
}

impl From<Value> for SnapshotNode {
    fn from(value: Value) -> Self {
        Self::from_value(&value)
    }
}

/// Interpret a node id: non-zero integers and non-empty numeric strings.
fn node_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().filter(|id| *id != 0),
        Value::String(s) if !s.trim().is_empty() => s.trim().parse().ok(),
        _ => None,
    }
}

/// One recorded event. Only `kind == FULL_SNAPSHOT` is ever inspected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEvent {
    #[serde(rename = "type", default)]
    pub kind: i64,
    #[serde(default)]
    pub timestamp: Option<TimestampMs>,
    #[serde(default)]
    pub data: Value,
}

impl RawEvent {
    pub fn is_full_snapshot(&self) -> bool {
        self.kind == FULL_SNAPSHOT
    }

    /// Root of the snapshot tree (an empty node when `data.node` is missing).
    pub fn snapshot_root(&self) -> SnapshotNode {
        self.data
            .get("node")
            .map(SnapshotNode::from_value)
            .unwrap_or_default()
    }
}

/// A raw recording file as uploaded by the recorder.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRecording {
    #[serde(default)]
    pub events: Vec<RawEvent>,
    #[serde(default)]
    pub colors: PaletteHints,
    #[serde(rename = "font-family", default)]
    pub fonts: FontHints,
}

impl RawRecording {
    /// Parse a recording with no nesting cap. Every DOM level is two JSON
    /// levels deep (node object plus `childNodes` array).
    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        let mut de = serde_json::Deserializer::from_str(s);
        de.disable_recursion_limit();
        let recording = Self::deserialize(serde_stacker::Deserializer::new(&mut de))?;
        de.end()?;
        Ok(recording)
    }
}
