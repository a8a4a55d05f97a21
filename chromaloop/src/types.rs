// src/types.rs
//
// Shared data model for the extraction pipeline:
// - ElementKind: the fixed set of element roles the filter recognises
// - StyledElement: one classified element with its style payload
// - FilteredEvent: the per-snapshot list of styled elements
//
// The wire shape keeps the nested `attributes.style` / `data.elements`
// layout that downstream consumers of filtered recordings already read.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Milliseconds since the Unix epoch, as recorded by the session recorder.
pub type TimestampMs = i64;

/// Style mapping (CSS property -> value). Ordered for stable output.
pub type Style = BTreeMap<String, String>;

/// Element role assigned by the snapshot filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ElementKind {
    Navbar,
    Button,
    Text,
    ShepherdHeader,
    ShepherdButtons,
    ShepherdSecondaryButtons,
    Background,
    /// Any type string this crate does not produce. Only seen when reading
    /// filtered files written by other tools.
    #[serde(other)]
    Unknown,
}

impl ElementKind {
    /// Stable wire name (matches the serde representation).
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementKind::Navbar => "navbar",
            ElementKind::Button => "button",
            ElementKind::Text => "text",
            ElementKind::ShepherdHeader => "shepherdHeader",
            ElementKind::ShepherdButtons => "shepherdButtons",
            ElementKind::ShepherdSecondaryButtons => "shepherdSecondaryButtons",
            ElementKind::Background => "background",
            ElementKind::Unknown => "unknown",
        }
    }
}

/// Fixed id of the synthetic background element.
pub const BACKGROUND_ELEMENT_ID: i64 = 301;

/// A classified element with the colors assigned to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StyledElementWire", into = "StyledElementWire")]
pub struct StyledElement {
    pub kind: ElementKind,
    pub id: i64,
    pub style: Style,
}

impl StyledElement {
    pub fn new(kind: ElementKind, id: i64) -> Self {
        Self {
            kind,
            id,
            style: Style::new(),
        }
    }

    /// Builder-style helper to set one style property.
    pub fn with_style(mut self, key: &str, value: impl Into<String>) -> Self {
        self.style.insert(key.to_string(), value.into());
        self
    }

    /// The `background-color` style value, if any.
    pub fn background_color(&self) -> Option<&str> {
        self.style.get("background-color").map(String::as_str)
    }
}

/// Elements discovered in one full snapshot, background always last.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "FilteredEventWire", into = "FilteredEventWire")]
pub struct FilteredEvent {
    pub timestamp: Option<TimestampMs>,
    pub elements: Vec<StyledElement>,
}

// ----- Wire representations -------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StyleAttributes {
    #[serde(default)]
    style: Style,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StyledElementWire {
    #[serde(rename = "type")]
    kind: ElementKind,
    #[serde(default)]
    id: i64,
    #[serde(default)]
    attributes: StyleAttributes,
}

impl From<StyledElementWire> for StyledElement {
    fn from(wire: StyledElementWire) -> Self {
        Self {
            kind: wire.kind,
            id: wire.id,
            style: wire.attributes.style,
        }
    }
}

impl From<StyledElement> for StyledElementWire {
    fn from(el: StyledElement) -> Self {
        Self {
            kind: el.kind,
            id: el.id,
            attributes: StyleAttributes { style: el.style },
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct EventElements {
    #[serde(default)]
    elements: Vec<StyledElement>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FilteredEventWire {
    #[serde(default)]
    timestamp: Option<TimestampMs>,
    #[serde(default)]
    data: EventElements,
}

impl From<FilteredEventWire> for FilteredEvent {
    fn from(wire: FilteredEventWire) -> Self {
        Self {
            timestamp: wire.timestamp,
            elements: wire.data.elements,
        }
    }
}

impl From<FilteredEvent> for FilteredEventWire {
    fn from(ev: FilteredEvent) -> Self {
        Self {
            timestamp: ev.timestamp,
            data: EventElements {
                elements: ev.elements,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_filtered_event_wire_shape() {
        let ev = FilteredEvent {
            timestamp: Some(1700),
            elements: vec![StyledElement::new(ElementKind::Background, BACKGROUND_ELEMENT_ID)
                .with_style("background-color", "rgb(245, 245, 245)")],
        };

        let value = serde_json::to_value(&ev).unwrap();
        assert_eq!(
            value,
            json!({
                "timestamp": 1700,
                "data": {
                    "elements": [{
                        "type": "background",
                        "id": 301,
                        "attributes": { "style": { "background-color": "rgb(245, 245, 245)" } }
                    }]
                }
            })
        );
    }

    #[test]
    fn test_unknown_element_type_is_tolerated() {
        let el: StyledElement =
            serde_json::from_value(json!({ "type": "carousel", "id": 9 })).unwrap();
        assert_eq!(el.kind, ElementKind::Unknown);
        assert!(el.style.is_empty());
    }

    #[test]
    fn test_kind_names_match_serde() {
        for kind in [
            ElementKind::Navbar,
            ElementKind::Button,
            ElementKind::Text,
            ElementKind::ShepherdHeader,
            ElementKind::ShepherdButtons,
            ElementKind::ShepherdSecondaryButtons,
            ElementKind::Background,
        ] {
            let value = serde_json::to_value(kind).unwrap();
            assert_eq!(value, json!(kind.as_str()));
        }
    }
}
