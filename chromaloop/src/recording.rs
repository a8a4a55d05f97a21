// src/recording.rs
//
// Recording codec: filtered recording -> fixed-order normalised ColorVector.
//
// Filtered files come in two top-level shapes (an array of events, or a
// single event object). FilteredRecording absorbs both at the boundary and
// keeps only the first event, so the decoder only ever sees one element list.

use std::fmt;

use serde::de::value::MapAccessDeserializer;
use serde::de::{IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::color::{normalize, parse_color, NormalizedRgb, Rgb};
use crate::types::{ElementKind, FilteredEvent, StyledElement};

/// Number of tracked color roles.
pub const NUM_ROLES: usize = 5;

/// Number of scalars in a ColorVector (5 roles x RGB).
pub const COLOR_DIM: usize = NUM_ROLES * 3;

/// The five tracked roles, in ColorVector order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaletteRole {
    Button,
    Navbar,
    Background,
    ShepherdHeader,
    ShepherdButton,
}

impl PaletteRole {
    pub const ALL: [PaletteRole; NUM_ROLES] = [
        PaletteRole::Button,
        PaletteRole::Navbar,
        PaletteRole::Background,
        PaletteRole::ShepherdHeader,
        PaletteRole::ShepherdButton,
    ];

    /// Position of this role in ColorVector order.
    pub fn index(&self) -> usize {
        match self {
            PaletteRole::Button => 0,
            PaletteRole::Navbar => 1,
            PaletteRole::Background => 2,
            PaletteRole::ShepherdHeader => 3,
            PaletteRole::ShepherdButton => 4,
        }
    }

    /// Offset of the role's red channel in the flat vector.
    pub fn offset(&self) -> usize {
        self.index() * 3
    }

    /// Element kind the role is read from.
    pub fn element_kind(&self) -> ElementKind {
        match self {
            PaletteRole::Button => ElementKind::Button,
            PaletteRole::Navbar => ElementKind::Navbar,
            PaletteRole::Background => ElementKind::Background,
            PaletteRole::ShepherdHeader => ElementKind::ShepherdHeader,
            PaletteRole::ShepherdButton => ElementKind::ShepherdButtons,
        }
    }

    /// Color used when no element of this role exists, or its value is unparseable.
    pub fn default_rgb(&self) -> Rgb {
        match self {
            PaletteRole::Button => [0, 0, 0],
            PaletteRole::Navbar => [200, 200, 200],
            PaletteRole::Background => [0, 0, 0],
            PaletteRole::ShepherdHeader => [200, 200, 200],
            PaletteRole::ShepherdButton => [200, 200, 200],
        }
    }

    /// Color used when an element exists but has no `background-color`.
    pub fn unstyled_rgb(&self) -> Rgb {
        match self {
            PaletteRole::Background => [255, 255, 255],
            _ => [0, 0, 0],
        }
    }

    /// Stable snake_case name (matches serde).
    pub fn as_str(&self) -> &'static str {
        match self {
            PaletteRole::Button => "button",
            PaletteRole::Navbar => "navbar",
            PaletteRole::Background => "background",
            PaletteRole::ShepherdHeader => "shepherd_header",
            PaletteRole::ShepherdButton => "shepherd_button",
        }
    }
}

/// Five RGB triples in [0, 1], laid out in PaletteRole::ALL order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorVector {
    channels: [f64; COLOR_DIM],
}

impl Default for ColorVector {
    fn default() -> Self {
        let mut v = Self {
            channels: [0.0; COLOR_DIM],
        };
        for role in PaletteRole::ALL {
            v.set_role(role, normalize(role.default_rgb()));
        }
        v
    }
}

impl ColorVector {
    pub fn from_channels(channels: [f64; COLOR_DIM]) -> Self {
        Self { channels }
    }

    pub fn channels(&self) -> &[f64; COLOR_DIM] {
        &self.channels
    }

    pub fn channels_mut(&mut self) -> &mut [f64; COLOR_DIM] {
        &mut self.channels
    }

    pub fn role(&self, role: PaletteRole) -> NormalizedRgb {
        let o = role.offset();
        [self.channels[o], self.channels[o + 1], self.channels[o + 2]]
    }

    pub fn set_role(&mut self, role: PaletteRole, rgb: NormalizedRgb) {
        let o = role.offset();
        self.channels[o..o + 3].copy_from_slice(&rgb);
    }

    /// Mean of the three channels of `role`.
    pub fn role_mean(&self, role: PaletteRole) -> f64 {
        self.role(role).iter().sum::<f64>() / 3.0
    }
}

/// The first event of a filtered recording file, in either top-level shape.
///
/// Only the first event is decoded. Later array entries are skipped without
/// being type-checked, so a malformed tail never fails the decode.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilteredRecording {
    first: Option<FilteredEvent>,
}

impl FilteredRecording {
    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    pub fn first_event(&self) -> Option<&FilteredEvent> {
        self.first.as_ref()
    }

    /// Elements of the first event; empty when the recording has none.
    pub fn into_first_elements(self) -> Vec<StyledElement> {
        self.first.map(|ev| ev.elements).unwrap_or_default()
    }
}

impl<'de> Deserialize<'de> for FilteredRecording {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct FirstEventVisitor;

        impl<'de> Visitor<'de> for FirstEventVisitor {
            type Value = FilteredRecording;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a filtered event or an array of filtered events")
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let first = seq.next_element::<FilteredEvent>()?;
                while seq.next_element::<IgnoredAny>()?.is_some() {}
                Ok(FilteredRecording { first })
            }

            fn visit_map<A>(self, map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let event = FilteredEvent::deserialize(MapAccessDeserializer::new(map))?;
                Ok(FilteredRecording { first: Some(event) })
            }
        }

        deserializer.deserialize_any(FirstEventVisitor)
    }
}

/// Resolve one role from an element list. The last matching element wins.
fn decode_role(elements: &[StyledElement], role: PaletteRole) -> Rgb {
    let kind = role.element_kind();
    let Some(element) = elements.iter().rev().find(|e| e.kind == kind) else {
        return role.default_rgb();
    };

    match element.background_color() {
        None => role.unstyled_rgb(),
        Some(value) => parse_color(value).unwrap_or_else(|err| {
            warn!(role = role.as_str(), error = %err, "unparseable color, using role default");
            role.default_rgb()
        }),
    }
}

/// Decode one snapshot's element list into a ColorVector.
pub fn decode_elements(elements: &[StyledElement]) -> ColorVector {
    let mut v = ColorVector::default();
    for role in PaletteRole::ALL {
        v.set_role(role, normalize(decode_role(elements, role)));
    }
    v
}

/// Decode a recording, normalised to its first snapshot.
pub fn decode_recording(recording: FilteredRecording) -> ColorVector {
    let elements = recording.into_first_elements();
    if elements.is_empty() {
        debug!("filtered recording has no elements, using role defaults");
    }
    decode_elements(&elements)
}
