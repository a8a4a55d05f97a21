// src/filter.rs
//
// Snapshot filter: raw recorder events -> FilteredEvent per full snapshot.
//
// Classification is an ordered rule table (CLASSIFICATION_RULES); the first
// matching rule wins and the order is part of the contract. Traversal is
// depth-first pre-order in document order. Unmatched nodes emit nothing but
// their children are still visited. Every processed snapshot ends with one
// synthetic background element.

use std::collections::VecDeque;
use std::ops::RangeInclusive;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::snapshot::{RawEvent, RawRecording, SnapshotNode};
use crate::types::{ElementKind, FilteredEvent, StyledElement, BACKGROUND_ELEMENT_ID};

pub const DEFAULT_FONT_FAMILY: &str = "Arial, sans-serif";

/// Default colors applied when the palette hints are silent.
pub mod defaults {
    pub const NAVBAR_BACKGROUND: &str = "rgb(0, 0, 255)";
    pub const NAVBAR_FOREGROUND: &str = "rgb(255, 255, 255)";
    pub const BUTTON_BACKGROUND: &str = "rgb(255, 0, 0)";
    pub const BUTTON_FOREGROUND: &str = "rgb(255, 255, 255)";
    pub const TEXT_FOREGROUND: &str = "rgb(0, 0, 0)";
    pub const SHEPHERD_HEADER_BACKGROUND: &str = "rgb(100, 100, 100)";
    pub const SHEPHERD_BUTTON_BACKGROUND: &str = "rgb(0, 128, 0)";
    pub const SHEPHERD_SECONDARY_BACKGROUND: &str = "rgb(200, 200, 200)";
    pub const PAGE_BACKGROUND: &str = "rgb(245, 245, 245)";
}

/// One queued button color. Accepts `{"backgroundColor", "color"}` or a bare string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ButtonColor {
    Pair {
        #[serde(rename = "backgroundColor", default)]
        background: Option<String>,
        #[serde(default)]
        color: Option<String>,
    },
    Background(String),
}

impl ButtonColor {
    fn background(&self) -> &str {
        match self {
            ButtonColor::Pair { background, .. } => background
                .as_deref()
                .unwrap_or(defaults::BUTTON_BACKGROUND),
            ButtonColor::Background(bg) => bg,
        }
    }

    fn foreground(&self) -> &str {
        match self {
            ButtonColor::Pair { color, .. } => {
                color.as_deref().unwrap_or(defaults::BUTTON_FOREGROUND)
            }
            ButtonColor::Background(_) => defaults::BUTTON_FOREGROUND,
        }
    }
}

/// Palette hints recorded alongside a session (`colors` in the recording file).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaletteHints {
    #[serde(default)]
    pub navbar: Option<String>,
    /// FIFO of button colors, consumed across the whole recording.
    #[serde(default)]
    pub buttons: Vec<ButtonColor>,
    #[serde(default)]
    pub text: Option<String>,
    /// Shared by all three shepherd (guided-tour) roles.
    #[serde(rename = "backgroundColor", default)]
    pub background_color: Option<String>,
    /// Page background.
    #[serde(default)]
    pub background: Option<String>,
}

/// Font hints (`font-family` in the recording file).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FontHints {
    #[serde(default)]
    pub navbar: Option<String>,
    #[serde(default)]
    pub button: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

/// One entry of the ordered classification table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassificationRule {
    pub kind: ElementKind,
    /// Tag names this rule accepts.
    pub tags: &'static [&'static str],
    /// Class token that must be present, if any.
    pub required_class: Option<&'static str>,
}

impl ClassificationRule {
    pub fn matches(&self, node: &SnapshotNode) -> bool {
        self.tags.contains(&node.tag())
            && self.required_class.map_or(true, |class| node.has_class(class))
    }
}

/// Classification rules, evaluated in order. First match wins.
pub const CLASSIFICATION_RULES: [ClassificationRule; 6] = [
    ClassificationRule {
        kind: ElementKind::Navbar,
        tags: &["nav"],
        required_class: None,
    },
    ClassificationRule {
        kind: ElementKind::Button,
        tags: &["button", "a"],
        required_class: Some("btn"),
    },
    ClassificationRule {
        kind: ElementKind::Text,
        tags: &["p", "span", "div"],
        required_class: None,
    },
    ClassificationRule {
        kind: ElementKind::ShepherdHeader,
        tags: &["header"],
        required_class: Some("shepherd-header"),
    },
    ClassificationRule {
        kind: ElementKind::ShepherdButtons,
        tags: &["button"],
        required_class: Some("shepherd-button"),
    },
    ClassificationRule {
        kind: ElementKind::ShepherdSecondaryButtons,
        tags: &["button"],
        required_class: Some("shepherd-button-secondary"),
    },
];

/// Role of a node under CLASSIFICATION_RULES, if any.
pub fn classify(node: &SnapshotNode) -> Option<ElementKind> {
    CLASSIFICATION_RULES
        .iter()
        .find(|rule| rule.matches(node))
        .map(|rule| rule.kind)
}

/// Inclusive range a random id is drawn from when a node has none.
///
/// Ranges overlap across roles, so ids are not unique across kinds.
pub fn fallback_id_range(kind: ElementKind) -> RangeInclusive<i64> {
    match kind {
        ElementKind::Button => 100..=1100,
        ElementKind::Navbar => 200..=1200,
        ElementKind::Text => 300..=1300,
        ElementKind::ShepherdHeader => 400..=1400,
        ElementKind::ShepherdButtons => 500..=1500,
        ElementKind::ShepherdSecondaryButtons => 600..=1600,
        ElementKind::Background | ElementKind::Unknown => {
            BACKGROUND_ELEMENT_ID..=BACKGROUND_ELEMENT_ID
        }
    }
}

/// Per-call filter state: hints plus the shared button queue.
struct Styler<'a, R: Rng + ?Sized> {
    palette: &'a PaletteHints,
    fonts: &'a FontHints,
    buttons: VecDeque<ButtonColor>,
    rng: &'a mut R,
}

impl<R: Rng + ?Sized> Styler<'_, R> {
    fn element_id(&mut self, kind: ElementKind, node: &SnapshotNode) -> i64 {
        match node.id {
            Some(id) => id,
            None => self.rng.gen_range(fallback_id_range(kind)),
        }
    }

    fn style(&mut self, kind: ElementKind, node: &SnapshotNode) -> StyledElement {
        let id = self.element_id(kind, node);
        let el = StyledElement::new(kind, id);
        let palette = self.palette;
        let fonts = self.fonts;
        let shepherd_bg = palette.background_color.as_deref();

        match kind {
            ElementKind::Navbar => el
                .with_style(
                    "background-color",
                    palette
                        .navbar
                        .as_deref()
                        .unwrap_or(defaults::NAVBAR_BACKGROUND),
                )
                .with_style("color", defaults::NAVBAR_FOREGROUND)
                .with_style("font-family", font_or_default(&fonts.navbar)),
            ElementKind::Button => {
                let (bg, fg) = match self.buttons.pop_front() {
                    Some(queued) => (
                        queued.background().to_string(),
                        queued.foreground().to_string(),
                    ),
                    None => (
                        defaults::BUTTON_BACKGROUND.to_string(),
                        defaults::BUTTON_FOREGROUND.to_string(),
                    ),
                };
                el.with_style("background-color", bg)
                    .with_style("color", fg)
                    .with_style("font-family", font_or_default(&fonts.button))
            }
            ElementKind::Text => el
                .with_style(
                    "color",
                    palette
                        .text
                        .as_deref()
                        .unwrap_or(defaults::TEXT_FOREGROUND),
                )
                .with_style("font-family", font_or_default(&fonts.text)),
            ElementKind::ShepherdHeader => el.with_style(
                "background-color",
                shepherd_bg.unwrap_or(defaults::SHEPHERD_HEADER_BACKGROUND),
            ),
            ElementKind::ShepherdButtons => el.with_style(
                "background-color",
                shepherd_bg.unwrap_or(defaults::SHEPHERD_BUTTON_BACKGROUND),
            ),
            ElementKind::ShepherdSecondaryButtons => el.with_style(
                "background-color",
                shepherd_bg.unwrap_or(defaults::SHEPHERD_SECONDARY_BACKGROUND),
            ),
            ElementKind::Background | ElementKind::Unknown => el,
        }
    }

    fn background(&self) -> StyledElement {
        StyledElement::new(ElementKind::Background, BACKGROUND_ELEMENT_ID).with_style(
            "background-color",
            self.palette
                .background
                .as_deref()
                .unwrap_or(defaults::PAGE_BACKGROUND),
        )
    }

    /// Walk one snapshot tree and return its styled elements, background last.
    fn walk(&mut self, root: &SnapshotNode) -> Vec<StyledElement> {
        let mut elements = Vec::new();
        let mut stack = vec![root];

        while let Some(node) = stack.pop() {
            if let Some(kind) = classify(node) {
                elements.push(self.style(kind, node));
            }
            // Reverse so the first child is popped next (pre-order, document order).
            stack.extend(node.child_nodes.iter().rev());
        }

        elements.push(self.background());
        elements
    }
}

fn font_or_default(font: &Option<String>) -> String {
    font.clone()
        .unwrap_or_else(|| DEFAULT_FONT_FAMILY.to_string())
}

/// Filter a raw event stream.
///
/// Only full snapshots are processed; every other event kind is dropped.
/// The button queue in `palette` is consumed FIFO across all snapshots of
/// this call; `palette` itself is not modified.
pub fn filter_events<R: Rng + ?Sized>(
    events: &[RawEvent],
    palette: &PaletteHints,
    fonts: &FontHints,
    rng: &mut R,
) -> Vec<FilteredEvent> {
    let mut styler = Styler {
        palette,
        fonts,
        buttons: palette.buttons.iter().cloned().collect(),
        rng,
    };

    events
        .iter()
        .filter(|ev| ev.is_full_snapshot())
        .map(|ev| {
            let elements = styler.walk(&ev.snapshot_root());
            debug!(
                timestamp = ?ev.timestamp,
                elements = elements.len(),
                "filtered full snapshot"
            );
            FilteredEvent {
                timestamp: ev.timestamp,
                elements,
            }
        })
        .collect()
}

/// Filter a whole raw recording using its own palette and font hints.
pub fn filter_recording<R: Rng + ?Sized>(
    recording: &RawRecording,
    rng: &mut R,
) -> Vec<FilteredEvent> {
    filter_events(&recording.events, &recording.colors, &recording.fonts, rng)
}
