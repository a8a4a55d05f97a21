// src/rl/observation.rs
//
// Versioned observation for the color-optimisation environment.
//
// Layout (OBS_DIM = 18 scalars, all in [0, 1]):
//   [0..15)  ColorVector: button, navbar, background, shepherd header,
//            shepherd button (RGB each)
//   [15..18) EngagementSignal: clicks, scroll depth, bounce rate

use serde::{Deserialize, Serialize};

use crate::engagement::EngagementSignal;
use crate::recording::{ColorVector, COLOR_DIM};

/// Current observation schema version.
/// Increment when changing the layout.
pub const OBS_VERSION: u32 = 1;

/// Engagement scalars appended after the colors.
pub const ENGAGEMENT_DIM: usize = 3;

/// Total observation length.
pub const OBS_DIM: usize = COLOR_DIM + ENGAGEMENT_DIM;

/// Axis-aligned box space, as published to the external optimiser.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxSpace {
    pub low: f64,
    pub high: f64,
    pub dim: usize,
}

impl BoxSpace {
    pub fn contains(&self, values: &[f64]) -> bool {
        values.len() == self.dim && values.iter().all(|v| *v >= self.low && *v <= self.high)
    }
}

pub const OBSERVATION_SPACE: BoxSpace = BoxSpace {
    low: 0.0,
    high: 1.0,
    dim: OBS_DIM,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub colors: ColorVector,
    pub engagement: EngagementSignal,
}

impl Observation {
    pub fn new(colors: ColorVector, engagement: EngagementSignal) -> Self {
        Self { colors, engagement }
    }

    /// Flat vector in the documented layout.
    pub fn to_array(&self) -> [f64; OBS_DIM] {
        let mut out = [0.0; OBS_DIM];
        out[..COLOR_DIM].copy_from_slice(self.colors.channels());
        out[COLOR_DIM..].copy_from_slice(&self.engagement.as_array());
        out
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.to_array().to_vec()
    }

    /// Rebuild from a flat vector. Returns None on a length mismatch.
    pub fn from_slice(values: &[f64]) -> Option<Self> {
        if values.len() != OBS_DIM {
            return None;
        }
        let mut channels = [0.0; COLOR_DIM];
        channels.copy_from_slice(&values[..COLOR_DIM]);
        Some(Self {
            colors: ColorVector::from_channels(channels),
            engagement: EngagementSignal {
                clicks: values[COLOR_DIM],
                scroll_depth: values[COLOR_DIM + 1],
                bounce_rate: values[COLOR_DIM + 2],
            },
        })
    }

    /// Serialize to canonical JSON bytes (for determinism checks).
    pub fn to_canonical_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(&self.to_array())
    }
}
