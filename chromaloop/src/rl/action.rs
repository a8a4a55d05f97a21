// src/rl/action.rs
//
// Action contract: one signed delta per color channel.
//
// Actions arrive as raw slices from the optimiser. Shape and finiteness are
// validated first; only then is each component clipped into
// [ACTION_LOW, ACTION_HIGH].

use serde::{Deserialize, Serialize};

use crate::recording::COLOR_DIM;

use super::env::EnvError;
use super::observation::BoxSpace;

/// Action vector length (one delta per color channel).
pub const ACTION_DIM: usize = COLOR_DIM;

pub const ACTION_LOW: f64 = -0.05;
pub const ACTION_HIGH: f64 = 0.05;

pub const ACTION_SPACE: BoxSpace = BoxSpace {
    low: ACTION_LOW,
    high: ACTION_HIGH,
    dim: ACTION_DIM,
};

/// A validated, clipped action.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorAction {
    deltas: [f64; ACTION_DIM],
}

impl Default for ColorAction {
    fn default() -> Self {
        Self::zero()
    }
}

impl ColorAction {
    /// The no-change action.
    pub fn zero() -> Self {
        Self {
            deltas: [0.0; ACTION_DIM],
        }
    }

    /// Validate the shape and values of a raw action, then clip it to bounds.
    pub fn from_slice(raw: &[f64]) -> Result<Self, EnvError> {
        if raw.len() != ACTION_DIM {
            return Err(EnvError::ActionDim {
                expected: ACTION_DIM,
                got: raw.len(),
            });
        }
        if let Some(index) = raw.iter().position(|v| !v.is_finite()) {
            return Err(EnvError::ActionNotFinite { index });
        }

        let mut deltas = [0.0; ACTION_DIM];
        for (d, v) in deltas.iter_mut().zip(raw) {
            *d = v.clamp(ACTION_LOW, ACTION_HIGH);
        }
        Ok(Self { deltas })
    }

    pub fn deltas(&self) -> &[f64; ACTION_DIM] {
        &self.deltas
    }

    /// Mean absolute component.
    pub fn mean_abs(&self) -> f64 {
        self.deltas.iter().map(|d| d.abs()).sum::<f64>() / ACTION_DIM as f64
    }

    /// True when every component is strictly below `threshold` in magnitude.
    pub fn all_below(&self, threshold: f64) -> bool {
        self.deltas.iter().all(|d| d.abs() < threshold)
    }
}
