// src/rl/reward.rs
//
// Reward for one environment step.
//
//   r = visibility(navbar) + contrast(navbar, background) + visibility(shepherd button)
//       + w_clicks * clicks + w_scroll * scroll_depth - w_bounce * bounce_rate
//       + (convergence_base - mean_i |a_i|)
//
// The default weights are part of the observable contract; the terms are
// accumulated in the order above so totals are reproducible bit for bit.

use serde::{Deserialize, Serialize};

use crate::engagement::EngagementSignal;
use crate::recording::{ColorVector, PaletteRole};

use super::action::ColorAction;

/// Weights and thresholds of the reward terms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardWeights {
    /// Every channel must exceed this for a role to count as visible.
    pub visibility_threshold: f64,
    pub visible_bonus: f64,
    pub hidden_penalty: f64,
    /// Mean-channel gap below which navbar/background contrast is too low.
    pub contrast_threshold: f64,
    pub low_contrast_penalty: f64,
    pub clicks_weight: f64,
    pub scroll_weight: f64,
    pub bounce_weight: f64,
    pub convergence_base: f64,
    /// Every action component strictly below this (in magnitude) terminates.
    pub convergence_threshold: f64,
}

impl Default for RewardWeights {
    fn default() -> Self {
        Self {
            visibility_threshold: 0.3,
            visible_bonus: 5.0,
            hidden_penalty: -5.0,
            contrast_threshold: 0.2,
            low_contrast_penalty: -10.0,
            clicks_weight: 0.5,
            scroll_weight: 0.3,
            bounce_weight: 0.2,
            convergence_base: 0.5,
            convergence_threshold: 0.01,
        }
    }
}

/// Per-term breakdown of a step reward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RewardComponents {
    pub navbar_visibility: f64,
    pub navbar_contrast: f64,
    pub accent_visibility: f64,
    pub clicks: f64,
    pub scroll_depth: f64,
    /// Already negated.
    pub bounce_rate: f64,
    pub convergence: f64,
}

impl RewardComponents {
    pub fn compute(
        colors: &ColorVector,
        engagement: &EngagementSignal,
        action: &ColorAction,
        weights: &RewardWeights,
    ) -> Self {
        let visibility = |role: PaletteRole| {
            if colors
                .role(role)
                .iter()
                .all(|c| *c > weights.visibility_threshold)
            {
                weights.visible_bonus
            } else {
                weights.hidden_penalty
            }
        };

        let gap = (colors.role_mean(PaletteRole::Navbar)
            - colors.role_mean(PaletteRole::Background))
        .abs();
        let navbar_contrast = if gap < weights.contrast_threshold {
            weights.low_contrast_penalty
        } else {
            0.0
        };

        Self {
            navbar_visibility: visibility(PaletteRole::Navbar),
            navbar_contrast,
            accent_visibility: visibility(PaletteRole::ShepherdButton),
            clicks: engagement.clicks * weights.clicks_weight,
            scroll_depth: engagement.scroll_depth * weights.scroll_weight,
            bounce_rate: -(engagement.bounce_rate * weights.bounce_weight),
            convergence: weights.convergence_base - action.mean_abs(),
        }
    }

    /// Engagement part of the reward.
    pub fn engagement(&self) -> f64 {
        self.clicks + self.scroll_depth + self.bounce_rate
    }

    /// Scalar reward, accumulated term by term.
    pub fn total(&self) -> f64 {
        let mut reward = self.navbar_visibility;
        reward += self.navbar_contrast;
        reward += self.accent_visibility;
        reward += self.clicks;
        reward += self.scroll_depth;
        reward += self.bounce_rate;
        reward += self.convergence;
        reward
    }
}
