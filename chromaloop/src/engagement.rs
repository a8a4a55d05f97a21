// src/engagement.rs
//
// Engagement signals attached to a recording.
//
// Real analytics are not wired in yet; SyntheticEngagement draws the three
// signals from the environment's seeded RNG, and RecordedEngagement serves a
// static per-recording table (falling back to synthetic draws).

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::store::RecordingError;

/// Three normalised engagement metrics, each in [0, 1].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngagementSignal {
    pub clicks: f64,
    pub scroll_depth: f64,
    pub bounce_rate: f64,
}

impl EngagementSignal {
    pub fn new(clicks: f64, scroll_depth: f64, bounce_rate: f64) -> Self {
        Self {
            clicks,
            scroll_depth,
            bounce_rate,
        }
        .clamped()
    }

    /// Clamp every metric into [0, 1]. Non-finite values become 0.
    pub fn clamped(self) -> Self {
        let c = |v: f64| if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 };
        Self {
            clicks: c(self.clicks),
            scroll_depth: c(self.scroll_depth),
            bounce_rate: c(self.bounce_rate),
        }
    }

    pub fn as_array(&self) -> [f64; 3] {
        [self.clicks, self.scroll_depth, self.bounce_rate]
    }
}

/// Source of engagement signals for a recording.
///
/// `rng` is the environment's shared random source so that synthetic
/// signals follow the environment seed.
pub trait EngagementSource: Send {
    fn signal(&mut self, recording: &str, rng: &mut dyn RngCore) -> EngagementSignal;
}

/// Uniform [0, 1) draws in the order clicks, scroll depth, bounce rate.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntheticEngagement;

impl EngagementSource for SyntheticEngagement {
    fn signal(&mut self, _recording: &str, rng: &mut dyn RngCore) -> EngagementSignal {
        let clicks: f64 = rng.gen();
        let scroll_depth: f64 = rng.gen();
        let bounce_rate: f64 = rng.gen();
        EngagementSignal {
            clicks,
            scroll_depth,
            bounce_rate,
        }
    }
}

/// Static table of signals keyed by recording name.
#[derive(Debug, Clone, Default)]
pub struct RecordedEngagement {
    table: HashMap<String, EngagementSignal>,
    fallback: SyntheticEngagement,
}

impl RecordedEngagement {
    pub fn new(table: HashMap<String, EngagementSignal>) -> Self {
        let table = table
            .into_iter()
            .map(|(name, signal)| (name, signal.clamped()))
            .collect();
        Self {
            table,
            fallback: SyntheticEngagement,
        }
    }

    /// Load `{ "<recording>": { "clicks": .., "scrollDepth": .., "bounceRate": .. } }`.
    pub fn from_json_file(path: &Path) -> Result<Self, RecordingError> {
        let contents = fs::read_to_string(path).map_err(|e| RecordingError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        let table: HashMap<String, EngagementSignal> =
            serde_json::from_str(&contents).map_err(|e| RecordingError::Json {
                name: path.display().to_string(),
                source: e,
            })?;
        Ok(Self::new(table))
    }
}

impl EngagementSource for RecordedEngagement {
    fn signal(&mut self, recording: &str, rng: &mut dyn RngCore) -> EngagementSignal {
        match self.table.get(recording) {
            Some(signal) => *signal,
            None => self.fallback.signal(recording, rng),
        }
    }
}

/// Recorded table when `path` is given, synthetic draws otherwise.
pub fn load_engagement(path: Option<&Path>) -> Result<Box<dyn EngagementSource>, RecordingError> {
    match path {
        Some(p) => {
            let recorded = RecordedEngagement::from_json_file(p)?;
            tracing::info!(
                path = %p.display(),
                entries = recorded.table.len(),
                "loaded engagement table"
            );
            Ok(Box::new(recorded))
        }
        None => Ok(Box::new(SyntheticEngagement)),
    }
}
