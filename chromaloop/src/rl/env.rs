// src/rl/env.rs
//
// Gym-style color-optimisation environment.
//
// - reset(seed) -> Observation: advance the recording cursor, decode the
//   selected recording, draw a fresh engagement signal
// - step(action) -> StepResult: clip-add the action to the colors, clamp to
//   [0, 1], score the result
//
// One instance owns one mutable Observation and one seeded random source.
// Calls are not reentrant; an embedding service must serialize access.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::engagement::EngagementSource;
use crate::recording::{decode_recording, FilteredRecording};
use crate::scheme::ColorScheme;
use crate::store::{RecordingError, RecordingStore};

use super::action::ColorAction;
use super::observation::Observation;
use super::reward::{RewardComponents, RewardWeights};

#[derive(Debug, Error)]
pub enum EnvError {
    #[error("no recordings available")]
    NoRecordings,
    #[error("step called before reset")]
    NotReset,
    #[error("action has {got} components, expected {expected}")]
    ActionDim { expected: usize, got: usize },
    #[error("action component {index} is not finite")]
    ActionNotFinite { index: usize },
    #[error(transparent)]
    Recording(#[from] RecordingError),
}

/// Lifecycle of an environment instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnvPhase {
    Uninitialized,
    Ready,
    Stepped,
}

#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    /// Seed for the environment's random source until reset(Some(seed)).
    pub seed: u64,
    pub reward_weights: RewardWeights,
}

/// Additional information returned from a step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepInfo {
    /// Recording the episode was reset from.
    pub recording: String,
    /// 1-based step index within the episode.
    pub step: u64,
    /// Action after clipping.
    pub action_applied: ColorAction,
    pub reward_components: RewardComponents,
}

/// Result of a single environment step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub observation: Observation,
    pub reward: f64,
    /// Every action component was below the convergence threshold.
    pub terminated: bool,
    /// Always false: there is no step cap inside the environment.
    pub truncated: bool,
    pub info: StepInfo,
}

pub struct ColorEnv {
    store: Box<dyn RecordingStore>,
    engagement: Box<dyn EngagementSource>,
    reward_weights: RewardWeights,
    /// Recording names, fixed at construction.
    recordings: Vec<String>,
    cursor: usize,
    rng: ChaCha8Rng,
    seed: u64,
    phase: EnvPhase,
    observation: Observation,
    current: Option<String>,
    step_index: u64,
}

impl ColorEnv {
    /// Create an environment over the recordings `store` discovers now.
    ///
    /// An empty recording set is accepted here and reported by `reset`.
    pub fn new(
        store: Box<dyn RecordingStore>,
        engagement: Box<dyn EngagementSource>,
        config: EnvConfig,
    ) -> Result<Self, EnvError> {
        let recordings = store.discover()?;
        debug!(count = recordings.len(), "discovered recordings");

        Ok(Self {
            store,
            engagement,
            reward_weights: config.reward_weights,
            recordings,
            cursor: 0,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            seed: config.seed,
            phase: EnvPhase::Uninitialized,
            observation: Observation::new(Default::default(), Default::default()),
            current: None,
            step_index: 0,
        })
    }

    /// Start a new episode on the next recording.
    ///
    /// `seed` reseeds the random source before the engagement draw.
    pub fn reset(&mut self, seed: Option<u64>) -> Result<Observation, EnvError> {
        if let Some(seed) = seed {
            self.rng = ChaCha8Rng::seed_from_u64(seed);
            self.seed = seed;
        }

        if self.recordings.is_empty() {
            return Err(EnvError::NoRecordings);
        }
        self.cursor = (self.cursor + 1) % self.recordings.len();
        let name = self.recordings[self.cursor].clone();

        let contents = self.store.read(&name)?;
        let recording =
            FilteredRecording::from_json_str(&contents).map_err(|e| RecordingError::Json {
                name: name.clone(),
                source: e,
            })?;
        let colors = decode_recording(recording);
        let engagement = self.engagement.signal(&name, &mut self.rng).clamped();

        info!(recording = %name, cursor = self.cursor, seed = self.seed, "environment reset");

        self.observation = Observation::new(colors, engagement);
        self.current = Some(name);
        self.phase = EnvPhase::Ready;
        self.step_index = 0;
        Ok(self.observation)
    }

    /// Apply one action and score the resulting colors.
    pub fn step(&mut self, action: &[f64]) -> Result<StepResult, EnvError> {
        if self.phase == EnvPhase::Uninitialized {
            return Err(EnvError::NotReset);
        }
        let action = ColorAction::from_slice(action)?;

        for (channel, delta) in self
            .observation
            .colors
            .channels_mut()
            .iter_mut()
            .zip(action.deltas())
        {
            *channel = (*channel + delta).clamp(0.0, 1.0);
        }

        let components = RewardComponents::compute(
            &self.observation.colors,
            &self.observation.engagement,
            &action,
            &self.reward_weights,
        );
        let reward = components.total();
        let terminated = action.all_below(self.reward_weights.convergence_threshold);

        self.phase = EnvPhase::Stepped;
        self.step_index += 1;
        debug!(step = self.step_index, reward, terminated, "environment step");

        Ok(StepResult {
            observation: self.observation,
            reward,
            terminated,
            truncated: false,
            info: StepInfo {
                recording: self.current.clone().unwrap_or_default(),
                step: self.step_index,
                action_applied: action,
                reward_components: components,
            },
        })
    }

    /// Current color state as a scheme.
    pub fn scheme(&self) -> ColorScheme {
        ColorScheme::emit(&self.observation)
    }

    pub fn observation(&self) -> &Observation {
        &self.observation
    }

    pub fn phase(&self) -> EnvPhase {
        self.phase
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn recordings(&self) -> &[String] {
        &self.recordings
    }

    pub fn current_recording(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn step_index(&self) -> u64 {
        self.step_index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engagement::SyntheticEngagement;
    use crate::recording::PaletteRole;
    use crate::store::MemoryRecordingStore;
    use serde_json::json;

    fn filtered(navbar: &str) -> String {
        json!([{
            "timestamp": 1,
            "data": { "elements": [
                { "type": "navbar", "id": 1, "attributes": { "style": { "background-color": navbar } } },
                { "type": "background", "id": 301, "attributes": { "style": { "background-color": "rgb(0, 0, 0)" } } }
            ] }
        }])
        .to_string()
    }

    fn env_with(names: &[(&str, &str)]) -> ColorEnv {
        let mut store = MemoryRecordingStore::new();
        for (name, navbar) in names {
            store.insert(*name, filtered(navbar));
        }
        ColorEnv::new(
            Box::new(store),
            Box::new(SyntheticEngagement),
            EnvConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_first_reset_loads_second_recording() {
        let mut env = env_with(&[("a", "rgb(10, 10, 10)"), ("b", "rgb(20, 20, 20)")]);
        assert_eq!(env.phase(), EnvPhase::Uninitialized);

        env.reset(None).unwrap();
        assert_eq!(env.current_recording(), Some("b"));
        env.reset(None).unwrap();
        assert_eq!(env.current_recording(), Some("a"));
        env.reset(None).unwrap();
        assert_eq!(env.current_recording(), Some("b"));
    }

    #[test]
    fn test_single_recording_cycles_to_itself() {
        let mut env = env_with(&[("only", "rgb(10, 10, 10)")]);
        env.reset(None).unwrap();
        assert_eq!(env.cursor(), 0);
        assert_eq!(env.current_recording(), Some("only"));
    }

    #[test]
    fn test_no_recordings_and_not_reset() {
        let mut env = env_with(&[]);
        assert!(matches!(env.step(&[0.0; 15]), Err(EnvError::NotReset)));
        assert!(matches!(env.reset(None), Err(EnvError::NoRecordings)));
        assert_eq!(env.phase(), EnvPhase::Uninitialized);
    }

    #[test]
    fn test_bad_recording_surfaces_error() {
        let store = MemoryRecordingStore::new().with("a", "not json").with("b", "{oops");
        let mut env =
            ColorEnv::new(Box::new(store), Box::new(SyntheticEngagement), EnvConfig::default())
                .unwrap();
        assert!(matches!(
            env.reset(None),
            Err(EnvError::Recording(RecordingError::Json { .. }))
        ));
    }

    #[test]
    fn test_rejects_wrong_shape_without_mutating() {
        let mut env = env_with(&[("a", "rgb(10, 10, 10)")]);
        let before = env.reset(None).unwrap();
        assert!(matches!(
            env.step(&[0.01; 16]),
            Err(EnvError::ActionDim {
                expected: 15,
                got: 16
            })
        ));
        assert_eq!(env.observation(), &before);
        assert_eq!(env.phase(), EnvPhase::Ready);
    }

    #[test]
    fn test_step_clips_and_keeps_engagement() {
        let mut env = env_with(&[("a", "rgb(255, 255, 255)")]);
        let start = env.reset(Some(3)).unwrap();

        let mut action = [0.0; 15];
        action[3] = 0.05; // navbar red, already at 1.0
        action[6] = -1.0; // background red, already at 0.0; clipped to -0.05
        let r = env.step(&action).unwrap();

        assert_eq!(r.observation.colors.role(PaletteRole::Navbar)[0], 1.0);
        assert_eq!(r.observation.colors.role(PaletteRole::Background)[0], 0.0);
        assert_eq!(r.observation.engagement, start.engagement);
        assert_eq!(r.info.action_applied.deltas()[6], -0.05);
        assert!(!r.terminated);
        assert!(!r.truncated);
        assert_eq!(env.phase(), EnvPhase::Stepped);
        assert_eq!(r.info.step, 1);
    }

    #[test]
    fn test_terminates_on_small_action() {
        let mut env = env_with(&[("a", "rgb(255, 255, 255)")]);
        env.reset(None).unwrap();
        assert!(env.step(&[0.009; 15]).unwrap().terminated);
        assert!(!env.step(&[0.01; 15]).unwrap().terminated);
        assert!(env.step(&[-0.005; 15]).unwrap().terminated);
    }

    #[test]
    fn test_same_seed_same_trajectory() {
        let run = |seed| {
            let mut env = env_with(&[("a", "rgb(90, 120, 200)"), ("b", "rgb(0, 0, 0)")]);
            let mut out = vec![env.reset(Some(seed)).unwrap().to_vec()];
            for i in 0..5 {
                let a = [0.01 * (i as f64 - 2.0); 15];
                let r = env.step(&a).unwrap();
                out.push(r.observation.to_vec());
                out.push(vec![r.reward]);
            }
            out
        };
        assert_eq!(run(42), run(42));
        assert_ne!(run(42)[0][15..], run(43)[0][15..]);
    }

    #[test]
    fn test_reset_replaces_observation() {
        let mut env = env_with(&[("a", "rgb(255, 255, 255)")]);
        let first = env.reset(Some(1)).unwrap();
        env.step(&[-0.05; 15]).unwrap();
        let again = env.reset(Some(1)).unwrap();
        assert_eq!(first, again);
        assert_eq!(env.step_index(), 0);
        assert_eq!(env.phase(), EnvPhase::Ready);
    }
}
