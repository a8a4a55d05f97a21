// src/rl/mod.rs
//
// Color-optimisation environment and the tooling around it.
//
// Key components:
// - Observation: 15 color scalars + 3 engagement scalars, versioned
// - ColorAction: validated, clipped per-channel deltas
// - RewardComponents / RewardWeights: the step reward, term by term
// - ColorEnv: Gym-style environment (reset, step)
// - Policy: action proposers for smoke runs and tests
// - run_episode: reset -> act/step until convergence or a step cap
// - EnvTelemetry: JSONL episode and step logging

pub mod action;
pub mod env;
pub mod observation;
pub mod policy;
pub mod reward;
pub mod runner;
pub mod telemetry;

pub use action::{ColorAction, ACTION_DIM, ACTION_HIGH, ACTION_LOW, ACTION_SPACE};
pub use env::{ColorEnv, EnvConfig, EnvError, EnvPhase, StepInfo, StepResult};
pub use observation::{BoxSpace, Observation, OBSERVATION_SPACE, OBS_DIM, OBS_VERSION};
pub use policy::{NoopPolicy, Policy, UniformPolicy};
pub use reward::{RewardComponents, RewardWeights};
pub use runner::{run_episode, EpisodeConfig, EpisodeSummary, TerminationReason};
pub use telemetry::{EnvTelemetry, StepRecord};
