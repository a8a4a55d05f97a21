// src/rl/runner.rs
//
// Episode runner: reset the environment, let a policy act until the
// environment reports convergence or a step cap is hit, and summarise the
// result (including the emitted scheme).

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::scheme::ColorScheme;

use super::env::{ColorEnv, EnvError};
use super::policy::Policy;
use super::telemetry::EnvTelemetry;

/// Episode termination reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerminationReason {
    /// Every action component fell below the convergence threshold.
    Converged,
    /// The caller's step cap was reached first.
    MaxSteps,
}

#[derive(Debug, Clone)]
pub struct EpisodeConfig {
    /// Reseed the environment at reset; `None` keeps its current stream.
    pub seed: Option<u64>,
    pub episode_id: u64,
    pub max_steps: u64,
}

impl Default for EpisodeConfig {
    fn default() -> Self {
        Self {
            seed: None,
            episode_id: 0,
            max_steps: 1000,
        }
    }
}

impl EpisodeConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_episode_id(mut self, episode_id: u64) -> Self {
        self.episode_id = episode_id;
        self
    }

    pub fn with_max_steps(mut self, max_steps: u64) -> Self {
        self.max_steps = max_steps;
        self
    }
}

/// Summary of a completed episode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeSummary {
    pub episode_id: u64,
    pub seed: u64,
    pub recording: String,
    pub termination_reason: TerminationReason,
    pub total_steps: u64,
    pub total_reward: f64,
    pub final_reward: Option<f64>,
    pub scheme: ColorScheme,
}

/// Run one episode of `policy` against `env`.
pub fn run_episode(
    env: &mut ColorEnv,
    policy: &mut dyn Policy,
    config: &EpisodeConfig,
    telemetry: &mut EnvTelemetry,
) -> Result<EpisodeSummary, EnvError> {
    let mut obs = env.reset(config.seed)?;
    let seed = env.seed();
    let recording = env.current_recording().unwrap_or_default().to_string();

    policy.reset_episode(seed, config.episode_id);
    telemetry.log_episode_start(config.episode_id, seed, Some(&recording));

    let mut total_reward = 0.0;
    let mut final_reward = None;
    let mut reason = TerminationReason::MaxSteps;
    let mut steps = 0;

    while steps < config.max_steps {
        let action = policy.act(&obs);
        let result = env.step(&action)?;
        steps += 1;
        total_reward += result.reward;
        final_reward = Some(result.reward);
        telemetry.log_step(&result, policy.version(), config.episode_id);

        obs = result.observation;
        if result.terminated {
            reason = TerminationReason::Converged;
            break;
        }
    }

    telemetry.log_episode_end(config.episode_id, seed, reason, total_reward, steps);
    telemetry.flush();

    let scheme = env.scheme();
    info!(
        episode_id = config.episode_id,
        recording = %recording,
        steps,
        total_reward,
        reason = ?reason,
        "episode finished"
    );

    Ok(EpisodeSummary {
        episode_id: config.episode_id,
        seed,
        recording,
        termination_reason: reason,
        total_steps: steps,
        total_reward,
        final_reward,
        scheme,
    })
}
