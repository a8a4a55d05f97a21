// src/rl/telemetry.rs
//
// JSONL telemetry for environment episodes:
// - episode start/end markers (seed, recording, termination reason)
// - per-step records (applied action, observation, reward components)
//
// Controlled by environment variables:
// - CHROMALOOP_RL_TELEMETRY_MODE: "off" (default) or "jsonl"
// - CHROMALOOP_RL_TELEMETRY_PATH: path to the JSONL file
//
// A write failure disables the sink; it never fails the episode.

use std::env;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::warn;

use super::env::StepResult;
use super::observation::OBS_VERSION;
use super::reward::RewardComponents;
use super::runner::TerminationReason;

/// Per-step record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    pub obs_version: u32,
    pub policy_version: String,
    pub episode_id: u64,
    pub step: u64,
    pub recording: String,
    /// Action after clipping.
    pub action: Vec<f64>,
    pub observation: Vec<f64>,
    pub reward_components: RewardComponents,
    pub reward: f64,
    pub terminated: bool,
}

impl StepRecord {
    pub fn new(result: &StepResult, policy_version: &str, episode_id: u64) -> Self {
        Self {
            obs_version: OBS_VERSION,
            policy_version: policy_version.to_string(),
            episode_id,
            step: result.info.step,
            recording: result.info.recording.clone(),
            action: result.info.action_applied.deltas().to_vec(),
            observation: result.observation.to_vec(),
            reward_components: result.info.reward_components,
            reward: result.reward,
            terminated: result.terminated,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EpisodeMarkerType {
    Start,
    End,
}

/// Episode boundary marker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeMarker {
    pub episode_id: u64,
    pub seed: u64,
    pub marker_type: EpisodeMarkerType,
    pub recording: Option<String>,
    /// End markers only.
    pub termination_reason: Option<TerminationReason>,
    pub total_reward: Option<f64>,
    pub total_steps: Option<u64>,
}

pub struct EnvTelemetry {
    enabled: bool,
    path: Option<PathBuf>,
    writer: Option<BufWriter<File>>,
}

impl Default for EnvTelemetry {
    fn default() -> Self {
        Self::disabled()
    }
}

impl EnvTelemetry {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            path: None,
            writer: None,
        }
    }

    pub fn from_env() -> Self {
        let enabled = env::var("CHROMALOOP_RL_TELEMETRY_MODE")
            .map(|s| s.eq_ignore_ascii_case("jsonl"))
            .unwrap_or(false);
        let path = env::var("CHROMALOOP_RL_TELEMETRY_PATH")
            .ok()
            .map(PathBuf::from);

        if enabled && path.is_none() {
            warn!("CHROMALOOP_RL_TELEMETRY_MODE=jsonl without CHROMALOOP_RL_TELEMETRY_PATH; telemetry off");
        }
        Self {
            enabled: enabled && path.is_some(),
            path,
            writer: None,
        }
    }

    pub fn enable(path: PathBuf) -> Self {
        Self {
            enabled: true,
            path: Some(path),
            writer: None,
        }
    }

    fn ensure_writer(&mut self) -> Option<&mut BufWriter<File>> {
        if !self.enabled {
            return None;
        }

        if self.writer.is_none() {
            let path = self.path.as_ref()?;
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            match OpenOptions::new().create(true).append(true).open(path) {
                Ok(file) => self.writer = Some(BufWriter::new(file)),
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "cannot open telemetry file; telemetry off");
                    self.enabled = false;
                    return None;
                }
            }
        }

        self.writer.as_mut()
    }

    fn write_json(&mut self, value: &JsonValue) {
        let Some(writer) = self.ensure_writer() else {
            return;
        };
        if writeln!(writer, "{value}").is_err() {
            warn!("telemetry write failed; telemetry off");
            self.enabled = false;
            self.writer = None;
        }
    }

    fn write_record<T: Serialize>(&mut self, record: &T) {
        if !self.enabled {
            return;
        }
        match serde_json::to_value(record) {
            Ok(value) => self.write_json(&value),
            Err(err) => warn!(error = %err, "telemetry record not serializable"),
        }
    }

    pub fn log_episode_start(&mut self, episode_id: u64, seed: u64, recording: Option<&str>) {
        self.write_record(&EpisodeMarker {
            episode_id,
            seed,
            marker_type: EpisodeMarkerType::Start,
            recording: recording.map(str::to_string),
            termination_reason: None,
            total_reward: None,
            total_steps: None,
        });
    }

    pub fn log_episode_end(
        &mut self,
        episode_id: u64,
        seed: u64,
        reason: TerminationReason,
        total_reward: f64,
        total_steps: u64,
    ) {
        self.write_record(&EpisodeMarker {
            episode_id,
            seed,
            marker_type: EpisodeMarkerType::End,
            recording: None,
            termination_reason: Some(reason),
            total_reward: Some(total_reward),
            total_steps: Some(total_steps),
        });
    }

    pub fn log_step(&mut self, result: &StepResult, policy_version: &str, episode_id: u64) {
        if !self.enabled {
            return;
        }
        self.write_record(&StepRecord::new(result, policy_version, episode_id));
    }

    pub fn flush(&mut self) {
        if let Some(writer) = &mut self.writer {
            let _ = writer.flush();
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl Drop for EnvTelemetry {
    fn drop(&mut self) {
        self.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rl::action::ColorAction;
    use crate::rl::env::StepInfo;
    use crate::rl::observation::Observation;
    use tempfile::tempdir;

    fn step_result() -> StepResult {
        StepResult {
            observation: Observation::new(Default::default(), Default::default()),
            reward: 1.25,
            terminated: true,
            truncated: false,
            info: StepInfo {
                recording: "a-filtered.json".to_string(),
                step: 3,
                action_applied: ColorAction::zero(),
                reward_components: RewardComponents {
                    navbar_visibility: 5.0,
                    navbar_contrast: -10.0,
                    accent_visibility: 5.0,
                    clicks: 0.0,
                    scroll_depth: 0.0,
                    bounce_rate: 0.0,
                    convergence: 0.5,
                },
            },
        }
    }

    #[test]
    fn test_disabled_writes_nothing() {
        let mut t = EnvTelemetry::disabled();
        t.log_step(&step_result(), "noop-v1", 0);
        assert!(!t.is_enabled());
    }

    #[test]
    fn test_jsonl_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("rl.jsonl");
        {
            let mut t = EnvTelemetry::enable(path.clone());
            t.log_episode_start(7, 42, Some("a-filtered.json"));
            t.log_step(&step_result(), "noop-v1", 7);
            t.log_episode_end(7, 42, TerminationReason::Converged, 1.25, 1);
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<JsonValue> = contents
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["marker_type"], "Start");
        assert_eq!(lines[1]["step"], 3);
        assert_eq!(lines[1]["observation"].as_array().unwrap().len(), 18);
        assert_eq!(lines[1]["reward_components"]["navbar_contrast"], -10.0);
        assert_eq!(lines[2]["termination_reason"], "Converged");
    }

    #[test]
    fn test_unwritable_path_disables() {
        let dir = tempdir().unwrap();
        // A directory cannot be opened for append.
        let mut t = EnvTelemetry::enable(dir.path().to_path_buf());
        t.log_episode_start(0, 0, None);
        assert!(!t.is_enabled());
    }
}
