// src/config.rs
//
// Layered configuration for the chromaloop tools.
//
// Precedence, highest first: CLI flags (applied by the binary), environment
// variables, YAML file, built-in defaults.
//
// Environment variables:
//   - CHROMALOOP_RECORDINGS_DIR   raw recordings directory
//   - CHROMALOOP_FILTERED_DIR     filtered recordings directory
//   - CHROMALOOP_SCHEMES_DIR      output directory for color schemes
//   - CHROMALOOP_ENGAGEMENT_PATH  JSON engagement table (optional)
//   - CHROMALOOP_SEED             u64 seed for the environment RNG

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::rl::env::EnvConfig;
use crate::rl::reward::RewardWeights;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid config field '{field}': {message}")]
    Validation { field: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub recordings_dir: PathBuf,
    pub filtered_dir: PathBuf,
    pub schemes_dir: PathBuf,
    pub engagement_path: Option<PathBuf>,
    pub seed: u64,
    pub reward: RewardWeights,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            recordings_dir: PathBuf::from("./recordings"),
            filtered_dir: PathBuf::from("./filtered_recordings"),
            schemes_dir: PathBuf::from("./new_files"),
            engagement_path: None,
            seed: 0,
            reward: RewardWeights::default(),
        }
    }
}

impl Config {
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            source: e,
        })?;
        Self::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let cfg: Config = serde_yaml::from_str(yaml)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load `path` if given (defaults otherwise), then apply process env overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut cfg = match path {
            Some(p) => Self::from_yaml_file(p)?,
            None => Self::default(),
        };
        cfg.apply_env_overrides();
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup.
    ///
    /// Any variable that fails to parse is ignored with a warning.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let dirs: [(&str, &mut PathBuf); 3] = [
            ("CHROMALOOP_RECORDINGS_DIR", &mut self.recordings_dir),
            ("CHROMALOOP_FILTERED_DIR", &mut self.filtered_dir),
            ("CHROMALOOP_SCHEMES_DIR", &mut self.schemes_dir),
        ];
        for (key, slot) in dirs {
            if let Some(raw) = lookup(key) {
                info!(key, value = %raw, "config override from environment");
                *slot = PathBuf::from(raw);
            }
        }

        if let Some(raw) = lookup("CHROMALOOP_ENGAGEMENT_PATH") {
            info!(key = "CHROMALOOP_ENGAGEMENT_PATH", value = %raw, "config override from environment");
            self.engagement_path = Some(PathBuf::from(raw));
        }

        if let Some(raw) = lookup("CHROMALOOP_SEED") {
            match raw.trim().parse::<u64>() {
                Ok(v) => {
                    info!(key = "CHROMALOOP_SEED", value = v, "config override from environment");
                    self.seed = v;
                }
                Err(_) => warn!(
                    key = "CHROMALOOP_SEED",
                    value = %raw,
                    default = self.seed,
                    "could not parse as u64; keeping current value"
                ),
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, path) in [
            ("recordings_dir", &self.recordings_dir),
            ("filtered_dir", &self.filtered_dir),
            ("schemes_dir", &self.schemes_dir),
        ] {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::Validation {
                    field: field.to_string(),
                    message: "path cannot be empty".to_string(),
                });
            }
        }
        if let Some(p) = &self.engagement_path {
            if p.as_os_str().is_empty() {
                return Err(ConfigError::Validation {
                    field: "engagement_path".to_string(),
                    message: "path cannot be empty when set".to_string(),
                });
            }
        }

        let r = &self.reward;
        let weights = [
            r.visibility_threshold,
            r.visible_bonus,
            r.hidden_penalty,
            r.contrast_threshold,
            r.low_contrast_penalty,
            r.clicks_weight,
            r.scroll_weight,
            r.bounce_weight,
            r.convergence_base,
            r.convergence_threshold,
        ];
        if weights.iter().any(|w| !w.is_finite()) {
            return Err(ConfigError::Validation {
                field: "reward".to_string(),
                message: "all reward weights must be finite".to_string(),
            });
        }
        Ok(())
    }

    pub fn env_config(&self) -> EnvConfig {
        EnvConfig {
            seed: self.seed,
            reward_weights: self.reward.clone(),
        }
    }
}
