// chromaloop_env/src/lib.rs
//
// Python bindings for the chromaloop color-optimisation environment.
//
// Gymnasium-shaped API for an external optimiser:
// - ColorEnv.reset(seed=None) -> (obs, info)
// - ColorEnv.step(action) -> (obs, reward, terminated, truncated, info)
// - observation_space / action_space as (low, high, shape)
//
// Observations are flat 18-float lists; actions are 15-float sequences.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use pyo3::exceptions::{PyOSError, PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyDict;

use chromaloop::engagement::load_engagement;
use chromaloop::rl::{
    ColorEnv as RustColorEnv, EnvConfig, EnvError, RewardComponents, StepResult, ACTION_DIM,
    ACTION_SPACE, OBSERVATION_SPACE, OBS_DIM, OBS_VERSION,
};
use chromaloop::scheme::write_scheme;
use chromaloop::store::{DirRecordingStore, RecordingError};

type Space = (f64, f64, (usize,));

fn env_err(err: EnvError) -> PyErr {
    match err {
        EnvError::ActionDim { .. } | EnvError::ActionNotFinite { .. } => {
            PyValueError::new_err(err.to_string())
        }
        EnvError::Recording(RecordingError::Io { .. }) => PyOSError::new_err(err.to_string()),
        _ => PyRuntimeError::new_err(err.to_string()),
    }
}

fn recording_err(err: RecordingError) -> PyErr {
    env_err(EnvError::Recording(err))
}

fn components_to_dict(py: Python<'_>, c: &RewardComponents) -> PyResult<Py<PyDict>> {
    let dict = PyDict::new_bound(py);
    dict.set_item("navbar_visibility", c.navbar_visibility)?;
    dict.set_item("navbar_contrast", c.navbar_contrast)?;
    dict.set_item("accent_visibility", c.accent_visibility)?;
    dict.set_item("clicks", c.clicks)?;
    dict.set_item("scroll_depth", c.scroll_depth)?;
    dict.set_item("bounce_rate", c.bounce_rate)?;
    dict.set_item("convergence", c.convergence)?;
    Ok(dict.into())
}

/// Gym-style color-optimisation environment.
#[pyclass]
pub struct ColorEnv {
    inner: RustColorEnv,
}

impl ColorEnv {
    fn reset_info(&self, py: Python<'_>) -> PyResult<Py<PyDict>> {
        let dict = PyDict::new_bound(py);
        dict.set_item("recording", self.inner.current_recording())?;
        dict.set_item("cursor", self.inner.cursor())?;
        dict.set_item("seed", self.inner.seed())?;
        Ok(dict.into())
    }

    fn step_info(&self, py: Python<'_>, result: &StepResult) -> PyResult<Py<PyDict>> {
        let dict = PyDict::new_bound(py);
        dict.set_item("recording", &result.info.recording)?;
        dict.set_item("step", result.info.step)?;
        dict.set_item("action_applied", result.info.action_applied.deltas().to_vec())?;
        dict.set_item(
            "reward_components",
            components_to_dict(py, &result.info.reward_components)?,
        )?;
        Ok(dict.into())
    }
}

#[pymethods]
impl ColorEnv {
    /// Create an environment over the `*.json` files in `filtered_dir`.
    ///
    /// Args:
    ///     filtered_dir: Directory of filtered recordings
    ///     seed: Seed for the environment's random source (default: 0)
    ///     engagement_path: Optional JSON engagement table; synthetic otherwise
    #[new]
    #[pyo3(signature = (filtered_dir, seed=0, engagement_path=None))]
    fn new(filtered_dir: PathBuf, seed: u64, engagement_path: Option<PathBuf>) -> PyResult<Self> {
        let engagement = load_engagement(engagement_path.as_deref()).map_err(recording_err)?;
        let config = EnvConfig {
            seed,
            ..EnvConfig::default()
        };
        let inner = RustColorEnv::new(
            Box::new(DirRecordingStore::new(filtered_dir)),
            engagement,
            config,
        )
        .map_err(env_err)?;
        Ok(Self { inner })
    }

    /// Start a new episode on the next recording.
    ///
    /// Returns:
    ///     Tuple of (observation, info)
    #[pyo3(signature = (seed=None))]
    fn reset(&mut self, py: Python<'_>, seed: Option<u64>) -> PyResult<(Vec<f64>, Py<PyDict>)> {
        let obs = self.inner.reset(seed).map_err(env_err)?;
        Ok((obs.to_vec(), self.reset_info(py)?))
    }

    /// Apply a 15-component action.
    ///
    /// Returns:
    ///     Tuple of (observation, reward, terminated, truncated, info)
    #[allow(clippy::type_complexity)]
    fn step(
        &mut self,
        py: Python<'_>,
        action: Vec<f64>,
    ) -> PyResult<(Vec<f64>, f64, bool, bool, Py<PyDict>)> {
        let result = self.inner.step(&action).map_err(env_err)?;
        let info = self.step_info(py, &result)?;
        Ok((
            result.observation.to_vec(),
            result.reward,
            result.terminated,
            result.truncated,
            info,
        ))
    }

    /// Current colors as a scheme: role name -> (r, g, b).
    fn scheme(&self, py: Python<'_>) -> PyResult<Py<PyDict>> {
        let dict = PyDict::new_bound(py);
        for (role, [r, g, b]) in self.inner.scheme().entries() {
            dict.set_item(format!("{}_color", role.as_str()), (r, g, b))?;
        }
        Ok(dict.into())
    }

    /// Persist the current scheme as `<unix-seconds>_colors.json` in `dir`.
    ///
    /// Returns:
    ///     Path of the written file
    fn save_scheme(&self, dir: PathBuf) -> PyResult<PathBuf> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| PyRuntimeError::new_err(e.to_string()))?
            .as_secs();
        write_scheme(&dir, &self.inner.scheme(), now).map_err(recording_err)
    }

    #[getter]
    fn observation(&self) -> Vec<f64> {
        self.inner.observation().to_vec()
    }

    #[getter]
    fn observation_space(&self) -> Space {
        (
            OBSERVATION_SPACE.low,
            OBSERVATION_SPACE.high,
            (OBSERVATION_SPACE.dim,),
        )
    }

    #[getter]
    fn action_space(&self) -> Space {
        (ACTION_SPACE.low, ACTION_SPACE.high, (ACTION_SPACE.dim,))
    }

    #[getter]
    fn recordings(&self) -> Vec<String> {
        self.inner.recordings().to_vec()
    }

    #[getter]
    fn seed(&self) -> u64 {
        self.inner.seed()
    }

    #[getter]
    fn phase(&self) -> String {
        format!("{:?}", self.inner.phase())
    }
}

/// Get the observation version.
#[pyfunction]
fn obs_version() -> u32 {
    OBS_VERSION
}

/// Observation length.
#[pyfunction]
fn obs_dim() -> usize {
    OBS_DIM
}

/// Action length.
#[pyfunction]
fn action_dim() -> usize {
    ACTION_DIM
}

/// Python module definition.
#[pymodule]
fn chromaloop_env(m: &Bound<'_, PyModule>) -> PyResult<()> {
    chromaloop::logging::init_tracing("warn");
    m.add_class::<ColorEnv>()?;
    m.add_function(wrap_pyfunction!(obs_version, m)?)?;
    m.add_function(wrap_pyfunction!(obs_dim, m)?)?;
    m.add_function(wrap_pyfunction!(action_dim, m)?)?;
    Ok(())
}
