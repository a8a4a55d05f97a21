// src/rl/policy.rs
//
// Policies map an Observation to a raw action vector.
//
// The learning algorithm lives outside this crate; these policies drive the
// environment for smoke runs, scheme emission without a trained model, and
// tests.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::action::{ACTION_DIM, ACTION_HIGH, ACTION_LOW};
use super::observation::Observation;

/// Interface for anything that proposes actions.
pub trait Policy: Send {
    /// Version string recorded in telemetry.
    fn version(&self) -> &str;

    /// Propose an action for `obs`.
    fn act(&mut self, obs: &Observation) -> Vec<f64>;

    /// Called at the start of each episode.
    fn reset_episode(&mut self, _seed: u64, _episode_id: u64) {}
}

/// Always proposes the zero action (converges on the first step).
#[derive(Debug, Clone, Default)]
pub struct NoopPolicy;

impl Policy for NoopPolicy {
    fn version(&self) -> &str {
        "noop-v1"
    }

    fn act(&mut self, _obs: &Observation) -> Vec<f64> {
        vec![0.0; ACTION_DIM]
    }
}

/// Uniform random deltas within the action bounds.
///
/// Reseeded from the episode seed so runs are reproducible.
#[derive(Debug, Clone)]
pub struct UniformPolicy {
    rng: ChaCha8Rng,
}

impl UniformPolicy {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl Policy for UniformPolicy {
    fn version(&self) -> &str {
        "uniform-v1"
    }

    fn act(&mut self, _obs: &Observation) -> Vec<f64> {
        (0..ACTION_DIM)
            .map(|_| self.rng.gen_range(ACTION_LOW..=ACTION_HIGH))
            .collect()
    }

    fn reset_episode(&mut self, seed: u64, episode_id: u64) {
        self.rng = ChaCha8Rng::seed_from_u64(seed ^ episode_id.rotate_left(32));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs() -> Observation {
        Observation::new(Default::default(), Default::default())
    }

    #[test]
    fn test_noop() {
        let a = NoopPolicy.act(&obs());
        assert_eq!(a, vec![0.0; 15]);
    }

    #[test]
    fn test_uniform_bounded_and_reproducible() {
        let mut p = UniformPolicy::new(0);
        let mut q = UniformPolicy::new(0);
        p.reset_episode(11, 2);
        q.reset_episode(11, 2);
        for _ in 0..50 {
            let a = p.act(&obs());
            assert_eq!(a, q.act(&obs()));
            assert_eq!(a.len(), ACTION_DIM);
            assert!(a.iter().all(|v| (ACTION_LOW..=ACTION_HIGH).contains(v)));
        }
    }
}
