// tests/env_contract_tests.rs
//
// Observable contract of the color-optimisation environment: reward terms,
// cursor cycling, clipping and determinism.

use std::collections::HashMap;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde_json::json;

use chromaloop::engagement::{EngagementSignal, RecordedEngagement, SyntheticEngagement};
use chromaloop::rl::{
    run_episode, ColorEnv, EnvConfig, EnvError, EnvTelemetry, EpisodeConfig, TerminationReason,
    UniformPolicy, OBSERVATION_SPACE,
};
use chromaloop::scheme::ColorScheme;
use chromaloop::store::MemoryRecordingStore;

fn filtered(colors: [(&str, &str); 5]) -> String {
    let elements: Vec<_> = colors
        .iter()
        .map(|(kind, bg)| {
            json!({ "type": kind, "id": 1, "attributes": { "style": { "background-color": bg } } })
        })
        .collect();
    json!([{ "timestamp": 1, "data": { "elements": elements } }]).to_string()
}

fn reference_recording() -> String {
    filtered([
        ("button", "rgb(102, 102, 102)"),
        ("navbar", "rgb(230, 230, 230)"),
        ("background", "rgb(128, 128, 128)"),
        ("shepherdHeader", "rgb(0, 0, 0)"),
        ("shepherdButtons", "rgb(90, 90, 90)"),
    ])
}

fn grey(level: u8) -> String {
    let c = format!("rgb({level}, {level}, {level})");
    filtered([
        ("button", c.as_str()),
        ("navbar", c.as_str()),
        ("background", c.as_str()),
        ("shepherdHeader", c.as_str()),
        ("shepherdButtons", c.as_str()),
    ])
}

#[test]
fn test_reference_reward_through_environment() {
    let store = MemoryRecordingStore::new().with("ref-filtered.json", reference_recording());
    let engagement = RecordedEngagement::new(HashMap::from([(
        "ref-filtered.json".to_string(),
        EngagementSignal::new(0.5, 0.5, 0.5),
    )]));
    let mut env = ColorEnv::new(Box::new(store), Box::new(engagement), EnvConfig::default())
        .unwrap();

    let obs = env.reset(None).unwrap();
    assert_eq!(obs.engagement, EngagementSignal::new(0.5, 0.5, 0.5));

    let r = env.step(&[0.0; 15]).unwrap();
    assert_eq!(r.reward, 10.8);
    assert_eq!(r.reward, r.info.reward_components.total());
    assert!(r.terminated);
    assert!(!r.truncated);

    let c = r.info.reward_components;
    assert_eq!(c.navbar_visibility, 5.0);
    assert_eq!(c.navbar_contrast, 0.0);
    assert_eq!(c.accent_visibility, 5.0);
    assert_eq!(c.convergence, 0.5);
}

#[test]
fn test_low_contrast_dark_scene_reward() {
    let store = MemoryRecordingStore::new().with("dark", grey(40));
    let engagement = RecordedEngagement::new(HashMap::from([(
        "dark".to_string(),
        EngagementSignal::new(0.0, 0.0, 1.0),
    )]));
    let mut env = ColorEnv::new(Box::new(store), Box::new(engagement), EnvConfig::default())
        .unwrap();
    env.reset(None).unwrap();

    let r = env.step(&[0.05; 15]).unwrap();
    // -5 (navbar dark) - 10 (no contrast) - 5 (accent dark) - 0.2 (bounce) + 0.45
    assert!((r.reward - (-19.75)).abs() < 1e-9, "reward = {}", r.reward);
    assert!(!r.terminated);
}

#[test]
fn test_reset_cycles_modulo_file_count() {
    let store = MemoryRecordingStore::new()
        .with("a", grey(10))
        .with("b", grey(20))
        .with("c", grey(30));
    let mut env =
        ColorEnv::new(Box::new(store), Box::new(SyntheticEngagement), EnvConfig::default())
            .unwrap();

    let mut seen = Vec::new();
    for _ in 0..4 {
        env.reset(Some(1)).unwrap();
        seen.push(env.current_recording().unwrap().to_string());
    }
    assert_eq!(seen, vec!["b", "c", "a", "b"]);
}

#[test]
fn test_empty_store_is_explicit_error() {
    let mut env = ColorEnv::new(
        Box::new(MemoryRecordingStore::new()),
        Box::new(SyntheticEngagement),
        EnvConfig::default(),
    )
    .unwrap();
    assert!(matches!(env.reset(Some(0)), Err(EnvError::NoRecordings)));
}

#[test]
fn test_channels_stay_in_unit_range() {
    let store = MemoryRecordingStore::new()
        .with("lo", grey(0))
        .with("hi", grey(255));
    let mut env =
        ColorEnv::new(Box::new(store), Box::new(SyntheticEngagement), EnvConfig::default())
            .unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(99);

    for _ in 0..4 {
        env.reset(None).unwrap();
        for _ in 0..50 {
            let action: Vec<f64> = (0..15).map(|_| rng.gen_range(-0.05..=0.05)).collect();
            let r = env.step(&action).unwrap();
            assert!(OBSERVATION_SPACE.contains(&r.observation.to_vec()));
        }
    }
}

#[test]
fn test_identical_seeds_give_identical_trajectories() {
    let make = || {
        let store = MemoryRecordingStore::new()
            .with("a", reference_recording())
            .with("b", grey(128));
        ColorEnv::new(
            Box::new(store),
            Box::new(SyntheticEngagement),
            EnvConfig {
                seed: 17,
                ..EnvConfig::default()
            },
        )
        .unwrap()
    };

    let trace = |env: &mut ColorEnv| {
        let mut out: Vec<Vec<u8>> = Vec::new();
        for _ in 0..3 {
            out.push(env.reset(None).unwrap().to_canonical_json().unwrap());
            for k in 0..4 {
                let r = env.step(&[0.02 - 0.01 * k as f64; 15]).unwrap();
                let mut row = r.observation.to_canonical_json().unwrap();
                row.extend_from_slice(&r.reward.to_bits().to_le_bytes());
                row.push(r.terminated as u8);
                out.push(row);
            }
        }
        out
    };

    assert_eq!(trace(&mut make()), trace(&mut make()));
}

#[test]
fn test_reseed_is_independent_of_history() {
    let make = || {
        ColorEnv::new(
            Box::new(MemoryRecordingStore::new().with("only", grey(100))),
            Box::new(SyntheticEngagement),
            EnvConfig::default(),
        )
        .unwrap()
    };

    let mut used = make();
    used.reset(Some(1)).unwrap();
    used.step(&[0.03; 15]).unwrap();
    used.reset(None).unwrap();

    let mut fresh = make();
    assert_eq!(used.reset(Some(8)).unwrap(), fresh.reset(Some(8)).unwrap());
}

#[test]
fn test_uniform_episode_summary() {
    let store = MemoryRecordingStore::new().with("a", reference_recording());
    let mut env =
        ColorEnv::new(Box::new(store), Box::new(SyntheticEngagement), EnvConfig::default())
            .unwrap();
    let mut policy = UniformPolicy::new(4);
    let mut telemetry = EnvTelemetry::disabled();

    let summary = run_episode(
        &mut env,
        &mut policy,
        &EpisodeConfig::default().with_seed(4).with_max_steps(25),
        &mut telemetry,
    )
    .unwrap();

    assert_eq!(summary.recording, "a");
    assert!(summary.total_steps <= 25);
    if summary.termination_reason == TerminationReason::MaxSteps {
        assert_eq!(summary.total_steps, 25);
    }
    assert_eq!(summary.scheme, env.scheme());
}

#[test]
fn test_reset_ignores_malformed_later_events() {
    let mut events: Vec<serde_json::Value> = serde_json::from_str(&reference_recording()).unwrap();
    events.push(json!({ "data": { "elements": [ { "type": "navbar", "id": "x" } ] } }));
    let store = MemoryRecordingStore::new().with("tail", serde_json::to_string(&events).unwrap());

    let mut env =
        ColorEnv::new(Box::new(store), Box::new(SyntheticEngagement), EnvConfig::default())
            .unwrap();
    let obs = env.reset(Some(0)).unwrap();
    assert_eq!(ColorScheme::emit(&obs).navbar_color, [230, 230, 230]);
}
