// tests/pipeline_tests.rs
//
// End-to-end: raw recordings on disk -> batch filter -> filtered files ->
// environment reset -> emitted scheme.

use std::fs;
use std::path::Path;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde_json::{json, Value};
use tempfile::tempdir;

use chromaloop::engagement::SyntheticEngagement;
use chromaloop::pipeline::filter_all;
use chromaloop::rl::{ColorEnv, EnvConfig};
use chromaloop::scheme::ColorScheme;
use chromaloop::store::DirRecordingStore;

fn raw_recording() -> Value {
    json!({
        "events": [
            { "type": 4, "timestamp": 1, "data": { "href": "https://example.test" } },
            { "type": 2, "timestamp": 10, "data": { "node": {
                "tagName": "html", "id": 1, "childNodes": [
                    { "tagName": "nav", "id": 5, "childNodes": [
                        { "tagName": "a", "id": 6, "attributes": { "class": "btn primary" } }
                    ] },
                    { "tagName": "button", "id": 7, "attributes": { "class": "shepherd-button" } },
                    { "tagName": "header", "id": 8, "attributes": { "class": "shepherd-header" } }
                ]
            } } },
            { "type": 3, "timestamp": 11, "data": { "source": 2 } }
        ],
        "colors": {
            "navbar": "rgb(20, 40, 60)",
            "buttons": [ { "backgroundColor": "rgb(1, 2, 3)", "color": "rgb(9, 9, 9)" } ],
            "backgroundColor": "rgb(120, 130, 140)",
            "background": "rgb(250, 250, 250)"
        },
        "font-family": { "navbar": "Inter" }
    })
}

fn write_json(dir: &Path, name: &str, value: &Value) {
    fs::write(dir.join(name), serde_json::to_string(value).unwrap()).unwrap();
}

#[test]
fn test_batch_filter_writes_wire_shape_and_skips_bad_files() {
    let raw = tempdir().unwrap();
    let out = tempdir().unwrap();
    let out_dir = out.path().join("filtered");

    write_json(raw.path(), "session.json", &raw_recording());
    write_json(raw.path(), "quiet.json", &json!({ "events": [] }));
    fs::write(raw.path().join("broken.json"), "{not json").unwrap();
    fs::write(raw.path().join("README.txt"), "ignored").unwrap();

    let store = DirRecordingStore::new(raw.path());
    let report = filter_all(&store, &out_dir, &mut ChaCha8Rng::seed_from_u64(0)).unwrap();

    assert_eq!(report.written.len(), 2);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].name, "broken.json");
    assert_eq!(report.snapshots, 1);

    let quiet: Value =
        serde_json::from_str(&fs::read_to_string(out_dir.join("quiet-filtered.json")).unwrap())
            .unwrap();
    assert_eq!(quiet, json!([]));

    let text = fs::read_to_string(out_dir.join("session-filtered.json")).unwrap();
    // Pretty-printed with two-space indentation.
    assert!(text.starts_with("[\n  {"));

    let filtered: Value = serde_json::from_str(&text).unwrap();
    let events = filtered.as_array().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["timestamp"], 10);

    let elements = events[0]["data"]["elements"].as_array().unwrap();
    let kinds: Vec<&str> = elements.iter().map(|e| e["type"].as_str().unwrap()).collect();
    assert_eq!(
        kinds,
        vec!["navbar", "button", "shepherdButtons", "shepherdHeader", "background"]
    );
    let ids: Vec<i64> = elements.iter().map(|e| e["id"].as_i64().unwrap()).collect();
    assert_eq!(ids, vec![5, 6, 7, 8, 301]);

    let navbar = &elements[0]["attributes"]["style"];
    assert_eq!(navbar["background-color"], "rgb(20, 40, 60)");
    assert_eq!(navbar["color"], "rgb(255, 255, 255)");
    assert_eq!(navbar["font-family"], "Inter");

    let button = &elements[1]["attributes"]["style"];
    assert_eq!(button["background-color"], "rgb(1, 2, 3)");
    assert_eq!(button["color"], "rgb(9, 9, 9)");
    assert_eq!(button["font-family"], "Arial, sans-serif");

    assert_eq!(
        elements[4]["attributes"]["style"]["background-color"],
        "rgb(250, 250, 250)"
    );
}

#[test]
fn test_filtered_output_feeds_environment() {
    let raw = tempdir().unwrap();
    let filtered = tempdir().unwrap();
    write_json(raw.path(), "session.json", &raw_recording());

    let report = filter_all(
        &DirRecordingStore::new(raw.path()),
        filtered.path(),
        &mut ChaCha8Rng::seed_from_u64(0),
    )
    .unwrap();
    assert!(report.is_clean());

    let mut env = ColorEnv::new(
        Box::new(DirRecordingStore::new(filtered.path())),
        Box::new(SyntheticEngagement),
        EnvConfig::default(),
    )
    .unwrap();
    assert_eq!(env.recordings(), &["session-filtered.json".to_string()]);

    let obs = env.reset(Some(0)).unwrap();
    let scheme = ColorScheme::emit(&obs);
    assert_eq!(scheme.button_color, [1, 2, 3]);
    assert_eq!(scheme.navbar_color, [20, 40, 60]);
    assert_eq!(scheme.background_color, [250, 250, 250]);
    assert_eq!(scheme.shepherd_header_color, [120, 130, 140]);
    assert_eq!(scheme.shepherd_button_color, [120, 130, 140]);
}

#[test]
fn test_same_seed_same_fallback_ids() {
    let raw = tempdir().unwrap();
    write_json(
        raw.path(),
        "ids.json",
        &json!({ "events": [ { "type": 2, "timestamp": 1, "data": { "node": {
            "tagName": "div", "childNodes": [ { "tagName": "nav" }, { "tagName": "p" } ]
        } } } ] }),
    );

    let run = |seed| {
        let out = tempdir().unwrap();
        filter_all(
            &DirRecordingStore::new(raw.path()),
            out.path(),
            &mut ChaCha8Rng::seed_from_u64(seed),
        )
        .unwrap();
        fs::read_to_string(out.path().join("ids-filtered.json")).unwrap()
    };

    let a = run(3);
    assert_eq!(a, run(3));

    let v: Value = serde_json::from_str(&a).unwrap();
    let elements = v[0]["data"]["elements"].as_array().unwrap();
    let text_id = elements[0]["id"].as_i64().unwrap();
    let nav_id = elements[1]["id"].as_i64().unwrap();
    assert!((300..=1300).contains(&text_id));
    assert!((200..=1200).contains(&nav_id));
}

#[test]
fn test_deeply_nested_recording_is_filtered() {
    let mut node = r#"{"tagName":"nav","id":9999}"#.to_string();
    for id in 1..=200 {
        node = format!(r#"{{"tagName":"div","id":{id},"childNodes":[{node}]}}"#);
    }
    let raw = tempdir().unwrap();
    fs::write(
        raw.path().join("deep.json"),
        format!(r#"{{"events":[{{"type":2,"timestamp":1,"data":{{"node":{node}}}}}]}}"#),
    )
    .unwrap();

    let out = tempdir().unwrap();
    let report = filter_all(
        &DirRecordingStore::new(raw.path()),
        out.path(),
        &mut ChaCha8Rng::seed_from_u64(0),
    )
    .unwrap();
    assert!(report.is_clean());
    assert_eq!(report.snapshots, 1);

    let v: Value =
        serde_json::from_str(&fs::read_to_string(out.path().join("deep-filtered.json")).unwrap())
            .unwrap();
    let elements = v[0]["data"]["elements"].as_array().unwrap();
    assert!(elements
        .iter()
        .any(|e| e["type"] == "navbar" && e["id"] == 9999));
    assert_eq!(elements.last().unwrap()["type"], "background");
}
