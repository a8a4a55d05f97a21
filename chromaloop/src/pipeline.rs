// src/pipeline.rs
//
// Batch filtering: every raw recording a store discovers -> one
// `<stem>-filtered.json` file in the output directory.
//
// A file that fails to read, parse or write is logged and skipped; the rest
// of the batch still runs. Only discovery and output-directory creation are
// fatal.

use std::fs;
use std::path::{Path, PathBuf};

use rand::Rng;
use serde::Serialize;
use tracing::{info, warn};

use crate::filter::filter_recording;
use crate::snapshot::RawRecording;
use crate::store::{RecordingError, RecordingStore};

/// Name of the filtered file produced for raw recording `name`.
pub fn filtered_file_name(name: &str) -> String {
    let stem = name.strip_suffix(".json").unwrap_or(name);
    format!("{stem}-filtered.json")
}

/// A recording that was skipped, with the reason.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedRecording {
    pub name: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    /// Paths of filtered files written, in processing order.
    pub written: Vec<PathBuf>,
    pub skipped: Vec<SkippedRecording>,
    /// Total full snapshots across written files.
    pub snapshots: usize,
}

impl BatchReport {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }
}

fn filter_one<R: Rng + ?Sized>(
    source: &dyn RecordingStore,
    name: &str,
    out_path: &Path,
    rng: &mut R,
) -> Result<usize, RecordingError> {
    let contents = source.read(name)?;
    let recording = RawRecording::from_json_str(&contents).map_err(|e| RecordingError::Json {
        name: name.to_string(),
        source: e,
    })?;

    let events = filter_recording(&recording, rng);
    let body = serde_json::to_string_pretty(&events).map_err(|e| RecordingError::Json {
        name: name.to_string(),
        source: e,
    })?;
    fs::write(out_path, body).map_err(|e| RecordingError::Io {
        path: out_path.display().to_string(),
        source: e,
    })?;
    Ok(events.len())
}

/// Filter every recording in `source` into `out_dir`.
pub fn filter_all<R: Rng + ?Sized>(
    source: &dyn RecordingStore,
    out_dir: &Path,
    rng: &mut R,
) -> Result<BatchReport, RecordingError> {
    fs::create_dir_all(out_dir).map_err(|e| RecordingError::Io {
        path: out_dir.display().to_string(),
        source: e,
    })?;

    let mut report = BatchReport::default();
    for name in source.discover()? {
        let out_path = out_dir.join(filtered_file_name(&name));
        match filter_one(source, &name, &out_path, rng) {
            Ok(snapshots) => {
                info!(recording = %name, path = %out_path.display(), snapshots, "filtered recording saved");
                report.snapshots += snapshots;
                report.written.push(out_path);
            }
            Err(err) => {
                warn!(recording = %name, error = %err, "skipping recording");
                report.skipped.push(SkippedRecording {
                    name,
                    error: err.to_string(),
                });
            }
        }
    }
    Ok(report)
}
