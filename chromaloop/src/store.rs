// src/store.rs
//
// Recording storage collaborators:
// - discovery of available recording names
// - retrieval of a recording's contents by name
//
// DirRecordingStore serves `.json` files from a local directory (where the
// sync job drops them); MemoryRecordingStore backs tests and embedding.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecordingError {
    #[error("failed to access '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse '{name}': {source}")]
    Json {
        name: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("recording '{name}' not found")]
    NotFound { name: String },
}

/// Where recordings come from.
pub trait RecordingStore: Send {
    /// Names of all available recordings, in a stable order.
    fn discover(&self) -> Result<Vec<String>, RecordingError>;

    /// Raw contents of one recording.
    fn read(&self, name: &str) -> Result<String, RecordingError>;
}

/// Recordings stored as `*.json` files in one directory.
#[derive(Debug, Clone)]
pub struct DirRecordingStore {
    dir: PathBuf,
}

impl DirRecordingStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_of(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }
}

impl RecordingStore for DirRecordingStore {
    fn discover(&self) -> Result<Vec<String>, RecordingError> {
        let io_err = |e| RecordingError::Io {
            path: self.dir.display().to_string(),
            source: e,
        };

        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir).map_err(io_err)? {
            let entry = entry.map_err(io_err)?;
            if !entry.file_type().map_err(io_err)?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.ends_with(".json") {
                names.push(name);
            }
        }
        // Directory iteration order is platform-dependent.
        names.sort();
        Ok(names)
    }

    fn read(&self, name: &str) -> Result<String, RecordingError> {
        let path = self.path_of(name);
        fs::read_to_string(&path).map_err(|e| RecordingError::Io {
            path: path.display().to_string(),
            source: e,
        })
    }
}

/// In-memory store keyed by name (sorted).
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordingStore {
    recordings: BTreeMap<String, String>,
}

impl MemoryRecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, contents: impl Into<String>) {
        self.recordings.insert(name.into(), contents.into());
    }

    pub fn with(mut self, name: impl Into<String>, contents: impl Into<String>) -> Self {
        self.insert(name, contents);
        self
    }
}

impl RecordingStore for MemoryRecordingStore {
    fn discover(&self) -> Result<Vec<String>, RecordingError> {
        Ok(self.recordings.keys().cloned().collect())
    }

    fn read(&self, name: &str) -> Result<String, RecordingError> {
        self.recordings
            .get(name)
            .cloned()
            .ok_or_else(|| RecordingError::NotFound {
                name: name.to_string(),
            })
    }
}
