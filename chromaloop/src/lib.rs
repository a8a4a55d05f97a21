//! Chromaloop core library.
//!
//! Derives a UI color palette from recorded web sessions and exposes an
//! environment in which an external optimiser tunes it.
//!
//! # Extraction pipeline
//!
//! - **Snapshot Filter** (`filter`): walks full DOM snapshots and classifies
//!   nodes into styled elements with an ordered rule table.
//! - **Color Codec** (`color`): `rgb()` strings <-> integer triples <-> [0, 1].
//! - **Recording Codec** (`recording`): filtered recording -> five-role
//!   ColorVector with per-role defaults.
//! - **Pipeline** (`pipeline`): batch filtering of a recordings directory.
//!
//! # Optimisation
//!
//! - **ColorEnv** (`rl::env`): reset/step environment with the reward contract.
//! - **Engagement** (`engagement`): per-recording engagement signals.
//! - **Scheme Emitter** (`scheme`): environment colors -> integer RGB scheme.
//!
//! All randomness flows through explicitly seeded generators passed in by
//! the caller; there is no global RNG.

pub mod color;
pub mod config;
pub mod engagement;
pub mod filter;
pub mod logging;
pub mod pipeline;
pub mod recording;
pub mod rl;
pub mod scheme;
pub mod snapshot;
pub mod store;
pub mod types;

// --- Re-exports for ergonomic external use ---------------------------------

pub use color::{denormalize, normalize, parse_color, ColorParseError, NormalizedRgb, Rgb};
pub use config::{Config, ConfigError};
pub use engagement::{EngagementSignal, EngagementSource, RecordedEngagement, SyntheticEngagement};
pub use filter::{
    classify, filter_events, filter_recording, ClassificationRule, FontHints, PaletteHints,
    CLASSIFICATION_RULES,
};
pub use pipeline::{filter_all, BatchReport};
pub use recording::{decode_recording, ColorVector, FilteredRecording, PaletteRole};
pub use rl::{ColorEnv, EnvConfig, EnvError, Observation, StepResult};
pub use scheme::{write_scheme, ColorScheme};
pub use snapshot::{RawEvent, RawRecording, SnapshotNode};
pub use store::{DirRecordingStore, MemoryRecordingStore, RecordingError, RecordingStore};
pub use types::{ElementKind, FilteredEvent, StyledElement, TimestampMs};
