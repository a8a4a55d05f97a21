// src/scheme.rs
//
// Scheme emitter: environment colors -> five integer RGB triples keyed by role.
//
// The canonical output shape is one `[r, g, b]` integer array per role:
//   {"button_color":[..],"navbar_color":[..],"background_color":[..],
//    "shepherd_header_color":[..],"shepherd_button_color":[..]}

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::color::{denormalize, format_rgb, Rgb};
use crate::recording::{ColorVector, PaletteRole};
use crate::rl::observation::Observation;
use crate::store::RecordingError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorScheme {
    pub button_color: Rgb,
    pub navbar_color: Rgb,
    pub background_color: Rgb,
    pub shepherd_header_color: Rgb,
    pub shepherd_button_color: Rgb,
}

impl ColorScheme {
    /// Denormalise (truncating) the color part of an observation.
    pub fn emit(observation: &Observation) -> Self {
        Self::from_colors(&observation.colors)
    }

    pub fn from_colors(colors: &ColorVector) -> Self {
        let rgb = |role| denormalize(colors.role(role));
        Self {
            button_color: rgb(PaletteRole::Button),
            navbar_color: rgb(PaletteRole::Navbar),
            background_color: rgb(PaletteRole::Background),
            shepherd_header_color: rgb(PaletteRole::ShepherdHeader),
            shepherd_button_color: rgb(PaletteRole::ShepherdButton),
        }
    }

    pub fn role(&self, role: PaletteRole) -> Rgb {
        match role {
            PaletteRole::Button => self.button_color,
            PaletteRole::Navbar => self.navbar_color,
            PaletteRole::Background => self.background_color,
            PaletteRole::ShepherdHeader => self.shepherd_header_color,
            PaletteRole::ShepherdButton => self.shepherd_button_color,
        }
    }

    /// Roles with their triples, in ColorVector order.
    pub fn entries(&self) -> impl Iterator<Item = (PaletteRole, Rgb)> + '_ {
        PaletteRole::ALL.into_iter().map(|r| (r, self.role(r)))
    }

    /// Human-readable one-line summary using `rgb(r, g, b)` strings.
    pub fn describe(&self) -> String {
        self.entries()
            .map(|(role, rgb)| format!("{}={}", role.as_str(), format_rgb(rgb)))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// File name a scheme is persisted under.
pub fn scheme_file_name(unix_secs: u64) -> String {
    format!("{unix_secs}_colors.json")
}

/// Write `scheme` as `<unix_secs>_colors.json` in `dir`, creating `dir` if needed.
pub fn write_scheme(
    dir: &Path,
    scheme: &ColorScheme,
    unix_secs: u64,
) -> Result<PathBuf, RecordingError> {
    let path = dir.join(scheme_file_name(unix_secs));
    let io_err = |e| RecordingError::Io {
        path: path.display().to_string(),
        source: e,
    };

    fs::create_dir_all(dir).map_err(io_err)?;
    let body = serde_json::to_string(scheme).map_err(|e| RecordingError::Json {
        name: path.display().to_string(),
        source: e,
    })?;
    fs::write(&path, body).map_err(io_err)?;
    Ok(path)
}
