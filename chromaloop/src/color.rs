// src/color.rs
//
// Color codec: CSS `rgb()/rgba()` strings <-> integer triples <-> [0, 1] floats.
//
// Denormalisation truncates toward zero (never rounds) so that a value
// written back out matches what the optimiser observed.

use thiserror::Error;

/// 8-bit RGB triple.
pub type Rgb = [u8; 3];

/// RGB triple with each channel in [0, 1].
pub type NormalizedRgb = [f64; 3];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorParseError {
    #[error("color '{input}' has {found} channel(s), expected at least 3")]
    MissingChannels { input: String, found: usize },
    #[error("color '{input}' has a non-numeric channel '{token}'")]
    NonNumeric { input: String, token: String },
    #[error("color '{input}' has channel {value} outside 0..=255")]
    OutOfRange { input: String, value: i64 },
}

/// Parse `rgb(r, g, b)` / `rgba(r, g, b, a)` (or a bare `r, g, b`) into a triple.
///
/// Alpha and any further tokens are ignored.
pub fn parse_color(input: &str) -> Result<Rgb, ColorParseError> {
    let body = input
        .replace("rgba(", "")
        .replace("rgb(", "")
        .replace(')', "");

    let tokens: Vec<&str> = body.split(',').take(3).collect();
    if tokens.len() < 3 {
        return Err(ColorParseError::MissingChannels {
            input: input.to_string(),
            found: tokens.len(),
        });
    }

    let mut out = [0u8; 3];
    for (slot, token) in out.iter_mut().zip(tokens) {
        let token = token.trim();
        let value: i64 = token.parse().map_err(|_| ColorParseError::NonNumeric {
            input: input.to_string(),
            token: token.to_string(),
        })?;
        *slot = u8::try_from(value).map_err(|_| ColorParseError::OutOfRange {
            input: input.to_string(),
            value,
        })?;
    }
    Ok(out)
}

/// Render a triple as `rgb(r, g, b)`.
pub fn format_rgb(rgb: Rgb) -> String {
    format!("rgb({}, {}, {})", rgb[0], rgb[1], rgb[2])
}

/// Map each channel to [0, 1].
pub fn normalize(rgb: Rgb) -> NormalizedRgb {
    [
        rgb[0] as f64 / 255.0,
        rgb[1] as f64 / 255.0,
        rgb[2] as f64 / 255.0,
    ]
}

/// Scale one [0, 1] channel back to 0..=255, truncating.
#[inline]
pub fn denormalize_channel(value: f64) -> u8 {
    // `as` truncates toward zero and saturates; NaN maps to 0.
    (value * 255.0) as u8
}

/// Scale each channel back to 0..=255, truncating.
pub fn denormalize(channels: NormalizedRgb) -> Rgb {
    [
        denormalize_channel(channels[0]),
        denormalize_channel(channels[1]),
        denormalize_channel(channels[2]),
    ]
}
