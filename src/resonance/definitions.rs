// src/resonance/definitions.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Composite identity of one resonance record.
///
/// Derived `Ord` gives ascending lexical order over `(tag, media_path, role)`,
/// which is the deterministic tie-break order used everywhere a view or a
/// save batch needs a stable sequence.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResonanceKey {
    pub tag: String,
    pub media_path: String,
    pub role: String,
}

impl fmt::Display for ResonanceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.tag, self.media_path, self.role)
    }
}

/// One resonance record as loaded from the remote dataset.
///
/// Base rows are replaced wholesale on each load and never mutated directly;
/// all local changes go through `EditSession` patches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResonanceRow {
    pub key: ResonanceKey,
    pub intensity: u8,
    pub enabled: bool,
    pub created_at: Option<DateTime<Utc>>,
}

/// Complete override of the mutable fields of one resonance row.
///
/// Always stores the full `(intensity, enabled)` pair so reads merged from
/// a patch never need a second merge against the base row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResonancePatch {
    pub intensity: u8,
    pub enabled: bool,
}

/// Sparse edit request as it arrives from a caller. Fields left `None` pass
/// through from the current effective row.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PatchInput {
    pub intensity: Option<f64>,
    pub enabled: Option<bool>,
}

impl PatchInput {
    pub fn intensity(value: f64) -> Self {
        Self { intensity: Some(value), enabled: None }
    }

    pub fn enabled(value: bool) -> Self {
        Self { intensity: None, enabled: Some(value) }
    }
}

/// Read-only metadata about one media item, joined against
/// `ResonanceKey::media_path` for display and search enrichment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SemanticsRow {
    pub path: String,
    pub category: String,
    pub climate: Option<String>,
    pub energy: Option<f32>,
    pub role: Option<String>,
    pub tags: Vec<String>,
    pub enabled: bool,
    pub created_at: Option<DateTime<Utc>>,
}

/// Closed intensity range ceiling.
pub const INTENSITY_MAX: u8 = 10;

/// Clamps a raw intensity to the closed integer range [0, 10].
///
/// Rounding is half-away-from-zero (`f64::round`). Non-finite input
/// coerces to 0 rather than failing: out-of-range edits are not an error
/// path anywhere in this crate.
pub fn clamp_intensity(raw: f64) -> u8 {
    if !raw.is_finite() {
        return 0;
    }
    raw.round().clamp(0.0, INTENSITY_MAX as f64) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_intensity_bounds() {
        assert_eq!(clamp_intensity(-3.0), 0);
        assert_eq!(clamp_intensity(0.0), 0);
        assert_eq!(clamp_intensity(10.0), 10);
        assert_eq!(clamp_intensity(200.0), 10);
        assert_eq!(clamp_intensity(-0.4), 0);
    }

    #[test]
    fn clamp_intensity_rounds_half_away_from_zero() {
        assert_eq!(clamp_intensity(6.5), 7);
        assert_eq!(clamp_intensity(6.49), 6);
        assert_eq!(clamp_intensity(11.5), 10);
        assert_eq!(clamp_intensity(0.5), 1);
    }

    #[test]
    fn clamp_intensity_non_finite_coerces_to_zero() {
        assert_eq!(clamp_intensity(f64::NAN), 0);
        assert_eq!(clamp_intensity(f64::INFINITY), 0);
        assert_eq!(clamp_intensity(f64::NEG_INFINITY), 0);
    }

    #[test]
    fn key_order_is_lexical_over_tuple() {
        let a = ResonanceKey {
            tag: "calm".into(),
            media_path: "audio/a.mp3".into(),
            role: "music".into(),
        };
        let b = ResonanceKey {
            tag: "calm".into(),
            media_path: "audio/a.mp3".into(),
            role: "voice".into(),
        };
        let c = ResonanceKey {
            tag: "deep".into(),
            media_path: "audio/a.mp3".into(),
            role: "music".into(),
        };
        assert!(a < b);
        assert!(b < c);
    }
}
