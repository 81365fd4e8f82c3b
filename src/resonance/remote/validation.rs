// src/resonance/remote/validation.rs
//! Defensive coercion of wire rows into domain rows.
//!
//! The remote collections are operator-maintained and have accumulated
//! loosely typed values over time, so every field is coerced rather than
//! rejected: strings are trimmed, non-finite numbers become 0, non-boolean
//! `enabled` becomes false. Resonance rows missing any component of the
//! composite key are discarded entirely.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::resonance::definitions::{clamp_intensity, ResonanceKey, ResonanceRow, SemanticsRow};

/// Accepts a string or null where the schema says string; anything else
/// coerces to empty (and empty key components drop the row later).
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        _ => Ok(String::new()),
    }
}

/// Resonance row as it comes off the wire, before validation.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawResonanceRow {
    #[serde(default, deserialize_with = "lenient_string")]
    pub tag: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub media_path: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub role: String,
    #[serde(default)]
    pub intensity: Value,
    #[serde(default)]
    pub enabled: Value,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawSemanticsRow {
    #[serde(default, deserialize_with = "lenient_string")]
    pub path: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub category: String,
    #[serde(default)]
    pub climate: Option<String>,
    #[serde(default)]
    pub energy: Value,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub enabled: Value,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Coerces one wire row; `None` means the row lacks a usable composite key
/// and is dropped from the load.
pub fn coerce_resonance(raw: RawResonanceRow) -> Option<ResonanceRow> {
    let tag = raw.tag.trim().to_string();
    let media_path = raw.media_path.trim().to_string();
    let role = raw.role.trim().to_string();
    if tag.is_empty() || media_path.is_empty() || role.is_empty() {
        return None;
    }
    Some(ResonanceRow {
        key: ResonanceKey { tag, media_path, role },
        intensity: clamp_intensity(coerce_number(&raw.intensity)),
        enabled: raw.enabled.as_bool().unwrap_or(false),
        created_at: parse_timestamp(raw.created_at.as_deref()),
    })
}

/// Coerces one semantics wire row; rows without a path are dropped.
pub fn coerce_semantics(raw: RawSemanticsRow) -> Option<SemanticsRow> {
    let path = raw.path.trim().to_string();
    if path.is_empty() {
        return None;
    }
    let energy = match raw.energy.as_f64() {
        Some(v) if v.is_finite() => Some(v.clamp(0.0, 1.0) as f32),
        _ => None,
    };
    Some(SemanticsRow {
        path,
        category: raw.category.trim().to_string(),
        climate: raw
            .climate
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty()),
        energy,
        role: raw
            .role
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty()),
        tags: raw.tags.unwrap_or_default(),
        enabled: raw.enabled.as_bool().unwrap_or(false),
        created_at: parse_timestamp(raw.created_at.as_deref()),
    })
}

fn coerce_number(value: &Value) -> f64 {
    match value.as_f64() {
        Some(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

fn parse_timestamp(value: Option<&str>) -> Option<DateTime<Utc>> {
    value
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw_from(value: serde_json::Value) -> RawResonanceRow {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn rows_missing_key_components_are_dropped() {
        for broken in [
            json!({"tag": "", "media_path": "a.mp3", "role": "music"}),
            json!({"tag": "calm", "media_path": "  ", "role": "music"}),
            json!({"tag": "calm", "media_path": "a.mp3", "role": null}),
            json!({"media_path": "a.mp3", "role": "music"}),
        ] {
            assert!(coerce_resonance(raw_from(broken)).is_none());
        }
    }

    #[test]
    fn strings_are_trimmed_and_numbers_coerced() {
        let row = coerce_resonance(raw_from(json!({
            "tag": " calm ",
            "media_path": " audio/a.mp3 ",
            "role": "music",
            "intensity": 6.4,
            "enabled": true,
            "created_at": "2024-05-01T10:00:00Z"
        })))
        .unwrap();
        assert_eq!(row.key.tag, "calm");
        assert_eq!(row.key.media_path, "audio/a.mp3");
        assert_eq!(row.intensity, 6);
        assert!(row.enabled);
        assert!(row.created_at.is_some());
    }

    #[test]
    fn hostile_values_coerce_to_defaults() {
        let row = coerce_resonance(raw_from(json!({
            "tag": "calm",
            "media_path": "a.mp3",
            "role": "music",
            "intensity": "not a number",
            "enabled": "yes",
            "created_at": "last tuesday"
        })))
        .unwrap();
        assert_eq!(row.intensity, 0);
        assert!(!row.enabled);
        assert!(row.created_at.is_none());
    }

    #[test]
    fn out_of_range_intensity_clamps() {
        let row = coerce_resonance(raw_from(json!({
            "tag": "calm", "media_path": "a.mp3", "role": "music",
            "intensity": 42
        })))
        .unwrap();
        assert_eq!(row.intensity, 10);
    }

    #[test]
    fn semantics_energy_is_clamped_or_none() {
        let sem = coerce_semantics(
            serde_json::from_value(json!({
                "path": "a.mp3", "category": "music", "energy": 1.7,
                "tags": ["soft", "loop"], "climate": " deep "
            }))
            .unwrap(),
        )
        .unwrap();
        assert_eq!(sem.energy, Some(1.0));
        assert_eq!(sem.climate.as_deref(), Some("deep"));
        assert_eq!(sem.tags, vec!["soft".to_string(), "loop".to_string()]);

        let sem = coerce_semantics(
            serde_json::from_value(json!({"path": "b.mp3", "energy": "high"})).unwrap(),
        )
        .unwrap();
        assert_eq!(sem.energy, None);

        assert!(coerce_semantics(
            serde_json::from_value(json!({"path": "  "})).unwrap()
        )
        .is_none());
    }
}
