// src/resonance/systems/bulk.rs
//! Bulk operations over the current filtered view.
//!
//! All three operate on `GroupViewCache` (effective rows, post-filter) and
//! write through the edit session by emitting one `RequestUpdateRow` per
//! affected row. Rows outside the view are never touched.

use bevy::prelude::*;
use rand::Rng;
use std::collections::BTreeMap;

use crate::resonance::definitions::{clamp_intensity, PatchInput, INTENSITY_MAX};
use crate::resonance::events::{
    OperationFeedback, RequestAutofillView, RequestNormalizeView, RequestRandomSoftView,
    RequestUpdateRow,
};
use crate::resonance::resources::{GroupViewCache, PerturbRng};

/// Per-role default intensity used by autofill. The known roles follow the
/// operator convention; anything else lands in the middle.
pub fn autofill_intensity(role: &str) -> u8 {
    match role {
        "background" | "music" | "video" => 6,
        "shader" => 5,
        "voice" | "text" => 4,
        _ => 5,
    }
}

/// Caps a role group's notional total at three "full" rows' worth.
const NORMALIZE_GROUP_CAP: u32 = 30;

/// Proportional redistribution for one role group's enabled intensities.
///
/// `total` substitutes 1 for 0 so an all-zero group distributes evenly via
/// rounding rather than dividing by zero. Rounding and the per-row ceiling
/// of 10 make this not exactly idempotent; repeated application converges
/// to a fixed point.
pub fn normalize_role_group(intensities: &[u8]) -> Vec<u8> {
    let count = intensities.len() as u32;
    let total: u32 = intensities.iter().map(|&i| i as u32).sum();
    let total = total.max(1);
    let target = NORMALIZE_GROUP_CAP.min(count * INTENSITY_MAX as u32);
    intensities
        .iter()
        .map(|&i| clamp_intensity(i as f64 / total as f64 * target as f64))
        .collect()
}

/// ±1 step with the range bounds enforced.
pub fn perturb_intensity(intensity: u8, up: bool) -> u8 {
    if up {
        (intensity + 1).min(INTENSITY_MAX)
    } else {
        intensity.saturating_sub(1)
    }
}

pub fn handle_autofill_view(
    mut events: EventReader<RequestAutofillView>,
    view: Res<GroupViewCache>,
    mut update_writer: EventWriter<RequestUpdateRow>,
    mut feedback_writer: EventWriter<OperationFeedback>,
) {
    for _ in events.read() {
        for row in &view.rows {
            update_writer.write(RequestUpdateRow {
                key: row.key.clone(),
                input: PatchInput {
                    intensity: Some(autofill_intensity(&row.key.role) as f64),
                    enabled: Some(true),
                },
            });
        }
        feedback_writer.write(OperationFeedback {
            message: format!("Autofilled {} row(s) in view.", view.rows.len()),
            is_error: false,
        });
    }
}

pub fn handle_normalize_view(
    mut events: EventReader<RequestNormalizeView>,
    view: Res<GroupViewCache>,
    mut update_writer: EventWriter<RequestUpdateRow>,
    mut feedback_writer: EventWriter<OperationFeedback>,
) {
    for _ in events.read() {
        // Partition the view by role, keeping only enabled rows; disabled
        // rows and roles with no enabled rows are left untouched.
        let mut by_role: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for (idx, row) in view.rows.iter().enumerate() {
            if row.enabled {
                by_role.entry(row.key.role.as_str()).or_default().push(idx);
            }
        }

        let mut written = 0usize;
        for indices in by_role.values() {
            let intensities: Vec<u8> =
                indices.iter().map(|&i| view.rows[i].intensity).collect();
            let next = normalize_role_group(&intensities);
            for (&idx, &value) in indices.iter().zip(next.iter()) {
                update_writer.write(RequestUpdateRow {
                    key: view.rows[idx].key.clone(),
                    input: PatchInput::intensity(value as f64),
                });
                written += 1;
            }
        }
        feedback_writer.write(OperationFeedback {
            message: format!("Normalized {} enabled row(s) in view.", written),
            is_error: false,
        });
    }
}

pub fn handle_random_soft_view(
    mut events: EventReader<RequestRandomSoftView>,
    view: Res<GroupViewCache>,
    mut rng: ResMut<PerturbRng>,
    mut update_writer: EventWriter<RequestUpdateRow>,
    mut feedback_writer: EventWriter<OperationFeedback>,
) {
    for _ in events.read() {
        for row in &view.rows {
            let up = rng.0.random_bool(0.5);
            update_writer.write(RequestUpdateRow {
                key: row.key.clone(),
                input: PatchInput::intensity(perturb_intensity(row.intensity, up) as f64),
            });
        }
        feedback_writer.write(OperationFeedback {
            message: format!("Randomly nudged {} row(s) in view.", view.rows.len()),
            is_error: false,
        });
    }
}
