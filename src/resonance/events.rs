// src/resonance/events.rs
use bevy::prelude::Event;

use super::definitions::{PatchInput, ResonanceKey, ResonanceRow, SemanticsRow};

/// Request a full (re)load of both remote collections.
/// Handled by `systems::io::handle_load_request`.
#[derive(Event, Debug, Clone)]
pub struct RequestLoadDatasets;

/// Completion of a background load task. Delivered back to the ECS world
/// through `SendEvent` + `forward_events`.
#[derive(Event, Debug, Clone)]
pub struct DatasetLoadResult {
    pub result: Result<LoadedDatasets, String>,
}

#[derive(Debug, Clone)]
pub struct LoadedDatasets {
    pub resonance: Vec<ResonanceRow>,
    pub semantics: Vec<SemanticsRow>,
    /// Wire rows discarded by validation (missing tag/path/role).
    pub dropped: usize,
}

/// Single local edit, routed through the edit session's merge-and-clamp
/// path. Bulk operations emit one of these per affected row.
#[derive(Event, Debug, Clone)]
pub struct RequestUpdateRow {
    pub key: ResonanceKey,
    pub input: PatchInput,
}

/// Drop every pending patch whose key belongs to `group`.
#[derive(Event, Debug, Clone)]
pub struct RequestClearGroup {
    pub group: String,
}

/// Autofill the current filtered view: enabled + per-role default intensity.
#[derive(Event, Debug, Clone)]
pub struct RequestAutofillView;

/// Proportionally redistribute intensities per role over the current
/// filtered view's enabled rows.
#[derive(Event, Debug, Clone)]
pub struct RequestNormalizeView;

/// Nudge every row in the current filtered view by ±1.
#[derive(Event, Debug, Clone)]
pub struct RequestRandomSoftView;

/// Flush all pending patches for one group to the remote store.
#[derive(Event, Debug, Clone)]
pub struct RequestSaveGroup {
    pub group: String,
}

/// Completion of a background save task.
///
/// `committed < attempted` with an error means the remote store was left
/// partially updated; the local pending set is preserved in full and the
/// group is marked unconfirmed until the next successful reload.
#[derive(Event, Debug, Clone)]
pub struct SaveGroupOutcome {
    pub group: String,
    pub attempted: usize,
    pub committed: usize,
    pub error: Option<String>,
}

/// Base rows or pending patches changed; derived views must be rebuilt.
#[derive(Event, Debug, Clone)]
pub struct ResonanceDataModified;

/// Human-readable operation feedback, drained by a logging system here and
/// available to a host UI for status display.
#[derive(Event, Debug, Clone)]
pub struct OperationFeedback {
    pub message: String,
    pub is_error: bool,
}
