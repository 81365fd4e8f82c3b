// src/resonance/plugin.rs
use bevy::prelude::*;

use super::events::{
    DatasetLoadResult, OperationFeedback, RequestAutofillView, RequestClearGroup,
    RequestLoadDatasets, RequestNormalizeView, RequestRandomSoftView, RequestSaveGroup,
    RequestUpdateRow, ResonanceDataModified, SaveGroupOutcome,
};
use super::resources::{
    DatasetStatus, EditSession, GroupViewCache, PerturbRng, ResonanceRegistry, SemanticsIndex,
    ViewSettings,
};
use super::systems;
use super::systems::forward_events;

// System sets for ordering within Update.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
enum ResonanceSystemSet {
    UserInput,        // Bulk operations expanding into per-row edit events
    ApplyChanges,     // Edit session writes and derived-view rebuild
    RemoteOperations, // Load/save task spawning and reconciliation
}

/// Plugin owning the resonance edit-session engine: registry, diff store,
/// derived view, bulk operations, and the remote load/save pipelines.
/// `AppSettings` and `PerturbRng` are expected to be inserted by the host
/// before this plugin builds (main does both).
pub struct ResonancePlugin;

impl Plugin for ResonancePlugin {
    fn build(&self, app: &mut App) {
        app.configure_sets(
            Update,
            (
                ResonanceSystemSet::UserInput,
                ResonanceSystemSet::ApplyChanges.after(ResonanceSystemSet::UserInput),
                ResonanceSystemSet::RemoteOperations.after(ResonanceSystemSet::ApplyChanges),
            ),
        );

        app.init_resource::<ResonanceRegistry>()
            .init_resource::<SemanticsIndex>()
            .init_resource::<EditSession>()
            .init_resource::<ViewSettings>()
            .init_resource::<GroupViewCache>()
            .init_resource::<DatasetStatus>()
            .init_resource::<PerturbRng>();

        app.add_event::<RequestLoadDatasets>()
            .add_event::<DatasetLoadResult>()
            .add_event::<RequestUpdateRow>()
            .add_event::<RequestClearGroup>()
            .add_event::<RequestAutofillView>()
            .add_event::<RequestNormalizeView>()
            .add_event::<RequestRandomSoftView>()
            .add_event::<RequestSaveGroup>()
            .add_event::<SaveGroupOutcome>()
            .add_event::<ResonanceDataModified>()
            .add_event::<OperationFeedback>();

        app.add_systems(Startup, systems::io::request_initial_load);

        app.add_systems(
            Update,
            (
                systems::bulk::handle_autofill_view,
                systems::bulk::handle_normalize_view,
                systems::bulk::handle_random_soft_view,
            )
                .chain()
                .in_set(ResonanceSystemSet::UserInput),
        );
        app.add_systems(
            Update,
            (
                systems::logic::handle_update_row,
                systems::logic::handle_clear_group,
                systems::logic::rebuild_group_view,
            )
                .chain()
                .in_set(ResonanceSystemSet::ApplyChanges),
        );
        app.add_systems(
            Update,
            (
                forward_events::<DatasetLoadResult>,
                forward_events::<SaveGroupOutcome>,
                systems::io::handle_load_result,
                systems::io::handle_save_outcome,
                systems::io::handle_load_request,
                systems::io::handle_save_group,
                systems::log_feedback,
            )
                .chain()
                .in_set(ResonanceSystemSet::RemoteOperations),
        );

        info!("ResonancePlugin initialized.");
    }
}
