// src/resonance/systems/io.rs
//! Load and save orchestration at the remote boundary.
//!
//! Both directions follow the same shape: a request event snapshots what it
//! needs from the ECS world, runs the network calls on a tokio background
//! task, and posts a completion event back through `SendEvent` +
//! `forward_events`. The handlers for those completion events are the only
//! places that reconcile local state with the remote store.

use bevy::prelude::*;
use bevy_tokio_tasks::TokioTasksRuntime;

use crate::resonance::definitions::{ResonanceKey, ResonancePatch};
use crate::resonance::events::{
    DatasetLoadResult, OperationFeedback, RequestLoadDatasets, RequestSaveGroup,
    ResonanceDataModified, SaveGroupOutcome,
};
use crate::resonance::remote::{
    load_datasets, RemoteClient, ResonanceWriter, RowUpdate,
};
use crate::resonance::resources::{
    AppSettings, DatasetStatus, EditSession, ResonanceRegistry, SemanticsIndex, ViewSettings,
};
use crate::resonance::systems::SendEvent;

/// Kicks off the initial load once at startup.
pub fn request_initial_load(mut load_writer: EventWriter<RequestLoadDatasets>) {
    load_writer.write(RequestLoadDatasets);
}

/// Spawns a background task fetching both collections. Multiple requests in
/// one frame coalesce into a single load.
pub fn handle_load_request(
    mut events: EventReader<RequestLoadDatasets>,
    settings: Res<AppSettings>,
    mut status: ResMut<DatasetStatus>,
    runtime: Res<TokioTasksRuntime>,
    mut commands: Commands,
) {
    if events.read().count() == 0 {
        return;
    }
    status.loading = true;
    status.last_error = None;

    let config = settings.remote.clone();
    let carrier = commands.spawn_empty().id();
    runtime.spawn_background_task(move |mut ctx| async move {
        let client = RemoteClient::new(config);
        let result = load_datasets(&client).await.map_err(|e| e.to_string());
        ctx.run_on_main_thread(move |world_ctx| {
            world_ctx
                .world
                .commands()
                .entity(carrier)
                .insert(SendEvent::<DatasetLoadResult> {
                    event: DatasetLoadResult { result },
                });
        })
        .await;
    });
}

/// Reconciles a finished load. Success replaces both collections wholesale;
/// failure keeps the previous base rows and surfaces the error. There is no
/// partial merge of a failed load.
pub fn handle_load_result(
    mut events: EventReader<DatasetLoadResult>,
    mut registry: ResMut<ResonanceRegistry>,
    mut semantics: ResMut<SemanticsIndex>,
    mut status: ResMut<DatasetStatus>,
    mut view_settings: ResMut<ViewSettings>,
    mut modified_writer: EventWriter<ResonanceDataModified>,
    mut feedback_writer: EventWriter<OperationFeedback>,
) {
    for event in events.read() {
        status.loading = false;
        match &event.result {
            Ok(data) => {
                registry.replace_all(data.resonance.clone());
                semantics.replace_all(data.semantics.clone());
                status.last_error = None;
                status.unconfirmed.clear();
                if data.dropped > 0 {
                    warn!("Load discarded {} invalid resonance row(s).", data.dropped);
                }
                // The host always looks at a concrete group; default to the
                // first one when nothing is selected yet.
                if view_settings.group.is_empty() {
                    if let Some(first) = registry.groups().into_iter().next() {
                        view_settings.group = first;
                    }
                }
                modified_writer.write(ResonanceDataModified);
                feedback_writer.write(OperationFeedback {
                    message: format!(
                        "Loaded {} resonance row(s), {} semantics row(s).",
                        registry.len(),
                        semantics.len()
                    ),
                    is_error: false,
                });
            }
            Err(message) => {
                status.last_error = Some(message.clone());
                feedback_writer.write(OperationFeedback {
                    message: format!("Load failed: {message}. Previous rows kept."),
                    is_error: true,
                });
            }
        }
    }
}

/// Sequential row-by-row push. Stops at the first failure; rows already
/// written stay written (no rollback, no retry), and the returned committed
/// count makes the partial commit explicit to the caller.
pub async fn push_group_patches<W: ResonanceWriter>(
    writer: &W,
    patches: &[(ResonanceKey, ResonancePatch)],
) -> (usize, Option<String>) {
    let mut committed = 0usize;
    for (key, patch) in patches {
        match writer.update_row(key, patch).await {
            Ok(()) => committed += 1,
            Err(err) => return (committed, Some(format!("row {key}: {err}"))),
        }
    }
    (committed, None)
}

/// Snapshot of one group's pending patches, or `None` when there is nothing
/// to save (in which case no network call must happen).
pub fn collect_save_batch(
    session: &EditSession,
    group: &str,
) -> Option<Vec<(ResonanceKey, ResonancePatch)>> {
    let patches = session.group_patches(group);
    if patches.is_empty() {
        None
    } else {
        Some(patches)
    }
}

pub fn handle_save_group(
    mut events: EventReader<RequestSaveGroup>,
    session: Res<EditSession>,
    settings: Res<AppSettings>,
    runtime: Res<TokioTasksRuntime>,
    mut commands: Commands,
    mut feedback_writer: EventWriter<OperationFeedback>,
) {
    for event in events.read() {
        let group = event.group.clone();
        let Some(patches) = collect_save_batch(&session, &group) else {
            feedback_writer.write(OperationFeedback {
                message: format!("Nothing to save for group '{group}'."),
                is_error: false,
            });
            continue;
        };

        info!("Saving {} patch(es) for group '{}'.", patches.len(), group);
        let config = settings.remote.clone();
        let bulk_save = settings.bulk_save;
        let carrier = commands.spawn_empty().id();
        runtime.spawn_background_task(move |mut ctx| async move {
            let client = RemoteClient::new(config);
            let attempted = patches.len();
            let (committed, error) = if bulk_save {
                // Alternate endpoint: one call for the whole batch,
                // all-or-nothing from the local point of view.
                let rows: Vec<RowUpdate> = patches
                    .iter()
                    .map(|(key, patch)| RowUpdate::from_patch(key, patch))
                    .collect();
                match client.save_batch(&rows).await {
                    Ok(()) => (attempted, None),
                    Err(err) => (0, Some(err.to_string())),
                }
            } else {
                push_group_patches(&client, &patches).await
            };

            let outcome = SaveGroupOutcome { group, attempted, committed, error };
            ctx.run_on_main_thread(move |world_ctx| {
                world_ctx
                    .world
                    .commands()
                    .entity(carrier)
                    .insert(SendEvent::<SaveGroupOutcome> { event: outcome });
            })
            .await;
        });
    }
}

/// Applies a finished save. Full success clears the group's patches and
/// requests a reload for reconciliation; any failure preserves the entire
/// pending set and flags the group unconfirmed, since the remote store may
/// now hold a partial commit.
pub fn handle_save_outcome(
    mut events: EventReader<SaveGroupOutcome>,
    mut session: ResMut<EditSession>,
    mut status: ResMut<DatasetStatus>,
    mut load_writer: EventWriter<RequestLoadDatasets>,
    mut modified_writer: EventWriter<ResonanceDataModified>,
    mut feedback_writer: EventWriter<OperationFeedback>,
) {
    for outcome in events.read() {
        match &outcome.error {
            None => {
                session.clear_group(&outcome.group);
                feedback_writer.write(OperationFeedback {
                    message: format!(
                        "Saved {} row(s) for group '{}'; reloading.",
                        outcome.committed, outcome.group
                    ),
                    is_error: false,
                });
                modified_writer.write(ResonanceDataModified);
                load_writer.write(RequestLoadDatasets);
            }
            Some(message) => {
                status.unconfirmed.insert(outcome.group.clone());
                feedback_writer.write(OperationFeedback {
                    message: format!(
                        "Save for group '{}' failed after {} of {} row(s): {}. \
                         Pending edits kept; reload to reconcile.",
                        outcome.group, outcome.committed, outcome.attempted, message
                    ),
                    is_error: true,
                });
            }
        }
    }
}
