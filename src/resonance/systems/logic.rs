// src/resonance/systems/logic.rs
//! Edit-session write path and the derived-view rebuild.

use bevy::prelude::*;
use chrono::Utc;

use crate::resonance::events::{
    OperationFeedback, RequestClearGroup, RequestUpdateRow, ResonanceDataModified,
};
use crate::resonance::resources::{
    AppSettings, EditSession, GroupViewCache, ResonanceRegistry, SemanticsIndex, ViewSettings,
};
use crate::resonance::view::build_group_view;

/// Applies sparse edit requests through `EditSession::set_edit`. Edits
/// addressing a key with no base row are ignored with a warning: patches
/// only ever shadow loaded rows.
pub fn handle_update_row(
    mut events: EventReader<RequestUpdateRow>,
    registry: Res<ResonanceRegistry>,
    mut session: ResMut<EditSession>,
    mut modified_writer: EventWriter<ResonanceDataModified>,
) {
    let mut changed = false;
    for event in events.read() {
        let Some(base) = registry.get(&event.key) else {
            warn!("Edit for unknown row {} dropped.", event.key);
            continue;
        };
        let patch = session.set_edit(base, event.input);
        trace!(
            "Patched {} -> intensity {}, enabled {}.",
            event.key,
            patch.intensity,
            patch.enabled
        );
        changed = true;
    }
    if changed {
        modified_writer.write(ResonanceDataModified);
    }
}

pub fn handle_clear_group(
    mut events: EventReader<RequestClearGroup>,
    mut session: ResMut<EditSession>,
    mut modified_writer: EventWriter<ResonanceDataModified>,
    mut feedback_writer: EventWriter<OperationFeedback>,
) {
    for event in events.read() {
        let removed = session.clear_group(&event.group);
        feedback_writer.write(OperationFeedback {
            message: format!(
                "Discarded {} pending edit(s) for group '{}'.",
                removed, event.group
            ),
            is_error: false,
        });
        if removed > 0 {
            modified_writer.write(ResonanceDataModified);
        }
    }
}

/// Rebuilds `GroupViewCache` whenever the data changed or the view settings
/// did. Runs after the edit handlers so same-frame edits land in the view.
pub fn rebuild_group_view(
    mut modified_events: EventReader<ResonanceDataModified>,
    registry: Res<ResonanceRegistry>,
    session: Res<EditSession>,
    semantics: Res<SemanticsIndex>,
    view_settings: Res<ViewSettings>,
    settings: Res<AppSettings>,
    mut cache: ResMut<GroupViewCache>,
) {
    let data_changed = modified_events.read().count() > 0;
    if !data_changed && !view_settings.is_changed() {
        return;
    }
    cache.rows = build_group_view(
        &registry,
        &session,
        &semantics,
        &view_settings,
        Utc::now(),
        settings.recency_window,
    );
    trace!(
        "Rebuilt view for group '{}': {} row(s).",
        view_settings.group,
        cache.rows.len()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resonance::definitions::{PatchInput, ResonanceKey, ResonanceRow};

    fn test_row(path: &str) -> ResonanceRow {
        ResonanceRow {
            key: ResonanceKey {
                tag: "calm".into(),
                media_path: path.into(),
                role: "music".into(),
            },
            intensity: 5,
            enabled: true,
            created_at: None,
        }
    }

    fn test_app() -> App {
        let mut app = App::new();
        app.add_event::<RequestUpdateRow>()
            .add_event::<RequestClearGroup>()
            .add_event::<ResonanceDataModified>()
            .add_event::<OperationFeedback>()
            .init_resource::<ResonanceRegistry>()
            .init_resource::<EditSession>()
            .add_systems(Update, (handle_update_row, handle_clear_group));
        app
    }

    #[test]
    fn update_event_patches_through_session() {
        let mut app = test_app();
        let row = test_row("a.mp3");
        app.world_mut()
            .resource_mut::<ResonanceRegistry>()
            .replace_all(vec![row.clone()]);

        app.world_mut().send_event(RequestUpdateRow {
            key: row.key.clone(),
            input: PatchInput::intensity(7.0),
        });
        app.update();

        let session = app.world().resource::<EditSession>();
        assert_eq!(session.patch(&row.key).unwrap().intensity, 7);
        assert_eq!(session.pending_count("calm"), 1);
    }

    #[test]
    fn update_for_unknown_key_is_ignored() {
        let mut app = test_app();
        app.world_mut().send_event(RequestUpdateRow {
            key: test_row("ghost.mp3").key,
            input: PatchInput::enabled(false),
        });
        app.update();
        assert_eq!(app.world().resource::<EditSession>().total_pending(), 0);
    }

    #[test]
    fn clear_group_event_drops_only_that_group() {
        let mut app = test_app();
        let a = test_row("a.mp3");
        let mut b = test_row("b.mp3");
        b.key.tag = "deep".into();
        app.world_mut()
            .resource_mut::<ResonanceRegistry>()
            .replace_all(vec![a.clone(), b.clone()]);
        {
            let mut session = app.world_mut().resource_mut::<EditSession>();
            session.set_edit(&a, PatchInput::intensity(1.0));
            session.set_edit(&b, PatchInput::intensity(2.0));
        }

        app.world_mut()
            .send_event(RequestClearGroup { group: "calm".into() });
        app.update();

        let session = app.world().resource::<EditSession>();
        assert_eq!(session.pending_count("calm"), 0);
        assert_eq!(session.pending_count("deep"), 1);
    }
}
