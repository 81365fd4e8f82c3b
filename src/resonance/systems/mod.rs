// src/resonance/systems/mod.rs
pub mod bulk;
pub mod io;
pub mod logic;

use bevy::prelude::*;
use std::any;

use super::events::OperationFeedback;

/// Carrier component for events produced on background tasks. The task
/// spawns an empty entity up front, attaches the finished event to it via
/// `run_on_main_thread`, and `forward_events` drains it into the normal
/// event stream on the next update.
#[derive(Component)]
pub struct SendEvent<E: Event> {
    pub event: E,
}

pub fn forward_events<E: Event + Clone + std::fmt::Debug>(
    mut commands: Commands,
    mut writer: EventWriter<E>,
    query: Query<(Entity, &SendEvent<E>)>,
    mut event_type_name: Local<String>,
) {
    if event_type_name.is_empty() {
        *event_type_name = any::type_name::<E>()
            .split("::")
            .last()
            .unwrap_or("UnknownEvent")
            .to_string();
    }

    for (entity, send_event) in query.iter() {
        debug!("Forwarding '{}': {:?}", *event_type_name, send_event.event);
        writer.write(send_event.event.clone());
        commands.entity(entity).despawn();
    }
}

/// Drains operation feedback into the log. A host UI plugin would read the
/// same events for a status line.
pub fn log_feedback(mut events: EventReader<OperationFeedback>) {
    for feedback in events.read() {
        if feedback.is_error {
            error!("{}", feedback.message);
        } else {
            info!("{}", feedback.message);
        }
    }
}
