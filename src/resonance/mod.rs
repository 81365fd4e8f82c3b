// src/resonance/mod.rs

// --- Public Interface ---
pub mod definitions;
pub mod events;
pub mod plugin;
pub mod remote;
pub mod resources;
pub mod view;

// Systems are internal implementation details; the host drives everything
// through the events and resources re-exported below.
pub(crate) mod systems;

pub use definitions::{PatchInput, ResonanceKey, ResonancePatch, ResonanceRow, SemanticsRow};
pub use plugin::ResonancePlugin;
pub use resources::{
    AppSettings, DatasetStatus, EditSession, GroupViewCache, PerturbRng, ResonanceRegistry,
    RoleFilter, SemanticsIndex, SortMode, StatusFilter, ViewSettings,
};
