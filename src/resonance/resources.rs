// src/resonance/resources.rs
use bevy::prelude::*;
use chrono::Duration;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::definitions::{
    clamp_intensity, PatchInput, ResonanceKey, ResonancePatch, ResonanceRow, SemanticsRow,
};
use super::remote::RemoteConfig;

/// Base resonance rows, keyed by composite identity.
///
/// Replaced wholesale on every successful load; never mutated in place.
/// The `BTreeMap` keeps iteration in ascending key order, matching the
/// remote read's `tag` ordering.
#[derive(Resource, Default, Debug)]
pub struct ResonanceRegistry {
    rows: BTreeMap<ResonanceKey, ResonanceRow>,
}

impl ResonanceRegistry {
    pub fn replace_all(&mut self, rows: Vec<ResonanceRow>) {
        self.rows = rows.into_iter().map(|r| (r.key.clone(), r)).collect();
    }

    pub fn get(&self, key: &ResonanceKey) -> Option<&ResonanceRow> {
        self.rows.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResonanceRow> {
        self.rows.values()
    }

    pub fn iter_group<'a>(&'a self, group: &'a str) -> impl Iterator<Item = &'a ResonanceRow> {
        self.rows.values().filter(move |r| r.key.tag == group)
    }

    /// Distinct tags, ascending.
    pub fn groups(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for key in self.rows.keys() {
            if out.last().map(String::as_str) != Some(key.tag.as_str()) {
                out.push(key.tag.clone());
            }
        }
        out
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Read-only semantics rows indexed by media path.
#[derive(Resource, Default, Debug)]
pub struct SemanticsIndex {
    by_path: HashMap<String, SemanticsRow>,
}

impl SemanticsIndex {
    pub fn replace_all(&mut self, rows: Vec<SemanticsRow>) {
        self.by_path = rows.into_iter().map(|r| (r.path.clone(), r)).collect();
    }

    pub fn lookup(&self, path: &str) -> Option<&SemanticsRow> {
        self.by_path.get(path)
    }

    pub fn len(&self) -> usize {
        self.by_path.len()
    }
}

/// Diff-only local mutation store: at most one complete-pair patch per
/// composite key. Pure in-memory bookkeeping; never reads or writes the
/// remote layer.
#[derive(Resource, Default, Debug)]
pub struct EditSession {
    patches: HashMap<ResonanceKey, ResonancePatch>,
}

impl EditSession {
    /// Applies a sparse edit on top of the current effective row and stores
    /// the full resulting pair. A later edit to the same key replaces the
    /// patch, always derived from base ⊕ previous patch, never from stale
    /// base alone.
    pub fn set_edit(&mut self, base: &ResonanceRow, input: PatchInput) -> ResonancePatch {
        let current = self.effective(base);
        let patch = ResonancePatch {
            intensity: input
                .intensity
                .map(clamp_intensity)
                .unwrap_or(current.intensity),
            enabled: input.enabled.unwrap_or(current.enabled),
        };
        self.patches.insert(base.key.clone(), patch);
        patch
    }

    /// Base row with its patch applied, or the base row unchanged.
    pub fn effective(&self, base: &ResonanceRow) -> ResonanceRow {
        match self.patches.get(&base.key) {
            Some(patch) => ResonanceRow {
                key: base.key.clone(),
                intensity: patch.intensity,
                enabled: patch.enabled,
                created_at: base.created_at,
            },
            None => base.clone(),
        }
    }

    pub fn patch(&self, key: &ResonanceKey) -> Option<&ResonancePatch> {
        self.patches.get(key)
    }

    /// Removes every patch whose key's tag equals `group`; other groups'
    /// patches are untouched. Returns how many were dropped.
    pub fn clear_group(&mut self, group: &str) -> usize {
        let before = self.patches.len();
        self.patches.retain(|key, _| key.tag != group);
        before - self.patches.len()
    }

    pub fn pending_count(&self, group: &str) -> usize {
        self.patches.keys().filter(|key| key.tag == group).count()
    }

    pub fn total_pending(&self) -> usize {
        self.patches.len()
    }

    /// All pending patches for one group, ascending key order. This is the
    /// save pipeline's batch order.
    pub fn group_patches(&self, group: &str) -> Vec<(ResonanceKey, ResonancePatch)> {
        let mut out: Vec<_> = self
            .patches
            .iter()
            .filter(|(key, _)| key.tag == group)
            .map(|(key, patch)| (key.clone(), *patch))
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }
}

/// Role filter for the derived view: exact role match, or everything.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RoleFilter {
    #[default]
    All,
    Only(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Enabled,
    Disabled,
    RecentlyCreated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
    #[default]
    IntensityDesc,
    CreatedDesc,
    NameAsc,
}

/// What the host application is currently looking at. Mutated directly by
/// the host (it is plain resource state, not an event protocol); the view
/// cache rebuilds on change detection.
#[derive(Resource, Debug, Clone, Default)]
pub struct ViewSettings {
    /// Selected group (tag). Empty string = nothing selected, empty view.
    pub group: String,
    pub role: RoleFilter,
    pub status: StatusFilter,
    /// Case-insensitive substring search. Empty = no search filtering.
    pub search: String,
    pub sort: SortMode,
}

/// Derived, ordered effective rows for the selected group under the current
/// filters. Bulk operations and the host's table display both read this.
#[derive(Resource, Default, Debug)]
pub struct GroupViewCache {
    pub rows: Vec<ResonanceRow>,
}

/// Load/save status surfaced to the host. Informational only: there is no
/// reentrancy guard here, callers serialize their own load/save actions.
#[derive(Resource, Default, Debug)]
pub struct DatasetStatus {
    pub loading: bool,
    pub last_error: Option<String>,
    /// Groups whose last save failed partway: the remote store may hold a
    /// partial commit while local patches still describe the full pending
    /// set. Cleared by the next successful reload.
    pub unconfirmed: BTreeSet<String>,
}

/// Seedable random source for the random-soft perturbation. Seeded from the
/// CLI for reproducible runs, from the OS otherwise.
#[derive(Resource, Debug)]
pub struct PerturbRng(pub StdRng);

impl PerturbRng {
    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl Default for PerturbRng {
    fn default() -> Self {
        Self(StdRng::from_os_rng())
    }
}

/// Process configuration assembled once in `main` from CLI and environment.
#[derive(Resource, Debug, Clone)]
pub struct AppSettings {
    pub remote: RemoteConfig,
    /// Window for the `RecentlyCreated` status filter.
    pub recency_window: Duration,
    /// Use the single bulk save endpoint instead of row-by-row updates.
    pub bulk_save: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            remote: RemoteConfig::default(),
            recency_window: Duration::days(2),
            bulk_save: false,
        }
    }
}
