// src/resonance/view.rs
//! Derived filtering/sorting over effective rows for one group.
//!
//! Everything here operates on post-merge rows (base ⊕ pending patch), so
//! in-flight edits are reflected immediately. Pure functions; the rebuild
//! system in `systems` feeds the result into `GroupViewCache`.

use chrono::{DateTime, Duration, Utc};
use std::path::Path;

use super::definitions::ResonanceRow;
use super::resources::{
    EditSession, ResonanceRegistry, RoleFilter, SemanticsIndex, SortMode, StatusFilter,
    ViewSettings,
};

/// Builds the ordered effective-row view for the group selected in
/// `settings`. `now` is passed in so recency filtering is testable.
pub fn build_group_view(
    registry: &ResonanceRegistry,
    session: &EditSession,
    semantics: &SemanticsIndex,
    settings: &ViewSettings,
    now: DateTime<Utc>,
    recency_window: Duration,
) -> Vec<ResonanceRow> {
    if settings.group.is_empty() {
        return Vec::new();
    }

    let needle = settings.search.trim().to_lowercase();
    let mut rows: Vec<ResonanceRow> = registry
        .iter_group(&settings.group)
        .map(|base| session.effective(base))
        .filter(|row| matches_role(row, &settings.role))
        .filter(|row| matches_status(row, settings.status, now, recency_window))
        .filter(|row| needle.is_empty() || matches_search(row, semantics, &needle))
        .collect();

    sort_rows(&mut rows, settings.sort);
    rows
}

fn matches_role(row: &ResonanceRow, filter: &RoleFilter) -> bool {
    match filter {
        RoleFilter::All => true,
        RoleFilter::Only(role) => row.key.role == *role,
    }
}

fn matches_status(
    row: &ResonanceRow,
    filter: StatusFilter,
    now: DateTime<Utc>,
    recency_window: Duration,
) -> bool {
    match filter {
        StatusFilter::All => true,
        StatusFilter::Enabled => row.enabled,
        StatusFilter::Disabled => !row.enabled,
        StatusFilter::RecentlyCreated => row
            .created_at
            .map(|created| created >= now - recency_window)
            .unwrap_or(false),
    }
}

/// A row matches when any of basename, full path, joined semantics tags, or
/// climate contains the lowercased needle.
fn matches_search(row: &ResonanceRow, semantics: &SemanticsIndex, needle: &str) -> bool {
    if basename(&row.key.media_path).to_lowercase().contains(needle)
        || row.key.media_path.to_lowercase().contains(needle)
    {
        return true;
    }
    if let Some(sem) = semantics.lookup(&row.key.media_path) {
        if sem.tags.join(" ").to_lowercase().contains(needle) {
            return true;
        }
        if let Some(climate) = &sem.climate {
            if climate.to_lowercase().contains(needle) {
                return true;
            }
        }
    }
    false
}

fn basename(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

/// All modes tie-break by ascending key order for determinism. `CreatedDesc`
/// sorts rows without a timestamp last (treated as oldest).
fn sort_rows(rows: &mut [ResonanceRow], mode: SortMode) {
    match mode {
        SortMode::IntensityDesc => rows.sort_by(|a, b| {
            b.intensity
                .cmp(&a.intensity)
                .then_with(|| a.key.cmp(&b.key))
        }),
        SortMode::CreatedDesc => rows.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.key.cmp(&b.key))
        }),
        SortMode::NameAsc => rows.sort_by(|a, b| {
            basename(&a.key.media_path)
                .to_lowercase()
                .cmp(&basename(&b.key.media_path).to_lowercase())
                .then_with(|| a.key.cmp(&b.key))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resonance::definitions::{PatchInput, ResonanceKey, SemanticsRow};
    use chrono::TimeZone;

    fn row(
        tag: &str,
        path: &str,
        role: &str,
        intensity: u8,
        enabled: bool,
        created_days_ago: Option<i64>,
        now: DateTime<Utc>,
    ) -> ResonanceRow {
        ResonanceRow {
            key: ResonanceKey {
                tag: tag.to_string(),
                media_path: path.to_string(),
                role: role.to_string(),
            },
            intensity,
            enabled,
            created_at: created_days_ago.map(|d| now - Duration::days(d)),
        }
    }

    fn fixture() -> (ResonanceRegistry, EditSession, SemanticsIndex, DateTime<Utc>) {
        let now = Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap();
        let mut registry = ResonanceRegistry::default();
        registry.replace_all(vec![
            row("calm", "audio/Waves.mp3", "music", 6, true, Some(1), now),
            row("calm", "audio/rain.mp3", "music", 4, false, Some(5), now),
            row("calm", "voice/intro.ogg", "voice", 2, true, None, now),
            row("deep", "audio/drone.mp3", "music", 8, true, Some(0), now),
        ]);
        let mut semantics = SemanticsIndex::default();
        semantics.replace_all(vec![
            SemanticsRow {
                path: "audio/rain.mp3".into(),
                category: "music".into(),
                climate: Some("tense".into()),
                tags: vec!["storm".into(), "water".into()],
                ..Default::default()
            },
            SemanticsRow {
                path: "voice/intro.ogg".into(),
                category: "voice".into(),
                climate: Some("calm".into()),
                ..Default::default()
            },
        ]);
        (registry, EditSession::default(), semantics, now)
    }

    fn settings(group: &str) -> ViewSettings {
        ViewSettings { group: group.into(), ..Default::default() }
    }

    #[test]
    fn empty_group_selection_yields_empty_view() {
        let (registry, session, semantics, now) = fixture();
        let view = build_group_view(
            &registry,
            &session,
            &semantics,
            &ViewSettings::default(),
            now,
            Duration::days(2),
        );
        assert!(view.is_empty());
    }

    #[test]
    fn view_is_scoped_to_group_and_sorted_by_intensity_desc() {
        let (registry, session, semantics, now) = fixture();
        let view = build_group_view(
            &registry,
            &session,
            &semantics,
            &settings("calm"),
            now,
            Duration::days(2),
        );
        let paths: Vec<&str> = view.iter().map(|r| r.key.media_path.as_str()).collect();
        assert_eq!(paths, vec!["audio/Waves.mp3", "audio/rain.mp3", "voice/intro.ogg"]);
    }

    #[test]
    fn role_and_status_filters_compose() {
        let (registry, session, semantics, now) = fixture();
        let mut s = settings("calm");
        s.role = RoleFilter::Only("music".into());
        s.status = StatusFilter::Enabled;
        let view =
            build_group_view(&registry, &session, &semantics, &s, now, Duration::days(2));
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].key.media_path, "audio/Waves.mp3");
    }

    #[test]
    fn recently_created_uses_window_and_skips_undated_rows() {
        let (registry, session, semantics, now) = fixture();
        let mut s = settings("calm");
        s.status = StatusFilter::RecentlyCreated;
        let view =
            build_group_view(&registry, &session, &semantics, &s, now, Duration::days(2));
        // Only Waves.mp3 (1 day old) is inside the 2-day window; rain.mp3 is
        // 5 days old and intro.ogg has no timestamp.
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].key.media_path, "audio/Waves.mp3");
    }

    #[test]
    fn search_matches_basename_path_tags_and_climate() {
        let (registry, session, semantics, now) = fixture();
        let window = Duration::days(2);

        let mut s = settings("calm");
        s.search = "WAVES".into(); // basename, case-insensitive
        assert_eq!(
            build_group_view(&registry, &session, &semantics, &s, now, window).len(),
            1
        );

        s.search = "voice/".into(); // full path
        assert_eq!(
            build_group_view(&registry, &session, &semantics, &s, now, window).len(),
            1
        );

        s.search = "storm".into(); // semantics tag
        let view = build_group_view(&registry, &session, &semantics, &s, now, window);
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].key.media_path, "audio/rain.mp3");

        s.search = "tense".into(); // climate
        assert_eq!(
            build_group_view(&registry, &session, &semantics, &s, now, window).len(),
            1
        );

        s.search = "nothing-here".into();
        assert!(build_group_view(&registry, &session, &semantics, &s, now, window).is_empty());
    }

    #[test]
    fn pending_edits_are_reflected_in_filtering_and_order() {
        let (registry, mut session, semantics, now) = fixture();
        let base = registry
            .iter_group("calm")
            .find(|r| r.key.media_path == "voice/intro.ogg")
            .cloned()
            .unwrap();
        session.set_edit(&base, PatchInput::intensity(9.0));

        let view = build_group_view(
            &registry,
            &session,
            &semantics,
            &settings("calm"),
            now,
            Duration::days(2),
        );
        assert_eq!(view[0].key.media_path, "voice/intro.ogg");
        assert_eq!(view[0].intensity, 9);
    }

    #[test]
    fn name_sort_is_case_insensitive_with_key_tie_break() {
        let (registry, session, semantics, now) = fixture();
        let mut s = settings("calm");
        s.sort = SortMode::NameAsc;
        let view =
            build_group_view(&registry, &session, &semantics, &s, now, Duration::days(2));
        let names: Vec<String> = view.iter().map(|r| basename(&r.key.media_path)).collect();
        assert_eq!(names, vec!["intro.ogg", "rain.mp3", "Waves.mp3"]);
    }

    #[test]
    fn created_sort_puts_undated_rows_last() {
        let (registry, session, semantics, now) = fixture();
        let mut s = settings("calm");
        s.sort = SortMode::CreatedDesc;
        let view =
            build_group_view(&registry, &session, &semantics, &s, now, Duration::days(2));
        assert_eq!(view.last().unwrap().key.media_path, "voice/intro.ogg");
    }
}
