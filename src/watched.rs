// src/watched.rs
use std::collections::{HashMap, HashSet};
use std::io;

use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::catalog::{MovieId, MovieRecord};
use crate::storage::KeyValueStore;

/// Slot holding the done list, newest first.
pub const STORAGE_MOVIES_DONE: &str = "movies_1";
pub const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoneEntry {
    pub id: MovieId,
    pub title: String,
    pub updated_at: String,
    #[serde(rename = "isDubbed", default)]
    pub is_dubbed: bool,
}

pub fn offset_from_hours(hours: i32) -> FixedOffset {
    FixedOffset::east_opt(hours.saturating_mul(3600)).unwrap_or_else(|| Utc.fix())
}

pub fn format_timestamp(at: DateTime<Utc>, offset: FixedOffset) -> String {
    at.with_timezone(&offset).format(TIMESTAMP_FORMAT).to_string()
}

type Clock = Box<dyn Fn() -> DateTime<Utc>>;

/// Checked/dubbed flags for the table, mirrored into one store slot.
///
/// The persisted list is the durable record; the two in-memory maps are what
/// the UI reads every frame and are only rebuilt by [`WatchedState::load_state`].
pub struct WatchedState<S: KeyValueStore> {
    store: S,
    checked: HashSet<MovieId>,
    dubbed: HashMap<MovieId, bool>,
    offset: FixedOffset,
    clock: Clock,
}

impl<S: KeyValueStore> WatchedState<S> {
    pub fn new(store: S, offset: FixedOffset) -> Self {
        Self {
            store,
            checked: HashSet::new(),
            dubbed: HashMap::new(),
            offset,
            clock: Box::new(Utc::now),
        }
    }

    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Rebuild both maps from the persisted list. Prior in-memory state is discarded.
    pub fn load_state(&mut self) {
        let entries = self.read_entries();
        let mut checked = HashSet::with_capacity(entries.len());
        let mut dubbed = HashMap::with_capacity(entries.len());
        for entry in &entries {
            checked.insert(entry.id);
            dubbed.insert(entry.id, entry.is_dubbed);
        }
        debug!("loaded {} done entries", entries.len());
        self.checked = checked;
        self.dubbed = dubbed;
    }

    pub fn set_checked(&mut self, movie: &MovieRecord, checked: bool) {
        if checked {
            self.checked.insert(movie.id);
        } else {
            self.checked.remove(&movie.id);
        }

        // Writing back a list we failed to read would drop every other entry.
        let mut entries = match try_read_done_list(&self.store) {
            Ok(entries) => entries,
            Err(err) => {
                warn!("skipping done list update for {}: {err}", movie.id);
                return;
            }
        };
        let existing = entries.iter().position(|e| e.id == movie.id);

        let changed = match (checked, existing) {
            (true, None) => {
                entries.insert(
                    0,
                    DoneEntry {
                        id: movie.id,
                        title: movie.title.clone(),
                        updated_at: format_timestamp((self.clock)(), self.offset),
                        is_dubbed: self.is_dubbed(movie.id),
                    },
                );
                true
            }
            (false, Some(idx)) => {
                entries.remove(idx);
                true
            }
            // Already in the requested state; the first capture time is kept.
            (true, Some(_)) | (false, None) => false,
        };

        if changed {
            self.write_entries(&entries);
        }
    }

    /// Unchecked movies only keep the flag in memory until the next reload.
    pub fn set_dubbed(&mut self, movie_id: MovieId, is_dubbed: bool) {
        self.dubbed.insert(movie_id, is_dubbed);

        if !self.is_checked(movie_id) {
            return;
        }

        let mut entries = match try_read_done_list(&self.store) {
            Ok(entries) => entries,
            Err(err) => {
                warn!("skipping dub flag update for {movie_id}: {err}");
                return;
            }
        };
        match entries.iter_mut().find(|e| e.id == movie_id) {
            Some(entry) => entry.is_dubbed = is_dubbed,
            None => warn!("movie {movie_id} is checked but missing from the done list"),
        }
        self.write_entries(&entries);
    }

    pub fn is_checked(&self, movie_id: MovieId) -> bool {
        self.checked.contains(&movie_id)
    }

    pub fn is_dubbed(&self, movie_id: MovieId) -> bool {
        self.dubbed.get(&movie_id).copied().unwrap_or(false)
    }

    pub fn checked_count(&self) -> usize {
        self.checked.len()
    }

    /// Current persisted list, newest first.
    pub fn entries(&self) -> Vec<DoneEntry> {
        self.read_entries()
    }

    fn read_entries(&self) -> Vec<DoneEntry> {
        read_done_list(&self.store)
    }

    fn write_entries(&mut self, entries: &[DoneEntry]) {
        let body = match serde_json::to_string(entries) {
            Ok(body) => body,
            Err(err) => {
                warn!("failed to encode done list: {err}");
                return;
            }
        };
        if let Err(err) = self.store.set(STORAGE_MOVIES_DONE, &body) {
            warn!("failed to persist done list: {err}");
        }
    }
}

/// Absent, unreadable or malformed slot content all read as an empty list.
pub fn read_done_list<S: KeyValueStore + ?Sized>(store: &S) -> Vec<DoneEntry> {
    try_read_done_list(store).unwrap_or_else(|err| {
        warn!("failed to read done list: {err}");
        Vec::new()
    })
}

/// Like [`read_done_list`], but a failed store read is an error.
/// Absent or malformed content still reads as an empty list.
pub fn try_read_done_list<S: KeyValueStore + ?Sized>(store: &S) -> io::Result<Vec<DoneEntry>> {
    let Some(raw) = store.get(STORAGE_MOVIES_DONE)? else {
        return Ok(Vec::new());
    };
    if raw.trim().is_empty() || raw.trim() == "null" {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(&raw).unwrap_or_else(|err| {
        warn!("ignoring malformed done list: {err}");
        Vec::new()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use chrono::TimeZone;
    use std::cell::Cell;
    use std::rc::Rc;

    fn movie(id: MovieId, title: &str) -> MovieRecord {
        MovieRecord {
            id,
            title: title.to_string(),
            ..Default::default()
        }
    }

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 9, h, m, s).unwrap()
    }

    fn state(store: MemoryStore) -> WatchedState<MemoryStore> {
        WatchedState::new(store, offset_from_hours(-3)).with_clock(|| at(15, 4, 5))
    }

    fn ids(state: &WatchedState<MemoryStore>) -> Vec<MovieId> {
        state.entries().iter().map(|e| e.id).collect()
    }

    #[test]
    fn empty_store_leaves_everything_unchecked() {
        let mut s = state(MemoryStore::default());
        s.load_state();
        for id in [1, 2, 3] {
            assert!(!s.is_checked(id));
            assert!(!s.is_dubbed(id));
        }
        assert_eq!(s.checked_count(), 0);
    }

    #[test]
    fn check_then_reload_keeps_capture_time() {
        let mut s = state(MemoryStore::default());
        s.load_state();
        s.set_checked(&movie(1, "Alien"), true);

        let mut reloaded = state(s.store().clone()).with_clock(|| at(23, 0, 0));
        reloaded.load_state();
        assert!(reloaded.is_checked(1));
        assert_eq!(
            reloaded.entries(),
            vec![DoneEntry {
                id: 1,
                title: "Alien".into(),
                updated_at: "09/03/2024 12:04:05".into(),
                is_dubbed: false,
            }]
        );
    }

    #[test]
    fn check_then_uncheck_restores_storage() {
        let mut s = state(MemoryStore::default());
        s.set_checked(&movie(1, "Alien"), true);
        assert_eq!(
            s.store().get(STORAGE_MOVIES_DONE).unwrap().as_deref(),
            Some(r#"[{"id":1,"title":"Alien","updated_at":"09/03/2024 12:04:05","isDubbed":false}]"#)
        );

        s.set_checked(&movie(1, "Alien"), false);
        assert_eq!(s.store().get(STORAGE_MOVIES_DONE).unwrap().as_deref(), Some("[]"));
        assert!(!s.is_checked(1));
    }

    #[test]
    fn uncheck_only_touches_its_own_entry() {
        let mut s = state(MemoryStore::default());
        s.set_checked(&movie(1, "Alien"), true);
        s.set_checked(&movie(2, "Heat"), true);
        s.set_checked(&movie(3, "Ran"), true);
        assert_eq!(ids(&s), vec![3, 2, 1]);

        s.set_checked(&movie(2, "Heat"), false);
        assert_eq!(ids(&s), vec![3, 1]);
        assert!(s.is_checked(1) && s.is_checked(3) && !s.is_checked(2));
    }

    #[test]
    fn repeated_intent_is_idempotent() {
        let tick = Rc::new(Cell::new(0u32));
        let clock_tick = Rc::clone(&tick);
        let mut s = WatchedState::new(MemoryStore::default(), offset_from_hours(0))
            .with_clock(move || {
                clock_tick.set(clock_tick.get() + 1);
                at(10, 0, clock_tick.get())
            });

        s.set_checked(&movie(7, "Ran"), false);
        assert_eq!(s.store().get(STORAGE_MOVIES_DONE).unwrap(), None);

        s.set_checked(&movie(7, "Ran"), true);
        s.set_checked(&movie(7, "Ran"), true);
        let entries = s.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].updated_at, "09/03/2024 10:00:01");
        assert_eq!(tick.get(), 1);
    }

    #[test]
    fn at_most_one_entry_per_id() {
        let mut s = state(MemoryStore::default());
        let toggles = [
            (1, true),
            (2, true),
            (1, true),
            (1, false),
            (1, true),
            (2, false),
            (2, true),
            (3, false),
            (2, true),
        ];
        for (id, checked) in toggles {
            s.set_checked(&movie(id, "x"), checked);
            let mut seen = ids(&s);
            let len = seen.len();
            seen.sort_unstable();
            seen.dedup();
            assert_eq!(seen.len(), len);
        }
        assert_eq!(ids(&s), vec![2, 1]);
    }

    #[test]
    fn dubbed_on_checked_movie_survives_reload() {
        let mut s = state(MemoryStore::default());
        s.set_checked(&movie(1, "Alien"), true);
        s.set_dubbed(1, true);
        assert!(s.is_dubbed(1));

        let mut reloaded = state(s.store().clone());
        reloaded.load_state();
        assert!(reloaded.is_dubbed(1));
        assert!(reloaded.entries()[0].is_dubbed);
    }

    #[test]
    fn dubbed_on_unchecked_movie_is_memory_only() {
        let mut s = state(MemoryStore::default());
        s.set_dubbed(4, true);
        assert!(s.is_dubbed(4));
        assert_eq!(s.store().get(STORAGE_MOVIES_DONE).unwrap(), None);

        let mut reloaded = state(s.store().clone());
        reloaded.load_state();
        assert!(!reloaded.is_dubbed(4));
    }

    #[test]
    fn remembered_dub_flag_seeds_a_new_entry() {
        let mut s = state(MemoryStore::default());
        s.set_dubbed(5, true);
        s.set_checked(&movie(5, "Akira"), true);
        assert!(s.entries()[0].is_dubbed);
    }

    #[test]
    fn load_state_replaces_previous_maps() {
        let mut s = state(MemoryStore::default());
        s.set_checked(&movie(1, "Alien"), true);
        s.set_dubbed(9, true);

        let mut other = MemoryStore::default();
        other
            .set(
                STORAGE_MOVIES_DONE,
                r#"[{"id":2,"title":"Heat","updated_at":"01/01/2024 00:00:00","isDubbed":true}]"#,
            )
            .unwrap();
        s.store = other;
        s.load_state();

        assert!(!s.is_checked(1));
        assert!(!s.is_dubbed(9));
        assert!(s.is_checked(2));
        assert!(s.is_dubbed(2));
    }

    #[test]
    fn malformed_slot_reads_as_empty() {
        let mut store = MemoryStore::default();
        store.set(STORAGE_MOVIES_DONE, "{oops").unwrap();
        let mut s = state(store);
        s.load_state();
        assert_eq!(s.checked_count(), 0);

        s.set_checked(&movie(1, "Alien"), true);
        assert_eq!(ids(&s), vec![1]);
    }

    struct FailingStore;

    impl KeyValueStore for FailingStore {
        fn get(&self, _key: &str) -> io::Result<Option<String>> {
            Err(io::Error::other("disk gone"))
        }
        fn set(&mut self, _key: &str, _value: &str) -> io::Result<()> {
            Err(io::Error::other("disk gone"))
        }
        fn remove(&mut self, _key: &str) -> io::Result<()> {
            Err(io::Error::other("disk gone"))
        }
    }

    #[test]
    fn store_failures_do_not_block_the_toggle() {
        let mut s = WatchedState::new(FailingStore, offset_from_hours(-3));
        s.load_state();
        s.set_checked(&movie(1, "Alien"), true);
        s.set_dubbed(1, true);
        assert!(s.is_checked(1));
        assert!(s.is_dubbed(1));
        assert!(s.entries().is_empty());

        s.set_checked(&movie(1, "Alien"), false);
        assert!(!s.is_checked(1));
    }

    /// Memory store whose next `get` fails when armed.
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        fail_next_get: Cell<bool>,
    }

    impl KeyValueStore for FlakyStore {
        fn get(&self, key: &str) -> io::Result<Option<String>> {
            if self.fail_next_get.replace(false) {
                return Err(io::Error::other("database is locked"));
            }
            self.inner.get(key)
        }
        fn set(&mut self, key: &str, value: &str) -> io::Result<()> {
            self.inner.set(key, value)
        }
        fn remove(&mut self, key: &str) -> io::Result<()> {
            self.inner.remove(key)
        }
    }

    #[test]
    fn failed_read_keeps_the_saved_list() {
        let mut s = WatchedState::new(FlakyStore::default(), offset_from_hours(-3))
            .with_clock(|| at(15, 4, 5));
        for (id, title) in [(1, "Alien"), (2, "Heat"), (3, "Ran")] {
            s.set_checked(&movie(id, title), true);
        }
        let saved = s.store().inner.get(STORAGE_MOVIES_DONE).unwrap();

        s.store().fail_next_get.set(true);
        s.set_checked(&movie(4, "Akira"), true);
        assert!(s.is_checked(4));
        assert_eq!(s.store().inner.get(STORAGE_MOVIES_DONE).unwrap(), saved);

        s.store().fail_next_get.set(true);
        s.set_dubbed(4, true);
        assert!(s.is_dubbed(4));
        assert_eq!(s.store().inner.get(STORAGE_MOVIES_DONE).unwrap(), saved);

        s.store().fail_next_get.set(true);
        s.set_checked(&movie(2, "Heat"), false);
        assert!(!s.is_checked(2));
        assert_eq!(s.store().inner.get(STORAGE_MOVIES_DONE).unwrap(), saved);

        let ids: Vec<MovieId> = read_done_list(s.store()).iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[test]
    fn dubbed_on_entry_removed_elsewhere_rewrites_what_was_read() {
        let mut s = state(MemoryStore::default());
        s.set_checked(&movie(1, "Alien"), true);
        s.set_checked(&movie(2, "Heat"), true);

        // Another writer dropped movie 2 from the slot.
        let outside = r#"[{"id":1,"title":"Alien","updated_at":"09/03/2024 12:04:05","isDubbed":false}]"#;
        s.store.set(STORAGE_MOVIES_DONE, outside).unwrap();

        s.set_dubbed(2, true);
        assert!(s.is_dubbed(2));
        assert_eq!(
            s.store().get(STORAGE_MOVIES_DONE).unwrap().as_deref(),
            Some(outside)
        );
    }

    #[test]
    fn timestamp_uses_fixed_offset() {
        let utc = Utc.with_ymd_and_hms(2024, 1, 1, 2, 30, 0).unwrap();
        assert_eq!(format_timestamp(utc, offset_from_hours(-3)), "31/12/2023 23:30:00");
        assert_eq!(format_timestamp(utc, offset_from_hours(0)), "01/01/2024 02:30:00");
    }
}
