//! In-memory rooms, solo sessions and their solve tables. Nothing here
//! outlives the process.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::Mutex;

use cf_fight_core::solves::{empty_solves, merge_earliest};
use cf_fight_core::{DuelRoom, DuelSolves, ProblemSolves, SoloSession};

use crate::state::{generate_room_code, normalize_code};

#[derive(Default)]
pub struct SessionStore {
    rooms: DashMap<String, DuelRoom>,
    room_solves: DashMap<String, DuelSolves>,
    solo: DashMap<String, SoloSession>,
    solo_solves: DashMap<String, ProblemSolves>,
    /// One lock per room / session so refreshes of the same code run one at a time.
    refresh_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Duel rooms ──────────────────────────────────────────────────────

    /// Store a new room under a fresh code, with every solve slot empty.
    pub fn insert_room(&self, mut room: DuelRoom) -> DuelRoom {
        loop {
            let code = generate_room_code();
            if let Entry::Vacant(slot) = self.rooms.entry(code.clone()) {
                room.code = code.clone();
                let blank = empty_solves(&room.problems);
                let solves: DuelSolves = room
                    .handles()
                    .iter()
                    .map(|h| (h.to_string(), blank.clone()))
                    .collect();
                self.refresh_locks.insert(room_key(&code), Arc::default());
                self.room_solves.insert(code, solves);
                slot.insert(room.clone());
                return room;
            }
        }
    }

    pub fn room(&self, code: &str) -> Option<DuelRoom> {
        self.rooms.get(&normalize_code(code)).map(|r| r.clone())
    }

    pub fn room_solves(&self, code: &str) -> DuelSolves {
        self.room_solves
            .get(&normalize_code(code))
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    /// Set the start time unless it is already set. Returns the room and
    /// whether this call started it.
    pub fn start_room(&self, code: &str, now: DateTime<Utc>) -> Option<(DuelRoom, bool)> {
        let mut room = self.rooms.get_mut(&normalize_code(code))?;
        let started = room.start(now);
        Some((room.clone(), started))
    }

    /// Fold fresh evidence into one participant's solves. Returns how many changed.
    pub fn merge_room_solves(&self, code: &str, handle: &str, fresh: &ProblemSolves) -> usize {
        let mut table = self.room_solves.entry(normalize_code(code)).or_default();
        let slot = table.entry(handle.to_string()).or_default();
        merge_earliest(slot, fresh)
    }

    // ── Solo sessions ───────────────────────────────────────────────────

    pub fn insert_solo(&self, mut session: SoloSession) -> SoloSession {
        loop {
            let id = generate_room_code();
            if let Entry::Vacant(slot) = self.solo.entry(id.clone()) {
                session.session_id = id.clone();
                self.refresh_locks.insert(solo_key(&id), Arc::default());
                self.solo_solves.insert(id, empty_solves(&session.problems));
                slot.insert(session.clone());
                return session;
            }
        }
    }

    pub fn solo(&self, id: &str) -> Option<SoloSession> {
        self.solo.get(&normalize_code(id)).map(|s| s.clone())
    }

    pub fn solo_solves(&self, id: &str) -> ProblemSolves {
        self.solo_solves
            .get(&normalize_code(id))
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    pub fn replace_solo_solves(&self, id: &str, fresh: ProblemSolves) {
        self.solo_solves.insert(normalize_code(id), fresh);
    }

    pub fn merge_solo_solves(&self, id: &str, fresh: &ProblemSolves) -> usize {
        let mut table = self.solo_solves.entry(normalize_code(id)).or_default();
        merge_earliest(&mut table, fresh)
    }

    // ── Refresh serialization ───────────────────────────────────────────

    // Locks are created with their room or session, so unknown codes never
    // allocate one.

    pub fn room_lock(&self, code: &str) -> Option<Arc<Mutex<()>>> {
        self.refresh_locks
            .get(&room_key(&normalize_code(code)))
            .map(|l| l.clone())
    }

    pub fn solo_lock(&self, id: &str) -> Option<Arc<Mutex<()>>> {
        self.refresh_locks
            .get(&solo_key(&normalize_code(id)))
            .map(|l| l.clone())
    }

    pub fn lock_count(&self) -> usize {
        self.refresh_locks.len()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn solo_count(&self) -> usize {
        self.solo.len()
    }
}

fn room_key(code: &str) -> String {
    format!("room:{}", code)
}

fn solo_key(id: &str) -> String {
    format!("solo:{}", id)
}
