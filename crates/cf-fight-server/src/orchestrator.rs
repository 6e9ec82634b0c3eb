//! Create / join / start / refresh flows for duel rooms and solo sessions.
//!
//! Every flow finishes all of its judge queries before touching the store,
//! so a failed query never leaves a half-built room behind.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use cf_fight_core::protocol::{CreateRoomRequest, RoomResponse, SoloResponse, SoloSetRequest};
use cf_fight_core::session::now_seconds;
use cf_fight_core::solves::{RECENT_SUBMISSIONS, earliest_accepted, empty_solves, solved_count};
use cf_fight_core::{
    DuelRoom, ProblemKey, SelectedProblem, SelectionParams, SoloSession, index_catalog, select,
};

use crate::config::SoloRefreshMode;
use crate::error::SessionError;
use crate::judge::{self, HandleCheck};
use crate::state::{AppState, normalize_code};

fn room_not_found() -> SessionError {
    SessionError::NotFound("Room not found".into())
}

fn solo_not_found() -> SessionError {
    SessionError::NotFound("Solo session not found".into())
}

fn required(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

fn check_breadth(params: &SelectionParams) -> Result<(), SessionError> {
    if params.breadth() <= 0 {
        return Err(SessionError::validation(format!(
            "Empty rating range {}-{}",
            params.rating_min, params.rating_max
        )));
    }
    Ok(())
}

fn invalid_handles(checks: &[(&str, &HandleCheck)]) -> Option<SessionError> {
    let details: Vec<String> = checks
        .iter()
        .filter(|(_, check)| !check.valid)
        .map(|(label, check)| {
            format!(
                "Invalid {}: {}",
                label,
                check.error.as_deref().unwrap_or("Failed to validate handle")
            )
        })
        .collect();
    if details.is_empty() {
        return None;
    }
    Some(SessionError::Validation {
        message: "Invalid handles".into(),
        details,
    })
}

/// Run the band selector with the shared picker.
fn pick_problems(
    state: &AppState,
    catalog: &[cf_fight_core::Problem],
    params: &SelectionParams,
    excluded: &[&HashSet<ProblemKey>],
) -> Vec<SelectedProblem> {
    let mut picker = state
        .picker
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    select(catalog, params, excluded, &mut **picker)
}

// ── Duel ────────────────────────────────────────────────────────────────

pub async fn create_duel(
    state: &AppState,
    req: CreateRoomRequest,
) -> Result<RoomResponse, SessionError> {
    let (Some(handle1), Some(handle2)) =
        (required(req.handle1.as_deref()), required(req.handle2.as_deref()))
    else {
        return Err(SessionError::validation("Both handles are required"));
    };
    // The judge treats handles case-insensitively; solves are keyed per handle.
    if handle1.eq_ignore_ascii_case(&handle2) {
        return Err(SessionError::validation("Handles must be different"));
    }
    let params = req.selection();
    check_breadth(&params)?;

    let cf = state.judge.as_ref();
    let (check1, check2) = tokio::join!(
        judge::validate_handle(cf, &handle1),
        judge::validate_handle(cf, &handle2)
    );
    if let Some(err) = invalid_handles(&[("handle1", &check1), ("handle2", &check2)]) {
        return Err(err);
    }

    let (problemset, solved1, solved2) = tokio::try_join!(
        cf.problemset(),
        judge::solved_set(cf, &handle1),
        judge::solved_set(cf, &handle2)
    )
    .inspect_err(|e| warn!(%handle1, %handle2, error = %e, "duel setup failed upstream"))?;

    let catalog = index_catalog(&problemset);
    let problems = pick_problems(state, &catalog, &params, &[&solved1, &solved2]);
    if problems.is_empty() {
        return Err(SessionError::validation(
            "Could not find suitable unsolved problems for both users in this rating range.",
        ));
    }

    let room = state.store.insert_room(DuelRoom::new(
        handle1,
        handle2,
        &params,
        problems,
        now_seconds(),
    ));
    info!(
        code = %room.code,
        handle1 = %room.handle1,
        handle2 = %room.handle2,
        problems = room.problems.len(),
        requested = params.num_problems,
        rooms = state.store.room_count(),
        "duel room created"
    );

    Ok(room_response(state, room))
}

fn room_response(state: &AppState, room: DuelRoom) -> RoomResponse {
    RoomResponse {
        room_code: room.code.clone(),
        solves: state.store.room_solves(&room.code),
        room,
    }
}

/// Current room state and solves. Joining is a plain read.
pub fn join_duel(state: &AppState, code: &str) -> Result<RoomResponse, SessionError> {
    let room = state.store.room(code).ok_or_else(room_not_found)?;
    Ok(room_response(state, room))
}

/// Start the clock. Calling it on a started room returns the room unchanged.
pub fn start_duel(state: &AppState, code: &str) -> Result<RoomResponse, SessionError> {
    let (room, started) = state
        .store
        .start_room(code, now_seconds())
        .ok_or_else(room_not_found)?;
    if started {
        info!(code = %room.code, start_time = ?room.start_time, "duel started");
    }
    Ok(room_response(state, room))
}

/// Pull both participants' recent submissions and merge new solves.
/// A room that has not started is returned as is.
pub async fn refresh_duel(state: &AppState, code: &str) -> Result<RoomResponse, SessionError> {
    let code = normalize_code(code);
    let lock = state.store.room_lock(&code).ok_or_else(room_not_found)?;
    let _guard = lock.lock().await;

    let room = state.store.room(&code).ok_or_else(room_not_found)?;
    let Some(start) = room.start_time else {
        return Ok(room_response(state, room));
    };

    let cf = state.judge.as_ref();
    let (subs1, subs2) = tokio::try_join!(
        cf.user_submissions(&room.handle1, Some(RECENT_SUBMISSIONS)),
        cf.user_submissions(&room.handle2, Some(RECENT_SUBMISSIONS))
    )
    .inspect_err(|e| warn!(code = %room.code, error = %e, "duel refresh failed upstream"))?;

    let scope = empty_solves(&room.problems);
    let mut changed = 0;
    for (handle, subs) in [(&room.handle1, &subs1), (&room.handle2, &subs2)] {
        let fresh = earliest_accepted(&scope, start, subs);
        changed += state.store.merge_room_solves(&room.code, handle, &fresh);
    }
    debug!(code = %room.code, changed, "duel refreshed");

    Ok(room_response(state, room))
}

// ── Solo ────────────────────────────────────────────────────────────────

pub async fn create_solo(
    state: &AppState,
    req: SoloSetRequest,
) -> Result<SoloResponse, SessionError> {
    let Some(handle) = required(req.handle.as_deref()) else {
        return Err(SessionError::validation("Handle is required"));
    };
    let params = req.selection();
    check_breadth(&params)?;

    let cf = state.judge.as_ref();
    let check = judge::validate_handle(cf, &handle).await;
    if !check.valid {
        return Err(SessionError::Validation {
            message: "Invalid handle".into(),
            details: check.error.into_iter().collect(),
        });
    }

    let (problemset, solved) = tokio::try_join!(cf.problemset(), judge::solved_set(cf, &handle))
        .inspect_err(|e| warn!(%handle, error = %e, "solo setup failed upstream"))?;

    let catalog = index_catalog(&problemset);
    let problems = pick_problems(state, &catalog, &params, &[&solved]);
    if problems.is_empty() {
        return Err(SessionError::validation(
            "Could not find suitable unsolved problems for this user in this rating range.",
        ));
    }

    let session = state
        .store
        .insert_solo(SoloSession::new(handle, &params, problems, now_seconds()));
    info!(
        session_id = %session.session_id,
        handle = %session.handle,
        problems = session.problems.len(),
        sessions = state.store.solo_count(),
        "solo session created"
    );

    Ok(solo_response(state, session))
}

fn solo_response(state: &AppState, session: SoloSession) -> SoloResponse {
    SoloResponse {
        solves: state.store.solo_solves(&session.session_id),
        session,
    }
}

/// Current solo state without asking the judge.
pub fn solo_status(state: &AppState, id: &str) -> Result<SoloResponse, SessionError> {
    let session = state.store.solo(id).ok_or_else(solo_not_found)?;
    Ok(solo_response(state, session))
}

/// Recompute the session's solves from the recent submission feed.
///
/// In the default mode the table is rebuilt from scratch, so a problem the
/// feed no longer shows reads as unsolved until it shows up again.
pub async fn refresh_solo(state: &AppState, id: &str) -> Result<SoloResponse, SessionError> {
    let id = normalize_code(id);
    let lock = state.store.solo_lock(&id).ok_or_else(solo_not_found)?;
    let _guard = lock.lock().await;

    let session = state.store.solo(&id).ok_or_else(solo_not_found)?;
    let subs = state
        .judge
        .user_submissions(&session.handle, Some(RECENT_SUBMISSIONS))
        .await
        .inspect_err(|e| warn!(session_id = %id, error = %e, "solo refresh failed upstream"))?;

    let fresh = earliest_accepted(&empty_solves(&session.problems), session.start_time, &subs);
    let solved = solved_count(&fresh);
    match state.config.solo_refresh {
        SoloRefreshMode::Recompute => state.store.replace_solo_solves(&id, fresh),
        SoloRefreshMode::Merge => {
            state.store.merge_solo_solves(&id, &fresh);
        }
    }
    debug!(session_id = %id, solved, "solo refreshed");

    Ok(solo_response(state, session))
}
