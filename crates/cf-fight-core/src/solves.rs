use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::bands::SelectedProblem;
use crate::catalog::ProblemKey;

/// Verdict the judge reports for an accepted solution.
pub const ACCEPTED: &str = "OK";

/// How many recent submissions a refresh looks at per handle.
pub const RECENT_SUBMISSIONS: u32 = 1000;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionProblem {
    #[serde(default)]
    pub contest_id: Option<i64>,
    #[serde(default)]
    pub index: Option<String>,
}

/// One entry of a handle's submission feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    #[serde(default)]
    pub problem: SubmissionProblem,
    /// Missing while the submission is still being judged.
    #[serde(default)]
    pub verdict: Option<String>,
    pub creation_time_seconds: i64,
}

impl Submission {
    /// Problem key of an accepted submission with a complete problem reference.
    pub fn accepted_key(&self) -> Option<ProblemKey> {
        if self.verdict.as_deref() != Some(ACCEPTED) {
            return None;
        }
        let contest_id = self.problem.contest_id?;
        let index = self.problem.index.as_deref().filter(|i| !i.is_empty())?;
        Some(ProblemKey::new(contest_id, index))
    }
}

/// Evidence that a problem was solved, relative to the session start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolveRecord {
    pub solved_at: DateTime<Utc>,
    pub time_from_start_sec: i64,
}

impl SolveRecord {
    /// Record for a submission at `submitted_epoch`, or `None` if it predates `start`.
    pub fn after_start(start: DateTime<Utc>, submitted_epoch: i64) -> Option<Self> {
        let elapsed = submitted_epoch - start.timestamp();
        if elapsed < 0 {
            return None;
        }
        let solved_at = DateTime::from_timestamp(submitted_epoch, 0)?;
        Some(SolveRecord {
            solved_at,
            time_from_start_sec: elapsed,
        })
    }
}

/// Problem key -> solve record (`None` = not solved yet) for one participant.
pub type ProblemSolves = BTreeMap<ProblemKey, Option<SolveRecord>>;

/// Handle -> that participant's solves, for a duel room.
pub type DuelSolves = BTreeMap<String, ProblemSolves>;

/// Every problem of the set, unsolved.
pub fn empty_solves(problems: &[SelectedProblem]) -> ProblemSolves {
    problems.iter().map(|p| (p.key().clone(), None)).collect()
}

/// Earliest accepted, at-or-after-start submission for each problem in `scope`.
///
/// Builds a fresh table: problems without evidence come back as `None` whatever
/// they were before.
pub fn earliest_accepted(
    scope: &ProblemSolves,
    start: DateTime<Utc>,
    submissions: &[Submission],
) -> ProblemSolves {
    let mut fresh: ProblemSolves = scope.keys().map(|k| (k.clone(), None)).collect();

    for sub in submissions {
        let Some(key) = sub.accepted_key() else {
            continue;
        };
        let Some(slot) = fresh.get_mut(&key) else {
            continue;
        };
        let Some(record) = SolveRecord::after_start(start, sub.creation_time_seconds) else {
            continue;
        };
        if is_improvement(slot, &record) {
            *slot = Some(record);
        }
    }

    fresh
}

/// Fold `fresh` evidence into `stored`, keeping the earliest record per problem.
/// Never clears a stored record. Returns how many slots changed.
pub fn merge_earliest(stored: &mut ProblemSolves, fresh: &ProblemSolves) -> usize {
    let mut changed = 0;
    for (key, record) in fresh {
        let Some(record) = record else {
            continue;
        };
        let slot = stored.entry(key.clone()).or_insert(None);
        if is_improvement(slot, record) {
            *slot = Some(*record);
            changed += 1;
        }
    }
    changed
}

fn is_improvement(slot: &Option<SolveRecord>, candidate: &SolveRecord) -> bool {
    match slot {
        None => true,
        Some(existing) => candidate.solved_at < existing.solved_at,
    }
}

/// Number of problems with a record.
pub fn solved_count(solves: &ProblemSolves) -> usize {
    solves.values().filter(|r| r.is_some()).count()
}
