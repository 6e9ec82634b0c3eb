use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::bands::SelectedProblem;
use crate::params::SelectionParams;

/// Current time at whole-second precision, matching the judge's timestamps.
pub fn now_seconds() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0)
}

/// A two-player room. The problem set never changes; `start_time` is set once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuelRoom {
    pub code: String,
    pub handle1: String,
    pub handle2: String,
    pub rating_min: i32,
    pub rating_max: i32,
    pub num_problems: usize,
    pub include_tags: Vec<String>,
    pub exclude_tags: Vec<String>,
    pub problems: Vec<SelectedProblem>,
    pub created_at: DateTime<Utc>,
    pub start_time: Option<DateTime<Utc>>,
}

impl DuelRoom {
    /// A room in the created state. `code` is assigned when stored.
    pub fn new(
        handle1: String,
        handle2: String,
        params: &SelectionParams,
        problems: Vec<SelectedProblem>,
        created_at: DateTime<Utc>,
    ) -> Self {
        DuelRoom {
            code: String::new(),
            handle1,
            handle2,
            rating_min: params.rating_min,
            rating_max: params.rating_max,
            num_problems: problems.len(),
            include_tags: params.include_tags.clone(),
            exclude_tags: params.exclude_tags.clone(),
            problems,
            created_at,
            start_time: None,
        }
    }

    pub fn handles(&self) -> [&str; 2] {
        [self.handle1.as_str(), self.handle2.as_str()]
    }

    pub fn is_started(&self) -> bool {
        self.start_time.is_some()
    }

    /// Start the clock. Returns false (and changes nothing) if already started.
    pub fn start(&mut self, now: DateTime<Utc>) -> bool {
        if self.start_time.is_some() {
            return false;
        }
        self.start_time = Some(now);
        true
    }
}

/// A one-player practice set; the clock starts at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoloSession {
    pub session_id: String,
    pub handle: String,
    pub rating_min: i32,
    pub rating_max: i32,
    pub num_problems: usize,
    pub include_tags: Vec<String>,
    pub exclude_tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub start_time: DateTime<Utc>,
    pub problems: Vec<SelectedProblem>,
}

impl SoloSession {
    pub fn new(
        handle: String,
        params: &SelectionParams,
        problems: Vec<SelectedProblem>,
        now: DateTime<Utc>,
    ) -> Self {
        SoloSession {
            session_id: String::new(),
            handle,
            rating_min: params.rating_min,
            rating_max: params.rating_max,
            num_problems: problems.len(),
            include_tags: params.include_tags.clone(),
            exclude_tags: params.exclude_tags.clone(),
            created_at: now,
            start_time: now,
            problems,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> SelectionParams {
        SelectionParams {
            rating_min: 800,
            rating_max: 1400,
            num_problems: 3,
            include_tags: vec!["dp".into()],
            exclude_tags: vec![],
        }
    }

    #[test]
    fn start_is_set_once() {
        let created = DateTime::from_timestamp(1_000, 0).unwrap();
        let mut room = DuelRoom::new("a".into(), "b".into(), &params(), vec![], created);
        assert!(!room.is_started());

        let first = DateTime::from_timestamp(2_000, 0).unwrap();
        assert!(room.start(first));
        assert!(!room.start(DateTime::from_timestamp(3_000, 0).unwrap()));
        assert_eq!(room.start_time, Some(first));
    }

    #[test]
    fn counts_selected_not_requested() {
        let now = now_seconds();
        let solo = SoloSession::new("a".into(), &params(), vec![], now);
        assert_eq!(solo.num_problems, 0);
        assert_eq!(solo.start_time, solo.created_at);
    }

    #[test]
    fn now_has_no_fraction() {
        assert_eq!(now_seconds().timestamp_subsec_nanos(), 0);
    }

    #[test]
    fn unstarted_room_serializes_null_start() {
        let room = DuelRoom::new(
            "a".into(),
            "b".into(),
            &params(),
            vec![],
            DateTime::from_timestamp(0, 0).unwrap(),
        );
        let json = serde_json::to_value(&room).unwrap();
        assert!(json["startTime"].is_null());
        assert_eq!(json["includeTags"][0], "dp");
    }
}
