use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::params::{Mode, SelectionParams};
use crate::session::{DuelRoom, SoloSession};
use crate::solves::{DuelSolves, ProblemSolves};

/// Body of `POST /api/create-room`. Numeric fields are taken as loosely as
/// the web form sends them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomRequest {
    #[serde(default)]
    pub handle1: Option<String>,
    #[serde(default)]
    pub handle2: Option<String>,
    #[serde(default)]
    pub rating_min: Option<Value>,
    #[serde(default)]
    pub rating_max: Option<Value>,
    #[serde(default)]
    pub num_problems: Option<Value>,
    #[serde(default)]
    pub include_tags: Option<Value>,
    #[serde(default)]
    pub exclude_tags: Option<Value>,
}

impl CreateRoomRequest {
    pub fn selection(&self) -> SelectionParams {
        SelectionParams::resolve(
            Mode::Duel,
            self.rating_min.as_ref(),
            self.rating_max.as_ref(),
            self.num_problems.as_ref(),
            self.include_tags.as_ref(),
            self.exclude_tags.as_ref(),
        )
    }
}

/// Body of `POST /api/solo-set`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoloSetRequest {
    #[serde(default)]
    pub handle: Option<String>,
    #[serde(default)]
    pub rating_min: Option<Value>,
    #[serde(default)]
    pub rating_max: Option<Value>,
    #[serde(default)]
    pub num_problems: Option<Value>,
    #[serde(default)]
    pub include_tags: Option<Value>,
    #[serde(default)]
    pub exclude_tags: Option<Value>,
}

impl SoloSetRequest {
    pub fn selection(&self) -> SelectionParams {
        SelectionParams::resolve(
            Mode::Solo,
            self.rating_min.as_ref(),
            self.rating_max.as_ref(),
            self.num_problems.as_ref(),
            self.include_tags.as_ref(),
            self.exclude_tags.as_ref(),
        )
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomCodeRequest {
    #[serde(default)]
    pub room_code: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionIdRequest {
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HandleQuery {
    #[serde(default)]
    pub handle: Option<String>,
}

/// Room state plus every participant's solves.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomResponse {
    pub room_code: String,
    pub room: DuelRoom,
    pub solves: DuelSolves,
}

/// Solo session flattened together with its solves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoloResponse {
    #[serde(flatten)]
    pub session: SoloSession,
    pub solves: ProblemSolves,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidHandle {
    pub valid: bool,
    pub handle: String,
    pub rating: Option<i32>,
    pub rank: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolvedResponse {
    pub handle: String,
    pub solved_count: usize,
    pub solved: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

/// Error payload for every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn create_room_accepts_strings_and_junk() {
        let req: CreateRoomRequest = serde_json::from_value(json!({
            "handle1": "tourist",
            "handle2": "Petr",
            "ratingMin": "1200",
            "ratingMax": 1900,
            "numProblems": "lots",
            "includeTags": ["DP"],
            "excludeTags": "graphs"
        }))
        .unwrap();
        let p = req.selection();
        assert_eq!((p.rating_min, p.rating_max, p.num_problems), (1200, 1900, 6));
        assert_eq!(p.include_tags, vec!["dp"]);
        assert!(p.exclude_tags.is_empty());
    }

    #[test]
    fn solo_allows_more_problems() {
        let req: SoloSetRequest =
            serde_json::from_value(json!({"handle": "x", "numProblems": 12})).unwrap();
        assert_eq!(req.selection().num_problems, 12);
    }

    #[test]
    fn error_body_omits_empty_details() {
        let body = ErrorBody {
            error: "Room not found".into(),
            details: vec![],
        };
        assert_eq!(
            serde_json::to_value(body).unwrap(),
            json!({"error": "Room not found"})
        );
    }
}
