use std::borrow::Borrow;
use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Problem identifier in the judge's namespace, rendered as `"{contestId}-{index}"`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProblemKey(String);

impl ProblemKey {
    pub fn new(contest_id: i64, index: &str) -> Self {
        ProblemKey(format!("{}-{}", contest_id, index))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProblemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ProblemKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// A catalog entry as the judge returns it. Either half of the key may be missing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawProblem {
    #[serde(default)]
    pub contest_id: Option<i64>,
    #[serde(default)]
    pub index: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub rating: Option<i32>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemStatistic {
    pub contest_id: i64,
    pub index: String,
    #[serde(default)]
    pub solved_count: u64,
}

/// Full `problemset.problems` result: the catalog plus per-problem solve counts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Problemset {
    #[serde(default)]
    pub problems: Vec<RawProblem>,
    #[serde(default)]
    pub problem_statistics: Vec<ProblemStatistic>,
}

/// A keyed catalog problem with its popularity attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Problem {
    pub key: ProblemKey,
    pub contest_id: i64,
    pub index: String,
    pub name: String,
    pub rating: Option<i32>,
    pub tags: Vec<String>,
    pub solved_count: u64,
}

impl Problem {
    /// True if any of the problem's tags (case-insensitive) is in `wanted`.
    /// `wanted` must already be lowercase.
    pub fn has_any_tag(&self, wanted: &HashSet<String>) -> bool {
        self.tags.iter().any(|t| wanted.contains(&t.to_lowercase()))
    }
}

/// Join the catalog with its statistics, dropping entries without a usable key.
/// Output keeps catalog order.
pub fn index_catalog(problemset: &Problemset) -> Vec<Problem> {
    let solved_by_key: HashMap<ProblemKey, u64> = problemset
        .problem_statistics
        .iter()
        .map(|s| (ProblemKey::new(s.contest_id, &s.index), s.solved_count))
        .collect();

    problemset
        .problems
        .iter()
        .filter_map(|p| {
            let contest_id = p.contest_id?;
            let index = p.index.as_deref().filter(|i| !i.is_empty())?;
            let key = ProblemKey::new(contest_id, index);
            let solved_count = solved_by_key.get(&key).copied().unwrap_or(0);
            Some(Problem {
                key,
                contest_id,
                index: index.to_string(),
                name: p.name.clone(),
                rating: p.rating,
                tags: p.tags.clone(),
                solved_count,
            })
        })
        .collect()
}
