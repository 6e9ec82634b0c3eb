use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Lowest rating the judge assigns.
pub const RATING_FLOOR: i32 = 800;
/// Highest rating the judge assigns.
pub const RATING_CEILING: i32 = 3500;

pub const DEFAULT_RATING_MIN: i32 = 800;
pub const DEFAULT_RATING_MAX: i32 = 2400;
pub const DEFAULT_NUM_PROBLEMS: usize = 6;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    Duel,
    Solo,
}

impl Mode {
    pub fn max_problems(&self) -> usize {
        match self {
            Mode::Duel => 7,
            Mode::Solo => 15,
        }
    }
}

/// Resolved, clamped inputs for one problem selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionParams {
    pub rating_min: i32,
    pub rating_max: i32,
    pub num_problems: usize,
    pub include_tags: Vec<String>,
    pub exclude_tags: Vec<String>,
}

impl SelectionParams {
    /// Resolve loosely-typed request fields. Never fails: bad numbers fall
    /// back to defaults and out-of-range numbers are clamped.
    pub fn resolve(
        mode: Mode,
        rating_min: Option<&Value>,
        rating_max: Option<&Value>,
        num_problems: Option<&Value>,
        include_tags: Option<&Value>,
        exclude_tags: Option<&Value>,
    ) -> Self {
        let (rating_min, rating_max) =
            resolve_bounds(lenient_int(rating_min), lenient_int(rating_max));
        SelectionParams {
            rating_min,
            rating_max,
            num_problems: resolve_problem_count(lenient_int(num_problems), mode),
            include_tags: lenient_tags(include_tags),
            exclude_tags: lenient_tags(exclude_tags),
        }
    }

    /// Number of distinct ratings covered, inclusive of both ends.
    pub fn breadth(&self) -> i64 {
        self.rating_max as i64 - self.rating_min as i64 + 1
    }
}

/// Default, clamp into the judge's rating scale, then swap if inverted.
pub fn resolve_bounds(min: Option<i64>, max: Option<i64>) -> (i32, i32) {
    let clamp = |v: i64| v.clamp(RATING_FLOOR as i64, RATING_CEILING as i64) as i32;
    let min = clamp(min.unwrap_or(DEFAULT_RATING_MIN as i64));
    let max = clamp(max.unwrap_or(DEFAULT_RATING_MAX as i64));
    if min > max { (max, min) } else { (min, max) }
}

pub fn resolve_problem_count(n: Option<i64>, mode: Mode) -> usize {
    match n {
        Some(n) => n.clamp(1, mode.max_problems() as i64) as usize,
        None => DEFAULT_NUM_PROBLEMS.min(mode.max_problems()),
    }
}

/// Integer from a JSON number (truncated) or from the leading digits of a string.
pub fn lenient_int(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => leading_int(s),
        _ => None,
    }
}

fn leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (sign, digits) = match s.as_bytes().first()? {
        b'-' => (-1, &s[1..]),
        b'+' => (1, &s[1..]),
        _ => (1, s),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    // Overlong digit runs saturate rather than fall back to a default.
    Some(digits[..end].bytes().fold(0i64, |acc, b| {
        acc.saturating_mul(10).saturating_add(sign * i64::from(b - b'0'))
    }))
}

/// Lowercased string elements of a JSON array; anything else is treated as empty.
pub fn lenient_tags(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}
