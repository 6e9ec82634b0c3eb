use std::collections::HashSet;

use rand::RngExt;
use rand::rngs::{StdRng, ThreadRng};
use serde::{Deserialize, Serialize};

use crate::catalog::{Problem, ProblemKey};
use crate::params::SelectionParams;

/// Only the most-solved problems of a band are eligible for the draw.
pub const TOP_CANDIDATES: usize = 50;

/// Source of the uniform draw inside a band.
pub trait Pick {
    /// Returns an index in `0..len`. `len` is never zero.
    fn pick(&mut self, len: usize) -> usize;
}

impl Pick for StdRng {
    fn pick(&mut self, len: usize) -> usize {
        self.random_range(0..len)
    }
}

impl Pick for ThreadRng {
    fn pick(&mut self, len: usize) -> usize {
        self.random_range(0..len)
    }
}

/// A rating sub-range, inclusive on both ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Band {
    pub start: i32,
    pub end: i32,
}

impl Band {
    pub fn contains(&self, rating: i32) -> bool {
        self.start <= rating && rating <= self.end
    }
}

/// A chosen problem together with the band it was drawn from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedProblem {
    #[serde(flatten)]
    pub problem: Problem,
    pub band_start: i32,
    pub band_end: i32,
}

impl SelectedProblem {
    pub fn key(&self) -> &ProblemKey {
        &self.problem.key
    }
}

fn floor100(x: i32) -> i32 {
    x.div_euclid(100) * 100
}

fn ceil100(x: i32) -> i32 {
    (x + 99).div_euclid(100) * 100
}

/// Split `[rating_min, rating_max]` into `count` bands widened to hundreds.
///
/// Adjacent bands may overlap after widening. The last band always ends at
/// `rating_max`.
pub fn bands(rating_min: i32, rating_max: i32, count: usize) -> Vec<Band> {
    if count == 0 {
        return Vec::new();
    }
    let step = (rating_max - rating_min + 1) as f64 / count as f64;
    let lo = rating_min as f64;

    (0..count)
        .map(|i| {
            let start = (lo + i as f64 * step).round() as i32;
            let end = if i == count - 1 {
                rating_max
            } else {
                (lo + (i + 1) as f64 * step - 1.0).round() as i32
            };
            Band {
                start: floor100(start).max(rating_min),
                end: ceil100(end).min(rating_max),
            }
        })
        .collect()
}

/// Pick at most one problem per band.
///
/// Problems in any of the `excluded` sets are never chosen. Bands with no
/// candidate are skipped, so the result may be shorter than requested.
pub fn select(
    catalog: &[Problem],
    params: &SelectionParams,
    excluded: &[&HashSet<ProblemKey>],
    picker: &mut dyn Pick,
) -> Vec<SelectedProblem> {
    let include: HashSet<String> = params.include_tags.iter().map(|t| t.to_lowercase()).collect();
    let exclude: HashSet<String> = params.exclude_tags.iter().map(|t| t.to_lowercase()).collect();

    let filtered: Vec<(&Problem, i32)> = catalog
        .iter()
        .filter_map(|p| {
            let rating = p.rating?;
            if rating < params.rating_min || rating > params.rating_max {
                return None;
            }
            if !include.is_empty() && !p.has_any_tag(&include) {
                return None;
            }
            if p.has_any_tag(&exclude) {
                return None;
            }
            if excluded.iter().any(|set| set.contains(&p.key)) {
                return None;
            }
            Some((p, rating))
        })
        .collect();

    let mut selected = Vec::new();
    if filtered.is_empty() {
        return selected;
    }
    let mut taken: HashSet<&ProblemKey> = HashSet::new();

    for band in bands(params.rating_min, params.rating_max, params.num_problems) {
        let mut candidates: Vec<&Problem> = filtered
            .iter()
            .filter(|(p, rating)| band.contains(*rating) && !taken.contains(&p.key))
            .map(|(p, _)| *p)
            .collect();
        if candidates.is_empty() {
            continue;
        }

        candidates.sort_by(|a, b| b.solved_count.cmp(&a.solved_count));
        candidates.truncate(TOP_CANDIDATES);
        let chosen = candidates[picker.pick(candidates.len())];

        taken.insert(&chosen.key);
        selected.push(SelectedProblem {
            problem: chosen.clone(),
            band_start: band.start,
            band_end: band.end,
        });
    }

    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    /// Always takes the most-solved candidate.
    struct First;

    impl Pick for First {
        fn pick(&mut self, _len: usize) -> usize {
            0
        }
    }

    /// Always takes the least-solved eligible candidate.
    struct Last;

    impl Pick for Last {
        fn pick(&mut self, len: usize) -> usize {
            len - 1
        }
    }

    fn problem(contest_id: i64, index: &str, rating: Option<i32>, solved: u64, tags: &[&str]) -> Problem {
        Problem {
            key: ProblemKey::new(contest_id, index),
            contest_id,
            index: index.to_string(),
            name: format!("{}{}", contest_id, index),
            rating,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            solved_count: solved,
        }
    }

    fn params(min: i32, max: i32, n: usize) -> SelectionParams {
        SelectionParams {
            rating_min: min,
            rating_max: max,
            num_problems: n,
            include_tags: vec![],
            exclude_tags: vec![],
        }
    }

    fn b(start: i32, end: i32) -> Band {
        Band { start, end }
    }

    #[test]
    fn three_bands_from_800_to_1400() {
        assert_eq!(
            bands(800, 1400, 3),
            vec![b(800, 1000), b(1000, 1200), b(1200, 1400)]
        );
    }

    #[test]
    fn default_range_six_bands() {
        // step = 1601 / 6 = 266.83
        assert_eq!(
            bands(800, 2400, 6),
            vec![
                b(800, 1100),
                b(1000, 1400),
                b(1300, 1600),
                b(1600, 1900),
                b(1800, 2200),
                b(2100, 2400),
            ]
        );
    }

    #[test]
    fn bands_are_clamped_to_range() {
        let out = bands(850, 1250, 2);
        assert_eq!(out, vec![b(850, 1100), b(1000, 1250)]);
        for band in bands(1234, 3456, 7) {
            assert!(band.start >= 1234 && band.end <= 3456);
            assert!(band.start <= band.end);
        }
    }

    #[test]
    fn single_rating_range() {
        assert_eq!(bands(1500, 1500, 3), vec![b(1500, 1500); 3]);
    }

    #[test]
    fn one_problem_per_band_in_band() {
        let catalog = vec![
            problem(1, "A", Some(800), 10, &[]),
            problem(2, "A", Some(1100), 10, &[]),
            problem(3, "A", Some(1400), 10, &[]),
        ];
        let out = select(&catalog, &params(800, 1400, 3), &[], &mut First);
        assert_eq!(out.len(), 3);
        for sp in &out {
            let rating = sp.problem.rating.unwrap();
            assert!(sp.band_start <= rating && rating <= sp.band_end);
        }
        let keys: HashSet<_> = out.iter().map(|s| s.key().clone()).collect();
        assert_eq!(keys.len(), 3);
    }

    #[test]
    fn unrated_and_out_of_range_never_selected() {
        let catalog = vec![
            problem(1, "A", None, 99999, &[]),
            problem(2, "A", Some(3000), 99999, &[]),
            problem(3, "A", Some(1000), 1, &[]),
        ];
        let out = select(&catalog, &params(800, 1400, 3), &[], &mut First);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].key().as_str(), "3-A");
    }

    #[test]
    fn band_with_only_solved_problem_is_skipped() {
        let catalog = vec![
            problem(1500, "A", Some(1500), 500, &[]),
            problem(10, "B", Some(1800), 10, &[]),
        ];
        let solved1: HashSet<ProblemKey> = [ProblemKey::new(1500, "A")].into_iter().collect();
        let solved2: HashSet<ProblemKey> = HashSet::new();
        let out = select(&catalog, &params(1400, 1999, 2), &[&solved1, &solved2], &mut First);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].key().as_str(), "10-B");
    }

    #[test]
    fn either_participant_excludes() {
        let catalog = vec![problem(1, "A", Some(800), 5, &[]), problem(2, "A", Some(800), 5, &[])];
        let solved1: HashSet<ProblemKey> = [ProblemKey::new(1, "A")].into_iter().collect();
        let solved2: HashSet<ProblemKey> = [ProblemKey::new(2, "A")].into_iter().collect();
        let out = select(&catalog, &params(800, 900, 1), &[&solved1, &solved2], &mut First);
        assert!(out.is_empty());
    }

    #[test]
    fn include_and_exclude_tags() {
        let catalog = vec![
            problem(1, "A", Some(800), 100, &["Greedy", "math"]),
            problem(2, "A", Some(800), 90, &["dp"]),
            problem(3, "A", Some(800), 80, &["greedy"]),
        ];
        let mut p = params(800, 900, 3);
        p.include_tags = vec!["greedy".into()];
        p.exclude_tags = vec!["MATH".into()];
        let out = select(&catalog, &p, &[], &mut First);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].key().as_str(), "3-A");
    }

    #[test]
    fn prefers_most_solved_within_top_slice() {
        let mut catalog: Vec<Problem> = (0..60)
            .map(|i| problem(100 + i, "A", Some(1000), i as u64, &[]))
            .collect();
        catalog.reverse();

        let top = select(&catalog, &params(800, 1200, 1), &[], &mut First);
        assert_eq!(top[0].problem.solved_count, 59);

        // The last eligible problem is the 50th most solved, never below.
        let bottom = select(&catalog, &params(800, 1200, 1), &[], &mut Last);
        assert_eq!(bottom[0].problem.solved_count, 10);
    }

    #[test]
    fn overlapping_bands_do_not_repeat() {
        // 1000 sits in both of the first two bands.
        let catalog = vec![problem(1, "A", Some(1000), 10, &[])];
        let out = select(&catalog, &params(800, 1400, 3), &[], &mut First);
        assert_eq!(out.len(), 1);
        assert_eq!((out[0].band_start, out[0].band_end), (800, 1000));
    }

    #[test]
    fn seeded_selection_is_reproducible() {
        let catalog: Vec<Problem> = (0..200)
            .map(|i| problem(i, "A", Some(800 + (i as i32 % 20) * 100), (i * 7 % 13) as u64, &[]))
            .collect();
        let p = params(800, 2700, 7);
        let a = select(&catalog, &p, &[], &mut StdRng::seed_from_u64(7));
        let b = select(&catalog, &p, &[], &mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
        assert!(a.len() <= 7);
        let keys: HashSet<_> = a.iter().map(|s| s.key().clone()).collect();
        assert_eq!(keys.len(), a.len());
    }
}
