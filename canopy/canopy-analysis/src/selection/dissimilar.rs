//! Most-dissimilar subset search.
//!
//! Exhaustive over all `C(n, k)` index combinations of a precomputed
//! [`DistanceMatrix`], guarded by a ceiling on the search space that is
//! checked before any distance is computed.

use super::combinations::{Combinations, binomial};
use crate::distance::{DistanceEngine, DistanceMatrix};
use canopy_core::ast::GeneralAst;
use canopy_core::config::DEFAULT_MAX_COMBINATIONS;
use canopy_core::error::{CanopyError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

/// What "most dissimilar" means for a subset
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SelectionObjective {
    /// Largest smallest pairwise distance
    #[default]
    MaximizeMinimumDistance,
    /// Largest total pairwise distance
    MaximizeDistanceSum,
}

impl SelectionObjective {
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectionObjective::MaximizeMinimumDistance => "maximizeMinimumDistance",
            SelectionObjective::MaximizeDistanceSum => "maximizeDistanceSum",
        }
    }

    /// Score of one combination; `k >= 2` so there is at least one pair.
    fn score(&self, combination: &[usize], matrix: &DistanceMatrix) -> f64 {
        let pairs = combination.iter().enumerate().flat_map(|(pos, &i)| {
            combination[pos + 1..].iter().map(move |&j| matrix.get(i, j))
        });
        match self {
            SelectionObjective::MaximizeMinimumDistance => pairs.fold(f64::INFINITY, f64::min),
            SelectionObjective::MaximizeDistanceSum => pairs.sum(),
        }
    }
}

impl fmt::Display for SelectionObjective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Answer for requests that need no search, if any.
///
/// `k == 0` or `k > n` selects nothing, `k == n` selects everything and
/// `k == 1` selects the first element, since every singleton scores the same.
fn trivial_selection(n: usize, k: usize) -> Option<Vec<usize>> {
    if k == 0 || k > n {
        Some(Vec::new())
    } else if k == n {
        Some((0..n).collect())
    } else if k == 1 {
        Some(vec![0])
    } else {
        None
    }
}

/// Fail with [`CanopyError::TooManyCombinations`] if `C(n, k)` exceeds `limit`.
pub fn check_search_space(n: usize, k: usize, limit: u64) -> Result<()> {
    let combinations = binomial(n, k);
    if !combinations.is_finite() || combinations > limit as f64 {
        warn!(
            "Refusing to search C({}, {}) = {} combinations (limit {})",
            n, k, combinations, limit
        );
        return Err(CanopyError::too_many_combinations(combinations, limit));
    }
    Ok(())
}

/// Indices of the best size-`k` subset under `objective`.
///
/// Ties keep the first combination found in lexicographic order.
pub fn select_indices(
    k: usize,
    matrix: &DistanceMatrix,
    objective: SelectionObjective,
    limit: u64,
) -> Result<Vec<usize>> {
    let n = matrix.len();
    if let Some(selection) = trivial_selection(n, k) {
        return Ok(selection);
    }
    check_search_space(n, k, limit)?;

    let mut combinations = Combinations::new(n, k);
    let mut best: Option<(f64, Vec<usize>)> = None;
    let mut searched = 0u64;

    while let Some(combination) = combinations.next_combination() {
        searched += 1;
        let score = objective.score(combination, matrix);
        match &mut best {
            Some((best_score, best_combination)) => {
                if score > *best_score {
                    *best_score = score;
                    best_combination.copy_from_slice(combination);
                }
            }
            None => best = Some((score, combination.to_vec())),
        }
    }

    debug!(
        "Searched {} combinations of {} out of {} for {}",
        searched, k, n, objective
    );

    Ok(best.map(|(_, combination)| combination).unwrap_or_default())
}

/// Subset of size `k` maximizing the smallest pairwise distance
pub fn maximize_minimum_distance(k: usize, matrix: &DistanceMatrix) -> Result<Vec<usize>> {
    select_indices(
        k,
        matrix,
        SelectionObjective::MaximizeMinimumDistance,
        DEFAULT_MAX_COMBINATIONS,
    )
}

/// Subset of size `k` maximizing the sum of pairwise distances
pub fn maximize_distance_sum(k: usize, matrix: &DistanceMatrix) -> Result<Vec<usize>> {
    select_indices(
        k,
        matrix,
        SelectionObjective::MaximizeDistanceSum,
        DEFAULT_MAX_COMBINATIONS,
    )
}

/// Pick the `k` most mutually dissimilar programs out of `trees`.
///
/// Returns copies of the selected trees in input order.
///
/// # Errors
///
/// [`CanopyError::TooManyCombinations`] when `C(n, k)` exceeds
/// `max_combinations`; this is checked before any distance is computed.
pub fn select_dissimilar(
    trees: &[GeneralAst],
    k: usize,
    objective: SelectionObjective,
    engine: &DistanceEngine,
    max_combinations: u64,
) -> Result<Vec<GeneralAst>> {
    let indices =
        select_dissimilar_indices(trees, k, objective, engine, max_combinations, || false)?;
    Ok(indices.into_iter().map(|i| trees[i].clone()).collect())
}

/// Index form of [`select_dissimilar`] that stops with
/// [`CanopyError::Cancelled`] once `cancelled` returns true.
pub fn select_dissimilar_indices<S>(
    trees: &[GeneralAst],
    k: usize,
    objective: SelectionObjective,
    engine: &DistanceEngine,
    max_combinations: u64,
    cancelled: S,
) -> Result<Vec<usize>>
where
    S: Fn() -> bool + Sync,
{
    let n = trees.len();
    if let Some(selection) = trivial_selection(n, k) {
        return Ok(selection);
    }
    check_search_space(n, k, max_combinations)?;

    let matrix = engine.matrix_until(trees, &cancelled)?;
    if cancelled() {
        return Err(CanopyError::Cancelled);
    }
    select_indices(k, &matrix, objective, max_combinations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::DistanceAlgorithm;
    use canopy_core::ast::{Actor, EventListener, Statement};

    fn three_element_matrix() -> DistanceMatrix {
        DistanceMatrix::from_rows(vec![
            vec![0.0, 0.0, 1.0],
            vec![0.0, 0.0, 0.0],
            vec![1.0, 0.0, 0.0],
        ])
        .unwrap()
    }

    fn four_element_matrix() -> DistanceMatrix {
        DistanceMatrix::from_rows(vec![
            vec![0.0, 0.0, 1000.0, 50.0],
            vec![0.0, 0.0, 1000.0, 50.0],
            vec![1000.0, 1000.0, 0.0, 50.0],
            vec![50.0, 50.0, 50.0, 0.0],
        ])
        .unwrap()
    }

    #[test]
    fn test_maximize_minimum_distance() {
        assert_eq!(maximize_minimum_distance(2, &three_element_matrix()).unwrap(), vec![0, 2]);
    }

    #[test]
    fn test_maximize_distance_sum() {
        assert_eq!(maximize_distance_sum(3, &four_element_matrix()).unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_first_found_wins_ties() {
        let uniform = DistanceMatrix::from_rows(vec![
            vec![0.0, 1.0, 1.0],
            vec![1.0, 0.0, 1.0],
            vec![1.0, 1.0, 0.0],
        ])
        .unwrap();
        assert_eq!(maximize_minimum_distance(2, &uniform).unwrap(), vec![0, 1]);
        assert_eq!(maximize_distance_sum(2, &uniform).unwrap(), vec![0, 1]);
    }

    #[test]
    fn test_degenerate_requests() {
        let matrix = four_element_matrix();
        assert_eq!(maximize_distance_sum(4, &matrix).unwrap(), vec![0, 1, 2, 3]);
        assert!(maximize_distance_sum(5, &matrix).unwrap().is_empty());
        assert!(maximize_distance_sum(0, &matrix).unwrap().is_empty());
        assert_eq!(maximize_minimum_distance(1, &matrix).unwrap(), vec![0]);
        assert!(maximize_minimum_distance(2, &DistanceMatrix::zeros(0)).unwrap().is_empty());
    }

    #[test]
    fn test_search_space_ceiling() {
        let matrix = DistanceMatrix::zeros(30);
        // C(30, 15) = 155117520
        let err = maximize_distance_sum(15, &matrix).unwrap_err();
        assert!(err.is_too_many_combinations());
        match err {
            CanopyError::TooManyCombinations { combinations, limit } => {
                assert_eq!(combinations, 155_117_520.0);
                assert_eq!(limit, DEFAULT_MAX_COMBINATIONS);
            }
            other => panic!("unexpected error: {}", other),
        }

        assert!(check_search_space(30, 2, DEFAULT_MAX_COMBINATIONS).is_ok());
        assert!(check_search_space(10, 5, 100).is_err());
        assert!(check_search_space(10, 5, 252).is_ok());
    }

    #[test]
    fn test_ceiling_checked_before_distances() {
        let trees = vec![GeneralAst::default(); 40];
        let err = select_dissimilar_indices(
            &trees,
            20,
            SelectionObjective::MaximizeDistanceSum,
            &DistanceEngine::default(),
            DEFAULT_MAX_COMBINATIONS,
            || panic!("distances must not be computed"),
        )
        .unwrap_err();
        assert!(err.is_too_many_combinations());
    }

    #[test]
    fn test_select_dissimilar_trees() {
        let program = |name: &str| {
            GeneralAst::new(vec![Actor::new().with_listener(EventListener::new(
                "start",
                vec![],
                Statement::call(name, vec![]),
            ))])
        };
        let looped = GeneralAst::new(vec![Actor::new().with_listener(EventListener::new(
            "click",
            vec![],
            Statement::repeat(None, Statement::sequence(vec![Statement::call("spin", vec![])])),
        ))]);
        let trees = vec![program("move"), program("move"), looped.clone()];

        let selected = select_dissimilar(
            &trees,
            2,
            SelectionObjective::MaximizeMinimumDistance,
            &DistanceEngine::new(DistanceAlgorithm::TreeEdit),
            DEFAULT_MAX_COMBINATIONS,
        )
        .unwrap();

        assert_eq!(selected, vec![program("move"), looped]);
    }

    #[test]
    fn test_objective_serde() {
        let json = serde_json::to_string(&SelectionObjective::MaximizeDistanceSum).unwrap();
        assert_eq!(json, "\"maximizeDistanceSum\"");
    }
}
