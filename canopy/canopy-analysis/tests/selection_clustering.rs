//! Selector and clusterer behavior on programs and generated matrices.

mod common;

use canopy_analysis::clustering::{cluster_indices, group};
use canopy_analysis::distance::{DistanceAlgorithm, DistanceEngine, DistanceMatrix};
use canopy_analysis::selection::{
    SelectionObjective, maximize_distance_sum, maximize_minimum_distance, select_dissimilar,
    select_indices,
};
use canopy_core::DEFAULT_MAX_COMBINATIONS;
use common::{arb_ast, sample_trees};
use proptest::prelude::*;

fn arb_matrix() -> impl Strategy<Value = DistanceMatrix> {
    (1usize..8).prop_flat_map(|n| {
        prop::collection::vec(0u32..100, n * n).prop_map(move |raw| {
            let mut matrix = DistanceMatrix::zeros(n);
            for i in 0..n {
                for j in (i + 1)..n {
                    matrix.set(i, j, raw[i * n + j] as f64);
                }
            }
            matrix
        })
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_clusters_partition_input(matrix in arb_matrix(), target in 1usize..10) {
        let groups = cluster_indices(&matrix, target);
        prop_assert_eq!(groups.len(), target.min(matrix.len()));

        let mut members: Vec<usize> = groups.iter().flatten().copied().collect();
        members.sort_unstable();
        prop_assert_eq!(members, (0..matrix.len()).collect::<Vec<_>>());
        prop_assert!(groups.iter().all(|g| !g.is_empty()));
    }

    #[test]
    fn prop_group_trees_partition(
        trees in prop::collection::vec(arb_ast(), 0..6),
        target in 1usize..7,
    ) {
        let groups = group(&trees, target, &DistanceEngine::default()).unwrap();
        prop_assert_eq!(groups.len(), target.min(trees.len()));
        prop_assert_eq!(groups.iter().map(Vec::len).sum::<usize>(), trees.len());
    }

    #[test]
    fn prop_selection_is_optimal(matrix in arb_matrix(), k in 2usize..5) {
        prop_assume!(k < matrix.len());
        let chosen = maximize_distance_sum(k, &matrix).unwrap();
        prop_assert_eq!(chosen.len(), k);

        let sum = |indices: &[usize]| -> f64 {
            let mut total = 0.0;
            for (pos, &i) in indices.iter().enumerate() {
                for &j in &indices[pos + 1..] {
                    total += matrix.get(i, j);
                }
            }
            total
        };
        let best = sum(&chosen);
        for combination in canopy_analysis::selection::Combinations::new(matrix.len(), k) {
            prop_assert!(sum(&combination) <= best);
        }
    }
}

#[test]
fn test_reference_matrices() {
    let three = DistanceMatrix::from_rows(vec![
        vec![0.0, 0.0, 1.0],
        vec![0.0, 0.0, 0.0],
        vec![1.0, 0.0, 0.0],
    ])
    .unwrap();
    assert_eq!(maximize_minimum_distance(2, &three).unwrap(), vec![0, 2]);

    let four = DistanceMatrix::from_rows(vec![
        vec![0.0, 0.0, 1000.0, 50.0],
        vec![0.0, 0.0, 1000.0, 50.0],
        vec![1000.0, 1000.0, 0.0, 50.0],
        vec![50.0, 50.0, 50.0, 0.0],
    ])
    .unwrap();
    assert_eq!(maximize_distance_sum(3, &four).unwrap(), vec![0, 1, 2]);
}

#[test]
fn test_k_equal_n_returns_everything_unchanged() {
    let trees = sample_trees();
    let selected = select_dissimilar(
        &trees,
        trees.len(),
        SelectionObjective::MaximizeDistanceSum,
        &DistanceEngine::default(),
        DEFAULT_MAX_COMBINATIONS,
    )
    .unwrap();
    assert_eq!(selected, trees);
}

#[test]
fn test_configurable_ceiling() {
    let matrix = DistanceMatrix::zeros(10);
    // C(10, 3) = 120
    let objective = SelectionObjective::MaximizeMinimumDistance;
    let err = select_indices(3, &matrix, objective, 100).unwrap_err();
    assert!(err.is_too_many_combinations());
    assert!(select_indices(3, &matrix, objective, 120).is_ok());
}

#[test]
fn test_group_extremes() {
    let trees = sample_trees();
    for algorithm in [DistanceAlgorithm::PqGram, DistanceAlgorithm::TreeEdit] {
        let engine = DistanceEngine::new(algorithm);

        let singletons = group(&trees, trees.len(), &engine).unwrap();
        assert_eq!(singletons, trees.iter().map(|t| vec![t.clone()]).collect::<Vec<_>>());

        let one = group(&trees, 1, &engine).unwrap();
        assert_eq!(one.len(), 1);
        assert_eq!(one[0].len(), trees.len());
    }
}
