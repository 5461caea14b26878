//! Tree Distance Engine
//!
//! Two interchangeable metrics over [`GeneralAst`] values:
//! - [`pq_gram`]: approximate, linear-time profile distance in `[0, 1]`
//! - [`edit_distance`]: exact ordered tree edit distance (node operations)
//!
//! Consumers pick one with [`DistanceAlgorithm`] and never depend on which
//! was used. Pairwise work for a whole candidate set goes through
//! [`compute_distance_matrix`], which computes each unordered pair once in
//! parallel and aborts on the first failure.
//!
//! # Examples
//!
//! ```
//! use canopy_analysis::distance::{DistanceAlgorithm, DistanceEngine};
//! use canopy_core::ast::{Actor, EventListener, GeneralAst, Statement};
//!
//! let a = GeneralAst::new(vec![Actor::new().with_listener(EventListener::new(
//!     "start", vec![], Statement::call("move", vec![]),
//! ))]);
//! let b = GeneralAst::new(vec![Actor::new().with_listener(EventListener::new(
//!     "start", vec![], Statement::call("turn", vec![]),
//! ))]);
//!
//! let engine = DistanceEngine::new(DistanceAlgorithm::TreeEdit);
//! assert_eq!(engine.distance(&a, &b)?, 1.0);
//!
//! let matrix = engine.matrix(&[a.clone(), b, a])?;
//! assert_eq!(matrix.get(0, 2), 0.0);
//! # Ok::<(), canopy_core::CanopyError>(())
//! ```

pub mod edit_distance;
pub mod pq_gram;

pub use canopy_core::types::DistanceAlgorithm;
pub use edit_distance::{PostorderTree, ast_edit_distance, tree_edit_distance};
pub use pq_gram::{PqGram, PqGramConfig, PqGramProfile, pq_gram_distance};

use canopy_core::ast::GeneralAst;
use canopy_core::config::DistanceConfig;
use canopy_core::error::{CanopyError, Result};
use rayon::prelude::*;
use std::time::Instant;
use tracing::debug;

/// Distance between two programs under `algorithm`.
pub fn tree_distance(
    a: &GeneralAst,
    b: &GeneralAst,
    algorithm: DistanceAlgorithm,
    config: PqGramConfig,
) -> f64 {
    match algorithm {
        DistanceAlgorithm::PqGram => pq_gram_distance(a, b, config),
        DistanceAlgorithm::TreeEdit => ast_edit_distance(a, b) as f64,
    }
}

/// Symmetric `n x n` matrix of pairwise distances with a zero diagonal.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    size: usize,
    values: Vec<f64>,
}

impl DistanceMatrix {
    pub fn zeros(size: usize) -> Self {
        Self {
            size,
            values: vec![0.0; size * size],
        }
    }

    /// Build from explicit rows, checking shape and metric sanity.
    ///
    /// # Errors
    ///
    /// [`CanopyError::InvalidInput`] when the rows are not square, not
    /// symmetric, have a non-zero diagonal, or hold negative or non-finite
    /// values.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let size = rows.len();
        let mut matrix = Self::zeros(size);

        for (i, row) in rows.iter().enumerate() {
            if row.len() != size {
                return Err(CanopyError::invalid_input(format!(
                    "distance matrix row {} has {} entries, expected {}",
                    i,
                    row.len(),
                    size
                )));
            }
            for (j, &value) in row.iter().enumerate() {
                if !value.is_finite() || value < 0.0 {
                    return Err(CanopyError::invalid_input(format!(
                        "distance ({}, {}) is {}",
                        i, j, value
                    )));
                }
                matrix.values[i * size + j] = value;
            }
        }

        for i in 0..size {
            if matrix.get(i, i) != 0.0 {
                return Err(CanopyError::invalid_input(format!(
                    "distance ({}, {}) must be zero",
                    i, i
                )));
            }
            for j in (i + 1)..size {
                if matrix.get(i, j) != matrix.get(j, i) {
                    return Err(CanopyError::invalid_input(format!(
                        "distance matrix is not symmetric at ({}, {})",
                        i, j
                    )));
                }
            }
        }

        Ok(matrix)
    }

    /// Number of rows (and columns)
    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.size + j]
    }

    /// Set both `(i, j)` and `(j, i)`
    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        self.values[i * self.size + j] = value;
        self.values[j * self.size + i] = value;
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.values[i * self.size..(i + 1) * self.size]
    }
}

/// Compute all pairwise distances of `items` with `metric`.
///
/// Each unordered pair is evaluated exactly once, pairs run in parallel on
/// the rayon pool, and the matrix is only assembled after every pair has
/// completed.
///
/// # Errors
///
/// The first failing pair aborts the whole matrix. A non-finite or negative
/// distance is reported as [`CanopyError::DistanceFailure`].
pub fn compute_distance_matrix<T, F>(items: &[T], metric: F) -> Result<DistanceMatrix>
where
    T: Sync,
    F: Fn(&T, &T) -> Result<f64> + Sync,
{
    let n = items.len();
    let start = Instant::now();

    let pairs: Vec<(usize, usize)> = (0..n)
        .flat_map(|i| ((i + 1)..n).map(move |j| (i, j)))
        .collect();

    let distances = pairs
        .par_iter()
        .map(|&(i, j)| {
            let distance = metric(&items[i], &items[j])?;
            if !distance.is_finite() || distance < 0.0 {
                return Err(CanopyError::distance_failure(format!(
                    "distance between {} and {} is {}",
                    i, j, distance
                )));
            }
            Ok((i, j, distance))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut matrix = DistanceMatrix::zeros(n);
    for (i, j, distance) in distances {
        matrix.set(i, j, distance);
    }

    debug!(
        "Computed {} pairwise distances for {} items in {:?}",
        pairs.len(),
        n,
        start.elapsed()
    );

    Ok(matrix)
}

/// Per-tree precomputed form, built once before pairwise work
enum Prepared {
    PqGram(Vec<PqGramProfile>),
    TreeEdit(Vec<PostorderTree>),
}

/// Algorithm choice plus its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DistanceEngine {
    pub algorithm: DistanceAlgorithm,
    pub pq_gram: PqGramConfig,
}

impl DistanceEngine {
    pub fn new(algorithm: DistanceAlgorithm) -> Self {
        Self {
            algorithm,
            pq_gram: PqGramConfig::default(),
        }
    }

    pub fn with_pq_gram(mut self, config: PqGramConfig) -> Self {
        self.pq_gram = config;
        self
    }

    pub fn from_config(config: &DistanceConfig) -> Self {
        Self {
            algorithm: config.algorithm,
            pq_gram: PqGramConfig::from(config),
        }
    }

    /// Distance between two programs
    pub fn distance(&self, a: &GeneralAst, b: &GeneralAst) -> Result<f64> {
        let distance = tree_distance(a, b, self.algorithm, self.pq_gram);
        if distance.is_finite() {
            Ok(distance)
        } else {
            Err(CanopyError::distance_failure(format!(
                "{} distance is {}",
                self.algorithm, distance
            )))
        }
    }

    /// Pairwise distance matrix of `trees`
    pub fn matrix(&self, trees: &[GeneralAst]) -> Result<DistanceMatrix> {
        self.matrix_until(trees, || false)
    }

    /// Like [`DistanceEngine::matrix`], but gives up with
    /// [`CanopyError::Cancelled`] once `cancelled` returns true.
    ///
    /// `cancelled` is polled before every pair, so in-flight pairs finish but
    /// no partial matrix is returned.
    pub fn matrix_until<S>(&self, trees: &[GeneralAst], cancelled: S) -> Result<DistanceMatrix>
    where
        S: Fn() -> bool + Sync,
    {
        debug!(
            "Preparing {} trees for {} distance",
            trees.len(),
            self.algorithm
        );

        let indices: Vec<usize> = (0..trees.len()).collect();
        match self.prepare(trees) {
            Prepared::PqGram(profiles) => compute_distance_matrix(&indices, |&i, &j| {
                if cancelled() {
                    return Err(CanopyError::Cancelled);
                }
                Ok(profiles[i].distance(&profiles[j]))
            }),
            Prepared::TreeEdit(postorders) => compute_distance_matrix(&indices, |&i, &j| {
                if cancelled() {
                    return Err(CanopyError::Cancelled);
                }
                Ok(postorders[i].distance(&postorders[j]) as f64)
            }),
        }
    }

    fn prepare(&self, trees: &[GeneralAst]) -> Prepared {
        match self.algorithm {
            DistanceAlgorithm::PqGram => Prepared::PqGram(
                trees
                    .par_iter()
                    .map(|tree| PqGramProfile::from_ast(tree, self.pq_gram))
                    .collect(),
            ),
            DistanceAlgorithm::TreeEdit => Prepared::TreeEdit(
                trees.par_iter().map(PostorderTree::from_ast).collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use canopy_core::ast::{Actor, EventListener, Expression, Statement};

    fn program(action: Statement) -> GeneralAst {
        GeneralAst::new(vec![
            Actor::new().with_listener(EventListener::new("start", vec![], action)),
        ])
    }

    fn trees() -> Vec<GeneralAst> {
        vec![
            program(Statement::call("move", vec![Expression::literal("number", "10")])),
            program(Statement::call("move", vec![Expression::literal("number", "20")])),
            program(Statement::repeat(None, Statement::call("turn", vec![]))),
            GeneralAst::default(),
        ]
    }

    #[test]
    fn test_dispatch_identity() {
        let tree = &trees()[2];
        for algorithm in [DistanceAlgorithm::PqGram, DistanceAlgorithm::TreeEdit] {
            assert_eq!(tree_distance(tree, tree, algorithm, PqGramConfig::default()), 0.0);
        }
    }

    #[test]
    fn test_tree_edit_counts_operations() {
        let t = trees();
        // relabel one literal
        assert_eq!(
            tree_distance(&t[0], &t[1], DistanceAlgorithm::TreeEdit, PqGramConfig::default()),
            1.0
        );
        // the empty program is the bare root: delete everything else
        assert_eq!(
            tree_distance(&t[2], &t[3], DistanceAlgorithm::TreeEdit, PqGramConfig::default()),
            4.0
        );
    }

    #[test]
    fn test_matrix_matches_pairwise_dispatch() {
        let t = trees();
        for algorithm in [DistanceAlgorithm::PqGram, DistanceAlgorithm::TreeEdit] {
            let engine = DistanceEngine::new(algorithm);
            let matrix = engine.matrix(&t).unwrap();

            assert_eq!(matrix.len(), t.len());
            for i in 0..t.len() {
                assert_eq!(matrix.get(i, i), 0.0);
                for j in 0..t.len() {
                    assert_eq!(matrix.get(i, j), matrix.get(j, i));
                    assert_eq!(matrix.get(i, j), engine.distance(&t[i], &t[j]).unwrap());
                }
            }
        }
    }

    #[test]
    fn test_compute_matrix_visits_each_pair_once() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let calls = AtomicUsize::new(0);
        let items: Vec<f64> = vec![0.0, 1.0, 3.0, 7.0, 15.0];
        let matrix = compute_distance_matrix(&items, |a, b| {
            calls.fetch_add(1, Ordering::Relaxed);
            Ok((a - b).abs())
        })
        .unwrap();

        assert_eq!(calls.load(Ordering::Relaxed), 10);
        assert_eq!(matrix.get(1, 4), 14.0);
        assert_eq!(matrix.get(4, 1), 14.0);
    }

    #[test]
    fn test_compute_matrix_fails_fast() {
        let items = vec![1, 2, 3];
        let err = compute_distance_matrix(&items, |a, b| {
            if *a == 2 && *b == 3 {
                Err(CanopyError::distance_failure("boom"))
            } else {
                Ok(1.0)
            }
        })
        .unwrap_err();
        assert!(matches!(err, CanopyError::DistanceFailure(_)));

        let err = compute_distance_matrix(&items, |_, _| Ok(f64::NAN)).unwrap_err();
        assert!(matches!(err, CanopyError::DistanceFailure(_)));
    }

    #[test]
    fn test_cancelled_matrix() {
        let err = DistanceEngine::default().matrix_until(&trees(), || true).unwrap_err();
        assert!(err.is_cancelled());

        // nothing to compute, nothing to cancel
        assert!(DistanceEngine::default().matrix_until(&trees()[..1], || true).is_ok());
    }

    #[test]
    fn test_from_rows_validation() {
        let ok = DistanceMatrix::from_rows(vec![vec![0.0, 2.0], vec![2.0, 0.0]]).unwrap();
        assert_eq!(ok.row(0), &[0.0, 2.0]);

        assert!(DistanceMatrix::from_rows(vec![vec![0.0, 1.0], vec![2.0, 0.0]]).is_err());
        assert!(DistanceMatrix::from_rows(vec![vec![1.0]]).is_err());
        assert!(DistanceMatrix::from_rows(vec![vec![0.0, 1.0]]).is_err());
        assert!(DistanceMatrix::from_rows(vec![vec![0.0, -1.0], vec![-1.0, 0.0]]).is_err());
        assert!(DistanceMatrix::from_rows(Vec::new()).unwrap().is_empty());
    }

    #[test]
    fn test_engine_from_config() {
        let config = DistanceConfig {
            algorithm: DistanceAlgorithm::TreeEdit,
            pq_gram_p: 3,
            pq_gram_q: 2,
        };
        let engine = DistanceEngine::from_config(&config);
        assert_eq!(engine.algorithm, DistanceAlgorithm::TreeEdit);
        assert_eq!(engine.pq_gram, PqGramConfig { p: 3, q: 2 });
    }
}
