//! Canopy Analysis - structural comparison of student programs
//!
//! Works on [`GeneralAst`](canopy_core::ast::GeneralAst) trees produced by an
//! upstream translator and answers two kinds of questions:
//! - does a program have some shape (calls `f`, contains a loop, ...)?
//! - which programs in a set are most alike or most different?
//!
//! # Quick Start
//!
//! ```
//! use canopy_analysis::criteria::{Criterion, CriterionInput, evaluate};
//! use canopy_analysis::distance::{DistanceAlgorithm, DistanceEngine};
//! use canopy_analysis::selection::{SelectionObjective, select_dissimilar};
//! use canopy_core::ast::{Actor, EventListener, GeneralAst, Statement};
//! use canopy_core::DEFAULT_MAX_COMBINATIONS;
//!
//! let program = |action| {
//!     GeneralAst::new(vec![
//!         Actor::new().with_listener(EventListener::new("start", vec![], action)),
//!     ])
//! };
//! let trees = vec![
//!     program(Statement::call("move", vec![])),
//!     program(Statement::call("move", vec![])),
//!     program(Statement::repeat(None, Statement::call("turn", vec![]))),
//! ];
//!
//! assert!(evaluate(&trees[2], Criterion::ContainsLoop, &CriterionInput::default())?);
//!
//! let picked = select_dissimilar(
//!     &trees,
//!     2,
//!     SelectionObjective::MaximizeMinimumDistance,
//!     &DistanceEngine::new(DistanceAlgorithm::PqGram),
//!     DEFAULT_MAX_COMBINATIONS,
//! )?;
//! assert_eq!(picked, vec![trees[0].clone(), trees[2].clone()]);
//! # Ok::<(), canopy_core::CanopyError>(())
//! ```
//!
//! # Architecture
//!
//! ## Tree Inspection
//! - [`walker`] - depth-first traversal with early stop
//! - [`criteria`] - named boolean predicates over a program
//! - [`concurrent`] - worker pool for batch criterion evaluation
//!
//! ## Similarity
//! - [`tree`] - the label/children view the distance algorithms consume
//! - [`distance`] - pq-gram and tree edit distance, pairwise matrices
//! - [`selection`] - most-dissimilar subset search
//! - [`clustering`] - mean-linkage agglomerative grouping
//!
//! ## Service
//! - [`service`] - async facade with request supersession

pub mod clustering;
pub mod concurrent;
pub mod criteria;
pub mod distance;
pub mod selection;
pub mod service;
pub mod tree;
pub mod walker;

pub use clustering::{ClusterStats, cluster_indices, group};
pub use concurrent::{EvaluationPool, PoolStats};
pub use criteria::{Criterion, CriterionInput, CriterionRequest, CriterionResult, evaluate};
pub use distance::{
    DistanceAlgorithm, DistanceEngine, DistanceMatrix, compute_distance_matrix, tree_distance,
};
pub use selection::{
    SelectionObjective, maximize_distance_sum, maximize_minimum_distance, select_dissimilar,
};
pub use service::SimilarityService;
pub use tree::{TreeNode, children, label};
pub use walker::{AstVisitor, WalkAction, WalkOptions, walk_ast, walk_ast_with};
