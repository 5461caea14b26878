//! Concurrent Processing Module
//!
//! - [`evaluation_pool`]: long-lived worker threads for batch criterion
//!   evaluation, results reassembled by index
//!
//! Pairwise distance work is parallelised separately with rayon, see
//! [`crate::distance::compute_distance_matrix`].

pub mod evaluation_pool;

pub use evaluation_pool::{EvaluationPool, PoolStats};
