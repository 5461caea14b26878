//! Dissimilar Subset Selection
//!
//! - [`combinations`]: restartable k-of-n index generator and `C(n, k)`
//! - [`dissimilar`]: exhaustive best-subset search over a distance matrix

pub mod combinations;
pub mod dissimilar;

pub use combinations::{Combinations, binomial};
pub use dissimilar::{
    SelectionObjective, check_search_space, maximize_distance_sum, maximize_minimum_distance,
    select_dissimilar, select_dissimilar_indices, select_indices,
};
