//! Shared value types used across the Canopy crates.

use crate::error::{CanopyError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Selects which pairwise tree-distance algorithm downstream consumers use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DistanceAlgorithm {
    /// Approximate pq-gram profile distance, roughly linear in tree size
    #[default]
    PqGram,
    /// Exact ordered tree edit distance
    TreeEdit,
}

impl DistanceAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PqGram => "pqGram",
            Self::TreeEdit => "treeEdit",
        }
    }
}

impl std::str::FromStr for DistanceAlgorithm {
    type Err = CanopyError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace(['-', '_'], "").as_str() {
            "pqgram" => Ok(Self::PqGram),
            "treeedit" | "ted" => Ok(Self::TreeEdit),
            _ => Err(CanopyError::Config(format!(
                "Invalid distance algorithm '{}'. Must be one of: pqGram, treeEdit",
                s
            ))),
        }
    }
}

impl fmt::Display for DistanceAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
