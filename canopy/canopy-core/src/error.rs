//! Error types for the Canopy similarity engine.

/// Result type alias for Canopy operations.
pub type Result<T> = std::result::Result<T, CanopyError>;

/// Main error type for the Canopy system.
#[derive(Debug, thiserror::Error)]
pub enum CanopyError {
    /// A criterion was invoked without a parameter it requires
    #[error("Invalid input for criterion '{criterion}': missing {parameter}")]
    InvalidCriterionInput { criterion: String, parameter: String },

    /// An evaluation unit failed inside the worker pool
    #[error("Worker failure: {0}")]
    WorkerFailure(String),

    /// The dissimilar-subset search space is larger than the configured ceiling
    #[error("Too many combinations: {combinations} exceeds the limit of {limit}")]
    TooManyCombinations { combinations: f64, limit: u64 },

    /// A pairwise distance could not be computed
    #[error("Distance computation failed: {0}")]
    DistanceFailure(String),

    /// The request was superseded before its result could be applied
    #[error("Request cancelled")]
    Cancelled,

    /// The worker pool has already been shut down
    #[error("Worker pool is shut down")]
    PoolShutdown,

    /// Invalid input errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Wrapped anyhow errors for compatibility
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CanopyError {
    /// Create a new invalid criterion input error
    pub fn invalid_criterion_input(
        criterion: impl Into<String>,
        parameter: impl Into<String>,
    ) -> Self {
        Self::InvalidCriterionInput {
            criterion: criterion.into(),
            parameter: parameter.into(),
        }
    }

    /// Create a new worker failure error
    pub fn worker_failure(msg: impl Into<String>) -> Self {
        Self::WorkerFailure(msg.into())
    }

    /// Create a new too-many-combinations error
    pub fn too_many_combinations(combinations: f64, limit: u64) -> Self {
        Self::TooManyCombinations {
            combinations,
            limit,
        }
    }

    /// Create a new distance failure error
    pub fn distance_failure(msg: impl Into<String>) -> Self {
        Self::DistanceFailure(msg.into())
    }

    /// Create a new invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a new config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether the caller asked for a subset whose search space is too large.
    ///
    /// Callers use this to show "reduce the number of items requested"
    /// instead of a generic failure.
    pub fn is_too_many_combinations(&self) -> bool {
        matches!(self, Self::TooManyCombinations { .. })
    }

    /// Check if this error is a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
