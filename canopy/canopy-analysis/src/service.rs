//! Async front end over the evaluation pool and the distance consumers.
//!
//! The service is created once, owns the [`EvaluationPool`] for its whole
//! lifetime and is torn down with [`SimilarityService::shutdown`]. All CPU
//! work runs on tokio's blocking pool so callers on an async runtime never
//! stall their executor.
//!
//! Selection and grouping requests supersede each other: starting one
//! cancels whichever is still in flight. The superseded request stops at its
//! next checkpoint, or finishes, and in both cases reports
//! [`CanopyError::Cancelled`] instead of a result.

use crate::clustering::group_indices;
use crate::concurrent::{EvaluationPool, PoolStats};
use crate::criteria::{CriterionRequest, CriterionResult};
use crate::distance::{DistanceAlgorithm, DistanceEngine};
use crate::selection::{SelectionObjective, select_dissimilar_indices};
use canopy_core::ast::GeneralAst;
use canopy_core::config::CanopyConfig;
use canopy_core::error::{CanopyError, Result};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

fn join_failure(e: JoinError) -> CanopyError {
    CanopyError::worker_failure(format!("blocking task failed: {}", e))
}

/// The request that currently owns the distance pipeline
struct ActiveRequest {
    id: u64,
    token: CancellationToken,
}

/// Long-lived similarity service.
pub struct SimilarityService {
    pool: Arc<EvaluationPool>,
    engine: DistanceEngine,
    max_combinations: u64,
    active: Mutex<Option<ActiveRequest>>,
    next_request: AtomicU64,
}

impl SimilarityService {
    /// Validate `config` and start the worker pool.
    pub fn new(config: &CanopyConfig) -> Result<Self> {
        config.validate()?;
        let pool = EvaluationPool::from_config(&config.pool)?;

        info!(
            "Similarity service started ({} workers, {} distance)",
            pool.num_workers(),
            config.distance.algorithm
        );

        Ok(Self {
            pool: Arc::new(pool),
            engine: DistanceEngine::from_config(&config.distance),
            max_combinations: config.selection.max_combinations,
            active: Mutex::new(None),
            next_request: AtomicU64::new(0),
        })
    }

    pub fn engine(&self) -> DistanceEngine {
        self.engine
    }

    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }

    /// Evaluate every criterion against every tree on the worker pool.
    pub async fn analyze(
        &self,
        trees: Vec<GeneralAst>,
        criteria: Vec<CriterionRequest>,
    ) -> Result<Vec<Vec<CriterionResult>>> {
        let pool = Arc::clone(&self.pool);
        tokio::task::spawn_blocking(move || pool.analyze(&trees, &criteria))
            .await
            .map_err(join_failure)?
    }

    /// Select the `k` most dissimilar trees.
    ///
    /// `algorithm` overrides the configured distance algorithm.
    pub async fn select_dissimilar(
        &self,
        trees: Vec<GeneralAst>,
        k: usize,
        objective: SelectionObjective,
        algorithm: Option<DistanceAlgorithm>,
    ) -> Result<Vec<GeneralAst>> {
        let engine = self.engine_for(algorithm);
        let limit = self.max_combinations;

        self.run_superseding(move |cancelled| {
            let indices =
                select_dissimilar_indices(&trees, k, objective, &engine, limit, cancelled)?;
            Ok(indices.into_iter().map(|i| trees[i].clone()).collect())
        })
        .await
    }

    /// Cluster trees into `target` groups.
    pub async fn group(
        &self,
        trees: Vec<GeneralAst>,
        target: usize,
        algorithm: Option<DistanceAlgorithm>,
    ) -> Result<Vec<Vec<GeneralAst>>> {
        let engine = self.engine_for(algorithm);

        self.run_superseding(move |cancelled| {
            let groups = group_indices(&trees, target, &engine, cancelled)?;
            Ok(groups
                .into_iter()
                .map(|members| members.into_iter().map(|i| trees[i].clone()).collect())
                .collect())
        })
        .await
    }

    /// Cancel the in-flight request and stop the worker pool.
    pub async fn shutdown(&self) -> Result<()> {
        if let Some(active) = self.active.lock().take() {
            active.token.cancel();
        }

        let pool = Arc::clone(&self.pool);
        tokio::task::spawn_blocking(move || pool.shutdown())
            .await
            .map_err(join_failure)?;

        info!("Similarity service shut down");
        Ok(())
    }

    fn engine_for(&self, algorithm: Option<DistanceAlgorithm>) -> DistanceEngine {
        match algorithm {
            Some(algorithm) => DistanceEngine {
                algorithm,
                ..self.engine
            },
            None => self.engine,
        }
    }

    /// Register a new request, cancelling the previous one.
    fn begin_request(&self) -> (u64, CancellationToken) {
        let id = self.next_request.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();

        let previous = self.active.lock().replace(ActiveRequest {
            id,
            token: token.clone(),
        });
        if let Some(previous) = previous {
            debug!("Request {} superseded by {}", previous.id, id);
            previous.token.cancel();
        }

        (id, token)
    }

    fn finish_request(&self, id: u64) {
        let mut active = self.active.lock();
        if active.as_ref().is_some_and(|request| request.id == id) {
            *active = None;
        }
    }

    async fn run_superseding<T, F>(&self, work: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&(dyn Fn() -> bool + Sync)) -> Result<T> + Send + 'static,
    {
        if !self.pool.is_running() {
            return Err(CanopyError::PoolShutdown);
        }

        let (id, token) = self.begin_request();
        let task_token = token.clone();
        let outcome =
            tokio::task::spawn_blocking(move || work(&|| task_token.is_cancelled())).await;
        self.finish_request(id);

        // A superseded result is never handed out, even if it completed
        if token.is_cancelled() {
            debug!("Request {} discarded after cancellation", id);
            return Err(CanopyError::Cancelled);
        }
        outcome.map_err(join_failure)?
    }
}
