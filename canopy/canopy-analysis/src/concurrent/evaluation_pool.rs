//! Long-lived worker pool for batch criterion evaluation.
//!
//! The pool owns a fixed set of worker threads consuming jobs from a shared
//! crossbeam channel. Each job is one (tree, criterion) pair; each batch gets
//! its own reply channel and reassembles results by index, never by
//! completion order. Workers share no mutable state: every batch hands them
//! its own copy of the trees behind an `Arc`.
//!
//! A batch fails fast on its first failing unit. The batch's abort flag is
//! raised at that point, and workers skip the batch's remaining queued units
//! instead of evaluating them for a caller that has already returned.
//!
//! Workers are stopped by a poison pill (`None`) in [`EvaluationPool::shutdown`],
//! which also runs on drop.
//!
//! # Examples
//!
//! ```
//! use canopy_analysis::concurrent::EvaluationPool;
//! use canopy_analysis::criteria::{Criterion, CriterionRequest};
//! use canopy_core::ast::{Actor, EventListener, GeneralAst, Statement};
//!
//! let pool = EvaluationPool::new(2)?;
//! let tree = GeneralAst::new(vec![Actor::new().with_listener(EventListener::new(
//!     "start",
//!     vec![],
//!     Statement::repeat(None, Statement::call("move", vec![])),
//! ))]);
//!
//! let results = pool.analyze(
//!     &[tree],
//!     &[CriterionRequest::new(Criterion::ContainsLoop), CriterionRequest::calls_function("move")],
//! )?;
//! assert!(results[0][0].output && results[0][1].output);
//!
//! pool.shutdown();
//! # Ok::<(), canopy_core::CanopyError>(())
//! ```

use crate::criteria::{CriterionRequest, CriterionResult, evaluate};
use canopy_core::ast::GeneralAst;
use canopy_core::config::PoolConfig;
use canopy_core::error::{CanopyError, Result};
use crossbeam::channel::{Receiver, Sender, bounded, unbounded};
use parking_lot::Mutex;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

/// One (tree, criterion) unit of work.
struct EvaluationJob {
    tree_index: usize,
    criterion_index: usize,
    tree: Arc<GeneralAst>,
    criteria: Arc<Vec<CriterionRequest>>,
    aborted: Arc<AtomicBool>,
    reply: Sender<UnitReply>,
}

/// Outcome of one unit, tagged with its position in the batch.
struct UnitReply {
    tree_index: usize,
    criterion_index: usize,
    outcome: Result<bool>,
}

type JobReceiver = Receiver<Option<EvaluationJob>>;
type JobSender = Sender<Option<EvaluationJob>>;

#[derive(Debug, Default)]
struct Counters {
    batches: AtomicU64,
    units: AtomicU64,
    skipped_units: AtomicU64,
    failed_batches: AtomicU64,
}

/// Snapshot of pool activity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub workers: usize,
    pub batches: u64,
    pub units: u64,
    /// Units dropped unevaluated because their batch had already failed
    pub skipped_units: u64,
    pub failed_batches: u64,
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "evaluation unit panicked".to_string()
    }
}

/// Consumer loop run by every worker thread.
fn worker(receiver: JobReceiver, counters: Arc<Counters>) {
    while let Ok(job) = receiver.recv() {
        // None is the poison pill
        let Some(job) = job else {
            break;
        };

        if job.aborted.load(Ordering::Acquire) {
            counters.skipped_units.fetch_add(1, Ordering::Relaxed);
            continue;
        }

        let request = &job.criteria[job.criterion_index];
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            evaluate(&job.tree, request.criterion, &request.input)
        }))
        .unwrap_or_else(|payload| Err(CanopyError::worker_failure(panic_message(payload))));

        counters.units.fetch_add(1, Ordering::Relaxed);
        if outcome.is_err() {
            job.aborted.store(true, Ordering::Release);
        }

        // The batch may already have failed fast and dropped its receiver
        let _ = job.reply.send(UnitReply {
            tree_index: job.tree_index,
            criterion_index: job.criterion_index,
            outcome,
        });
    }
}

/// Fixed-size pool evaluating criteria over trees.
pub struct EvaluationPool {
    sender: Mutex<Option<JobSender>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    counters: Arc<Counters>,
    num_workers: usize,
}

impl EvaluationPool {
    /// Start a pool with `num_workers` threads (at least one).
    pub fn new(num_workers: usize) -> Result<Self> {
        let num_workers = num_workers.max(1);
        let (sender, receiver) = unbounded();
        let counters = Arc::new(Counters::default());

        let mut workers = Vec::with_capacity(num_workers);
        for i in 0..num_workers {
            let receiver = receiver.clone();
            let counters = Arc::clone(&counters);
            let handle = thread::Builder::new()
                .name(format!("canopy-eval-{}", i))
                .spawn(move || worker(receiver, counters))?;
            workers.push(handle);
        }

        info!("Evaluation pool started with {} workers", num_workers);

        Ok(Self {
            sender: Mutex::new(Some(sender)),
            workers: Mutex::new(workers),
            counters,
            num_workers,
        })
    }

    /// Start a pool sized by configuration
    pub fn from_config(config: &PoolConfig) -> Result<Self> {
        Self::new(config.effective_workers())
    }

    pub fn num_workers(&self) -> usize {
        self.num_workers
    }

    pub fn is_running(&self) -> bool {
        self.sender.lock().is_some()
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            workers: self.num_workers,
            batches: self.counters.batches.load(Ordering::Relaxed),
            units: self.counters.units.load(Ordering::Relaxed),
            skipped_units: self.counters.skipped_units.load(Ordering::Relaxed),
            failed_batches: self.counters.failed_batches.load(Ordering::Relaxed),
        }
    }

    /// Evaluate every criterion against every tree.
    ///
    /// The result has one row per tree and one entry per criterion, in input
    /// order. Blocks until the batch completes.
    ///
    /// # Errors
    ///
    /// Fails fast on the first failing unit: a missing criterion parameter
    /// gives [`CanopyError::InvalidCriterionInput`], a panicking unit (such as
    /// one walking a malformed tree) gives [`CanopyError::WorkerFailure`].
    /// Units of the failed batch still queued are skipped. Returns [`CanopyError::PoolShutdown`]
    /// once the pool has been shut down.
    pub fn analyze(
        &self,
        trees: &[GeneralAst],
        criteria: &[CriterionRequest],
    ) -> Result<Vec<Vec<CriterionResult>>> {
        let sender = self.sender.lock().clone().ok_or(CanopyError::PoolShutdown)?;

        if let Some(request) = criteria
            .iter()
            .find(|r| r.criterion.requires_function_name() && r.input.function_name.is_none())
        {
            return Err(CanopyError::invalid_criterion_input(
                request.criterion.as_str(),
                "functionName",
            ));
        }

        self.counters.batches.fetch_add(1, Ordering::Relaxed);

        let total = trees.len() * criteria.len();
        if total == 0 {
            return Ok(vec![Vec::new(); trees.len()]);
        }

        debug!(
            "Dispatching {} units ({} trees x {} criteria)",
            total,
            trees.len(),
            criteria.len()
        );

        let criteria = Arc::new(criteria.to_vec());
        let aborted = Arc::new(AtomicBool::new(false));
        let (reply_tx, reply_rx) = bounded(total);

        for (tree_index, tree) in trees.iter().enumerate() {
            let tree = Arc::new(tree.clone());
            for criterion_index in 0..criteria.len() {
                sender
                    .send(Some(EvaluationJob {
                        tree_index,
                        criterion_index,
                        tree: Arc::clone(&tree),
                        criteria: Arc::clone(&criteria),
                        aborted: Arc::clone(&aborted),
                        reply: reply_tx.clone(),
                    }))
                    .map_err(|_| CanopyError::PoolShutdown)?;
            }
        }

        // Only queued jobs may keep the reply channel open
        drop(reply_tx);
        drop(sender);

        let mut slots: Vec<Vec<Option<bool>>> = vec![vec![None; criteria.len()]; trees.len()];
        for _ in 0..total {
            let Ok(reply) = reply_rx.recv() else {
                aborted.store(true, Ordering::Release);
                return Err(CanopyError::worker_failure(
                    "workers stopped before the batch completed",
                ));
            };

            match reply.outcome {
                Ok(output) => slots[reply.tree_index][reply.criterion_index] = Some(output),
                Err(e) => {
                    aborted.store(true, Ordering::Release);
                    self.counters.failed_batches.fetch_add(1, Ordering::Relaxed);
                    warn!(
                        "Evaluation of tree {} / criterion {} failed: {}",
                        reply.tree_index, reply.criterion_index, e
                    );
                    return Err(e);
                }
            }
        }

        slots
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .zip(criteria.iter())
                    .map(|(output, request)| {
                        output
                            .map(|output| CriterionResult {
                                criterion: request.criterion,
                                output,
                            })
                            .ok_or_else(|| CanopyError::worker_failure("missing unit result"))
                    })
                    .collect()
            })
            .collect()
    }

    /// Stop all workers and wait for them to exit. Idempotent.
    pub fn shutdown(&self) {
        let Some(sender) = self.sender.lock().take() else {
            return;
        };

        let workers = std::mem::take(&mut *self.workers.lock());
        for _ in &workers {
            let _ = sender.send(None);
        }
        drop(sender);

        for handle in workers {
            if handle.join().is_err() {
                warn!("Evaluation worker panicked during shutdown");
            }
        }

        info!("Evaluation pool shut down");
    }
}

impl Drop for EvaluationPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}
