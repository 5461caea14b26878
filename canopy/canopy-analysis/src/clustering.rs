//! Agglomerative clustering with mean linkage.
//!
//! Every tree starts as its own group, held in a slot indexed like the input.
//! Each step merges the closest two groups into the lower of their two slots
//! and retires the other, until the requested number of groups remains.
//!
//! Group distances are memoized per slot pair. A merge only changes the
//! group in the surviving slot, so only that slot's row and column (plus the
//! retired slot's) are dropped from the cache; every other entry stays valid.

use crate::distance::{DistanceEngine, DistanceMatrix};
use canopy_core::ast::GeneralAst;
use canopy_core::error::{CanopyError, Result};
use std::collections::HashMap;
use tracing::debug;

/// Work counters from one clustering run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClusterStats {
    pub merges: usize,
    pub cache_hits: u64,
    pub cache_misses: u64,
}

impl ClusterStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total as f64
        }
    }
}

struct Clusterer<'m> {
    matrix: &'m DistanceMatrix,
    slots: Vec<Option<Vec<usize>>>,
    cache: HashMap<(usize, usize), f64>,
    stats: ClusterStats,
}

impl<'m> Clusterer<'m> {
    fn new(matrix: &'m DistanceMatrix) -> Self {
        Self {
            matrix,
            slots: (0..matrix.len()).map(|i| Some(vec![i])).collect(),
            cache: HashMap::new(),
            stats: ClusterStats::default(),
        }
    }

    fn active_slots(&self) -> Vec<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(slot, members)| members.as_ref().map(|_| slot))
            .collect()
    }

    /// Mean of all member-to-member distances between two groups
    fn linkage(&self, a: &[usize], b: &[usize]) -> f64 {
        let total: f64 = a
            .iter()
            .flat_map(|&i| b.iter().map(move |&j| (i, j)))
            .map(|(i, j)| self.matrix.get(i, j))
            .sum();
        total / (a.len() * b.len()) as f64
    }

    fn group_distance(&mut self, a: usize, b: usize) -> f64 {
        if a == b {
            return 0.0;
        }
        let key = (a.min(b), a.max(b));
        if let Some(&distance) = self.cache.get(&key) {
            self.stats.cache_hits += 1;
            return distance;
        }

        self.stats.cache_misses += 1;
        let distance = match (&self.slots[a], &self.slots[b]) {
            (Some(group_a), Some(group_b)) => self.linkage(group_a, group_b),
            _ => f64::INFINITY,
        };
        self.cache.insert(key, distance);
        distance
    }

    /// Closest active pair, lowest `(a, b)` on ties
    fn closest_pair(&mut self, active: &[usize]) -> Option<(usize, usize)> {
        let mut best: Option<(f64, usize, usize)> = None;
        for (pos, &a) in active.iter().enumerate() {
            for &b in &active[pos + 1..] {
                let distance = self.group_distance(a, b);
                if best.is_none_or(|(best_distance, _, _)| distance < best_distance) {
                    best = Some((distance, a, b));
                }
            }
        }
        best.map(|(_, a, b)| (a, b))
    }

    fn merge(&mut self, keep: usize, retire: usize) {
        let moved = self.slots[retire].take().unwrap_or_default();
        if let Some(group) = self.slots[keep].as_mut() {
            group.extend(moved);
        }
        self.cache
            .retain(|&(a, b), _| a != keep && b != keep && a != retire && b != retire);
        self.stats.merges += 1;
    }

    /// Merge the closest pair unless `target` groups or fewer remain.
    /// Returns whether a merge happened.
    fn merge_step(&mut self, target: usize) -> bool {
        let active = self.active_slots();
        if active.len() <= target {
            return false;
        }
        match self.closest_pair(&active) {
            Some((keep, retire)) => {
                self.merge(keep, retire);
                true
            }
            None => false,
        }
    }

    fn into_groups(self) -> (Vec<Vec<usize>>, ClusterStats) {
        let groups = self
            .slots
            .into_iter()
            .flatten()
            .map(|mut members| {
                members.sort_unstable();
                members
            })
            .collect();
        (groups, self.stats)
    }
}

/// Group indices `0..matrix.len()` into `min(target, n)` clusters.
///
/// Groups are listed by their lowest member; members are ascending.
pub fn cluster_indices(matrix: &DistanceMatrix, target: usize) -> Vec<Vec<usize>> {
    cluster_indices_with_stats(matrix, target).0
}

/// [`cluster_indices`] plus cache and merge counters
pub fn cluster_indices_with_stats(
    matrix: &DistanceMatrix,
    target: usize,
) -> (Vec<Vec<usize>>, ClusterStats) {
    if target == 0 {
        return (Vec::new(), ClusterStats::default());
    }

    let mut clusterer = Clusterer::new(matrix);
    while clusterer.merge_step(target) {}
    clusterer.into_groups()
}

/// Cluster `trees` into `min(target, trees.len())` groups of copies.
pub fn group(
    trees: &[GeneralAst],
    target: usize,
    engine: &DistanceEngine,
) -> Result<Vec<Vec<GeneralAst>>> {
    let groups = group_indices(trees, target, engine, || false)?;
    Ok(groups
        .into_iter()
        .map(|members| members.into_iter().map(|i| trees[i].clone()).collect())
        .collect())
}

/// Index form of [`group`] that stops with [`CanopyError::Cancelled`] once
/// `cancelled` returns true.
pub fn group_indices<S>(
    trees: &[GeneralAst],
    target: usize,
    engine: &DistanceEngine,
    cancelled: S,
) -> Result<Vec<Vec<usize>>>
where
    S: Fn() -> bool + Sync,
{
    if target == 0 || trees.is_empty() {
        return Ok(Vec::new());
    }
    if target >= trees.len() {
        return Ok((0..trees.len()).map(|i| vec![i]).collect());
    }

    let matrix = engine.matrix_until(trees, &cancelled)?;
    let mut clusterer = Clusterer::new(&matrix);
    loop {
        if cancelled() {
            return Err(CanopyError::Cancelled);
        }
        if !clusterer.merge_step(target) {
            break;
        }
    }
    let (groups, stats) = clusterer.into_groups();

    debug!(
        "Clustered {} trees into {} groups: {} merges, cache hit rate {:.2}",
        trees.len(),
        groups.len(),
        stats.merges,
        stats.hit_rate()
    );

    Ok(groups)
}
