// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Section-to-section distance collaborators.
//!
//! The rupture core does no geodesy. Distances come from a
//! [`SectionDistance`] implementation: any `Fn(&FaultSection, &FaultSection)
//! -> f64` closure, a precomputed [`DistanceTable`], or either of those
//! wrapped in a concurrent memo ([`CachedDistance`]).
use std::sync::{PoisonError, RwLock};

use rustc_hash::FxHashMap;

use crate::section::{FaultSection, SectionId};

/// Pure, thread-safe distance between two subsections (km).
pub trait SectionDistance: Send + Sync {
    /// Distance between `a` and `b`. Must be symmetric and side-effect free.
    fn distance(&self, a: &FaultSection, b: &FaultSection) -> f64;
}

impl<F> SectionDistance for F
where
    F: Fn(&FaultSection, &FaultSection) -> f64 + Send + Sync,
{
    fn distance(&self, a: &FaultSection, b: &FaultSection) -> f64 {
        self(a, b)
    }
}

fn pair_key(a: SectionId, b: SectionId) -> (SectionId, SectionId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Symmetric sparse table of precomputed distances.
///
/// Pairs never inserted are infinitely far apart; a section is at distance
/// zero from itself.
#[derive(Clone, Debug, Default)]
pub struct DistanceTable {
    pairs: FxHashMap<(SectionId, SectionId), f64>,
}

impl DistanceTable {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the distance between `a` and `b` (either order).
    pub fn insert(&mut self, a: SectionId, b: SectionId, km: f64) {
        self.pairs.insert(pair_key(a, b), km);
    }

    /// Distance for the pair, if recorded.
    pub fn get(&self, a: SectionId, b: SectionId) -> Option<f64> {
        if a == b {
            return Some(0.0);
        }
        self.pairs.get(&pair_key(a, b)).copied()
    }

    /// Number of recorded pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Returns true when no pair is recorded.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl FromIterator<(SectionId, SectionId, f64)> for DistanceTable {
    fn from_iter<I: IntoIterator<Item = (SectionId, SectionId, f64)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (a, b, km) in iter {
            table.insert(a, b, km);
        }
        table
    }
}

impl SectionDistance for DistanceTable {
    fn distance(&self, a: &FaultSection, b: &FaultSection) -> f64 {
        self.get(a.id, b.id).unwrap_or(f64::INFINITY)
    }
}

const MEMO_SHARDS: usize = 16;

const _: () = assert!(MEMO_SHARDS.is_power_of_two());

type MemoShard = RwLock<FxHashMap<(SectionId, SectionId), f64>>;

/// Memoizing wrapper around an expensive calculator.
///
/// Lookups take a shard read lock; a miss computes outside any lock and
/// then inserts. Two workers racing on the same pair both compute it, which
/// is harmless because the calculator is pure.
#[derive(Debug)]
pub struct CachedDistance<D> {
    inner: D,
    shards: Box<[MemoShard]>,
}

impl<D: SectionDistance> CachedDistance<D> {
    /// Wraps `inner` with an empty memo.
    pub fn new(inner: D) -> Self {
        Self {
            inner,
            shards: (0..MEMO_SHARDS)
                .map(|_| RwLock::new(FxHashMap::default()))
                .collect(),
        }
    }

    fn shard(&self, key: (SectionId, SectionId)) -> &MemoShard {
        let mixed = (key.0 ^ key.1.rotate_left(16)) as usize;
        &self.shards[mixed & (MEMO_SHARDS - 1)]
    }

    /// Number of memoized pairs.
    pub fn cached_pairs(&self) -> usize {
        self.shards
            .iter()
            .map(|s| s.read().unwrap_or_else(PoisonError::into_inner).len())
            .sum()
    }

    /// The wrapped calculator.
    pub fn inner(&self) -> &D {
        &self.inner
    }
}

impl<D: SectionDistance> SectionDistance for CachedDistance<D> {
    fn distance(&self, a: &FaultSection, b: &FaultSection) -> f64 {
        let key = pair_key(a.id, b.id);
        let shard = self.shard(key);
        if let Some(&km) = shard
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return km;
        }
        let km = self.inner.distance(a, b);
        shard
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, km);
        km
    }
}
