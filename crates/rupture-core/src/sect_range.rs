// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Interned closed intervals of section ids.
//!
//! # Canonical Instances
//!
//! Every distinct `[start, end]` pair is allocated exactly once per process.
//! [`SectIdRange::build`] returns a handle to that allocation, so two ranges
//! built anywhere with identical bounds satisfy [`SectIdRange::ptr_eq`].
//! Equality and hashing never depend on pointer identity; they compare the
//! bounds.
//!
//! # Key Encoding
//!
//! ```text
//! end <= 0xFFFF : Packed(start << 16 | end)      (u32)
//! otherwise     : Wide(start << 32 | end)        (u64)
//! ```
//!
//! The encoding is chosen purely from the bounds, so a given interval always
//! lands in the same variant and value equality of keys is interval equality.
//!
//! # Cache Sharding
//!
//! The intern table is split into [`NUM_CACHE_SHARDS`] lock shards. The shard
//! is taken from the top bits of a multiplicative mix of the bounds, keeping
//! neighbouring intervals on different locks when merge workers build
//! ruptures concurrently. The table is grow-only.
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use rustc_hash::FxHashMap;

use crate::error::RuptureError;
use crate::section::SectionId;

/// Number of lock shards in the intern table (power of two).
pub const NUM_CACHE_SHARDS: usize = 64;

const _: () = assert!(
    NUM_CACHE_SHARDS.is_power_of_two(),
    "NUM_CACHE_SHARDS must be a power of two"
);

const SHARD_BITS: u32 = NUM_CACHE_SHARDS.trailing_zeros();

/// Fibonacci hashing constant (2^64 / golden ratio).
const MIX: u64 = 0x9E37_79B9_7F4A_7C15;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
enum RangeKey {
    Packed(u32),
    Wide(u64),
}

impl RangeKey {
    fn encode(start: SectionId, end: SectionId) -> Self {
        if end <= u32::from(u16::MAX) {
            Self::Packed((start << 16) | end)
        } else {
            Self::Wide((u64::from(start) << 32) | u64::from(end))
        }
    }

    fn start(self) -> SectionId {
        match self {
            Self::Packed(k) => k >> 16,
            #[allow(clippy::cast_possible_truncation)]
            Self::Wide(k) => (k >> 32) as u32,
        }
    }

    fn end(self) -> SectionId {
        match self {
            Self::Packed(k) => k & 0xFFFF,
            #[allow(clippy::cast_possible_truncation)]
            Self::Wide(k) => (k & 0xFFFF_FFFF) as u32,
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn shard(self) -> usize {
        let bounds = (u64::from(self.start()) << 32) | u64::from(self.end());
        (bounds.wrapping_mul(MIX) >> (64 - SHARD_BITS)) as usize
    }
}

type InternShard = RwLock<FxHashMap<RangeKey, SectIdRange>>;

static CACHE: OnceLock<Box<[InternShard]>> = OnceLock::new();

fn cache() -> &'static [InternShard] {
    CACHE.get_or_init(|| {
        (0..NUM_CACHE_SHARDS)
            .map(|_| RwLock::new(FxHashMap::default()))
            .collect()
    })
}

fn intern(key: RangeKey) -> SectIdRange {
    let shard = &cache()[key.shard()];
    if let Some(hit) = shard
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&key)
    {
        return hit.clone();
    }
    // Another worker may have inserted between the read and write locks;
    // `entry` keeps the first allocation.
    shard
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .entry(key)
        .or_insert_with(|| SectIdRange(Arc::new(key)))
        .clone()
}

/// Canonical closed interval `[start, end]` of section ids.
#[derive(Clone)]
pub struct SectIdRange(Arc<RangeKey>);

impl SectIdRange {
    /// Returns the canonical range for `[start, end]`.
    ///
    /// # Errors
    /// Returns [`RuptureError::InvalidRange`] when `end < start`.
    pub fn build(start: SectionId, end: SectionId) -> Result<Self, RuptureError> {
        if end < start {
            return Err(RuptureError::InvalidRange { start, end });
        }
        Ok(intern(RangeKey::encode(start, end)))
    }

    /// Interns bounds the caller has already normalized.
    pub(crate) fn interned(start: SectionId, end: SectionId) -> Self {
        debug_assert!(start <= end, "range [{start}, {end}] is inverted");
        intern(RangeKey::encode(start, end))
    }

    /// Returns the single-id range `[id, id]`.
    pub fn single(id: SectionId) -> Self {
        intern(RangeKey::encode(id, id))
    }

    /// First id in the range.
    pub fn start(&self) -> SectionId {
        self.0.start()
    }

    /// Last id in the range (inclusive).
    pub fn end(&self) -> SectionId {
        self.0.end()
    }

    /// Number of ids covered.
    pub fn size(&self) -> usize {
        (self.end() - self.start()) as usize + 1
    }

    /// Returns true when `id` lies within the range.
    pub fn contains(&self, id: SectionId) -> bool {
        id >= self.start() && id <= self.end()
    }

    /// Returns true when both handles point at the same interned allocation.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    /// Number of distinct ranges interned so far in this process.
    pub fn interned_count() -> usize {
        cache()
            .iter()
            .map(|shard| shard.read().unwrap_or_else(PoisonError::into_inner).len())
            .sum()
    }
}

impl PartialEq for SectIdRange {
    fn eq(&self, other: &Self) -> bool {
        Self::ptr_eq(self, other) || (self.start() == other.start() && self.end() == other.end())
    }
}

impl Eq for SectIdRange {}

impl Hash for SectIdRange {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u32(self.start());
        state.write_u32(self.end());
    }
}

impl PartialOrd for SectIdRange {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SectIdRange {
    fn cmp(&self, other: &Self) -> Ordering {
        self.start()
            .cmp(&other.start())
            .then_with(|| self.end().cmp(&other.end()))
    }
}

impl fmt::Debug for SectIdRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SectIdRange[{},{}]", self.start(), self.end())
    }
}

impl fmt::Display for SectIdRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{},{}]", self.start(), self.end())
    }
}
