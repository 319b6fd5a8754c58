// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Order-independent identity of a rupture as a compact set of section ids.
//!
//! A [`UniqueRupture`] stores the ids a rupture touches as interned
//! [`SectIdRange`]s.
//!
//! **Invariant**: the range sequence is always
//! - sorted by start id in ascending order
//! - free of overlaps
//! - free of adjacent ranges (`[0,10]` and `[11,20]` are stored as `[0,20]`)
//!
//! Because the normal form is unique, two instances built from the same id
//! multiset compare equal no matter the order or direction in which the ids
//! (or partial sets) were supplied.
use std::fmt;
use std::sync::Arc;

use blake3::Hasher;

use crate::cluster::FaultSubsectionCluster;
use crate::sect_range::SectIdRange;
use crate::section::{FaultSection, SectionId};

/// Canonical 256-bit digest.
pub type Hash = [u8; 32];

/// Validates that ranges are sorted and normalized (no overlaps or adjacent ranges).
#[inline]
fn debug_assert_normalized(ranges: &[SectIdRange]) {
    debug_assert!(
        ranges
            .windows(2)
            .all(|w| u64::from(w[0].end()) + 1 < u64::from(w[1].start())),
        "ranges must be sorted and normalized (no overlaps or adjacent ranges)"
    );
}

/// Canonical set of section ids belonging to a rupture.
#[derive(Clone)]
pub struct UniqueRupture {
    ranges: Arc<[SectIdRange]>,
    size: usize,
}

impl UniqueRupture {
    /// The empty set.
    pub fn empty() -> Self {
        Self {
            ranges: Arc::from(Vec::new()),
            size: 0,
        }
    }

    /// Builds the set from any sequence of ids (any order, duplicates allowed).
    pub fn for_ids<I>(ids: I) -> Self
    where
        I: IntoIterator<Item = SectionId>,
    {
        let mut sorted: Vec<SectionId> = ids.into_iter().collect();
        sorted.sort_unstable();
        sorted.dedup();

        let mut bounds: Vec<(SectionId, SectionId)> = Vec::new();
        for id in sorted {
            match bounds.last_mut() {
                Some((_, end)) if u64::from(*end) + 1 == u64::from(id) => *end = id,
                _ => bounds.push((id, id)),
            }
        }
        Self::from_normalized_bounds(&bounds)
    }

    /// Builds the set covering the given subsections.
    pub fn for_sections(sections: &[FaultSection]) -> Self {
        Self::for_ids(sections.iter().map(|s| s.id))
    }

    /// Builds the union of every cluster's ids.
    pub fn for_clusters(clusters: &[Arc<FaultSubsectionCluster>]) -> Self {
        clusters
            .iter()
            .fold(Self::empty(), |acc, c| Self::add(&acc, &c.unique))
    }

    /// Union of two sets, coalescing ranges that become contiguous.
    ///
    /// The result is identical for `add(a, b)` and `add(b, a)`.
    pub fn add(a: &Self, b: &Self) -> Self {
        if b.ranges.is_empty() {
            return a.clone();
        }
        if a.ranges.is_empty() {
            return b.clone();
        }

        let mut merged: Vec<(SectionId, SectionId)> =
            Vec::with_capacity(a.ranges.len() + b.ranges.len());
        let mut it_a = a.ranges.iter().peekable();
        let mut it_b = b.ranges.iter().peekable();
        loop {
            let next = match (it_a.peek(), it_b.peek()) {
                (Some(x), Some(y)) => {
                    if x.start() <= y.start() {
                        it_a.next()
                    } else {
                        it_b.next()
                    }
                }
                (Some(_), None) => it_a.next(),
                (None, Some(_)) => it_b.next(),
                (None, None) => break,
            };
            let Some(range) = next else { break };
            match merged.last_mut() {
                Some((_, end)) if u64::from(range.start()) <= u64::from(*end) + 1 => {
                    *end = (*end).max(range.end());
                }
                _ => merged.push((range.start(), range.end())),
            }
        }
        Self::from_normalized_bounds(&merged)
    }

    fn from_normalized_bounds(bounds: &[(SectionId, SectionId)]) -> Self {
        let ranges: Vec<SectIdRange> = bounds
            .iter()
            .map(|&(start, end)| SectIdRange::interned(start, end))
            .collect();
        debug_assert_normalized(&ranges);
        let size = ranges.iter().map(SectIdRange::size).sum();
        Self {
            ranges: Arc::from(ranges),
            size,
        }
    }

    /// Returns true when `id` belongs to the set. `O(log range_count)`.
    pub fn contains(&self, id: SectionId) -> bool {
        let idx = self.ranges.partition_point(|r| r.start() <= id);
        idx > 0 && self.ranges[idx - 1].contains(id)
    }

    /// Returns true if any id is shared with `other`.
    ///
    /// Two-pointer sweep over both sorted range lists with early exit.
    pub fn intersects(&self, other: &Self) -> bool {
        let mut it_a = self.ranges.iter();
        let mut it_b = other.ranges.iter();
        let mut va = it_a.next();
        let mut vb = it_b.next();
        while let (Some(x), Some(y)) = (va, vb) {
            if x.end() < y.start() {
                va = it_a.next();
            } else if y.end() < x.start() {
                vb = it_b.next();
            } else {
                return true;
            }
        }
        false
    }

    /// Number of individual ids (not ranges).
    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns true when the set holds no ids.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Number of stored ranges.
    pub fn range_count(&self) -> usize {
        self.ranges.len()
    }

    /// Stored ranges in ascending order.
    pub fn ranges(&self) -> &[SectIdRange] {
        &self.ranges
    }

    /// Iterates every id in ascending order.
    pub fn iter_ids(&self) -> impl Iterator<Item = SectionId> + '_ {
        self.ranges.iter().flat_map(|r| r.start()..=r.end())
    }

    /// Stable, domain-separated digest (prefix `b"unique:"`) using BLAKE3.
    ///
    /// Each range contributes `LE_u32(start) || LE_u32(end)`. Equal sets
    /// produce equal digests across processes.
    pub fn digest(&self) -> Hash {
        let mut hasher = Hasher::new();
        hasher.update(b"unique:");
        for r in self.ranges.iter() {
            hasher.update(&r.start().to_le_bytes());
            hasher.update(&r.end().to_le_bytes());
        }
        hasher.finalize().into()
    }

    /// Hex form of [`UniqueRupture::digest`].
    pub fn digest_hex(&self) -> String {
        hex::encode(self.digest())
    }
}

impl Default for UniqueRupture {
    fn default() -> Self {
        Self::empty()
    }
}

impl PartialEq for UniqueRupture {
    fn eq(&self, other: &Self) -> bool {
        self.size == other.size && self.ranges[..] == other.ranges[..]
    }
}

impl Eq for UniqueRupture {}

impl std::hash::Hash for UniqueRupture {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.ranges[..].hash(state);
    }
}

impl fmt::Debug for UniqueRupture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UniqueRupture(size={}, {self})", self.size)
    }
}

impl fmt::Display for UniqueRupture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, r) in self.ranges.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{r}")?;
        }
        f.write_str("}")
    }
}
