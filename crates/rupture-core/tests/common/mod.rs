// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(dead_code)]
#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use rupture_core::{ClusterRupture, FaultSection, FaultSubsectionCluster, Hash};

/// Seeds shared by randomized scenario tests.
pub const SEEDS: &[u64] = &[1, 7, 42, 0xDEAD_BEEF, 0x1234_5678_9ABC_DEF0];

/// Worker counts exercised by invariance tests.
pub const WORKER_COUNTS: &[usize] = &[1, 2, 4, 8, 16];

/// Tiny deterministic RNG (xorshift64*) so tests don't need `rand`.
#[derive(Clone)]
pub struct XorShift64 {
    state: u64,
}

impl XorShift64 {
    /// Zero seeds are replaced with 1.
    pub fn new(seed: u64) -> Self {
        Self { state: seed.max(1) }
    }

    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545_F491_4F6C_DD1D)
    }

    /// Value in `[0, upper)`; modulo bias is fine for tests.
    pub fn gen_range_usize(&mut self, upper: usize) -> usize {
        if upper <= 1 {
            return 0;
        }
        (self.next_u64() as usize) % upper
    }
}

/// Fisher–Yates shuffle (deterministic).
pub fn shuffle<T>(rng: &mut XorShift64, items: &mut [T]) {
    for i in (1..items.len()).rev() {
        let j = rng.gen_range_usize(i + 1);
        items.swap(i, j);
    }
}

pub fn sections(parent: u32, ids: &[u32]) -> Vec<FaultSection> {
    ids.iter()
        .map(|&id| FaultSection::new(id, parent, format!("parent-{parent}")))
        .collect()
}

pub fn cluster(parent: u32, ids: &[u32]) -> Arc<FaultSubsectionCluster> {
    Arc::new(FaultSubsectionCluster::new(sections(parent, ids)).unwrap())
}

/// Single-cluster rupture on `parent` covering `ids` in the given order.
pub fn single(parent: u32, ids: &[u32]) -> Arc<ClusterRupture> {
    Arc::new(ClusterRupture::from_cluster(cluster(parent, ids)))
}

/// Sections laid out on a line at `x = id` km.
pub fn id_gap(a: &FaultSection, b: &FaultSection) -> f64 {
    f64::from(a.id.abs_diff(b.id))
}

/// Order-free fingerprint of a rupture collection.
pub fn sorted_digests(ruptures: &[Arc<ClusterRupture>]) -> Vec<Hash> {
    let mut out: Vec<Hash> = ruptures.iter().map(|r| r.unique().digest()).collect();
    out.sort_unstable();
    out
}

/// Random single-fault ruptures: parent `p` owns ids `[p*100, p*100+99]`;
/// each rupture covers a contiguous run, randomly walked in either
/// direction.
pub fn random_single_fault_ruptures(
    rng: &mut XorShift64,
    parents: u32,
    per_parent: usize,
) -> Vec<Arc<ClusterRupture>> {
    let mut out = Vec::new();
    for p in 0..parents {
        for _ in 0..per_parent {
            let len = 1 + rng.gen_range_usize(6) as u32;
            let start = p * 100 + rng.gen_range_usize(90) as u32;
            let mut ids: Vec<u32> = (start..start + len).collect();
            if rng.next_u64() % 2 == 0 {
                ids.reverse();
            }
            out.push(single(p, &ids));
        }
    }
    out
}
