// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared fixtures for the rupture-core benchmarks.
//!
//! Parent fault `p` owns section ids `p * SECTS_PER_PARENT ..`; sections sit
//! on a line at `x = id` km, so id gaps double as jump distances.
use std::sync::Arc;

use rupture_core::{ClusterRupture, FaultSection, FaultSubsectionCluster};

/// Section ids reserved for each parent fault.
pub const SECTS_PER_PARENT: u32 = 100;

/// Distance between two sections on the id line (km).
pub fn id_gap(a: &FaultSection, b: &FaultSection) -> f64 {
    f64::from(a.id.abs_diff(b.id))
}

/// Single-fault rupture on `parent` covering `len` sections from `offset`.
///
/// Returns `None` when `len` is zero or the run would leave the parent's id
/// block.
pub fn single_fault(parent: u32, offset: u32, len: u32) -> Option<Arc<ClusterRupture>> {
    if len == 0 || offset + len > SECTS_PER_PARENT {
        return None;
    }
    let base = parent * SECTS_PER_PARENT + offset;
    let sects = (base..base + len)
        .map(|id| FaultSection::new(id, parent, format!("fault-{parent}")))
        .collect();
    let cluster = FaultSubsectionCluster::new(sects).ok()?;
    Some(Arc::new(ClusterRupture::from_cluster(Arc::new(cluster))))
}

/// Every run of `len` sections at each multiple of `stride` on `parents`
/// consecutive parent faults.
pub fn rupture_grid(parents: u32, len: u32, stride: u32) -> Vec<Arc<ClusterRupture>> {
    let stride = stride.max(1);
    (0..parents)
        .flat_map(|p| {
            (0..SECTS_PER_PARENT)
                .step_by(stride as usize)
                .filter_map(move |offset| single_fault(p, offset, len))
        })
        .collect()
}
