// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Grafting one complete rupture onto another.
use std::sync::Arc;

use crate::error::RuptureError;
use crate::jump::RuptureJump;
use crate::rupture::{ClusterRupture, RuptureKind};
use crate::unique::UniqueRupture;

impl ClusterRupture {
    /// Builds the multi-cluster rupture produced by taking `jump`.
    ///
    /// The primary strand (clusters, internal jumps, internal identity) is
    /// inherited from `jump.from_rupture` and shared, not copied. The splay
    /// map is the source's map plus `jump -> jump.to_rupture`; the source's
    /// entries are shared with it. `unique` is the union of both ruptures.
    ///
    /// Section overlap between the two ruptures is not checked here; register
    /// [`crate::SectionOverlapFilter`] to reject overlapping pairs.
    ///
    /// # Errors
    /// [`RuptureError::DuplicateSplay`] when the jump is already a splay key
    /// of the source rupture.
    pub fn take_splay_jump(jump: &RuptureJump) -> Result<Self, RuptureError> {
        let from = &jump.from_rupture;
        let key = jump.jump();
        if from.splays.contains_jump(key) {
            return Err(RuptureError::DuplicateSplay {
                from: key.from_section.id,
                to: key.to_section.id,
            });
        }
        Ok(Self::assemble(
            Arc::clone(&from.clusters),
            Arc::clone(&from.internal_jumps),
            from.splays.with_entry(key.clone(), Arc::clone(&jump.to_rupture)),
            UniqueRupture::add(&from.unique, &jump.to_rupture.unique),
            from.internal_unique.clone(),
            false,
            RuptureKind::MultiCluster,
        ))
    }
}
