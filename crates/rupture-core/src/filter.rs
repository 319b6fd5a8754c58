// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Compatibility filter chain deciding whether two ruptures may merge.
//!
//! Each filter looks at a `(nucleation, target)` pair and answers with a
//! [`CompatibilityResult`]. The merger folds the answers:
//!
//! ```text
//! result = Pass(None)
//! for filter in chain:
//!     result = result.and(filter.apply(&result, nucleation, target))
//!     if !result.can_continue(): break
//! ```
//!
//! Only a final `Pass(Some(jump))` is merged. `Fail` is the ordinary "no"
//! answer and never an error.
use std::sync::Arc;

use tracing::debug;

use crate::distance::SectionDistance;
use crate::error::RuptureError;
use crate::jump::RuptureJump;
use crate::rupture::ClusterRupture;

/// Outcome of one filter, or of a folded chain.
#[derive(Clone, Debug)]
pub enum CompatibilityResult {
    /// Compatible. Carries the connecting jump when one is known.
    Pass(Option<RuptureJump>),
    /// Undecided; later filters must run. May carry a provisional jump.
    Continue(Option<RuptureJump>),
    /// Incompatible.
    Fail,
}

impl CompatibilityResult {
    /// Folds `other` into `self`.
    ///
    /// `Fail` on either side wins. Otherwise the outcome kind is `other`'s
    /// and the jump is `other`'s when it has one, else `self`'s.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        match (self, other) {
            (Self::Fail, _) | (_, Self::Fail) => Self::Fail,
            (prev, Self::Pass(jump)) => Self::Pass(jump.or_else(|| prev.into_jump())),
            (prev, Self::Continue(jump)) => Self::Continue(jump.or_else(|| prev.into_jump())),
        }
    }

    /// Returns true only for `Continue`.
    pub fn can_continue(&self) -> bool {
        matches!(self, Self::Continue(_))
    }

    /// Returns true for `Pass`, with or without a jump.
    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass(_))
    }

    /// Returns true for `Fail`.
    pub fn is_fail(&self) -> bool {
        matches!(self, Self::Fail)
    }

    /// Carried jump, if any.
    pub fn jump(&self) -> Option<&RuptureJump> {
        match self {
            Self::Pass(jump) | Self::Continue(jump) => jump.as_ref(),
            Self::Fail => None,
        }
    }

    /// Consumes the result, returning its jump.
    pub fn into_jump(self) -> Option<RuptureJump> {
        match self {
            Self::Pass(jump) | Self::Continue(jump) => jump,
            Self::Fail => None,
        }
    }
}

/// One link of the compatibility chain.
///
/// Filters are registered once and then shared read-only across merge
/// workers; they must not keep per-call state.
pub trait MultiRuptureCompatibilityFilter: Send + Sync {
    /// Short name used in logs and merge errors.
    fn name(&self) -> &str;

    /// Judges `(nucleation, target)` given the chain result so far.
    ///
    /// # Errors
    /// Only for structural invariant violations; an incompatible pair is
    /// `Ok(CompatibilityResult::Fail)`.
    fn apply(
        &self,
        prev: &CompatibilityResult,
        nucleation: &Arc<ClusterRupture>,
        target: &Arc<ClusterRupture>,
        verbose: bool,
    ) -> Result<CompatibilityResult, RuptureError>;
}

/// Passes on the first section pair within `max_dist`.
///
/// Scans every section of the target (splays included, in full section
/// list order) against every section of the nucleation's first cluster and
/// stops at the first pair whose distance is `<= max_dist`. This is a
/// first-match search: the scan order decides the jump when several pairs
/// qualify.
pub struct RuptureJumpDistFilter {
    max_dist: f64,
    calc: Arc<dyn SectionDistance>,
}

impl RuptureJumpDistFilter {
    /// Filter with its own calculator.
    pub fn new<D: SectionDistance + 'static>(max_dist: f64, calc: D) -> Self {
        Self::with_shared(max_dist, Arc::new(calc))
    }

    /// Filter sharing a calculator (and any memo it keeps) with other users.
    pub fn with_shared(max_dist: f64, calc: Arc<dyn SectionDistance>) -> Self {
        Self { max_dist, calc }
    }

    /// Maximum jump distance (km).
    pub fn max_dist(&self) -> f64 {
        self.max_dist
    }
}

impl std::fmt::Debug for RuptureJumpDistFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuptureJumpDistFilter")
            .field("max_dist", &self.max_dist)
            .finish_non_exhaustive()
    }
}

impl MultiRuptureCompatibilityFilter for RuptureJumpDistFilter {
    fn name(&self) -> &str {
        "jump-distance"
    }

    fn apply(
        &self,
        _prev: &CompatibilityResult,
        nucleation: &Arc<ClusterRupture>,
        target: &Arc<ClusterRupture>,
        verbose: bool,
    ) -> Result<CompatibilityResult, RuptureError> {
        let first = &nucleation.clusters[0];
        for target_sect in target.build_full_section_list() {
            for nucl_sect in first.subsects.iter() {
                let km = self.calc.distance(nucl_sect, target_sect);
                if verbose {
                    debug!(
                        from = nucl_sect.id,
                        to = target_sect.id,
                        km,
                        max = self.max_dist,
                        "jump candidate"
                    );
                }
                if km <= self.max_dist {
                    let jump = RuptureJump::new(
                        nucl_sect.id,
                        Arc::clone(nucleation),
                        target_sect.id,
                        Arc::clone(target),
                        km,
                    )?;
                    return Ok(CompatibilityResult::Pass(Some(jump)));
                }
            }
        }
        Ok(CompatibilityResult::Fail)
    }
}

/// Rejects pairs that share any section.
#[derive(Clone, Copy, Debug, Default)]
pub struct SectionOverlapFilter;

impl MultiRuptureCompatibilityFilter for SectionOverlapFilter {
    fn name(&self) -> &str {
        "section-overlap"
    }

    fn apply(
        &self,
        _prev: &CompatibilityResult,
        nucleation: &Arc<ClusterRupture>,
        target: &Arc<ClusterRupture>,
        verbose: bool,
    ) -> Result<CompatibilityResult, RuptureError> {
        if nucleation.unique.intersects(&target.unique) {
            if verbose {
                debug!(nucleation = %nucleation.unique, target = %target.unique, "overlap");
            }
            return Ok(CompatibilityResult::Fail);
        }
        Ok(CompatibilityResult::Continue(None))
    }
}

/// Rejects nucleations that already carry `max_splays` splays or more.
#[derive(Clone, Copy, Debug)]
pub struct SplayCountFilter {
    max_splays: usize,
}

impl SplayCountFilter {
    /// Filter admitting nucleations with fewer than `max_splays` splays.
    pub fn new(max_splays: usize) -> Self {
        Self { max_splays }
    }
}

impl MultiRuptureCompatibilityFilter for SplayCountFilter {
    fn name(&self) -> &str {
        "splay-count"
    }

    fn apply(
        &self,
        _prev: &CompatibilityResult,
        nucleation: &Arc<ClusterRupture>,
        _target: &Arc<ClusterRupture>,
        _verbose: bool,
    ) -> Result<CompatibilityResult, RuptureError> {
        if nucleation.total_num_splays() >= self.max_splays {
            return Ok(CompatibilityResult::Fail);
        }
        Ok(CompatibilityResult::Continue(None))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::cluster::FaultSubsectionCluster;
    use crate::section::FaultSection;

    fn single(parent: u32, ids: &[u32]) -> Arc<ClusterRupture> {
        let sects = ids
            .iter()
            .map(|&id| FaultSection::new(id, parent, "f"))
            .collect();
        Arc::new(ClusterRupture::from_cluster(Arc::new(
            FaultSubsectionCluster::new(sects).unwrap(),
        )))
    }

    fn some_jump() -> RuptureJump {
        RuptureJump::new(0, single(1, &[0]), 5, single(2, &[5]), 1.0).unwrap()
    }

    fn by_id_gap(a: &FaultSection, b: &FaultSection) -> f64 {
        f64::from(a.id.abs_diff(b.id))
    }

    #[test]
    fn fail_absorbs_everything() {
        let pass = CompatibilityResult::Pass(Some(some_jump()));
        assert!(pass.clone().and(CompatibilityResult::Fail).is_fail());
        assert!(CompatibilityResult::Fail.and(pass).is_fail());
        assert!(CompatibilityResult::Fail
            .and(CompatibilityResult::Continue(None))
            .is_fail());
    }

    #[test]
    fn kind_follows_other_and_jump_is_kept() {
        let provisional = CompatibilityResult::Continue(Some(some_jump()));
        let folded = provisional.clone().and(CompatibilityResult::Pass(None));
        assert!(folded.is_pass());
        assert_eq!(folded.jump().map(|j| j.to_section.id), Some(5));

        let back = CompatibilityResult::Pass(None).and(provisional);
        assert!(back.can_continue());
        assert!(back.jump().is_some());

        let newer = RuptureJump::new(0, single(1, &[0]), 7, single(3, &[7]), 2.0).unwrap();
        let replaced = CompatibilityResult::Continue(Some(some_jump()))
            .and(CompatibilityResult::Pass(Some(newer)));
        assert_eq!(replaced.into_jump().map(|j| j.to_section.id), Some(7));
    }

    #[test]
    fn only_continue_can_continue() {
        assert!(CompatibilityResult::Continue(None).can_continue());
        assert!(!CompatibilityResult::Pass(None).can_continue());
        assert!(!CompatibilityResult::Fail.can_continue());
    }

    #[test]
    fn distance_filter_takes_first_pair_in_scan_order() {
        let nucl = single(1, &[0, 1, 2]);
        let target = single(2, &[4, 3]);
        let filter = RuptureJumpDistFilter::new(2.0, by_id_gap);
        let res = filter
            .apply(&CompatibilityResult::Pass(None), &nucl, &target, false)
            .unwrap();
        // Target section 4 is scanned first; 4-2 = 2 qualifies before 3-2 = 1.
        let jump = res.jump().unwrap();
        assert!(res.is_pass());
        assert_eq!((jump.from_section.id, jump.to_section.id), (2, 4));
        assert!(jump.distance <= 2.0);
        assert!(Arc::ptr_eq(&jump.from_rupture, &nucl));
    }

    #[test]
    fn distance_filter_fails_when_nothing_is_close() {
        let nucl = single(1, &[0, 1]);
        let target = single(2, &[10, 11]);
        let filter = RuptureJumpDistFilter::new(5.0, by_id_gap);
        assert!(filter
            .apply(&CompatibilityResult::Pass(None), &nucl, &target, true)
            .unwrap()
            .is_fail());
    }

    #[test]
    fn distance_filter_only_uses_first_nucleation_cluster() {
        let a = FaultSubsectionCluster::new(vec![FaultSection::new(0, 1, "a")]).unwrap();
        let b = FaultSubsectionCluster::new(vec![FaultSection::new(9, 2, "b")]).unwrap();
        let (a, b) = (Arc::new(a), Arc::new(b));
        let nucl = Arc::new(
            ClusterRupture::from_cluster(Arc::clone(&a))
                .take(&crate::jump::Jump::new(
                    a.first_sect().clone(),
                    Arc::clone(&a),
                    b.first_sect().clone(),
                    Arc::clone(&b),
                    9.0,
                ))
                .unwrap(),
        );
        let target = single(3, &[10]);
        let filter = RuptureJumpDistFilter::new(1.0, by_id_gap);
        assert!(filter
            .apply(&CompatibilityResult::Pass(None), &nucl, &target, false)
            .unwrap()
            .is_fail());
    }

    #[test]
    fn overlap_and_splay_filters() {
        let nucl = single(1, &[0, 1]);
        let overlapping = single(1, &[1, 2]);
        let disjoint = single(2, &[5]);
        let prev = CompatibilityResult::Pass(None);
        let overlap = SectionOverlapFilter;
        assert!(overlap.apply(&prev, &nucl, &overlapping, true).unwrap().is_fail());
        assert!(overlap
            .apply(&prev, &nucl, &disjoint, false)
            .unwrap()
            .can_continue());

        let splays = SplayCountFilter::new(1);
        assert!(splays
            .apply(&prev, &nucl, &disjoint, false)
            .unwrap()
            .can_continue());
        let grafted = Arc::new(
            ClusterRupture::take_splay_jump(
                &RuptureJump::new(0, Arc::clone(&nucl), 5, disjoint, 1.0).unwrap(),
            )
            .unwrap(),
        );
        assert!(splays
            .apply(&prev, &grafted, &single(3, &[9]), false)
            .unwrap()
            .is_fail());
    }
}
