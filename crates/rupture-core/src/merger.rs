// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! N×M search joining nucleation ruptures to target ruptures.
//!
//! For every `(nucleation, target)` pair the registered filter chain is
//! folded (see [`crate::filter`]); each final `Pass(Some(jump))` becomes a
//! new multi-cluster rupture via [`ClusterRupture::take_splay_jump`].
//!
//! # Parallelism
//!
//! [`RuptureMerger::merge_many`] runs one independent unit per nucleation.
//! Scoped workers claim nucleation indices from a shared atomic counter, so
//! the only shared mutable state is that counter, the completion counter
//! used for progress logging, and the section-range intern table. Filters
//! and ruptures are read-only.
//!
//! Within a nucleation, output follows target order. Batch output is sorted
//! by nucleation index after collection, so it does not depend on worker
//! count or scheduling.
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::config::MergerConfig;
use crate::error::RuptureError;
use crate::filter::{CompatibilityResult, MultiRuptureCompatibilityFilter};
use crate::rupture::ClusterRupture;

const NO_FILTER: &str = "<none>";

/// Result of a multi-nucleation merge.
///
/// Nucleations are isolated: one failing does not discard what the others
/// produced.
#[derive(Debug, Default)]
pub struct MergeBatch {
    /// Merged ruptures, grouped by nucleation index, target order within.
    pub merged: Vec<Arc<ClusterRupture>>,
    /// One [`RuptureError::MergeFailed`] per failed nucleation, by index.
    pub failures: Vec<RuptureError>,
}

impl MergeBatch {
    /// Returns true when no nucleation failed.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// All merged ruptures, or the failure of the lowest failing nucleation.
    pub fn into_result(self) -> Result<Vec<Arc<ClusterRupture>>, RuptureError> {
        match self.failures.into_iter().next() {
            Some(err) => Err(err),
            None => Ok(self.merged),
        }
    }
}

/// Drives the filter chain over nucleation/target pairs.
pub struct RuptureMerger {
    config: MergerConfig,
    filters: Vec<Arc<dyn MultiRuptureCompatibilityFilter>>,
}

impl RuptureMerger {
    /// Merger with an empty filter chain.
    pub fn new(config: MergerConfig) -> Self {
        Self {
            config,
            filters: Vec::new(),
        }
    }

    /// Appends a filter to the chain. Register every filter before merging.
    pub fn add_filter<F>(&mut self, filter: F) -> &mut Self
    where
        F: MultiRuptureCompatibilityFilter + 'static,
    {
        self.add_shared_filter(Arc::new(filter))
    }

    /// Appends a filter instance that is also used elsewhere.
    pub fn add_shared_filter(
        &mut self,
        filter: Arc<dyn MultiRuptureCompatibilityFilter>,
    ) -> &mut Self {
        self.filters.push(filter);
        self
    }

    /// Registered filter names, in chain order.
    pub fn filter_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.filters.iter().map(|f| f.name())
    }

    /// Active configuration.
    pub fn config(&self) -> &MergerConfig {
        &self.config
    }

    /// Folds the chain for one pair. Returns the result and the name of the
    /// last filter applied; on error, the name of the failing filter.
    fn fold_chain(
        &self,
        nucleation: &Arc<ClusterRupture>,
        target: &Arc<ClusterRupture>,
    ) -> Result<(CompatibilityResult, &str), (&str, RuptureError)> {
        let mut result = CompatibilityResult::Pass(None);
        let mut last = NO_FILTER;
        for filter in &self.filters {
            last = filter.name();
            let outcome = filter
                .apply(&result, nucleation, target, self.config.verbose)
                .map_err(|err| (last, err))?;
            result = result.and(outcome);
            if !result.can_continue() {
                break;
            }
        }
        Ok((result, last))
    }

    /// Final chain result for one pair.
    pub fn check(
        &self,
        nucleation: &Arc<ClusterRupture>,
        target: &Arc<ClusterRupture>,
    ) -> Result<CompatibilityResult, RuptureError> {
        self.fold_chain(nucleation, target)
            .map(|(result, _)| result)
            .map_err(|(_, err)| err)
    }

    /// Merges one nucleation against every target, in target order.
    ///
    /// A pair whose chain ends in `Fail` or `Continue` is skipped. Errors are
    /// reported as [`RuptureError::MergeFailed`] with nucleation index 0.
    pub fn merge(
        &self,
        nucleation: &Arc<ClusterRupture>,
        targets: &[Arc<ClusterRupture>],
    ) -> Result<Vec<Arc<ClusterRupture>>, RuptureError> {
        self.merge_unit(0, nucleation, targets)
    }

    fn merge_unit(
        &self,
        index: usize,
        nucleation: &Arc<ClusterRupture>,
        targets: &[Arc<ClusterRupture>],
    ) -> Result<Vec<Arc<ClusterRupture>>, RuptureError> {
        let fail = |target: usize, filter: &str, source: RuptureError| RuptureError::MergeFailed {
            nucleation: index,
            target,
            filter: filter.to_owned(),
            source: Box::new(source),
        };

        let mut out = Vec::new();
        for (t, target) in targets.iter().enumerate() {
            let (result, filter) = self
                .fold_chain(nucleation, target)
                .map_err(|(filter, err)| fail(t, filter, err))?;
            match result {
                CompatibilityResult::Pass(Some(jump)) => {
                    if self.config.verbose {
                        debug!(nucleation = index, target = t, %jump, "merging");
                    }
                    let merged = ClusterRupture::take_splay_jump(&jump)
                        .map_err(|err| fail(t, filter, err))?;
                    out.push(Arc::new(merged));
                }
                CompatibilityResult::Pass(None) => {
                    return Err(fail(t, filter, RuptureError::UnresolvedJump));
                }
                CompatibilityResult::Continue(_) | CompatibilityResult::Fail => {}
            }
        }
        Ok(out)
    }

    fn report_progress(&self, done: usize, total: usize) {
        let every = self.config.progress_interval;
        if every > 0 && done % every == 0 {
            info!(completed = done, total, "merge progress");
        }
    }

    /// Merges every nucleation against every target in parallel.
    ///
    /// # Panics
    /// Re-raises a panic from any worker.
    #[instrument(skip_all, fields(nucleations = nucleations.len(), targets = targets.len()))]
    pub fn merge_many(
        &self,
        nucleations: &[Arc<ClusterRupture>],
        targets: &[Arc<ClusterRupture>],
    ) -> MergeBatch {
        if nucleations.is_empty() {
            return MergeBatch::default();
        }
        let workers = self.config.resolved_workers(nucleations.len());
        let next = AtomicUsize::new(0);
        let completed = AtomicUsize::new(0);

        let mut units: Vec<(usize, Result<Vec<Arc<ClusterRupture>>, RuptureError>)> =
            std::thread::scope(|s| {
                let handles: Vec<_> = (0..workers)
                    .map(|_| {
                        let next = &next;
                        let completed = &completed;
                        s.spawn(move || {
                            let mut local = Vec::new();
                            // Claim nucleations until none remain
                            loop {
                                let idx = next.fetch_add(1, Ordering::Relaxed);
                                let Some(nucleation) = nucleations.get(idx) else {
                                    break;
                                };
                                local.push((idx, self.merge_unit(idx, nucleation, targets)));
                                let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                                self.report_progress(done, nucleations.len());
                            }
                            local
                        })
                    })
                    .collect();

                handles
                    .into_iter()
                    .flat_map(|h| match h.join() {
                        Ok(local) => local,
                        Err(e) => std::panic::resume_unwind(e),
                    })
                    .collect()
            });
        units.sort_unstable_by_key(|(idx, _)| *idx);

        let mut batch = MergeBatch::default();
        for (idx, unit) in units {
            match unit {
                Ok(merged) => batch.merged.extend(merged),
                Err(err) => {
                    warn!(nucleation = idx, error = %err, "nucleation merge failed");
                    batch.failures.push(err);
                }
            }
        }
        info!(
            workers,
            merged = batch.merged.len(),
            failed = batch.failures.len(),
            "merge batch complete"
        );
        batch
    }
}

impl std::fmt::Debug for RuptureMerger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuptureMerger")
            .field("config", &self.config)
            .field("filters", &self.filter_names().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]
    use super::*;
    use crate::cluster::FaultSubsectionCluster;
    use crate::filter::RuptureJumpDistFilter;
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

    fn gap(a: &FaultSection, b: &FaultSection) -> f64 {
        f64::from(a.id.abs_diff(b.id))
    }

    struct PassWithoutJump;

    impl MultiRuptureCompatibilityFilter for PassWithoutJump {
        fn name(&self) -> &str {
            "pass-without-jump"
        }

        fn apply(
            &self,
            _prev: &CompatibilityResult,
            _nucleation: &Arc<ClusterRupture>,
            _target: &Arc<ClusterRupture>,
            _verbose: bool,
        ) -> Result<CompatibilityResult, RuptureError> {
            Ok(CompatibilityResult::Pass(None))
        }
    }

    #[test]
    fn merge_keeps_target_order_and_skips_failures() {
        let mut merger = RuptureMerger::new(MergerConfig::default());
        merger.add_filter(RuptureJumpDistFilter::new(3.0, gap));
        let nucl = single(1, &[0, 1]);
        let targets = [single(3, &[4]), single(4, &[40]), single(2, &[2])];
        let out = merger.merge(&nucl, &targets).unwrap();
        let parents: Vec<u32> = out
            .iter()
            .map(|r| r.splays.values().next().unwrap().clusters[0].parent_id)
            .collect();
        assert_eq!(parents, vec![3, 2]);
    }

    #[test]
    fn pass_without_jump_is_fatal_and_names_the_filter() {
        let mut merger = RuptureMerger::new(MergerConfig::default());
        merger.add_filter(PassWithoutJump);
        let err = merger
            .merge(&single(1, &[0]), &[single(2, &[1])])
            .unwrap_err();
        match err {
            RuptureError::MergeFailed {
                nucleation,
                target,
                filter,
                source,
            } => {
                assert_eq!((nucleation, target), (0, 0));
                assert_eq!(filter, "pass-without-jump");
                assert!(matches!(*source, RuptureError::UnresolvedJump));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_chain_never_resolves_a_jump() {
        let merger = RuptureMerger::new(MergerConfig::default());
        let err = merger
            .merge(&single(1, &[0]), &[single(2, &[1])])
            .unwrap_err();
        assert!(matches!(err, RuptureError::MergeFailed { ref filter, .. } if filter == NO_FILTER));
        assert!(merger.merge(&single(1, &[0]), &[]).unwrap().is_empty());
    }

    #[test]
    fn batch_keeps_results_of_healthy_nucleations() {
        let mut merger = RuptureMerger::new(MergerConfig {
            workers: 2,
            ..MergerConfig::default()
        });
        merger
            .add_filter(crate::filter::SplayCountFilter::new(1))
            .add_filter(PassWithoutJump);
        let healthy = Arc::new(
            ClusterRupture::take_splay_jump(
                &crate::jump::RuptureJump::new(0, single(1, &[0]), 5, single(2, &[5]), 1.0)
                    .unwrap(),
            )
            .unwrap(),
        );
        // The splay-count filter fails the grafted nucleation before the
        // faulty filter runs; the plain one reaches it and errors.
        let batch = merger.merge_many(&[single(7, &[70]), healthy], &[single(3, &[9])]);
        assert!(batch.merged.is_empty());
        assert_eq!(batch.failures.len(), 1);
        assert!(matches!(
            batch.failures[0],
            RuptureError::MergeFailed { nucleation: 0, .. }
        ));
        assert!(!batch.is_complete());
        assert!(batch.into_result().is_err());
    }

    #[test]
    fn empty_batch_is_complete() {
        let merger = RuptureMerger::new(MergerConfig::default());
        let batch = merger.merge_many(&[], &[single(1, &[0])]);
        assert!(batch.is_complete());
        assert!(batch.into_result().unwrap().is_empty());
    }
}
