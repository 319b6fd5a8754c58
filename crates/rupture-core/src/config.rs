// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Merger tuning knobs.
use std::num::NonZeroUsize;

/// Configuration for [`crate::RuptureMerger`].
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MergerConfig {
    /// Worker threads for multi-nucleation merges; `0` uses the available
    /// parallelism.
    pub workers: usize,
    /// Log progress every this many completed nucleations; `0` disables it.
    pub progress_interval: usize,
    /// Log every candidate pair examined by the filters.
    pub verbose: bool,
}

impl Default for MergerConfig {
    fn default() -> Self {
        Self {
            workers: 0,
            progress_interval: 10,
            verbose: false,
        }
    }
}

impl MergerConfig {
    /// Worker count for `jobs` units of work: never zero, never more than
    /// `jobs` (unless `jobs` is zero).
    pub fn resolved_workers(&self, jobs: usize) -> usize {
        let wanted = if self.workers == 0 {
            std::thread::available_parallelism().map_or(1, NonZeroUsize::get)
        } else {
            self.workers
        };
        wanted.min(jobs).max(1)
    }
}
