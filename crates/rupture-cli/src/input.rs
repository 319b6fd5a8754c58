// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Rupture-set files: section catalog, pair distances and the two rupture
//! lists to merge.
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use rupture_core::{ClusterRupture, DistanceTable, FaultSection, MergerConfig, SectionId};
use serde::Deserialize;

/// On-disk rupture set. Each rupture is a section-id list in rupture order.
#[derive(Debug, Deserialize)]
pub struct RuptureSet {
    /// Every subsection referenced by a rupture.
    pub sections: Vec<FaultSection>,
    /// Precomputed `[a, b, km]` distances; missing pairs are unreachable.
    #[serde(default)]
    pub distances: Vec<(SectionId, SectionId, f64)>,
    /// Ruptures that receive splays.
    pub nucleations: Vec<Vec<SectionId>>,
    /// Ruptures grafted onto nucleations.
    pub targets: Vec<Vec<SectionId>>,
}

/// Ruptures and distances ready for merging.
#[derive(Debug)]
pub struct Prepared {
    /// Ruptures that receive splays, in file order.
    pub nucleations: Vec<Arc<ClusterRupture>>,
    /// Ruptures grafted onto nucleations, in file order.
    pub targets: Vec<Arc<ClusterRupture>>,
    /// Pair distances used for cluster jumps and the distance filter.
    pub distances: DistanceTable,
}

impl RuptureSet {
    /// Reads and parses a rupture set.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
        serde_json::from_slice(&raw).with_context(|| format!("parse {}", path.display()))
    }

    /// Resolves section ids and builds single-strand ruptures.
    pub fn prepare(self) -> Result<Prepared> {
        let catalog: HashMap<SectionId, FaultSection> =
            self.sections.into_iter().map(|s| (s.id, s)).collect();
        let distances: DistanceTable = self.distances.into_iter().collect();

        let build = |kind: &str, lists: Vec<Vec<SectionId>>| -> Result<Vec<Arc<ClusterRupture>>> {
            lists
                .into_iter()
                .enumerate()
                .map(|(i, ids)| {
                    let sects = ids
                        .iter()
                        .map(|id| {
                            catalog
                                .get(id)
                                .cloned()
                                .ok_or_else(|| anyhow!("unknown section {id} in {kind} {i}"))
                        })
                        .collect::<Result<Vec<_>>>()?;
                    let rupture = ClusterRupture::for_ordered_single_strand(&sects, &distances)
                        .with_context(|| format!("build {kind} {i}"))?;
                    Ok(Arc::new(rupture))
                })
                .collect()
        };

        let nucleations = build("nucleation", self.nucleations)?;
        let targets = build("target", self.targets)?;
        Ok(Prepared {
            nucleations,
            targets,
            distances,
        })
    }
}

/// Reads a merger config; absent fields keep their defaults.
pub fn load_config(path: &Path) -> Result<MergerConfig> {
    let raw = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_slice(&raw).with_context(|| format!("parse config {}", path.display()))
}
