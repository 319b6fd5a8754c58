// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Immutable composite ruptures built from connected clusters.
//!
//! A [`ClusterRupture`] has a primary strand (`clusters` joined in order by
//! `internal_jumps`) plus any number of splays: whole sub-ruptures grafted on
//! by a jump from one of its sections. Splays may carry splays of their own.
//!
//! Every section appears at most once in a rupture. Each section may have
//! several descendants but only one predecessor.
//!
//! Ruptures are never mutated. [`ClusterRupture::take`] and
//! [`ClusterRupture::take_splay_jump`] return new instances that share the
//! unchanged parts (cluster list, jump list, splay entries) with their source.
//!
//! Identity is the section set alone: two ruptures are equal when their
//! [`UniqueRupture`]s are, regardless of traversal order or direction.
use std::fmt;
use std::sync::{Arc, OnceLock};

use rustc_hash::FxHashSet;

use crate::cluster::FaultSubsectionCluster;
use crate::distance::SectionDistance;
use crate::error::RuptureError;
use crate::jump::Jump;
use crate::navigator::RuptureTreeNavigator;
use crate::section::{FaultSection, SectionId};
use crate::splays::SplayMap;
use crate::unique::UniqueRupture;

/// How a rupture was constructed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RuptureKind {
    /// Grown cluster by cluster from a single starting cluster.
    Cluster,
    /// Produced by grafting a complete rupture onto another.
    MultiCluster,
}

/// Immutable rupture: primary strand, splays and precomputed identity.
///
/// Fields are read through accessors only, so the cached navigator and the
/// precomputed identities always describe the clusters they were built from.
#[derive(Clone)]
pub struct ClusterRupture {
    /// Primary strand clusters, in order. The first section of the rupture
    /// is `clusters[0].start_sect`.
    pub(crate) clusters: Arc<[Arc<FaultSubsectionCluster>]>,
    /// Jumps between consecutive primary clusters (`clusters.len() - 1`).
    pub(crate) internal_jumps: Arc<[Jump]>,
    /// Jump to each splay sub-rupture.
    pub(crate) splays: SplayMap,
    /// Every section, splays included.
    pub(crate) unique: UniqueRupture,
    /// Primary strand sections only.
    pub(crate) internal_unique: UniqueRupture,
    /// True when every jump leaves the last section of a cluster and lands
    /// on the first section of the next, with no splays.
    pub(crate) single_strand: bool,
    /// Construction path.
    pub(crate) kind: RuptureKind,
    navigator: OnceLock<RuptureTreeNavigator>,
}

impl ClusterRupture {
    pub(crate) fn assemble(
        clusters: Arc<[Arc<FaultSubsectionCluster>]>,
        internal_jumps: Arc<[Jump]>,
        splays: SplayMap,
        unique: UniqueRupture,
        internal_unique: UniqueRupture,
        single_strand: bool,
        kind: RuptureKind,
    ) -> Self {
        debug_assert_eq!(internal_jumps.len() + 1, clusters.len());
        debug_assert!(internal_unique.size() <= unique.size());
        Self {
            clusters,
            internal_jumps,
            splays,
            unique,
            internal_unique,
            single_strand,
            kind,
            navigator: OnceLock::new(),
        }
    }

    /// Single-cluster rupture; grow it with [`ClusterRupture::take`].
    pub fn from_cluster(cluster: Arc<FaultSubsectionCluster>) -> Self {
        let unique = cluster.unique.clone();
        Self::assemble(
            Arc::from(vec![cluster]),
            Arc::from(Vec::new()),
            SplayMap::new(),
            unique.clone(),
            unique,
            true,
            RuptureKind::Cluster,
        )
    }

    /// Assembles a rupture from its parts, computing both identities once.
    ///
    /// # Errors
    /// [`RuptureError::EmptyCluster`] without clusters and
    /// [`RuptureError::JumpCountMismatch`] unless there are exactly
    /// `clusters.len() - 1` internal jumps.
    pub fn from_parts(
        clusters: Vec<Arc<FaultSubsectionCluster>>,
        internal_jumps: Vec<Jump>,
        splays: SplayMap,
    ) -> Result<Self, RuptureError> {
        if clusters.is_empty() {
            return Err(RuptureError::EmptyCluster);
        }
        if internal_jumps.len() + 1 != clusters.len() {
            return Err(RuptureError::JumpCountMismatch {
                expected: clusters.len() - 1,
                found: internal_jumps.len(),
            });
        }
        let internal_unique = UniqueRupture::for_clusters(&clusters);
        let unique = splays
            .values()
            .fold(internal_unique.clone(), |acc, splay| {
                UniqueRupture::add(&acc, &splay.unique)
            });
        let single_strand = splays.is_empty()
            && internal_jumps.iter().all(|jump| {
                jump.from_section == *jump.from_cluster.last_sect()
                    && jump.to_section == *jump.to_cluster.first_sect()
            });
        Ok(Self::assemble(
            Arc::from(clusters),
            Arc::from(internal_jumps),
            splays,
            unique,
            internal_unique,
            single_strand,
            RuptureKind::Cluster,
        ))
    }

    /// Builds a single-strand rupture from sections listed in rupture order.
    ///
    /// Consecutive sections sharing a parent form one cluster. Each jump
    /// leaves the last section of a cluster for the first of the next, with
    /// the smallest section-to-section distance between the two clusters.
    ///
    /// # Errors
    /// [`RuptureError::EmptyCluster`] for an empty list,
    /// [`RuptureError::DuplicateSection`] when a section repeats.
    pub fn for_ordered_single_strand<D>(
        sections: &[FaultSection],
        distance: &D,
    ) -> Result<Self, RuptureError>
    where
        D: SectionDistance + ?Sized,
    {
        let mut seen = FxHashSet::default();
        if let Some(dup) = sections.iter().find(|s| !seen.insert(s.id)) {
            return Err(RuptureError::DuplicateSection { section: dup.id });
        }

        let mut clusters: Vec<Arc<FaultSubsectionCluster>> = Vec::new();
        for run in sections.chunk_by(|a, b| a.parent_id == b.parent_id) {
            clusters.push(Arc::new(FaultSubsectionCluster::new(run.to_vec())?));
        }
        if clusters.is_empty() {
            return Err(RuptureError::EmptyCluster);
        }

        let jumps: Vec<Jump> = clusters
            .windows(2)
            .map(|pair| {
                let (from, to) = (&pair[0], &pair[1]);
                let dist = from
                    .subsects
                    .iter()
                    .flat_map(|a| to.subsects.iter().map(move |b| distance.distance(a, b)))
                    .fold(f64::INFINITY, f64::min);
                Jump::new(
                    from.last_sect().clone(),
                    Arc::clone(from),
                    to.start_sect.clone(),
                    Arc::clone(to),
                    dist,
                )
            })
            .collect();

        let unique = UniqueRupture::for_clusters(&clusters);
        Ok(Self::assemble(
            Arc::from(clusters),
            Arc::from(jumps),
            SplayMap::new(),
            unique.clone(),
            unique,
            true,
            RuptureKind::Cluster,
        ))
    }

    /// Returns a new rupture that has taken `jump`.
    ///
    /// The jump may leave from any section, splays included:
    /// - from an exit section of the last primary cluster it extends the
    ///   primary strand
    /// - from any other primary section it starts a new splay
    /// - from a splay section it grows that splay
    ///
    /// # Errors
    /// [`RuptureError::MissingFromSection`] when the from-section is not in
    /// the rupture, [`RuptureError::DuplicateSection`] when the destination
    /// cluster overlaps it.
    pub fn take(&self, jump: &Jump) -> Result<Self, RuptureError> {
        let from = jump.from_section.id;
        if !self.contains(from) {
            return Err(RuptureError::MissingFromSection { section: from });
        }
        if let Some(dup) = jump
            .to_cluster
            .subsects
            .iter()
            .find(|s| self.unique.contains(s.id))
        {
            return Err(RuptureError::DuplicateSection { section: dup.id });
        }

        let unique = UniqueRupture::add(&self.unique, &jump.to_cluster.unique);
        let lands_on_first = jump.to_section == *jump.to_cluster.first_sect();

        if self.contains_internal(from) {
            let last = &self.clusters[self.clusters.len() - 1];
            if last.is_end_sect(from) {
                let mut clusters = self.clusters.to_vec();
                clusters.push(Arc::clone(&jump.to_cluster));
                let mut jumps = self.internal_jumps.to_vec();
                jumps.push(jump.clone());
                let single_strand =
                    self.single_strand && lands_on_first && last.last_sect().id == from;
                return Ok(Self::assemble(
                    Arc::from(clusters),
                    Arc::from(jumps),
                    self.splays.clone(),
                    unique,
                    UniqueRupture::add(&self.internal_unique, &jump.to_cluster.unique),
                    single_strand,
                    self.kind,
                ));
            }
            let splay = Arc::new(Self::from_cluster(Arc::clone(&jump.to_cluster)));
            return Ok(Self::assemble(
                Arc::clone(&self.clusters),
                Arc::clone(&self.internal_jumps),
                self.splays.with_entry(jump.clone(), splay),
                unique,
                self.internal_unique.clone(),
                false,
                self.kind,
            ));
        }

        let missing = RuptureError::MissingFromSection { section: from };
        let (splay_jump, splay) = self
            .splays
            .iter()
            .find(|(_, splay)| splay.contains(from))
            .ok_or(missing)?;
        let grown = Arc::new(splay.take(jump)?);
        let splays = self
            .splays
            .with_replaced(splay_jump, grown)
            .ok_or(RuptureError::MissingFromSection { section: from })?;
        Ok(Self::assemble(
            Arc::clone(&self.clusters),
            Arc::clone(&self.internal_jumps),
            splays,
            unique,
            self.internal_unique.clone(),
            false,
            self.kind,
        ))
    }

    /// The same rupture traversed end to start.
    ///
    /// # Errors
    /// [`RuptureError::NotSingleStrand`] unless the rupture is single strand.
    pub fn reversed(&self) -> Result<Self, RuptureError> {
        if !self.single_strand {
            return Err(RuptureError::NotSingleStrand);
        }
        let clusters: Vec<Arc<FaultSubsectionCluster>> = self
            .clusters
            .iter()
            .rev()
            .map(|c| Arc::new(c.reversed()))
            .collect();
        // New jump `i` spans the same gap as source jump `n - 2 - i`.
        let jumps: Vec<Jump> = clusters
            .windows(2)
            .zip(self.internal_jumps.iter().rev())
            .map(|(pair, source)| {
                Jump::new(
                    pair[0].last_sect().clone(),
                    Arc::clone(&pair[0]),
                    pair[1].start_sect.clone(),
                    Arc::clone(&pair[1]),
                    source.distance,
                )
            })
            .collect();
        Ok(Self::assemble(
            Arc::from(clusters),
            Arc::from(jumps),
            SplayMap::new(),
            self.unique.clone(),
            self.internal_unique.clone(),
            true,
            self.kind,
        ))
    }

    /// Primary strand sections in rupture order. Lazy and restartable
    /// (`clone` the iterator to walk it again); splays are not included.
    pub fn build_ordered_section_list(&self) -> impl Iterator<Item = &FaultSection> + Clone + '_ {
        self.clusters.iter().flat_map(|c| c.subsects.iter())
    }

    /// Every section, splays included. Each splay's sections follow the
    /// cluster it branches from.
    pub fn build_full_section_list(&self) -> Vec<&FaultSection> {
        let mut out = Vec::with_capacity(self.unique.size());
        self.push_full_sections(&mut out);
        out
    }

    fn push_full_sections<'a>(&'a self, out: &mut Vec<&'a FaultSection>) {
        for cluster in self.clusters.iter() {
            out.extend(cluster.subsects.iter());
            for sect in cluster.subsects.iter() {
                for (jump, splay) in self.splays.iter() {
                    if jump.from_section == *sect {
                        splay.push_full_sections(out);
                    }
                }
            }
        }
        // Splays grafted from a section inside another splay.
        for (jump, splay) in self.splays.iter() {
            if !self.contains_internal(jump.from_section.id) {
                splay.push_full_sections(out);
            }
        }
    }

    /// Primary strand clusters, in order.
    pub fn clusters(&self) -> &[Arc<FaultSubsectionCluster>] {
        &self.clusters
    }

    /// Jumps between consecutive primary clusters.
    pub fn internal_jumps(&self) -> &[Jump] {
        &self.internal_jumps
    }

    /// Splay jumps and the ruptures they lead to.
    pub fn splays(&self) -> &SplayMap {
        &self.splays
    }

    /// Every section id, splays included.
    pub fn unique(&self) -> &UniqueRupture {
        &self.unique
    }

    /// Primary strand section ids.
    pub fn internal_unique(&self) -> &UniqueRupture {
        &self.internal_unique
    }

    /// True when every jump leaves the last section of a cluster and lands on
    /// the first section of the next, with no splays.
    pub fn is_single_strand(&self) -> bool {
        self.single_strand
    }

    /// Construction path.
    pub fn kind(&self) -> RuptureKind {
        self.kind
    }

    /// Cluster navigator, built on first use and cached.
    pub fn tree_navigator(&self) -> &RuptureTreeNavigator {
        self.navigator.get_or_init(|| RuptureTreeNavigator::new(self))
    }

    /// Returns true if any section (splays included) has this id.
    pub fn contains(&self, id: SectionId) -> bool {
        self.unique.contains(id)
    }

    /// Returns true if the primary strand has this section id.
    pub fn contains_internal(&self, id: SectionId) -> bool {
        self.internal_unique.contains(id)
    }

    /// Returns true for ruptures produced by grafting two ruptures together.
    pub fn is_multi_cluster(&self) -> bool {
        self.kind == RuptureKind::MultiCluster
    }

    /// Sections across the rupture and its splays.
    pub fn total_num_sects(&self) -> usize {
        self.unique.size()
    }

    /// Sections on the primary strand.
    pub fn num_internal_sects(&self) -> usize {
        self.internal_unique.size()
    }

    /// Jumps along every strand plus the jumps into each splay.
    pub fn total_num_jumps(&self) -> usize {
        self.internal_jumps.len()
            + self.splays.len()
            + self
                .splays
                .values()
                .map(|s| s.total_num_jumps())
                .sum::<usize>()
    }

    /// Clusters across the rupture and its splays.
    pub fn total_num_clusters(&self) -> usize {
        self.clusters.len()
            + self
                .splays
                .values()
                .map(|s| s.total_num_clusters())
                .sum::<usize>()
    }

    /// Splays at every depth.
    pub fn total_num_splays(&self) -> usize {
        self.splays.len()
            + self
                .splays
                .values()
                .map(|s| s.total_num_splays())
                .sum::<usize>()
    }

    /// Every cluster: primary strand first, then each splay recursively.
    pub fn clusters_iter(&self) -> Box<dyn Iterator<Item = &Arc<FaultSubsectionCluster>> + '_> {
        Box::new(
            self.clusters
                .iter()
                .chain(self.splays.values().flat_map(|s| s.clusters_iter())),
        )
    }

    /// Every strand: this rupture first, then each splay's strands
    /// depth-first in splay insertion order.
    pub fn strands_iter(&self) -> Box<dyn Iterator<Item = &ClusterRupture> + '_> {
        Box::new(
            std::iter::once(self).chain(self.splays.values().flat_map(|s| s.strands_iter())),
        )
    }

    /// Every jump: internal, then splay entry jumps, then each splay's own.
    pub fn jumps_iter(&self) -> Box<dyn Iterator<Item = &Jump> + '_> {
        Box::new(
            self.internal_jumps
                .iter()
                .chain(self.splays.keys())
                .chain(self.splays.values().flat_map(|s| s.jumps_iter())),
        )
    }
}

impl PartialEq for ClusterRupture {
    fn eq(&self, other: &Self) -> bool {
        self.unique == other.unique
    }
}

impl Eq for ClusterRupture {}

impl std::hash::Hash for ClusterRupture {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.unique.hash(state);
    }
}

impl fmt::Debug for ClusterRupture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClusterRupture")
            .field("kind", &self.kind)
            .field("clusters", &self.clusters.len())
            .field("splays", &self.splays.len())
            .field("unique", &self.unique)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for ClusterRupture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.single_strand {
            for cluster in self.clusters.iter() {
                write!(f, "{cluster}")?;
            }
        } else {
            let nav = self.tree_navigator();
            for (i, cluster) in self.clusters.iter().enumerate() {
                let entry = if i == 0 {
                    None
                } else {
                    nav.jump(&self.clusters[i - 1], cluster)
                        .map(|j| j.to_section.id)
                        .filter(|&id| id != cluster.first_sect().id)
                };
                f.write_str(&cluster.display_with_entry(entry))?;
            }
        }
        for (jump, splay) in self.splays.iter() {
            write!(
                f,
                "\n\t--splay from [{}:{}]: {splay}",
                jump.from_cluster.parent_id, jump.from_section.id
            )?;
        }
        Ok(())
    }
}
