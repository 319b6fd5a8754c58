// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Cluster-level view of a rupture tree (primary strand plus splays).
//!
//! Clusters are indexed by position: primary strand first, then each splay
//! depth-first. A grafted splay may repeat sections of the rupture it hangs
//! from, so a section id maps to the first cluster that holds it while links
//! are always made between positions. A cluster has at most one predecessor
//! and any number of descendants.
use rustc_hash::FxHashMap;
use std::sync::Arc;

use crate::cluster::FaultSubsectionCluster;
use crate::jump::Jump;
use crate::rupture::ClusterRupture;
use crate::section::SectionId;

/// Predecessor/descendant index over every cluster of a rupture.
#[derive(Clone, Debug, Default)]
pub struct RuptureTreeNavigator {
    clusters: Vec<Arc<FaultSubsectionCluster>>,
    by_section: FxHashMap<SectionId, usize>,
    jumps: Vec<(usize, usize, Jump)>,
    predecessor: Vec<Option<usize>>,
}

impl RuptureTreeNavigator {
    /// Indexes `rupture` and all of its splays, recursively.
    pub fn new(rupture: &ClusterRupture) -> Self {
        let mut nav = Self::default();
        nav.index_strand(rupture);
        nav
    }

    /// Indexes one strand and its splays; returns the strand's first position.
    fn index_strand(&mut self, rupture: &ClusterRupture) -> usize {
        let base = self.clusters.len();
        for cluster in rupture.clusters.iter() {
            let idx = self.clusters.len();
            self.clusters.push(Arc::clone(cluster));
            self.predecessor.push(None);
            for sect in cluster.subsects.iter() {
                self.by_section.entry(sect.id).or_insert(idx);
            }
        }
        // Splays are indexed before linking so a splay jump may leave any
        // cluster of the tree, including one inside an earlier splay.
        let roots: Vec<usize> = rupture
            .splays
            .values()
            .map(|splay| self.index_strand(splay))
            .collect();
        for (i, jump) in rupture.internal_jumps.iter().enumerate() {
            self.link(base + i, base + i + 1, jump);
        }
        for (jump, root) in rupture.splays.keys().zip(roots) {
            let from = self
                .position_of(&jump.from_cluster)
                .or_else(|| self.by_section.get(&jump.from_section.id).copied());
            if let Some(from) = from {
                self.link(from, root, jump);
            }
        }
        base
    }

    fn link(&mut self, from: usize, to: usize, jump: &Jump) {
        if self.predecessor[to].is_none() {
            self.predecessor[to] = Some(from);
        }
        self.jumps.push((from, to, jump.clone()));
    }

    /// Position of `cluster`: the same allocation if present, otherwise the
    /// first equal cluster.
    fn position_of(&self, cluster: &FaultSubsectionCluster) -> Option<usize> {
        self.clusters
            .iter()
            .position(|c| std::ptr::eq(c.as_ref(), cluster))
            .or_else(|| self.clusters.iter().position(|c| **c == *cluster))
    }

    /// Cluster that owns `section`, if the rupture contains it. A section
    /// repeated by a grafted splay resolves to its first owner.
    pub fn locate_cluster(&self, section: SectionId) -> Option<&Arc<FaultSubsectionCluster>> {
        self.by_section.get(&section).map(|&idx| &self.clusters[idx])
    }

    /// Cluster jumped from to reach `cluster`; `None` for a root.
    pub fn predecessor(
        &self,
        cluster: &FaultSubsectionCluster,
    ) -> Option<&Arc<FaultSubsectionCluster>> {
        let idx = self.position_of(cluster)?;
        self.predecessor[idx].map(|p| &self.clusters[p])
    }

    /// Clusters reached by a jump out of `cluster`, in jump order.
    pub fn descendants(&self, cluster: &FaultSubsectionCluster) -> Vec<&Arc<FaultSubsectionCluster>> {
        let Some(idx) = self.position_of(cluster) else {
            return Vec::new();
        };
        self.jumps
            .iter()
            .filter(|(from, _, _)| *from == idx)
            .map(|(_, to, _)| &self.clusters[*to])
            .collect()
    }

    /// Jump connecting `from` to `to`, if one exists.
    pub fn jump(
        &self,
        from: &FaultSubsectionCluster,
        to: &FaultSubsectionCluster,
    ) -> Option<&Jump> {
        let (from, to) = (self.position_of(from)?, self.position_of(to)?);
        self.jumps
            .iter()
            .find(|(f, t, _)| *f == from && *t == to)
            .map(|(_, _, jump)| jump)
    }

    /// Every cluster: primary strand first, then splays depth-first.
    pub fn clusters(&self) -> &[Arc<FaultSubsectionCluster>] {
        &self.clusters
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::jump::RuptureJump;
    use crate::section::FaultSection;

    fn cluster(parent: u32, ids: &[u32]) -> Arc<FaultSubsectionCluster> {
        let sects = ids
            .iter()
            .map(|&id| FaultSection::new(id, parent, "f"))
            .collect();
        Arc::new(FaultSubsectionCluster::new(sects).unwrap())
    }

    fn hop(from: &Arc<FaultSubsectionCluster>, at: usize, to: &Arc<FaultSubsectionCluster>) -> Jump {
        Jump::new(
            from.subsects[at].clone(),
            Arc::clone(from),
            to.first_sect().clone(),
            Arc::clone(to),
            1.0,
        )
    }

    #[test]
    fn single_strand_links_consecutive_clusters() {
        let a = cluster(1, &[0, 1]);
        let b = cluster(2, &[2, 3]);
        let c = cluster(3, &[4]);
        let rup = ClusterRupture::from_cluster(Arc::clone(&a))
            .take(&hop(&a, 1, &b))
            .unwrap()
            .take(&hop(&b, 1, &c))
            .unwrap();
        let nav = rup.tree_navigator();
        assert_eq!(nav.clusters().len(), 3);
        assert_eq!(nav.locate_cluster(3).map(|c| c.parent_id), Some(2));
        assert!(nav.locate_cluster(99).is_none());
        assert!(nav.predecessor(&a).is_none());
        assert_eq!(nav.predecessor(&c).map(|c| c.parent_id), Some(2));
        assert_eq!(nav.descendants(&b).len(), 1);
        assert!(nav.jump(&a, &b).is_some());
        assert!(nav.jump(&b, &a).is_none());
    }

    #[test]
    fn splays_hang_off_their_branch_cluster() {
        let a = cluster(1, &[0, 1, 2]);
        let b = cluster(2, &[3]);
        let s = cluster(3, &[10, 11]);
        let rup = ClusterRupture::from_cluster(Arc::clone(&a))
            .take(&hop(&a, 2, &b))
            .unwrap()
            .take(&hop(&a, 1, &s))
            .unwrap();
        let nav = rup.tree_navigator();
        let desc: Vec<u32> = nav.descendants(&a).iter().map(|c| c.parent_id).collect();
        assert_eq!(desc, vec![2, 3]);
        assert_eq!(nav.predecessor(&s).map(|c| c.parent_id), Some(1));
        assert_eq!(nav.jump(&a, &s).map(|j| j.from_section.id), Some(1));
    }

    #[test]
    fn grafted_overlap_keeps_links_on_the_original_clusters() {
        let a = cluster(1, &[0, 1, 2]);
        let b_sects: Vec<FaultSection> =
            [3, 4].iter().map(|&id| FaultSection::new(id, 2, "f")).collect();
        let entry = b_sects[1].clone();
        let b = Arc::new(
            FaultSubsectionCluster::with_start_and_end(b_sects, Some(entry.clone()), None)
                .unwrap(),
        );
        let strand = ClusterRupture::from_cluster(Arc::clone(&a))
            .take(&Jump::new(
                a.subsects[2].clone(),
                Arc::clone(&a),
                entry,
                Arc::clone(&b),
                1.0,
            ))
            .unwrap();
        let before = strand.to_string();
        assert_eq!(before, "[1:0,1,2][2:3,->4]");

        // The target repeats section 3, the first section of `b`.
        let c = cluster(2, &[3, 9]);
        let target = Arc::new(ClusterRupture::from_cluster(Arc::clone(&c)));
        let graft = RuptureJump::new(0, Arc::new(strand), 3, target, 1.0).unwrap();
        let merged = ClusterRupture::take_splay_jump(&graft).unwrap();
        let nav = merged.tree_navigator();

        assert!(Arc::ptr_eq(nav.locate_cluster(3).unwrap(), &b));
        assert!(Arc::ptr_eq(nav.predecessor(&b).unwrap(), &a));
        assert!(Arc::ptr_eq(nav.predecessor(&c).unwrap(), &a));
        assert_eq!(nav.jump(&a, &b).map(|j| j.to_section.id), Some(4));
        assert_eq!(nav.jump(&a, &c).map(|j| j.from_section.id), Some(0));
        let desc: Vec<u32> = nav.descendants(&a).iter().map(|c| c.subsects[1].id).collect();
        assert_eq!(desc, vec![4, 9]);
        assert_eq!(
            merged.to_string(),
            format!("{before}\n\t--splay from [1:0]: [2:3,9]")
        );
    }
}
