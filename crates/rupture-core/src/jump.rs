// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Connections between clusters and between whole ruptures.
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use crate::cluster::FaultSubsectionCluster;
use crate::error::RuptureError;
use crate::rupture::ClusterRupture;
use crate::section::{FaultSection, SectionId};

/// Connection point between two clusters at a measured distance.
///
/// Plain data: the distance is supplied by the caller, never computed here.
/// Equality ignores `distance`.
#[derive(Clone, Debug)]
pub struct Jump {
    /// Section the jump departs from.
    pub from_section: FaultSection,
    /// Cluster owning `from_section`.
    pub from_cluster: Arc<FaultSubsectionCluster>,
    /// Section the jump arrives at.
    pub to_section: FaultSection,
    /// Cluster owning `to_section`.
    pub to_cluster: Arc<FaultSubsectionCluster>,
    /// Jump distance (km).
    pub distance: f64,
}

impl Jump {
    /// Creates a jump.
    pub fn new(
        from_section: FaultSection,
        from_cluster: Arc<FaultSubsectionCluster>,
        to_section: FaultSection,
        to_cluster: Arc<FaultSubsectionCluster>,
        distance: f64,
    ) -> Self {
        Self {
            from_section,
            from_cluster,
            to_section,
            to_cluster,
            distance,
        }
    }

    /// Same connection in the opposite direction.
    pub fn reverse(&self) -> Self {
        Self {
            from_section: self.to_section.clone(),
            from_cluster: Arc::clone(&self.to_cluster),
            to_section: self.from_section.clone(),
            to_cluster: Arc::clone(&self.from_cluster),
            distance: self.distance,
        }
    }
}

impl PartialEq for Jump {
    fn eq(&self, other: &Self) -> bool {
        self.from_section == other.from_section
            && self.to_section == other.to_section
            && self.from_cluster == other.from_cluster
            && self.to_cluster == other.to_cluster
    }
}

impl Eq for Jump {}

impl std::hash::Hash for Jump {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.from_section.hash(state);
        self.to_section.hash(state);
        self.from_cluster.parent_id.hash(state);
        self.to_cluster.parent_id.hash(state);
    }
}

impl fmt::Display for Jump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{}]=>{}[{}]",
            self.from_cluster.parent_id,
            self.from_section.id,
            self.to_cluster.parent_id,
            self.to_section.id
        )
    }
}

/// Jump between two complete ruptures.
///
/// `from_cluster`/`to_cluster` are derived from the ruptures' tree
/// navigators at construction and therefore always agree with them.
#[derive(Clone, Debug)]
pub struct RuptureJump {
    jump: Jump,
    /// Rupture containing the from-section.
    pub from_rupture: Arc<ClusterRupture>,
    /// Rupture containing the to-section; grafted on as a splay when taken.
    pub to_rupture: Arc<ClusterRupture>,
}

impl RuptureJump {
    /// Resolves both sections to their clusters and builds the jump.
    ///
    /// # Errors
    /// Returns [`RuptureError::SectionNotInRupture`] if either section is not
    /// part of its rupture (splays included).
    pub fn new(
        from_section: SectionId,
        from_rupture: Arc<ClusterRupture>,
        to_section: SectionId,
        to_rupture: Arc<ClusterRupture>,
        distance: f64,
    ) -> Result<Self, RuptureError> {
        let (from_cluster, from_sect) = resolve(&from_rupture, from_section)?;
        let (to_cluster, to_sect) = resolve(&to_rupture, to_section)?;
        Ok(Self {
            jump: Jump::new(from_sect, from_cluster, to_sect, to_cluster, distance),
            from_rupture,
            to_rupture,
        })
    }

    /// The underlying cluster-level jump.
    pub fn jump(&self) -> &Jump {
        &self.jump
    }
}

fn resolve(
    rupture: &ClusterRupture,
    section: SectionId,
) -> Result<(Arc<FaultSubsectionCluster>, FaultSection), RuptureError> {
    let missing = || RuptureError::SectionNotInRupture {
        section,
        rupture: rupture.to_string(),
    };
    let cluster = rupture
        .tree_navigator()
        .locate_cluster(section)
        .ok_or_else(missing)?;
    let sect = cluster
        .subsects
        .iter()
        .find(|s| s.id == section)
        .cloned()
        .ok_or_else(missing)?;
    Ok((Arc::clone(cluster), sect))
}

impl Deref for RuptureJump {
    type Target = Jump;

    fn deref(&self) -> &Jump {
        &self.jump
    }
}

impl fmt::Display for RuptureJump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.jump, f)
    }
}
