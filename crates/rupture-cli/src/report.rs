// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! JSON records for merged ruptures.
use rupture_core::{ClusterRupture, Jump, SectionId};
use serde::Serialize;

/// One merged rupture.
#[derive(Debug, Serialize)]
pub struct RuptureRecord {
    /// Canonical id set as inclusive `[start, end]` ranges.
    pub sections: Vec<[SectionId; 2]>,
    /// Primary strand clusters in order.
    pub clusters: Vec<ClusterRecord>,
    /// Splay jumps at every depth.
    pub splays: Vec<JumpRecord>,
    /// Hex blake3 digest of the id set.
    pub digest: String,
    /// Human-readable rendering.
    pub text: String,
}

/// Cluster on a single parent fault.
#[derive(Debug, Serialize)]
pub struct ClusterRecord {
    /// Parent fault id.
    pub parent_id: u32,
    /// Subsection ids in rupture order.
    pub sections: Vec<SectionId>,
}

/// Connection from one section to another.
#[derive(Debug, Serialize)]
pub struct JumpRecord {
    /// Departure section.
    pub from: SectionId,
    /// Arrival section.
    pub to: SectionId,
    /// Jump length (km).
    pub distance: f64,
}

impl From<&Jump> for JumpRecord {
    fn from(jump: &Jump) -> Self {
        Self {
            from: jump.from_section.id,
            to: jump.to_section.id,
            distance: jump.distance,
        }
    }
}

fn collect_splays(rupture: &ClusterRupture, out: &mut Vec<JumpRecord>) {
    for (jump, splay) in rupture.splays().iter() {
        out.push(JumpRecord::from(jump));
        collect_splays(splay, out);
    }
}

impl From<&ClusterRupture> for RuptureRecord {
    fn from(rupture: &ClusterRupture) -> Self {
        let mut splays = Vec::new();
        collect_splays(rupture, &mut splays);
        Self {
            sections: rupture
                .unique()
                .ranges()
                .iter()
                .map(|r| [r.start(), r.end()])
                .collect(),
            clusters: rupture
                .clusters()
                .iter()
                .map(|c| ClusterRecord {
                    parent_id: c.parent_id(),
                    sections: c.subsects().iter().map(|s| s.id).collect(),
                })
                .collect(),
            splays,
            digest: rupture.unique().digest_hex(),
            text: rupture.to_string(),
        }
    }
}
