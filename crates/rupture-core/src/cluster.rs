// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Ordered runs of subsections on a single parent fault.
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use crate::error::RuptureError;
use crate::section::{FaultSection, SectionId};
use crate::unique::UniqueRupture;

/// Contiguous subsections of one parent fault, in rupture order.
///
/// `start_sect` is the entry point (usually the first subsection, but a
/// bilateral rupture may enter mid-cluster). `end_sects` are the sections a
/// jump may leave from without being treated as a splay.
///
/// Fields are only reachable through accessors; every instance went
/// through [`FaultSubsectionCluster::with_start_and_end`] validation and is
/// therefore non-empty.
#[derive(Clone, Debug)]
pub struct FaultSubsectionCluster {
    /// Parent fault section id shared by every subsection.
    pub(crate) parent_id: u32,
    /// Parent fault name.
    pub(crate) parent_name: Arc<str>,
    /// Subsections in rupture order.
    pub(crate) subsects: Arc<[FaultSection]>,
    /// Entry section.
    pub(crate) start_sect: FaultSection,
    /// Exit sections, de-duplicated, in the order supplied.
    pub(crate) end_sects: Vec<FaultSection>,
    /// Ids covered by this cluster.
    pub(crate) unique: UniqueRupture,
}

impl FaultSubsectionCluster {
    /// Unilateral cluster: starts at the first subsection, ends at the last.
    pub fn new(subsects: Vec<FaultSection>) -> Result<Self, RuptureError> {
        Self::with_start_and_end(subsects, None, None)
    }

    /// Starts at the first subsection with explicit exit sections.
    pub fn with_end_sects(
        subsects: Vec<FaultSection>,
        end_sects: Vec<FaultSection>,
    ) -> Result<Self, RuptureError> {
        Self::with_start_and_end(subsects, None, Some(end_sects))
    }

    /// Fully specified cluster. `None` selects the defaults (first section as
    /// start, last section as the only exit).
    pub fn with_start_and_end(
        subsects: Vec<FaultSection>,
        start_sect: Option<FaultSection>,
        end_sects: Option<Vec<FaultSection>>,
    ) -> Result<Self, RuptureError> {
        let (first, last) = match (subsects.first(), subsects.last()) {
            (Some(first), Some(last)) => (first.clone(), last.clone()),
            _ => return Err(RuptureError::EmptyCluster),
        };
        let parent_id = first.parent_id;
        if let Some(other) = subsects.iter().find(|s| s.parent_id != parent_id) {
            return Err(RuptureError::MixedParents {
                first: parent_id,
                other: other.parent_id,
            });
        }
        let unique = UniqueRupture::for_sections(&subsects);

        let start_sect = start_sect.unwrap_or(first.clone());
        let mut ends: Vec<FaultSection> = Vec::new();
        for sect in end_sects.unwrap_or_else(|| vec![last]) {
            if !ends.contains(&sect) {
                ends.push(sect);
            }
        }
        for sect in std::iter::once(&start_sect).chain(ends.iter()) {
            if !unique.contains(sect.id) {
                return Err(RuptureError::SectionNotInCluster {
                    section: sect.id,
                    parent: parent_id,
                });
            }
        }

        Ok(Self {
            parent_id,
            parent_name: first.parent_name,
            subsects: Arc::from(subsects),
            start_sect,
            end_sects: ends,
            unique,
        })
    }

    /// Parent fault section id shared by every subsection.
    pub fn parent_id(&self) -> u32 {
        self.parent_id
    }

    /// Parent fault name.
    pub fn parent_name(&self) -> &str {
        &self.parent_name
    }

    /// Subsections in rupture order.
    pub fn subsects(&self) -> &[FaultSection] {
        &self.subsects
    }

    /// Entry section.
    pub fn start_sect(&self) -> &FaultSection {
        &self.start_sect
    }

    /// Exit sections.
    pub fn end_sects(&self) -> &[FaultSection] {
        &self.end_sects
    }

    /// Ids covered by this cluster.
    pub fn unique(&self) -> &UniqueRupture {
        &self.unique
    }

    /// Returns true when the cluster includes the given subsection id.
    pub fn contains(&self, id: SectionId) -> bool {
        self.unique.contains(id)
    }

    /// Returns true when `id` is one of the exit sections.
    pub fn is_end_sect(&self, id: SectionId) -> bool {
        self.end_sects.iter().any(|s| s.id == id)
    }

    /// First subsection in rupture order.
    pub fn first_sect(&self) -> &FaultSection {
        &self.subsects[0]
    }

    /// Last subsection in rupture order.
    pub fn last_sect(&self) -> &FaultSection {
        &self.subsects[self.subsects.len() - 1]
    }

    /// Number of subsections.
    pub fn num_sects(&self) -> usize {
        self.subsects.len()
    }

    /// Same cluster traversed in the opposite direction.
    pub fn reversed(&self) -> Self {
        let sects: Vec<FaultSection> = self.subsects.iter().rev().cloned().collect();
        let start = sects[0].clone();
        let end = sects[sects.len() - 1].clone();
        Self {
            parent_id: self.parent_id,
            parent_name: Arc::clone(&self.parent_name),
            subsects: Arc::from(sects),
            start_sect: start,
            end_sects: vec![end],
            unique: self.unique.clone(),
        }
    }

    /// Reversed cluster entered at `start` rather than the new first section.
    pub fn reversed_from(&self, start: SectionId) -> Result<Self, RuptureError> {
        let mut reversed = self.reversed();
        let Some(sect) = reversed.subsects.iter().find(|s| s.id == start).cloned() else {
            return Err(RuptureError::SectionNotInCluster {
                section: start,
                parent: self.parent_id,
            });
        };
        reversed.start_sect = sect;
        Ok(reversed)
    }

    /// Renders the cluster, marking `jump_to` with `->` when it is not the
    /// first subsection.
    pub fn display_with_entry(&self, jump_to: Option<SectionId>) -> String {
        let mut out = format!("[{}:", self.parent_id);
        for (i, sect) in self.subsects.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            if Some(sect.id) == jump_to {
                out.push_str("->");
            }
            out.push_str(&sect.id.to_string());
        }
        out.push(']');
        out
    }
}

impl PartialEq for FaultSubsectionCluster {
    fn eq(&self, other: &Self) -> bool {
        self.parent_id == other.parent_id
            && self.start_sect == other.start_sect
            && self.end_sects == other.end_sects
            && self.subsects[..] == other.subsects[..]
    }
}

impl Eq for FaultSubsectionCluster {}

impl std::hash::Hash for FaultSubsectionCluster {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.parent_id.hash(state);
        self.start_sect.hash(state);
        self.subsects[..].hash(state);
    }
}

impl PartialOrd for FaultSubsectionCluster {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FaultSubsectionCluster {
    fn cmp(&self, other: &Self) -> Ordering {
        self.parent_id
            .cmp(&other.parent_id)
            .then_with(|| self.subsects.len().cmp(&other.subsects.len()))
            .then_with(|| {
                self.subsects
                    .iter()
                    .map(|s| s.id)
                    .cmp(other.subsects.iter().map(|s| s.id))
            })
            .then_with(|| self.start_sect.id.cmp(&other.start_sect.id))
            .then_with(|| {
                self.end_sects
                    .iter()
                    .map(|s| s.id)
                    .cmp(other.end_sects.iter().map(|s| s.id))
            })
    }
}

impl fmt::Display for FaultSubsectionCluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entry = (self.start_sect.id != self.first_sect().id).then_some(self.start_sect.id);
        f.write_str(&self.display_with_entry(entry))
    }
}
