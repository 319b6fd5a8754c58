// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Fault subsection descriptors supplied by the geometry loader.
use std::fmt;
use std::sync::Arc;

/// Integer identifier of a fault subsection.
pub type SectionId = u32;

/// Opaque fault subsection handed in by the geometry collaborator.
///
/// Only identity and parent membership matter to the rupture core; geometry
/// stays behind [`crate::SectionDistance`].
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FaultSection {
    /// Globally unique subsection id.
    pub id: SectionId,
    /// Id of the parent fault section.
    pub parent_id: u32,
    /// Human-readable parent name (shared across subsections).
    pub parent_name: Arc<str>,
}

impl FaultSection {
    /// Creates a subsection descriptor.
    pub fn new(id: SectionId, parent_id: u32, parent_name: impl Into<Arc<str>>) -> Self {
        Self {
            id,
            parent_id,
            parent_name: parent_name.into(),
        }
    }
}

// Subsection ids are globally unique, so identity is the id alone.
impl PartialEq for FaultSection {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for FaultSection {}

impl std::hash::Hash for FaultSection {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for FaultSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}
