// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Error taxonomy for rupture construction and merging.
//!
//! Every variant is a structural invariant violation and signals a caller or
//! logic defect. Expected negative outcomes (a filter rejecting a pair) are
//! ordinary [`crate::CompatibilityResult::Fail`] values and never appear here.
use thiserror::Error;

use crate::section::SectionId;

/// Errors emitted by the rupture core.
#[derive(Debug, Error)]
pub enum RuptureError {
    /// A section ID range was requested with `end < start`.
    #[error("invalid section range: end {end} < start {start}")]
    InvalidRange {
        /// Requested first ID.
        start: SectionId,
        /// Requested last ID.
        end: SectionId,
    },
    /// A cluster was built from an empty subsection list.
    #[error("cluster must contain at least one subsection")]
    EmptyCluster,
    /// A cluster was built from subsections of more than one parent fault.
    #[error("cluster mixes parent sections {first} and {other}")]
    MixedParents {
        /// Parent of the first subsection.
        first: u32,
        /// Conflicting parent encountered later.
        other: u32,
    },
    /// A start or end section was named that is not part of the cluster.
    #[error("section {section} is not part of cluster on parent {parent}")]
    SectionNotInCluster {
        /// Offending section.
        section: SectionId,
        /// Parent section of the cluster.
        parent: u32,
    },
    /// A section could not be located anywhere in a rupture.
    #[error("section {section} is not part of rupture {rupture}")]
    SectionNotInRupture {
        /// Offending section.
        section: SectionId,
        /// Display form of the rupture.
        rupture: String,
    },
    /// Primary strand jump count does not match `clusters - 1`.
    #[error("expected {expected} internal jumps, found {found}")]
    JumpCountMismatch {
        /// Required jump count.
        expected: usize,
        /// Supplied jump count.
        found: usize,
    },
    /// A jump departs from a section the rupture does not contain.
    #[error("cannot take jump: rupture does not contain from-section {section}")]
    MissingFromSection {
        /// The jump's from-section.
        section: SectionId,
    },
    /// Growing the rupture would include a section twice.
    #[error("cannot take jump: section {section} is already part of the rupture")]
    DuplicateSection {
        /// First duplicated section found.
        section: SectionId,
    },
    /// The splay jump is already a key of the splay map.
    #[error("splay jump {from} -> {to} is already present")]
    DuplicateSplay {
        /// Jump from-section.
        from: SectionId,
        /// Jump to-section.
        to: SectionId,
    },
    /// Operation requires a single-strand rupture.
    #[error("operation requires a single-strand rupture")]
    NotSingleStrand,
    /// The compatibility chain passed without supplying a connecting jump.
    #[error("compatibility chain passed without a connecting jump")]
    UnresolvedJump,
    /// A merge unit failed; carries enough context to locate the pair.
    #[error("merge failed for nucleation {nucleation}, target {target} (filter: {filter}): {source}")]
    MergeFailed {
        /// Index of the nucleation rupture in the batch.
        nucleation: usize,
        /// Index of the target rupture.
        target: usize,
        /// Name of the last filter applied, or `"<none>"`.
        filter: String,
        /// Underlying invariant violation.
        #[source]
        source: Box<RuptureError>,
    },
}
