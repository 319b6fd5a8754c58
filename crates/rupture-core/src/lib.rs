// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! rupture-core: multi-fault rupture graphs and parallel rupture merging.
//!
//! Single-fault ruptures are combined into multi-fault ruptures by grafting a
//! target rupture onto a nucleation rupture through a splay jump. A chain of
//! compatibility filters decides which pairs may merge and supplies the
//! connecting jump; [`RuptureMerger`] runs the search across all pairs in
//! parallel.
//!
//! Rupture identity is the set of section ids it covers ([`UniqueRupture`]),
//! stored as interned, coalesced id ranges ([`SectIdRange`]) so that equal
//! sets compare equal regardless of traversal order or direction.
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::unreadable_literal,
    clippy::missing_const_for_fn,
    clippy::redundant_pub_crate,
    clippy::module_name_repetitions,
    clippy::use_self
)]

mod cluster;
mod config;
mod distance;
mod error;
/// Compatibility filter chain: result type, filter trait and built-in filters.
pub mod filter;
mod jump;
mod merger;
mod multi;
mod navigator;
mod rupture;
mod sect_range;
mod section;
mod splays;
mod unique;

pub use cluster::FaultSubsectionCluster;
pub use config::MergerConfig;
pub use distance::{CachedDistance, DistanceTable, SectionDistance};
pub use error::RuptureError;
pub use filter::{
    CompatibilityResult, MultiRuptureCompatibilityFilter, RuptureJumpDistFilter,
    SectionOverlapFilter, SplayCountFilter,
};
pub use jump::{Jump, RuptureJump};
pub use merger::{MergeBatch, RuptureMerger};
pub use navigator::RuptureTreeNavigator;
pub use rupture::{ClusterRupture, RuptureKind};
pub use sect_range::{SectIdRange, NUM_CACHE_SHARDS};
pub use section::{FaultSection, SectionId};
pub use splays::SplayMap;
pub use unique::{Hash, UniqueRupture};
