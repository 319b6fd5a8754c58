// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Persistent splay map: `Jump -> ClusterRupture`, insertion ordered.
//!
//! Stored as an `Arc`-linked list, newest entry first. Adding an entry
//! allocates one node and points it at the parent map's head, so every
//! rupture grafted from a parent shares all of the parent's splay entries.
//! Splay counts per rupture are small; lookups are linear.
use std::fmt;
use std::sync::Arc;

use crate::jump::Jump;
use crate::rupture::ClusterRupture;

struct SplayNode {
    jump: Jump,
    rupture: Arc<ClusterRupture>,
    next: Option<Arc<SplayNode>>,
}

/// Immutable, structurally shared map from splay jump to splay rupture.
#[derive(Clone, Default)]
pub struct SplayMap {
    head: Option<Arc<SplayNode>>,
    len: usize,
}

impl SplayMap {
    /// Empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a map from entries in insertion order.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (Jump, Arc<ClusterRupture>)>,
    {
        entries
            .into_iter()
            .fold(Self::new(), |map, (jump, rupture)| map.with_entry(jump, rupture))
    }

    /// Returns a new map with one more entry; `self` is left untouched and
    /// its entries are shared, not copied.
    pub fn with_entry(&self, jump: Jump, rupture: Arc<ClusterRupture>) -> Self {
        Self {
            head: Some(Arc::new(SplayNode {
                jump,
                rupture,
                next: self.head.clone(),
            })),
            len: self.len + 1,
        }
    }

    /// Returns a new map where the entry keyed by `jump` maps to `rupture`.
    ///
    /// Entries older than the replaced one stay shared; newer ones are
    /// re-linked. Returns `None` when `jump` is not a key.
    pub fn with_replaced(&self, jump: &Jump, rupture: Arc<ClusterRupture>) -> Option<Self> {
        let mut newer: Vec<(Jump, Arc<ClusterRupture>)> = Vec::new();
        let mut cursor = self.head.as_ref();
        while let Some(node) = cursor {
            if node.jump == *jump {
                let mut map = Self {
                    head: node.next.clone(),
                    len: self.len - newer.len() - 1,
                }
                .with_entry(node.jump.clone(), rupture);
                for (j, r) in newer.into_iter().rev() {
                    map = map.with_entry(j, r);
                }
                return Some(map);
            }
            newer.push((node.jump.clone(), Arc::clone(&node.rupture)));
            cursor = node.next.as_ref();
        }
        None
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true when there are no splays.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn nodes(&self) -> impl Iterator<Item = &SplayNode> {
        std::iter::successors(self.head.as_deref(), |node| node.next.as_deref())
    }

    /// Splay rupture for `jump`, if present.
    pub fn get(&self, jump: &Jump) -> Option<&Arc<ClusterRupture>> {
        self.nodes()
            .find(|node| node.jump == *jump)
            .map(|node| &node.rupture)
    }

    /// Returns true if `jump` is a key.
    pub fn contains_jump(&self, jump: &Jump) -> bool {
        self.get(jump).is_some()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&Jump, &Arc<ClusterRupture>)> + '_ {
        let mut nodes: Vec<&SplayNode> = self.nodes().collect();
        nodes.reverse();
        nodes.into_iter().map(|node| (&node.jump, &node.rupture))
    }

    /// Splay jumps in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &Jump> + '_ {
        self.iter().map(|(jump, _)| jump)
    }

    /// Splay ruptures in insertion order.
    pub fn values(&self) -> impl Iterator<Item = &Arc<ClusterRupture>> + '_ {
        self.iter().map(|(_, rupture)| rupture)
    }

    /// Returns true when every entry of `older` is physically shared by
    /// `self` (i.e. `self` was derived from `older` by adding entries).
    pub fn extends(&self, older: &Self) -> bool {
        match &older.head {
            None => true,
            Some(target) => {
                let mut cursor = self.head.as_ref();
                while let Some(node) = cursor {
                    if Arc::ptr_eq(node, target) {
                        return true;
                    }
                    cursor = node.next.as_ref();
                }
                false
            }
        }
    }
}

impl fmt::Debug for SplayMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.iter().map(|(j, r)| (j.to_string(), r.to_string())))
            .finish()
    }
}
