use petgraph::unionfind::UnionFind;

use crate::node::NodeId;

/// Disjoint sets over the nodes of one grid.
///
/// Every node starts in its own singleton set; sets only ever grow by [`union`](Self::union).
pub struct Equivalence {
    sets: UnionFind<usize>,
    len: usize,
}

impl Equivalence {
    /// One singleton set per node, for a grid holding `node_count` nodes.
    pub fn new(node_count: usize) -> Self {
        Self {
            sets: UnionFind::new(node_count),
            len: node_count,
        }
    }

    fn covers(&self, id: NodeId) -> bool {
        id.index() < self.len
    }

    /// Merge the sets holding `a` and `b`.
    ///
    /// Returns `false` if they were already merged or either id is unknown.
    pub fn union(&mut self, a: NodeId, b: NodeId) -> bool {
        if !self.covers(a) || !self.covers(b) {
            return false;
        }
        self.sets.union(a.index(), b.index())
    }

    /// Whether `a` and `b` share a set.
    pub fn equivalent(&self, a: NodeId, b: NodeId) -> bool {
        self.covers(a) && self.covers(b) && self.sets.equiv(a.index(), b.index())
    }
}
