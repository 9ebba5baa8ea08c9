//! Adjacency representations over the edge relation.
//!
//! Both back-ends expose the same capability: `successors(node)` yields the
//! targets of the node's outgoing edges. `HashEdges` builds a hash map per
//! call; `BinSearchEdges` borrows the already-sorted columns of the edge
//! relation and answers by bounds probes without allocating.

use crate::context::ExecutionContext;
use crate::error::Result;
use std::collections::hash_set;
use std::collections::{HashMap, HashSet};
use trellis_db_core::{Id, IdTable, MemoryReservation};

/// Per-source successor lookup over the edge relation.
pub(crate) trait EdgeMapping {
    type Successors<'a>: Iterator<Item = Id> + 'a
    where
        Self: 'a;

    /// Targets of `node`'s outgoing edges; empty when there are none.
    fn successors(&self, node: Id) -> Self::Successors<'_>;
}

/// Hash-map adjacency: `source -> set of targets`.
pub(crate) struct HashEdges {
    map: HashMap<Id, HashSet<Id>>,
    /// Keeps the map's bytes accounted until the map drops.
    _reservation: MemoryReservation,
}

impl HashEdges {
    /// Build the map from the designated endpoint columns of the edge
    /// relation. Duplicate edges deduplicate through the target sets.
    pub(crate) fn build(
        sub: &IdTable,
        source_col: usize,
        target_col: usize,
        ctx: &ExecutionContext,
    ) -> Result<Self> {
        let sources = sub.column(source_col);
        let targets = sub.column(target_col);

        let mut reservation = MemoryReservation::new(ctx.alloc.clone());
        let entry_bytes = (2 * std::mem::size_of::<Id>()) as u64;
        let mut map: HashMap<Id, HashSet<Id>> = HashMap::new();

        for (&source, &target) in sources.iter().zip(targets) {
            ctx.cancel.check()?;
            reservation.grow(entry_bytes)?;
            map.entry(source).or_default().insert(target);
        }

        Ok(Self {
            map,
            _reservation: reservation,
        })
    }

    #[cfg(test)]
    pub(crate) fn num_sources(&self) -> usize {
        self.map.len()
    }
}

pub(crate) struct HashSuccessors<'a>(Option<hash_set::Iter<'a, Id>>);

impl Iterator for HashSuccessors<'_> {
    type Item = Id;

    #[inline]
    fn next(&mut self) -> Option<Id> {
        self.0.as_mut()?.next().copied()
    }
}

impl EdgeMapping for HashEdges {
    type Successors<'a>
        = HashSuccessors<'a>
    where
        Self: 'a;

    fn successors(&self, node: Id) -> Self::Successors<'_> {
        HashSuccessors(self.map.get(&node).map(|targets| targets.iter()))
    }
}

/// Sorted-column adjacency.
///
/// Borrows the two endpoint columns of an edge relation sorted by
/// `(source, target)`; a node's successors form a contiguous slice of the
/// target column located by two bounds probes on the source column.
pub(crate) struct BinSearchEdges<'a> {
    sources: &'a [Id],
    targets: &'a [Id],
}

impl<'a> BinSearchEdges<'a> {
    /// Capture the endpoint columns. The relation must be sorted on
    /// `(source_col, target_col)`; the operator requests that order from its
    /// upstream.
    pub(crate) fn new(sub: &'a IdTable, source_col: usize, target_col: usize) -> Self {
        let sources = sub.column(source_col);
        let targets = sub.column(target_col);
        debug_assert!(sources.windows(2).all(|w| w[0] <= w[1]));
        Self { sources, targets }
    }
}

impl EdgeMapping for BinSearchEdges<'_> {
    type Successors<'b>
        = std::iter::Copied<std::slice::Iter<'b, Id>>
    where
        Self: 'b;

    fn successors(&self, node: Id) -> Self::Successors<'_> {
        let lower = self.sources.partition_point(|&s| s < node);
        let upper = self.sources.partition_point(|&s| s <= node);
        self.targets[lower..upper].iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_db_core::MemoryTracker;

    fn id(bits: u64) -> Id {
        Id::from_bits(bits)
    }

    fn edge_table(rows: &[(u64, u64)]) -> IdTable {
        let mut table = IdTable::new(MemoryTracker::unlimited());
        table.set_num_columns(2);
        for &(s, t) in rows {
            table.push_row(&[id(s), id(t)]).unwrap();
        }
        table
    }

    fn collect<E: EdgeMapping>(edges: &E, node: u64) -> Vec<u64> {
        let mut out: Vec<u64> = edges.successors(id(node)).map(|i| i.bits()).collect();
        out.sort_unstable();
        out
    }

    #[test]
    fn test_hash_edges_build_and_lookup() {
        let table = edge_table(&[(1, 2), (2, 3), (2, 5), (2, 3)]);
        let ctx = ExecutionContext::new();
        let edges = HashEdges::build(&table, 0, 1, &ctx).unwrap();

        assert_eq!(edges.num_sources(), 2);
        assert_eq!(collect(&edges, 1), vec![2]);
        // Duplicate edge (2,3) deduplicates.
        assert_eq!(collect(&edges, 2), vec![3, 5]);
        assert!(collect(&edges, 99).is_empty());
    }

    #[test]
    fn test_hash_edges_swapped_direction() {
        let table = edge_table(&[(1, 2), (2, 3)]);
        let ctx = ExecutionContext::new();
        // Building with source/target swapped walks the relation backwards.
        let edges = HashEdges::build(&table, 1, 0, &ctx).unwrap();
        assert_eq!(collect(&edges, 3), vec![2]);
        assert_eq!(collect(&edges, 2), vec![1]);
    }

    #[test]
    fn test_bin_search_edges_contiguous_slices() {
        let table = edge_table(&[(1, 2), (2, 3), (2, 5), (4, 2)]);
        let edges = BinSearchEdges::new(&table, 0, 1);

        assert_eq!(collect(&edges, 1), vec![2]);
        assert_eq!(collect(&edges, 2), vec![3, 5]);
        assert_eq!(collect(&edges, 4), vec![2]);
        assert!(collect(&edges, 3).is_empty());
        assert!(collect(&edges, 0).is_empty());
        assert!(collect(&edges, 9).is_empty());
    }

    #[test]
    fn test_hash_edges_respects_memory_limit() {
        let table = edge_table(&[(1, 2), (2, 3), (3, 4)]);
        let ctx = ExecutionContext::new().with_memory_limit(32);
        assert!(HashEdges::build(&table, 0, 1, &ctx).is_err());
    }
}
