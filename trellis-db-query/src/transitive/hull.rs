//! Depth-window reachability over an adjacency representation.
//!
//! For each start node, a depth-first search collects every node reachable
//! via a path whose length lies in `[min_dist, max_dist]`, optionally
//! filtered to a single target id. A per-start visited set makes the search
//! terminate on cyclic graphs; the hull memoizes whole start nodes so
//! duplicate starts cost nothing.

use crate::context::ExecutionContext;
use crate::error::Result;
use crate::transitive::edges::EdgeMapping;
use std::collections::{HashMap, HashSet};
use trellis_db_core::{Id, MemoryReservation, MemoryTracker};

/// `start -> set of reachable targets` restricted to the length window.
pub(crate) struct Hull {
    map: HashMap<Id, HashSet<Id>>,
    reservation: MemoryReservation,
}

impl Hull {
    fn new(tracker: MemoryTracker) -> Self {
        Self {
            map: HashMap::new(),
            reservation: MemoryReservation::new(tracker),
        }
    }

    pub(crate) fn contains_start(&self, start: Id) -> bool {
        self.map.contains_key(&start)
    }

    fn insert(&mut self, start: Id, node: Id) -> Result<()> {
        self.reservation
            .grow((2 * std::mem::size_of::<Id>()) as u64)?;
        self.map.entry(start).or_default().insert(node);
        Ok(())
    }

    pub(crate) fn targets(&self, start: Id) -> Option<&HashSet<Id>> {
        self.map.get(&start)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&Id, &HashSet<Id>)> {
        self.map.iter()
    }

    pub(crate) fn num_starts(&self) -> usize {
        self.map.len()
    }
}

/// Compute the hull from `start_nodes` over `edges`.
///
/// The stack holds one successor iterator per depth, so the current depth is
/// the stack length and a node is never re-hashed while its children are
/// walked. A node is marked visited only once reached at depth >=
/// `min_dist`: nodes first seen below the window must stay expandable, or
/// longer admissible paths to them would be lost.
pub(crate) fn transitive_hull<'e, E: EdgeMapping>(
    edges: &'e E,
    start_nodes: &[Id],
    min_dist: usize,
    max_dist: usize,
    target: Option<Id>,
    ctx: &ExecutionContext,
) -> Result<Hull> {
    let mut hull = Hull::new(ctx.alloc.clone());
    let mut visited: HashSet<Id> = HashSet::new();
    let mut stack: Vec<E::Successors<'e>> = Vec::new();

    for &start in start_nodes {
        if hull.contains_start(start) {
            // Hull already computed for this start node.
            continue;
        }

        visited.clear();
        stack.clear();
        let mut visited_bytes = MemoryReservation::new(ctx.alloc.clone());
        stack.push(edges.successors(start));

        if min_dist == 0 && target.map_or(true, |t| t == start) {
            hull.insert(start, start)?;
        }

        loop {
            let Some(top) = stack.last_mut() else { break };
            ctx.cancel.check()?;

            let Some(child) = top.next() else {
                stack.pop();
                continue;
            };

            let depth = stack.len();
            if depth > max_dist || visited.contains(&child) {
                continue;
            }
            if depth >= min_dist {
                visited_bytes.grow(std::mem::size_of::<Id>() as u64)?;
                visited.insert(child);
                if target.map_or(true, |t| t == child) {
                    hull.insert(start, child)?;
                }
            }
            stack.push(edges.successors(child));
        }
    }

    Ok(hull)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transitive::edges::HashEdges;
    use std::collections::BTreeSet;
    use trellis_db_core::IdTable;

    fn id(bits: u64) -> Id {
        Id::from_bits(bits)
    }

    fn edges(rows: &[(u64, u64)]) -> (HashEdges, ExecutionContext) {
        let ctx = ExecutionContext::new();
        let mut table = IdTable::new(ctx.alloc.clone());
        table.set_num_columns(2);
        for &(s, t) in rows {
            table.push_row(&[id(s), id(t)]).unwrap();
        }
        (HashEdges::build(&table, 0, 1, &ctx).unwrap(), ctx)
    }

    fn hull_pairs(hull: &Hull) -> BTreeSet<(u64, u64)> {
        hull.iter()
            .flat_map(|(s, targets)| targets.iter().map(|t| (s.bits(), t.bits())))
            .collect()
    }

    #[test]
    fn test_plus_reachability_with_cycle() {
        let (map, ctx) = edges(&[(1, 2), (2, 3), (3, 1)]);
        let starts = [id(1)];
        let hull = transitive_hull(&map, &starts, 1, usize::MAX, None, &ctx).unwrap();
        assert_eq!(hull_pairs(&hull), BTreeSet::from([(1, 1), (1, 2), (1, 3)]));
    }

    #[test]
    fn test_window_excludes_short_and_long_paths() {
        let (map, ctx) = edges(&[(1, 2), (2, 3), (3, 4)]);
        let starts = [id(1)];
        let hull = transitive_hull(&map, &starts, 2, 2, None, &ctx).unwrap();
        assert_eq!(hull_pairs(&hull), BTreeSet::from([(1, 3)]));
    }

    #[test]
    fn test_min_dist_does_not_hide_longer_paths() {
        // Node 2 is first reached at depth 1 (below the window) and again at
        // depth 3 through the cycle. The depth-3 path must survive.
        let (map, ctx) = edges(&[(1, 2), (2, 3), (3, 2)]);
        let starts = [id(1)];
        let hull = transitive_hull(&map, &starts, 2, usize::MAX, None, &ctx).unwrap();
        assert_eq!(hull_pairs(&hull), BTreeSet::from([(1, 2), (1, 3)]));
    }

    #[test]
    fn test_target_filter() {
        let (map, ctx) = edges(&[(1, 2), (2, 3), (1, 4)]);
        let starts = [id(1)];
        let hull = transitive_hull(&map, &starts, 1, usize::MAX, Some(id(3)), &ctx).unwrap();
        assert_eq!(hull_pairs(&hull), BTreeSet::from([(1, 3)]));
    }

    #[test]
    fn test_reflexive_start_with_zero_min() {
        let (map, ctx) = edges(&[(1, 2)]);
        let starts = [id(1)];
        let hull = transitive_hull(&map, &starts, 0, usize::MAX, None, &ctx).unwrap();
        assert_eq!(hull_pairs(&hull), BTreeSet::from([(1, 1), (1, 2)]));
    }

    #[test]
    fn test_reflexive_respects_target_filter() {
        let (map, ctx) = edges(&[(1, 2)]);
        let starts = [id(1)];
        let hull = transitive_hull(&map, &starts, 0, usize::MAX, Some(id(2)), &ctx).unwrap();
        // (1,1) is suppressed: the target filter admits only node 2.
        assert_eq!(hull_pairs(&hull), BTreeSet::from([(1, 2)]));
    }

    #[test]
    fn test_self_loop_terminates() {
        let (map, ctx) = edges(&[(1, 1)]);
        let starts = [id(1)];
        let hull = transitive_hull(&map, &starts, 1, usize::MAX, None, &ctx).unwrap();
        assert_eq!(hull_pairs(&hull), BTreeSet::from([(1, 1)]));
    }

    #[test]
    fn test_duplicate_starts_memoized() {
        let (map, ctx) = edges(&[(1, 2)]);
        let starts = [id(1), id(1), id(1)];
        let hull = transitive_hull(&map, &starts, 1, usize::MAX, None, &ctx).unwrap();
        assert_eq!(hull.num_starts(), 1);
    }

    #[test]
    fn test_max_dist_zero_keeps_only_reflexive() {
        let (map, ctx) = edges(&[(1, 2), (2, 3)]);
        let starts = [id(1)];
        let hull = transitive_hull(&map, &starts, 0, 0, None, &ctx).unwrap();
        assert_eq!(hull_pairs(&hull), BTreeSet::from([(1, 1)]));
    }

    #[test]
    fn test_empty_window_yields_nothing() {
        let (map, ctx) = edges(&[(1, 2), (2, 3)]);
        let starts = [id(1)];
        let hull = transitive_hull(&map, &starts, 3, 2, None, &ctx).unwrap();
        assert_eq!(hull.num_starts(), 0);
    }

    #[test]
    fn test_cancellation_aborts_traversal() {
        let (map, ctx) = edges(&[(1, 2), (2, 3)]);
        ctx.cancel.cancel();
        let starts = [id(1)];
        let err = transitive_hull(&map, &starts, 1, usize::MAX, None, &ctx);
        assert!(err.is_err());
    }
}
