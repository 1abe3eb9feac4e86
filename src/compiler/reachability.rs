//! Whether an execution block is guaranteed to have run before another one.

use super::options::ReachabilityStrategy;
use crate::graph::{BlockId, Method, SlotKind};
use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Reachability {
    /// On no path from the entry block to the query block.
    Never,
    /// On some paths but not all of them.
    Sometimes,
    /// On every path.
    Always,
}

/// Execution adjacency of a method: which blocks hand control to which.
#[derive(Debug, Clone, Default)]
pub struct ExecutionGraph {
    outputs: BTreeMap<BlockId, Vec<BlockId>>,
    inputs: BTreeMap<BlockId, Vec<BlockId>>,
}

impl ExecutionGraph {
    /// Indexes every link between execution slots; links to missing slots are ignored.
    pub fn from_method(method: &Method) -> Self {
        let owners: AHashMap<_, _> = method
            .blocks()
            .flat_map(|b| b.slots().iter())
            .filter(|s| s.kind == SlotKind::Execution)
            .map(|s| (s.id, s.block))
            .collect();

        let mut graph = Self::default();
        for link in method.links() {
            if let (Some(&source), Some(&target)) =
                (owners.get(&link.source), owners.get(&link.target))
            {
                graph.add_edge(source, target);
            }
        }
        graph
    }

    pub fn add_edge(&mut self, source: BlockId, target: BlockId) {
        self.outputs.entry(source).or_default().push(target);
        self.inputs.entry(target).or_default().push(source);
    }

    pub fn successors(&self, block: BlockId) -> &[BlockId] {
        self.outputs.get(&block).map_or(&[], Vec::as_slice)
    }

    pub fn predecessors(&self, block: BlockId) -> &[BlockId] {
        self.inputs.get(&block).map_or(&[], Vec::as_slice)
    }
}

/// The classification of every block relative to one target block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReachabilityMap {
    target: BlockId,
    classes: AHashMap<BlockId, Reachability>,
}

impl ReachabilityMap {
    pub fn target(&self) -> BlockId {
        self.target
    }

    pub fn get(&self, block: BlockId) -> Reachability {
        self.classes
            .get(&block)
            .copied()
            .unwrap_or(Reachability::Never)
    }
}

pub fn classify(
    graph: &ExecutionGraph,
    entry: BlockId,
    target: BlockId,
    strategy: ReachabilityStrategy,
) -> ReachabilityMap {
    let classes = match strategy {
        ReachabilityStrategy::Paths => classify_paths(graph, entry, target),
        ReachabilityStrategy::Dominators => classify_dominators(graph, entry, target),
    };
    ReachabilityMap { target, classes }
}

/// Counts, for each block, how many simple entry->target paths contain it.
fn classify_paths(
    graph: &ExecutionGraph,
    entry: BlockId,
    target: BlockId,
) -> AHashMap<BlockId, Reachability> {
    let mut counts: AHashMap<BlockId, usize> = AHashMap::new();
    let mut total = 0;
    let mut path = Vec::new();
    let mut on_path = AHashSet::new();
    walk(
        graph,
        entry,
        target,
        &mut path,
        &mut on_path,
        &mut counts,
        &mut total,
    );

    counts
        .into_iter()
        .map(|(block, count)| {
            let class = if count == total {
                Reachability::Always
            } else {
                Reachability::Sometimes
            };
            (block, class)
        })
        .collect()
}

fn walk(
    graph: &ExecutionGraph,
    block: BlockId,
    target: BlockId,
    path: &mut Vec<BlockId>,
    on_path: &mut AHashSet<BlockId>,
    counts: &mut AHashMap<BlockId, usize>,
    total: &mut usize,
) {
    path.push(block);
    on_path.insert(block);

    if block == target {
        *total += 1;
        for b in path.iter() {
            *counts.entry(*b).or_default() += 1;
        }
    } else {
        for &next in graph.successors(block) {
            if !on_path.contains(&next) {
                walk(graph, next, target, path, on_path, counts, total);
            }
        }
    }

    on_path.remove(&block);
    path.pop();
}

/// `Always` iff the block dominates the target in the subgraph of blocks lying on some
/// entry->target walk (a walk ends at its first visit of the target); `Sometimes` for the
/// other blocks of that subgraph.
fn classify_dominators(
    graph: &ExecutionGraph,
    entry: BlockId,
    target: BlockId,
) -> AHashMap<BlockId, Reachability> {
    let forward = collect(entry, target, |b| graph.successors(b));
    if !forward.contains(&target) {
        return AHashMap::new();
    }
    let backward = collect(target, entry, |b| graph.predecessors(b));
    let region: BTreeSet<BlockId> = forward.intersection(&backward).copied().collect();

    let mut dominators: BTreeMap<BlockId, BTreeSet<BlockId>> = region
        .iter()
        .map(|&b| {
            let initial = if b == entry {
                BTreeSet::from([entry])
            } else {
                region.clone()
            };
            (b, initial)
        })
        .collect();

    let mut changed = true;
    while changed {
        changed = false;
        for &block in region.iter().filter(|&&b| b != entry) {
            let mut incoming = graph
                .predecessors(block)
                .iter()
                .filter(|p| region.contains(p) && **p != target)
                .filter_map(|p| dominators.get(p));
            let Some(first) = incoming.next() else { continue };
            let mut next: BTreeSet<BlockId> = incoming
                .fold(first.clone(), |acc, d| acc.intersection(d).copied().collect());
            next.insert(block);
            if dominators.get(&block) != Some(&next) {
                dominators.insert(block, next);
                changed = true;
            }
        }
    }

    let dominating = dominators.remove(&target).unwrap_or_default();
    region
        .into_iter()
        .map(|b| {
            let class = if dominating.contains(&b) {
                Reachability::Always
            } else {
                Reachability::Sometimes
            };
            (b, class)
        })
        .collect()
}

/// Blocks reachable from `start` through `next`, without expanding past `stop`.
fn collect<'g>(
    start: BlockId,
    stop: BlockId,
    next: impl Fn(BlockId) -> &'g [BlockId],
) -> BTreeSet<BlockId> {
    let mut seen = BTreeSet::from([start]);
    let mut stack = vec![start];
    while let Some(block) = stack.pop() {
        if block == stop {
            continue;
        }
        for &n in next(block) {
            if seen.insert(n) {
                stack.push(n);
            }
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(edges: &[(u32, u32)]) -> ExecutionGraph {
        let mut graph = ExecutionGraph::default();
        for &(a, b) in edges {
            graph.add_edge(BlockId(a), BlockId(b));
        }
        graph
    }

    fn both(graph: &ExecutionGraph, entry: u32, target: u32) -> [ReachabilityMap; 2] {
        [ReachabilityStrategy::Paths, ReachabilityStrategy::Dominators]
            .map(|s| classify(graph, BlockId(entry), BlockId(target), s))
    }

    #[test]
    fn test_diamond() {
        // 0 -> 1 -> {2, 3} -> 4
        let g = graph(&[(0, 1), (1, 2), (1, 3), (2, 4), (3, 4)]);
        for map in both(&g, 0, 4) {
            assert_eq!(map.get(BlockId(1)), Reachability::Always);
            assert_eq!(map.get(BlockId(2)), Reachability::Sometimes);
            assert_eq!(map.get(BlockId(3)), Reachability::Sometimes);
            assert_eq!(map.get(BlockId(4)), Reachability::Always);
            assert_eq!(map.get(BlockId(9)), Reachability::Never);
        }
    }

    #[test]
    fn test_back_edges_terminate() {
        // 0 -> 1 -> 2 -> 1, 2 -> 3
        let g = graph(&[(0, 1), (1, 2), (2, 1), (2, 3)]);
        for map in both(&g, 0, 3) {
            assert_eq!(map.get(BlockId(1)), Reachability::Always);
            assert_eq!(map.get(BlockId(2)), Reachability::Always);
        }
    }

    #[test]
    fn test_unreachable_target() {
        let g = graph(&[(0, 1), (2, 3)]);
        for map in both(&g, 0, 3) {
            assert_eq!(map.get(BlockId(0)), Reachability::Never);
            assert_eq!(map.get(BlockId(2)), Reachability::Never);
        }
    }

    #[test]
    fn test_entry_is_target() {
        let g = graph(&[(0, 1)]);
        for map in both(&g, 0, 0) {
            assert_eq!(map.get(BlockId(0)), Reachability::Always);
            assert_eq!(map.get(BlockId(1)), Reachability::Never);
        }
    }
}
