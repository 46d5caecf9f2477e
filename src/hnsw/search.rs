//! Greedy descent and best-first layer search shared by insertion and query.

use super::graph::{HnswGraph, NodeId};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Computes the query distance to every neighbor in a batch. Behind the
/// `parallel` feature this fans out over rayon's global pool (sized to
/// hardware concurrency); the fold that consumes the result stays
/// sequential either way, so candidate expansion order is unaffected.
fn batch_distances(graph: &HnswGraph, query: &[f32], neighbors: &[NodeId]) -> Vec<(NodeId, f32)> {
    #[cfg(feature = "parallel")]
    {
        neighbors.par_iter().map(|&n| (n, graph.dist_query(query, n))).collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        neighbors.iter().map(|&n| (n, graph.dist_query(query, n))).collect()
    }
}

/// A scored candidate in a best-first search. Ordered by distance so a
/// `BinaryHeap<Candidate>` is a max-heap (farthest-first) and
/// `BinaryHeap<Reverse<Candidate>>` is a min-heap (nearest-first).
#[derive(Clone, Copy, Debug)]
pub struct Candidate {
    /// Distance to the query.
    pub distance: f32,
    /// The candidate node.
    pub node: NodeId,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.distance == other.distance && self.node == other.node
    }
}
impl Eq for Candidate {}
impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then_with(|| self.node.0.cmp(&other.node.0))
    }
}

/// Greedy single-best descent from `entry` down to (but not including)
/// `stop_above_level`, used to get from the top of the graph down to the
/// level where best-first search should take over.
pub fn greedy_descend(graph: &HnswGraph, query: &[f32], entry: NodeId, from_level: usize, stop_above_level: usize) -> NodeId {
    let mut current = entry;
    let mut current_dist = graph.dist_query(query, current);
    let mut level = from_level;
    loop {
        if level <= stop_above_level {
            break;
        }
        let mut improved = true;
        while improved {
            improved = false;
            let node = graph.node(current);
            if level < node.levels.len() {
                let neighbors = node.levels[level].read().clone();
                for (n, d) in batch_distances(graph, query, &neighbors) {
                    if d < current_dist {
                        current_dist = d;
                        current = n;
                        improved = true;
                    }
                }
            }
        }
        if level == 0 {
            break;
        }
        level -= 1;
    }
    current
}

/// Best-first search at a single `level`, expanding from `entry_points`,
/// visiting each candidate's unvisited neighbors, and stopping once the best
/// unexpanded candidate is farther than the worst admitted result.
///
/// `skip` filters candidates out of the *result set* (but not out of
/// expansion), so it never shrinks graph reachability — this is how the
/// query-time `filter` parameter is applied (spec: "filtering does not shrink
/// graph reachability").
pub fn search_layer(
    graph: &HnswGraph,
    query: &[f32],
    entry_points: &[NodeId],
    ef: usize,
    level: usize,
    skip: &dyn Fn(NodeId) -> bool,
) -> Vec<Candidate> {
    let mut visited: HashSet<NodeId> = HashSet::new();
    let mut candidates: BinaryHeap<std::cmp::Reverse<Candidate>> = BinaryHeap::new();
    let mut results: BinaryHeap<Candidate> = BinaryHeap::new();

    for &ep in entry_points {
        if visited.insert(ep) {
            let d = graph.dist_query(query, ep);
            candidates.push(std::cmp::Reverse(Candidate { distance: d, node: ep }));
            if !graph.node(ep).is_tombstoned() && !skip(ep) {
                results.push(Candidate { distance: d, node: ep });
            }
        }
    }

    while let Some(std::cmp::Reverse(closest)) = candidates.pop() {
        if let Some(&worst) = results.peek() {
            if results.len() >= ef && closest.distance > worst.distance {
                break;
            }
        }

        let node = graph.node(closest.node);
        if level >= node.levels.len() {
            continue;
        }
        let neighbors = node.levels[level].read().clone();
        let unvisited: Vec<NodeId> = neighbors.into_iter().filter(|&n| !visited.contains(&n)).collect();
        for (n, d) in batch_distances(graph, query, &unvisited) {
            if !visited.insert(n) {
                continue;
            }
            let should_expand = results.len() < ef || results.peek().is_some_and(|w| d < w.distance);
            if should_expand {
                candidates.push(std::cmp::Reverse(Candidate { distance: d, node: n }));
            }
            if !graph.node(n).is_tombstoned() && !skip(n) {
                results.push(Candidate { distance: d, node: n });
                if results.len() > ef {
                    results.pop();
                }
            }
        }
    }

    let mut out: Vec<Candidate> = results.into_vec();
    out.sort_by(|a, b| a.distance.total_cmp(&b.distance).then_with(|| a.node.0.cmp(&b.node.0)));
    out
}
