//! The heuristic neighbor selector: picks a diverse, long-edge-preserving
//! neighbor set instead of plain nearest-k.

use super::graph::{HnswGraph, NodeId};

/// A candidate neighbor and its distance to the node being connected.
#[derive(Clone, Copy, Debug)]
pub struct Scored {
    /// Candidate node.
    pub node: NodeId,
    /// Distance to the anchor (the node we're selecting neighbors for).
    pub distance: f32,
}

/// Selects up to `cap` neighbors from `candidates` for `anchor`.
///
/// Repeatedly takes the closest remaining candidate `c` and keeps it only if
/// it is closer to `anchor` than to every neighbor already selected — this
/// prunes clustered candidates and preserves long edges between clusters.
/// Falls back to plain-nearest if the heuristic would leave fewer than
/// `cap / 2` neighbors.
pub fn select_neighbors(graph: &HnswGraph, anchor: NodeId, mut candidates: Vec<Scored>, cap: usize) -> Vec<NodeId> {
    candidates.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    candidates.dedup_by_key(|c| c.node);
    candidates.retain(|c| c.node != anchor);

    let mut selected: Vec<Scored> = Vec::with_capacity(cap);
    for cand in &candidates {
        if selected.len() >= cap {
            break;
        }
        let closer_to_anchor_than_to_any_selected = selected
            .iter()
            .all(|s| cand.distance < graph.dist_nodes(cand.node, s.node));
        if closer_to_anchor_than_to_any_selected {
            selected.push(*cand);
        }
    }

    if selected.len() < cap / 2 {
        selected = candidates.into_iter().take(cap).collect();
    }

    selected.into_iter().map(|s| s.node).collect()
}

/// Replaces `owner`'s neighbor list at `level` with `neighbors`, re-running
/// the heuristic selector first if it would exceed `cap`. The write happens
/// under `owner`'s per-level lock and replaces the list wholesale.
pub fn set_capped(
    graph: &HnswGraph,
    owner: NodeId,
    level: usize,
    mut neighbors: Vec<NodeId>,
    cap: usize,
) {
    if neighbors.len() > cap {
        let scored = neighbors
            .iter()
            .map(|&n| Scored {
                node: n,
                distance: graph.dist_nodes(owner, n),
            })
            .collect();
        neighbors = select_neighbors(graph, owner, scored, cap);
    }
    neighbors.sort();
    neighbors.dedup();
    let node = graph.node(owner);
    if level < node.levels.len() {
        *node.levels[level].write() = neighbors;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hnsw::HnswConfig;

    #[test]
    fn selects_fewer_than_cap_when_candidates_sparse() {
        let graph = HnswGraph::new(HnswConfig::new(2)).unwrap();
        let candidates = vec![];
        let picked = select_neighbors(&graph, NodeId(0), candidates, 16);
        assert!(picked.is_empty());
    }
}
