//! Deletion: tombstone plus local neighbor-list repair so removing a node
//! doesn't orphan the region of the graph around it.

use super::graph::{GraphError, HnswGraph, NodeId};
use super::neighbor::{select_neighbors, set_capped, Scored};
use crate::model::Id;
use std::sync::atomic::Ordering;

/// Tombstones the node for `id` and repairs the neighbor lists around it.
///
/// For each level the node participated in, every neighbor that pointed at
/// it has the edge removed, then gets the node's *other* neighbors at that
/// level offered as replacement candidates (re-running the heuristic
/// selector), so removing one node doesn't disconnect its neighborhood.
///
/// If the deleted node was the entry point, a live neighbor at its top level
/// is promoted; if it had no live neighbors at any level, the entry point
/// falls back to any live node, or `None` if the graph is now empty.
///
/// # Errors
///
/// Returns [`GraphError::UnknownId`] if `id` isn't present.
pub fn delete(graph: &mut HnswGraph, id: &Id) -> Result<(), GraphError> {
    let handle = graph.handle(id).ok_or_else(|| GraphError::UnknownId(id.clone()))?;
    let node = graph.node(handle);
    if node.is_tombstoned() {
        return Ok(());
    }
    node.tombstoned.store(true, Ordering::Release);

    let was_entry = graph.entry_point() == Some(handle);
    let top_level = node.max_level();

    for level in 0..=top_level {
        let own_neighbors = node.levels[level].read().clone();
        for &neighbor in &own_neighbors {
            remove_edge(graph, neighbor, handle, level);
            offer_replacements(graph, neighbor, handle, &own_neighbors, level);
        }
    }

    if was_entry {
        *graph.entry_point.get_mut() = find_replacement_entry(graph);
    }

    Ok(())
}

fn remove_edge(graph: &HnswGraph, owner: NodeId, removed: NodeId, level: usize) {
    let node = graph.node(owner);
    if level >= node.levels.len() {
        return;
    }
    let mut list = node.levels[level].read().clone();
    let before = list.len();
    list.retain(|&n| n != removed);
    if list.len() != before {
        *node.levels[level].write() = list;
    }
}

/// Offers `owner` the deleted node's other neighbors at `level` as
/// replacement edges, re-running the heuristic selector under `owner`'s
/// configured cap.
fn offer_replacements(graph: &HnswGraph, owner: NodeId, removed: NodeId, siblings: &[NodeId], level: usize) {
    let cap = if level == 0 { graph.config.m_max0 as usize } else { graph.config.m as usize };
    let node = graph.node(owner);
    if level >= node.levels.len() {
        return;
    }
    let mut current = node.levels[level].read().clone();
    for &sibling in siblings {
        if sibling != owner && sibling != removed && !graph.node(sibling).is_tombstoned() && !current.contains(&sibling) {
            current.push(sibling);
        }
    }
    if current.len() <= cap {
        *node.levels[level].write() = current;
        return;
    }
    let scored: Vec<Scored> = current
        .iter()
        .map(|&n| Scored { node: n, distance: graph.dist_nodes(owner, n) })
        .collect();
    let chosen = select_neighbors(graph, owner, scored, cap);
    set_capped(graph, owner, level, chosen, cap);
}

fn find_replacement_entry(graph: &HnswGraph) -> Option<NodeId> {
    (0..graph.len())
        .map(|i| NodeId(i as u32))
        .filter(|&n| !graph.node(n).is_tombstoned())
        .max_by_key(|&n| graph.node(n).max_level())
}
