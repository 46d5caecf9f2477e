//! Node insertion: top-down greedy descent to the new node's top level,
//! bounded best-first search per level, heuristic neighbor selection, and
//! bidirectional edge wiring.

use super::graph::{GraphError, HnswGraph, NodeId};
use super::neighbor::{select_neighbors, set_capped, Scored};
use super::search::{greedy_descend, search_layer};
use crate::model::Id;

/// Inserts `vector` under `id` into `graph`.
///
/// Requires exclusive access to `graph` (arena growth and entry-point
/// replacement aren't safe to interleave with another insert) — callers
/// serialize inserts, typically behind a single writer lock, while reads
/// (`search`) remain lock-free against the per-node neighbor lists.
///
/// # Errors
///
/// Returns [`GraphError::DimensionMismatch`] if `vector`'s length doesn't
/// match the index, or [`GraphError::DuplicateId`] if `id` is already
/// present.
pub fn insert(graph: &mut HnswGraph, id: Id, vector: Vec<f32>) -> Result<(), GraphError> {
    graph.validate_dim(&vector)?;
    if graph.handle(&id).is_some() {
        return Err(GraphError::DuplicateId(id));
    }

    let new_level = graph.sample_level();
    let entry = graph.entry_point();

    let Some(entry) = entry else {
        let handle = graph.push_node(id, vector, new_level);
        *graph.entry_point.get_mut() = Some(handle);
        return Ok(());
    };

    let top_level = graph.node(entry).max_level();
    let handle = graph.push_node(id, vector.clone(), new_level);

    let mut cur = entry;
    if new_level < top_level {
        cur = greedy_descend(graph, &vector, entry, top_level, new_level);
    }

    let search_from = new_level.min(top_level);
    let mut entry_points = vec![cur];

    for level in (0..=search_from).rev() {
        let found = search_layer(graph, &vector, &entry_points, graph.config.ef_construction as usize, level, &|_| false);
        let cap = if level == 0 { graph.config.m_max0 as usize } else { graph.config.m as usize };

        let scored: Vec<Scored> = found
            .iter()
            .map(|c| Scored { node: c.node, distance: c.distance })
            .collect();
        let chosen = select_neighbors(graph, handle, scored, cap);

        set_capped(graph, handle, level, chosen.clone(), cap);

        for &neighbor in &chosen {
            link_back(graph, neighbor, handle, level, cap);
        }

        entry_points = found.into_iter().map(|c| c.node).collect();
        if entry_points.is_empty() {
            entry_points = vec![cur];
        }
    }

    if new_level > top_level {
        *graph.entry_point.get_mut() = Some(handle);
    }

    Ok(())
}

/// Adds `new_member` to `neighbor`'s neighbor list at `level`, re-running the
/// heuristic selector if this pushes it over `cap`. Safe to call without
/// external locking since insertion already holds `graph` exclusively; reads
/// via `search` only ever see a list swapped in wholesale, never a partial
/// write.
fn link_back(graph: &HnswGraph, neighbor: NodeId, new_member: NodeId, level: usize, cap: usize) {
    let node = graph.node(neighbor);
    if level >= node.levels.len() {
        return;
    }
    let mut current = node.levels[level].read().clone();
    if current.contains(&new_member) {
        return;
    }
    current.push(new_member);
    set_capped(graph, neighbor, level, current, cap);
}
