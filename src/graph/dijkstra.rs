use std::cmp::Reverse;

use radix_heap::{Radix, RadixHeapMap};
use rustc_hash::FxHashMap;
use tracing::trace;

use crate::graph::path::Path;
use crate::{DirectedGraph, Length};

// Lengths in the heap are never negative, and the bit patterns of non-negative
// floats are ordered like the floats themselves.
impl Radix for Length {
    const RADIX_BITS: u32 = 64;

    fn radix_similarity(&self, other: &Self) -> u32 {
        (self.meters().to_bits() ^ other.meters().to_bits()).leading_zeros()
    }
}

/// Computes the shortest path from the end of the source edge to the start of the target edge that
/// is not longer than the max length. Edges are followed only if admissible, and turns between
/// consecutive edges only if allowed, including the turn out of the source edge and the turn into
/// the target edge. The returned path contains neither the source nor the target edge.
///
/// Every directed edge is visited at most once, so a turn restriction never hides a detour through
/// a vertex that was already reached by a different edge.
pub fn shortest_path<G, F>(
    graph: &G,
    source: G::EdgeId,
    target: G::EdgeId,
    max_length: Length,
    mut is_admissible: F,
) -> Result<Option<Path<G::EdgeId>>, G::Error>
where
    G: DirectedGraph + ?Sized,
    F: FnMut(G::EdgeId) -> Result<bool, G::Error>,
{
    let destination = graph.get_edge_start_vertex(target)?;
    trace!("Computing shortest path {source:?} -> {target:?} within {max_length}");

    // (current) shortest distance from the end of the source edge to the end of this edge
    let mut shortest_distances = FxHashMap::from_iter([(source, Length::ZERO)]);

    // previous edge (value) on the current best known path from the source edge to this edge (key)
    let mut previous_map: FxHashMap<G::EdgeId, G::EdgeId> = FxHashMap::default();

    // monotone priority queue of discovered edges that may need to be visited
    let mut heap = RadixHeapMap::from_iter([(Reverse(Length::ZERO), source)]);

    while let Some((Reverse(distance), edge)) = heap.pop() {
        // check if we already know a cheaper way to get to this edge from the source
        let shortest_distance = *shortest_distances.get(&edge).unwrap_or(&Length::MAX);
        if distance > shortest_distance {
            continue;
        }

        let vertex = graph.get_edge_end_vertex(edge)?;
        if vertex == destination && !graph.is_turn_restricted(edge, target)? {
            return Ok(Some(Path {
                length: distance,
                edges: unpack_path(&previous_map, edge),
            }));
        }

        for (edge_to, _) in graph.vertex_exiting_edges(vertex)? {
            let distance = distance + graph.get_edge_length(edge_to)?;
            if distance > max_length {
                continue;
            }

            if graph.is_turn_restricted(edge, edge_to)? || !is_admissible(edge_to)? {
                continue;
            }

            let shortest_distance = *shortest_distances.get(&edge_to).unwrap_or(&Length::MAX);
            // check if we can follow the current path to reach the edge in a cheaper way
            if distance < shortest_distance {
                shortest_distances.insert(edge_to, distance);
                previous_map.insert(edge_to, edge);
                heap.push(Reverse(distance), edge_to);
            }
        }
    }

    Ok(None)
}

/// Unpacks the shortest path from its last edge back to the source edge, which is left out.
fn unpack_path<EdgeId>(previous_map: &FxHashMap<EdgeId, EdgeId>, last: EdgeId) -> Vec<EdgeId>
where
    EdgeId: Copy + Eq + std::hash::Hash,
{
    let mut edges = vec![];
    let mut next = last;

    while let Some(&previous) = previous_map.get(&next) {
        edges.push(next);
        next = previous;
    }

    edges.reverse();
    edges
}
