use crate::{DirectedGraph, Length};

#[derive(Debug, Clone, PartialEq)]
pub struct Path<EdgeId> {
    pub length: Length,
    pub edges: Vec<EdgeId>,
}

impl<EdgeId> Default for Path<EdgeId> {
    fn default() -> Self {
        Self {
            length: Length::ZERO,
            edges: vec![],
        }
    }
}

/// Returns true only if all the edges of the path are sequentially connected in the given graph.
/// If turning between any of the sequential edges is not allowed returns false.
pub fn is_path_connected<G: DirectedGraph + ?Sized>(
    graph: &G,
    path: &[G::EdgeId],
) -> Result<bool, G::Error> {
    for window in path.windows(2) {
        let [e1, e2] = [window[0], window[1]];

        if graph.is_turn_restricted(e1, e2)? {
            return Ok(false);
        }

        if !graph
            .vertex_exiting_edges(graph.get_edge_end_vertex(e1)?)?
            .any(|(e, _)| e == e2)
        {
            return Ok(false);
        }
    }

    Ok(true)
}

/// Returns the sum of the lengths of all the edges of the path.
pub fn path_length<G: DirectedGraph + ?Sized>(
    graph: &G,
    path: &[G::EdgeId],
) -> Result<Length, G::Error> {
    path.iter().map(|&edge| graph.get_edge_length(edge)).sum()
}
