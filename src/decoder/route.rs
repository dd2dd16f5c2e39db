use std::ops::Deref;

use crate::decoder::candidates::CandidateSnapPoint;
use crate::graph::path::Path;
use crate::{DirectedGraph, Length, Score};

/// The route between two consecutive LRPs, from the snap point of the first to the snap point
/// of the second one.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateRoute<VertexId, EdgeId> {
    pub source: CandidateSnapPoint<VertexId, EdgeId>,
    pub target: CandidateSnapPoint<VertexId, EdgeId>,
    /// Complete edges from the source edge to the target edge.
    pub path: Path<EdgeId>,
    /// Length between the two snap points.
    pub length: Length,
    pub score: Score,
}

/// The sequence of the best routes that connect each consecutive LRP pair.
/// Each route starts on the snap point where the previous route ends.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateRoutes<VertexId, EdgeId>(Vec<CandidateRoute<VertexId, EdgeId>>);

impl<VertexId, EdgeId> From<Vec<CandidateRoute<VertexId, EdgeId>>>
    for CandidateRoutes<VertexId, EdgeId>
{
    fn from(routes: Vec<CandidateRoute<VertexId, EdgeId>>) -> Self {
        Self(routes)
    }
}

impl<VertexId, EdgeId> Deref for CandidateRoutes<VertexId, EdgeId> {
    type Target = Vec<CandidateRoute<VertexId, EdgeId>>;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<VertexId, EdgeId: Copy + PartialEq> CandidateRoutes<VertexId, EdgeId> {
    /// Stitches the routes into a single path.
    /// Consecutive routes share the edge of the snap point that joins them.
    pub fn to_path(&self) -> Vec<EdgeId> {
        let capacity = self.0.iter().map(|r| r.path.edges.len()).sum::<usize>();
        let mut path: Vec<EdgeId> = Vec::with_capacity(capacity);

        for route in &self.0 {
            let edges = match (path.last(), route.path.edges.split_first()) {
                (Some(last), Some((first, edges))) if last == first => edges,
                _ => &route.path.edges,
            };
            path.extend_from_slice(edges);
        }

        path
    }

    /// Total length between the snap points of the first and the last LRP.
    pub fn length(&self) -> Length {
        self.0.iter().map(|r| r.length).sum()
    }

    /// Distance from the start of the path to the snap point of the first LRP.
    pub fn head_length<G>(&self, graph: &G) -> Result<Length, G::Error>
    where
        G: DirectedGraph<VertexId = VertexId, EdgeId = EdgeId> + ?Sized,
    {
        match self.0.first() {
            Some(CandidateRoute { source, .. }) => {
                Ok(graph.get_edge_length(source.edge)? * source.fraction)
            }
            None => Ok(Length::ZERO),
        }
    }

    /// Distance from the snap point of the last LRP to the end of the path.
    pub fn tail_length<G>(&self, graph: &G) -> Result<Length, G::Error>
    where
        G: DirectedGraph<VertexId = VertexId, EdgeId = EdgeId> + ?Sized,
    {
        match self.0.last() {
            Some(CandidateRoute { target, .. }) => {
                Ok(graph.get_edge_length(target.edge)? * (1.0 - target.fraction))
            }
            None => Ok(Length::ZERO),
        }
    }
}
