use std::cmp::Reverse;

use ordered_float::OrderedFloat;
use tracing::{debug, trace};

use crate::{
    DecodeError, DecoderConfig, DirectedGraph, EdgeMatcher, Length, NetworkInterpreter, Point,
    Score,
};

/// Projections closer than this to the ends of an edge are covered by the vertices.
const MIN_PROJECTION_DISTANCE: Length = Length::from_meters(0.01);

/// Where a Location Reference Point (LRP) snaps onto the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapPosition<VertexId> {
    /// The LRP snaps onto a vertex, the candidate edge exits the vertex (or enters it for the
    /// last LRP).
    Vertex(VertexId),
    /// The LRP is projected into the interior of the candidate edge, that starts at the vertex.
    Projection { start: VertexId },
}

impl<VertexId: Copy> SnapPosition<VertexId> {
    pub const fn is_vertex(&self) -> bool {
        matches!(self, Self::Vertex(_))
    }

    /// The snapped vertex, or the start vertex of the edge the LRP is projected into.
    pub fn vertex(&self) -> VertexId {
        match *self {
            Self::Vertex(vertex) | Self::Projection { start: vertex } => vertex,
        }
    }
}

/// Graph position considered as a possible match for a Location Reference Point (LRP).
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateSnapPoint<VertexId, EdgeId> {
    pub lrp_index: usize,
    pub position: SnapPosition<VertexId>,
    /// Edge the location follows from the snap point (or into it for the last LRP).
    pub edge: EdgeId,
    /// Fraction of the edge that precedes the snap point.
    pub fraction: f64,
    /// Linear distance from the LRP to the snap point.
    pub distance_to_lrp: Length,
    pub score: Score,
}

/// Candidate that is yet to be rated.
#[derive(Debug, Clone, Copy)]
struct ProvisionalCandidate<VertexId, EdgeId> {
    position: SnapPosition<VertexId>,
    edge: EdgeId,
    fraction: f64,
    distance_to_lrp: Length,
}

/// Each location reference point contains coordinates specifying a node in the encoder map. The
/// decoder tries to find candidates in its own map whose positions are close to these coordinates:
/// - Vertices within the search radius, following their exiting edges (entering edges for the
///   last LRP).
/// - Projections of the LRP into the interior of the edges within the search radius, since the
///   nodes of the encoder and decoder maps may differ significantly.
///
/// Candidates are rated, and the ones rated below the configured minimum are discarded.
/// The remaining are sorted from the best to the worst, preferring vertices over projections
/// when rated equally, and bounded to the configured maximum count.
///
/// If no candidate can be found for a location reference point the decoding fails.
pub fn find_candidates<G, I>(
    config: &DecoderConfig,
    matcher: &EdgeMatcher<I>,
    graph: &G,
    lrp_index: usize,
    lrp: &Point,
) -> Result<Vec<CandidateSnapPoint<G::VertexId, G::EdgeId>>, DecodeError<G::Error>>
where
    G: DirectedGraph + ?Sized,
    I: NetworkInterpreter<G::EdgeAttributes>,
{
    debug!("Finding candidates for LRP {lrp_index}: {lrp:?}");

    let mut provisional_candidates = vec![];

    for (vertex, distance_to_lrp) in
        graph.nearest_vertices_within_distance(lrp.coordinate, config.max_node_distance)?
    {
        // only outgoing edges are accepted for the LRPs
        // except for the last LRP where only incoming edges are accepted
        let (edges, fraction): (Vec<_>, _) = if lrp.is_last() {
            (graph.vertex_entering_edges(vertex)?.collect(), 1.0)
        } else {
            (graph.vertex_exiting_edges(vertex)?.collect(), 0.0)
        };

        provisional_candidates.extend(edges.into_iter().map(|(edge, _)| ProvisionalCandidate {
            position: SnapPosition::Vertex(vertex),
            edge,
            fraction,
            distance_to_lrp,
        }));
    }

    for (edge, distance_to_lrp) in
        graph.nearest_edges_within_distance(lrp.coordinate, config.max_node_distance)?
    {
        let length = graph.get_edge_length(edge)?;
        let distance_to_projection = graph.get_distance_along_edge(edge, lrp.coordinate)?;

        if distance_to_projection < MIN_PROJECTION_DISTANCE
            || distance_to_projection > length - MIN_PROJECTION_DISTANCE
        {
            trace!("Skipping projection into {edge:?} at {distance_to_projection}");
            continue;
        }

        provisional_candidates.push(ProvisionalCandidate {
            position: SnapPosition::Projection {
                start: graph.get_edge_start_vertex(edge)?,
            },
            edge,
            fraction: distance_to_projection.meters() / length.meters(),
            distance_to_lrp,
        });
    }

    let mut candidates = Vec::with_capacity(provisional_candidates.len());
    for candidate in provisional_candidates {
        if let Some(candidate) = rate_candidate(config, matcher, graph, lrp_index, lrp, candidate)? {
            candidates.push(candidate);
        }
    }

    if candidates.is_empty() {
        return Err(DecodeError::CandidatesNotFound {
            lrp_index,
            lrp: *lrp,
        });
    }

    sort_candidates(&mut candidates);
    candidates.truncate(config.max_candidates.max(1));

    debug!("Found {} candidates for LRP {lrp_index}", candidates.len());
    Ok(candidates)
}

/// Sorts the candidates from the best to the worst rated.
/// Ties prefer vertices over projections, then the smaller vertex and edge IDs.
fn sort_candidates<VertexId, EdgeId>(candidates: &mut [CandidateSnapPoint<VertexId, EdgeId>])
where
    VertexId: Copy + Ord,
    EdgeId: Copy + Ord,
{
    candidates.sort_by_key(|candidate| {
        (
            Reverse(OrderedFloat(candidate.score.value())),
            !candidate.position.is_vertex(),
            candidate.position.vertex(),
            candidate.edge,
        )
    });
}

/// Candidates are rated according to the following criteria:
/// - The snap point shall be as close as possible to the coordinates of the LRP.
/// - The bearing of the edge from the snap point should match the bearing of the LRP.
/// - The functional road class and form of way of the edge should match the ones of the LRP.
///
/// The rating is the product of the three, candidates whose bearing differs too much are rejected.
fn rate_candidate<G, I>(
    config: &DecoderConfig,
    matcher: &EdgeMatcher<I>,
    graph: &G,
    lrp_index: usize,
    lrp: &Point,
    candidate: ProvisionalCandidate<G::VertexId, G::EdgeId>,
) -> Result<Option<CandidateSnapPoint<G::VertexId, G::EdgeId>>, G::Error>
where
    G: DirectedGraph + ?Sized,
    I: NetworkInterpreter<G::EdgeAttributes>,
{
    let ProvisionalCandidate {
        position,
        edge,
        fraction,
        distance_to_lrp,
    } = candidate;

    let distance = if config.max_node_distance.is_zero() {
        1.0
    } else {
        1.0 - distance_to_lrp.meters() / config.max_node_distance.meters()
    };

    let length = graph.get_edge_length(edge)?;
    let bearing = if length.is_zero() {
        1.0
    } else {
        let distance_from_start = length * fraction;
        let bearing = if lrp.is_last() {
            graph.get_edge_bearing(
                edge,
                distance_from_start,
                config.bearing_distance.reverse(),
            )?
        } else {
            graph.get_edge_bearing(edge, distance_from_start, config.bearing_distance)?
        };

        if bearing.difference(&lrp.line.bearing) > config.max_bearing_difference {
            trace!("Candidate {edge:?} bearing out of bounds: {bearing:?}");
            return Ok(None);
        }
        bearing.similarity(&lrp.line.bearing)
    };

    let frc_fow = matcher.match_edge(graph, edge, lrp.line.frc, lrp.line.fow)?;

    let score = Score::normalized("distance", "Distance of the LRP to the snap point", distance)
        * Score::normalized("bearing", "Similarity of the LRP and edge bearings", bearing)
        * Score::normalized("frc_fow", "Match of the LRP and edge FRC and FOW", frc_fow);

    if score.value() < config.min_candidate_score {
        trace!("Rating {edge:?} too low = {score}");
        return Ok(None);
    }

    trace!("Rating {edge:?} accepted = {score}");
    Ok(Some(CandidateSnapPoint {
        lrp_index,
        position,
        edge,
        fraction,
        distance_to_lrp,
        score,
    }))
}
