use std::cmp::Reverse;

use ordered_float::OrderedFloat;
use tracing::{debug, trace};

use crate::decoder::candidates::CandidateSnapPoint;
use crate::decoder::route::{CandidateRoute, CandidateRoutes};
use crate::graph::path::{Path, is_path_connected};
use crate::{
    DecodeError, DecoderConfig, DirectedGraph, EdgeMatcher, Length, NetworkInterpreter, Point,
    Score,
};

/// The decoder needs to compute a route between each pair of subsequent location reference points.
/// The candidate of the first LRP of the pair acts as start of the route, the candidate of the
/// second LRP of the pair is the end of the route. If both candidates lie on the same edge, in the
/// right order, no shortest-path calculation needs to be started.
///
/// The shortest path only follows edges having a functional road class lower than or equal to the
/// lowest functional road class to the next point, relaxed by the configured variance since the
/// decoder map may classify its roads differently than the encoder map.
///
/// The length of each route is checked against the distance to next point of the first LRP of the
/// pair: routes that deviate more than the configured variance and tolerance are rejected.
///
/// Pairs are selected greedily: every combination of candidates of the pair is rated (the sum of
/// both candidate ratings and the rating of the route length) and the best one is kept. The route
/// of the next pair then starts from the candidate chosen as the end of the previous route.
/// Ties prefer the smaller vertices and edges.
///
/// If no route can be found for two subsequent location reference points the decoding fails.
pub fn resolve_routes<G, I>(
    config: &DecoderConfig,
    matcher: &EdgeMatcher<I>,
    graph: &G,
    points: &[Point],
    candidates: &[Vec<CandidateSnapPoint<G::VertexId, G::EdgeId>>],
) -> Result<CandidateRoutes<G::VertexId, G::EdgeId>, DecodeError<G::Error>>
where
    G: DirectedGraph + ?Sized,
    I: NetworkInterpreter<G::EdgeAttributes>,
{
    debug!("Resolving routes for {} LRPs", points.len());

    let mut routes: Vec<CandidateRoute<G::VertexId, G::EdgeId>> =
        Vec::with_capacity(points.len().saturating_sub(1));

    for (lrp_index, (lrp, targets)) in points.iter().zip(candidates.iter().skip(1)).enumerate() {
        let sources = match routes.last() {
            Some(route) => vec![route.target.clone()],
            None => candidates.first().cloned().unwrap_or_default(),
        };

        let mut attempted_pairs = 0;
        let mut best_route: Option<CandidateRoute<G::VertexId, G::EdgeId>> = None;

        for source in &sources {
            for target in targets {
                attempted_pairs += 1;

                let Some(route) =
                    resolve_candidate_route(config, matcher, graph, lrp, source, target)?
                else {
                    continue;
                };

                if best_route
                    .as_ref()
                    .is_none_or(|best| route_order(&route) < route_order(best))
                {
                    best_route = Some(route);
                }
            }
        }

        let Some(route) = best_route else {
            debug!("No route from LRP {lrp_index} after {attempted_pairs} pairs");
            return Err(DecodeError::RouteNotFound {
                lrp_index,
                attempted_pairs,
            });
        };

        debug!(
            "Route from LRP {lrp_index}: {:?} {} = {}",
            route.path.edges, route.length, route.score
        );
        routes.push(route);
    }

    Ok(CandidateRoutes::from(routes))
}

fn route_order<VertexId, EdgeId>(
    route: &CandidateRoute<VertexId, EdgeId>,
) -> (Reverse<OrderedFloat<f64>>, VertexId, VertexId, EdgeId, EdgeId)
where
    VertexId: Copy,
    EdgeId: Copy,
{
    (
        Reverse(OrderedFloat(route.score.value())),
        route.source.position.vertex(),
        route.target.position.vertex(),
        route.source.edge,
        route.target.edge,
    )
}

/// Computes the route between the snap points of the candidates, if any is acceptable.
fn resolve_candidate_route<G, I>(
    config: &DecoderConfig,
    matcher: &EdgeMatcher<I>,
    graph: &G,
    lrp: &Point,
    source: &CandidateSnapPoint<G::VertexId, G::EdgeId>,
    target: &CandidateSnapPoint<G::VertexId, G::EdgeId>,
) -> Result<Option<CandidateRoute<G::VertexId, G::EdgeId>>, G::Error>
where
    G: DirectedGraph + ?Sized,
    I: NetworkInterpreter<G::EdgeAttributes>,
{
    let dnp = lrp.dnp();
    let max_deviation = config.next_point_variance + dnp * config.distance_tolerance;
    let max_length = dnp + max_deviation;

    let source_length = graph.get_edge_length(source.edge)?;
    let target_length = graph.get_edge_length(target.edge)?;

    let (path, length) = if source.edge == target.edge && source.fraction <= target.fraction {
        let path = Path {
            length: source_length,
            edges: vec![source.edge],
        };
        (path, source_length * (target.fraction - source.fraction))
    } else {
        let head_length = source_length * (1.0 - source.fraction);
        let tail_length = target_length * target.fraction;

        let max_length = max_length - head_length - tail_length;
        if max_length < Length::ZERO {
            trace!("Skipping {:?} -> {:?}: too long", source.edge, target.edge);
            return Ok(None);
        }

        let lfrcnp = lrp.lfrcnp().relaxed(config.frc_variance);

        let shortest_path = graph.shortest_path(source.edge, target.edge, max_length, |edge| {
            Ok(matcher
                .edge_frc(graph, edge)?
                .is_none_or(|frc| frc <= lfrcnp))
        })?;

        let Some(shortest_path) = shortest_path else {
            trace!("Skipping {:?} -> {:?}: no path", source.edge, target.edge);
            return Ok(None);
        };

        let mut edges = Vec::with_capacity(shortest_path.edges.len() + 2);
        edges.push(source.edge);
        edges.extend(shortest_path.edges);
        edges.push(target.edge);

        let path = Path {
            length: source_length + shortest_path.length + target_length,
            edges,
        };
        (path, head_length + shortest_path.length + tail_length)
    };

    if length.abs_diff(dnp) > max_deviation {
        trace!("Skipping {:?}: {length} too far from {dnp}", path.edges);
        return Ok(None);
    }

    if !is_path_connected(graph, &path.edges)? {
        trace!("Skipping {:?}: not connected", path.edges);
        return Ok(None);
    }

    let score = source.score.clone() + target.score.clone() + path_length_score(length, dnp);

    Ok(Some(CandidateRoute {
        source: source.clone(),
        target: target.clone(),
        path,
        length,
        score,
    }))
}

/// Rates how close the length of the route is to the expected distance to the next point.
fn path_length_score(length: Length, expected: Length) -> Score {
    let value = if expected.is_zero() {
        if length.is_zero() { 1.0 } else { 0.0 }
    } else {
        1.0 - length.abs_diff(expected).meters() / expected.meters()
    };

    Score::normalized(
        "path_length",
        "Match of the route length and the distance to the next point",
        value,
    )
}
