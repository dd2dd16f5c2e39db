use tracing::debug;

use crate::decoder::candidates::find_candidates;
use crate::decoder::resolver::resolve_routes;
use crate::decoder::route::CandidateRoutes;
use crate::{
    ClosedLine, DecodeError, DecoderConfig, DirectedGraph, EdgeMatcher, Line, LocationError,
    NetworkInterpreter, Poi, Point, PointAlongLine, ReferencedLine, ReferencedPoi,
    ReferencedPointAlongLine,
};

pub fn decode_line<G, I>(
    config: &DecoderConfig,
    matcher: &EdgeMatcher<I>,
    graph: &G,
    line: &Line,
) -> Result<ReferencedLine<G::EdgeId>, DecodeError<G::Error>>
where
    G: DirectedGraph + ?Sized,
    I: NetworkInterpreter<G::EdgeAttributes>,
{
    let routes = resolve_location_routes(config, matcher, graph, &line.points)?;

    // Concatenate and trim path according to the offsets
    let length = routes.length();
    let pos_offset = routes.head_length(graph)? + line.offsets.pos.of(length);
    let neg_offset = routes.tail_length(graph)? + line.offsets.neg.of(length);
    debug!("Trimming path of {length} by {pos_offset} and {neg_offset}");

    Ok(ReferencedLine::from_path(
        graph,
        routes.to_path(),
        pos_offset,
        neg_offset,
    )?)
}

/// A closed line is decoded as the line that comes back to its first LRP.
pub fn decode_closed_line<G, I>(
    config: &DecoderConfig,
    matcher: &EdgeMatcher<I>,
    graph: &G,
    line: &ClosedLine,
) -> Result<ReferencedLine<G::EdgeId>, DecodeError<G::Error>>
where
    G: DirectedGraph + ?Sized,
    I: NetworkInterpreter<G::EdgeAttributes>,
{
    decode_line(config, matcher, graph, &line.to_line())
}

pub fn decode_point_along_line<G, I>(
    config: &DecoderConfig,
    matcher: &EdgeMatcher<I>,
    graph: &G,
    point: &PointAlongLine,
) -> Result<ReferencedPointAlongLine<G::EdgeId>, DecodeError<G::Error>>
where
    G: DirectedGraph + ?Sized,
    I: NetworkInterpreter<G::EdgeAttributes>,
{
    let routes = resolve_location_routes(config, matcher, graph, &point.points)?;

    let route = ReferencedLine::from_path(
        graph,
        routes.to_path(),
        routes.head_length(graph)?,
        routes.tail_length(graph)?,
    )?;

    let distance = point.offset.of(routes.length());
    let (edge, fraction) = route
        .locate(graph, distance)?
        .ok_or(LocationError::<G::Error>::Empty)?;

    let length = graph.get_edge_length(edge)?;
    let coordinate = graph.get_coordinate_along_edge(edge, length * fraction)?;
    debug!("Point at {distance} is on {edge:?} at {fraction}: {coordinate:?}");

    Ok(ReferencedPointAlongLine {
        route,
        edge,
        fraction,
        coordinate,
        orientation: point.orientation,
        side: point.side,
    })
}

pub fn decode_poi<G, I>(
    config: &DecoderConfig,
    matcher: &EdgeMatcher<I>,
    graph: &G,
    poi: &Poi,
) -> Result<ReferencedPoi<G::EdgeId>, DecodeError<G::Error>>
where
    G: DirectedGraph + ?Sized,
    I: NetworkInterpreter<G::EdgeAttributes>,
{
    let point = decode_point_along_line(config, matcher, graph, &poi.point)?;

    Ok(ReferencedPoi {
        point,
        coordinate: poi.coordinate,
    })
}

/// Finds the candidates of each LRP and resolves the routes between them.
fn resolve_location_routes<G, I>(
    config: &DecoderConfig,
    matcher: &EdgeMatcher<I>,
    graph: &G,
    points: &[Point],
) -> Result<CandidateRoutes<G::VertexId, G::EdgeId>, DecodeError<G::Error>>
where
    G: DirectedGraph + ?Sized,
    I: NetworkInterpreter<G::EdgeAttributes>,
{
    if points.len() < 2 {
        return Err(DecodeError::InvalidLocation(LocationError::Empty));
    }

    // For each location reference point find and rate candidates
    let candidates = points
        .iter()
        .enumerate()
        .map(|(lrp_index, lrp)| find_candidates(config, matcher, graph, lrp_index, lrp))
        .collect::<Result<Vec<_>, _>>()?;

    // Determine and check the routes between all subsequent location reference points
    let routes = resolve_routes(config, matcher, graph, points, &candidates)?;
    debug_assert_eq!(routes.len(), points.len() - 1);

    Ok(routes)
}
