//! The decoder resolves a (map-dependent) location using its own map.
//! This map might differ from the one used during encoding.
//!
//! 1. Decode physical data and check its validity.
//! 2. For each location reference point find candidate vertices and projections into edges.
//! 3. Rate the candidates of each location reference point.
//! 4. Determine the best route between each pair of subsequent location reference points.
//! 5. Check validity of the calculated routes.
//! 6. Concatenate the routes to form the location and trim the path according to the offsets.

mod candidates;
mod line;
mod resolver;
mod route;

use tracing::info;

use crate::decoder::line::{decode_closed_line, decode_line, decode_point_along_line, decode_poi};
use crate::{
    Bearing, DecodeError, DirectedGraph, EdgeMatcher, Length, LocationReference,
    NetworkInterpreter, ReferencedLocation, deserialize_base64_openlr, deserialize_binary_openlr,
};

pub use candidates::{CandidateSnapPoint, SnapPosition};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecoderConfig {
    /// Maximum distance from the LRP to the vertices and edges of the graph that will be
    /// considered.
    pub max_node_distance: Length,
    /// The length of the segment used to compute the edges bearing (distance from the start of
    /// the segment to its end).
    pub bearing_distance: Length,
    /// Maximum bearing difference between the candidate edge bearing and the LRP bearing for the
    /// candidate to be accepted.
    pub max_bearing_difference: Bearing,
    /// Minimum score, in [0, 1], for a candidate to be accepted.
    pub min_candidate_score: f64,
    /// Maximum number of candidates kept for each LRP.
    pub max_candidates: usize,
    /// Absolute variance allowed to the route length between two LRPs.
    pub next_point_variance: Length,
    /// Variance allowed to the route length between two LRPs, relative to the distance to the
    /// next point.
    pub distance_tolerance: f64,
    /// Number of classes the FRC of the route edges can be less important than the lowest FRC to
    /// the next point.
    pub frc_variance: u8,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_node_distance: Length::from_meters(100.0),
            bearing_distance: Length::from_meters(20.0),
            max_bearing_difference: Bearing::from_degrees(90),
            min_candidate_score: 0.2,
            max_candidates: 10,
            next_point_variance: Length::from_meters(150.0),
            distance_tolerance: 0.25,
            frc_variance: 2,
        }
    }
}

/// Decodes OpenLR Location References into locations of the graph it runs on.
///
/// The decoder owns the network interpreter and its match score cache, it can be shared by
/// concurrent decodings on the same network.
#[derive(Debug, Default)]
pub struct Decoder<I> {
    config: DecoderConfig,
    matcher: EdgeMatcher<I>,
}

impl<I> Decoder<I> {
    pub fn new(config: DecoderConfig, interpreter: I) -> Self {
        Self {
            config,
            matcher: EdgeMatcher::new(interpreter),
        }
    }

    pub const fn config(&self) -> &DecoderConfig {
        &self.config
    }

    pub const fn matcher(&self) -> &EdgeMatcher<I> {
        &self.matcher
    }

    /// Decodes an OpenLR Location Reference encoded in Base64.
    pub fn decode_base64<G>(
        &self,
        graph: &G,
        data: impl AsRef<[u8]>,
    ) -> Result<ReferencedLocation<G::EdgeId>, DecodeError<G::Error>>
    where
        G: DirectedGraph + ?Sized,
        I: NetworkInterpreter<G::EdgeAttributes>,
    {
        let location = deserialize_base64_openlr(data).map_err(DecodeError::DeserializeError)?;
        self.decode(graph, &location)
    }

    /// Decodes an OpenLR Location Reference encoded in binary.
    pub fn decode_binary<G>(
        &self,
        graph: &G,
        data: &[u8],
    ) -> Result<ReferencedLocation<G::EdgeId>, DecodeError<G::Error>>
    where
        G: DirectedGraph + ?Sized,
        I: NetworkInterpreter<G::EdgeAttributes>,
    {
        // Step – 1 Decode physical data and check its validity
        let location = deserialize_binary_openlr(data).map_err(DecodeError::DeserializeError)?;
        self.decode(graph, &location)
    }

    /// Decodes an OpenLR Location Reference.
    /// Locations that are not bound to the road network are returned unchanged.
    pub fn decode<G>(
        &self,
        graph: &G,
        location: &LocationReference,
    ) -> Result<ReferencedLocation<G::EdgeId>, DecodeError<G::Error>>
    where
        G: DirectedGraph + ?Sized,
        I: NetworkInterpreter<G::EdgeAttributes>,
    {
        info!("Decoding {location:?} with {:?}", self.config);

        let Self { config, matcher } = self;

        let location = match location {
            LocationReference::Line(line) => {
                ReferencedLocation::Line(decode_line(config, matcher, graph, line)?)
            }
            LocationReference::ClosedLine(line) => {
                ReferencedLocation::Line(decode_closed_line(config, matcher, graph, line)?)
            }
            LocationReference::PointAlongLine(point) => ReferencedLocation::PointAlongLine(
                decode_point_along_line(config, matcher, graph, point)?,
            ),
            LocationReference::Poi(poi) => {
                ReferencedLocation::Poi(decode_poi(config, matcher, graph, poi)?)
            }
            LocationReference::GeoCoordinate(coordinate) => {
                ReferencedLocation::GeoCoordinate(*coordinate)
            }
            LocationReference::Circle(circle) => ReferencedLocation::Circle(circle.clone()),
            LocationReference::Rectangle(rectangle) => {
                ReferencedLocation::Rectangle(rectangle.clone())
            }
            LocationReference::Grid(grid) => ReferencedLocation::Grid(grid.clone()),
            LocationReference::Polygon(polygon) => ReferencedLocation::Polygon(polygon.clone()),
        };

        Ok(location)
    }
}
