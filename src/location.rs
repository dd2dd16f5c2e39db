use crate::graph::path::{is_path_connected, path_length};
use crate::{
    Circle, Coordinate, DirectedGraph, Grid, Length, LocationError, Orientation, Polygon,
    Rectangle, SideOfRoad,
};

/// Location (in a map) that is the result of the decoding process.
/// Locations that are not bound to the network are returned as they are.
#[derive(Debug, Clone, PartialEq)]
pub enum ReferencedLocation<EdgeId> {
    Line(ReferencedLine<EdgeId>),
    GeoCoordinate(Coordinate),
    PointAlongLine(ReferencedPointAlongLine<EdgeId>),
    Poi(ReferencedPoi<EdgeId>),
    Circle(Circle),
    Rectangle(Rectangle),
    Grid(Grid),
    Polygon(Polygon),
}

/// Path of a network that represents a Line Location Reference.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferencedLine<EdgeId> {
    /// Identity of the network the edges belong to.
    pub network: String,
    /// Complete list of directed edges that form the line.
    pub edges: Vec<EdgeId>,
    /// Fraction of the first edge that precedes the beginning of the location.
    pub pos_offset: f64,
    /// Fraction of the last edge that follows the end of the location.
    pub neg_offset: f64,
}

/// Point on a path of a network that represents a Point Along Line Location Reference.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferencedPointAlongLine<EdgeId> {
    /// Path between the first and the last LRP the point belongs to.
    pub route: ReferencedLine<EdgeId>,
    /// Edge of the route the point lies on.
    pub edge: EdgeId,
    /// Fraction of the edge that precedes the point.
    pub fraction: f64,
    pub coordinate: Coordinate,
    pub orientation: Orientation,
    pub side: SideOfRoad,
}

/// Point of interest reachable from an access point on the network.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferencedPoi<EdgeId> {
    /// Access point of the POI.
    pub point: ReferencedPointAlongLine<EdgeId>,
    pub coordinate: Coordinate,
}

impl<EdgeId: Copy> ReferencedLine<EdgeId> {
    /// Constructs a valid Line location from the path trimmed by its offsets (in meters).
    ///
    /// The offsets must fulfill the following constraints:
    /// - The sum of the positive and negative offset cannot be greater than the total length of the
    ///   location edges.
    /// - Positive offset value shall be less than the length of the first edge:
    ///     - Otherwise the first edge is removed from the list of location edges and the offset
    ///       value is reduced in the same way.
    ///     - This procedure is repeated until this constraint is fulfilled.
    /// - Negative offset value shall be less than the length of the last edge (same as above).
    ///
    /// The remaining offsets are expressed as fractions of the first and last edge.
    pub fn from_path<G>(
        graph: &G,
        mut edges: Vec<EdgeId>,
        mut pos_offset: Length,
        mut neg_offset: Length,
    ) -> Result<Self, LocationError<G::Error>>
    where
        G: DirectedGraph<EdgeId = EdgeId> + ?Sized,
    {
        if edges.is_empty() {
            return Err(LocationError::Empty);
        } else if !is_path_connected(graph, &edges)? {
            return Err(LocationError::NotConnected);
        }

        if pos_offset + neg_offset >= path_length(graph, &edges)? {
            return Err(LocationError::InvalidOffsets((pos_offset, neg_offset)));
        }

        let (start, cut_length) = get_path_cut(graph, edges.iter().copied(), pos_offset)?;
        pos_offset -= cut_length;

        let (end, cut_length) = get_path_cut(graph, edges.iter().rev().copied(), neg_offset)?;
        let end = edges.len() - end;
        neg_offset -= cut_length;

        edges.truncate(end);
        edges.drain(..start);

        let first_length = graph.get_edge_length(edges[0])?;
        let last_length = graph.get_edge_length(edges[edges.len() - 1])?;

        Ok(Self {
            network: graph.network_id().to_owned(),
            edges,
            pos_offset: fraction_of(pos_offset, first_length),
            neg_offset: fraction_of(neg_offset, last_length),
        })
    }

    /// Total length of all the edges, offsets included.
    pub fn path_length<G>(&self, graph: &G) -> Result<Length, G::Error>
    where
        G: DirectedGraph<EdgeId = EdgeId> + ?Sized,
    {
        path_length(graph, &self.edges)
    }

    /// Length of the location, that is the path without its offsets.
    pub fn length<G>(&self, graph: &G) -> Result<Length, G::Error>
    where
        G: DirectedGraph<EdgeId = EdgeId> + ?Sized,
    {
        let (Some(&first), Some(&last)) = (self.edges.first(), self.edges.last()) else {
            return Ok(Length::ZERO);
        };

        let pos_offset = graph.get_edge_length(first)? * self.pos_offset;
        let neg_offset = graph.get_edge_length(last)? * self.neg_offset;
        Ok(self.path_length(graph)? - pos_offset - neg_offset)
    }

    /// Gets the edge at the given distance from the start of the location, and the fraction of
    /// the edge that precedes that distance. Distances beyond the end of the location fall into
    /// the last edge. Returns None if the location has no edges.
    pub fn locate<G>(
        &self,
        graph: &G,
        distance: Length,
    ) -> Result<Option<(EdgeId, f64)>, G::Error>
    where
        G: DirectedGraph<EdgeId = EdgeId> + ?Sized,
    {
        let Some(&first) = self.edges.first() else {
            return Ok(None);
        };

        let mut distance = distance + graph.get_edge_length(first)? * self.pos_offset;

        for (i, &edge) in self.edges.iter().enumerate() {
            let length = graph.get_edge_length(edge)?;
            if distance < length || i == self.edges.len() - 1 {
                return Ok(Some((edge, fraction_of(distance, length))));
            }
            distance -= length;
        }

        Ok(None)
    }
}

fn fraction_of(offset: Length, length: Length) -> f64 {
    if length.is_zero() {
        0.0
    } else {
        (offset.meters() / length.meters()).clamp(0.0, 1.0)
    }
}

/// Returns the index of the edge the offset falls into and the total length of the edges before it.
fn get_path_cut<G, I>(graph: &G, edges: I, offset: Length) -> Result<(usize, Length), G::Error>
where
    G: DirectedGraph + ?Sized,
    I: IntoIterator<Item = G::EdgeId>,
{
    let mut cut = (0, Length::ZERO);
    let mut length = Length::ZERO;

    for (i, edge) in edges.into_iter().enumerate() {
        if length > offset {
            break;
        }
        cut = (i, length);
        length += graph.get_edge_length(edge)?;
    }

    Ok(cut)
}
