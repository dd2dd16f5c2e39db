use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use geo::{BoundingRect, Distance, HaversineClosestPoint, InterpolatableLine};
use graph::prelude::{DirectedCsrGraph, DirectedNeighborsWithValues};
use openlr_referencing::{Bearing, Coordinate, DirectedGraph, Length};

use crate::graph::{GEOJSON_GRAPH, GeojsonGraph, Tags};

pub static NETWORK_GRAPH: LazyLock<NetworkGraph> =
    LazyLock::new(|| NetworkGraph::from_geojson_graph(&GEOJSON_GRAPH));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexId(pub i64);

impl VertexId {
    const fn index(&self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(pub i64);

impl EdgeId {
    const fn is_reversed(&self) -> bool {
        self.0.is_negative()
    }

    const fn undirected(&self) -> Self {
        Self(self.0.abs())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkError {
    UnknownVertex(VertexId),
    UnknownEdge(EdgeId),
    InvalidGeometry(EdgeId),
}

#[derive(Debug, Clone, PartialEq)]
struct EdgeProperties {
    length: Length,
    type_id: usize,
    geometry: geo::LineString,
    vertices: [VertexId; 2],
}

pub struct NetworkGraph {
    network: DirectedCsrGraph<usize, (), EdgeId>,
    vertices: HashMap<VertexId, Coordinate>,
    directed_edges: HashSet<EdgeId>,
    geospatial_nodes: rstar::RTree<GeospatialNode>,
    geospatial_edges: rstar::RTree<GeospatialEdge>,
    edge_properties: HashMap<EdgeId, EdgeProperties>,
    edge_types: Vec<Tags>,
}

#[derive(Debug)]
struct GeospatialNode {
    vertex: VertexId,
    location: Coordinate,
}

impl rstar::RTreeObject for GeospatialNode {
    type Envelope = rstar::AABB<geo::Point>;
    fn envelope(&self) -> Self::Envelope {
        rstar::AABB::from_point(geo::Point::new(self.location.lon, self.location.lat))
    }
}

impl rstar::PointDistance for GeospatialNode {
    fn distance_2(&self, point: &geo::Point) -> f64 {
        let location = geo::Point::new(self.location.lon, self.location.lat);
        geo::Haversine.distance(location, *point).powf(2.0)
    }
}

#[derive(Debug)]
struct GeospatialEdge {
    edge: EdgeId,
    geometry: geo::LineString,
}

impl rstar::RTreeObject for GeospatialEdge {
    type Envelope = rstar::AABB<geo::Point>;

    fn envelope(&self) -> Self::Envelope {
        match self.geometry.bounding_rect() {
            Some(bbox) => rstar::AABB::from_corners(
                geo::Point::new(bbox.min().x, bbox.min().y),
                geo::Point::new(bbox.max().x, bbox.max().y),
            ),
            None => rstar::AABB::from_point(geo::Point::new(0.0, 0.0)),
        }
    }
}

impl rstar::PointDistance for GeospatialEdge {
    fn distance_2(&self, point: &geo::Point) -> f64 {
        match self.geometry.haversine_closest_point(point) {
            geo::Closest::SinglePoint(p) | geo::Closest::Intersection(p) => {
                geo::Haversine.distance(p, *point).powf(2.0)
            }
            geo::Closest::Indeterminate => f64::INFINITY,
        }
    }
}

impl DirectedGraph for NetworkGraph {
    type VertexId = VertexId;
    type EdgeId = EdgeId;
    type EdgeAttributes = Tags;
    type Error = NetworkError;

    fn network_id(&self) -> &str {
        "geojson"
    }

    fn get_vertex_coordinate(&self, vertex: VertexId) -> Result<Coordinate, NetworkError> {
        self.vertices
            .get(&vertex)
            .copied()
            .ok_or(NetworkError::UnknownVertex(vertex))
    }

    fn get_edge_start_vertex(&self, edge: EdgeId) -> Result<VertexId, NetworkError> {
        let EdgeProperties { vertices, .. } = self.edge_properties(edge)?;
        if edge.is_reversed() {
            Ok(vertices[1])
        } else {
            Ok(vertices[0])
        }
    }

    fn get_edge_end_vertex(&self, edge: EdgeId) -> Result<VertexId, NetworkError> {
        let EdgeProperties { vertices, .. } = self.edge_properties(edge)?;
        if edge.is_reversed() {
            Ok(vertices[0])
        } else {
            Ok(vertices[1])
        }
    }

    fn get_edge_length(&self, edge: EdgeId) -> Result<Length, NetworkError> {
        Ok(self.edge_properties(edge)?.length)
    }

    fn get_edge_attributes(&self, edge: EdgeId) -> Result<Tags, NetworkError> {
        let EdgeProperties { type_id, .. } = self.edge_properties(edge)?;
        Ok(self.edge_types[*type_id].clone())
    }

    fn get_edge_type_id(&self, edge: EdgeId) -> Result<Option<usize>, NetworkError> {
        Ok(Some(self.edge_properties(edge)?.type_id))
    }

    fn vertex_exiting_edges(
        &self,
        vertex: VertexId,
    ) -> Result<impl Iterator<Item = (EdgeId, VertexId)>, NetworkError> {
        self.get_vertex_coordinate(vertex)?;

        let mut edges: Vec<_> = self
            .network
            .out_neighbors_with_values(vertex.index())
            .map(|item| (item.value, VertexId(item.target as i64)))
            .collect();

        edges.sort();
        Ok(edges.into_iter())
    }

    fn vertex_entering_edges(
        &self,
        vertex: VertexId,
    ) -> Result<impl Iterator<Item = (EdgeId, VertexId)>, NetworkError> {
        self.get_vertex_coordinate(vertex)?;

        let mut edges: Vec<_> = self
            .network
            .in_neighbors_with_values(vertex.index())
            .map(|item| (item.value, VertexId(item.target as i64)))
            .collect();

        edges.sort();
        Ok(edges.into_iter())
    }

    fn nearest_vertices_within_distance(
        &self,
        coordinate: Coordinate,
        max_distance: Length,
    ) -> Result<impl Iterator<Item = (VertexId, Length)>, NetworkError> {
        let max_distance_2 = max_distance.meters() * max_distance.meters();
        let point = geo::Point::new(coordinate.lon, coordinate.lat);

        Ok(self
            .geospatial_nodes
            .nearest_neighbor_iter_with_distance_2(&point)
            .take_while(move |(_, distance_2)| *distance_2 <= max_distance_2)
            .map(|(node, distance_2)| {
                let length = Length::from_meters(distance_2.sqrt());
                (node.vertex, length)
            }))
    }

    fn nearest_edges_within_distance(
        &self,
        coordinate: Coordinate,
        max_distance: Length,
    ) -> Result<impl Iterator<Item = (EdgeId, Length)>, NetworkError> {
        let max_distance_2 = max_distance.meters() * max_distance.meters();
        let point = geo::Point::new(coordinate.lon, coordinate.lat);

        Ok(self
            .geospatial_edges
            .nearest_neighbor_iter_with_distance_2(&point)
            .take_while(move |(_, distance_2)| *distance_2 <= max_distance_2)
            .map(|(edge, distance_2)| {
                let length = Length::from_meters(distance_2.sqrt());
                (edge.edge, length)
            }))
    }

    fn get_distance_along_edge(
        &self,
        edge: EdgeId,
        coordinate: Coordinate,
    ) -> Result<Length, NetworkError> {
        let mut closest_distance = f64::INFINITY;
        let mut distance_from_start = 0.0;
        let mut distance_acc = 0.0;

        let point = geo::Point::new(coordinate.lon, coordinate.lat);

        for line in self.edge_line_string(edge)?.lines() {
            match line.haversine_closest_point(&point) {
                geo::Closest::SinglePoint(p) | geo::Closest::Intersection(p) => {
                    let distance_to_line = geo::Haversine.distance(point, p);

                    if distance_to_line < closest_distance {
                        // this is the closest line segment of the whole geometry (so far)
                        closest_distance = distance_to_line;
                        let distance = geo::Haversine.distance(line.start_point(), p);
                        distance_from_start = distance_acc + distance;
                    }

                    use geo::Length;
                    distance_acc += geo::Haversine.length(&line);
                }
                geo::Closest::Indeterminate => return Err(NetworkError::InvalidGeometry(edge)),
            }
        }

        let length = self.get_edge_length(edge)?;
        Ok(Length::from_meters(distance_from_start).min(length))
    }

    fn get_coordinate_along_edge(
        &self,
        edge: EdgeId,
        distance: Length,
    ) -> Result<Coordinate, NetworkError> {
        let ratio = self.ratio_from_start(edge, distance)?;

        let point = self
            .edge_line_string(edge)?
            .point_at_ratio_from_start(&geo::Haversine, ratio)
            .ok_or(NetworkError::InvalidGeometry(edge))?;

        Ok(Coordinate {
            lon: point.x(),
            lat: point.y(),
        })
    }

    fn get_edge_bearing(
        &self,
        edge: EdgeId,
        distance_from_start: Length,
        segment_length: Length,
    ) -> Result<Bearing, NetworkError> {
        let ratio_p1 = self.ratio_from_start(edge, distance_from_start)?;
        let ratio_p2 = self.ratio_from_start(edge, distance_from_start + segment_length)?;

        let geometry = self.edge_line_string(edge)?;
        let p1 = geometry
            .point_at_ratio_from_start(&geo::Haversine, ratio_p1)
            .ok_or(NetworkError::InvalidGeometry(edge))?;
        let p2 = geometry
            .point_at_ratio_from_start(&geo::Haversine, ratio_p2)
            .ok_or(NetworkError::InvalidGeometry(edge))?;

        let degrees = {
            use geo::Bearing;
            geo::Haversine.bearing(p1, p2).rem_euclid(360.0).round() as u16 % 360
        };

        Ok(Bearing::from_degrees(degrees))
    }

    fn is_turn_restricted(&self, _start: EdgeId, _end: EdgeId) -> Result<bool, NetworkError> {
        Ok(false)
    }
}

impl NetworkGraph {
    fn edge_properties(&self, edge: EdgeId) -> Result<&EdgeProperties, NetworkError> {
        if !self.directed_edges.contains(&edge) {
            return Err(NetworkError::UnknownEdge(edge));
        }

        self.edge_properties
            .get(&edge.undirected())
            .ok_or(NetworkError::UnknownEdge(edge))
    }

    /// Distance from the start of the edge as a ratio of its length, clamped in [0, 1].
    fn ratio_from_start(&self, edge: EdgeId, distance: Length) -> Result<f64, NetworkError> {
        let length = self.get_edge_length(edge)?;
        if length.is_zero() {
            return Ok(0.0);
        }

        Ok((distance.meters() / length.meters()).clamp(0.0, 1.0))
    }

    fn edge_line_string(&self, edge: EdgeId) -> Result<geo::LineString, NetworkError> {
        let EdgeProperties { geometry, .. } = self.edge_properties(edge)?;

        if edge.is_reversed() {
            Ok(geo::LineString::from_iter(geometry.coords().rev().copied()))
        } else {
            Ok(geometry.clone())
        }
    }

    fn from_geojson_graph(graph: &GeojsonGraph) -> NetworkGraph {
        let mut edge_types: Vec<Tags> = vec![];

        let edge_properties = graph
            .lines
            .iter()
            .map(|(&line_id, line)| {
                let type_id = match edge_types.iter().position(|tags| *tags == line.tags) {
                    Some(type_id) => type_id,
                    None => {
                        edge_types.push(line.tags.clone());
                        edge_types.len() - 1
                    }
                };

                let property = EdgeProperties {
                    length: line.length,
                    type_id,
                    geometry: line.geometry.clone(),
                    vertices: [VertexId(line.start_id), VertexId(line.end_id)],
                };

                (EdgeId(line_id), property)
            })
            .collect();

        let network_edges: Vec<(usize, usize, EdgeId)> = graph
            .nodes
            .iter()
            .flat_map(|(&from_id, node)| {
                let from_id: usize = from_id.try_into().unwrap();
                node.outgoing_lines.iter().map(move |&(line_id, to_id)| {
                    let to_id: usize = to_id.try_into().unwrap();
                    (from_id, to_id, EdgeId(line_id))
                })
            })
            .collect();

        let vertices = graph
            .nodes
            .iter()
            .map(|(&id, node)| (VertexId(id), node.location))
            .collect();

        let geospatial_nodes: Vec<GeospatialNode> = graph
            .nodes
            .iter()
            .map(|(&from_id, node)| GeospatialNode {
                vertex: VertexId(from_id),
                location: node.location,
            })
            .collect();

        let directed_edges: HashSet<EdgeId> = graph
            .nodes
            .iter()
            .flat_map(|(_, node)| {
                node.outgoing_lines
                    .iter()
                    .map(|&(line_id, _)| EdgeId(line_id))
            })
            .collect();

        let geospatial_edges: Vec<GeospatialEdge> = directed_edges
            .iter()
            .map(|&edge_id| {
                let line = graph.lines.get(&edge_id.undirected().0).unwrap();
                GeospatialEdge {
                    edge: edge_id,
                    geometry: line.geometry.clone(),
                }
            })
            .collect();

        NetworkGraph {
            network: graph::prelude::GraphBuilder::new()
                .edges_with_values(network_edges)
                .build(),
            vertices,
            directed_edges,
            geospatial_nodes: rstar::RTree::bulk_load(geospatial_nodes),
            geospatial_edges: rstar::RTree::bulk_load(geospatial_edges),
            edge_properties,
            edge_types,
        }
    }
}

#[test]
fn network_graph_edge_vertices() {
    let graph = &NETWORK_GRAPH;

    assert_eq!(graph.get_edge_start_vertex(EdgeId(10)), Ok(VertexId(1)));
    assert_eq!(graph.get_edge_end_vertex(EdgeId(10)), Ok(VertexId(2)));
    assert_eq!(graph.get_edge_start_vertex(EdgeId(-10)), Ok(VertexId(2)));
    assert_eq!(graph.get_edge_end_vertex(EdgeId(-10)), Ok(VertexId(1)));

    // one way
    assert_eq!(graph.get_edge_start_vertex(EdgeId(13)), Ok(VertexId(2)));
    assert_eq!(
        graph.get_edge_start_vertex(EdgeId(-13)),
        Err(NetworkError::UnknownEdge(EdgeId(-13)))
    );
    assert_eq!(
        graph.get_edge_length(EdgeId(99)),
        Err(NetworkError::UnknownEdge(EdgeId(99)))
    );
}

#[test]
fn network_graph_vertex_edges() {
    let graph = &NETWORK_GRAPH;

    let exiting: Vec<_> = graph.vertex_exiting_edges(VertexId(2)).unwrap().collect();
    assert_eq!(
        exiting,
        [
            (EdgeId(-10), VertexId(1)),
            (EdgeId(11), VertexId(3)),
            (EdgeId(13), VertexId(5))
        ]
    );

    let entering: Vec<_> = graph.vertex_entering_edges(VertexId(3)).unwrap().collect();
    assert_eq!(
        entering,
        [
            (EdgeId(-12), VertexId(4)),
            (EdgeId(11), VertexId(2)),
            (EdgeId(14), VertexId(5))
        ]
    );

    assert_eq!(graph.vertex_degree(VertexId(5)), Ok(2));
    assert!(graph.vertex_exiting_edges(VertexId(42)).is_err());
}

#[test]
fn network_graph_edge_bearing() {
    let graph = &NETWORK_GRAPH;

    let bearing = |edge, distance: f64, segment: f64| {
        graph
            .get_edge_bearing(
                EdgeId(edge),
                Length::from_meters(distance),
                Length::from_meters(segment),
            )
            .unwrap()
    };

    assert_eq!(bearing(10, 0.0, 20.0), Bearing::from_degrees(90));
    assert_eq!(bearing(-10, 0.0, 20.0), Bearing::from_degrees(270));
    assert_eq!(bearing(13, 0.0, 20.0), Bearing::from_degrees(37));
    assert_eq!(bearing(14, 0.0, 20.0), Bearing::from_degrees(143));

    // backwards from the end of the edge
    let length = graph.get_edge_length(EdgeId(14)).unwrap().meters();
    assert_eq!(bearing(14, length, -20.0), Bearing::from_degrees(323));
}

#[test]
fn network_graph_distance_along_edge() {
    let graph = &NETWORK_GRAPH;

    let coordinate = Coordinate {
        lon: 13.4545,
        lat: 52.5101,
    };

    let distance = graph.get_distance_along_edge(EdgeId(11), coordinate).unwrap();
    approx::assert_abs_diff_eq!(distance.meters(), 101.5, epsilon = 0.1);

    let distance = graph.get_distance_along_edge(EdgeId(-11), coordinate).unwrap();
    approx::assert_abs_diff_eq!(distance.meters(), 101.5, epsilon = 0.1);

    // beyond the end of the edge
    let coordinate = Coordinate {
        lon: 13.4600,
        lat: 52.5100,
    };
    let distance = graph.get_distance_along_edge(EdgeId(11), coordinate).unwrap();
    let length = graph.get_edge_length(EdgeId(11)).unwrap();
    assert!(distance <= length);
    approx::assert_abs_diff_eq!(distance.meters(), length.meters(), epsilon = 1e-6);
}

#[test]
fn network_graph_coordinate_along_edge() {
    let graph = &NETWORK_GRAPH;

    let coordinate = graph
        .get_coordinate_along_edge(EdgeId(-11), Length::ZERO)
        .unwrap();
    assert_eq!(coordinate, graph.get_vertex_coordinate(VertexId(3)).unwrap());

    let length = graph.get_edge_length(EdgeId(11)).unwrap();
    let coordinate = graph.get_coordinate_along_edge(EdgeId(11), length * 0.5).unwrap();
    approx::assert_abs_diff_eq!(coordinate.lon, 13.4545, epsilon = 1e-6);
    approx::assert_abs_diff_eq!(coordinate.lat, 52.51, epsilon = 1e-6);
}

#[test]
fn network_graph_nearest_vertices() {
    let graph = &NETWORK_GRAPH;

    const MAX_DISTANCE: Length = Length::from_meters(250.0);

    let node_2_location = graph.get_vertex_coordinate(VertexId(2)).unwrap();

    let vertices: Vec<VertexId> = graph
        .nearest_vertices_within_distance(node_2_location, MAX_DISTANCE)
        .unwrap()
        .map(|(vertex, distance)| {
            assert!(distance <= MAX_DISTANCE);
            vertex
        })
        .collect();

    assert_eq!(vertices[0], VertexId(2));
    let mut neighbours = vertices[1..].to_vec();
    neighbours.sort();
    assert_eq!(neighbours, [VertexId(1), VertexId(3), VertexId(5)]);
}

#[test]
fn network_graph_nearest_edges() {
    let graph = &NETWORK_GRAPH;

    let coordinate = Coordinate {
        lon: 13.4545,
        lat: 52.5101,
    };

    const MAX_DISTANCE: Length = Length::from_meters(50.0);

    let edges: Vec<_> = graph
        .nearest_edges_within_distance(coordinate, MAX_DISTANCE)
        .unwrap()
        .map(|(edge, distance)| {
            assert!(distance <= MAX_DISTANCE);
            (edge, distance)
        })
        .collect();
    assert!(edges.is_sorted_by_key(|(_, d)| *d));

    // lines with both directions have the same distance, sort by edge ID to make it deterministic
    let mut edges = edges.into_iter().map(|(e, _)| e).collect::<Vec<_>>();
    edges.sort_unstable_by_key(|e| e.0);

    assert_eq!(edges, [EdgeId(-11), EdgeId(11)]);
}
