use std::collections::HashMap;
use std::sync::LazyLock;

use geo::CoordsIter;
use geojson::{Feature, FeatureCollection, Value};
use openlr_referencing::{Coordinate, Length};

use crate::graph::Tags;

pub static GEOJSON_GRAPH: LazyLock<GeojsonGraph> = LazyLock::new(|| {
    let geojson = include_str!("../data/graph.geojson");
    GeojsonGraph::parse_geojson(geojson)
});

type NodeId = i64;

/// Identify a directed line (negative value represent a reversed edge).
type LineId = i64;

#[derive(Debug, Default)]
pub struct GeojsonGraph {
    pub nodes: HashMap<NodeId, Node>,
    pub lines: HashMap<LineId, Line>,
}

#[derive(Debug)]
pub struct Node {
    pub id: NodeId,
    pub location: Coordinate,
    pub outgoing_lines: Vec<(LineId, NodeId)>,
}

#[derive(Debug)]
pub struct Line {
    pub id: LineId,
    pub start_id: NodeId,
    pub end_id: NodeId,
    pub length: Length,
    pub tags: Tags,
    pub geometry: geo::LineString,
}

impl GeojsonGraph {
    fn parse_geojson(geojson: &str) -> Self {
        let FeatureCollection { features, .. } = geojson.parse().unwrap();

        let mut graph = GeojsonGraph::default();

        for Feature {
            geometry,
            properties,
            ..
        } in &features
        {
            let geometry = geometry.as_ref().unwrap();
            let properties = properties.as_ref().unwrap();

            if let Value::Point(point) = &geometry.value {
                let id = properties.get("id").unwrap().as_i64().unwrap();

                let location = Coordinate {
                    lon: point[0],
                    lat: point[1],
                };

                graph.nodes.insert(
                    id,
                    Node {
                        id,
                        location,
                        outgoing_lines: vec![],
                    },
                );
            }
        }

        for Feature {
            geometry,
            properties,
            ..
        } in features
        {
            let geometry = geometry.as_ref().unwrap();
            let properties = properties.as_ref().unwrap();

            if let Value::LineString(lines) = &geometry.value {
                let id = properties.get("id").unwrap().as_i64().unwrap();
                let mut start_id = properties.get("startId").unwrap().as_i64().unwrap();
                let mut end_id = properties.get("endId").unwrap().as_i64().unwrap();
                let direction = properties.get("direction").unwrap().as_i64().unwrap();

                let tags = Tags {
                    highway: properties.get("highway").unwrap().as_str().unwrap().to_owned(),
                    junction: properties
                        .get("junction")
                        .and_then(|junction| junction.as_str())
                        .map(str::to_owned),
                };

                let geometry = lines
                    .iter()
                    .map(|line| geo::coord! { x: line[0], y: line[1] });

                let geometry = if direction == 3 {
                    // backward direction
                    std::mem::swap(&mut start_id, &mut end_id);
                    geo::LineString::from_iter(geometry.rev())
                } else {
                    geo::LineString::from_iter(geometry)
                };

                let length = {
                    use geo::Length;
                    geo::Haversine.length(&geometry)
                };

                let node = graph.nodes.get_mut(&start_id).unwrap();
                node.outgoing_lines.push((id, end_id));

                if direction == 1 && start_id != end_id {
                    // both directions
                    let node = graph.nodes.get_mut(&end_id).unwrap();
                    node.outgoing_lines.push((-id, start_id));
                }

                graph.lines.insert(
                    id,
                    Line {
                        id,
                        start_id,
                        end_id,
                        length: Length::from_meters(length),
                        tags,
                        geometry,
                    },
                );
            }
        }

        graph
    }
}

#[test]
fn geojson_graph_line_attributes() {
    let graph = &GEOJSON_GRAPH;
    assert_eq!(graph.lines.len(), 6);

    let line = graph.lines.get(&10).unwrap();
    assert_eq!(line.id, 10);
    assert_eq!(line.start_id, 1);
    assert_eq!(line.end_id, 2);
    assert_eq!(line.tags.highway, "secondary");
    assert_eq!(line.tags.junction, None);
    assert_eq!(line.geometry.coords_count(), 3);
    approx::assert_abs_diff_eq!(line.length.meters(), 203.0, epsilon = 0.1);

    let line = graph.lines.get(&13).unwrap();
    assert_eq!(line.id, 13);
    assert_eq!(line.start_id, 2);
    assert_eq!(line.end_id, 5);
    assert_eq!(line.tags.highway, "residential");
    assert_eq!(line.geometry.coords_count(), 2);
    approx::assert_abs_diff_eq!(line.length.meters(), 167.7, epsilon = 0.1);
}

#[test]
fn geojson_graph_node_attributes() {
    let graph = &GEOJSON_GRAPH;
    assert_eq!(graph.nodes.len(), 7);

    let node = graph.nodes.get(&1).unwrap();
    assert_eq!(node.id, 1);
    assert_eq!(node.location.lon, 13.45);
    assert_eq!(node.location.lat, 52.51);
    assert_eq!(node.outgoing_lines, vec![(10, 2)]);

    let node = graph.nodes.get(&2).unwrap();
    assert_eq!(node.outgoing_lines, vec![(-10, 1), (11, 3), (13, 5)]);

    // one way lines
    let node = graph.nodes.get(&5).unwrap();
    assert_eq!(node.outgoing_lines, vec![(14, 3)]);

    let node = graph.nodes.get(&3).unwrap();
    assert_eq!(node.outgoing_lines, vec![(-11, 2), (12, 4)]);
}
