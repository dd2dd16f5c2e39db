#![doc = include_str!("../README.md")]

mod decoder;
mod error;
mod format;
mod graph;
mod interpreter;
mod location;
mod model;
mod score;

pub use decoder::{CandidateSnapPoint, Decoder, DecoderConfig, SnapPosition};
pub use error::{DecodeError, DeserializeError, LocationError, SerializeError};
pub use format::binary::{
    deserialize_base64_openlr, deserialize_binary_openlr, detect_location_type,
    serialize_base64_openlr, serialize_binary_openlr,
};
pub use graph::DirectedGraph;
pub use graph::dijkstra::shortest_path;
pub use graph::path::{Path, is_path_connected, path_length};
pub use interpreter::{
    EdgeMatcher, MatchScoreCache, NetworkInterpreter, OpenLrAttributesInterpreter,
};
pub use location::{ReferencedLine, ReferencedLocation, ReferencedPoi, ReferencedPointAlongLine};
pub use model::{
    Bearing, Circle, ClosedLine, Coordinate, Fow, Frc, Grid, GridSize, Length, Line,
    LineAttributes, LocationReference, LocationType, Offset, Offsets, Orientation, PathAttributes,
    Poi, Point, PointAlongLine, Polygon, Rectangle, SideOfRoad,
};
pub use score::Score;
