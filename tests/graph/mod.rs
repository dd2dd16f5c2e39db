mod geojson;
mod interpreter;
mod network;

pub use geojson::{GEOJSON_GRAPH, GeojsonGraph};
pub use interpreter::{HighwayInterpreter, Tags};
pub use network::{EdgeId, NETWORK_GRAPH, NetworkError, NetworkGraph, VertexId};
