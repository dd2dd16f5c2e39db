mod encoding;
mod header;
mod reader;
mod writer;

pub use header::detect_location_type;
pub use reader::{deserialize_base64_openlr, deserialize_binary_openlr};
pub use writer::{serialize_base64_openlr, serialize_binary_openlr};
