use std::io::{Cursor, Read};

use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use tracing::trace;

use crate::format::binary::encoding::EncodedAttributes;
use crate::format::binary::header::detect_location_type;
use crate::{
    Circle, ClosedLine, Coordinate, DeserializeError, Grid, GridSize, Length, Line,
    LocationReference, LocationType, Offset, Offsets, PathAttributes, Poi, Point, PointAlongLine,
    Polygon, Rectangle,
};

/// Bytes of a relative coordinate.
const RELATIVE_COORDINATE_SIZE: usize = 4;
/// Bytes of an absolute coordinate.
const ABSOLUTE_COORDINATE_SIZE: usize = 6;
/// Bytes of the attributes of a line.
const ATTRIBUTES_SIZE: usize = 2;
/// Bytes of the grid size.
const GRID_SIZE_SIZE: usize = 4;

/// Deserializes an OpenLR Location Reference encoded in Base64.
pub fn deserialize_base64_openlr(
    data: impl AsRef<[u8]>,
) -> Result<LocationReference, DeserializeError> {
    let data = BASE64_STANDARD.decode(data)?;
    deserialize_binary_openlr(&data)
}

/// Deserializes a binary representation of an OpenLR Location Reference.
pub fn deserialize_binary_openlr(data: &[u8]) -> Result<LocationReference, DeserializeError> {
    use LocationReference::*;

    let location_type = detect_location_type(data)?;
    trace!("Deserializing {location_type:?} from {} bytes", data.len());

    let mut reader = OpenLrBinaryReader::new(data);
    reader.skip_header()?;

    let location = match location_type {
        LocationType::Line => Line(reader.read_line()?),
        LocationType::GeoCoordinate => GeoCoordinate(reader.read_coordinate()?),
        LocationType::PointAlongLine => PointAlongLine(reader.read_point_along_line()?),
        LocationType::PoiWithAccessPoint => Poi(reader.read_poi()?),
        LocationType::Circle => Circle(reader.read_circle()?),
        LocationType::Rectangle => Rectangle(reader.read_rectangle()?),
        LocationType::Grid => Grid(reader.read_grid()?),
        LocationType::Polygon => Polygon(reader.read_polygon()?),
        LocationType::ClosedLine => ClosedLine(reader.read_closed_line()?),
    };

    reader.ensure_consumed(location_type)?;
    Ok(location)
}

/// Reads the fields of a location reference one after the other.
/// The header length check guarantees a valid layout, the number of LRPs (or corners) is given by
/// the bytes left to read.
#[derive(Debug)]
struct OpenLrBinaryReader<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl<'a> OpenLrBinaryReader<'a> {
    const fn new(data: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(data),
        }
    }

    const fn len(&self) -> usize {
        self.cursor.get_ref().len()
    }

    fn remaining(&self) -> usize {
        self.len().saturating_sub(self.cursor.position() as usize)
    }

    fn skip_header(&mut self) -> Result<(), DeserializeError> {
        self.read_array::<1>()?;
        Ok(())
    }

    /// Trailing bytes mean the layout announced by the attributes (e.g. offset flags)
    /// disagrees with the buffer length.
    fn ensure_consumed(&self, location_type: LocationType) -> Result<(), DeserializeError> {
        if self.remaining() != 0 {
            return Err(DeserializeError::InvalidLength {
                location_type,
                length: self.len(),
            });
        }
        Ok(())
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], DeserializeError> {
        let mut bytes = [0u8; N];
        self.cursor.read_exact(&mut bytes)?;
        Ok(bytes)
    }

    fn read_line(&mut self) -> Result<Line, DeserializeError> {
        let mut line = Line::with_capacity(2);
        let mut coordinate = self.read_coordinate()?;

        loop {
            let attributes = self.read_attributes()?;

            // nothing but the offsets can follow the attributes of the last LRP
            if self.remaining() <= 2 {
                line.points.push(Point {
                    coordinate,
                    line: attributes.line,
                    path: None,
                });
                line.offsets = self.read_offsets(&attributes)?;
                return Ok(line);
            }

            line.points.push(Point {
                coordinate,
                line: attributes.line,
                path: Some(self.read_path(&attributes)?),
            });
            coordinate = self.read_relative_coordinate(coordinate)?;
        }
    }

    fn read_closed_line(&mut self) -> Result<ClosedLine, DeserializeError> {
        let mut line = ClosedLine::with_capacity(2);
        let mut coordinate = self.read_coordinate()?;

        loop {
            let attributes = self.read_attributes()?;
            line.points.push(Point {
                coordinate,
                line: attributes.line,
                path: Some(self.read_path(&attributes)?),
            });

            // the closing line has no coordinate of its own
            if self.remaining() <= ATTRIBUTES_SIZE {
                break;
            }
            coordinate = self.read_relative_coordinate(coordinate)?;
        }

        line.last_line = self.read_attributes()?.line;
        Ok(line)
    }

    fn read_point_along_line(&mut self) -> Result<PointAlongLine, DeserializeError> {
        let coordinate = self.read_coordinate()?;
        let attributes = self.read_attributes()?;
        let orientation = attributes.orientation()?;
        let first = Point {
            coordinate,
            line: attributes.line,
            path: Some(self.read_path(&attributes)?),
        };

        let coordinate = self.read_relative_coordinate(coordinate)?;
        let attributes = self.read_attributes()?;
        let side = attributes.side()?;
        let last = Point {
            coordinate,
            line: attributes.line,
            path: None,
        };

        // a point along line only carries the positive offset
        let offset = if attributes.pos_offset_flag() {
            self.read_offset()?
        } else {
            Offset::default()
        };

        Ok(PointAlongLine {
            points: [first, last],
            offset,
            orientation,
            side,
        })
    }

    fn read_poi(&mut self) -> Result<Poi, DeserializeError> {
        let point = self.read_point_along_line()?;
        let coordinate = self.read_relative_coordinate(point.points[0].coordinate)?;
        Ok(Poi { point, coordinate })
    }

    fn read_circle(&mut self) -> Result<Circle, DeserializeError> {
        let center = self.read_coordinate()?;

        // the radius takes all the remaining bytes
        let mut radius = Vec::with_capacity(4);
        self.cursor.read_to_end(&mut radius)?;

        Ok(Circle {
            center,
            radius: Length::radius_from_be_bytes(&radius),
        })
    }

    fn read_rectangle(&mut self) -> Result<Rectangle, DeserializeError> {
        self.read_corners(0)
    }

    fn read_grid(&mut self) -> Result<Grid, DeserializeError> {
        let rect = self.read_corners(GRID_SIZE_SIZE)?;
        let size = GridSize::from_be_bytes(self.read_array()?);
        Ok(Grid { rect, size })
    }

    /// Reads the corners of a rectangle followed by the given number of bytes.
    /// The upper right corner is absolute only if there is room for it.
    fn read_corners(&mut self, trailing: usize) -> Result<Rectangle, DeserializeError> {
        let lower_left = self.read_coordinate()?;

        let upper_right = if self.remaining() >= ABSOLUTE_COORDINATE_SIZE + trailing {
            self.read_coordinate()?
        } else {
            self.read_relative_coordinate(lower_left)?
        };

        Ok(Rectangle {
            lower_left,
            upper_right,
        })
    }

    fn read_polygon(&mut self) -> Result<Polygon, DeserializeError> {
        let mut polygon = Polygon::with_capacity(1 + self.remaining() / RELATIVE_COORDINATE_SIZE);

        let mut corner = self.read_coordinate()?;
        polygon.corners.push(corner);

        while self.remaining() >= RELATIVE_COORDINATE_SIZE {
            corner = self.read_relative_coordinate(corner)?;
            polygon.corners.push(corner);
        }

        Ok(polygon)
    }

    fn read_coordinate(&mut self) -> Result<Coordinate, DeserializeError> {
        let [lon_1, lon_2, lon_3, lat_1, lat_2, lat_3] =
            self.read_array::<ABSOLUTE_COORDINATE_SIZE>()?;
        Coordinate::new(
            Coordinate::degrees_from_be_bytes([lon_1, lon_2, lon_3]),
            Coordinate::degrees_from_be_bytes([lat_1, lat_2, lat_3]),
        )
    }

    fn read_relative_coordinate(
        &mut self,
        previous: Coordinate,
    ) -> Result<Coordinate, DeserializeError> {
        let [lon_1, lon_2, lat_1, lat_2] = self.read_array::<RELATIVE_COORDINATE_SIZE>()?;
        Coordinate::new(
            Coordinate::degrees_from_be_bytes_relative([lon_1, lon_2], previous.lon),
            Coordinate::degrees_from_be_bytes_relative([lat_1, lat_2], previous.lat),
        )
    }

    fn read_attributes(&mut self) -> Result<EncodedAttributes, DeserializeError> {
        EncodedAttributes::try_from_bytes(self.read_array::<ATTRIBUTES_SIZE>()?)
    }

    /// Reads the DNP that follows the attributes of an LRP that is not the last one.
    fn read_path(
        &mut self,
        attributes: &EncodedAttributes,
    ) -> Result<PathAttributes, DeserializeError> {
        let [dnp] = self.read_array()?;
        Ok(PathAttributes {
            lfrcnp: attributes.lfrcnp()?,
            dnp: Length::dnp_from_byte(dnp),
        })
    }

    fn read_offset(&mut self) -> Result<Offset, DeserializeError> {
        let [offset] = self.read_array()?;
        Ok(Offset::from_byte(offset))
    }

    /// Reads the offsets flagged in the attributes of the last LRP.
    fn read_offsets(
        &mut self,
        attributes: &EncodedAttributes,
    ) -> Result<Offsets, DeserializeError> {
        let mut offsets = Offsets::default();
        if attributes.pos_offset_flag() {
            offsets.pos = self.read_offset()?;
        }
        if attributes.neg_offset_flag() {
            offsets.neg = self.read_offset()?;
        }
        Ok(offsets)
    }
}
