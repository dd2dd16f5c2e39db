use std::io::{Cursor, Write};

use base64::Engine;
use base64::prelude::BASE64_STANDARD;

use crate::format::binary::encoding::EncodedAttributes;
use crate::format::binary::header::Header;
use crate::{
    Circle, ClosedLine, Coordinate, Grid, Line, LocationReference, Offsets, Point, Poi,
    PointAlongLine, Polygon, Rectangle, SerializeError,
};

/// Serializes an OpenLR Location Reference into Base64.
pub fn serialize_base64_openlr(location: &LocationReference) -> Result<String, SerializeError> {
    let data = serialize_binary_openlr(location)?;
    Ok(BASE64_STANDARD.encode(data))
}

/// Serializes an OpenLR Location Reference into binary.
pub fn serialize_binary_openlr(location: &LocationReference) -> Result<Vec<u8>, SerializeError> {
    let mut writer = OpenLrBinaryWriter::new(Header::for_location(location.location_type()))?;

    match location {
        LocationReference::Line(line) => writer.write_line(line)?,
        LocationReference::GeoCoordinate(coordinate) => writer.write_position(*coordinate, None)?,
        LocationReference::PointAlongLine(point) => writer.write_point_along_line(point)?,
        LocationReference::Poi(poi) => writer.write_poi(poi)?,
        LocationReference::Circle(circle) => writer.write_circle(circle)?,
        LocationReference::Rectangle(rectangle) => writer.write_rectangle(rectangle)?,
        LocationReference::Grid(grid) => writer.write_grid(grid)?,
        LocationReference::Polygon(polygon) => writer.write_polygon(polygon)?,
        LocationReference::ClosedLine(line) => writer.write_closed_line(line)?,
    }

    Ok(writer.cursor.into_inner())
}

/// Appends the fields of a location reference one after the other.
/// Every coordinate but the first one is written relative to its predecessor.
#[derive(Debug, Default)]
struct OpenLrBinaryWriter {
    cursor: Cursor<Vec<u8>>,
}

impl OpenLrBinaryWriter {
    fn new(header: Header) -> Result<Self, SerializeError> {
        let mut writer = Self::default();
        writer.put(&[header.byte()])?;
        Ok(writer)
    }

    fn put(&mut self, bytes: &[u8]) -> Result<(), SerializeError> {
        self.cursor.write_all(bytes)?;
        Ok(())
    }

    fn write_line(&mut self, line: &Line) -> Result<(), SerializeError> {
        let Line { points, offsets } = line;
        let Some((last, points)) = points.split_last().filter(|(_, points)| !points.is_empty())
        else {
            return Err(SerializeError::InvalidLine);
        };

        let previous = self.write_connected_points(points)?;
        self.write_position(last.coordinate, Some(previous))?;

        let attributes = EncodedAttributes::from(last.line).with_offsets(offsets);
        self.write_attributes(attributes)?;
        self.write_offsets(attributes, offsets)
    }

    fn write_closed_line(&mut self, line: &ClosedLine) -> Result<(), SerializeError> {
        let ClosedLine { points, last_line } = line;
        if points.len() < 2 {
            return Err(SerializeError::InvalidLine);
        }

        self.write_connected_points(points)?;
        self.write_attributes(EncodedAttributes::from(*last_line))
    }

    /// Writes LRPs that all carry the path to the next one.
    /// Returns the coordinate of the last one, the next coordinate is relative to it.
    fn write_connected_points(&mut self, points: &[Point]) -> Result<Coordinate, SerializeError> {
        let mut previous = None;

        for (index, point) in points.iter().enumerate() {
            let path = point
                .path
                .ok_or(SerializeError::MissingPathAttributes(index))?;

            self.write_position(point.coordinate, previous)?;
            self.write_attributes(EncodedAttributes::from(point.line).with_lfrcnp(path.lfrcnp))?;
            self.put(&[path.dnp.dnp_into_byte()])?;
            previous = Some(point.coordinate);
        }

        previous.ok_or(SerializeError::InvalidLine)
    }

    fn write_point_along_line(&mut self, point: &PointAlongLine) -> Result<(), SerializeError> {
        let PointAlongLine {
            points: [first, last],
            offset,
            orientation,
            side,
        } = point;

        let path = first.path.ok_or(SerializeError::MissingPathAttributes(0))?;
        self.write_position(first.coordinate, None)?;
        self.write_attributes(
            EncodedAttributes::from(first.line)
                .with_lfrcnp(path.lfrcnp)
                .with_orientation(*orientation),
        )?;
        self.put(&[path.dnp.dnp_into_byte()])?;

        // only the positive offset is defined for a point
        let offsets = Offsets::positive(*offset);
        self.write_position(last.coordinate, Some(first.coordinate))?;
        let attributes = EncodedAttributes::from(last.line)
            .with_offsets(&offsets)
            .with_side(*side);
        self.write_attributes(attributes)?;
        self.write_offsets(attributes, &offsets)
    }

    fn write_poi(&mut self, poi: &Poi) -> Result<(), SerializeError> {
        self.write_point_along_line(&poi.point)?;
        self.write_position(poi.coordinate, Some(poi.point.points[0].coordinate))
    }

    fn write_circle(&mut self, circle: &Circle) -> Result<(), SerializeError> {
        self.write_position(circle.center, None)?;
        self.put(&circle.radius.try_into_radius_be_bytes()?)
    }

    fn write_rectangle(&mut self, rectangle: &Rectangle) -> Result<(), SerializeError> {
        let &Rectangle {
            lower_left,
            upper_right,
        } = rectangle;

        if lower_left == upper_right {
            return Err(SerializeError::InvalidRectangle);
        }

        // corners too far apart for 16 bits are both absolute
        let previous = upper_right
            .fits_relative_to(&lower_left)
            .then_some(lower_left);

        self.write_position(lower_left, None)?;
        self.write_position(upper_right, previous)
    }

    fn write_grid(&mut self, grid: &Grid) -> Result<(), SerializeError> {
        self.write_rectangle(&grid.rect)?;
        self.put(&grid.size.try_into_be_bytes()?)
    }

    fn write_polygon(&mut self, polygon: &Polygon) -> Result<(), SerializeError> {
        if polygon.corners.len() < 3 {
            return Err(SerializeError::InvalidPolygon);
        }

        let mut previous = None;
        for &corner in &polygon.corners {
            self.write_position(corner, previous)?;
            previous = Some(corner);
        }

        Ok(())
    }

    /// Writes the coordinate in 24-bit absolute degrees, or in 16-bit deca-micro degrees relative
    /// to the previous coordinate if any.
    fn write_position(
        &mut self,
        coordinate: Coordinate,
        previous: Option<Coordinate>,
    ) -> Result<(), SerializeError> {
        if !coordinate.is_valid() {
            return Err(SerializeError::InvalidCoordinate(coordinate));
        }

        match previous {
            Some(previous) => {
                self.put(&Coordinate::degrees_into_be_bytes_relative(
                    coordinate.lon,
                    previous.lon,
                ))?;
                self.put(&Coordinate::degrees_into_be_bytes_relative(
                    coordinate.lat,
                    previous.lat,
                ))
            }
            None => {
                self.put(&Coordinate::degrees_into_be_bytes(coordinate.lon))?;
                self.put(&Coordinate::degrees_into_be_bytes(coordinate.lat))
            }
        }
    }

    fn write_attributes(&mut self, attributes: EncodedAttributes) -> Result<(), SerializeError> {
        self.put(&attributes.try_into_bytes()?)
    }

    /// Writes the offsets flagged in the attributes of the last LRP.
    fn write_offsets(
        &mut self,
        attributes: EncodedAttributes,
        offsets: &Offsets,
    ) -> Result<(), SerializeError> {
        if attributes.pos_offset_flag() {
            self.put(&[offsets.pos.try_into_byte()?])?;
        }
        if attributes.neg_offset_flag() {
            self.put(&[offsets.neg.try_into_byte()?])?;
        }
        Ok(())
    }
}
