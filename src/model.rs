use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

use approx::abs_diff_eq;
use ordered_float::OrderedFloat;
use strum::{EnumIter, FromRepr};

use crate::DeserializeError;

/// Functional Road Class.
/// The functional road class (FRC) of a line is a road classification
/// based on the importance of the road represented by the line.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, FromRepr, EnumIter,
)]
#[repr(u8)]
pub enum Frc {
    /// Main road, highest importance
    Frc0 = 0,
    /// First class road.
    Frc1 = 1,
    /// Second class road.
    Frc2 = 2,
    /// Third class road.
    Frc3 = 3,
    /// Fourth class road.
    Frc4 = 4,
    /// Fifth class road.
    Frc5 = 5,
    /// Sixth class road.
    Frc6 = 6,
    /// Other class road, lowest importance
    #[default]
    Frc7 = 7,
}

impl Frc {
    pub const fn value(&self) -> u8 {
        *self as u8
    }

    /// Returns the class that is `variance` steps less important than this one,
    /// saturating at [`Frc::Frc7`].
    pub fn relaxed(&self, variance: u8) -> Self {
        Self::from_repr(self.value().saturating_add(variance).min(7)).unwrap_or(Self::Frc7)
    }
}

/// Form of Way.
/// The form of way (FOW) describes the physical road type of a line.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, FromRepr, EnumIter,
)]
#[repr(u8)]
pub enum Fow {
    /// The physical road type is unknown.
    Undefined = 0,
    /// A Motorway is defined as a road permitted for motorized vehicles
    /// only in combination with a prescribed minimum speed. It has two
    /// or more physically separated carriageways and no single level-crossings.
    Motorway = 1,
    /// A multiple carriageway is defined as a road with physically separated
    /// carriageways regardless of the number of lanes. If a road is also a
    /// motorway, it should be coded as such and not as a multiple carriageway.
    MultipleCarriageway = 2,
    /// All roads without separate carriageways are considered as roads with
    /// a single carriageway.
    SingleCarriageway = 3,
    /// A Roundabout is a road which forms a ring on which traffic traveling
    /// in only one direction is allowed.
    Roundabout = 4,
    /// A Traffic Square is an open area (partly) enclosed by roads which is
    /// used for non-traffic purposes and which is not a Roundabout.
    TrafficSquare = 5,
    /// A Slip Road is a road especially designed to enter or leave a line.
    SlipRoad = 6,
    /// The physical road type is known but does not fit into one of the
    /// other categories.
    #[default]
    Other = 7,
}

impl Fow {
    pub const fn value(&self) -> u8 {
        *self as u8
    }
}

/// The side of road information (SOR) describes the relationship between the
/// point of interest and a referenced line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, FromRepr)]
#[repr(u8)]
pub enum SideOfRoad {
    /// Point is directly on (or above) the road, or determination of right/left
    /// side is not applicable.
    #[default]
    OnRoadOrUnknown = 0,
    /// Point is on right side of the road.
    Right = 1,
    /// Point is on left side of the road.
    Left = 2,
    /// Point is on both sides of the road.
    Both = 3,
}

/// The orientation information (ORI) describes the relationship between the
/// point of interest and the direction of a referenced line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, FromRepr)]
#[repr(u8)]
pub enum Orientation {
    /// Point has no sense of orientation, or determination of orientation
    /// is not applicable
    #[default]
    Unknown = 0,
    /// Point has orientation from first LRP towards second LRP.
    Forward = 1,
    /// Point has orientation from second LRP towards first LRP.
    Backward = 2,
    /// Point has orientation in both directions
    Both = 3,
}

/// Length in meters.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Length(OrderedFloat<f64>);

impl fmt::Debug for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}m", self.meters())
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}m", self.meters())
    }
}

impl Length {
    pub const ZERO: Self = Self::from_meters(0.0);
    pub const MAX: Self = Self::from_meters(f64::MAX);
    /// Maximum distance between two consecutive LRPs that the binary format can represent.
    pub const MAX_BINARY_LRP_DISTANCE: Self = Self::from_meters(15000.0);

    pub const fn from_meters(meters: f64) -> Self {
        Self(OrderedFloat(meters))
    }

    pub const fn meters(&self) -> f64 {
        self.0.0
    }

    pub const fn is_zero(&self) -> bool {
        self.meters() == 0.0
    }

    pub fn round(self) -> Self {
        Self::from_meters(self.meters().round())
    }

    pub fn ceil(self) -> Self {
        Self::from_meters(self.meters().ceil())
    }

    pub fn reverse(self) -> Self {
        Self::from_meters(-self.meters())
    }

    /// Absolute difference between two lengths.
    pub fn abs_diff(self, other: Self) -> Self {
        Self::from_meters((self.meters() - other.meters()).abs())
    }
}

impl Add for Length {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self::from_meters(self.meters() + rhs.meters())
    }
}

impl AddAssign for Length {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Length {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self::from_meters(self.meters() - rhs.meters())
    }
}

impl SubAssign for Length {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Mul<f64> for Length {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self::Output {
        Self::from_meters(self.meters() * rhs)
    }
}

impl Sum for Length {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, length| acc + length)
    }
}

/// The bearing describes the angle between the true North and the road.
/// The physical data format defines the bearing field as an integer value between 0
/// and 360 whereby “0” is included and “360” is excluded from that range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Bearing(u16);

impl Bearing {
    pub const fn from_degrees(degrees: u16) -> Self {
        Self(degrees)
    }

    pub const fn degrees(&self) -> u16 {
        self.0
    }

    /// Smallest angle between the two bearings, in [0, 180].
    pub const fn difference(&self, other: &Self) -> Self {
        let difference = (self.0 % 360).abs_diff(other.0 % 360);
        if difference > 180 {
            Self(360 - difference)
        } else {
            Self(difference)
        }
    }

    /// Cosine similarity of the two bearings mapped into [0, 1]:
    /// 1 for the same direction, 0 for opposite directions.
    pub fn similarity(&self, other: &Self) -> f64 {
        let radians = (self.difference(other).degrees() as f64).to_radians();
        (1.0 + radians.cos()) / 2.0
    }
}

/// Coordinate pair stands for a pair of WGS84 longitude (lon) and latitude (lat) values.
/// This coordinate pair specifies a geometric point in a digital map.
/// The lon and lat values are stored in decamicrodegree resolution (five decimals).
#[derive(Debug, Clone, Copy, Default)]
pub struct Coordinate {
    pub lon: f64,
    pub lat: f64,
}

impl PartialEq for Coordinate {
    fn eq(&self, other: &Self) -> bool {
        abs_diff_eq!(self.lon, other.lon, epsilon = Self::EPSILON)
            && abs_diff_eq!(self.lat, other.lat, epsilon = Self::EPSILON)
    }
}

impl Coordinate {
    pub(crate) const EPSILON: f64 = 1e-5;

    /// Returns a coordinate only if longitude is within [-180, 180] and latitude within [-90, 90].
    pub fn new(lon: f64, lat: f64) -> Result<Self, DeserializeError> {
        let coordinate = Self { lon, lat };
        if coordinate.is_valid() {
            Ok(coordinate)
        } else {
            Err(DeserializeError::InvalidCoordinate(coordinate))
        }
    }

    pub fn is_valid(&self) -> bool {
        (-180.0..=180.0).contains(&self.lon) && (-90.0..=90.0).contains(&self.lat)
    }
}

/// Line attributes are part of a location reference point and consist of functional road
/// class (FRC), form of way (FOW) and bearing (BEAR) data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LineAttributes {
    pub frc: Frc,
    pub fow: Fow,
    pub bearing: Bearing,
}

/// The path attributes are part of a location reference point (except for the last
/// location reference point) and consists of lowest functional road class to next point
/// (LFRCNP) and distance to next point (DNP) data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PathAttributes {
    /// Lowest functional road class to next point.
    pub lfrcnp: Frc,
    /// Distance to next point.
    pub dnp: Length,
}

/// The basis of a location reference is a sequence of location reference points (LRPs).
/// A single LRP may be bound to the road network. In such a case all values of the LRP
/// refer to a node or line within the road network. The coordinates refer to a node of
/// a line or a point on a line and the additional attributes refer to attributes of a line.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub coordinate: Coordinate,
    pub line: LineAttributes,
    /// Missing only for the last LRP of a location.
    pub path: Option<PathAttributes>,
}

impl Point {
    pub const fn is_last(&self) -> bool {
        self.path.is_none()
    }

    /// Distance to the next point, zero for the last LRP.
    pub fn dnp(&self) -> Length {
        self.path.map(|path| path.dnp).unwrap_or_default()
    }

    /// Lowest FRC to the next point, the LRP own FRC for the last LRP.
    pub fn lfrcnp(&self) -> Frc {
        self.path.map(|path| path.lfrcnp).unwrap_or(self.line.frc)
    }
}

/// Offsets are used to locate the start and end of a location more precisely than
/// bounding to the nodes in a network. The logical format defines two offsets,
/// one at the start of the location and one at the end of the location.
/// The value is the fraction, in [0, 1), of the referenced path the offset trims.
// The offset values are optional and a missing offset value means an offset of 0 meters.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Offset(f32);

impl Offset {
    pub const fn from_range(range: f32) -> Self {
        Self(range)
    }

    pub const fn range(&self) -> f32 {
        self.0
    }

    pub const fn is_zero(&self) -> bool {
        self.0 == 0.0
    }

    /// Returns the length this offset cuts from a path of the given length.
    pub fn of(&self, length: Length) -> Length {
        length * self.0 as f64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Offsets {
    pub pos: Offset,
    pub neg: Offset,
}

impl Offsets {
    pub const fn positive(pos: Offset) -> Self {
        Self {
            pos,
            neg: Offset::from_range(0.0),
        }
    }
}

/// A line location reference describes a path within a map and consists of location
/// reference point(s), a last location reference point and offset data.
/// There must be at least one location reference point and exactly one last location
/// reference point. The offset field is optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Line {
    pub points: Vec<Point>,
    pub offsets: Offsets,
}

impl Line {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
            offsets: Offsets::default(),
        }
    }
}

/// A closed line location references the area defined by a closed path (i.e. a circuit)
/// in the road network. The boundary always consists of road segments.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClosedLine {
    pub points: Vec<Point>,
    pub last_line: LineAttributes,
}

impl ClosedLine {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
            last_line: LineAttributes::default(),
        }
    }

    /// The line location that starts at the first LRP, follows all the LRPs and comes back
    /// to the first LRP coordinate.
    pub fn to_line(&self) -> Line {
        let mut points = self.points.clone();

        if let Some(first) = self.points.first() {
            points.push(Point {
                coordinate: first.coordinate,
                line: self.last_line,
                path: None,
            });
        }

        Line {
            points,
            offsets: Offsets::default(),
        }
    }
}

/// Point along line is a point location which is defined by a line and an offset value.
/// The line will be referenced by two location reference points and the concrete position
/// on that line is referenced using the positive offset. Additionally information about
/// the side of the road where the point is located and the orientation with respect
/// to the direction of the line can be added.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PointAlongLine {
    pub points: [Point; 2],
    pub offset: Offset,
    pub orientation: Orientation,
    pub side: SideOfRoad,
}

/// Point along line with access is a point location which is defined by a line,
/// an offset value and a coordinate. The line will be referenced by two location reference
/// points and the concrete position of the access point on that line is referenced using
/// the positive offset. The point of interest is identified by the coordinate pair.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Poi {
    pub point: PointAlongLine,
    pub coordinate: Coordinate,
}

/// A circle location is given by the position of the center and the radius.
/// The radius is integer-valued and given in meters.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Circle {
    pub center: Coordinate,
    pub radius: Length,
}

/// A rectangle location reference consists of the lower left corner point as a pair
/// of WGS84 coordinates in absolute format and the upper right corner point, given in
/// absolute format (large rectangle) or relative format (standard rectangle).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Rectangle {
    pub lower_left: Coordinate,
    pub upper_right: Coordinate,
}

/// A grid location is a special instance of a rectangle location. It is given
/// by a base rectangular shape. This base rectangle is the lower left cell of
/// the grid and can be multiplied to the North (by defining the number of rows)
/// and to the East (by defining the number of columns).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Grid {
    pub rect: Rectangle,
    pub size: GridSize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GridSize {
    pub columns: u16,
    pub rows: u16,
}

/// A polygon location is a non-intersecting shape defined by a sequence of
/// geo-coordinate pairs. The boundary of this polygon is constituted by straight
/// lines between every pair of consecutive corners in the sequence, plus the
/// straight line between the last and the first corner.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Polygon {
    pub corners: Vec<Coordinate>,
}

impl Polygon {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            corners: Vec::with_capacity(capacity),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIter)]
#[repr(u8)]
pub enum LocationType {
    Line = 0,
    GeoCoordinate = 1,
    PointAlongLine = 2,
    PoiWithAccessPoint = 3,
    Circle = 4,
    Rectangle = 5,
    Grid = 6,
    Polygon = 7,
    ClosedLine = 8,
}

/// Locations are objects in a digital map, like points, paths and areas.
/// OpenLR standard can handle line locations (e.g. paths), point locations (e.g. POIs)
/// and area locations (e.g. regions) in a digital map.
///
/// The main idea for locations which are bound to the road network is covering the location
/// with a concatenation of (several) shortest-paths. Each shortest-path is specified by
/// information about its start line and its end line, combined in the location reference
/// points (LRPs). The concatenation of all these shortest-paths covers the location
/// completely and this path is called the location reference path. The location reference
/// path may be longer than the original location and offsets trim this path down to the
/// size of the location path.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationReference {
    // Line Locations
    Line(Line),
    // Point Locations
    GeoCoordinate(Coordinate),
    PointAlongLine(PointAlongLine),
    Poi(Poi),
    // Area Locations
    Circle(Circle),
    Rectangle(Rectangle),
    Grid(Grid),
    Polygon(Polygon),
    ClosedLine(ClosedLine),
}

impl LocationReference {
    pub const fn location_type(&self) -> LocationType {
        match self {
            Self::Line(_) => LocationType::Line,
            Self::GeoCoordinate(_) => LocationType::GeoCoordinate,
            Self::PointAlongLine(_) => LocationType::PointAlongLine,
            Self::Poi(_) => LocationType::PoiWithAccessPoint,
            Self::Circle(_) => LocationType::Circle,
            Self::Rectangle(_) => LocationType::Rectangle,
            Self::Grid(_) => LocationType::Grid,
            Self::Polygon(_) => LocationType::Polygon,
            Self::ClosedLine(_) => LocationType::ClosedLine,
        }
    }
}
