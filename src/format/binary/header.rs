use strum::IntoEnumIterator;

use crate::{DeserializeError, LocationType};

/// The first byte of every binary location reference.
///
/// ```text
/// | 7   | 6    | 5  | 4    | 3  | 2 1 0   |
/// | RFU | ArF1 | PF | ArF0 | AF | version |
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Header(u8);

impl Header {
    pub(crate) const VERSION: u8 = 3;

    const RFU: u8 = 0b1000_0000;
    const AREA_FLAG_1: u8 = 0b0100_0000;
    const POINT_FLAG: u8 = 0b0010_0000;
    const AREA_FLAG_0: u8 = 0b0001_0000;
    const ATTRIBUTES_FLAG: u8 = 0b0000_1000;
    const FLAGS: u8 = Self::AREA_FLAG_1 | Self::POINT_FLAG | Self::AREA_FLAG_0 | Self::ATTRIBUTES_FLAG;

    pub(crate) const fn from_byte(byte: u8) -> Self {
        Self(byte)
    }

    pub(crate) const fn byte(&self) -> u8 {
        self.0
    }

    pub(crate) const fn for_location(location_type: LocationType) -> Self {
        Self(Self::VERSION | location_type.header_flags())
    }

    pub(crate) const fn version(&self) -> u8 {
        self.0 & 0b111
    }

    pub(crate) const fn is_point(&self) -> bool {
        self.0 & Self::POINT_FLAG != 0
    }

    pub(crate) const fn has_attributes(&self) -> bool {
        self.0 & Self::ATTRIBUTES_FLAG != 0
    }

    const fn flags(&self) -> u8 {
        self.0 & (Self::FLAGS | Self::RFU)
    }
}

impl LocationType {
    const fn header_flags(&self) -> u8 {
        match self {
            Self::Line => Header::ATTRIBUTES_FLAG,
            Self::GeoCoordinate => Header::POINT_FLAG,
            Self::PointAlongLine | Self::PoiWithAccessPoint => {
                Header::POINT_FLAG | Header::ATTRIBUTES_FLAG
            }
            Self::Circle => 0,
            Self::Rectangle | Self::Grid => Header::AREA_FLAG_1,
            Self::Polygon => Header::AREA_FLAG_0,
            Self::ClosedLine => Header::AREA_FLAG_1 | Header::AREA_FLAG_0 | Header::ATTRIBUTES_FLAG,
        }
    }

    /// Returns true if the byte length is a valid layout for this location type.
    const fn accepts_length(&self, length: usize) -> bool {
        match self {
            Self::Line => length >= 16 && (length - 16) % 7 <= 2,
            Self::GeoCoordinate => length == 7,
            Self::PointAlongLine => length == 16 || length == 17,
            Self::PoiWithAccessPoint => length == 20 || length == 21,
            Self::Circle => length >= 8 && length <= 11,
            Self::Rectangle => length == 11 || length == 13,
            Self::Grid => length == 15 || length == 17,
            Self::Polygon => length >= 15 && (length - 7) % 4 == 0,
            Self::ClosedLine => length >= 19 && (length - 12) % 7 == 0,
        }
    }

    const fn accepts_header(&self, header: Header) -> bool {
        header.version() == Header::VERSION && header.flags() == self.header_flags()
    }

    /// Returns true if the binary location reference can be decoded as this location type,
    /// judging only by its header signature and byte length.
    pub fn can_decode(&self, data: &[u8]) -> bool {
        match data.first() {
            Some(&header) => {
                self.accepts_header(Header::from_byte(header)) && self.accepts_length(data.len())
            }
            None => false,
        }
    }
}

/// Detects the location type of a binary location reference.
/// Location types are tried in a fixed priority order and the first one
/// whose header signature and byte length both match wins.
pub fn detect_location_type(data: &[u8]) -> Result<LocationType, DeserializeError> {
    let header = match data.first() {
        Some(&header) => Header::from_byte(header),
        None => return Err(std::io::Error::from(std::io::ErrorKind::UnexpectedEof).into()),
    };

    let version = header.version();
    if version != Header::VERSION {
        return Err(DeserializeError::VersionNotSupported(version));
    }

    let mut matching_headers = LocationType::iter()
        .filter(|location_type| location_type.accepts_header(header))
        .peekable();

    let first_matching = matching_headers.peek().copied();

    if let Some(location_type) =
        matching_headers.find(|location_type| location_type.accepts_length(data.len()))
    {
        return Ok(location_type);
    }

    match first_matching {
        Some(location_type) => Err(DeserializeError::InvalidLength {
            location_type,
            length: data.len(),
        }),
        None => Err(DeserializeError::InvalidHeader(header.byte())),
    }
}
