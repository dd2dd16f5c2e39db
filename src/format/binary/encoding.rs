use tracing::warn;

use crate::{
    Bearing, Coordinate, DeserializeError, Fow, Frc, GridSize, Length, LineAttributes, Offset,
    Offsets, Orientation, SerializeError, SideOfRoad,
};

/// The two attribute bytes of an LR-point, whose free bits are shared between the
/// LFRCNP (or the offset flags of the last point) and the orientation (or side of road).
#[derive(Debug, Clone, Copy)]
pub(crate) struct EncodedAttributes {
    pub(crate) line: LineAttributes,
    pub(crate) lfrcnp_or_flags: u8,
    pub(crate) orientation_or_side: u8,
}

impl From<LineAttributes> for EncodedAttributes {
    fn from(line: LineAttributes) -> Self {
        Self {
            line,
            lfrcnp_or_flags: 0,
            orientation_or_side: 0,
        }
    }
}

impl EncodedAttributes {
    const POS_OFFSET_FLAG: u8 = 0b10;
    const NEG_OFFSET_FLAG: u8 = 0b01;

    pub(crate) const fn with_lfrcnp(mut self, lfrcnp: Frc) -> Self {
        self.lfrcnp_or_flags = lfrcnp.value();
        self
    }

    pub(crate) const fn with_offsets(mut self, offsets: &Offsets) -> Self {
        let mut flags = 0;
        if !offsets.pos.is_zero() {
            flags |= Self::POS_OFFSET_FLAG;
        }
        if !offsets.neg.is_zero() {
            flags |= Self::NEG_OFFSET_FLAG;
        }
        self.lfrcnp_or_flags = flags;
        self
    }

    pub(crate) const fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation_or_side = orientation as u8;
        self
    }

    pub(crate) const fn with_side(mut self, side: SideOfRoad) -> Self {
        self.orientation_or_side = side as u8;
        self
    }

    pub(crate) fn lfrcnp(&self) -> Result<Frc, DeserializeError> {
        Frc::from_repr(self.lfrcnp_or_flags).ok_or(DeserializeError::InvalidFrc(self.lfrcnp_or_flags))
    }

    pub(crate) const fn pos_offset_flag(&self) -> bool {
        self.lfrcnp_or_flags & Self::POS_OFFSET_FLAG != 0
    }

    pub(crate) const fn neg_offset_flag(&self) -> bool {
        self.lfrcnp_or_flags & Self::NEG_OFFSET_FLAG != 0
    }

    pub(crate) fn orientation(&self) -> Result<Orientation, DeserializeError> {
        Orientation::from_repr(self.orientation_or_side)
            .ok_or(DeserializeError::InvalidOrientation(self.orientation_or_side))
    }

    pub(crate) fn side(&self) -> Result<SideOfRoad, DeserializeError> {
        SideOfRoad::from_repr(self.orientation_or_side)
            .ok_or(DeserializeError::InvalidSideOfRoad(self.orientation_or_side))
    }

    /// Packs the attributes as `[fow | frc << 3 | ori << 6, bearing | lfrcnp << 5]`.
    pub(crate) fn try_into_bytes(self) -> Result<[u8; 2], SerializeError> {
        let LineAttributes { frc, fow, bearing } = self.line;
        let bearing = bearing.try_into_byte()?;

        let first = fow.value() | (frc.value() << 3) | ((self.orientation_or_side & 0b11) << 6);
        let second = bearing | ((self.lfrcnp_or_flags & 0b111) << 5);
        Ok([first, second])
    }

    pub(crate) fn try_from_bytes([first, second]: [u8; 2]) -> Result<Self, DeserializeError> {
        let fow = first & 0b111;
        let fow = Fow::from_repr(fow).ok_or(DeserializeError::InvalidFow(fow))?;
        let frc = (first >> 3) & 0b111;
        let frc = Frc::from_repr(frc).ok_or(DeserializeError::InvalidFrc(frc))?;
        let bearing = Bearing::from_byte(second & 0b11111);

        Ok(Self {
            line: LineAttributes { frc, fow, bearing },
            lfrcnp_or_flags: (second >> 5) & 0b111,
            orientation_or_side: (first >> 6) & 0b11,
        })
    }
}

impl Coordinate {
    const RESOLUTION: u32 = 24;
    const DECA_MICRO_DEG_FACTOR: f64 = 100000.0;

    /// Returns degrees from a big-endian degrees representation in a 24-bit resolution.
    pub(crate) fn degrees_from_be_bytes(bytes: [u8; 3]) -> f64 {
        let is_negative = bytes[0] & 0x80 != 0;
        let sign = if is_negative { 0xFF } else { 0 };
        let degrees = i32::from_be_bytes([sign, bytes[0], bytes[1], bytes[2]]) as f64;
        ((degrees - signum(degrees) * 0.5) * 360.0) / (1u32 << Self::RESOLUTION) as f64
    }

    /// Returns the big-endian representation of the given degrees in a 24-bit resolution.
    pub(crate) fn degrees_into_be_bytes(degrees: f64) -> [u8; 3] {
        let degrees = signum(degrees) * 0.5 + degrees * (1u32 << Self::RESOLUTION) as f64 / 360.0;
        let [_, b1, b2, b3] = (degrees.round() as i32).to_be_bytes();
        [b1, b2, b3]
    }

    /// Returns degrees from a big-endian relative degrees representation in a 16-bit resolution.
    pub(crate) fn degrees_from_be_bytes_relative(bytes: [u8; 2], previous_degrees: f64) -> f64 {
        let degrees = i16::from_be_bytes(bytes) as f64;
        previous_degrees + degrees / Self::DECA_MICRO_DEG_FACTOR
    }

    /// Returns the big-endian relative degrees representation in a 16-bit resolution.
    /// A delta that does not fit in 16 bits is clamped to the closest representable one.
    pub(crate) fn degrees_into_be_bytes_relative(degrees: f64, previous_degrees: f64) -> [u8; 2] {
        let delta = (Self::DECA_MICRO_DEG_FACTOR * (degrees - previous_degrees)).round();
        if delta < i16::MIN as f64 || delta > i16::MAX as f64 {
            warn!("Relative degrees {delta} out of range, clamping {previous_degrees} -> {degrees}");
        }
        i16::to_be_bytes(delta as i16)
    }

    /// Returns true if the coordinate can be written relative to the previous one without clamping.
    pub(crate) fn fits_relative_to(&self, previous: &Self) -> bool {
        let fits = |degrees: f64, previous: f64| {
            let delta = (Self::DECA_MICRO_DEG_FACTOR * (degrees - previous)).round();
            (i16::MIN as f64..=i16::MAX as f64).contains(&delta)
        };
        fits(self.lon, previous.lon) && fits(self.lat, previous.lat)
    }
}

impl Length {
    /// This representation defines 256 intervals and each interval has a length of approximately 58.6 meters.
    /// Maximum length between two consecutive LR-points is limited by 15000m.
    const DISTANCE_PER_INTERVAL: f64 = 58.6;

    /// Returns the distance to next LR-point in meters from a byte.
    pub(crate) fn dnp_from_byte(byte: u8) -> Self {
        Self::from_meters(((byte as f64 + 0.5) * Self::DISTANCE_PER_INTERVAL).round())
    }

    /// Returns the distance to next LR-point interval.
    pub(crate) fn dnp_into_byte(self) -> u8 {
        (self.meters() / Self::DISTANCE_PER_INTERVAL - 0.5).round() as u8
    }

    /// Returns the length of a radius in meters from big-endian slice of (up to 4) bytes.
    pub(crate) fn radius_from_be_bytes(bytes: &[u8]) -> Self {
        let mut radius = [0u8; 4];
        radius[4 - bytes.len()..].copy_from_slice(bytes);
        Self::from_meters(u32::from_be_bytes(radius) as f64)
    }

    /// Returns the big-endian representation of a radius in the fewest bytes possible (at least 1).
    pub(crate) fn try_into_radius_be_bytes(self) -> Result<Vec<u8>, SerializeError> {
        let meters = self.round().meters();
        if !(0.0..=u32::MAX as f64).contains(&meters) {
            return Err(SerializeError::InvalidRadius(self));
        }

        let radius = (meters as u32).to_be_bytes();
        let skip = (radius.iter().take_while(|&&b| b == 0).count()).min(3);
        Ok(radius[skip..].to_vec())
    }
}

impl Bearing {
    /// The bearing describes the angle between the true North and the road.
    /// The data format defines 32 sectors whereby each sector covers 11.25° of the circle.
    // OpenLR v3 stores the bearing in a 5-bit field, hence 32 sectors and not 8 sectors of 45°.
    const BEAR_SECTOR: f64 = 11.25;

    /// Returns the bearing at the middle of the sector.
    pub(crate) fn from_byte(byte: u8) -> Self {
        let degrees = (byte as f64 * Self::BEAR_SECTOR + Self::BEAR_SECTOR / 2.0).round() as u16;
        Self::from_degrees(degrees)
    }

    pub(crate) fn try_into_byte(self) -> Result<u8, SerializeError> {
        let degrees = self.degrees();
        if !(0..360).contains(&degrees) {
            return Err(SerializeError::InvalidBearing(degrees));
        }

        let bear = (degrees as f64 - Self::BEAR_SECTOR / 2.0) / Self::BEAR_SECTOR;
        Ok(bear.round() as u8 & 0b11111)
    }
}

impl Offset {
    /// The relative value of the offset is equally distributed over 256 buckets so that
    /// every bucket covers 0.390625% of the referenced path.
    /// Returns the offset in the middle of the bucket.
    pub(crate) fn from_byte(bucket: u8) -> Self {
        Self::from_range((bucket as f32 + 0.5) / 256.0)
    }

    /// Returns the bucket index corresponding to the given offset.
    pub(crate) fn try_into_byte(self) -> Result<u8, SerializeError> {
        let range = self.range();
        if !(0.0..1.0).contains(&range) {
            return Err(SerializeError::InvalidOffset(range));
        }

        Ok((range * 256.0).floor().min(255.0) as u8)
    }
}

impl GridSize {
    pub(crate) fn from_be_bytes([c1, c2, r1, r2]: [u8; 4]) -> Self {
        let columns = u16::from_be_bytes([c1, c2]);
        let rows = u16::from_be_bytes([r1, r2]);
        Self { columns, rows }
    }

    pub(crate) fn try_into_be_bytes(self) -> Result<[u8; 4], SerializeError> {
        if self.columns < 2 || self.rows < 2 {
            return Err(SerializeError::InvalidGridSize);
        }

        let [c1, c2] = u16::to_be_bytes(self.columns);
        let [r1, r2] = u16::to_be_bytes(self.rows);
        Ok([c1, c2, r1, r2])
    }
}

const fn signum(value: f64) -> f64 {
    if value == 0.0 { 0.0 } else { value.signum() }
}
