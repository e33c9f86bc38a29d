//! Geohash encoding and decoding
//!
//! A geohash interleaves longitude and latitude bits obtained by repeatedly
//! bisecting `[-180, 180]` and `[-90, 90]`, then packs every five bits into
//! one character of a base-32 alphabet. The alphabet is in ascending ASCII
//! order, so lexicographic order of equal-length hashes is the Z-order of
//! their cells.

use crate::error::{Result, SafeZoneError};
use crate::spatial::{BoundingBox, EARTH_RADIUS_M, GeoPoint, MAX_LAT, MAX_LON, MIN_LAT, MIN_LON};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Base-32 geohash alphabet (omits `a`, `i`, `l`, `o`).
pub const BASE32: &[u8; 32] = b"0123456789bcdefghjkmnpqrstuvwxyz";

/// Precision used when storing a location fix (~38m x 19m cells).
pub const DEFAULT_PRECISION: usize = 8;

/// Precision used when searching for nearby records (~4.9km x 4.9km cells).
pub const DEFAULT_SEARCH_PRECISION: usize = 5;

/// Longest supported geohash. Twelve characters carry 60 bits, finer than
/// any location fix.
pub const MAX_PRECISION: usize = 12;

const BITS_PER_CHAR: usize = 5;
const INVALID: u8 = 0xff;
const DECODE_TABLE: [u8; 128] = build_decode_table();

const fn build_decode_table() -> [u8; 128] {
    let mut table = [INVALID; 128];
    let mut i = 0;
    while i < BASE32.len() {
        table[BASE32[i] as usize] = i as u8;
        i += 1;
    }
    table
}

fn check_precision(precision: usize) -> Result<()> {
    if precision == 0 || precision > MAX_PRECISION {
        return Err(SafeZoneError::InvalidPrecision(precision));
    }
    Ok(())
}

/// A validated geohash string.
///
/// Input is accepted in either case and stored lowercase. Ordering is
/// lexicographic over the string, which is what prefix-range queries rely on.
///
/// ```rust
/// use safezone::Geohash;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let hash: Geohash = "9Q8YYK8Y".parse()?;
/// assert_eq!(hash.as_str(), "9q8yyk8y");
/// assert_eq!(hash.truncate(5).unwrap().as_str(), "9q8yy");
/// assert!("9q8ya".parse::<Geohash>().is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Geohash(String);

impl Geohash {
    /// Parse and validate a geohash string.
    pub fn parse(input: &str) -> Result<Self> {
        check_precision(input.len())?;

        let hash = input.to_ascii_lowercase();
        let valid = hash
            .bytes()
            .all(|b| b.is_ascii() && DECODE_TABLE[b as usize] != INVALID);
        if !valid {
            return Err(SafeZoneError::InvalidGeohash(input.to_string()));
        }

        Ok(Self(hash))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of characters in the hash.
    pub fn precision(&self) -> usize {
        self.0.len()
    }

    /// The prefix of this hash at `precision`, or `None` if the hash is shorter.
    pub fn truncate(&self, precision: usize) -> Option<Geohash> {
        if precision == 0 || precision > self.precision() {
            return None;
        }
        Some(Self(self.0[..precision].to_string()))
    }

    /// Whether `prefix` is a prefix of this hash (i.e. this cell lies inside it).
    pub fn starts_with(&self, prefix: &Geohash) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// Character values in `0..32`, most significant first.
    fn digits(&self) -> impl Iterator<Item = u8> + '_ {
        self.0.bytes().map(|b| DECODE_TABLE[b as usize])
    }
}

impl fmt::Display for Geohash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl AsRef<str> for Geohash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for Geohash {
    type Err = SafeZoneError;

    fn from_str(s: &str) -> Result<Self> {
        Geohash::parse(s)
    }
}

impl TryFrom<String> for Geohash {
    type Error = SafeZoneError;

    fn try_from(value: String) -> Result<Self> {
        Geohash::parse(&value)
    }
}

impl From<Geohash> for String {
    fn from(hash: Geohash) -> Self {
        hash.0
    }
}

/// An inclusive lexicographic range of geohashes of one precision.
///
/// Produced by [`GeohashCodec::bounding_box_range`]; a store can answer it
/// with a `start <= geohash <= end` query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeohashRange {
    pub start: Geohash,
    pub end: Geohash,
}

impl GeohashRange {
    pub fn precision(&self) -> usize {
        self.start.precision()
    }

    /// Whether `hash`, already truncated to this range's precision, lies in the range.
    pub fn contains(&self, hash: &Geohash) -> bool {
        self.start <= *hash && *hash <= self.end
    }
}

impl From<GeohashRange> for (Geohash, Geohash) {
    fn from(range: GeohashRange) -> Self {
        (range.start, range.end)
    }
}

impl fmt::Display for GeohashRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

/// Geohash encoder/decoder.
///
/// All operations are pure associated functions; the type carries no state.
///
/// # Examples
///
/// ```rust
/// use safezone::{GeoPoint, GeohashCodec};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let sf = GeoPoint::new(37.7749, -122.4194)?;
///
/// let hash = GeohashCodec::encode(&sf, 5)?;
/// assert_eq!(hash.as_str(), "9q8yy");
///
/// let cell = GeohashCodec::decode_bounding_box(&hash);
/// assert!(cell.contains(&sf));
///
/// let range = GeohashCodec::bounding_box_range(&sf, 5)?;
/// assert_eq!(range.start.as_str(), "9q8yy");
/// assert_eq!(range.end.as_str(), "9q8zp");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct GeohashCodec;

/// Narrow `range` to its upper half when `upper` is set, else its lower half.
#[inline]
fn bisect(range: &mut (f64, f64), upper: bool) {
    let mid = (range.0 + range.1) / 2.0;
    if upper {
        range.0 = mid;
    } else {
        range.1 = mid;
    }
}

impl GeohashCodec {
    /// Encode `point` into a geohash of `precision` characters.
    ///
    /// Bits alternate longitude, latitude, starting with longitude. A value
    /// equal to the midpoint of its current range goes to the upper half.
    pub fn encode(point: &GeoPoint, precision: usize) -> Result<Geohash> {
        check_precision(precision)?;

        let mut lat_range = (MIN_LAT, MAX_LAT);
        let mut lon_range = (MIN_LON, MAX_LON);
        let mut even = true;
        let mut hash = String::with_capacity(precision);

        while hash.len() < precision {
            let mut index = 0usize;
            for _ in 0..BITS_PER_CHAR {
                let (range, value) = if even {
                    (&mut lon_range, point.lon())
                } else {
                    (&mut lat_range, point.lat())
                };
                let upper = value >= (range.0 + range.1) / 2.0;
                bisect(range, upper);
                index = (index << 1) | usize::from(upper);
                even = !even;
            }
            hash.push(BASE32[index] as char);
        }

        Ok(Geohash(hash))
    }

    /// Decode the cell `hash` represents.
    ///
    /// This recovers the cell, not the original point: every point in the
    /// returned box encodes to `hash` (except on the north and east edges,
    /// which belong to the neighbouring cells).
    pub fn decode_bounding_box(hash: &Geohash) -> BoundingBox {
        let mut lat_range = (MIN_LAT, MAX_LAT);
        let mut lon_range = (MIN_LON, MAX_LON);
        let mut even = true;

        for digit in hash.digits() {
            for shift in (0..BITS_PER_CHAR).rev() {
                let upper = (digit >> shift) & 1 == 1;
                if even {
                    bisect(&mut lon_range, upper);
                } else {
                    bisect(&mut lat_range, upper);
                }
                even = !even;
            }
        }

        BoundingBox::new(lat_range.0, lon_range.0, lat_range.1, lon_range.1)
    }

    /// Decode `hash` to the center of its cell plus the half-height and
    /// half-width of the cell in degrees.
    pub fn decode(hash: &Geohash) -> Result<(GeoPoint, f64, f64)> {
        let cell = Self::decode_bounding_box(hash);
        Ok((cell.center()?, cell.lat_span() / 2.0, cell.lon_span() / 2.0))
    }

    /// Compute the lexicographic range of hashes to query around `point`.
    ///
    /// Encodes `point` at `precision`, decodes that cell and re-encodes its
    /// south-west and north-east corners. Because a north or east edge
    /// belongs to the next cell, `end` is normally the north-east diagonal
    /// neighbour of the origin cell; at the north pole or the antimeridian
    /// the corner saturates and `end` stays in the origin's row or column.
    ///
    /// This is a coarse filter only. Hashes inside the range may lie far
    /// from `point` and hashes of adjacent cells to the west or south fall
    /// outside it. Nothing wraps across the antimeridian.
    pub fn bounding_box_range(point: &GeoPoint, precision: usize) -> Result<GeohashRange> {
        let center = Self::encode(point, precision)?;
        let cell = Self::decode_bounding_box(&center);

        let start = Self::encode(&cell.southwest()?, precision)?;
        let end = Self::encode(&cell.northeast()?, precision)?;

        Ok(GeohashRange { start, end })
    }

    /// Height and width in degrees of a cell at `precision`.
    pub fn cell_dimensions(precision: usize) -> Result<(f64, f64)> {
        check_precision(precision)?;

        let bits = (precision * BITS_PER_CHAR) as i32;
        let lon_bits = (bits + 1) / 2;
        let lat_bits = bits / 2;

        Ok((
            (MAX_LAT - MIN_LAT) / 2f64.powi(lat_bits),
            (MAX_LON - MIN_LON) / 2f64.powi(lon_bits),
        ))
    }

    /// The finest precision whose cells are still at least `radius_meters`
    /// on their shorter side (measured at the equator).
    ///
    /// Radii larger than a precision-1 cell return 1.
    pub fn precision_for_radius(radius_meters: f64) -> usize {
        let meters_per_degree = EARTH_RADIUS_M * std::f64::consts::PI / 180.0;

        (1..=MAX_PRECISION)
            .rev()
            .find(|&precision| {
                Self::cell_dimensions(precision)
                    .map(|(lat_deg, lon_deg)| {
                        lat_deg.min(lon_deg) * meters_per_degree >= radius_meters
                    })
                    .unwrap_or(false)
            })
            .unwrap_or(1)
    }
}
