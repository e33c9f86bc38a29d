//! Spatial primitives for safezone
//!
//! This module provides the validated geographic point used by every other
//! component, the rectangular cell a geohash represents, and great-circle
//! distance on a spherical Earth.

use crate::error::{Result, SafeZoneError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Mean Earth radius used for great-circle distances.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

pub const MIN_LAT: f64 = -90.0;
pub const MAX_LAT: f64 = 90.0;
pub const MIN_LON: f64 = -180.0;
pub const MAX_LON: f64 = 180.0;

/// A geographic point on Earth's surface.
///
/// `GeoPoint` can only be built from finite, in-range coordinates, so every
/// point handed to the codec or the matcher is already valid. Coordinates
/// use WGS84 decimal degrees.
///
/// # Examples
///
/// ```rust
/// use safezone::GeoPoint;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let san_francisco = GeoPoint::new(37.7749, -122.4194)?;
/// let new_york = GeoPoint::new(40.7128, -74.0060)?;
///
/// let distance_km = san_francisco.distance_to(&new_york) / 1000.0;
/// println!("SF to NYC: {:.0} km", distance_km);
///
/// assert!(GeoPoint::new(91.0, 0.0).is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPoint", into = "RawPoint")]
pub struct GeoPoint {
    lat: f64,
    lon: f64,
}

#[derive(Serialize, Deserialize)]
struct RawPoint {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<RawPoint> for GeoPoint {
    type Error = SafeZoneError;

    fn try_from(raw: RawPoint) -> Result<Self> {
        GeoPoint::new(raw.latitude, raw.longitude)
    }
}

impl From<GeoPoint> for RawPoint {
    fn from(point: GeoPoint) -> Self {
        RawPoint {
            latitude: point.lat,
            longitude: point.lon,
        }
    }
}

impl GeoPoint {
    /// Creates a new point, rejecting non-finite or out-of-range coordinates.
    ///
    /// # Arguments
    ///
    /// * `lat` - Latitude in decimal degrees (-90 to +90)
    /// * `lon` - Longitude in decimal degrees (-180 to +180)
    pub fn new(lat: f64, lon: f64) -> Result<Self> {
        if !Self::is_valid(lat, lon) {
            return Err(SafeZoneError::InvalidCoordinate { lat, lon });
        }
        Ok(Self { lat, lon })
    }

    /// Whether `(lat, lon)` would be accepted by [`GeoPoint::new`].
    pub fn is_valid(lat: f64, lon: f64) -> bool {
        lat.is_finite()
            && lon.is_finite()
            && (MIN_LAT..=MAX_LAT).contains(&lat)
            && (MIN_LON..=MAX_LON).contains(&lon)
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lon(&self) -> f64 {
        self.lon
    }

    /// Great-circle distance to `other` in meters, using the haversine formula.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use safezone::GeoPoint;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let a = GeoPoint::new(37.7749, -122.4194)?;
    /// let b = GeoPoint::new(37.7755, -122.4190)?;
    /// assert!(a.distance_to(&b) < 100.0);
    /// # Ok(())
    /// # }
    /// ```
    pub fn distance_to(&self, other: &GeoPoint) -> f64 {
        const TO_RAD: f64 = std::f64::consts::PI / 180.0;

        let lat1 = self.lat * TO_RAD;
        let lat2 = other.lat * TO_RAD;
        let dlat = (other.lat - self.lat) * TO_RAD;
        let dlon = (other.lon - self.lon) * TO_RAD;

        let sin_half_dlat = (dlat * 0.5).sin();
        let sin_half_dlon = (dlon * 0.5).sin();

        let a =
            sin_half_dlat * sin_half_dlat + lat1.cos() * lat2.cos() * sin_half_dlon * sin_half_dlon;
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS_M * c
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lon)
    }
}

impl From<GeoPoint> for geo::Point<f64> {
    fn from(point: GeoPoint) -> Self {
        geo::Point::new(point.lon, point.lat)
    }
}

impl TryFrom<geo::Point<f64>> for GeoPoint {
    type Error = SafeZoneError;

    fn try_from(point: geo::Point<f64>) -> Result<Self> {
        GeoPoint::new(point.y(), point.x())
    }
}

/// A latitude/longitude rectangle.
///
/// Boxes produced by the codec never wrap: geohash cells are carved out of
/// `[-180, 180]` so `min_lon <= max_lon` always holds. A box built with
/// `min_lon > max_lon` spans the antimeridian, running east from `min_lon`
/// to 180 and on from -180 to `max_lon`; every method accounts for that.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    /// Create a new bounding box
    pub fn new(min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64) -> Self {
        Self {
            min_lat,
            min_lon,
            max_lat,
            max_lon,
        }
    }

    /// The south-west corner.
    pub fn southwest(&self) -> Result<GeoPoint> {
        GeoPoint::new(self.min_lat, self.min_lon)
    }

    /// The north-east corner.
    pub fn northeast(&self) -> Result<GeoPoint> {
        GeoPoint::new(self.max_lat, self.max_lon)
    }

    pub fn center(&self) -> Result<GeoPoint> {
        let lat = (self.min_lat + self.max_lat) / 2.0;
        if !self.crosses_antimeridian() {
            return GeoPoint::new(lat, (self.min_lon + self.max_lon) / 2.0);
        }

        let mut lon = self.min_lon + self.lon_span() / 2.0;
        if lon > MAX_LON {
            lon -= 360.0;
        }
        GeoPoint::new(lat, lon)
    }

    /// Height in degrees of latitude.
    pub fn lat_span(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    /// Width in degrees of longitude, measured eastwards from `min_lon`.
    pub fn lon_span(&self) -> f64 {
        if self.crosses_antimeridian() {
            360.0 - (self.min_lon - self.max_lon)
        } else {
            self.max_lon - self.min_lon
        }
    }

    /// Area in square degrees.
    pub fn area(&self) -> f64 {
        self.lat_span() * self.lon_span()
    }

    /// Whether the box wraps across the antimeridian.
    pub fn crosses_antimeridian(&self) -> bool {
        self.min_lon > self.max_lon
    }

    /// Check if `point` lies inside the box, edges included.
    pub fn contains(&self, point: &GeoPoint) -> bool {
        point.lat >= self.min_lat && point.lat <= self.max_lat && self.contains_lon(point.lon)
    }

    /// Check if `other` lies entirely inside this box.
    pub fn contains_box(&self, other: &BoundingBox) -> bool {
        if other.min_lat < self.min_lat || other.max_lat > self.max_lat {
            return false;
        }

        match (self.crosses_antimeridian(), other.crosses_antimeridian()) {
            (false, false) => other.min_lon >= self.min_lon && other.max_lon <= self.max_lon,
            (true, true) => other.min_lon >= self.min_lon && other.max_lon <= self.max_lon,
            // Either entirely on the eastern leg or entirely on the western one
            (true, false) => other.min_lon >= self.min_lon || other.max_lon <= self.max_lon,
            (false, true) => self.min_lon <= MIN_LON && self.max_lon >= MAX_LON,
        }
    }

    fn contains_lon(&self, lon: f64) -> bool {
        if self.crosses_antimeridian() {
            lon >= self.min_lon || lon <= self.max_lon
        } else {
            lon >= self.min_lon && lon <= self.max_lon
        }
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:.6}, {:.6}] x [{:.6}, {:.6}]",
            self.min_lat, self.max_lat, self.min_lon, self.max_lon
        )
    }
}

/// `geo::Rect` cannot wrap, so a box spanning the antimeridian is rejected.
impl TryFrom<BoundingBox> for geo::Rect<f64> {
    type Error = SafeZoneError;

    fn try_from(bbox: BoundingBox) -> Result<Self> {
        if bbox.crosses_antimeridian() {
            return Err(SafeZoneError::InvalidParameter(format!(
                "bounding box {} wraps across the antimeridian",
                bbox
            )));
        }
        Ok(geo::Rect::new(
            geo::Coord {
                x: bbox.min_lon,
                y: bbox.min_lat,
            },
            geo::Coord {
                x: bbox.max_lon,
                y: bbox.max_lat,
            },
        ))
    }
}
