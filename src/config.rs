//! Matcher configuration
//!
//! The search radius, record TTL and search precision are policy values
//! owned by the alerting workflow. They live here rather than inside the
//! matcher so a deployment can tune them without code changes.

use crate::error::{Result, SafeZoneError};
use crate::geohash::{DEFAULT_SEARCH_PRECISION, MAX_PRECISION};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default search radius: 2 km.
pub const DEFAULT_RADIUS_METERS: f64 = 2000.0;

/// Default record lifetime: 24 hours.
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Configuration for a [`ProximityMatcher`](crate::ProximityMatcher).
///
/// # Examples
///
/// ```rust
/// use safezone::MatcherConfig;
/// use std::time::Duration;
///
/// let config = MatcherConfig::default()
///     .with_radius(500.0)
///     .with_ttl(Duration::from_secs(3600))
///     .with_precision(6);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Search radius in meters; the boundary is inclusive
    pub radius_meters: f64,

    /// Records older than this are reported as expired
    #[serde(rename = "ttl_ms", with = "duration_ms")]
    pub ttl: Duration,

    /// Geohash precision used for the prefix-range pre-filter
    pub precision: usize,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            radius_meters: DEFAULT_RADIUS_METERS,
            ttl: DEFAULT_TTL,
            precision: DEFAULT_SEARCH_PRECISION,
        }
    }
}

impl MatcherConfig {
    pub fn new(radius_meters: f64, ttl: Duration, precision: usize) -> Self {
        Self {
            radius_meters,
            ttl,
            precision,
        }
    }

    pub fn with_radius(mut self, radius_meters: f64) -> Self {
        self.radius_meters = radius_meters;
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_precision(mut self, precision: usize) -> Self {
        self.precision = precision;
        self
    }

    /// TTL in whole milliseconds.
    pub fn ttl_millis(&self) -> i64 {
        crate::types::duration_millis(self.ttl)
    }

    /// Whether a record `distance_meters` away is close enough to match.
    ///
    /// The boundary is inclusive: a record exactly `radius_meters` away matches.
    pub fn within_radius(&self, distance_meters: f64) -> bool {
        distance_meters <= self.radius_meters
    }

    /// Whether a record `age_millis` old has outlived the TTL.
    ///
    /// Negative ages (records from the future) are never expired.
    pub fn is_expired(&self, age_millis: i64) -> bool {
        age_millis > self.ttl_millis()
    }

    /// Reject non-positive radius or TTL and unsupported precisions.
    pub fn validate(&self) -> Result<()> {
        if !(self.radius_meters.is_finite() && self.radius_meters > 0.0) {
            return Err(SafeZoneError::InvalidParameter(format!(
                "radius must be a positive number of meters, got {}",
                self.radius_meters
            )));
        }
        if self.ttl_millis() <= 0 {
            return Err(SafeZoneError::InvalidParameter(format!(
                "ttl must be at least one millisecond, got {:?}",
                self.ttl
            )));
        }
        if self.precision == 0 || self.precision > MAX_PRECISION {
            return Err(SafeZoneError::InvalidPrecision(self.precision));
        }
        Ok(())
    }

    /// Parse and validate a configuration from TOML.
    ///
    /// Missing keys take their default values.
    ///
    /// ```rust
    /// # #[cfg(feature = "toml")]
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// use safezone::MatcherConfig;
    ///
    /// let config = MatcherConfig::from_toml_str("radius_meters = 1500.0\nttl_ms = 3600000\n")?;
    /// assert_eq!(config.radius_meters, 1500.0);
    /// assert_eq!(config.precision, 5);
    /// # Ok(())
    /// # }
    /// # #[cfg(not(feature = "toml"))]
    /// # fn main() {}
    /// ```
    #[cfg(feature = "toml")]
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(input).map_err(|e| SafeZoneError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML configuration file.
    #[cfg(feature = "toml")]
    pub fn from_toml_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let input = std::fs::read_to_string(path)?;
        Self::from_toml_str(&input)
    }

    /// Serialize this configuration to TOML.
    #[cfg(feature = "toml")]
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| SafeZoneError::Config(e.to_string()))
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
