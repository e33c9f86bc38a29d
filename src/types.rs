use crate::error::Result;
use crate::geohash::{Geohash, GeohashCodec};
use crate::spatial::GeoPoint;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Current wall-clock time.
    pub fn now() -> Self {
        Self::from(SystemTime::now())
    }

    pub fn as_millis(&self) -> i64 {
        self.0
    }

    /// Milliseconds elapsed between this timestamp and `now`.
    ///
    /// Negative when the record claims to come from the future.
    pub fn age_at(&self, now: Timestamp) -> i64 {
        now.0.saturating_sub(self.0)
    }

    pub fn saturating_sub(&self, duration: Duration) -> Self {
        Self(self.0.saturating_sub(duration_millis(duration)))
    }

    pub fn saturating_add(&self, duration: Duration) -> Self {
        Self(self.0.saturating_add(duration_millis(duration)))
    }
}

impl From<SystemTime> for Timestamp {
    fn from(time: SystemTime) -> Self {
        match time.duration_since(UNIX_EPOCH) {
            Ok(since) => Self(duration_millis(since)),
            Err(before) => Self(-duration_millis(before.duration())),
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

/// `duration` in whole milliseconds, clamped to `i64::MAX`.
pub(crate) fn duration_millis(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}

/// A location record supplied by the caller for classification.
///
/// The geohash is stored alongside the point because that is how records
/// are indexed in the shared store; it must be at least as long as the
/// matcher's search precision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    /// Opaque identifier (e.g. the store document id)
    pub id: String,
    /// Where the record was created
    pub point: GeoPoint,
    /// Precomputed geohash of `point`
    pub geohash: Geohash,
    /// Creation time
    pub timestamp: Timestamp,
}

impl CandidateRecord {
    pub fn new(
        id: impl Into<String>,
        point: GeoPoint,
        geohash: Geohash,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            id: id.into(),
            point,
            geohash,
            timestamp,
        }
    }

    /// Build a record, computing its geohash at `precision`.
    pub fn locate(
        id: impl Into<String>,
        point: GeoPoint,
        timestamp: Timestamp,
        precision: usize,
    ) -> Result<Self> {
        let geohash = GeohashCodec::encode(&point, precision)?;
        Ok(Self::new(id, point, geohash, timestamp))
    }
}

/// Counters describing how a match call disposed of its candidates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchStats {
    /// Number of candidates examined
    pub scanned: usize,
    /// Rejected by the geohash prefix range
    pub outside_range: usize,
    /// In range and fresh, but farther than the radius
    pub outside_radius: usize,
    /// Malformed records that could not be classified
    pub skipped: usize,
}

/// Outcome of one match call.
///
/// `within_radius` and `expired` are disjoint and list identifiers in the
/// order the candidates were supplied. Callers should rely on membership
/// only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Fresh records within the search radius
    pub within_radius: Vec<String>,
    /// Records older than the TTL; the caller should purge them
    pub expired: Vec<String>,
    pub stats: MatchStats,
}

impl MatchResult {
    pub fn is_empty(&self) -> bool {
        self.within_radius.is_empty() && self.expired.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_age() {
        let created = Timestamp::from_millis(1_000);
        assert_eq!(created.age_at(Timestamp::from_millis(4_500)), 3_500);
        assert_eq!(created.age_at(Timestamp::from_millis(500)), -500);
    }

    #[test]
    fn test_timestamp_arithmetic() {
        let now = Timestamp::from_millis(10_000);
        assert_eq!(now.saturating_sub(Duration::from_secs(3)).as_millis(), 7_000);
        assert_eq!(now.saturating_add(Duration::from_millis(250)).as_millis(), 10_250);
        assert_eq!(
            Timestamp::from_millis(i64::MIN).saturating_sub(Duration::from_secs(1)),
            Timestamp::from_millis(i64::MIN)
        );
    }

    #[test]
    fn test_timestamp_from_system_time() {
        let time = UNIX_EPOCH + Duration::from_millis(1_640_995_200_000);
        assert_eq!(Timestamp::from(time).as_millis(), 1_640_995_200_000);

        let before = UNIX_EPOCH - Duration::from_millis(1_500);
        assert_eq!(Timestamp::from(before).as_millis(), -1_500);
    }

    #[test]
    fn test_locate_computes_geohash() {
        let point = GeoPoint::new(37.7749, -122.4194).unwrap();
        let record = CandidateRecord::locate("a", point, Timestamp::from_millis(0), 8).unwrap();
        assert_eq!(record.geohash.as_str(), "9q8yyk8y");
        assert!(CandidateRecord::locate("a", point, Timestamp::from_millis(0), 0).is_err());
    }

    #[test]
    fn test_record_serde() {
        let point = GeoPoint::new(37.7749, -122.4194).unwrap();
        let record =
            CandidateRecord::locate("sos-1", point, Timestamp::from_millis(42), 5).unwrap();

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["geohash"], "9q8yy");
        assert_eq!(json["timestamp"], 42);
        assert_eq!(json["point"]["latitude"], 37.7749);

        let back: CandidateRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }
}
