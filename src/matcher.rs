//! Proximity matching
//!
//! Classifies candidate records around an origin in two passes: a cheap
//! lexicographic geohash-range check, then an exact age and great-circle
//! distance check on the survivors.
//!
//! The range check is lossy. It admits cells north and east of the origin
//! that may be far outside the radius (the exact pass removes those), and it
//! rejects cells to the west and south of the origin cell even when they are
//! close. Callers that need every record within the radius must query the
//! neighbouring cells themselves; near the antimeridian and the poles the
//! range degenerates further.

use crate::config::MatcherConfig;
use crate::error::{Result, SafeZoneError};
use crate::geohash::{GeohashCodec, GeohashRange};
use crate::spatial::GeoPoint;
use crate::types::{CandidateRecord, MatchResult, Timestamp};
use std::time::Duration;
use tracing::{debug, trace};

/// How a single candidate was classified.
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    /// Fresh and within the radius; carries the distance in meters
    WithinRadius(f64),
    /// Older than the TTL, regardless of distance
    Expired,
    /// Geohash outside the search range
    OutsideRange,
    /// Fresh and in range, but farther than the radius
    OutsideRadius(f64),
    /// Could not be classified
    Skipped(String),
}

/// Matches candidate records against an origin under a fixed configuration.
///
/// A matcher holds only its validated configuration, so it can be shared
/// freely between threads.
///
/// # Examples
///
/// ```rust
/// use safezone::{CandidateRecord, GeoPoint, MatcherConfig, ProximityMatcher, Timestamp};
/// use std::time::Duration;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let matcher = ProximityMatcher::new(MatcherConfig::default())?;
///
/// let origin = GeoPoint::new(37.7749, -122.4194)?;
/// let now = Timestamp::from_millis(1_700_000_000_000);
/// let hour_ago = now.saturating_sub(Duration::from_secs(3600));
///
/// let nearby = CandidateRecord::locate("sos-a", GeoPoint::new(37.7755, -122.4190)?, hour_ago, 8)?;
/// let result = matcher.match_candidates(&origin, &[nearby], now)?;
/// assert_eq!(result.within_radius, vec!["sos-a".to_string()]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ProximityMatcher {
    config: MatcherConfig,
}

impl ProximityMatcher {
    /// Create a matcher, validating `config`.
    pub fn new(config: MatcherConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// The geohash range a store query around `origin` should use.
    pub fn search_range(&self, origin: &GeoPoint) -> Result<GeohashRange> {
        GeohashCodec::bounding_box_range(origin, self.config.precision)
    }

    /// Classify `candidate` against `origin` using a precomputed `range`.
    pub fn classify(
        &self,
        origin: &GeoPoint,
        range: &GeohashRange,
        candidate: &CandidateRecord,
        now: Timestamp,
    ) -> Classification {
        let Some(prefix) = candidate.geohash.truncate(self.config.precision) else {
            return Classification::Skipped(format!(
                "geohash '{}' is shorter than search precision {}",
                candidate.geohash, self.config.precision
            ));
        };

        if !range.contains(&prefix) {
            return Classification::OutsideRange;
        }

        if self.config.is_expired(candidate.timestamp.age_at(now)) {
            return Classification::Expired;
        }

        let distance = origin.distance_to(&candidate.point);
        if self.config.within_radius(distance) {
            Classification::WithinRadius(distance)
        } else {
            Classification::OutsideRadius(distance)
        }
    }

    /// Classify every candidate and collect the matches and expirations.
    ///
    /// Fails only if the search range cannot be computed; malformed
    /// candidates are counted in `stats.skipped` and otherwise ignored.
    pub fn match_candidates(
        &self,
        origin: &GeoPoint,
        candidates: &[CandidateRecord],
        now: Timestamp,
    ) -> Result<MatchResult> {
        let range = self.search_range(origin)?;
        debug!(
            %origin,
            %range,
            candidates = candidates.len(),
            radius_meters = self.config.radius_meters,
            "matching candidates"
        );

        let classifications = self.classify_all(origin, &range, candidates, now);

        let mut result = MatchResult::default();
        result.stats.scanned = candidates.len();

        for (candidate, classification) in candidates.iter().zip(classifications) {
            trace!(id = %candidate.id, ?classification, "classified candidate");
            match classification {
                Classification::WithinRadius(_) => result.within_radius.push(candidate.id.clone()),
                Classification::Expired => result.expired.push(candidate.id.clone()),
                Classification::OutsideRange => result.stats.outside_range += 1,
                Classification::OutsideRadius(_) => result.stats.outside_radius += 1,
                Classification::Skipped(reason) => {
                    debug!(id = %candidate.id, %reason, "skipping malformed candidate");
                    result.stats.skipped += 1;
                }
            }
        }

        debug!(
            within_radius = result.within_radius.len(),
            expired = result.expired.len(),
            outside_range = result.stats.outside_range,
            outside_radius = result.stats.outside_radius,
            skipped = result.stats.skipped,
            "match complete"
        );

        Ok(result)
    }

    #[cfg(not(feature = "parallel"))]
    fn classify_all(
        &self,
        origin: &GeoPoint,
        range: &GeohashRange,
        candidates: &[CandidateRecord],
        now: Timestamp,
    ) -> Vec<Classification> {
        candidates
            .iter()
            .map(|candidate| self.classify(origin, range, candidate, now))
            .collect()
    }

    #[cfg(feature = "parallel")]
    fn classify_all(
        &self,
        origin: &GeoPoint,
        range: &GeohashRange,
        candidates: &[CandidateRecord],
        now: Timestamp,
    ) -> Vec<Classification> {
        use rayon::prelude::*;

        candidates
            .par_iter()
            .map(|candidate| self.classify(origin, range, candidate, now))
            .collect()
    }
}

/// One-shot match with explicit parameters.
///
/// Validates `radius_meters > 0`, `ttl_millis > 0` and `precision`, then
/// behaves like [`ProximityMatcher::match_candidates`].
pub fn match_candidates(
    origin: &GeoPoint,
    radius_meters: f64,
    ttl_millis: i64,
    candidates: &[CandidateRecord],
    now: Timestamp,
    precision: usize,
) -> Result<MatchResult> {
    if ttl_millis <= 0 {
        return Err(SafeZoneError::InvalidParameter(format!(
            "ttl must be a positive number of milliseconds, got {}",
            ttl_millis
        )));
    }

    let config = MatcherConfig::new(
        radius_meters,
        Duration::from_millis(ttl_millis.unsigned_abs()),
        precision,
    );
    ProximityMatcher::new(config)?.match_candidates(origin, candidates, now)
}
