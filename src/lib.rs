//! # safezone - geohash proximity matching for nearby SOS alerts
//!
//! safezone is the computational core behind "who nearby needs help?":
//! locations are indexed by geohash, a listener derives a geohash prefix
//! range around its own fix, and every record returned for that range is
//! re-checked by exact great-circle distance and by age.
//!
//! ## Features
//!
//! - **Geohash codec**: encode points, decode cells, derive prefix ranges
//! - **Proximity matcher**: coarse range filter, TTL expiry, haversine radius check
//! - **Store documents**: presence and SOS document shapes with lenient decoding
//! - **Pure and synchronous**: no I/O, no shared state, safe to call from any thread
//! - **Optional parallelism**: `parallel` feature classifies candidates with rayon
//!
//! ## Quick Start
//!
//! ```rust
//! use safezone::{CandidateRecord, GeoPoint, MatcherConfig, ProximityMatcher, Timestamp};
//! use std::time::Duration;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let matcher = ProximityMatcher::new(MatcherConfig::default())?;
//! let origin = GeoPoint::new(37.7749, -122.4194)?;
//!
//! // The range a store query should use
//! let range = matcher.search_range(&origin)?;
//! println!("query geohash between {} and {}", range.start, range.end);
//!
//! let now = Timestamp::from_millis(1_700_000_000_000);
//! let candidates = vec![
//!     CandidateRecord::locate(
//!         "nearby",
//!         GeoPoint::new(37.7755, -122.4190)?,
//!         now.saturating_sub(Duration::from_secs(3600)),
//!         8,
//!     )?,
//!     CandidateRecord::locate(
//!         "stale",
//!         GeoPoint::new(37.7755, -122.4190)?,
//!         now.saturating_sub(Duration::from_secs(25 * 3600)),
//!         8,
//!     )?,
//! ];
//!
//! let result = matcher.match_candidates(&origin, &candidates, now)?;
//! assert_eq!(result.within_radius, vec!["nearby".to_string()]);
//! assert_eq!(result.expired, vec!["stale".to_string()]);
//! # Ok(())
//! # }
//! ```

pub mod alert;
pub mod config;
pub mod document;
pub mod error;
pub mod geohash;
pub mod matcher;
pub mod spatial;
pub mod types;

pub use error::{Result, SafeZoneError};

pub use spatial::{BoundingBox, EARTH_RADIUS_M, GeoPoint};

pub use geohash::{
    BASE32, DEFAULT_PRECISION, DEFAULT_SEARCH_PRECISION, Geohash, GeohashCodec, GeohashRange,
    MAX_PRECISION,
};

pub use matcher::{Classification, ProximityMatcher, match_candidates};

pub use config::{DEFAULT_RADIUS_METERS, DEFAULT_TTL, MatcherConfig};

pub use types::{CandidateRecord, MatchResult, MatchStats, Timestamp};

pub use document::{LocationDocument, MatchableDocument, PresenceDocument, SosDocument, SosStatus};

pub use alert::{AlertReport, AlertScan};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    pub use crate::{
        CandidateRecord, GeoPoint, Geohash, GeohashCodec, MatchResult, MatcherConfig,
        ProximityMatcher, Result, SafeZoneError, Timestamp,
    };
    pub use std::time::Duration;
}
