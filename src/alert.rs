//! Nearby SOS alert scanning
//!
//! Pure core of the SOS listener: given the listener's location fix and the
//! SOS documents returned by a geohash range query, decide which alerts to
//! raise and which documents to delete. The same scan over presence
//! documents finds the users near an SOS. Querying the store, delivering
//! notifications and deleting documents remain with the caller.

use crate::config::MatcherConfig;
use crate::document::{MatchableDocument, PresenceDocument, SosDocument};
use crate::error::Result;
use crate::geohash::GeohashRange;
use crate::matcher::ProximityMatcher;
use crate::spatial::GeoPoint;
use crate::types::{CandidateRecord, MatchStats, Timestamp};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// What the caller should do with one batch of documents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlertReport {
    /// Active document ids within the radius; notify each
    pub notify: Vec<String>,
    /// Active document ids older than the TTL; delete or ignore them
    pub purge: Vec<String>,
    /// Resolved or cancelled SOS documents and inactive users, ignored
    pub inactive: usize,
    /// Documents that could not be decoded or classified
    pub skipped: usize,
    /// Matcher counters for the active documents
    pub stats: MatchStats,
}

/// Scans SOS documents around a listener.
///
/// # Examples
///
/// ```rust
/// use safezone::{AlertScan, GeoPoint, MatcherConfig, SosDocument, Timestamp};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let scan = AlertScan::new(MatcherConfig::default())?;
/// let listener = GeoPoint::new(37.7749, -122.4194)?;
/// let now = Timestamp::from_millis(1_700_000_000_000);
///
/// let nearby = GeoPoint::new(37.7755, -122.4190)?;
/// let sos = SosDocument::trigger("user-7", "help", &nearby, None, now)?;
/// let report = scan.scan(&listener, [("sos-1", &sos)], now)?;
/// assert_eq!(report.notify, vec!["sos-1".to_string()]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct AlertScan {
    matcher: ProximityMatcher,
}

impl AlertScan {
    pub fn new(config: MatcherConfig) -> Result<Self> {
        Ok(Self {
            matcher: ProximityMatcher::new(config)?,
        })
    }

    pub fn matcher(&self) -> &ProximityMatcher {
        &self.matcher
    }

    /// Geohash range the caller should query the `sos` collection with.
    pub fn query_range(&self, listener: &GeoPoint) -> Result<GeohashRange> {
        self.matcher.search_range(listener)
    }

    /// Classify `documents`, given as `(document id, document)` pairs.
    pub fn scan<'a, D, I>(
        &self,
        listener: &GeoPoint,
        documents: I,
        now: Timestamp,
    ) -> Result<AlertReport>
    where
        D: MatchableDocument + 'a,
        I: IntoIterator<Item = (&'a str, &'a D)>,
    {
        let mut report = AlertReport::default();
        let mut candidates: Vec<CandidateRecord> = Vec::new();

        for (id, document) in documents {
            if !document.is_active() {
                report.inactive += 1;
                continue;
            }
            match document.to_candidate(id) {
                Ok(candidate) => candidates.push(candidate),
                Err(e) => {
                    debug!(%id, error = %e, "skipping document");
                    report.skipped += 1;
                }
            }
        }

        let result = self.matcher.match_candidates(listener, &candidates, now)?;
        report.notify = result.within_radius;
        report.purge = result.expired;
        report.skipped += result.stats.skipped;
        report.stats = result.stats;

        if !report.notify.is_empty() {
            info!(count = report.notify.len(), "nearby matches");
        }
        Ok(report)
    }

    /// Like [`scan`](Self::scan), but for loosely typed SOS documents keyed by id.
    ///
    /// Documents that do not decode as an SOS are counted as skipped.
    pub fn scan_json(
        &self,
        listener: &GeoPoint,
        documents: &serde_json::Map<String, serde_json::Value>,
        now: Timestamp,
    ) -> Result<AlertReport> {
        self.scan_values(listener, documents, now, SosDocument::from_value)
    }

    /// Like [`scan_json`](Self::scan_json), for user presence documents.
    ///
    /// `listener` is the SOS location; `notify` lists the users to alert.
    pub fn scan_presence_json(
        &self,
        listener: &GeoPoint,
        documents: &serde_json::Map<String, serde_json::Value>,
        now: Timestamp,
    ) -> Result<AlertReport> {
        self.scan_values(listener, documents, now, PresenceDocument::from_value)
    }

    fn scan_values<D, F>(
        &self,
        listener: &GeoPoint,
        documents: &serde_json::Map<String, serde_json::Value>,
        now: Timestamp,
        decode: F,
    ) -> Result<AlertReport>
    where
        D: MatchableDocument,
        F: Fn(&str, &serde_json::Value) -> Result<D>,
    {
        let mut decoded = Vec::with_capacity(documents.len());
        let mut undecodable = 0;

        for (id, value) in documents {
            match decode(id.as_str(), value) {
                Ok(document) => decoded.push((id.as_str(), document)),
                Err(e) => {
                    debug!(%id, error = %e, "skipping undecodable document");
                    undecodable += 1;
                }
            }
        }

        let mut report = self.scan(
            listener,
            decoded.iter().map(|(id, document)| (*id, document)),
            now,
        )?;
        report.skipped += undecodable;
        Ok(report)
    }
}
