//! Store document shapes
//!
//! The presence upload writes a [`PresenceDocument`] for each user, the
//! SOS trigger writes an [`SosDocument`]. Both embed a [`LocationDocument`]
//! and use camelCase field names. Documents are read back loosely typed so
//! that a single bad record surfaces as [`SafeZoneError::MalformedCandidate`]
//! instead of failing a whole batch.

use crate::error::{Result, SafeZoneError};
use crate::geohash::{DEFAULT_PRECISION, Geohash, GeohashCodec};
use crate::spatial::GeoPoint;
use crate::types::{CandidateRecord, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A stored document that can take part in proximity matching.
pub trait MatchableDocument {
    /// Whether the document should be matched at all.
    fn is_active(&self) -> bool;

    /// Convert to a candidate record keyed by the document `id`.
    fn to_candidate(&self, id: &str) -> Result<CandidateRecord>;
}

/// Location fix as stored: raw coordinates, their geohash and the reported
/// accuracy in meters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationDocument {
    pub latitude: f64,
    pub longitude: f64,
    pub geohash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f32>,
}

impl LocationDocument {
    /// Build the stored form of a fix, hashing at [`DEFAULT_PRECISION`].
    pub fn from_fix(point: &GeoPoint, accuracy: Option<f32>) -> Result<Self> {
        let geohash = GeohashCodec::encode(point, DEFAULT_PRECISION)?;
        Ok(Self {
            latitude: point.lat(),
            longitude: point.lon(),
            geohash: geohash.into(),
            accuracy,
        })
    }

    /// Validate coordinates and geohash, attributing failures to `id`.
    pub fn point_and_geohash(&self, id: &str) -> Result<(GeoPoint, Geohash)> {
        let point = GeoPoint::new(self.latitude, self.longitude).map_err(|_| {
            SafeZoneError::malformed(
                id,
                format!("invalid coordinates ({}, {})", self.latitude, self.longitude),
            )
        })?;
        let geohash = Geohash::parse(&self.geohash)
            .map_err(|e| SafeZoneError::malformed(id, e.to_string()))?;
        Ok((point, geohash))
    }

    /// Convert to a candidate created at `timestamp`.
    pub fn to_candidate(&self, id: &str, timestamp: Timestamp) -> Result<CandidateRecord> {
        let (point, geohash) = self.point_and_geohash(id)?;
        Ok(CandidateRecord::new(id, point, geohash, timestamp))
    }
}

/// Lifecycle of an SOS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SosStatus {
    Active,
    Resolved,
    Cancelled,
}

impl SosStatus {
    /// Whether listeners should still alert on this SOS.
    pub fn is_active(&self) -> bool {
        matches!(self, SosStatus::Active)
    }
}

impl fmt::Display for SosStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SosStatus::Active => "active",
            SosStatus::Resolved => "resolved",
            SosStatus::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// An SOS as stored in the shared `sos` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SosDocument {
    pub user_id: String,
    pub timestamp: Timestamp,
    pub status: SosStatus,
    /// Free-form alert type chosen by the sender
    #[serde(default)]
    pub message: String,
    pub location: LocationDocument,
    #[serde(default)]
    pub responders: Vec<String>,
    #[serde(default)]
    pub response_count: u32,
}

impl SosDocument {
    /// A fresh, active SOS raised by `user_id` at `point`.
    pub fn trigger(
        user_id: impl Into<String>,
        message: impl Into<String>,
        point: &GeoPoint,
        accuracy: Option<f32>,
        now: Timestamp,
    ) -> Result<Self> {
        Ok(Self {
            user_id: user_id.into(),
            timestamp: now,
            status: SosStatus::Active,
            message: message.into(),
            location: LocationDocument::from_fix(point, accuracy)?,
            responders: Vec::new(),
            response_count: 0,
        })
    }

    /// Record `responder` answering this SOS. Repeat responses are ignored.
    pub fn add_responder(&mut self, responder: impl Into<String>) -> bool {
        let responder = responder.into();
        if self.responders.contains(&responder) {
            return false;
        }
        self.responders.push(responder);
        self.response_count = self.responders.len() as u32;
        true
    }

    pub fn resolve(&mut self) {
        self.status = SosStatus::Resolved;
    }

    pub fn cancel(&mut self) {
        self.status = SosStatus::Cancelled;
    }

    /// Decode a loosely typed store document.
    pub fn from_value(id: &str, value: &serde_json::Value) -> Result<Self> {
        Self::deserialize(value).map_err(|e| SafeZoneError::malformed(id, e.to_string()))
    }
}

impl MatchableDocument for SosDocument {
    fn is_active(&self) -> bool {
        self.status.is_active()
    }

    fn to_candidate(&self, id: &str) -> Result<CandidateRecord> {
        self.location.to_candidate(id, self.timestamp)
    }
}

/// A user's last reported position, refreshed by the periodic presence upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceDocument {
    pub location: LocationDocument,
    /// When the position was reported
    pub last_seen: Timestamp,
    #[serde(default)]
    pub is_active: bool,
    /// Push token for delivering alerts to this user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fcm_token: Option<String>,
}

impl PresenceDocument {
    /// The document written by a presence upload at `now`.
    pub fn report(
        point: &GeoPoint,
        accuracy: Option<f32>,
        fcm_token: Option<String>,
        now: Timestamp,
    ) -> Result<Self> {
        Ok(Self {
            location: LocationDocument::from_fix(point, accuracy)?,
            last_seen: now,
            is_active: true,
            fcm_token,
        })
    }

    /// Stop matching this user until the next upload.
    pub fn deactivate(&mut self) {
        self.is_active = false;
    }

    /// Decode a loosely typed store document.
    pub fn from_value(id: &str, value: &serde_json::Value) -> Result<Self> {
        Self::deserialize(value).map_err(|e| SafeZoneError::malformed(id, e.to_string()))
    }
}

impl MatchableDocument for PresenceDocument {
    fn is_active(&self) -> bool {
        self.is_active
    }

    fn to_candidate(&self, id: &str) -> Result<CandidateRecord> {
        self.location.to_candidate(id, self.last_seen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sf() -> GeoPoint {
        GeoPoint::new(37.7749, -122.4194).unwrap()
    }

    #[test]
    fn test_location_from_fix() {
        let doc = LocationDocument::from_fix(&sf(), Some(12.5)).unwrap();
        assert_eq!(doc.geohash, "9q8yyk8y");
        assert_eq!(doc.accuracy, Some(12.5));

        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(
            value,
            json!({
                "latitude": 37.7749,
                "longitude": -122.4194,
                "geohash": "9q8yyk8y",
                "accuracy": 12.5
            })
        );
    }

    #[test]
    fn test_location_without_accuracy() {
        let doc: LocationDocument = serde_json::from_value(json!({
            "latitude": 37.7749,
            "longitude": -122.4194,
            "geohash": "9q8yyk8y"
        }))
        .unwrap();
        assert_eq!(doc.accuracy, None);
        assert!(!serde_json::to_string(&doc).unwrap().contains("accuracy"));
    }

    #[test]
    fn test_malformed_location() {
        let mut doc = LocationDocument::from_fix(&sf(), None).unwrap();
        doc.latitude = f64::NAN;
        assert!(matches!(
            doc.to_candidate("x", Timestamp::from_millis(0)),
            Err(SafeZoneError::MalformedCandidate { ref id, .. }) if id == "x"
        ));

        let mut doc = LocationDocument::from_fix(&sf(), None).unwrap();
        doc.geohash = "not-a-hash".to_string();
        assert!(matches!(
            doc.to_candidate("y", Timestamp::from_millis(0)),
            Err(SafeZoneError::MalformedCandidate { .. })
        ));
    }

    #[test]
    fn test_sos_trigger_and_lifecycle() {
        let now = Timestamp::from_millis(1_700_000_000_000);
        let mut sos = SosDocument::trigger("user-1", "medical", &sf(), None, now).unwrap();

        assert!(sos.status.is_active());
        assert_eq!(sos.response_count, 0);

        assert!(sos.add_responder("user-2"));
        assert!(!sos.add_responder("user-2"));
        assert!(sos.add_responder("user-3"));
        assert_eq!(sos.response_count, 2);

        sos.resolve();
        assert_eq!(sos.status, SosStatus::Resolved);
        assert!(!sos.status.is_active());
        sos.cancel();
        assert_eq!(sos.status.to_string(), "cancelled");

        let candidate = sos.to_candidate("sos-1").unwrap();
        assert_eq!(candidate.id, "sos-1");
        assert_eq!(candidate.timestamp, now);
        assert_eq!(candidate.geohash.as_str(), "9q8yyk8y");
    }

    #[test]
    fn test_sos_json_shape() {
        let value = json!({
            "userId": "user-1",
            "timestamp": 1_700_000_000_000i64,
            "status": "active",
            "message": "help",
            "location": {
                "latitude": 37.7749,
                "longitude": -122.4194,
                "geohash": "9q8yyk8y",
                "accuracy": 5.0
            },
            "responders": [],
            "responseCount": 0
        });

        let sos = SosDocument::from_value("sos-1", &value).unwrap();
        assert_eq!(sos.user_id, "user-1");
        assert_eq!(sos.status, SosStatus::Active);
        assert_eq!(serde_json::to_value(&sos).unwrap(), value);
    }

    #[test]
    fn test_sos_from_bad_value() {
        let err = SosDocument::from_value("sos-9", &json!({ "status": "unknown" })).unwrap_err();
        assert!(matches!(err, SafeZoneError::MalformedCandidate { ref id, .. } if id == "sos-9"));
    }

    #[test]
    fn test_presence_report() {
        let now = Timestamp::from_millis(1_700_000_000_000);
        let mut presence =
            PresenceDocument::report(&sf(), Some(20.0), Some("token-1".to_string()), now).unwrap();

        assert!(MatchableDocument::is_active(&presence));
        let candidate = presence.to_candidate("user-1").unwrap();
        assert_eq!(candidate.id, "user-1");
        assert_eq!(candidate.timestamp, now);
        assert_eq!(candidate.geohash.as_str(), "9q8yyk8y");

        presence.deactivate();
        assert!(!MatchableDocument::is_active(&presence));
    }

    #[test]
    fn test_presence_json_shape() {
        let value = json!({
            "location": {
                "latitude": 37.7749,
                "longitude": -122.4194,
                "geohash": "9q8yyk8y",
                "accuracy": 20.0
            },
            "lastSeen": 1_700_000_000_000i64,
            "isActive": true,
            "fcmToken": "token-1"
        });

        let presence = PresenceDocument::from_value("user-1", &value).unwrap();
        assert_eq!(presence.last_seen, Timestamp::from_millis(1_700_000_000_000));
        assert_eq!(presence.fcm_token.as_deref(), Some("token-1"));
        assert_eq!(serde_json::to_value(&presence).unwrap(), value);

        // Users who never uploaded a token and have no activity flag
        let bare = PresenceDocument::from_value(
            "user-2",
            &json!({
                "location": value["location"].clone(),
                "lastSeen": 0
            }),
        )
        .unwrap();
        assert!(!bare.is_active);
        assert_eq!(bare.fcm_token, None);

        assert!(matches!(
            PresenceDocument::from_value("user-3", &json!({ "isActive": true })),
            Err(SafeZoneError::MalformedCandidate { ref id, .. }) if id == "user-3"
        ));
    }
}
