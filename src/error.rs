use thiserror::Error;

/// Error types for safezone
#[derive(Debug, Error)]
pub enum SafeZoneError {
    /// Latitude or longitude out of range, or not finite
    #[error("Invalid coordinate ({lat}, {lon}): latitude must be within [-90, 90] and longitude within [-180, 180]")]
    InvalidCoordinate { lat: f64, lon: f64 },
    /// Geohash precision is zero or larger than the supported maximum
    #[error("Invalid geohash precision {0} (must be between 1 and {max})", max = crate::geohash::MAX_PRECISION)]
    InvalidPrecision(usize),
    /// Non-positive radius or TTL, or another rejected query parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    /// Geohash string contains characters outside the base-32 alphabet
    #[error("Invalid geohash '{0}'")]
    InvalidGeohash(String),
    /// Candidate record that cannot be classified; never fatal to a match
    #[error("Malformed candidate '{id}': {reason}")]
    MalformedCandidate { id: String, reason: String },
    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// Configuration could not be parsed
    #[error("Configuration error: {0}")]
    Config(String),
    /// I/O error while reading configuration
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SafeZoneError {
    pub(crate) fn malformed(id: impl Into<String>, reason: impl Into<String>) -> Self {
        SafeZoneError::MalformedCandidate {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error rejects the whole call, as opposed to a single skipped record.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, SafeZoneError::MalformedCandidate { .. })
    }
}

/// Result type alias for safezone operations
pub type Result<T> = std::result::Result<T, SafeZoneError>;
