//! Composite SIRI references.
//!
//! Suppliers transmit stop points and lines as five colon-separated
//! segments, e.g. `ILEVIA:StopPoint:BP:CAS001:LOC`. Only the fourth segment
//! identifies the object; the others are supplier bookkeeping (network,
//! type tag, space, locale).

use std::fmt;

use serde::Serialize;

use super::DecodeError;

/// Type tag carried by stop-point references.
pub const STOP_POINT_TAG: &str = "StopPoint";

/// Type tag carried by line references.
pub const LINE_TAG: &str = "Line";

const REF_PARTS: usize = 5;

/// Decode a composite reference into its short identifier.
///
/// The input must have exactly five colon-separated parts and the second
/// part must equal `expected_type_tag`.
///
/// # Examples
///
/// ```
/// use siri_sm::domain::decode_composite_ref;
///
/// let id = decode_composite_ref("ILEVIA:StopPoint:BP:CAS001:LOC", "StopPoint").unwrap();
/// assert_eq!(id, "CAS001");
///
/// // Wrong type tag
/// assert!(decode_composite_ref("ILEVIA:Line:BP:L1:LOC", "StopPoint").is_err());
///
/// // Wrong arity
/// assert!(decode_composite_ref("ILEVIA:StopPoint:CAS001", "StopPoint").is_err());
/// ```
pub fn decode_composite_ref(raw: &str, expected_type_tag: &str) -> Result<String, DecodeError> {
    let parts: Vec<&str> = raw.split(':').collect();

    if parts.len() != REF_PARTS || parts[1] != expected_type_tag {
        return Err(DecodeError::MalformedReference {
            raw: raw.to_string(),
            expected_tag: expected_type_tag.to_string(),
        });
    }

    Ok(parts[3].to_string())
}

/// Error returned when a short stop-point identifier is unusable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid stop point id {value:?}: {reason}")]
pub struct InvalidStopPointId {
    value: String,
    reason: &'static str,
}

/// The short identifier of a stop point (e.g. `CAS001`).
///
/// Values decoded from the wire keep only the fourth segment of the
/// composite reference. Values built by hand must be non-empty and free of
/// colons so they can be re-embedded in a composite reference.
#[derive(Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct StopPointId(String);

impl StopPointId {
    /// Create a stop point id from a short identifier.
    pub fn new(s: impl Into<String>) -> Result<Self, InvalidStopPointId> {
        let value = s.into();
        if value.is_empty() {
            return Err(InvalidStopPointId {
                value,
                reason: "must not be empty",
            });
        }
        if value.contains(':') {
            return Err(InvalidStopPointId {
                value,
                reason: "must not contain ':'",
            });
        }
        Ok(StopPointId(value))
    }

    /// Decode from a composite `…:StopPoint:…` reference.
    pub fn decode(raw: &str) -> Result<Self, DecodeError> {
        decode_composite_ref(raw, STOP_POINT_TAG).map(StopPointId)
    }

    /// Render the composite reference used by the supplier `network`.
    ///
    /// ```
    /// use siri_sm::domain::StopPointId;
    ///
    /// let stop = StopPointId::new("CAS001").unwrap();
    /// assert_eq!(stop.to_composite("ILEVIA"), "ILEVIA:StopPoint:BP:CAS001:LOC");
    /// ```
    pub fn to_composite(&self, network: &str) -> String {
        format!("{network}:{STOP_POINT_TAG}:BP:{}:LOC", self.0)
    }

    /// Returns the short identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for StopPointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StopPointId({})", self.0)
    }
}

impl fmt::Display for StopPointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The short identifier of a line (e.g. `L1`).
#[derive(Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct LineId(String);

impl LineId {
    /// Decode from a composite `…:Line:…` reference.
    pub fn decode(raw: &str) -> Result<Self, DecodeError> {
        decode_composite_ref(raw, LINE_TAG).map(LineId)
    }

    /// Returns the short identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LineId({})", self.0)
    }
}

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
