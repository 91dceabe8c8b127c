//! Domain error types.
//!
//! These errors represent micro-format violations in individual SIRI
//! fields. They are distinct from transport and envelope errors.

/// A single field failed to decode into its domain representation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// A composite reference did not have five parts or carried the wrong type tag
    #[error("malformed {expected_tag} reference: {raw:?}")]
    MalformedReference { raw: String, expected_tag: String },

    /// A timestamp did not match `YYYY-MM-DDTHH:MM:SS.sss±HH:MM`
    #[error("malformed SIRI timestamp {raw:?}: {reason}")]
    MalformedTimestamp { raw: String, reason: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = DecodeError::MalformedReference {
            raw: "ILEVIA:Line:BP:L1:LOC".into(),
            expected_tag: "StopPoint".into(),
        };
        assert_eq!(
            err.to_string(),
            "malformed StopPoint reference: \"ILEVIA:Line:BP:L1:LOC\""
        );

        let err = DecodeError::MalformedTimestamp {
            raw: "2022-08-30".into(),
            reason: "unexpected length",
        };
        assert_eq!(
            err.to_string(),
            "malformed SIRI timestamp \"2022-08-30\": unexpected length"
        );
    }
}
