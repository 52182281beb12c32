//! Error types for the ustar-threshold crate.

/// Error type for all fallible operations in the ustar-threshold crate.
///
/// These are the fatal errors, raised before any fitting starts. Failures
/// of individual fits are recorded as sentinel cells instead.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ThresholdError {
    /// Returned when the observation record is empty.
    #[error("observation record is empty")]
    EmptyData,

    /// Returned when an observation array differs in length from `time`.
    #[error("length mismatch: {field} has {got} values, expected {expected}")]
    LengthMismatch {
        /// Name of the offending array.
        field: &'static str,
        /// Length of `time`.
        expected: usize,
        /// Length of the offending array.
        got: usize,
    },

    /// Returned when too few valid nighttime points remain overall.
    #[error("insufficient data: {valid} valid points, need at least {min}")]
    InsufficientData {
        /// Valid nighttime points after filtering.
        valid: usize,
        /// Minimum required by the configuration.
        min: usize,
    },

    /// Returned when the engine configuration is invalid.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of the problem.
        reason: String,
    },

    /// Returned when a run cannot be serialized.
    #[error("serialization failed: {reason}")]
    Serialization {
        /// Underlying serializer message.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_empty_data() {
        assert_eq!(
            ThresholdError::EmptyData.to_string(),
            "observation record is empty"
        );
    }

    #[test]
    fn error_length_mismatch() {
        let e = ThresholdError::LengthMismatch {
            field: "nee",
            expected: 10,
            got: 9,
        };
        assert_eq!(
            e.to_string(),
            "length mismatch: nee has 9 values, expected 10"
        );
    }

    #[test]
    fn error_insufficient_data() {
        let e = ThresholdError::InsufficientData {
            valid: 120,
            min: 4000,
        };
        assert_eq!(
            e.to_string(),
            "insufficient data: 120 valid points, need at least 4000"
        );
    }

    #[test]
    fn error_invalid_config() {
        let e = ThresholdError::InvalidConfig {
            reason: "n_bins must be at least 1".into(),
        };
        assert_eq!(
            e.to_string(),
            "invalid configuration: n_bins must be at least 1"
        );
    }

    #[test]
    fn error_serialization() {
        let e = ThresholdError::Serialization {
            reason: "boom".into(),
        };
        assert_eq!(e.to_string(), "serialization failed: boom");
    }

    #[test]
    fn error_is_send_and_sync() {
        fn assert_impl<T: Send + Sync + std::error::Error>() {}
        assert_impl::<ThresholdError>();
    }
}
