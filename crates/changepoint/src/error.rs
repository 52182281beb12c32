//! Error types for the ustar-changepoint crate.

/// Error type for a single change-point fit.
///
/// Every variant is a soft failure: the engine records the affected cell as
/// the sentinel result and carries on.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FitError {
    /// Returned when the x and y slices differ in length.
    #[error("length mismatch: {x} u* values, {y} NEE values")]
    LengthMismatch {
        /// Number of u* values.
        x: usize,
        /// Number of NEE values.
        y: usize,
    },

    /// Returned when too few usable bins remain.
    #[error("too few bins: got {n}, need at least {min}")]
    TooFewBins {
        /// Usable bins.
        n: usize,
        /// Minimum required.
        min: usize,
    },

    /// Returned when the end-point margins leave no candidate breakpoint.
    #[error("no candidate breakpoints among {n} points with {margin} reserved at each end")]
    NoCandidates {
        /// Usable points.
        n: usize,
        /// Points reserved at each end of the search.
        margin: usize,
    },

    /// Returned when every candidate regression is singular.
    #[error("regression is singular")]
    Singular,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_length_mismatch() {
        let e = FitError::LengthMismatch { x: 4, y: 5 };
        assert_eq!(e.to_string(), "length mismatch: 4 u* values, 5 NEE values");
    }

    #[test]
    fn error_too_few_bins() {
        let e = FitError::TooFewBins { n: 7, min: 10 };
        assert_eq!(e.to_string(), "too few bins: got 7, need at least 10");
    }

    #[test]
    fn error_no_candidates() {
        let e = FitError::NoCandidates { n: 10, margin: 5 };
        assert_eq!(
            e.to_string(),
            "no candidate breakpoints among 10 points with 5 reserved at each end"
        );
    }

    #[test]
    fn error_singular() {
        assert_eq!(FitError::Singular.to_string(), "regression is singular");
    }

    #[test]
    fn error_is_std_error() {
        fn assert_impl<T: std::error::Error + Send + Sync>() {}
        assert_impl::<FitError>();
    }
}
