//! Error types for the ustar-significance crate.

/// Error type for all fallible operations in the ustar-significance crate.
///
/// Evaluating a significance probability never fails (it returns `NaN`);
/// these variants cover building interpolants and custom critical tables.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SignificanceError {
    /// Returned when an interpolant is given fewer than two knots.
    #[error("interpolation needs at least 2 points, got {n}")]
    TooFewPoints {
        /// Number of knots supplied.
        n: usize,
    },

    /// Returned when knot abscissae and ordinates differ in length.
    #[error("length mismatch: {x} abscissae, {y} ordinates")]
    LengthMismatch {
        /// Number of abscissae.
        x: usize,
        /// Number of ordinates.
        y: usize,
    },

    /// Returned when abscissae are not finite and strictly increasing.
    #[error("{what} must be finite and strictly increasing")]
    NotIncreasing {
        /// Which sequence failed the check.
        what: &'static str,
    },

    /// Returned when a critical table is malformed.
    #[error("invalid critical table: {reason}")]
    InvalidTable {
        /// Description of the problem.
        reason: String,
    },
}
