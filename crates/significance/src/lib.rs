//! # ustar-significance
//!
//! Converts a change-point F-max statistic into a significance probability
//! by interpolating tabulated critical values, with F-distribution
//! extrapolation beyond the table.
//!
//! ## Quick Start
//!
//! ```
//! use ustar_significance::{ModelKind, significance};
//!
//! let p = significance(12.0, 50.0, ModelKind::TwoParameter);
//! assert!(p < 0.01);
//! assert!(significance(12.0, 8.0, ModelKind::TwoParameter).is_nan());
//! ```
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `table` | Critical F-max tables and the significance evaluator |
//! | `pchip` | Shape-preserving piecewise cubic interpolation |
//! | `error` | Error types |

mod error;
mod pchip;
mod table;

pub use error::SignificanceError;
pub use pchip::Pchip;
pub use table::{
    CriticalValueTable, F_NUMERATOR_DF, MIN_SAMPLE_SIZE, ModelKind, UPPER_REFERENCE,
    significance,
};
