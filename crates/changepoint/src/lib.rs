//! Piecewise-linear change-point fitting of nighttime NEE against u*.
//!
//! Given bin means of u* and NEE for one temperature stratum, [`try_fit`]
//! searches every admissible breakpoint for the two-parameter model (NEE
//! rising with u* up to the breakpoint, flat above it) or the diagnostic
//! three-parameter model (free slopes on both sides), and reports the
//! breakpoint, its F-max statistic, significance and coefficients as a
//! [`ChangePointResult`].
//!
//! ```
//! use ustar_changepoint::{FitOptions, ModelKind, try_fit};
//!
//! let x: Vec<f64> = (1..=40).map(|i| i as f64 * 0.02).collect();
//! let y: Vec<f64> = x.iter().map(|&u| 3.0 * u.min(0.4)).collect();
//! let r = try_fit(&x, &y, ModelKind::TwoParameter, &FitOptions::default()).unwrap();
//! assert!((r.cp() - 0.4).abs() < 1e-9);
//! ```

mod error;
mod fit;
mod ols;
mod result;

pub use error::FitError;
pub use fit::{FitOptions, MIN_BINS, fit, try_fit, try_fit_both};
pub use result::{ChangePointResult, StatField, StratumSummary};
pub use ustar_significance::ModelKind;
