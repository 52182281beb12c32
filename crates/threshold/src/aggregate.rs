//! Seasonal and annual threshold estimates from the result grid.

use serde::Serialize;

use crate::config::{Central, EngineConfig};
use crate::result::Cell;

/// Outcome class of a threshold estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimateStatus {
    /// At least one significant change point was found.
    Ok,
    /// No stratum could be fitted (too few points, or none attempted).
    InsufficientData,
    /// Fits exist but none is significant.
    NotSignificant,
}

/// How many cells fed an estimate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SelectionDiagnostics {
    /// Cells in which a fit was tried.
    pub attempted: usize,
    /// Cells with a two-parameter fit.
    pub fitted: usize,
    /// Fitted cells with a significant breakpoint.
    pub significant: usize,
    /// `significant / fitted`, `NaN` when nothing was fitted.
    pub fraction: f64,
}

/// A u* threshold with its confidence interval.
///
/// `value`, `ci_low` and `ci_high` are `NaN` unless the status is
/// [`EstimateStatus::Ok`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ThresholdEstimate {
    status: EstimateStatus,
    value: f64,
    ci_low: f64,
    ci_high: f64,
    diagnostics: SelectionDiagnostics,
}

impl ThresholdEstimate {
    pub fn status(&self) -> EstimateStatus {
        self.status
    }

    /// The threshold, `None` unless the status is `Ok`.
    pub fn value(&self) -> Option<f64> {
        (self.status == EstimateStatus::Ok).then_some(self.value)
    }

    /// Confidence interval `(low, high)`, `None` unless the status is `Ok`.
    pub fn ci(&self) -> Option<(f64, f64)> {
        (self.status == EstimateStatus::Ok).then_some((self.ci_low, self.ci_high))
    }

    pub fn diagnostics(&self) -> &SelectionDiagnostics {
        &self.diagnostics
    }
}

/// Builds an estimate from the two-parameter fits in `cells`.
pub(crate) fn estimate<'a>(
    cells: impl IntoIterator<Item = &'a Cell>,
    config: &EngineConfig,
) -> ThresholdEstimate {
    let threshold = config.significance_threshold();
    let mut attempted = 0;
    let mut fitted = 0;
    let mut cps = Vec::new();
    for cell in cells {
        if !cell.attempted {
            continue;
        }
        attempted += 1;
        if !cell.two.is_fitted() {
            continue;
        }
        fitted += 1;
        if cell.two.is_significant(threshold) {
            cps.push(cell.two.cp());
        }
    }

    let diagnostics = SelectionDiagnostics {
        attempted,
        fitted,
        significant: cps.len(),
        fraction: if fitted > 0 {
            cps.len() as f64 / fitted as f64
        } else {
            f64::NAN
        },
    };
    let status = if fitted == 0 {
        EstimateStatus::InsufficientData
    } else if cps.is_empty() {
        EstimateStatus::NotSignificant
    } else {
        EstimateStatus::Ok
    };
    if status != EstimateStatus::Ok {
        return ThresholdEstimate {
            status,
            value: f64::NAN,
            ci_low: f64::NAN,
            ci_high: f64::NAN,
            diagnostics,
        };
    }

    let value = match config.central() {
        Central::Median => ustar_stats::median(&cps),
        Central::Mean => ustar_stats::mean(&cps),
    };
    let tail = (1.0 - config.ci_level()) / 2.0;
    let ci = ustar_stats::quantiles(&cps, &[tail, 1.0 - tail]);
    ThresholdEstimate {
        status,
        value,
        ci_low: ci[0],
        ci_high: ci[1],
        diagnostics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ustar_changepoint::{FitOptions, ModelKind, try_fit};

    fn fitted_cell(cp: f64, slope: f64) -> Cell {
        let x: Vec<f64> = (1..=30).map(|i| i as f64 * 0.02).collect();
        let y: Vec<f64> = x.iter().map(|&u| slope * u.min(cp)).collect();
        Cell {
            two: try_fit(&x, &y, ModelKind::TwoParameter, &FitOptions::default()).unwrap(),
            attempted: true,
            ..Cell::default()
        }
    }

    #[test]
    fn no_cells_is_insufficient() {
        let e = estimate(&[] as &[Cell], &EngineConfig::new());
        assert_eq!(e.status(), EstimateStatus::InsufficientData);
        assert_eq!(e.value(), None);
        assert_eq!(e.diagnostics().attempted, 0);
        assert!(e.diagnostics().fraction.is_nan());
    }

    #[test]
    fn attempted_but_unfitted_is_insufficient() {
        let cells = [Cell {
            attempted: true,
            ..Cell::default()
        }];
        let e = estimate(&cells, &EngineConfig::new());
        assert_eq!(e.status(), EstimateStatus::InsufficientData);
        assert_eq!(e.diagnostics().attempted, 1);
        assert_eq!(e.diagnostics().fitted, 0);
    }

    #[test]
    fn flat_fits_are_not_significant() {
        let cells = [fitted_cell(0.3, 0.0), fitted_cell(0.2, 0.0)];
        let e = estimate(&cells, &EngineConfig::new());
        assert_eq!(e.status(), EstimateStatus::NotSignificant);
        assert_eq!(e.value(), None);
        assert_eq!(e.ci(), None);
        assert_eq!(e.diagnostics().fitted, 2);
        assert_eq!(e.diagnostics().fraction, 0.0);
    }

    #[test]
    fn median_and_interval_of_significant_cps() {
        let cells: Vec<Cell> = [0.1, 0.2, 0.3, 0.4]
            .iter()
            .map(|&cp| fitted_cell(cp, 10.0))
            .chain(std::iter::once(fitted_cell(0.3, 0.0)))
            .chain(std::iter::once(Cell::default()))
            .collect();
        let e = estimate(&cells, &EngineConfig::new());
        assert_eq!(e.status(), EstimateStatus::Ok);
        assert_relative_eq!(e.value().unwrap(), 0.25, epsilon = 1e-9);
        let (lo, hi) = e.ci().unwrap();
        assert_relative_eq!(lo, 0.1, epsilon = 1e-9);
        assert_relative_eq!(hi, 0.4, epsilon = 1e-9);
        let d = e.diagnostics();
        assert_eq!((d.attempted, d.fitted, d.significant), (5, 5, 4));
        assert_relative_eq!(d.fraction, 0.8);
    }

    #[test]
    fn mean_central() {
        let cells: Vec<Cell> = [0.1, 0.2, 0.36].iter().map(|&cp| fitted_cell(cp, 5.0)).collect();
        let cfg = EngineConfig::new().with_central(Central::Mean);
        assert_relative_eq!(estimate(&cells, &cfg).value().unwrap(), 0.22, epsilon = 1e-9);
    }
}
