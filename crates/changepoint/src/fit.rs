//! Change-point search over binned (u*, NEE) means.
//!
//! Both models are fitted by exhaustive search over candidate breakpoints
//! taken from the bin u* values themselves:
//!
//! - two-parameter: `NEE = b0 + b1 * min(u*, cp)`, null model the mean;
//! - three-parameter: `NEE = b0 + b1 * u* + c2 * max(u* - cp, 0)`, null
//!   model a single straight line.
//!
//! The candidate with the largest F statistic wins, and its probability of
//! arising by chance comes from the critical-value tables in
//! [`ustar_significance`].

use statrs::distribution::{ContinuousCDF, StudentsT};
use tracing::debug;
use ustar_significance::{ModelKind, significance};

use crate::error::FitError;
use crate::ols::{OlsFit, least_squares, line};
use crate::result::ChangePointResult;

/// Fewest bins a fit accepts, before and after outlier screening.
pub const MIN_BINS: usize = 10;

/// Extra parameters of each full model over its null model.
const EXTRA_PARAMS: f64 = 1.0;

/// Two-sided coverage of the coefficient confidence half-widths.
const COEF_CI_LEVEL: f64 = 0.95;

/// Tuning of the change-point search.
#[derive(Debug, Clone, PartialEq)]
pub struct FitOptions {
    outlier_sd: f64,
    end_points_min: usize,
    end_points_frac: f64,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            outlier_sd: 4.0,
            end_points_min: 3,
            end_points_frac: 0.05,
        }
    }
}

impl FitOptions {
    /// Default options: 4-SD outlier screen, at least 3 or 5% of the bins
    /// held back at each end of the search.
    pub fn new() -> Self {
        Self::default()
    }

    /// Residual SDs beyond which a bin is dropped. `f64::INFINITY` disables
    /// the screen.
    pub fn with_outlier_sd(mut self, sd: f64) -> Self {
        self.outlier_sd = sd;
        self
    }

    /// Minimum number of bins excluded from the search at each end.
    pub fn with_end_points_min(mut self, n: usize) -> Self {
        self.end_points_min = n;
        self
    }

    /// Fraction of bins excluded from the search at each end.
    pub fn with_end_points_frac(mut self, frac: f64) -> Self {
        self.end_points_frac = frac;
        self
    }

    pub fn outlier_sd(&self) -> f64 {
        self.outlier_sd
    }

    pub fn end_points_min(&self) -> usize {
        self.end_points_min
    }

    pub fn end_points_frac(&self) -> f64 {
        self.end_points_frac
    }

    /// Bins held back at each end when searching `n` bins.
    pub fn end_points(&self, n: usize) -> usize {
        let frac = (self.end_points_frac * n as f64).floor();
        let frac = if frac.is_finite() && frac > 0.0 { frac as usize } else { 0 };
        self.end_points_min.max(frac)
    }
}

/// Bins sorted by u* after outlier screening.
#[derive(Debug, Clone)]
struct Screened {
    x: Vec<f64>,
    y: Vec<f64>,
}

fn screen(x: &[f64], y: &[f64], opts: &FitOptions) -> Result<Screened, FitError> {
    if x.len() != y.len() {
        return Err(FitError::LengthMismatch {
            x: x.len(),
            y: y.len(),
        });
    }
    let mut pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y)
        .filter(|(a, b)| a.is_finite() && b.is_finite())
        .map(|(&a, &b)| (a, b))
        .collect();
    if pairs.len() < MIN_BINS {
        return Err(FitError::TooFewBins {
            n: pairs.len(),
            min: MIN_BINS,
        });
    }
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
    let (mut x, mut y): (Vec<f64>, Vec<f64>) = pairs.into_iter().unzip();

    if opts.outlier_sd.is_finite() {
        let fit = line(&x, &y).ok_or(FitError::Singular)?;
        let resid: Vec<f64> = x
            .iter()
            .zip(&y)
            .map(|(&xi, &yi)| yi - fit.coef[0] - fit.coef[1] * xi)
            .collect();
        let mean = ustar_stats::mean(&resid);
        let sd = ustar_stats::sd(&resid);
        let scale = 1.0 + ustar_stats::mean(&y.iter().map(|v| v.abs()).collect::<Vec<_>>());
        if sd > 1e-12 * scale {
            let keep: Vec<bool> = resid
                .iter()
                .map(|r| (r - mean).abs() <= opts.outlier_sd * sd)
                .collect();
            let dropped = keep.iter().filter(|k| !**k).count();
            if dropped > 0 {
                debug!(dropped, "outlier bins removed");
                (x, y) = x
                    .iter()
                    .zip(&y)
                    .zip(&keep)
                    .filter(|(_, k)| **k)
                    .map(|((&a, &b), _)| (a, b))
                    .unzip();
            }
        }
        if x.len() < MIN_BINS {
            return Err(FitError::TooFewBins {
                n: x.len(),
                min: MIN_BINS,
            });
        }
    }
    Ok(Screened { x, y })
}

/// F statistic of a full model with `p_full` coefficients against its null.
fn f_statistic(sse_null: f64, sse_full: f64, n: usize, p_full: usize) -> f64 {
    let gain = sse_null - sse_full;
    if !(gain > 0.0) {
        return 0.0;
    }
    if sse_full <= f64::EPSILON * sse_null {
        return f64::INFINITY;
    }
    (gain / EXTRA_PARAMS) / (sse_full / (n - p_full) as f64)
}

fn hinge_fit(s: &Screened, cp: f64, kind: ModelKind) -> Option<HingeFit> {
    let n = s.x.len();
    let x = &s.x;
    match kind {
        ModelKind::TwoParameter => {
            least_squares(n, |j| [1.0, x[j].min(cp)], &s.y).map(HingeFit::Two)
        }
        ModelKind::ThreeParameter => least_squares(n, |j| [1.0, x[j], (x[j] - cp).max(0.0)], &s.y)
            .map(HingeFit::Three),
    }
}

enum HingeFit {
    Two(OlsFit<2>),
    Three(OlsFit<3>),
}

impl HingeFit {
    fn sse(&self) -> f64 {
        match self {
            HingeFit::Two(f) => f.sse,
            HingeFit::Three(f) => f.sse,
        }
    }
}

fn search(s: &Screened, kind: ModelKind, opts: &FitOptions) -> Result<ChangePointResult, FitError> {
    let n = s.x.len();
    let p_full = kind.n_params();

    let sse_null = match kind {
        ModelKind::TwoParameter => {
            let m = ustar_stats::mean(&s.y);
            s.y.iter().map(|v| (v - m) * (v - m)).sum()
        }
        ModelKind::ThreeParameter => line(&s.x, &s.y).ok_or(FitError::Singular)?.sse,
    };

    let margin = opts.end_points(n).max(1);
    if n < 2 * margin + 1 {
        return Err(FitError::NoCandidates { n, margin });
    }

    // Candidate i leaves `margin` bins at or below it and `margin` above.
    let mut best: Option<(usize, f64)> = None;
    for i in (margin - 1)..(n - margin) {
        let Some(fit) = hinge_fit(s, s.x[i], kind) else {
            continue;
        };
        let f = f_statistic(sse_null, fit.sse(), n, p_full);
        if best.is_none_or(|(_, fb)| f > fb) {
            best = Some((i, f));
        }
    }
    let (i, fmax) = best.ok_or(FitError::Singular)?;
    let cp = s.x[i];
    let fit = hinge_fit(s, cp, kind).ok_or(FitError::Singular)?;

    let t_crit = StudentsT::new(0.0, 1.0, (n - p_full) as f64)
        .map(|t| t.inverse_cdf(0.5 + COEF_CI_LEVEL / 2.0))
        .unwrap_or(f64::NAN);
    let p = significance(fmax, n as f64, kind);

    let result = match fit {
        HingeFit::Two(f) => {
            let se = f.std_errors(n);
            ChangePointResult::fitted(
                n,
                cp,
                fmax,
                p,
                [f.coef[0], f.coef[1], 0.0, f64::NAN],
                [t_crit * se[0], t_crit * se[1], f64::NAN],
            )
        }
        HingeFit::Three(f) => {
            let se = f.std_errors(n);
            ChangePointResult::fitted(
                n,
                cp,
                fmax,
                p,
                [f.coef[0], f.coef[1], f.coef[1] + f.coef[2], f.coef[2]],
                [t_crit * se[0], t_crit * se[1], t_crit * se[2]],
            )
        }
    };
    Ok(result)
}

/// Fits one model to bin means `x` (u*) and `y` (NEE).
///
/// Non-finite pairs are ignored and the bins need not be sorted.
///
/// # Errors
///
/// | Variant | Trigger |
/// |---------|---------|
/// | [`FitError::LengthMismatch`] | `x.len() != y.len()` |
/// | [`FitError::TooFewBins`] | fewer than [`MIN_BINS`] usable bins |
/// | [`FitError::NoCandidates`] | end margins consume every bin |
/// | [`FitError::Singular`] | no candidate yields a solvable regression |
pub fn try_fit(
    x: &[f64],
    y: &[f64],
    kind: ModelKind,
    opts: &FitOptions,
) -> Result<ChangePointResult, FitError> {
    let screened = screen(x, y, opts)?;
    search(&screened, kind, opts)
}

/// Fits both models to the same screened bins.
///
/// Returns `(two_parameter, three_parameter)`; the two models fail
/// independently.
pub fn try_fit_both(
    x: &[f64],
    y: &[f64],
    opts: &FitOptions,
) -> (
    Result<ChangePointResult, FitError>,
    Result<ChangePointResult, FitError>,
) {
    match screen(x, y, opts) {
        Ok(s) => (
            search(&s, ModelKind::TwoParameter, opts),
            search(&s, ModelKind::ThreeParameter, opts),
        ),
        Err(e) => (Err(e.clone()), Err(e)),
    }
}

/// Like [`try_fit`], but returns the sentinel on failure.
pub fn fit(x: &[f64], y: &[f64], kind: ModelKind, opts: &FitOptions) -> ChangePointResult {
    try_fit(x, y, kind, opts).unwrap_or_else(|e| {
        debug!(error = %e, ?kind, "change-point fit failed");
        ChangePointResult::sentinel()
    })
}
