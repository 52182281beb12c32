//! Per-cell fit record and its typed field accessor.

use serde::Serialize;

/// Named statistic of a [`ChangePointResult`].
///
/// Used to pull one statistic across a whole result grid for export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatField {
    /// Number of bins used in the fit.
    N,
    /// Breakpoint u*.
    Cp,
    /// Maximum F statistic over the candidate breakpoints.
    Fmax,
    /// Significance probability of `Fmax`.
    P,
    /// Intercept of the lower segment.
    B0,
    /// Slope of the lower segment.
    B1,
    /// Slope of the upper segment.
    B2,
    /// Change in slope at the breakpoint (three-parameter model only).
    C2,
    /// Confidence half-width of `B0`.
    CiB0,
    /// Confidence half-width of `B1`.
    CiB1,
    /// Confidence half-width of `C2`.
    CiC2,
    /// Mean time of the stratum.
    MeanTime,
    /// First time of the stratum.
    StartTime,
    /// Last time of the stratum.
    EndTime,
    /// Pearson correlation of u* with temperature in the stratum.
    RUstarT,
    /// Two-sided p-value of `RUstarT`.
    PUstarT,
    /// Mean temperature of the stratum.
    MeanTemp,
    /// Half-width of the central 95% temperature range.
    CiTemp,
}

impl StatField {
    /// Every field in declaration order.
    pub const ALL: [StatField; 18] = [
        StatField::N,
        StatField::Cp,
        StatField::Fmax,
        StatField::P,
        StatField::B0,
        StatField::B1,
        StatField::B2,
        StatField::C2,
        StatField::CiB0,
        StatField::CiB1,
        StatField::CiC2,
        StatField::MeanTime,
        StatField::StartTime,
        StatField::EndTime,
        StatField::RUstarT,
        StatField::PUstarT,
        StatField::MeanTemp,
        StatField::CiTemp,
    ];

    /// Snake-case name, as used in JSON output.
    pub fn name(self) -> &'static str {
        match self {
            StatField::N => "n",
            StatField::Cp => "cp",
            StatField::Fmax => "fmax",
            StatField::P => "p",
            StatField::B0 => "b0",
            StatField::B1 => "b1",
            StatField::B2 => "b2",
            StatField::C2 => "c2",
            StatField::CiB0 => "ci_b0",
            StatField::CiB1 => "ci_b1",
            StatField::CiC2 => "ci_c2",
            StatField::MeanTime => "mean_time",
            StatField::StartTime => "start_time",
            StatField::EndTime => "end_time",
            StatField::RUstarT => "r_ustar_t",
            StatField::PUstarT => "p_ustar_t",
            StatField::MeanTemp => "mean_temp",
            StatField::CiTemp => "ci_temp",
        }
    }
}

/// Descriptive statistics of the observations in one temperature stratum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StratumSummary {
    mean_time: f64,
    start_time: f64,
    end_time: f64,
    r_ustar_t: f64,
    p_ustar_t: f64,
    mean_temp: f64,
    ci_temp: f64,
}

impl StratumSummary {
    /// Summarises a stratum from its times, u* and temperatures.
    ///
    /// Statistics that cannot be computed (empty input, constant u*) are `NaN`.
    pub fn from_points(time: &[f64], ustar: &[f64], temp: &[f64]) -> Self {
        let (r_ustar_t, p_ustar_t) =
            ustar_stats::correlation_test(ustar, temp).unwrap_or((f64::NAN, f64::NAN));
        let t = ustar_stats::quantiles(temp, &[0.025, 0.975]);
        Self {
            mean_time: ustar_stats::mean(time),
            start_time: time.iter().copied().find(|v| !v.is_nan()).unwrap_or(f64::NAN),
            end_time: time.iter().rev().copied().find(|v| !v.is_nan()).unwrap_or(f64::NAN),
            r_ustar_t,
            p_ustar_t,
            mean_temp: ustar_stats::mean(temp),
            ci_temp: 0.5 * (t[1] - t[0]),
        }
    }

    /// Mean time of the stratum.
    pub fn mean_time(&self) -> f64 {
        self.mean_time
    }

    /// Mean temperature of the stratum.
    pub fn mean_temp(&self) -> f64 {
        self.mean_temp
    }
}

/// Outcome of one change-point fit for a (season, stratum, replicate) cell.
///
/// Every field is `NaN` in the sentinel value returned by
/// [`ChangePointResult::sentinel`]; a successful fit fills the regression
/// fields and the engine attaches the stratum summary.
///
/// The lower segment is `b0 + b1 * u*` for `u* <= cp`. Above the breakpoint
/// the line continues from `b0 + b1 * cp` with slope `b2`; for the
/// two-parameter model `b2` is zero and `c2`, `ci_c2` are `NaN`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChangePointResult {
    n: f64,
    cp: f64,
    fmax: f64,
    p: f64,
    b0: f64,
    b1: f64,
    b2: f64,
    c2: f64,
    ci_b0: f64,
    ci_b1: f64,
    ci_c2: f64,
    mean_time: f64,
    start_time: f64,
    end_time: f64,
    r_ustar_t: f64,
    p_ustar_t: f64,
    mean_temp: f64,
    ci_temp: f64,
}

impl Default for ChangePointResult {
    fn default() -> Self {
        Self::sentinel()
    }
}

impl ChangePointResult {
    /// The "no result" value: every field `NaN`.
    pub const fn sentinel() -> Self {
        Self {
            n: f64::NAN,
            cp: f64::NAN,
            fmax: f64::NAN,
            p: f64::NAN,
            b0: f64::NAN,
            b1: f64::NAN,
            b2: f64::NAN,
            c2: f64::NAN,
            ci_b0: f64::NAN,
            ci_b1: f64::NAN,
            ci_c2: f64::NAN,
            mean_time: f64::NAN,
            start_time: f64::NAN,
            end_time: f64::NAN,
            r_ustar_t: f64::NAN,
            p_ustar_t: f64::NAN,
            mean_temp: f64::NAN,
            ci_temp: f64::NAN,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn fitted(
        n: usize,
        cp: f64,
        fmax: f64,
        p: f64,
        coef: [f64; 4],
        ci: [f64; 3],
    ) -> Self {
        Self {
            n: n as f64,
            cp,
            fmax,
            p,
            b0: coef[0],
            b1: coef[1],
            b2: coef[2],
            c2: coef[3],
            ci_b0: ci[0],
            ci_b1: ci[1],
            ci_c2: ci[2],
            ..Self::sentinel()
        }
    }

    /// Returns a copy with the stratum statistics filled in.
    ///
    /// The sentinel stays a sentinel.
    pub fn with_stratum(self, s: &StratumSummary) -> Self {
        if !self.is_fitted() {
            return self;
        }
        Self {
            mean_time: s.mean_time,
            start_time: s.start_time,
            end_time: s.end_time,
            r_ustar_t: s.r_ustar_t,
            p_ustar_t: s.p_ustar_t,
            mean_temp: s.mean_temp,
            ci_temp: s.ci_temp,
            ..self
        }
    }

    /// Whether this cell holds a fit rather than the sentinel.
    pub fn is_fitted(&self) -> bool {
        !self.n.is_nan()
    }

    /// Whether the breakpoint is significant at `threshold`.
    ///
    /// `false` for the sentinel and for a `NaN` probability.
    pub fn is_significant(&self, threshold: f64) -> bool {
        self.p < threshold && !self.cp.is_nan()
    }

    /// Number of bins used in the fit, `NaN` for the sentinel.
    pub fn n(&self) -> f64 {
        self.n
    }

    /// Breakpoint u*.
    pub fn cp(&self) -> f64 {
        self.cp
    }

    /// Maximum F statistic.
    pub fn fmax(&self) -> f64 {
        self.fmax
    }

    /// Significance probability of the breakpoint.
    pub fn p(&self) -> f64 {
        self.p
    }

    /// Value of the named statistic.
    pub fn get(&self, field: StatField) -> f64 {
        match field {
            StatField::N => self.n,
            StatField::Cp => self.cp,
            StatField::Fmax => self.fmax,
            StatField::P => self.p,
            StatField::B0 => self.b0,
            StatField::B1 => self.b1,
            StatField::B2 => self.b2,
            StatField::C2 => self.c2,
            StatField::CiB0 => self.ci_b0,
            StatField::CiB1 => self.ci_b1,
            StatField::CiC2 => self.ci_c2,
            StatField::MeanTime => self.mean_time,
            StatField::StartTime => self.start_time,
            StatField::EndTime => self.end_time,
            StatField::RUstarT => self.r_ustar_t,
            StatField::PUstarT => self.p_ustar_t,
            StatField::MeanTemp => self.mean_temp,
            StatField::CiTemp => self.ci_temp,
        }
    }
}
