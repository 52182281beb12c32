//! Configuration for a threshold estimation run.

use std::time::Duration;

use serde::Serialize;
use ustar_changepoint::FitOptions;

use crate::error::ThresholdError;

/// How the record is divided into seasons.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeasonRule {
    /// Equal time spans over the whole record.
    #[default]
    EqualSpan,
    /// Equal numbers of valid nighttime points, in time order.
    EqualCount,
}

/// Central tendency used for a threshold estimate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Central {
    #[default]
    Median,
    Mean,
}

/// Configuration for [`estimate_threshold`](crate::estimate_threshold).
///
/// Use the builder methods to customise parameters.
///
/// # Example
///
/// ```
/// use ustar_threshold::{EngineConfig, SeasonRule};
///
/// let config = EngineConfig::new()
///     .with_n_boot(200)
///     .with_season_rule(SeasonRule::EqualCount)
///     .with_seed(42);
///
/// assert!(config.validate().is_ok());
/// assert_eq!(config.min_valid_points(), 4 * 4 * 50 * 5);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    n_seasons: usize,
    season_rule: SeasonRule,
    /// Fewest temperature strata per season.
    n_strata_min: usize,
    /// Most temperature strata per season; also the stratum extent of the grid.
    n_strata_max: usize,
    n_bins: usize,
    /// Minimum bin occupancy; smaller bins are dropped.
    n_per_bin: usize,
    n_boot: usize,
    significance_threshold: f64,
    seed: Option<u64>,
    /// Half-open `[low, high)` range of physically plausible u*.
    ustar_range: (f64, f64),
    fit: FitOptions,
    ci_level: f64,
    central: Central,
    deadline: Option<Duration>,
    parallel: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineConfig {
    /// Creates a configuration with the classic Barr et al. settings.
    ///
    /// Defaults: 4 equal-span seasons, 4 to 8 temperature strata, 50 bins of
    /// at least 5 points, 1000 replicates, significance 0.05, u* in
    /// `[0, 3)`, 95% interval around the median, parallel execution.
    pub fn new() -> Self {
        Self {
            n_seasons: 4,
            season_rule: SeasonRule::EqualSpan,
            n_strata_min: 4,
            n_strata_max: 8,
            n_bins: 50,
            n_per_bin: 5,
            n_boot: 1000,
            significance_threshold: 0.05,
            seed: None,
            ustar_range: (0.0, 3.0),
            fit: FitOptions::default(),
            ci_level: 0.95,
            central: Central::Median,
            deadline: None,
            parallel: true,
        }
    }

    pub fn with_n_seasons(mut self, n: usize) -> Self {
        self.n_seasons = n;
        self
    }

    pub fn with_season_rule(mut self, rule: SeasonRule) -> Self {
        self.season_rule = rule;
        self
    }

    /// Sets the allowed range of temperature strata per season.
    pub fn with_strata(mut self, min: usize, max: usize) -> Self {
        self.n_strata_min = min;
        self.n_strata_max = max;
        self
    }

    pub fn with_n_bins(mut self, n: usize) -> Self {
        self.n_bins = n;
        self
    }

    pub fn with_n_per_bin(mut self, n: usize) -> Self {
        self.n_per_bin = n;
        self
    }

    pub fn with_n_boot(mut self, n: usize) -> Self {
        self.n_boot = n;
        self
    }

    pub fn with_significance_threshold(mut self, p: f64) -> Self {
        self.significance_threshold = p;
        self
    }

    /// Fixes the run seed. Without one, a seed is drawn from the OS and
    /// reported with the results.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_ustar_range(mut self, low: f64, high: f64) -> Self {
        self.ustar_range = (low, high);
        self
    }

    /// Sets the change-point search options (outlier screen, end margins).
    pub fn with_fit_options(mut self, fit: FitOptions) -> Self {
        self.fit = fit;
        self
    }

    pub fn with_ci_level(mut self, level: f64) -> Self {
        self.ci_level = level;
        self
    }

    pub fn with_central(mut self, central: Central) -> Self {
        self.central = central;
        self
    }

    /// Stops starting new replicates once `deadline` has elapsed.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Runs replicates on the rayon pool (`true`) or on the calling thread.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn n_seasons(&self) -> usize {
        self.n_seasons
    }

    pub fn season_rule(&self) -> SeasonRule {
        self.season_rule
    }

    pub fn n_strata_min(&self) -> usize {
        self.n_strata_min
    }

    pub fn n_strata_max(&self) -> usize {
        self.n_strata_max
    }

    pub fn n_bins(&self) -> usize {
        self.n_bins
    }

    pub fn n_per_bin(&self) -> usize {
        self.n_per_bin
    }

    pub fn n_boot(&self) -> usize {
        self.n_boot
    }

    pub fn significance_threshold(&self) -> f64 {
        self.significance_threshold
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn ustar_range(&self) -> (f64, f64) {
        self.ustar_range
    }

    pub fn fit_options(&self) -> &FitOptions {
        &self.fit
    }

    pub fn ci_level(&self) -> f64 {
        self.ci_level
    }

    pub fn central(&self) -> Central {
        self.central
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    pub fn parallel(&self) -> bool {
        self.parallel
    }

    /// Points needed to fill the minimum number of strata in one season.
    pub fn min_season_points(&self) -> usize {
        self.n_strata_min
            .saturating_mul(self.n_bins)
            .saturating_mul(self.n_per_bin)
    }

    /// Valid points needed over the whole record.
    pub fn min_valid_points(&self) -> usize {
        self.n_seasons.saturating_mul(self.min_season_points())
    }

    /// Number of strata for a season with `n_points` valid points.
    pub fn strata_for(&self, n_points: usize) -> usize {
        let per_stratum = self.n_bins.saturating_mul(self.n_per_bin).max(1);
        (n_points / per_stratum).clamp(self.n_strata_min, self.n_strata_max)
    }

    /// Validates this configuration.
    ///
    /// Rejects zero counts, `n_strata_min > n_strata_max`, probabilities
    /// outside `(0, 1)`, a non-positive outlier SD, an end-point fraction
    /// outside `[0, 0.5)`, an empty u* range and a minimum record size
    /// that does not fit in `usize`.
    pub fn validate(&self) -> Result<(), ThresholdError> {
        let invalid = |reason: String| Err(ThresholdError::InvalidConfig { reason });
        for (name, value) in [
            ("n_seasons", self.n_seasons),
            ("n_strata_min", self.n_strata_min),
            ("n_bins", self.n_bins),
            ("n_per_bin", self.n_per_bin),
            ("n_boot", self.n_boot),
        ] {
            if value < 1 {
                return invalid(format!("{name} must be at least 1"));
            }
        }
        if self.n_strata_min > self.n_strata_max {
            return invalid(format!(
                "n_strata_min ({}) exceeds n_strata_max ({})",
                self.n_strata_min, self.n_strata_max
            ));
        }
        for (name, value) in [
            ("significance_threshold", self.significance_threshold),
            ("ci_level", self.ci_level),
        ] {
            if !(value > 0.0 && value < 1.0) {
                return invalid(format!("{name} must lie in (0, 1), got {value}"));
            }
        }
        if !(self.fit.outlier_sd() > 0.0) {
            return invalid(format!(
                "outlier_sd must be positive, got {}",
                self.fit.outlier_sd()
            ));
        }
        let frac = self.fit.end_points_frac();
        if !(0.0..0.5).contains(&frac) {
            return invalid(format!("end_points_frac must lie in [0, 0.5), got {frac}"));
        }
        let (low, high) = self.ustar_range;
        if !(low < high) {
            return invalid(format!("ustar_range [{low}, {high}) is empty"));
        }
        let record = self
            .n_seasons
            .checked_mul(self.n_strata_min)
            .and_then(|v| v.checked_mul(self.n_bins))
            .and_then(|v| v.checked_mul(self.n_per_bin));
        if record.is_none() {
            return invalid(format!(
                "n_seasons * n_strata_min * n_bins * n_per_bin overflows ({} * {} * {} * {})",
                self.n_seasons, self.n_strata_min, self.n_bins, self.n_per_bin
            ));
        }
        Ok(())
    }
}
