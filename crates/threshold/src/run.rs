//! Outcome of one estimation run.

use ndarray::Array3;
use ustar_changepoint::{ModelKind, StatField};

use crate::aggregate::ThresholdEstimate;
use crate::config::EngineConfig;
use crate::partition::SeasonWindow;
use crate::result::ResultCollection;

/// Everything produced by [`estimate_threshold`](crate::estimate_threshold).
#[derive(Debug, Clone)]
pub struct ThresholdRun {
    config: EngineConfig,
    run_seed: u64,
    n_valid: usize,
    windows: Vec<SeasonWindow>,
    results: ResultCollection,
    seasons: Vec<ThresholdEstimate>,
    annual: ThresholdEstimate,
}

impl ThresholdRun {
    pub(crate) fn new(
        config: EngineConfig,
        run_seed: u64,
        n_valid: usize,
        windows: Vec<SeasonWindow>,
        results: ResultCollection,
        seasons: Vec<ThresholdEstimate>,
        annual: ThresholdEstimate,
    ) -> Self {
        Self {
            config,
            run_seed,
            n_valid,
            windows,
            results,
            seasons,
            annual,
        }
    }

    /// Configuration the run used.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Seed the replicate generators were derived from.
    pub fn run_seed(&self) -> u64 {
        self.run_seed
    }

    /// Valid nighttime points after filtering.
    pub fn n_valid(&self) -> usize {
        self.n_valid
    }

    pub fn windows(&self) -> &[SeasonWindow] {
        &self.windows
    }

    pub fn results(&self) -> &ResultCollection {
        &self.results
    }

    /// One estimate per season, in season order.
    pub fn seasons(&self) -> &[ThresholdEstimate] {
        &self.seasons
    }

    /// Estimate pooled over all seasons.
    pub fn annual(&self) -> &ThresholdEstimate {
        &self.annual
    }

    /// Whether a deadline cut the run short.
    pub fn is_partial(&self) -> bool {
        self.results.n_completed() < self.config.n_boot()
    }

    /// Breakpoint of the two-parameter model in every cell, for export.
    pub fn cp_grid(&self) -> Array3<f64> {
        self.results.field(ModelKind::TwoParameter, StatField::Cp)
    }
}
