//! JSON output structures for a threshold run.

use serde::Serialize;
use ustar_changepoint::{ChangePointResult, ModelKind};

use crate::aggregate::ThresholdEstimate;
use crate::config::{Central, SeasonRule};
use crate::error::ThresholdError;
use crate::partition::SeasonWindow;
use crate::run::ThresholdRun;

/// Top-level run output.
#[derive(Debug, Serialize)]
pub struct RunOutput<'a> {
    pub config: ConfigSummary,
    pub run_seed: u64,
    pub n_valid: usize,
    pub replicates_completed: usize,
    pub seasons: Vec<SeasonOutput<'a>>,
    pub annual: &'a ThresholdEstimate,
    /// Two-parameter fits of every cell, when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grid: Option<Vec<GridCell<'a>>>,
}

/// Summary of the configuration used.
#[derive(Debug, Serialize)]
pub struct ConfigSummary {
    pub n_seasons: usize,
    pub season_rule: SeasonRule,
    pub n_strata_min: usize,
    pub n_strata_max: usize,
    pub n_bins: usize,
    pub n_per_bin: usize,
    pub n_boot: usize,
    pub significance_threshold: f64,
    pub ci_level: f64,
    pub central: Central,
}

/// Estimate for one season.
#[derive(Debug, Serialize)]
pub struct SeasonOutput<'a> {
    pub season: usize,
    pub window: SeasonWindow,
    pub estimate: &'a ThresholdEstimate,
}

/// One (season, stratum, replicate) cell of the grid.
#[derive(Debug, Serialize)]
pub struct GridCell<'a> {
    pub season: usize,
    pub stratum: usize,
    pub replicate: usize,
    #[serde(flatten)]
    pub result: &'a ChangePointResult,
}

impl<'a> RunOutput<'a> {
    /// Borrows the serializable view of `run`.
    pub fn new(run: &'a ThresholdRun, include_grid: bool) -> Self {
        let cfg = run.config();
        let rc = run.results();
        let (n_seasons, n_strata, n_boot) = rc.shape();
        let grid = include_grid.then(|| {
            let mut cells = Vec::with_capacity(n_seasons * n_strata * n_boot);
            for season in 0..n_seasons {
                for stratum in 0..n_strata {
                    for replicate in 0..n_boot {
                        if let Some(result) =
                            rc.get(ModelKind::TwoParameter, season, stratum, replicate)
                        {
                            cells.push(GridCell {
                                season,
                                stratum,
                                replicate,
                                result,
                            });
                        }
                    }
                }
            }
            cells
        });
        Self {
            config: ConfigSummary {
                n_seasons: cfg.n_seasons(),
                season_rule: cfg.season_rule(),
                n_strata_min: cfg.n_strata_min(),
                n_strata_max: cfg.n_strata_max(),
                n_bins: cfg.n_bins(),
                n_per_bin: cfg.n_per_bin(),
                n_boot: cfg.n_boot(),
                significance_threshold: cfg.significance_threshold(),
                ci_level: cfg.ci_level(),
                central: cfg.central(),
            },
            run_seed: run.run_seed(),
            n_valid: run.n_valid(),
            replicates_completed: rc.n_completed(),
            seasons: run
                .windows()
                .iter()
                .zip(run.seasons())
                .enumerate()
                .map(|(season, (&window, estimate))| SeasonOutput {
                    season,
                    window,
                    estimate,
                })
                .collect(),
            annual: run.annual(),
            grid,
        }
    }
}

/// Serialize a run to a JSON string. Missing values are written as `null`.
pub fn to_json(run: &ThresholdRun, include_grid: bool) -> Result<String, ThresholdError> {
    serde_json::to_string_pretty(&RunOutput::new(run, include_grid)).map_err(|e| {
        ThresholdError::Serialization {
            reason: e.to_string(),
        }
    })
}
