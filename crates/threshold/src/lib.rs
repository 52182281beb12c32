//! Seasonal u* threshold estimation by bootstrapped change-point detection.
//!
//! The engine follows the Barr et al. procedure:
//!
//! 1. **Filter** out-of-range u* and keep nighttime records with NEE, u* and
//!    temperature present.
//! 2. **Partition** the valid points into seasons, each season into
//!    temperature strata, and each stratum into equal-occupancy u* bins.
//! 3. **Fit** the two-parameter (operational) and three-parameter
//!    (diagnostic) change-point models to the bin means and evaluate their
//!    significance.
//! 4. **Bootstrap** steps 2 and 3 over resampled replicates in parallel.
//! 5. **Aggregate** the significant two-parameter breakpoints into a
//!    threshold and confidence interval per season and for the whole record.
//!
//! # Example
//!
//! ```no_run
//! use ustar_threshold::{EngineConfig, Observations, estimate_threshold};
//!
//! # fn load() -> (Vec<f64>, Vec<f64>, Vec<f64>, Vec<f64>, Vec<bool>) { unimplemented!() }
//! let (time, nee, ustar, temp, night) = load();
//! let obs = Observations::new(time, nee, ustar, temp, night)?;
//! let run = estimate_threshold(&obs, &EngineConfig::new().with_seed(1))?;
//! for (s, est) in run.seasons().iter().enumerate() {
//!     println!("season {s}: {:?} {:?}", est.status(), est.value());
//! }
//! # Ok::<(), ustar_threshold::ThresholdError>(())
//! ```

mod aggregate;
mod bootstrap;
mod config;
mod error;
mod filter;
mod observations;
mod output;
mod partition;
mod result;
mod run;

pub use aggregate::{EstimateStatus, SelectionDiagnostics, ThresholdEstimate};
pub use config::{Central, EngineConfig, SeasonRule};
pub use error::ThresholdError;
pub use filter::{ValidSet, filter, filter_observations, filter_ustar};
pub use observations::Observations;
pub use output::{ConfigSummary, GridCell, RunOutput, SeasonOutput, to_json};
pub use partition::SeasonWindow;
pub use result::ResultCollection;
pub use run::ThresholdRun;
pub use ustar_changepoint::{ChangePointResult, FitOptions, ModelKind, StatField};

use rand::Rng;
use tracing::info;

/// Estimates seasonal and annual u* thresholds for one record.
///
/// # Errors
///
/// | Variant | Trigger |
/// |---------|---------|
/// | [`ThresholdError::InvalidConfig`] | `config` fails [`EngineConfig::validate`] |
/// | [`ThresholdError::InsufficientData`] | fewer valid points than [`EngineConfig::min_valid_points`] |
///
/// Failures of individual seasons, strata or fits never abort the run; they
/// show up as sentinel cells and in the estimate status.
#[tracing::instrument(skip_all, fields(n_obs = obs.len(), n_boot = config.n_boot()))]
pub fn estimate_threshold(
    obs: &Observations,
    config: &EngineConfig,
) -> Result<ThresholdRun, ThresholdError> {
    config.validate()?;

    let valid = filter_observations(obs, config.ustar_range());
    let min = config.min_valid_points();
    if valid.count() < min {
        return Err(ThresholdError::InsufficientData {
            valid: valid.count(),
            min,
        });
    }

    let run_seed = config.seed().unwrap_or_else(|| rand::rng().random());
    let seasons = partition::seasons(
        obs.time(),
        &valid.indices,
        config.n_seasons(),
        config.season_rule(),
    );

    let ctx = bootstrap::Context {
        obs,
        ustar: &valid.ustar,
        seasons: &seasons,
        config,
        run_seed,
    };
    let results = bootstrap::run(&ctx);

    let estimates: Vec<ThresholdEstimate> = (0..config.n_seasons())
        .map(|s| aggregate::estimate(results.season_cells(s), config))
        .collect();
    let annual = aggregate::estimate(
        (0..config.n_seasons()).flat_map(|s| results.season_cells(s)),
        config,
    );

    info!(
        run_seed,
        n_valid = valid.count(),
        completed = results.n_completed(),
        annual = ?annual.value(),
        "threshold run finished"
    );

    Ok(ThresholdRun::new(
        config.clone(),
        run_seed,
        valid.count(),
        seasons.into_iter().map(|s| s.window).collect(),
        results,
        estimates,
        annual,
    ))
}
