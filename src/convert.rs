//! Pure conversion functions: TOML config structs -> crate API config types.

use std::time::Duration;

use anyhow::{Result, bail};
use ustar_threshold::{Central, EngineConfig, FitOptions, SeasonRule};

use crate::config::*;

/// Parses a season rule name into the corresponding enum variant.
pub fn parse_season_rule(s: &str) -> Result<SeasonRule> {
    match s.to_lowercase().replace('-', "_").as_str() {
        "equal_span" => Ok(SeasonRule::EqualSpan),
        "equal_count" => Ok(SeasonRule::EqualCount),
        other => bail!("unknown season rule: {other:?}"),
    }
}

/// Parses a central-value name into the corresponding enum variant.
pub fn parse_central(s: &str) -> Result<Central> {
    match s.to_lowercase().as_str() {
        "median" => Ok(Central::Median),
        "mean" => Ok(Central::Mean),
        other => bail!("unknown central value: {other:?}"),
    }
}

/// Builds [`FitOptions`] from the TOML fit configuration.
pub fn build_fit_options(fit: &FitToml) -> FitOptions {
    FitOptions::new()
        .with_outlier_sd(fit.outlier_sd)
        .with_end_points_min(fit.end_points_min)
        .with_end_points_frac(fit.end_points_frac)
}

/// Builds an [`EngineConfig`] from the whole TOML configuration.
///
/// The result is validated so that configuration mistakes are reported
/// before any input is read.
pub fn build_engine_config(cfg: &UstarConfig) -> Result<EngineConfig> {
    let engine = &cfg.engine;
    let mut out = EngineConfig::new()
        .with_n_seasons(engine.n_seasons)
        .with_season_rule(parse_season_rule(&engine.season_rule)?)
        .with_strata(engine.strata_min, engine.strata_max)
        .with_n_bins(engine.n_bins)
        .with_n_per_bin(engine.n_per_bin)
        .with_n_boot(engine.n_boot)
        .with_significance_threshold(engine.significance_threshold)
        .with_ustar_range(engine.ustar_range[0], engine.ustar_range[1])
        .with_ci_level(engine.ci_level)
        .with_central(parse_central(&engine.central)?)
        .with_fit_options(build_fit_options(&cfg.fit))
        .with_parallel(engine.parallel);
    if let Some(secs) = engine.deadline_secs {
        let Ok(deadline) = Duration::try_from_secs_f64(secs) else {
            bail!("deadline_secs must be a non-negative number of seconds, got {secs}");
        };
        out = out.with_deadline(deadline);
    }
    if let Some(s) = cfg.seed {
        out = out.with_seed(s);
    }
    out.validate()?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn season_rule_names() {
        assert_eq!(parse_season_rule("equal_span").unwrap(), SeasonRule::EqualSpan);
        assert_eq!(parse_season_rule("Equal-Count").unwrap(), SeasonRule::EqualCount);
        assert!(parse_season_rule("monthly").is_err());
    }

    #[test]
    fn central_names() {
        assert_eq!(parse_central("MEAN").unwrap(), Central::Mean);
        let err = parse_central("mode").unwrap_err();
        assert!(err.to_string().contains("mode"));
    }

    #[test]
    fn defaults_round_trip() {
        let cfg = build_engine_config(&UstarConfig::default()).unwrap();
        let reference = EngineConfig::new();
        assert_eq!(cfg.n_seasons(), reference.n_seasons());
        assert_eq!(cfg.n_strata_max(), reference.n_strata_max());
        assert_eq!(cfg.n_boot(), reference.n_boot());
        assert_eq!(cfg.ustar_range(), reference.ustar_range());
        assert_eq!(cfg.seed(), None);
        assert_eq!(cfg.deadline(), None);
    }

    #[test]
    fn seed_and_deadline_forwarded() {
        let mut toml = UstarConfig {
            seed: Some(9),
            ..UstarConfig::default()
        };
        toml.engine.deadline_secs = Some(1.5);
        toml.fit.end_points_min = 4;
        let cfg = build_engine_config(&toml).unwrap();
        assert_eq!(cfg.seed(), Some(9));
        assert_eq!(cfg.deadline(), Some(Duration::from_millis(1500)));
        assert_eq!(cfg.fit_options().end_points_min(), 4);
    }

    #[test]
    fn invalid_values_rejected() {
        let mut toml = UstarConfig::default();
        for secs in [-1.0, 1e30, f64::NAN, f64::INFINITY] {
            toml.engine.deadline_secs = Some(secs);
            assert!(build_engine_config(&toml).is_err(), "deadline_secs {secs}");
        }

        let mut toml = UstarConfig::default();
        toml.engine.n_bins = 0;
        assert!(build_engine_config(&toml).is_err());
    }
}
