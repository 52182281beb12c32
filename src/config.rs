use std::path::PathBuf;

use serde::Deserialize;

/// Top-level ustar configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UstarConfig {
    /// Run seed. Drawn at random and reported in the output when absent.
    #[serde(default)]
    pub seed: Option<u64>,

    /// I/O settings.
    #[serde(default)]
    pub io: IoConfig,

    /// Partitioning, bootstrap and aggregation settings.
    #[serde(default)]
    pub engine: EngineToml,

    /// Change-point fit settings.
    #[serde(default)]
    pub fit: FitToml,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct IoConfig {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    /// Write the per-cell two-parameter grid alongside the estimates.
    #[serde(default)]
    pub grid: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineToml {
    #[serde(default = "default_n_seasons")]
    pub n_seasons: usize,
    #[serde(default = "default_season_rule")]
    pub season_rule: String,
    #[serde(default = "default_strata_min")]
    pub strata_min: usize,
    #[serde(default = "default_strata_max")]
    pub strata_max: usize,
    #[serde(default = "default_n_bins")]
    pub n_bins: usize,
    #[serde(default = "default_n_per_bin")]
    pub n_per_bin: usize,
    #[serde(default = "default_n_boot")]
    pub n_boot: usize,
    #[serde(default = "default_significance")]
    pub significance_threshold: f64,
    #[serde(default = "default_ustar_range")]
    pub ustar_range: [f64; 2],
    #[serde(default = "default_ci_level")]
    pub ci_level: f64,
    #[serde(default = "default_central")]
    pub central: String,
    /// Wall-clock budget for starting bootstrap replicates, in seconds.
    #[serde(default)]
    pub deadline_secs: Option<f64>,
    #[serde(default = "default_true")]
    pub parallel: bool,
}

impl Default for EngineToml {
    fn default() -> Self {
        Self {
            n_seasons: default_n_seasons(),
            season_rule: default_season_rule(),
            strata_min: default_strata_min(),
            strata_max: default_strata_max(),
            n_bins: default_n_bins(),
            n_per_bin: default_n_per_bin(),
            n_boot: default_n_boot(),
            significance_threshold: default_significance(),
            ustar_range: default_ustar_range(),
            ci_level: default_ci_level(),
            central: default_central(),
            deadline_secs: None,
            parallel: true,
        }
    }
}

fn default_n_seasons() -> usize {
    4
}
fn default_season_rule() -> String {
    "equal_span".to_string()
}
fn default_strata_min() -> usize {
    4
}
fn default_strata_max() -> usize {
    8
}
fn default_n_bins() -> usize {
    50
}
fn default_n_per_bin() -> usize {
    5
}
fn default_n_boot() -> usize {
    1000
}
fn default_significance() -> f64 {
    0.05
}
fn default_ustar_range() -> [f64; 2] {
    [0.0, 3.0]
}
fn default_ci_level() -> f64 {
    0.95
}
fn default_central() -> String {
    "median".to_string()
}
fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FitToml {
    #[serde(default = "default_outlier_sd")]
    pub outlier_sd: f64,
    #[serde(default = "default_end_points_min")]
    pub end_points_min: usize,
    #[serde(default = "default_end_points_frac")]
    pub end_points_frac: f64,
}

impl Default for FitToml {
    fn default() -> Self {
        Self {
            outlier_sd: default_outlier_sd(),
            end_points_min: default_end_points_min(),
            end_points_frac: default_end_points_frac(),
        }
    }
}

fn default_outlier_sd() -> f64 {
    4.0
}
fn default_end_points_min() -> usize {
    3
}
fn default_end_points_frac() -> f64 {
    0.05
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let cfg: UstarConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.seed, None);
        assert_eq!(cfg.engine.n_seasons, 4);
        assert_eq!(cfg.engine.season_rule, "equal_span");
        assert_eq!(cfg.engine.ustar_range, [0.0, 3.0]);
        assert_eq!(cfg.fit.end_points_min, 3);
        assert!(cfg.engine.parallel);
        assert!(!cfg.io.grid);
    }

    #[test]
    fn sections_parse() {
        let cfg: UstarConfig = toml::from_str(
            r#"
            seed = 42

            [io]
            input = "site.json"
            grid = true

            [engine]
            n_boot = 200
            season_rule = "equal_count"
            deadline_secs = 30.0

            [fit]
            outlier_sd = 3.5
            "#,
        )
        .unwrap();
        assert_eq!(cfg.seed, Some(42));
        assert_eq!(cfg.io.input, Some(PathBuf::from("site.json")));
        assert!(cfg.io.grid);
        assert_eq!(cfg.engine.n_boot, 200);
        assert_eq!(cfg.engine.n_bins, 50);
        assert_eq!(cfg.engine.deadline_secs, Some(30.0));
        assert_eq!(cfg.fit.outlier_sd, 3.5);
    }

    #[test]
    fn unknown_fields_rejected() {
        assert!(toml::from_str::<UstarConfig>("[engine]\nn_bootstrap = 5").is_err());
        assert!(toml::from_str::<UstarConfig>("[plot]").is_err());
    }
}
