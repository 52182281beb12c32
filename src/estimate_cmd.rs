use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use tracing::{info, info_span, warn};
use ustar_threshold::{EstimateStatus, estimate_threshold, to_json};

use crate::cli::EstimateArgs;
use crate::config::UstarConfig;
use crate::convert;
use crate::input;

/// Loads the TOML config, or the built-in defaults when no path is given.
fn load_config(path: Option<&PathBuf>) -> Result<UstarConfig> {
    let Some(path) = path else {
        return Ok(UstarConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    toml::from_str(&text).context("failed to parse TOML config")
}

pub fn run(args: EstimateArgs) -> Result<()> {
    let _span = info_span!("estimate").entered();

    let mut config = load_config(args.config.as_ref())?;

    // CLI overrides
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    if let Some(n) = args.n_boot {
        config.engine.n_boot = n;
    }
    if let Some(ref p) = args.input {
        config.io.input = Some(p.clone());
    }
    if let Some(ref p) = args.output {
        config.io.output = Some(p.clone());
    }
    let grid = args.grid || config.io.grid;

    let engine = convert::build_engine_config(&config)?;
    let Some(input_path) = config.io.input.as_ref() else {
        bail!("no input file: pass --input or set [io].input");
    };

    let obs = input::read_observations(input_path)?;
    info!(n_obs = obs.len(), path = %input_path.display(), "read observations");

    let run = estimate_threshold(&obs, &engine)?;
    for (s, est) in run.seasons().iter().enumerate() {
        match est.status() {
            EstimateStatus::Ok => info!(season = s, value = ?est.value(), ci = ?est.ci(), "season threshold"),
            status => warn!(season = s, ?status, "no threshold for season"),
        }
    }

    let json = to_json(&run, grid)?;
    match config.io.output {
        Some(ref path) => {
            std::fs::write(path, &json)
                .with_context(|| format!("failed to write output: {}", path.display()))?;
            info!(path = %path.display(), "wrote results");
        }
        None => println!("{json}"),
    }

    Ok(())
}
