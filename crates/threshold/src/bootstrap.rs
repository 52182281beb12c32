//! Bootstrap replicates of the partition-and-fit pipeline.
//!
//! Replicate 0 fits the valid points as observed. Every later replicate
//! resamples each season's valid points with replacement (same count),
//! restores time order and repeats the partitioning and fitting. Each
//! replicate draws from its own generator seeded from the run seed and the
//! replicate index, so results do not depend on scheduling.

use std::time::Instant;

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;
use rayon::prelude::*;
use tracing::{debug, debug_span, warn};
use ustar_changepoint::{ChangePointResult, FitError, StratumSummary, try_fit_both};

use crate::config::EngineConfig;
use crate::observations::Observations;
use crate::partition::{Season, bin_means, strata};
use crate::result::{Cell, ResultCollection};

/// SplitMix64 finaliser, used to decorrelate per-replicate seeds.
pub(crate) fn splitmix64(x: u64) -> u64 {
    let mut z = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Generator for replicate `b` of a run.
pub(crate) fn replicate_rng(run_seed: u64, b: usize) -> StdRng {
    StdRng::seed_from_u64(splitmix64(run_seed ^ b as u64))
}

/// Draws `points.len()` points with replacement, returned in time order.
pub(crate) fn resample(points: &[usize], time: &[f64], rng: &mut StdRng) -> Vec<usize> {
    let mut drawn: Vec<usize> = (0..points.len())
        .filter_map(|_| points.choose(&mut *rng).copied())
        .collect();
    drawn.sort_by(|&a, &b| time[a].total_cmp(&time[b]).then(a.cmp(&b)));
    drawn
}

/// Read-only inputs shared by every replicate.
pub(crate) struct Context<'a> {
    pub(crate) obs: &'a Observations,
    /// u* after range filtering.
    pub(crate) ustar: &'a [f64],
    pub(crate) seasons: &'a [Season],
    pub(crate) config: &'a EngineConfig,
    pub(crate) run_seed: u64,
}

fn settle(result: Result<ChangePointResult, FitError>, summary: &StratumSummary) -> ChangePointResult {
    match result {
        Ok(r) => r.with_stratum(summary),
        Err(e) => {
            debug!(error = %e, "fit left at sentinel");
            ChangePointResult::sentinel()
        }
    }
}

/// Runs replicate `b`, writing into its block of `n_seasons * n_strata_max`
/// cells.
pub(crate) fn run_replicate(ctx: &Context<'_>, b: usize, block: &mut [Cell]) {
    let _span = debug_span!("replicate", b).entered();
    let cfg = ctx.config;
    let obs = ctx.obs;
    let n_strata_max = cfg.n_strata_max();
    let mut rng = replicate_rng(ctx.run_seed, b);

    for (s, (season, row)) in ctx
        .seasons
        .iter()
        .zip(block.chunks_mut(n_strata_max))
        .enumerate()
    {
        if season.points.len() < cfg.min_season_points() {
            debug!(
                season = s,
                n = season.points.len(),
                min = cfg.min_season_points(),
                "season skipped"
            );
            continue;
        }
        let resampled;
        let points = if b == 0 {
            &season.points
        } else {
            resampled = resample(&season.points, obs.time(), &mut rng);
            &resampled
        };

        let n_strata = cfg.strata_for(points.len());
        for (stratum, cell) in strata(obs.temp(), points, n_strata).iter().zip(row.iter_mut()) {
            cell.attempted = true;
            let bins = bin_means(ctx.ustar, obs.nee(), stratum, cfg.n_bins(), cfg.n_per_bin());
            let (two, three) = try_fit_both(&bins.ustar, &bins.nee, cfg.fit_options());
            if two.is_err() && three.is_err() {
                debug!(season = s, n_bins = bins.ustar.len(), "stratum not fitted");
                continue;
            }
            let time: Vec<f64> = stratum.iter().map(|&i| obs.time()[i]).collect();
            let ustar: Vec<f64> = stratum.iter().map(|&i| ctx.ustar[i]).collect();
            let temp: Vec<f64> = stratum.iter().map(|&i| obs.temp()[i]).collect();
            let summary = StratumSummary::from_points(&time, &ustar, &temp);
            cell.two = settle(two, &summary);
            cell.three = settle(three, &summary);
        }
    }
}

/// Runs all replicates of a run into a freshly allocated collection.
///
/// With a deadline, replicates that have not started when it elapses are
/// skipped and stay at the sentinel.
pub(crate) fn run(ctx: &Context<'_>) -> ResultCollection {
    let cfg = ctx.config;
    let mut results = ResultCollection::new(cfg.n_seasons(), cfg.n_strata_max(), cfg.n_boot());
    let block_len = results.block_len();
    let start = Instant::now();
    let deadline = cfg.deadline();

    let job = |(b, (block, done)): (usize, (&mut [Cell], &mut bool))| {
        if deadline.is_some_and(|d| start.elapsed() >= d) {
            return;
        }
        run_replicate(ctx, b, block);
        *done = true;
    };

    let (cells, completed) = results.blocks_mut();
    if cfg.parallel() {
        cells
            .par_chunks_mut(block_len)
            .zip(completed.par_iter_mut())
            .enumerate()
            .for_each(&job);
    } else {
        cells
            .chunks_mut(block_len)
            .zip(completed.iter_mut())
            .enumerate()
            .for_each(&job);
    }

    let n_completed = results.n_completed();
    if n_completed < cfg.n_boot() {
        warn!(
            completed = n_completed,
            n_boot = cfg.n_boot(),
            "deadline reached, remaining replicates left empty"
        );
    }
    results
}
