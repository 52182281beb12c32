//! Statistical helper functions for the u* threshold engine.
//!
//! Every function here treats `NaN` as a missing value. Underdetermined
//! input yields `NaN` (or `None`) rather than an error, so callers can use
//! the results directly as "no result" sentinels.

use ndarray::{Array, ArrayBase, Axis, Data, Dimension, RemoveAxis, Zip};
use statrs::distribution::{ContinuousCDF, StudentsT};

/// Minimum number of non-missing values for a defined interquartile range.
pub const IQR_MIN_COUNT: usize = 4;

/// Arithmetic mean of the non-missing values. Returns `NaN` if none remain.
pub fn mean(data: &[f64]) -> f64 {
    let (sum, n) = data
        .iter()
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(s, n), &v| (s + v, n + 1));
    if n == 0 {
        return f64::NAN;
    }
    sum / n as f64
}

/// Sample variance of the non-missing values (N-1 denominator).
/// Returns `NaN` if fewer than 2 values remain.
pub fn variance(data: &[f64]) -> f64 {
    let values = present(data);
    let n = values.len();
    if n < 2 {
        return f64::NAN;
    }
    let nf = n as f64;
    let m = values.iter().sum::<f64>() / nf;
    values.iter().map(|&x| (x - m) * (x - m)).sum::<f64>() / (nf - 1.0)
}

/// Sample standard deviation (N-1 denominator), `NaN` if fewer than 2 values.
pub fn sd(data: &[f64]) -> f64 {
    variance(data).sqrt()
}

/// Copies the non-missing values and sorts them ascending.
pub fn sorted_present(data: &[f64]) -> Vec<f64> {
    let mut values = present(data);
    values.sort_by(f64::total_cmp);
    values
}

fn present(data: &[f64]) -> Vec<f64> {
    data.iter().copied().filter(|v| !v.is_nan()).collect()
}

/// Percentile of pre-sorted, missing-free data (MATLAB `prctile`, method 5).
///
/// With `m` values the position of probability `p` is `p * m + 0.5`
/// (1-based). Its floor is clamped to `[1, m - 1]` and the value is linearly
/// interpolated towards the next order statistic with the remainder clamped
/// to `[0, 1]`, so `p = 0` and `p = 1` return the extremes.
///
/// Returns `NaN` for empty input.
pub fn quantile_sorted(sorted: &[f64], p: f64) -> f64 {
    let m = sorted.len();
    match m {
        0 => f64::NAN,
        1 => sorted[0],
        _ => {
            let pos = p * m as f64 + 0.5;
            let lo = (pos.floor().max(0.0) as usize).clamp(1, m - 1);
            let frac = (pos - lo as f64).clamp(0.0, 1.0);
            sorted[lo - 1] + frac * (sorted[lo] - sorted[lo - 1])
        }
    }
}

/// Quantiles of `data` at each probability in `probs`, ignoring `NaN`.
///
/// Returns one `NaN` per probability when `data` has no present values.
pub fn quantiles(data: &[f64], probs: &[f64]) -> Vec<f64> {
    let sorted = sorted_present(data);
    probs.iter().map(|&p| quantile_sorted(&sorted, p)).collect()
}

/// Single quantile of `data` ignoring `NaN`.
pub fn quantile(data: &[f64], p: f64) -> f64 {
    quantile_sorted(&sorted_present(data), p)
}

/// Median of the non-missing values (method-5 rule at `p = 0.5`).
pub fn median(data: &[f64]) -> f64 {
    quantile(data, 0.5)
}

/// Interquartile range `q75 - q25`, `NaN` with fewer than
/// [`IQR_MIN_COUNT`] non-missing values.
pub fn iqr(data: &[f64]) -> f64 {
    let sorted = sorted_present(data);
    if sorted.len() < IQR_MIN_COUNT {
        return f64::NAN;
    }
    quantile_sorted(&sorted, 0.75) - quantile_sorted(&sorted, 0.25)
}

/// Quantiles along the first axis of an n-dimensional array.
///
/// Every lane along axis 0 is treated as an independent series. The output
/// has the input shape with axis 0 replaced by `probs.len()`.
pub fn quantiles_axis0<S, D>(data: &ArrayBase<S, D>, probs: &[f64]) -> Array<f64, D>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    let mut shape = data.raw_dim();
    if shape.ndim() == 0 {
        return Array::from_elem(shape, f64::NAN);
    }
    shape[0] = probs.len();
    let mut out = Array::from_elem(shape, f64::NAN);
    Zip::from(out.lanes_mut(Axis(0)))
        .and(data.lanes(Axis(0)))
        .for_each(|mut dst, src| {
            let lane: Vec<f64> = src.iter().copied().collect();
            for (d, q) in dst.iter_mut().zip(quantiles(&lane, probs)) {
                *d = q;
            }
        });
    out
}

/// Interquartile range along the first axis; the reduced axis is dropped.
pub fn iqr_axis0<S, D>(data: &ArrayBase<S, D>) -> Array<f64, D::Smaller>
where
    S: Data<Elem = f64>,
    D: RemoveAxis,
{
    data.map_axis(Axis(0), |lane| {
        let values: Vec<f64> = lane.iter().copied().collect();
        iqr(&values)
    })
}

/// Pearson correlation coefficient.
///
/// Filters to indices where both `x[i]` and `y[i]` are finite.
/// Returns `None` if fewer than 3 finite pairs or if the denominator is zero
/// (constant input).
pub fn pearson_correlation(x: &[f64], y: &[f64]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y.iter())
        .filter(|(xi, yi)| xi.is_finite() && yi.is_finite())
        .map(|(xi, yi)| (*xi, *yi))
        .collect();

    if pairs.len() < 3 {
        return None;
    }

    let n = pairs.len() as f64;
    let mx: f64 = pairs.iter().map(|(xi, _)| xi).sum::<f64>() / n;
    let my: f64 = pairs.iter().map(|(_, yi)| yi).sum::<f64>() / n;

    let mut sum_xy = 0.0;
    let mut sum_xx = 0.0;
    let mut sum_yy = 0.0;
    for &(xi, yi) in &pairs {
        let dx = xi - mx;
        let dy = yi - my;
        sum_xy += dx * dy;
        sum_xx += dx * dx;
        sum_yy += dy * dy;
    }

    let denom = (sum_xx * sum_yy).sqrt();
    if denom == 0.0 {
        return None;
    }

    Some((sum_xy / denom).clamp(-1.0, 1.0))
}

/// Pearson correlation with its two-sided p-value under `H0: rho = 0`.
///
/// The p-value uses `t = r * sqrt((n - 2) / (1 - r^2))` against a Student t
/// distribution with `n - 2` degrees of freedom, where `n` counts finite pairs.
pub fn correlation_test(x: &[f64], y: &[f64]) -> Option<(f64, f64)> {
    let r = pearson_correlation(x, y)?;
    let n = x
        .iter()
        .zip(y.iter())
        .filter(|(a, b)| a.is_finite() && b.is_finite())
        .count();
    let df = (n - 2) as f64;
    let denom = 1.0 - r * r;
    if denom <= 0.0 {
        return Some((r, 0.0));
    }
    let t = r * (df / denom).sqrt();
    let dist = StudentsT::new(0.0, 1.0, df).ok()?;
    let p = 2.0 * (1.0 - dist.cdf(t.abs()));
    Some((r, p.clamp(0.0, 1.0)))
}
