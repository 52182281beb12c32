//! Season windows, temperature strata and u* bins.

use serde::Serialize;

use crate::config::SeasonRule;

/// Time span of one season, `[start, end]` in record time units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeasonWindow {
    pub start: f64,
    pub end: f64,
}

/// A season window and the valid points falling in it, in time order.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Season {
    pub(crate) window: SeasonWindow,
    pub(crate) points: Vec<usize>,
}

/// Range of the finite values in `time`, or `None` if there are none.
fn time_range(time: &[f64]) -> Option<(f64, f64)> {
    time.iter()
        .copied()
        .filter(|t| t.is_finite())
        .fold(None, |acc, t| match acc {
            None => Some((t, t)),
            Some((lo, hi)) => Some((lo.min(t), hi.max(t))),
        })
}

/// Splits the valid points into `n_seasons` contiguous windows.
///
/// Windows cover the whole record. Valid points without a finite time are
/// left out of every season.
pub(crate) fn seasons(time: &[f64], valid: &[usize], n_seasons: usize, rule: SeasonRule) -> Vec<Season> {
    let mut ordered: Vec<usize> = valid
        .iter()
        .copied()
        .filter(|&i| time[i].is_finite())
        .collect();
    ordered.sort_by(|&a, &b| time[a].total_cmp(&time[b]).then(a.cmp(&b)));

    let Some((t0, t1)) = time_range(time) else {
        return (0..n_seasons)
            .map(|_| Season {
                window: SeasonWindow {
                    start: f64::NAN,
                    end: f64::NAN,
                },
                points: Vec::new(),
            })
            .collect();
    };

    match rule {
        SeasonRule::EqualSpan => {
            let width = (t1 - t0) / n_seasons as f64;
            let mut out: Vec<Season> = (0..n_seasons)
                .map(|s| Season {
                    window: SeasonWindow {
                        start: t0 + s as f64 * width,
                        end: if s + 1 == n_seasons {
                            t1
                        } else {
                            t0 + (s + 1) as f64 * width
                        },
                    },
                    points: Vec::new(),
                })
                .collect();
            for i in ordered {
                let s = if width > 0.0 {
                    (((time[i] - t0) / width).floor() as usize).min(n_seasons - 1)
                } else {
                    0
                };
                out[s].points.push(i);
            }
            out
        }
        SeasonRule::EqualCount => {
            let m = ordered.len();
            let bounds: Vec<usize> = (0..=n_seasons).map(|s| s * m / n_seasons).collect();
            (0..n_seasons)
                .map(|s| {
                    let points = ordered[bounds[s]..bounds[s + 1]].to_vec();
                    let start = if s == 0 {
                        t0
                    } else {
                        points.first().map_or(f64::NAN, |&i| time[i])
                    };
                    let end = if s + 1 == n_seasons {
                        t1
                    } else {
                        ordered.get(bounds[s + 1]).map_or(f64::NAN, |&i| time[i])
                    };
                    Season {
                        window: SeasonWindow { start, end },
                        points,
                    }
                })
                .collect()
        }
    }
}

/// Splits `points` into `n_strata` groups by temperature quantile.
///
/// Cut points are the temperatures at probabilities `k / n_strata`; stratum
/// `j` holds temperatures in `[cut_j, cut_{j+1})`, the last one closed.
/// Each stratum keeps the input order.
pub(crate) fn strata(temp: &[f64], points: &[usize], n_strata: usize) -> Vec<Vec<usize>> {
    let mut out = vec![Vec::new(); n_strata];
    if points.is_empty() || n_strata == 0 {
        return out;
    }
    let t: Vec<f64> = points.iter().map(|&i| temp[i]).collect();
    let probs: Vec<f64> = (1..n_strata).map(|k| k as f64 / n_strata as f64).collect();
    let cuts = ustar_stats::quantiles(&t, &probs);
    for (&i, &ti) in points.iter().zip(&t) {
        let j = cuts.iter().filter(|&&c| ti >= c).count();
        out[j].push(i);
    }
    out
}

/// Bin means of one stratum, ordered by u*.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Bins {
    pub(crate) ustar: Vec<f64>,
    pub(crate) nee: Vec<f64>,
}

/// Sorts `points` by u* and averages them in `n_bins` equal-occupancy bins.
///
/// Bins with fewer than `n_per_bin` members are dropped.
pub(crate) fn bin_means(
    ustar: &[f64],
    nee: &[f64],
    points: &[usize],
    n_bins: usize,
    n_per_bin: usize,
) -> Bins {
    let mut sorted = points.to_vec();
    sorted.sort_by(|&a, &b| ustar[a].total_cmp(&ustar[b]));
    let m = sorted.len();
    let mut bins = Bins::default();
    for k in 0..n_bins {
        let members = &sorted[k * m / n_bins..(k + 1) * m / n_bins];
        if members.len() < n_per_bin.max(1) {
            continue;
        }
        let count = members.len() as f64;
        bins.ustar
            .push(members.iter().map(|&i| ustar[i]).sum::<f64>() / count);
        bins.nee.push(members.iter().map(|&i| nee[i]).sum::<f64>() / count);
    }
    bins
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn equal_span_covers_record() {
        let time: Vec<f64> = (0..100).map(|i| i as f64).collect();
        let valid: Vec<usize> = (0..100).collect();
        let s = seasons(&time, &valid, 4, SeasonRule::EqualSpan);
        assert_eq!(s.len(), 4);
        assert_eq!(s[0].window.start, 0.0);
        assert_eq!(s[3].window.end, 99.0);
        for w in s.windows(2) {
            assert_eq!(w[0].window.end, w[1].window.start);
        }
        let total: usize = s.iter().map(|x| x.points.len()).sum();
        assert_eq!(total, 100);
        assert_eq!(s[0].points.len(), 25);
        // the last point sits on the closing edge
        assert!(s[3].points.contains(&99));
    }

    #[test]
    fn equal_span_uses_whole_record() {
        // valid points only in the first half: later seasons are empty
        let time: Vec<f64> = (0..100).map(|i| i as f64).collect();
        let valid: Vec<usize> = (0..50).collect();
        let s = seasons(&time, &valid, 4, SeasonRule::EqualSpan);
        assert_eq!(s[3].points.len(), 0);
        assert_eq!(s[3].window.end, 99.0);
    }

    #[test]
    fn equal_count_balances_valid_points() {
        let time: Vec<f64> = (0..100).map(|i| i as f64).collect();
        let valid: Vec<usize> = (0..100).filter(|i| i % 3 != 0 || *i > 60).collect();
        let s = seasons(&time, &valid, 4, SeasonRule::EqualCount);
        let counts: Vec<usize> = s.iter().map(|x| x.points.len()).collect();
        assert!(counts.iter().max().unwrap() - counts.iter().min().unwrap() <= 1);
        assert_eq!(s[0].window.start, 0.0);
        assert_eq!(s[3].window.end, 99.0);
        for w in s.windows(2) {
            assert_eq!(w[0].window.end, w[1].window.start);
        }
    }

    #[test]
    fn seasons_sort_by_time() {
        let time = [3.0, 1.0, 2.0, f64::NAN];
        let s = seasons(&time, &[0, 1, 2, 3], 1, SeasonRule::EqualSpan);
        assert_eq!(s[0].points, vec![1, 2, 0]);
    }

    #[test]
    fn strata_are_equal_count() {
        let temp: Vec<f64> = (0..40).map(|i| ((i * 7) % 40) as f64).collect();
        let points: Vec<usize> = (0..40).collect();
        let st = strata(&temp, &points, 4);
        for s in &st {
            assert_eq!(s.len(), 10);
        }
        // strata are ordered by temperature
        let max0 = st[0].iter().map(|&i| temp[i]).fold(f64::MIN, f64::max);
        let min1 = st[1].iter().map(|&i| temp[i]).fold(f64::MAX, f64::min);
        assert!(max0 < min1);
    }

    #[test]
    fn strata_of_empty_season() {
        let st = strata(&[], &[], 3);
        assert_eq!(st.len(), 3);
        assert!(st.iter().all(|s| s.is_empty()));
    }

    #[test]
    fn bins_average_members() {
        let ustar: Vec<f64> = (0..20).rev().map(|i| i as f64 * 0.01).collect();
        let nee: Vec<f64> = (0..20).rev().map(|i| i as f64).collect();
        let points: Vec<usize> = (0..20).collect();
        let b = bin_means(&ustar, &nee, &points, 4, 5);
        assert_eq!(b.ustar.len(), 4);
        assert_relative_eq!(b.ustar[0], 0.02, epsilon = 1e-12);
        assert_relative_eq!(b.nee[3], 17.0, epsilon = 1e-12);
    }

    #[test]
    fn sparse_bins_are_dropped() {
        let ustar: Vec<f64> = (0..12).map(|i| i as f64).collect();
        let nee = ustar.clone();
        let points: Vec<usize> = (0..12).collect();
        // 12 points in 5 bins: occupancies 2, 2, 3, 2, 3
        let b = bin_means(&ustar, &nee, &points, 5, 3);
        assert_eq!(b.ustar.len(), 2);
    }
}
