//! Validity filtering of the observation record.

use crate::observations::Observations;

/// Outcome of [`filter`].
#[derive(Debug, Clone, PartialEq)]
pub struct ValidSet {
    /// u* with out-of-range values replaced by `NaN`.
    pub ustar: Vec<f64>,
    /// Positions that are nighttime with NEE, filtered u* and temperature
    /// all present, in ascending order.
    pub indices: Vec<usize>,
}

impl ValidSet {
    /// Number of valid positions.
    pub fn count(&self) -> usize {
        self.indices.len()
    }
}

/// Copy of `ustar` with values outside `[low, high)` set to `NaN`.
pub fn filter_ustar(ustar: &[f64], (low, high): (f64, f64)) -> Vec<f64> {
    ustar
        .iter()
        .map(|&u| if u >= low && u < high { u } else { f64::NAN })
        .collect()
}

/// Filters u* to `range` and selects the usable nighttime points.
///
/// Never fails: an all-invalid record yields an empty index set.
pub fn filter(
    ustar: &[f64],
    night: &[bool],
    nee: &[f64],
    temp: &[f64],
    range: (f64, f64),
) -> ValidSet {
    let ustar = filter_ustar(ustar, range);
    let indices = ustar
        .iter()
        .zip(night)
        .zip(nee.iter().zip(temp))
        .enumerate()
        .filter(|(_, ((u, n), (f, t)))| **n && !(*u + *f + *t).is_nan())
        .map(|(i, _)| i)
        .collect();
    ValidSet { ustar, indices }
}

/// [`filter`] applied to a whole record.
pub fn filter_observations(obs: &Observations, range: (f64, f64)) -> ValidSet {
    filter(obs.ustar(), obs.night(), obs.nee(), obs.temp(), range)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_ustar_is_nan() {
        let f = filter_ustar(&[-1.0, 0.5, 3.5], (0.0, 3.0));
        assert!(f[0].is_nan());
        assert_eq!(f[1], 0.5);
        assert!(f[2].is_nan());
    }

    #[test]
    fn range_is_half_open() {
        let f = filter_ustar(&[0.0, 3.0, 2.999], (0.0, 3.0));
        assert_eq!(f[0], 0.0);
        assert!(f[1].is_nan());
        assert_eq!(f[2], 2.999);
    }

    #[test]
    fn night_flag_selects() {
        let v = filter(
            &[0.2, 0.3, 0.4],
            &[true, false, true],
            &[1.0, 2.0, 3.0],
            &[5.0, 6.0, 7.0],
            (0.0, 3.0),
        );
        assert_eq!(v.indices, vec![0, 2]);
        assert_eq!(v.count(), 2);
    }

    #[test]
    fn any_missing_excludes() {
        let v = filter(
            &[0.2, 0.3, 5.0, 0.4],
            &[true; 4],
            &[f64::NAN, 2.0, 3.0, 4.0],
            &[5.0, f64::NAN, 7.0, 8.0],
            (0.0, 3.0),
        );
        assert_eq!(v.indices, vec![3]);
    }

    #[test]
    fn all_invalid_is_empty() {
        let v = filter(&[0.2; 3], &[false; 3], &[1.0; 3], &[1.0; 3], (0.0, 3.0));
        assert!(v.indices.is_empty());
        assert_eq!(v.count(), 0);
    }
}
