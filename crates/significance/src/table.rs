//! Critical F-max tables for the 2- and 3-parameter change-point models.
//!
//! Each table maps (sample size, significance level) to the critical F-max
//! value obtained by Monte Carlo simulation of the change-point search on
//! noise (Barr et al. 2013; Lund & Reeves 2002).

use std::sync::LazyLock;

use serde::Serialize;
use statrs::distribution::{Continuous, ContinuousCDF, FisherSnedecor};

use crate::error::SignificanceError;
use crate::pchip::Pchip;

/// Numerator degrees of freedom of the F distribution used by the
/// extrapolation branches. Fixed for both models.
pub const F_NUMERATOR_DF: f64 = 3.0;

/// Sample sizes below this have no defined significance.
pub const MIN_SAMPLE_SIZE: f64 = 10.0;

/// Reference probability for extrapolating above the highest critical value.
pub const UPPER_REFERENCE: f64 = 0.995;

/// Which change-point model a statistic belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// Operational model: sloped segment then zero-slope plateau.
    TwoParameter,
    /// Diagnostic model: both segment slopes free.
    ThreeParameter,
}

impl ModelKind {
    /// Number of fitted regression coefficients in the full model.
    pub fn n_params(self) -> usize {
        match self {
            ModelKind::TwoParameter => 2,
            ModelKind::ThreeParameter => 3,
        }
    }

    /// The process-wide critical table for this model.
    pub fn table(self) -> &'static CriticalValueTable {
        match self {
            ModelKind::TwoParameter => &TWO_PARAMETER,
            ModelKind::ThreeParameter => &THREE_PARAMETER,
        }
    }
}

/// Critical F-max values tabulated over sample size and significance level.
///
/// Rows are sample sizes (strictly increasing), columns are significance
/// levels (strictly increasing). Critical values must increase along each row.
#[derive(Clone, Debug)]
pub struct CriticalValueTable {
    levels: Vec<f64>,
    sizes: Vec<f64>,
    values: Vec<Vec<f64>>,
    lower_reference: f64,
}

impl CriticalValueTable {
    /// Builds a validated table.
    ///
    /// `lower_reference` is the F-distribution probability whose inverse
    /// anchors extrapolation below the lowest critical value.
    ///
    /// # Errors
    ///
    /// Returns [`SignificanceError::InvalidTable`] for fewer than two levels
    /// or sizes, ragged rows, levels or reference outside (0, 1), or critical
    /// values that do not increase with level, and
    /// [`SignificanceError::NotIncreasing`] for unsorted levels or sizes.
    pub fn new(
        levels: Vec<f64>,
        sizes: Vec<f64>,
        values: Vec<Vec<f64>>,
        lower_reference: f64,
    ) -> Result<Self, SignificanceError> {
        if levels.len() < 2 || sizes.len() < 2 {
            return Err(SignificanceError::InvalidTable {
                reason: format!(
                    "need at least 2 levels and 2 sizes, got {} and {}",
                    levels.len(),
                    sizes.len()
                ),
            });
        }
        if levels.iter().any(|&l| !(l > 0.0 && l < 1.0)) {
            return Err(SignificanceError::InvalidTable {
                reason: "levels must lie in (0, 1)".into(),
            });
        }
        if !(lower_reference > 0.0 && lower_reference < 1.0) {
            return Err(SignificanceError::InvalidTable {
                reason: format!("lower reference {lower_reference} outside (0, 1)"),
            });
        }
        if levels.windows(2).any(|w| w[1] <= w[0]) {
            return Err(SignificanceError::NotIncreasing { what: "levels" });
        }
        if sizes.iter().any(|v| !v.is_finite()) || sizes.windows(2).any(|w| w[1] <= w[0]) {
            return Err(SignificanceError::NotIncreasing {
                what: "sample sizes",
            });
        }
        if values.len() != sizes.len() {
            return Err(SignificanceError::InvalidTable {
                reason: format!("{} rows for {} sample sizes", values.len(), sizes.len()),
            });
        }
        for (i, row) in values.iter().enumerate() {
            if row.len() != levels.len() {
                return Err(SignificanceError::InvalidTable {
                    reason: format!(
                        "row {i} has {} columns, expected {}",
                        row.len(),
                        levels.len()
                    ),
                });
            }
            if row.iter().any(|v| !v.is_finite()) || row.windows(2).any(|w| w[1] <= w[0]) {
                return Err(SignificanceError::InvalidTable {
                    reason: format!("row {i} critical values must increase with level"),
                });
            }
        }
        Ok(Self {
            levels,
            sizes,
            values,
            lower_reference,
        })
    }

    fn builtin(levels: &[f64], sizes: &[f64], rows: &[&[f64]], lower_reference: f64) -> Self {
        Self {
            levels: levels.to_vec(),
            sizes: sizes.to_vec(),
            values: rows.iter().map(|r| r.to_vec()).collect(),
            lower_reference,
        }
    }

    /// Returns the significance levels (columns).
    pub fn levels(&self) -> &[f64] {
        &self.levels
    }

    /// Returns the tabulated sample sizes (rows).
    pub fn sizes(&self) -> &[f64] {
        &self.sizes
    }

    /// Returns the reference probability for low-side extrapolation.
    pub fn lower_reference(&self) -> f64 {
        self.lower_reference
    }

    /// Critical F-max at each level, interpolated in sample size `n`.
    ///
    /// Uses PCHIP along each column; sizes outside the table extrapolate
    /// with the end pieces.
    pub fn critical_values(&self, n: f64) -> Vec<f64> {
        (0..self.levels.len())
            .map(|j| {
                let column: Vec<f64> = self.values.iter().map(|row| row[j]).collect();
                Pchip::new(&self.sizes, &column).map_or(f64::NAN, |p| p.eval(n))
            })
            .collect()
    }

    /// Probability that a change point with statistic `fmax` over `n`
    /// points arose by chance.
    ///
    /// Returns `NaN` when `fmax` or `n` is `NaN` or `n < 10`. Otherwise the
    /// result lies in `[0, 1]` and does not increase with `fmax`.
    ///
    /// Between the lowest and highest critical values the probability is
    /// interpolated (PCHIP) over `1 - level`. Outside that range `fmax` is
    /// rescaled onto a central F(3, n) distribution and `2 * (1 - cdf)` is
    /// returned: below the range the lowest critical value is mapped to the
    /// table's lower reference quantile, above it the second-highest
    /// critical value is mapped to the 0.995 quantile.
    pub fn significance(&self, fmax: f64, n: f64) -> f64 {
        if fmax.is_nan() || n.is_nan() || n < MIN_SAMPLE_SIZE {
            return f64::NAN;
        }
        let critical = self.critical_values(n);
        let np = critical.len();
        let Ok(f_dist) = FisherSnedecor::new(F_NUMERATOR_DF, n) else {
            return f64::NAN;
        };

        if fmax < critical[0] {
            let f_ref = f_quantile(&f_dist, self.lower_reference);
            let adjusted = f_ref * fmax / critical[0];
            return (2.0 * (1.0 - f_dist.cdf(adjusted))).clamp(0.0, 1.0);
        }
        if fmax > critical[np - 1] {
            let f_ref = f_quantile(&f_dist, UPPER_REFERENCE);
            let adjusted = f_ref * fmax / critical[np - 2];
            return (2.0 * (1.0 - f_dist.cdf(adjusted))).clamp(0.0, 1.0);
        }

        let tail: Vec<f64> = self.levels.iter().map(|l| 1.0 - l).collect();
        match Pchip::new(&critical, &tail) {
            Ok(p) => p.eval(fmax).clamp(0.0, 1.0),
            Err(_) => f64::NAN,
        }
    }
}

/// Inverse CDF of `dist`, polished with Newton steps so that the
/// extrapolation branches meet the interpolated branch without a gap.
fn f_quantile(dist: &FisherSnedecor, p: f64) -> f64 {
    let mut x = dist.inverse_cdf(p);
    for _ in 0..6 {
        let density = dist.pdf(x);
        if !(density > 0.0) {
            break;
        }
        let step = (dist.cdf(x) - p) / density;
        x = (x - step).max(0.0);
        if step.abs() <= 1e-14 * x.max(1.0) {
            break;
        }
    }
    x
}

/// Significance of `fmax` over `n` points for the given model, using the
/// built-in critical tables.
pub fn significance(fmax: f64, n: f64, kind: ModelKind) -> f64 {
    kind.table().significance(fmax, n)
}

const TWO_PARAM_LEVELS: [f64; 4] = [0.80, 0.90, 0.95, 0.99];

const TWO_PARAM_SIZES: [f64; 13] = [
    10.0, 15.0, 20.0, 30.0, 50.0, 70.0, 100.0, 150.0, 200.0, 300.0, 500.0, 700.0, 1000.0,
];

#[rustfmt::skip]
const TWO_PARAM_VALUES: [[f64; 4]; 13] = [
    [3.9293, 6.2992, 9.1471, 18.2659],
    [3.7734, 5.6988, 7.6497, 12.6902],
    [3.7516, 5.5172, 7.2456, 11.0812],
    [3.7538, 5.3224, 6.8889, 10.2571],
    [3.7575, 5.2291, 6.7134, 9.6002],
    [3.7233, 5.1532, 6.5718, 9.2467],
    [3.7174, 5.1166, 6.4865, 9.1403],
    [3.7240, 5.0936, 6.3966, 8.9071],
    [3.7116, 5.0677, 6.3511, 8.7955],
    [3.7130, 5.0457, 6.3278, 8.7151],
    [3.7115, 5.0275, 6.2800, 8.6138],
    [3.7130, 5.0218, 6.2724, 8.5789],
    [3.7127, 5.0121, 6.2611, 8.5464],
];

const THREE_PARAM_LEVELS: [f64; 3] = [0.90, 0.95, 0.99];

const THREE_PARAM_SIZES: [f64; 23] = [
    10.0, 15.0, 20.0, 30.0, 40.0, 50.0, 70.0, 100.0, 150.0, 200.0, 300.0, 400.0, 500.0, 600.0,
    700.0, 800.0, 900.0, 1000.0, 1250.0, 1500.0, 2000.0, 2500.0, 3000.0,
];

#[rustfmt::skip]
const THREE_PARAM_VALUES: [[f64; 3]; 23] = [
    [11.646, 15.559, 28.412],
    [9.651, 11.948, 18.043],
    [9.379, 11.396, 16.249],
    [9.261, 11.148, 15.750],
    [9.269, 11.068, 15.237],
    [9.296, 11.089, 15.165],
    [9.296, 11.065, 14.885],
    [9.349, 11.097, 14.888],
    [9.283, 10.980, 14.810],
    [9.316, 11.040, 14.919],
    [9.340, 11.055, 14.797],
    [9.350, 11.067, 14.842],
    [9.359, 11.071, 14.951],
    [9.382, 11.089, 14.852],
    [9.372, 11.076, 14.860],
    [9.413, 11.099, 14.961],
    [9.397, 11.117, 14.926],
    [9.393, 11.095, 14.980],
    [9.370, 11.087, 14.923],
    [9.372, 11.065, 14.887],
    [9.395, 11.085, 14.902],
    [9.427, 11.121, 14.819],
    [9.402, 11.072, 14.796],
];

static TWO_PARAMETER: LazyLock<CriticalValueTable> = LazyLock::new(|| {
    let rows: Vec<&[f64]> = TWO_PARAM_VALUES.iter().map(|r| r.as_slice()).collect();
    CriticalValueTable::builtin(&TWO_PARAM_LEVELS, &TWO_PARAM_SIZES, &rows, 0.90)
});

static THREE_PARAMETER: LazyLock<CriticalValueTable> = LazyLock::new(|| {
    let rows: Vec<&[f64]> = THREE_PARAM_VALUES.iter().map(|r| r.as_slice()).collect();
    CriticalValueTable::builtin(&THREE_PARAM_LEVELS, &THREE_PARAM_SIZES, &rows, 0.95)
});

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn builtin_tables_pass_validation() {
        for kind in [ModelKind::TwoParameter, ModelKind::ThreeParameter] {
            let t = kind.table();
            let rebuilt = CriticalValueTable::new(
                t.levels.clone(),
                t.sizes.clone(),
                t.values.clone(),
                t.lower_reference,
            );
            assert!(rebuilt.is_ok(), "{kind:?}: {rebuilt:?}");
        }
    }

    #[test]
    fn table_shapes() {
        let two = ModelKind::TwoParameter.table();
        assert_eq!(two.levels().len(), 4);
        assert_eq!(two.sizes().len(), 13);
        assert_eq!(two.sizes()[12], 1000.0);
        let three = ModelKind::ThreeParameter.table();
        assert_eq!(three.levels().len(), 3);
        assert_eq!(three.sizes().len(), 23);
        assert_eq!(three.sizes()[22], 3000.0);
    }

    #[test]
    fn n_params() {
        assert_eq!(ModelKind::TwoParameter.n_params(), 2);
        assert_eq!(ModelKind::ThreeParameter.n_params(), 3);
    }

    #[test]
    fn critical_values_at_knot() {
        let cv = ModelKind::TwoParameter.table().critical_values(50.0);
        assert_relative_eq!(cv[0], 3.7575, epsilon = 1e-10);
        assert_relative_eq!(cv[3], 9.6002, epsilon = 1e-10);
    }

    #[test]
    fn significance_at_critical_value_is_tail_level() {
        let cv = ModelKind::TwoParameter.table().critical_values(50.0);
        assert_relative_eq!(
            significance(cv[2], 50.0, ModelKind::TwoParameter),
            0.05,
            epsilon = 1e-10
        );
        let cv3 = ModelKind::ThreeParameter.table().critical_values(100.0);
        assert_relative_eq!(
            significance(cv3[0], 100.0, ModelKind::ThreeParameter),
            0.10,
            epsilon = 1e-10
        );
    }

    #[test]
    fn undefined_inputs() {
        for kind in [ModelKind::TwoParameter, ModelKind::ThreeParameter] {
            assert!(significance(f64::NAN, 50.0, kind).is_nan());
            assert!(significance(10.0, f64::NAN, kind).is_nan());
            assert!(significance(10.0, 9.0, kind).is_nan());
        }
    }

    #[test]
    fn small_fmax_is_not_significant() {
        let p = significance(0.5, 50.0, ModelKind::TwoParameter);
        assert!(p > 0.2 && p <= 1.0, "p = {p}");
        assert_eq!(significance(0.0, 50.0, ModelKind::TwoParameter), 1.0);
    }

    #[test]
    fn large_fmax_is_significant() {
        let p = significance(40.0, 50.0, ModelKind::TwoParameter);
        assert!((0.0..0.01).contains(&p), "p = {p}");
        assert_eq!(significance(f64::INFINITY, 50.0, ModelKind::ThreeParameter), 0.0);
    }

    #[test]
    fn f_quantile_inverts_cdf() {
        let dist = FisherSnedecor::new(F_NUMERATOR_DF, 50.0).unwrap();
        for p in [0.9, 0.95, 0.995] {
            assert_relative_eq!(dist.cdf(f_quantile(&dist, p)), p, epsilon = 1e-12);
        }
    }

    #[test]
    fn custom_table_rejects_ragged_rows() {
        let err = CriticalValueTable::new(
            vec![0.9, 0.95],
            vec![10.0, 20.0],
            vec![vec![1.0, 2.0], vec![1.0]],
            0.9,
        )
        .unwrap_err();
        assert!(matches!(err, SignificanceError::InvalidTable { .. }));
    }

    #[test]
    fn custom_table_rejects_unsorted_sizes() {
        let err = CriticalValueTable::new(
            vec![0.9, 0.95],
            vec![20.0, 10.0],
            vec![vec![1.0, 2.0], vec![1.0, 2.0]],
            0.9,
        )
        .unwrap_err();
        assert_eq!(
            err,
            SignificanceError::NotIncreasing {
                what: "sample sizes"
            }
        );
    }

    #[test]
    fn custom_table_rejects_decreasing_row() {
        let err = CriticalValueTable::new(
            vec![0.9, 0.95],
            vec![10.0, 20.0],
            vec![vec![3.0, 2.0], vec![1.0, 2.0]],
            0.9,
        )
        .unwrap_err();
        assert!(matches!(err, SignificanceError::InvalidTable { .. }));
    }
}
