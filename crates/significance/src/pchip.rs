//! Shape-preserving piecewise cubic Hermite interpolation (Fritsch-Carlson).
//!
//! Slopes follow the weighted harmonic mean rule with the one-sided
//! three-point end conditions used by MATLAB's `pchip`. Queries outside the
//! knot range extrapolate with the end cubic pieces, matching `interp1(...,
//! 'pchip')`.

use crate::error::SignificanceError;

/// Monotonicity-preserving cubic interpolant over strictly increasing knots.
#[derive(Debug, Clone)]
pub struct Pchip {
    x: Vec<f64>,
    y: Vec<f64>,
    d: Vec<f64>,
}

impl Pchip {
    /// Builds the interpolant through `(x[i], y[i])`.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`SignificanceError::LengthMismatch`] | `x.len() != y.len()` |
    /// | [`SignificanceError::TooFewPoints`] | fewer than 2 knots |
    /// | [`SignificanceError::NotIncreasing`] | `x` not finite and strictly increasing |
    pub fn new(x: &[f64], y: &[f64]) -> Result<Self, SignificanceError> {
        if x.len() != y.len() {
            return Err(SignificanceError::LengthMismatch {
                x: x.len(),
                y: y.len(),
            });
        }
        if x.len() < 2 {
            return Err(SignificanceError::TooFewPoints { n: x.len() });
        }
        if x.iter().any(|v| !v.is_finite()) || x.windows(2).any(|w| w[1] <= w[0]) {
            return Err(SignificanceError::NotIncreasing { what: "abscissae" });
        }

        let d = slopes(x, y);
        Ok(Self {
            x: x.to_vec(),
            y: y.to_vec(),
            d,
        })
    }

    /// Evaluates the interpolant at `xq`. Returns `NaN` for `NaN` input.
    pub fn eval(&self, xq: f64) -> f64 {
        if xq.is_nan() {
            return f64::NAN;
        }
        let k = self.interval(xq);
        let h = self.x[k + 1] - self.x[k];
        let delta = (self.y[k + 1] - self.y[k]) / h;
        let (d0, d1) = (self.d[k], self.d[k + 1]);
        let c = (3.0 * delta - 2.0 * d0 - d1) / h;
        let b = (d0 - 2.0 * delta + d1) / (h * h);
        let s = xq - self.x[k];
        self.y[k] + s * (d0 + s * (c + s * b))
    }

    /// Index of the piece used for `xq`, clamped to the end pieces.
    fn interval(&self, xq: f64) -> usize {
        let last = self.x.len() - 2;
        match self.x.partition_point(|&v| v <= xq) {
            0 => 0,
            i => (i - 1).min(last),
        }
    }
}

fn slopes(x: &[f64], y: &[f64]) -> Vec<f64> {
    let n = x.len();
    let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();
    let delta: Vec<f64> = (0..n - 1).map(|k| (y[k + 1] - y[k]) / h[k]).collect();

    if n == 2 {
        return vec![delta[0]; 2];
    }

    let mut d = vec![0.0; n];
    for k in 1..n - 1 {
        let (dl, dr) = (delta[k - 1], delta[k]);
        if dl * dr > 0.0 {
            let w1 = 2.0 * h[k] + h[k - 1];
            let w2 = h[k] + 2.0 * h[k - 1];
            d[k] = (w1 + w2) / (w1 / dl + w2 / dr);
        }
    }
    d[0] = end_slope(h[0], h[1], delta[0], delta[1]);
    d[n - 1] = end_slope(h[n - 2], h[n - 3], delta[n - 2], delta[n - 3]);
    d
}

/// One-sided three-point slope, limited so the end piece stays shape-preserving.
fn end_slope(h0: f64, h1: f64, del0: f64, del1: f64) -> f64 {
    let d = ((2.0 * h0 + h1) * del0 - h0 * del1) / (h0 + h1);
    if d.signum() != del0.signum() || del0 == 0.0 {
        0.0
    } else if del0.signum() != del1.signum() && d.abs() > (3.0 * del0).abs() {
        3.0 * del0
    } else {
        d
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn reproduces_knots() {
        let x = [1.0, 2.0, 4.0, 7.0, 8.0];
        let y = [3.0, 1.0, 5.0, 5.5, 9.0];
        let p = Pchip::new(&x, &y).unwrap();
        for (xi, yi) in x.iter().zip(y.iter()) {
            assert_relative_eq!(p.eval(*xi), *yi, epsilon = 1e-12);
        }
    }

    #[test]
    fn two_points_is_linear() {
        let p = Pchip::new(&[0.0, 2.0], &[1.0, 5.0]).unwrap();
        assert_relative_eq!(p.eval(0.5), 2.0, epsilon = 1e-12);
        assert_relative_eq!(p.eval(3.0), 7.0, epsilon = 1e-12);
        assert_relative_eq!(p.eval(-1.0), -1.0, epsilon = 1e-12);
    }

    #[test]
    fn linear_data_is_exact() {
        let x = [0.0, 1.0, 3.0, 6.0];
        let y: Vec<f64> = x.iter().map(|v| 2.0 * v - 1.0).collect();
        let p = Pchip::new(&x, &y).unwrap();
        assert_relative_eq!(p.eval(2.2), 3.4, epsilon = 1e-12);
        assert_relative_eq!(p.eval(4.5), 8.0, epsilon = 1e-12);
    }

    #[test]
    fn preserves_monotonicity() {
        let x = [0.0, 1.0, 2.0, 3.0, 4.0];
        let y = [0.0, 0.1, 5.0, 5.1, 10.0];
        let p = Pchip::new(&x, &y).unwrap();
        let mut prev = p.eval(0.0);
        for i in 1..=400 {
            let v = p.eval(i as f64 * 0.01);
            assert!(v >= prev - 1e-12, "decrease at {}", i as f64 * 0.01);
            prev = v;
        }
    }

    #[test]
    fn no_overshoot_on_flat_segment() {
        let x = [0.0, 1.0, 2.0, 3.0];
        let y = [0.0, 1.0, 1.0, 2.0];
        let p = Pchip::new(&x, &y).unwrap();
        for i in 0..=100 {
            let v = p.eval(1.0 + i as f64 * 0.01);
            assert_relative_eq!(v, 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn matches_matlab_reference() {
        // MATLAB: pchip([1 2 3 4], [1 4 9 16], 2.5) = 6.2396
        let p = Pchip::new(&[1.0, 2.0, 3.0, 4.0], &[1.0, 4.0, 9.0, 16.0]).unwrap();
        assert_relative_eq!(p.eval(2.5), 6.239583, epsilon = 1e-5);
    }

    #[test]
    fn nan_query() {
        let p = Pchip::new(&[0.0, 1.0], &[0.0, 1.0]).unwrap();
        assert!(p.eval(f64::NAN).is_nan());
    }

    #[test]
    fn rejects_bad_knots() {
        assert_eq!(
            Pchip::new(&[1.0], &[1.0]).unwrap_err(),
            SignificanceError::TooFewPoints { n: 1 }
        );
        assert_eq!(
            Pchip::new(&[1.0, 2.0], &[1.0]).unwrap_err(),
            SignificanceError::LengthMismatch { x: 2, y: 1 }
        );
        assert!(matches!(
            Pchip::new(&[1.0, 1.0, 2.0], &[1.0, 2.0, 3.0]),
            Err(SignificanceError::NotIncreasing { .. })
        ));
        assert!(matches!(
            Pchip::new(&[1.0, f64::NAN], &[1.0, 2.0]),
            Err(SignificanceError::NotIncreasing { .. })
        ));
    }
}
