//! Stack-allocated least squares for the tiny design matrices of the
//! change-point models.
//!
//! All models have at most three coefficients, so the normal equations are
//! solved by Gauss-Jordan elimination on a `P x P` matrix without heap
//! allocation. This runs once per candidate breakpoint, which makes it the
//! hot loop of the whole engine.

/// Stack-allocated P x P matrix stored in row-major order.
#[derive(Clone, Copy, Debug)]
pub(crate) struct SmallMat<const P: usize> {
    pub(crate) rows: [[f64; P]; P],
}

impl<const P: usize> SmallMat<P> {
    /// Returns a zero-initialized matrix.
    #[inline(always)]
    pub(crate) fn zeros() -> Self {
        Self {
            rows: [[0.0; P]; P],
        }
    }

    /// Returns the element at `(row, col)`.
    #[inline(always)]
    pub(crate) fn get(&self, row: usize, col: usize) -> f64 {
        self.rows[row][col]
    }

    /// Inverse by Gauss-Jordan elimination with partial pivoting.
    ///
    /// Returns `None` when a pivot is negligible relative to the largest
    /// element.
    pub(crate) fn inverse(&self) -> Option<Self> {
        let scale = self
            .rows
            .iter()
            .flatten()
            .map(|v| v.abs())
            .fold(0.0_f64, f64::max);
        if !(scale > 0.0) || !scale.is_finite() {
            return None;
        }
        let tol = scale * 1e-13;

        let mut a = self.rows;
        let mut inv = Self::zeros().rows;
        for (i, row) in inv.iter_mut().enumerate() {
            row[i] = 1.0;
        }

        for col in 0..P {
            let pivot = (col..P)
                .max_by(|&r1, &r2| a[r1][col].abs().total_cmp(&a[r2][col].abs()))
                .unwrap_or(col);
            if a[pivot][col].abs() <= tol {
                return None;
            }
            a.swap(col, pivot);
            inv.swap(col, pivot);

            let d = a[col][col];
            for k in 0..P {
                a[col][k] /= d;
                inv[col][k] /= d;
            }
            for r in 0..P {
                if r == col {
                    continue;
                }
                let f = a[r][col];
                if f == 0.0 {
                    continue;
                }
                for k in 0..P {
                    a[r][k] -= f * a[col][k];
                    inv[r][k] -= f * inv[col][k];
                }
            }
        }
        Some(Self { rows: inv })
    }
}

/// Result of an ordinary least squares fit with `P` coefficients.
#[derive(Clone, Copy, Debug)]
pub(crate) struct OlsFit<const P: usize> {
    pub(crate) coef: [f64; P],
    pub(crate) sse: f64,
    /// `(X'X)^-1`; multiply by the residual variance for the covariance.
    pub(crate) xtx_inv: SmallMat<P>,
}

impl<const P: usize> OlsFit<P> {
    /// Standard errors of the coefficients given `n` observations.
    ///
    /// All zero when the fit is exact; `NaN` when `n <= P`.
    pub(crate) fn std_errors(&self, n: usize) -> [f64; P] {
        if n <= P {
            return [f64::NAN; P];
        }
        let sigma2 = self.sse / (n - P) as f64;
        std::array::from_fn(|j| (sigma2 * self.xtx_inv.get(j, j)).max(0.0).sqrt())
    }
}

/// Fits `y ~ design` by least squares. `design(j)` returns row `j` of X.
///
/// Returns `None` for a singular design or fewer rows than coefficients.
pub(crate) fn least_squares<const P: usize>(
    n: usize,
    design: impl Fn(usize) -> [f64; P],
    y: &[f64],
) -> Option<OlsFit<P>> {
    if n < P || y.len() < n {
        return None;
    }
    let mut xtx = SmallMat::<P>::zeros();
    let mut xty = [0.0; P];
    for (j, &yj) in y.iter().enumerate().take(n) {
        let row = design(j);
        for a in 0..P {
            xty[a] += row[a] * yj;
            for b in a..P {
                xtx.rows[a][b] += row[a] * row[b];
            }
        }
    }
    for a in 0..P {
        for b in 0..a {
            xtx.rows[a][b] = xtx.rows[b][a];
        }
    }

    let xtx_inv = xtx.inverse()?;
    let coef: [f64; P] =
        std::array::from_fn(|a| (0..P).map(|b| xtx_inv.get(a, b) * xty[b]).sum());

    let sse = y
        .iter()
        .enumerate()
        .take(n)
        .map(|(j, &yj)| {
            let row = design(j);
            let fitted: f64 = (0..P).map(|a| coef[a] * row[a]).sum();
            (yj - fitted) * (yj - fitted)
        })
        .sum();

    Some(OlsFit { coef, sse, xtx_inv })
}

/// Straight-line fit `y = c0 + c1 x`.
pub(crate) fn line(x: &[f64], y: &[f64]) -> Option<OlsFit<2>> {
    least_squares(x.len(), |j| [1.0, x[j]], y)
}
