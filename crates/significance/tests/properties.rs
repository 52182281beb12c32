//! Property tests for the significance evaluator.

use proptest::prelude::*;
use ustar_significance::{ModelKind, significance};

fn kind() -> impl Strategy<Value = ModelKind> {
    prop_oneof![Just(ModelKind::TwoParameter), Just(ModelKind::ThreeParameter)]
}

proptest! {
    #[test]
    fn small_samples_are_undefined(fmax in 0.0f64..100.0, n in 0.0f64..9.999, kind in kind()) {
        prop_assert!(significance(fmax, n, kind).is_nan());
    }

    #[test]
    fn output_is_probability(fmax in 0.0f64..200.0, n in 10usize..3000, kind in kind()) {
        let p = significance(fmax, n as f64, kind);
        prop_assert!((0.0..=1.0).contains(&p), "p = {}", p);
    }

    #[test]
    fn non_increasing_in_fmax(
        a in 0.0f64..60.0,
        delta in 0.0f64..20.0,
        n in 10usize..1000,
        kind in kind(),
    ) {
        let p_lo = significance(a, n as f64, kind);
        let p_hi = significance(a + delta, n as f64, kind);
        prop_assert!(p_hi <= p_lo + 1e-9, "p({}) = {} > p({}) = {}", a + delta, p_hi, a, p_lo);
    }
}

#[test]
fn monotone_on_dense_grid() {
    for kind in [ModelKind::TwoParameter, ModelKind::ThreeParameter] {
        for n in [10.0, 12.0, 25.0, 50.0, 120.0, 900.0] {
            let mut prev = 1.0;
            for i in 0..=4000 {
                let f = i as f64 * 0.01;
                let p = significance(f, n, kind);
                assert!(p <= prev + 1e-9, "{kind:?} n={n} f={f}: {p} > {prev}");
                prev = p;
            }
        }
    }
}

#[test]
fn branch_boundaries_are_continuous_from_below() {
    // Just below the lowest critical value the extrapolated p approaches
    // 1 - lowest level.
    let table = ModelKind::TwoParameter.table();
    let cv = table.critical_values(50.0);
    let p = significance(cv[0] * (1.0 - 1e-9), 50.0, ModelKind::TwoParameter);
    assert!((p - 0.2).abs() < 1e-6, "p = {p}");

    let table = ModelKind::ThreeParameter.table();
    let cv = table.critical_values(50.0);
    let p = significance(cv[0] * (1.0 - 1e-9), 50.0, ModelKind::ThreeParameter);
    assert!((p - 0.1).abs() < 1e-6, "p = {p}");
}
