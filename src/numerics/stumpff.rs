//! Stumpff functions C2(ψ) and C3(ψ) for the universal-variable formulation.
//!
//! Trigonometric forms for ψ > 0, hyperbolic forms for ψ < 0, and a Taylor
//! series inside `SERIES_BAND` where both closed forms lose precision.

const SERIES_BAND: f64 = 1e-3;

pub fn c2(psi: f64) -> f64 {
    if psi.abs() < SERIES_BAND {
        1.0 / 2.0 - psi / 24.0 + psi * psi / 720.0 - psi * psi * psi / 40_320.0
    } else if psi > 0.0 {
        (1.0 - psi.sqrt().cos()) / psi
    } else {
        (1.0 - (-psi).sqrt().cosh()) / psi
    }
}

pub fn c3(psi: f64) -> f64 {
    if psi.abs() < SERIES_BAND {
        1.0 / 6.0 - psi / 120.0 + psi * psi / 5_040.0 - psi * psi * psi / 362_880.0
    } else if psi > 0.0 {
        let sqrt_psi = psi.sqrt();
        (sqrt_psi - sqrt_psi.sin()) / (psi * sqrt_psi)
    } else {
        let sqrt_neg = (-psi).sqrt();
        (sqrt_neg.sinh() - sqrt_neg) / (-psi * sqrt_neg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use test_case::test_case;

    #[test]
    fn limits_at_zero() {
        assert_eq!(c2(0.0), 0.5);
        assert_eq!(c3(0.0), 1.0 / 6.0);
    }

    #[test]
    fn branches_agree_across_zero() {
        for psi in [1e-3, 2e-3, 5e-3] {
            // closed forms just outside the band versus the series just inside
            assert_abs_diff_eq!(c2(psi), c2(psi * 0.999_999), epsilon = 1e-9);
            assert_abs_diff_eq!(c2(-psi), c2(-psi * 0.999_999), epsilon = 1e-9);
            assert_abs_diff_eq!(c3(psi), c3(psi * 0.999_999), epsilon = 1e-9);
            assert_abs_diff_eq!(c3(-psi), c3(-psi * 0.999_999), epsilon = 1e-9);
        }
        assert_abs_diff_eq!(c2(1e-6), c2(-1e-6), epsilon = 1e-7);
        assert_abs_diff_eq!(c3(1e-6), c3(-1e-6), epsilon = 1e-7);
    }

    #[test]
    fn series_matches_closed_form_at_band_edge() {
        let psi: f64 = SERIES_BAND;
        let closed_c2 = (1.0 - psi.sqrt().cos()) / psi;
        let closed_c3 = (psi.sqrt() - psi.sqrt().sin()) / (psi * psi.sqrt());
        assert_abs_diff_eq!(c2(psi * 0.999_999_9), closed_c2, epsilon = 1e-10);
        assert_abs_diff_eq!(c3(psi * 0.999_999_9), closed_c3, epsilon = 1e-9);
    }

    #[test_case(std::f64::consts::PI.powi(2), 2.0 / std::f64::consts::PI.powi(2); "psi = pi squared")]
    #[test_case(-1.0, (1.0_f64.cosh() - 1.0); "psi = -1")]
    fn c2_closed_form_values(psi: f64, expected: f64) {
        assert_abs_diff_eq!(c2(psi), expected, epsilon = 1e-14);
    }
}
