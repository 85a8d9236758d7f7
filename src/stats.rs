//! Chi-squared distribution quantiles, used to scale confidence radii.

/// Lanczos approximation (g=7, n=9) coefficients
const LANCZOS_G: f64 = 7.0;

const LANCZOS_COEFFICIENTS: [f64; 9] = [
    0.999_999_999_999_809_9,
    676.520_368_121_885_1,
    -1_259.139_216_722_402_8,
    771.323_428_777_653_1,
    -176.615_029_162_140_6,
    12.507_343_278_686_905,
    -0.138_571_095_265_720_12,
    9.984_369_578_019_572E-6,
    1.505_632_735_149_311_6E-7,
];

const EPSILON: f64 = 1.0E-15;

const FLOAT_MIN: f64 = 1.0E-300;

const MAX_ITERATIONS: usize = 1000;

/// Natural logarithm of the Gamma function
pub(crate) fn ln_gamma(x: f64) -> f64 {
    if x < 0.5 {
        // reflection formula
        let pi = std::f64::consts::PI;
        return (pi / (pi * x).sin().abs()).ln() - ln_gamma(1.0 - x);
    }

    let x = x - 1.0;
    let t = x + LANCZOS_G + 0.5;

    let a = LANCZOS_COEFFICIENTS
        .iter()
        .enumerate()
        .skip(1)
        .fold(LANCZOS_COEFFICIENTS[0], |acc, (i, c)| acc + c / (x + i as f64));

    0.5 * (2.0 * std::f64::consts::PI).ln() + (x + 0.5) * t.ln() - t + a.ln()
}

/// Regularized lower incomplete Gamma function P(a, x)
pub(crate) fn regularized_gamma_p(a: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }

    let ln_prefactor = -x + a * x.ln() - ln_gamma(a);

    if x < a + 1.0 {
        // series representation
        let mut ap = a;
        let mut sum = 1.0 / a;
        let mut del = sum;
        for _ in 0..MAX_ITERATIONS {
            ap += 1.0;
            del *= x / ap;
            sum += del;
            if del.abs() < sum.abs() * EPSILON {
                break;
            }
        }
        sum * ln_prefactor.exp()
    } else {
        // continued fraction for Q(a, x) (modified Lentz)
        let mut b = x + 1.0 - a;
        let mut c = 1.0 / FLOAT_MIN;
        let mut d = 1.0 / b;
        let mut h = d;
        for i in 1..MAX_ITERATIONS {
            let an = -(i as f64) * (i as f64 - a);
            b += 2.0;
            d = an * d + b;
            if d.abs() < FLOAT_MIN {
                d = FLOAT_MIN;
            }
            c = b + an / c;
            if c.abs() < FLOAT_MIN {
                c = FLOAT_MIN;
            }
            d = 1.0 / d;
            let del = d * c;
            h *= del;
            if (del - 1.0).abs() < EPSILON {
                break;
            }
        }
        1.0 - ln_prefactor.exp() * h
    }
}

/// Chi-squared cumulative distribution function
pub fn chi_squared_cdf(x: f64, degrees_of_freedom: u32) -> f64 {
    regularized_gamma_p(degrees_of_freedom as f64 / 2.0, x / 2.0)
}

/// Chi-squared probability density function
fn chi_squared_pdf(x: f64, degrees_of_freedom: u32) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    let k_2 = degrees_of_freedom as f64 / 2.0;
    ((k_2 - 1.0) * x.ln() - x / 2.0 - k_2 * 2.0_f64.ln() - ln_gamma(k_2)).exp()
}

/// Returns the chi-squared value (inverse cumulative distribution) for desired confidence
/// level and degrees of freedom: a random variable following that distribution
/// falls below the returned value with probability `confidence_level`.
///
/// ## Input
/// - confidence_level: within ]0, 1[, any other value is a contract violation and panics.
/// - degrees_of_freedom: > 0
pub fn chi_squared_quantile(confidence_level: f64, degrees_of_freedom: u32) -> f64 {
    assert!(
        confidence_level > 0.0 && confidence_level < 1.0,
        "confidence level must be within ]0, 1[ (got {})",
        confidence_level
    );
    assert!(degrees_of_freedom > 0, "degrees of freedom must be positive");

    if degrees_of_freedom == 2 {
        // closed form
        return -2.0 * (1.0 - confidence_level).ln();
    }

    let (mut lo, mut hi) = (0.0_f64, (degrees_of_freedom as f64).max(1.0));
    while chi_squared_cdf(hi, degrees_of_freedom) < confidence_level {
        lo = hi;
        hi *= 2.0;
    }

    // bracketed Newton-Raphson
    let mut x = 0.5 * (lo + hi);
    for _ in 0..MAX_ITERATIONS {
        let f = chi_squared_cdf(x, degrees_of_freedom) - confidence_level;
        if f == 0.0 {
            return x;
        }
        if f < 0.0 {
            lo = x;
        } else {
            hi = x;
        }

        let pdf = chi_squared_pdf(x, degrees_of_freedom);

        let mut next = if pdf > 0.0 { x - f / pdf } else { 0.5 * (lo + hi) };
        if !(next > lo && next < hi) {
            next = 0.5 * (lo + hi);
        }

        if (next - x).abs() <= 1.0E-14 * x.max(1.0) {
            return next;
        }
        x = next;
    }
    x
}

#[cfg(test)]
mod test {
    use super::{chi_squared_cdf, chi_squared_quantile, ln_gamma};
    use rstest::rstest;

    #[test]
    fn log_gamma() {
        // Γ(1/2) = √π
        let expected = std::f64::consts::PI.sqrt().ln();
        assert!((ln_gamma(0.5) - expected).abs() < 1.0E-12);
        // Γ(10) = 9!
        assert!((ln_gamma(10.0) - 362880.0_f64.ln()).abs() < 1.0E-12);
        assert!(ln_gamma(1.0).abs() < 1.0E-12);
    }

    #[rstest]
    #[case(0.5, 1, 0.4549364231195727)]
    #[case(0.68, 1, 0.9889464814780237)]
    #[case(0.95, 1, 3.8414588206941236)]
    #[case(0.99, 1, 6.634896601021211)]
    #[case(0.5, 2, 1.3862943611198906)]
    #[case(0.95, 2, 5.991464547107979)]
    #[case(0.5, 3, 2.365973884375338)]
    #[case(0.95, 3, 7.814727903251178)]
    #[case(0.99, 3, 11.344866730144373)]
    fn quantiles(#[case] p: f64, #[case] dof: u32, #[case] expected: f64) {
        let value = chi_squared_quantile(p, dof);
        assert!(
            (value - expected).abs() < 1.0E-9 * expected.max(1.0),
            "chi2({}, {}) = {}, expecting {}",
            p,
            dof,
            value,
            expected
        );
    }

    #[test]
    fn quantile_cdf_consistency() {
        for dof in 1..=4 {
            for p in [0.01, 0.1, 0.39, 0.68, 0.9, 0.999] {
                let x = chi_squared_quantile(p, dof);
                assert!((chi_squared_cdf(x, dof) - p).abs() < 1.0E-10);
            }
        }
    }

    #[test]
    fn quantile_monotonic() {
        let mut prev = 0.0;
        for p in [0.05, 0.2, 0.5, 0.68, 0.8, 0.95, 0.99] {
            let value = chi_squared_quantile(p, 1);
            assert!(value > prev);
            prev = value;
        }
    }

    #[test]
    #[should_panic]
    fn invalid_confidence_level() {
        let _ = chi_squared_quantile(1.0, 2);
    }

    #[test]
    #[should_panic]
    fn null_confidence_level() {
        let _ = chi_squared_quantile(0.0, 1);
    }
}
