//! Closed-form predictions for the spread of a hit placed uniformly inside
//! the central bin of a three-bin multinomial.
//!
//! `prob_a` is the probability of the bin before the central one, `prob_b`
//! the probability of the central bin, `entry_n` the number of entries per
//! multinomial draw. None of these functions guard their domain: a zero
//! denominator or a negative radicand yields a non-finite value.

use ndarray::Array1;

const SQRT_3: f64 = 1.732_050_807_568_877_2;

pub fn delta(value: f64) -> f64 {
    SQRT_3 * (0.5 * 0.5 / value - 0.5 + 1.0 / 3.0 - 1.0 / 3.0 * value)
}

/// Exact prediction: `sqrt(entry_n²/12 · prob_b² + residual)`.
pub fn err_pre(prob_a: f64, entry_n: f64, prob_b: f64) -> f64 {
    (err_pre_base_value(entry_n, prob_b) + err_pre_residual(prob_a, entry_n, prob_b)).sqrt()
}

/// First-order expansion of [`err_pre`] around the base value.
pub fn err_pre_approx(prob_a: f64, entry_n: f64, prob_b: f64) -> f64 {
    let base_value = entry_n / 12f64.sqrt() * prob_b;
    let residual = SQRT_3 / prob_b * (-(prob_a - 0.5) * (prob_a - 0.5) + 0.25);
    base_value + residual
}

/// Prediction without the `prob_a` dependent residual. Constant in `prob_a`.
pub fn err_pre_base(entry_n: f64, prob_b: f64) -> f64 {
    err_pre_base_value(entry_n, prob_b).sqrt()
}

/// Term under the square root of [`err_pre`] that depends on `prob_a`.
pub fn err_pre_residual(prob_a: f64, entry_n: f64, prob_b: f64) -> f64 {
    entry_n
        * (prob_a - prob_a * prob_a - prob_b * prob_a + prob_b / 3.0 - prob_b * prob_b / 3.0)
}

fn err_pre_base_value(entry_n: f64, prob_b: f64) -> f64 {
    entry_n * entry_n / 12.0 * prob_b * prob_b
}

// ───────── array forms ─────────

pub fn err_pre_curve(prob_a: &Array1<f64>, entry_n: f64, prob_b: f64) -> Array1<f64> {
    prob_a.mapv(|pa| err_pre(pa, entry_n, prob_b))
}

pub fn err_pre_approx_curve(prob_a: &Array1<f64>, entry_n: f64, prob_b: f64) -> Array1<f64> {
    prob_a.mapv(|pa| err_pre_approx(pa, entry_n, prob_b))
}

/// The base value repeated once per `prob_a` sample, for drawing a flat line.
pub fn err_pre_base_curve(prob_a: &Array1<f64>, entry_n: f64, prob_b: f64) -> Array1<f64> {
    Array1::from_elem(prob_a.len(), err_pre_base(entry_n, prob_b))
}
