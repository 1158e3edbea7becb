//! Chebyshev series evaluation.
//!
//! SPK types 2 and 3 store each state component as a truncated Chebyshev
//! series `f(τ) = Σ c_k T_k(τ)` over the scaled domain `τ ∈ [-1, 1]`.
//! Values are computed with the Clenshaw recurrence; the first derivative
//! is computed analytically through the second-kind polynomials
//! (`d/dτ T_k = k·U_{k-1}`), not by finite differences — type-2 segments
//! store position only and velocity must be exact.
//!
//! No domain clamping happens here. Callers guarantee `τ ∈ [-1, 1]` by
//! construction; a record-selection failure must surface as an error
//! upstream rather than be masked by clamping.

use nalgebra::Vector3;

/// Evaluate `Σ c_k T_k(tau)` with the Clenshaw recurrence.
///
/// Degenerate cases: no coefficients evaluate to 0, a single coefficient is
/// the constant itself.
pub fn evaluate(coefficients: &[f64], tau: f64) -> f64 {
    let n = coefficients.len();
    if n == 0 {
        return 0.0;
    }
    if n == 1 {
        return coefficients[0];
    }

    // b_k = 2 tau b_{k+1} - b_{k+2} + c_k, with b_n = b_{n+1} = 0;
    // the series value is b_0 - tau * b_1.
    let mut b_kp2 = 0.0;
    let mut b_kp1 = 0.0;
    let mut b_k = 0.0;
    for &c in coefficients.iter().rev() {
        b_k = 2.0 * tau * b_kp1 - b_kp2 + c;
        b_kp2 = b_kp1;
        b_kp1 = b_k;
    }
    b_k - tau * b_kp2
}

/// Evaluate three independent series sharing the same `tau`, matching the
/// SPK storage pattern of separate X, Y, Z coefficient sets.
pub fn evaluate_vector(x: &[f64], y: &[f64], z: &[f64], tau: f64) -> Vector3<f64> {
    Vector3::new(evaluate(x, tau), evaluate(y, tau), evaluate(z, tau))
}

/// Evaluate `d/dτ Σ c_k T_k(τ) = Σ_{k≥1} k·c_k·U_{k-1}(τ)`.
///
/// The second-kind polynomials are generated incrementally
/// (`U_0 = 1`, `U_1 = 2τ`, `U_{m+1} = 2τ·U_m − U_{m−1}`) so no scratch
/// array is allocated. The result is in series units per unit `τ`; the
/// caller applies the `dτ/dt` chain-rule factor.
pub fn derivative(coefficients: &[f64], tau: f64) -> f64 {
    let degree = coefficients.len().saturating_sub(1);
    if degree == 0 {
        return 0.0;
    }

    let mut sum = coefficients[1]; // k = 1: 1 * c_1 * U_0
    if degree == 1 {
        return sum;
    }

    let mut u_prev = 1.0; // U_0
    let mut u = 2.0 * tau; // U_1
    sum += 2.0 * coefficients[2] * u;
    for k in 3..=degree {
        let u_next = 2.0 * tau * u - u_prev;
        sum += k as f64 * coefficients[k] * u_next;
        u_prev = u;
        u = u_next;
    }
    sum
}
