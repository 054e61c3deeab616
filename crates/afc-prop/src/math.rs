//! Small numeric helpers shared by the statistical loss models.

/// Inverse cumulative standard normal, rational approximation
/// (Abramowitz & Stegun 26.2.23, the same form the ITM core uses for its
/// confidence deviates). Absolute error below 4.5e-4.
pub fn inv_normal(p: f64) -> f64 {
    debug_assert!(p > 0.0 && p < 1.0, "probability must be in (0, 1)");

    fn rational(t: f64) -> f64 {
        const C0: f64 = 2.515516698;
        const C1: f64 = 0.802853;
        const C2: f64 = 0.010328;
        const D1: f64 = 1.432788;
        const D2: f64 = 0.189269;
        const D3: f64 = 0.001308;
        t - (C0 + t * (C1 + t * C2)) / (1.0 + t * (D1 + t * (D2 + t * D3)))
    }

    if p < 0.5 {
        -rational((-2.0 * p.ln()).sqrt())
    } else {
        rational((-2.0 * (1.0 - p).ln()).sqrt())
    }
}
