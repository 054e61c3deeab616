//! ITU-R reference radiation patterns: F.699, F.1245, F.1336 omni.

use crate::fold_angle_deg;

/// ITU-R F.699 reference pattern.
///
/// `d_lambda` is antenna diameter over wavelength; branches differ for
/// D/lambda above and below 100. Inside the main lobe the envelope is the
/// parabola `maxGain - 2.5e-3 (D/lambda * theta)^2`.
pub fn f699_gain(angle_deg: f64, max_gain_dbi: f64, d_lambda: f64) -> f64 {
    let theta = fold_angle_deg(angle_deg);

    let g1 = 2.0 + 15.0 * d_lambda.log10();
    let psi_m = 20.0 * (1.0 / d_lambda) * (max_gain_dbi - g1).max(0.0).sqrt();
    let psi_r = 15.85 * d_lambda.powf(-0.6);

    if d_lambda > 100.0 {
        if theta < psi_m {
            max_gain_dbi - 2.5e-3 * (d_lambda * theta).powi(2)
        } else if theta < psi_m.max(psi_r) {
            g1
        } else if theta < 120.0 {
            32.0 - 25.0 * theta.log10()
        } else {
            -20.0
        }
    } else if theta < psi_m {
        max_gain_dbi - 2.5e-3 * (d_lambda * theta).powi(2)
    } else if theta < psi_m.max(100.0 / d_lambda) {
        g1
    } else if theta < 48.0 {
        52.0 - 10.0 * d_lambda.log10() - 25.0 * theta.log10()
    } else {
        10.0 - 10.0 * d_lambda.log10()
    }
}

/// ITU-R F.1245 average sidelobe pattern.
pub fn f1245_gain(angle_deg: f64, max_gain_dbi: f64, d_lambda: f64) -> f64 {
    let theta = fold_angle_deg(angle_deg);

    let g1 = 2.0 + 15.0 * d_lambda.log10();
    let psi_m = 20.0 * (1.0 / d_lambda) * (max_gain_dbi - g1).max(0.0).sqrt();

    if d_lambda > 100.0 {
        // Transition where the 29 - 25 log(theta) envelope meets G1.
        let psi_r = 10f64.powf((29.0 - g1) / 25.0);
        if theta < psi_m {
            max_gain_dbi - 2.5e-3 * (d_lambda * theta).powi(2)
        } else if theta < psi_m.max(psi_r) {
            g1
        } else if theta < 48.0 {
            29.0 - 25.0 * theta.log10()
        } else {
            -13.0
        }
    } else if theta < psi_m {
        max_gain_dbi - 2.5e-3 * (d_lambda * theta).powi(2)
    } else if theta < 48.0 {
        (39.0 - 5.0 * d_lambda.log10() - 25.0 * theta.log10()).min(max_gain_dbi)
    } else {
        -3.0 - 5.0 * d_lambda.log10()
    }
}

/// ITU-R F.1336 omnidirectional average sidelobe envelope in elevation.
///
/// `k = 0.7` per the recommendation's typical sidelobe parameter. The
/// envelope is the max of the main-beam parabola and the far sidelobe
/// floor.
pub fn f1336_omni_gain(elevation_deg: f64, max_gain_dbi: f64) -> f64 {
    const K: f64 = 0.7;
    let theta = elevation_deg.abs().min(90.0);
    let theta3 = 107.6 * 10f64.powf(-0.1 * max_gain_dbi);

    let g1 = max_gain_dbi - 12.0 * (theta / theta3).powi(2);
    let g2 = max_gain_dbi - 12.0
        + 10.0 * ((theta / theta3).max(1.0).powf(-1.5) + K).log10();

    g1.max(g2)
}
