//! Passive-repeater discrimination: back-to-back antennas and billboard
//! reflectors.

use afc_core::codes::AntennaCategory;

use crate::r2aip07::r2aip07_gain;
use crate::Result;

/// Discrimination of a back-to-back repeater antenna at an off-boresight
/// angle: the R2-AIP-07 gain relative to boresight (always <= 0).
pub fn back_to_back_discrimination(
    angle_off_boresight_deg: f64,
    freq_mhz: f64,
    model_blank: bool,
    category: AntennaCategory,
    max_gain_dbi: f64,
    d_lambda: f64,
) -> Result<f64> {
    let (gain, _) = r2aip07_gain(
        angle_off_boresight_deg,
        freq_mhz,
        model_blank,
        category,
        false,
        max_gain_dbi,
        d_lambda,
    )?;
    Ok(gain - max_gain_dbi)
}

/// Billboard-reflector discrimination with its reported components.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BillboardDiscrimination {
    /// `max(d0, d1)`, dB.
    pub discrimination_db: f64,
    /// Aperture term `-10 log10(4 pi W H cos(theta_in))`, dB.
    pub d0_db: f64,
    /// Angular sinc-envelope term, dB.
    pub d1_db: f64,
}

/// `sin(pi x) / (pi x)` with the removable singularity at 0.
fn sinc(x: f64) -> f64 {
    if x.abs() < 1.0e-12 {
        1.0
    } else {
        (std::f64::consts::PI * x).sin() / (std::f64::consts::PI * x)
    }
}

/// Billboard reflector discrimination at an off-boresight angle.
///
/// Geometry factors are precomputed per reflector: `s_lambda` is the
/// projected aperture width in wavelengths and `theta1_deg` the boundary
/// of the sinc main-lobe branch. `width_lambda`/`height_lambda` are the
/// raw reflector dimensions and `theta_in_deg` the through-path incidence
/// angle.
pub fn billboard_discrimination(
    angle_off_boresight_deg: f64,
    width_lambda: f64,
    height_lambda: f64,
    theta_in_deg: f64,
    s_lambda: f64,
    theta1_deg: f64,
) -> BillboardDiscrimination {
    let theta = angle_off_boresight_deg.abs();

    let d0 = -10.0
        * (4.0 * std::f64::consts::PI
            * width_lambda
            * height_lambda
            * theta_in_deg.to_radians().cos())
        .log10();

    let u = s_lambda * theta.to_radians().sin();

    let d1 = if theta <= theta1_deg {
        20.0 * sinc(u).abs().log10()
    } else if theta <= 20.0 {
        -20.0 * (std::f64::consts::PI * u.abs()).log10()
    } else {
        let u20 = s_lambda * 20f64.to_radians().sin();
        -20.0 * (std::f64::consts::PI * u20.abs()).log10() - 0.4165 * (theta - 20.0)
    };

    BillboardDiscrimination {
        discrimination_db: d0.max(d1),
        d0_db: d0,
        d1_db: d1,
    }
}

/// First angle where the sinc main-lobe envelope meets the
/// `-20 log10(pi u)` envelope: `sin(theta1) = 1 / (2 s_lambda)`.
pub fn billboard_theta1_deg(s_lambda: f64) -> f64 {
    (1.0 / (2.0 * s_lambda)).clamp(-1.0, 1.0).asin().to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_grazing_d0_component() {
        // S/lambda = 50, theta_in = 30 deg, theta = 0.
        let s_lambda = 50.0;
        let (w, h) = (60.0, 45.0);
        let theta1 = billboard_theta1_deg(s_lambda);
        let d = billboard_discrimination(0.0, w, h, 30.0, s_lambda, theta1);
        let expected_d0 =
            -10.0 * (4.0 * std::f64::consts::PI * w * h * 30f64.to_radians().cos()).log10();
        assert_abs_diff_eq!(d.d0_db, expected_d0, epsilon = 1e-9);
        // At boresight the sinc term is exactly 0 dB.
        assert_abs_diff_eq!(d.d1_db, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_d1_at_theta1() {
        let s_lambda = 50.0;
        let theta1 = billboard_theta1_deg(s_lambda);
        let d = billboard_discrimination(theta1, 60.0, 45.0, 30.0, s_lambda, theta1);
        let u = s_lambda * theta1.to_radians().sin();
        assert_abs_diff_eq!(d.d1_db, 20.0 * sinc(u).abs().log10(), epsilon = 1e-9);
        // The branches agree at the boundary: sin(pi/2)/(pi/2) vs 1/(pi/2).
        assert_abs_diff_eq!(
            d.d1_db,
            -20.0 * (std::f64::consts::PI * u).log10(),
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_rolloff_beyond_20_degrees() {
        let s_lambda = 50.0;
        let theta1 = billboard_theta1_deg(s_lambda);
        let at20 = billboard_discrimination(20.0, 60.0, 45.0, 30.0, s_lambda, theta1);
        let at30 = billboard_discrimination(30.0, 60.0, 45.0, 30.0, s_lambda, theta1);
        // 0.4165 dB per degree past 20.
        assert_abs_diff_eq!(at30.d1_db, at20.d1_db - 0.4165 * 10.0, epsilon = 1e-2);
    }

    #[test]
    fn test_back_to_back_zero_at_boresight() {
        let d = back_to_back_discrimination(0.0, 6000.0, false, AntennaCategory::B1, 40.0, 150.0)
            .unwrap();
        assert_abs_diff_eq!(d, 0.0, epsilon = 1e-9);
        let d = back_to_back_discrimination(25.0, 6000.0, false, AntennaCategory::B1, 40.0, 150.0)
            .unwrap();
        assert_abs_diff_eq!(d, -32.0, epsilon = 1e-9);
    }
}
