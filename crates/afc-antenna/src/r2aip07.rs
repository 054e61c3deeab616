//! WinnForum R2-AIP-07 antenna gain procedure.
//!
//! Category-based minimum-suppression tables applied off the main lobe,
//! with F.699 used inside 5 degrees. The returned sub-model tag records
//! which table produced the value for the exceed-threshold report.

use afc_core::codes::AntennaCategory;

use crate::itu::f699_gain;
use crate::{AntennaError, Result};

/// Category B2 minimum suppression (dB) by off-boresight angle.
fn suppression_b2(angle_deg: f64) -> f64 {
    if angle_deg < 10.0 {
        15.0
    } else if angle_deg < 15.0 {
        20.0
    } else if angle_deg < 20.0 {
        23.0
    } else if angle_deg < 30.0 {
        28.0
    } else if angle_deg < 100.0 {
        29.0
    } else {
        60.0
    }
}

/// Category B1 minimum suppression (dB) by off-boresight angle.
fn suppression_b1(angle_deg: f64) -> f64 {
    if angle_deg < 10.0 {
        21.0
    } else if angle_deg < 15.0 {
        25.0
    } else if angle_deg < 20.0 {
        29.0
    } else if angle_deg < 30.0 {
        32.0
    } else if angle_deg < 100.0 {
        35.0
    } else if angle_deg < 140.0 {
        39.0
    } else {
        45.0
    }
}

/// Category A minimum suppression (dB) by off-boresight angle.
fn suppression_a(angle_deg: f64) -> f64 {
    if angle_deg < 10.0 {
        25.0
    } else if angle_deg < 15.0 {
        29.0
    } else if angle_deg < 20.0 {
        33.0
    } else if angle_deg < 30.0 {
        36.0
    } else if angle_deg < 100.0 {
        42.0
    } else {
        55.0
    }
}

/// R2-AIP-07 gain at an off-boresight angle.
///
/// `model_blank` is true when the record carried no antenna model string;
/// `diversity` selects the diversity-antenna column of the low-gain table.
/// Returns the gain and the sub-model tag (":F.699", ":catA", ":catB1",
/// ":catB2").
pub fn r2aip07_gain(
    angle_off_boresight_deg: f64,
    freq_mhz: f64,
    model_blank: bool,
    category: AntennaCategory,
    diversity: bool,
    max_gain_dbi: f64,
    d_lambda: f64,
) -> Result<(f64, &'static str)> {
    let in_unii5 = (5925.0..=6425.0).contains(&freq_mhz);
    let in_unii7 = (6525.0..=6875.0).contains(&freq_mhz);
    if !in_unii5 && !in_unii7 {
        return Err(AntennaError::FrequencyOutOfBand(freq_mhz));
    }

    let angle = angle_off_boresight_deg;

    if max_gain_dbi < 38.0 {
        if angle < 5.0 {
            return Ok((f699_gain(angle, max_gain_dbi, d_lambda), ":F.699"));
        }
        return if diversity {
            Ok((max_gain_dbi - suppression_b1(angle), ":catB1"))
        } else {
            Ok((max_gain_dbi - suppression_b2(angle), ":catB2"))
        };
    }

    if angle < 5.0 {
        return Ok((f699_gain(angle, max_gain_dbi, d_lambda), ":F.699"));
    }

    if model_blank || category == AntennaCategory::B1 {
        return Ok((max_gain_dbi - suppression_b1(angle), ":catB1"));
    }

    if category == AntennaCategory::Hp {
        // Known high performance: the better of F.699 and the category-A
        // floor.
        let disc_699 = max_gain_dbi - f699_gain(angle, max_gain_dbi, d_lambda);
        let min_a = suppression_a(angle);
        return if disc_699 >= min_a {
            Ok((max_gain_dbi - disc_699, ":F.699"))
        } else {
            Ok((max_gain_dbi - min_a, ":catA"))
        };
    }

    Ok((max_gain_dbi - suppression_a(angle), ":catA"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rstest::rstest;

    #[test]
    fn test_boresight_is_max_gain() {
        let (g, tag) =
            r2aip07_gain(0.0, 6000.0, false, AntennaCategory::B1, false, 40.0, 150.0).unwrap();
        assert_abs_diff_eq!(g, 40.0, epsilon = 1e-6);
        assert_eq!(tag, ":F.699");
    }

    #[test]
    fn test_frequency_gate() {
        assert!(r2aip07_gain(10.0, 6450.0, false, AntennaCategory::B1, false, 40.0, 150.0)
            .is_err());
        assert!(r2aip07_gain(10.0, 7000.0, false, AntennaCategory::B1, false, 40.0, 150.0)
            .is_err());
        assert!(r2aip07_gain(10.0, 6600.0, false, AntennaCategory::B1, false, 40.0, 150.0)
            .is_ok());
    }

    #[rstest]
    #[case(12.0, 20.0)]
    #[case(25.0, 28.0)]
    #[case(150.0, 60.0)]
    fn test_low_gain_b2_table(#[case] angle: f64, #[case] suppression: f64) {
        let (g, tag) =
            r2aip07_gain(angle, 6000.0, false, AntennaCategory::B2, false, 30.0, 60.0).unwrap();
        assert_eq!(tag, ":catB2");
        assert_abs_diff_eq!(g, 30.0 - suppression, epsilon = 1e-9);
    }

    #[test]
    fn test_low_gain_diversity_uses_b1() {
        let (g, tag) =
            r2aip07_gain(12.0, 6000.0, false, AntennaCategory::B2, true, 30.0, 60.0).unwrap();
        assert_eq!(tag, ":catB1");
        assert_abs_diff_eq!(g, 30.0 - 25.0, epsilon = 1e-9);
    }

    #[test]
    fn test_blank_model_forces_b1() {
        let (g, tag) =
            r2aip07_gain(50.0, 6000.0, true, AntennaCategory::Hp, false, 42.0, 300.0).unwrap();
        assert_eq!(tag, ":catB1");
        assert_abs_diff_eq!(g, 42.0 - 35.0, epsilon = 1e-9);
    }

    #[test]
    fn test_hp_takes_better_of_f699_and_cat_a() {
        // Far off boresight F.699 discrimination exceeds the category-A
        // floor for a large dish.
        let (g, tag) =
            r2aip07_gain(170.0, 6000.0, false, AntennaCategory::Hp, false, 45.0, 400.0).unwrap();
        assert_eq!(tag, ":F.699");
        assert_abs_diff_eq!(g, f699_gain(170.0, 45.0, 400.0), epsilon = 1e-9);

        // Just off the main lobe, a 38 dBi dish's F.699 discrimination
        // (38 - (32 - 25 log 5) = 23.5 dB) undercuts the 25 dB floor.
        let (g, tag) =
            r2aip07_gain(5.0, 6000.0, false, AntennaCategory::Hp, false, 38.0, 150.0).unwrap();
        assert_eq!(tag, ":catA");
        assert_abs_diff_eq!(g, 38.0 - 25.0, epsilon = 1e-9);
    }

    #[test]
    fn test_other_category_uses_cat_a() {
        let (g, tag) =
            r2aip07_gain(40.0, 6600.0, false, AntennaCategory::Other, false, 41.0, 250.0)
                .unwrap();
        assert_eq!(tag, ":catA");
        assert_abs_diff_eq!(g, 41.0 - 42.0, epsilon = 1e-9);
    }
}
