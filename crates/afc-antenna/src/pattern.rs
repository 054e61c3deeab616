//! Tagged antenna-pattern variant with a single evaluate operation.

use serde::{Deserialize, Serialize};

use afc_core::codes::AntennaCategory;

use crate::itu::{f1245_gain, f1336_omni_gain, f699_gain};
use crate::r2aip07::r2aip07_gain;
use crate::{AntennaError, Result};

/// Gain at an evaluation angle, with the sub-model tag reported by
/// composite procedures (R2-AIP-07).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GainResult {
    pub gain_dbi: f64,
    pub sub_model: Option<&'static str>,
}

/// One antenna radiation pattern. Per-variant parameters live in the
/// variant; evaluation dispatches on the tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AntennaPattern {
    F1245 {
        max_gain_dbi: f64,
        d_lambda: f64,
    },
    F699 {
        max_gain_dbi: f64,
        d_lambda: f64,
    },
    F1336Omni {
        max_gain_dbi: f64,
    },
    R2Aip07 {
        max_gain_dbi: f64,
        d_lambda: f64,
        category: AntennaCategory,
        /// True when the record carried no model string.
        model_blank: bool,
        /// Diversity antennas use the B1 column of the low-gain table.
        diversity: bool,
    },
    /// User lookup table of (angle radians, discrimination dB) pairs,
    /// sorted by angle. Discrimination is added to the boresight gain.
    Lut {
        max_gain_dbi: f64,
        table: Vec<(f64, f64)>,
    },
    Omni {
        max_gain_dbi: f64,
    },
}

impl AntennaPattern {
    pub fn max_gain_dbi(&self) -> f64 {
        match self {
            AntennaPattern::F1245 { max_gain_dbi, .. }
            | AntennaPattern::F699 { max_gain_dbi, .. }
            | AntennaPattern::F1336Omni { max_gain_dbi }
            | AntennaPattern::R2Aip07 { max_gain_dbi, .. }
            | AntennaPattern::Lut { max_gain_dbi, .. }
            | AntennaPattern::Omni { max_gain_dbi } => *max_gain_dbi,
        }
    }

    /// Gain toward a direction given by off-boresight and elevation
    /// angles, degrees, at `freq_mhz`.
    pub fn gain_dbi(
        &self,
        off_boresight_deg: f64,
        elevation_deg: f64,
        freq_mhz: f64,
    ) -> Result<GainResult> {
        match self {
            AntennaPattern::F1245 {
                max_gain_dbi,
                d_lambda,
            } => Ok(GainResult {
                gain_dbi: f1245_gain(off_boresight_deg, *max_gain_dbi, *d_lambda),
                sub_model: None,
            }),
            AntennaPattern::F699 {
                max_gain_dbi,
                d_lambda,
            } => Ok(GainResult {
                gain_dbi: f699_gain(off_boresight_deg, *max_gain_dbi, *d_lambda),
                sub_model: None,
            }),
            AntennaPattern::F1336Omni { max_gain_dbi } => Ok(GainResult {
                gain_dbi: f1336_omni_gain(elevation_deg, *max_gain_dbi),
                sub_model: None,
            }),
            AntennaPattern::R2Aip07 {
                max_gain_dbi,
                d_lambda,
                category,
                model_blank,
                diversity,
            } => {
                let (gain, tag) = r2aip07_gain(
                    off_boresight_deg,
                    freq_mhz,
                    *model_blank,
                    *category,
                    *diversity,
                    *max_gain_dbi,
                    *d_lambda,
                )?;
                Ok(GainResult {
                    gain_dbi: gain,
                    sub_model: Some(tag),
                })
            }
            AntennaPattern::Lut {
                max_gain_dbi,
                table,
            } => {
                if table.len() < 2 {
                    return Err(AntennaError::LutTooShort(table.len()));
                }
                let angle_rad = off_boresight_deg.to_radians();
                Ok(GainResult {
                    gain_dbi: max_gain_dbi + lut_interpolate(table, angle_rad),
                    sub_model: None,
                })
            }
            AntennaPattern::Omni { max_gain_dbi } => Ok(GainResult {
                gain_dbi: *max_gain_dbi,
                sub_model: None,
            }),
        }
    }
}

/// Piecewise-linear interpolation over a sorted (angle, value) table,
/// clamped at the ends.
fn lut_interpolate(table: &[(f64, f64)], angle_rad: f64) -> f64 {
    if angle_rad <= table[0].0 {
        return table[0].1;
    }
    if angle_rad >= table[table.len() - 1].0 {
        return table[table.len() - 1].1;
    }
    for w in table.windows(2) {
        let (a0, v0) = w[0];
        let (a1, v1) = w[1];
        if angle_rad <= a1 {
            let f = (angle_rad - a0) / (a1 - a0);
            return v0 + f * (v1 - v0);
        }
    }
    table[table.len() - 1].1
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rstest::rstest;

    fn all_patterns() -> Vec<AntennaPattern> {
        vec![
            AntennaPattern::F1245 {
                max_gain_dbi: 38.0,
                d_lambda: 150.0,
            },
            AntennaPattern::F699 {
                max_gain_dbi: 38.0,
                d_lambda: 150.0,
            },
            AntennaPattern::F1336Omni { max_gain_dbi: 38.0 },
            AntennaPattern::R2Aip07 {
                max_gain_dbi: 38.0,
                d_lambda: 150.0,
                category: AntennaCategory::B1,
                model_blank: false,
                diversity: false,
            },
            AntennaPattern::Lut {
                max_gain_dbi: 38.0,
                table: vec![(0.0, 0.0), (std::f64::consts::PI, -40.0)],
            },
            AntennaPattern::Omni { max_gain_dbi: 38.0 },
        ]
    }

    #[test]
    fn test_every_family_boresight_max_gain() {
        for p in all_patterns() {
            let g = p.gain_dbi(0.0, 0.0, 6000.0).unwrap();
            assert_abs_diff_eq!(g.gain_dbi, 38.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_omni_flat() {
        let p = AntennaPattern::Omni { max_gain_dbi: 6.0 };
        for angle in [0.0, 45.0, 120.0, 180.0] {
            assert_eq!(p.gain_dbi(angle, 0.0, 6000.0).unwrap().gain_dbi, 6.0);
        }
    }

    #[rstest]
    #[case(0.0, 0.0)]
    #[case(90.0, -20.0)]
    #[case(180.0, -40.0)]
    fn test_lut_interpolation(#[case] angle_deg: f64, #[case] offset: f64) {
        let p = AntennaPattern::Lut {
            max_gain_dbi: 30.0,
            table: vec![(0.0, 0.0), (std::f64::consts::PI, -40.0)],
        };
        let g = p.gain_dbi(angle_deg, 0.0, 6000.0).unwrap();
        assert_abs_diff_eq!(g.gain_dbi, 30.0 + offset, epsilon = 1e-9);
    }

    #[test]
    fn test_lut_too_short() {
        let p = AntennaPattern::Lut {
            max_gain_dbi: 30.0,
            table: vec![(0.0, 0.0)],
        };
        assert!(p.gain_dbi(10.0, 0.0, 6000.0).is_err());
    }

    #[test]
    fn test_r2aip07_reports_sub_model() {
        let p = AntennaPattern::R2Aip07 {
            max_gain_dbi: 38.0,
            d_lambda: 150.0,
            category: AntennaCategory::B1,
            model_blank: false,
            diversity: false,
        };
        let g = p.gain_dbi(25.0, 0.0, 6000.0).unwrap();
        assert_eq!(g.sub_model, Some(":catB1"));
    }
}
