//! Individual loss models: free space, WINNER-II, P.2108 clutter, and
//! P.2109 building entry.

use serde::{Deserialize, Serialize};

use crate::math::inv_normal;

/// Free-space path loss, dB, for distance in km and frequency in MHz.
pub fn fspl_db(dist_km: f64, freq_mhz: f64) -> f64 {
    20.0 * dist_km.log10() + 20.0 * freq_mhz.log10() + 32.45
}

/// WINNER-II scenario selected from morphology and the LOS test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Winner2Scenario {
    /// Urban micro LOS.
    B1Los,
    /// Suburban LOS.
    C1Los,
    /// Suburban NLOS.
    C1Nlos,
    /// Urban macro NLOS.
    C2Nlos,
}

impl Winner2Scenario {
    pub fn tag(&self) -> &'static str {
        match self {
            Winner2Scenario::B1Los => "W2B1_LOS",
            Winner2Scenario::C1Los => "W2C1_LOS",
            Winner2Scenario::C1Nlos => "W2C1_NLOS",
            Winner2Scenario::C2Nlos => "W2C2_NLOS",
        }
    }

    /// Shadow-fading standard deviation, dB.
    fn sigma_db(&self) -> f64 {
        match self {
            Winner2Scenario::B1Los => 3.0,
            Winner2Scenario::C1Los => 4.0,
            Winner2Scenario::C1Nlos | Winner2Scenario::C2Nlos => 8.0,
        }
    }
}

/// WINNER-II path loss at the requested confidence quantile.
///
/// `dist_m` >= 10 m per the model's validity range (shorter paths are
/// clamped); `h_tx_m` is the elevated-terminal height for the NLOS forms.
/// The confidence is the fraction of realizations whose loss falls below
/// the returned value.
pub fn winner2_loss(
    scenario: Winner2Scenario,
    dist_m: f64,
    freq_mhz: f64,
    h_tx_m: f64,
    confidence: f64,
) -> f64 {
    let d = dist_m.max(10.0);
    let fg5 = (freq_mhz / 5000.0).log10();
    let hb = h_tx_m.max(1.0);

    let median = match scenario {
        Winner2Scenario::B1Los => 22.7 * d.log10() + 41.0 + 20.0 * fg5,
        Winner2Scenario::C1Los => 23.8 * d.log10() + 41.2 + 20.0 * fg5,
        Winner2Scenario::C1Nlos => {
            (44.9 - 6.55 * hb.log10()) * d.log10() + 31.46 + 5.83 * hb.log10() + 23.0 * fg5
        }
        Winner2Scenario::C2Nlos => {
            (44.9 - 6.55 * hb.log10()) * d.log10() + 34.46 + 5.83 * hb.log10() + 23.0 * fg5
        }
    };

    median + scenario.sigma_db() * inv_normal(confidence.clamp(1.0e-6, 1.0 - 1.0e-6))
}

/// ITU-R P.2108 section 3.2 statistical clutter loss for one terrestrial
/// path end, dB. Distances below the model floor of 0.25 km are clamped.
pub fn p2108_clutter_loss(dist_km: f64, freq_mhz: f64, confidence: f64) -> f64 {
    let f_ghz = freq_mhz / 1000.0;
    let d = dist_km.max(0.25);

    let ll = 23.5 + 9.6 * f_ghz.log10();
    let ls = 32.98 + 23.9 * d.log10() + 3.0 * f_ghz.log10();

    let median = -5.0 * (10f64.powf(-0.2 * ll) + 10f64.powf(-0.2 * ls)).log10();
    let loss = median + 6.0 * inv_normal(confidence.clamp(1.0e-6, 1.0 - 1.0e-6));
    loss.max(0.0)
}

/// Building construction class of ITU-R P.2109.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildingType {
    Traditional,
    ThermallyEfficient,
}

impl BuildingType {
    /// (r, s, t, u, v, w, x, y, z) coefficient row.
    fn coefficients(&self) -> (f64, f64, f64, f64, f64, f64, f64, f64, f64) {
        match self {
            BuildingType::Traditional => (12.64, 3.72, 0.96, 9.6, 2.0, 9.1, -3.0, 4.5, -2.0),
            BuildingType::ThermallyEfficient => {
                (28.19, -3.00, 8.48, 13.5, 3.8, 27.8, -2.9, 9.4, -2.1)
            }
        }
    }
}

/// Building penetration model selection from config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BuildingPenetration {
    /// Constant loss regardless of geometry.
    Fixed { value_db: f64 },
    /// ITU-R P.2109 statistical entry loss at a confidence quantile.
    P2109 {
        building_type: BuildingType,
        confidence: f64,
    },
    /// Deterministic single-ray entry: the P.2109 median horizontal loss
    /// plus the elevation correction, no statistical spread.
    RayTrace { building_type: BuildingType },
}

/// Building entry loss, dB, for a ray at `elevation_deg` and `freq_mhz`.
pub fn building_entry_loss(
    model: &BuildingPenetration,
    elevation_deg: f64,
    freq_mhz: f64,
) -> f64 {
    match model {
        BuildingPenetration::Fixed { value_db } => *value_db,
        BuildingPenetration::P2109 {
            building_type,
            confidence,
        } => p2109_loss(*building_type, elevation_deg, freq_mhz, *confidence),
        BuildingPenetration::RayTrace { building_type } => {
            let (r, s, t, ..) = building_type.coefficients();
            let lf = (freq_mhz / 1000.0).log10();
            r + s * lf + t * lf * lf + 0.212 * elevation_deg.abs()
        }
    }
}

/// ITU-R P.2109 building entry loss at probability `p`.
fn p2109_loss(building_type: BuildingType, elevation_deg: f64, freq_mhz: f64, p: f64) -> f64 {
    let (r, s, t, u, v, w, x, y, z) = building_type.coefficients();
    let lf = (freq_mhz / 1000.0).log10();

    let lh = r + s * lf + t * lf * lf;
    let le = 0.212 * elevation_deg.abs();

    let mu1 = lh + le;
    let mu2 = w + x * lf;
    let sigma1 = u + v * lf;
    let sigma2 = y + z * lf;

    let zp = inv_normal(p.clamp(1.0e-6, 1.0 - 1.0e-6));
    let a = zp * sigma1 + mu1;
    let b = zp * sigma2 + mu2;
    let c = -3.0;

    10.0 * (10f64.powf(0.1 * a) + 10f64.powf(0.1 * b) + 10f64.powf(0.1 * c)).log10()
}
