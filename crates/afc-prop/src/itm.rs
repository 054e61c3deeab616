//! Irregular Terrain Model driver.
//!
//! The Longley-Rice numeric core is an external library with a fixed
//! point-to-point signature; [`PointToPointModel`] is the seam it plugs
//! into. The elevation buffer keeps the classic two-slot header layout
//! `[numpts - 1, dx_metres, h_0 .. h_{n-1}]`.

use serde::{Deserialize, Serialize};

use crate::models::fspl_db;

/// Antenna polarization for the ITM ground constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItmPolarization {
    Horizontal,
    Vertical,
}

impl ItmPolarization {
    /// Integer code of the external routine (0 horizontal, 1 vertical).
    pub fn code(&self) -> i32 {
        match self {
            ItmPolarization::Horizontal => 0,
            ItmPolarization::Vertical => 1,
        }
    }
}

/// Ground electrical quality presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItmGround {
    Good,
    Average,
    Poor,
}

impl ItmGround {
    /// (relative permittivity, conductivity S/m) for the preset.
    pub fn constants(&self) -> (f64, f64) {
        match self {
            ItmGround::Good => (25.0, 0.02),
            ItmGround::Average => (15.0, 0.005),
            ItmGround::Poor => (4.0, 0.001),
        }
    }
}

/// Parameters handed to the external point-to-point routine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItmParameters {
    pub polarization: ItmPolarization,
    pub ground: ItmGround,
    /// Overrides the preset when set.
    pub dielectric_const: Option<f64>,
    /// Overrides the preset when set, S/m.
    pub conductivity: Option<f64>,
    /// Surface refractivity, N-units. 301 corresponds to 4/3 earth.
    pub surface_refractivity: f64,
    /// Continental temperate unless configured otherwise.
    pub radio_climate: i32,
    /// Minimum profile sample spacing, metres.
    pub min_spacing_m: f64,
    /// Cap on profile samples per path.
    pub max_points: usize,
}

impl Default for ItmParameters {
    fn default() -> Self {
        Self {
            polarization: ItmPolarization::Vertical,
            ground: ItmGround::Average,
            dielectric_const: None,
            conductivity: None,
            surface_refractivity: 301.0,
            radio_climate: 5,
            min_spacing_m: 30.0,
            max_points: 1500,
        }
    }
}

impl ItmParameters {
    pub fn dielectric(&self) -> f64 {
        self.dielectric_const.unwrap_or(self.ground.constants().0)
    }

    pub fn sigma(&self) -> f64 {
        self.conductivity.unwrap_or(self.ground.constants().1)
    }

    /// Profile sample count for a path length, honoring spacing and cap.
    pub fn profile_points(&self, path_length_m: f64) -> usize {
        let n = (path_length_m / self.min_spacing_m).ceil() as usize + 1;
        n.clamp(2, self.max_points)
    }
}

/// Output of one point-to-point evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct ItmOutcome {
    pub loss_db: f64,
    /// Propagation mode string, e.g. "Line-Of-Sight Mode".
    pub mode: String,
    /// 0 on success; other codes per the NTIA implementation.
    pub err_num: i32,
}

/// The external Longley-Rice point-to-point signature.
///
/// `elev` is the two-slot-header buffer from
/// [`afc_core::ElevationProfile::itm_buffer`]; heights are AGL at the
/// terminals, confidence and reliability in (0, 1).
pub trait PointToPointModel: Send + Sync {
    #[allow(clippy::too_many_arguments)]
    fn point_to_point(
        &self,
        elev: &[f64],
        tht_m: f64,
        rht_m: f64,
        eps_dielect: f64,
        sgm_conductivity: f64,
        eno_ns_surfref: f64,
        frq_mhz: f64,
        radio_climate: i32,
        pol: i32,
        conf: f64,
        rel: f64,
    ) -> ItmOutcome;
}

/// Deterministic drop-in used when the NTIA library is not linked:
/// free-space loss plus single knife-edge diffraction over the worst
/// profile obstruction (ITU-R P.526 J(v) approximation).
///
/// Not a Longley-Rice replacement; it exists so analyses and tests run
/// end-to-end with terrain sensitivity and exact reproducibility.
#[derive(Debug, Default)]
pub struct KnifeEdgeItm;

impl KnifeEdgeItm {
    fn knife_edge_loss_db(v: f64) -> f64 {
        if v <= -0.78 {
            0.0
        } else {
            6.9 + 20.0 * (((v - 0.1).powi(2) + 1.0).sqrt() + v - 0.1).log10()
        }
    }
}

impl PointToPointModel for KnifeEdgeItm {
    fn point_to_point(
        &self,
        elev: &[f64],
        tht_m: f64,
        rht_m: f64,
        _eps_dielect: f64,
        _sgm_conductivity: f64,
        _eno_ns_surfref: f64,
        frq_mhz: f64,
        _radio_climate: i32,
        _pol: i32,
        conf: f64,
        _rel: f64,
    ) -> ItmOutcome {
        let numpts = elev[0] as usize + 1;
        let dx = elev[1];
        let heights = &elev[2..2 + numpts];
        let dist_m = dx * (numpts - 1) as f64;
        let dist_km = dist_m / 1000.0;

        if dist_km <= 0.0 {
            return ItmOutcome {
                loss_db: 0.0,
                mode: "Degenerate Path".to_string(),
                err_num: 1,
            };
        }

        let fspl = fspl_db(dist_km, frq_mhz);

        // Worst single obstruction against the terminal-to-terminal ray.
        let tx_amsl = heights[0] + tht_m;
        let rx_amsl = heights[numpts - 1] + rht_m;
        let lambda = 299.792458 / frq_mhz; // metres

        let mut worst_v = f64::NEG_INFINITY;
        for (i, h) in heights.iter().enumerate().take(numpts - 1).skip(1) {
            let d1 = dx * i as f64;
            let d2 = dist_m - d1;
            let ray = (tx_amsl * d2 + rx_amsl * d1) / dist_m;
            let clearance = h - ray;
            let v = clearance * (2.0 * dist_m / (lambda * d1 * d2)).sqrt();
            if v > worst_v {
                worst_v = v;
            }
        }

        let diffraction = if worst_v.is_finite() {
            Self::knife_edge_loss_db(worst_v)
        } else {
            0.0
        };

        // Confidence enters as a symmetric situation-variability term.
        let sigma_db = 5.3;
        let offset = sigma_db * crate::math::inv_normal(conf.clamp(1e-6, 1.0 - 1e-6));

        let mode = if diffraction > 0.0 {
            "Single Horizon Diffraction Mode"
        } else {
            "Line-Of-Sight Mode"
        };

        ItmOutcome {
            loss_db: fspl + diffraction + offset,
            mode: mode.to_string(),
            err_num: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use afc_core::result::ElevationProfile;
    use approx::assert_abs_diff_eq;

    fn flat_profile(n: usize, dx: f64, h: f64) -> Vec<f64> {
        ElevationProfile {
            dx_metres: dx,
            heights: vec![h; n],
            building_window: (0, 0),
        }
        .itm_buffer()
    }

    #[test]
    fn test_flat_path_is_free_space_at_median() {
        let buf = flat_profile(101, 100.0, 0.0);
        let out = KnifeEdgeItm.point_to_point(
            &buf, 30.0, 30.0, 15.0, 0.005, 301.0, 6000.0, 5, 1, 0.5, 0.5,
        );
        assert_eq!(out.err_num, 0);
        assert_abs_diff_eq!(out.loss_db, fspl_db(10.0, 6000.0), epsilon = 1e-6);
        assert_eq!(out.mode, "Line-Of-Sight Mode");
    }

    #[test]
    fn test_obstruction_adds_loss() {
        let mut heights = vec![0.0; 101];
        heights[50] = 80.0; // ridge well above the 30 m terminals
        let buf = ElevationProfile {
            dx_metres: 100.0,
            heights,
            building_window: (0, 0),
        }
        .itm_buffer();
        let out = KnifeEdgeItm.point_to_point(
            &buf, 30.0, 30.0, 15.0, 0.005, 301.0, 6000.0, 5, 1, 0.5, 0.5,
        );
        assert!(out.loss_db > fspl_db(10.0, 6000.0) + 6.0);
        assert_eq!(out.mode, "Single Horizon Diffraction Mode");
    }

    #[test]
    fn test_confidence_monotone() {
        let buf = flat_profile(51, 100.0, 0.0);
        let lo = KnifeEdgeItm
            .point_to_point(&buf, 30.0, 30.0, 15.0, 0.005, 301.0, 6000.0, 5, 1, 0.1, 0.5)
            .loss_db;
        let hi = KnifeEdgeItm
            .point_to_point(&buf, 30.0, 30.0, 15.0, 0.005, 301.0, 6000.0, 5, 1, 0.9, 0.5)
            .loss_db;
        assert!(lo < hi);
    }

    #[test]
    fn test_parameter_presets() {
        let p = ItmParameters::default();
        assert_eq!(p.dielectric(), 15.0);
        assert_eq!(p.sigma(), 0.005);
        assert_eq!(p.profile_points(3000.0), 101);
        assert_eq!(p.profile_points(1.0), 2);
        assert_eq!(p.profile_points(1.0e9), 1500);
    }
}
