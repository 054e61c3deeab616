//! Model-selection composer per the FCC 6 GHz Report & Order.

use serde::{Deserialize, Serialize};
use tracing::trace;

use afc_core::codes::{ClutterCategory, Morphology};
use afc_core::result::{ElevationProfile, PropagationResult};

use crate::itm::{ItmParameters, PointToPointModel};
use crate::los::is_line_of_sight;
use crate::models::{
    building_entry_loss, fspl_db, p2108_clutter_loss, winner2_loss, BuildingPenetration,
    Winner2Scenario,
};
use crate::p452::p452_clutter_loss;
use crate::{PropError, Result};

/// Top-level propagation model selection from config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropagationModelKind {
    #[serde(rename = "FCC 6GHz Report & Order")]
    Fcc6GhzReportAndOrder,
    #[serde(rename = "ITM with no building data")]
    ItmNoBuildingData,
    #[serde(rename = "FSPL")]
    Fspl,
}

/// Composer configuration: which models run and at which confidence
/// quantiles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropagationConfig {
    pub kind: PropagationModelKind,
    pub win2_confidence: f64,
    pub itm_confidence: f64,
    /// Time-reliability quantile handed to the Longley-Rice routine.
    pub itm_reliability: f64,
    pub p2108_confidence: f64,
    pub building_penetration: BuildingPenetration,
    /// Also apply P.2108 clutter at the FS end when it sits in clutter.
    pub clutter_at_fs: bool,
    pub itm: ItmParameters,
}

/// Constant adders applied to every path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FixedLosses {
    pub polarization_mismatch_db: f64,
    pub body_loss_indoor_db: f64,
    pub body_loss_outdoor_db: f64,
}

/// Everything the composer needs about one RLAN-to-FS path segment.
#[derive(Debug, Clone)]
pub struct PathGeometry<'a> {
    /// Elevation profile along the segment, built per the configured
    /// building source.
    pub profile: &'a ElevationProfile,
    /// RLAN-end height above ground.
    pub tx_agl_m: f64,
    /// FS-end height above ground.
    pub rx_agl_m: f64,
    pub dist_km: f64,
    pub freq_mhz: f64,
    /// Land cover at the RLAN end; drives model selection and clutter.
    pub tx_clutter: ClutterCategory,
    pub tx_indoor: bool,
    /// Ray elevation angle at the RLAN terminal, degrees.
    pub elevation_angle_deg: f64,
    /// Land cover at the FS end, charged when `clutter_at_fs` is set.
    pub rx_clutter: ClutterCategory,
    /// Per-link fade margin, dB.
    pub fade_margin_db: f64,
}

/// Distance under which every path is treated as free space.
const NEAR_FIELD_KM: f64 = 0.03;
/// WINNER-II / ITM selection boundary for NLOS urban and suburban paths.
const WINNER2_MAX_KM: f64 = 1.0;

/// Composes total path loss from the individual models, following the
/// Report & Order selection rules.
pub struct PathLossComposer<'a> {
    config: &'a PropagationConfig,
    itm_model: &'a dyn PointToPointModel,
    fixed: FixedLosses,
}

impl<'a> PathLossComposer<'a> {
    pub fn new(
        config: &'a PropagationConfig,
        itm_model: &'a dyn PointToPointModel,
        fixed: FixedLosses,
    ) -> Self {
        Self {
            config,
            itm_model,
            fixed,
        }
    }

    /// Total loss and breakdown for one path segment.
    ///
    /// Selection: LOS and near-field paths go free-space; NLOS
    /// urban/suburban paths up to 1 km use WINNER-II at the configured
    /// confidence; everything else NLOS runs the Longley-Rice driver.
    /// P.2108 clutter applies per end on ITM paths, building entry when
    /// the RLAN is indoors, and the polarization/body/fade-margin adders
    /// always.
    pub fn path_loss(&self, geo: &PathGeometry<'_>) -> Result<PropagationResult> {
        let fspl = fspl_db(geo.dist_km.max(1.0e-4), geo.freq_mhz);
        let los = is_line_of_sight(geo.profile, geo.tx_agl_m, geo.rx_agl_m);

        let mut result = match self.config.kind {
            PropagationModelKind::Fspl => PropagationResult::free_space(fspl),
            PropagationModelKind::ItmNoBuildingData => {
                if los || geo.dist_km < WINNER2_MAX_KM {
                    PropagationResult::free_space(fspl)
                } else {
                    self.itm_result(geo, fspl)?
                }
            }
            PropagationModelKind::Fcc6GhzReportAndOrder => {
                if los || geo.dist_km < NEAR_FIELD_KM {
                    PropagationResult::free_space(fspl)
                } else {
                    let urbanized = matches!(
                        geo.tx_clutter.morphology(),
                        Morphology::Urban | Morphology::Suburban
                    );
                    if urbanized && geo.dist_km <= WINNER2_MAX_KM {
                        self.winner2_result(geo, fspl)
                    } else {
                        self.itm_result(geo, fspl)?
                    }
                }
            }
        };

        if geo.tx_indoor {
            let bel = building_entry_loss(
                &self.config.building_penetration,
                geo.elevation_angle_deg,
                geo.freq_mhz,
            );
            result.building_penetration_db = bel;
            result.path_loss_db += bel;
        }

        let body = if geo.tx_indoor {
            self.fixed.body_loss_indoor_db
        } else {
            self.fixed.body_loss_outdoor_db
        };
        result.path_loss_db += self.fixed.polarization_mismatch_db + body + geo.fade_margin_db;

        if !result.path_loss_db.is_finite() {
            return Err(PropError::NonFinite {
                model: "composer",
                detail: format!("{result:?}"),
            });
        }

        trace!(
            model = %result.model,
            loss = result.path_loss_db,
            dist_km = geo.dist_km,
            "composed path loss"
        );
        Ok(result)
    }

    fn winner2_result(&self, geo: &PathGeometry<'_>, fspl: f64) -> PropagationResult {
        let scenario = match geo.tx_clutter.morphology() {
            Morphology::Urban => Winner2Scenario::C2Nlos,
            _ => Winner2Scenario::C1Nlos,
        };
        let w2 = winner2_loss(
            scenario,
            geo.dist_km * 1000.0,
            geo.freq_mhz,
            geo.rx_agl_m,
            self.config.win2_confidence,
        );
        PropagationResult {
            path_loss_db: w2,
            model: scenario.tag().to_string(),
            free_space_loss_db: fspl,
            itm_loss_db: None,
            winner2_loss_db: Some(w2),
            clutter_loss_db: 0.0,
            building_penetration_db: 0.0,
        }
    }

    fn itm_result(&self, geo: &PathGeometry<'_>, fspl: f64) -> Result<PropagationResult> {
        let buf = geo.profile.itm_buffer();
        let out = self.itm_model.point_to_point(
            &buf,
            geo.tx_agl_m,
            geo.rx_agl_m,
            self.config.itm.dielectric(),
            self.config.itm.sigma(),
            self.config.itm.surface_refractivity,
            geo.freq_mhz,
            self.config.itm.radio_climate,
            self.config.itm.polarization.code(),
            self.config.itm_confidence,
            self.config.itm_reliability,
        );
        if out.err_num > 1 || !out.loss_db.is_finite() {
            return Err(PropError::Itm {
                code: out.err_num,
                mode: out.mode,
            });
        }

        let mut clutter = 0.0;
        if !geo.tx_indoor {
            clutter += self.end_clutter_loss(geo.tx_clutter, geo.dist_km, geo.freq_mhz, geo.tx_agl_m);
        }
        if self.config.clutter_at_fs {
            clutter += self.end_clutter_loss(geo.rx_clutter, geo.dist_km, geo.freq_mhz, geo.rx_agl_m);
        }

        Ok(PropagationResult {
            path_loss_db: out.loss_db + clutter,
            model: "ITM".to_string(),
            free_space_loss_db: fspl,
            itm_loss_db: Some(out.loss_db),
            winner2_loss_db: None,
            clutter_loss_db: clutter,
            building_penetration_db: 0.0,
        })
    }

    /// Clutter loss for one path end on a terrain-model path: the
    /// P.2108 statistical model in built-up cover, the P.452 height-gain
    /// term under vegetation, nothing in the open.
    fn end_clutter_loss(
        &self,
        category: ClutterCategory,
        dist_km: f64,
        freq_mhz: f64,
        agl_m: f64,
    ) -> f64 {
        match category.morphology() {
            Morphology::Urban | Morphology::Suburban => {
                p2108_clutter_loss(dist_km, freq_mhz, self.config.p2108_confidence)
            }
            Morphology::Rural => p452_clutter_loss(category, freq_mhz, agl_m),
        }
    }
}

/// Loss of a segmented path through passive repeaters: per-segment losses
/// summed, minus each repeater's discrimination gain (discrimination is a
/// gain relative to the through path and non-positive in practice).
pub fn compose_segments(segment_losses: &[f64], pr_discriminations_db: &[f64]) -> f64 {
    let loss: f64 = segment_losses.iter().sum();
    let disc: f64 = pr_discriminations_db.iter().sum();
    loss - disc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::itm::KnifeEdgeItm;
    use crate::models::BuildingPenetration;
    use afc_core::result::ElevationProfile;
    use approx::assert_abs_diff_eq;

    fn config(kind: PropagationModelKind) -> PropagationConfig {
        PropagationConfig {
            kind,
            win2_confidence: 0.5,
            itm_confidence: 0.5,
            itm_reliability: 0.5,
            p2108_confidence: 0.5,
            building_penetration: BuildingPenetration::Fixed { value_db: 12.345 },
            clutter_at_fs: false,
            itm: ItmParameters::default(),
        }
    }

    fn fixed() -> FixedLosses {
        FixedLosses {
            polarization_mismatch_db: 0.0,
            body_loss_indoor_db: 0.0,
            body_loss_outdoor_db: 0.0,
        }
    }

    fn flat_profile(n: usize, dx: f64) -> ElevationProfile {
        ElevationProfile {
            dx_metres: dx,
            heights: vec![0.0; n],
            building_window: (0, 0),
        }
    }

    fn blocked_profile(n: usize, dx: f64) -> ElevationProfile {
        let mut heights = vec![0.0; n];
        heights[n / 2] = 120.0;
        ElevationProfile {
            dx_metres: dx,
            heights,
            building_window: (0, 0),
        }
    }

    fn geometry<'a>(
        profile: &'a ElevationProfile,
        dist_km: f64,
        clutter: ClutterCategory,
        indoor: bool,
    ) -> PathGeometry<'a> {
        PathGeometry {
            profile,
            tx_agl_m: 10.0,
            rx_agl_m: 30.0,
            dist_km,
            freq_mhz: 6000.0,
            tx_clutter: clutter,
            tx_indoor: indoor,
            elevation_angle_deg: 0.0,
            rx_clutter: ClutterCategory::Barren,
            fade_margin_db: 0.0,
        }
    }

    #[test]
    fn test_los_path_is_fspl() {
        let cfg = config(PropagationModelKind::Fcc6GhzReportAndOrder);
        let itm = KnifeEdgeItm;
        let composer = PathLossComposer::new(&cfg, &itm, fixed());
        let profile = flat_profile(101, 50.0);
        let geo = geometry(&profile, 5.0, ClutterCategory::Urban, false);
        let r = composer.path_loss(&geo).unwrap();
        assert_eq!(r.model, "FSPL");
        assert_abs_diff_eq!(r.path_loss_db, fspl_db(5.0, 6000.0), epsilon = 1e-9);
    }

    #[test]
    fn test_urban_short_nlos_uses_winner2() {
        let cfg = config(PropagationModelKind::Fcc6GhzReportAndOrder);
        let itm = KnifeEdgeItm;
        let composer = PathLossComposer::new(&cfg, &itm, fixed());
        let profile = blocked_profile(41, 20.0); // 800 m blocked path
        let geo = geometry(&profile, 0.8, ClutterCategory::Urban, false);
        let r = composer.path_loss(&geo).unwrap();
        assert_eq!(r.model, "W2C2_NLOS");
        assert!(r.winner2_loss_db.is_some());
    }

    #[test]
    fn test_long_nlos_uses_itm_with_clutter() {
        let cfg = config(PropagationModelKind::Fcc6GhzReportAndOrder);
        let itm = KnifeEdgeItm;
        let composer = PathLossComposer::new(&cfg, &itm, fixed());
        let profile = blocked_profile(101, 50.0); // 5 km blocked path
        let geo = geometry(&profile, 5.0, ClutterCategory::Suburban, false);
        let r = composer.path_loss(&geo).unwrap();
        assert_eq!(r.model, "ITM");
        assert!(r.itm_loss_db.is_some());
        assert!(r.clutter_loss_db > 0.0);
        assert!(r.path_loss_db > r.free_space_loss_db);
    }

    #[test]
    fn test_rural_nlos_uses_itm_no_clutter() {
        let cfg = config(PropagationModelKind::Fcc6GhzReportAndOrder);
        let itm = KnifeEdgeItm;
        let composer = PathLossComposer::new(&cfg, &itm, fixed());
        let profile = blocked_profile(41, 20.0);
        let geo = geometry(&profile, 0.8, ClutterCategory::Barren, false);
        let r = composer.path_loss(&geo).unwrap();
        assert_eq!(r.model, "ITM");
        assert_eq!(r.clutter_loss_db, 0.0);
    }

    #[test]
    fn test_indoor_adds_fixed_penetration() {
        let cfg = config(PropagationModelKind::Fspl);
        let itm = KnifeEdgeItm;
        let composer = PathLossComposer::new(&cfg, &itm, fixed());
        let profile = flat_profile(11, 50.0);
        let outdoor = composer
            .path_loss(&geometry(&profile, 0.5, ClutterCategory::Urban, false))
            .unwrap();
        let indoor = composer
            .path_loss(&geometry(&profile, 0.5, ClutterCategory::Urban, true))
            .unwrap();
        assert_abs_diff_eq!(
            indoor.path_loss_db - outdoor.path_loss_db,
            12.345,
            epsilon = 1e-6
        );
        assert_abs_diff_eq!(indoor.building_penetration_db, 12.345, epsilon = 1e-9);
    }

    #[test]
    fn test_fixed_adders_applied() {
        let cfg = config(PropagationModelKind::Fspl);
        let itm = KnifeEdgeItm;
        let adders = FixedLosses {
            polarization_mismatch_db: 3.0,
            body_loss_indoor_db: 0.0,
            body_loss_outdoor_db: 4.0,
        };
        let composer = PathLossComposer::new(&cfg, &itm, adders);
        let profile = flat_profile(11, 50.0);
        let mut geo = geometry(&profile, 0.5, ClutterCategory::Urban, false);
        geo.fade_margin_db = 2.0;
        let r = composer.path_loss(&geo).unwrap();
        assert_abs_diff_eq!(
            r.path_loss_db,
            fspl_db(0.5, 6000.0) + 3.0 + 4.0 + 2.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_compose_segments() {
        let total = compose_segments(&[100.0, 110.0], &[-25.0]);
        assert_abs_diff_eq!(total, 235.0, epsilon = 1e-12);
    }
}
