//! Analysis intermediates: scan points, elevation profiles, loss breakdowns.

use serde::{Deserialize, Serialize};

use crate::codes::{ClutterCategory, HeightSource, Morphology, TerrainClass};

/// One candidate RLAN transmitter position from the uncertainty region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScanPoint {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub height_agl: f64,
    pub height_amsl: f64,
    pub morphology: Morphology,
    pub clutter: ClutterCategory,
}

/// Ground elevations sampled uniformly along a great-circle arc.
///
/// Replaces the raw buffer convention where the first two slots carried
/// `(numpts - 1)` and the inter-sample spacing; consumers that need that
/// layout call [`ElevationProfile::itm_buffer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElevationProfile {
    /// Inter-sample spacing in metres.
    pub dx_metres: f64,
    /// Sample heights, AMSL metres. Building heights are already folded in
    /// where the building mask allows.
    pub heights: Vec<f64>,
    /// Sample indices excluded from building inclusion because they belong
    /// to the endpoint buildings: `(leading, trailing)` counts.
    pub building_window: (usize, usize),
}

impl ElevationProfile {
    /// Total path length in metres.
    pub fn path_length_m(&self) -> f64 {
        self.dx_metres * (self.heights.len().saturating_sub(1)) as f64
    }

    /// The classic two-slot-header buffer consumed by the Longley-Rice
    /// entry point: `[numpts - 1, dx_metres, h_0, ..., h_{n-1}]`.
    pub fn itm_buffer(&self) -> Vec<f64> {
        let mut buf = Vec::with_capacity(self.heights.len() + 2);
        buf.push((self.heights.len() - 1) as f64);
        buf.push(self.dx_metres);
        buf.extend_from_slice(&self.heights);
        buf
    }
}

/// Resolved terrain height at one point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TerrainHeightResult {
    /// Bare-ground height, AMSL metres. Never NaN.
    pub ground_height: f64,
    /// Top-of-roof height above ground, when the point is in a building.
    pub building_height: Option<f64>,
    pub class: TerrainClass,
    pub source: HeightSource,
}

/// Path loss with its per-component breakdown for reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropagationResult {
    /// Total path loss, dB.
    pub path_loss_db: f64,
    /// Which model (or blend) produced the loss, e.g. `"FSPL"`,
    /// `"ITM"`, `"W2C1_NLOS"`.
    pub model: String,
    pub free_space_loss_db: f64,
    pub itm_loss_db: Option<f64>,
    pub winner2_loss_db: Option<f64>,
    pub clutter_loss_db: f64,
    pub building_penetration_db: f64,
}

impl PropagationResult {
    /// A pure free-space result.
    pub fn free_space(fspl_db: f64) -> Self {
        Self {
            path_loss_db: fspl_db,
            model: "FSPL".to_string(),
            free_space_loss_db: fspl_db,
            itm_loss_db: None,
            winner2_loss_db: None,
            clutter_loss_db: 0.0,
            building_penetration_db: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_itm_buffer_layout() {
        let p = ElevationProfile {
            dx_metres: 30.0,
            heights: vec![10.0, 11.0, 12.0, 13.0],
            building_window: (0, 0),
        };
        let buf = p.itm_buffer();
        assert_eq!(buf[0], 3.0);
        assert_eq!(buf[1], 30.0);
        assert_eq!(&buf[2..], &[10.0, 11.0, 12.0, 13.0]);
        assert_eq!(p.path_length_m(), 90.0);
    }
}
