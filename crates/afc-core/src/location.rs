//! Geographic locations with resolved height bookkeeping.

use serde::{Deserialize, Serialize};

use crate::codes::HeightSource;

/// A WGS84 position with its resolved heights.
///
/// `height_above_terrain` is the AGL antenna height from the licensing
/// record; `height_amsl` is that height added to the resolved ground
/// elevation, with `height_source` recording which dataset resolved it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub height_above_terrain: f64,
    pub height_amsl: f64,
    pub height_source: HeightSource,
}

impl Location {
    /// A location with AGL height only; AMSL is filled in once terrain is
    /// resolved.
    pub fn new(latitude_deg: f64, longitude_deg: f64, height_above_terrain: f64) -> Self {
        Self {
            latitude_deg,
            longitude_deg,
            height_above_terrain,
            height_amsl: f64::NAN,
            height_source: HeightSource::Unknown,
        }
    }

    /// Attach a resolved ground elevation.
    pub fn with_terrain(mut self, ground_amsl: f64, source: HeightSource) -> Self {
        self.height_amsl = ground_amsl + self.height_above_terrain;
        self.height_source = source;
        self
    }

    /// True when both coordinates are finite and in range.
    pub fn is_valid(&self) -> bool {
        self.latitude_deg.is_finite()
            && self.longitude_deg.is_finite()
            && self.latitude_deg.abs() <= 90.0
            && self.longitude_deg.abs() <= 180.0
    }

    /// True when the two positions are within `tol_deg` in both axes.
    pub fn coincident(&self, other: &Location, tol_deg: f64) -> bool {
        (self.latitude_deg - other.latitude_deg).abs() <= tol_deg
            && (self.longitude_deg - other.longitude_deg).abs() <= tol_deg
    }
}
