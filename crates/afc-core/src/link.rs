//! FS link model: antennas, path segments, passive repeaters, RAS zones.

use chrono::NaiveDate;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::codes::{AntennaCategory, Region, TxArchitecture};
use crate::location::Location;

/// Descriptive antenna parameters attached to an FS endpoint or repeater.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FsAntenna {
    /// Free-text model string from the licensing record.
    pub model: String,
    /// Catalog name after model matching, if any.
    pub matched_name: Option<String>,
    pub category: AntennaCategory,
    pub max_gain_dbi: f64,
    /// Dish diameter in metres, if known from the catalog.
    pub diameter_m: Option<f64>,
    /// Diameter over wavelength at the link mid-band frequency.
    pub d_lambda: f64,
}

impl FsAntenna {
    /// Unmatched antenna with a gain taken straight from the record.
    pub fn unmatched(model: impl Into<String>, max_gain_dbi: f64, d_lambda: f64) -> Self {
        Self {
            model: model.into(),
            matched_name: None,
            category: AntennaCategory::Unknown,
            max_gain_dbi,
            diameter_m: None,
            d_lambda,
        }
    }
}

/// One hop of a (possibly segmented) microwave path.
///
/// The pointing vector is the unit vector from the segment transmitter
/// toward the segment receiver in the earth-centred frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FsPathSegment {
    pub tx_location: Location,
    pub rx_location: Location,
    pub length_km: f64,
    pub pointing: Vector3<f64>,
}

/// A passive repeater in a segmented link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PassiveRepeater {
    /// Two antennas wired back to back.
    BackToBack {
        location: Location,
        /// Antenna facing the previous node (toward the link transmitter).
        antenna_a: FsAntenna,
        /// Antenna facing the next node (toward the link receiver).
        antenna_b: FsAntenna,
        pointing_a: Vector3<f64>,
        pointing_b: Vector3<f64>,
    },
    /// A flat billboard reflector.
    Billboard {
        location: Location,
        /// Reflector width in wavelengths.
        width_lambda: f64,
        /// Reflector height in wavelengths.
        height_lambda: f64,
        /// Projected aperture width in wavelengths, `width_lambda * cos(theta_in)`.
        s_lambda: f64,
        /// Incidence angle of the through path, degrees.
        theta_in_deg: f64,
        /// Boundary angle of the sinc main-lobe branch, degrees.
        theta1_deg: f64,
        /// Reflector plane normal in the earth-centred frame.
        normal: Vector3<f64>,
    },
}

impl PassiveRepeater {
    pub fn location(&self) -> &Location {
        match self {
            PassiveRepeater::BackToBack { location, .. } => location,
            PassiveRepeater::Billboard { location, .. } => location,
        }
    }
}

/// A licensed fixed-service microwave link to protect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FsLink {
    /// Stable identifier assigned at ingest.
    pub fsid: i64,
    pub region: Region,
    pub callsign: String,
    pub radio_service: String,
    pub license_status: String,
    pub grant_date: Option<NaiveDate>,
    pub expiration_date: Option<NaiveDate>,

    /// Resolved use band after the use-frequency policy ran, MHz.
    pub start_use_freq_mhz: f64,
    pub stop_use_freq_mhz: f64,
    pub bandwidth_mhz: f64,
    pub emission_designator: Option<String>,

    pub rx_location: Location,
    pub rx_antenna: FsAntenna,
    pub rx_antenna_feeder_loss_db: f64,
    /// Receiver noise level in dBW over the link bandwidth.
    pub rx_noise_level_dbw: f64,

    /// Diversity receive antenna, present only when the record carries a
    /// complete diversity triple (height, gain, diameter).
    pub rx_diversity: Option<DiversityRx>,

    pub tx_location: Location,
    pub tx_antenna: FsAntenna,
    pub tx_eirp_dbm: f64,
    pub tx_architecture: TxArchitecture,

    /// Passive repeaters ordered from the transmitter toward the receiver.
    pub passive_repeaters: Vec<PassiveRepeater>,

    /// Per-link fade margin, dB.
    pub fade_margin_db: f64,

    /// Set when the antenna model string missed the catalog; surfaced in
    /// the anomalous output file.
    pub antenna_model_unmatched: bool,
}

/// Diversity receive antenna parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiversityRx {
    pub height_above_terrain: f64,
    pub max_gain_dbi: f64,
    pub d_lambda: f64,
}

impl FsLink {
    /// Centre of the use band, MHz.
    pub fn center_freq_mhz(&self) -> f64 {
        0.5 * (self.start_use_freq_mhz + self.stop_use_freq_mhz)
    }

    /// Path segments TX -> PR_1 -> ... -> PR_n -> RX.
    ///
    /// Segment pointing vectors are recomputed from ECEF positions by the
    /// caller that owns geometry; here only the node chain is exposed.
    pub fn node_chain(&self) -> Vec<Location> {
        let mut nodes = Vec::with_capacity(self.passive_repeaters.len() + 2);
        nodes.push(self.tx_location);
        for pr in &self.passive_repeaters {
            nodes.push(*pr.location());
        }
        nodes.push(self.rx_location);
        nodes
    }

    /// Invariant from the use-frequency resolver: the use band spans
    /// exactly the declared bandwidth.
    pub fn use_band_consistent(&self) -> bool {
        (self.stop_use_freq_mhz - self.start_use_freq_mhz - self.bandwidth_mhz).abs() <= 1.0e-3
    }
}

/// Radio Astronomy Service exclusion zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RasZone {
    pub ras_id: i64,
    pub region: Region,
    pub name: String,
    pub start_freq_mhz: f64,
    pub stop_freq_mhz: f64,
    pub exclusion: RasExclusion,
    /// AGL antenna height when the zone is defined by a horizon distance.
    pub antenna_agl_m: Option<f64>,
}

/// Geometry of a RAS exclusion zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RasExclusion {
    /// One or two lat/lon rectangles.
    Rectangles(Vec<RasRect>),
    /// A circle of `radius_km` around a centre point.
    Circle {
        center_lat_deg: f64,
        center_lon_deg: f64,
        radius_km: f64,
    },
}

/// A latitude/longitude rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RasRect {
    pub lat1_deg: f64,
    pub lat2_deg: f64,
    pub lon1_deg: f64,
    pub lon2_deg: f64,
}

impl RasRect {
    pub fn contains(&self, lat_deg: f64, lon_deg: f64) -> bool {
        let (lat_lo, lat_hi) = if self.lat1_deg <= self.lat2_deg {
            (self.lat1_deg, self.lat2_deg)
        } else {
            (self.lat2_deg, self.lat1_deg)
        };
        let (lon_lo, lon_hi) = if self.lon1_deg <= self.lon2_deg {
            (self.lon1_deg, self.lon2_deg)
        } else {
            (self.lon2_deg, self.lon1_deg)
        };
        lat_deg >= lat_lo && lat_deg <= lat_hi && lon_deg >= lon_lo && lon_deg <= lon_hi
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codes::HeightSource;

    fn antenna() -> FsAntenna {
        FsAntenna::unmatched("TEST", 38.0, 100.0)
    }

    fn link() -> FsLink {
        FsLink {
            fsid: 1,
            region: Region::US,
            callsign: "WQAB123".to_string(),
            radio_service: "CF".to_string(),
            license_status: "A".to_string(),
            grant_date: None,
            expiration_date: None,
            start_use_freq_mhz: 6000.0,
            stop_use_freq_mhz: 6030.0,
            bandwidth_mhz: 30.0,
            emission_designator: Some("30M0D7W".to_string()),
            rx_location: Location::new(40.0, -74.0, 30.0)
                .with_terrain(10.0, HeightSource::ThreeDep),
            rx_antenna: antenna(),
            rx_antenna_feeder_loss_db: 2.0,
            rx_noise_level_dbw: -136.0,
            rx_diversity: None,
            tx_location: Location::new(40.2, -74.2, 45.0)
                .with_terrain(12.0, HeightSource::ThreeDep),
            tx_antenna: antenna(),
            tx_eirp_dbm: 55.0,
            tx_architecture: TxArchitecture::Unknown,
            passive_repeaters: vec![],
            fade_margin_db: 0.0,
            antenna_model_unmatched: false,
        }
    }

    #[test]
    fn test_use_band_invariant() {
        let l = link();
        assert!(l.use_band_consistent());
        assert_eq!(l.center_freq_mhz(), 6015.0);

        let mut bad = link();
        bad.stop_use_freq_mhz = 6040.0;
        assert!(!bad.use_band_consistent());
    }

    #[test]
    fn test_node_chain_order() {
        let mut l = link();
        l.passive_repeaters.push(PassiveRepeater::BackToBack {
            location: Location::new(40.1, -74.1, 20.0),
            antenna_a: antenna(),
            antenna_b: antenna(),
            pointing_a: Vector3::x(),
            pointing_b: Vector3::y(),
        });
        let chain = l.node_chain();
        assert_eq!(chain.len(), 3);
        assert_eq!(chain[0].latitude_deg, 40.2);
        assert_eq!(chain[1].latitude_deg, 40.1);
        assert_eq!(chain[2].latitude_deg, 40.0);
    }

    #[test]
    fn test_ras_rect_contains() {
        let r = RasRect {
            lat1_deg: 38.0,
            lat2_deg: 39.0,
            lon1_deg: -80.0,
            lon2_deg: -79.0,
        };
        assert!(r.contains(38.5, -79.5));
        assert!(!r.contains(37.9, -79.5));
        // Swapped corners normalize.
        let s = RasRect {
            lat1_deg: 39.0,
            lat2_deg: 38.0,
            lon1_deg: -79.0,
            lon2_deg: -80.0,
        };
        assert!(s.contains(38.5, -79.5));
    }
}
