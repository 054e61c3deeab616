//! AFC configuration document.
//!
//! Field names match the JSON the coordination service is provisioned
//! with; serde renames keep the Rust side idiomatic.

use serde::{Deserialize, Serialize};

use afc_prop::{BuildingPenetration, BuildingType, ItmGround, ItmParameters, ItmPolarization, PropagationModelKind};

use crate::{EngineError, Result};

/// One named frequency band to analyze.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreqBandConfig {
    pub name: String,
    #[serde(rename = "startFreqMHz")]
    pub start_freq_mhz: f64,
    #[serde(rename = "stopFreqMHz")]
    pub stop_freq_mhz: f64,
}

/// FS receive antenna pattern selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AntennaPatternKind {
    #[serde(rename = "F.1245")]
    F1245,
    #[serde(rename = "F.699")]
    F699,
    #[serde(rename = "F.1336")]
    F1336,
    #[serde(rename = "R2-AIP-07")]
    R2Aip07,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AntennaPatternConfig {
    pub kind: AntennaPatternKind,
}

/// Fixed or off polarization mismatch loss.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolarizationMismatchConfig {
    pub kind: String,
    #[serde(default)]
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyLossConfig {
    #[serde(rename = "valueIndoor")]
    pub value_indoor: f64,
    #[serde(rename = "valueOutdoor")]
    pub value_outdoor: f64,
}

/// Building penetration loss configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingPenetrationConfig {
    pub kind: String,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(rename = "buildingType", default)]
    pub building_type: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

impl BuildingPenetrationConfig {
    /// Resolve to the propagation-layer model.
    pub fn to_model(&self) -> Result<BuildingPenetration> {
        let building_type = match self.building_type.as_deref() {
            Some("Thermally Efficient") => BuildingType::ThermallyEfficient,
            _ => BuildingType::Traditional,
        };
        match self.kind.as_str() {
            "Fixed Value" => Ok(BuildingPenetration::Fixed {
                value_db: self.value.ok_or_else(|| {
                    EngineError::InvalidConfig(
                        "Fixed Value building penetration needs a value".to_string(),
                    )
                })?,
            }),
            "ITU-R Rec. P.2109" | "ITU-R P.2109" => Ok(BuildingPenetration::P2109 {
                building_type,
                confidence: self.confidence.unwrap_or(0.5),
            }),
            "Ray Trace" => Ok(BuildingPenetration::RayTrace { building_type }),
            other => Err(EngineError::InvalidConfig(format!(
                "unknown building penetration kind: {other}"
            ))),
        }
    }
}

/// Per-band triples keyed UNII-5 / UNII-7 / other.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandTriple {
    #[serde(rename = "UNII5")]
    pub unii5: f64,
    #[serde(rename = "UNII7")]
    pub unii7: f64,
    pub other: f64,
}

/// Propagation model block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropagationModelConfig {
    pub kind: PropagationModelKind,
    #[serde(rename = "win2Confidence", default = "default_confidence")]
    pub win2_confidence: f64,
    #[serde(rename = "itmConfidence", default = "default_confidence")]
    pub itm_confidence: f64,
    #[serde(rename = "itmReliability", default = "default_confidence")]
    pub itm_reliability: f64,
    #[serde(rename = "p2108Confidence", default = "default_confidence")]
    pub p2108_confidence: f64,
    #[serde(rename = "buildingSource", default)]
    pub building_source: BuildingSource,
    #[serde(rename = "terrainSource", default)]
    pub terrain_source: TerrainSource,
}

fn default_confidence() -> f64 {
    0.5
}

/// Which building dataset feeds the profile builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum BuildingSource {
    #[default]
    None,
    #[serde(rename = "LiDAR")]
    Lidar,
    #[serde(rename = "B_DESIGN3D")]
    ThreeD,
    #[serde(rename = "B_2D")]
    TwoD,
}

/// Which terrain dataset resolves ground heights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TerrainSource {
    #[serde(rename = "3DEP (30m)")]
    #[default]
    ThreeDep,
    #[serde(rename = "SRTM (90m)")]
    Srtm,
    #[serde(rename = "LiDAR")]
    Lidar,
    Multiband,
}

/// ITM parameter block, wire shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItmParametersConfig {
    pub polarization: String,
    pub ground: String,
    #[serde(rename = "dielectricConst", default)]
    pub dielectric_const: Option<f64>,
    #[serde(default)]
    pub conductivity: Option<f64>,
    #[serde(rename = "minSpacing", default = "default_min_spacing")]
    pub min_spacing_m: f64,
    #[serde(rename = "maxPoints", default = "default_max_points")]
    pub max_points: usize,
}

fn default_min_spacing() -> f64 {
    30.0
}

fn default_max_points() -> usize {
    1500
}

impl ItmParametersConfig {
    pub fn to_parameters(&self) -> Result<ItmParameters> {
        let polarization = match self.polarization.as_str() {
            "Vertical" => ItmPolarization::Vertical,
            "Horizontal" => ItmPolarization::Horizontal,
            other => {
                return Err(EngineError::InvalidConfig(format!(
                    "unknown ITM polarization: {other}"
                )))
            }
        };
        let ground = match self.ground.as_str() {
            "Good Ground" | "Good" => ItmGround::Good,
            "Average Ground" | "Average" => ItmGround::Average,
            "Poor Ground" | "Poor" => ItmGround::Poor,
            other => {
                return Err(EngineError::InvalidConfig(format!(
                    "unknown ITM ground: {other}"
                )))
            }
        };
        Ok(ItmParameters {
            polarization,
            ground,
            dielectric_const: self.dielectric_const,
            conductivity: self.conductivity,
            surface_refractivity: 301.0,
            radio_climate: 5,
            min_spacing_m: self.min_spacing_m,
            max_points: self.max_points,
        })
    }
}

/// RLAN position uncertainty scan steps, metres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ApUncertaintyConfig {
    pub horizontal: f64,
    pub height: f64,
}

/// The full AFC configuration document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AfcConfig {
    #[serde(rename = "freqBands")]
    pub freq_bands: Vec<FreqBandConfig>,
    #[serde(rename = "antennaPattern")]
    pub antenna_pattern: AntennaPatternConfig,
    #[serde(rename = "polarizationMismatchLoss")]
    pub polarization_mismatch_loss: PolarizationMismatchConfig,
    #[serde(rename = "bodyLoss")]
    pub body_loss: BodyLossConfig,
    #[serde(rename = "buildingPenetrationLoss")]
    pub building_penetration_loss: BuildingPenetrationConfig,
    #[serde(rename = "receiverFeederLoss")]
    pub receiver_feeder_loss: BandTriple,
    #[serde(rename = "fsReceiverNoise")]
    pub fs_receiver_noise: BandTriple,
    /// I/N threshold, dB.
    pub threshold: f64,
    /// FS links beyond this distance from the RLAN are ignored, km.
    #[serde(rename = "maxLinkDistance")]
    pub max_link_distance_km: f64,
    #[serde(rename = "maxEIRP")]
    pub max_eirp_dbm: f64,
    #[serde(rename = "minEIRP")]
    pub min_eirp_dbm: f64,
    #[serde(rename = "minPSD", default = "default_min_psd")]
    pub min_psd_dbm_mhz: f64,
    /// PSD reporting bin width, MHz.
    #[serde(rename = "minBinMHz", default = "default_bin_mhz")]
    pub min_bin_mhz: f64,
    #[serde(rename = "propagationModel")]
    pub propagation_model: PropagationModelConfig,
    #[serde(rename = "ulsDatabase")]
    pub uls_database: String,
    #[serde(rename = "regionStr")]
    pub region_str: String,
    #[serde(rename = "rasDatabase", default)]
    pub ras_database: Option<String>,
    #[serde(rename = "APUncertainty")]
    pub ap_uncertainty: ApUncertaintyConfig,
    /// Polygon vertex-simplification tolerance in scan-grid cells; zero
    /// keeps every vertex.
    #[serde(rename = "polygonSimplify", default)]
    pub polygon_simplify_cells: f64,
    #[serde(rename = "ITMParameters")]
    pub itm_parameters: ItmParametersConfig,
    #[serde(rename = "clutterAtFS", default)]
    pub clutter_at_fs: bool,
    #[serde(rename = "fadeMarginDB", default)]
    pub fade_margin_db: f64,
    #[serde(rename = "useFreqSeed", default)]
    pub use_freq_seed: u64,
    #[serde(rename = "analysisTimeoutSec", default = "default_timeout")]
    pub analysis_timeout_sec: u64,
    /// Profile sample floor so short paths still resolve terrain.
    #[serde(rename = "minProfilePoints", default = "default_profile_points")]
    pub min_profile_points: usize,
}

fn default_min_psd() -> f64 {
    -13.0
}

fn default_bin_mhz() -> f64 {
    20.0
}

fn default_timeout() -> u64 {
    600
}

fn default_profile_points() -> usize {
    20
}

impl AfcConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        let config: AfcConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_eirp_dbm > self.max_eirp_dbm {
            return Err(EngineError::InvalidConfig(format!(
                "minEIRP {} exceeds maxEIRP {}",
                self.min_eirp_dbm, self.max_eirp_dbm
            )));
        }
        if self.max_link_distance_km <= 0.0 {
            return Err(EngineError::InvalidConfig(
                "maxLinkDistance must be positive".to_string(),
            ));
        }
        if self.min_bin_mhz <= 0.0 {
            return Err(EngineError::InvalidConfig(
                "minBinMHz must be positive".to_string(),
            ));
        }
        for band in &self.freq_bands {
            if band.stop_freq_mhz <= band.start_freq_mhz {
                return Err(EngineError::InvalidConfig(format!(
                    "band {} is empty",
                    band.name
                )));
            }
        }
        Ok(())
    }

    /// Noise density dBW/MHz and feeder loss dB for a centre frequency.
    pub fn band_constants(&self, center_mhz: f64) -> (f64, f64) {
        use afc_core::band::{UNII5, UNII7};
        if UNII5.contains(center_mhz) {
            (self.fs_receiver_noise.unii5, self.receiver_feeder_loss.unii5)
        } else if UNII7.contains(center_mhz) {
            (self.fs_receiver_noise.unii7, self.receiver_feeder_loss.unii7)
        } else {
            (self.fs_receiver_noise.other, self.receiver_feeder_loss.other)
        }
    }
}

/// A config with the provisioning defaults used across the test suite.
impl Default for AfcConfig {
    fn default() -> Self {
        Self {
            freq_bands: vec![
                FreqBandConfig {
                    name: "UNII5".to_string(),
                    start_freq_mhz: 5925.0,
                    stop_freq_mhz: 6425.0,
                },
                FreqBandConfig {
                    name: "UNII7".to_string(),
                    start_freq_mhz: 6525.0,
                    stop_freq_mhz: 6875.0,
                },
            ],
            antenna_pattern: AntennaPatternConfig {
                kind: AntennaPatternKind::R2Aip07,
            },
            polarization_mismatch_loss: PolarizationMismatchConfig {
                kind: "Fixed Value".to_string(),
                value: 3.0,
            },
            body_loss: BodyLossConfig {
                value_indoor: 0.0,
                value_outdoor: 0.0,
            },
            building_penetration_loss: BuildingPenetrationConfig {
                kind: "ITU-R Rec. P.2109".to_string(),
                value: None,
                building_type: Some("Traditional".to_string()),
                confidence: Some(0.5),
            },
            receiver_feeder_loss: BandTriple {
                unii5: 3.0,
                unii7: 3.0,
                other: 3.0,
            },
            fs_receiver_noise: BandTriple {
                unii5: -110.0,
                unii7: -109.5,
                other: -109.5,
            },
            threshold: -6.0,
            max_link_distance_km: 130.0,
            max_eirp_dbm: 36.0,
            min_eirp_dbm: 21.0,
            min_psd_dbm_mhz: -13.0,
            min_bin_mhz: 20.0,
            propagation_model: PropagationModelConfig {
                kind: PropagationModelKind::Fcc6GhzReportAndOrder,
                win2_confidence: 0.5,
                itm_confidence: 0.5,
                itm_reliability: 0.5,
                p2108_confidence: 0.5,
                building_source: BuildingSource::None,
                terrain_source: TerrainSource::ThreeDep,
            },
            uls_database: String::new(),
            region_str: "CONUS".to_string(),
            ras_database: None,
            ap_uncertainty: ApUncertaintyConfig {
                horizontal: 30.0,
                height: 5.0,
            },
            polygon_simplify_cells: 0.0,
            itm_parameters: ItmParametersConfig {
                polarization: "Vertical".to_string(),
                ground: "Average Ground".to_string(),
                dielectric_const: None,
                conductivity: None,
                min_spacing_m: 30.0,
                max_points: 1500,
            },
            clutter_at_fs: false,
            fade_margin_db: 0.0,
            use_freq_seed: 0,
            analysis_timeout_sec: 600,
            min_profile_points: 20,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_default() {
        let config = AfcConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back = AfcConfig::from_json(&json).unwrap();
        assert_eq!(config, back);
    }

    #[test]
    fn test_wire_names() {
        let config = AfcConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"maxLinkDistance\""));
        assert!(json.contains("\"FCC 6GHz Report & Order\""));
        assert!(json.contains("\"fsReceiverNoise\""));
        assert!(json.contains("\"UNII5\""));
    }

    #[test]
    fn test_validation() {
        let mut config = AfcConfig::default();
        config.min_eirp_dbm = 40.0;
        assert!(config.validate().is_err());

        let mut config = AfcConfig::default();
        config.max_link_distance_km = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_building_penetration_resolution() {
        let fixed = BuildingPenetrationConfig {
            kind: "Fixed Value".to_string(),
            value: Some(12.345),
            building_type: None,
            confidence: None,
        };
        assert_eq!(
            fixed.to_model().unwrap(),
            afc_prop::BuildingPenetration::Fixed { value_db: 12.345 }
        );

        let missing = BuildingPenetrationConfig {
            kind: "Fixed Value".to_string(),
            value: None,
            building_type: None,
            confidence: None,
        };
        assert!(missing.to_model().is_err());
    }

    #[test]
    fn test_band_constants() {
        let config = AfcConfig::default();
        assert_eq!(config.band_constants(6000.0), (-110.0, 3.0));
        assert_eq!(config.band_constants(6600.0), (-109.5, 3.0));
        assert_eq!(config.band_constants(6450.0), (-109.5, 3.0));
    }
}
