//! Code enums used across AFC records and analysis results.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Regulatory region an FS record was licensed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    /// United States (FCC ULS export).
    US,
    /// Canada (ISED station data export).
    CA,
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Region::US => write!(f, "US"),
            Region::CA => write!(f, "CA"),
        }
    }
}

impl FromStr for Region {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "US" => Ok(Region::US),
            "CA" => Ok(Region::CA),
            other => Err(crate::Error::InvalidInput(format!(
                "unknown region: {other}"
            ))),
        }
    }
}

/// Which dataset a resolved terrain height came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HeightSource {
    /// USGS 3D Elevation Program (30 m DEM).
    ThreeDep,
    /// Shuttle Radar Topography Mission DEM.
    Srtm,
    /// LiDAR multiband raster (ground + building bands).
    Lidar,
    /// Generic DEM / global fallback.
    Dem,
    /// No source covered the location.
    Unknown,
}

impl HeightSource {
    /// Short tag used in report output.
    pub fn tag(&self) -> &'static str {
        match self {
            HeightSource::ThreeDep => "3DEP",
            HeightSource::Srtm => "SRTM",
            HeightSource::Lidar => "LiDAR",
            HeightSource::Dem => "DEM",
            HeightSource::Unknown => "unknown",
        }
    }
}

/// Classification of a terrain height lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerrainClass {
    /// Bare ground height only.
    Ground,
    /// Location is inside a building footprint.
    Building,
    /// Raster covered the location but held the NoData sentinel.
    NoData,
}

/// Antenna performance category from the catalog (R2-AIP-07 tables).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AntennaCategory {
    /// Known high-performance (Category A treatment).
    Hp,
    B1,
    B2,
    Other,
    Unknown,
}

impl fmt::Display for AntennaCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AntennaCategory::Hp => "HP",
            AntennaCategory::B1 => "B1",
            AntennaCategory::B2 => "B2",
            AntennaCategory::Other => "OTHER",
            AntennaCategory::Unknown => "UNKNOWN",
        };
        write!(f, "{s}")
    }
}

impl FromStr for AntennaCategory {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "HP" => Ok(AntennaCategory::Hp),
            "B1" => Ok(AntennaCategory::B1),
            "B2" => Ok(AntennaCategory::B2),
            "OTHER" => Ok(AntennaCategory::Other),
            "UNKNOWN" | "" => Ok(AntennaCategory::Unknown),
            other => Err(crate::Error::InvalidInput(format!(
                "unknown antenna category: {other}"
            ))),
        }
    }
}

/// Transmitter architecture derived from the transmitter model catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxArchitecture {
    /// Indoor unit.
    Idu,
    /// Outdoor unit.
    Odu,
    Unknown,
}

impl fmt::Display for TxArchitecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TxArchitecture::Idu => "IDU",
            TxArchitecture::Odu => "ODU",
            TxArchitecture::Unknown => "UNKNOWN",
        };
        write!(f, "{s}")
    }
}

/// Morphology of the environment around a point, from NLCD land cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Morphology {
    Urban,
    Suburban,
    Rural,
}

impl fmt::Display for Morphology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Morphology::Urban => "URBAN",
            Morphology::Suburban => "SUBURBAN",
            Morphology::Rural => "RURAL",
        };
        write!(f, "{s}")
    }
}

/// Clutter category of a point, condensed from NLCD classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClutterCategory {
    Urban,
    Suburban,
    Forest,
    Shrub,
    Water,
    Barren,
}

impl ClutterCategory {
    /// Map an NLCD land-cover code to a clutter category.
    ///
    /// Codes per the NLCD 2019 legend: 21-24 developed, 41-43 forest,
    /// 51/52 shrub, 11/12 water/ice, everything else barren/open.
    pub fn from_nlcd(code: u8) -> Self {
        match code {
            23 | 24 => ClutterCategory::Urban,
            21 | 22 => ClutterCategory::Suburban,
            41..=43 | 90 => ClutterCategory::Forest,
            51 | 52 => ClutterCategory::Shrub,
            11 | 12 | 95 => ClutterCategory::Water,
            _ => ClutterCategory::Barren,
        }
    }

    /// Morphology used for propagation model selection.
    pub fn morphology(&self) -> Morphology {
        match self {
            ClutterCategory::Urban => Morphology::Urban,
            ClutterCategory::Suburban => Morphology::Suburban,
            _ => Morphology::Rural,
        }
    }
}

/// WinnForum response codes emitted in the analysis response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i32)]
pub enum ResponseCode {
    GeneralFailure = -1,
    Success = 0,
    VersionNotSupported = 100,
    DeviceDisallowed = 101,
    MissingParam = 102,
    InvalidValue = 103,
    UnexpectedParam = 106,
    UnsupportedSpectrum = 300,
}

impl ResponseCode {
    /// Numeric code on the wire.
    pub fn code(&self) -> i32 {
        *self as i32
    }

    /// Short description string on the wire.
    pub fn short_description(&self) -> &'static str {
        match self {
            ResponseCode::GeneralFailure => "GENERAL_FAILURE",
            ResponseCode::Success => "SUCCESS",
            ResponseCode::VersionNotSupported => "VERSION_NOT_SUPPORTED",
            ResponseCode::DeviceDisallowed => "DEVICE_DISALLOWED",
            ResponseCode::MissingParam => "MISSING_PARAM",
            ResponseCode::InvalidValue => "INVALID_VALUE",
            ResponseCode::UnexpectedParam => "UNEXPECTED_PARAM",
            ResponseCode::UnsupportedSpectrum => "UNSUPPORTED_SPECTRUM",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_round_trip() {
        assert_eq!("US".parse::<Region>().unwrap(), Region::US);
        assert_eq!("CA".parse::<Region>().unwrap(), Region::CA);
        assert!("MX".parse::<Region>().is_err());
        assert_eq!(Region::US.to_string(), "US");
    }

    #[test]
    fn test_nlcd_mapping() {
        assert_eq!(ClutterCategory::from_nlcd(24), ClutterCategory::Urban);
        assert_eq!(ClutterCategory::from_nlcd(22), ClutterCategory::Suburban);
        assert_eq!(ClutterCategory::from_nlcd(42), ClutterCategory::Forest);
        assert_eq!(ClutterCategory::from_nlcd(11), ClutterCategory::Water);
        assert_eq!(ClutterCategory::from_nlcd(31), ClutterCategory::Barren);

        assert_eq!(
            ClutterCategory::from_nlcd(23).morphology(),
            Morphology::Urban
        );
        assert_eq!(
            ClutterCategory::from_nlcd(21).morphology(),
            Morphology::Suburban
        );
        assert_eq!(
            ClutterCategory::from_nlcd(43).morphology(),
            Morphology::Rural
        );
    }

    #[test]
    fn test_response_codes() {
        assert_eq!(ResponseCode::Success.code(), 0);
        assert_eq!(ResponseCode::GeneralFailure.code(), -1);
        assert_eq!(ResponseCode::InvalidValue.code(), 103);
        assert_eq!(
            ResponseCode::UnsupportedSpectrum.short_description(),
            "UNSUPPORTED_SPECTRUM"
        );
    }
}
