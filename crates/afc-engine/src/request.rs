//! Available-spectrum inquiry request, wire shape.

use serde::{Deserialize, Serialize};

use crate::{EngineError, Result};

/// Top-level request envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AfcRequest {
    #[serde(rename = "availableSpectrumInquiryRequests")]
    pub requests: Vec<SpectrumInquiry>,
}

impl AfcRequest {
    pub fn from_json(text: &str) -> Result<Self> {
        let req: AfcRequest = serde_json::from_str(text)?;
        if req.requests.is_empty() {
            return Err(EngineError::InvalidRequest(
                "no availableSpectrumInquiryRequests".to_string(),
            ));
        }
        Ok(req)
    }
}

/// One spectrum inquiry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectrumInquiry {
    #[serde(rename = "requestId")]
    pub request_id: String,
    #[serde(rename = "deviceDescriptor")]
    pub device_descriptor: DeviceDescriptor,
    pub location: RequestLocation,
    #[serde(rename = "inquiredFrequencyRange", default)]
    pub inquired_frequency_range: Vec<FrequencyRange>,
    #[serde(rename = "inquiredChannels", default)]
    pub inquired_channels: Vec<InquiredChannels>,
    #[serde(rename = "minDesiredPower", default)]
    pub min_desired_power_dbm: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    #[serde(rename = "serialNumber")]
    pub serial_number: String,
    #[serde(rename = "certificationId", default)]
    pub certification_id: Vec<String>,
    #[serde(rename = "rulesetIds", default)]
    pub ruleset_ids: Vec<String>,
}

/// Inquiry frequency range, MHz.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrequencyRange {
    #[serde(rename = "lowFrequency")]
    pub low_frequency_mhz: f64,
    #[serde(rename = "highFrequency")]
    pub high_frequency_mhz: f64,
}

/// Inquired channels of one global operating class. An absent cfi list
/// means every channel of the class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InquiredChannels {
    #[serde(rename = "globalOperatingClass")]
    pub global_operating_class: u8,
    #[serde(rename = "channelCfi", default)]
    pub channel_cfi: Option<Vec<u8>>,
}

/// RLAN location with its uncertainty region and elevation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestLocation {
    #[serde(flatten)]
    pub region: RlanRegion,
    pub elevation: Elevation,
    /// 0 outdoor, 1 indoor, 2 unknown (treated as indoor for penetration).
    #[serde(rename = "indoorDeployment", default)]
    pub indoor_deployment: u8,
}

impl RequestLocation {
    pub fn is_indoor(&self) -> bool {
        self.indoor_deployment != 0
    }
}

/// Uncertainty region variants. Exactly one appears on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RlanRegion {
    #[serde(rename = "ellipse")]
    Ellipse {
        center: Point,
        /// Semi-major axis, metres.
        #[serde(rename = "majorAxis")]
        major_axis_m: f64,
        /// Semi-minor axis, metres.
        #[serde(rename = "minorAxis")]
        minor_axis_m: f64,
        /// Degrees clockwise from true north.
        #[serde(rename = "orientation")]
        orientation_deg: f64,
    },
    #[serde(rename = "linearPolygon")]
    LinearPolygon {
        #[serde(rename = "outerBoundary")]
        outer_boundary: Vec<Point>,
    },
    #[serde(rename = "radialPolygon")]
    RadialPolygon {
        center: Point,
        #[serde(rename = "outerBoundary")]
        outer_boundary: Vec<VectorPoint>,
    },
}

impl RlanRegion {
    /// Geometric centre of the region.
    pub fn center(&self) -> (f64, f64) {
        match self {
            RlanRegion::Ellipse { center, .. } => (center.latitude, center.longitude),
            RlanRegion::LinearPolygon { outer_boundary } => {
                let n = outer_boundary.len().max(1) as f64;
                let lat = outer_boundary.iter().map(|p| p.latitude).sum::<f64>() / n;
                let lon = outer_boundary.iter().map(|p| p.longitude).sum::<f64>() / n;
                (lat, lon)
            }
            RlanRegion::RadialPolygon { center, .. } => (center.latitude, center.longitude),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub latitude: f64,
    pub longitude: f64,
}

/// Radial-polygon vertex: bearing and range from the centre.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VectorPoint {
    /// Degrees clockwise from true north.
    pub angle: f64,
    /// Metres.
    pub length: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Elevation {
    /// Metres, AGL or AMSL per `height_type`.
    pub height: f64,
    #[serde(rename = "heightType")]
    pub height_type: HeightType,
    /// Plus/minus metres.
    #[serde(rename = "verticalUncertainty")]
    pub vertical_uncertainty_m: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeightType {
    #[serde(rename = "AGL")]
    Agl,
    #[serde(rename = "AMSL")]
    Amsl,
}

#[cfg(test)]
mod tests {
    use super::*;

    const REQUEST: &str = r#"{
      "availableSpectrumInquiryRequests": [
        {
          "requestId": "0",
          "deviceDescriptor": {
            "serialNumber": "sn-0001",
            "certificationId": ["FCCID-AFC01"],
            "rulesetIds": ["US_47_CFR_PART_15_SUBPART_E"]
          },
          "location": {
            "ellipse": {
              "center": {"latitude": 40.75924, "longitude": -73.97434},
              "majorAxis": 100,
              "minorAxis": 50,
              "orientation": 45
            },
            "elevation": {"height": 129, "heightType": "AGL", "verticalUncertainty": 5},
            "indoorDeployment": 1
          },
          "inquiredFrequencyRange": [
            {"lowFrequency": 5925, "highFrequency": 6425}
          ],
          "inquiredChannels": [
            {"globalOperatingClass": 133},
            {"globalOperatingClass": 131, "channelCfi": [5, 21]}
          ],
          "minDesiredPower": 24
        }
      ]
    }"#;

    #[test]
    fn test_parse_request() {
        let req = AfcRequest::from_json(REQUEST).unwrap();
        assert_eq!(req.requests.len(), 1);
        let inquiry = &req.requests[0];
        assert_eq!(inquiry.request_id, "0");
        assert!(inquiry.location.is_indoor());
        assert_eq!(inquiry.inquired_channels.len(), 2);
        assert_eq!(
            inquiry.inquired_channels[1].channel_cfi,
            Some(vec![5, 21])
        );
        match &inquiry.location.region {
            RlanRegion::Ellipse {
                major_axis_m,
                minor_axis_m,
                orientation_deg,
                center,
            } => {
                assert_eq!(*major_axis_m, 100.0);
                assert_eq!(*minor_axis_m, 50.0);
                assert_eq!(*orientation_deg, 45.0);
                assert!((center.latitude - 40.75924).abs() < 1e-9);
            }
            other => panic!("unexpected region {other:?}"),
        }
    }

    #[test]
    fn test_empty_request_rejected() {
        assert!(AfcRequest::from_json(r#"{"availableSpectrumInquiryRequests": []}"#).is_err());
    }

    #[test]
    fn test_radial_polygon_parses() {
        let text = r#"{
          "availableSpectrumInquiryRequests": [{
            "requestId": "1",
            "deviceDescriptor": {"serialNumber": "s", "certificationId": [], "rulesetIds": []},
            "location": {
              "radialPolygon": {
                "center": {"latitude": 40.0, "longitude": -74.0},
                "outerBoundary": [
                  {"angle": 0, "length": 100},
                  {"angle": 120, "length": 150},
                  {"angle": 240, "length": 100}
                ]
              },
              "elevation": {"height": 10, "heightType": "AMSL", "verticalUncertainty": 2},
              "indoorDeployment": 0
            },
            "inquiredChannels": [{"globalOperatingClass": 131}]
          }]
        }"#;
        let req = AfcRequest::from_json(text).unwrap();
        match &req.requests[0].location.region {
            RlanRegion::RadialPolygon { outer_boundary, .. } => {
                assert_eq!(outer_boundary.len(), 3)
            }
            other => panic!("unexpected region {other:?}"),
        }
    }
}
