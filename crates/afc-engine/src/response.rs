//! Available-spectrum inquiry response, wire shape.

use serde::{Deserialize, Serialize};

use afc_core::codes::ResponseCode;

use crate::analysis::{AnalysisOutcome, ChannelState};
use crate::request::{FrequencyRange, SpectrumInquiry};

/// Top-level response envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AfcResponse {
    #[serde(rename = "availableSpectrumInquiryResponses")]
    pub responses: Vec<SpectrumInquiryResponse>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectrumInquiryResponse {
    #[serde(rename = "requestId")]
    pub request_id: String,
    #[serde(rename = "rulesetId")]
    pub ruleset_id: String,
    pub response: ResponseStatus,
    #[serde(
        rename = "availableFrequencyInfo",
        skip_serializing_if = "Option::is_none"
    )]
    pub available_frequency_info: Option<Vec<AvailableFrequencyInfo>>,
    #[serde(
        rename = "availableChannelInfo",
        skip_serializing_if = "Option::is_none"
    )]
    pub available_channel_info: Option<Vec<AvailableChannelInfo>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseStatus {
    #[serde(rename = "responseCode")]
    pub response_code: i32,
    #[serde(rename = "shortDescription")]
    pub short_description: String,
}

impl ResponseStatus {
    pub fn from_code(code: ResponseCode) -> Self {
        Self {
            response_code: code.code(),
            short_description: code.short_description().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailableFrequencyInfo {
    #[serde(rename = "frequencyRange")]
    pub frequency_range: FrequencyRange,
    /// dBm/MHz over the range.
    #[serde(rename = "maxPsd")]
    pub max_psd: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailableChannelInfo {
    #[serde(rename = "globalOperatingClass")]
    pub global_operating_class: u8,
    #[serde(rename = "channelCfi")]
    pub channel_cfi: Vec<u8>,
    #[serde(rename = "maxEirp")]
    pub max_eirp: Vec<f64>,
}

/// Assemble the wire response for one inquiry from its analysis outcome.
///
/// Channels that came back unavailable or unknown are omitted from
/// `availableChannelInfo`; an analysis that produced nothing at all
/// reports the outcome's failure code instead of success.
pub fn build_response(inquiry: &SpectrumInquiry, outcome: &AnalysisOutcome) -> SpectrumInquiryResponse {
    let ruleset_id = inquiry
        .device_descriptor
        .ruleset_ids
        .first()
        .cloned()
        .unwrap_or_else(|| "US_47_CFR_PART_15_SUBPART_E".to_string());

    if outcome.code != ResponseCode::Success {
        return SpectrumInquiryResponse {
            request_id: inquiry.request_id.clone(),
            ruleset_id,
            response: ResponseStatus {
                response_code: outcome.code.code(),
                short_description: outcome
                    .diagnostic
                    .clone()
                    .unwrap_or_else(|| outcome.code.short_description().to_string()),
            },
            available_frequency_info: None,
            available_channel_info: None,
        };
    }

    // Group per operating class, preserving channel order.
    let mut channel_info: Vec<AvailableChannelInfo> = Vec::new();
    for result in &outcome.channels {
        let eirp = match result.state {
            ChannelState::Available { max_eirp_dbm } => max_eirp_dbm,
            _ => continue,
        };
        match channel_info
            .iter_mut()
            .find(|c| c.global_operating_class == result.channel.global_operating_class)
        {
            Some(info) => {
                info.channel_cfi.push(result.channel.channel_cfi);
                info.max_eirp.push(eirp);
            }
            None => channel_info.push(AvailableChannelInfo {
                global_operating_class: result.channel.global_operating_class,
                channel_cfi: vec![result.channel.channel_cfi],
                max_eirp: vec![eirp],
            }),
        }
    }

    let frequency_info: Vec<AvailableFrequencyInfo> = outcome
        .psd_bins
        .iter()
        .map(|bin| AvailableFrequencyInfo {
            frequency_range: FrequencyRange {
                low_frequency_mhz: bin.start_freq_mhz,
                high_frequency_mhz: bin.stop_freq_mhz,
            },
            max_psd: bin.max_psd_dbm_mhz,
        })
        .collect();

    SpectrumInquiryResponse {
        request_id: inquiry.request_id.clone(),
        ruleset_id,
        response: ResponseStatus::from_code(ResponseCode::Success),
        available_frequency_info: if frequency_info.is_empty() {
            None
        } else {
            Some(frequency_info)
        },
        available_channel_info: if channel_info.is_empty() {
            None
        } else {
            Some(channel_info)
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_code() {
        let s = ResponseStatus::from_code(ResponseCode::Success);
        assert_eq!(s.response_code, 0);
        assert_eq!(s.short_description, "SUCCESS");
    }

    #[test]
    fn test_wire_field_names() {
        let resp = AfcResponse {
            responses: vec![SpectrumInquiryResponse {
                request_id: "0".to_string(),
                ruleset_id: "US_47_CFR_PART_15_SUBPART_E".to_string(),
                response: ResponseStatus::from_code(ResponseCode::Success),
                available_frequency_info: None,
                available_channel_info: Some(vec![AvailableChannelInfo {
                    global_operating_class: 131,
                    channel_cfi: vec![5],
                    max_eirp: vec![30.0],
                }]),
            }],
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"availableSpectrumInquiryResponses\""));
        assert!(json.contains("\"globalOperatingClass\":131"));
        assert!(json.contains("\"maxEirp\""));
        // Absent sections are omitted, not null.
        assert!(!json.contains("availableFrequencyInfo"));
    }
}
