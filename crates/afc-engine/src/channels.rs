//! Inquiry expansion: operating classes to channels, ranges to PSD bins.

use afc_core::band::{BAND_START_MHZ, BAND_STOP_MHZ};
use afc_core::channel::{channel_for_cfi, class_channels, Channel};

use crate::request::{FrequencyRange, InquiredChannels};
use crate::{EngineError, Result};

/// Expand every inquired channel into concrete channels.
///
/// Unknown operating classes and cfis, and channels lying entirely
/// outside 5925-7125 MHz, reject the inquiry.
pub fn expand_inquired_channels(inquired: &[InquiredChannels]) -> Result<Vec<Channel>> {
    let mut out = Vec::new();
    for inquiry in inquired {
        match &inquiry.channel_cfi {
            None => {
                let channels =
                    class_channels(inquiry.global_operating_class).ok_or_else(|| {
                        EngineError::InvalidRequest(format!(
                            "unknown globalOperatingClass {}",
                            inquiry.global_operating_class
                        ))
                    })?;
                out.extend(channels);
            }
            Some(cfis) => {
                for &cfi in cfis {
                    let channel = channel_for_cfi(inquiry.global_operating_class, cfi)
                        .ok_or_else(|| {
                            EngineError::InvalidRequest(format!(
                                "invalid channelCfi {} for class {}",
                                cfi, inquiry.global_operating_class
                            ))
                        })?;
                    out.push(channel);
                }
            }
        }
    }

    if let Some(bad) = out.iter().find(|c| !c.in_band()) {
        return Err(EngineError::InvalidRequest(format!(
            "channel {}/{} lies outside 5925-7125 MHz",
            bad.global_operating_class, bad.channel_cfi
        )));
    }
    Ok(out)
}

/// One PSD reporting bin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PsdBin {
    pub start_freq_mhz: f64,
    pub stop_freq_mhz: f64,
}

/// Subdivide inquired frequency ranges into bins of `bin_mhz`, clipped to
/// the 6 GHz band. A range entirely outside the band is invalid.
pub fn expand_psd_bins(ranges: &[FrequencyRange], bin_mhz: f64) -> Result<Vec<PsdBin>> {
    let mut out = Vec::new();
    for range in ranges {
        if range.high_frequency_mhz <= range.low_frequency_mhz {
            return Err(EngineError::InvalidRequest(format!(
                "empty frequency range {} - {} MHz",
                range.low_frequency_mhz, range.high_frequency_mhz
            )));
        }
        if range.high_frequency_mhz <= BAND_START_MHZ || range.low_frequency_mhz >= BAND_STOP_MHZ {
            return Err(EngineError::InvalidRequest(format!(
                "frequency range {} - {} MHz lies outside 5925-7125 MHz",
                range.low_frequency_mhz, range.high_frequency_mhz
            )));
        }
        let lo = range.low_frequency_mhz.max(BAND_START_MHZ);
        let hi = range.high_frequency_mhz.min(BAND_STOP_MHZ);

        let mut start = lo;
        while start < hi - 1.0e-9 {
            let stop = (start + bin_mhz).min(hi);
            out.push(PsdBin {
                start_freq_mhz: start,
                stop_freq_mhz: stop,
            });
            start = stop;
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::InquiredChannels;

    #[test]
    fn test_expand_whole_class() {
        let channels = expand_inquired_channels(&[InquiredChannels {
            global_operating_class: 133,
            channel_cfi: None,
        }])
        .unwrap();
        assert_eq!(channels.len(), 14);
        assert!(channels.iter().all(|c| c.bandwidth_mhz() == 80.0));
    }

    #[test]
    fn test_expand_specific_cfis() {
        let channels = expand_inquired_channels(&[InquiredChannels {
            global_operating_class: 131,
            channel_cfi: Some(vec![5, 21]),
        }])
        .unwrap();
        assert_eq!(channels.len(), 2);
        assert_eq!(channels[0].channel_cfi, 5);
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(expand_inquired_channels(&[InquiredChannels {
            global_operating_class: 99,
            channel_cfi: None,
        }])
        .is_err());
        assert!(expand_inquired_channels(&[InquiredChannels {
            global_operating_class: 131,
            channel_cfi: Some(vec![2]),
        }])
        .is_err());
    }

    #[test]
    fn test_psd_bins() {
        let bins = expand_psd_bins(
            &[FrequencyRange {
                low_frequency_mhz: 5925.0,
                high_frequency_mhz: 5995.0,
            }],
            20.0,
        )
        .unwrap();
        assert_eq!(bins.len(), 4);
        assert_eq!(bins[0].start_freq_mhz, 5925.0);
        // The last bin is the 10 MHz remainder.
        assert_eq!(bins[3].start_freq_mhz, 5985.0);
        assert_eq!(bins[3].stop_freq_mhz, 5995.0);
    }

    #[test]
    fn test_psd_range_clipping_and_rejection() {
        // Straddling the band edge clips.
        let bins = expand_psd_bins(
            &[FrequencyRange {
                low_frequency_mhz: 5900.0,
                high_frequency_mhz: 5965.0,
            }],
            20.0,
        )
        .unwrap();
        assert_eq!(bins[0].start_freq_mhz, 5925.0);

        // Entirely outside is INVALID_PARAMS territory.
        assert!(expand_psd_bins(
            &[FrequencyRange {
                low_frequency_mhz: 5000.0,
                high_frequency_mhz: 5100.0,
            }],
            20.0,
        )
        .is_err());
    }
}
