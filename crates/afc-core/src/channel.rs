//! 6 GHz channelization: global operating classes and the channel raster.

use serde::{Deserialize, Serialize};

use crate::band::{BAND_START_MHZ, BAND_STOP_MHZ};

/// One concrete inquiry channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub global_operating_class: u8,
    pub channel_cfi: u8,
    pub start_freq_mhz: f64,
    pub stop_freq_mhz: f64,
}

impl Channel {
    pub fn bandwidth_mhz(&self) -> f64 {
        self.stop_freq_mhz - self.start_freq_mhz
    }

    pub fn center_freq_mhz(&self) -> f64 {
        0.5 * (self.start_freq_mhz + self.stop_freq_mhz)
    }

    /// True when the whole channel span lies inside 5925-7125 MHz.
    pub fn in_band(&self) -> bool {
        self.start_freq_mhz >= BAND_START_MHZ && self.stop_freq_mhz <= BAND_STOP_MHZ
    }
}

/// Channel-width raster anchored at 5950 MHz: centre = 5950 + 5 * cfi.
const CFI_ANCHOR_MHZ: f64 = 5950.0;

/// Channel centre frequencies per 802.11 global operating class.
///
/// Classes 131-134 are the 20/40/80/160 MHz rasters in UNII-5..8;
/// class 136 is the single 20 MHz channel centred at 5935 MHz.
pub fn class_channels(global_operating_class: u8) -> Option<Vec<Channel>> {
    let (bw, first, step, last): (f64, u16, u16, u16) = match global_operating_class {
        131 => (20.0, 1, 4, 233),
        132 => (40.0, 3, 8, 227),
        133 => (80.0, 7, 16, 215),
        134 => (160.0, 15, 32, 207),
        136 => {
            let c = Channel {
                global_operating_class,
                channel_cfi: 2,
                start_freq_mhz: 5925.0,
                stop_freq_mhz: 5945.0,
            };
            return Some(vec![c]);
        }
        _ => return None,
    };

    let mut out = Vec::new();
    let mut cfi = first;
    while cfi <= last {
        let center = CFI_ANCHOR_MHZ + 5.0 * cfi as f64;
        out.push(Channel {
            global_operating_class,
            channel_cfi: cfi as u8,
            start_freq_mhz: center - bw / 2.0,
            stop_freq_mhz: center + bw / 2.0,
        });
        cfi += step;
    }
    Some(out)
}

/// Expand a (class, cfi) pair to a concrete channel.
pub fn channel_for_cfi(global_operating_class: u8, cfi: u8) -> Option<Channel> {
    class_channels(global_operating_class)?
        .into_iter()
        .find(|c| c.channel_cfi == cfi)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_131_raster() {
        let chans = class_channels(131).unwrap();
        assert_eq!(chans.len(), 59);
        let first = chans[0];
        assert_eq!(first.channel_cfi, 1);
        assert_eq!(first.start_freq_mhz, 5945.0);
        assert_eq!(first.stop_freq_mhz, 5965.0);
        let last = chans[chans.len() - 1];
        assert_eq!(last.channel_cfi, 233);
        assert_eq!(last.stop_freq_mhz, 7125.0);
        assert!(chans.iter().all(Channel::in_band));
    }

    #[test]
    fn test_class_134_raster() {
        let chans = class_channels(134).unwrap();
        assert_eq!(chans.len(), 7);
        assert_eq!(chans[0].bandwidth_mhz(), 160.0);
        assert_eq!(chans[0].start_freq_mhz, 5945.0);
    }

    #[test]
    fn test_class_136() {
        let chans = class_channels(136).unwrap();
        assert_eq!(chans.len(), 1);
        assert_eq!(chans[0].channel_cfi, 2);
        assert_eq!(chans[0].center_freq_mhz(), 5935.0);
    }

    #[test]
    fn test_unknown_class() {
        assert!(class_channels(120).is_none());
        assert!(channel_for_cfi(131, 2).is_none());
        assert!(channel_for_cfi(131, 5).is_some());
    }
}
