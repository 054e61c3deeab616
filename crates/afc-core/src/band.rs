//! UNII sub-band table and spectral-overlap arithmetic.

/// Speed of light in m/s.
pub const SPEED_OF_LIGHT: f64 = 2.99792458e8;

/// Average earth radius used throughout path geometry, in metres.
///
/// This is the WGS84 equatorial radius; FS coordination has historically
/// used it as the spherical-earth radius and the regression data assumes it.
pub const AVERAGE_EARTH_RADIUS: f64 = 6378.137e3;

/// One UNII sub-band window in MHz.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandWindow {
    pub name: &'static str,
    pub start_mhz: f64,
    pub stop_mhz: f64,
}

/// UNII-5: 5925-6425 MHz.
pub const UNII5: BandWindow = BandWindow {
    name: "UNII5",
    start_mhz: 5925.0,
    stop_mhz: 6425.0,
};

/// UNII-6: 6425-6525 MHz.
pub const UNII6: BandWindow = BandWindow {
    name: "UNII6",
    start_mhz: 6425.0,
    stop_mhz: 6525.0,
};

/// UNII-7: 6525-6875 MHz.
pub const UNII7: BandWindow = BandWindow {
    name: "UNII7",
    start_mhz: 6525.0,
    stop_mhz: 6875.0,
};

/// UNII-8: 6875-7125 MHz.
pub const UNII8: BandWindow = BandWindow {
    name: "UNII8",
    start_mhz: 6875.0,
    stop_mhz: 7125.0,
};

/// All four UNII windows covering the 6 GHz band.
pub const UNII_BANDS: [BandWindow; 4] = [UNII5, UNII6, UNII7, UNII8];

/// Full analysis band: 5925-7125 MHz.
pub const BAND_START_MHZ: f64 = 5925.0;
/// Full analysis band: 5925-7125 MHz.
pub const BAND_STOP_MHZ: f64 = 7125.0;

impl BandWindow {
    /// True if `[start, stop]` overlaps this window with positive measure.
    pub fn overlaps(&self, start_mhz: f64, stop_mhz: f64) -> bool {
        stop_mhz > self.start_mhz && start_mhz < self.stop_mhz
    }

    /// True if the frequency lies inside the window (inclusive).
    pub fn contains(&self, freq_mhz: f64) -> bool {
        freq_mhz >= self.start_mhz && freq_mhz <= self.stop_mhz
    }
}

/// Fraction of the signal bandwidth `[sig_start, sig_stop]` that falls
/// inside the receiver band `[rx_start, rx_stop]`.
///
/// Returns 0 when the intervals are disjoint (touching endpoints count as
/// disjoint), otherwise `(min(stops) - max(starts)) / (sig_stop - sig_start)`.
pub fn spectral_overlap(
    sig_start: f64,
    sig_stop: f64,
    rx_start: f64,
    rx_stop: f64,
) -> f64 {
    if sig_stop <= rx_start || sig_start >= rx_stop {
        0.0
    } else {
        let f1 = sig_start.max(rx_start);
        let f2 = sig_stop.min(rx_stop);
        (f2 - f1) / (sig_stop - sig_start)
    }
}
