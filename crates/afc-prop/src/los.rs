//! Line-of-sight test over a building-inclusive elevation profile.

use afc_core::result::ElevationProfile;

/// True when the straight line from the transmitter top to the receiver
/// top clears every profile sample.
///
/// The line is drawn in height-versus-sample-index space; a sample whose
/// (ground + building) height exceeds the interpolant blocks the path.
/// Terminal heights are AGL above their profile endpoints.
pub fn is_line_of_sight(profile: &ElevationProfile, tx_agl: f64, rx_agl: f64) -> bool {
    let n = profile.heights.len();
    if n < 2 {
        return true;
    }

    let tx_amsl = profile.heights[0] + tx_agl;
    let rx_amsl = profile.heights[n - 1] + rx_agl;

    for (i, &h) in profile.heights.iter().enumerate() {
        let signal = (tx_amsl * (n - 1 - i) as f64 + rx_amsl * i as f64) / (n - 1) as f64;
        if signal - h < 0.0 {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(heights: Vec<f64>) -> ElevationProfile {
        ElevationProfile {
            dx_metres: 100.0,
            heights,
            building_window: (0, 0),
        }
    }

    #[test]
    fn test_flat_clear_path() {
        let p = profile(vec![0.0; 11]);
        assert!(is_line_of_sight(&p, 10.0, 10.0));
    }

    #[test]
    fn test_blocking_ridge() {
        let mut h = vec![0.0; 11];
        h[5] = 50.0;
        let p = profile(h);
        assert!(!is_line_of_sight(&p, 10.0, 10.0));
    }

    #[test]
    fn test_grazing_sample_counts_as_los() {
        // Clearance exactly zero at the midpoint: still LOS.
        let mut h = vec![0.0; 11];
        h[5] = 10.0;
        let p = profile(h);
        assert!(is_line_of_sight(&p, 10.0, 10.0));
        // A hair above blocks.
        let mut h = vec![0.0; 11];
        h[5] = 10.0 + 1e-9;
        let p = profile(h);
        assert!(!is_line_of_sight(&p, 10.0, 10.0));
    }

    #[test]
    fn test_sloped_terminals() {
        // Rising terrain toward a taller receiver mast stays clear.
        let h: Vec<f64> = (0..21).map(|i| i as f64).collect();
        let p = profile(h);
        assert!(is_line_of_sight(&p, 5.0, 5.0));
    }
}
