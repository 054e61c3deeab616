//! FS antenna gain patterns and passive-repeater discrimination.
//!
//! The pattern family covers ITU-R F.1245 and F.699 dish envelopes, the
//! F.1336 omni envelope, the WinnForum R2-AIP-07 category procedure, user
//! lookup tables, and an ideal omni. Each evaluates through a single
//! [`AntennaPattern::gain_dbi`] operation.

pub mod itu;
pub mod pattern;
pub mod r2aip07;
pub mod repeater;

pub use pattern::{AntennaPattern, GainResult};
pub use r2aip07::r2aip07_gain;
pub use repeater::{
    back_to_back_discrimination, billboard_discrimination, BillboardDiscrimination,
};

use thiserror::Error;

/// Antenna evaluation errors.
#[derive(Error, Debug)]
pub enum AntennaError {
    /// R2-AIP-07 is only defined inside the 6 GHz FS allocations.
    #[error("frequency {0} MHz outside the R2-AIP-07 bands")]
    FrequencyOutOfBand(f64),

    /// A LUT pattern needs at least two points.
    #[error("gain LUT has {0} points, need at least 2")]
    LutTooShort(usize),
}

/// Result type for antenna operations.
pub type Result<T> = std::result::Result<T, AntennaError>;

/// Fold an arbitrary angle into [0, 180] degrees off boresight.
pub(crate) fn fold_angle_deg(angle_deg: f64) -> f64 {
    let mut a = angle_deg.abs();
    while a >= 360.0 {
        a -= 360.0;
    }
    if a > 180.0 {
        a = 360.0 - a;
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_fold_angle() {
        assert_abs_diff_eq!(fold_angle_deg(0.0), 0.0);
        assert_abs_diff_eq!(fold_angle_deg(190.0), 170.0);
        assert_abs_diff_eq!(fold_angle_deg(360.0), 0.0);
        assert_abs_diff_eq!(fold_angle_deg(-30.0), 30.0);
        assert_abs_diff_eq!(fold_angle_deg(725.0), 5.0);
    }
}
