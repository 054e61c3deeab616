//! Elevation-profile construction, line-of-sight testing, and the
//! composite path-loss models of the FCC 6 GHz Report & Order analysis.
//!
//! The Longley-Rice numeric core is an external collaborator behind the
//! [`PointToPointModel`] trait; everything else (free space, WINNER-II,
//! P.2108 clutter, P.2109 building entry, the model-selection composer)
//! lives here.

pub mod composer;
pub mod itm;
pub mod los;
pub mod math;
pub mod models;
pub mod p452;
pub mod profile;

pub use composer::{FixedLosses, PathGeometry, PropagationConfig, PropagationModelKind, PathLossComposer};
pub use itm::{ItmOutcome, ItmParameters, ItmGround, ItmPolarization, KnifeEdgeItm, PointToPointModel};
pub use los::is_line_of_sight;
pub use models::{
    building_entry_loss, fspl_db, p2108_clutter_loss, winner2_loss, BuildingPenetration,
    BuildingType, Winner2Scenario,
};
pub use p452::p452_clutter_loss;
pub use profile::{ElevationProfileBuilder, ProfileCache};

use thiserror::Error;

/// Propagation errors.
#[derive(Error, Debug)]
pub enum PropError {
    /// The elevation profile could not be constructed.
    #[error("elevation profile undefined: {0}")]
    ProfileUndefined(String),

    /// A model produced a non-finite loss.
    #[error("non-finite loss from {model}: {detail}")]
    NonFinite { model: &'static str, detail: String },

    /// The Longley-Rice routine reported a hard error.
    #[error("ITM error {code}: {mode}")]
    Itm { code: i32, mode: String },
}

/// Result type for propagation operations.
pub type Result<T> = std::result::Result<T, PropError>;
