//! AFC analysis engine.
//!
//! Owns the per-request pipeline: expand inquired channels and frequency
//! ranges, enumerate the RLAN uncertainty region into scan points, run
//! the propagation composer against every in-range FS link, and reduce
//! the per-triple interference margins into per-channel EIRP ceilings and
//! per-bin PSD limits. All shared state lives in an [`AnalysisContext`];
//! there is no global mutable state.

pub mod analysis;
pub mod channels;
pub mod config;
pub mod context;
pub mod excthr;
pub mod request;
pub mod response;
pub mod scan;

pub use analysis::{analyze, AnalysisOutcome, ChannelState};
pub use channels::{expand_inquired_channels, expand_psd_bins};
pub use config::AfcConfig;
pub use context::AnalysisContext;
pub use excthr::ExceedThresholdWriter;
pub use request::{AfcRequest, RlanRegion, SpectrumInquiry};
pub use response::{build_response, AfcResponse};
pub use scan::enumerate_scan_points;

use thiserror::Error;

/// Engine error types.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Request failed validation.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Config failed validation.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// JSON (de)serialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O failure writing a report sink.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV sink failure.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The analysis was cancelled.
    #[error("analysis cancelled")]
    Cancelled,

    /// The wall-clock budget was exhausted.
    #[error("analysis timed out after {0} s")]
    Timeout(u64),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
