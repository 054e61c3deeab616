//! Error types shared across the AFC workspace.

use thiserror::Error;

/// Core AFC error type.
///
/// The variants mirror the failure policy of the analysis pipeline:
/// per-record ingest failures and model-match misses are non-fatal and
/// routed to the anomalous sink, while invalid input and missing data in
/// the request path abort the request.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed request, config, or out-of-band frequency.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Terrain/building data or a required file does not cover the request.
    #[error("missing data: {0}")]
    MissingData(String),

    /// FS record field parse failure. Non-fatal; the record is dropped
    /// to the anomalous sink with this reason.
    #[error("ingest failure for record {record}: {reason}")]
    Ingest { record: String, reason: String },

    /// Antenna or transmitter model string did not match the catalog.
    #[error("unmatched {kind} model: {model}")]
    ModelMatch { kind: &'static str, model: String },

    /// A propagation routine returned a non-finite value or a profile
    /// could not be constructed.
    #[error("compute failure: {0}")]
    Compute(String),

    /// The analysis was cancelled between channels.
    #[error("analysis cancelled")]
    Cancelled,

    /// The analysis exceeded its wall-clock budget.
    #[error("analysis timed out after {0} s")]
    Timeout(u64),

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for AFC core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidInput("lowFrequency > highFrequency".to_string());
        assert_eq!(
            err.to_string(),
            "invalid input: lowFrequency > highFrequency"
        );

        let err = Error::Ingest {
            record: "US:FR 123".to_string(),
            reason: "bad frequency".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "ingest failure for record US:FR 123: bad frequency"
        );

        let err = Error::ModelMatch {
            kind: "antenna",
            model: "UNKNOWN-DISH".to_string(),
        };
        assert_eq!(err.to_string(), "unmatched antenna model: UNKNOWN-DISH");

        let err = Error::Timeout(30);
        assert_eq!(err.to_string(), "analysis timed out after 30 s");
    }
}
