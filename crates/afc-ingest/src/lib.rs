//! FS link database ingester.
//!
//! Parses the combined pipe-delimited FS database export (US FCC ULS
//! records prefixed `US:XX`, Canadian ISED records prefixed `CA:XX`),
//! assembles segmented microwave links, matches free-text antenna and
//! transmitter model strings to catalog entries, resolves channel
//! bandwidth from emission designators with frequency-table fallbacks,
//! and filters to the 5925-7125 MHz band. Records failing the anomaly
//! filter are routed to the anomalous sink instead of aborting the run.

pub mod anomaly;
pub mod assemble;
pub mod catalog;
pub mod emission;
pub mod freq;
pub mod ras;
pub mod reader;
pub mod record;

pub use anomaly::{AnomalousRecord, AnomalySink};
pub use assemble::{AssembledDatabase, LinkAssembler, LinkAssemblerConfig};
pub use catalog::{AntennaModelMap, TransmitterModelMap};
pub use emission::emission_designator_to_bandwidth_mhz;
pub use freq::FreqAssignment;
pub use ras::read_ras_zones;
pub use reader::{FsDatabaseReader, RawRecord};

use thiserror::Error;

/// Ingest error types.
#[derive(Error, Debug)]
pub enum IngestError {
    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A line did not carry a `REGION:TYPE` prefix.
    #[error("invalid record prefix on line {line}: {prefix}")]
    InvalidPrefix { line: usize, prefix: String },

    /// Unknown record type code.
    #[error("unknown record type on line {line}: {record_type}")]
    UnknownRecordType { line: usize, record_type: String },

    /// A catalog file is malformed.
    #[error("catalog file {path}: {message}")]
    Catalog { path: String, message: String },

    /// CSV-level failure in a catalog or sink.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Regex in the antenna model map failed to compile.
    #[error("invalid antenna map regex '{pattern}': {message}")]
    Regex { pattern: String, message: String },
}

/// Result type for ingest operations.
pub type Result<T> = std::result::Result<T, IngestError>;
