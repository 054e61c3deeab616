//! Frequency-assignment table with the R2-AIP-19 fallback rules.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::{IngestError, Result};

/// Assignment-frequency to channel-bandwidth table, used when an emission
/// designator is unparseable.
#[derive(Debug, Clone, Default)]
pub struct FreqAssignment {
    /// (channel frequency MHz, bandwidth MHz) rows.
    rows: Vec<(f64, f64)>,
}

impl FreqAssignment {
    /// Read a header-labelled CSV with `channelFrequency` and
    /// `channelBandwidth` columns. `#`-prefixed lines are comments.
    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let display = path.as_ref().display().to_string();
        let mut text = String::new();
        File::open(&path)?.read_to_string(&mut text)?;
        Self::from_csv_str(&text).map_err(|e| match e {
            IngestError::Catalog { message, .. } => IngestError::Catalog {
                path: display.clone(),
                message,
            },
            other => other,
        })
    }

    pub fn from_csv_str(text: &str) -> Result<Self> {
        let cleaned: String = text
            .lines()
            .filter(|l| !l.trim_start().starts_with('#') && !l.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(cleaned.as_bytes());

        let headers = reader.headers()?.clone();
        let freq_idx = headers
            .iter()
            .position(|h| h == "channelFrequency")
            .ok_or_else(|| IngestError::Catalog {
                path: String::new(),
                message: "label line missing channelFrequency".to_string(),
            })?;
        let bw_idx = headers
            .iter()
            .position(|h| h == "channelBandwidth")
            .ok_or_else(|| IngestError::Catalog {
                path: String::new(),
                message: "label line missing channelBandwidth".to_string(),
            })?;

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let freq: f64 = record
                .get(freq_idx)
                .and_then(|s| s.parse().ok())
                .filter(|f| *f > 0.0)
                .ok_or_else(|| IngestError::Catalog {
                    path: String::new(),
                    message: format!("invalid frequency in row {record:?}"),
                })?;
            let bw: f64 = record
                .get(bw_idx)
                .and_then(|s| s.parse().ok())
                .filter(|b| *b > 0.0)
                .ok_or_else(|| IngestError::Catalog {
                    path: String::new(),
                    message: format!("invalid bandwidth in row {record:?}"),
                })?;
            rows.push((freq, bw));
        }

        Ok(Self { rows })
    }

    /// Bandwidth for a US assignment frequency.
    ///
    /// Table rows match within 0.5 MHz; otherwise the rule-based fallback
    /// covers the 6 GHz allocations, with band-edge ramps where a channel
    /// must fit inside its sub-band. Returns None outside the allocations
    /// (UNII-6 has no US FS assignments).
    pub fn bandwidth_us(&self, freq_mhz: f64) -> Option<f64> {
        for (freq, bw) in &self.rows {
            if (freq_mhz - freq).abs() <= 0.5 {
                return Some(*bw);
            }
        }

        if freq_mhz < 5925.0 {
            None
        } else if freq_mhz < 5955.0 {
            Some(2.0 * (freq_mhz - 5925.0))
        } else if freq_mhz < 6395.0 {
            Some(60.0)
        } else if freq_mhz < 6425.0 {
            Some(2.0 * (6425.0 - freq_mhz))
        } else if freq_mhz < 6525.0 {
            None
        } else if freq_mhz < 6540.0 {
            Some(2.0 * (freq_mhz - 6525.0))
        } else if freq_mhz < 6860.0 {
            Some(30.0)
        } else if freq_mhz < 6875.0 {
            Some(2.0 * (6875.0 - freq_mhz))
        } else {
            None
        }
    }
}
