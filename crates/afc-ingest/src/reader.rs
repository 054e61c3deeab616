//! Line reader for the combined pipe-delimited FS database export.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use tracing::warn;

use afc_core::codes::Region;

use crate::record::*;
use crate::{IngestError, Result};

/// Record type codes accepted after the region prefix.
const VALID_RECORD_TYPES: &[&str] = &[
    "HD", "PA", "AN", "FR", "LO", "EM", "EN", "MF", "CP", "SG", "SD", "PP", "PR", "AP", "TA",
];

/// One parsed line with its region, type code, and typed payload.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub line_number: usize,
    pub region: Region,
    pub record_type: String,
    pub payload: RecordPayload,
}

/// Typed payload per record type. Types carried for completeness but not
/// used by link assembly land in `Other`.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordPayload {
    Header(HeaderRecord),
    Entity(EntityRecord),
    Location(LocationRecord),
    Antenna(AntennaRecord),
    Path(PathRecord),
    Segment(SegmentRecord),
    Frequency(FrequencyRecord),
    Emission(EmissionRecord),
    StationData(StationDataRecord),
    PassiveRepeater(PassiveRepeaterRecord),
    Transmitter(TransmitterRecord),
    Other { fields: Vec<String> },
}

/// Streaming reader over an FS database export.
pub struct FsDatabaseReader<R: Read> {
    lines: std::io::Lines<BufReader<R>>,
    line_number: usize,
}

impl FsDatabaseReader<File> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::new(File::open(path)?))
    }
}

impl<R: Read> FsDatabaseReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            lines: BufReader::new(inner).lines(),
            line_number: 0,
        }
    }

    /// Parse one line. `REGION:TYPE` heads the first field; the rest are
    /// positional fields of that record type.
    fn parse_line(&self, line: &str) -> Result<RawRecord> {
        let fields: Vec<&str> = line.split('|').collect();
        let prefix = fields[0];

        let (region_str, type_str) = prefix.split_once(':').ok_or_else(|| {
            IngestError::InvalidPrefix {
                line: self.line_number,
                prefix: prefix.to_string(),
            }
        })?;
        let region = region_str
            .parse::<Region>()
            .map_err(|_| IngestError::InvalidPrefix {
                line: self.line_number,
                prefix: prefix.to_string(),
            })?;

        if !VALID_RECORD_TYPES.contains(&type_str) {
            return Err(IngestError::UnknownRecordType {
                line: self.line_number,
                record_type: type_str.to_string(),
            });
        }

        let payload = match type_str {
            "HD" => RecordPayload::Header(HeaderRecord::from_fields(&fields)),
            "EN" => RecordPayload::Entity(EntityRecord::from_fields(&fields)),
            "LO" => RecordPayload::Location(LocationRecord::from_fields(&fields)),
            "AN" => RecordPayload::Antenna(AntennaRecord::from_fields(&fields)),
            "PA" => RecordPayload::Path(PathRecord::from_fields(&fields)),
            "SG" => RecordPayload::Segment(SegmentRecord::from_fields(&fields)),
            "FR" => RecordPayload::Frequency(FrequencyRecord::from_fields(&fields)),
            "EM" => RecordPayload::Emission(EmissionRecord::from_fields(&fields)),
            "SD" => RecordPayload::StationData(StationDataRecord::from_fields(&fields)),
            "PP" => RecordPayload::PassiveRepeater(PassiveRepeaterRecord::from_fields(&fields)),
            "TA" => RecordPayload::Transmitter(TransmitterRecord::from_fields(&fields)),
            _ => RecordPayload::Other {
                fields: fields.iter().map(|s| s.to_string()).collect(),
            },
        };

        Ok(RawRecord {
            line_number: self.line_number,
            region,
            record_type: type_str.to_string(),
            payload,
        })
    }

    /// Read every record, skipping blank lines. Lines that fail prefix
    /// parsing are logged and skipped rather than aborting the read.
    pub fn read_all(mut self) -> Result<Vec<RawRecord>> {
        let mut out = Vec::new();
        while let Some(line) = self.lines.next() {
            self.line_number += 1;
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match self.parse_line(&line) {
                Ok(rec) => out.push(rec),
                Err(e) => warn!(line = self.line_number, error = %e, "skipping unparseable line"),
            }
        }
        Ok(out)
    }
}
