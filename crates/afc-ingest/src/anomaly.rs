//! Anomalous-record sink.

use std::io::Write;
use std::sync::Mutex;

use afc_core::codes::Region;

use crate::Result;

/// One FS record excluded from the main database.
#[derive(Debug, Clone, PartialEq)]
pub struct AnomalousRecord {
    pub region: Region,
    pub callsign: String,
    pub record_type: String,
    pub reason: String,
}

/// Append-only CSV sink for anomalous records, guarded for use from a
/// single writer at a time.
pub struct AnomalySink<W: Write> {
    writer: Mutex<csv::Writer<W>>,
    count: Mutex<usize>,
}

impl<W: Write> AnomalySink<W> {
    pub fn new(inner: W) -> Result<Self> {
        let mut writer = csv::Writer::from_writer(inner);
        writer.write_record(["Region", "Callsign", "Record Type", "Reason"])?;
        Ok(Self {
            writer: Mutex::new(writer),
            count: Mutex::new(0),
        })
    }

    pub fn write(&self, record: &AnomalousRecord) -> Result<()> {
        let mut writer = self.writer.lock().expect("anomaly sink poisoned");
        writer.write_record([
            record.region.to_string().as_str(),
            record.callsign.as_str(),
            record.record_type.as_str(),
            record.reason.as_str(),
        ])?;
        *self.count.lock().expect("anomaly sink poisoned") += 1;
        Ok(())
    }

    pub fn count(&self) -> usize {
        *self.count.lock().expect("anomaly sink poisoned")
    }

    /// Flush and return the underlying writer.
    pub fn into_inner(self) -> Result<W> {
        let writer = self.writer.into_inner().expect("anomaly sink poisoned");
        writer
            .into_inner()
            .map_err(|e| crate::IngestError::Io(std::io::Error::other(e.to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sink_round_trip() {
        let sink = AnomalySink::new(Vec::new()).unwrap();
        sink.write(&AnomalousRecord {
            region: Region::US,
            callsign: "WQAB123".to_string(),
            record_type: "PA".to_string(),
            reason: "Invalid rx lat degree or long degree, ".to_string(),
        })
        .unwrap();
        assert_eq!(sink.count(), 1);

        let bytes = sink.into_inner().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("Region,Callsign,Record Type,Reason"));
        assert_eq!(
            lines.next(),
            Some("US,WQAB123,PA,\"Invalid rx lat degree or long degree, \"")
        );
    }

    #[test]
    fn test_csv_quoting_round_trip() {
        // Writing what a reader read back produces identical bytes.
        let sink = AnomalySink::new(Vec::new()).unwrap();
        sink.write(&AnomalousRecord {
            region: Region::CA,
            callsign: "CFX, \"odd\"".to_string(),
            record_type: "PP".to_string(),
            reason: "quoted, reason".to_string(),
        })
        .unwrap();
        let first = sink.into_inner().unwrap();

        let mut reader = csv::Reader::from_reader(first.as_slice());
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        let sink2 = AnomalySink::new(Vec::new()).unwrap();
        for row in &rows {
            sink2
                .write(&AnomalousRecord {
                    region: row[0].parse().unwrap(),
                    callsign: row[1].to_string(),
                    record_type: row[2].to_string(),
                    reason: row[3].to_string(),
                })
                .unwrap();
        }
        let second = sink2.into_inner().unwrap();
        assert_eq!(first, second);
    }
}
