//! Exceed-threshold report: one row per contributing
//! (FS link, scan point, channel) triple, gzip-compressed CSV.

use std::io::Write;

use flate2::write::GzEncoder;
use flate2::Compression;

use crate::analysis::ExceedRow;
use crate::Result;

const HEADER: &[&str] = &[
    "FSID",
    "Region",
    "Callsign",
    "Global Operating Class",
    "Channel CFI",
    "Channel Start (MHz)",
    "Channel Stop (MHz)",
    "Scan Lat (deg)",
    "Scan Lon (deg)",
    "Scan AGL (m)",
    "Distance (km)",
    "Spectral Overlap",
    "Path Loss (dB)",
    "Path Loss Model",
    "FSPL (dB)",
    "ITM Loss (dB)",
    "WINNER-II Loss (dB)",
    "Clutter Loss (dB)",
    "Building Penetration (dB)",
    "FS Rx Gain (dBi)",
    "Rx Gain Sub-Model",
    "EIRP Limit (dBm)",
];

/// Serialize exceed-threshold rows as `exc_thr.csv` inside a gzip stream.
pub struct ExceedThresholdWriter<W: Write> {
    writer: csv::Writer<GzEncoder<W>>,
}

impl<W: Write> ExceedThresholdWriter<W> {
    pub fn new(inner: W) -> Result<Self> {
        let encoder = GzEncoder::new(inner, Compression::default());
        let mut writer = csv::Writer::from_writer(encoder);
        writer.write_record(HEADER)?;
        Ok(Self { writer })
    }

    fn fmt(v: f64) -> String {
        if v.is_finite() {
            format!("{v:.6}")
        } else {
            String::new()
        }
    }

    fn fmt_opt(v: Option<f64>) -> String {
        v.map(Self::fmt).unwrap_or_default()
    }

    pub fn write_row(&mut self, row: &ExceedRow) -> Result<()> {
        self.writer.write_record(vec![
            row.fsid.to_string(),
            row.region.to_string(),
            row.callsign.clone(),
            row.global_operating_class.to_string(),
            row.channel_cfi.to_string(),
            Self::fmt(row.channel_start_mhz),
            Self::fmt(row.channel_stop_mhz),
            format!("{:.8}", row.scan_lat_deg),
            format!("{:.8}", row.scan_lon_deg),
            Self::fmt(row.scan_agl_m),
            Self::fmt(row.distance_km),
            Self::fmt(row.spectral_overlap),
            Self::fmt(row.path_loss_db),
            row.path_loss_model.clone(),
            Self::fmt(row.fspl_db),
            Self::fmt_opt(row.itm_loss_db),
            Self::fmt_opt(row.winner2_loss_db),
            Self::fmt(row.clutter_loss_db),
            Self::fmt(row.building_penetration_db),
            Self::fmt(row.fs_rx_gain_dbi),
            row.rx_gain_sub_model.unwrap_or("").to_string(),
            Self::fmt(row.eirp_limit_dbm),
        ])?;
        Ok(())
    }

    /// Finish the gzip stream and hand back the sink.
    pub fn finish(self) -> Result<W> {
        let encoder = self
            .writer
            .into_inner()
            .map_err(|e| crate::EngineError::Io(std::io::Error::other(e.to_string())))?;
        Ok(encoder.finish()?)
    }
}
