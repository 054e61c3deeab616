//! Radio Astronomy Service exclusion-zone table.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use afc_core::codes::Region;
use afc_core::link::{RasExclusion, RasRect, RasZone};

use crate::{IngestError, Result};

/// Read the RAS exclusion-zone CSV.
///
/// Columns follow the coordination-file layout: `RASID`, `Region`,
/// `Name`, `Location`, `Start Freq (MHz)`, `End Freq (MHz)`,
/// `Exclusion Zone` (`One Rectangle`, `Two Rectangles`, `Circle`,
/// `Horizon Distance`), rectangle corner columns, circle columns, and
/// `Antenna AGL height (m)`.
pub fn read_ras_zones<P: AsRef<Path>>(path: P) -> Result<Vec<RasZone>> {
    let mut text = String::new();
    File::open(&path)?.read_to_string(&mut text)?;
    read_ras_zones_str(&text)
}

pub fn read_ras_zones_str(text: &str) -> Result<Vec<RasZone>> {
    let cleaned: String = text
        .lines()
        .filter(|l| !l.trim_start().starts_with('#') && !l.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(cleaned.as_bytes());
    let headers = reader.headers()?.clone();
    let idx = |label: &str| -> Result<usize> {
        headers
            .iter()
            .position(|h| h == label)
            .ok_or_else(|| IngestError::Catalog {
                path: String::new(),
                message: format!("RAS file label line missing \"{label}\""),
            })
    };

    let id_idx = idx("RASID")?;
    let region_idx = idx("Region")?;
    let name_idx = idx("Name")?;
    let start_idx = idx("Start Freq (MHz)")?;
    let stop_idx = idx("End Freq (MHz)")?;
    let kind_idx = idx("Exclusion Zone")?;
    let r1 = [
        idx("Rectangle1 Lat 1")?,
        idx("Rectangle1 Lat 2")?,
        idx("Rectangle1 Lon 1")?,
        idx("Rectangle1 Lon 2")?,
    ];
    let r2 = [
        idx("Rectangle2 Lat 1")?,
        idx("Rectangle2 Lat 2")?,
        idx("Rectangle2 Lon 1")?,
        idx("Rectangle2 Lon 2")?,
    ];
    let radius_idx = idx("Circle Radius (km)")?;
    let clat_idx = idx("Circle center Lat")?;
    let clon_idx = idx("Circle center Lon")?;
    let agl_idx = idx("Antenna AGL height (m)")?;

    let mut zones = Vec::new();
    for record in reader.records() {
        let record = record?;
        let get_f64 = |i: usize| record.get(i).and_then(|s| s.parse::<f64>().ok());
        let rect = |cols: &[usize; 4]| -> Option<RasRect> {
            Some(RasRect {
                lat1_deg: get_f64(cols[0])?,
                lat2_deg: get_f64(cols[1])?,
                lon1_deg: get_f64(cols[2])?,
                lon2_deg: get_f64(cols[3])?,
            })
        };

        let kind = record.get(kind_idx).unwrap_or("");
        let agl = get_f64(agl_idx);
        let exclusion = match kind {
            "One Rectangle" => RasExclusion::Rectangles(rect(&r1).into_iter().collect()),
            "Two Rectangles" => {
                RasExclusion::Rectangles(rect(&r1).into_iter().chain(rect(&r2)).collect())
            }
            "Circle" => RasExclusion::Circle {
                center_lat_deg: get_f64(clat_idx).unwrap_or(0.0),
                center_lon_deg: get_f64(clon_idx).unwrap_or(0.0),
                radius_km: get_f64(radius_idx).unwrap_or(0.0),
            },
            // Horizon-distance zones become a circle with the smooth-earth
            // radio horizon of the zone's antenna: 4.12 sqrt(h) km.
            "Horizon Distance" => RasExclusion::Circle {
                center_lat_deg: get_f64(clat_idx).unwrap_or(0.0),
                center_lon_deg: get_f64(clon_idx).unwrap_or(0.0),
                radius_km: 4.12 * agl.unwrap_or(0.0).max(0.0).sqrt(),
            },
            other => {
                return Err(IngestError::Catalog {
                    path: String::new(),
                    message: format!("unknown RAS exclusion zone kind: {other}"),
                })
            }
        };

        zones.push(RasZone {
            ras_id: get_f64(id_idx).unwrap_or(0.0) as i64,
            region: record
                .get(region_idx)
                .unwrap_or("US")
                .parse()
                .unwrap_or(Region::US),
            name: record.get(name_idx).unwrap_or("").to_string(),
            start_freq_mhz: get_f64(start_idx).unwrap_or(0.0),
            stop_freq_mhz: get_f64(stop_idx).unwrap_or(0.0),
            exclusion,
            antenna_agl_m: agl,
        });
    }

    Ok(zones)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "RASID,Region,Name,Location,Start Freq (MHz),End Freq (MHz),Exclusion Zone,Rectangle1 Lat 1,Rectangle1 Lat 2,Rectangle1 Lon 1,Rectangle1 Lon 2,Rectangle2 Lat 1,Rectangle2 Lat 2,Rectangle2 Lon 1,Rectangle2 Lon 2,Circle Radius (km),Circle center Lat,Circle center Lon,Antenna AGL height (m)";

    #[test]
    fn test_rectangle_zone() {
        let text = format!(
            "{HEADER}\n1,US,Green Bank,WV,6650.0,6675.2,One Rectangle,37.5,39.5,-80.5,-78.5,,,,,,,,\n"
        );
        let zones = read_ras_zones_str(&text).unwrap();
        assert_eq!(zones.len(), 1);
        assert_eq!(zones[0].name, "Green Bank");
        match &zones[0].exclusion {
            RasExclusion::Rectangles(rects) => {
                assert_eq!(rects.len(), 1);
                assert!(rects[0].contains(38.4, -79.8));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_circle_and_horizon_zones() {
        let text = format!(
            "{HEADER}\n2,US,Arecibo-like,PR,6650.0,6675.2,Circle,,,,,,,,,10.0,18.34,-66.75,\n3,US,VLBA,NM,6650.0,6675.2,Horizon Distance,,,,,,,,,,34.3,-108.1,25.0\n"
        );
        let zones = read_ras_zones_str(&text).unwrap();
        assert_eq!(zones.len(), 2);
        match &zones[0].exclusion {
            RasExclusion::Circle { radius_km, .. } => assert_eq!(*radius_km, 10.0),
            other => panic!("unexpected {other:?}"),
        }
        match &zones[1].exclusion {
            RasExclusion::Circle { radius_km, .. } => {
                assert!((radius_km - 4.12 * 5.0).abs() < 1e-9)
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let text = format!("{HEADER}\n4,US,Bad,XX,6650.0,6675.2,Pentagon,,,,,,,,,,,,\n");
        assert!(read_ras_zones_str(&text).is_err());
    }
}
