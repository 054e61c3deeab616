//! Raw record types of the combined FS database export.
//!
//! Field positions are fixed per record type. Parsing is positional and
//! forgiving: missing or malformed optional fields become `None`, and the
//! anomaly filter decides downstream whether a record is usable.

use chrono::NaiveDate;

/// Parse an optional string field, returning None for empty strings.
pub fn parse_opt_string(s: &str) -> Option<String> {
    let s = s.trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

/// Parse an optional f64 field.
pub fn parse_opt_f64(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        None
    } else {
        s.parse().ok()
    }
}

/// Parse an optional i32 field.
pub fn parse_opt_i32(s: &str) -> Option<i32> {
    let s = s.trim();
    if s.is_empty() {
        None
    } else {
        s.parse().ok()
    }
}

/// Parse an optional char field.
pub fn parse_opt_char(s: &str) -> Option<char> {
    s.trim().chars().next()
}

/// Parse a license date (MM/DD/YYYY, falling back to YYYY-MM-DD).
pub fn parse_record_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(s, "%m/%d/%Y")
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .ok()
}

/// Latitude or longitude in degrees/minutes/seconds with a direction
/// letter, as carried by ULS location records.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DmsAngle {
    pub degrees: Option<i32>,
    pub minutes: Option<i32>,
    pub seconds: Option<f64>,
    pub direction: Option<char>,
}

impl DmsAngle {
    pub fn from_fields(deg: &str, min: &str, sec: &str, dir: &str) -> Self {
        Self {
            degrees: parse_opt_i32(deg),
            minutes: parse_opt_i32(min),
            seconds: parse_opt_f64(sec),
            direction: parse_opt_char(dir),
        }
    }

    /// Signed decimal degrees; None when the degree field is absent.
    /// South and west directions negate.
    pub fn to_decimal(&self) -> Option<f64> {
        let deg = self.degrees?;
        let min = self.minutes.unwrap_or(0);
        let sec = self.seconds.unwrap_or(0.0);
        let mut v = deg as f64 + min as f64 / 60.0 + sec / 3600.0;
        if matches!(self.direction, Some('S') | Some('W')) {
            v = -v;
        }
        Some(v)
    }

    /// Direction letter is one of the two valid for its axis.
    pub fn valid_lat_direction(&self) -> bool {
        matches!(self.direction, Some('N') | Some('S'))
    }

    pub fn valid_lon_direction(&self) -> bool {
        matches!(self.direction, Some('E') | Some('W'))
    }
}

/// `US:HD` license header.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderRecord {
    pub callsign: Option<String>,
    pub license_status: Option<String>,
    pub radio_service: Option<String>,
    pub grant_date: Option<NaiveDate>,
    pub expiration_date: Option<NaiveDate>,
    pub mobile: Option<char>,
}

impl HeaderRecord {
    pub fn from_fields(fields: &[&str]) -> Self {
        Self {
            callsign: parse_opt_string(fields.get(1).unwrap_or(&"")),
            license_status: parse_opt_string(fields.get(2).unwrap_or(&"")),
            radio_service: parse_opt_string(fields.get(3).unwrap_or(&"")),
            grant_date: parse_record_date(fields.get(4).unwrap_or(&"")),
            expiration_date: parse_record_date(fields.get(5).unwrap_or(&"")),
            mobile: parse_opt_char(fields.get(6).unwrap_or(&"")),
        }
    }
}

/// `US:EN` licensee entity.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityRecord {
    pub callsign: Option<String>,
    pub entity_name: Option<String>,
    pub frn: Option<String>,
}

impl EntityRecord {
    pub fn from_fields(fields: &[&str]) -> Self {
        Self {
            callsign: parse_opt_string(fields.get(1).unwrap_or(&"")),
            entity_name: parse_opt_string(fields.get(2).unwrap_or(&"")),
            frn: parse_opt_string(fields.get(3).unwrap_or(&"")),
        }
    }
}

/// `US:LO` site location.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationRecord {
    pub callsign: Option<String>,
    pub location_number: Option<i32>,
    pub latitude: DmsAngle,
    pub longitude: DmsAngle,
    pub ground_elevation_m: Option<f64>,
}

impl LocationRecord {
    pub fn from_fields(fields: &[&str]) -> Self {
        Self {
            callsign: parse_opt_string(fields.get(1).unwrap_or(&"")),
            location_number: parse_opt_i32(fields.get(2).unwrap_or(&"")),
            latitude: DmsAngle::from_fields(
                fields.get(3).unwrap_or(&""),
                fields.get(4).unwrap_or(&""),
                fields.get(5).unwrap_or(&""),
                fields.get(6).unwrap_or(&""),
            ),
            longitude: DmsAngle::from_fields(
                fields.get(7).unwrap_or(&""),
                fields.get(8).unwrap_or(&""),
                fields.get(9).unwrap_or(&""),
                fields.get(10).unwrap_or(&""),
            ),
            ground_elevation_m: parse_opt_f64(fields.get(11).unwrap_or(&"")),
        }
    }
}

/// `US:AN` antenna installation.
#[derive(Debug, Clone, PartialEq)]
pub struct AntennaRecord {
    pub callsign: Option<String>,
    pub location_number: Option<i32>,
    pub antenna_number: Option<i32>,
    pub height_to_center_raat_m: Option<f64>,
    pub gain_dbi: Option<f64>,
    pub model: Option<String>,
    /// Diversity triple, present together or not at all.
    pub diversity_height_m: Option<f64>,
    pub diversity_gain_dbi: Option<f64>,
    pub diversity_diameter_m: Option<f64>,
    pub line_loss_db: Option<f64>,
}

impl AntennaRecord {
    pub fn from_fields(fields: &[&str]) -> Self {
        Self {
            callsign: parse_opt_string(fields.get(1).unwrap_or(&"")),
            location_number: parse_opt_i32(fields.get(2).unwrap_or(&"")),
            antenna_number: parse_opt_i32(fields.get(3).unwrap_or(&"")),
            height_to_center_raat_m: parse_opt_f64(fields.get(4).unwrap_or(&"")),
            gain_dbi: parse_opt_f64(fields.get(5).unwrap_or(&"")),
            model: parse_opt_string(fields.get(6).unwrap_or(&"")),
            diversity_height_m: parse_opt_f64(fields.get(7).unwrap_or(&"")),
            diversity_gain_dbi: parse_opt_f64(fields.get(8).unwrap_or(&"")),
            diversity_diameter_m: parse_opt_f64(fields.get(9).unwrap_or(&"")),
            line_loss_db: parse_opt_f64(fields.get(10).unwrap_or(&"")),
        }
    }
}

/// `US:PA` microwave path.
#[derive(Debug, Clone, PartialEq)]
pub struct PathRecord {
    pub callsign: Option<String>,
    pub path_number: Option<i32>,
    pub tx_location_number: Option<i32>,
    pub tx_antenna_number: Option<i32>,
    pub rx_location_number: Option<i32>,
    pub rx_antenna_number: Option<i32>,
    pub rx_callsign: Option<String>,
    pub passive_receiver: Option<char>,
}

impl PathRecord {
    pub fn from_fields(fields: &[&str]) -> Self {
        Self {
            callsign: parse_opt_string(fields.get(1).unwrap_or(&"")),
            path_number: parse_opt_i32(fields.get(2).unwrap_or(&"")),
            tx_location_number: parse_opt_i32(fields.get(3).unwrap_or(&"")),
            tx_antenna_number: parse_opt_i32(fields.get(4).unwrap_or(&"")),
            rx_location_number: parse_opt_i32(fields.get(5).unwrap_or(&"")),
            rx_antenna_number: parse_opt_i32(fields.get(6).unwrap_or(&"")),
            rx_callsign: parse_opt_string(fields.get(7).unwrap_or(&"")),
            passive_receiver: parse_opt_char(fields.get(8).unwrap_or(&"")),
        }
    }
}

/// `US:SG` path segment.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentRecord {
    pub callsign: Option<String>,
    pub path_number: Option<i32>,
    pub segment_number: Option<i32>,
    pub from_location_number: Option<i32>,
    pub to_location_number: Option<i32>,
}

impl SegmentRecord {
    pub fn from_fields(fields: &[&str]) -> Self {
        Self {
            callsign: parse_opt_string(fields.get(1).unwrap_or(&"")),
            path_number: parse_opt_i32(fields.get(2).unwrap_or(&"")),
            segment_number: parse_opt_i32(fields.get(3).unwrap_or(&"")),
            from_location_number: parse_opt_i32(fields.get(4).unwrap_or(&"")),
            to_location_number: parse_opt_i32(fields.get(5).unwrap_or(&"")),
        }
    }
}

/// `US:FR` frequency assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyRecord {
    pub callsign: Option<String>,
    pub location_number: Option<i32>,
    pub antenna_number: Option<i32>,
    pub path_number: Option<i32>,
    pub frequency_assigned_mhz: Option<f64>,
    /// Upper bound of an allocation wider than one channel.
    pub frequency_upper_band_mhz: Option<f64>,
    pub eirp_dbm: Option<f64>,
    pub tolerance_pct: Option<f64>,
    /// Radio (transmitter) model string, matched against the transmitter
    /// catalog.
    pub tx_radio_model: Option<String>,
}

impl FrequencyRecord {
    pub fn from_fields(fields: &[&str]) -> Self {
        Self {
            callsign: parse_opt_string(fields.get(1).unwrap_or(&"")),
            location_number: parse_opt_i32(fields.get(2).unwrap_or(&"")),
            antenna_number: parse_opt_i32(fields.get(3).unwrap_or(&"")),
            path_number: parse_opt_i32(fields.get(4).unwrap_or(&"")),
            frequency_assigned_mhz: parse_opt_f64(fields.get(5).unwrap_or(&"")),
            frequency_upper_band_mhz: parse_opt_f64(fields.get(6).unwrap_or(&"")),
            eirp_dbm: parse_opt_f64(fields.get(7).unwrap_or(&"")),
            tolerance_pct: parse_opt_f64(fields.get(8).unwrap_or(&"")),
            tx_radio_model: parse_opt_string(fields.get(9).unwrap_or(&"")),
        }
    }
}

/// `US:EM` emission.
#[derive(Debug, Clone, PartialEq)]
pub struct EmissionRecord {
    pub callsign: Option<String>,
    pub location_number: Option<i32>,
    pub antenna_number: Option<i32>,
    pub frequency_mhz: Option<f64>,
    pub designator: Option<String>,
}

impl EmissionRecord {
    pub fn from_fields(fields: &[&str]) -> Self {
        Self {
            callsign: parse_opt_string(fields.get(1).unwrap_or(&"")),
            location_number: parse_opt_i32(fields.get(2).unwrap_or(&"")),
            antenna_number: parse_opt_i32(fields.get(3).unwrap_or(&"")),
            frequency_mhz: parse_opt_f64(fields.get(4).unwrap_or(&"")),
            designator: parse_opt_string(fields.get(5).unwrap_or(&"")),
        }
    }
}

/// `CA:SD` station data: one complete link per line, decimal coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct StationDataRecord {
    pub authorization_number: Option<String>,
    pub callsign: Option<String>,
    pub license_status: Option<String>,
    pub radio_service: Option<String>,
    pub tx_latitude_deg: Option<f64>,
    pub tx_longitude_deg: Option<f64>,
    pub tx_ground_elevation_m: Option<f64>,
    pub tx_height_agl_m: Option<f64>,
    pub tx_gain_dbi: Option<f64>,
    pub tx_model: Option<String>,
    pub tx_eirp_dbm: Option<f64>,
    pub rx_latitude_deg: Option<f64>,
    pub rx_longitude_deg: Option<f64>,
    pub rx_ground_elevation_m: Option<f64>,
    pub rx_height_agl_m: Option<f64>,
    pub rx_gain_dbi: Option<f64>,
    pub rx_model: Option<String>,
    pub rx_line_loss_db: Option<f64>,
    pub center_freq_mhz: Option<f64>,
    pub bandwidth_mhz: Option<f64>,
}

impl StationDataRecord {
    pub fn from_fields(fields: &[&str]) -> Self {
        Self {
            authorization_number: parse_opt_string(fields.get(1).unwrap_or(&"")),
            callsign: parse_opt_string(fields.get(2).unwrap_or(&"")),
            license_status: parse_opt_string(fields.get(3).unwrap_or(&"")),
            radio_service: parse_opt_string(fields.get(4).unwrap_or(&"")),
            tx_latitude_deg: parse_opt_f64(fields.get(5).unwrap_or(&"")),
            tx_longitude_deg: parse_opt_f64(fields.get(6).unwrap_or(&"")),
            tx_ground_elevation_m: parse_opt_f64(fields.get(7).unwrap_or(&"")),
            tx_height_agl_m: parse_opt_f64(fields.get(8).unwrap_or(&"")),
            tx_gain_dbi: parse_opt_f64(fields.get(9).unwrap_or(&"")),
            tx_model: parse_opt_string(fields.get(10).unwrap_or(&"")),
            tx_eirp_dbm: parse_opt_f64(fields.get(11).unwrap_or(&"")),
            rx_latitude_deg: parse_opt_f64(fields.get(12).unwrap_or(&"")),
            rx_longitude_deg: parse_opt_f64(fields.get(13).unwrap_or(&"")),
            rx_ground_elevation_m: parse_opt_f64(fields.get(14).unwrap_or(&"")),
            rx_height_agl_m: parse_opt_f64(fields.get(15).unwrap_or(&"")),
            rx_gain_dbi: parse_opt_f64(fields.get(16).unwrap_or(&"")),
            rx_model: parse_opt_string(fields.get(17).unwrap_or(&"")),
            rx_line_loss_db: parse_opt_f64(fields.get(18).unwrap_or(&"")),
            center_freq_mhz: parse_opt_f64(fields.get(19).unwrap_or(&"")),
            bandwidth_mhz: parse_opt_f64(fields.get(20).unwrap_or(&"")),
        }
    }
}

/// `CA:TA` transmitter data for one authorization.
#[derive(Debug, Clone, PartialEq)]
pub struct TransmitterRecord {
    pub authorization_number: Option<String>,
    pub model: Option<String>,
    pub power_dbw: Option<f64>,
}

impl TransmitterRecord {
    pub fn from_fields(fields: &[&str]) -> Self {
        Self {
            authorization_number: parse_opt_string(fields.get(1).unwrap_or(&"")),
            model: parse_opt_string(fields.get(2).unwrap_or(&"")),
            power_dbw: parse_opt_f64(fields.get(3).unwrap_or(&"")),
        }
    }
}

/// `CA:PP` passive repeater half-record. Two records with the same
/// authorization number at the same position pair into one repeater.
#[derive(Debug, Clone, PartialEq)]
pub struct PassiveRepeaterRecord {
    pub authorization_number: Option<String>,
    pub latitude_deg: Option<f64>,
    pub longitude_deg: Option<f64>,
    pub ground_elevation_m: Option<f64>,
    pub height_agl_m: Option<f64>,
    /// 'A' back-to-back antenna face, 'R' billboard reflector.
    pub kind: Option<char>,
    pub gain_dbi: Option<f64>,
    pub model: Option<String>,
    pub azimuth_deg: Option<f64>,
    pub elevation_deg: Option<f64>,
    pub reflector_height_m: Option<f64>,
    pub reflector_width_m: Option<f64>,
}

impl PassiveRepeaterRecord {
    pub fn from_fields(fields: &[&str]) -> Self {
        Self {
            authorization_number: parse_opt_string(fields.get(1).unwrap_or(&"")),
            latitude_deg: parse_opt_f64(fields.get(2).unwrap_or(&"")),
            longitude_deg: parse_opt_f64(fields.get(3).unwrap_or(&"")),
            ground_elevation_m: parse_opt_f64(fields.get(4).unwrap_or(&"")),
            height_agl_m: parse_opt_f64(fields.get(5).unwrap_or(&"")),
            kind: parse_opt_char(fields.get(6).unwrap_or(&"")),
            gain_dbi: parse_opt_f64(fields.get(7).unwrap_or(&"")),
            model: parse_opt_string(fields.get(8).unwrap_or(&"")),
            azimuth_deg: parse_opt_f64(fields.get(9).unwrap_or(&"")),
            elevation_deg: parse_opt_f64(fields.get(10).unwrap_or(&"")),
            reflector_height_m: parse_opt_f64(fields.get(11).unwrap_or(&"")),
            reflector_width_m: parse_opt_f64(fields.get(12).unwrap_or(&"")),
        }
    }
}
