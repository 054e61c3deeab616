//! Link assembly: raw records to validated [`FsLink`] models.

use std::collections::BTreeMap;

use nalgebra::Vector3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

use afc_core::band::{SPEED_OF_LIGHT, UNII5, UNII7, UNII_BANDS};
use afc_core::codes::{Region, TxArchitecture};
use afc_core::link::{DiversityRx, FsAntenna, FsLink, PassiveRepeater};
use afc_core::location::Location;

use afc_geo::ecef::geodetic_to_ecef;

use crate::anomaly::AnomalousRecord;
use crate::catalog::{AntennaModelMap, TransmitterModelMap};
use crate::emission::emission_designator_to_bandwidth_mhz;
use crate::freq::FreqAssignment;
use crate::reader::{RawRecord, RecordPayload};
use crate::record::*;

/// Coincidence tolerance for repeater pairing and same-site checks,
/// degrees.
const COINCIDENT_TOL_DEG: f64 = 1.0e-5;

/// Assembly policy knobs.
#[derive(Debug, Clone)]
pub struct LinkAssemblerConfig {
    /// Drop mobile stations and the TP radio service.
    pub remove_mobile: bool,
    /// Seed for the sub-channel pick when an allocation is wider than the
    /// declared bandwidth.
    pub use_freq_seed: u64,
    /// Receiver noise density by band, dBW/MHz: (UNII-5, UNII-7, other).
    pub fs_noise_dbw_per_mhz: (f64, f64, f64),
    /// Receiver feeder loss by band, dB: (UNII-5, UNII-7, other).
    pub feeder_loss_db: (f64, f64, f64),
    /// Per-link fade margin, dB.
    pub fade_margin_db: f64,
}

impl Default for LinkAssemblerConfig {
    fn default() -> Self {
        Self {
            remove_mobile: true,
            use_freq_seed: 0,
            fs_noise_dbw_per_mhz: (-110.0, -109.5, -109.5),
            feeder_loss_db: (3.0, 3.0, 3.0),
            fade_margin_db: 0.0,
        }
    }
}

/// Output of one assembly pass.
#[derive(Debug, Default)]
pub struct AssembledDatabase {
    pub links: Vec<FsLink>,
    pub anomalies: Vec<AnomalousRecord>,
}

/// Grouped US records for one callsign.
#[derive(Debug, Default)]
struct UsLicense {
    header: Option<HeaderRecord>,
    locations: BTreeMap<i32, LocationRecord>,
    antennas: BTreeMap<(i32, i32), AntennaRecord>,
    paths: Vec<PathRecord>,
    segments: Vec<SegmentRecord>,
    frequencies: Vec<FrequencyRecord>,
    emissions: Vec<EmissionRecord>,
}

/// Builds [`FsLink`]s from raw records, filtering anomalies to the side
/// channel.
pub struct LinkAssembler<'a> {
    config: LinkAssemblerConfig,
    antenna_map: &'a AntennaModelMap,
    transmitter_map: &'a TransmitterModelMap,
    freq_assignment: &'a FreqAssignment,
    rng: StdRng,
    next_fsid: i64,
}

impl<'a> LinkAssembler<'a> {
    pub fn new(
        config: LinkAssemblerConfig,
        antenna_map: &'a AntennaModelMap,
        transmitter_map: &'a TransmitterModelMap,
        freq_assignment: &'a FreqAssignment,
    ) -> Self {
        let rng = StdRng::seed_from_u64(config.use_freq_seed);
        Self {
            config,
            antenna_map,
            transmitter_map,
            freq_assignment,
            rng,
            next_fsid: 1,
        }
    }

    /// Assemble every link from the record stream.
    pub fn assemble(mut self, records: &[RawRecord]) -> AssembledDatabase {
        let mut out = AssembledDatabase::default();

        let mut us: BTreeMap<String, UsLicense> = BTreeMap::new();
        let mut ca_stations: Vec<StationDataRecord> = Vec::new();
        let mut ca_repeaters: Vec<PassiveRepeaterRecord> = Vec::new();
        let mut ca_transmitters: BTreeMap<String, TransmitterRecord> = BTreeMap::new();

        for rec in records {
            match (&rec.region, &rec.payload) {
                (Region::US, RecordPayload::Header(r)) => {
                    if let Some(cs) = &r.callsign {
                        us.entry(cs.clone()).or_default().header = Some(r.clone());
                    }
                }
                (Region::US, RecordPayload::Location(r)) => {
                    if let (Some(cs), Some(n)) = (&r.callsign, r.location_number) {
                        us.entry(cs.clone()).or_default().locations.insert(n, r.clone());
                    }
                }
                (Region::US, RecordPayload::Antenna(r)) => {
                    if let (Some(cs), Some(l), Some(a)) =
                        (&r.callsign, r.location_number, r.antenna_number)
                    {
                        us.entry(cs.clone())
                            .or_default()
                            .antennas
                            .insert((l, a), r.clone());
                    }
                }
                (Region::US, RecordPayload::Path(r)) => {
                    if let Some(cs) = &r.callsign {
                        us.entry(cs.clone()).or_default().paths.push(r.clone());
                    }
                }
                (Region::US, RecordPayload::Segment(r)) => {
                    if let Some(cs) = &r.callsign {
                        us.entry(cs.clone()).or_default().segments.push(r.clone());
                    }
                }
                (Region::US, RecordPayload::Frequency(r)) => {
                    if let Some(cs) = &r.callsign {
                        us.entry(cs.clone()).or_default().frequencies.push(r.clone());
                    }
                }
                (Region::US, RecordPayload::Emission(r)) => {
                    if let Some(cs) = &r.callsign {
                        us.entry(cs.clone()).or_default().emissions.push(r.clone());
                    }
                }
                (Region::CA, RecordPayload::StationData(r)) => ca_stations.push(r.clone()),
                (Region::CA, RecordPayload::PassiveRepeater(r)) => ca_repeaters.push(r.clone()),
                (Region::CA, RecordPayload::Transmitter(r)) => {
                    if let Some(auth) = &r.authorization_number {
                        ca_transmitters.insert(auth.clone(), r.clone());
                    }
                }
                _ => {}
            }
        }

        for (callsign, license) in &us {
            self.assemble_us_license(callsign, license, &mut out);
        }

        let paired = self.pair_ca_repeaters(ca_repeaters, &mut out);
        for station in &ca_stations {
            self.assemble_ca_station(station, &paired, &ca_transmitters, &mut out);
        }

        debug!(
            links = out.links.len(),
            anomalies = out.anomalies.len(),
            "link assembly complete"
        );
        out
    }

    fn alloc_fsid(&mut self) -> i64 {
        let id = self.next_fsid;
        self.next_fsid += 1;
        id
    }

    /// Per-band receiver constants keyed by the link centre frequency.
    fn band_constants(&self, center_mhz: f64) -> (f64, f64) {
        let (n5, n7, no) = self.config.fs_noise_dbw_per_mhz;
        let (f5, f7, fo) = self.config.feeder_loss_db;
        if UNII5.contains(center_mhz) {
            (n5, f5)
        } else if UNII7.contains(center_mhz) {
            (n7, f7)
        } else {
            (no, fo)
        }
    }

    /// `D/lambda` from catalog diameter when known, otherwise inverted
    /// from the F.699 gain relation `D/lambda = 10^((G - 7.7) / 20)`.
    fn d_lambda(diameter_m: Option<f64>, gain_dbi: f64, center_mhz: f64) -> f64 {
        match diameter_m {
            Some(d) => d * center_mhz * 1.0e6 / SPEED_OF_LIGHT,
            None => 10f64.powf((gain_dbi - 7.7) / 20.0),
        }
    }

    fn match_antenna(
        &self,
        region: Region,
        raw_model: Option<&str>,
        gain_dbi: f64,
        center_mhz: f64,
    ) -> (FsAntenna, bool) {
        let raw = raw_model.unwrap_or("");
        let entry = match region {
            Region::US => self.antenna_map.find_us(raw),
            Region::CA => self.antenna_map.find_ca(raw),
        };
        match entry {
            Some(e) => {
                let gain = e.midband_gain_dbi.unwrap_or(gain_dbi);
                (
                    FsAntenna {
                        model: raw.to_string(),
                        matched_name: Some(e.name.clone()),
                        category: e.category,
                        max_gain_dbi: gain,
                        diameter_m: e.diameter_m,
                        d_lambda: Self::d_lambda(e.diameter_m, gain, center_mhz),
                    },
                    false,
                )
            }
            None => (
                FsAntenna::unmatched(raw, gain_dbi, Self::d_lambda(None, gain_dbi, center_mhz)),
                true,
            ),
        }
    }

    /// Resolve the use band from the allocation and declared bandwidth.
    ///
    /// Allocations wider than one channel pick a random sub-channel with
    /// the seeded generator so runs reproduce. Returns None when the
    /// allocation is narrower than the bandwidth.
    fn set_use_frequency(
        &mut self,
        alloc_start_mhz: f64,
        alloc_stop_mhz: f64,
        bandwidth_mhz: f64,
    ) -> Option<(f64, f64)> {
        let span = alloc_stop_mhz - alloc_start_mhz;
        if (span - bandwidth_mhz).abs() < 1.0e-3 {
            Some((alloc_start_mhz, alloc_stop_mhz))
        } else if span > bandwidth_mhz {
            let n = (span / bandwidth_mhz).floor() as u64;
            let k = self.rng.gen_range(0..n);
            let start = alloc_start_mhz + k as f64 * bandwidth_mhz;
            Some((start, start + bandwidth_mhz))
        } else {
            None
        }
    }

    fn overlaps_unii(start_mhz: f64, stop_mhz: f64) -> bool {
        UNII_BANDS.iter().any(|b| b.overlaps(start_mhz, stop_mhz))
    }

    fn push_anomaly(
        out: &mut AssembledDatabase,
        region: Region,
        callsign: &str,
        record_type: &str,
        reason: String,
    ) {
        out.anomalies.push(AnomalousRecord {
            region,
            callsign: callsign.to_string(),
            record_type: record_type.to_string(),
            reason,
        });
    }

    /// Validity checks shared by both regions; reasons accumulate in a
    /// fixed order so the anomalous file is diffable between runs.
    #[allow(clippy::too_many_arguments)]
    fn necessary_fields_reason(
        rx_lat: Option<f64>,
        rx_lon: Option<f64>,
        tx_lat: Option<f64>,
        tx_lon: Option<f64>,
        rx_dir_ok: bool,
        tx_dir_ok: bool,
        mobile: bool,
        radio_service: Option<&str>,
        remove_mobile: bool,
        pr_positions: &[(Option<f64>, Option<f64>)],
    ) -> String {
        let mut reason = String::new();

        let rx_invalid = rx_lat.is_none() || rx_lon.is_none();
        let tx_invalid = tx_lat.is_none() || tx_lon.is_none();
        if rx_invalid {
            reason.push_str("Invalid rx lat degree or long degree, ");
        }
        if tx_invalid {
            reason.push_str("Invalid tx lat degree or long degree, ");
        }
        if reason.is_empty() {
            let (rx_lat, rx_lon) = (rx_lat.unwrap(), rx_lon.unwrap());
            let (tx_lat, tx_lon) = (tx_lat.unwrap(), tx_lon.unwrap());
            if (tx_lat - rx_lat).abs() <= COINCIDENT_TOL_DEG
                && (tx_lon - rx_lon).abs() <= COINCIDENT_TOL_DEG
            {
                reason.push_str("RX and TX at same location, ");
            }
        }
        if !rx_dir_ok {
            reason.push_str("Invalid rx latitude or longitude direction, ");
        }
        if !tx_dir_ok {
            reason.push_str("Invalid tx latitude or longitude direction, ");
        }
        if remove_mobile && mobile {
            reason.push_str("Mobile is Y, ");
        }
        if remove_mobile && radio_service == Some("TP") {
            reason.push_str("Radio service value of TP, ");
        }
        for (lat, lon) in pr_positions {
            if lat.is_none() || lon.is_none() {
                reason.push_str("Invalid passive repeater lat degree or long degree, ");
            }
        }

        reason
    }

    fn assemble_us_license(
        &mut self,
        callsign: &str,
        license: &UsLicense,
        out: &mut AssembledDatabase,
    ) {
        let header = match &license.header {
            Some(h) => h.clone(),
            None => {
                Self::push_anomaly(
                    out,
                    Region::US,
                    callsign,
                    "HD",
                    "Missing license header, ".to_string(),
                );
                return;
            }
        };

        for path in &license.paths {
            self.assemble_us_path(callsign, &header, license, path, out);
        }
    }

    fn assemble_us_path(
        &mut self,
        callsign: &str,
        header: &HeaderRecord,
        license: &UsLicense,
        path: &PathRecord,
        out: &mut AssembledDatabase,
    ) {
        let tx_loc = path
            .tx_location_number
            .and_then(|n| license.locations.get(&n));
        let rx_loc = path
            .rx_location_number
            .and_then(|n| license.locations.get(&n));
        let (tx_loc, rx_loc) = match (tx_loc, rx_loc) {
            (Some(t), Some(r)) => (t, r),
            _ => {
                Self::push_anomaly(
                    out,
                    Region::US,
                    callsign,
                    "PA",
                    "Missing tx or rx location record, ".to_string(),
                );
                return;
            }
        };

        let tx_ant = path
            .tx_location_number
            .zip(path.tx_antenna_number)
            .and_then(|k| license.antennas.get(&(k.0, k.1)));
        let rx_ant = path
            .rx_location_number
            .zip(path.rx_antenna_number)
            .and_then(|k| license.antennas.get(&(k.0, k.1)));
        let (tx_ant, rx_ant) = match (tx_ant, rx_ant) {
            (Some(t), Some(r)) => (t, r),
            _ => {
                Self::push_anomaly(
                    out,
                    Region::US,
                    callsign,
                    "PA",
                    "Missing tx or rx antenna record, ".to_string(),
                );
                return;
            }
        };

        // Segment chain: TX -> (PR locations) -> RX, ordered by segment
        // number. A path without segments is the direct hop.
        let mut segments: Vec<&SegmentRecord> = license
            .segments
            .iter()
            .filter(|s| s.path_number == path.path_number)
            .collect();
        segments.sort_by_key(|s| s.segment_number.unwrap_or(0));

        let mut pr_loc_numbers: Vec<i32> = Vec::new();
        let mut discontinuous = false;
        if !segments.is_empty() {
            let mut expected_from = path.tx_location_number;
            for (i, seg) in segments.iter().enumerate() {
                if seg.from_location_number != expected_from {
                    discontinuous = true;
                }
                if i + 1 < segments.len() {
                    if let Some(to) = seg.to_location_number {
                        pr_loc_numbers.push(to);
                    }
                }
                expected_from = seg.to_location_number;
            }
            if expected_from != path.rx_location_number {
                discontinuous = true;
            }
        }

        let pr_locs: Vec<Option<&LocationRecord>> = pr_loc_numbers
            .iter()
            .map(|n| license.locations.get(n))
            .collect();
        let pr_positions: Vec<(Option<f64>, Option<f64>)> = pr_locs
            .iter()
            .map(|l| match l {
                Some(l) => (l.latitude.to_decimal(), l.longitude.to_decimal()),
                None => (None, None),
            })
            .collect();

        let mut reason = Self::necessary_fields_reason(
            rx_loc.latitude.to_decimal(),
            rx_loc.longitude.to_decimal(),
            tx_loc.latitude.to_decimal(),
            tx_loc.longitude.to_decimal(),
            rx_loc.latitude.valid_lat_direction() && rx_loc.longitude.valid_lon_direction(),
            tx_loc.latitude.valid_lat_direction() && tx_loc.longitude.valid_lon_direction(),
            header.mobile == Some('Y'),
            header.radio_service.as_deref(),
            self.config.remove_mobile,
            &pr_positions,
        );
        if discontinuous {
            reason.push_str("Segments discontinuous, ");
        }
        if !reason.is_empty() {
            Self::push_anomaly(out, Region::US, callsign, "PA", reason);
            return;
        }

        // Frequency and bandwidth resolution.
        let freq = license
            .frequencies
            .iter()
            .find(|f| f.path_number == path.path_number || f.path_number.is_none());
        let freq = match freq.and_then(|f| f.frequency_assigned_mhz.map(|a| (f, a))) {
            Some(pair) => pair,
            None => {
                Self::push_anomaly(
                    out,
                    Region::US,
                    callsign,
                    "FR",
                    "Missing frequency assignment, ".to_string(),
                );
                return;
            }
        };
        let (freq_record, assigned_mhz) = freq;

        let emission = license
            .emissions
            .iter()
            .find(|e| e.frequency_mhz.map(|f| (f - assigned_mhz).abs() < 0.5) == Some(true))
            .or_else(|| license.emissions.first());
        let designator = emission.and_then(|e| e.designator.clone());
        let bandwidth_mhz = designator
            .as_deref()
            .and_then(emission_designator_to_bandwidth_mhz)
            .or_else(|| self.freq_assignment.bandwidth_us(assigned_mhz));
        let bandwidth_mhz = match bandwidth_mhz {
            Some(b) if b > 0.0 => b,
            _ => {
                Self::push_anomaly(
                    out,
                    Region::US,
                    callsign,
                    "EM",
                    "Bandwidth unparseable and no fallback available, ".to_string(),
                );
                return;
            }
        };

        let (alloc_start, alloc_stop) = match freq_record.frequency_upper_band_mhz {
            Some(upper) => (assigned_mhz, upper),
            None => (
                assigned_mhz - bandwidth_mhz / 2.0,
                assigned_mhz + bandwidth_mhz / 2.0,
            ),
        };
        let (start_use, stop_use) =
            match self.set_use_frequency(alloc_start, alloc_stop, bandwidth_mhz) {
                Some(band) => band,
                None => {
                    Self::push_anomaly(
                        out,
                        Region::US,
                        callsign,
                        "FR",
                        "Allocation narrower than emission bandwidth, ".to_string(),
                    );
                    return;
                }
            };

        if !Self::overlaps_unii(start_use, stop_use) {
            Self::push_anomaly(
                out,
                Region::US,
                callsign,
                "FR",
                "Band does not overlap UNII-5/6/7/8, ".to_string(),
            );
            return;
        }

        let center_mhz = 0.5 * (start_use + stop_use);
        let (noise_psd, feeder_default) = self.band_constants(center_mhz);

        let (rx_antenna, rx_unmatched) = self.match_antenna(
            Region::US,
            rx_ant.model.as_deref(),
            rx_ant.gain_dbi.unwrap_or(0.0),
            center_mhz,
        );
        let (tx_antenna, tx_unmatched) = self.match_antenna(
            Region::US,
            tx_ant.model.as_deref(),
            tx_ant.gain_dbi.unwrap_or(0.0),
            center_mhz,
        );
        if rx_unmatched || tx_unmatched {
            Self::push_anomaly(
                out,
                Region::US,
                callsign,
                "AN",
                "Antenna model unmatched, ".to_string(),
            );
            // Non-fatal: the link proceeds with Unknown category.
        }

        let tx_architecture = freq_record
            .tx_radio_model
            .as_deref()
            .and_then(|m| self.transmitter_map.find(m))
            .map(|t| t.architecture)
            .unwrap_or(TxArchitecture::Unknown);

        let tx_location = Location::new(
            tx_loc.latitude.to_decimal().unwrap(),
            tx_loc.longitude.to_decimal().unwrap(),
            tx_ant.height_to_center_raat_m.unwrap_or(0.0),
        );
        let rx_location = Location::new(
            rx_loc.latitude.to_decimal().unwrap(),
            rx_loc.longitude.to_decimal().unwrap(),
            rx_ant.height_to_center_raat_m.unwrap_or(0.0),
        );

        // Node chain for repeater pointing geometry.
        let mut chain: Vec<(f64, f64, f64)> = Vec::new();
        chain.push((
            tx_location.latitude_deg,
            tx_location.longitude_deg,
            tx_location.height_above_terrain,
        ));
        for loc in pr_locs.iter().flatten() {
            chain.push((
                loc.latitude.to_decimal().unwrap_or(0.0),
                loc.longitude.to_decimal().unwrap_or(0.0),
                0.0,
            ));
        }
        chain.push((
            rx_location.latitude_deg,
            rx_location.longitude_deg,
            rx_location.height_above_terrain,
        ));

        let mut passive_repeaters = Vec::new();
        for (i, loc) in pr_locs.iter().flatten().enumerate() {
            let pr_ant = license
                .antennas
                .get(&(loc.location_number.unwrap_or(0), 1))
                .cloned()
                .unwrap_or_else(|| AntennaRecord::from_fields(&[]));
            let (antenna, _) = self.match_antenna(
                Region::US,
                pr_ant.model.as_deref(),
                pr_ant.gain_dbi.unwrap_or(0.0),
                center_mhz,
            );
            let location = Location::new(
                loc.latitude.to_decimal().unwrap(),
                loc.longitude.to_decimal().unwrap(),
                pr_ant.height_to_center_raat_m.unwrap_or(0.0),
            );
            let (pointing_a, pointing_b) = chain_pointings(&chain, i + 1);
            passive_repeaters.push(PassiveRepeater::BackToBack {
                location,
                antenna_a: antenna.clone(),
                antenna_b: antenna,
                pointing_a,
                pointing_b,
            });
        }

        let rx_diversity = match (
            rx_ant.diversity_height_m,
            rx_ant.diversity_gain_dbi,
            rx_ant.diversity_diameter_m,
        ) {
            (Some(h), Some(g), Some(d)) => Some(DiversityRx {
                height_above_terrain: h,
                max_gain_dbi: g,
                d_lambda: Self::d_lambda(Some(d), g, center_mhz),
            }),
            _ => None,
        };

        out.links.push(FsLink {
            fsid: self.alloc_fsid(),
            region: Region::US,
            callsign: callsign.to_string(),
            radio_service: header.radio_service.clone().unwrap_or_default(),
            license_status: header.license_status.clone().unwrap_or_default(),
            grant_date: header.grant_date,
            expiration_date: header.expiration_date,
            start_use_freq_mhz: start_use,
            stop_use_freq_mhz: stop_use,
            bandwidth_mhz,
            emission_designator: designator,
            rx_location,
            rx_antenna,
            rx_antenna_feeder_loss_db: rx_ant.line_loss_db.unwrap_or(feeder_default),
            rx_noise_level_dbw: noise_psd + 10.0 * bandwidth_mhz.log10(),
            rx_diversity,
            tx_location,
            tx_antenna,
            tx_eirp_dbm: freq_record.eirp_dbm.unwrap_or(0.0),
            tx_architecture,
            passive_repeaters,
            fade_margin_db: self.config.fade_margin_db,
            antenna_model_unmatched: rx_unmatched || tx_unmatched,
        });
    }

    /// Pair CA PP records: same authorization number and coincident
    /// position within 1e-5 degrees. Unpaired records warn and drop.
    fn pair_ca_repeaters(
        &mut self,
        records: Vec<PassiveRepeaterRecord>,
        out: &mut AssembledDatabase,
    ) -> BTreeMap<String, Vec<(PassiveRepeaterRecord, PassiveRepeaterRecord)>> {
        let mut by_auth: BTreeMap<String, Vec<PassiveRepeaterRecord>> = BTreeMap::new();
        for rec in records {
            let auth = match &rec.authorization_number {
                Some(a) => a.clone(),
                None => {
                    Self::push_anomaly(
                        out,
                        Region::CA,
                        "",
                        "PP",
                        "Passive repeater missing authorization number, ".to_string(),
                    );
                    continue;
                }
            };
            by_auth.entry(auth).or_default().push(rec);
        }

        let mut paired = BTreeMap::new();
        for (auth, mut recs) in by_auth {
            let mut pairs = Vec::new();
            while let Some(first) = recs.pop() {
                let coincident = recs.iter().position(|r| {
                    match (
                        first.latitude_deg,
                        first.longitude_deg,
                        r.latitude_deg,
                        r.longitude_deg,
                    ) {
                        (Some(la), Some(lo), Some(lb), Some(lob)) => {
                            (la - lb).abs() <= COINCIDENT_TOL_DEG
                                && (lo - lob).abs() <= COINCIDENT_TOL_DEG
                        }
                        _ => false,
                    }
                });
                match coincident {
                    Some(i) => {
                        let second = recs.remove(i);
                        pairs.push((second, first));
                    }
                    None => {
                        warn!(auth = %auth, "unmatched CA passive repeater record, dropping");
                        Self::push_anomaly(
                            out,
                            Region::CA,
                            &auth,
                            "PP",
                            "Passive repeater unmatched, ".to_string(),
                        );
                    }
                }
            }
            if !pairs.is_empty() {
                paired.insert(auth, pairs);
            }
        }
        paired
    }

    fn assemble_ca_station(
        &mut self,
        station: &StationDataRecord,
        paired_prs: &BTreeMap<String, Vec<(PassiveRepeaterRecord, PassiveRepeaterRecord)>>,
        transmitters: &BTreeMap<String, TransmitterRecord>,
        out: &mut AssembledDatabase,
    ) {
        let callsign = station.callsign.clone().unwrap_or_default();
        let auth = station.authorization_number.clone().unwrap_or_default();

        let reason = Self::necessary_fields_reason(
            station.rx_latitude_deg,
            station.rx_longitude_deg,
            station.tx_latitude_deg,
            station.tx_longitude_deg,
            true,
            true,
            false,
            station.radio_service.as_deref(),
            self.config.remove_mobile,
            &[],
        );
        if !reason.is_empty() {
            Self::push_anomaly(out, Region::CA, &callsign, "SD", reason);
            return;
        }

        let (center_mhz, bandwidth_mhz) = match (station.center_freq_mhz, station.bandwidth_mhz) {
            (Some(c), Some(b)) if b > 0.0 => (c, b),
            _ => {
                Self::push_anomaly(
                    out,
                    Region::CA,
                    &callsign,
                    "SD",
                    "Bandwidth unparseable and no fallback available, ".to_string(),
                );
                return;
            }
        };
        let (start_use, stop_use) = (center_mhz - bandwidth_mhz / 2.0, center_mhz + bandwidth_mhz / 2.0);
        if !Self::overlaps_unii(start_use, stop_use) {
            Self::push_anomaly(
                out,
                Region::CA,
                &callsign,
                "SD",
                "Band does not overlap UNII-5/6/7/8, ".to_string(),
            );
            return;
        }

        let (noise_psd, feeder_default) = self.band_constants(center_mhz);

        let (rx_antenna, rx_unmatched) = self.match_antenna(
            Region::CA,
            station.rx_model.as_deref(),
            station.rx_gain_dbi.unwrap_or(0.0),
            center_mhz,
        );
        let (tx_antenna, tx_unmatched) = self.match_antenna(
            Region::CA,
            station.tx_model.as_deref(),
            station.tx_gain_dbi.unwrap_or(0.0),
            center_mhz,
        );
        if rx_unmatched || tx_unmatched {
            Self::push_anomaly(
                out,
                Region::CA,
                &callsign,
                "SD",
                "Antenna model unmatched, ".to_string(),
            );
        }

        let tx_location = Location::new(
            station.tx_latitude_deg.unwrap(),
            station.tx_longitude_deg.unwrap(),
            station.tx_height_agl_m.unwrap_or(0.0),
        );
        let rx_location = Location::new(
            station.rx_latitude_deg.unwrap(),
            station.rx_longitude_deg.unwrap(),
            station.rx_height_agl_m.unwrap_or(0.0),
        );

        // Attach repeaters for this authorization, ordered by distance
        // from the transmitter so the chain runs TX -> ... -> RX.
        let mut passive_repeaters = Vec::new();
        if let Some(pairs) = paired_prs.get(&auth) {
            let mut ordered: Vec<&(PassiveRepeaterRecord, PassiveRepeaterRecord)> =
                pairs.iter().collect();
            ordered.sort_by(|a, b| {
                let da = afc_geo::haversine_km(
                    tx_location.latitude_deg,
                    tx_location.longitude_deg,
                    a.0.latitude_deg.unwrap_or(0.0),
                    a.0.longitude_deg.unwrap_or(0.0),
                );
                let db = afc_geo::haversine_km(
                    tx_location.latitude_deg,
                    tx_location.longitude_deg,
                    b.0.latitude_deg.unwrap_or(0.0),
                    b.0.longitude_deg.unwrap_or(0.0),
                );
                da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
            });

            let mut chain: Vec<(f64, f64, f64)> = Vec::new();
            chain.push((
                tx_location.latitude_deg,
                tx_location.longitude_deg,
                tx_location.height_above_terrain,
            ));
            for (a, _) in ordered.iter() {
                chain.push((
                    a.latitude_deg.unwrap_or(0.0),
                    a.longitude_deg.unwrap_or(0.0),
                    a.height_agl_m.unwrap_or(0.0),
                ));
            }
            chain.push((
                rx_location.latitude_deg,
                rx_location.longitude_deg,
                rx_location.height_above_terrain,
            ));

            for (i, (a, b)) in ordered.iter().enumerate() {
                passive_repeaters.push(self.build_ca_repeater(a, b, &chain, i + 1, center_mhz));
            }
        }

        out.links.push(FsLink {
            fsid: self.alloc_fsid(),
            region: Region::CA,
            callsign: callsign.clone(),
            radio_service: station.radio_service.clone().unwrap_or_default(),
            license_status: station.license_status.clone().unwrap_or_default(),
            grant_date: None,
            expiration_date: None,
            start_use_freq_mhz: start_use,
            stop_use_freq_mhz: stop_use,
            bandwidth_mhz,
            emission_designator: None,
            rx_location,
            rx_antenna,
            rx_antenna_feeder_loss_db: station.rx_line_loss_db.unwrap_or(feeder_default),
            rx_noise_level_dbw: noise_psd + 10.0 * bandwidth_mhz.log10(),
            rx_diversity: None,
            tx_location,
            tx_antenna,
            tx_eirp_dbm: station.tx_eirp_dbm.unwrap_or(0.0),
            tx_architecture: transmitters
                .get(&auth)
                .and_then(|t| self.transmitter_map.find(t.model.as_deref().unwrap_or("")))
                .map(|t| t.architecture)
                .unwrap_or(TxArchitecture::Unknown),
            passive_repeaters,
            fade_margin_db: self.config.fade_margin_db,
            antenna_model_unmatched: rx_unmatched || tx_unmatched,
        });
    }

    /// Build one CA repeater from a matched record pair. A reflector
    /// record on either side makes a billboard; otherwise back-to-back.
    fn build_ca_repeater(
        &mut self,
        a: &PassiveRepeaterRecord,
        b: &PassiveRepeaterRecord,
        chain: &[(f64, f64, f64)],
        chain_index: usize,
        center_mhz: f64,
    ) -> PassiveRepeater {
        let location = Location::new(
            a.latitude_deg.unwrap_or(0.0),
            a.longitude_deg.unwrap_or(0.0),
            a.height_agl_m.unwrap_or(0.0),
        );

        let reflector = [a, b]
            .into_iter()
            .find(|r| r.kind == Some('R') && r.reflector_width_m.is_some());

        if let Some(refl) = reflector {
            let lambda_m = SPEED_OF_LIGHT / (center_mhz * 1.0e6);
            let width_lambda = refl.reflector_width_m.unwrap_or(0.0) / lambda_m;
            let height_lambda = refl.reflector_height_m.unwrap_or(0.0) / lambda_m;

            let (theta_in_deg, normal) = reflector_geometry(chain, chain_index);
            let s_lambda = width_lambda * theta_in_deg.to_radians().cos();
            let theta1_deg = if s_lambda > 0.5 {
                (1.0 / (2.0 * s_lambda)).asin().to_degrees()
            } else {
                90.0
            };

            PassiveRepeater::Billboard {
                location,
                width_lambda,
                height_lambda,
                s_lambda,
                theta_in_deg,
                theta1_deg,
                normal,
            }
        } else {
            let (antenna_a, _) = self.match_antenna(
                Region::CA,
                a.model.as_deref(),
                a.gain_dbi.unwrap_or(0.0),
                center_mhz,
            );
            let (antenna_b, _) = self.match_antenna(
                Region::CA,
                b.model.as_deref(),
                b.gain_dbi.unwrap_or(0.0),
                center_mhz,
            );
            let (pointing_a, pointing_b) = chain_pointings(chain, chain_index);
            PassiveRepeater::BackToBack {
                location,
                antenna_a,
                antenna_b,
                pointing_a,
                pointing_b,
            }
        }
    }
}

/// ECEF position of a chain node.
fn chain_ecef(node: (f64, f64, f64)) -> Vector3<f64> {
    geodetic_to_ecef(node.0, node.1, node.2)
}

/// Pointing vectors of chain node `i`: toward the previous node and
/// toward the next.
fn chain_pointings(chain: &[(f64, f64, f64)], i: usize) -> (Vector3<f64>, Vector3<f64>) {
    let here = chain_ecef(chain[i]);
    let prev = chain_ecef(chain[i - 1]);
    let next = chain_ecef(chain[i + 1]);
    ((prev - here).normalize(), (next - here).normalize())
}

/// Incidence angle and plane normal of a reflector at chain node `i`.
///
/// The incidence angle is half the supplement of the turn angle: a path
/// that reverses on itself hits the reflector at normal incidence.
fn reflector_geometry(chain: &[(f64, f64, f64)], i: usize) -> (f64, Vector3<f64>) {
    let here = chain_ecef(chain[i]);
    let prev = chain_ecef(chain[i - 1]);
    let next = chain_ecef(chain[i + 1]);

    let d_in = (here - prev).normalize();
    let d_out = (next - here).normalize();

    let turn = d_in.dot(&d_out).clamp(-1.0, 1.0).acos();
    let theta_in = (std::f64::consts::PI - turn) / 2.0;

    // The normal bisects the reversed incoming ray and the outgoing ray.
    let bisector = (-d_in + d_out).normalize();

    (theta_in.to_degrees(), bisector)
}
