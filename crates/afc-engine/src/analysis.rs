//! Interference aggregation and the per-channel EIRP solver.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use nalgebra::Vector3;
use rayon::prelude::*;
use tracing::{debug, warn};

use afc_core::band::spectral_overlap;
use afc_core::channel::Channel;
use afc_core::codes::{ClutterCategory, Region, ResponseCode};
use afc_core::link::{FsLink, PassiveRepeater, RasExclusion};
use afc_core::result::ScanPoint;

use afc_antenna::repeater::{back_to_back_discrimination, billboard_discrimination};
use afc_antenna::AntennaPattern;
use afc_geo::ecef::{angle_between_deg, geodetic_to_ecef};
use afc_geo::haversine_km;
use afc_prop::{
    ElevationProfileBuilder, FixedLosses, PathGeometry, PathLossComposer, ProfileCache,
    PropagationConfig,
};

use crate::channels::{expand_inquired_channels, expand_psd_bins, PsdBin};
use crate::config::{AntennaPatternKind, BuildingSource};
use crate::context::AnalysisContext;
use crate::request::SpectrumInquiry;
use crate::scan::enumerate_scan_points;
use crate::EngineError;

/// Availability of one analyzed channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChannelState {
    Available { max_eirp_dbm: f64 },
    Unavailable,
    /// Not evaluated before cancellation or timeout.
    Unknown,
}

/// Result for one channel.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelResult {
    pub channel: Channel,
    pub state: ChannelState,
}

/// Result for one PSD bin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PsdBinResult {
    pub start_freq_mhz: f64,
    pub stop_freq_mhz: f64,
    pub max_psd_dbm_mhz: f64,
}

/// One contributing triple for the exceed-threshold report.
#[derive(Debug, Clone, PartialEq)]
pub struct ExceedRow {
    pub fsid: i64,
    pub region: Region,
    pub callsign: String,
    pub global_operating_class: u8,
    pub channel_cfi: u8,
    pub channel_start_mhz: f64,
    pub channel_stop_mhz: f64,
    pub scan_lat_deg: f64,
    pub scan_lon_deg: f64,
    pub scan_agl_m: f64,
    pub distance_km: f64,
    pub spectral_overlap: f64,
    pub path_loss_db: f64,
    pub path_loss_model: String,
    pub fspl_db: f64,
    pub itm_loss_db: Option<f64>,
    pub winner2_loss_db: Option<f64>,
    pub clutter_loss_db: f64,
    pub building_penetration_db: f64,
    pub fs_rx_gain_dbi: f64,
    pub rx_gain_sub_model: Option<&'static str>,
    pub eirp_limit_dbm: f64,
}

/// Everything one analysis produced.
#[derive(Debug)]
pub struct AnalysisOutcome {
    pub code: ResponseCode,
    pub diagnostic: Option<String>,
    pub channels: Vec<ChannelResult>,
    pub psd_bins: Vec<PsdBinResult>,
    pub exceed_rows: Vec<ExceedRow>,
    /// Triples dropped to compute failures.
    pub failed_triples: usize,
}

impl AnalysisOutcome {
    fn failure(code: ResponseCode, diagnostic: impl Into<String>) -> Self {
        Self {
            code,
            diagnostic: Some(diagnostic.into()),
            channels: Vec::new(),
            psd_bins: Vec::new(),
            exceed_rows: Vec::new(),
            failed_triples: 0,
        }
    }
}

/// One frequency band the solver prices: a channel or a PSD bin.
#[derive(Debug, Clone, Copy)]
struct Band {
    start_mhz: f64,
    stop_mhz: f64,
}

impl Band {
    fn bandwidth(&self) -> f64 {
        self.stop_mhz - self.start_mhz
    }

    fn center(&self) -> f64 {
        0.5 * (self.start_mhz + self.stop_mhz)
    }
}

/// Ceiling for one band with its bookkeeping.
struct BandCeiling {
    eirp_dbm: f64,
    ok_triples: usize,
    failed_triples: usize,
    rows: Vec<ExceedRow>,
}

/// Run one spectrum inquiry against the context.
///
/// Cancellation is honoured between channels and returns no partial
/// results; exhausting the wall-clock budget marks the remaining channels
/// unknown.
pub fn analyze(ctx: &AnalysisContext, inquiry: &SpectrumInquiry, cancel: &AtomicBool) -> AnalysisOutcome {
    let started = Instant::now();
    let timeout = std::time::Duration::from_secs(ctx.config.analysis_timeout_sec);

    let channels = match expand_inquired_channels(&inquiry.inquired_channels) {
        Ok(c) => c,
        Err(e) => return AnalysisOutcome::failure(ResponseCode::InvalidValue, e.to_string()),
    };
    let psd_bins = match expand_psd_bins(&inquiry.inquired_frequency_range, ctx.config.min_bin_mhz)
    {
        Ok(b) => b,
        Err(e) => return AnalysisOutcome::failure(ResponseCode::InvalidValue, e.to_string()),
    };
    if channels.is_empty() && psd_bins.is_empty() {
        return AnalysisOutcome::failure(
            ResponseCode::MissingParam,
            "request inquires neither channels nor frequency ranges",
        );
    }

    let scan_points = match enumerate_scan_points(
        &inquiry.location,
        &inquiry.location.elevation,
        &ctx.terrain,
        ctx.config.ap_uncertainty.horizontal,
        ctx.config.ap_uncertainty.height,
        ctx.config.polygon_simplify_cells,
    ) {
        Ok(s) => s,
        Err(EngineError::InvalidRequest(m)) => {
            return AnalysisOutcome::failure(ResponseCode::InvalidValue, m)
        }
        Err(e) => return AnalysisOutcome::failure(ResponseCode::GeneralFailure, e.to_string()),
    };

    let prop_config = match build_prop_config(ctx) {
        Ok(c) => c,
        Err(e) => return AnalysisOutcome::failure(ResponseCode::GeneralFailure, e.to_string()),
    };

    let solver = Solver {
        ctx,
        prop_config,
        scan_points: &scan_points,
        rlan_center: inquiry.location.region.center(),
        rlan_indoor: inquiry.location.is_indoor(),
        profile_cache: ProfileCache::new(),
    };

    let mut out = AnalysisOutcome {
        code: ResponseCode::Success,
        diagnostic: None,
        channels: Vec::with_capacity(channels.len()),
        psd_bins: Vec::new(),
        exceed_rows: Vec::new(),
        failed_triples: 0,
    };

    let mut timed_out = false;
    for channel in &channels {
        if cancel.load(Ordering::Relaxed) {
            return AnalysisOutcome::failure(ResponseCode::GeneralFailure, "analysis cancelled");
        }
        if started.elapsed() >= timeout {
            timed_out = true;
        }
        if timed_out {
            out.channels.push(ChannelResult {
                channel: *channel,
                state: ChannelState::Unknown,
            });
            continue;
        }

        let band = Band {
            start_mhz: channel.start_freq_mhz,
            stop_mhz: channel.stop_freq_mhz,
        };

        let state = if solver.ras_blocked(&band) {
            ChannelState::Unavailable
        } else {
            let ceiling = solver.band_ceiling(&band);
            out.failed_triples += ceiling.failed_triples;
            for mut row in ceiling.rows {
                row.global_operating_class = channel.global_operating_class;
                row.channel_cfi = channel.channel_cfi;
                out.exceed_rows.push(row);
            }
            if ceiling.ok_triples == 0 && ceiling.failed_triples > 0 {
                warn!(
                    class = channel.global_operating_class,
                    cfi = channel.channel_cfi,
                    "no surviving contributions for channel"
                );
                ChannelState::Unavailable
            } else if ceiling.eirp_dbm < ctx.config.min_eirp_dbm {
                ChannelState::Unavailable
            } else {
                ChannelState::Available {
                    max_eirp_dbm: ceiling.eirp_dbm.min(ctx.config.max_eirp_dbm),
                }
            }
        };
        out.channels.push(ChannelResult {
            channel: *channel,
            state,
        });
    }

    for bin in &psd_bins {
        if cancel.load(Ordering::Relaxed) {
            return AnalysisOutcome::failure(ResponseCode::GeneralFailure, "analysis cancelled");
        }
        if timed_out || started.elapsed() >= timeout {
            timed_out = true;
            continue;
        }
        if let Some(result) = solver.psd_bin(bin) {
            out.psd_bins.push(result);
        }
    }

    if timed_out {
        out.code = ResponseCode::GeneralFailure;
        out.diagnostic = Some(format!(
            "analysis timed out after {} s",
            ctx.config.analysis_timeout_sec
        ));
    }

    debug!(
        channels = out.channels.len(),
        psd_bins = out.psd_bins.len(),
        exceed_rows = out.exceed_rows.len(),
        failed = out.failed_triples,
        "analysis complete"
    );
    out
}

fn build_prop_config(ctx: &AnalysisContext) -> crate::Result<PropagationConfig> {
    Ok(PropagationConfig {
        kind: ctx.config.propagation_model.kind,
        win2_confidence: ctx.config.propagation_model.win2_confidence,
        itm_confidence: ctx.config.propagation_model.itm_confidence,
        itm_reliability: ctx.config.propagation_model.itm_reliability,
        p2108_confidence: ctx.config.propagation_model.p2108_confidence,
        building_penetration: ctx.config.building_penetration_loss.to_model()?,
        clutter_at_fs: ctx.config.clutter_at_fs,
        itm: ctx.config.itm_parameters.to_parameters()?,
    })
}

/// R2-AIP-07 is defined over the UNII-5 and UNII-7 FS allocations only;
/// evaluation frequencies in the gaps clamp to the nearest edge.
fn r2_eval_freq_mhz(freq_mhz: f64) -> f64 {
    if freq_mhz < 5925.0 {
        5925.0
    } else if freq_mhz <= 6425.0 || (6525.0..=6875.0).contains(&freq_mhz) {
        freq_mhz
    } else if freq_mhz < 6525.0 {
        if freq_mhz - 6425.0 < 6525.0 - freq_mhz {
            6425.0
        } else {
            6525.0
        }
    } else {
        6875.0
    }
}

/// One chain node of the interference path, with resolved heights.
#[derive(Debug, Clone, Copy)]
struct ChainNode {
    lat_deg: f64,
    lon_deg: f64,
    agl_m: f64,
    amsl_m: f64,
    ecef: Vector3<f64>,
}

struct Solver<'a> {
    ctx: &'a AnalysisContext,
    prop_config: PropagationConfig,
    scan_points: &'a [ScanPoint],
    rlan_center: (f64, f64),
    rlan_indoor: bool,
    profile_cache: ProfileCache,
}

impl<'a> Solver<'a> {
    /// True when a RAS zone covers both the band and the RLAN centre.
    fn ras_blocked(&self, band: &Band) -> bool {
        let (lat, lon) = self.rlan_center;
        self.ctx.ras_zones.iter().any(|zone| {
            let freq_hit = spectral_overlap(
                band.start_mhz,
                band.stop_mhz,
                zone.start_freq_mhz,
                zone.stop_freq_mhz,
            ) > 0.0;
            if !freq_hit {
                return false;
            }
            match &zone.exclusion {
                RasExclusion::Rectangles(rects) => rects.iter().any(|r| r.contains(lat, lon)),
                RasExclusion::Circle {
                    center_lat_deg,
                    center_lon_deg,
                    radius_km,
                } => haversine_km(lat, lon, *center_lat_deg, *center_lon_deg) <= *radius_km,
            }
        })
    }

    /// Worst-case EIRP ceiling over every in-range FS link and scan point.
    fn band_ceiling(&self, band: &Band) -> BandCeiling {
        let contributions: Vec<BandCeiling> = self
            .ctx
            .links
            .par_iter()
            .filter_map(|link| self.link_ceiling(link, band))
            .collect();

        let mut ceiling = BandCeiling {
            eirp_dbm: self.ctx.config.max_eirp_dbm,
            ok_triples: 0,
            failed_triples: 0,
            rows: Vec::new(),
        };
        let had_links = !contributions.is_empty();
        for c in contributions {
            ceiling.eirp_dbm = ceiling.eirp_dbm.min(c.eirp_dbm);
            ceiling.ok_triples += c.ok_triples;
            ceiling.failed_triples += c.failed_triples;
            ceiling.rows.extend(c.rows);
        }
        if !had_links {
            // No FS protection constraint: full power, one synthetic ok
            // contribution so the channel is not marked failed.
            ceiling.ok_triples = 1;
        }
        ceiling
    }

    /// PSD for one bin: the bin's EIRP ceiling spread over its width.
    fn psd_bin(&self, bin: &PsdBin) -> Option<PsdBinResult> {
        let band = Band {
            start_mhz: bin.start_freq_mhz,
            stop_mhz: bin.stop_freq_mhz,
        };
        if self.ras_blocked(&band) {
            return None;
        }
        let ceiling = self.band_ceiling(&band);
        if ceiling.ok_triples == 0 && ceiling.failed_triples > 0 {
            return None;
        }
        let psd = ceiling.eirp_dbm.min(self.ctx.config.max_eirp_dbm)
            - 10.0 * band.bandwidth().log10();
        if psd < self.ctx.config.min_psd_dbm_mhz {
            return None;
        }
        Some(PsdBinResult {
            start_freq_mhz: bin.start_freq_mhz,
            stop_freq_mhz: bin.stop_freq_mhz,
            max_psd_dbm_mhz: psd,
        })
    }

    /// Chain node with terrain-resolved heights.
    fn resolve_node(&self, lat: f64, lon: f64, agl: f64) -> ChainNode {
        let ground = self.ctx.terrain.terrain_height(lat, lon).ground_height;
        let amsl = ground + agl;
        ChainNode {
            lat_deg: lat,
            lon_deg: lon,
            agl_m: agl,
            amsl_m: amsl,
            ecef: geodetic_to_ecef(lat, lon, amsl),
        }
    }

    /// The FS receive antenna pattern configured for this analysis.
    fn rx_pattern(&self, link: &FsLink) -> AntennaPattern {
        let ant = &link.rx_antenna;
        match self.ctx.config.antenna_pattern.kind {
            AntennaPatternKind::F1245 => AntennaPattern::F1245 {
                max_gain_dbi: ant.max_gain_dbi,
                d_lambda: ant.d_lambda,
            },
            AntennaPatternKind::F699 => AntennaPattern::F699 {
                max_gain_dbi: ant.max_gain_dbi,
                d_lambda: ant.d_lambda,
            },
            AntennaPatternKind::F1336 => AntennaPattern::F1336Omni {
                max_gain_dbi: ant.max_gain_dbi,
            },
            AntennaPatternKind::R2Aip07 => AntennaPattern::R2Aip07 {
                max_gain_dbi: ant.max_gain_dbi,
                d_lambda: ant.d_lambda,
                category: ant.category,
                model_blank: ant.model.is_empty(),
                diversity: false,
            },
        }
    }

    /// Pattern of the diversity receive antenna, when the record carries
    /// the complete diversity triple.
    fn diversity_pattern(&self, link: &FsLink) -> Option<AntennaPattern> {
        let div = link.rx_diversity.as_ref()?;
        Some(match self.ctx.config.antenna_pattern.kind {
            AntennaPatternKind::F1245 => AntennaPattern::F1245 {
                max_gain_dbi: div.max_gain_dbi,
                d_lambda: div.d_lambda,
            },
            AntennaPatternKind::F699 => AntennaPattern::F699 {
                max_gain_dbi: div.max_gain_dbi,
                d_lambda: div.d_lambda,
            },
            AntennaPatternKind::F1336 => AntennaPattern::F1336Omni {
                max_gain_dbi: div.max_gain_dbi,
            },
            AntennaPatternKind::R2Aip07 => AntennaPattern::R2Aip07 {
                max_gain_dbi: div.max_gain_dbi,
                d_lambda: div.d_lambda,
                category: link.rx_antenna.category,
                model_blank: link.rx_antenna.model.is_empty(),
                diversity: true,
            },
        })
    }

    /// Minimum EIRP over every scan point against one link, or None when
    /// the link is out of range or spectrally disjoint.
    fn link_ceiling(&self, link: &FsLink, band: &Band) -> Option<BandCeiling> {
        let rho = spectral_overlap(
            band.start_mhz,
            band.stop_mhz,
            link.start_use_freq_mhz,
            link.stop_use_freq_mhz,
        );
        if rho <= 0.0 {
            return None;
        }

        let in_range = link.node_chain().iter().any(|node| {
            haversine_km(
                self.rlan_center.0,
                self.rlan_center.1,
                node.latitude_deg,
                node.longitude_deg,
            ) <= self.ctx.config.max_link_distance_km
        });
        if !in_range {
            return None;
        }

        let fc = band.center();
        let include_building =
            self.ctx.config.propagation_model.building_source != BuildingSource::None;

        // FS-side chain nodes: TX, repeaters, RX, all terrain-resolved.
        let fs_tx = self.resolve_node(
            link.tx_location.latitude_deg,
            link.tx_location.longitude_deg,
            link.tx_location.height_above_terrain,
        );
        let prs: Vec<ChainNode> = link
            .passive_repeaters
            .iter()
            .map(|pr| {
                let loc = pr.location();
                self.resolve_node(
                    loc.latitude_deg,
                    loc.longitude_deg,
                    loc.height_above_terrain,
                )
            })
            .collect();
        let fs_rx = self.resolve_node(
            link.rx_location.latitude_deg,
            link.rx_location.longitude_deg,
            link.rx_location.height_above_terrain,
        );

        let rx_clutter = self.ctx.terrain.clutter(fs_rx.lat_deg, fs_rx.lon_deg);

        // Boresight of the FS receiver: toward the adjacent FS node.
        let rx_facing = prs.last().unwrap_or(&fs_tx);
        let rx_boresight = (rx_facing.ecef - fs_rx.ecef).normalize();

        let pattern = self.rx_pattern(link);
        let builder = ElevationProfileBuilder::new(&self.ctx.terrain);
        let fixed = FixedLosses {
            polarization_mismatch_db: if self.ctx.config.polarization_mismatch_loss.kind
                == "Fixed Value"
            {
                self.ctx.config.polarization_mismatch_loss.value
            } else {
                0.0
            },
            body_loss_indoor_db: self.ctx.config.body_loss.value_indoor,
            body_loss_outdoor_db: self.ctx.config.body_loss.value_outdoor,
        };
        let zero_fixed = FixedLosses {
            polarization_mismatch_db: 0.0,
            body_loss_indoor_db: 0.0,
            body_loss_outdoor_db: 0.0,
        };
        let first_composer = PathLossComposer::new(&self.prop_config, &*self.ctx.itm, fixed);
        let relay_composer = PathLossComposer::new(&self.prop_config, &*self.ctx.itm, zero_fixed);

        let mut ceiling = BandCeiling {
            eirp_dbm: f64::INFINITY,
            ok_triples: 0,
            failed_triples: 0,
            rows: Vec::new(),
        };

        for scan in self.scan_points {
            match self.triple_eirp(
                link,
                band,
                fc,
                rho,
                scan,
                &fs_tx,
                &prs,
                &fs_rx,
                rx_boresight,
                rx_clutter,
                &pattern,
                &builder,
                include_building,
                &first_composer,
                &relay_composer,
            ) {
                Ok((eirp, row)) => {
                    ceiling.ok_triples += 1;
                    ceiling.eirp_dbm = ceiling.eirp_dbm.min(eirp);
                    if let Some(row) = row {
                        ceiling.rows.push(row);
                    }
                }
                Err(reason) => {
                    ceiling.failed_triples += 1;
                    debug!(fsid = link.fsid, reason = %reason, "dropping scan triple");
                }
            }
        }
        Some(ceiling)
    }

    /// EIRP limit for one (scan point, link, band) triple.
    #[allow(clippy::too_many_arguments)]
    fn triple_eirp(
        &self,
        link: &FsLink,
        band: &Band,
        fc: f64,
        rho: f64,
        scan: &ScanPoint,
        fs_tx: &ChainNode,
        prs: &[ChainNode],
        fs_rx: &ChainNode,
        rx_boresight: Vector3<f64>,
        rx_clutter: ClutterCategory,
        pattern: &AntennaPattern,
        builder: &ElevationProfileBuilder<'_>,
        include_building: bool,
        first_composer: &PathLossComposer<'_>,
        relay_composer: &PathLossComposer<'_>,
    ) -> std::result::Result<(f64, Option<ExceedRow>), String> {
        let scan_node = ChainNode {
            lat_deg: scan.latitude_deg,
            lon_deg: scan.longitude_deg,
            agl_m: scan.height_agl,
            amsl_m: scan.height_amsl,
            ecef: geodetic_to_ecef(scan.latitude_deg, scan.longitude_deg, scan.height_amsl),
        };

        // Interference chain: RLAN -> PR_1 -> ... -> PR_n -> RX.
        let mut chain: Vec<&ChainNode> = Vec::with_capacity(prs.len() + 2);
        chain.push(&scan_node);
        chain.extend(prs.iter());
        chain.push(fs_rx);

        let mut total_loss_db = 0.0;
        let mut first_result = None;
        for (i, pair) in chain.windows(2).enumerate() {
            let (a, b) = (pair[0], pair[1]);
            let dist_km = haversine_km(a.lat_deg, a.lon_deg, b.lat_deg, b.lon_deg);
            if dist_km <= 0.0 {
                return Err("degenerate segment".to_string());
            }
            let numpts = ((dist_km * 1000.0 / self.prop_config.itm.min_spacing_m).ceil()
                as usize
                + 1)
            .clamp(
                self.ctx.config.min_profile_points.max(2),
                self.prop_config.itm.max_points,
            );
            let profile = self
                .profile_cache
                .get_or_build(
                    builder,
                    (a.lat_deg, a.lon_deg),
                    (b.lat_deg, b.lon_deg),
                    numpts,
                    include_building,
                )
                .map_err(|e| e.to_string())?;

            let elevation_deg = ((b.amsl_m - a.amsl_m) / (dist_km * 1000.0)).atan().to_degrees();
            let last_segment = i + 2 == chain.len();
            let geometry = PathGeometry {
                profile: &profile,
                tx_agl_m: a.agl_m,
                rx_agl_m: b.agl_m,
                dist_km,
                freq_mhz: fc,
                tx_clutter: if i == 0 {
                    scan.clutter
                } else {
                    self.ctx.terrain.clutter(a.lat_deg, a.lon_deg)
                },
                tx_indoor: i == 0 && self.rlan_indoor,
                elevation_angle_deg: elevation_deg,
                rx_clutter: if last_segment {
                    rx_clutter
                } else {
                    self.ctx.terrain.clutter(b.lat_deg, b.lon_deg)
                },
                fade_margin_db: if i == 0 { link.fade_margin_db } else { 0.0 },
            };
            let composer = if i == 0 { first_composer } else { relay_composer };
            let result = composer.path_loss(&geometry).map_err(|e| e.to_string())?;
            total_loss_db += result.path_loss_db;
            if i == 0 {
                first_result = Some((result, dist_km));
            }
        }
        let (first_result, first_dist_km) =
            first_result.ok_or_else(|| "empty chain".to_string())?;

        // Per-repeater discrimination at the off-boresight angle between
        // the nominal FS feed direction and the interference arrival.
        let mut pr_disc_db = 0.0;
        for (i, pr) in link.passive_repeaters.iter().enumerate() {
            let pr_node = &prs[i];
            let fs_prev = if i == 0 { fs_tx } else { &prs[i - 1] };
            let intf_prev: &ChainNode = if i == 0 { &scan_node } else { &prs[i - 1] };

            let nominal = (fs_prev.ecef - pr_node.ecef).normalize();
            let arrival = (intf_prev.ecef - pr_node.ecef).normalize();
            let angle = angle_between_deg(&nominal, &arrival);

            let disc = match pr {
                PassiveRepeater::BackToBack { antenna_a, .. } => back_to_back_discrimination(
                    angle,
                    r2_eval_freq_mhz(fc),
                    antenna_a.model.is_empty(),
                    antenna_a.category,
                    antenna_a.max_gain_dbi,
                    antenna_a.d_lambda,
                )
                .map_err(|e| e.to_string())?,
                PassiveRepeater::Billboard {
                    width_lambda,
                    height_lambda,
                    s_lambda,
                    theta_in_deg,
                    theta1_deg,
                    ..
                } => {
                    billboard_discrimination(
                        angle,
                        *width_lambda,
                        *height_lambda,
                        *theta_in_deg,
                        *s_lambda,
                        *theta1_deg,
                    )
                    .discrimination_db
                }
            };
            pr_disc_db += disc;
        }

        // FS receiver gain toward the interference arrival.
        let intf_last = if prs.is_empty() {
            &scan_node
        } else {
            &prs[prs.len() - 1]
        };
        let arrival = (intf_last.ecef - fs_rx.ecef).normalize();
        let off_boresight = angle_between_deg(&rx_boresight, &arrival);
        let arrival_dist_km =
            haversine_km(fs_rx.lat_deg, fs_rx.lon_deg, intf_last.lat_deg, intf_last.lon_deg);
        let elevation_deg = ((intf_last.amsl_m - fs_rx.amsl_m)
            / (arrival_dist_km.max(1.0e-4) * 1000.0))
            .atan()
            .to_degrees();
        let mut gain = pattern
            .gain_dbi(off_boresight, elevation_deg, r2_eval_freq_mhz(fc))
            .map_err(|e| e.to_string())?;
        // A diversity receive antenna protects at whichever coupling is
        // stronger.
        if let Some(div_pattern) = self.diversity_pattern(link) {
            let div_gain = div_pattern
                .gain_dbi(off_boresight, elevation_deg, r2_eval_freq_mhz(fc))
                .map_err(|e| e.to_string())?;
            if div_gain.gain_dbi > gain.gain_dbi {
                gain = div_gain;
            }
        }

        let total_path_loss = total_loss_db - pr_disc_db;
        if !total_path_loss.is_finite() {
            return Err("non-finite composed loss".to_string());
        }

        let noise_dbm = link.rx_noise_level_dbw + 30.0;
        let bandwidth_ratio_db = 10.0 * (rho * band.bandwidth() / link.bandwidth_mhz).log10();
        let eirp_limit = self.ctx.config.threshold + noise_dbm + total_path_loss
            - gain.gain_dbi
            + link.rx_antenna_feeder_loss_db
            - bandwidth_ratio_db;

        let row = if eirp_limit < self.ctx.config.max_eirp_dbm {
            Some(ExceedRow {
                fsid: link.fsid,
                region: link.region,
                callsign: link.callsign.clone(),
                global_operating_class: 0,
                channel_cfi: 0,
                channel_start_mhz: band.start_mhz,
                channel_stop_mhz: band.stop_mhz,
                scan_lat_deg: scan.latitude_deg,
                scan_lon_deg: scan.longitude_deg,
                scan_agl_m: scan.height_agl,
                distance_km: first_dist_km,
                spectral_overlap: rho,
                path_loss_db: total_path_loss,
                path_loss_model: first_result.model.clone(),
                fspl_db: first_result.free_space_loss_db,
                itm_loss_db: first_result.itm_loss_db,
                winner2_loss_db: first_result.winner2_loss_db,
                clutter_loss_db: first_result.clutter_loss_db,
                building_penetration_db: first_result.building_penetration_db,
                fs_rx_gain_dbi: gain.gain_dbi,
                rx_gain_sub_model: gain.sub_model,
                eirp_limit_dbm: eirp_limit,
            })
        } else {
            None
        };

        Ok((eirp_limit, row))
    }
}
