//! End-to-end analyses over a synthetic flat world with one FS link.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use afc_core::codes::{HeightSource, Region, ResponseCode, TxArchitecture};
use afc_core::link::{FsAntenna, FsLink, RasExclusion, RasZone};
use afc_core::location::Location;
use afc_engine::analysis::ChannelState;
use afc_engine::request::{
    DeviceDescriptor, Elevation, FrequencyRange, HeightType, InquiredChannels, Point,
    RequestLocation, RlanRegion, SpectrumInquiry,
};
use afc_engine::{analyze, build_response, AfcConfig, AnalysisContext};
use afc_prop::KnifeEdgeItm;
use afc_terrain::{GeoBounds, InMemoryRaster, TerrainResolver};

const RLAN_LAT: f64 = 40.75924;
const RLAN_LON: f64 = -73.97434;

fn flat_terrain() -> Arc<TerrainResolver> {
    let bounds = GeoBounds {
        min_lat: 40.0,
        max_lat: 41.5,
        min_lon: -74.5,
        max_lon: -73.0,
    };
    Arc::new(
        TerrainResolver::builder()
            .dem(
                HeightSource::ThreeDep,
                Arc::new(InMemoryRaster::flat(bounds, 16, 16, 10.0)),
            )
            .fallback_height(0.0)
            .build(),
    )
}

fn antenna() -> FsAntenna {
    FsAntenna {
        model: "HP8-59W".to_string(),
        matched_name: Some("HP8-59W".to_string()),
        category: afc_core::codes::AntennaCategory::B1,
        max_gain_dbi: 38.0,
        diameter_m: Some(2.4),
        d_lambda: 48.0,
    }
}

/// One UNII-5 link; the receiver boresight runs from rx toward tx.
fn fs_link(rx: (f64, f64), tx: (f64, f64)) -> FsLink {
    FsLink {
        fsid: 1,
        region: Region::US,
        callsign: "WQAB123".to_string(),
        radio_service: "CF".to_string(),
        license_status: "A".to_string(),
        grant_date: None,
        expiration_date: None,
        start_use_freq_mhz: 5960.0,
        stop_use_freq_mhz: 5990.0,
        bandwidth_mhz: 30.0,
        emission_designator: Some("30M0D7W".to_string()),
        rx_location: Location::new(rx.0, rx.1, 30.0),
        rx_antenna: antenna(),
        rx_antenna_feeder_loss_db: 3.0,
        rx_noise_level_dbw: -110.0 + 10.0 * 30f64.log10(),
        rx_diversity: None,
        tx_location: Location::new(tx.0, tx.1, 40.0),
        tx_antenna: antenna(),
        tx_eirp_dbm: 55.0,
        tx_architecture: TxArchitecture::Unknown,
        passive_repeaters: vec![],
        fade_margin_db: 0.0,
        antenna_model_unmatched: false,
    }
}

fn context(threshold: f64, links: Vec<FsLink>, ras: Vec<RasZone>) -> AnalysisContext {
    let config = AfcConfig {
        threshold,
        ..AfcConfig::default()
    };
    AnalysisContext::new(config, flat_terrain(), Arc::new(KnifeEdgeItm), links, ras)
}

fn inquiry(channels: Vec<InquiredChannels>, ranges: Vec<FrequencyRange>) -> SpectrumInquiry {
    SpectrumInquiry {
        request_id: "0".to_string(),
        device_descriptor: DeviceDescriptor {
            serial_number: "sn-0001".to_string(),
            certification_id: vec!["FCCID-AFC01".to_string()],
            ruleset_ids: vec!["US_47_CFR_PART_15_SUBPART_E".to_string()],
        },
        location: RequestLocation {
            region: RlanRegion::Ellipse {
                center: Point {
                    latitude: RLAN_LAT,
                    longitude: RLAN_LON,
                },
                major_axis_m: 20.0,
                minor_axis_m: 10.0,
                orientation_deg: 45.0,
            },
            elevation: Elevation {
                height: 20.0,
                height_type: HeightType::Agl,
                vertical_uncertainty_m: 2.0,
            },
            indoor_deployment: 0,
        },
        inquired_frequency_range: ranges,
        inquired_channels: channels,
        min_desired_power_dbm: Some(24.0),
    }
}

fn cfi_channels() -> Vec<InquiredChannels> {
    // cfi 5 (5965-5985) overlaps the link; cfi 181 (6845-6865) does not.
    vec![InquiredChannels {
        global_operating_class: 131,
        channel_cfi: Some(vec![5, 181]),
    }]
}

#[test]
fn test_far_link_leaves_full_power() {
    // FS receiver ~60 km away, pointing further away.
    let ctx = context(
        -6.0,
        vec![fs_link((41.3, -73.95), (41.4, -73.90))],
        vec![],
    );
    let outcome = analyze(&ctx, &inquiry(cfi_channels(), vec![]), &AtomicBool::new(false));
    assert_eq!(outcome.code, ResponseCode::Success);
    assert_eq!(outcome.channels.len(), 2);
    for c in &outcome.channels {
        match c.state {
            ChannelState::Available { max_eirp_dbm } => {
                assert!(max_eirp_dbm <= ctx.config.max_eirp_dbm + 1e-9)
            }
            other => panic!("expected availability, got {other:?}"),
        }
    }
}

#[test]
fn test_near_boresight_link_blocks_overlapping_channel() {
    // Receiver ~1 km north of the RLAN, transmitter placed so the
    // boresight sweeps straight across the RLAN.
    let ctx = context(
        -6.0,
        vec![fs_link((40.768, -73.974), (40.70, -73.974))],
        vec![],
    );
    let outcome = analyze(&ctx, &inquiry(cfi_channels(), vec![]), &AtomicBool::new(false));
    assert_eq!(outcome.code, ResponseCode::Success);

    let overlapping = &outcome.channels[0];
    assert_eq!(overlapping.channel.channel_cfi, 5);
    assert_eq!(overlapping.state, ChannelState::Unavailable);

    // The spectrally disjoint channel is untouched.
    let disjoint = &outcome.channels[1];
    assert_eq!(disjoint.channel.channel_cfi, 181);
    assert!(matches!(disjoint.state, ChannelState::Available { .. }));

    assert!(!outcome.exceed_rows.is_empty());
    let row = &outcome.exceed_rows[0];
    assert_eq!(row.fsid, 1);
    assert_eq!(row.channel_cfi, 5);
    assert!(row.spectral_overlap > 0.0);
}

#[test]
fn test_eirp_monotone_in_threshold() {
    // The boresight-on link from the blocking test, priced at three
    // thresholds: unavailable, constrained, clamped at max EIRP.
    let link = || vec![fs_link((40.768, -73.974), (40.70, -73.974))];
    let req = inquiry(cfi_channels(), vec![]);

    let eirp = |state: &ChannelState| match state {
        ChannelState::Available { max_eirp_dbm } => *max_eirp_dbm,
        ChannelState::Unavailable => f64::NEG_INFINITY,
        ChannelState::Unknown => panic!("unexpected unknown channel"),
    };

    let mut previous = f64::NEG_INFINITY;
    let mut states = Vec::new();
    for threshold in [-6.0, 12.0, 40.0] {
        let ctx = context(threshold, link(), vec![]);
        let outcome = analyze(&ctx, &req, &AtomicBool::new(false));
        let overlapping = eirp(&outcome.channels[0].state);
        assert!(
            overlapping >= previous - 1e-9,
            "higher threshold must not lower the ceiling"
        );
        previous = overlapping;
        states.push(outcome.channels[0].state);
    }

    assert_eq!(states[0], ChannelState::Unavailable);
    assert!(matches!(states[1], ChannelState::Available { max_eirp_dbm } if max_eirp_dbm < 36.0));
    assert!(matches!(states[2], ChannelState::Available { max_eirp_dbm } if max_eirp_dbm == 36.0));
}

#[test]
fn test_psd_bins_reported() {
    let ctx = context(
        -6.0,
        vec![fs_link((41.3, -73.95), (41.4, -73.90))],
        vec![],
    );
    let req = inquiry(
        vec![],
        vec![FrequencyRange {
            low_frequency_mhz: 5925.0,
            high_frequency_mhz: 6005.0,
        }],
    );
    let outcome = analyze(&ctx, &req, &AtomicBool::new(false));
    assert_eq!(outcome.code, ResponseCode::Success);
    assert_eq!(outcome.psd_bins.len(), 4);
    // Unconstrained bins carry max EIRP spread over 20 MHz.
    let expected = ctx.config.max_eirp_dbm - 10.0 * 20f64.log10();
    for bin in &outcome.psd_bins {
        assert!((bin.max_psd_dbm_mhz - expected).abs() < 1e-9);
    }
}

#[test]
fn test_ras_zone_blocks_channel() {
    let zone = RasZone {
        ras_id: 1,
        region: Region::US,
        name: "Synthetic RAS".to_string(),
        start_freq_mhz: 5960.0,
        stop_freq_mhz: 5990.0,
        exclusion: RasExclusion::Circle {
            center_lat_deg: RLAN_LAT,
            center_lon_deg: RLAN_LON,
            radius_km: 5.0,
        },
        antenna_agl_m: None,
    };
    let ctx = context(-6.0, vec![], vec![zone]);
    let outcome = analyze(&ctx, &inquiry(cfi_channels(), vec![]), &AtomicBool::new(false));
    assert_eq!(outcome.channels[0].state, ChannelState::Unavailable);
    assert!(matches!(
        outcome.channels[1].state,
        ChannelState::Available { .. }
    ));
}

#[test]
fn test_cancellation_returns_no_partial_results() {
    let ctx = context(-6.0, vec![fs_link((40.80, -73.95), (40.86, -73.93))], vec![]);
    let cancel = AtomicBool::new(true);
    let outcome = analyze(&ctx, &inquiry(cfi_channels(), vec![]), &cancel);
    assert_eq!(outcome.code, ResponseCode::GeneralFailure);
    assert!(outcome.channels.is_empty());
    assert!(outcome.psd_bins.is_empty());
}

#[test]
fn test_invalid_channel_rejected() {
    let ctx = context(-6.0, vec![], vec![]);
    let req = inquiry(
        vec![InquiredChannels {
            global_operating_class: 131,
            channel_cfi: Some(vec![2]),
        }],
        vec![],
    );
    let outcome = analyze(&ctx, &req, &AtomicBool::new(false));
    assert_eq!(outcome.code, ResponseCode::InvalidValue);
    assert!(outcome.channels.is_empty());
}

#[test]
fn test_response_assembly() {
    let ctx = context(
        -6.0,
        vec![fs_link((41.3, -73.95), (41.4, -73.90))],
        vec![],
    );
    let req = inquiry(cfi_channels(), vec![]);
    let outcome = analyze(&ctx, &req, &AtomicBool::new(false));
    let response = build_response(&req, &outcome);

    assert_eq!(response.request_id, "0");
    assert_eq!(response.response.response_code, 0);
    let info = response.available_channel_info.unwrap();
    assert_eq!(info.len(), 1);
    assert_eq!(info[0].global_operating_class, 131);
    assert_eq!(info[0].channel_cfi, vec![5, 181]);
    assert_eq!(info[0].max_eirp.len(), 2);
}
