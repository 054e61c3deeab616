//! `afc ingest`: parse and filter an FS database into link and anomaly
//! CSVs.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use afc_core::link::FsLink;
use afc_ingest::{AnomalySink, FsDatabaseReader, LinkAssembler, LinkAssemblerConfig};

use super::{EXIT_INVALID, EXIT_MISSING_DB, EXIT_OK};

pub struct IngestArgs {
    pub fs_db: String,
    pub out: String,
    pub antenna_list: Option<String>,
    pub antenna_map: Option<String>,
    pub transmitter_list: Option<String>,
    pub freq_table: Option<String>,
    pub keep_mobile: bool,
}

pub fn run(args: IngestArgs) -> i32 {
    match try_run(&args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            EXIT_INVALID
        }
    }
}

fn try_run(args: &IngestArgs) -> Result<i32> {
    if !Path::new(&args.fs_db).exists() {
        eprintln!("FS database not found: {}", args.fs_db);
        return Ok(EXIT_MISSING_DB);
    }

    let (antennas, transmitters, freq_table) = super::load_catalogs(
        args.antenna_list.as_deref(),
        args.antenna_map.as_deref(),
        args.transmitter_list.as_deref(),
        args.freq_table.as_deref(),
    )?;

    let records = FsDatabaseReader::open(&args.fs_db)
        .and_then(|r| r.read_all())
        .with_context(|| format!("reading FS database {}", args.fs_db))?;

    let config = LinkAssemblerConfig {
        remove_mobile: !args.keep_mobile,
        ..Default::default()
    };
    let assembled =
        LinkAssembler::new(config, &antennas, &transmitters, &freq_table).assemble(&records);

    fs::create_dir_all(&args.out).with_context(|| format!("creating {}", args.out))?;

    write_links(&args.out, &assembled.links)?;

    let file = fs::File::create(Path::new(&args.out).join("anomalous.csv"))
        .context("creating anomalous.csv")?;
    let sink = AnomalySink::new(file)?;
    for record in &assembled.anomalies {
        sink.write(record)?;
    }
    sink.into_inner()?;

    info!(
        links = assembled.links.len(),
        anomalies = assembled.anomalies.len(),
        "ingest complete"
    );
    println!(
        "{} links, {} anomalous records",
        assembled.links.len(),
        assembled.anomalies.len()
    );
    Ok(EXIT_OK)
}

fn write_links(out_dir: &str, links: &[FsLink]) -> Result<()> {
    let file = fs::File::create(Path::new(out_dir).join("fs_links.csv"))
        .context("creating fs_links.csv")?;
    let mut writer = csv::Writer::from_writer(file);
    writer.write_record([
        "FSID",
        "Region",
        "Callsign",
        "Status",
        "Radio Service",
        "Start Use Freq (MHz)",
        "Stop Use Freq (MHz)",
        "Bandwidth (MHz)",
        "Emissions Designator",
        "Rx Lat (deg)",
        "Rx Lon (deg)",
        "Rx Height AGL (m)",
        "Rx Ant Model",
        "Rx Ant Model Matched",
        "Rx Ant Category",
        "Rx Gain (dBi)",
        "Rx Line Loss (dB)",
        "Tx Lat (deg)",
        "Tx Lon (deg)",
        "Tx Height AGL (m)",
        "Tx EIRP (dBm)",
        "Tx Architecture",
        "Num Passive Repeater",
    ])?;
    for link in links {
        writer.write_record(vec![
            link.fsid.to_string(),
            link.region.to_string(),
            link.callsign.clone(),
            link.license_status.clone(),
            link.radio_service.clone(),
            format!("{:.6}", link.start_use_freq_mhz),
            format!("{:.6}", link.stop_use_freq_mhz),
            format!("{:.6}", link.bandwidth_mhz),
            link.emission_designator.clone().unwrap_or_default(),
            format!("{:.8}", link.rx_location.latitude_deg),
            format!("{:.8}", link.rx_location.longitude_deg),
            format!("{:.2}", link.rx_location.height_above_terrain),
            link.rx_antenna.model.clone(),
            link.rx_antenna.matched_name.clone().unwrap_or_default(),
            link.rx_antenna.category.to_string(),
            format!("{:.2}", link.rx_antenna.max_gain_dbi),
            format!("{:.2}", link.rx_antenna_feeder_loss_db),
            format!("{:.8}", link.tx_location.latitude_deg),
            format!("{:.8}", link.tx_location.longitude_deg),
            format!("{:.2}", link.tx_location.height_above_terrain),
            format!("{:.2}", link.tx_eirp_dbm),
            link.tx_architecture.to_string(),
            link.passive_repeaters.len().to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
