//! `afc analyze`: run spectrum inquiries against the FS database.

use std::fs;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use afc_core::codes::ResponseCode;
use afc_engine::{
    analyze, build_response, AfcConfig, AfcRequest, AnalysisContext, AfcResponse,
    ExceedThresholdWriter,
};
use afc_ingest::{
    read_ras_zones, AnomalousRecord, AnomalySink, FsDatabaseReader, LinkAssembler,
    LinkAssemblerConfig,
};
use afc_prop::KnifeEdgeItm;
use afc_terrain::TerrainResolver;

use super::{EXIT_COMPUTE, EXIT_INVALID, EXIT_MISSING_DB, EXIT_OK, EXIT_TIMEOUT};

pub struct AnalyzeArgs {
    pub config: String,
    pub request: String,
    pub fs_db: Option<String>,
    pub out: String,
    pub antenna_list: Option<String>,
    pub antenna_map: Option<String>,
    pub transmitter_list: Option<String>,
    pub freq_table: Option<String>,
}

pub fn run(args: AnalyzeArgs) -> i32 {
    match try_run(&args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            EXIT_INVALID
        }
    }
}

fn try_run(args: &AnalyzeArgs) -> Result<i32> {
    let config_text = fs::read_to_string(&args.config)
        .with_context(|| format!("reading config {}", args.config))?;
    let config = match AfcConfig::from_json(&config_text) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("invalid config: {e}");
            return Ok(EXIT_INVALID);
        }
    };

    let request_text = fs::read_to_string(&args.request)
        .with_context(|| format!("reading request {}", args.request))?;
    let request = match AfcRequest::from_json(&request_text) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("invalid request: {e}");
            return Ok(EXIT_INVALID);
        }
    };

    let db_path = args
        .fs_db
        .clone()
        .unwrap_or_else(|| config.uls_database.clone());
    if db_path.is_empty() || !Path::new(&db_path).exists() {
        eprintln!("FS database not found: {db_path}");
        return Ok(EXIT_MISSING_DB);
    }

    let (antennas, transmitters, freq_table) = super::load_catalogs(
        args.antenna_list.as_deref(),
        args.antenna_map.as_deref(),
        args.transmitter_list.as_deref(),
        args.freq_table.as_deref(),
    )?;

    let records = FsDatabaseReader::open(&db_path)
        .and_then(|r| r.read_all())
        .with_context(|| format!("reading FS database {db_path}"))?;

    let assembler_config = LinkAssemblerConfig {
        use_freq_seed: config.use_freq_seed,
        fs_noise_dbw_per_mhz: (
            config.fs_receiver_noise.unii5,
            config.fs_receiver_noise.unii7,
            config.fs_receiver_noise.other,
        ),
        feeder_loss_db: (
            config.receiver_feeder_loss.unii5,
            config.receiver_feeder_loss.unii7,
            config.receiver_feeder_loss.other,
        ),
        fade_margin_db: config.fade_margin_db,
        ..Default::default()
    };
    let assembled =
        LinkAssembler::new(assembler_config, &antennas, &transmitters, &freq_table)
            .assemble(&records);
    info!(
        links = assembled.links.len(),
        anomalies = assembled.anomalies.len(),
        "FS database assembled"
    );

    fs::create_dir_all(&args.out).with_context(|| format!("creating {}", args.out))?;
    write_anomalies(&args.out, &assembled.anomalies)?;

    let ras_zones = match &config.ras_database {
        Some(path) if !path.is_empty() => {
            read_ras_zones(path).with_context(|| format!("reading RAS database {path}"))?
        }
        _ => Vec::new(),
    };

    // Raster/vector decoding plugs in behind the resolver traits; the
    // stock binary analyses over the global fallback surface.
    let terrain = Arc::new(TerrainResolver::builder().fallback_height(0.0).build());

    let context = AnalysisContext::new(
        config,
        terrain,
        Arc::new(KnifeEdgeItm),
        assembled.links,
        ras_zones,
    );

    let cancel = AtomicBool::new(false);
    let mut responses = Vec::new();
    let mut exceed = ExceedThresholdWriter::new(
        fs::File::create(Path::new(&args.out).join("exc_thr.csv.gz"))
            .context("creating exc_thr.csv.gz")?,
    )?;

    let mut worst = EXIT_OK;
    for inquiry in &request.requests {
        let outcome = analyze(&context, inquiry, &cancel);
        for row in &outcome.exceed_rows {
            exceed.write_row(row)?;
        }
        if outcome.failed_triples > 0 {
            warn!(
                request = %inquiry.request_id,
                failed = outcome.failed_triples,
                "some scan triples were dropped"
            );
        }
        match outcome.code {
            ResponseCode::Success => {}
            ResponseCode::GeneralFailure
                if outcome
                    .diagnostic
                    .as_deref()
                    .is_some_and(|d| d.contains("timed out") || d.contains("cancelled")) =>
            {
                worst = worst.max(EXIT_TIMEOUT)
            }
            ResponseCode::GeneralFailure => worst = worst.max(EXIT_COMPUTE),
            _ => worst = worst.max(EXIT_INVALID),
        }
        responses.push(build_response(inquiry, &outcome));
    }
    exceed.finish()?;

    let response = AfcResponse { responses };
    let response_path = Path::new(&args.out).join("response.json");
    fs::write(&response_path, serde_json::to_string_pretty(&response)?)
        .with_context(|| format!("writing {}", response_path.display()))?;
    println!("{}", serde_json::to_string(&response)?);

    Ok(worst)
}

fn write_anomalies(out_dir: &str, anomalies: &[AnomalousRecord]) -> Result<()> {
    let file = fs::File::create(Path::new(out_dir).join("anomalous.csv"))
        .context("creating anomalous.csv")?;
    let sink = AnomalySink::new(file)?;
    for record in anomalies {
        sink.write(record)?;
    }
    sink.into_inner()?;
    Ok(())
}
