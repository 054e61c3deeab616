//! CLI subcommands.

pub mod analyze;
pub mod ingest;

use std::path::Path;

use anyhow::{Context, Result};

use afc_ingest::{AntennaModelMap, FreqAssignment, TransmitterModelMap};

/// Exit codes per the service contract.
pub const EXIT_OK: i32 = 0;
pub const EXIT_INVALID: i32 = 1;
pub const EXIT_MISSING_DB: i32 = 2;
pub const EXIT_COMPUTE: i32 = 3;
pub const EXIT_TIMEOUT: i32 = 4;

const EMPTY_ANTENNA_LIST: &str = "Ant Model,Category,Diameter (m),Midband Gain (dBi)\n";
const EMPTY_ANTENNA_MAP: &str = "regex,Ant Model\n";
const EMPTY_TRANSMITTER_LIST: &str = "Model Prefix,Architecture\n";

/// Load the matching catalogs, falling back to empty tables when a path
/// was not provided.
pub fn load_catalogs(
    antenna_list: Option<&str>,
    antenna_map: Option<&str>,
    transmitter_list: Option<&str>,
    freq_table: Option<&str>,
) -> Result<(AntennaModelMap, TransmitterModelMap, FreqAssignment)> {
    let antennas = match (antenna_list, antenna_map) {
        (Some(list), Some(map)) => AntennaModelMap::from_csv_paths(Path::new(list), Path::new(map))
            .context("loading antenna catalog")?,
        _ => AntennaModelMap::from_csv_strs(EMPTY_ANTENNA_LIST, EMPTY_ANTENNA_MAP)
            .expect("empty antenna catalog"),
    };

    let transmitters = match transmitter_list {
        Some(path) => {
            TransmitterModelMap::from_csv_path(path).context("loading transmitter catalog")?
        }
        None => TransmitterModelMap::from_csv_str(EMPTY_TRANSMITTER_LIST)
            .expect("empty transmitter catalog"),
    };

    let freq = match freq_table {
        Some(path) => {
            FreqAssignment::from_csv_path(path).context("loading frequency assignment table")?
        }
        None => FreqAssignment::default(),
    };

    Ok((antennas, transmitters, freq))
}
