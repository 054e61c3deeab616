//! AFC command-line tool.
//!
//! Runs spectrum-availability analyses against an FS link database and
//! writes the inquiry response plus the exceed-threshold and anomalous
//! report files.
//!
//! Exit codes: 0 success, 1 invalid config or ingest, 2 missing database,
//! 3 computation error, 4 cancellation or timeout.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "afc")]
#[command(author, version, about = "6 GHz AFC spectrum availability engine", long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a spectrum inquiry request
    Analyze {
        /// AFC configuration JSON
        #[arg(long)]
        config: String,

        /// Inquiry request JSON
        #[arg(long)]
        request: String,

        /// FS database path (defaults to the config's ulsDatabase)
        #[arg(long)]
        fs_db: Option<String>,

        /// Output directory for response and report files
        #[arg(long, default_value = ".")]
        out: String,

        /// Antenna model list CSV
        #[arg(long)]
        antenna_list: Option<String>,

        /// Antenna model regex map CSV
        #[arg(long)]
        antenna_map: Option<String>,

        /// Transmitter model prefix CSV
        #[arg(long)]
        transmitter_list: Option<String>,

        /// Frequency-assignment fallback table CSV
        #[arg(long)]
        freq_table: Option<String>,
    },

    /// Parse and filter an FS database, emitting link and anomaly CSVs
    Ingest {
        /// FS database path
        #[arg(long)]
        fs_db: String,

        /// Output directory
        #[arg(long, default_value = ".")]
        out: String,

        /// Antenna model list CSV
        #[arg(long)]
        antenna_list: Option<String>,

        /// Antenna model regex map CSV
        #[arg(long)]
        antenna_map: Option<String>,

        /// Transmitter model prefix CSV
        #[arg(long)]
        transmitter_list: Option<String>,

        /// Frequency-assignment fallback table CSV
        #[arg(long)]
        freq_table: Option<String>,

        /// Keep mobile stations instead of filtering them
        #[arg(long)]
        keep_mobile: bool,
    },
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let exit_code = match cli.command {
        Commands::Analyze {
            config,
            request,
            fs_db,
            out,
            antenna_list,
            antenna_map,
            transmitter_list,
            freq_table,
        } => commands::analyze::run(commands::analyze::AnalyzeArgs {
            config,
            request,
            fs_db,
            out,
            antenna_list,
            antenna_map,
            transmitter_list,
            freq_table,
        }),
        Commands::Ingest {
            fs_db,
            out,
            antenna_list,
            antenna_map,
            transmitter_list,
            freq_table,
            keep_mobile,
        } => commands::ingest::run(commands::ingest::IngestArgs {
            fs_db,
            out,
            antenna_list,
            antenna_map,
            transmitter_list,
            freq_table,
            keep_mobile,
        }),
    };

    std::process::exit(exit_code);
}
