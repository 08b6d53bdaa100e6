//! batchlog CLI
//!
//! Command-line tools for write batch files.
//!
//! # Commands
//!
//! - `encode` - Build a batch file from a text script
//! - `dump` - Decode and print the records of a batch file
//! - `replay` - Replay a batch file into in-memory column families
//! - `bloom` - Measure Bloom filter false positive rates

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// batchlog command-line tools.
#[derive(Parser)]
#[command(name = "batchlog")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a batch file from a script
    Encode {
        /// Script with one operation per line
        script: PathBuf,

        /// Output batch file
        out: PathBuf,
    },

    /// Decode and print a batch file
    Dump {
        /// Batch file
        file: PathBuf,

        /// Maximum number of records to print
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Replay a batch file into fresh in-memory column families
    Replay {
        /// Batch file
        file: PathBuf,

        /// Replay in recovery mode
        #[arg(long)]
        recovery: bool,

        /// Log number the batch was read from
        #[arg(long, default_value = "0")]
        log_number: u64,

        /// Collapse merge chains at this length (0 disables)
        #[arg(long, default_value = "0")]
        max_successive_merges: usize,

        /// Merge operator (append, add)
        #[arg(short, long)]
        merge_operator: Option<String>,

        /// Overwrite resident values in place
        #[arg(long)]
        inplace: bool,

        /// Drop deletes of keys that do not exist
        #[arg(long)]
        filter_deletes: bool,

        /// Create an extra column family with this id
        #[arg(short, long = "column-family")]
        column_families: Vec<u32>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Measure the false positive rate of a Bloom filter
    Bloom {
        /// Number of keys to insert
        #[arg(short, long, default_value = "10000")]
        keys: u32,

        /// Bits of filter per inserted key
        #[arg(short, long, default_value = "10")]
        bits_per_key: u32,

        /// Probes per key
        #[arg(short, long, default_value = "6")]
        probes: u32,

        /// Confine each key's probes to one cache line
        #[arg(short, long)]
        locality: bool,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Encode { script, out } => {
            commands::encode::run(&script, &out)?;
        }
        Commands::Dump {
            file,
            limit,
            format,
        } => {
            commands::dump::run(&file, limit, &format)?;
        }
        Commands::Replay {
            file,
            recovery,
            log_number,
            max_successive_merges,
            merge_operator,
            inplace,
            filter_deletes,
            column_families,
            format,
        } => {
            let args = commands::replay::ReplayArgs {
                recovery,
                log_number,
                max_successive_merges,
                merge_operator,
                inplace,
                filter_deletes,
                column_families,
            };
            commands::replay::run(&file, &args, &format)?;
        }
        Commands::Bloom {
            keys,
            bits_per_key,
            probes,
            locality,
            format,
        } => {
            commands::bloom::run(keys, bits_per_key, probes, locality, &format)?;
        }
        Commands::Version => {
            println!("batchlog CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("batchlog Core v{}", batchlog_core::VERSION);
        }
    }

    Ok(())
}
