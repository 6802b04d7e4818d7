use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::{error, info};

use fxkit::driver::{self, SplitConfig, StatConfig, DEFAULT_LENGTHS_PATH, DEFAULT_SPLIT_DIR};
use fxkit::split::{SplitMode, DEFAULT_MAX_UNITS};
use fxkit::stats::{DEFAULT_KB_THRESHOLDS, DEFAULT_PERCENTILES};

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    /// Fixed number of records per file
    Number,
    /// Accumulated sequence length per file
    Length,
}
impl From<Mode> for SplitMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Number => SplitMode::Count,
            Mode::Length => SplitMode::Length,
        }
    }
}

#[derive(Parser)]
#[command(version, about = "Toolkit for processing sequences in FASTA/Q formats")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Statistics on sequences
    Stat {
        /// Sequence files ('.gz' is accepted)
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Input reads are NGS short reads: only print the summary
        #[arg(long)]
        ngs: bool,

        /// Inputs are lists of sequence file paths
        #[arg(short = 'f', long)]
        fofn: bool,

        /// Minimum record length to include
        #[arg(long, default_value_t = 0)]
        min_len: u64,

        /// Number of files processed concurrently
        #[arg(short = 'c', long, default_value_t = 1)]
        concurrent: usize,

        /// N* values to show
        #[arg(long, num_args = 1.., default_values_t = DEFAULT_PERCENTILES.to_vec())]
        ns: Vec<u32>,

        /// >*kb values to show
        #[arg(long, num_args = 1.., default_values_t = DEFAULT_KB_THRESHOLDS.to_vec())]
        ls: Vec<u64>,

        /// Where to write the sorted record lengths
        #[arg(long, default_value = DEFAULT_LENGTHS_PATH)]
        lengths_out: PathBuf,
    },

    /// Split sequences
    Split {
        /// Sequence files ('.gz' is accepted)
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Split by number of records or by accumulated length
        #[arg(short = 'm', long, value_enum)]
        mode: Mode,

        /// The value of mode
        #[arg(short = 'n', long)]
        number: u64,

        /// Output directory
        #[arg(short = 'o', long, default_value = DEFAULT_SPLIT_DIR)]
        output_dir: PathBuf,

        /// Number of files processed concurrently
        #[arg(short = 'c', long, default_value_t = 1)]
        concurrent: usize,

        /// Maximum number of sub files per input
        #[arg(long, default_value_t = DEFAULT_MAX_UNITS)]
        max_split: usize,
    },
}

fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()))
        .init();
}

fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Command::Stat {
            inputs,
            ngs,
            fofn,
            min_len,
            concurrent,
            ns,
            ls,
            lengths_out,
        } => {
            let config = StatConfig {
                inputs,
                fofn,
                ngs,
                min_len,
                concurrent,
                percentiles: ns,
                kb_thresholds: ls,
                lengths_out: Some(lengths_out),
            };
            let stdout = io::stdout();
            let mut out = stdout.lock();
            let summary = driver::seq_stat(&config, &mut out).context("stat failed")?;
            out.flush()?;

            if summary.failed > 0 {
                error!(
                    "{} of {} file(s) could not be read",
                    summary.failed, summary.file_number
                );
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Split {
            inputs,
            mode,
            number,
            output_dir,
            concurrent,
            max_split,
        } => {
            let config = SplitConfig {
                inputs,
                mode: mode.into(),
                threshold: number,
                out_dir: output_dir,
                concurrent,
                max_units: max_split,
            };
            let units = driver::seq_split(&config).context("split failed")?;
            info!("{} sub file(s) listed in {:?}", units.len(), config.out_dir);
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn main() -> Result<ExitCode> {
    init_logging();
    run(Cli::parse())
}
