use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::{DEFAULT_SAMPLE_STEP, DEFAULT_TIMEOUT_MS, DEFAULT_WORKERS, ScanConfig};
use crate::sink::{DEFAULT_CSV_PATH, DEFAULT_TXT_PATH, FileSink};
use crate::types::ScanMode;

#[derive(Parser, Debug)]
#[command(name = "pingsweep")]
#[command(about = "Ping-sweep IPv4 ranges for live hosts, keeping partial results on Ctrl+C")]
pub struct Cli {
    /// Range list: one `start end`, `start-end`, CIDR or single address per line
    pub input: PathBuf,

    /// Which addresses of each range to probe
    #[arg(short, long, value_enum, default_value_t = ScanMode::Sample)]
    pub mode: ScanMode,

    /// Stride between probed addresses in sample mode
    #[arg(short, long, default_value_t = DEFAULT_SAMPLE_STEP)]
    pub step: u32,

    /// Maximum number of probes in flight
    #[arg(short, long, default_value_t = DEFAULT_WORKERS)]
    pub workers: usize,

    /// Per-probe timeout in milliseconds
    #[arg(short, long = "timeout-ms", default_value_t = DEFAULT_TIMEOUT_MS)]
    pub timeout_ms: u64,

    /// Tab-separated output file
    #[arg(long, default_value = DEFAULT_TXT_PATH)]
    pub txt: PathBuf,

    /// CSV output file
    #[arg(long, default_value = DEFAULT_CSV_PATH)]
    pub csv: PathBuf,

    /// Optional JSON output file
    #[arg(long)]
    pub json: Option<PathBuf>,

    /// Print a progress line every N addresses (live hosts are always printed)
    #[arg(long, default_value_t = 50)]
    pub progress_every: u64,

    /// Only print the final summary
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    pub fn scan_config(&self) -> ScanConfig {
        ScanConfig::new(self.mode)
            .with_step(self.step)
            .with_workers(self.workers)
            .with_timeout(Duration::from_millis(self.timeout_ms))
    }

    pub fn sink(&self) -> FileSink {
        let sink = FileSink::new().with_txt(&self.txt).with_csv(&self.csv);
        match &self.json {
            Some(path) => sink.with_json(path),
            None => sink,
        }
    }
}

pub fn parse() -> Cli {
    Cli::parse()
}
