pub mod cli;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod expand;
pub mod logging;
pub mod pretty;
pub mod probe;
pub mod prober;
pub mod ranges;
pub mod sink;
pub mod types;

// Re-export key types and functions at the crate root
pub use config::ScanConfig;
pub use coordinator::{Interrupt, Progress, ScanCoordinator};
pub use error::{RangeParseError, ScanError, SinkError};
pub use expand::{Expansion, expand};
pub use logging::{get_log_file_path, init_logging};
pub use probe::PingProber;
pub use prober::{ProbeError, Prober, Reachability};
pub use ranges::{RangeList, load_ranges, parse_ranges};
pub use sink::{FileSink, ResultSink};
pub use types::{AddressRange, LiveHost, SampleStep, ScanMode, ScanReport, ScanResultSet, ScanState};
