use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use crate::error::ScanError;
use crate::prober::ProbeError;

/// An inclusive span of IPv4 addresses, `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AddressRange {
    start: Ipv4Addr,
    end: Ipv4Addr,
}

impl AddressRange {
    /// Returns `None` when `end` sorts before `start`.
    pub fn new(start: Ipv4Addr, end: Ipv4Addr) -> Option<Self> {
        if u32::from(start) <= u32::from(end) {
            Some(Self { start, end })
        } else {
            None
        }
    }

    /// Builds a range from two boundaries given in either order.
    pub fn ordered(a: Ipv4Addr, b: Ipv4Addr) -> Self {
        if u32::from(a) <= u32::from(b) {
            Self { start: a, end: b }
        } else {
            Self { start: b, end: a }
        }
    }

    pub fn single(addr: Ipv4Addr) -> Self {
        Self {
            start: addr,
            end: addr,
        }
    }

    pub fn start(&self) -> Ipv4Addr {
        self.start
    }

    pub fn end(&self) -> Ipv4Addr {
        self.end
    }

    /// Number of addresses covered, `end - start + 1`.
    pub fn size(&self) -> u64 {
        u64::from(u32::from(self.end)) - u64::from(u32::from(self.start)) + 1
    }
}

impl fmt::Display for AddressRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

impl Serialize for AddressRange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ScanMode {
    /// Probe only the first and last address of each range
    EdgeOnly,
    /// Probe the boundaries plus every step-th address in between
    #[default]
    Sample,
    /// Probe every address
    Full,
}

impl ScanMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanMode::EdgeOnly => "edge_only",
            ScanMode::Sample => "sample",
            ScanMode::Full => "full",
        }
    }
}

impl fmt::Display for ScanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stride used by [`ScanMode::Sample`]. Always at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleStep(NonZeroU32);

impl SampleStep {
    pub const ONE: SampleStep = SampleStep(NonZeroU32::MIN);

    pub fn get(&self) -> u32 {
        self.0.get()
    }
}

impl TryFrom<u32> for SampleStep {
    type Error = ScanError;

    fn try_from(step: u32) -> Result<Self, Self::Error> {
        NonZeroU32::new(step)
            .map(SampleStep)
            .ok_or_else(|| ScanError::Configuration(format!("sample step must be >= 1, got {step}")))
    }
}

/// A host that answered a probe within the timeout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LiveHost {
    pub address: IpAddr,
    pub source_range: AddressRange,
    pub discovered_at: DateTime<Utc>,
}

impl LiveHost {
    pub fn new(address: IpAddr, source_range: AddressRange) -> Self {
        Self {
            address,
            source_range,
            discovered_at: Utc::now(),
        }
    }
}

#[derive(Debug, Default)]
struct ResultSetInner {
    hosts: Vec<LiveHost>,
    seen: HashSet<IpAddr>,
}

/// Append-only collection of live hosts shared by every in-flight probe.
///
/// Clones share the same storage. An address is recorded at most once; later
/// records for an already-seen address are ignored.
#[derive(Debug, Clone, Default)]
pub struct ScanResultSet {
    inner: Arc<Mutex<ResultSetInner>>,
}

impl ScanResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` if the address was already present.
    pub fn record(&self, host: LiveHost) -> bool {
        let mut inner = self.inner.lock();
        if !inner.seen.insert(host.address) {
            return false;
        }
        inner.hosts.push(host);
        true
    }

    pub fn len(&self) -> usize {
        self.inner.lock().hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, address: &IpAddr) -> bool {
        self.inner.lock().seen.contains(address)
    }

    /// Copy of the hosts recorded so far, in discovery order.
    pub fn snapshot(&self) -> Vec<LiveHost> {
        self.inner.lock().hosts.clone()
    }
}

/// Lifecycle of a single coordinator run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Idle,
    Running,
    Complete,
    Interrupted,
    Failed,
}

impl ScanState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ScanState::Complete | ScanState::Interrupted | ScanState::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScanState::Idle => "idle",
            ScanState::Running => "running",
            ScanState::Complete => "complete",
            ScanState::Interrupted => "interrupted",
            ScanState::Failed => "failed",
        }
    }
}

/// What a finished run hands back to the caller.
#[derive(Debug, Clone)]
pub struct ScanReport {
    pub state: ScanState,
    pub hosts: Vec<LiveHost>,
    /// Addresses whose probe finished.
    pub probed: u64,
    /// Addresses the configured ranges expand to.
    pub planned: u64,
    pub elapsed: Duration,
    /// Set when the run ended in [`ScanState::Failed`].
    pub failure: Option<ProbeError>,
}

impl ScanReport {
    pub fn live_count(&self) -> usize {
        self.hosts.len()
    }

    pub fn contains(&self, address: IpAddr) -> bool {
        self.hosts.iter().any(|h| h.address == address)
    }
}
