//! Drives a scan: fans the expanded address stream out to a bounded set of
//! concurrent probes, collects live hosts, and flushes them exactly once no
//! matter how the run ends.
//!
//! Lifecycle: `Idle -> Running -> {Complete, Interrupted, Failed}`.
//!
//! - **Complete**: every planned address was probed.
//! - **Interrupted**: [`Interrupt::trigger`] was called. No new addresses are
//!   dispatched, probes already in flight run to completion, then whatever
//!   was found is flushed. Returned as `Ok`.
//! - **Failed**: a prober reported a [`ProbeError`]. Drained and flushed like
//!   an interrupt, then surfaced as [`ScanError::ProbeInvocation`].
//!
//! A failed flush is surfaced as [`ScanError::SinkWrite`] with the full
//! report attached so the caller can retry persistence.

use futures::FutureExt;
use futures::future;
use futures::stream::{self, StreamExt};
use std::net::IpAddr;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::watch;

use crate::config::ScanConfig;
use crate::error::ScanError;
use crate::expand::expand;
use crate::prober::{ProbeError, Prober, Reachability};
use crate::sink::ResultSink;
use crate::types::{AddressRange, LiveHost, SampleStep, ScanMode, ScanReport, ScanResultSet, ScanState};

/// Cooperative "please stop" flag. Clones observe the same flag.
#[derive(Debug, Clone)]
pub struct Interrupt {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for Interrupt {
    fn default() -> Self {
        Self::new()
    }
}

impl Interrupt {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once [`Interrupt::trigger`] has been called.
    pub async fn triggered(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in self, so the channel cannot close under us
        let _ = rx.wait_for(|stop| *stop).await;
    }
}

/// Snapshot handed to the progress callback after each finished probe.
#[derive(Debug, Clone, Copy)]
pub struct Progress {
    pub processed: u64,
    pub planned: u64,
    pub address: IpAddr,
    pub reachable: bool,
    pub live: usize,
    pub elapsed: Duration,
}

impl Progress {
    /// Probes finished per second so far.
    pub fn rate(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 { self.processed as f64 / secs } else { 0.0 }
    }
}

pub type ProgressCallback = Box<dyn Fn(&Progress) + Send + Sync>;

fn planned_count(ranges: &[AddressRange], mode: ScanMode, step: SampleStep) -> u64 {
    ranges.iter().map(|r| expand(r, mode, step).remaining()).sum()
}

pub struct ScanCoordinator {
    config: ScanConfig,
    prober: Arc<dyn Prober>,
    sink: Box<dyn ResultSink>,
    on_progress: Option<ProgressCallback>,
    state: ScanState,
}

impl ScanCoordinator {
    pub fn new(config: ScanConfig, prober: Arc<dyn Prober>, sink: Box<dyn ResultSink>) -> Self {
        log::debug!("[coordinator] new: mode={} step={} workers={} timeout={}ms prober={}",
            config.mode, config.sample_step, config.workers, config.timeout.as_millis(), prober.name());
        Self {
            config,
            prober,
            sink,
            on_progress: None,
            state: ScanState::Idle,
        }
    }

    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.on_progress = Some(callback);
        self
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    pub fn sink_description(&self) -> String {
        self.sink.describe()
    }

    /// Number of addresses `ranges` expand to under the current config.
    pub fn planned(&self, ranges: &[AddressRange]) -> Result<u64, ScanError> {
        let step = self.config.validate()?;
        Ok(planned_count(ranges, self.config.mode, step))
    }

    /// Probes every address the ranges expand to, in input order, with at
    /// most `workers` probes outstanding at once.
    ///
    /// Configuration errors are returned before anything is probed or
    /// flushed. Every other exit path flushes the result set exactly once
    /// before returning.
    pub async fn run(&mut self, ranges: &[AddressRange], interrupt: &Interrupt) -> Result<ScanReport, ScanError> {
        let step = self.config.validate().inspect_err(|e| {
            log::error!("[coordinator] config_rejected: error={}", e);
        })?;
        let mode = self.config.mode;
        let timeout = self.config.timeout;
        let workers = self.config.workers;
        let planned = planned_count(ranges, mode, step);

        self.state = ScanState::Running;
        log::info!("[coordinator] run_starting: ranges={} planned={} mode={} step={} workers={} timeout={}ms",
            ranges.len(), planned, mode, step.get(), workers, timeout.as_millis());

        let results = ScanResultSet::new();
        let halt = AtomicBool::new(false);
        let started = Instant::now();
        let prober: &dyn Prober = &*self.prober;

        let addresses = ranges
            .iter()
            .flat_map(move |range| expand(range, mode, step).map(move |addr| (addr, *range)));

        let mut probes = stream::iter(addresses)
            .take_while(|_| future::ready(!interrupt.is_triggered() && !halt.load(Ordering::SeqCst)))
            .map(|(addr, range)| {
                let results = results.clone();
                async move {
                    let address = IpAddr::V4(addr);
                    let outcome = AssertUnwindSafe(prober.probe(address, timeout))
                        .catch_unwind()
                        .await
                        .unwrap_or_else(|_| Err(ProbeError::new(address, "probe panicked")));
                    if let Ok(Reachability::Reachable) = outcome {
                        results.record(LiveHost::new(address, range));
                    }
                    (address, outcome)
                }
            })
            .buffer_unordered(workers);

        let mut processed = 0u64;
        let mut interrupted = false;
        let mut failure: Option<ProbeError> = None;

        loop {
            tokio::select! {
                biased;

                _ = interrupt.triggered(), if !interrupted => {
                    interrupted = true;
                    log::warn!("[coordinator] interrupt_received: processed={} live={} - draining in-flight probes",
                        processed, results.len());
                }

                next = probes.next() => {
                    let Some((address, outcome)) = next else { break };
                    processed += 1;

                    match outcome {
                        Ok(status) => {
                            let reachable = status.is_reachable();
                            if reachable {
                                log::debug!("[coordinator] live_host: address={} live={}", address, results.len());
                            }
                            if let Some(callback) = &self.on_progress {
                                callback(&Progress {
                                    processed,
                                    planned,
                                    address,
                                    reachable,
                                    live: results.len(),
                                    elapsed: started.elapsed(),
                                });
                            }
                        }
                        Err(error) => {
                            log::error!("[coordinator] probe_failed: address={} error={} - stopping dispatch", address, error);
                            halt.store(true, Ordering::SeqCst);
                            failure.get_or_insert(error);
                        }
                    }
                }
            }
        }
        drop(probes);

        let state = if failure.is_some() {
            ScanState::Failed
        } else if (interrupted || interrupt.is_triggered()) && processed < planned {
            ScanState::Interrupted
        } else {
            ScanState::Complete
        };
        self.state = state;

        let report = ScanReport {
            state,
            hosts: results.snapshot(),
            probed: processed,
            planned,
            elapsed: started.elapsed(),
            failure: failure.clone(),
        };

        log::info!("[coordinator] run_finished: state={} probed={}/{} live={} duration={}ms",
            state.as_str(), processed, planned, report.hosts.len(), report.elapsed.as_millis());

        match (self.sink.flush(&report.hosts), failure) {
            (Err(source), _) => {
                log::error!("[coordinator] flush_failed: live={} error={}", report.hosts.len(), source);
                Err(ScanError::SinkWrite {
                    source,
                    report: Box::new(report),
                })
            }
            (Ok(()), Some(source)) => {
                log::info!("[coordinator] flush_completed: live={} sink={}", report.hosts.len(), self.sink.describe());
                Err(ScanError::ProbeInvocation {
                    source,
                    report: Box::new(report),
                })
            }
            (Ok(()), None) => {
                log::info!("[coordinator] flush_completed: live={} sink={}", report.hosts.len(), self.sink.describe());
                Ok(report)
            }
        }
    }
}
