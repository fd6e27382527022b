use async_trait::async_trait;
use std::net::IpAddr;
use std::time::Duration;
use thiserror::Error;

/// Outcome of a single reachability check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reachability {
    Reachable,
    Unreachable,
}

impl Reachability {
    pub fn is_reachable(&self) -> bool {
        matches!(self, Reachability::Reachable)
    }
}

/// The probing mechanism itself could not be used (missing executable,
/// missing privilege). Never raised for a host that simply did not answer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot probe {address}: {reason}")]
pub struct ProbeError {
    pub address: IpAddr,
    pub reason: String,
}

impl ProbeError {
    pub fn new(address: IpAddr, reason: impl Into<String>) -> Self {
        Self {
            address,
            reason: reason.into(),
        }
    }
}

#[async_trait]
pub trait Prober: Send + Sync {
    /// Prober identifier for logging
    fn name(&self) -> &'static str;

    /// Check one address. Must resolve within `timeout`; a host that does not
    /// answer in time is [`Reachability::Unreachable`], not an error.
    async fn probe(&self, address: IpAddr, timeout: Duration) -> Result<Reachability, ProbeError>;
}
