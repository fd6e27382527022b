use std::time::Duration;

use crate::error::ScanError;
use crate::types::{SampleStep, ScanMode};

pub const DEFAULT_SAMPLE_STEP: u32 = 256;
pub const DEFAULT_WORKERS: usize = 50;
pub const DEFAULT_TIMEOUT_MS: u64 = 700;

/// Knobs for a scan. Checked by [`ScanConfig::validate`] before any probe goes out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    pub mode: ScanMode,
    /// Only consulted in [`ScanMode::Sample`].
    pub sample_step: u32,
    pub workers: usize,
    pub timeout: Duration,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            mode: ScanMode::Sample,
            sample_step: DEFAULT_SAMPLE_STEP,
            workers: DEFAULT_WORKERS,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }
}

impl ScanConfig {
    pub fn new(mode: ScanMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn with_step(mut self, sample_step: u32) -> Self {
        self.sample_step = sample_step;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the stride to expand ranges with.
    ///
    /// Outside sample mode the step is ignored, so a zero step is only
    /// rejected when the mode is [`ScanMode::Sample`].
    pub fn validate(&self) -> Result<SampleStep, ScanError> {
        if self.workers == 0 {
            return Err(ScanError::Configuration("worker count must be >= 1".into()));
        }
        if self.timeout.is_zero() {
            return Err(ScanError::Configuration("probe timeout must be positive".into()));
        }
        match self.mode {
            ScanMode::Sample => SampleStep::try_from(self.sample_step),
            ScanMode::EdgeOnly | ScanMode::Full => Ok(SampleStep::ONE),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ScanConfig::default();
        assert_eq!(config.mode, ScanMode::Sample);
        assert_eq!(config.sample_step, 256);
        assert_eq!(config.workers, 50);
        assert_eq!(config.timeout, Duration::from_millis(700));
        assert_eq!(config.validate().unwrap().get(), 256);
    }

    #[test]
    fn test_sample_with_zero_step_rejected() {
        let config = ScanConfig::new(ScanMode::Sample).with_step(0);
        assert!(matches!(config.validate(), Err(ScanError::Configuration(_))));
    }

    #[test]
    fn test_zero_step_ignored_outside_sample() {
        assert!(ScanConfig::new(ScanMode::Full).with_step(0).validate().is_ok());
        assert!(ScanConfig::new(ScanMode::EdgeOnly).with_step(0).validate().is_ok());
    }

    #[test]
    fn test_zero_workers_rejected() {
        let err = ScanConfig::default().with_workers(0).validate().unwrap_err();
        assert_eq!(err.to_string(), "invalid configuration: worker count must be >= 1");
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = ScanConfig::default().with_timeout(Duration::ZERO);
        assert!(matches!(config.validate(), Err(ScanError::Configuration(_))));
    }
}
