//! Publication engine configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{PublishError, Result};

// ----------------------------------------------------------------------------
// Configuration
// ----------------------------------------------------------------------------

/// Timing configuration for the publication scheduler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublicationConfig {
    /// Tick cadence for every subscribed characteristic
    pub interval_ms: u64,
    /// Upper bound on a single Value Source read
    pub read_timeout_ms: u64,
    /// Upper bound on a single push through the Transport Adapter
    pub delivery_timeout_ms: u64,
    /// How long shutdown waits for publishers before aborting them
    pub shutdown_timeout_ms: u64,
}

impl Default for PublicationConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1000,
            read_timeout_ms: 250,
            delivery_timeout_ms: 500,
            shutdown_timeout_ms: 2000,
        }
    }
}

impl PublicationConfig {
    /// Create a new configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the tick interval
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval_ms = interval.as_millis() as u64;
        self
    }

    /// Set the Value Source read timeout
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Set the delivery timeout
    pub fn with_delivery_timeout(mut self, timeout: Duration) -> Self {
        self.delivery_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Set the shutdown grace period
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn delivery_timeout(&self) -> Duration {
        Duration::from_millis(self.delivery_timeout_ms)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }

    /// Reject settings the scheduler cannot run with
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("interval_ms", self.interval_ms),
            ("read_timeout_ms", self.read_timeout_ms),
            ("delivery_timeout_ms", self.delivery_timeout_ms),
            ("shutdown_timeout_ms", self.shutdown_timeout_ms),
        ];

        for (name, value) in fields {
            if value == 0 {
                return Err(PublishError::InvalidConfiguration {
                    reason: format!("{} must be greater than 0", name),
                });
            }
        }

        Ok(())
    }
}
