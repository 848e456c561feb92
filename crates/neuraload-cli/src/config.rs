//! NeuraLoad CLI configuration
//!
//! One TOML file with three sections:
//!
//! ```toml
//! [peripheral]
//! local_name = "NeuraLoad"
//!
//! [publication]
//! interval_ms = 1000
//!
//! [sensors]
//! device_id = "NL-0001"
//! simulate = true
//! ```
//!
//! Missing keys fall back to defaults; command line flags override the file.

use std::path::Path;
use std::time::Duration;

use neuraload_ble::PeripheralConfig;
use neuraload_core::PublicationConfig;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::error::{CliError, Result};

// ----------------------------------------------------------------------------
// Configuration Types
// ----------------------------------------------------------------------------

/// Complete configuration for the NeuraLoad CLI
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub peripheral: PeripheralConfig,
    pub publication: PublicationConfig,
    pub sensors: SensorConfig,
}

/// Where sensor readings come from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    /// Identity string served on the Device ID characteristic; random when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    /// Feed the store from the random simulator
    pub simulate: bool,
    /// How often the simulator publishes new readings
    pub update_interval_ms: u64,
    /// Seed for reproducible simulated readings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            device_id: None,
            simulate: true,
            update_interval_ms: 1000,
            seed: None,
        }
    }
}

/// Flag values from `neuraload serve`
#[derive(Debug, Clone, Default)]
pub struct ServeOverrides {
    pub device_id: Option<String>,
    pub interval_ms: Option<u64>,
    pub seed: Option<u64>,
    pub no_simulate: bool,
    pub adapter: Option<String>,
}

// ----------------------------------------------------------------------------
// Loading and Validation
// ----------------------------------------------------------------------------

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            CliError::Config(format!(
                "Failed to read {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_toml_str(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Render the configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validate the configuration for consistency and correctness
    pub fn validate(&self) -> Result<()> {
        self.publication.validate()?;
        self.peripheral.validate()?;

        if self.sensors.update_interval_ms == 0 {
            return Err(CliError::Config(
                "sensors.update_interval_ms must be greater than 0".to_string(),
            ));
        }
        if matches!(&self.sensors.device_id, Some(id) if id.is_empty()) {
            return Err(CliError::Config(
                "sensors.device_id must not be empty when set".to_string(),
            ));
        }
        Ok(())
    }

    /// Apply `serve` flags on top of the loaded configuration
    pub fn apply_serve_overrides(&mut self, overrides: ServeOverrides) -> Result<()> {
        if let Some(device_id) = overrides.device_id {
            self.sensors.device_id = Some(device_id);
        }
        if let Some(interval_ms) = overrides.interval_ms {
            self.publication.interval_ms = interval_ms;
        }
        if let Some(seed) = overrides.seed {
            self.sensors.seed = Some(seed);
        }
        if overrides.no_simulate {
            self.sensors.simulate = false;
        }
        if let Some(adapter) = overrides.adapter {
            self.peripheral.adapter_name = Some(adapter);
        }
        self.validate()
    }

    /// Configured device identity, or a freshly generated one
    pub fn resolve_device_id(&self) -> String {
        match &self.sensors.device_id {
            Some(device_id) => device_id.clone(),
            None => {
                let generated = Uuid::new_v4().to_string();
                warn!(
                    "No sensors.device_id configured, using generated identity {}",
                    generated
                );
                generated
            }
        }
    }

    pub fn update_interval(&self) -> Duration {
        Duration::from_millis(self.sensors.update_interval_ms)
    }
}
