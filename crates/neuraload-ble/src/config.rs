//! Peripheral configuration

use serde::{Deserialize, Serialize};

use crate::error::{BleServerError, Result};
use crate::protocol::{DEFAULT_LOCAL_NAME, MAX_LOCAL_NAME_LEN};

// ----------------------------------------------------------------------------
// Configuration
// ----------------------------------------------------------------------------

/// How the peripheral presents itself on the host Bluetooth stack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeripheralConfig {
    /// Name carried in the advertisement
    pub local_name: String,
    /// Adapter to use (e.g. `hci1`); the system default when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adapter_name: Option<String>,
    /// Keep the adapter discoverable with no timeout
    pub discoverable: bool,
    /// Accept pairing requests
    pub pairable: bool,
    /// Ask BlueZ to include TX power in the advertisement
    pub include_tx_power: bool,
    /// Register a no-input/no-output pairing agent
    pub register_agent: bool,
    /// Mark devices trusted once the agent authorizes them
    pub trust_paired_devices: bool,
}

impl Default for PeripheralConfig {
    fn default() -> Self {
        Self {
            local_name: DEFAULT_LOCAL_NAME.to_string(),
            adapter_name: None,
            discoverable: true,
            pairable: true,
            include_tx_power: true,
            register_agent: true,
            trust_paired_devices: true,
        }
    }
}

impl PeripheralConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the advertised local name
    pub fn with_local_name(mut self, name: impl Into<String>) -> Self {
        self.local_name = name.into();
        self
    }

    /// Pin the peripheral to a specific adapter
    pub fn with_adapter_name(mut self, adapter: impl Into<String>) -> Self {
        self.adapter_name = Some(adapter.into());
        self
    }

    pub fn with_discoverable(mut self, enabled: bool) -> Self {
        self.discoverable = enabled;
        self
    }

    pub fn with_pairable(mut self, enabled: bool) -> Self {
        self.pairable = enabled;
        self
    }

    /// Enable or disable the pairing agent
    pub fn with_agent(mut self, enabled: bool) -> Self {
        self.register_agent = enabled;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.local_name.is_empty() {
            return Err(BleServerError::InvalidConfiguration {
                reason: "local_name must not be empty".to_string(),
            });
        }
        if self.local_name.len() > MAX_LOCAL_NAME_LEN {
            return Err(BleServerError::InvalidConfiguration {
                reason: format!(
                    "local_name is {} bytes (max: {})",
                    self.local_name.len(),
                    MAX_LOCAL_NAME_LEN
                ),
            });
        }
        if matches!(&self.adapter_name, Some(name) if name.is_empty()) {
            return Err(BleServerError::InvalidConfiguration {
                reason: "adapter_name must not be empty when set".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PeripheralConfig::default();
        assert_eq!(config.local_name, "NeuraLoad");
        assert!(config.adapter_name.is_none());
        assert!(config.discoverable && config.pairable && config.include_tx_power);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        assert!(PeripheralConfig::new().with_local_name("").validate().is_err());
        assert!(PeripheralConfig::new()
            .with_local_name("N".repeat(MAX_LOCAL_NAME_LEN + 1))
            .validate()
            .is_err());
        assert!(PeripheralConfig::new()
            .with_adapter_name("")
            .validate()
            .is_err());

        let config = PeripheralConfig::new()
            .with_adapter_name("hci1")
            .with_discoverable(false)
            .with_agent(false)
            .with_pairable(false);
        assert!(config.validate().is_ok());
        assert_eq!(config.adapter_name.as_deref(), Some("hci1"));
        assert!(!config.discoverable && !config.pairable && !config.register_agent);
    }
}
