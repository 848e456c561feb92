//! Error types for the BLE peripheral and probe client

use neuraload_core::{PayloadError, PublishError};
use thiserror::Error;
use uuid::Uuid;

// ----------------------------------------------------------------------------
// Error Types
// ----------------------------------------------------------------------------

/// Errors raised while bringing up the peripheral or probing a remote one
#[derive(Error, Debug)]
pub enum BleServerError {
    #[error("BLE adapter not available: {0}")]
    AdapterNotAvailable(String),

    #[cfg(target_os = "linux")]
    #[error("BlueZ error: {0}")]
    Bluez(#[from] bluer::Error),

    #[error("BLE central error: {0}")]
    Central(#[from] btleplug::Error),

    #[error("Peripheral mode is not supported on this platform")]
    Unsupported,

    #[error("No peripheral advertising service {service} found within {timeout_secs}s")]
    PeripheralNotFound { service: Uuid, timeout_secs: u64 },

    #[error("Characteristic not found: {uuid}")]
    CharacteristicNotFound { uuid: Uuid },

    #[error("Invalid peripheral configuration: {reason}")]
    InvalidConfiguration { reason: String },

    #[error(transparent)]
    Publish(#[from] PublishError),

    #[error("Malformed payload: {0}")]
    Payload(#[from] PayloadError),
}

pub type Result<T> = std::result::Result<T, BleServerError>;
