//! Shared sensor snapshot store
//!
//! One `SensorStore` backs every characteristic of the sensor service. An
//! updater publishes whole readings under the write lock, so a reader never
//! sees a half-updated composite (for example a multi-axis sample where only
//! some axes are new).

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::errors::{PublishError, Result};
use crate::payload::{
    encode_identity, encode_inertial, encode_ranging, encode_weight, ImuReading,
    IMU_SENSOR_COUNT, INERTIAL_PAYLOAD_LEN, RANGING_PAYLOAD_LEN, RANGING_SENSOR_COUNT,
    WEIGHT_PAYLOAD_LEN,
};
use crate::source::ValueSource;

// ----------------------------------------------------------------------------
// Snapshot Types
// ----------------------------------------------------------------------------

/// The acquired (numeric) part of a snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorReadings {
    pub imu: [ImuReading; IMU_SENSOR_COUNT],
    pub ranging: [f32; RANGING_SENSOR_COUNT],
    pub weight: f32,
}

/// Everything the sensor service exposes at one instant
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorSnapshot {
    pub readings: SensorReadings,
    pub device_id: String,
}

/// Which part of a snapshot a characteristic exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SensorField {
    Inertial,
    Ranging,
    Weight,
    DeviceId,
}

impl SensorField {
    /// Encode this field of the snapshot into its wire payload
    pub fn encode(&self, snapshot: &SensorSnapshot) -> Vec<u8> {
        match self {
            SensorField::Inertial => encode_inertial(&snapshot.readings.imu),
            SensorField::Ranging => encode_ranging(&snapshot.readings.ranging),
            SensorField::Weight => encode_weight(snapshot.readings.weight),
            SensorField::DeviceId => encode_identity(&snapshot.device_id),
        }
    }

    /// Human-readable description published as the user description descriptor
    pub fn description(&self) -> &'static str {
        match self {
            SensorField::Inertial => "IMU Sensor Data",
            SensorField::Ranging => "Laser Sensor Data",
            SensorField::Weight => "Estimated Weight",
            SensorField::DeviceId => "Device ID",
        }
    }

    /// Fixed payload length, if the field has one
    pub fn payload_len(&self) -> Option<usize> {
        match self {
            SensorField::Inertial => Some(INERTIAL_PAYLOAD_LEN),
            SensorField::Ranging => Some(RANGING_PAYLOAD_LEN),
            SensorField::Weight => Some(WEIGHT_PAYLOAD_LEN),
            SensorField::DeviceId => None,
        }
    }

    /// Whether reading this field depends on live acquisition
    pub fn is_acquired(&self) -> bool {
        !matches!(self, SensorField::DeviceId)
    }
}

// ----------------------------------------------------------------------------
// Sensor Store
// ----------------------------------------------------------------------------

#[derive(Debug, Default)]
struct StoreState {
    snapshot: SensorSnapshot,
    fault: Option<String>,
    revision: u64,
}

/// Single-writer, multi-reader holder of the latest sensor snapshot
#[derive(Debug, Default)]
pub struct SensorStore {
    state: RwLock<StoreState>,
}

impl SensorStore {
    /// Create a store with zeroed readings and the given device identity
    pub fn new(device_id: impl Into<String>) -> Self {
        Self {
            state: RwLock::new(StoreState {
                snapshot: SensorSnapshot {
                    readings: SensorReadings::default(),
                    device_id: device_id.into(),
                },
                fault: None,
                revision: 0,
            }),
        }
    }

    /// Replace all readings atomically and clear any acquisition fault
    pub async fn publish(&self, readings: SensorReadings) {
        let mut state = self.state.write().await;
        state.snapshot.readings = readings;
        state.revision += 1;
        if let Some(reason) = state.fault.take() {
            debug!("Sensor acquisition recovered after fault: {}", reason);
        }
    }

    pub async fn set_imu(&self, imu: [ImuReading; IMU_SENSOR_COUNT]) {
        let mut state = self.state.write().await;
        state.snapshot.readings.imu = imu;
        state.revision += 1;
    }

    pub async fn set_ranging(&self, ranging: [f32; RANGING_SENSOR_COUNT]) {
        let mut state = self.state.write().await;
        state.snapshot.readings.ranging = ranging;
        state.revision += 1;
    }

    pub async fn set_weight(&self, weight: f32) {
        let mut state = self.state.write().await;
        state.snapshot.readings.weight = weight;
        state.revision += 1;
    }

    pub async fn set_device_id(&self, device_id: impl Into<String>) {
        let mut state = self.state.write().await;
        state.snapshot.device_id = device_id.into();
        state.revision += 1;
    }

    /// Report an acquisition fault; acquired fields fail until the next `publish`
    pub async fn mark_unavailable(&self, reason: impl Into<String>) {
        let reason = reason.into();
        warn!("Sensor acquisition unavailable: {}", reason);
        self.state.write().await.fault = Some(reason);
    }

    /// Number of writes applied so far
    pub async fn revision(&self) -> u64 {
        self.state.read().await.revision
    }

    /// Copy of the current snapshot, ignoring any fault
    pub async fn snapshot(&self) -> SensorSnapshot {
        self.state.read().await.snapshot.clone()
    }

    /// Encode one field under the read lock
    pub async fn read_field(&self, field: SensorField) -> Result<Vec<u8>> {
        let state = self.state.read().await;
        if field.is_acquired() {
            if let Some(reason) = &state.fault {
                return Err(PublishError::source_unavailable(reason.clone()));
            }
        }
        Ok(field.encode(&state.snapshot))
    }

    /// Value Source exposing one field of this store
    pub fn field_source(self: &Arc<Self>, field: SensorField) -> FieldSource {
        FieldSource {
            store: Arc::clone(self),
            field,
        }
    }
}

// ----------------------------------------------------------------------------
// Field Source
// ----------------------------------------------------------------------------

/// Value Source reading a single field of a shared `SensorStore`
#[derive(Debug, Clone)]
pub struct FieldSource {
    store: Arc<SensorStore>,
    field: SensorField,
}

impl FieldSource {
    pub fn field(&self) -> SensorField {
        self.field
    }
}

#[async_trait]
impl ValueSource for FieldSource {
    async fn produce(&self) -> Result<Vec<u8>> {
        self.store.read_field(self.field).await
    }
}
