//! Service Registry
//!
//! A `Service` owns the characteristics that form one GATT service, in
//! registration order. Services are built once at startup and never shrink.

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::characteristic::{Access, Characteristic};
use crate::config::PublicationConfig;
use crate::errors::{PublishError, Result};
use crate::sensor::{SensorField, SensorStore};

// ----------------------------------------------------------------------------
// Sensor Service UUIDs
// ----------------------------------------------------------------------------

/// NeuraLoad sensor service UUID
pub const SENSOR_SERVICE_UUID: Uuid = Uuid::from_u128(0x00000001_736c_4645_b520_7127aadf8c47);

/// Inertial sample set (read, notify)
pub const INERTIAL_CHARACTERISTIC_UUID: Uuid =
    Uuid::from_u128(0x00000002_736c_4645_b520_7127aadf8c47);

/// Ranging sample set (read, notify)
pub const RANGING_CHARACTERISTIC_UUID: Uuid =
    Uuid::from_u128(0x00000003_736c_4645_b520_7127aadf8c47);

/// Estimated weight (read, notify)
pub const WEIGHT_CHARACTERISTIC_UUID: Uuid =
    Uuid::from_u128(0x00000004_736c_4645_b520_7127aadf8c47);

/// Device identity string (read)
pub const DEVICE_ID_CHARACTERISTIC_UUID: Uuid =
    Uuid::from_u128(0x00000005_736c_4645_b520_7127aadf8c47);

/// UUID and access for each exposed sensor field, in discovery order
pub const SENSOR_CHARACTERISTICS: [(Uuid, SensorField, Access); 4] = [
    (INERTIAL_CHARACTERISTIC_UUID, SensorField::Inertial, Access::READ_NOTIFY),
    (RANGING_CHARACTERISTIC_UUID, SensorField::Ranging, Access::READ_NOTIFY),
    (WEIGHT_CHARACTERISTIC_UUID, SensorField::Weight, Access::READ_NOTIFY),
    (DEVICE_ID_CHARACTERISTIC_UUID, SensorField::DeviceId, Access::READ),
];

// ----------------------------------------------------------------------------
// Service
// ----------------------------------------------------------------------------

/// One logical service and its ordered characteristics
#[derive(Debug)]
pub struct Service {
    uuid: Uuid,
    primary: bool,
    characteristics: Vec<Arc<Characteristic>>,
}

impl Service {
    pub fn new(uuid: Uuid, primary: bool) -> Self {
        Self {
            uuid,
            primary,
            characteristics: Vec::new(),
        }
    }

    /// Build the reference sensor service, every characteristic reading from `store`
    pub fn sensor_service(store: &Arc<SensorStore>, config: &PublicationConfig) -> Result<Self> {
        let mut service = Self::new(SENSOR_SERVICE_UUID, true);

        for (uuid, field, access) in SENSOR_CHARACTERISTICS {
            let characteristic = Characteristic::new(
                uuid,
                field.description(),
                access,
                Arc::new(store.field_source(field)),
            )
            .with_read_timeout(config.read_timeout());
            service.register(characteristic)?;
        }

        Ok(service)
    }

    /// Append a characteristic; rejects a UUID already present in this service
    pub fn register(&mut self, characteristic: Characteristic) -> Result<()> {
        let uuid = characteristic.uuid();
        if self.contains(uuid) {
            return Err(PublishError::DuplicateIdentity { uuid });
        }

        debug!(
            service = %self.uuid,
            %uuid,
            "Registered characteristic '{}' [{}]",
            characteristic.description(),
            characteristic.access().flags().join(", ")
        );
        self.characteristics.push(Arc::new(characteristic));
        Ok(())
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn is_primary(&self) -> bool {
        self.primary
    }

    pub fn contains(&self, uuid: Uuid) -> bool {
        self.characteristics.iter().any(|c| c.uuid() == uuid)
    }

    pub fn get(&self, uuid: Uuid) -> Option<&Arc<Characteristic>> {
        self.characteristics.iter().find(|c| c.uuid() == uuid)
    }

    /// Characteristics in registration order
    pub fn characteristics(&self) -> &[Arc<Characteristic>] {
        &self.characteristics
    }

    pub fn len(&self) -> usize {
        self.characteristics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.characteristics.is_empty()
    }
}
