//! Characteristic publication engine for the NeuraLoad sensor peripheral
//!
//! This crate holds everything about the sensor service that does not depend
//! on a particular Bluetooth stack:
//!
//! - [`characteristic`] - identity, access capabilities and fresh reads
//! - [`scheduler`] - per-characteristic subscription state and periodic pushes
//! - [`registry`] - the service and its ordered characteristics
//! - [`sensor`] - the shared snapshot store backing every characteristic
//! - [`payload`] - bit-exact binary layouts of the sensor payloads
//! - [`simulation`] - random readings standing in for real hardware
//!
//! A Transport Adapter plugs in through two seams: it calls
//! [`CharacteristicHandle`] for inbound reads and subscriptions, and it
//! implements [`NotifySink`] to carry outbound pushes.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use neuraload_core::{
//!     NotifySink, PublicationConfig, PublicationScheduler, SensorStore, Service,
//! };
//!
//! # async fn example(sink: Arc<dyn NotifySink>) -> neuraload_core::Result<()> {
//! let config = PublicationConfig::default();
//! let store = Arc::new(SensorStore::new("NL-0001"));
//! let service = Service::sensor_service(&store, &config)?;
//!
//! let mut scheduler = PublicationScheduler::new(config, sink)?;
//! let handles = scheduler.attach_service(&service);
//!
//! // Hand `handles` to the Transport Adapter, then later:
//! scheduler.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod characteristic;
pub mod config;
pub mod errors;
pub mod payload;
pub mod registry;
pub mod scheduler;
pub mod sensor;
pub mod simulation;
pub mod source;
pub mod transport;

pub use characteristic::{Access, Characteristic};
pub use config::PublicationConfig;
pub use errors::{PayloadError, PublishError, Result};
pub use payload::ImuReading;
pub use registry::{
    Service, DEVICE_ID_CHARACTERISTIC_UUID, INERTIAL_CHARACTERISTIC_UUID,
    RANGING_CHARACTERISTIC_UUID, SENSOR_CHARACTERISTICS, SENSOR_SERVICE_UUID,
    WEIGHT_CHARACTERISTIC_UUID,
};
pub use scheduler::{
    CharacteristicHandle, PublicationScheduler, PublisherHandle, PublisherState, PublisherStats,
};
pub use sensor::{FieldSource, SensorField, SensorReadings, SensorSnapshot, SensorStore};
pub use simulation::{SensorSimulator, SensorUpdater};
pub use source::{StaticSource, ValueSource};
pub use transport::NotifySink;
