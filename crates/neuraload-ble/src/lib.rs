//! Bluetooth Low Energy transport for the NeuraLoad sensor service
//!
//! This crate is the Transport Adapter between `neuraload-core` and the host
//! Bluetooth stack:
//!
//! - [`config`] - how the peripheral presents itself
//! - [`error`] - errors raised during bring-up and probing
//! - [`protocol`] - GATT constants and payload helpers
//! - [`notifier`] - routing of scheduler pushes to notification sessions
//! - [`peripheral`] - BlueZ bring-up: adapter, agent, GATT application, advertisement
//! - [`probe`] - btleplug central that reads a running peripheral
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use neuraload_ble::{PeripheralConfig, PeripheralSink, SensorPeripheral};
//! use neuraload_core::{PublicationConfig, PublicationScheduler, SensorStore, Service};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let publication = PublicationConfig::default();
//! let store = Arc::new(SensorStore::new("NL-0001"));
//! let service = Service::sensor_service(&store, &publication)?;
//!
//! let sink = Arc::new(PeripheralSink::new());
//! let mut scheduler = PublicationScheduler::new(publication, sink.clone())?;
//! let handles = scheduler.attach_service(&service);
//!
//! let peripheral =
//!     SensorPeripheral::start(&PeripheralConfig::default(), &service, &handles, sink).await?;
//!
//! // ... later
//! peripheral.shutdown().await;
//! scheduler.shutdown().await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Platform Support
//!
//! - **Linux**: peripheral mode via `bluer` (BlueZ), probe via `btleplug`
//! - **Other platforms**: probe only; `SensorPeripheral::start` returns
//!   `BleServerError::Unsupported`

pub mod config;
pub mod error;
pub mod notifier;
pub mod peripheral;
pub mod probe;
pub mod protocol;

pub use config::PeripheralConfig;
pub use error::{BleServerError, Result};
pub use notifier::{serve_session, NotificationSession, SessionSink, SessionTicket};
pub use peripheral::{PeripheralSink, PlatformNotifier, SensorPeripheral};
pub use probe::{probe, ProbeOptions, ProbeReading, ProbeReport};
pub use protocol::{describe_payload, DEFAULT_LOCAL_NAME, USER_DESCRIPTION_DESCRIPTOR_UUID};
