//! Peripheral bring-up on the host Bluetooth stack
//!
//! Linux is served through BlueZ. Other platforms get a fallback whose
//! `start` reports that peripheral mode is unsupported.

#[cfg(target_os = "linux")]
mod advertising;
#[cfg(target_os = "linux")]
mod agent;
#[cfg(not(target_os = "linux"))]
mod fallback;
#[cfg(target_os = "linux")]
mod gatt;
#[cfg(target_os = "linux")]
mod linux;

use crate::notifier::SessionSink;

#[cfg(target_os = "linux")]
pub use linux::SensorPeripheral;

#[cfg(not(target_os = "linux"))]
pub use fallback::SensorPeripheral;

/// Notification session type handed out by the platform stack
#[cfg(target_os = "linux")]
pub type PlatformNotifier = bluer::gatt::local::CharacteristicNotifier;

#[cfg(not(target_os = "linux"))]
pub type PlatformNotifier = fallback::UnsupportedNotifier;

/// Notify sink the peripheral routes scheduler pushes through
pub type PeripheralSink = SessionSink<PlatformNotifier>;
