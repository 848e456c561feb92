//! Central-side probe for a running sensor peripheral
//!
//! Scans for the sensor service with btleplug, connects, reads every
//! characteristic and optionally collects a few notifications. Useful for
//! checking a peripheral end to end from a second machine.

use std::collections::BTreeSet;
use std::time::Duration;

use btleplug::api::{
    Central, CentralEvent, CharPropFlags, Characteristic, Manager as _, Peripheral as _,
    ScanFilter,
};
use btleplug::platform::{Adapter, Manager, Peripheral};
use futures::stream::{Stream, StreamExt};
use tokio::time::timeout;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{BleServerError, Result};
use crate::protocol::{
    describe_payload, DEVICE_ID_CHARACTERISTIC_UUID, INERTIAL_CHARACTERISTIC_UUID,
    RANGING_CHARACTERISTIC_UUID, SENSOR_SERVICE_UUID, WEIGHT_CHARACTERISTIC_UUID,
};

/// Characteristics read by the probe, in service order
const PROBED_CHARACTERISTICS: [Uuid; 4] = [
    INERTIAL_CHARACTERISTIC_UUID,
    RANGING_CHARACTERISTIC_UUID,
    WEIGHT_CHARACTERISTIC_UUID,
    DEVICE_ID_CHARACTERISTIC_UUID,
];

// ----------------------------------------------------------------------------
// Options and Report
// ----------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ProbeOptions {
    /// How long to scan for the sensor service
    pub scan_timeout: Duration,
    /// Notifications to collect after the reads; zero skips subscribing
    pub notifications: usize,
    /// Longest wait for any single notification
    pub notification_timeout: Duration,
}

impl Default for ProbeOptions {
    fn default() -> Self {
        Self {
            scan_timeout: Duration::from_secs(10),
            notifications: 0,
            notification_timeout: Duration::from_secs(5),
        }
    }
}

impl ProbeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scan_timeout(mut self, timeout: Duration) -> Self {
        self.scan_timeout = timeout;
        self
    }

    pub fn with_notifications(mut self, count: usize) -> Self {
        self.notifications = count;
        self
    }
}

/// One value received from the peripheral
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeReading {
    pub uuid: Uuid,
    pub value: Vec<u8>,
}

impl ProbeReading {
    pub fn describe(&self) -> String {
        describe_payload(self.uuid, &self.value)
    }
}

#[derive(Debug, Clone)]
pub struct ProbeReport {
    pub local_name: Option<String>,
    pub address: String,
    pub readings: Vec<ProbeReading>,
    pub notifications: Vec<ProbeReading>,
}

// ----------------------------------------------------------------------------
// Probe
// ----------------------------------------------------------------------------

/// Find the first peripheral advertising the sensor service and inspect it
pub async fn probe(options: &ProbeOptions) -> Result<ProbeReport> {
    let manager = Manager::new().await?;
    let adapter = manager
        .adapters()
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| BleServerError::AdapterNotAvailable("No BLE adapters found".to_string()))?;

    let peripheral = find_sensor(&adapter, options.scan_timeout).await?;
    let report = inspect(&peripheral, options).await;

    if let Err(e) = peripheral.disconnect().await {
        warn!("Failed to disconnect from {}: {}", peripheral.address(), e);
    }
    report
}

async fn find_sensor(adapter: &Adapter, scan_timeout: Duration) -> Result<Peripheral> {
    let mut events = adapter.events().await?;
    adapter
        .start_scan(ScanFilter {
            services: vec![SENSOR_SERVICE_UUID],
        })
        .await?;
    info!("Scanning for sensor service {}", SENSOR_SERVICE_UUID);

    let found = timeout(scan_timeout, wait_for_sensor(adapter, &mut events)).await;

    if let Err(e) = adapter.stop_scan().await {
        warn!("Failed to stop BLE scan: {}", e);
    }

    match found {
        Ok(Ok(Some(peripheral))) => Ok(peripheral),
        Ok(Err(e)) => Err(e),
        Ok(Ok(None)) | Err(_) => Err(BleServerError::PeripheralNotFound {
            service: SENSOR_SERVICE_UUID,
            timeout_secs: scan_timeout.as_secs(),
        }),
    }
}

async fn wait_for_sensor(
    adapter: &Adapter,
    events: &mut (impl Stream<Item = CentralEvent> + Unpin),
) -> Result<Option<Peripheral>> {
    while let Some(event) = events.next().await {
        let id = match event {
            CentralEvent::DeviceDiscovered(id) | CentralEvent::DeviceUpdated(id) => id,
            _ => continue,
        };

        let peripheral = adapter.peripheral(&id).await?;
        let advertises_sensor = peripheral
            .properties()
            .await?
            .map(|props| props.services.contains(&SENSOR_SERVICE_UUID))
            .unwrap_or(false);

        if advertises_sensor {
            info!("Found sensor peripheral {}", peripheral.address());
            return Ok(Some(peripheral));
        }
    }
    Ok(None)
}

async fn inspect(peripheral: &Peripheral, options: &ProbeOptions) -> Result<ProbeReport> {
    peripheral.connect().await?;
    peripheral.discover_services().await?;
    let properties = peripheral.properties().await?;
    let characteristics = peripheral.characteristics();

    let mut readings = Vec::with_capacity(PROBED_CHARACTERISTICS.len());
    for uuid in PROBED_CHARACTERISTICS {
        let characteristic = find_characteristic(&characteristics, uuid)?;
        let value = peripheral.read(characteristic).await?;
        debug!(%uuid, "Read {}", hex::encode(&value));
        readings.push(ProbeReading { uuid, value });
    }

    let notifications = if options.notifications > 0 {
        collect_notifications(peripheral, &characteristics, options).await?
    } else {
        Vec::new()
    };

    Ok(ProbeReport {
        local_name: properties.and_then(|props| props.local_name),
        address: peripheral.address().to_string(),
        readings,
        notifications,
    })
}

fn find_characteristic(
    characteristics: &BTreeSet<Characteristic>,
    uuid: Uuid,
) -> Result<&Characteristic> {
    characteristics
        .iter()
        .find(|c| c.uuid == uuid)
        .ok_or(BleServerError::CharacteristicNotFound { uuid })
}

async fn collect_notifications(
    peripheral: &Peripheral,
    characteristics: &BTreeSet<Characteristic>,
    options: &ProbeOptions,
) -> Result<Vec<ProbeReading>> {
    let notifying: Vec<&Characteristic> = characteristics
        .iter()
        .filter(|c| c.properties.contains(CharPropFlags::NOTIFY))
        .collect();

    let mut stream = peripheral.notifications().await?;
    for characteristic in &notifying {
        peripheral.subscribe(characteristic).await?;
    }

    let mut received = Vec::with_capacity(options.notifications);
    while received.len() < options.notifications {
        match timeout(options.notification_timeout, stream.next()).await {
            Ok(Some(notification)) => received.push(ProbeReading {
                uuid: notification.uuid,
                value: notification.value,
            }),
            Ok(None) => break,
            Err(_) => {
                warn!(
                    "No notification within {}s, stopping early",
                    options.notification_timeout.as_secs()
                );
                break;
            }
        }
    }

    for characteristic in &notifying {
        if let Err(e) = peripheral.unsubscribe(characteristic).await {
            warn!(uuid = %characteristic.uuid, "Failed to unsubscribe: {}", e);
        }
    }
    Ok(received)
}

#[cfg(test)]
mod tests {
    use super::*;
    use neuraload_core::payload::encode_ranging;

    #[test]
    fn test_options_builder() {
        let options = ProbeOptions::new()
            .with_scan_timeout(Duration::from_secs(3))
            .with_notifications(5);
        assert_eq!(options.scan_timeout, Duration::from_secs(3));
        assert_eq!(options.notifications, 5);
        assert_eq!(ProbeOptions::default().notifications, 0);
    }

    #[test]
    fn test_reading_describe() {
        let reading = ProbeReading {
            uuid: RANGING_CHARACTERISTIC_UUID,
            value: encode_ranging(&[0.5, 1.0, 1.5, 2.0]),
        };
        assert_eq!(reading.describe(), "ranging=[0.500, 1.000, 1.500, 2.000] m");
    }
}
