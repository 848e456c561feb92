//! Sensor application wiring
//!
//! Builds store -> service -> scheduler -> peripheral from an `AppConfig`
//! and tears them down in reverse order.

use std::sync::Arc;

use neuraload_ble::{PeripheralSink, SensorPeripheral};
use neuraload_core::{
    CharacteristicHandle, PublicationScheduler, SensorSimulator, SensorStore, SensorUpdater,
    Service,
};
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::error::Result;

/// The running sensor peripheral and everything it owns
pub struct SensorApp {
    config: AppConfig,
    store: Arc<SensorStore>,
    service: Service,
    sink: Arc<PeripheralSink>,
    scheduler: PublicationScheduler,
    handles: Vec<CharacteristicHandle>,
    updater: Option<SensorUpdater>,
    peripheral: Option<SensorPeripheral>,
}

impl SensorApp {
    /// Build the service and spawn its publishers. Must run inside a tokio runtime.
    pub async fn new(config: AppConfig) -> Result<Self> {
        config.validate()?;

        let store = Arc::new(SensorStore::new(config.resolve_device_id()));
        let service = Service::sensor_service(&store, &config.publication)?;

        let sink = Arc::new(PeripheralSink::new());
        let mut scheduler = PublicationScheduler::new(config.publication.clone(), sink.clone())?;
        let handles = scheduler.attach_service(&service);

        Ok(Self {
            config,
            store,
            service,
            sink,
            scheduler,
            handles,
            updater: None,
            peripheral: None,
        })
    }

    pub fn store(&self) -> &Arc<SensorStore> {
        &self.store
    }

    pub fn handles(&self) -> &[CharacteristicHandle] {
        &self.handles
    }

    /// Start feeding the store, or mark acquisition unavailable when simulation is off
    pub async fn start_acquisition(&mut self) {
        if !self.config.sensors.simulate {
            self.store
                .mark_unavailable("sensor simulation disabled and no hardware source attached")
                .await;
            return;
        }

        let simulator = match self.config.sensors.seed {
            Some(seed) => {
                info!("Simulating sensor readings with seed {}", seed);
                SensorSimulator::seeded(seed)
            }
            None => SensorSimulator::from_entropy(),
        };
        self.updater = Some(SensorUpdater::spawn(
            Arc::clone(&self.store),
            simulator,
            self.config.update_interval(),
        ));
    }

    /// Register the service with the host stack and start advertising
    pub async fn start_peripheral(&mut self) -> Result<()> {
        let peripheral = SensorPeripheral::start(
            &self.config.peripheral,
            &self.service,
            &self.handles,
            Arc::clone(&self.sink),
        )
        .await?;

        info!(
            "Sensor peripheral '{}' running on {}",
            self.config.peripheral.local_name,
            peripheral.adapter_name()
        );
        self.peripheral = Some(peripheral);
        Ok(())
    }

    /// Stop advertising, then publishers, then acquisition
    pub async fn stop(mut self) {
        if let Some(peripheral) = self.peripheral.take() {
            peripheral.shutdown().await;
        }
        self.scheduler.shutdown().await;
        if let Some(updater) = self.updater.take() {
            updater.stop().await;
        }

        let faults: u64 = self
            .handles
            .iter()
            .map(|h| h.stats().source_faults + h.stats().delivery_faults)
            .sum();
        if faults > 0 {
            warn!("{} pushes were skipped or undelivered during this run", faults);
        }
        info!("Sensor application stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServeOverrides;
    use neuraload_core::{PublisherState, WEIGHT_CHARACTERISTIC_UUID};
    use std::time::Duration;

    fn config(simulate: bool) -> AppConfig {
        let mut config = AppConfig::default();
        config
            .apply_serve_overrides(ServeOverrides {
                device_id: Some("NL-TEST".to_string()),
                seed: Some(3),
                no_simulate: !simulate,
                ..Default::default()
            })
            .unwrap();
        config
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulated_readings_are_readable() {
        let mut app = SensorApp::new(config(true)).await.unwrap();
        app.start_acquisition().await;
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(app.handles().len(), 4);
        let weight = app
            .handles()
            .iter()
            .find(|h| h.uuid() == WEIGHT_CHARACTERISTIC_UUID)
            .unwrap()
            .read()
            .await
            .unwrap();
        let value = f32::from_le_bytes([weight[0], weight[1], weight[2], weight[3]]);
        assert!((50.0..100.0).contains(&value));

        app.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_without_simulation_only_identity_is_readable() {
        let mut app = SensorApp::new(config(false)).await.unwrap();
        app.start_acquisition().await;

        let mut results = Vec::new();
        for handle in app.handles() {
            results.push(handle.read().await);
        }
        assert!(results[..3].iter().all(|r| r.is_err()));
        assert_eq!(results[3].as_ref().unwrap(), &b"NL-TEST".to_vec());
        assert!(app
            .handles()
            .iter()
            .all(|h| h.state() == PublisherState::Idle));

        app.stop().await;
    }
}
