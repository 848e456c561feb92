//! Peripheral advertisement via BlueZ

use std::collections::BTreeSet;

use bluer::adv::{Advertisement, AdvertisementHandle, Feature, Type};
use bluer::Adapter;
use tracing::info;
use uuid::Uuid;

use crate::config::PeripheralConfig;
use crate::error::Result;

// ----------------------------------------------------------------------------
// Advertiser
// ----------------------------------------------------------------------------

pub(super) struct Advertiser {
    adapter: Adapter,
    handle: Option<AdvertisementHandle>,
}

impl Advertiser {
    pub fn new(adapter: Adapter) -> Self {
        Self {
            adapter,
            handle: None,
        }
    }

    /// Advertise `service_uuid` under the configured local name
    pub async fn start(&mut self, config: &PeripheralConfig, service_uuid: Uuid) -> Result<()> {
        self.stop();

        let handle = self
            .adapter
            .advertise(advertisement(config, service_uuid))
            .await?;
        self.handle = Some(handle);

        info!(
            "Advertising '{}' with service {} on {}",
            config.local_name,
            service_uuid,
            self.adapter.name()
        );
        Ok(())
    }

    pub fn stop(&mut self) {
        // Dropping the handle unregisters the advertisement
        if self.handle.take().is_some() {
            info!("Stopped BLE advertising");
        }
    }
}

fn advertisement(config: &PeripheralConfig, service_uuid: Uuid) -> Advertisement {
    let mut system_includes = BTreeSet::new();
    if config.include_tx_power {
        system_includes.insert(Feature::TxPower);
    }

    Advertisement {
        advertisement_type: Type::Peripheral,
        service_uuids: [service_uuid].into_iter().collect(),
        local_name: Some(config.local_name.clone()),
        discoverable: Some(config.discoverable),
        system_includes,
        ..Default::default()
    }
}
