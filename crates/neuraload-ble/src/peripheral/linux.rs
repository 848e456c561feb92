//! BlueZ peripheral via bluer

use std::sync::Arc;

use bluer::agent::AgentHandle;
use bluer::gatt::local::ApplicationHandle;
use bluer::{Adapter, Session};
use neuraload_core::{CharacteristicHandle, Service};
use tracing::{debug, info};

use crate::config::PeripheralConfig;
use crate::error::{BleServerError, Result};

use super::advertising::Advertiser;
use super::{agent, gatt, PeripheralSink};

// ----------------------------------------------------------------------------
// Linux Implementation
// ----------------------------------------------------------------------------

/// Running sensor peripheral; dropping it unregisters everything from BlueZ
pub struct SensorPeripheral {
    _session: Session,
    adapter: Adapter,
    agent: Option<AgentHandle>,
    application: Option<ApplicationHandle>,
    advertiser: Advertiser,
}

impl SensorPeripheral {
    /// Bring the adapter up, publish `service` and start advertising.
    ///
    /// The GATT application is registered before the advertisement goes out,
    /// so a central that connects straight away finds the full service.
    pub async fn start(
        config: &PeripheralConfig,
        service: &Service,
        handles: &[CharacteristicHandle],
        sink: Arc<PeripheralSink>,
    ) -> Result<Self> {
        config.validate()?;

        let session = Session::new()
            .await
            .map_err(|e| BleServerError::AdapterNotAvailable(format!("BlueZ session: {}", e)))?;
        let adapter = match &config.adapter_name {
            Some(name) => session.adapter(name)?,
            None => session.default_adapter().await?,
        };
        prepare_adapter(&adapter, config).await?;

        let agent = if config.register_agent {
            Some(agent::register(&session, config.trust_paired_devices).await?)
        } else {
            None
        };

        let application = adapter
            .serve_gatt_application(gatt::application(service, handles, &sink))
            .await?;
        info!(
            service = %service.uuid(),
            "Registered GATT application with {} characteristics",
            handles.len()
        );

        let mut advertiser = Advertiser::new(adapter.clone());
        advertiser.start(config, service.uuid()).await?;

        Ok(Self {
            _session: session,
            adapter,
            agent,
            application: Some(application),
            advertiser,
        })
    }

    pub fn adapter_name(&self) -> &str {
        self.adapter.name()
    }

    /// Stop advertising, then unregister the GATT application and agent
    pub async fn shutdown(mut self) {
        self.advertiser.stop();
        if self.application.take().is_some() {
            debug!("Unregistered GATT application");
        }
        if self.agent.take().is_some() {
            debug!("Unregistered pairing agent");
        }
        info!("Peripheral on {} stopped", self.adapter.name());
    }
}

async fn prepare_adapter(adapter: &Adapter, config: &PeripheralConfig) -> Result<()> {
    if !adapter.is_powered().await? {
        adapter.set_powered(true).await?;
        debug!("Powered on adapter {}", adapter.name());
    }

    if config.discoverable {
        adapter.set_discoverable_timeout(0).await?;
    }
    adapter.set_discoverable(config.discoverable).await?;
    adapter.set_pairable(config.pairable).await?;

    let address = adapter.address().await?;
    info!(
        adapter = adapter.name(),
        %address,
        discoverable = config.discoverable,
        pairable = config.pairable,
        "BLE adapter ready"
    );
    Ok(())
}
