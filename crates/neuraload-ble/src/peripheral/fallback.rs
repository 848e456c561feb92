//! Fallback for platforms without peripheral support

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use neuraload_core::{CharacteristicHandle, Service};
use tracing::warn;

use crate::config::PeripheralConfig;
use crate::error::{BleServerError, Result};
use crate::notifier::NotificationSession;

use super::PeripheralSink;

// ----------------------------------------------------------------------------
// Fallback Implementation
// ----------------------------------------------------------------------------

/// No stack hands out notification sessions here
pub enum UnsupportedNotifier {}

#[async_trait]
impl NotificationSession for UnsupportedNotifier {
    fn is_closed(&self) -> bool {
        match *self {}
    }

    fn closed(&self) -> BoxFuture<'static, ()> {
        match *self {}
    }

    async fn deliver(&mut self, _value: Vec<u8>) -> std::result::Result<(), String> {
        match *self {}
    }
}

pub struct SensorPeripheral {
    _private: (),
}

impl SensorPeripheral {
    pub async fn start(
        config: &PeripheralConfig,
        service: &Service,
        _handles: &[CharacteristicHandle],
        _sink: Arc<PeripheralSink>,
    ) -> Result<Self> {
        warn!(
            "BLE peripheral mode not supported on this platform. '{}' ({}) will not be \
            discoverable. Linux with BlueZ is required.",
            config.local_name,
            service.uuid()
        );
        Err(BleServerError::Unsupported)
    }

    pub fn adapter_name(&self) -> &str {
        ""
    }

    pub async fn shutdown(self) {}
}
