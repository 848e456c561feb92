//! Outbound half of the Transport Adapter
//!
//! The scheduler hands finished payloads to a `NotifySink`; the sink is
//! whatever actually carries bytes to subscribed peers (a BlueZ property
//! change in production, a recorder in tests).

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::Result;

/// Delivers a new characteristic value to subscribed peers
#[async_trait]
pub trait NotifySink: Send + Sync {
    /// Push `value` for the characteristic identified by `uuid`.
    ///
    /// Returns `PublishError::DeliveryFailed` when the stack rejects the push,
    /// for example because no peer is attached any more.
    async fn notify(&self, uuid: Uuid, value: Vec<u8>) -> Result<()>;
}
