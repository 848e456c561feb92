//! Characteristic identity, access capabilities and reads

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::timeout;
use uuid::Uuid;

use crate::errors::{PublishError, Result};
use crate::source::ValueSource;

/// Default bound on a single Value Source read
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(250);

// ----------------------------------------------------------------------------
// Access Capabilities
// ----------------------------------------------------------------------------

/// Subset of {readable, subscribable} a characteristic offers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Access {
    pub read: bool,
    pub notify: bool,
}

impl Access {
    pub const READ: Access = Access {
        read: true,
        notify: false,
    };

    pub const READ_NOTIFY: Access = Access {
        read: true,
        notify: true,
    };

    /// BlueZ-style flag names, in the order they are declared
    pub fn flags(&self) -> Vec<&'static str> {
        let mut flags = Vec::with_capacity(2);
        if self.read {
            flags.push("read");
        }
        if self.notify {
            flags.push("notify");
        }
        flags
    }
}

// ----------------------------------------------------------------------------
// Characteristic
// ----------------------------------------------------------------------------

/// One addressable data point of a service
///
/// The Value Source is shared, not owned: several characteristics of one
/// service usually point at the same backing store.
pub struct Characteristic {
    uuid: Uuid,
    description: String,
    access: Access,
    source: Arc<dyn ValueSource>,
    read_timeout: Duration,
}

impl Characteristic {
    pub fn new(
        uuid: Uuid,
        description: impl Into<String>,
        access: Access,
        source: Arc<dyn ValueSource>,
    ) -> Self {
        Self {
            uuid,
            description: description.into(),
            access,
            source,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }

    /// Bound every Value Source read by `read_timeout`
    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn access(&self) -> Access {
        self.access
    }

    /// Service an inbound read request with a freshly sampled payload
    pub async fn read(&self) -> Result<Vec<u8>> {
        if !self.access.read {
            return Err(PublishError::NotPermitted {
                uuid: self.uuid,
                operation: "read",
            });
        }
        self.sample().await
    }

    /// Fetch the current payload regardless of the read capability.
    ///
    /// Used by the scheduler for pushes. Never cached.
    pub(crate) async fn sample(&self) -> Result<Vec<u8>> {
        match timeout(self.read_timeout, self.source.produce()).await {
            Ok(result) => result,
            Err(_) => Err(PublishError::source_unavailable(format!(
                "read timed out after {}ms",
                self.read_timeout.as_millis()
            ))),
        }
    }
}

impl fmt::Debug for Characteristic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Characteristic")
            .field("uuid", &self.uuid)
            .field("description", &self.description)
            .field("access", &self.access)
            .field("read_timeout", &self.read_timeout)
            .finish_non_exhaustive()
    }
}
