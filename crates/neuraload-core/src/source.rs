//! Value Source capability
//!
//! A Value Source produces the current binary payload for one characteristic
//! on demand. Sources are owned outside the characteristic and shared by
//! reference, so implementations must tolerate concurrent calls.

use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::Result;

// ----------------------------------------------------------------------------
// Value Source Trait
// ----------------------------------------------------------------------------

/// Produces a fresh payload every time it is asked
#[async_trait]
pub trait ValueSource: Send + Sync {
    /// Return the latest payload, or `PublishError::SourceUnavailable`
    async fn produce(&self) -> Result<Vec<u8>>;
}

#[async_trait]
impl<T: ValueSource + ?Sized> ValueSource for Arc<T> {
    async fn produce(&self) -> Result<Vec<u8>> {
        (**self).produce().await
    }
}

/// A source that always yields the same bytes
#[derive(Debug, Clone)]
pub struct StaticSource {
    value: Vec<u8>,
}

impl StaticSource {
    pub fn new(value: impl Into<Vec<u8>>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

#[async_trait]
impl ValueSource for StaticSource {
    async fn produce(&self) -> Result<Vec<u8>> {
        Ok(self.value.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_source_through_arc() {
        let source: Arc<dyn ValueSource> = Arc::new(StaticSource::new(b"abc".to_vec()));
        assert_eq!(source.produce().await.unwrap(), b"abc".to_vec());
        assert_eq!(source.produce().await.unwrap(), b"abc".to_vec());
    }
}
