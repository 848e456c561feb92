//! Publication Scheduler
//!
//! Every subscribable characteristic gets its own publisher task. The task
//! owns the characteristic's subscription state and is the only place that
//! state changes:
//!
//! ```text
//!   Idle  --subscribe-->   Active   (immediate push)
//!   Active --unsubscribe--> Idle    (no push)
//!   Active --tick-->        Active  (push)
//!   Idle  --tick-->         Idle    (ticker not polled)
//!   Active --refresh-->     Active  (out-of-cadence push)
//! ```
//!
//! Inbound requests reach the task as commands over a channel, so concurrent
//! subscribe/unsubscribe calls for one characteristic are serialized. Pushes
//! run inline in the task, so two pushes for the same characteristic never
//! overlap. A slow Value Source or stack only holds up its own publisher.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, timeout, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::characteristic::{Access, Characteristic};
use crate::config::PublicationConfig;
use crate::errors::{PublishError, Result};
use crate::registry::Service;
use crate::transport::NotifySink;

// ----------------------------------------------------------------------------
// Publisher State
// ----------------------------------------------------------------------------

/// Scheduler's view of one characteristic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublisherState {
    /// Not subscribed; ticks do nothing
    Idle,
    /// Subscribed; every tick samples and pushes
    Active,
}

/// Counters kept by a publisher task
#[derive(Debug, Default)]
struct PublisherCounters {
    pushes: AtomicU64,
    source_faults: AtomicU64,
    delivery_faults: AtomicU64,
}

/// Point-in-time copy of a publisher's counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublisherStats {
    pub pushes: u64,
    pub source_faults: u64,
    pub delivery_faults: u64,
}

enum PublisherCommand {
    Subscribe { reply: oneshot::Sender<bool> },
    Unsubscribe { reply: oneshot::Sender<bool> },
    Refresh { reply: oneshot::Sender<bool> },
    Shutdown,
}

// ----------------------------------------------------------------------------
// Publisher Task
// ----------------------------------------------------------------------------

struct Publisher {
    characteristic: Arc<Characteristic>,
    sink: Arc<dyn NotifySink>,
    commands: mpsc::UnboundedReceiver<PublisherCommand>,
    state: watch::Sender<PublisherState>,
    counters: Arc<PublisherCounters>,
    interval: Duration,
    delivery_timeout: Duration,
}

impl Publisher {
    async fn run(mut self) {
        let uuid = self.characteristic.uuid();
        debug!(%uuid, "Publisher task starting");

        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let active = *self.state.borrow() == PublisherState::Active;

            tokio::select! {
                // Commands win over a tick that is ready at the same instant
                biased;

                command = self.commands.recv() => match command {
                    Some(PublisherCommand::Subscribe { reply }) => {
                        if !active {
                            self.state.send_replace(PublisherState::Active);
                            info!(%uuid, "Subscription started");
                            self.push().await;
                            // Next tick is one full interval after the immediate push
                            ticker.reset();
                        }
                        let _ = reply.send(!active);
                    }
                    Some(PublisherCommand::Unsubscribe { reply }) => {
                        if active {
                            self.state.send_replace(PublisherState::Idle);
                            info!(%uuid, "Subscription stopped");
                        }
                        let _ = reply.send(active);
                    }
                    Some(PublisherCommand::Refresh { reply }) => {
                        if active {
                            self.push().await;
                            ticker.reset();
                        }
                        let _ = reply.send(active);
                    }
                    Some(PublisherCommand::Shutdown) | None => break,
                },

                _ = ticker.tick(), if active => {
                    self.push().await;
                }
            }
        }

        self.state.send_replace(PublisherState::Idle);
        debug!(%uuid, "Publisher task stopped");
    }

    /// Sample the characteristic and hand the payload to the sink.
    ///
    /// Faults are logged and counted; the publisher keeps running.
    async fn push(&self) {
        let uuid = self.characteristic.uuid();

        let value = match self.characteristic.sample().await {
            Ok(value) => value,
            Err(e) => {
                self.counters.source_faults.fetch_add(1, Ordering::Relaxed);
                warn!(%uuid, "Skipping push: {}", e);
                return;
            }
        };

        let len = value.len();
        match timeout(self.delivery_timeout, self.sink.notify(uuid, value)).await {
            Ok(Ok(())) => {
                self.counters.pushes.fetch_add(1, Ordering::Relaxed);
                debug!(%uuid, "Pushed {} bytes", len);
            }
            Ok(Err(e)) => {
                self.counters.delivery_faults.fetch_add(1, Ordering::Relaxed);
                warn!(%uuid, "Push not delivered: {}", e);
            }
            Err(_) => {
                self.counters.delivery_faults.fetch_add(1, Ordering::Relaxed);
                warn!(
                    %uuid,
                    "Push not delivered: timed out after {}ms",
                    self.delivery_timeout.as_millis()
                );
            }
        }
    }
}

// ----------------------------------------------------------------------------
// Publisher Handle
// ----------------------------------------------------------------------------

/// Inbound control surface for one publisher task
#[derive(Clone)]
pub struct PublisherHandle {
    uuid: Uuid,
    commands: mpsc::UnboundedSender<PublisherCommand>,
    state: watch::Receiver<PublisherState>,
    counters: Arc<PublisherCounters>,
}

impl PublisherHandle {
    /// Start publishing. Returns `true` only on the Idle -> Active transition.
    pub async fn subscribe(&self) -> Result<bool> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(PublisherCommand::Subscribe { reply })
            .map_err(|_| PublishError::SchedulerStopped { uuid: self.uuid })?;
        response
            .await
            .map_err(|_| PublishError::SchedulerStopped { uuid: self.uuid })
    }

    /// Stop publishing. Idempotent; returns whether a subscription was active.
    pub async fn unsubscribe(&self) -> bool {
        let (reply, response) = oneshot::channel();
        if self
            .commands
            .send(PublisherCommand::Unsubscribe { reply })
            .is_err()
        {
            // A stopped publisher pushes nothing, which is what Idle means
            return false;
        }
        response.await.unwrap_or(false)
    }

    /// Push the current value now if Active, restarting the interval.
    /// Returns whether a push ran.
    pub async fn refresh(&self) -> Result<bool> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(PublisherCommand::Refresh { reply })
            .map_err(|_| PublishError::SchedulerStopped { uuid: self.uuid })?;
        response
            .await
            .map_err(|_| PublishError::SchedulerStopped { uuid: self.uuid })
    }

    /// The stack reported that the subscribing peer went away
    pub async fn peer_disconnected(&self) {
        if self.unsubscribe().await {
            info!(uuid = %self.uuid, "Subscriber disconnected, publisher now idle");
        }
    }

    pub fn state(&self) -> PublisherState {
        *self.state.borrow()
    }

    pub fn stats(&self) -> PublisherStats {
        PublisherStats {
            pushes: self.counters.pushes.load(Ordering::Relaxed),
            source_faults: self.counters.source_faults.load(Ordering::Relaxed),
            delivery_faults: self.counters.delivery_faults.load(Ordering::Relaxed),
        }
    }
}

// ----------------------------------------------------------------------------
// Characteristic Handle
// ----------------------------------------------------------------------------

/// What the Transport Adapter holds for each registered characteristic
#[derive(Clone)]
pub struct CharacteristicHandle {
    characteristic: Arc<Characteristic>,
    publisher: Option<PublisherHandle>,
}

impl CharacteristicHandle {
    pub fn uuid(&self) -> Uuid {
        self.characteristic.uuid()
    }

    pub fn description(&self) -> &str {
        self.characteristic.description()
    }

    pub fn access(&self) -> Access {
        self.characteristic.access()
    }

    pub async fn read(&self) -> Result<Vec<u8>> {
        self.characteristic.read().await
    }

    /// Returns `true` when this call moved the characteristic to `Active`
    pub async fn subscribe(&self) -> Result<bool> {
        match &self.publisher {
            Some(publisher) => publisher.subscribe().await,
            None => Err(PublishError::NotPermitted {
                uuid: self.uuid(),
                operation: "notify",
            }),
        }
    }

    /// Out-of-cadence push for a subscriber that joined an Active
    /// characteristic; `false` when nothing was pushed
    pub async fn refresh(&self) -> Result<bool> {
        match &self.publisher {
            Some(publisher) => publisher.refresh().await,
            None => Err(PublishError::NotPermitted {
                uuid: self.uuid(),
                operation: "notify",
            }),
        }
    }

    /// Always succeeds; a no-op when not subscribed
    pub async fn unsubscribe(&self) {
        if let Some(publisher) = &self.publisher {
            publisher.unsubscribe().await;
        }
    }

    /// Implicit unsubscribe triggered by the stack on link loss
    pub async fn peer_disconnected(&self) {
        if let Some(publisher) = &self.publisher {
            publisher.peer_disconnected().await;
        }
    }

    pub fn state(&self) -> PublisherState {
        self.publisher
            .as_ref()
            .map(PublisherHandle::state)
            .unwrap_or(PublisherState::Idle)
    }

    pub fn stats(&self) -> PublisherStats {
        self.publisher
            .as_ref()
            .map(PublisherHandle::stats)
            .unwrap_or_default()
    }
}

// ----------------------------------------------------------------------------
// Scheduler
// ----------------------------------------------------------------------------

/// Spawns and supervises publisher tasks
pub struct PublicationScheduler {
    config: PublicationConfig,
    sink: Arc<dyn NotifySink>,
    publishers: Vec<(PublisherHandle, JoinHandle<()>)>,
}

impl PublicationScheduler {
    pub fn new(config: PublicationConfig, sink: Arc<dyn NotifySink>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            sink,
            publishers: Vec::new(),
        })
    }

    /// Wrap one characteristic, spawning a publisher if it is subscribable.
    ///
    /// Must be called from within a tokio runtime.
    pub fn attach(&mut self, characteristic: Arc<Characteristic>) -> CharacteristicHandle {
        if !characteristic.access().notify {
            return CharacteristicHandle {
                characteristic,
                publisher: None,
            };
        }

        let uuid = characteristic.uuid();
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(PublisherState::Idle);
        let counters = Arc::new(PublisherCounters::default());

        let publisher = Publisher {
            characteristic: Arc::clone(&characteristic),
            sink: Arc::clone(&self.sink),
            commands: command_rx,
            state: state_tx,
            counters: Arc::clone(&counters),
            interval: self.config.interval(),
            delivery_timeout: self.config.delivery_timeout(),
        };
        let task = tokio::spawn(publisher.run());

        let handle = PublisherHandle {
            uuid,
            commands: command_tx,
            state: state_rx,
            counters,
        };
        self.publishers.push((handle.clone(), task));

        CharacteristicHandle {
            characteristic,
            publisher: Some(handle),
        }
    }

    /// Attach every characteristic of `service`, in registration order
    pub fn attach_service(&mut self, service: &Service) -> Vec<CharacteristicHandle> {
        let handles: Vec<_> = service
            .characteristics()
            .iter()
            .map(|characteristic| self.attach(Arc::clone(characteristic)))
            .collect();

        info!(
            service = %service.uuid(),
            "Scheduling {} characteristics ({} publishers)",
            handles.len(),
            self.publishers.len()
        );
        handles
    }

    pub fn publisher_count(&self) -> usize {
        self.publishers.len()
    }

    /// Stop every publisher. Pending ticks are dropped; a push already in
    /// flight is allowed to finish within the shutdown grace period.
    pub async fn shutdown(&mut self) {
        if self.publishers.is_empty() {
            return;
        }
        info!("Stopping {} publishers", self.publishers.len());

        for (handle, _) in &self.publishers {
            let _ = handle.commands.send(PublisherCommand::Shutdown);
        }

        let deadline = Instant::now() + self.config.shutdown_timeout();
        for (handle, mut task) in self.publishers.drain(..) {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if timeout(remaining, &mut task).await.is_err() {
                warn!(uuid = %handle.uuid, "Publisher did not stop in time, aborting");
                task.abort();
            }
        }

        info!("All publishers stopped");
    }
}

impl Drop for PublicationScheduler {
    fn drop(&mut self) {
        for (_, task) in self.publishers.drain(..) {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::StaticSource;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        pushes: Mutex<Vec<(Uuid, Vec<u8>)>>,
    }

    impl RecordingSink {
        fn count(&self) -> usize {
            self.pushes.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl NotifySink for RecordingSink {
        async fn notify(&self, uuid: Uuid, value: Vec<u8>) -> Result<()> {
            self.pushes.lock().unwrap().push((uuid, value));
            Ok(())
        }
    }

    fn scheduler(sink: Arc<RecordingSink>) -> PublicationScheduler {
        PublicationScheduler::new(PublicationConfig::default(), sink).unwrap()
    }

    fn notify_characteristic(id: u128) -> Arc<Characteristic> {
        Arc::new(Characteristic::new(
            Uuid::from_u128(id),
            "test",
            Access::READ_NOTIFY,
            Arc::new(StaticSource::new(vec![id as u8])),
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribe_pushes_once_immediately() {
        let sink = Arc::new(RecordingSink::default());
        let mut scheduler = scheduler(sink.clone());
        let handle = scheduler.attach(notify_characteristic(1));

        assert_eq!(handle.state(), PublisherState::Idle);
        assert!(handle.subscribe().await.unwrap());
        assert_eq!(handle.state(), PublisherState::Active);
        assert_eq!(sink.count(), 1);

        // Second subscribe is not a transition and does not push
        assert!(!handle.subscribe().await.unwrap());
        assert_eq!(sink.count(), 1);

        scheduler.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_follow_interval_after_subscribe() {
        let sink = Arc::new(RecordingSink::default());
        let mut scheduler = scheduler(sink.clone());
        let handle = scheduler.attach(notify_characteristic(2));

        handle.subscribe().await.unwrap();
        tokio::time::sleep(Duration::from_millis(999)).await;
        assert_eq!(sink.count(), 1);

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(sink.count(), 2);

        tokio::time::sleep(Duration::from_millis(2000)).await;
        assert_eq!(sink.count(), 4);
        assert_eq!(handle.stats().pushes, 4);

        scheduler.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_unsubscribe_cancels_pending_ticks() {
        let sink = Arc::new(RecordingSink::default());
        let mut scheduler = scheduler(sink.clone());
        let handle = scheduler.attach(notify_characteristic(3));

        handle.subscribe().await.unwrap();
        handle.unsubscribe().await;
        handle.unsubscribe().await;
        assert_eq!(handle.state(), PublisherState::Idle);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(sink.count(), 1);

        scheduler.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_pushes_only_while_active() {
        let sink = Arc::new(RecordingSink::default());
        let mut scheduler = scheduler(sink.clone());
        let handle = scheduler.attach(notify_characteristic(6));

        assert!(!handle.refresh().await.unwrap());
        assert_eq!(sink.count(), 0);

        handle.subscribe().await.unwrap();
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert!(handle.refresh().await.unwrap());
        assert_eq!(sink.count(), 2);

        // Interval restarts from the refresh, not from the subscribe
        tokio::time::sleep(Duration::from_millis(999)).await;
        assert_eq!(sink.count(), 2);
        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(sink.count(), 3);

        scheduler.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_only_characteristic_has_no_publisher() {
        let sink = Arc::new(RecordingSink::default());
        let mut scheduler = scheduler(sink.clone());
        let handle = scheduler.attach(Arc::new(Characteristic::new(
            Uuid::from_u128(4),
            "id",
            Access::READ,
            Arc::new(StaticSource::new(b"NL".to_vec())),
        )));

        assert_eq!(scheduler.publisher_count(), 0);
        assert!(matches!(
            handle.subscribe().await,
            Err(PublishError::NotPermitted { operation: "notify", .. })
        ));
        handle.unsubscribe().await;
        assert_eq!(handle.read().await.unwrap(), b"NL".to_vec());
        assert_eq!(sink.count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribe_after_shutdown_fails() {
        let sink = Arc::new(RecordingSink::default());
        let mut scheduler = scheduler(sink.clone());
        let handle = scheduler.attach(notify_characteristic(5));

        scheduler.shutdown().await;
        assert!(matches!(
            handle.subscribe().await,
            Err(PublishError::SchedulerStopped { .. })
        ));
        assert_eq!(handle.state(), PublisherState::Idle);
        handle.unsubscribe().await;
    }

    #[test]
    fn test_invalid_config_rejected() {
        let sink = Arc::new(RecordingSink::default());
        let config = PublicationConfig::default().with_interval(Duration::ZERO);
        assert!(PublicationScheduler::new(config, sink).is_err());
    }
}
