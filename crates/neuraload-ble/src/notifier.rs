//! Outbound notification delivery
//!
//! The host stack hands out one notification session per characteristic when
//! a central enables notifications. `SessionSink` keeps the open sessions and
//! routes scheduler pushes to them; `serve_session` ties a session's lifetime
//! to the characteristic's subscription. A central may stop and re-enable
//! notifications faster than the stack reports the old session's end, so
//! every session carries a generation and only the installed one may end
//! the subscription.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use neuraload_core::{CharacteristicHandle, NotifySink, PublishError};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, warn};
use uuid::Uuid;

// ----------------------------------------------------------------------------
// Notification Session
// ----------------------------------------------------------------------------

/// One stack-provided channel for pushing values of a single characteristic
#[async_trait]
pub trait NotificationSession: Send + 'static {
    /// Whether the stack has ended this session
    fn is_closed(&self) -> bool;

    /// Resolves once the stack ends this session (StopNotify or link loss)
    fn closed(&self) -> BoxFuture<'static, ()>;

    /// Push one value to the subscribed central
    async fn deliver(&mut self, value: Vec<u8>) -> Result<(), String>;
}

#[cfg(target_os = "linux")]
#[async_trait]
impl NotificationSession for bluer::gatt::local::CharacteristicNotifier {
    fn is_closed(&self) -> bool {
        self.is_stopped()
    }

    fn closed(&self) -> BoxFuture<'static, ()> {
        use futures::FutureExt;
        self.stopped().boxed()
    }

    async fn deliver(&mut self, value: Vec<u8>) -> Result<(), String> {
        self.notify(value).await.map_err(|e| e.to_string())
    }
}

// ----------------------------------------------------------------------------
// Session Sink
// ----------------------------------------------------------------------------

struct InstalledSession<S> {
    generation: u64,
    session: Arc<Mutex<S>>,
}

/// Result of installing a session with [`SessionSink::open`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTicket {
    /// Identifies this session among all sessions ever opened on the sink
    pub generation: u64,
    /// Whether an earlier session for the same characteristic was displaced
    pub replaced: bool,
}

/// `NotifySink` backed by the currently open notification sessions.
///
/// The map lock is only held to look a session up; delivery happens under
/// that session's own lock, so a slow push on one characteristic never
/// delays another.
pub struct SessionSink<S> {
    sessions: Mutex<HashMap<Uuid, InstalledSession<S>>>,
    transitions: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
    next_generation: AtomicU64,
}

impl<S: NotificationSession> SessionSink<S> {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            transitions: Mutex::new(HashMap::new()),
            next_generation: AtomicU64::new(1),
        }
    }

    /// Install the session for `uuid`, replacing any stale one
    pub async fn open(&self, uuid: Uuid, session: S) -> SessionTicket {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let installed = InstalledSession {
            generation,
            session: Arc::new(Mutex::new(session)),
        };

        let replaced = self
            .sessions
            .lock()
            .await
            .insert(uuid, installed)
            .is_some();
        if replaced {
            debug!(%uuid, generation, "Replaced previous notification session");
        }
        SessionTicket {
            generation,
            replaced,
        }
    }

    /// Drop the session for `uuid` if it is still the one opened as
    /// `generation`; returns whether it was removed
    pub async fn close(&self, uuid: Uuid, generation: u64) -> bool {
        let mut sessions = self.sessions.lock().await;
        match sessions.get(&uuid) {
            Some(installed) if installed.generation == generation => {
                sessions.remove(&uuid);
                true
            }
            _ => false,
        }
    }

    pub async fn is_open(&self, uuid: Uuid) -> bool {
        self.sessions.lock().await.contains_key(&uuid)
    }

    /// Serializes session start and end for one characteristic
    async fn transition(&self, uuid: Uuid) -> OwnedMutexGuard<()> {
        let lock = Arc::clone(self.transitions.lock().await.entry(uuid).or_default());
        lock.lock_owned().await
    }
}

impl<S: NotificationSession> Default for SessionSink<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<S: NotificationSession> NotifySink for SessionSink<S> {
    async fn notify(&self, uuid: Uuid, value: Vec<u8>) -> neuraload_core::Result<()> {
        let session = self
            .sessions
            .lock()
            .await
            .get(&uuid)
            .map(|installed| Arc::clone(&installed.session))
            .ok_or_else(|| PublishError::delivery_failed(uuid, "no notification session"))?;

        let mut session = session.lock().await;
        // Removal is left to the session's owner, which also unsubscribes
        if session.is_closed() {
            return Err(PublishError::delivery_failed(
                uuid,
                "notification session closed",
            ));
        }

        session
            .deliver(value)
            .await
            .map_err(|reason| PublishError::delivery_failed(uuid, reason))
    }
}

// ----------------------------------------------------------------------------
// Session Lifecycle
// ----------------------------------------------------------------------------

/// Serve one notification session until the stack ends it.
///
/// Subscribes the characteristic, which pushes immediately through `sink`.
/// A session that joins an already Active characteristic (a central that
/// re-enabled notifications before the previous session's end was seen)
/// gets its immediate push through a refresh instead. When the session
/// closes it counts as a peer disconnect, unless a newer session for the
/// same characteristic has taken its place.
pub async fn serve_session<S: NotificationSession>(
    handle: CharacteristicHandle,
    sink: Arc<SessionSink<S>>,
    session: S,
) {
    let uuid = handle.uuid();
    let closed = session.closed();

    let ticket = {
        let _transition = sink.transition(uuid).await;
        let ticket = sink.open(uuid, session).await;

        let joined = match handle.subscribe().await {
            Ok(true) => Ok(()),
            Ok(false) => handle.refresh().await.map(|_| ()),
            Err(e) => Err(e),
        };
        if let Err(e) = joined {
            warn!(%uuid, "Rejecting notification session: {}", e);
            sink.close(uuid, ticket.generation).await;
            return;
        }
        ticket
    };
    info!(
        %uuid,
        generation = ticket.generation,
        "Central enabled notifications for '{}'",
        handle.description()
    );

    closed.await;

    let _transition = sink.transition(uuid).await;
    if sink.close(uuid, ticket.generation).await {
        handle.peer_disconnected().await;
    } else {
        debug!(%uuid, generation = ticket.generation, "Superseded notification session ended");
    }
}
