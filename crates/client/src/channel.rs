//! Live notification channel.
//!
//! Consumers see only [`NotificationChannel::on`] and
//! [`Subscription::off`]. Notifications are hints to refetch: delivery is
//! at-least-once and unordered with respect to REST responses.
//!
//! Three implementations share one [`EventBus`] fan-out:
//!
//! - [`LiveChannel`]: websocket connection with automatic reconnect.
//! - [`NoopChannel`]: never fires; used in demo mode.
//! - [`LocalChannel`]: fires whatever the owner emits; used to feed
//!   synthetic events in tests.

use std::sync::Mutex;

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;

use crate::messages::{ChannelEvent, EventName};
use crate::processor::{process_frames, SessionEnd};
use crate::reconnect::{reconnect, ReconnectConfig};
use crate::socket::SocketClient;

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 256;

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// In-process fan-out of decoded live events.
pub struct EventBus {
    sender: broadcast::Sender<ChannelEvent>,
}

impl EventBus {
    /// When the buffer is full the oldest events are dropped and slow
    /// subscribers observe [`RecvError::Lagged`].
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers. Dropped silently when
    /// nobody is listening.
    pub fn publish(&self, event: ChannelEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self, event: EventName) -> Subscription {
        tracing::debug!(event = event.as_str(), "Subscribed to live event");
        Subscription {
            event,
            rx: self.sender.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Subscription
// ---------------------------------------------------------------------------

/// A registered handler for one event name. Dropping it deregisters.
pub struct Subscription {
    event: EventName,
    rx: broadcast::Receiver<ChannelEvent>,
}

impl Subscription {
    pub fn event(&self) -> EventName {
        self.event
    }

    /// Wait for the next event with this subscription's name.
    ///
    /// `Err(RecvError::Lagged(n))` means `n` events were missed and the
    /// consumer should resynchronise; `Err(RecvError::Closed)` means the
    /// channel is gone for good.
    pub async fn recv(&mut self) -> Result<ChannelEvent, RecvError> {
        loop {
            let event = self.rx.recv().await?;
            if event.name() == self.event {
                return Ok(event);
            }
        }
    }

    /// Deregister.
    pub fn off(self) {
        tracing::debug!(event = self.event.as_str(), "Unsubscribed from live event");
    }
}

// ---------------------------------------------------------------------------
// NotificationChannel
// ---------------------------------------------------------------------------

pub trait NotificationChannel: Send + Sync {
    /// Register interest in `event`.
    fn on(&self, event: EventName) -> Subscription;
}

/// Channel that never fires. Subscriptions stay pending forever.
#[derive(Default)]
pub struct NoopChannel {
    bus: EventBus,
}

impl NoopChannel {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NotificationChannel for NoopChannel {
    fn on(&self, event: EventName) -> Subscription {
        self.bus.subscribe(event)
    }
}

/// Channel driven by its owner through [`LocalChannel::emit`].
#[derive(Default)]
pub struct LocalChannel {
    bus: EventBus,
}

impl LocalChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&self, event: ChannelEvent) {
        self.bus.publish(event);
    }

    /// Number of live subscriptions. Zero after every consumer called `off`.
    pub fn subscriber_count(&self) -> usize {
        self.bus.subscriber_count()
    }
}

impl NotificationChannel for LocalChannel {
    fn on(&self, event: EventName) -> Subscription {
        self.bus.subscribe(event)
    }
}

// ---------------------------------------------------------------------------
// LiveChannel
// ---------------------------------------------------------------------------

/// Websocket-backed channel with a background connection task.
///
/// Created with [`LiveChannel::start`]; the task connects, processes
/// frames and reconnects with backoff until [`LiveChannel::shutdown`].
pub struct LiveChannel {
    bus: std::sync::Arc<EventBus>,
    cancel: CancellationToken,
    task: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl LiveChannel {
    /// Spawn the connection task. Must be called inside a tokio runtime.
    pub fn start(client: SocketClient, reconnect_config: ReconnectConfig) -> Self {
        let bus = std::sync::Arc::new(EventBus::default());
        let cancel = CancellationToken::new();

        let task_bus = std::sync::Arc::clone(&bus);
        let task_cancel = cancel.clone();
        let task = tokio::spawn(async move {
            tracing::info!(url = %client.socket_url(), "Starting live channel task");
            run_connection_loop(&client, &reconnect_config, &task_bus, &task_cancel).await;
            tracing::info!("Live channel task exited");
        });

        Self {
            bus,
            cancel,
            task: Mutex::new(Some(task)),
        }
    }

    /// Stop the connection task, waiting up to 5 seconds for a clean exit.
    pub async fn shutdown(&self) {
        tracing::info!("Shutting down live channel");
        self.cancel.cancel();
        let task = self
            .task
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(task) = task {
            let _ = tokio::time::timeout(std::time::Duration::from_secs(5), task).await;
        }
    }
}

impl NotificationChannel for LiveChannel {
    fn on(&self, event: EventName) -> Subscription {
        self.bus.subscribe(event)
    }
}

impl Drop for LiveChannel {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Connect, process frames, reconnect; until cancelled.
async fn run_connection_loop(
    client: &SocketClient,
    config: &ReconnectConfig,
    bus: &EventBus,
    cancel: &CancellationToken,
) {
    let mut conn = match client.connect().await {
        Ok(conn) => conn,
        Err(e) => {
            tracing::warn!(error = %e, "Live channel connection failed, entering reconnect loop");
            match reconnect(client, config, cancel).await {
                Some(conn) => conn,
                None => return,
            }
        }
    };

    loop {
        match process_frames(conn, bus, cancel).await {
            SessionEnd::Cancelled => return,
            SessionEnd::Closed => tracing::info!("Live channel closed, reconnecting"),
            SessionEnd::Dropped(reason) => {
                tracing::warn!(%reason, "Live channel lost, reconnecting");
            }
        }

        conn = match reconnect(client, config, cancel).await {
            Some(conn) => conn,
            None => return,
        };
    }
}
