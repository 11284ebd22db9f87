//! Async driver for the query coordinator.
//!
//! [`StoreDriver::spawn`] runs one task that owns the coordinator and
//! multiplexes its inputs with `tokio::select!`:
//!
//! - intents from the view, through [`StoreHandle::send`]
//! - completions of backend calls, each executed on its own task
//! - `result-update` events from the notification channel
//! - a ticker that advances the logical clock
//! - a wake-up at the coordinator's next deadline (search commit or
//!   notice expiry), so those fire on time rather than on the next tick
//!
//! Each state change is published on a `watch` channel. Shutting the
//! handle down is the unmount: the subscription is released and the
//! ticker stops with the task.

use std::sync::Arc;

use covalent_client::{ChannelEvent, DashboardApi, EventName, NotificationChannel, Subscription};
use covalent_core::tuning::ListTuning;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::clock::Clock;
use crate::coordinator::{Command, Completion, QueryCoordinator};
use crate::error::StoreError;
use crate::intent::Intent;
use crate::state::ListState;

/// Pending intents buffered between the view and the driver task.
const INTENT_BUFFER: usize = 64;

pub struct StoreDriver {
    api: Arc<dyn DashboardApi>,
    channel: Arc<dyn NotificationChannel>,
    clock: Arc<dyn Clock>,
    tuning: ListTuning,
}

impl StoreDriver {
    pub fn new(
        api: Arc<dyn DashboardApi>,
        channel: Arc<dyn NotificationChannel>,
        clock: Arc<dyn Clock>,
        tuning: ListTuning,
    ) -> Self {
        Self {
            api,
            channel,
            clock,
            tuning,
        }
    }

    /// Start the driver task. Must be called inside a tokio runtime.
    pub fn spawn(self) -> StoreHandle {
        let (intent_tx, intent_rx) = mpsc::channel(INTENT_BUFFER);
        let coordinator = QueryCoordinator::new(self.tuning.clone(), self.clock.now());
        let (state_tx, state_rx) = watch::channel(coordinator.state().clone());
        let cancel = CancellationToken::new();

        let task_cancel = cancel.clone();
        let task = tokio::spawn(async move {
            self.run(coordinator, intent_rx, state_tx, task_cancel).await;
        });

        StoreHandle {
            intents: intent_tx,
            state: state_rx,
            cancel,
            task,
        }
    }

    async fn run(
        self,
        mut coordinator: QueryCoordinator,
        mut intents: mpsc::Receiver<Intent>,
        state_tx: watch::Sender<ListState>,
        cancel: CancellationToken,
    ) {
        let (done_tx, mut done_rx) = mpsc::unbounded_channel::<Completion>();
        let mut subscription = Some(self.channel.on(EventName::ResultUpdate));
        let mut ticker = tokio::time::interval(self.tuning.tick_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        let commands = coordinator.start(self.clock.now());
        self.execute(commands, &done_tx);
        publish(&state_tx, &coordinator);

        loop {
            let wake_in = coordinator
                .next_deadline()
                .map(|deadline| (deadline - self.clock.now()).to_std().unwrap_or_default());

            let commands = tokio::select! {
                _ = cancel.cancelled() => break,
                intent = intents.recv() => match intent {
                    Some(intent) => coordinator.handle_intent(intent, self.clock.now()),
                    None => break,
                },
                Some(completion) = done_rx.recv() => {
                    coordinator.complete(completion, self.clock.now())
                }
                event = next_event(&mut subscription) => match event {
                    Ok(ChannelEvent::ResultUpdate(update)) => {
                        coordinator.handle_notification(&update, self.clock.now())
                    }
                    Ok(_) => Vec::new(),
                    Err(RecvError::Lagged(missed)) => {
                        tracing::warn!(missed, "Live update subscriber lagged");
                        coordinator.handle_missed_notifications(self.clock.now())
                    }
                    Err(RecvError::Closed) => {
                        tracing::warn!("Live update channel closed");
                        subscription = None;
                        Vec::new()
                    }
                },
                _ = ticker.tick() => coordinator.poll(self.clock.now()),
                _ = sleep_for(wake_in) => coordinator.poll(self.clock.now()),
            };

            self.execute(commands, &done_tx);
            publish(&state_tx, &coordinator);
        }

        if let Some(subscription) = subscription.take() {
            subscription.off();
        }
        tracing::info!("Dispatch list store stopped");
    }

    /// Run each command on its own task. Completions are fed back in
    /// arrival order, which is what the stale-response rule guards.
    fn execute(&self, commands: Vec<Command>, done: &mpsc::UnboundedSender<Completion>) {
        for command in commands {
            let api = Arc::clone(&self.api);
            let done = done.clone();
            let page_size = self.tuning.page_size;
            tokio::spawn(async move {
                let completion = match command {
                    Command::FetchList { request, query } => {
                        let result = api.list_dispatches(&query, page_size).await;
                        Completion::List {
                            request,
                            query,
                            result,
                        }
                    }
                    Command::FetchOverview => Completion::Overview(api.overview().await),
                    Command::Delete { ids } => {
                        let result = api.delete_dispatches(&ids).await;
                        Completion::Delete {
                            requested: ids,
                            result,
                        }
                    }
                    Command::DeleteAll { filter } => Completion::DeleteAll(api.delete_all(filter).await),
                };
                // The driver may have stopped; late completions are dropped.
                let _ = done.send(completion);
            });
        }
    }
}

fn publish(state_tx: &watch::Sender<ListState>, coordinator: &QueryCoordinator) {
    state_tx.send_if_modified(|current| {
        if current == coordinator.state() {
            return false;
        }
        *current = coordinator.state().clone();
        true
    });
}

/// Next live event, or pending forever once the subscription is gone.
async fn next_event(subscription: &mut Option<Subscription>) -> Result<ChannelEvent, RecvError> {
    match subscription {
        Some(subscription) => subscription.recv().await,
        None => std::future::pending().await,
    }
}

/// Sleep for `wait`, or pend forever when nothing is scheduled.
async fn sleep_for(wait: Option<std::time::Duration>) {
    match wait {
        Some(wait) => tokio::time::sleep(wait).await,
        None => std::future::pending().await,
    }
}

// ---------------------------------------------------------------------------
// StoreHandle
// ---------------------------------------------------------------------------

/// View-side handle to a running store.
pub struct StoreHandle {
    intents: mpsc::Sender<Intent>,
    state: watch::Receiver<ListState>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl StoreHandle {
    pub async fn send(&self, intent: Intent) -> Result<(), StoreError> {
        self.intents
            .send(intent)
            .await
            .map_err(|_| StoreError::Closed)
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> ListState {
        self.state.borrow().clone()
    }

    /// Receiver that is notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<ListState> {
        self.state.clone()
    }

    /// Wait until `predicate` holds for the published state.
    pub async fn wait_for<F>(&self, predicate: F) -> Result<ListState, StoreError>
    where
        F: FnMut(&ListState) -> bool,
    {
        let mut rx = self.state.clone();
        let state = rx
            .wait_for(predicate)
            .await
            .map_err(|_| StoreError::Closed)?;
        Ok(state.clone())
    }

    /// Unmount: stop the driver and wait for it to release its
    /// subscription and ticker.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Dispatch list store task failed");
        }
    }
}
