//! Exponential-backoff reconnection for the live channel.
//!
//! Consumers never see reconnects; the channel task calls
//! [`reconnect`] whenever the transport drops and keeps delivering events
//! once a new connection is up.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::socket::{SocketClient, SocketConnection};

/// Tunable parameters for the backoff schedule.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}

/// Infinite iterator over the delays between reconnect attempts.
///
/// Yields `initial_delay` first, then grows by `multiplier` per step,
/// clamped to `max_delay`.
#[derive(Debug, Clone)]
pub struct Backoff {
    next: Duration,
    config: ReconnectConfig,
}

impl Backoff {
    pub fn new(config: ReconnectConfig) -> Self {
        Self {
            next: config.initial_delay.min(config.max_delay),
            config,
        }
    }
}

impl Iterator for Backoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        let current = self.next;
        let grown = Duration::from_secs_f64(current.as_secs_f64() * self.config.multiplier);
        self.next = grown.min(self.config.max_delay);
        Some(current)
    }
}

/// Reconnect with exponential backoff until a connection succeeds.
///
/// Returns `None` if `cancel` fires first.
pub async fn reconnect(
    client: &SocketClient,
    config: &ReconnectConfig,
    cancel: &CancellationToken,
) -> Option<SocketConnection> {
    for (attempt, delay) in Backoff::new(config.clone()).enumerate() {
        let attempt = attempt + 1;

        tokio::select! {
            _ = cancel.cancelled() => return None,
            _ = tokio::time::sleep(delay) => {}
        }

        tracing::info!(
            attempt,
            delay_ms = delay.as_millis() as u64,
            "Reconnecting to live channel",
        );

        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Reconnect cancelled");
                return None;
            }
            result = client.connect() => match result {
                Ok(conn) => {
                    tracing::info!(attempt, "Reconnected to live channel");
                    return Some(conn);
                }
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "Reconnect attempt failed");
                }
            }
        }
    }
    None
}
