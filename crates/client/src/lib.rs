//! Covalent dispatcher REST and live-channel client library.
//!
//! Provides the remote data client ([`api::CovalentApi`]), the backend
//! abstraction the list store runs against ([`backend::DashboardApi`]),
//! demo-mode fixtures, and the live notification channel with its packet
//! parser and reconnection logic.

pub mod api;
pub mod backend;
pub mod channel;
pub mod error;
pub mod fixtures;
pub mod messages;
pub mod processor;
pub mod reconnect;
pub mod socket;

pub use api::CovalentApi;
pub use backend::DashboardApi;
pub use channel::{LiveChannel, LocalChannel, NoopChannel, NotificationChannel, Subscription};
pub use error::ApiError;
pub use fixtures::FixtureApi;
pub use messages::{ChannelEvent, EventName, ResultUpdate};
