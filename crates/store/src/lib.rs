//! Dispatch list state store and query coordination.
//!
//! The [`state::ListState`] container is mutated only by the pure
//! [`reducer::reduce`] over serializable [`action::ListAction`]s. The
//! sans-IO [`coordinator::QueryCoordinator`] decides which actions to
//! apply and which backend calls to make; [`driver::StoreDriver`] runs it
//! against a [`DashboardApi`](covalent_client::DashboardApi) and a live
//! notification channel.

pub mod action;
pub mod clock;
pub mod cooldown;
pub mod coordinator;
pub mod debounce;
pub mod driver;
pub mod error;
pub mod intent;
pub mod reducer;
pub mod state;
pub mod timer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use coordinator::{Command, Completion, QueryCoordinator};
pub use driver::{StoreDriver, StoreHandle};
pub use error::StoreError;
pub use intent::Intent;
pub use state::{FetchError, ListState};
