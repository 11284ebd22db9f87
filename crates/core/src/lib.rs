//! Covalent dashboard domain model.
//!
//! Zero internal deps: dispatch records and their status state machine,
//! list query rules, runtime derivation, endpoint payload types and the
//! tuning constants shared by the client, store and view crates.

pub mod dispatch;
pub mod error;
pub mod logs;
pub mod query;
pub mod runtime;
pub mod settings;
pub mod status;
pub mod timestamp;
pub mod tuning;
pub mod types;
