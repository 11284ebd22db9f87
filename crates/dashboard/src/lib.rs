//! Terminal dispatch dashboard.
//!
//! [`view`] projects the list store's state into a renderable view model,
//! [`commands`] parses the line commands typed by the user and [`config`]
//! loads the environment.

pub mod commands;
pub mod config;
pub mod view;
