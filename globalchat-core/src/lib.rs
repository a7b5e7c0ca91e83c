//! Core of a global chat relay: bridges independent chat rooms into a shared
//! broadcast network. A message posted in any subscribed room is mirrored,
//! attributed to its original author, into every other subscribed room.

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod repository;
pub mod service;

#[cfg(test)]
pub mod test_helpers;

pub use config::Config;
pub use error::{Error, Result};
pub use gateway::ChatGateway;
pub use service::{RelayOutcome, RelayService};
