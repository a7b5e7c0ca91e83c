//! Bootstrap module for initializing the relay
//!
//! This module handles:
//! - Configuration loading
//! - Database initialization and migrations
//! - Service wiring

pub mod config;
pub mod database;
pub mod services;

pub use config::load_config;
pub use database::{init_database, run_migrations};
pub use services::init_relay_service;
