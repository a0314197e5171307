//! Configuration management for the session manager
//!
//! This module handles loading and managing configuration settings
//! for session lifetimes, outbound networking, the vault and logging.

pub mod loader;
pub mod settings;

pub use loader::ConfigLoader;
pub use settings::{LoggingSettings, NetworkSettings, SessionSettings, Settings, VaultSettings};
