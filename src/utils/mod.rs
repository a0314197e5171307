//! Utility functions and helpers
//!
//! This module contains utility functions used throughout the library.

pub mod logging;
pub mod version;

pub use logging::init_tracing;
pub use version::{VERSION, get_version};
