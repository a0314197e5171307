//! Version information utilities

/// Library version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get the current library version
pub fn get_version() -> &'static str {
    VERSION
}

/// Version with build metadata, when provided at compile time
pub fn get_detailed_version() -> String {
    let git_hash = option_env!("GIT_HASH").unwrap_or("unknown");
    format!("{} ({})", get_version(), git_hash)
}
