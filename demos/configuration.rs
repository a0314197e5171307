//! Configuration example
//!
//! Shows the ways settings can be provided: defaults, environment variables
//! and a TOML configuration file.

use source_auth::{Settings, config::ConfigLoader};
use std::env;

fn main() -> anyhow::Result<()> {
    println!("Source Auth - Configuration Examples");
    println!("====================================");

    // Example 1: Default configuration
    println!("\n1. Default Configuration:");
    let defaults = Settings::default();
    println!("   Session TTL: {} seconds", defaults.session.ttl_secs);
    println!(
        "   Cleanup interval: {} seconds",
        defaults.session.cleanup_interval_secs
    );
    println!(
        "   Auth request timeout: {} seconds",
        defaults.network.request_timeout
    );
    println!("   Master key variable: {}", defaults.vault.master_key_env);

    // Example 2: Environment variable configuration
    println!("\n2. Environment Variable Configuration:");
    unsafe {
        env::set_var("SESSION_TTL", "900");
        env::set_var("AUTH_REQUEST_TIMEOUT", "5");
    }

    let loader = ConfigLoader::new();
    let env_settings = loader.from_env_only()?;
    println!(
        "   Session TTL (from SESSION_TTL): {} seconds",
        env_settings.session.ttl_secs
    );
    println!(
        "   Request timeout (from AUTH_REQUEST_TIMEOUT): {} seconds",
        env_settings.network.request_timeout
    );

    unsafe {
        env::remove_var("SESSION_TTL");
        env::remove_var("AUTH_REQUEST_TIMEOUT");
    }

    // Example 3: Configuration file
    println!("\n3. Configuration File:");
    let config_toml = r#"
[session]
ttl_secs = 1800
cleanup_interval_secs = 120
max_lifetime_secs = 28800

[network]
connect_timeout = 5
request_timeout = 10

[vault]
master_key_env = "SOURCE_AUTH_MASTER_KEY"

[logging]
level = "info"
format = "json"
"#;
    println!("{}", config_toml);

    let path = env::temp_dir().join(format!("source-auth-demo-{}.toml", std::process::id()));
    std::fs::write(&path, config_toml)?;
    let file_settings = loader.load(Some(&path))?;
    println!(
        "   Loaded TTL {}s, max lifetime {:?}s, log format {}",
        file_settings.session.ttl_secs,
        file_settings.session.max_lifetime_secs,
        file_settings.logging.format
    );
    std::fs::remove_file(&path)?;

    // Example 4: Validation
    println!("\n4. Validation:");
    let mut invalid = Settings::default();
    invalid.session.max_lifetime_secs = Some(60);
    match invalid.validate() {
        Ok(()) => println!("   Unexpectedly valid"),
        Err(e) => println!("   Rejected: {}", e),
    }

    Ok(())
}
