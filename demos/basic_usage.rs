//! Basic usage example
//!
//! Encrypts credentials for a source, opens a session, prints the headers
//! the fetch pipeline would send and tears the session down again.
//!
//! Run with `SOURCE_AUTH_MASTER_KEY` set.

use source_auth::{
    ConfigLoader, SessionManager,
    types::{Credentials, Source, keys},
    utils::init_tracing,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = ConfigLoader::new().load(None)?;
    init_tracing(&settings.logging)?;

    let manager = SessionManager::from_settings(settings)?;
    let cleanup = manager.start_cleanup();

    // Credentials are stored encrypted on the source record
    let stored = manager
        .vault()
        .encrypt_credentials(&Credentials::login("reader", "correct-horse"))?;
    let source = Source::new("archive", "Newspaper Archive")
        .with_authentication(true)
        .with_metadata(keys::AUTH_TYPE, "basic")
        .with_credentials(stored);

    match manager.create_session(&source, None).await {
        Ok(info) => {
            println!("Session created:");
            println!("  id: {}", info.session_id);
            println!("  auth type: {}", info.auth_type);
            println!("  expires at: {}", info.expires_at);

            if let Some(headers) = manager.get_auth_headers(&info.session_id).await {
                for name in headers.keys() {
                    println!("  header: {}", name);
                }
            }

            let refreshed = manager.refresh_session(&info.session_id, &source).await?;
            println!("Refreshed, now expires at {}", refreshed.expires_at);

            manager.delete_session(&info.session_id).await;
        }
        Err(e) => {
            eprintln!("Failed to create session: {}", e);
            std::process::exit(1);
        }
    }

    cleanup.stop().await;
    Ok(())
}
