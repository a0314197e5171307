//! Source Authentication Session Manager
//!
//! Turns encrypted, at-rest credentials for external content sources into
//! live authentication context for outbound requests, and manages that
//! context through creation, expiry, refresh and teardown.
//!
//! # Features
//!
//! - **Five Protocols**: basic, bearer (client credentials), API key,
//!   cookie form login and pre-obtained OAuth tokens
//! - **Encrypted Credentials**: AES-256-GCM vault keyed from a process-wide secret
//! - **Self-Healing Sessions**: expired tokens and stale cookies are renewed
//!   on refresh without operator intervention
//! - **Header Translation**: session data maps straight onto request headers
//! - **Background Cleanup**: cancellable sweep of expired sessions
//!
//! # Architecture
//!
//! - [`vault`]: credential encryption at rest
//! - [`strategy`]: one authentication strategy per protocol
//! - [`session`]: store, header translation, HTTP transport and the manager
//! - [`config`]: settings from file and environment
//!
//! # Examples
//!
//! ```rust,no_run
//! use source_auth::{SessionManager, Settings};
//! use source_auth::types::{Credentials, Source, keys};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let manager = SessionManager::from_settings(Settings::default())?;
//! let _cleanup = manager.start_cleanup();
//!
//! let source = Source::new("archive", "Archive")
//!     .with_authentication(true)
//!     .with_metadata(keys::AUTH_TYPE, "basic");
//!
//! let info = manager
//!     .create_session(&source, Some(Credentials::login("user", "secret")))
//!     .await?;
//! let headers = manager.get_auth_headers(&info.session_id).await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod session;
pub mod strategy;
pub mod types;
pub mod utils;
pub mod vault;

pub use config::{ConfigLoader, Settings};
pub use error::{Error, ErrorCategory, Result};
pub use session::{AuthHeaders, SessionManager, SessionManagerBuilder};
pub use types::{AuthType, Credentials, Session, SessionData, SessionInfo, Source};
pub use vault::CredentialVault;
