//! Session management
//!
//! This module owns the session lifecycle: the in-memory store and its
//! cleanup task, translation of session data into request headers, the
//! outbound HTTP transport and the manager that ties them together.

pub mod headers;
pub mod manager;
pub mod network;
pub mod store;

pub use headers::{AuthHeaders, to_header_map, to_headers};
pub use manager::{SessionManager, SessionManagerBuilder};
pub use network::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, NetworkManager};
pub use store::{CleanupHandle, SessionStore, generate_session_id};
