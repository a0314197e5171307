//! Type definitions for the session manager
//!
//! This module contains the main data structures used for inputs, session
//! records and responses.

pub mod auth_type;
pub mod internal;
pub mod request;
pub mod response;

pub use auth_type::{AuthType, UnknownAuthType};
pub use internal::{DEFAULT_TOKEN_TYPE, Session, SessionData};
pub use request::{Credentials, EncryptedCredentials, Source, keys};
pub use response::{SessionInfo, SessionResponse};
