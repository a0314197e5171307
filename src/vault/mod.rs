//! Credential vault
//!
//! Encrypts credential payloads at rest and decrypts them on demand when
//! a session has to be created or re-authenticated.

pub mod cipher;

pub use cipher::{CredentialVault, IV_SIZE};
