//! Credential encryption at rest
//!
//! AES-256-GCM keyed by the SHA-256 digest of a process-wide master
//! secret. Each encryption draws a fresh 96-bit IV; blob and IV are
//! stored hex-encoded next to each other on the source record.

use crate::{
    Error, Result,
    config::VaultSettings,
    types::{Credentials, EncryptedCredentials, Source},
};
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use std::fmt;
use tracing::{debug, warn};

/// IV length in bytes
pub const IV_SIZE: usize = 12;

/// Symmetric vault for credential payloads
#[derive(Clone)]
pub struct CredentialVault {
    cipher: Aes256Gcm,
}

impl fmt::Debug for CredentialVault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialVault").finish_non_exhaustive()
    }
}

impl CredentialVault {
    /// Create a vault from a master secret
    pub fn new(master_secret: &str) -> Result<Self> {
        if master_secret.is_empty() {
            return Err(Error::config("master_key", "Master key cannot be empty"));
        }

        let key = Sha256::digest(master_secret.as_bytes());
        let cipher = Aes256Gcm::new_from_slice(&key)
            .map_err(|e| Error::config("master_key", &format!("Invalid key length: {}", e)))?;

        debug!("Credential vault initialized");
        Ok(Self { cipher })
    }

    /// Create a vault from the secret held in an environment variable
    ///
    /// Fails fast when the variable is unset or empty.
    pub fn from_env(var: &str) -> Result<Self> {
        let secret = std::env::var(var).map_err(|_| {
            Error::config(var, "Master encryption key is not set")
        })?;
        Self::new(secret.trim())
    }

    /// Create a vault using the configured environment variable
    pub fn from_settings(settings: &VaultSettings) -> Result<Self> {
        Self::from_env(&settings.master_key_env)
    }

    /// Encrypt raw bytes, returning hex-encoded `(blob, iv)`
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<(String, String)> {
        let mut iv = [0u8; IV_SIZE];
        OsRng.fill_bytes(&mut iv);

        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(&iv), plaintext)
            .map_err(|_| Error::internal("Failed to encrypt payload"))?;

        Ok((hex::encode(ciphertext), hex::encode(iv)))
    }

    /// Decrypt a hex-encoded blob/IV pair
    pub fn decrypt(&self, blob: &str, iv: &str) -> Result<Vec<u8>> {
        let iv = hex::decode(iv).map_err(|_| Error::decryption_failed("IV is not valid hex"))?;
        if iv.len() != IV_SIZE {
            return Err(Error::decryption_failed(format!(
                "IV must be {} bytes, got {}",
                IV_SIZE,
                iv.len()
            )));
        }

        let ciphertext =
            hex::decode(blob).map_err(|_| Error::decryption_failed("Blob is not valid hex"))?;

        self.cipher
            .decrypt(Nonce::from_slice(&iv), ciphertext.as_ref())
            .map_err(|_| Error::decryption_failed("Ciphertext failed authentication"))
    }

    /// Encrypt a credential payload for storage
    pub fn encrypt_credentials(&self, credentials: &Credentials) -> Result<EncryptedCredentials> {
        let plaintext = serde_json::to_vec(credentials)?;
        let (blob, iv) = self.encrypt(&plaintext)?;
        Ok(EncryptedCredentials::new(blob, iv))
    }

    /// Decrypt a stored credential payload
    pub fn decrypt_credentials(&self, encrypted: &EncryptedCredentials) -> Result<Credentials> {
        let (blob, iv) = encrypted
            .pair()
            .ok_or_else(|| Error::decryption_failed("Blob and IV must both be present"))?;

        let plaintext = self.decrypt(blob, iv)?;
        serde_json::from_slice(&plaintext)
            .map_err(|_| Error::decryption_failed("Decrypted payload is not a credential record"))
    }

    /// Decrypt the credentials stored with a source
    pub fn credentials_for(&self, source: &Source) -> Result<Credentials> {
        let Some(encrypted) = source.stored_credentials() else {
            warn!(source_id = %source.id, "No stored credentials for source");
            return Err(Error::NoCredentials {
                source_id: source.id.clone(),
            });
        };

        self.decrypt_credentials(encrypted).inspect_err(|e| {
            warn!(source_id = %source.id, error = %e, "Failed to decrypt stored credentials");
        })
    }
}
