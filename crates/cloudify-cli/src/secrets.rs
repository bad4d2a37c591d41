use std::io::{Read, Write};
use std::path::PathBuf;

use age::secrecy::SecretString;
use age::{Decryptor, Encryptor};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SecretError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("security config {}: {source}", path.display())]
    SecurityConfig {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("no encryption key available: {0}")]
    MissingKey(String),
    #[error("crypto error: {0}")]
    Crypto(String),
}

/// Source of the key used to encrypt stored secrets.
///
/// Implementations are asked on every encrypt/decrypt call, so a provider
/// backed by a file picks up a rotated key without a restart.
pub trait KeyProvider: Send + Sync {
    fn encryption_key(&self) -> Result<String, SecretError>;
}

/// Reads `encryption_key` from the manager's JSON security config on each call.
#[derive(Debug, Clone)]
pub struct SecurityFileKeyProvider {
    path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct SecurityConfig {
    encryption_key: Option<String>,
}

impl SecurityFileKeyProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl KeyProvider for SecurityFileKeyProvider {
    fn encryption_key(&self) -> Result<String, SecretError> {
        let content = std::fs::read_to_string(&self.path)?;
        let config: SecurityConfig =
            serde_json::from_str(&content).map_err(|source| SecretError::SecurityConfig {
                path: self.path.clone(),
                source,
            })?;
        config
            .encryption_key
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                SecretError::MissingKey(format!("encryption_key not set in {}", self.path.display()))
            })
    }
}

#[derive(Debug, Clone)]
pub struct StaticKeyProvider {
    key: String,
}

impl StaticKeyProvider {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

impl KeyProvider for StaticKeyProvider {
    fn encryption_key(&self) -> Result<String, SecretError> {
        if self.key.is_empty() {
            return Err(SecretError::MissingKey("static key is empty".to_string()));
        }
        Ok(self.key.clone())
    }
}

/// Encrypt `plaintext`; an explicit `key` takes precedence over the provider.
pub fn encrypt(
    plaintext: &[u8],
    provider: &dyn KeyProvider,
    key: Option<&str>,
) -> Result<Vec<u8>, SecretError> {
    let passphrase = pick_key(provider, key)?;
    let encryptor = Encryptor::with_user_passphrase(SecretString::from(passphrase));
    let mut output = Vec::new();
    {
        let mut writer = encryptor
            .wrap_output(&mut output)
            .map_err(|err| SecretError::Crypto(err.to_string()))?;
        writer.write_all(plaintext)?;
        writer
            .finish()
            .map_err(|err| SecretError::Crypto(err.to_string()))?;
    }
    Ok(output)
}

/// Decrypt data produced by [`encrypt`]; an explicit `key` takes precedence.
pub fn decrypt(
    ciphertext: &[u8],
    provider: &dyn KeyProvider,
    key: Option<&str>,
) -> Result<Vec<u8>, SecretError> {
    let passphrase = pick_key(provider, key)?;
    let decryptor =
        Decryptor::new(ciphertext).map_err(|err| SecretError::Crypto(err.to_string()))?;
    let identity = age::scrypt::Identity::new(SecretString::from(passphrase));
    let mut reader = decryptor
        .decrypt(std::iter::once(&identity as &dyn age::Identity))
        .map_err(|err| SecretError::Crypto(err.to_string()))?;
    let mut out = Vec::new();
    reader.read_to_end(&mut out)?;
    Ok(out)
}

fn pick_key(provider: &dyn KeyProvider, key: Option<&str>) -> Result<String, SecretError> {
    match key {
        Some(key) if !key.is_empty() => Ok(key.to_string()),
        _ => provider.encryption_key(),
    }
}
