use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use argon2::{Algorithm, Argon2, Params, Version};
use base64::{engine::general_purpose::URL_SAFE, Engine as _};

use crate::errors::CoreError;

/// Fixed salt for deriving the vault key from the application secret.
///
/// Deterministic on purpose: the same application secret must yield the same
/// key across restarts, so stored connection secrets stay decryptable without
/// a separate key-management store. The tradeoff is that key rotation is not
/// supported — changing the application secret orphans every stored secret.
const FIXED_SALT: &[u8; 16] = b"plaid_token_salt";

/// AES-GCM nonce length in bytes, prepended to every ciphertext.
const NONCE_LEN: usize = 12;

/// Argon2id parameters for key derivation.
#[derive(Debug, Clone, Copy)]
pub struct KdfParams {
    /// Memory cost in KiB (default: 65536 = 64 MB)
    pub memory_cost: u32,
    /// Number of iterations (default: 3)
    pub time_cost: u32,
    /// Degree of parallelism (default: 4)
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            memory_cost: 65_536, // 64 MB
            time_cost: 3,
            parallelism: 4,
        }
    }
}

/// Derive a 256-bit encryption key from a secret using Argon2id.
pub fn derive_key(
    secret: &str,
    salt: &[u8; 16],
    params: &KdfParams,
) -> Result<[u8; 32], CoreError> {
    let argon2_params = Params::new(
        params.memory_cost,
        params.time_cost,
        params.parallelism,
        Some(32), // output length = 256 bits
    )
    .map_err(|e| CoreError::Encryption(format!("Invalid Argon2 params: {e}")))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon2_params);

    let mut key = [0u8; 32];
    argon2
        .hash_password_into(secret.as_bytes(), salt, &mut key)
        .map_err(|e| CoreError::Encryption(format!("Argon2 key derivation failed: {e}")))?;

    Ok(key)
}

/// Generate a fresh random nonce for one encryption.
fn generate_nonce() -> Result<[u8; NONCE_LEN], CoreError> {
    let mut nonce = [0u8; NONCE_LEN];
    getrandom::getrandom(&mut nonce)
        .map_err(|e| CoreError::Encryption(format!("Failed to generate random nonce: {e}")))?;
    Ok(nonce)
}

/// Cipher protecting provider access secrets at rest.
///
/// The key is derived once, at construction, from the process-wide
/// application secret. Ciphertexts are `base64(nonce ‖ AES-256-GCM output)`
/// — the GCM tag provides integrity, so a wrong key or tampered blob fails
/// authentication rather than yielding garbage plaintext.
pub struct TokenCipher {
    key: [u8; 32],
}

impl TokenCipher {
    pub fn new(app_secret: &str) -> Result<Self, CoreError> {
        let key = derive_key(app_secret, FIXED_SALT, &KdfParams::default())?;
        Ok(Self { key })
    }

    /// Encrypt a plaintext secret. A fresh nonce is generated per call, so
    /// encrypting the same plaintext twice yields different ciphertexts.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CoreError> {
        let cipher = Aes256Gcm::new_from_slice(&self.key)
            .map_err(|e| CoreError::Encryption(format!("Failed to create cipher: {e}")))?;

        let nonce_bytes = generate_nonce()?;
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| CoreError::Encryption(format!("Encryption failed: {e}")))?;

        let mut blob = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        blob.extend_from_slice(&nonce_bytes);
        blob.extend_from_slice(&ciphertext);
        Ok(URL_SAFE.encode(blob))
    }

    /// Decrypt a stored ciphertext. Returns `CoreError::Decryption` if the
    /// blob is malformed, tampered with, or was encrypted under a different
    /// application secret.
    pub fn decrypt(&self, encoded: &str) -> Result<String, CoreError> {
        let blob = URL_SAFE.decode(encoded).map_err(|_| CoreError::Decryption)?;
        if blob.len() <= NONCE_LEN {
            return Err(CoreError::Decryption);
        }

        let (nonce_bytes, ciphertext) = blob.split_at(NONCE_LEN);
        let cipher = Aes256Gcm::new_from_slice(&self.key)
            .map_err(|e| CoreError::Encryption(format!("Failed to create cipher: {e}")))?;

        let plaintext = cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| CoreError::Decryption)?;

        String::from_utf8(plaintext).map_err(|_| CoreError::Decryption)
    }
}
