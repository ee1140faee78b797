use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use argon2::{Algorithm, Argon2, Params, Version};
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// Argon2id cost parameters.
///
/// Used both for deriving the database file key (stored in the file header)
/// and for hashing account passwords (stored in `Settings`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    /// Memory cost in KiB
    pub memory_cost: u32,
    /// Number of iterations
    pub time_cost: u32,
    /// Degree of parallelism
    pub parallelism: u32,
}

impl Default for KdfParams {
    /// File-key parameters: 64 MiB, 3 passes, 4 lanes.
    fn default() -> Self {
        Self {
            memory_cost: 65_536,
            time_cost: 3,
            parallelism: 4,
        }
    }
}

impl KdfParams {
    /// Interactive-login parameters (the argon2 crate's defaults: 19 MiB, 2 passes, 1 lane).
    #[must_use]
    pub fn password_default() -> Self {
        Self {
            memory_cost: Params::DEFAULT_M_COST,
            time_cost: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }

    /// Build an Argon2id hasher with these costs.
    ///
    /// `output_len` is `Some(32)` for key derivation and `None` for PHC hashes.
    pub fn hasher(&self, output_len: Option<usize>) -> Result<Argon2<'static>, CoreError> {
        let params = Params::new(
            self.memory_cost,
            self.time_cost,
            self.parallelism,
            output_len,
        )
        .map_err(|e| CoreError::Encryption(format!("Invalid Argon2 params: {e}")))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

/// Derive a 256-bit file key from a password and the per-file salt.
pub fn derive_key(password: &str, salt: &[u8; 16], params: &KdfParams) -> Result<[u8; 32], CoreError> {
    let mut key = [0u8; 32];
    params
        .hasher(Some(32))?
        .hash_password_into(password.as_bytes(), salt, &mut key)
        .map_err(|e| CoreError::Encryption(format!("Argon2 key derivation failed: {e}")))?;
    Ok(key)
}

/// AES-256-GCM sealing with a derived key.
pub struct Cipher {
    inner: Aes256Gcm,
}

impl Cipher {
    pub fn new(key: &[u8; 32]) -> Result<Self, CoreError> {
        let inner = Aes256Gcm::new_from_slice(key)
            .map_err(|e| CoreError::Encryption(format!("Failed to create cipher: {e}")))?;
        Ok(Self { inner })
    }

    /// Encrypt `plaintext`; the 16-byte auth tag is appended to the output.
    pub fn seal(&self, plaintext: &[u8], nonce: &[u8; 12]) -> Result<Vec<u8>, CoreError> {
        self.inner
            .encrypt(Nonce::from_slice(nonce), plaintext)
            .map_err(|e| CoreError::Encryption(format!("Encryption failed: {e}")))
    }

    /// Decrypt and authenticate. Any failure is reported as `CoreError::Decryption`.
    pub fn open(&self, ciphertext: &[u8], nonce: &[u8; 12]) -> Result<Vec<u8>, CoreError> {
        Ok(self.inner.decrypt(Nonce::from_slice(nonce), ciphertext)?)
    }
}

/// Fill an `N`-byte array from the OS CSPRNG (salts, nonces).
pub fn random_bytes<const N: usize>() -> Result<[u8; N], CoreError> {
    let mut buf = [0u8; N];
    getrandom::getrandom(&mut buf)
        .map_err(|e| CoreError::Encryption(format!("Failed to gather randomness: {e}")))?;
    Ok(buf)
}
