use chrono::{DateTime, Utc};
use tracing::debug;

use crate::errors::CoreError;
use crate::models::database::Database;

use super::encryption::{self, Cipher, KdfParams};
use super::format::{self, FileHeader};

/// High-level storage operations: save/load the database to/from encrypted bytes or files.
pub struct StorageManager;

impl StorageManager {
    /// Encrypt and serialize a database snapshot with the given KDF costs.
    ///
    /// Flow: Database → bincode → AES-256-GCM(Argon2id(password)) → DFRK bytes
    pub fn save_to_bytes(
        db: &Database,
        password: &str,
        kdf_params: &KdfParams,
        saved_at: DateTime<Utc>,
    ) -> Result<Vec<u8>, CoreError> {
        let plaintext = bincode::serialize(db)
            .map_err(|e| CoreError::Serialization(format!("Failed to serialize database: {e}")))?;

        let salt = encryption::random_bytes::<16>()?;
        let nonce = encryption::random_bytes::<12>()?;
        let key = encryption::derive_key(password, &salt, kdf_params)?;
        let ciphertext = Cipher::new(&key)?.seal(&plaintext, &nonce)?;

        let header = FileHeader {
            version: format::CURRENT_VERSION,
            kdf_params: *kdf_params,
            salt,
            nonce,
            saved_at: saved_at.timestamp(),
            ciphertext_len: ciphertext.len() as u64,
        };
        debug!(
            users = db.users.len(),
            predictions = db.predictions.len(),
            bytes = ciphertext.len(),
            "sealed database snapshot"
        );
        Ok(format::write_file(&header, &ciphertext))
    }

    /// Decrypt and deserialize a database snapshot.
    ///
    /// Flow: DFRK bytes → parse header → Argon2id(password, salt) → AES-256-GCM open → bincode → Database
    pub fn load_from_bytes(data: &[u8], password: &str) -> Result<Database, CoreError> {
        let (header, ciphertext) = format::read_file(data)?;
        let key = encryption::derive_key(password, &header.salt, &header.kdf_params)?;
        let plaintext = Cipher::new(&key)?.open(ciphertext, &header.nonce)?;

        bincode::deserialize(&plaintext)
            .map_err(|e| CoreError::Deserialization(format!("Failed to deserialize database: {e}")))
    }

    /// Save the database to an encrypted file on disk (native only).
    #[cfg(not(target_arch = "wasm32"))]
    pub fn save_to_file(
        db: &Database,
        path: &str,
        password: &str,
        kdf_params: &KdfParams,
        saved_at: DateTime<Utc>,
    ) -> Result<(), CoreError> {
        let bytes = Self::save_to_bytes(db, password, kdf_params, saved_at)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Load the database from an encrypted file on disk (native only).
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from_file(path: &str, password: &str) -> Result<Database, CoreError> {
        let bytes = std::fs::read(path)?;
        Self::load_from_bytes(&bytes, password)
    }
}
