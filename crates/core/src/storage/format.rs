use crate::errors::CoreError;
use super::encryption::KdfParams;

/// Magic bytes identifying a DFRK (digital fatigue risk) database file.
pub const MAGIC: &[u8; 4] = b"DFRK";

/// Current file format version.
pub const CURRENT_VERSION: u16 = 1;

/// Fixed header size in bytes:
/// magic(4) + version(2) + kdf_params(12) + salt(16) + nonce(12) + saved_at(8) + ciphertext_len(8) = 62
pub const HEADER_SIZE: usize = 62;

/// Header of an encrypted database file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeader {
    pub version: u16,
    pub kdf_params: KdfParams,
    pub salt: [u8; 16],
    pub nonce: [u8; 12],
    /// Unix seconds at which the snapshot was written (unencrypted, informational)
    pub saved_at: i64,
    pub ciphertext_len: u64,
}

/// Serialize a header and ciphertext into file bytes.
///
/// Layout (all integers little-endian):
/// ```text
/// [DFRK: 4B] [version: 2B] [memory_cost: 4B] [time_cost: 4B] [parallelism: 4B]
/// [salt: 16B] [nonce: 12B] [saved_at: 8B i64] [ciphertext_len: 8B]
/// [ciphertext: variable]
/// ```
pub fn write_file(header: &FileHeader, ciphertext: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(HEADER_SIZE + ciphertext.len());
    buf.extend_from_slice(MAGIC);
    buf.extend_from_slice(&header.version.to_le_bytes());
    buf.extend_from_slice(&header.kdf_params.memory_cost.to_le_bytes());
    buf.extend_from_slice(&header.kdf_params.time_cost.to_le_bytes());
    buf.extend_from_slice(&header.kdf_params.parallelism.to_le_bytes());
    buf.extend_from_slice(&header.salt);
    buf.extend_from_slice(&header.nonce);
    buf.extend_from_slice(&header.saved_at.to_le_bytes());
    buf.extend_from_slice(&(ciphertext.len() as u64).to_le_bytes());
    buf.extend_from_slice(ciphertext);
    buf
}

/// Parse and validate the header. Returns the header and the ciphertext slice.
pub fn read_file(data: &[u8]) -> Result<(FileHeader, &[u8]), CoreError> {
    if data.len() < HEADER_SIZE {
        return Err(CoreError::InvalidFileFormat(
            "File too small to be a valid DFRK file".into(),
        ));
    }

    let mut reader = Reader { data, offset: 0 };

    if &reader.take::<4>()? != MAGIC {
        return Err(CoreError::InvalidFileFormat(
            "Invalid magic bytes: not a DFRK file".into(),
        ));
    }

    let version = u16::from_le_bytes(reader.take()?);
    if version == 0 || version > CURRENT_VERSION {
        return Err(CoreError::UnsupportedVersion(version));
    }

    let kdf_params = KdfParams {
        memory_cost: u32::from_le_bytes(reader.take()?),
        time_cost: u32::from_le_bytes(reader.take()?),
        parallelism: u32::from_le_bytes(reader.take()?),
    };
    check_kdf_bounds(&kdf_params)?;

    let salt = reader.take::<16>()?;
    let nonce = reader.take::<12>()?;
    let saved_at = i64::from_le_bytes(reader.take()?);
    let ciphertext_len = u64::from_le_bytes(reader.take()?);

    let remaining = data.len() - reader.offset;
    if (remaining as u64) < ciphertext_len {
        return Err(CoreError::InvalidFileFormat(format!(
            "File truncated: expected {ciphertext_len} bytes of ciphertext, got {remaining}"
        )));
    }
    let ciphertext = &data[reader.offset..reader.offset + ciphertext_len as usize];

    let header = FileHeader {
        version,
        kdf_params,
        salt,
        nonce,
        saved_at,
        ciphertext_len,
    };
    Ok((header, ciphertext))
}

/// Crafted files must not be able to request absurd Argon2 costs.
fn check_kdf_bounds(params: &KdfParams) -> Result<(), CoreError> {
    if !(8..=1_048_576).contains(&params.memory_cost) {
        return Err(CoreError::InvalidFileFormat(format!(
            "KDF memory_cost out of safe range: {} KiB (expected 8..1048576)",
            params.memory_cost
        )));
    }
    if !(1..=20).contains(&params.time_cost) {
        return Err(CoreError::InvalidFileFormat(format!(
            "KDF time_cost out of safe range: {} (expected 1..20)",
            params.time_cost
        )));
    }
    if !(1..=16).contains(&params.parallelism) {
        return Err(CoreError::InvalidFileFormat(format!(
            "KDF parallelism out of safe range: {} (expected 1..16)",
            params.parallelism
        )));
    }
    Ok(())
}

struct Reader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl Reader<'_> {
    fn take<const N: usize>(&mut self) -> Result<[u8; N], CoreError> {
        let end = self.offset + N;
        let bytes: [u8; N] = self
            .data
            .get(self.offset..end)
            .and_then(|s| s.try_into().ok())
            .ok_or_else(|| {
                CoreError::InvalidFileFormat(format!("Header ends early at byte {}", self.offset))
            })?;
        self.offset = end;
        Ok(bytes)
    }
}
