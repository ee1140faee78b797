use thiserror::Error;

/// Unified error type for the entire fatigue-risk-core library.
/// Every public function returns `Result<T, CoreError>`.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Storage / File ──────────────────────────────────────────────
    #[error("Invalid file format: {0}")]
    InvalidFileFormat(String),

    #[error("Unsupported file version: {0}")]
    UnsupportedVersion(u16),

    #[error("Encryption failed: {0}")]
    Encryption(String),

    #[error("Decryption failed: wrong password or corrupted file")]
    Decryption,

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("File I/O error: {0}")]
    FileIO(String),

    // ── Model / Network ─────────────────────────────────────────────
    #[error("Model prediction failed ({model}): {message}")]
    Model { model: String, message: String },

    #[error("Network error: {0}")]
    Network(String),

    // ── Authentication ──────────────────────────────────────────────
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Admin not found")]
    AdminNotFound,

    #[error("Incorrect password")]
    IncorrectPassword,

    #[error("Email already registered: {0}")]
    EmailTaken(String),

    #[error("Account has been deleted")]
    AccountDisabled,

    #[error("Missing or expired session token")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    // ── Trend reports ───────────────────────────────────────────────
    #[error("Invalid date format: {0}")]
    InvalidDateFormat(String),

    #[error("Invalid period '{0}', use daily/weekly/monthly")]
    InvalidPeriod(String),

    #[error("Invalid date range: {0}")]
    InvalidRange(String),

    // ── Business Logic ──────────────────────────────────────────────
    #[error("Validation failed: {0}")]
    ValidationError(String),

    #[error("User not found: {0}")]
    UserNotFound(String),
}

impl CoreError {
    /// HTTP-equivalent status for this error, so a transport layer can map
    /// it without matching on every variant.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            CoreError::InvalidDateFormat(_)
            | CoreError::InvalidPeriod(_)
            | CoreError::InvalidRange(_)
            | CoreError::ValidationError(_) => 400,
            CoreError::InvalidCredentials
            | CoreError::IncorrectPassword
            | CoreError::Unauthorized
            | CoreError::Decryption => 401,
            CoreError::Forbidden(_) | CoreError::AccountDisabled => 403,
            CoreError::AdminNotFound | CoreError::UserNotFound(_) => 404,
            CoreError::EmailTaken(_) => 409,
            CoreError::Model { .. } | CoreError::Network(_) => 502,
            CoreError::InvalidFileFormat(_)
            | CoreError::UnsupportedVersion(_)
            | CoreError::Encryption(_)
            | CoreError::Serialization(_)
            | CoreError::Deserialization(_)
            | CoreError::FileIO(_)
            | CoreError::PasswordHash(_) => 500,
        }
    }

    /// True when the caller supplied bad input (4xx-equivalent).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::FileIO(e.to_string())
    }
}

impl From<bincode::Error> for CoreError {
    fn from(e: bincode::Error) -> Self {
        CoreError::Serialization(e.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Deserialization(e.to_string())
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        // Model server URLs may carry credentials in the query string.
        let msg = e.to_string();
        let sanitized = match msg.find('?') {
            Some(idx) => format!("{}?<query redacted>", &msg[..idx]),
            None => msg,
        };
        CoreError::Network(sanitized)
    }
}

impl From<aes_gcm::Error> for CoreError {
    fn from(_: aes_gcm::Error) -> Self {
        CoreError::Decryption
    }
}

impl From<argon2::password_hash::Error> for CoreError {
    fn from(e: argon2::password_hash::Error) -> Self {
        CoreError::PasswordHash(e.to_string())
    }
}
