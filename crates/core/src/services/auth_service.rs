use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::CoreError;
use crate::models::database::{Database, Session};
use crate::models::user::{normalize_email, GoogleProfile, Role, User};
use crate::storage::encryption::{self, KdfParams};

/// Account registration, credential checks and session tokens.
///
/// Sessions are opaque random tokens stored in the database; a token is
/// valid until `expires_at` or until it is revoked.
pub struct AuthService;

impl AuthService {
    pub fn new() -> Self {
        Self
    }

    /// Hash a password into an Argon2id PHC string with a fresh random salt.
    pub fn hash_password(&self, password: &str, params: &KdfParams) -> Result<String, CoreError> {
        let salt_bytes = encryption::random_bytes::<16>()?;
        let salt = SaltString::encode_b64(&salt_bytes)?;
        let hash = params
            .hasher(None)?
            .hash_password(password.as_bytes(), &salt)?
            .to_string();
        Ok(hash)
    }

    /// Check a password against a stored PHC string. Malformed hashes never verify.
    #[must_use]
    pub fn verify_password(&self, password: &str, hash: &str) -> bool {
        match PasswordHash::new(hash) {
            Ok(parsed) => Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }

    /// Create a regular account and log it in.
    pub fn register(
        &self,
        db: &mut Database,
        full_name: &str,
        email: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<Session, CoreError> {
        self.create_account(db, full_name, email, password, Role::User, now)
    }

    /// Create an administrator account and log it in.
    pub fn register_admin(
        &self,
        db: &mut Database,
        full_name: &str,
        email: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<Session, CoreError> {
        self.create_account(db, full_name, email, password, Role::Admin, now)
    }

    /// Email + password login for any account.
    pub fn login(
        &self,
        db: &mut Database,
        email: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<Session, CoreError> {
        let user = db.user_by_email(email).ok_or_else(|| {
            warn!("login attempt for unknown email");
            CoreError::InvalidCredentials
        })?;

        let verified = user
            .password_hash
            .as_deref()
            .is_some_and(|hash| self.verify_password(password, hash));
        if !verified {
            warn!(user_id = %user.id, "login rejected: wrong password");
            return Err(CoreError::InvalidCredentials);
        }
        if user.is_deleted {
            return Err(CoreError::AccountDisabled);
        }

        let (user_id, role) = (user.id, user.role);
        info!(%user_id, "user logged in");
        self.issue_session(db, user_id, role, now)
    }

    /// Login restricted to admin accounts, with distinct errors for an
    /// unknown admin and a wrong password.
    pub fn admin_login(
        &self,
        db: &mut Database,
        email: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<Session, CoreError> {
        let admin = db
            .user_by_email(email)
            .filter(|u| u.is_admin() && !u.is_deleted)
            .ok_or(CoreError::AdminNotFound)?;

        let verified = admin
            .password_hash
            .as_deref()
            .is_some_and(|hash| self.verify_password(password, hash));
        if !verified {
            warn!(user_id = %admin.id, "admin login rejected: wrong password");
            return Err(CoreError::IncorrectPassword);
        }

        let admin_id = admin.id;
        info!(%admin_id, "admin logged in");
        self.issue_session(db, admin_id, Role::Admin, now)
    }

    /// Sign in with a profile already verified by the Google OAuth handshake.
    ///
    /// Links the Google identity to an existing account with the same email,
    /// or creates a password-less account.
    pub fn login_with_google(
        &self,
        db: &mut Database,
        profile: &GoogleProfile,
        now: DateTime<Utc>,
    ) -> Result<Session, CoreError> {
        if profile.email.trim().is_empty() || profile.sub.trim().is_empty() {
            return Err(CoreError::ValidationError(
                "Google profile is missing email or subject".into(),
            ));
        }

        let email = normalize_email(&profile.email);
        let existing = db.users.iter().position(|u| u.email == email);
        let (user_id, role) = match existing {
            Some(idx) => {
                let user = &mut db.users[idx];
                if user.is_deleted {
                    return Err(CoreError::AccountDisabled);
                }
                if user.google_id.is_none() {
                    user.google_id = Some(profile.sub.clone());
                }
                (user.id, user.role)
            }
            None => {
                self.session_expiry(db, now)?;
                let mut user = User::new(profile.name.trim(), &email, now);
                user.google_id = Some(profile.sub.clone());
                let ids = (user.id, user.role);
                info!(user_id = %user.id, "created account from Google sign-in");
                db.users.push(user);
                ids
            }
        };

        self.issue_session(db, user_id, role, now)
    }

    /// Resolve a bearer token to its live, non-deleted user.
    ///
    /// Expired sessions are evicted on contact.
    pub fn authenticate<'a>(
        &self,
        db: &'a mut Database,
        token: Uuid,
        now: DateTime<Utc>,
    ) -> Result<&'a User, CoreError> {
        let (user_id, expired) = db
            .sessions
            .get(&token)
            .map(|s| (s.user_id, s.is_expired(now)))
            .ok_or(CoreError::Unauthorized)?;
        if expired {
            db.sessions.remove(&token);
            return Err(CoreError::Unauthorized);
        }

        match db.user(user_id) {
            Some(user) if !user.is_deleted => Ok(user),
            _ => Err(CoreError::Unauthorized),
        }
    }

    /// Like [`AuthService::authenticate`], but the user must be an admin.
    pub fn require_admin<'a>(
        &self,
        db: &'a mut Database,
        token: Uuid,
        now: DateTime<Utc>,
    ) -> Result<&'a User, CoreError> {
        let user = self.authenticate(db, token, now)?;
        if !user.is_admin() {
            return Err(CoreError::Forbidden("Admin access required".into()));
        }
        Ok(user)
    }

    /// Revoke one session. Returns whether it existed.
    pub fn logout(&self, db: &mut Database, token: Uuid) -> bool {
        db.sessions.remove(&token).is_some()
    }

    /// Revoke every session belonging to `user_id`. Returns how many were dropped.
    pub fn revoke_user_sessions(&self, db: &mut Database, user_id: Uuid) -> usize {
        let before = db.sessions.len();
        db.sessions.retain(|_, s| s.user_id != user_id);
        before - db.sessions.len()
    }

    /// Drop all expired sessions. Returns how many were dropped.
    pub fn prune_sessions(&self, db: &mut Database, now: DateTime<Utc>) -> usize {
        let before = db.sessions.len();
        db.sessions.retain(|_, s| !s.is_expired(now));
        before - db.sessions.len()
    }

    fn issue_session(
        &self,
        db: &mut Database,
        user_id: Uuid,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<Session, CoreError> {
        let expires_at = self.session_expiry(db, now)?;
        let session = Session {
            token: Uuid::new_v4(),
            user_id,
            role,
            issued_at: now,
            expires_at,
        };
        db.sessions.insert(session.token, session.clone());
        Ok(session)
    }

    /// `now + session_ttl_hours`, or an error when that is not representable.
    fn session_expiry(&self, db: &Database, now: DateTime<Utc>) -> Result<DateTime<Utc>, CoreError> {
        let ttl_hours = db.settings.session_ttl_hours;
        Duration::try_hours(ttl_hours)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or_else(|| {
                CoreError::ValidationError(format!(
                    "session_ttl_hours of {ttl_hours} overflows the session expiry"
                ))
            })
    }

    fn create_account(
        &self,
        db: &mut Database,
        full_name: &str,
        email: &str,
        password: &str,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<Session, CoreError> {
        if full_name.trim().is_empty() || email.trim().is_empty() || password.is_empty() {
            return Err(CoreError::ValidationError("Missing fields".into()));
        }
        if db.user_by_email(email).is_some() {
            return Err(CoreError::EmailTaken(normalize_email(email)));
        }
        // Checked before the account is stored.
        self.session_expiry(db, now)?;

        let mut user = User::new(full_name.trim(), email, now);
        user.password_hash = Some(self.hash_password(password, &db.settings.password_kdf)?);
        user.role = role;

        let user_id = user.id;
        db.users.push(user);
        info!(%user_id, %role, "registered account");
        self.issue_session(db, user_id, role, now)
    }
}

impl Default for AuthService {
    fn default() -> Self {
        Self::new()
    }
}
