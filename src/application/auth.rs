//! Admin sessions: signed, time-limited tokens and the single-account credential check.
//!
//! A token is `base64url(claims) "." base64url(hmac_sha256(context "." claims))` where the
//! claims carry the username and the issue time in unix seconds. Tokens older than the
//! session lifetime, issued in the future, or failing the signature check are treated
//! as absent; callers never learn which of those happened.

use std::sync::Arc;

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use tracing::{debug, warn};

type HmacSha256 = Hmac<Sha256>;

pub const SESSION_COOKIE_NAME: &str = "taproom_admin";
pub const SESSION_TTL: Duration = Duration::hours(8);

const SIGNING_CONTEXT: &[u8] = b"taproom.admin-session";
const CLOCK_SKEW: Duration = Duration::minutes(1);
const SOURCE: &str = "application::auth";

/// Identity asserted by a verified session token. Lives for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminPrincipal {
    pub username: String,
    pub issued_at: OffsetDateTime,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("session token is malformed")]
    Malformed,
    #[error("session token signature does not match")]
    BadSignature,
    #[error("session token has expired")]
    Expired,
}

#[derive(Serialize, Deserialize)]
struct SessionClaims {
    u: String,
    t: i64,
}

#[derive(Clone)]
pub struct SessionManager {
    key: Arc<[u8]>,
    ttl: Duration,
    secure_cookies: bool,
}

impl SessionManager {
    pub fn new(secret_key: &str, secure_cookies: bool) -> Self {
        Self {
            key: Arc::from(secret_key.as_bytes()),
            ttl: SESSION_TTL,
            secure_cookies,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Whether session cookies carry the `Secure` attribute.
    pub fn secure_cookies(&self) -> bool {
        self.secure_cookies
    }

    pub fn issue(&self, username: &str) -> String {
        self.issue_at(username, OffsetDateTime::now_utc())
    }

    pub fn issue_at(&self, username: &str, issued_at: OffsetDateTime) -> String {
        let claims = SessionClaims {
            u: username.to_string(),
            t: issued_at.unix_timestamp(),
        };
        let payload = match serde_json::to_vec(&claims) {
            Ok(bytes) => URL_SAFE_NO_PAD.encode(bytes),
            Err(err) => {
                warn!(target = SOURCE, error = %err, "failed to encode session claims");
                String::new()
            }
        };
        let signature = URL_SAFE_NO_PAD.encode(self.sign(payload.as_bytes()));
        format!("{payload}.{signature}")
    }

    pub fn verify(&self, token: &str) -> Option<AdminPrincipal> {
        self.verify_at(token, OffsetDateTime::now_utc())
    }

    pub fn verify_at(&self, token: &str, now: OffsetDateTime) -> Option<AdminPrincipal> {
        match self.decode(token, now) {
            Ok(principal) => Some(principal),
            Err(err) => {
                debug!(target = SOURCE, reason = %err, "rejected session token");
                None
            }
        }
    }

    fn decode(&self, token: &str, now: OffsetDateTime) -> Result<AdminPrincipal, SessionError> {
        let (payload, signature) = token.split_once('.').ok_or(SessionError::Malformed)?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| SessionError::Malformed)?;

        let mut mac = self.mac();
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| SessionError::BadSignature)?;

        let bytes = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| SessionError::Malformed)?;
        let claims: SessionClaims =
            serde_json::from_slice(&bytes).map_err(|_| SessionError::Malformed)?;
        let issued_at = OffsetDateTime::from_unix_timestamp(claims.t)
            .map_err(|_| SessionError::Malformed)?;

        let age = now - issued_at;
        if age > self.ttl || age < -CLOCK_SKEW {
            return Err(SessionError::Expired);
        }

        Ok(AdminPrincipal {
            username: claims.u,
            issued_at,
        })
    }

    fn sign(&self, payload: &[u8]) -> Vec<u8> {
        let mut mac = self.mac();
        mac.update(payload);
        mac.finalize().into_bytes().to_vec()
    }

    fn mac(&self) -> HmacSha256 {
        let mut mac = match <HmacSha256 as Mac>::new_from_slice(&self.key) {
            Ok(mac) => mac,
            Err(_) => unreachable!("HMAC accepts keys of any length"),
        };
        mac.update(SIGNING_CONTEXT);
        mac.update(b".");
        mac
    }
}

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("password hashing failed: {0}")]
    Hash(String),
}

#[derive(Debug, Clone)]
enum PasswordCheck {
    Hash(String),
    Plaintext(String),
    Disabled,
}

/// The single configured administrator account.
#[derive(Debug, Clone)]
pub struct AdminCredentials {
    username: String,
    password: PasswordCheck,
}

impl AdminCredentials {
    /// A stored hash wins over the plaintext development password.
    pub fn new(
        username: impl Into<String>,
        password_hash: Option<String>,
        dev_password: Option<String>,
    ) -> Self {
        let password = match (password_hash, dev_password) {
            (Some(hash), _) => PasswordCheck::Hash(hash),
            (None, Some(plain)) => PasswordCheck::Plaintext(plain),
            (None, None) => PasswordCheck::Disabled,
        };
        Self {
            username: username.into(),
            password,
        }
    }

    /// Label for startup logging.
    pub fn mode(&self) -> &'static str {
        match self.password {
            PasswordCheck::Hash(_) => "argon2",
            PasswordCheck::Plaintext(_) => "plaintext-dev",
            PasswordCheck::Disabled => "disabled",
        }
    }

    pub fn verify(&self, username: &str, password: &str) -> bool {
        let username_ok: bool = username
            .as_bytes()
            .ct_eq(self.username.as_bytes())
            .into();

        let password_ok = match &self.password {
            PasswordCheck::Hash(hash) => match verify_password(password, hash) {
                Ok(matches) => matches,
                Err(err) => {
                    warn!(target = SOURCE, error = %err, "configured admin password hash is unusable");
                    false
                }
            },
            PasswordCheck::Plaintext(expected) => {
                password.as_bytes().ct_eq(expected.as_bytes()).into()
            }
            PasswordCheck::Disabled => false,
        };

        username_ok && password_ok
    }
}

/// Hash a password into an Argon2id PHC string with a random salt.
pub fn hash_password(password: &str) -> Result<String, CredentialError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| CredentialError::Hash(err.to_string()))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, CredentialError> {
    let parsed = PasswordHash::new(hash).map_err(|err| CredentialError::Hash(err.to_string()))?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(err) => Err(CredentialError::Hash(err.to_string())),
    }
}
