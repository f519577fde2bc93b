//! HMAC-signed, session-bound CSRF tokens.
//!
//! Each session gets a random secret stored under [`SESSION_KEY`]. A token
//! is `"{expires}##{signature}"` where `expires` is a `%Y%m%d%H%M%S` UTC
//! timestamp (empty without a time limit) and `signature` is the hex
//! HMAC-SHA1 of the session secret followed by `expires`, keyed with the
//! application secret.

use crate::config::CsrfConfig;
use crate::error::CsrfError;
use crate::session::Session;
use crate::token::CsrfToken;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use rand::{rngs::OsRng, RngCore};
use sha1::{Digest, Sha1};
use std::time::Duration;

type HmacSha1 = Hmac<Sha1>;

/// Session key under which the per-session secret is stored.
pub const SESSION_KEY: &str = "csrf";

const TIME_FORMAT: &str = "%Y%m%d%H%M%S";
const SEPARATOR: &str = "##";

/// Issues and verifies tokens for one application secret.
#[derive(Clone)]
pub struct SessionCsrf {
    secret: Vec<u8>,
    time_limit: Option<Duration>,
}

impl std::fmt::Debug for SessionCsrf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCsrf")
            .field("time_limit", &self.time_limit)
            .finish_non_exhaustive()
    }
}

impl SessionCsrf {
    pub fn new(secret: impl Into<Vec<u8>>, time_limit: Option<Duration>) -> Self {
        Self {
            secret: secret.into(),
            time_limit,
        }
    }

    /// Build from configuration; fails when no secret key is set.
    pub fn from_config(config: &CsrfConfig) -> Result<Self, CsrfError> {
        let secret = config
            .secret_key
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or(CsrfError::MissingSecretKey)?;
        Ok(Self::new(secret.as_bytes(), config.time_limit))
    }

    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit
    }

    /// Issue a token for `session`, creating its secret on first use.
    pub fn generate(&self, session: &Session) -> Result<CsrfToken, CsrfError> {
        self.generate_at(session, Utc::now())
    }

    /// Issue a token as if the current time were `now`.
    pub fn generate_at(
        &self,
        session: &Session,
        now: DateTime<Utc>,
    ) -> Result<CsrfToken, CsrfError> {
        let session_secret = session.get_or_insert_with(SESSION_KEY, new_session_secret);

        let expires = match self.time_limit {
            Some(limit) => chrono::Duration::from_std(limit)
                .ok()
                .and_then(|limit| now.checked_add_signed(limit))
                .ok_or(CsrfError::TimeLimitOutOfRange)?
                .format(TIME_FORMAT)
                .to_string(),
            None => String::new(),
        };

        let signature = hex::encode(self.mac(&session_secret, &expires)?.finalize().into_bytes());
        Ok(CsrfToken::new(format!("{expires}{SEPARATOR}{signature}")))
    }

    /// Check a submitted token against `session`.
    pub fn validate(&self, session: &Session, submitted: &str) -> Result<(), CsrfError> {
        self.validate_at(session, submitted, Utc::now())
    }

    /// Check a submitted token as if the current time were `now`.
    pub fn validate_at(
        &self,
        session: &Session,
        submitted: &str,
        now: DateTime<Utc>,
    ) -> Result<(), CsrfError> {
        let Some((expires, signature)) = submitted.split_once(SEPARATOR) else {
            tracing::debug!("csrf token missing or malformed");
            return Err(CsrfError::Missing);
        };

        let Some(session_secret) = session.get(SESSION_KEY) else {
            tracing::debug!("csrf check against a session without a secret");
            return Err(CsrfError::Invalid);
        };

        let signature = hex::decode(signature).map_err(|_| CsrfError::Invalid)?;
        if self
            .mac(&session_secret, expires)?
            .verify_slice(&signature)
            .is_err()
        {
            tracing::debug!("csrf signature mismatch");
            return Err(CsrfError::Invalid);
        }

        if self.time_limit.is_some() && now.format(TIME_FORMAT).to_string().as_str() > expires {
            tracing::debug!(expires, "csrf token expired");
            return Err(CsrfError::Expired);
        }

        Ok(())
    }

    fn mac(&self, session_secret: &str, expires: &str) -> Result<HmacSha1, CsrfError> {
        let mut mac = HmacSha1::new_from_slice(&self.secret).map_err(|_| CsrfError::MissingSecretKey)?;
        mac.update(session_secret.as_bytes());
        mac.update(expires.as_bytes());
        Ok(mac)
    }
}

/// Hex SHA-1 digest of 64 random bytes.
fn new_session_secret() -> String {
    let mut bytes = [0u8; 64];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(Sha1::digest(bytes))
}
