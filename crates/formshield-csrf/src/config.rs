use serde::Deserialize;
use std::fmt;
use std::time::Duration;

/// Prefix of the environment variables read by [`CsrfConfig::from_env`].
pub const ENV_PREFIX: &str = "FORMSHIELD_CSRF_";

/// Error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
#[error("configuration error: {0}")]
pub struct ConfigError(#[from] envy::Error);

/// Configuration for CSRF protection of forms.
#[derive(Clone)]
pub struct CsrfConfig {
    /// Whether forms carry and check a CSRF token.
    /// Default: true
    pub enabled: bool,

    /// Key used to sign tokens. Required while `enabled` is true.
    /// Default: None
    pub secret_key: Option<String>,

    /// Name of the hidden form field holding the token.
    /// Default: "csrf_token"
    pub field_name: String,

    /// How long an issued token stays valid; `None` never expires.
    /// Default: 30 minutes
    pub time_limit: Option<Duration>,
}

impl Default for CsrfConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            secret_key: None,
            field_name: "csrf_token".to_string(),
            time_limit: Some(Duration::from_secs(30 * 60)),
        }
    }
}

impl fmt::Debug for CsrfConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CsrfConfig")
            .field("enabled", &self.enabled)
            .field("secret_key", &self.secret_key.as_ref().map(|_| "***"))
            .field("field_name", &self.field_name)
            .field("time_limit", &self.time_limit)
            .finish()
    }
}

/// Raw environment representation; unset variables keep the defaults.
#[derive(Debug, Deserialize)]
struct EnvCsrfConfig {
    enabled: Option<bool>,
    secret_key: Option<String>,
    field_name: Option<String>,
    /// Seconds; `0` disables expiry.
    time_limit: Option<u64>,
}

impl CsrfConfig {
    /// Create a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from `FORMSHIELD_CSRF_*` environment variables.
    ///
    /// A `.env` file in the working directory is loaded first, without
    /// overriding variables that are already set.
    ///
    /// | variable                      | field        |
    /// |-------------------------------|--------------|
    /// | `FORMSHIELD_CSRF_ENABLED`     | `enabled`    |
    /// | `FORMSHIELD_CSRF_SECRET_KEY`  | `secret_key` |
    /// | `FORMSHIELD_CSRF_FIELD_NAME`  | `field_name` |
    /// | `FORMSHIELD_CSRF_TIME_LIMIT`  | `time_limit` (seconds, `0` = never) |
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        let raw: EnvCsrfConfig = envy::prefixed(ENV_PREFIX).from_env()?;

        let mut config = Self::default();
        if let Some(enabled) = raw.enabled {
            config.enabled = enabled;
        }
        if let Some(secret) = raw.secret_key.filter(|s| !s.is_empty()) {
            config.secret_key = Some(secret);
        }
        if let Some(name) = raw.field_name.filter(|s| !s.is_empty()) {
            config.field_name = name;
        }
        if let Some(secs) = raw.time_limit {
            config.time_limit = (secs > 0).then(|| Duration::from_secs(secs));
        }
        Ok(config)
    }

    /// Enable or disable CSRF protection.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Set the signing key.
    pub fn secret_key(mut self, key: impl Into<String>) -> Self {
        self.secret_key = Some(key.into());
        self
    }

    /// Set the hidden field name.
    pub fn field_name(mut self, name: impl Into<String>) -> Self {
        self.field_name = name.into();
        self
    }

    /// Set the token lifetime; `None` disables expiry.
    pub fn time_limit(mut self, limit: Option<Duration>) -> Self {
        self.time_limit = limit;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 4] = [
        "FORMSHIELD_CSRF_ENABLED",
        "FORMSHIELD_CSRF_SECRET_KEY",
        "FORMSHIELD_CSRF_FIELD_NAME",
        "FORMSHIELD_CSRF_TIME_LIMIT",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn defaults() {
        let config = CsrfConfig::default();
        assert!(config.enabled);
        assert!(config.secret_key.is_none());
        assert_eq!(config.field_name, "csrf_token");
        assert_eq!(config.time_limit, Some(Duration::from_secs(1800)));
    }

    #[test]
    fn builder_overrides() {
        let config = CsrfConfig::new()
            .enabled(false)
            .secret_key("top secret !!!")
            .field_name("_csrf")
            .time_limit(None);
        assert!(!config.enabled);
        assert_eq!(config.secret_key.as_deref(), Some("top secret !!!"));
        assert_eq!(config.field_name, "_csrf");
        assert!(config.time_limit.is_none());
    }

    #[test]
    fn debug_redacts_secret() {
        let config = CsrfConfig::new().secret_key("top secret !!!");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("top secret"));
        assert!(debug.contains("***"));
    }

    #[test]
    #[serial]
    fn from_env_reads_prefixed_vars() {
        clear_env();
        std::env::set_var("FORMSHIELD_CSRF_ENABLED", "true");
        std::env::set_var("FORMSHIELD_CSRF_SECRET_KEY", "from-env");
        std::env::set_var("FORMSHIELD_CSRF_FIELD_NAME", "token");
        std::env::set_var("FORMSHIELD_CSRF_TIME_LIMIT", "60");

        let config = CsrfConfig::from_env().unwrap();
        assert!(config.enabled);
        assert_eq!(config.secret_key.as_deref(), Some("from-env"));
        assert_eq!(config.field_name, "token");
        assert_eq!(config.time_limit, Some(Duration::from_secs(60)));

        clear_env();
    }

    #[test]
    #[serial]
    fn from_env_zero_time_limit_disables_expiry() {
        clear_env();
        std::env::set_var("FORMSHIELD_CSRF_TIME_LIMIT", "0");

        let config = CsrfConfig::from_env().unwrap();
        assert!(config.time_limit.is_none());
        assert_eq!(config.field_name, "csrf_token");

        clear_env();
    }

    #[test]
    #[serial]
    fn from_env_rejects_malformed_values() {
        clear_env();
        std::env::set_var("FORMSHIELD_CSRF_TIME_LIMIT", "soon");

        assert!(CsrfConfig::from_env().is_err());

        clear_env();
    }
}
