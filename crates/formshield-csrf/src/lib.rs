//! CSRF Protection
//!
//! Session-bound CSRF tokens for HTML forms. The host application supplies a
//! [`Session`] per request; [`SessionCsrf`] stores a random secret in it and
//! signs short-lived tokens with the application's secret key.
//!
//! # Example
//!
//! ```rust
//! use formshield_csrf::{CsrfConfig, Session, SessionCsrf};
//!
//! let config = CsrfConfig::new().secret_key("top secret !!!");
//! let csrf = SessionCsrf::from_config(&config).unwrap();
//!
//! let session = Session::new();
//! let token = csrf.generate(&session).unwrap();
//! assert!(csrf.validate(&session, token.as_str()).is_ok());
//! ```

mod config;
mod error;
mod protect;
mod session;
mod token;

pub use config::{ConfigError, CsrfConfig, ENV_PREFIX};
pub use error::CsrfError;
pub use protect::{SessionCsrf, SESSION_KEY};
pub use session::Session;
pub use token::CsrfToken;
