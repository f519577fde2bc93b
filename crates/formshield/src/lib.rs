//! # formshield
//!
//! Declarative HTML forms with session-bound CSRF protection for axum.
//!
//! A [`FormShield`] is attached once to an application. Handlers then build
//! forms per request, either through the [`Shielded`] extractor or with
//! [`FormShield::form`]. When CSRF protection is enabled every form carries
//! a hidden token field signed for the request's [`Session`]; submitting the
//! form back with that token is required for [`ShieldForm::validate`] to
//! pass.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use axum::response::Html;
//! use axum::routing::get;
//! use axum::{Extension, Router};
//! use formshield::prelude::*;
//!
//! struct NoteForm;
//!
//! impl FormFields for NoteForm {
//!     fn fields() -> Vec<Field> {
//!         vec![
//!             Field::string("msg", "Note")
//!                 .validator(DataRequired::new())
//!                 .validator(Length::max(10)),
//!             Field::submit("submit", "Submit"),
//!         ]
//!     }
//! }
//!
//! async fn index(mut form: Shielded<NoteForm>) -> Html<String> {
//!     if form.validate_on_submit() {
//!         return Html("validated".to_string());
//!     }
//!     Html(format!(r#"<form action="" method="POST">{}</form>"#, *form))
//! }
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let shield = FormShield::new(CsrfConfig::new().secret_key("top secret !!!"));
//! let app = shield
//!     .init_app(Router::new().route("/", get(index).post(index)))?
//!     // The host's session layer provides the token storage.
//!     .layer(Extension(Session::new()));
//!
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! [`CsrfConfig`] controls whether CSRF is enabled, the signing key, the
//! hidden field name and the token time limit. It can be built in code or
//! loaded from `FORMSHIELD_CSRF_*` environment variables with
//! [`CsrfConfig::from_env`].

mod coerce;
mod error;
mod extension;
mod extract;
mod form;

pub use crate::coerce::{to_bytes, ToBytes};
pub use error::{Result, ShieldError};
pub use extension::{CsrfContext, FormShield};
pub use extract::{Shielded, DEFAULT_BODY_LIMIT};
pub use form::ShieldForm;

pub use formshield_csrf as csrf;
pub use formshield_csrf::{CsrfConfig, CsrfError, CsrfToken, Session, SessionCsrf};
pub use formshield_validate as validate;
pub use formshield_validate::{Field, FieldKind, FieldValue, Form, FormData, FormFields};

/// Prelude module - import everything you need with `use formshield::prelude::*`
pub mod prelude {
    pub use crate::coerce::to_bytes;
    pub use crate::error::ShieldError;
    pub use crate::extension::FormShield;
    pub use crate::extract::Shielded;
    pub use crate::form::ShieldForm;
    pub use formshield_csrf::{CsrfConfig, Session};
    pub use formshield_validate::prelude::*;
}
