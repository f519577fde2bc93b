//! Request extractor building a form from the incoming request.

use crate::error::ShieldError;
use crate::extension::FormShield;
use crate::form::ShieldForm;
use async_trait::async_trait;
use axum::extract::{FromRequest, Request};
use formshield_validate::{FormData, FormFields};
use http::request::Parts;
use http::{header, Method};
use http_body_util::LengthLimitError;
use std::error::Error as _;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};

/// Maximum accepted form body size (2 MiB).
pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Extracts the form `F` bound to the request's URL-encoded body.
///
/// Requires the application to be attached with [`FormShield::init_app`].
/// Requests with safe methods or without a form content type get empty
/// form data.
///
/// ```rust,ignore
/// async fn index(Shielded(mut form, ..): Shielded<NoteForm>) -> Html<String> {
///     if form.validate_on_submit() {
///         return Html("validated".into());
///     }
///     Html(format!("<form method=\"POST\">{form}</form>"))
/// }
/// ```
pub struct Shielded<F>(pub ShieldForm, pub PhantomData<fn() -> F>);

impl<F> Shielded<F> {
    pub fn into_inner(self) -> ShieldForm {
        self.0
    }
}

impl<F> Deref for Shielded<F> {
    type Target = ShieldForm;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<F> DerefMut for Shielded<F> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

fn carries_form_body(parts: &Parts) -> bool {
    let safe = matches!(
        parts.method,
        Method::GET | Method::HEAD | Method::OPTIONS | Method::TRACE
    );
    let urlencoded = parts
        .headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .is_some_and(|media_type| {
            media_type
                .trim()
                .eq_ignore_ascii_case("application/x-www-form-urlencoded")
        });
    !safe && urlencoded
}

fn body_error(err: axum::Error) -> ShieldError {
    let over_limit = err
        .source()
        .is_some_and(|source| source.is::<LengthLimitError>());
    if over_limit {
        tracing::debug!(limit = DEFAULT_BODY_LIMIT, "form body over limit");
        ShieldError::PayloadTooLarge {
            limit: DEFAULT_BODY_LIMIT,
        }
    } else {
        ShieldError::Body(err.to_string())
    }
}

#[async_trait]
impl<S, F> FromRequest<S> for Shielded<F>
where
    S: Send + Sync,
    F: FormFields,
{
    type Rejection = ShieldError;

    async fn from_request(req: Request, _state: &S) -> Result<Self, Self::Rejection> {
        let (parts, body) = req.into_parts();

        let shield = parts
            .extensions
            .get::<FormShield>()
            .cloned()
            .ok_or_else(|| {
                tracing::warn!("Shielded extractor used on an app without FormShield");
                ShieldError::NotInitialized
            })?;

        let formdata = if carries_form_body(&parts) {
            let body = axum::body::to_bytes(body, DEFAULT_BODY_LIMIT)
                .await
                .map_err(body_error)?;
            FormData::from_urlencoded(&body)?
        } else {
            FormData::new()
        };

        let form = shield.form::<F>(&parts, &formdata)?;
        Ok(Shielded(form, PhantomData))
    }
}
