//! The extension object attached once to an application.

use crate::error::{Result, ShieldError};
use crate::form::ShieldForm;
use axum::{Extension, Router};
use formshield_csrf::{CsrfConfig, Session};
use formshield_validate::{Field, FormData, FormFields};
use http::request::Parts;
use http::Method;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// Maps an incoming request to the session used as CSRF token storage.
pub type CsrfContext = Arc<dyn Fn(&Parts) -> Option<Session> + Send + Sync>;

/// Reads the [`Session`] the host's session middleware put into the
/// request extensions.
fn session_from_extensions(parts: &Parts) -> Option<Session> {
    parts.extensions.get::<Session>().cloned()
}

struct Inner {
    config: RwLock<CsrfConfig>,
    csrf_context: RwLock<CsrfContext>,
    attached: AtomicBool,
}

/// Form and CSRF integration for an axum application.
///
/// The handle is cheap to clone; clones share configuration and the
/// initialization guard. Configuration is read each time a form is built,
/// so changes through [`FormShield::configure`] apply to later requests.
///
/// ```rust
/// use axum::Router;
/// use formshield::{CsrfConfig, FormShield};
///
/// let shield = FormShield::new(CsrfConfig::new().secret_key("top secret !!!"));
/// let app: Router = shield.init_app(Router::new()).unwrap();
///
/// // Each extension attaches exactly once.
/// assert!(shield.init_app(Router::<()>::new()).is_err());
/// ```
#[derive(Clone)]
pub struct FormShield {
    inner: Arc<Inner>,
}

impl FormShield {
    /// Create an extension that is not yet attached to an application.
    pub fn new(config: CsrfConfig) -> Self {
        let csrf_context: CsrfContext = Arc::new(session_from_extensions);
        Self {
            inner: Arc::new(Inner {
                config: RwLock::new(config),
                csrf_context: RwLock::new(csrf_context),
                attached: AtomicBool::new(false),
            }),
        }
    }

    /// Create an extension and attach it to `router` in one step.
    pub fn with_app<S>(router: Router<S>, config: CsrfConfig) -> Result<(Self, Router<S>)>
    where
        S: Clone + Send + Sync + 'static,
    {
        let shield = Self::new(config);
        let router = shield.init_app(router)?;
        Ok((shield, router))
    }

    /// Attach the extension to an application.
    ///
    /// Installs the extension into every request so the [`Shielded`]
    /// extractor can find it. Fails with [`ShieldError::AlreadyInitialized`]
    /// if this extension was already attached to any application.
    ///
    /// [`Shielded`]: crate::Shielded
    pub fn init_app<S>(&self, router: Router<S>) -> Result<Router<S>>
    where
        S: Clone + Send + Sync + 'static,
    {
        if self
            .inner
            .attached
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::warn!("FormShield::init_app called more than once");
            return Err(ShieldError::AlreadyInitialized);
        }

        let config = self.config();
        tracing::debug!(
            csrf_enabled = config.enabled,
            field_name = %config.field_name,
            "FormShield attached to application"
        );
        Ok(router.layer(Extension(self.clone())))
    }

    /// Whether [`FormShield::init_app`] has succeeded.
    pub fn is_initialized(&self) -> bool {
        self.inner.attached.load(Ordering::Acquire)
    }

    /// Snapshot of the current configuration.
    pub fn config(&self) -> CsrfConfig {
        self.inner
            .config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Change the configuration in place.
    pub fn configure(&self, f: impl FnOnce(&mut CsrfConfig)) {
        let mut config = self
            .inner
            .config
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        f(&mut config);
    }

    /// Replace the session accessor.
    pub fn set_csrf_context<F>(&self, f: F)
    where
        F: Fn(&Parts) -> Option<Session> + Send + Sync + 'static,
    {
        *self
            .inner
            .csrf_context
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Arc::new(f);
    }

    /// Builder form of [`FormShield::set_csrf_context`].
    pub fn with_csrf_context<F>(self, f: F) -> Self
    where
        F: Fn(&Parts) -> Option<Session> + Send + Sync + 'static,
    {
        self.set_csrf_context(f);
        self
    }

    /// Look up the session for a request through the configured accessor.
    pub fn csrf_context(&self, parts: &Parts) -> Option<Session> {
        let accessor = self
            .inner
            .csrf_context
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        (*accessor)(parts)
    }

    /// Build the form `F` for one request.
    ///
    /// Fails with [`ShieldError::NotInitialized`] when the extension was
    /// never attached. With CSRF enabled it also needs a secret key and a
    /// session for the request.
    pub fn form<F: FormFields>(&self, parts: &Parts, formdata: &FormData) -> Result<ShieldForm> {
        self.build(F::fields, &parts.method, formdata, || self.csrf_context(parts))
    }

    /// Build the form `F` against an explicit session instead of a request.
    pub fn form_with_session<F: FormFields>(
        &self,
        session: &Session,
        method: &Method,
        formdata: &FormData,
    ) -> Result<ShieldForm> {
        self.build(F::fields, method, formdata, || Some(session.clone()))
    }

    fn build(
        &self,
        fields: impl FnOnce() -> Vec<Field>,
        method: &Method,
        formdata: &FormData,
        session: impl FnOnce() -> Option<Session>,
    ) -> Result<ShieldForm> {
        if !self.is_initialized() {
            tracing::warn!("form used before FormShield was attached to an application");
            return Err(ShieldError::NotInitialized);
        }

        let config = self.config();
        let csrf = if config.enabled {
            let session = session().ok_or_else(|| {
                tracing::warn!("no session found for CSRF protection");
                ShieldError::MissingCsrfContext
            })?;
            Some((config, session))
        } else {
            None
        };

        ShieldForm::build(fields(), method, formdata, csrf)
    }
}

impl fmt::Debug for FormShield {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormShield")
            .field("config", &self.config())
            .field("initialized", &self.is_initialized())
            .finish_non_exhaustive()
    }
}
