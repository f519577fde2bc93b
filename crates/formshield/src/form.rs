//! Per-request forms with optional CSRF protection.

use crate::error::{Result, ShieldError};
use formshield_csrf::{CsrfConfig, Session, SessionCsrf};
use formshield_validate::{Field, Form, FormData, RuleError, ValidationErrors};
use http::Method;
use std::fmt;

/// CSRF state carried by a form built with protection enabled.
#[derive(Debug, Clone)]
struct CsrfBinding {
    protector: SessionCsrf,
    session: Session,
    field_name: String,
}

/// A form bound to one request's submitted data.
///
/// Built by [`FormShield::form`] or the [`Shielded`] extractor. With CSRF
/// enabled the first field is a hidden token field whose rendered value is
/// a freshly issued token for the request's session.
///
/// [`FormShield::form`]: crate::FormShield::form
/// [`Shielded`]: crate::Shielded
#[derive(Debug, Clone)]
pub struct ShieldForm {
    form: Form,
    csrf: Option<CsrfBinding>,
    submitted: bool,
}

impl ShieldForm {
    pub(crate) fn build(
        fields: Vec<Field>,
        method: &Method,
        formdata: &FormData,
        csrf: Option<(CsrfConfig, Session)>,
    ) -> Result<Self> {
        let mut form = Form::new(fields);

        let csrf = match csrf {
            Some((config, session)) => {
                if form.field(&config.field_name).is_some() {
                    tracing::warn!(field = %config.field_name, "form declares the CSRF field name");
                    return Err(ShieldError::CsrfFieldCollision(config.field_name));
                }
                let protector = SessionCsrf::from_config(&config)?;
                let token = protector.generate(&session)?;
                form.prepend(Field::csrf_token(&config.field_name, token.into_string()));
                Some(CsrfBinding {
                    protector,
                    session,
                    field_name: config.field_name,
                })
            }
            None => None,
        };

        form.process(formdata);
        Ok(Self {
            form,
            csrf,
            submitted: is_submit_method(method),
        })
    }

    /// Whether the request used a method that submits forms.
    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    /// Run the field rules, then check the CSRF token.
    ///
    /// Failures are stored on the offending fields; returns `true` when
    /// every check passed.
    pub fn validate(&mut self) -> bool {
        let mut valid = self.form.validate();

        if let Some(csrf) = &self.csrf {
            let submitted = self
                .form
                .field(&csrf.field_name)
                .and_then(|field| field.data().as_text())
                .unwrap_or_default()
                .to_string();

            if let Err(err) = csrf.protector.validate(&csrf.session, &submitted) {
                tracing::debug!(field = %csrf.field_name, reason = %err, "CSRF validation failed");
                if let Some(field) = self.form.field_mut(&csrf.field_name) {
                    field.push_error(RuleError::new("csrf", err.to_string()));
                }
                valid = false;
            }
        }

        valid
    }

    /// Like [`ShieldForm::validate`], but hands the errors back as a
    /// [`ShieldError::Validation`] rejection (422 with a JSON field list).
    pub fn validate_or_reject(&mut self) -> Result<()> {
        if self.validate() {
            Ok(())
        } else {
            Err(ShieldError::Validation(self.errors()))
        }
    }

    /// `is_submitted() && validate()`.
    pub fn validate_on_submit(&mut self) -> bool {
        self.is_submitted() && self.validate()
    }

    /// The CSRF token field, `None` when protection is disabled.
    pub fn csrf_token(&self) -> Option<&Field> {
        self.csrf
            .as_ref()
            .and_then(|csrf| self.form.field(&csrf.field_name))
    }

    /// The hidden fields that must be rendered inside the form tag.
    ///
    /// This is the CSRF token field.
    pub fn hidden_tag(&self) -> Option<&Field> {
        self.csrf_token()
    }

    pub fn csrf_enabled(&self) -> bool {
        self.csrf.is_some()
    }

    pub fn errors(&self) -> ValidationErrors {
        self.form.errors()
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.form.field(name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Field> {
        self.form.iter()
    }

    /// Processed data as a JSON object keyed by field name.
    pub fn data(&self) -> serde_json::Value {
        self.form.data()
    }

    /// Concatenated widget HTML, CSRF field first.
    pub fn render(&self) -> String {
        self.form.render()
    }

    pub fn as_form(&self) -> &Form {
        &self.form
    }

    pub fn into_form(self) -> Form {
        self.form
    }
}

impl fmt::Display for ShieldForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl<'a> IntoIterator for &'a ShieldForm {
    type Item = &'a Field;
    type IntoIter = std::slice::Iter<'a, Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.form.iter()
    }
}

fn is_submit_method(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use formshield_validate::{DataRequired, Length};

    fn fields() -> Vec<Field> {
        vec![
            Field::string("msg", "Note")
                .validator(DataRequired::new())
                .validator(Length::max(10)),
            Field::submit("submit", "Submit"),
        ]
    }

    fn config() -> CsrfConfig {
        CsrfConfig::new().secret_key("top secret !!!")
    }

    fn issued_token(session: &Session) -> String {
        let form = ShieldForm::build(
            fields(),
            &Method::GET,
            &FormData::new(),
            Some((config(), session.clone())),
        )
        .unwrap();
        form.csrf_token()
            .and_then(|field| {
                let html = field.render();
                let start = html.find("value=\"")? + 7;
                let end = html[start..].find('"')? + start;
                Some(html[start..end].to_string())
            })
            .unwrap()
    }

    #[test]
    fn without_csrf_only_field_rules_apply() {
        let formdata: FormData = [("msg", "happy")].into_iter().collect();
        let mut form = ShieldForm::build(fields(), &Method::POST, &formdata, None).unwrap();
        assert!(!form.csrf_enabled());
        assert!(form.hidden_tag().is_none());
        assert!(form.validate_on_submit());
    }

    #[test]
    fn csrf_field_is_rendered_first() {
        let session = Session::new();
        let form = ShieldForm::build(
            fields(),
            &Method::GET,
            &FormData::new(),
            Some((config(), session)),
        )
        .unwrap();
        let first = form.iter().next().unwrap();
        assert_eq!(first.name(), "csrf_token");
        assert!(form.render().starts_with(r#"<input id="csrf_token""#));
        assert_eq!(form.hidden_tag(), form.csrf_token());
    }

    #[test]
    fn issued_token_validates() {
        let session = Session::new();
        let token = issued_token(&session);

        let formdata: FormData = [("msg", "happy"), ("csrf_token", token.as_str())]
            .into_iter()
            .collect();
        let mut form =
            ShieldForm::build(fields(), &Method::POST, &formdata, Some((config(), session)))
                .unwrap();
        assert!(form.validate());
        assert!(form.errors().is_empty());
    }

    #[test]
    fn missing_token_is_a_field_error() {
        let session = Session::new();
        issued_token(&session);

        let formdata: FormData = [("msg", "happy")].into_iter().collect();
        let mut form =
            ShieldForm::build(fields(), &Method::POST, &formdata, Some((config(), session)))
                .unwrap();
        assert!(!form.validate());
        let errors = form.errors();
        assert_eq!(errors.field_names(), vec!["csrf_token"]);
        assert_eq!(errors.get("csrf_token").unwrap()[0].message, "CSRF token missing");
    }

    #[test]
    fn token_from_another_session_fails() {
        let token = issued_token(&Session::new());
        let session = Session::new();

        let formdata: FormData = [("msg", "happy"), ("csrf_token", token.as_str())]
            .into_iter()
            .collect();
        let mut form =
            ShieldForm::build(fields(), &Method::POST, &formdata, Some((config(), session)))
                .unwrap();
        assert!(!form.validate());
        assert_eq!(
            form.errors().get("csrf_token").unwrap()[0].message,
            "CSRF failed"
        );
    }

    #[test]
    fn declared_field_may_not_shadow_csrf_field() {
        let mut declared = fields();
        declared.push(Field::hidden("csrf_token"));
        let err = ShieldForm::build(
            declared,
            &Method::GET,
            &FormData::new(),
            Some((config(), Session::new())),
        )
        .unwrap_err();
        assert!(matches!(err, ShieldError::CsrfFieldCollision(name) if name == "csrf_token"));

        // no collision while CSRF is off
        let mut declared = fields();
        declared.push(Field::hidden("csrf_token"));
        assert!(ShieldForm::build(declared, &Method::GET, &FormData::new(), None).is_ok());
    }

    #[test]
    fn rejection_carries_rendered_messages() {
        let formdata: FormData = [("msg", "love is beautiful")].into_iter().collect();
        let mut form = ShieldForm::build(fields(), &Method::POST, &formdata, None).unwrap();
        let Err(ShieldError::Validation(errors)) = form.validate_or_reject() else {
            panic!("expected a validation rejection");
        };
        assert_eq!(
            errors.get("msg").unwrap()[0].message,
            "Field cannot be longer than 10 characters."
        );

        let formdata: FormData = [("msg", "happy")].into_iter().collect();
        let mut form = ShieldForm::build(fields(), &Method::POST, &formdata, None).unwrap();
        assert!(form.validate_or_reject().is_ok());
    }

    #[test]
    fn get_request_is_not_submitted() {
        let mut form = ShieldForm::build(fields(), &Method::GET, &FormData::new(), None).unwrap();
        assert!(!form.is_submitted());
        assert!(!form.validate_on_submit());
    }
}
