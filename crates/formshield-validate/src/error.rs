//! Errors reported by validators and collected per form.

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fmt;

/// One failed check on one field.
///
/// `message` is always display-ready: every `{name}` placeholder is filled
/// in as the matching [`RuleError::param`] is attached.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct RuleError {
    /// Machine-readable rule code, e.g. `"required"`, `"length"`, `"csrf"`.
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, Value>,
    #[serde(skip)]
    pub(crate) halt: bool,
}

impl RuleError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            params: BTreeMap::new(),
            halt: false,
        }
    }

    /// Attach a parameter and substitute its `{key}` placeholder.
    ///
    /// `None` values fill the placeholder with an empty string.
    pub fn param(mut self, key: impl Into<String>, value: impl serde::Serialize) -> Self {
        let key = key.into();
        let value = serde_json::to_value(value).unwrap_or(Value::Null);
        let text = match &value {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        };
        self.message = self.message.replace(&format!("{{{key}}}"), &text);
        self.params.insert(key, value);
        self
    }

    /// Stop the remaining validators of the field after this error.
    pub fn halting(mut self) -> Self {
        self.halt = true;
        self
    }

    pub fn is_halting(&self) -> bool {
        self.halt
    }
}

impl fmt::Display for RuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for RuleError {}

/// Errors of a whole form, grouped by field in declaration order.
///
/// Serializes as a JSON object `{"field": [errors..]}`. Use
/// [`ValidationErrors::to_response_body`] for the error envelope sent to
/// API clients.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationErrors {
    entries: Vec<(String, Vec<RuleError>)>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, error: RuleError) {
        self.extend_field(field, [error]);
    }

    /// Append errors to `field`, keeping the position of its first error.
    pub fn extend_field(
        &mut self,
        field: impl Into<String>,
        errors: impl IntoIterator<Item = RuleError>,
    ) {
        let field = field.into();
        let mut errors = errors.into_iter().peekable();
        if errors.peek().is_none() {
            return;
        }
        match self.entries.iter_mut().find(|(name, _)| *name == field) {
            Some((_, existing)) => existing.extend(errors),
            None => self.entries.push((field, errors.collect())),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of errors across all fields.
    pub fn len(&self) -> usize {
        self.entries.iter().map(|(_, errors)| errors.len()).sum()
    }

    pub fn get(&self, field: &str) -> Option<&[RuleError]> {
        self.entries
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, errors)| errors.as_slice())
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.entries.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[RuleError])> {
        self.entries
            .iter()
            .map(|(name, errors)| (name.as_str(), errors.as_slice()))
    }

    /// `{"error":{"type":"validation_error","message":..,"fields":[..]}}`
    pub fn to_response_body(&self) -> Value {
        let fields: Vec<Value> = self
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| {
                    json!({ "field": field, "code": e.code, "message": e.message })
                })
            })
            .collect();

        json!({
            "error": {
                "type": "validation_error",
                "message": "Form validation failed",
                "fields": fields,
            }
        })
    }
}

impl Serialize for ValidationErrors {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (field, errors) in &self.entries {
            map.serialize_entry(field, errors)?;
        }
        map.end()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "form validation failed with {} error(s)", self.len())
    }
}

impl std::error::Error for ValidationErrors {}
