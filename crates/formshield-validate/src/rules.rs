//! Field validators.
//!
//! A validator inspects one field (and, for cross-field rules, the data of
//! its siblings) and either lets the chain continue, stops it, or reports a
//! [`RuleError`]. Errors built with [`RuleError::halting`] also stop the chain.

use crate::error::RuleError;
use crate::field::FieldValue;
use regex::Regex;
use std::collections::HashMap;
use std::fmt::Debug;
use validator::{ValidateEmail, ValidateUrl};

/// What the field should do after a validator passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Run the next validator.
    Continue,
    /// Skip the remaining validators.
    Stop,
    /// Skip the remaining validators and drop every error recorded so far.
    Skip,
}

/// The view of a field handed to each validator.
#[derive(Debug, Clone, Copy)]
pub struct FieldInput<'a> {
    pub name: &'a str,
    pub data: &'a FieldValue,
    /// Raw values submitted for the field, empty when nothing was sent.
    pub raw_data: &'a [String],
    /// Processed data of every field in the form, keyed by name.
    pub form: &'a HashMap<String, FieldValue>,
}

/// A single validation rule attached to a field.
pub trait Validator: Debug + Send + Sync {
    fn validate(&self, input: &FieldInput<'_>) -> Result<Flow, RuleError>;

    /// Get the rule name/code for error reporting.
    fn rule_name(&self) -> &'static str;

    /// Whether the rendered widget should carry the `required` attribute.
    fn marks_required(&self) -> bool {
        false
    }
}

fn message_or(custom: &Option<String>, default: impl FnOnce() -> String) -> String {
    custom.clone().unwrap_or_else(default)
}

/// Fails when the processed data is empty, blank, or unchecked.
#[derive(Debug, Clone, Default)]
pub struct DataRequired {
    pub message: Option<String>,
}

impl DataRequired {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
        }
    }
}

impl Validator for DataRequired {
    fn validate(&self, input: &FieldInput<'_>) -> Result<Flow, RuleError> {
        if input.data.is_truthy() {
            return Ok(Flow::Continue);
        }
        let message = message_or(&self.message, || "This field is required.".to_string());
        Err(RuleError::new("required", message).halting())
    }

    fn rule_name(&self) -> &'static str {
        "required"
    }

    fn marks_required(&self) -> bool {
        true
    }
}

/// Fails when no raw input was submitted for the field.
#[derive(Debug, Clone, Default)]
pub struct InputRequired {
    pub message: Option<String>,
}

impl InputRequired {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Validator for InputRequired {
    fn validate(&self, input: &FieldInput<'_>) -> Result<Flow, RuleError> {
        match input.raw_data.first() {
            Some(value) if !value.is_empty() => Ok(Flow::Continue),
            _ => {
                let message = message_or(&self.message, || "This field is required.".to_string());
                Err(RuleError::new("required", message).halting())
            }
        }
    }

    fn rule_name(&self) -> &'static str {
        "required"
    }

    fn marks_required(&self) -> bool {
        true
    }
}

/// Allows empty input, skipping every other validator of the field.
#[derive(Debug, Clone, Copy, Default)]
pub struct Optional {
    /// Treat whitespace-only input as empty.
    pub strip_whitespace: bool,
}

impl Optional {
    pub fn new() -> Self {
        Self {
            strip_whitespace: true,
        }
    }
}

impl Validator for Optional {
    fn validate(&self, input: &FieldInput<'_>) -> Result<Flow, RuleError> {
        let empty = match input.raw_data.first() {
            None => true,
            Some(value) if self.strip_whitespace => value.trim().is_empty(),
            Some(value) => value.is_empty(),
        };
        Ok(if empty { Flow::Skip } else { Flow::Continue })
    }

    fn rule_name(&self) -> &'static str {
        "optional"
    }
}

/// Character length bounds. Absent data counts as length zero.
#[derive(Debug, Clone, Default)]
pub struct Length {
    pub min: Option<usize>,
    pub max: Option<usize>,
    pub message: Option<String>,
}

impl Length {
    pub fn new(min: usize, max: usize) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
            message: None,
        }
    }

    pub fn min(min: usize) -> Self {
        Self {
            min: Some(min),
            ..Self::default()
        }
    }

    pub fn max(max: usize) -> Self {
        Self {
            max: Some(max),
            ..Self::default()
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    fn default_message(&self) -> String {
        match (self.min, self.max) {
            (Some(_), Some(_)) => "Field must be between {min} and {max} characters long.",
            (Some(_), None) => "Field must be at least {min} characters long.",
            (None, Some(_)) => "Field cannot be longer than {max} characters.",
            (None, None) => "Invalid field length.",
        }
        .to_string()
    }
}

impl Validator for Length {
    fn validate(&self, input: &FieldInput<'_>) -> Result<Flow, RuleError> {
        let len = input.data.as_text().map_or(0, |s| s.chars().count());
        let too_short = self.min.is_some_and(|min| len < min);
        let too_long = self.max.is_some_and(|max| len > max);

        if too_short || too_long {
            let message = message_or(&self.message, || self.default_message());
            return Err(RuleError::new("length", message)
                .param("min", self.min)
                .param("max", self.max)
                .param("length", len));
        }
        Ok(Flow::Continue)
    }

    fn rule_name(&self) -> &'static str {
        "length"
    }
}

/// Inclusive numeric bounds for integer fields.
#[derive(Debug, Clone, Default)]
pub struct NumberRange {
    pub min: Option<i64>,
    pub max: Option<i64>,
    pub message: Option<String>,
}

impl NumberRange {
    pub fn new(min: i64, max: i64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
            message: None,
        }
    }

    pub fn min(min: i64) -> Self {
        Self {
            min: Some(min),
            ..Self::default()
        }
    }

    pub fn max(max: i64) -> Self {
        Self {
            max: Some(max),
            ..Self::default()
        }
    }

    fn default_message(&self) -> String {
        match (self.min, self.max) {
            (Some(_), Some(_)) => "Number must be between {min} and {max}.",
            (Some(_), None) => "Number must be at least {min}.",
            (None, Some(_)) => "Number must be at most {max}.",
            (None, None) => "Invalid number.",
        }
        .to_string()
    }
}

impl Validator for NumberRange {
    fn validate(&self, input: &FieldInput<'_>) -> Result<Flow, RuleError> {
        let in_range = match input.data {
            FieldValue::Integer(n) => {
                self.min.map_or(true, |min| *n >= min) && self.max.map_or(true, |max| *n <= max)
            }
            _ => false,
        };
        if in_range {
            return Ok(Flow::Continue);
        }
        let message = message_or(&self.message, || self.default_message());
        Err(RuleError::new("number_range", message)
            .param("min", self.min)
            .param("max", self.max))
    }

    fn rule_name(&self) -> &'static str {
        "number_range"
    }
}

/// Email address format.
#[derive(Debug, Clone, Default)]
pub struct Email {
    pub message: Option<String>,
}

impl Email {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Validator for Email {
    fn validate(&self, input: &FieldInput<'_>) -> Result<Flow, RuleError> {
        match input.data.as_text() {
            Some(value) if value.to_string().validate_email() => Ok(Flow::Continue),
            _ => {
                let message = message_or(&self.message, || "Invalid email address.".to_string());
                Err(RuleError::new("email", message))
            }
        }
    }

    fn rule_name(&self) -> &'static str {
        "email"
    }
}

/// Absolute URL format.
#[derive(Debug, Clone, Default)]
pub struct Url {
    pub message: Option<String>,
}

impl Url {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Validator for Url {
    fn validate(&self, input: &FieldInput<'_>) -> Result<Flow, RuleError> {
        match input.data.as_text() {
            Some(value) if value.to_string().validate_url() => Ok(Flow::Continue),
            _ => {
                let message = message_or(&self.message, || "Invalid URL.".to_string());
                Err(RuleError::new("url", message))
            }
        }
    }

    fn rule_name(&self) -> &'static str {
        "url"
    }
}

/// Text must match a regular expression.
#[derive(Debug, Clone)]
pub struct Regexp {
    regex: Regex,
    pub message: Option<String>,
}

impl Regexp {
    /// Compile `pattern`. Fails on an invalid pattern.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
            message: None,
        })
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl Validator for Regexp {
    fn validate(&self, input: &FieldInput<'_>) -> Result<Flow, RuleError> {
        match input.data.as_text() {
            Some(value) if self.regex.is_match(value) => Ok(Flow::Continue),
            _ => {
                let message = message_or(&self.message, || "Invalid input.".to_string());
                Err(RuleError::new("regexp", message).param("pattern", self.regex.as_str()))
            }
        }
    }

    fn rule_name(&self) -> &'static str {
        "regexp"
    }
}

/// Text must be one of the listed values.
#[derive(Debug, Clone, Default)]
pub struct AnyOf {
    pub values: Vec<String>,
    pub message: Option<String>,
}

impl AnyOf {
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            values: values.into_iter().map(Into::into).collect(),
            message: None,
        }
    }
}

impl Validator for AnyOf {
    fn validate(&self, input: &FieldInput<'_>) -> Result<Flow, RuleError> {
        let value = input.data.to_string();
        if self.values.iter().any(|v| *v == value) {
            return Ok(Flow::Continue);
        }
        let message = message_or(&self.message, || {
            "Invalid value, must be one of: {values}.".to_string()
        });
        Err(RuleError::new("any_of", message).param("values", self.values.join(", ")))
    }

    fn rule_name(&self) -> &'static str {
        "any_of"
    }
}

/// Text must not be one of the listed values.
#[derive(Debug, Clone, Default)]
pub struct NoneOf {
    pub values: Vec<String>,
    pub message: Option<String>,
}

impl NoneOf {
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            values: values.into_iter().map(Into::into).collect(),
            message: None,
        }
    }
}

impl Validator for NoneOf {
    fn validate(&self, input: &FieldInput<'_>) -> Result<Flow, RuleError> {
        let value = input.data.to_string();
        if !self.values.iter().any(|v| *v == value) {
            return Ok(Flow::Continue);
        }
        let message = message_or(&self.message, || {
            "Invalid value, can't be any of: {values}.".to_string()
        });
        Err(RuleError::new("none_of", message).param("values", self.values.join(", ")))
    }

    fn rule_name(&self) -> &'static str {
        "none_of"
    }
}

/// Data must equal the data of another field in the same form.
#[derive(Debug, Clone)]
pub struct EqualTo {
    pub other: String,
    pub message: Option<String>,
}

impl EqualTo {
    pub fn new(other: impl Into<String>) -> Self {
        Self {
            other: other.into(),
            message: None,
        }
    }
}

impl Validator for EqualTo {
    fn validate(&self, input: &FieldInput<'_>) -> Result<Flow, RuleError> {
        let Some(other) = input.form.get(&self.other) else {
            return Err(RuleError::new(
                "equal_to",
                format!("Invalid field name '{}'.", self.other),
            ));
        };
        if other == input.data {
            return Ok(Flow::Continue);
        }
        let message = message_or(&self.message, || "Field must be equal to {other}.".to_string());
        Err(RuleError::new("equal_to", message).param("other", &self.other))
    }

    fn rule_name(&self) -> &'static str {
        "equal_to"
    }
}
