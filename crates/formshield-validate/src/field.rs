//! Form fields: declaration, processing and HTML rendering.

use crate::error::RuleError;
use crate::formdata::FormData;
use crate::rules::{FieldInput, Flow, Validator};
use html_escape::{encode_double_quoted_attribute, encode_text};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Values a checkbox treats as unchecked.
const FALSE_VALUES: &[&str] = &["", "false"];

/// The widget and processing behaviour of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    TextArea,
    Password,
    Hidden,
    Integer,
    Boolean,
    Submit,
    /// Hidden CSRF token: renders the token issued for this request
    /// while its data holds what the client submitted.
    CsrfToken,
}

impl FieldKind {
    fn input_type(self) -> &'static str {
        match self {
            FieldKind::String | FieldKind::TextArea => "text",
            FieldKind::Password => "password",
            FieldKind::Hidden | FieldKind::CsrfToken => "hidden",
            FieldKind::Integer => "number",
            FieldKind::Boolean => "checkbox",
            FieldKind::Submit => "submit",
        }
    }
}

/// Processed field data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FieldValue {
    #[default]
    Empty,
    Text(String),
    Integer(i64),
    Flag(bool),
}

impl FieldValue {
    /// Text content, if the value is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Present and meaningful: non-blank text, any integer, or a checked flag.
    pub fn is_truthy(&self) -> bool {
        match self {
            FieldValue::Empty => false,
            FieldValue::Text(s) => !s.trim().is_empty(),
            FieldValue::Integer(_) => true,
            FieldValue::Flag(b) => *b,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            FieldValue::Empty => serde_json::Value::Null,
            FieldValue::Text(s) => serde_json::Value::String(s.clone()),
            FieldValue::Integer(n) => serde_json::Value::from(*n),
            FieldValue::Flag(b) => serde_json::Value::Bool(*b),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Empty => Ok(()),
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Integer(n) => write!(f, "{n}"),
            FieldValue::Flag(b) => write!(f, "{b}"),
        }
    }
}

/// A single form field.
///
/// Fields are declared with a constructor per kind and chained builder
/// methods, then processed against submitted [`FormData`] by their [`Form`].
///
/// ```rust
/// use formshield_validate::{DataRequired, Field, Length};
///
/// let field = Field::string("msg", "Note")
///     .validator(DataRequired::new())
///     .validator(Length::max(10));
/// assert_eq!(field.name(), "msg");
/// ```
///
/// [`Form`]: crate::Form
#[derive(Debug, Clone)]
pub struct Field {
    name: String,
    label: String,
    kind: FieldKind,
    validators: Vec<Arc<dyn Validator>>,
    default: Option<String>,
    raw_data: Vec<String>,
    data: FieldValue,
    process_errors: Vec<RuleError>,
    errors: Vec<RuleError>,
}

impl Field {
    pub fn new(kind: FieldKind, name: impl Into<String>, label: impl Into<String>) -> Self {
        let mut field = Self {
            name: name.into(),
            label: label.into(),
            kind,
            validators: Vec::new(),
            default: None,
            raw_data: Vec::new(),
            data: FieldValue::Empty,
            process_errors: Vec::new(),
            errors: Vec::new(),
        };
        field.process_default();
        field
    }

    pub fn string(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(FieldKind::String, name, label)
    }

    pub fn text_area(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(FieldKind::TextArea, name, label)
    }

    pub fn password(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(FieldKind::Password, name, label)
    }

    pub fn hidden(name: impl Into<String>) -> Self {
        Self::new(FieldKind::Hidden, name, "")
    }

    pub fn integer(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(FieldKind::Integer, name, label)
    }

    pub fn boolean(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(FieldKind::Boolean, name, label)
    }

    /// A submit button; its label is rendered as the button value.
    pub fn submit(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(FieldKind::Submit, name, label)
    }

    /// Hidden CSRF field rendering `current_token`.
    pub fn csrf_token(name: impl Into<String>, current_token: impl Into<String>) -> Self {
        let mut field = Self::new(FieldKind::CsrfToken, name, "CSRF Token");
        field.default = Some(current_token.into());
        field
    }

    /// Append a validator to the chain.
    pub fn validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validators.push(Arc::new(validator));
        self
    }

    /// Value used when no form data is submitted for the field.
    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default = Some(value.into());
        self.process_default();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn label_text(&self) -> &str {
        &self.label
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn data(&self) -> &FieldValue {
        &self.data
    }

    pub fn raw_data(&self) -> &[String] {
        &self.raw_data
    }

    pub fn errors(&self) -> &[RuleError] {
        &self.errors
    }

    /// Record an error raised outside the validator chain.
    pub fn push_error(&mut self, error: RuleError) {
        self.errors.push(error);
    }

    fn process_default(&mut self) {
        self.data = match (self.kind, self.default.as_deref()) {
            (FieldKind::CsrfToken, _) | (_, None) => match self.kind {
                FieldKind::Boolean | FieldKind::Submit => FieldValue::Flag(false),
                _ => FieldValue::Empty,
            },
            (FieldKind::Integer, Some(value)) => value
                .trim()
                .parse()
                .map(FieldValue::Integer)
                .unwrap_or(FieldValue::Empty),
            (FieldKind::Boolean | FieldKind::Submit, Some(value)) => {
                FieldValue::Flag(!FALSE_VALUES.contains(&value))
            }
            (_, Some(value)) => FieldValue::Text(value.to_string()),
        };
    }

    /// Load the field from submitted form data.
    pub fn process(&mut self, formdata: &FormData) {
        self.process_errors.clear();
        self.process_default();
        self.raw_data = formdata
            .get_all(&self.name)
            .into_iter()
            .map(str::to_string)
            .collect();

        let first = self.raw_data.first().cloned();
        match self.kind {
            FieldKind::Boolean | FieldKind::Submit => {
                let checked = first.is_some_and(|value| !FALSE_VALUES.contains(&value.as_str()));
                self.data = FieldValue::Flag(checked);
            }
            FieldKind::Integer => {
                if let Some(value) = first {
                    match value.trim().parse::<i64>() {
                        Ok(n) => self.data = FieldValue::Integer(n),
                        Err(_) => {
                            self.data = FieldValue::Empty;
                            self.process_errors.push(RuleError::new(
                                "integer",
                                "Not a valid integer value.",
                            ));
                        }
                    }
                }
            }
            _ => {
                if let Some(value) = first {
                    self.data = FieldValue::Text(value);
                }
            }
        }
    }

    /// Run the validator chain; `form` holds the data of every field.
    ///
    /// Returns `true` when the field has no errors afterwards.
    pub fn validate(&mut self, form: &HashMap<String, FieldValue>) -> bool {
        self.errors = self.process_errors.clone();

        let input = FieldInput {
            name: &self.name,
            data: &self.data,
            raw_data: &self.raw_data,
            form,
        };
        let mut found = Vec::new();
        let mut skipped = false;
        for validator in &self.validators {
            match validator.validate(&input) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Stop) => break,
                Ok(Flow::Skip) => {
                    skipped = true;
                    break;
                }
                Err(error) => {
                    let halt = error.is_halting();
                    found.push(error);
                    if halt {
                        break;
                    }
                }
            }
        }

        if skipped {
            self.errors.clear();
        } else {
            self.errors.extend(found);
        }
        self.errors.is_empty()
    }

    fn is_required(&self) -> bool {
        self.validators.iter().any(|v| v.marks_required())
    }

    /// The value placed in the widget's `value` attribute.
    fn widget_value(&self) -> String {
        match self.kind {
            FieldKind::CsrfToken => self.default.clone().unwrap_or_default(),
            FieldKind::Password => String::new(),
            FieldKind::Submit => self.label.clone(),
            FieldKind::Boolean => "y".to_string(),
            FieldKind::Integer => match self.raw_data.first() {
                Some(raw) => raw.clone(),
                None => self.data.to_string(),
            },
            _ => self.data.to_string(),
        }
    }

    /// Render the `<label>` element for this field.
    pub fn label(&self) -> String {
        format!(
            r#"<label for="{}">{}</label>"#,
            encode_double_quoted_attribute(&self.name),
            encode_text(&self.label)
        )
    }

    /// Render the widget HTML.
    pub fn render(&self) -> String {
        let name = encode_double_quoted_attribute(&self.name);
        let required = if self.is_required() { " required" } else { "" };

        if self.kind == FieldKind::TextArea {
            return format!(
                r#"<textarea id="{name}" name="{name}"{required}>{}</textarea>"#,
                encode_text(&self.data.to_string())
            );
        }

        let checked = if self.kind == FieldKind::Boolean && self.data.is_truthy() {
            "checked "
        } else {
            ""
        };
        format!(
            r#"<input {checked}id="{name}" name="{name}"{required} type="{}" value="{}">"#,
            self.kind.input_type(),
            encode_double_quoted_attribute(&self.widget_value())
        )
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl PartialEq for Field {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.kind == other.kind
            && self.data == other.data
            && self.raw_data == other.raw_data
            && self.default == other.default
    }
}
