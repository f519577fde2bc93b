//! Forms: ordered field collections bound to submitted data.

use crate::error::ValidationErrors;
use crate::field::{Field, FieldValue};
use crate::formdata::FormData;
use std::collections::HashMap;
use std::fmt;

/// Declares the fields of a form type.
///
/// ```rust
/// use formshield_validate::{DataRequired, Field, Form, FormData, FormFields, Length};
///
/// struct NoteForm;
///
/// impl FormFields for NoteForm {
///     fn fields() -> Vec<Field> {
///         vec![
///             Field::string("msg", "Note")
///                 .validator(DataRequired::new())
///                 .validator(Length::max(10)),
///             Field::submit("submit", "Submit"),
///         ]
///     }
/// }
///
/// let formdata: FormData = [("msg", "happy")].into_iter().collect();
/// let mut form = Form::of::<NoteForm>(&formdata);
/// assert!(form.validate());
/// ```
pub trait FormFields: Send + Sync + 'static {
    fn fields() -> Vec<Field>;
}

/// An ordered set of fields processed against one submission.
#[derive(Debug, Clone, Default)]
pub struct Form {
    fields: Vec<Field>,
}

impl Form {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Build the fields of `F` and process them against `formdata`.
    pub fn of<F: FormFields>(formdata: &FormData) -> Self {
        let mut form = Self::new(F::fields());
        form.process(formdata);
        form
    }

    /// Insert a field ahead of the declared ones.
    pub fn prepend(&mut self, field: Field) {
        self.fields.insert(0, field);
    }

    pub fn process(&mut self, formdata: &FormData) {
        for field in &mut self.fields {
            field.process(formdata);
        }
    }

    /// Validate every field. Returns `true` when no field has errors.
    pub fn validate(&mut self) -> bool {
        let snapshot = self.snapshot();
        let mut valid = true;
        for field in &mut self.fields {
            valid &= field.validate(&snapshot);
        }
        valid
    }

    fn snapshot(&self) -> HashMap<String, FieldValue> {
        self.fields
            .iter()
            .map(|f| (f.name().to_string(), f.data().clone()))
            .collect()
    }

    /// Errors of every field that has any.
    pub fn errors(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        for field in &self.fields {
            errors.extend_field(field.name(), field.errors().iter().cloned());
        }
        errors
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name() == name)
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut Field> {
        self.fields.iter_mut().find(|f| f.name() == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Field> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Processed data as a JSON object keyed by field name.
    pub fn data(&self) -> serde_json::Value {
        let map: serde_json::Map<String, serde_json::Value> = self
            .fields
            .iter()
            .map(|f| (f.name().to_string(), f.data().to_json()))
            .collect();
        serde_json::Value::Object(map)
    }

    /// Concatenated widget HTML of every field.
    pub fn render(&self) -> String {
        self.fields.iter().map(Field::render).collect()
    }
}

impl fmt::Display for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl<'a> IntoIterator for &'a Form {
    type Item = &'a Field;
    type IntoIter = std::slice::Iter<'a, Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}
