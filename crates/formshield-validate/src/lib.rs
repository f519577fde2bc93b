//! # formshield validation
//!
//! Declarative HTML form fields for formshield. A form type lists its
//! fields through [`FormFields`]; a [`Form`] processes them against the
//! submitted [`FormData`], runs each field's validator chain and renders the
//! widgets back as HTML.
//!
//! ## Example
//!
//! ```rust
//! use formshield_validate::prelude::*;
//!
//! let mut form = Form::new(vec![
//!     Field::string("msg", "Note")
//!         .validator(DataRequired::new())
//!         .validator(Length::max(10)),
//!     Field::submit("submit", "Submit"),
//! ]);
//!
//! form.process(&FormData::from_urlencoded(b"msg=love+is+beautiful").unwrap());
//! assert!(!form.validate());
//! let errors = form.errors();
//! assert_eq!(errors.get("msg").unwrap()[0].code, "length");
//! assert_eq!(
//!     errors.get("msg").unwrap()[0].message,
//!     "Field cannot be longer than 10 characters."
//! );
//! ```
//!
//! ## Validators
//!
//! - `DataRequired` / `InputRequired` - value must be present (stop the chain)
//! - `Optional` - empty input skips the remaining validators
//! - `Length`, `NumberRange` - bounds on text length or integer value
//! - `Email`, `Url`, `Regexp` - format checks
//! - `AnyOf`, `NoneOf`, `EqualTo` - membership and cross-field checks
//!
//! Validation failures never panic or return `Err`: they are stored on the
//! field and reported through [`Form::errors`].

mod error;
mod field;
mod form;
mod formdata;
mod rules;

pub use error::{RuleError, ValidationErrors};
pub use field::{Field, FieldKind, FieldValue};
pub use form::{Form, FormFields};
pub use formdata::{FormData, FormDataError};
pub use rules::{
    AnyOf, DataRequired, Email, EqualTo, FieldInput, Flow, InputRequired, Length, NoneOf,
    NumberRange, Optional, Regexp, Url, Validator,
};

/// Prelude module for form declarations
pub mod prelude {
    pub use crate::error::{RuleError, ValidationErrors};
    pub use crate::field::{Field, FieldKind, FieldValue};
    pub use crate::form::{Form, FormFields};
    pub use crate::formdata::FormData;
    pub use crate::rules::*;
}
