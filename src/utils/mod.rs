//! Shared utilities
//!
//! Currently hosts the field validation primitives used by the wizard and by
//! standalone forms.

pub mod validation;

pub use validation::{
    capitalize_field_name, validate_field, validate_fields, FieldErrors, FieldRule, FieldValidator,
};
