//! Field validation used by the wizard and by standalone forms
//!
//! Validation is a pure function of `(field, value)`. Callers receive an error
//! mapping and merge it into their own state; nothing here holds or mutates
//! shared state.

use crate::error::{GateError, GateResult};
use regex::Regex;
use std::collections::BTreeMap;

/// Field name -> user-facing error message.
pub type FieldErrors = BTreeMap<String, String>;

/// Upper-cases the first character of a field identifier and leaves the rest alone.
///
/// `"startTime"` becomes `"StartTime"`, not `"Start time"`.
pub fn capitalize_field_name(field: &str) -> String {
    let mut chars = field.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Baseline "required" check.
///
/// Returns `"<Field> is required"` when the value is empty or whitespace-only.
pub fn validate_field(field: &str, value: &str) -> Option<String> {
    if value.trim().is_empty() {
        Some(format!("{} is required", capitalize_field_name(field)))
    } else {
        None
    }
}

/// A single validation rule.
///
/// Every rule except `Required` passes on an empty value, so a field without
/// `Required` stays optional.
#[derive(Debug, Clone)]
pub enum FieldRule {
    Required,
    MinLength(usize),
    MaxLength(usize),
    Numeric,
    Pattern { regex: Regex, message: String },
}

impl FieldRule {
    fn check(&self, field: &str, value: &str) -> Option<String> {
        let trimmed = value.trim();
        match self {
            FieldRule::Required => validate_field(field, value),
            _ if trimmed.is_empty() => None,
            FieldRule::MinLength(min) => (trimmed.chars().count() < *min).then(|| {
                format!(
                    "{} must be at least {} characters",
                    capitalize_field_name(field),
                    min
                )
            }),
            FieldRule::MaxLength(max) => (trimmed.chars().count() > *max).then(|| {
                format!(
                    "{} must be at most {} characters",
                    capitalize_field_name(field),
                    max
                )
            }),
            FieldRule::Numeric => {
                let parsed = trimmed.parse::<f64>().ok().filter(|n| n.is_finite());
                parsed
                    .is_none()
                    .then(|| format!("{} must be a number", capitalize_field_name(field)))
            }
            FieldRule::Pattern { regex, message } => {
                (!regex.is_match(trimmed)).then(|| message.clone())
            }
        }
    }
}

/// Ordered composition of rules for one field. The first failing rule wins.
#[derive(Debug, Clone, Default)]
pub struct FieldValidator {
    rules: Vec<FieldRule>,
}

impl FieldValidator {
    /// A validator with no rules; any value passes.
    pub fn optional() -> Self {
        Self::default()
    }

    /// A validator that starts with the `Required` rule.
    pub fn required() -> Self {
        Self {
            rules: vec![FieldRule::Required],
        }
    }

    pub fn with_rule(mut self, rule: FieldRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn min_length(self, min: usize) -> Self {
        self.with_rule(FieldRule::MinLength(min))
    }

    pub fn max_length(self, max: usize) -> Self {
        self.with_rule(FieldRule::MaxLength(max))
    }

    pub fn numeric(self) -> Self {
        self.with_rule(FieldRule::Numeric)
    }

    /// Adds a regex rule. An invalid pattern is a programming error at the call site.
    pub fn pattern(self, pattern: &str, message: impl Into<String>) -> GateResult<Self> {
        let regex = Regex::new(pattern).map_err(|e| {
            GateError::InvalidArgument(format!("Invalid validation pattern '{}': {}", pattern, e))
        })?;
        Ok(self.with_rule(FieldRule::Pattern {
            regex,
            message: message.into(),
        }))
    }

    pub fn is_required(&self) -> bool {
        self.rules.iter().any(|r| matches!(r, FieldRule::Required))
    }

    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }

    /// Runs the rules in order and returns the first error message, if any.
    pub fn validate(&self, field: &str, value: &str) -> Option<String> {
        self.rules.iter().find_map(|rule| rule.check(field, value))
    }
}

/// Validates a batch of `(field, validator, value)` triples into one error map.
pub fn validate_fields<'a, I>(fields: I) -> FieldErrors
where
    I: IntoIterator<Item = (&'a str, &'a FieldValidator, &'a str)>,
{
    fields
        .into_iter()
        .filter_map(|(field, validator, value)| {
            validator
                .validate(field, value)
                .map(|message| (field.to_string(), message))
        })
        .collect()
}
