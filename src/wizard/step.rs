use crate::utils::validation::{FieldErrors, FieldValidator};
use serde::Serialize;
use std::collections::BTreeMap;

/// Declaration of one wizard step: its title key and registered fields.
#[derive(Debug, Clone)]
pub struct StepDefinition {
    title: String,
    fields: Vec<(String, FieldValidator)>,
}

impl StepDefinition {
    /// `title` is an opaque display key resolved by the translation layer.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            fields: Vec::new(),
        }
    }

    /// Registers a field. Registering the same name twice replaces its validator.
    pub fn field(mut self, name: impl Into<String>, validator: FieldValidator) -> Self {
        let name = name.into();
        match self.fields.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = validator,
            None => self.fields.push((name, validator)),
        }
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Registered fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValidator)> {
        self.fields.iter().map(|(name, v)| (name.as_str(), v))
    }

    pub fn validator(&self, field: &str) -> Option<&FieldValidator> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, v)| v)
    }

    pub fn required_fields(&self) -> Vec<&str> {
        self.fields()
            .filter(|(_, v)| v.is_required())
            .map(|(name, _)| name)
            .collect()
    }
}

/// Ordered list of steps; fixed once a controller is built from it.
#[derive(Debug, Clone, Default)]
pub struct WizardDefinition {
    steps: Vec<StepDefinition>,
}

impl WizardDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(mut self, step: StepDefinition) -> Self {
        self.steps.push(step);
        self
    }

    pub fn steps(&self) -> &[StepDefinition] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Runtime state of one step: entered values and the errors from its last validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WizardStep {
    pub(crate) title: String,
    pub(crate) fields: BTreeMap<String, String>,
    pub(crate) errors: FieldErrors,
}

impl WizardStep {
    pub(crate) fn from_definition(definition: &StepDefinition) -> Self {
        Self {
            title: definition.title().to_string(),
            fields: definition
                .fields()
                .map(|(name, _)| (name.to_string(), String::new()))
                .collect(),
            errors: FieldErrors::new(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    pub fn value(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn error(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    /// Whether the last validation of this step passed.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}
