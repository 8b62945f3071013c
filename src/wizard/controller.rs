use super::step::{WizardDefinition, WizardStep};
use crate::error::{GateError, GateResult};
use crate::utils::validation::{validate_fields, FieldErrors};
use log::debug;
use serde::Serialize;
use std::collections::BTreeMap;

/// Result of an [`advance`](WizardController::advance) request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// The current step was valid and the wizard moved forward.
    Moved { from: usize, to: usize },
    /// The current step was valid but is the last one; nothing changed.
    AtLastStep,
    /// The current step failed validation; the index is unchanged.
    Blocked(FieldErrors),
}

impl AdvanceOutcome {
    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Blocked(_))
    }
}

/// Result of [`finish`](WizardController::finish).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishOutcome {
    Submitted(WizardSubmission),
    /// The first invalid step; the wizard was moved there.
    Blocked { step: usize, errors: FieldErrors },
}

/// Progress marker for one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StepStatus {
    Completed,
    Current,
    Upcoming,
}

/// Data for a progress indicator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WizardProgress {
    pub current: usize,
    pub total: usize,
    /// Share of steps reached, including the current one, in `0..=100`.
    pub percent: u8,
    pub statuses: Vec<StepStatus>,
}

/// All entered values, keyed by step title then field name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WizardSubmission {
    pub values: BTreeMap<String, BTreeMap<String, String>>,
}

impl WizardSubmission {
    pub fn value(&self, step_title: &str, field: &str) -> Option<&str> {
        self.values
            .get(step_title)
            .and_then(|fields| fields.get(field))
            .map(String::as_str)
    }
}

/// Generic N-step form wizard.
///
/// Invariants:
/// - `current_index` is always within `0..steps.len()`
/// - the index only moves forward when the current step validates cleanly
/// - retreating never validates and never discards entered values
/// - the step list never changes after construction
#[derive(Debug, Clone)]
pub struct WizardController {
    definition: WizardDefinition,
    steps: Vec<WizardStep>,
    current_index: usize,
}

impl WizardController {
    pub fn new(definition: WizardDefinition) -> GateResult<Self> {
        if definition.is_empty() {
            return Err(GateError::InvalidArgument(
                "A wizard needs at least one step".to_string(),
            ));
        }

        let steps = definition
            .steps()
            .iter()
            .map(WizardStep::from_definition)
            .collect();

        Ok(Self {
            definition,
            steps,
            current_index: 0,
        })
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_step(&self) -> &WizardStep {
        &self.steps[self.current_index]
    }

    pub fn steps(&self) -> &[WizardStep] {
        &self.steps
    }

    pub fn step(&self, index: usize) -> GateResult<&WizardStep> {
        self.steps.get(index).ok_or_else(|| self.unknown_step(index))
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_first_step(&self) -> bool {
        self.current_index == 0
    }

    pub fn is_last_step(&self) -> bool {
        self.current_index + 1 == self.steps.len()
    }

    /// Stores `value` for a registered field. Does not validate.
    pub fn set_field_value(&mut self, step: usize, field: &str, value: impl Into<String>) -> GateResult<()> {
        let definition = self
            .definition
            .steps()
            .get(step)
            .ok_or_else(|| self.unknown_step(step))?;
        if definition.validator(field).is_none() {
            return Err(GateError::InvalidArgument(format!(
                "Field '{}' is not registered on step {} ({})",
                field,
                step,
                definition.title()
            )));
        }

        self.steps[step].fields.insert(field.to_string(), value.into());
        Ok(())
    }

    /// Validates every registered field of `step`, stores the errors on the
    /// step and returns them.
    pub fn validate_step(&mut self, step: usize) -> GateResult<FieldErrors> {
        if step >= self.steps.len() {
            return Err(self.unknown_step(step));
        }
        Ok(self.run_validation(step))
    }

    pub fn advance(&mut self) -> AdvanceOutcome {
        let from = self.current_index;
        let errors = self.run_validation(from);
        if !errors.is_empty() {
            debug!("Step {} blocked with {} error(s)", from, errors.len());
            return AdvanceOutcome::Blocked(errors);
        }

        if self.is_last_step() {
            return AdvanceOutcome::AtLastStep;
        }

        self.current_index += 1;
        debug!("Wizard advanced {} -> {}", from, self.current_index);
        AdvanceOutcome::Moved {
            from,
            to: self.current_index,
        }
    }

    /// Moves back one step (clamped at 0) and returns the new index.
    pub fn retreat(&mut self) -> usize {
        if self.current_index > 0 {
            self.current_index -= 1;
            debug!("Wizard retreated to {}", self.current_index);
        }
        self.current_index
    }

    pub fn progress(&self) -> WizardProgress {
        let total = self.steps.len();
        let statuses = (0..total)
            .map(|i| match i.cmp(&self.current_index) {
                std::cmp::Ordering::Less => StepStatus::Completed,
                std::cmp::Ordering::Equal => StepStatus::Current,
                std::cmp::Ordering::Greater => StepStatus::Upcoming,
            })
            .collect();

        WizardProgress {
            current: self.current_index,
            total,
            percent: ((self.current_index + 1) * 100 / total) as u8,
            statuses,
        }
    }

    /// Validates every step and collects the values if all pass.
    pub fn finish(&mut self) -> FinishOutcome {
        for index in 0..self.steps.len() {
            let errors = self.run_validation(index);
            if !errors.is_empty() {
                self.current_index = index;
                return FinishOutcome::Blocked { step: index, errors };
            }
        }

        let values = self
            .steps
            .iter()
            .map(|step| (step.title.clone(), step.fields.clone()))
            .collect();
        FinishOutcome::Submitted(WizardSubmission { values })
    }

    fn run_validation(&mut self, index: usize) -> FieldErrors {
        let definition = &self.definition.steps()[index];
        let step = &self.steps[index];
        let errors = validate_fields(definition.fields().map(|(name, validator)| {
            let value = step.fields.get(name).map(String::as_str).unwrap_or("");
            (name, validator, value)
        }));

        self.steps[index].errors = errors.clone();
        errors
    }

    fn unknown_step(&self, index: usize) -> GateError {
        GateError::InvalidArgument(format!(
            "Unknown step index {} (wizard has {} steps)",
            index,
            self.steps.len()
        ))
    }
}
