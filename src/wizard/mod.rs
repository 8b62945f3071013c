//! Multi-step form wizards
//!
//! A [`WizardController`] walks a fixed [`WizardDefinition`], gating forward
//! moves on per-step field validation and reporting progress for the UI.

pub mod controller;
pub mod shift;
pub mod step;

pub use controller::{
    AdvanceOutcome, FinishOutcome, StepStatus, WizardController, WizardProgress, WizardSubmission,
};
pub use shift::{create_shift, create_shift_wizard, CREATE_SHIFT_STEPS};
pub use step::{StepDefinition, WizardDefinition, WizardStep};
