//! Built-in "create shift" workflow

use super::controller::WizardController;
use super::step::{StepDefinition, WizardDefinition};
use crate::error::GateResult;
use crate::utils::validation::FieldValidator;

/// Step title keys, in order. Display text comes from the translation layer.
pub const CREATE_SHIFT_STEPS: [&str; 4] = ["createShift", "shiftInformation", "productDetails", "notes"];

const DATE_PATTERN: &str = r"^\d{4}-\d{2}-\d{2}$";
const TIME_PATTERN: &str = r"^([01]\d|2[0-3]):[0-5]\d$";

/// The four-step shift creation wizard.
pub fn create_shift() -> GateResult<WizardDefinition> {
    let [create, information, products, notes] = CREATE_SHIFT_STEPS;

    Ok(WizardDefinition::new()
        .step(
            StepDefinition::new(create)
                .field("shiftName", FieldValidator::required().max_length(80))
                .field("location", FieldValidator::required()),
        )
        .step(
            StepDefinition::new(information)
                .field(
                    "date",
                    FieldValidator::required().pattern(DATE_PATTERN, "Date must be YYYY-MM-DD")?,
                )
                .field(
                    "startTime",
                    FieldValidator::required().pattern(TIME_PATTERN, "StartTime must be HH:MM")?,
                )
                .field(
                    "endTime",
                    FieldValidator::required().pattern(TIME_PATTERN, "EndTime must be HH:MM")?,
                ),
        )
        .step(
            StepDefinition::new(products)
                .field("product", FieldValidator::required())
                .field("quantity", FieldValidator::required().numeric()),
        )
        .step(StepDefinition::new(notes).field("notes", FieldValidator::optional().max_length(500))))
}

/// A controller positioned on the first step of [`create_shift`].
pub fn create_shift_wizard() -> GateResult<WizardController> {
    WizardController::new(create_shift()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definition_shape() {
        let definition = create_shift().unwrap();
        let titles: Vec<&str> = definition.steps().iter().map(|s| s.title()).collect();
        assert_eq!(titles, CREATE_SHIFT_STEPS.to_vec());

        assert_eq!(
            definition.steps()[1].required_fields(),
            vec!["date", "startTime", "endTime"]
        );
        assert!(definition.steps()[3].required_fields().is_empty());
    }

    #[test]
    fn test_time_pattern() {
        let mut wizard = create_shift_wizard().unwrap();
        wizard.set_field_value(1, "date", "2024-05-01").unwrap();
        wizard.set_field_value(1, "startTime", "25:00").unwrap();
        wizard.set_field_value(1, "endTime", "17:30").unwrap();

        let errors = wizard.validate_step(1).unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.get("startTime").map(String::as_str), Some("StartTime must be HH:MM"));
    }
}
