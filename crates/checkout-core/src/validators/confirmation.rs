//! Confirmation step: terms and privacy policy must both be accepted.

use super::StepValidator;
use checkout_types::{FieldRules, FieldSet, FormSchema, Rule, StepId, ValidationResult};
use once_cell::sync::Lazy;

pub const ACCEPT_TERMS: &str = "accept_terms";
pub const ACCEPT_PRIVACY: &str = "accept_privacy";
pub const NEWSLETTER: &str = "newsletter";

static SCHEMA: Lazy<FormSchema> = Lazy::new(|| {
	FormSchema::new(vec![
		FieldRules::new(ACCEPT_TERMS, vec![Rule::RequiredTrue]),
		FieldRules::new(ACCEPT_PRIVACY, vec![Rule::RequiredTrue]),
	])
});

/// Validator for the confirmation step.
pub struct ConfirmationValidator;

impl StepValidator for ConfirmationValidator {
	fn step(&self) -> StepId {
		StepId::Confirmation
	}

	fn template(&self) -> FieldSet {
		FieldSet::new()
			.with_field(ACCEPT_TERMS, false)
			.with_field(ACCEPT_PRIVACY, false)
			.with_field(NEWSLETTER, false)
	}

	fn validate(&self, fields: &FieldSet) -> ValidationResult {
		SCHEMA.validate(fields)
	}
}
