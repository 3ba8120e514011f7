//! Per-step validity rules for the checkout wizard.
//!
//! Each step has one validator that owns the step's field layout (its
//! template) and the schema that decides whether the step may be left.
//! Validation is pure and synchronous; results are derived on every call.

use checkout_types::{FieldSet, StepId, ValidationResult};

pub mod cart;
pub mod confirmation;
pub mod payment;
pub mod shipping;

pub use cart::CartValidator;
pub use confirmation::ConfirmationValidator;
pub use payment::PaymentValidator;
pub use shipping::ShippingValidator;

/// Trait implemented by each step's validator.
pub trait StepValidator: Send + Sync {
	/// The step this validator guards.
	fn step(&self) -> StepId;

	/// Fresh field set for the step, with every field at its initial value.
	fn template(&self) -> FieldSet;

	/// Validates the step's fields.
	fn validate(&self, fields: &FieldSet) -> ValidationResult;

	fn is_valid(&self, fields: &FieldSet) -> bool {
		self.validate(fields).is_valid()
	}
}

/// The validators of all wizard steps, in step order.
pub struct StepValidators {
	validators: Vec<Box<dyn StepValidator>>,
}

impl Default for StepValidators {
	fn default() -> Self {
		Self::new()
	}
}

impl StepValidators {
	/// Creates the standard validator set for the four checkout steps.
	pub fn new() -> Self {
		Self {
			validators: vec![
				Box::new(CartValidator),
				Box::new(ShippingValidator),
				Box::new(PaymentValidator),
				Box::new(ConfirmationValidator),
			],
		}
	}

	/// Validator for a step.
	pub fn for_step(&self, step: StepId) -> &dyn StepValidator {
		self.validators[step.position() - 1].as_ref()
	}

	pub fn validate(&self, step: StepId, fields: &FieldSet) -> ValidationResult {
		self.for_step(step).validate(fields)
	}

	pub fn is_valid(&self, step: StepId, fields: &FieldSet) -> bool {
		self.for_step(step).is_valid(fields)
	}

	/// Fresh field sets for every step, allocated up front.
	pub fn templates(&self) -> Vec<FieldSet> {
		self.validators.iter().map(|v| v.template()).collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_validators_are_in_step_order() {
		let validators = StepValidators::new();
		for step in StepId::ALL {
			assert_eq!(validators.for_step(step).step(), step);
		}
	}

	#[test]
	fn test_fresh_templates_are_invalid() {
		let validators = StepValidators::new();
		let templates = validators.templates();
		assert_eq!(templates.len(), StepId::ALL.len());

		for (step, fields) in StepId::ALL.into_iter().zip(&templates) {
			assert!(!validators.is_valid(step, fields), "{} should start invalid", step);
			assert!(!fields.is_dirty());
		}
	}
}
