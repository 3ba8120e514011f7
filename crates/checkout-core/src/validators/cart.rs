//! Cart step: a shipping method must be chosen.

use super::StepValidator;
use checkout_types::{FieldRules, FieldSet, FormSchema, Rule, ShippingMethod, StepId, ValidationResult};
use once_cell::sync::Lazy;

pub const SHIPPING_METHOD: &str = "shipping_method";
pub const GIFT_MESSAGE: &str = "gift_message";

static SCHEMA: Lazy<FormSchema> = Lazy::new(|| {
	FormSchema::new(vec![
		FieldRules::new(
			SHIPPING_METHOD,
			vec![
				Rule::Required,
				Rule::one_of(ShippingMethod::ALL.map(ShippingMethod::as_str)),
			],
		),
		FieldRules::new(GIFT_MESSAGE, vec![Rule::MaxLength(200)]),
	])
});

/// Validator for the cart step.
pub struct CartValidator;

impl StepValidator for CartValidator {
	fn step(&self) -> StepId {
		StepId::Cart
	}

	fn template(&self) -> FieldSet {
		FieldSet::new()
			.with_field(SHIPPING_METHOD, "")
			.with_field(GIFT_MESSAGE, "")
	}

	fn validate(&self, fields: &FieldSet) -> ValidationResult {
		SCHEMA.validate(fields)
	}
}
