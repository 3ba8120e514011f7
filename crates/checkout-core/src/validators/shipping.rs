//! Shipping step: recipient name, contact details and address.

use super::StepValidator;
use checkout_types::{FieldRules, FieldSet, FormSchema, Rule, StepId, ValidationResult};
use once_cell::sync::Lazy;

pub const FIRST_NAME: &str = "first_name";
pub const LAST_NAME: &str = "last_name";
pub const EMAIL: &str = "email";
pub const PHONE: &str = "phone";
pub const ADDRESS: &str = "address";
pub const POSTAL_CODE: &str = "postal_code";
pub const COUNTRY: &str = "country";

static SCHEMA: Lazy<FormSchema> = Lazy::new(|| {
	FormSchema::new(vec![
		FieldRules::new(FIRST_NAME, vec![Rule::Required, Rule::MinLength(2)]),
		FieldRules::new(LAST_NAME, vec![Rule::Required, Rule::MinLength(2)]),
		FieldRules::new(EMAIL, vec![Rule::Required, Rule::Email]),
		FieldRules::new(
			PHONE,
			vec![
				Rule::Required,
				Rule::pattern(r"[0-9+()\s-]+").expect("phone pattern is valid"),
			],
		),
		FieldRules::new(ADDRESS, vec![Rule::Required, Rule::MinLength(5)]),
		FieldRules::new(
			POSTAL_CODE,
			vec![
				Rule::Required,
				Rule::pattern(r"[0-9]{5}").expect("postal code pattern is valid"),
			],
		),
		FieldRules::new(COUNTRY, vec![Rule::Required]),
	])
});

/// Validator for the shipping step.
pub struct ShippingValidator;

impl StepValidator for ShippingValidator {
	fn step(&self) -> StepId {
		StepId::Shipping
	}

	fn template(&self) -> FieldSet {
		[FIRST_NAME, LAST_NAME, EMAIL, PHONE, ADDRESS, POSTAL_CODE, COUNTRY]
			.into_iter()
			.fold(FieldSet::new(), |fields, name| fields.with_field(name, ""))
	}

	fn validate(&self, fields: &FieldSet) -> ValidationResult {
		SCHEMA.validate(fields)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use checkout_types::ValidationReason;

	fn filled() -> FieldSet {
		let mut fields = ShippingValidator.template();
		for (name, value) in [
			(FIRST_NAME, "Ada"),
			(LAST_NAME, "Lovelace"),
			(EMAIL, "ada@example.com"),
			(PHONE, "+33 (0)1 23-45-67"),
			(ADDRESS, "12 rue de Rivoli"),
			(POSTAL_CODE, "75001"),
			(COUNTRY, "FR"),
		] {
			fields.set_value(name, value).unwrap();
		}
		fields
	}

	#[test]
	fn test_complete_address_is_valid() {
		assert!(ShippingValidator.is_valid(&filled()));
	}

	#[test]
	fn test_four_digit_postal_code_is_pattern_mismatch() {
		let mut fields = filled();
		fields.set_value(POSTAL_CODE, "7500").unwrap();

		let result = ShippingValidator.validate(&fields);
		assert!(!result.is_valid());
		assert!(result.has(POSTAL_CODE, &ValidationReason::PatternMismatch));
		assert_eq!(result.failed_fields().collect::<Vec<_>>(), vec![POSTAL_CODE]);
	}

	#[test]
	fn test_short_names_and_address() {
		let mut fields = filled();
		fields.set_value(FIRST_NAME, "A").unwrap();
		fields.set_value(ADDRESS, "Rue").unwrap();

		let result = ShippingValidator.validate(&fields);
		assert!(result.has(FIRST_NAME, &ValidationReason::MinLength(2)));
		assert!(result.has(ADDRESS, &ValidationReason::MinLength(5)));
	}

	#[test]
	fn test_email_and_phone_format() {
		let mut fields = filled();
		fields.set_value(EMAIL, "ada.example.com").unwrap();
		fields.set_value(PHONE, "call me").unwrap();

		let result = ShippingValidator.validate(&fields);
		assert!(result.has(EMAIL, &ValidationReason::Email));
		assert!(result.has(PHONE, &ValidationReason::PatternMismatch));
	}

	#[test]
	fn test_country_must_be_selected() {
		let mut fields = filled();
		fields.set_value(COUNTRY, "").unwrap();

		assert!(ShippingValidator
			.validate(&fields)
			.has(COUNTRY, &ValidationReason::Required));
	}
}
