//! Payment step: method choice, plus card details when paying by card.

use super::StepValidator;
use checkout_types::{
	FieldRules, FieldSet, FormSchema, PaymentMethod, Rule, StepId, ValidationResult,
};
use once_cell::sync::Lazy;

pub const PAYMENT_METHOD: &str = "payment_method";
pub const CARD_NAME: &str = "card_name";
pub const CARD_NUMBER: &str = "card_number";
pub const EXPIRY: &str = "expiry";
pub const CVV: &str = "cvv";

// Card rules are only evaluated while the method is "card".
static SCHEMA: Lazy<FormSchema> = Lazy::new(|| {
	FormSchema::new(vec![FieldRules::new(
		PAYMENT_METHOD,
		vec![
			Rule::Required,
			Rule::one_of(PaymentMethod::ALL.map(PaymentMethod::as_str)),
		],
	)])
	.when(
		PAYMENT_METHOD,
		PaymentMethod::Card.as_str(),
		vec![
			FieldRules::new(CARD_NAME, vec![Rule::Required, Rule::MinLength(5)]),
			FieldRules::new(
				CARD_NUMBER,
				vec![
					Rule::Required,
					Rule::pattern(r"[0-9]{16}").expect("card number pattern is valid"),
				],
			),
			FieldRules::new(
				EXPIRY,
				vec![
					Rule::Required,
					Rule::pattern(r"(0[1-9]|1[0-2])/[0-9]{2}").expect("expiry pattern is valid"),
				],
			),
			FieldRules::new(
				CVV,
				vec![
					Rule::Required,
					Rule::pattern(r"[0-9]{3,4}").expect("cvv pattern is valid"),
				],
			),
		],
	)
});

/// Validator for the payment step.
pub struct PaymentValidator;

impl StepValidator for PaymentValidator {
	fn step(&self) -> StepId {
		StepId::Payment
	}

	fn template(&self) -> FieldSet {
		[PAYMENT_METHOD, CARD_NAME, CARD_NUMBER, EXPIRY, CVV]
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

	fn with(values: &[(&str, &str)]) -> FieldSet {
		let mut fields = PaymentValidator.template();
		for (name, value) in values {
			fields.set_value(name, *value).unwrap();
		}
		fields
	}

	#[test]
	fn test_paypal_ignores_card_fields() {
		let fields = with(&[
			(PAYMENT_METHOD, "paypal"),
			(CARD_NUMBER, "not-a-number"),
			(CVV, "12"),
			(EXPIRY, "13/99"),
		]);
		assert!(PaymentValidator.is_valid(&fields));
	}

	#[test]
	fn test_bank_needs_no_card_fields() {
		assert!(PaymentValidator.is_valid(&with(&[(PAYMENT_METHOD, "bank")])));
	}

	#[test]
	fn test_card_requires_all_card_fields() {
		let result = PaymentValidator.validate(&with(&[(PAYMENT_METHOD, "card")]));
		for field in [CARD_NAME, CARD_NUMBER, EXPIRY, CVV] {
			assert!(result.has(field, &ValidationReason::Required), "{}", field);
		}
	}

	#[test]
	fn test_card_field_formats() {
		let valid = [
			(PAYMENT_METHOD, "card"),
			(CARD_NAME, "Ada Lovelace"),
			(CARD_NUMBER, "4111111111111111"),
			(EXPIRY, "12/27"),
			(CVV, "123"),
		];
		assert!(PaymentValidator.is_valid(&with(&valid)));

		let invalid = with(&[
			(PAYMENT_METHOD, "card"),
			(CARD_NAME, "Ada"),
			(CARD_NUMBER, "411111111111111"),
			(EXPIRY, "13/27"),
			(CVV, "12345"),
		]);
		let result = PaymentValidator.validate(&invalid);
		assert!(result.has(CARD_NAME, &ValidationReason::MinLength(5)));
		assert!(result.has(CARD_NUMBER, &ValidationReason::PatternMismatch));
		assert!(result.has(EXPIRY, &ValidationReason::PatternMismatch));
		assert!(result.has(CVV, &ValidationReason::PatternMismatch));
	}

	#[test]
	fn test_four_digit_cvv_and_month_bounds() {
		for (expiry, ok) in [("01/30", true), ("00/30", false), ("1/30", false), ("10/3", false)] {
			let fields = with(&[
				(PAYMENT_METHOD, "card"),
				(CARD_NAME, "Ada Lovelace"),
				(CARD_NUMBER, "4111111111111111"),
				(EXPIRY, expiry),
				(CVV, "1234"),
			]);
			assert_eq!(PaymentValidator.is_valid(&fields), ok, "{}", expiry);
		}
	}

	#[test]
	fn test_unknown_method_not_allowed() {
		let result = PaymentValidator.validate(&with(&[(PAYMENT_METHOD, "cash")]));
		assert!(result.has(PAYMENT_METHOD, &ValidationReason::NotAllowed));
	}
}
