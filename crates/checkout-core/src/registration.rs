//! Account registration form.
//!
//! A grouped form with an `account` section, a `profile` section and a
//! resizable list of phone numbers. The account email is additionally checked
//! for availability; the form is only submitted once that check has found the
//! address free.

use crate::availability::{AsyncFieldCheck, AvailabilityChecker, AvailabilityError, CheckStatus, Ticket};
use checkout_types::{
	FieldRules, FieldSet, FieldValue, FormArray, FormControl, FormError, FormGroup, FormSchema,
	Rule, ValidationReason, ValidationResult,
};
use once_cell::sync::Lazy;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

pub const ACCOUNT: &str = "account";
pub const PROFILE: &str = "profile";
pub const PHONES: &str = "phones";

pub const USERNAME: &str = "account.username";
pub const EMAIL: &str = "account.email";
pub const PASSWORD: &str = "account.password";
pub const CONFIRM_PASSWORD: &str = "account.confirm_password";
pub const FIRST_NAME: &str = "profile.first_name";
pub const LAST_NAME: &str = "profile.last_name";
pub const AGE: &str = "profile.age";

/// Minimum number of phone entries.
pub const MIN_PHONES: usize = 1;

static ACCOUNT_SCHEMA: Lazy<Arc<FormSchema>> = Lazy::new(|| {
	Arc::new(FormSchema::new(vec![
		FieldRules::new("username", vec![Rule::Required, Rule::MinLength(3)]),
		FieldRules::new("email", vec![Rule::Required, Rule::Email]),
		FieldRules::new("password", vec![Rule::Required, Rule::MinLength(8)]),
		FieldRules::new("confirm_password", vec![Rule::Required]),
	]))
});

static PROFILE_SCHEMA: Lazy<Arc<FormSchema>> = Lazy::new(|| {
	Arc::new(FormSchema::new(vec![
		FieldRules::new("first_name", vec![Rule::Required]),
		FieldRules::new("last_name", vec![Rule::Required]),
		FieldRules::new(
			"age",
			vec![Rule::pattern(r"[0-9]{1,3}").expect("age pattern is valid")],
		),
	]))
});

static PHONE_SCHEMA: Lazy<Arc<FormSchema>> = Lazy::new(|| {
	Arc::new(FormSchema::new(vec![
		FieldRules::new("label", vec![Rule::Required]),
		FieldRules::new(
			"number",
			vec![
				Rule::Required,
				Rule::pattern(r"[0-9+()\s-]{6,}").expect("phone pattern is valid"),
			],
		),
	]))
});

/// Errors returned by [`RegistrationForm::submit`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
	#[error("Email availability check is still pending")]
	CheckPending,
	#[error("Email availability has not been confirmed")]
	CheckRequired,
	#[error("Form has {} invalid field(s)", .0.failed_fields().count())]
	Invalid(ValidationResult),
}

/// A phone entry of a submitted registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Phone {
	pub label: String,
	pub number: String,
}

/// Data produced by a successful submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Registration {
	pub username: String,
	pub email: String,
	pub first_name: String,
	pub last_name: String,
	pub age: Option<u32>,
	pub phones: Vec<Phone>,
}

/// Registration form state.
#[derive(Debug, Clone)]
pub struct RegistrationForm {
	form: FormGroup,
	email_check: AsyncFieldCheck,
}

impl Default for RegistrationForm {
	fn default() -> Self {
		Self::new()
	}
}

impl RegistrationForm {
	pub fn new() -> Self {
		let account = ["username", "email", "password", "confirm_password"]
			.into_iter()
			.fold(FieldSet::new(), |fields, name| fields.with_field(name, ""));
		let profile = ["first_name", "last_name", "age"]
			.into_iter()
			.fold(FieldSet::new(), |fields, name| fields.with_field(name, ""));
		let phone = FieldSet::new()
			.with_field("label", "mobile")
			.with_field("number", "");

		let form = FormGroup::new()
			.with_control(ACCOUNT, FormControl::new(account, ACCOUNT_SCHEMA.clone()))
			.with_control(PROFILE, FormControl::new(profile, PROFILE_SCHEMA.clone()))
			.with_array(
				PHONES,
				FormArray::new(phone, PHONE_SCHEMA.clone(), MIN_PHONES),
			)
			.with_check(|form| {
				let confirm = form.text(CONFIRM_PASSWORD);
				if !confirm.is_empty() && confirm != form.text(PASSWORD) {
					vec![(
						CONFIRM_PASSWORD.to_string(),
						ValidationReason::Mismatch("password".to_string()),
					)]
				} else {
					Vec::new()
				}
			});

		Self {
			form,
			email_check: AsyncFieldCheck::new(EMAIL),
		}
	}

	pub fn value(&self, path: &str) -> Option<&FieldValue> {
		self.form.value(path)
	}

	/// Sets the value at a dotted path (`account.email`, `phones[0].number`).
	///
	/// Changing the email drops any availability result for the old address.
	pub fn set_value(&mut self, path: &str, value: impl Into<FieldValue>) -> Result<(), FormError> {
		self.form.set_value(path, value)?;
		if path == EMAIL {
			self.email_check.clear();
		}
		Ok(())
	}

	pub fn mark_visited(&mut self, path: &str) -> Result<(), FormError> {
		self.form.mark_visited(path)
	}

	pub fn phone_count(&self) -> usize {
		self.form.array(PHONES).map_or(0, FormArray::len)
	}

	/// Appends an empty phone entry and returns its index.
	pub fn add_phone(&mut self) -> Option<usize> {
		self.form.array_mut(PHONES).map(FormArray::push)
	}

	/// Removes the phone entry at `index`. Returns `false` if there was none.
	pub fn remove_phone(&mut self, index: usize) -> bool {
		self.form
			.array_mut(PHONES)
			.and_then(|phones| phones.remove(index))
			.is_some()
	}

	pub fn email_status(&self) -> &CheckStatus {
		self.email_check.status()
	}

	/// Starts an availability check for the current email.
	///
	/// Returns the ticket and the address to look up; the caller feeds the
	/// answer back through [`complete_email_check`](Self::complete_email_check).
	pub fn begin_email_check(&mut self) -> (Ticket, String) {
		let email = self.form.text(EMAIL).to_string();
		(self.email_check.begin(), email)
	}

	pub fn complete_email_check(
		&mut self,
		ticket: Ticket,
		result: Result<bool, AvailabilityError>,
	) -> bool {
		self.email_check.complete(ticket, result)
	}

	/// Checks the current email against `checker` and waits for the answer.
	pub async fn check_email(&mut self, checker: &dyn AvailabilityChecker) -> &CheckStatus {
		let email = self.form.text(EMAIL).to_string();
		self.email_check.run(checker, &email).await
	}

	/// Validates the whole form, including the email availability result.
	pub fn validate(&self) -> ValidationResult {
		let mut result = self.form.validate();
		if let Some(reason) = self.email_check.reason() {
			result.add(EMAIL, reason);
		}
		result
	}

	pub fn is_valid(&self) -> bool {
		self.validate().is_valid()
	}

	/// Marks every field visited and, if the form is complete, returns its data.
	///
	/// A syntactically valid email is only accepted after a completed check
	/// found it available.
	pub fn submit(&mut self) -> Result<Registration, SubmitError> {
		self.form.mark_all_visited();

		if self.email_check.is_pending() {
			tracing::warn!("Registration submitted while email check is pending");
			return Err(SubmitError::CheckPending);
		}
		let result = self.validate();
		if !result.is_valid() {
			tracing::warn!(failed = ?result.failed_fields().collect::<Vec<_>>(), "Registration is invalid");
			return Err(SubmitError::Invalid(result));
		}
		if self.email_check.status() != &CheckStatus::Available {
			tracing::warn!(status = ?self.email_check.status(), "Registration email has not been checked");
			return Err(SubmitError::CheckRequired);
		}

		let phones = self
			.form
			.array(PHONES)
			.map(|phones| {
				phones
					.iter()
					.map(|phone| Phone {
						label: phone.text("label").to_string(),
						number: phone.text("number").to_string(),
					})
					.collect()
			})
			.unwrap_or_default();

		let registration = Registration {
			username: self.form.text(USERNAME).to_string(),
			email: self.form.text(EMAIL).to_string(),
			first_name: self.form.text(FIRST_NAME).to_string(),
			last_name: self.form.text(LAST_NAME).to_string(),
			age: self.form.text(AGE).parse().ok(),
			phones,
		};
		tracing::info!(username = %registration.username, phones = registration.phones.len(), "Registration submitted");
		Ok(registration)
	}
}
