//! Field validation rules and results.
//!
//! This module provides a small rule engine modelled on the usual form
//! validators (required, length, pattern, email, enumerated choice). Rules are
//! grouped per field into a [`FormSchema`], which evaluates a [`FieldSet`]
//! into a [`ValidationResult`]. Results are plain data and are recomputed on
//! every query, never cached.

use crate::{FieldSet, FieldValue};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

/// Email grammar accepted by the `Email` rule.
static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
	Regex::new(
		r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
	)
	.expect("email pattern is a valid regex")
});

/// Named reason a field failed validation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ValidationReason {
	/// The field has no value.
	Required,
	/// A flag that must be checked is not.
	MustBeTrue,
	/// Text is shorter than the given number of characters.
	MinLength(usize),
	/// Text is longer than the given number of characters.
	MaxLength(usize),
	/// Text does not match the expected pattern.
	PatternMismatch,
	/// Text is not a well-formed email address.
	Email,
	/// The value is not one of the permitted choices.
	NotAllowed,
	/// The value differs from the named field it must equal.
	Mismatch(String),
	/// An asynchronous check reported the value as already taken.
	Unavailable,
}

impl fmt::Display for ValidationReason {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ValidationReason::Required => f.write_str("required"),
			ValidationReason::MustBeTrue => f.write_str("must-be-true"),
			ValidationReason::MinLength(n) => write!(f, "min-length:{}", n),
			ValidationReason::MaxLength(n) => write!(f, "max-length:{}", n),
			ValidationReason::PatternMismatch => f.write_str("pattern-mismatch"),
			ValidationReason::Email => f.write_str("email"),
			ValidationReason::NotAllowed => f.write_str("not-allowed"),
			ValidationReason::Mismatch(other) => write!(f, "mismatch:{}", other),
			ValidationReason::Unavailable => f.write_str("unavailable"),
		}
	}
}

impl Serialize for ValidationReason {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.collect_str(self)
	}
}

/// Outcome of validating a field set: field name to failure reasons.
///
/// An empty result is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
	errors: BTreeMap<String, BTreeSet<ValidationReason>>,
}

impl ValidationResult {
	/// A result with no failures.
	pub fn valid() -> Self {
		Self::default()
	}

	pub fn is_valid(&self) -> bool {
		self.errors.is_empty()
	}

	/// Records a failure reason for a field.
	pub fn add(&mut self, field: impl Into<String>, reason: ValidationReason) {
		self.errors.entry(field.into()).or_default().insert(reason);
	}

	/// Reasons recorded for a field, if any.
	pub fn reasons(&self, field: &str) -> Option<&BTreeSet<ValidationReason>> {
		self.errors.get(field)
	}

	/// Whether a specific reason was recorded for a field.
	pub fn has(&self, field: &str, reason: &ValidationReason) -> bool {
		self.errors
			.get(field)
			.is_some_and(|reasons| reasons.contains(reason))
	}

	/// Names of the fields that failed.
	pub fn failed_fields(&self) -> impl Iterator<Item = &str> {
		self.errors.keys().map(String::as_str)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeSet<ValidationReason>)> {
		self.errors.iter().map(|(k, v)| (k.as_str(), v))
	}

	/// Folds another result in, nesting its field names under `prefix`.
	pub fn merge_prefixed(&mut self, prefix: &str, other: ValidationResult) {
		for (field, reasons) in other.errors {
			self.errors
				.entry(join_path(prefix, &field))
				.or_default()
				.extend(reasons);
		}
	}
}

/// Joins a parent path and a child key (`account` + `email`, `phones` + `[0].number`).
pub fn join_path(prefix: &str, child: &str) -> String {
	if prefix.is_empty() {
		child.to_string()
	} else if child.is_empty() {
		prefix.to_string()
	} else if child.starts_with('[') {
		format!("{}{}", prefix, child)
	} else {
		format!("{}.{}", prefix, child)
	}
}

/// A single built-in validation rule.
///
/// Every rule except `Required` and `RequiredTrue` passes on an empty value,
/// so an empty field reports `required` only.
#[derive(Debug, Clone)]
pub enum Rule {
	/// The field must have a non-empty value.
	Required,
	/// The flag must be exactly `true`.
	RequiredTrue,
	/// Text must have at least this many characters.
	MinLength(usize),
	/// Text must have at most this many characters.
	MaxLength(usize),
	/// Text must match the whole pattern.
	Pattern(Regex),
	/// Text must be a well-formed email address.
	Email,
	/// Text must be one of the listed choices.
	OneOf(Vec<String>),
}

impl Rule {
	/// Builds a pattern rule that must match the whole value.
	pub fn pattern(expr: &str) -> Result<Self, regex::Error> {
		Ok(Rule::Pattern(Regex::new(&format!("^(?:{})$", expr))?))
	}

	/// Builds a choice rule from a list of permitted values.
	pub fn one_of<I, S>(choices: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Rule::OneOf(choices.into_iter().map(Into::into).collect())
	}

	/// Evaluates the rule against a value, returning the failure reason if any.
	pub fn check(&self, value: &FieldValue) -> Option<ValidationReason> {
		match self {
			Rule::Required => value.is_empty().then_some(ValidationReason::Required),
			Rule::RequiredTrue => {
				(value.as_flag() != Some(true)).then_some(ValidationReason::MustBeTrue)
			},
			_ if value.is_empty() => None,
			Rule::MinLength(min) => {
				let len = value.as_text().map_or(0, |s| s.chars().count());
				(len < *min).then_some(ValidationReason::MinLength(*min))
			},
			Rule::MaxLength(max) => {
				let len = value.as_text().map_or(0, |s| s.chars().count());
				(len > *max).then_some(ValidationReason::MaxLength(*max))
			},
			Rule::Pattern(re) => {
				let matched = value.as_text().is_some_and(|s| re.is_match(s));
				(!matched).then_some(ValidationReason::PatternMismatch)
			},
			Rule::Email => {
				let matched = value.as_text().is_some_and(|s| EMAIL_PATTERN.is_match(s));
				(!matched).then_some(ValidationReason::Email)
			},
			Rule::OneOf(choices) => {
				let allowed = value
					.as_text()
					.is_some_and(|s| choices.iter().any(|c| c == s));
				(!allowed).then_some(ValidationReason::NotAllowed)
			},
		}
	}
}

/// Custom per-field check run after the built-in rules.
pub type FieldValidator = Arc<dyn Fn(&FieldValue) -> Option<ValidationReason> + Send + Sync>;

/// Rules attached to one named field.
#[derive(Clone)]
pub struct FieldRules {
	pub name: String,
	pub rules: Vec<Rule>,
	pub validator: Option<FieldValidator>,
}

impl fmt::Debug for FieldRules {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("FieldRules")
			.field("name", &self.name)
			.field("rules", &self.rules)
			.field("validator", &self.validator.is_some())
			.finish()
	}
}

impl FieldRules {
	pub fn new(name: impl Into<String>, rules: Vec<Rule>) -> Self {
		Self {
			name: name.into(),
			rules,
			validator: None,
		}
	}

	/// Adds a custom validator to this field.
	pub fn with_validator<F>(mut self, validator: F) -> Self
	where
		F: Fn(&FieldValue) -> Option<ValidationReason> + Send + Sync + 'static,
	{
		self.validator = Some(Arc::new(validator));
		self
	}

	fn evaluate(&self, fields: &FieldSet, result: &mut ValidationResult) {
		let empty = FieldValue::default();
		let value = fields.value(&self.name).unwrap_or(&empty);

		for rule in &self.rules {
			if let Some(reason) = rule.check(value) {
				result.add(self.name.clone(), reason);
			}
		}

		if let Some(validator) = &self.validator {
			if let Some(reason) = validator(value) {
				result.add(self.name.clone(), reason);
			}
		}
	}
}

/// Rules that only apply while another field holds a given value.
#[derive(Debug, Clone)]
pub struct ConditionalRules {
	pub field: String,
	pub equals: FieldValue,
	pub rules: Vec<FieldRules>,
}

/// Validation schema for one field set.
///
/// Unconditional field rules are always evaluated; conditional blocks are
/// evaluated only when their trigger field currently equals the trigger value.
#[derive(Debug, Clone, Default)]
pub struct FormSchema {
	pub fields: Vec<FieldRules>,
	pub conditional: Vec<ConditionalRules>,
}

impl FormSchema {
	pub fn new(fields: Vec<FieldRules>) -> Self {
		Self {
			fields,
			conditional: Vec::new(),
		}
	}

	/// Adds rules that apply only while `field` equals `equals`.
	pub fn when(
		mut self,
		field: impl Into<String>,
		equals: impl Into<FieldValue>,
		rules: Vec<FieldRules>,
	) -> Self {
		self.conditional.push(ConditionalRules {
			field: field.into(),
			equals: equals.into(),
			rules,
		});
		self
	}

	/// Validates a field set against this schema.
	pub fn validate(&self, fields: &FieldSet) -> ValidationResult {
		let mut result = ValidationResult::valid();

		for rules in &self.fields {
			rules.evaluate(fields, &mut result);
		}

		for block in &self.conditional {
			if fields.value(&block.field) == Some(&block.equals) {
				for rules in &block.rules {
					rules.evaluate(fields, &mut result);
				}
			}
		}

		result
	}
}
