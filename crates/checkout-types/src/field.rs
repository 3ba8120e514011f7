//! Field-level state for form inputs.
//!
//! A [`FieldSet`] is the flat collection of named inputs that backs one form
//! control (for the wizard, one step). Each field carries its current value plus
//! the two interaction flags that decide whether validation messages are shown:
//! `dirty` (the user changed the value) and `visited` (the user focused and left
//! the field, or a failed submission forced it).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Errors raised when addressing fields that do not exist or have another kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
	/// The field name is not part of the field set.
	#[error("Unknown field: {0}")]
	UnknownField(String),
	/// A value of the wrong kind was written to a field.
	#[error("Field '{field}' expects a {expected} value")]
	KindMismatch { field: String, expected: &'static str },
}

/// Current value of a single input.
///
/// Text inputs, selects and radio groups hold text; checkboxes hold a flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
	/// A checkbox state.
	Flag(bool),
	/// Free text or the value of the selected option.
	Text(String),
}

impl FieldValue {
	/// Name of the value kind, used in error messages.
	pub fn kind(&self) -> &'static str {
		match self {
			FieldValue::Flag(_) => "flag",
			FieldValue::Text(_) => "text",
		}
	}

	/// Returns the text content, or `None` for flags.
	pub fn as_text(&self) -> Option<&str> {
		match self {
			FieldValue::Text(s) => Some(s),
			FieldValue::Flag(_) => None,
		}
	}

	/// Returns the flag state, or `None` for text values.
	pub fn as_flag(&self) -> Option<bool> {
		match self {
			FieldValue::Flag(b) => Some(*b),
			FieldValue::Text(_) => None,
		}
	}

	/// An empty string counts as "no value". Flags always carry a value.
	pub fn is_empty(&self) -> bool {
		matches!(self, FieldValue::Text(s) if s.is_empty())
	}
}

impl Default for FieldValue {
	fn default() -> Self {
		FieldValue::Text(String::new())
	}
}

impl fmt::Display for FieldValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			FieldValue::Flag(b) => write!(f, "{}", b),
			FieldValue::Text(s) => f.write_str(s),
		}
	}
}

impl From<&str> for FieldValue {
	fn from(value: &str) -> Self {
		FieldValue::Text(value.to_string())
	}
}

impl From<String> for FieldValue {
	fn from(value: String) -> Self {
		FieldValue::Text(value)
	}
}

impl From<bool> for FieldValue {
	fn from(value: bool) -> Self {
		FieldValue::Flag(value)
	}
}

/// Value plus interaction flags for one input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldState {
	/// Current value.
	pub value: FieldValue,
	/// Set once the value has been modified.
	pub dirty: bool,
	/// Set once the field has been visited (blurred or force-marked).
	pub visited: bool,
}

impl FieldState {
	fn new(value: FieldValue) -> Self {
		Self {
			value,
			dirty: false,
			visited: false,
		}
	}
}

/// Named inputs of a single form control.
///
/// Field names are fixed when the set is built; values and flags change as
/// the user interacts with the form. Validity is never stored here, it is
/// derived on demand by a [`crate::FormSchema`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSet {
	fields: BTreeMap<String, FieldState>,
}

impl FieldSet {
	/// Creates an empty field set.
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds a field with its initial value.
	pub fn with_field(mut self, name: impl Into<String>, initial: impl Into<FieldValue>) -> Self {
		self.fields
			.insert(name.into(), FieldState::new(initial.into()));
		self
	}

	pub fn contains(&self, name: &str) -> bool {
		self.fields.contains_key(name)
	}

	pub fn get(&self, name: &str) -> Option<&FieldState> {
		self.fields.get(name)
	}

	pub fn value(&self, name: &str) -> Option<&FieldValue> {
		self.fields.get(name).map(|f| &f.value)
	}

	/// Text content of a field; empty for unknown fields and flags.
	pub fn text(&self, name: &str) -> &str {
		self.value(name).and_then(FieldValue::as_text).unwrap_or("")
	}

	/// Flag state of a field; `false` for unknown fields and text values.
	pub fn flag(&self, name: &str) -> bool {
		self.value(name)
			.and_then(FieldValue::as_flag)
			.unwrap_or(false)
	}

	/// Writes a new value and marks the field dirty.
	///
	/// The new value must have the same kind as the field's initial value.
	pub fn set_value(
		&mut self,
		name: &str,
		value: impl Into<FieldValue>,
	) -> Result<(), FieldError> {
		let value = value.into();
		let state = self
			.fields
			.get_mut(name)
			.ok_or_else(|| FieldError::UnknownField(name.to_string()))?;

		if state.value.kind() != value.kind() {
			return Err(FieldError::KindMismatch {
				field: name.to_string(),
				expected: state.value.kind(),
			});
		}

		state.value = value;
		state.dirty = true;
		Ok(())
	}

	/// Marks a single field as visited.
	pub fn mark_visited(&mut self, name: &str) -> Result<(), FieldError> {
		let state = self
			.fields
			.get_mut(name)
			.ok_or_else(|| FieldError::UnknownField(name.to_string()))?;
		state.visited = true;
		Ok(())
	}

	/// Flips every field's visited flag to true. Idempotent.
	pub fn mark_all_visited(&mut self) {
		for state in self.fields.values_mut() {
			state.visited = true;
		}
	}

	pub fn all_visited(&self) -> bool {
		self.fields.values().all(|f| f.visited)
	}

	/// True when any field has been modified.
	pub fn is_dirty(&self) -> bool {
		self.fields.values().any(|f| f.dirty)
	}

	pub fn len(&self) -> usize {
		self.fields.len()
	}

	pub fn is_empty(&self) -> bool {
		self.fields.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldState)> {
		self.fields.iter().map(|(k, v)| (k.as_str(), v))
	}

	/// Snapshot of the current values, keyed by field name.
	pub fn values(&self) -> BTreeMap<String, FieldValue> {
		self.fields
			.iter()
			.map(|(k, v)| (k.clone(), v.value.clone()))
			.collect()
	}
}
