//! Hierarchical forms: controls, groups and dynamic arrays.
//!
//! A [`FormNode`] tree nests field sets the way grouped forms do. Validity is
//! aggregated bottom-up (a group is valid iff all children are valid and its
//! cross-field checks pass) and results are reported under dotted paths such
//! as `account.email` or `phones[1].number`.

use crate::{FieldError, FieldSet, FieldValue, FormSchema, ValidationReason, ValidationResult};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised when addressing nodes inside a form tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
	/// The path does not lead to a field.
	#[error("Unknown form path: {0}")]
	UnknownPath(String),
	/// An array index is past the end of the array.
	#[error("Index {index} out of range for '{array}'")]
	IndexOutOfRange { array: String, index: usize },
	/// The addressed field rejected the operation.
	#[error(transparent)]
	Field(#[from] FieldError),
}

/// Check spanning several fields of a group (e.g. password confirmation).
///
/// Returns `(path, reason)` pairs relative to the group.
pub type CrossFieldCheck =
	Arc<dyn Fn(&FormGroup) -> Vec<(String, ValidationReason)> + Send + Sync>;

/// A field set bound to the schema that validates it.
#[derive(Debug, Clone)]
pub struct FormControl {
	pub fields: FieldSet,
	schema: Arc<FormSchema>,
}

impl FormControl {
	pub fn new(fields: FieldSet, schema: Arc<FormSchema>) -> Self {
		Self { fields, schema }
	}

	pub fn validate(&self) -> ValidationResult {
		self.schema.validate(&self.fields)
	}
}

/// Ordered, resizable list of field sets sharing one schema.
#[derive(Debug, Clone)]
pub struct FormArray {
	template: FieldSet,
	schema: Arc<FormSchema>,
	items: Vec<FieldSet>,
	min_items: usize,
}

impl FormArray {
	/// Creates an array pre-filled with `min_items` copies of the template.
	pub fn new(template: FieldSet, schema: Arc<FormSchema>, min_items: usize) -> Self {
		let items = vec![template.clone(); min_items];
		Self {
			template,
			schema,
			items,
			min_items,
		}
	}

	/// Appends a fresh item and returns its index.
	pub fn push(&mut self) -> usize {
		self.items.push(self.template.clone());
		self.items.len() - 1
	}

	/// Removes the item at `index`.
	///
	/// Removing below the minimum is allowed; the array then reports
	/// `min-length` until an item is added back.
	pub fn remove(&mut self, index: usize) -> Option<FieldSet> {
		(index < self.items.len()).then(|| self.items.remove(index))
	}

	pub fn get(&self, index: usize) -> Option<&FieldSet> {
		self.items.get(index)
	}

	pub fn get_mut(&mut self, index: usize) -> Option<&mut FieldSet> {
		self.items.get_mut(index)
	}

	pub fn len(&self) -> usize {
		self.items.len()
	}

	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = &FieldSet> {
		self.items.iter()
	}

	/// Validates every item independently; the array itself reports
	/// `min-length` under its own path when too short.
	pub fn validate(&self) -> ValidationResult {
		let mut result = ValidationResult::valid();
		if self.items.len() < self.min_items {
			result.add("", ValidationReason::MinLength(self.min_items));
		}
		for (i, item) in self.items.iter().enumerate() {
			result.merge_prefixed(&format!("[{}]", i), self.schema.validate(item));
		}
		result
	}
}

/// Named children plus group-level checks.
#[derive(Clone, Default)]
pub struct FormGroup {
	children: BTreeMap<String, FormNode>,
	checks: Vec<CrossFieldCheck>,
}

impl fmt::Debug for FormGroup {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("FormGroup")
			.field("children", &self.children)
			.field("checks", &self.checks.len())
			.finish()
	}
}

impl FormGroup {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_control(mut self, name: impl Into<String>, control: FormControl) -> Self {
		self.children.insert(name.into(), FormNode::Control(control));
		self
	}

	pub fn with_group(mut self, name: impl Into<String>, group: FormGroup) -> Self {
		self.children.insert(name.into(), FormNode::Group(group));
		self
	}

	pub fn with_array(mut self, name: impl Into<String>, array: FormArray) -> Self {
		self.children.insert(name.into(), FormNode::Array(array));
		self
	}

	/// Adds a check evaluated after all children.
	pub fn with_check<F>(mut self, check: F) -> Self
	where
		F: Fn(&FormGroup) -> Vec<(String, ValidationReason)> + Send + Sync + 'static,
	{
		self.checks.push(Arc::new(check));
		self
	}

	pub fn child(&self, name: &str) -> Option<&FormNode> {
		self.children.get(name)
	}

	pub fn array(&self, name: &str) -> Option<&FormArray> {
		match self.children.get(name) {
			Some(FormNode::Array(array)) => Some(array),
			_ => None,
		}
	}

	pub fn array_mut(&mut self, name: &str) -> Option<&mut FormArray> {
		match self.children.get_mut(name) {
			Some(FormNode::Array(array)) => Some(array),
			_ => None,
		}
	}

	/// Reads the value at a dotted path.
	pub fn value(&self, path: &str) -> Option<&FieldValue> {
		let segments = parse_path(path).ok()?;
		let (fields, name) = resolve(self, &segments)?;
		fields.value(name)
	}

	/// Text at a dotted path; empty when missing.
	pub fn text(&self, path: &str) -> &str {
		self.value(path)
			.and_then(FieldValue::as_text)
			.unwrap_or("")
	}

	/// Writes the value at a dotted path and marks it dirty.
	pub fn set_value(&mut self, path: &str, value: impl Into<FieldValue>) -> Result<(), FormError> {
		let segments = parse_path(path)?;
		let (fields, name) = resolve_mut(self, &segments, path)?;
		fields.set_value(name, value)?;
		Ok(())
	}

	/// Marks the field at a dotted path as visited.
	pub fn mark_visited(&mut self, path: &str) -> Result<(), FormError> {
		let segments = parse_path(path)?;
		let (fields, name) = resolve_mut(self, &segments, path)?;
		fields.mark_visited(name)?;
		Ok(())
	}

	pub fn validate(&self) -> ValidationResult {
		let mut result = ValidationResult::valid();
		for (name, child) in &self.children {
			result.merge_prefixed(name, child.validate());
		}
		for check in &self.checks {
			for (path, reason) in check(self) {
				result.add(path, reason);
			}
		}
		result
	}

	pub fn is_valid(&self) -> bool {
		self.validate().is_valid()
	}

	/// Marks every field in every descendant as visited.
	pub fn mark_all_visited(&mut self) {
		for child in self.children.values_mut() {
			child.mark_all_visited();
		}
	}
}

/// A node of a form tree.
#[derive(Debug, Clone)]
pub enum FormNode {
	Control(FormControl),
	Group(FormGroup),
	Array(FormArray),
}

impl FormNode {
	pub fn validate(&self) -> ValidationResult {
		match self {
			FormNode::Control(control) => control.validate(),
			FormNode::Group(group) => group.validate(),
			FormNode::Array(array) => array.validate(),
		}
	}

	pub fn is_valid(&self) -> bool {
		self.validate().is_valid()
	}

	pub fn mark_all_visited(&mut self) {
		match self {
			FormNode::Control(control) => control.fields.mark_all_visited(),
			FormNode::Group(group) => group.mark_all_visited(),
			FormNode::Array(array) => {
				for item in &mut array.items {
					item.mark_all_visited();
				}
			},
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment<'p> {
	Key(&'p str),
	Index(usize),
}

/// Splits `phones[1].number` into `Key(phones) Index(1) Key(number)`.
fn parse_path(path: &str) -> Result<Vec<Segment<'_>>, FormError> {
	let invalid = || FormError::UnknownPath(path.to_string());
	let mut segments = Vec::new();

	for part in path.split('.') {
		let (key, mut rest) = match part.find('[') {
			Some(pos) => (&part[..pos], &part[pos..]),
			None => (part, ""),
		};
		if key.is_empty() {
			return Err(invalid());
		}
		segments.push(Segment::Key(key));

		while let Some(stripped) = rest.strip_prefix('[') {
			let end = stripped.find(']').ok_or_else(invalid)?;
			let index = stripped[..end].parse().map_err(|_| invalid())?;
			segments.push(Segment::Index(index));
			rest = &stripped[end + 1..];
		}
		if !rest.is_empty() {
			return Err(invalid());
		}
	}

	Ok(segments)
}

fn resolve<'n, 'p>(group: &'n FormGroup, segments: &[Segment<'p>]) -> Option<(&'n FieldSet, &'p str)> {
	let (Segment::Key(name), rest) = segments.split_first()? else {
		return None;
	};
	match (group.children.get(*name)?, rest) {
		(FormNode::Control(control), [Segment::Key(field)]) => Some((&control.fields, *field)),
		(FormNode::Group(inner), rest) if !rest.is_empty() => resolve(inner, rest),
		(FormNode::Array(array), [Segment::Index(i), Segment::Key(field)]) => {
			Some((array.items.get(*i)?, *field))
		},
		_ => None,
	}
}

fn resolve_mut<'n, 'p>(
	group: &'n mut FormGroup,
	segments: &[Segment<'p>],
	path: &str,
) -> Result<(&'n mut FieldSet, &'p str), FormError> {
	let unknown = || FormError::UnknownPath(path.to_string());
	let Some((Segment::Key(name), rest)) = segments.split_first() else {
		return Err(unknown());
	};
	let child = group.children.get_mut(*name).ok_or_else(unknown)?;

	match (child, rest) {
		(FormNode::Control(control), [Segment::Key(field)]) => Ok((&mut control.fields, *field)),
		(FormNode::Group(inner), rest) => {
			if rest.is_empty() {
				return Err(unknown());
			}
			resolve_mut(inner, rest, path)
		},
		(FormNode::Array(array), [Segment::Index(i), Segment::Key(field)]) => {
			let item = array
				.items
				.get_mut(*i)
				.ok_or_else(|| FormError::IndexOutOfRange {
					array: name.to_string(),
					index: *i,
				})?;
			Ok((item, *field))
		},
		_ => Err(unknown()),
	}
}
