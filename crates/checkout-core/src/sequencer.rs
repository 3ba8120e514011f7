//! Step sequencing for the checkout wizard.
//!
//! The sequencer owns the ordered step list and the current position. Moving
//! forward is gated by the current step's validator; moving backward never is.
//! Position is always in `[1, N]`.

use crate::validators::StepValidators;
use checkout_types::{FieldSet, NavigationPolicy, Step, StepId, ValidationResult};
use serde::Serialize;
use thiserror::Error;

/// Errors returned when a jump is refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationError {
	#[error("Step {position} is out of range (1..={len})")]
	OutOfRange { position: usize, len: usize },
	#[error("Cannot skip ahead: step '{0}' is not valid")]
	Blocked(StepId),
	#[error("Session is completed; reset to start a new order")]
	Completed,
}

/// A change of position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Transition {
	pub from: StepId,
	pub to: StepId,
}

/// Result of an advance request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
	/// The current step validated and the position moved forward.
	Moved(Transition),
	/// The current step did not validate; its fields are now marked visited.
	Blocked {
		step: StepId,
		result: ValidationResult,
	},
	/// The final step validated; the caller places the order.
	Finished,
}

/// Ordered steps plus the current position.
#[derive(Debug, Clone)]
pub struct StepSequencer {
	steps: Vec<Step>,
	/// 1-based.
	position: usize,
	policy: NavigationPolicy,
}

impl StepSequencer {
	/// Creates a sequencer over the four checkout steps, positioned at the first.
	pub fn new(policy: NavigationPolicy) -> Self {
		Self {
			steps: StepId::ALL.into_iter().map(Step::from).collect(),
			position: 1,
			policy,
		}
	}

	pub fn current_position(&self) -> usize {
		self.position
	}

	pub fn current_step(&self) -> &Step {
		&self.steps[self.position - 1]
	}

	pub fn steps(&self) -> &[Step] {
		&self.steps
	}

	pub fn len(&self) -> usize {
		self.steps.len()
	}

	pub fn is_last(&self) -> bool {
		self.position == self.steps.len()
	}

	pub fn policy(&self) -> NavigationPolicy {
		self.policy
	}

	/// Moves forward if the current step's fields validate.
	///
	/// On failure every field of the current step is marked visited so that
	/// its error messages become visible, and the position is unchanged.
	pub fn advance(&mut self, validators: &StepValidators, current: &mut FieldSet) -> Advance {
		let step = self.current_step().id;
		let result = validators.validate(step, current);

		if !result.is_valid() {
			current.mark_all_visited();
			return Advance::Blocked { step, result };
		}

		if self.is_last() {
			return Advance::Finished;
		}

		self.position += 1;
		Advance::Moved(Transition {
			from: step,
			to: self.current_step().id,
		})
	}

	/// Moves back one step. No-op at the first step.
	pub fn retreat(&mut self) -> Option<Transition> {
		if self.position <= 1 {
			return None;
		}
		let from = self.current_step().id;
		self.position -= 1;
		Some(Transition {
			from,
			to: self.current_step().id,
		})
	}

	/// Jumps directly to a 1-based position.
	///
	/// Backward jumps are always allowed. Forward jumps under
	/// [`NavigationPolicy::RequirePriorValid`] need every step strictly before
	/// the target to validate. Jumping to the current position is a no-op.
	pub fn jump_to(
		&mut self,
		target: usize,
		validators: &StepValidators,
		field_sets: &[FieldSet],
	) -> Result<Option<Transition>, NavigationError> {
		let Some(to) = StepId::from_position(target) else {
			return Err(NavigationError::OutOfRange {
				position: target,
				len: self.steps.len(),
			});
		};
		if target == self.position {
			return Ok(None);
		}

		if target > self.position && self.policy == NavigationPolicy::RequirePriorValid {
			for step in &self.steps[..target - 1] {
				let valid = field_sets
					.get(step.position - 1)
					.is_some_and(|fields| validators.is_valid(step.id, fields));
				if !valid {
					return Err(NavigationError::Blocked(step.id));
				}
			}
		}

		let from = self.current_step().id;
		self.position = target;
		Ok(Some(Transition { from, to }))
	}

	/// Returns to the first step.
	pub fn reset(&mut self) {
		self.position = 1;
	}
}
