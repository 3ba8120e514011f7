//! Event types published by a wizard session.
//!
//! Every field edit and step transition produces one event. Events flow through
//! the session's event bus so that views and tests can observe state changes
//! without polling.

use crate::StepId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Events emitted by a checkout wizard session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WizardEvent {
	/// A field value on a step was changed.
	FieldChanged { step: StepId, field: String },
	/// The session moved forward after the current step validated.
	Advanced { from: StepId, to: StepId },
	/// An advance was refused; the step's fields are now marked visited.
	AdvanceBlocked {
		step: StepId,
		failed_fields: Vec<String>,
	},
	/// The session moved back one step.
	Retreated { from: StepId, to: StepId },
	/// The session jumped directly to a step.
	Jumped { from: StepId, to: StepId },
	/// The order was placed and the session is complete.
	OrderPlaced { order_id: String, total: Decimal },
	/// The session was discarded and restarted at the first step.
	Reset,
}
