//! Scripted sessions.
//!
//! A script is a TOML file with an `[[actions]]` list. Each action is applied
//! to a [`WizardSession`] in order and produces a [`Report`] holding the
//! outcome and the resulting step view.

use checkout_core::{AdvanceOutcome, SessionError, StepView, WizardSession};
use checkout_types::{FieldValue, OrderSummary, StepId};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScriptError {
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	#[error("Script error: {0}")]
	Parse(String),
}

/// One user interaction.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
	/// Edit a field. Without `step` the current step is used.
	Set {
		#[serde(default)]
		step: Option<StepId>,
		field: String,
		value: FieldValue,
	},
	/// Leave a field on the current step without editing it.
	Touch { field: String },
	Advance,
	Retreat,
	Jump { position: usize },
	PlaceOrder,
	Reset,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Script {
	#[serde(default)]
	pub actions: Vec<Action>,
}

impl FromStr for Script {
	type Err = ScriptError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		toml::from_str(s).map_err(|e| ScriptError::Parse(e.message().to_string()))
	}
}

impl Script {
	pub async fn from_file(path: &Path) -> Result<Self, ScriptError> {
		let content = tokio::fs::read_to_string(path).await?;
		content.parse()
	}
}

/// What an action did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Outcome {
	Updated,
	Moved { from: StepId, to: StepId },
	Unchanged,
	Blocked { step: StepId, failed_fields: Vec<String> },
	Placed { summary: OrderSummary },
	Reset,
	Rejected { error: String },
}

/// Outcome of one action plus the view it left behind.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
	pub index: usize,
	pub action: Action,
	pub outcome: Outcome,
	pub view: StepView,
}

/// Applies a single action.
///
/// Refused operations are reported as [`Outcome::Rejected`]; they never abort
/// the replay.
pub fn apply(session: &mut WizardSession, action: &Action) -> Outcome {
	match run(session, action) {
		Ok(outcome) => outcome,
		Err(e) => {
			tracing::warn!(session = %session.id(), action = ?action, error = %e, "Action rejected");
			Outcome::Rejected {
				error: e.to_string(),
			}
		},
	}
}

fn run(session: &mut WizardSession, action: &Action) -> Result<Outcome, SessionError> {
	let current = session.current_step().id;
	let outcome = match action {
		Action::Set { step, field, value } => {
			session.set_field(step.unwrap_or(current), field, value.clone())?;
			Outcome::Updated
		},
		Action::Touch { field } => {
			session.mark_visited(current, field)?;
			Outcome::Updated
		},
		Action::Advance => match session.advance()? {
			AdvanceOutcome::Moved(t) => Outcome::Moved {
				from: t.from,
				to: t.to,
			},
			AdvanceOutcome::Blocked { step, result } => Outcome::Blocked {
				step,
				failed_fields: result.failed_fields().map(str::to_string).collect(),
			},
			AdvanceOutcome::Placed(summary) => Outcome::Placed { summary },
		},
		Action::Retreat => moved(session.retreat()?),
		Action::Jump { position } => moved(session.jump_to(*position)?),
		Action::PlaceOrder => Outcome::Placed {
			summary: session.place_order()?.clone(),
		},
		Action::Reset => {
			session.reset();
			Outcome::Reset
		},
	};
	Ok(outcome)
}

fn moved(transition: Option<checkout_core::Transition>) -> Outcome {
	match transition {
		Some(t) => Outcome::Moved {
			from: t.from,
			to: t.to,
		},
		None => Outcome::Unchanged,
	}
}

/// Replays every action of a script against the session.
pub fn replay(session: &mut WizardSession, script: &Script) -> Vec<Report> {
	script
		.actions
		.iter()
		.enumerate()
		.map(|(index, action)| {
			let outcome = apply(session, action);
			Report {
				index,
				action: action.clone(),
				outcome,
				view: session.view(),
			}
		})
		.collect()
}
