//! Checkout wizard session.
//!
//! A [`WizardSession`] owns the step position, one field set per step (all
//! allocated when the session starts) and, once the order is placed, the
//! resulting [`OrderSummary`]. Every field edit and transition is published on
//! the session's [`EventBus`].

use crate::aggregator::{AggregatorError, CheckoutData, OrderAggregator, Totals};
use crate::events::EventBus;
use crate::sequencer::{Advance, NavigationError, StepSequencer, Transition};
use crate::validators::{cart, StepValidators};
use checkout_config::Config;
use checkout_types::{
	CartItem, FieldError, FieldSet, FieldValue, OrderSummary, ShippingMethod, Step, StepId,
	ValidationResult, WizardEvent,
};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Errors returned by session operations.
///
/// A step that fails validation is not an error; it is reported through
/// [`AdvanceOutcome::Blocked`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
	#[error("Field error: {0}")]
	Field(#[from] FieldError),
	#[error("Navigation error: {0}")]
	Navigation(#[from] NavigationError),
	#[error("Orders can only be placed from the final step")]
	NotAtFinalStep,
	#[error("Step '{0}' is not valid")]
	StepInvalid(StepId),
	#[error("Order error: {0}")]
	Aggregator(#[from] AggregatorError),
}

/// Result of [`WizardSession::advance`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvanceOutcome {
	Moved(Transition),
	/// A step did not validate. Its fields are now marked visited.
	Blocked {
		step: StepId,
		result: ValidationResult,
	},
	/// The final step validated and the order was placed.
	Placed(OrderSummary),
}

/// Render-ready state of one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldView {
	pub name: String,
	pub value: FieldValue,
	pub dirty: bool,
	pub visited: bool,
	/// Reasons shown to the user. Empty until the field is dirty or visited.
	pub errors: Vec<String>,
}

/// Render-ready state of the current step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepView {
	pub position: usize,
	pub total_steps: usize,
	pub step: StepId,
	pub label: String,
	pub valid: bool,
	pub completed: bool,
	pub fields: Vec<FieldView>,
}

/// One run through the checkout wizard.
pub struct WizardSession {
	id: Uuid,
	sequencer: StepSequencer,
	validators: Arc<StepValidators>,
	aggregator: OrderAggregator,
	items: Vec<CartItem>,
	field_sets: Vec<FieldSet>,
	summary: Option<OrderSummary>,
	event_bus: EventBus,
}

impl WizardSession {
	/// Starts a session at the first step with the configured cart.
	pub fn new(config: &Config) -> Self {
		let validators = Arc::new(StepValidators::new());
		let field_sets = validators.templates();
		let session = Self {
			id: Uuid::new_v4(),
			sequencer: StepSequencer::new(config.wizard.navigation),
			validators,
			aggregator: OrderAggregator::from_config(config),
			items: config.catalog.items.clone(),
			field_sets,
			summary: None,
			event_bus: EventBus::new(config.wizard.event_capacity),
		};

		tracing::info!(
			session = %session.id,
			navigation = ?config.wizard.navigation,
			items = session.items.len(),
			"Checkout session started"
		);
		session
	}

	pub fn id(&self) -> Uuid {
		self.id
	}

	pub fn current_position(&self) -> usize {
		self.sequencer.current_position()
	}

	pub fn current_step(&self) -> &Step {
		self.sequencer.current_step()
	}

	pub fn steps(&self) -> &[Step] {
		self.sequencer.steps()
	}

	pub fn items(&self) -> &[CartItem] {
		&self.items
	}

	pub fn fields(&self, step: StepId) -> &FieldSet {
		&self.field_sets[step.position() - 1]
	}

	pub fn summary(&self) -> Option<&OrderSummary> {
		self.summary.as_ref()
	}

	/// True once the order has been placed; only [`reset`](Self::reset) leaves this state.
	pub fn is_completed(&self) -> bool {
		self.summary.is_some()
	}

	pub fn subscribe(&self) -> broadcast::Receiver<WizardEvent> {
		self.event_bus.subscribe()
	}

	pub fn validate(&self, step: StepId) -> ValidationResult {
		self.validators.validate(step, self.fields(step))
	}

	/// Sets a field value on any step and marks it dirty.
	pub fn set_field(
		&mut self,
		step: StepId,
		field: &str,
		value: impl Into<FieldValue>,
	) -> Result<(), SessionError> {
		self.ensure_active()?;
		self.field_sets[step.position() - 1].set_value(field, value)?;

		tracing::debug!(session = %self.id, step = %step, field, "Field changed");
		self.event_bus
			.publish(WizardEvent::FieldChanged {
				step,
				field: field.to_string(),
			})
			.ok();
		Ok(())
	}

	/// Marks a field visited, as when the user leaves the input.
	pub fn mark_visited(&mut self, step: StepId, field: &str) -> Result<(), SessionError> {
		self.ensure_active()?;
		self.field_sets[step.position() - 1].mark_visited(field)?;
		Ok(())
	}

	/// Attempts to leave the current step.
	///
	/// At the final step a successful advance places the order.
	pub fn advance(&mut self) -> Result<AdvanceOutcome, SessionError> {
		self.ensure_active()?;
		let index = self.sequencer.current_position() - 1;

		match self
			.sequencer
			.advance(&self.validators, &mut self.field_sets[index])
		{
			Advance::Moved(transition) => {
				tracing::info!(
					session = %self.id,
					from = %transition.from,
					to = %transition.to,
					position = self.sequencer.current_position(),
					"Advanced"
				);
				self.event_bus
					.publish(WizardEvent::Advanced {
						from: transition.from,
						to: transition.to,
					})
					.ok();
				Ok(AdvanceOutcome::Moved(transition))
			},
			Advance::Blocked { step, result } => {
				self.report_blocked(step, &result);
				Ok(AdvanceOutcome::Blocked { step, result })
			},
			Advance::Finished => match self.first_invalid_step() {
				Some((step, result)) => {
					self.field_sets[step.position() - 1].mark_all_visited();
					self.report_blocked(step, &result);
					Ok(AdvanceOutcome::Blocked { step, result })
				},
				None => Ok(AdvanceOutcome::Placed(self.place()?.clone())),
			},
		}
	}

	/// Moves back one step. No-op at the first step.
	pub fn retreat(&mut self) -> Result<Option<Transition>, SessionError> {
		self.ensure_active()?;
		let transition = self.sequencer.retreat();

		if let Some(transition) = transition {
			tracing::info!(
				session = %self.id,
				from = %transition.from,
				to = %transition.to,
				"Retreated"
			);
			self.event_bus
				.publish(WizardEvent::Retreated {
					from: transition.from,
					to: transition.to,
				})
				.ok();
		}
		Ok(transition)
	}

	/// Jumps to a 1-based step position under the configured navigation policy.
	pub fn jump_to(&mut self, position: usize) -> Result<Option<Transition>, SessionError> {
		self.ensure_active()?;
		let transition = self
			.sequencer
			.jump_to(position, &self.validators, &self.field_sets)
			.inspect_err(|e| {
				tracing::warn!(session = %self.id, target = position, error = %e, "Jump refused");
			})?;

		if let Some(transition) = transition {
			tracing::info!(
				session = %self.id,
				from = %transition.from,
				to = %transition.to,
				"Jumped"
			);
			self.event_bus
				.publish(WizardEvent::Jumped {
					from: transition.from,
					to: transition.to,
				})
				.ok();
		}
		Ok(transition)
	}

	/// Places the order from the final step.
	///
	/// Every step must validate. The first invalid step has its fields marked
	/// visited and is reported as [`SessionError::StepInvalid`].
	pub fn place_order(&mut self) -> Result<&OrderSummary, SessionError> {
		self.ensure_active()?;
		if !self.sequencer.is_last() {
			return Err(SessionError::NotAtFinalStep);
		}

		let last = self.sequencer.current_step().id;
		if let Some((step, result)) = self.first_invalid_step() {
			self.field_sets[step.position() - 1].mark_all_visited();
			self.report_blocked(step, &result);
			return Err(SessionError::StepInvalid(step));
		}
		let result = self.validate(last);
		if !result.is_valid() {
			self.field_sets[last.position() - 1].mark_all_visited();
			self.report_blocked(last, &result);
			return Err(SessionError::StepInvalid(last));
		}

		self.place()
	}

	/// Discards all entered data and the summary, and returns to the first step.
	pub fn reset(&mut self) {
		let previous = self.id;
		self.id = Uuid::new_v4();
		self.field_sets = self.validators.templates();
		self.sequencer.reset();
		self.summary = None;

		tracing::info!(session = %self.id, previous = %previous, "Session reset");
		self.event_bus.publish(WizardEvent::Reset).ok();
	}

	/// Render-ready view of the current step.
	pub fn view(&self) -> StepView {
		let step = self.sequencer.current_step();
		let fields = self.fields(step.id);
		let result = self.validators.validate(step.id, fields);

		let fields = fields
			.iter()
			.map(|(name, state)| {
				let errors = if state.dirty || state.visited {
					result
						.reasons(name)
						.map(|reasons| reasons.iter().map(ToString::to_string).collect())
						.unwrap_or_default()
				} else {
					Vec::new()
				};
				FieldView {
					name: name.to_string(),
					value: state.value.clone(),
					dirty: state.dirty,
					visited: state.visited,
					errors,
				}
			})
			.collect();

		StepView {
			position: step.position,
			total_steps: self.sequencer.len(),
			step: step.id,
			label: step.label.clone(),
			valid: result.is_valid(),
			completed: self.is_completed(),
			fields,
		}
	}

	/// Totals for the current cart and selected shipping method, if one is selected.
	pub fn totals_preview(&self) -> Option<Totals> {
		let method: ShippingMethod = self
			.fields(StepId::Cart)
			.text(cart::SHIPPING_METHOD)
			.parse()
			.ok()?;
		self.aggregator.totals(&self.items, method).ok()
	}

	fn ensure_active(&self) -> Result<(), SessionError> {
		if self.is_completed() {
			return Err(NavigationError::Completed.into());
		}
		Ok(())
	}

	/// First step before the final one that does not validate.
	fn first_invalid_step(&self) -> Option<(StepId, ValidationResult)> {
		let last = self.sequencer.len();
		self.sequencer.steps()[..last - 1].iter().find_map(|step| {
			let result = self.validate(step.id);
			(!result.is_valid()).then_some((step.id, result))
		})
	}

	fn place(&mut self) -> Result<&OrderSummary, SessionError> {
		let data = CheckoutData {
			items: &self.items,
			cart: &self.field_sets[0],
			payment: &self.field_sets[2],
			confirmation: &self.field_sets[3],
		};
		let summary = self.aggregator.finalize(data)?;

		tracing::info!(
			session = %self.id,
			order_id = %summary.order_id,
			total = %summary.total,
			"Order placed"
		);
		self.event_bus
			.publish(WizardEvent::OrderPlaced {
				order_id: summary.order_id.clone(),
				total: summary.total,
			})
			.ok();

		Ok(&*self.summary.insert(summary))
	}

	fn report_blocked(&self, step: StepId, result: &ValidationResult) {
		let failed_fields: Vec<String> = result.failed_fields().map(str::to_string).collect();
		tracing::warn!(
			session = %self.id,
			step = %step.label(),
			failed = ?failed_fields,
			"Step is not valid"
		);
		self.event_bus
			.publish(WizardEvent::AdvanceBlocked {
				step,
				failed_fields,
			})
			.ok();
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::validators::{confirmation, payment, shipping};
	use checkout_config::builders::ConfigBuilder;
	use checkout_types::{NavigationPolicy, ValidationReason};
	use rust_decimal::Decimal;
	use std::str::FromStr;

	fn session() -> WizardSession {
		WizardSession::new(&ConfigBuilder::new().build())
	}

	fn fill_cart(s: &mut WizardSession) {
		s.set_field(StepId::Cart, cart::SHIPPING_METHOD, "standard")
			.unwrap();
	}

	fn fill_shipping(s: &mut WizardSession) {
		for (field, value) in [
			(shipping::FIRST_NAME, "Ada"),
			(shipping::LAST_NAME, "Lovelace"),
			(shipping::EMAIL, "ada@example.com"),
			(shipping::PHONE, "+44 20 7946 0000"),
			(shipping::ADDRESS, "12 St James's Square"),
			(shipping::POSTAL_CODE, "10001"),
			(shipping::COUNTRY, "GB"),
		] {
			s.set_field(StepId::Shipping, field, value).unwrap();
		}
	}

	fn fill_payment(s: &mut WizardSession) {
		s.set_field(StepId::Payment, payment::PAYMENT_METHOD, "paypal")
			.unwrap();
	}

	fn accept(s: &mut WizardSession) {
		s.set_field(StepId::Confirmation, confirmation::ACCEPT_TERMS, true)
			.unwrap();
		s.set_field(StepId::Confirmation, confirmation::ACCEPT_PRIVACY, true)
			.unwrap();
	}

	fn walk_to_confirmation(s: &mut WizardSession) {
		fill_cart(s);
		assert!(matches!(s.advance().unwrap(), AdvanceOutcome::Moved(_)));
		fill_shipping(s);
		assert!(matches!(s.advance().unwrap(), AdvanceOutcome::Moved(_)));
		fill_payment(s);
		assert!(matches!(s.advance().unwrap(), AdvanceOutcome::Moved(_)));
		assert_eq!(s.current_position(), 4);
	}

	#[test]
	fn test_new_session_starts_at_first_step() {
		let s = session();
		assert_eq!(s.current_position(), 1);
		assert_eq!(s.current_step().id, StepId::Cart);
		assert!(s.summary().is_none());
		assert_eq!(s.items().len(), 2);
	}

	#[test]
	fn test_blocked_advance_surfaces_errors_in_view() {
		let mut s = session();
		assert!(s.view().fields.iter().all(|f| f.errors.is_empty()));

		let outcome = s.advance().unwrap();
		assert!(matches!(
			outcome,
			AdvanceOutcome::Blocked {
				step: StepId::Cart,
				..
			}
		));
		assert_eq!(s.current_position(), 1);

		let view = s.view();
		let method = view
			.fields
			.iter()
			.find(|f| f.name == cart::SHIPPING_METHOD)
			.unwrap();
		assert!(method.visited);
		assert_eq!(method.errors, vec!["required".to_string()]);
	}

	#[test]
	fn test_errors_shown_once_field_is_dirty() {
		let mut s = session();
		fill_cart(&mut s);
		s.advance().unwrap();
		s.set_field(StepId::Shipping, shipping::POSTAL_CODE, "7500")
			.unwrap();

		let view = s.view();
		assert!(!view.valid);
		let postal = view
			.fields
			.iter()
			.find(|f| f.name == shipping::POSTAL_CODE)
			.unwrap();
		assert_eq!(postal.errors, vec!["pattern-mismatch".to_string()]);
		let email = view
			.fields
			.iter()
			.find(|f| f.name == shipping::EMAIL)
			.unwrap();
		assert!(email.errors.is_empty());
	}

	#[test]
	fn test_full_walkthrough_places_order() {
		let mut s = session();
		walk_to_confirmation(&mut s);

		assert!(matches!(
			s.advance().unwrap(),
			AdvanceOutcome::Blocked {
				step: StepId::Confirmation,
				..
			}
		));
		assert!(s.summary().is_none());

		accept(&mut s);
		let AdvanceOutcome::Placed(summary) = s.advance().unwrap() else {
			panic!("expected order to be placed");
		};
		assert_eq!(summary.total, Decimal::from_str("175.16").unwrap());
		assert_eq!(summary.tax, Decimal::from_str("29.19").unwrap());
		assert!(summary.order_id.starts_with("ORD-"));
		assert_eq!(s.summary(), Some(&summary));
		assert_eq!(s.current_position(), 4);
		assert!(s.is_completed());
	}

	#[test]
	fn test_completed_session_refuses_changes_until_reset() {
		let mut s = session();
		walk_to_confirmation(&mut s);
		accept(&mut s);
		s.place_order().unwrap();

		let completed = SessionError::Navigation(NavigationError::Completed);
		assert_eq!(s.retreat().unwrap_err(), completed);
		assert_eq!(s.jump_to(1).unwrap_err(), completed);
		assert_eq!(
			s.set_field(StepId::Cart, cart::SHIPPING_METHOD, "express")
				.unwrap_err(),
			completed
		);
		assert!(s.place_order().is_err());

		let id = s.id();
		s.reset();
		assert_ne!(s.id(), id);
		assert_eq!(s.current_position(), 1);
		assert!(s.summary().is_none());
		assert!(!s.fields(StepId::Shipping).is_dirty());
		assert_eq!(s.fields(StepId::Cart).text(cart::SHIPPING_METHOD), "");
	}

	#[test]
	fn test_place_order_requires_final_step_and_confirmation() {
		let mut s = session();
		assert_eq!(s.place_order().unwrap_err(), SessionError::NotAtFinalStep);

		walk_to_confirmation(&mut s);
		s.set_field(StepId::Confirmation, confirmation::ACCEPT_TERMS, true)
			.unwrap();
		assert_eq!(
			s.place_order().unwrap_err(),
			SessionError::StepInvalid(StepId::Confirmation)
		);
		assert!(s.fields(StepId::Confirmation).all_visited());
		assert!(s.summary().is_none());
	}

	#[test]
	fn test_open_jump_cannot_place_incomplete_order() {
		let config = ConfigBuilder::new()
			.navigation(NavigationPolicy::Open)
			.build();
		let mut s = WizardSession::new(&config);
		fill_cart(&mut s);
		s.jump_to(4).unwrap();
		accept(&mut s);

		let outcome = s.advance().unwrap();
		let AdvanceOutcome::Blocked { step, result } = outcome else {
			panic!("expected a blocked outcome");
		};
		assert_eq!(step, StepId::Shipping);
		assert!(result.has(shipping::FIRST_NAME, &ValidationReason::Required));
		assert!(s.fields(StepId::Shipping).all_visited());
		assert!(s.summary().is_none());
	}

	#[test]
	fn test_retreat_keeps_values() {
		let mut s = session();
		walk_to_confirmation(&mut s);
		let before: Vec<_> = StepId::ALL.iter().map(|&id| s.fields(id).values()).collect();

		while s.retreat().unwrap().is_some() {}
		assert_eq!(s.current_position(), 1);
		let after: Vec<_> = StepId::ALL.iter().map(|&id| s.fields(id).values()).collect();
		assert_eq!(before, after);
	}

	#[test]
	fn test_strict_jump_refused() {
		let mut s = session();
		assert_eq!(
			s.jump_to(3).unwrap_err(),
			SessionError::Navigation(NavigationError::Blocked(StepId::Cart))
		);
		assert_eq!(s.current_position(), 1);
	}

	#[test]
	fn test_unknown_field_is_an_error() {
		let mut s = session();
		assert!(matches!(
			s.set_field(StepId::Cart, "coupon", "SAVE10"),
			Err(SessionError::Field(FieldError::UnknownField(_)))
		));
	}

	#[test]
	fn test_totals_preview_follows_shipping_choice() {
		let mut s = session();
		assert_eq!(s.totals_preview(), None);

		s.set_field(StepId::Cart, cart::SHIPPING_METHOD, "overnight")
			.unwrap();
		let totals = s.totals_preview().unwrap();
		assert_eq!(totals.shipping_cost, Decimal::from_str("24.99").unwrap());
	}

	#[tokio::test]
	async fn test_events_published_for_edits_and_transitions() {
		let mut s = session();
		let mut rx = s.subscribe();

		s.advance().unwrap();
		fill_cart(&mut s);
		s.advance().unwrap();
		s.retreat().unwrap();

		assert!(matches!(
			rx.recv().await.unwrap(),
			WizardEvent::AdvanceBlocked {
				step: StepId::Cart,
				..
			}
		));
		assert_eq!(
			rx.recv().await.unwrap(),
			WizardEvent::FieldChanged {
				step: StepId::Cart,
				field: cart::SHIPPING_METHOD.to_string()
			}
		);
		assert_eq!(
			rx.recv().await.unwrap(),
			WizardEvent::Advanced {
				from: StepId::Cart,
				to: StepId::Shipping
			}
		);
		assert_eq!(
			rx.recv().await.unwrap(),
			WizardEvent::Retreated {
				from: StepId::Shipping,
				to: StepId::Cart
			}
		);
	}
}
