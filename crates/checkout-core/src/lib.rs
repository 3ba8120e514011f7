//! Core logic for the checkout wizard.
//!
//! This crate holds the step state machine and everything around it: the
//! per-step validators, the sequencer that gates movement between steps, the
//! order aggregator that produces the final summary, and the session that ties
//! them together and publishes events. It also provides the companion form
//! components: registration with an asynchronous email availability check and
//! the documentation chapter reader.

/// Combines step data into a priced order summary.
pub mod aggregator;
/// Asynchronous availability checks with stale-result discard.
pub mod availability;
pub mod events;
/// Documentation chapter navigation.
pub mod reader;
/// Registration form with grouped fields and a phone list.
pub mod registration;
/// Step position and navigation rules.
pub mod sequencer;
/// Wizard session and render-ready views.
pub mod session;
/// Per-step validation rules.
pub mod validators;

pub use aggregator::{AggregatorError, CheckoutData, OrderAggregator, Totals};
pub use availability::{
	AsyncFieldCheck, AvailabilityChecker, AvailabilityError, CheckStatus, SimulatedDirectory,
	Ticket,
};
pub use events::EventBus;
pub use reader::{Chapter, ChapterReader, ReaderError};
pub use registration::{Registration, RegistrationForm, SubmitError};
pub use sequencer::{Advance, NavigationError, StepSequencer, Transition};
pub use session::{AdvanceOutcome, FieldView, SessionError, StepView, WizardSession};
pub use validators::{StepValidator, StepValidators};
