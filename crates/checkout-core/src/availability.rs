//! Asynchronous availability checks for a single field.
//!
//! A check is started for a value and resolves later, by which time the value
//! may have changed again. Each start issues a new [`Ticket`]; only the result
//! for the latest ticket is applied and anything older is discarded as stale.

use async_trait::async_trait;
use checkout_config::ValidationConfig;
use checkout_types::ValidationReason;
use serde::Serialize;
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by an availability backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AvailabilityError {
	/// The backend could not answer.
	#[error("Availability backend error: {0}")]
	Backend(String),
}

/// Backend that decides whether a value (such as an email address) is still free.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AvailabilityChecker: Send + Sync {
	/// Returns `true` when the value is not yet taken.
	async fn is_available(&self, value: &str) -> Result<bool, AvailabilityError>;
}

/// In-process directory that answers after a fixed delay.
///
/// Reserved values are compared case-insensitively.
#[derive(Debug, Clone)]
pub struct SimulatedDirectory {
	delay: Duration,
	reserved: HashSet<String>,
}

impl SimulatedDirectory {
	pub fn new<I, S>(delay: Duration, reserved: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		Self {
			delay,
			reserved: reserved
				.into_iter()
				.map(|s| s.as_ref().to_lowercase())
				.collect(),
		}
	}

	pub fn from_config(config: &ValidationConfig) -> Self {
		Self::new(
			Duration::from_millis(config.email_check_delay_ms),
			&config.reserved_emails,
		)
	}
}

#[async_trait]
impl AvailabilityChecker for SimulatedDirectory {
	async fn is_available(&self, value: &str) -> Result<bool, AvailabilityError> {
		tokio::time::sleep(self.delay).await;
		Ok(!self.reserved.contains(&value.trim().to_lowercase()))
	}
}

/// Identity of one started check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

/// State of the latest check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "error")]
pub enum CheckStatus {
	Idle,
	Pending,
	Available,
	Unavailable,
	Failed(String),
}

/// Tracks the latest availability check for one field.
#[derive(Debug, Clone)]
pub struct AsyncFieldCheck {
	field: String,
	latest: u64,
	status: CheckStatus,
}

impl AsyncFieldCheck {
	pub fn new(field: impl Into<String>) -> Self {
		Self {
			field: field.into(),
			latest: 0,
			status: CheckStatus::Idle,
		}
	}

	pub fn status(&self) -> &CheckStatus {
		&self.status
	}

	pub fn is_pending(&self) -> bool {
		self.status == CheckStatus::Pending
	}

	/// The reason to report on the field, if the value was found taken.
	pub fn reason(&self) -> Option<ValidationReason> {
		(self.status == CheckStatus::Unavailable).then_some(ValidationReason::Unavailable)
	}

	/// Starts a new check. Any check still in flight becomes stale.
	pub fn begin(&mut self) -> Ticket {
		self.latest += 1;
		self.status = CheckStatus::Pending;
		tracing::debug!(field = %self.field, ticket = self.latest, "Availability check started");
		Ticket(self.latest)
	}

	/// Drops any in-flight check and returns to idle.
	pub fn clear(&mut self) {
		self.latest += 1;
		self.status = CheckStatus::Idle;
	}

	/// Applies a result. Returns `false` when the ticket is stale and the
	/// result was discarded.
	pub fn complete(&mut self, ticket: Ticket, result: Result<bool, AvailabilityError>) -> bool {
		if ticket.0 != self.latest {
			tracing::warn!(
				field = %self.field,
				ticket = ticket.0,
				latest = self.latest,
				"Discarding stale availability result"
			);
			return false;
		}

		self.status = match result {
			Ok(true) => CheckStatus::Available,
			Ok(false) => CheckStatus::Unavailable,
			Err(e) => {
				tracing::warn!(field = %self.field, error = %e, "Availability check failed");
				CheckStatus::Failed(e.to_string())
			},
		};
		tracing::debug!(field = %self.field, ticket = ticket.0, status = ?self.status, "Availability check resolved");
		true
	}

	/// Runs a check to completion against `checker`.
	pub async fn run(&mut self, checker: &dyn AvailabilityChecker, value: &str) -> &CheckStatus {
		let ticket = self.begin();
		let result = checker.is_available(value).await;
		self.complete(ticket, result);
		&self.status
	}
}
