//! Step and choice types for the checkout wizard.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when parsing one of the enumerated choices fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown {kind}: '{value}'")]
pub struct ParseChoiceError {
	pub kind: &'static str,
	pub value: String,
}

/// The four checkout steps, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepId {
	Cart,
	Shipping,
	Payment,
	Confirmation,
}

impl StepId {
	/// All steps in wizard order.
	pub const ALL: [StepId; 4] = [
		StepId::Cart,
		StepId::Shipping,
		StepId::Payment,
		StepId::Confirmation,
	];

	/// 1-based ordinal position.
	pub fn position(self) -> usize {
		match self {
			StepId::Cart => 1,
			StepId::Shipping => 2,
			StepId::Payment => 3,
			StepId::Confirmation => 4,
		}
	}

	pub fn from_position(position: usize) -> Option<Self> {
		position
			.checked_sub(1)
			.and_then(|i| Self::ALL.get(i).copied())
	}

	pub fn as_str(self) -> &'static str {
		match self {
			StepId::Cart => "cart",
			StepId::Shipping => "shipping",
			StepId::Payment => "payment",
			StepId::Confirmation => "confirmation",
		}
	}

	/// Human-readable label shown in the step indicator.
	pub fn label(self) -> &'static str {
		match self {
			StepId::Cart => "Cart",
			StepId::Shipping => "Shipping Information",
			StepId::Payment => "Payment",
			StepId::Confirmation => "Review & Confirm",
		}
	}
}

impl fmt::Display for StepId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for StepId {
	type Err = ParseChoiceError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::ALL
			.into_iter()
			.find(|step| step.as_str() == s)
			.ok_or_else(|| ParseChoiceError {
				kind: "step",
				value: s.to_string(),
			})
	}
}

/// A configured wizard step. Immutable once the wizard is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Step {
	/// 1-based position in the wizard.
	pub position: usize,
	pub id: StepId,
	pub label: String,
}

impl From<StepId> for Step {
	fn from(id: StepId) -> Self {
		Self {
			position: id.position(),
			id,
			label: id.label().to_string(),
		}
	}
}

/// Delivery speed chosen on the cart step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShippingMethod {
	Standard,
	Express,
	Overnight,
}

impl ShippingMethod {
	pub const ALL: [ShippingMethod; 3] = [
		ShippingMethod::Standard,
		ShippingMethod::Express,
		ShippingMethod::Overnight,
	];

	pub fn as_str(self) -> &'static str {
		match self {
			ShippingMethod::Standard => "standard",
			ShippingMethod::Express => "express",
			ShippingMethod::Overnight => "overnight",
		}
	}
}

impl fmt::Display for ShippingMethod {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for ShippingMethod {
	type Err = ParseChoiceError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::ALL
			.into_iter()
			.find(|m| m.as_str() == s)
			.ok_or_else(|| ParseChoiceError {
				kind: "shipping method",
				value: s.to_string(),
			})
	}
}

/// Payment method chosen on the payment step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
	Card,
	Paypal,
	Bank,
}

impl PaymentMethod {
	pub const ALL: [PaymentMethod; 3] = [PaymentMethod::Card, PaymentMethod::Paypal, PaymentMethod::Bank];

	pub fn as_str(self) -> &'static str {
		match self {
			PaymentMethod::Card => "card",
			PaymentMethod::Paypal => "paypal",
			PaymentMethod::Bank => "bank",
		}
	}
}

impl fmt::Display for PaymentMethod {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for PaymentMethod {
	type Err = ParseChoiceError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::ALL
			.into_iter()
			.find(|m| m.as_str() == s)
			.ok_or_else(|| ParseChoiceError {
				kind: "payment method",
				value: s.to_string(),
			})
	}
}

/// Whether `jump_to` may skip ahead over steps that do not validate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationPolicy {
	/// Any in-range jump is permitted.
	Open,
	/// Forward jumps require every earlier step to validate.
	#[default]
	RequirePriorValid,
}

/// When currency figures are rounded to cents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingOrder {
	/// Figures are computed exactly and rounded only when presented.
	#[default]
	Presentation,
	/// Subtotal, shipping and tax are rounded first and the total is their sum.
	PerComponent,
}
