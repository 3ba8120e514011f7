//! Cart contents and the final order summary.

use crate::{PaymentMethod, ShippingMethod};
use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Number of decimal places used for presented currency figures.
pub const CURRENCY_SCALE: u32 = 2;

/// Rounds a currency figure to cents, half away from zero.
pub fn round_currency(amount: Decimal) -> Decimal {
	amount.round_dp_with_strategy(CURRENCY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// A line in the shopping cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
	pub sku: String,
	pub name: String,
	/// Unit price.
	pub price: Decimal,
	pub quantity: u32,
}

impl CartItem {
	/// Unit price times quantity, unrounded. `None` when the product does not
	/// fit in a [`Decimal`].
	pub fn line_total(&self) -> Option<Decimal> {
		self.price.checked_mul(Decimal::from(self.quantity))
	}
}

/// Final aggregate created when the order is placed.
///
/// Currency figures are already rounded for presentation. The summary is
/// immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSummary {
	/// Process-unique identifier, e.g. `ORD-1718000000000-1`.
	pub order_id: String,
	pub subtotal: Decimal,
	pub shipping_cost: Decimal,
	pub tax: Decimal,
	pub total: Decimal,
	pub shipping_method: ShippingMethod,
	pub payment_method: PaymentMethod,
	pub items: Vec<CartItem>,
	pub created_at: DateTime<Utc>,
}
