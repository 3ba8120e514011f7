//! Order aggregation: turns validated step data into an [`OrderSummary`].

use crate::validators::{cart, payment, ConfirmationValidator, StepValidator};
use checkout_config::Config;
use checkout_types::{
	round_currency, CartItem, FieldSet, OrderSummary, PaymentMethod, RoundingOrder,
	ShippingMethod,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

/// Process-wide order sequence, so identifiers stay unique within a run.
static ORDER_SEQUENCE: AtomicU64 = AtomicU64::new(1);

/// Errors raised when an order cannot be composed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AggregatorError {
	/// Terms and privacy policy were not both accepted.
	#[error("Order not confirmed: terms and privacy policy must be accepted")]
	NotConfirmed,
	/// The cart step holds no recognised shipping method.
	#[error("Invalid shipping method: '{0}'")]
	InvalidShippingMethod(String),
	/// No rate is configured for the chosen shipping method.
	#[error("No rate configured for shipping method '{0}'")]
	UnpricedShippingMethod(ShippingMethod),
	/// The payment step holds no recognised payment method.
	#[error("Invalid payment method: '{0}'")]
	InvalidPaymentMethod(String),
	/// A currency figure does not fit in a [`Decimal`].
	#[error("Order total exceeds the supported range")]
	Overflow,
}

/// Step data consumed when placing an order.
#[derive(Debug, Clone, Copy)]
pub struct CheckoutData<'a> {
	pub items: &'a [CartItem],
	pub cart: &'a FieldSet,
	pub payment: &'a FieldSet,
	pub confirmation: &'a FieldSet,
}

/// Currency figures of an order, rounded for presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Totals {
	pub subtotal: Decimal,
	pub shipping_cost: Decimal,
	pub tax: Decimal,
	pub total: Decimal,
}

/// Computes totals and composes the final order summary.
#[derive(Debug, Clone)]
pub struct OrderAggregator {
	rates: BTreeMap<ShippingMethod, Decimal>,
	tax_rate: Decimal,
	rounding: RoundingOrder,
	order_id_prefix: String,
}

impl OrderAggregator {
	pub fn new(
		rates: BTreeMap<ShippingMethod, Decimal>,
		tax_rate: Decimal,
		rounding: RoundingOrder,
		order_id_prefix: impl Into<String>,
	) -> Self {
		Self {
			rates,
			tax_rate,
			rounding,
			order_id_prefix: order_id_prefix.into(),
		}
	}

	pub fn from_config(config: &Config) -> Self {
		let rates = ShippingMethod::ALL
			.into_iter()
			.filter_map(|m| config.shipping.rate(m).map(|rate| (m, rate)))
			.collect();
		Self::new(
			rates,
			config.wizard.tax_rate,
			config.wizard.rounding,
			config.wizard.order_id_prefix.clone(),
		)
	}

	/// Computes the presented totals for a cart and shipping method.
	///
	/// With [`RoundingOrder::Presentation`] every figure is computed exactly and
	/// rounded once; with [`RoundingOrder::PerComponent`] subtotal, shipping and
	/// tax are rounded first and the total is the sum of the rounded figures.
	pub fn totals(&self, items: &[CartItem], method: ShippingMethod) -> Result<Totals, AggregatorError> {
		let shipping_cost = *self
			.rates
			.get(&method)
			.ok_or(AggregatorError::UnpricedShippingMethod(method))?;
		let subtotal = items
			.iter()
			.try_fold(Decimal::ZERO, |sum, item| sum.checked_add(item.line_total()?))
			.ok_or(AggregatorError::Overflow)?;

		let totals = match self.rounding {
			RoundingOrder::Presentation => {
				let taxable = subtotal.checked_add(shipping_cost);
				let tax = taxable.and_then(|t| t.checked_mul(self.tax_rate));
				let total = taxable.zip(tax).and_then(|(t, tax)| t.checked_add(tax));
				let (tax, total) = tax.zip(total).ok_or(AggregatorError::Overflow)?;
				Totals {
					subtotal: round_currency(subtotal),
					shipping_cost: round_currency(shipping_cost),
					tax: round_currency(tax),
					total: round_currency(total),
				}
			},
			RoundingOrder::PerComponent => {
				let subtotal = round_currency(subtotal);
				let shipping_cost = round_currency(shipping_cost);
				let taxable = subtotal
					.checked_add(shipping_cost)
					.ok_or(AggregatorError::Overflow)?;
				let tax = taxable
					.checked_mul(self.tax_rate)
					.map(round_currency)
					.ok_or(AggregatorError::Overflow)?;
				Totals {
					subtotal,
					shipping_cost,
					tax,
					total: taxable.checked_add(tax).ok_or(AggregatorError::Overflow)?,
				}
			},
		};

		Ok(totals)
	}

	/// Composes the final order summary.
	///
	/// Only permitted when the confirmation step is valid; otherwise the call
	/// is rejected with [`AggregatorError::NotConfirmed`].
	pub fn finalize(&self, data: CheckoutData<'_>) -> Result<OrderSummary, AggregatorError> {
		if !ConfirmationValidator.is_valid(data.confirmation) {
			return Err(AggregatorError::NotConfirmed);
		}

		let method_text = data.cart.text(cart::SHIPPING_METHOD);
		let shipping_method: ShippingMethod = method_text
			.parse()
			.map_err(|_| AggregatorError::InvalidShippingMethod(method_text.to_string()))?;

		let payment_text = data.payment.text(payment::PAYMENT_METHOD);
		let payment_method: PaymentMethod = payment_text
			.parse()
			.map_err(|_| AggregatorError::InvalidPaymentMethod(payment_text.to_string()))?;

		let totals = self.totals(data.items, shipping_method)?;
		let created_at = Utc::now();
		let sequence = ORDER_SEQUENCE.fetch_add(1, Ordering::Relaxed);
		let order_id = format!(
			"{}{}-{}",
			self.order_id_prefix,
			created_at.timestamp_millis(),
			sequence
		);

		tracing::info!(
			order_id = %order_id,
			total = %totals.total,
			shipping = %shipping_method,
			payment = %payment_method,
			"Order finalized"
		);

		Ok(OrderSummary {
			order_id,
			subtotal: totals.subtotal,
			shipping_cost: totals.shipping_cost,
			tax: totals.tax,
			total: totals.total,
			shipping_method,
			payment_method,
			items: data.items.to_vec(),
			created_at,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::validators::{confirmation, StepValidators};
	use checkout_config::builders::ConfigBuilder;
	use std::collections::HashSet;
	use std::str::FromStr;

	fn dec(s: &str) -> Decimal {
		Decimal::from_str(s).unwrap()
	}

	struct Fixture {
		items: Vec<CartItem>,
		sets: Vec<FieldSet>,
	}

	impl Fixture {
		fn new(items: Vec<CartItem>) -> Self {
			let mut sets = StepValidators::new().templates();
			sets[0].set_value(cart::SHIPPING_METHOD, "standard").unwrap();
			sets[2].set_value(payment::PAYMENT_METHOD, "paypal").unwrap();
			Self { items, sets }
		}

		fn confirm(mut self) -> Self {
			self.sets[3].set_value(confirmation::ACCEPT_TERMS, true).unwrap();
			self.sets[3].set_value(confirmation::ACCEPT_PRIVACY, true).unwrap();
			self
		}

		fn data(&self) -> CheckoutData<'_> {
			CheckoutData {
				items: &self.items,
				cart: &self.sets[0],
				payment: &self.sets[2],
				confirmation: &self.sets[3],
			}
		}
	}

	fn demo_items() -> Vec<CartItem> {
		ConfigBuilder::new().build().catalog.items
	}

	#[test]
	fn test_demo_cart_totals() {
		let aggregator = OrderAggregator::from_config(&ConfigBuilder::new().build());
		let totals = aggregator
			.totals(&demo_items(), ShippingMethod::Standard)
			.unwrap();

		assert_eq!(totals.subtotal, dec("139.98"));
		assert_eq!(totals.shipping_cost, dec("5.99"));
		assert_eq!(totals.tax, dec("29.19"));
		assert_eq!(totals.total, dec("175.16"));
	}

	#[test]
	fn test_per_component_rounding_on_demo_cart() {
		let config = ConfigBuilder::new()
			.rounding(RoundingOrder::PerComponent)
			.build();
		let totals = OrderAggregator::from_config(&config)
			.totals(&demo_items(), ShippingMethod::Standard)
			.unwrap();

		assert_eq!(totals.tax, dec("29.19"));
		assert_eq!(totals.total, dec("175.16"));
	}

	#[test]
	fn test_rounding_orders_can_differ() {
		// Exact: 0.015 + 0.0075 = 0.0225 -> 0.02. Rounded first: 0.02 + 0.01.
		let items = vec![CartItem {
			sku: "PEN".into(),
			name: "Pen".into(),
			price: dec("0.015"),
			quantity: 1,
		}];
		let rates = BTreeMap::from([(ShippingMethod::Standard, Decimal::ZERO)]);

		let presentation =
			OrderAggregator::new(rates.clone(), dec("0.5"), RoundingOrder::Presentation, "ORD-");
		let per_component =
			OrderAggregator::new(rates, dec("0.5"), RoundingOrder::PerComponent, "ORD-");

		let a = presentation.totals(&items, ShippingMethod::Standard).unwrap();
		let b = per_component.totals(&items, ShippingMethod::Standard).unwrap();
		assert_eq!(a.total, dec("0.02"));
		assert_eq!(b.total, dec("0.03"));
	}

	#[test]
	fn test_finalize_rejected_without_confirmation() {
		let aggregator = OrderAggregator::from_config(&ConfigBuilder::new().build());
		let fixture = Fixture::new(demo_items());

		assert_eq!(
			aggregator.finalize(fixture.data()),
			Err(AggregatorError::NotConfirmed)
		);
	}

	#[test]
	fn test_finalize_builds_summary() {
		let aggregator = OrderAggregator::from_config(&ConfigBuilder::new().build());
		let fixture = Fixture::new(demo_items()).confirm();

		let summary = aggregator.finalize(fixture.data()).unwrap();
		assert!(summary.order_id.starts_with("ORD-"));
		assert_eq!(summary.total, dec("175.16"));
		assert_eq!(summary.shipping_method, ShippingMethod::Standard);
		assert_eq!(summary.payment_method, PaymentMethod::Paypal);
		assert_eq!(summary.items.len(), 2);
	}

	#[test]
	fn test_order_ids_are_unique() {
		let aggregator = OrderAggregator::from_config(&ConfigBuilder::new().build());
		let fixture = Fixture::new(demo_items()).confirm();

		let ids: HashSet<_> = (0..50)
			.map(|_| aggregator.finalize(fixture.data()).unwrap().order_id)
			.collect();
		assert_eq!(ids.len(), 50);
	}

	#[test]
	fn test_finalize_reports_bad_shipping_and_unpriced_method() {
		let mut fixture = Fixture::new(demo_items()).confirm();
		fixture.sets[0].set_value(cart::SHIPPING_METHOD, "").unwrap();

		let aggregator = OrderAggregator::from_config(&ConfigBuilder::new().build());
		assert_eq!(
			aggregator.finalize(fixture.data()),
			Err(AggregatorError::InvalidShippingMethod(String::new()))
		);

		fixture.sets[0].set_value(cart::SHIPPING_METHOD, "overnight").unwrap();
		let partial = OrderAggregator::new(
			BTreeMap::from([(ShippingMethod::Standard, dec("5.99"))]),
			dec("0.2"),
			RoundingOrder::Presentation,
			"ORD-",
		);
		assert_eq!(
			partial.finalize(fixture.data()),
			Err(AggregatorError::UnpricedShippingMethod(ShippingMethod::Overnight))
		);
	}

	#[test]
	fn test_oversized_cart_reports_overflow() {
		let items = vec![CartItem {
			sku: "BIG".into(),
			name: "Big".into(),
			price: dec("79228162514264337593543950335"),
			quantity: 2,
		}];
		for rounding in [RoundingOrder::Presentation, RoundingOrder::PerComponent] {
			let config = ConfigBuilder::new().rounding(rounding).build();
			let aggregator = OrderAggregator::from_config(&config);
			assert_eq!(
				aggregator.totals(&items, ShippingMethod::Standard),
				Err(AggregatorError::Overflow)
			);
		}

		// Fits as a subtotal but not once shipping is added.
		let items = vec![CartItem {
			quantity: 1,
			..items[0].clone()
		}];
		let aggregator = OrderAggregator::from_config(&ConfigBuilder::new().build());
		assert_eq!(
			aggregator.totals(&items, ShippingMethod::Standard),
			Err(AggregatorError::Overflow)
		);
	}

	#[test]
	fn test_empty_cart_only_charges_shipping() {
		let aggregator = OrderAggregator::from_config(&ConfigBuilder::new().build());
		let totals = aggregator.totals(&[], ShippingMethod::Express).unwrap();

		assert_eq!(totals.subtotal, Decimal::ZERO);
		assert_eq!(totals.tax, dec("2.60"));
		assert_eq!(totals.total, dec("15.59"));
	}
}
