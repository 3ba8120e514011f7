//! Configuration builder for creating test and development configurations.
//!
//! Provides `Config` instances with the demo shop defaults: a 20% tax rate,
//! the three standard shipping rates and a two-item cart.

use crate::{
	CatalogConfig, Config, ReaderConfig, ShippingConfig, ValidationConfig, WizardConfig,
};
use checkout_types::{CartItem, NavigationPolicy, RoundingOrder};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Builder for creating `Config` instances with a fluent API.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
	tax_rate: Decimal,
	navigation: NavigationPolicy,
	rounding: RoundingOrder,
	order_id_prefix: String,
	items: Vec<CartItem>,
	email_check_delay_ms: u64,
}

impl Default for ConfigBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigBuilder {
	/// Creates a builder with the demo shop defaults.
	pub fn new() -> Self {
		Self {
			tax_rate: Decimal::new(2, 1),
			navigation: NavigationPolicy::default(),
			rounding: RoundingOrder::default(),
			order_id_prefix: "ORD-".to_string(),
			items: vec![
				CartItem {
					sku: "HDPH-01".to_string(),
					name: "Wireless Headphones".to_string(),
					price: Decimal::new(9999, 2),
					quantity: 1,
				},
				CartItem {
					sku: "CASE-02".to_string(),
					name: "Phone Case".to_string(),
					price: Decimal::new(3999, 2),
					quantity: 1,
				},
			],
			email_check_delay_ms: 1500,
		}
	}

	pub fn tax_rate(mut self, rate: Decimal) -> Self {
		self.tax_rate = rate;
		self
	}

	pub fn navigation(mut self, policy: NavigationPolicy) -> Self {
		self.navigation = policy;
		self
	}

	pub fn rounding(mut self, rounding: RoundingOrder) -> Self {
		self.rounding = rounding;
		self
	}

	pub fn order_id_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.order_id_prefix = prefix.into();
		self
	}

	/// Replaces the cart contents.
	pub fn items(mut self, items: Vec<CartItem>) -> Self {
		self.items = items;
		self
	}

	pub fn email_check_delay_ms(mut self, delay: u64) -> Self {
		self.email_check_delay_ms = delay;
		self
	}

	/// Builds the configuration.
	pub fn build(self) -> Config {
		let rates = BTreeMap::from([
			("standard".to_string(), Decimal::new(599, 2)),
			("express".to_string(), Decimal::new(1299, 2)),
			("overnight".to_string(), Decimal::new(2499, 2)),
		]);

		Config {
			wizard: WizardConfig {
				tax_rate: self.tax_rate,
				navigation: self.navigation,
				rounding: self.rounding,
				order_id_prefix: self.order_id_prefix,
				event_capacity: 64,
			},
			shipping: ShippingConfig { rates },
			catalog: CatalogConfig { items: self.items },
			validation: ValidationConfig {
				email_check_delay_ms: self.email_check_delay_ms,
				..ValidationConfig::default()
			},
			reader: ReaderConfig::default(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_built_config_passes_validation() {
		let config = ConfigBuilder::new()
			.navigation(NavigationPolicy::Open)
			.build();
		assert!(config.validate().is_ok());
		assert_eq!(config.wizard.navigation, NavigationPolicy::Open);
		assert_eq!(config.catalog.items.len(), 2);
	}
}
