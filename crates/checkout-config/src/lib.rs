//! Configuration module for the checkout wizard.
//!
//! This module provides structures and utilities for managing wizard
//! configuration. It supports loading configuration from TOML files and
//! validates that prices, rates and chapter lists are usable before a session
//! is built from them.
//!
//! ## Modular Configuration Support
//!
//! Configurations can be split into multiple files:
//! - Use `include = ["catalog.toml", "reader.toml"]` to include other config files
//! - Each top-level section must be unique across all files (no duplicates allowed)

#[cfg(any(test, feature = "testing"))]
pub mod builders;
mod loader;

use checkout_types::{CartItem, NavigationPolicy, RoundingOrder, ShippingMethod};
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Keep the message, drop the echoed input
		ConfigError::Parse(err.message().to_string())
	}
}

/// Main configuration structure for the checkout wizard.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Step navigation, tax and rounding behaviour.
	pub wizard: WizardConfig,
	/// Shipping rate table.
	pub shipping: ShippingConfig,
	/// Items placed in the cart when a session starts.
	pub catalog: CatalogConfig,
	/// Settings for the asynchronous email availability check.
	#[serde(default)]
	pub validation: ValidationConfig,
	/// Chapters of the documentation reader.
	#[serde(default)]
	pub reader: ReaderConfig,
}

/// Wizard behaviour.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WizardConfig {
	/// Tax rate applied to subtotal plus shipping, e.g. `0.2` for 20%.
	pub tax_rate: Decimal,
	/// Whether forward jumps may skip invalid steps.
	#[serde(default)]
	pub navigation: NavigationPolicy,
	/// When currency figures are rounded.
	#[serde(default)]
	pub rounding: RoundingOrder,
	/// Prefix of generated order identifiers.
	#[serde(default = "default_order_id_prefix")]
	pub order_id_prefix: String,
	/// Buffer size of the session event bus.
	#[serde(default = "default_event_capacity")]
	pub event_capacity: usize,
}

fn default_order_id_prefix() -> String {
	"ORD-".to_string()
}

fn default_event_capacity() -> usize {
	64
}

/// Shipping rates keyed by method name (`standard`, `express`, `overnight`).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ShippingConfig {
	pub rates: BTreeMap<String, Decimal>,
}

impl ShippingConfig {
	/// Price of a shipping method, if configured.
	pub fn rate(&self, method: ShippingMethod) -> Option<Decimal> {
		self.rates.get(method.as_str()).copied()
	}
}

/// Catalog of cart contents.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CatalogConfig {
	#[serde(default)]
	pub items: Vec<CartItem>,
}

/// Asynchronous email availability check settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ValidationConfig {
	/// Simulated round-trip delay of the availability check.
	#[serde(default = "default_email_check_delay_ms")]
	pub email_check_delay_ms: u64,
	/// Addresses reported as already registered.
	#[serde(default = "default_reserved_emails")]
	pub reserved_emails: Vec<String>,
}

impl Default for ValidationConfig {
	fn default() -> Self {
		Self {
			email_check_delay_ms: default_email_check_delay_ms(),
			reserved_emails: default_reserved_emails(),
		}
	}
}

fn default_email_check_delay_ms() -> u64 {
	1500
}

fn default_reserved_emails() -> Vec<String> {
	vec!["admin@example.com".to_string(), "test@example.com".to_string()]
}

/// A documentation chapter.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChapterConfig {
	pub slug: String,
	pub title: String,
}

/// Documentation reader settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReaderConfig {
	pub chapters: Vec<ChapterConfig>,
}

impl Default for ReaderConfig {
	fn default() -> Self {
		let chapters = [
			("introduction", "Introduction"),
			("template-driven-forms", "Template-Driven Forms"),
			("reactive-forms", "Reactive Forms"),
			("form-arrays", "Dynamic Form Arrays"),
			("validation", "Custom and Cross-Field Validation"),
			("async-validation", "Async Validation"),
			("multi-step-wizard", "Multi-Step Wizard"),
		];
		Self {
			chapters: chapters
				.into_iter()
				.map(|(slug, title)| ChapterConfig {
					slug: slug.to_string(),
					title: title.to_string(),
				})
				.collect(),
		}
	}
}

/// Resolves environment variables in a string.
///
/// Replaces ${VAR_NAME} with the value of the environment variable VAR_NAME.
/// Supports default values with ${VAR_NAME:-default_value}.
///
/// Input strings are limited to 1MB.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut result = String::with_capacity(input.len());
	let mut last = 0;

	for cap in re.captures_iter(input) {
		let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
			continue;
		};
		let default_value = cap.get(2).map(|m| m.as_str());

		let value = match std::env::var(var_name.as_str()) {
			Ok(v) => v,
			Err(_) => match default_value {
				Some(default) => default.to_string(),
				None => {
					return Err(ConfigError::Validation(format!(
						"Environment variable '{}' not found",
						var_name.as_str()
					)));
				},
			},
		};

		result.push_str(&input[last..full_match.start()]);
		result.push_str(&value);
		last = full_match.end();
	}
	result.push_str(&input[last..]);

	Ok(result)
}

impl Config {
	/// Loads configuration from a file, following `include` directives.
	pub async fn from_file(path: &str) -> Result<Self, ConfigError> {
		let path_buf = Path::new(path);
		let base_dir = path_buf.parent().unwrap_or_else(|| Path::new("."));

		let mut loader = loader::ConfigLoader::new(base_dir);
		let file_name = path_buf
			.file_name()
			.ok_or_else(|| ConfigError::Validation(format!("Invalid path: {}", path)))?;
		let config = loader.load_config(file_name).await?;
		tracing::debug!(path, items = config.catalog.items.len(), "Loaded configuration");
		Ok(config)
	}

	/// Validates the configuration.
	///
	/// - Tax rate is in [0, 1)
	/// - Every shipping method has a non-negative rate, and no unknown methods are listed
	/// - Catalog items have a SKU, a non-negative price and a quantity of at least 1
	/// - Order id prefix is not empty and the event bus has capacity
	/// - Reader has at least one chapter and slugs are unique
	fn validate(&self) -> Result<(), ConfigError> {
		// Validate wizard config
		if self.wizard.tax_rate < Decimal::ZERO || self.wizard.tax_rate >= Decimal::ONE {
			return Err(ConfigError::Validation(format!(
				"tax_rate must be in [0, 1), got {}",
				self.wizard.tax_rate
			)));
		}
		if self.wizard.order_id_prefix.is_empty() {
			return Err(ConfigError::Validation(
				"order_id_prefix cannot be empty".into(),
			));
		}
		if self.wizard.event_capacity == 0 {
			return Err(ConfigError::Validation(
				"event_capacity must be at least 1".into(),
			));
		}

		// Validate shipping rates
		for method in ShippingMethod::ALL {
			match self.shipping.rate(method) {
				None => {
					return Err(ConfigError::Validation(format!(
						"Shipping rate for '{}' is not configured",
						method
					)));
				},
				Some(rate) if rate < Decimal::ZERO => {
					return Err(ConfigError::Validation(format!(
						"Shipping rate for '{}' cannot be negative",
						method
					)));
				},
				Some(_) => {},
			}
		}
		if let Some(unknown) = self
			.shipping
			.rates
			.keys()
			.find(|k| k.parse::<ShippingMethod>().is_err())
		{
			return Err(ConfigError::Validation(format!(
				"Unknown shipping method '{}' in shipping.rates",
				unknown
			)));
		}

		// Validate catalog
		for item in &self.catalog.items {
			if item.sku.is_empty() {
				return Err(ConfigError::Validation(
					"Catalog item sku cannot be empty".into(),
				));
			}
			if item.price < Decimal::ZERO {
				return Err(ConfigError::Validation(format!(
					"Catalog item '{}' has a negative price",
					item.sku
				)));
			}
			if item.quantity == 0 {
				return Err(ConfigError::Validation(format!(
					"Catalog item '{}' must have a quantity of at least 1",
					item.sku
				)));
			}
		}

		// Validate reader chapters
		if self.reader.chapters.is_empty() {
			return Err(ConfigError::Validation(
				"At least one reader chapter must be configured".into(),
			));
		}
		let mut seen = HashSet::new();
		for chapter in &self.reader.chapters {
			if chapter.slug.is_empty() {
				return Err(ConfigError::Validation(
					"Chapter slug cannot be empty".into(),
				));
			}
			if !seen.insert(chapter.slug.as_str()) {
				return Err(ConfigError::Validation(format!(
					"Duplicate chapter slug '{}'",
					chapter.slug
				)));
			}
		}

		Ok(())
	}
}

/// Parses configuration from a TOML string.
///
/// Environment variables are resolved and the configuration is validated
/// after parsing.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const BASE: &str = r#"
[wizard]
tax_rate = "0.2"

[shipping.rates]
standard = "5.99"
express = "12.99"
overnight = "24.99"

[[catalog.items]]
sku = "HDPH-01"
name = "Wireless Headphones"
price = "99.99"
quantity = 1

[[catalog.items]]
sku = "CASE-02"
name = "Phone Case"
price = "39.99"
quantity = 1
"#;

	#[test]
	fn test_parse_with_defaults() {
		let config: Config = BASE.parse().unwrap();

		assert_eq!(config.wizard.tax_rate, Decimal::from_str("0.2").unwrap());
		assert_eq!(config.wizard.navigation, NavigationPolicy::RequirePriorValid);
		assert_eq!(config.wizard.rounding, RoundingOrder::Presentation);
		assert_eq!(config.wizard.order_id_prefix, "ORD-");
		assert_eq!(
			config.shipping.rate(ShippingMethod::Standard),
			Some(Decimal::from_str("5.99").unwrap())
		);
		assert_eq!(config.catalog.items.len(), 2);
		assert_eq!(config.validation.email_check_delay_ms, 1500);
		assert_eq!(config.reader.chapters.len(), 7);
	}

	#[test]
	fn test_policy_and_rounding_overrides() {
		let toml = BASE.replace(
			"tax_rate = \"0.2\"",
			"tax_rate = \"0.2\"\nnavigation = \"open\"\nrounding = \"per_component\"",
		);
		let config: Config = toml.parse().unwrap();
		assert_eq!(config.wizard.navigation, NavigationPolicy::Open);
		assert_eq!(config.wizard.rounding, RoundingOrder::PerComponent);
	}

	#[test]
	fn test_rejects_out_of_range_tax_rate() {
		let toml = BASE.replace("tax_rate = \"0.2\"", "tax_rate = \"1.0\"");
		let err = toml.parse::<Config>().unwrap_err();
		assert!(err.to_string().contains("tax_rate"));
	}

	#[test]
	fn test_rejects_missing_shipping_rate() {
		let toml = BASE.replace("overnight = \"24.99\"\n", "");
		let err = toml.parse::<Config>().unwrap_err();
		assert!(err.to_string().contains("'overnight' is not configured"));
	}

	#[test]
	fn test_rejects_unknown_shipping_method() {
		let toml = BASE.replace("overnight = \"24.99\"", "overnight = \"24.99\"\ndrone = \"1.00\"");
		let err = toml.parse::<Config>().unwrap_err();
		assert!(err.to_string().contains("Unknown shipping method 'drone'"));
	}

	#[test]
	fn test_rejects_zero_quantity() {
		let toml = BASE.replacen("quantity = 1", "quantity = 0", 1);
		let err = toml.parse::<Config>().unwrap_err();
		assert!(err.to_string().contains("HDPH-01"));
	}

	#[test]
	fn test_rejects_duplicate_chapters() {
		let toml = format!(
			"{}\n[reader]\nchapters = [{{ slug = \"intro\", title = \"A\" }}, {{ slug = \"intro\", title = \"B\" }}]\n",
			BASE
		);
		let err = toml.parse::<Config>().unwrap_err();
		assert!(err.to_string().contains("Duplicate chapter slug 'intro'"));
	}

	#[test]
	fn test_resolve_env_vars_default_and_missing() {
		let resolved =
			resolve_env_vars("rate = \"${CHECKOUT_TEST_UNSET_RATE:-0.1}\"").unwrap();
		assert_eq!(resolved, "rate = \"0.1\"");

		let err = resolve_env_vars("x = \"${CHECKOUT_TEST_UNSET_VAR}\"").unwrap_err();
		assert!(err.to_string().contains("CHECKOUT_TEST_UNSET_VAR"));
	}

	#[test]
	fn test_resolve_env_vars_from_environment() {
		std::env::set_var("CHECKOUT_TEST_PREFIX", "WEB-");
		let resolved = resolve_env_vars("prefix = \"${CHECKOUT_TEST_PREFIX}\" # ${CHECKOUT_TEST_PREFIX}").unwrap();
		assert_eq!(resolved, "prefix = \"WEB-\" # WEB-");
	}

	#[test]
	fn test_parse_error_is_reported() {
		let err = "[wizard\n".parse::<Config>().unwrap_err();
		assert!(matches!(err, ConfigError::Parse(_)));
	}
}
