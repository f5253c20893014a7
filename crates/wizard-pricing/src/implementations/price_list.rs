//! Price list implementation.
//!
//! Prices come from the implementation table: a base price per item name
//! within a category (falling back to the category's default price), and a
//! percentage per modifier code. Without configuration a small built-in
//! catalog is used so the service runs out of the box.
//!
//! ```toml
//! [pricing.implementations.price_list]
//! discount_excluded_categories = ["LAUNDRY", "IRONING"]
//! [pricing.implementations.price_list.modifiers]
//! KIDS = "-30"
//! [pricing.implementations.price_list.categories.CLOTHING]
//! default_price = "200.00"
//! items = { Coat = "350.00" }
//! ```

use crate::{PricingError, PricingFactory, PricingInterface, PricingRegistry};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use wizard_types::{
	toml_decimal, AppliedModifier, ConfigSchema, DiscountKind, DiscountSelection, DraftItem,
	Field, FieldType, ImplementationRegistry, ItemPricing, OrderItem, OrderTotals, Schema,
	Urgency, ValidationError,
};

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryPrices {
	#[serde(default)]
	pub default_price: Option<Decimal>,
	#[serde(default)]
	pub items: HashMap<String, Decimal>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PriceListConfig {
	#[serde(default = "default_categories")]
	pub categories: HashMap<String, CategoryPrices>,
	/// Modifier code to percentage of the item's base total; negative values discount.
	#[serde(default = "default_modifiers")]
	pub modifiers: HashMap<String, Decimal>,
	/// Categories the order-wide discount never applies to.
	#[serde(default = "default_excluded_categories")]
	pub discount_excluded_categories: Vec<String>,
}

impl Default for PriceListConfig {
	fn default() -> Self {
		Self {
			categories: default_categories(),
			modifiers: default_modifiers(),
			discount_excluded_categories: default_excluded_categories(),
		}
	}
}

fn money(units: i64, cents: i64) -> Decimal {
	Decimal::new(units * 100 + cents, 2)
}

fn default_categories() -> HashMap<String, CategoryPrices> {
	let category = |default: Decimal, items: &[(&str, Decimal)]| CategoryPrices {
		default_price: Some(default),
		items: items
			.iter()
			.map(|(name, price)| (name.to_string(), *price))
			.collect(),
	};
	HashMap::from([
		(
			"CLOTHING".to_string(),
			category(
				money(200, 0),
				&[
					("Coat", money(350, 0)),
					("Dress", money(250, 0)),
					("Suit", money(400, 0)),
				],
			),
		),
		("LAUNDRY".to_string(), category(money(60, 0), &[])),
		("IRONING".to_string(), category(money(80, 0), &[])),
		(
			"LEATHER".to_string(),
			category(money(700, 0), &[("Jacket", money(900, 0))]),
		),
		("DYEING".to_string(), category(money(300, 0), &[])),
	])
}

fn default_modifiers() -> HashMap<String, Decimal> {
	HashMap::from([
		("KIDS".to_string(), Decimal::from(-30)),
		("MANUAL_CLEANING".to_string(), Decimal::from(20)),
		("VERY_DIRTY".to_string(), Decimal::from(20)),
		("WEDDING".to_string(), Decimal::from(30)),
	])
}

fn default_excluded_categories() -> Vec<String> {
	vec![
		"LAUNDRY".to_string(),
		"IRONING".to_string(),
		"DYEING".to_string(),
	]
}

pub struct PriceListPricing {
	config: PriceListConfig,
}

impl PriceListPricing {
	pub fn new(config: PriceListConfig) -> Self {
		Self { config }
	}

	pub fn with_defaults() -> Self {
		Self::new(PriceListConfig::default())
	}

	fn unit_price(&self, category: &str, item_name: &str) -> Result<Decimal, PricingError> {
		let prices = self
			.config
			.categories
			.get(category)
			.ok_or_else(|| PricingError::Validation(format!("Unknown category '{}'", category)))?;
		prices
			.items
			.get(item_name)
			.or(prices.default_price.as_ref())
			.copied()
			.ok_or_else(|| PricingError::PriceNotFound(format!("{}/{}", category, item_name)))
	}

	fn percent_of(base: Decimal, percent: Decimal) -> Decimal {
		(base * percent / HUNDRED).round_dp(2)
	}

	fn discount_percent(discount: Option<&DiscountSelection>) -> Result<Decimal, PricingError> {
		let Some(discount) = discount else {
			return Ok(Decimal::ZERO);
		};
		if discount.kind == DiscountKind::Custom {
			let percent = discount.custom_percent.ok_or_else(|| {
				PricingError::Validation("Custom discount requires a percentage".into())
			})?;
			if percent < Decimal::ZERO || percent > HUNDRED {
				return Err(PricingError::Validation(format!(
					"Custom discount {}% is outside 0..100",
					percent
				)));
			}
		}
		Ok(discount.effective_percent())
	}
}

#[async_trait]
impl PricingInterface for PriceListPricing {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(PriceListSchema)
	}

	async fn price_item(&self, draft: &DraftItem) -> Result<ItemPricing, PricingError> {
		let category = draft
			.category_code
			.as_deref()
			.ok_or_else(|| PricingError::Validation("Item category is required".into()))?;
		let item_name = draft
			.item_name
			.as_deref()
			.ok_or_else(|| PricingError::Validation("Item name is required".into()))?;
		let quantity = draft
			.quantity
			.filter(|q| *q > 0)
			.ok_or_else(|| PricingError::Validation("Item quantity is required".into()))?;

		let unit_price = self.unit_price(category, item_name)?;
		let base_total = (unit_price * Decimal::from(quantity)).round_dp(2);

		let mut final_total = base_total;
		let mut modifiers = Vec::with_capacity(draft.modifiers.len());
		for code in &draft.modifiers {
			let percent = *self
				.config
				.modifiers
				.get(code)
				.ok_or_else(|| PricingError::Validation(format!("Unknown modifier '{}'", code)))?;
			let amount = Self::percent_of(base_total, percent);
			final_total += amount;
			modifiers.push(AppliedModifier {
				code: code.clone(),
				percent,
				amount,
			});
		}

		tracing::debug!(
			category,
			item_name,
			quantity,
			%unit_price,
			%final_total,
			"Item priced"
		);

		Ok(ItemPricing {
			unit_price,
			base_total,
			modifiers,
			final_total: final_total.max(Decimal::ZERO),
		})
	}

	async fn price_order(
		&self,
		items: &[OrderItem],
		discount: Option<&DiscountSelection>,
		urgency: Urgency,
	) -> Result<OrderTotals, PricingError> {
		let discount_percent = Self::discount_percent(discount)?;
		let urgency_percent = urgency.surcharge_percent();

		let items_subtotal: Decimal = items.iter().map(|item| item.pricing.final_total).sum();
		let discountable: Decimal = items
			.iter()
			.filter(|item| {
				!self
					.config
					.discount_excluded_categories
					.contains(&item.category_code)
			})
			.map(|item| item.pricing.final_total)
			.sum();

		let discount_amount = Self::percent_of(discountable, discount_percent);
		let urgency_amount = Self::percent_of(items_subtotal, urgency_percent);

		Ok(OrderTotals {
			items_subtotal,
			discount_percent,
			discount_amount,
			urgency_percent,
			urgency_amount,
			total: items_subtotal - discount_amount + urgency_amount,
		})
	}
}

pub struct PriceListSchema;

fn every_value_is_decimal(value: &toml::Value) -> Result<(), String> {
	let table = value.as_table().ok_or("expected a table")?;
	for (key, v) in table {
		if toml_decimal(v).is_none() {
			return Err(format!("'{}' is not a decimal", key));
		}
	}
	Ok(())
}

impl ConfigSchema for PriceListSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![],
			vec![
				Field::new("modifiers", FieldType::Table(Schema::new(vec![], vec![])))
					.with_validator(every_value_is_decimal),
				Field::new("categories", FieldType::Table(Schema::new(vec![], vec![])))
					.with_validator(|value| {
						let table = value.as_table().ok_or("expected a table")?;
						for (name, category) in table {
							if let Some(default) = category.get("default_price") {
								toml_decimal(default).ok_or_else(|| {
									format!("{}.default_price is not a decimal", name)
								})?;
							}
							if let Some(items) = category.get("items") {
								every_value_is_decimal(items)
									.map_err(|e| format!("{}.items: {}", name, e))?;
							}
						}
						Ok(())
					}),
				Field::new(
					"discount_excluded_categories",
					FieldType::Array(Box::new(FieldType::String)),
				),
			],
		);
		schema.validate(config)
	}
}

pub fn create_pricing(config: &toml::Value) -> Result<Box<dyn PricingInterface>, PricingError> {
	PriceListSchema
		.validate(config)
		.map_err(|e| PricingError::Configuration(e.to_string()))?;
	let parsed: PriceListConfig = config
		.clone()
		.try_into()
		.map_err(|e: toml::de::Error| PricingError::Configuration(e.message().to_string()))?;
	Ok(Box::new(PriceListPricing::new(parsed)))
}

pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "price_list";
	type Factory = PricingFactory;

	fn factory() -> Self::Factory {
		create_pricing
	}
}

impl PricingRegistry for Registry {}
