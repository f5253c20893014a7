//! Plain text receipt renderer with a JSON alternative.
//!
//! ```toml
//! [receipt.implementations.text]
//! company_name = "Clean Line"
//! footer = "Thank you!"
//! line_width = 40
//! ```

use crate::{ReceiptError, ReceiptFactory, ReceiptInterface, ReceiptRegistry};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt::Write;
use wizard_types::{
	current_timestamp, new_id, ConfigSchema, Field, FieldType, ImplementationRegistry,
	OrderSummary, ReceiptArtifact, ReceiptConfig, ReceiptFormat, Schema, ValidationError,
};

const MAX_COPIES: u8 = 5;

#[derive(Debug, Clone)]
pub struct TextReceiptConfig {
	pub company_name: String,
	pub footer: Option<String>,
	pub line_width: usize,
}

impl Default for TextReceiptConfig {
	fn default() -> Self {
		Self {
			company_name: "Dry Cleaning".into(),
			footer: None,
			line_width: 40,
		}
	}
}

pub struct TextReceipt {
	config: TextReceiptConfig,
}

#[derive(Serialize)]
struct JsonReceipt<'a> {
	company: &'a str,
	receipt_number: &'a str,
	copies: u8,
	#[serde(skip_serializing_if = "Option::is_none")]
	email_to: Option<&'a str>,
	order: &'a OrderSummary,
}

impl TextReceipt {
	pub fn new(config: TextReceiptConfig) -> Self {
		Self { config }
	}

	fn rule(&self, ch: char) -> String {
		std::iter::repeat_n(ch, self.config.line_width).collect()
	}

	/// Left label, right-aligned value, padded to the line width.
	fn row(&self, label: &str, value: impl std::fmt::Display) -> String {
		let value = value.to_string();
		let pad = self
			.config
			.line_width
			.saturating_sub(label.chars().count() + value.chars().count())
			.max(1);
		format!("{}{}{}", label, " ".repeat(pad), value)
	}

	fn render_text(
		&self,
		summary: &OrderSummary,
		config: &ReceiptConfig,
	) -> Result<String, std::fmt::Error> {
		let mut copy = String::new();
		let created = chrono::DateTime::from_timestamp(summary.created_at as i64, 0)
			.map(|at| at.format("%Y-%m-%d %H:%M").to_string())
			.unwrap_or_else(|| summary.order_info.created_on.to_string());

		writeln!(copy, "{}", self.config.company_name)?;
		writeln!(copy, "{}", self.rule('='))?;
		writeln!(copy, "{}", self.row("Receipt", &summary.order_info.receipt_number))?;
		writeln!(copy, "{}", self.row("Tag", &summary.order_info.tag_number))?;
		writeln!(copy, "{}", self.row("Branch", &summary.order_info.branch_id))?;
		writeln!(copy, "{}", self.row("Date", created))?;
		writeln!(copy, "{}", self.row("Client", summary.client.full_name()))?;
		writeln!(copy, "{}", self.row("Phone", &summary.client.phone))?;
		writeln!(copy, "{}", self.rule('-'))?;

		for (index, item) in summary.items.iter().enumerate() {
			let label = format!("{}. {} x{}", index + 1, item.item_name, item.quantity);
			writeln!(copy, "{}", self.row(&label, money(item.pricing.final_total)))?;
			if !config.include_item_details {
				continue;
			}
			for modifier in &item.pricing.modifiers {
				writeln!(
					copy,
					"{}",
					self.row(&format!("   {} {}%", modifier.code, modifier.percent), money(modifier.amount))
				)?;
			}
			if !item.stains.is_empty() {
				writeln!(copy, "   Stains: {}", item.stains.join(", "))?;
			}
			if !item.defects.is_empty() {
				writeln!(copy, "   Defects: {}", item.defects.join(", "))?;
			}
			if item.no_guarantee {
				writeln!(
					copy,
					"   NO GUARANTEE: {}",
					item.no_guarantee_reason.as_deref().unwrap_or("-")
				)?;
			}
		}

		let totals = &summary.totals;
		writeln!(copy, "{}", self.rule('-'))?;
		writeln!(copy, "{}", self.row("Subtotal", money(totals.items_subtotal)))?;
		if !totals.discount_amount.is_zero() {
			writeln!(
				copy,
				"{}",
				self.row(&format!("Discount {}%", totals.discount_percent), money(-totals.discount_amount))
			)?;
		}
		if !totals.urgency_amount.is_zero() {
			writeln!(
				copy,
				"{}",
				self.row(&format!("Urgency {}%", totals.urgency_percent), money(totals.urgency_amount))
			)?;
		}
		writeln!(copy, "{}", self.row("TOTAL", money(totals.total)))?;
		writeln!(copy, "{}", self.row("Paid", money(summary.payment.prepayment)))?;
		writeln!(copy, "{}", self.row("Due", money(summary.payment.balance_due)))?;
		writeln!(copy, "{}", self.row("Payment", format!("{:?}", summary.payment.method)))?;
		if let Some(date) = summary.execution.completion_date {
			writeln!(copy, "{}", self.row("Ready by", date))?;
		}
		if let Some(notes) = &summary.additional_info.order_notes {
			writeln!(copy, "Notes: {}", notes)?;
		}
		if let Some(footer) = &self.config.footer {
			writeln!(copy, "{}", self.rule('='))?;
			writeln!(copy, "{}", footer)?;
		}

		let copies = (1..=config.copies)
			.map(|n| format!("[Copy {}/{}]\n{}", n, config.copies, copy))
			.collect::<Vec<_>>();
		Ok(copies.join("\n"))
	}
}

fn money(amount: Decimal) -> String {
	format!("{:.2}", amount.round_dp(2))
}

#[async_trait]
impl ReceiptInterface for TextReceipt {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(TextReceiptSchema)
	}

	async fn generate_receipt(
		&self,
		summary: &OrderSummary,
		config: &ReceiptConfig,
	) -> Result<ReceiptArtifact, ReceiptError> {
		if config.copies == 0 || config.copies > MAX_COPIES {
			return Err(ReceiptError::Validation(format!(
				"copies must be between 1 and {}",
				MAX_COPIES
			)));
		}
		if let Some(email) = &config.email_to {
			if !email.contains('@') {
				return Err(ReceiptError::Validation(format!(
					"Invalid email address: {}",
					email
				)));
			}
		}

		let (content_type, body) = match config.format {
			ReceiptFormat::Text => (
				"text/plain; charset=utf-8",
				self.render_text(summary, config)
					.map_err(|e| ReceiptError::Rendering(e.to_string()))?,
			),
			ReceiptFormat::Json => (
				"application/json",
				serde_json::to_string_pretty(&JsonReceipt {
					company: &self.config.company_name,
					receipt_number: &summary.order_info.receipt_number,
					copies: config.copies,
					email_to: config.email_to.as_deref(),
					order: summary,
				})
				.map_err(|e| ReceiptError::Rendering(e.to_string()))?,
			),
		};

		tracing::debug!(
			receipt_number = %summary.order_info.receipt_number,
			format = ?config.format,
			"Receipt rendered"
		);

		Ok(ReceiptArtifact {
			receipt_id: new_id(),
			receipt_number: summary.order_info.receipt_number.clone(),
			content_type: content_type.to_string(),
			body,
			generated_at: current_timestamp(),
		})
	}
}

pub struct TextReceiptSchema;

impl ConfigSchema for TextReceiptSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		Schema::new(
			vec![],
			vec![
				Field::new("company_name", FieldType::String),
				Field::new("footer", FieldType::String),
				Field::new(
					"line_width",
					FieldType::Integer {
						min: Some(24),
						max: Some(120),
					},
				),
			],
		)
		.validate(config)
	}
}

pub fn create_receipt(config: &toml::Value) -> Result<Box<dyn ReceiptInterface>, ReceiptError> {
	TextReceiptSchema
		.validate(config)
		.map_err(|e| ReceiptError::Configuration(e.to_string()))?;

	let defaults = TextReceiptConfig::default();
	let config = TextReceiptConfig {
		company_name: config
			.get("company_name")
			.and_then(|v| v.as_str())
			.map(str::to_string)
			.unwrap_or(defaults.company_name),
		footer: config
			.get("footer")
			.and_then(|v| v.as_str())
			.map(str::to_string),
		line_width: config
			.get("line_width")
			.and_then(|v| v.as_integer())
			.map(|v| v as usize)
			.unwrap_or(defaults.line_width),
	};
	Ok(Box::new(TextReceipt::new(config)))
}

pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "text";
	type Factory = ReceiptFactory;

	fn factory() -> Self::Factory {
		create_receipt
	}
}

impl ReceiptRegistry for Registry {}
