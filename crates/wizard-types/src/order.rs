//! Order-level data collected by the wizard stages.
//!
//! Each stage has a payload type (what the caller submits) and a stored type
//! (what the action writes into the context). Where the two coincide a single
//! type is used.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::item::OrderItem;

/// A client as returned by the client lookup collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
	pub id: String,
	pub first_name: String,
	pub last_name: String,
	pub phone: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub email: Option<String>,
}

impl Client {
	pub fn full_name(&self) -> String {
		format!("{} {}", self.first_name, self.last_name)
	}
}

/// Client entered on the client selection screen when no existing record
/// matches.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NewClient {
	pub first_name: String,
	pub last_name: String,
	pub phone: String,
	pub email: Option<String>,
}

/// `CLIENT_SELECTED` payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientSelection {
	pub client_id: Option<String>,
}

/// Order header entered at `ORDER_INITIALIZATION`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderInfo {
	pub receipt_number: String,
	pub tag_number: String,
	pub branch_id: String,
	pub created_on: NaiveDate,
}

/// `ORDER_INFO_COMPLETED` payload. A missing receipt number is generated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OrderInfoPayload {
	pub receipt_number: Option<String>,
	pub tag_number: Option<String>,
	pub branch_id: Option<String>,
}

/// Execution urgency and its surcharge on the order subtotal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Urgency {
	#[default]
	Standard,
	#[serde(rename = "URGENT_48H")]
	Urgent48h,
	#[serde(rename = "URGENT_24H")]
	Urgent24h,
}

impl Urgency {
	pub fn surcharge_percent(&self) -> Decimal {
		match self {
			Self::Standard => Decimal::ZERO,
			Self::Urgent48h => Decimal::from(50),
			Self::Urgent24h => Decimal::from(100),
		}
	}
}

/// Stored at `EXECUTION_PARAMS_SET`; also its payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExecutionParams {
	pub urgency: Urgency,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub completion_date: Option<NaiveDate>,
}

/// Kind of order-wide discount.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountKind {
	#[default]
	None,
	Evercard,
	SocialMedia,
	Military,
	Custom,
}

impl DiscountKind {
	/// Fixed percentage for the predefined kinds; `None` for `Custom`.
	pub fn fixed_percent(&self) -> Option<Decimal> {
		match self {
			Self::None => Some(Decimal::ZERO),
			Self::Evercard | Self::Military => Some(Decimal::from(10)),
			Self::SocialMedia => Some(Decimal::from(5)),
			Self::Custom => None,
		}
	}
}

/// Stored at `DISCOUNTS_APPLIED`; also its payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiscountSelection {
	pub kind: DiscountKind,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub custom_percent: Option<Decimal>,
}

impl DiscountSelection {
	pub fn effective_percent(&self) -> Decimal {
		self.kind
			.fixed_percent()
			.or(self.custom_percent)
			.unwrap_or(Decimal::ZERO)
	}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
	#[default]
	Terminal,
	Cash,
	BankTransfer,
}

/// `PAYMENT_PROCESSED` payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PaymentRequest {
	pub method: PaymentMethod,
	pub prepayment: Option<Decimal>,
}

/// How the order total is paid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentPlan {
	pub method: PaymentMethod,
	pub total: Decimal,
	pub prepayment: Decimal,
	pub balance_due: Decimal,
}

/// Stored at `ADDITIONAL_INFO_COMPLETED`; also its payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AdditionalInfo {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub order_notes: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub client_requirements: Option<String>,
}

/// Order totals as computed by the pricing collaborator.
///
/// `total = items_subtotal - discount_amount + urgency_amount`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
	pub items_subtotal: Decimal,
	pub discount_percent: Decimal,
	pub discount_amount: Decimal,
	pub urgency_percent: Decimal,
	pub urgency_amount: Decimal,
	pub total: Decimal,
}

/// Snapshot of the whole order taken at `REVIEW_ORDER`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSummary {
	pub wizard_id: String,
	pub client: Client,
	pub order_info: OrderInfo,
	pub items: Vec<OrderItem>,
	pub execution: ExecutionParams,
	pub discount: DiscountSelection,
	pub payment: PaymentPlan,
	#[serde(default)]
	pub additional_info: AdditionalInfo,
	pub totals: OrderTotals,
	pub created_at: u64,
}

/// `TERMS_ACCEPTED` payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SignaturePayload {
	/// Encoded signature image as captured by the client device.
	pub signature_data: Option<String>,
	pub terms_accepted: bool,
	pub signer_name: Option<String>,
}

/// Signature as recorded by the legal collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureRecord {
	pub signature_id: String,
	pub digest: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub signer_name: Option<String>,
	pub captured_at: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegalAcceptance {
	pub terms_accepted: bool,
	pub signature: SignatureRecord,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceiptFormat {
	#[default]
	Text,
	Json,
}

/// Receipt options; the `GENERATE_RECEIPT` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReceiptConfig {
	pub format: ReceiptFormat,
	pub copies: u8,
	pub include_item_details: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub email_to: Option<String>,
}

impl Default for ReceiptConfig {
	fn default() -> Self {
		Self {
			format: ReceiptFormat::Text,
			copies: 1,
			include_item_details: true,
			email_to: None,
		}
	}
}

/// A generated receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptArtifact {
	pub receipt_id: String,
	pub receipt_number: String,
	pub content_type: String,
	pub body: String,
	pub generated_at: u64,
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn test_urgency_wire_names_and_surcharge() {
		let parsed: Urgency = serde_json::from_value(json!("URGENT_48H")).unwrap();
		assert_eq!(parsed, Urgency::Urgent48h);
		assert_eq!(parsed.surcharge_percent(), Decimal::from(50));
		assert_eq!(
			serde_json::to_value(Urgency::Urgent24h).unwrap(),
			json!("URGENT_24H")
		);
	}

	#[test]
	fn test_discount_effective_percent() {
		let evercard = DiscountSelection {
			kind: DiscountKind::Evercard,
			custom_percent: Some(Decimal::from(40)),
		};
		assert_eq!(evercard.effective_percent(), Decimal::from(10));

		let custom = DiscountSelection {
			kind: DiscountKind::Custom,
			custom_percent: Some(Decimal::from(15)),
		};
		assert_eq!(custom.effective_percent(), Decimal::from(15));

		assert_eq!(DiscountSelection::default().effective_percent(), Decimal::ZERO);
	}

	#[test]
	fn test_receipt_config_defaults_from_empty_payload() {
		let config: ReceiptConfig = serde_json::from_value(json!({})).unwrap();
		assert_eq!(config, ReceiptConfig::default());
		assert_eq!(config.copies, 1);
	}
}
