//! Wizard events and transition requests.
//!
//! A transition request is an event name plus an event-specific JSON
//! payload. The dispatcher never looks inside the payload; actions decode it
//! (and guards may read it) with [`decode_payload`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Every event the wizard understands, main machine and item sub-wizard alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WizardEvent {
	StartOrder,
	ClientSelected,
	OrderInfoCompleted,
	AddItem,
	/// Alias of `AddItem`.
	StartItemWizard,
	EditItem,
	DeleteItem,
	ItemsCompleted,
	BasicInfoCompleted,
	CharacteristicsCompleted,
	DefectsCompleted,
	RecalculatePrice,
	PricingCompleted,
	PhotosCompleted,
	SkipPhotos,
	ItemAdded,
	CancelItemWizard,
	ExecutionParamsSet,
	DiscountsApplied,
	PaymentProcessed,
	AdditionalInfoCompleted,
	ReviewOrder,
	OrderApproved,
	TermsAccepted,
	GenerateReceipt,
	ReceiptGenerated,
	GoBack,
	CancelOrder,
}

impl WizardEvent {
	pub const ALL: [WizardEvent; 28] = [
		Self::StartOrder,
		Self::ClientSelected,
		Self::OrderInfoCompleted,
		Self::AddItem,
		Self::StartItemWizard,
		Self::EditItem,
		Self::DeleteItem,
		Self::ItemsCompleted,
		Self::BasicInfoCompleted,
		Self::CharacteristicsCompleted,
		Self::DefectsCompleted,
		Self::RecalculatePrice,
		Self::PricingCompleted,
		Self::PhotosCompleted,
		Self::SkipPhotos,
		Self::ItemAdded,
		Self::CancelItemWizard,
		Self::ExecutionParamsSet,
		Self::DiscountsApplied,
		Self::PaymentProcessed,
		Self::AdditionalInfoCompleted,
		Self::ReviewOrder,
		Self::OrderApproved,
		Self::TermsAccepted,
		Self::GenerateReceipt,
		Self::ReceiptGenerated,
		Self::GoBack,
		Self::CancelOrder,
	];

	pub fn as_str(&self) -> &'static str {
		match self {
			Self::StartOrder => "START_ORDER",
			Self::ClientSelected => "CLIENT_SELECTED",
			Self::OrderInfoCompleted => "ORDER_INFO_COMPLETED",
			Self::AddItem => "ADD_ITEM",
			Self::StartItemWizard => "START_ITEM_WIZARD",
			Self::EditItem => "EDIT_ITEM",
			Self::DeleteItem => "DELETE_ITEM",
			Self::ItemsCompleted => "ITEMS_COMPLETED",
			Self::BasicInfoCompleted => "BASIC_INFO_COMPLETED",
			Self::CharacteristicsCompleted => "CHARACTERISTICS_COMPLETED",
			Self::DefectsCompleted => "DEFECTS_COMPLETED",
			Self::RecalculatePrice => "RECALCULATE_PRICE",
			Self::PricingCompleted => "PRICING_COMPLETED",
			Self::PhotosCompleted => "PHOTOS_COMPLETED",
			Self::SkipPhotos => "SKIP_PHOTOS",
			Self::ItemAdded => "ITEM_ADDED",
			Self::CancelItemWizard => "CANCEL_ITEM_WIZARD",
			Self::ExecutionParamsSet => "EXECUTION_PARAMS_SET",
			Self::DiscountsApplied => "DISCOUNTS_APPLIED",
			Self::PaymentProcessed => "PAYMENT_PROCESSED",
			Self::AdditionalInfoCompleted => "ADDITIONAL_INFO_COMPLETED",
			Self::ReviewOrder => "REVIEW_ORDER",
			Self::OrderApproved => "ORDER_APPROVED",
			Self::TermsAccepted => "TERMS_ACCEPTED",
			Self::GenerateReceipt => "GENERATE_RECEIPT",
			Self::ReceiptGenerated => "RECEIPT_GENERATED",
			Self::GoBack => "GO_BACK",
			Self::CancelOrder => "CANCEL_ORDER",
		}
	}
}

impl fmt::Display for WizardEvent {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Returned when an event name is not part of the vocabulary.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown event: {0}")]
pub struct UnknownEvent(pub String);

impl FromStr for WizardEvent {
	type Err = UnknownEvent;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::ALL
			.iter()
			.copied()
			.find(|event| event.as_str() == s)
			.ok_or_else(|| UnknownEvent(s.to_string()))
	}
}

/// One request to move the wizard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionRequest {
	pub event: WizardEvent,
	#[serde(default)]
	pub payload: serde_json::Value,
}

impl TransitionRequest {
	pub fn new(event: WizardEvent, payload: serde_json::Value) -> Self {
		Self { event, payload }
	}

	pub fn bare(event: WizardEvent) -> Self {
		Self::new(event, serde_json::Value::Null)
	}
}

/// Decodes an event payload into its typed form.
///
/// A missing (`null`) payload decodes to the type's default, so events whose
/// payload is entirely optional may be sent without a body.
pub fn decode_payload<T>(payload: &serde_json::Value) -> Result<T, String>
where
	T: DeserializeOwned + Default,
{
	if payload.is_null() {
		return Ok(T::default());
	}
	serde_json::from_value(payload.clone()).map_err(|e| format!("Malformed payload: {}", e))
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[derive(Debug, Default, Deserialize, PartialEq)]
	#[serde(deny_unknown_fields)]
	struct Sample {
		name: Option<String>,
	}

	#[test]
	fn test_event_name_round_trip() {
		for event in WizardEvent::ALL {
			assert_eq!(event.as_str().parse::<WizardEvent>(), Ok(event));
			assert_eq!(
				serde_json::to_value(event).unwrap(),
				json!(event.as_str())
			);
		}
	}

	#[test]
	fn test_unknown_event() {
		let err = "LAUNCH_ROCKET".parse::<WizardEvent>().unwrap_err();
		assert_eq!(err.to_string(), "Unknown event: LAUNCH_ROCKET");
	}

	#[test]
	fn test_decode_payload_null_is_default() {
		let decoded: Sample = decode_payload(&serde_json::Value::Null).unwrap();
		assert_eq!(decoded, Sample::default());
	}

	#[test]
	fn test_decode_payload_rejects_unknown_fields() {
		let err = decode_payload::<Sample>(&json!({ "nmae": "typo" })).unwrap_err();
		assert!(err.starts_with("Malformed payload"));
	}
}
