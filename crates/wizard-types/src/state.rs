//! Wizard states and item sub-wizard steps.
//!
//! Both enums serialize as SCREAMING_SNAKE_CASE strings, which is also the
//! form used in history step labels and in the HTTP API.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Top-level state of an order wizard run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WizardState {
	Initial,
	ClientSelection,
	OrderInitialization,
	/// Hosts the item sub-wizard.
	ItemManagement,
	ExecutionParams,
	GlobalDiscounts,
	PaymentProcessing,
	AdditionalInfo,
	OrderConfirmation,
	OrderReview,
	LegalAspects,
	ReceiptGeneration,
	Completed,
	Cancelled,
}

impl WizardState {
	pub const ALL: [WizardState; 14] = [
		Self::Initial,
		Self::ClientSelection,
		Self::OrderInitialization,
		Self::ItemManagement,
		Self::ExecutionParams,
		Self::GlobalDiscounts,
		Self::PaymentProcessing,
		Self::AdditionalInfo,
		Self::OrderConfirmation,
		Self::OrderReview,
		Self::LegalAspects,
		Self::ReceiptGeneration,
		Self::Completed,
		Self::Cancelled,
	];

	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Initial => "INITIAL",
			Self::ClientSelection => "CLIENT_SELECTION",
			Self::OrderInitialization => "ORDER_INITIALIZATION",
			Self::ItemManagement => "ITEM_MANAGEMENT",
			Self::ExecutionParams => "EXECUTION_PARAMS",
			Self::GlobalDiscounts => "GLOBAL_DISCOUNTS",
			Self::PaymentProcessing => "PAYMENT_PROCESSING",
			Self::AdditionalInfo => "ADDITIONAL_INFO",
			Self::OrderConfirmation => "ORDER_CONFIRMATION",
			Self::OrderReview => "ORDER_REVIEW",
			Self::LegalAspects => "LEGAL_ASPECTS",
			Self::ReceiptGeneration => "RECEIPT_GENERATION",
			Self::Completed => "COMPLETED",
			Self::Cancelled => "CANCELLED",
		}
	}

	/// Terminal states accept no further events.
	pub fn is_terminal(&self) -> bool {
		matches!(self, Self::Completed | Self::Cancelled)
	}

	/// Business stage (1-4) a state belongs to, `None` for the bookends.
	///
	/// Stage 1 is client and order header, stage 2 the items, stage 3 the
	/// order-wide parameters and stage 4 confirmation through completion.
	pub fn stage(&self) -> Option<u8> {
		match self {
			Self::ClientSelection | Self::OrderInitialization => Some(1),
			Self::ItemManagement => Some(2),
			Self::ExecutionParams
			| Self::GlobalDiscounts
			| Self::PaymentProcessing
			| Self::AdditionalInfo => Some(3),
			Self::OrderConfirmation
			| Self::OrderReview
			| Self::LegalAspects
			| Self::ReceiptGeneration => Some(4),
			Self::Initial | Self::Completed | Self::Cancelled => None,
		}
	}
}

impl fmt::Display for WizardState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for WizardState {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::ALL
			.iter()
			.copied()
			.find(|state| state.as_str() == s)
			.ok_or_else(|| format!("Unknown wizard state: {}", s))
	}
}

/// Step of the nested item sub-wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemStep {
	/// Pseudo-entry; never observed between requests.
	WizardActive,
	BasicInfo,
	Characteristics,
	DefectsStains,
	Pricing,
	Photos,
	ItemComplete,
}

impl ItemStep {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::WizardActive => "WIZARD_ACTIVE",
			Self::BasicInfo => "BASIC_INFO",
			Self::Characteristics => "CHARACTERISTICS",
			Self::DefectsStains => "DEFECTS_STAINS",
			Self::Pricing => "PRICING",
			Self::Photos => "PHOTOS",
			Self::ItemComplete => "ITEM_COMPLETE",
		}
	}
}

impl fmt::Display for ItemStep {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
