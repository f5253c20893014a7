//! Action executor.
//!
//! Actions are the side effects of an allowed transition. The executor works
//! on a clone of the context and hands it back only when the action
//! succeeded, so a failed action leaves the stored context untouched. Every
//! collaborator call is bounded by the configured timeout and is not retried.

use crate::registry::OrderRegistry;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use wizard_clients::ClientService;
use wizard_legal::LegalService;
use wizard_pricing::PricingService;
use wizard_receipt::ReceiptService;
use wizard_types::{decode_payload, WizardContext};

mod item;
mod order;

#[derive(Debug, Error)]
pub enum ActionError {
	#[error("{0}")]
	Payload(String),
	#[error("Validation failed: {0}")]
	Validation(String),
	#[error("Required context missing: {0}")]
	MissingContext(&'static str),
	#[error("{collaborator} failed: {message}")]
	Collaborator {
		collaborator: &'static str,
		message: String,
	},
	#[error("{collaborator} did not answer within {timeout_ms}ms")]
	Timeout {
		collaborator: &'static str,
		timeout_ms: u64,
	},
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
	SeedContext,
	SelectClient,
	StoreOrderInfo,
	StartItemWizard,
	EditItem,
	DeleteItem,
	RecomputeTotals,
	StoreExecutionParams,
	ApplyDiscount,
	ProcessPayment,
	StoreAdditionalInfo,
	SnapshotSummary,
	CaptureSignature,
	GenerateReceipt,
	FinalizeOrder,
	CancelOrder,
	MergeBasicInfo,
	MergeCharacteristics,
	MergeDefects,
	RecalculatePrice,
	MergeModifiers,
	MergePhotos,
	SkipPhotos,
	CommitItem,
	DiscardDraft,
}

impl Action {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::SeedContext => "seed_context",
			Self::SelectClient => "select_client",
			Self::StoreOrderInfo => "store_order_info",
			Self::StartItemWizard => "start_item_wizard",
			Self::EditItem => "edit_item",
			Self::DeleteItem => "delete_item",
			Self::RecomputeTotals => "recompute_totals",
			Self::StoreExecutionParams => "store_execution_params",
			Self::ApplyDiscount => "apply_discount",
			Self::ProcessPayment => "process_payment",
			Self::StoreAdditionalInfo => "store_additional_info",
			Self::SnapshotSummary => "snapshot_summary",
			Self::CaptureSignature => "capture_signature",
			Self::GenerateReceipt => "generate_receipt",
			Self::FinalizeOrder => "finalize_order",
			Self::CancelOrder => "cancel_order",
			Self::MergeBasicInfo => "merge_basic_info",
			Self::MergeCharacteristics => "merge_characteristics",
			Self::MergeDefects => "merge_defects",
			Self::RecalculatePrice => "recalculate_price",
			Self::MergeModifiers => "merge_modifiers",
			Self::MergePhotos => "merge_photos",
			Self::SkipPhotos => "skip_photos",
			Self::CommitItem => "commit_item",
			Self::DiscardDraft => "discard_draft",
		}
	}
}

impl fmt::Display for Action {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

fn decode<T: DeserializeOwned + Default>(payload: &Value) -> Result<T, ActionError> {
	decode_payload(payload).map_err(ActionError::Payload)
}

/// Trims a text field and drops it when blank.
fn non_blank(value: Option<String>) -> Option<String> {
	value
		.map(|v| v.trim().to_string())
		.filter(|v| !v.is_empty())
}

pub struct ActionExecutor {
	clients: Arc<ClientService>,
	pricing: Arc<PricingService>,
	legal: Arc<LegalService>,
	receipt: Arc<ReceiptService>,
	orders: Arc<OrderRegistry>,
	timeout: Duration,
}

impl ActionExecutor {
	pub fn new(
		clients: Arc<ClientService>,
		pricing: Arc<PricingService>,
		legal: Arc<LegalService>,
		receipt: Arc<ReceiptService>,
		orders: Arc<OrderRegistry>,
		timeout: Duration,
	) -> Self {
		Self {
			clients,
			pricing,
			legal,
			receipt,
			orders,
			timeout,
		}
	}

	/// Runs `action` against a copy of `context` and returns the new context.
	pub async fn execute(
		&self,
		action: Action,
		wizard_id: &str,
		context: &WizardContext,
		payload: &Value,
	) -> Result<WizardContext, ActionError> {
		let mut ctx = context.clone();
		match action {
			Action::SeedContext => order::seed_context(&mut ctx),
			Action::SelectClient => self.select_client(&mut ctx, payload).await,
			Action::StoreOrderInfo => self.store_order_info(&mut ctx, payload).await,
			Action::StartItemWizard => item::start_item_wizard(&mut ctx),
			Action::EditItem => item::edit_item(&mut ctx, payload),
			Action::DeleteItem => self.delete_item(&mut ctx, payload).await,
			Action::RecomputeTotals => self.recompute_totals(&mut ctx).await,
			Action::StoreExecutionParams => self.store_execution_params(&mut ctx, payload).await,
			Action::ApplyDiscount => self.apply_discount(&mut ctx, payload).await,
			Action::ProcessPayment => order::process_payment(&mut ctx, payload),
			Action::StoreAdditionalInfo => order::store_additional_info(&mut ctx, payload),
			Action::SnapshotSummary => order::snapshot_summary(&mut ctx, wizard_id),
			Action::CaptureSignature => self.capture_signature(&mut ctx, payload).await,
			Action::GenerateReceipt => self.generate_receipt(&mut ctx, payload).await,
			Action::FinalizeOrder => self.finalize_order(&mut ctx).await,
			Action::CancelOrder | Action::DiscardDraft => item::discard_draft(&mut ctx),
			Action::MergeBasicInfo => item::merge_basic_info(&mut ctx, payload),
			Action::MergeCharacteristics => item::merge_characteristics(&mut ctx, payload),
			Action::MergeDefects => item::merge_defects(&mut ctx, payload),
			Action::RecalculatePrice => self.price_draft(&mut ctx).await,
			Action::MergeModifiers => self.merge_modifiers(&mut ctx, payload).await,
			Action::MergePhotos => item::merge_photos(&mut ctx, payload),
			Action::SkipPhotos => item::skip_photos(&mut ctx),
			Action::CommitItem => self.commit_item(&mut ctx).await,
		}?;
		Ok(ctx)
	}

	/// Awaits a collaborator call under the configured timeout.
	async fn call<T, E, F>(&self, collaborator: &'static str, call: F) -> Result<T, ActionError>
	where
		F: Future<Output = Result<T, E>>,
		E: fmt::Display,
	{
		match tokio::time::timeout(self.timeout, call).await {
			Ok(result) => result.map_err(|e| ActionError::Collaborator {
				collaborator,
				message: e.to_string(),
			}),
			Err(_) => {
				tracing::warn!(
					collaborator,
					timeout_ms = self.timeout.as_millis() as u64,
					"Collaborator call timed out"
				);
				Err(ActionError::Timeout {
					collaborator,
					timeout_ms: self.timeout.as_millis() as u64,
				})
			},
		}
	}

	/// Reprices the committed items with the order-wide adjustments.
	async fn recompute_totals(&self, ctx: &mut WizardContext) -> Result<(), ActionError> {
		let urgency = ctx
			.execution
			.as_ref()
			.map(|execution| execution.urgency)
			.unwrap_or_default();
		let totals = self
			.call(
				"pricing",
				self.pricing
					.price_order(&ctx.committed_items, ctx.discount.as_ref(), urgency),
			)
			.await?;
		ctx.totals = Some(totals);
		Ok(())
	}
}
