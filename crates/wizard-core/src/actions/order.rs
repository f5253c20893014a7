//! Actions of the main wizard stages.

use super::{decode, non_blank, ActionError, ActionExecutor};
use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::Value;
use wizard_types::utils::constants::{MAX_CUSTOM_DISCOUNT_PERCENT, MAX_ORDER_NOTES_LEN};
use wizard_types::{
	current_timestamp, AdditionalInfo, ClientSelection, DiscountKind, DiscountSelection,
	ExecutionParams, ItemReference, LegalAcceptance, OrderInfo, OrderInfoPayload, OrderSummary,
	OrderTotals, PaymentPlan, PaymentRequest, ReceiptConfig, SignaturePayload, WizardContext,
};

/// `RCP-YYYYMMDD-XXXXXX` with six random hex digits.
fn generate_receipt_number() -> String {
	let suffix = uuid::Uuid::new_v4().simple().to_string()[..6].to_uppercase();
	format!("RCP-{}-{}", Utc::now().format("%Y%m%d"), suffix)
}

pub(super) fn seed_context(ctx: &mut WizardContext) -> Result<(), ActionError> {
	if ctx.started_at.is_none() {
		ctx.started_at = Some(current_timestamp());
	}
	Ok(())
}

pub(super) fn process_payment(ctx: &mut WizardContext, payload: &Value) -> Result<(), ActionError> {
	let request: PaymentRequest = decode(payload)?;
	let total = ctx
		.totals
		.as_ref()
		.map(|totals| totals.total)
		.ok_or(ActionError::MissingContext("totals"))?;
	let prepayment = request.prepayment.unwrap_or(Decimal::ZERO);
	if prepayment < Decimal::ZERO || prepayment > total {
		return Err(ActionError::Validation(format!(
			"Prepayment must be between 0 and the order total {}",
			total
		)));
	}
	ctx.payment = Some(PaymentPlan {
		method: request.method,
		total,
		prepayment,
		balance_due: total - prepayment,
	});
	Ok(())
}

pub(super) fn store_additional_info(
	ctx: &mut WizardContext,
	payload: &Value,
) -> Result<(), ActionError> {
	let info: AdditionalInfo = decode(payload)?;
	let info = AdditionalInfo {
		order_notes: non_blank(info.order_notes),
		client_requirements: non_blank(info.client_requirements),
	};
	for text in [&info.order_notes, &info.client_requirements].into_iter().flatten() {
		if text.chars().count() > MAX_ORDER_NOTES_LEN {
			return Err(ActionError::Validation(format!(
				"Notes longer than {} characters",
				MAX_ORDER_NOTES_LEN
			)));
		}
	}
	ctx.additional_info = Some(info);
	Ok(())
}

pub(super) fn snapshot_summary(ctx: &mut WizardContext, wizard_id: &str) -> Result<(), ActionError> {
	let summary = OrderSummary {
		wizard_id: wizard_id.to_string(),
		client: ctx.client.clone().ok_or(ActionError::MissingContext("client"))?,
		order_info: ctx
			.order_info
			.clone()
			.ok_or(ActionError::MissingContext("order_info"))?,
		items: ctx.committed_items.clone(),
		execution: ctx.execution.clone().unwrap_or_default(),
		discount: ctx.discount.clone().unwrap_or_default(),
		payment: ctx.payment.clone().ok_or(ActionError::MissingContext("payment"))?,
		additional_info: ctx.additional_info.clone().unwrap_or_default(),
		totals: ctx.totals.clone().ok_or(ActionError::MissingContext("totals"))?,
		created_at: current_timestamp(),
	};
	// A receipt printed for an earlier summary no longer matches the order.
	ctx.receipt = None;
	ctx.receipt_config = None;
	ctx.summary = Some(summary);
	Ok(())
}

impl ActionExecutor {
	pub(super) async fn select_client(
		&self,
		ctx: &mut WizardContext,
		payload: &Value,
	) -> Result<(), ActionError> {
		let selection: ClientSelection = decode(payload)?;
		let client_id =
			non_blank(selection.client_id).ok_or(ActionError::MissingContext("client_id"))?;
		let client = self
			.call("clients", self.clients.find_client(&client_id))
			.await?;
		ctx.client = Some(client);
		Ok(())
	}

	pub(super) async fn store_order_info(
		&self,
		ctx: &mut WizardContext,
		payload: &Value,
	) -> Result<(), ActionError> {
		let info: OrderInfoPayload = decode(payload)?;
		let tag_number = non_blank(info.tag_number)
			.ok_or_else(|| ActionError::Validation("Tag number is required".into()))?;
		let branch_id = non_blank(info.branch_id)
			.ok_or_else(|| ActionError::Validation("Branch is required".into()))?;
		let receipt_number = non_blank(info.receipt_number).unwrap_or_else(generate_receipt_number);

		ctx.order_info = Some(OrderInfo {
			receipt_number,
			tag_number,
			branch_id,
			created_on: Utc::now().date_naive(),
		});
		if ctx.committed_items.is_empty() {
			ctx.totals = Some(OrderTotals::default());
			Ok(())
		} else {
			self.recompute_totals(ctx).await
		}
	}

	pub(super) async fn delete_item(
		&self,
		ctx: &mut WizardContext,
		payload: &Value,
	) -> Result<(), ActionError> {
		let reference: ItemReference = decode(payload)?;
		let item_id = non_blank(reference.item_id).ok_or(ActionError::MissingContext("item_id"))?;
		let before = ctx.committed_items.len();
		ctx.committed_items.retain(|item| item.id != item_id);
		if ctx.committed_items.len() == before {
			return Err(ActionError::Validation(format!("Item not found: {}", item_id)));
		}
		self.recompute_totals(ctx).await
	}

	pub(super) async fn store_execution_params(
		&self,
		ctx: &mut WizardContext,
		payload: &Value,
	) -> Result<(), ActionError> {
		let params: ExecutionParams = decode(payload)?;
		if let (Some(date), Some(info)) = (params.completion_date, &ctx.order_info) {
			if date < info.created_on {
				return Err(ActionError::Validation(format!(
					"Completion date {} is before the order date {}",
					date, info.created_on
				)));
			}
		}
		ctx.execution = Some(params);
		self.recompute_totals(ctx).await
	}

	pub(super) async fn apply_discount(
		&self,
		ctx: &mut WizardContext,
		payload: &Value,
	) -> Result<(), ActionError> {
		let mut selection: DiscountSelection = decode(payload)?;
		if selection.kind == DiscountKind::Custom {
			let percent = selection.custom_percent.ok_or_else(|| {
				ActionError::Validation("Custom discount needs a percentage".into())
			})?;
			if percent < Decimal::ZERO || percent > Decimal::from(MAX_CUSTOM_DISCOUNT_PERCENT) {
				return Err(ActionError::Validation(format!(
					"Custom discount must be between 0 and {}%",
					MAX_CUSTOM_DISCOUNT_PERCENT
				)));
			}
		} else {
			selection.custom_percent = None;
		}
		ctx.discount = Some(selection);
		self.recompute_totals(ctx).await
	}

	pub(super) async fn capture_signature(
		&self,
		ctx: &mut WizardContext,
		payload: &Value,
	) -> Result<(), ActionError> {
		let signature: SignaturePayload = decode(payload)?;
		let record = self
			.call("legal", self.legal.capture_signature(&signature))
			.await?;
		ctx.legal = Some(LegalAcceptance {
			terms_accepted: signature.terms_accepted,
			signature: record,
		});
		Ok(())
	}

	pub(super) async fn generate_receipt(
		&self,
		ctx: &mut WizardContext,
		payload: &Value,
	) -> Result<(), ActionError> {
		let config: ReceiptConfig = decode(payload)?;
		let summary = ctx
			.summary
			.as_ref()
			.ok_or(ActionError::MissingContext("summary"))?;
		let artifact = self
			.call("receipt", self.receipt.generate_receipt(summary, &config))
			.await?;
		ctx.receipt_config = Some(config);
		ctx.receipt = Some(artifact);
		Ok(())
	}

	pub(super) async fn finalize_order(&self, ctx: &mut WizardContext) -> Result<(), ActionError> {
		let summary = ctx
			.summary
			.as_ref()
			.ok_or(ActionError::MissingContext("summary"))?;
		let order_id = self
			.call("orders", self.orders.finalize_order(summary))
			.await?;
		ctx.order_id = Some(order_id);
		Ok(())
	}
}
