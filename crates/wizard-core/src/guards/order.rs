//! Guards of the main wizard.

use super::{is_blank, verdict, GuardError, GuardInput, GuardResult};
use wizard_types::utils::constants::{MAX_RECEIPT_NUMBER_LEN, MAX_TAG_LEN, MIN_TAG_LEN};
use wizard_types::{ClientSelection, ItemReference, OrderInfoPayload, SignaturePayload};

pub fn client_selected(input: &GuardInput) -> Result<GuardResult, GuardError> {
	let selection: ClientSelection = match input.payload() {
		Ok(selection) => selection,
		Err(rejection) => return Ok(rejection),
	};
	if is_blank(selection.client_id.as_deref()) {
		return Ok(GuardResult::reject("Client must be selected"));
	}
	Ok(GuardResult::allow())
}

fn valid_tag(tag: &str) -> bool {
	(MIN_TAG_LEN..=MAX_TAG_LEN).contains(&tag.len())
		&& tag
			.chars()
			.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

pub fn order_info_valid(input: &GuardInput) -> Result<GuardResult, GuardError> {
	let info: OrderInfoPayload = match input.payload() {
		Ok(info) => info,
		Err(rejection) => return Ok(rejection),
	};
	let mut problems = Vec::new();

	if let Some(receipt) = &info.receipt_number {
		let receipt = receipt.trim();
		if receipt.is_empty() {
			problems.push("Receipt number must not be blank".to_string());
		} else if receipt.len() > MAX_RECEIPT_NUMBER_LEN {
			problems.push(format!(
				"Receipt number longer than {} characters",
				MAX_RECEIPT_NUMBER_LEN
			));
		}
	}
	match info.tag_number.as_deref().map(str::trim) {
		None | Some("") => problems.push("Tag number is required".to_string()),
		Some(tag) if !valid_tag(tag) => problems.push(format!(
			"Tag number must be {}-{} letters, digits, '-' or '_'",
			MIN_TAG_LEN, MAX_TAG_LEN
		)),
		Some(_) => {},
	}
	if is_blank(info.branch_id.as_deref()) {
		problems.push("Branch is required".to_string());
	}

	Ok(verdict(problems))
}

pub fn item_slot_available(input: &GuardInput) -> Result<GuardResult, GuardError> {
	let max = input.limits.max_items_per_order;
	if input.context.committed_items.len() >= max {
		return Ok(GuardResult::reject(format!(
			"Maximum of {} items per order reached",
			max
		)));
	}
	Ok(GuardResult::allow())
}

pub fn item_exists(input: &GuardInput) -> Result<GuardResult, GuardError> {
	let reference: ItemReference = match input.payload() {
		Ok(reference) => reference,
		Err(rejection) => return Ok(rejection),
	};
	let Some(item_id) = reference.item_id.as_deref().map(str::trim) else {
		return Ok(GuardResult::reject("Item id is required"));
	};
	if input.context.find_item(item_id).is_none() {
		return Ok(GuardResult::reject(format!("Item not found: {}", item_id)));
	}
	Ok(GuardResult::allow())
}

pub fn has_items(input: &GuardInput) -> Result<GuardResult, GuardError> {
	if input.context.committed_items.is_empty() {
		return Ok(GuardResult::reject("no items"));
	}
	Ok(GuardResult::allow())
}

pub fn terms_signed(input: &GuardInput) -> Result<GuardResult, GuardError> {
	let signature: SignaturePayload = match input.payload() {
		Ok(signature) => signature,
		Err(rejection) => return Ok(rejection),
	};
	if is_blank(signature.signature_data.as_deref()) {
		return Ok(GuardResult::reject("signature required"));
	}
	if !signature.terms_accepted {
		return Ok(GuardResult::reject("terms must be accepted"));
	}
	Ok(GuardResult::allow())
}

pub fn receipt_generated(input: &GuardInput) -> Result<GuardResult, GuardError> {
	if input.context.summary.is_none() {
		return Err(GuardError::MissingContext("summary"));
	}
	if input.context.receipt.is_none() {
		return Ok(GuardResult::reject("receipt not generated"));
	}
	Ok(GuardResult::allow())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::guards::GuardLimits;
	use serde_json::{json, Value};
	use wizard_types::{WizardContext, WizardEvent, WizardState};

	fn run(
		guard: fn(&GuardInput) -> Result<GuardResult, GuardError>,
		context: &WizardContext,
		payload: Value,
	) -> Result<GuardResult, GuardError> {
		let limits = GuardLimits::default();
		guard(&GuardInput {
			state: WizardState::OrderInitialization,
			event: WizardEvent::OrderInfoCompleted,
			context,
			payload: &payload,
			limits: &limits,
		})
	}

	#[test]
	fn test_order_info_rules() {
		let context = WizardContext::default();
		let ok = run(
			order_info_valid,
			&context,
			json!({ "tag_number": "TAG-01", "branch_id": "main" }),
		)
		.unwrap();
		assert!(ok.allowed);

		let short_tag = run(
			order_info_valid,
			&context,
			json!({ "tag_number": "T1", "branch_id": "main" }),
		)
		.unwrap();
		assert!(!short_tag.allowed);

		let bad_chars = run(
			order_info_valid,
			&context,
			json!({ "tag_number": "TAG 01!", "branch_id": "main" }),
		)
		.unwrap();
		assert!(!bad_chars.allowed);

		let everything = run(order_info_valid, &context, json!({ "receipt_number": " " })).unwrap();
		let reason = everything.reason.unwrap();
		assert!(reason.contains("Receipt number"));
		assert!(reason.contains("Tag number is required"));
		assert!(reason.contains("Branch is required"));
	}

	#[test]
	fn test_malformed_payload_is_rejected_not_error() {
		let context = WizardContext::default();
		let result = run(client_selected, &context, json!({ "client": 1 })).unwrap();
		assert!(!result.allowed);
		assert!(result.reason.unwrap().starts_with("Malformed payload"));
	}

	#[test]
	fn test_terms_signed_requires_signature_first() {
		let context = WizardContext::default();
		let result = run(
			terms_signed,
			&context,
			json!({ "signature_data": "", "terms_accepted": true }),
		)
		.unwrap();
		assert_eq!(result.reason.as_deref(), Some("signature required"));

		let unaccepted = run(terms_signed, &context, json!({ "signature_data": "abc" })).unwrap();
		assert_eq!(unaccepted.reason.as_deref(), Some("terms must be accepted"));
	}

	#[test]
	fn test_receipt_guard_needs_summary() {
		let context = WizardContext::default();
		assert_eq!(
			run(receipt_generated, &context, Value::Null),
			Err(GuardError::MissingContext("summary"))
		);
	}
}
