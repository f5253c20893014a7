//! Guards of the item sub-wizard.
//!
//! Each step validates the draft as it would look after the step's payload
//! is merged, so a field entered earlier does not have to be resent.

use super::{is_blank, verdict, GuardError, GuardInput, GuardResult};
use std::collections::HashSet;
use wizard_types::utils::constants::{
	MAX_DEFECT_NOTES_LEN, MAX_MODIFIERS_PER_ITEM, MAX_NO_GUARANTEE_REASON_LEN,
	MAX_PHOTOS_PER_ITEM, MAX_PHOTO_BYTES, MAX_QUANTITY, MAX_TOTAL_PHOTO_BYTES,
	MIN_ITEM_NAME_LEN, MIN_QUANTITY, PHOTO_CONTENT_TYPES, WEAR_LEVELS,
};
use wizard_types::{
	BasicInfoPatch, CharacteristicsPatch, DefectsPatch, PhotosPatch, PricingPatch,
};

pub fn basic_info_valid(input: &GuardInput) -> Result<GuardResult, GuardError> {
	let mut draft = input.draft()?.clone();
	match input.payload::<BasicInfoPatch>() {
		Ok(patch) => draft.apply_basic(patch),
		Err(rejection) => return Ok(rejection),
	}
	let mut problems = Vec::new();

	if is_blank(draft.category_code.as_deref()) {
		problems.push("Category is required".to_string());
	}
	let name_len = draft
		.item_name
		.as_deref()
		.map(|name| name.trim().chars().count())
		.unwrap_or(0);
	if name_len < MIN_ITEM_NAME_LEN {
		problems.push(format!(
			"Item name must have at least {} characters",
			MIN_ITEM_NAME_LEN
		));
	}
	match draft.quantity {
		Some(quantity) if (MIN_QUANTITY..=MAX_QUANTITY).contains(&quantity) => {},
		_ => problems.push(format!(
			"Quantity must be between {} and {}",
			MIN_QUANTITY, MAX_QUANTITY
		)),
	}
	if draft.unit.is_none() {
		problems.push("Unit of measure is required".to_string());
	}

	Ok(verdict(problems))
}

pub fn characteristics_valid(input: &GuardInput) -> Result<GuardResult, GuardError> {
	let mut draft = input.draft()?.clone();
	match input.payload::<CharacteristicsPatch>() {
		Ok(patch) => draft.apply_characteristics(patch),
		Err(rejection) => return Ok(rejection),
	}
	let mut problems = Vec::new();

	if is_blank(draft.material.as_deref()) {
		problems.push("Material is required".to_string());
	}
	if is_blank(draft.color.as_deref()) {
		problems.push("Color is required".to_string());
	}
	match draft.wear_level {
		Some(level) if WEAR_LEVELS.contains(&level) => {},
		Some(level) => problems.push(format!(
			"Wear level {}% is not one of {:?}",
			level, WEAR_LEVELS
		)),
		None => problems.push("Wear level is required".to_string()),
	}

	Ok(verdict(problems))
}

pub fn defects_valid(input: &GuardInput) -> Result<GuardResult, GuardError> {
	let mut draft = input.draft()?.clone();
	match input.payload::<DefectsPatch>() {
		Ok(patch) => draft.apply_defects(patch),
		Err(rejection) => return Ok(rejection),
	}
	let mut problems = Vec::new();

	if let Some(notes) = &draft.defect_notes {
		if notes.chars().count() > MAX_DEFECT_NOTES_LEN {
			problems.push(format!(
				"Defect notes longer than {} characters",
				MAX_DEFECT_NOTES_LEN
			));
		}
	}
	if draft.no_guarantee {
		match draft.no_guarantee_reason.as_deref().map(str::trim) {
			None | Some("") => problems.push("No-guarantee reason is required".to_string()),
			Some(reason) if reason.chars().count() > MAX_NO_GUARANTEE_REASON_LEN => {
				problems.push(format!(
					"No-guarantee reason longer than {} characters",
					MAX_NO_GUARANTEE_REASON_LEN
				))
			},
			Some(_) => {},
		}
	}

	Ok(verdict(problems))
}

pub fn modifiers_valid(input: &GuardInput) -> Result<GuardResult, GuardError> {
	let mut draft = input.draft()?.clone();
	match input.payload::<PricingPatch>() {
		Ok(patch) => draft.apply_pricing(patch),
		Err(rejection) => return Ok(rejection),
	}
	let mut problems = Vec::new();

	if draft.modifiers.len() > MAX_MODIFIERS_PER_ITEM {
		problems.push(format!(
			"At most {} modifiers per item",
			MAX_MODIFIERS_PER_ITEM
		));
	}
	let mut seen = HashSet::new();
	for code in &draft.modifiers {
		let well_formed = !code.is_empty()
			&& code
				.chars()
				.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_');
		if !well_formed {
			problems.push(format!("Malformed modifier code: '{}'", code));
		} else if !seen.insert(code.as_str()) {
			problems.push(format!("Duplicate modifier: {}", code));
		}
	}

	Ok(verdict(problems))
}

pub fn photos_valid(input: &GuardInput) -> Result<GuardResult, GuardError> {
	let mut draft = input.draft()?.clone();
	match input.payload::<PhotosPatch>() {
		Ok(patch) => draft.apply_photos(patch),
		Err(rejection) => return Ok(rejection),
	}
	let mut problems = Vec::new();

	if draft.photos.len() > MAX_PHOTOS_PER_ITEM {
		problems.push(format!("At most {} photos per item", MAX_PHOTOS_PER_ITEM));
	}
	let mut total: u64 = 0;
	for photo in &draft.photos {
		total = total.saturating_add(photo.size_bytes);
		if photo.file_name.trim().is_empty() {
			problems.push("Photo file name is required".to_string());
		}
		if photo.size_bytes > MAX_PHOTO_BYTES {
			problems.push(format!("Photo '{}' exceeds 5 MiB", photo.file_name));
		}
		let content_type = photo.content_type.to_ascii_lowercase();
		if !PHOTO_CONTENT_TYPES.contains(&content_type.as_str()) {
			problems.push(format!(
				"Photo '{}' has unsupported type {}",
				photo.file_name, photo.content_type
			));
		}
	}
	if total > MAX_TOTAL_PHOTO_BYTES {
		problems.push("Photos exceed 25 MiB in total".to_string());
	}

	Ok(verdict(problems))
}

pub fn draft_priced(input: &GuardInput) -> Result<GuardResult, GuardError> {
	if input.draft()?.pricing.is_none() {
		return Ok(GuardResult::reject("Item has not been priced"));
	}
	Ok(GuardResult::allow())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::guards::GuardLimits;
	use serde_json::{json, Value};
	use wizard_types::{
		DraftItem, ItemStep, ItemWizardMode, ItemWizardSession, UnitOfMeasure, WizardContext,
		WizardEvent, WizardState,
	};

	fn with_draft(draft: DraftItem) -> WizardContext {
		WizardContext {
			item_wizard: Some(ItemWizardSession {
				step: ItemStep::BasicInfo,
				mode: ItemWizardMode::Add,
				draft,
			}),
			..Default::default()
		}
	}

	fn run(
		guard: fn(&GuardInput) -> Result<GuardResult, GuardError>,
		context: &WizardContext,
		payload: Value,
	) -> Result<GuardResult, GuardError> {
		let limits = GuardLimits::default();
		guard(&GuardInput {
			state: WizardState::ItemManagement,
			event: WizardEvent::BasicInfoCompleted,
			context,
			payload: &payload,
			limits: &limits,
		})
	}

	#[test]
	fn test_basic_info_bounds() {
		let context = with_draft(DraftItem::default());
		let valid = json!({
			"category_code": "CLOTHING",
			"item_name": "Coat",
			"quantity": 1000,
			"unit": "pieces"
		});
		assert!(run(basic_info_valid, &context, valid).unwrap().allowed);

		let too_many = json!({
			"category_code": "CLOTHING",
			"item_name": "C",
			"quantity": 1001,
			"unit": "pieces"
		});
		let result = run(basic_info_valid, &context, too_many).unwrap();
		let reason = result.reason.unwrap();
		assert!(reason.contains("at least 2"));
		assert!(reason.contains("between 1 and 1000"));
	}

	#[test]
	fn test_guard_sees_previously_merged_fields() {
		let context = with_draft(DraftItem {
			category_code: Some("CLOTHING".into()),
			item_name: Some("Coat".into()),
			quantity: Some(2),
			unit: Some(UnitOfMeasure::Pieces),
			..Default::default()
		});
		assert!(run(basic_info_valid, &context, Value::Null).unwrap().allowed);
	}

	#[test]
	fn test_wear_level_must_be_offered_value() {
		let context = with_draft(DraftItem::default());
		let result = run(
			characteristics_valid,
			&context,
			json!({ "material": "Wool", "color": "Black", "wear_level": 20 }),
		)
		.unwrap();
		assert!(!result.allowed);
		assert!(run(
			characteristics_valid,
			&context,
			json!({ "material": "Wool", "color": "Black", "wear_level": 30 }),
		)
		.unwrap()
		.allowed);
	}

	#[test]
	fn test_no_guarantee_requires_reason() {
		let context = with_draft(DraftItem::default());
		let missing = run(defects_valid, &context, json!({ "no_guarantee": true })).unwrap();
		assert!(!missing.allowed);
		let long_reason = "x".repeat(201);
		let too_long = run(
			defects_valid,
			&context,
			json!({ "no_guarantee": true, "no_guarantee_reason": long_reason }),
		)
		.unwrap();
		assert!(!too_long.allowed);
		let notes = "n".repeat(501);
		assert!(!run(defects_valid, &context, json!({ "notes": notes })).unwrap().allowed);
	}

	#[test]
	fn test_photo_limits() {
		let context = with_draft(DraftItem::default());
		let photo = |name: &str, size: u64, kind: &str| {
			json!({ "file_name": name, "content_type": kind, "size_bytes": size })
		};
		let ok = json!({ "photos": [photo("a.jpg", 1024, "image/jpeg")] });
		assert!(run(photos_valid, &context, ok).unwrap().allowed);

		let big = json!({ "photos": [photo("a.png", 6 * 1024 * 1024, "image/png")] });
		assert!(!run(photos_valid, &context, big).unwrap().allowed);

		let pdf = json!({ "photos": [photo("a.pdf", 10, "application/pdf")] });
		assert!(!run(photos_valid, &context, pdf).unwrap().allowed);

		let six: Vec<Value> = (0..6).map(|i| photo(&format!("{}.jpg", i), 10, "image/jpeg")).collect();
		assert!(!run(photos_valid, &context, json!({ "photos": six })).unwrap().allowed);
	}

	#[test]
	fn test_modifier_codes() {
		let context = with_draft(DraftItem::default());
		assert!(run(modifiers_valid, &context, json!({ "modifiers": ["KIDS", "VERY_DIRTY"] }))
			.unwrap()
			.allowed);
		assert!(!run(modifiers_valid, &context, json!({ "modifiers": ["kids"] }))
			.unwrap()
			.allowed);
		assert!(!run(modifiers_valid, &context, json!({ "modifiers": ["KIDS", "KIDS"] }))
			.unwrap()
			.allowed);
	}

	#[test]
	fn test_item_guards_need_active_draft() {
		let context = WizardContext::default();
		assert_eq!(
			run(draft_priced, &context, Value::Null),
			Err(GuardError::MissingContext("draft_item"))
		);
	}
}
