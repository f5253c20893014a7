//! Order item types: the draft composed by the item sub-wizard, the step
//! payloads that fill it, and the committed item.
//!
//! Each step payload is a patch: every field is optional and only the fields
//! present are written into the draft, so a step never erases values that
//! another step entered.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Unit an item is counted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitOfMeasure {
	Pieces,
	Kilograms,
}

/// Reference to an uploaded photo. The bytes live outside the wizard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoRef {
	pub file_name: String,
	pub content_type: String,
	pub size_bytes: u64,
}

/// A price modifier as applied to one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedModifier {
	pub code: String,
	pub percent: Decimal,
	pub amount: Decimal,
}

/// Price breakdown of one item as produced by the pricing collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemPricing {
	pub unit_price: Decimal,
	pub base_total: Decimal,
	#[serde(default)]
	pub modifiers: Vec<AppliedModifier>,
	pub final_total: Decimal,
}

/// Item under construction inside the sub-wizard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DraftItem {
	/// Set when editing an already committed item.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub category_code: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub item_name: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub quantity: Option<u32>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub unit: Option<UnitOfMeasure>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub material: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub color: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub filler: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub wear_level: Option<u8>,
	#[serde(default)]
	pub stains: Vec<String>,
	#[serde(default)]
	pub defects: Vec<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub defect_notes: Option<String>,
	#[serde(default)]
	pub no_guarantee: bool,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub no_guarantee_reason: Option<String>,
	#[serde(default)]
	pub modifiers: Vec<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub pricing: Option<ItemPricing>,
	#[serde(default)]
	pub photos: Vec<PhotoRef>,
	#[serde(default)]
	pub photos_skipped: bool,
}

/// `BASIC_INFO_COMPLETED` payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BasicInfoPatch {
	pub category_code: Option<String>,
	pub item_name: Option<String>,
	pub quantity: Option<u32>,
	pub unit: Option<UnitOfMeasure>,
}

/// `CHARACTERISTICS_COMPLETED` payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CharacteristicsPatch {
	pub material: Option<String>,
	pub color: Option<String>,
	pub filler: Option<String>,
	pub wear_level: Option<u8>,
}

/// `DEFECTS_COMPLETED` payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DefectsPatch {
	pub stains: Option<Vec<String>>,
	pub defects: Option<Vec<String>>,
	pub notes: Option<String>,
	pub no_guarantee: Option<bool>,
	pub no_guarantee_reason: Option<String>,
}

/// `PRICING_COMPLETED` payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PricingPatch {
	pub modifiers: Option<Vec<String>>,
}

/// `PHOTOS_COMPLETED` payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PhotosPatch {
	pub photos: Option<Vec<PhotoRef>>,
}

/// `EDIT_ITEM` and `DELETE_ITEM` payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ItemReference {
	pub item_id: Option<String>,
}

impl DraftItem {
	pub fn apply_basic(&mut self, patch: BasicInfoPatch) {
		if let Some(category_code) = patch.category_code {
			self.category_code = Some(category_code);
		}
		if let Some(item_name) = patch.item_name {
			self.item_name = Some(item_name);
		}
		if let Some(quantity) = patch.quantity {
			self.quantity = Some(quantity);
		}
		if let Some(unit) = patch.unit {
			self.unit = Some(unit);
		}
	}

	pub fn apply_characteristics(&mut self, patch: CharacteristicsPatch) {
		if let Some(material) = patch.material {
			self.material = Some(material);
		}
		if let Some(color) = patch.color {
			self.color = Some(color);
		}
		if let Some(filler) = patch.filler {
			self.filler = Some(filler);
		}
		if let Some(wear_level) = patch.wear_level {
			self.wear_level = Some(wear_level);
		}
	}

	pub fn apply_defects(&mut self, patch: DefectsPatch) {
		if let Some(stains) = patch.stains {
			self.stains = stains;
		}
		if let Some(defects) = patch.defects {
			self.defects = defects;
		}
		if let Some(notes) = patch.notes {
			self.defect_notes = Some(notes);
		}
		if let Some(no_guarantee) = patch.no_guarantee {
			self.no_guarantee = no_guarantee;
		}
		if let Some(reason) = patch.no_guarantee_reason {
			self.no_guarantee_reason = Some(reason);
		}
	}

	pub fn apply_pricing(&mut self, patch: PricingPatch) {
		if let Some(modifiers) = patch.modifiers {
			self.modifiers = modifiers;
		}
	}

	pub fn apply_photos(&mut self, patch: PhotosPatch) {
		if let Some(photos) = patch.photos {
			self.photos = photos;
			self.photos_skipped = false;
		}
	}

	/// Loads a committed item back into a draft for editing.
	pub fn from_order_item(item: &OrderItem) -> Self {
		Self {
			id: Some(item.id.clone()),
			category_code: Some(item.category_code.clone()),
			item_name: Some(item.item_name.clone()),
			quantity: Some(item.quantity),
			unit: Some(item.unit),
			material: item.material.clone(),
			color: item.color.clone(),
			filler: item.filler.clone(),
			wear_level: item.wear_level,
			stains: item.stains.clone(),
			defects: item.defects.clone(),
			defect_notes: item.defect_notes.clone(),
			no_guarantee: item.no_guarantee,
			no_guarantee_reason: item.no_guarantee_reason.clone(),
			modifiers: item.modifiers.clone(),
			pricing: Some(item.pricing.clone()),
			photos: item.photos.clone(),
			photos_skipped: item.photos.is_empty(),
		}
	}

	/// Turns a finished draft into a committed item.
	///
	/// Keeps the draft's id when editing, otherwise uses `new_id`.
	pub fn into_order_item(self, new_id: String) -> Result<OrderItem, String> {
		let category_code = self.category_code.ok_or("Draft item has no category")?;
		let item_name = self.item_name.ok_or("Draft item has no name")?;
		let quantity = self.quantity.ok_or("Draft item has no quantity")?;
		let unit = self.unit.ok_or("Draft item has no unit of measure")?;
		let pricing = self.pricing.ok_or("Draft item has not been priced")?;

		Ok(OrderItem {
			id: self.id.unwrap_or(new_id),
			category_code,
			item_name,
			quantity,
			unit,
			material: self.material,
			color: self.color,
			filler: self.filler,
			wear_level: self.wear_level,
			stains: self.stains,
			defects: self.defects,
			defect_notes: self.defect_notes,
			no_guarantee: self.no_guarantee,
			no_guarantee_reason: self.no_guarantee_reason,
			modifiers: self.modifiers,
			pricing,
			photos: self.photos,
		})
	}
}

/// An item committed to the order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
	pub id: String,
	pub category_code: String,
	pub item_name: String,
	pub quantity: u32,
	pub unit: UnitOfMeasure,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub material: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub color: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub filler: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub wear_level: Option<u8>,
	#[serde(default)]
	pub stains: Vec<String>,
	#[serde(default)]
	pub defects: Vec<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub defect_notes: Option<String>,
	#[serde(default)]
	pub no_guarantee: bool,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub no_guarantee_reason: Option<String>,
	#[serde(default)]
	pub modifiers: Vec<String>,
	pub pricing: ItemPricing,
	#[serde(default)]
	pub photos: Vec<PhotoRef>,
}

#[cfg(test)]
mod tests {
	use super::*;

	fn priced_draft() -> DraftItem {
		let mut draft = DraftItem::default();
		draft.apply_basic(BasicInfoPatch {
			category_code: Some("CLOTHING".into()),
			item_name: Some("Coat".into()),
			quantity: Some(1),
			unit: Some(UnitOfMeasure::Pieces),
		});
		draft.pricing = Some(ItemPricing {
			unit_price: Decimal::new(25000, 2),
			base_total: Decimal::new(25000, 2),
			modifiers: vec![],
			final_total: Decimal::new(25000, 2),
		});
		draft
	}

	#[test]
	fn test_patch_keeps_untouched_fields() {
		let mut draft = priced_draft();
		draft.apply_basic(BasicInfoPatch {
			quantity: Some(3),
			..Default::default()
		});

		assert_eq!(draft.quantity, Some(3));
		assert_eq!(draft.item_name.as_deref(), Some("Coat"));
		assert_eq!(draft.category_code.as_deref(), Some("CLOTHING"));
	}

	#[test]
	fn test_into_order_item_requires_pricing() {
		let mut draft = priced_draft();
		draft.pricing = None;
		let err = draft.into_order_item("item-1".into()).unwrap_err();
		assert!(err.contains("not been priced"));
	}

	#[test]
	fn test_edit_round_trip_keeps_id() {
		let item = priced_draft().into_order_item("item-1".into()).unwrap();
		let draft = DraftItem::from_order_item(&item);
		assert_eq!(draft.id.as_deref(), Some("item-1"));

		let again = draft.into_order_item("ignored".into()).unwrap();
		assert_eq!(again, item);
	}

	#[test]
	fn test_photos_patch_clears_skip_flag() {
		let mut draft = DraftItem {
			photos_skipped: true,
			..Default::default()
		};
		draft.apply_photos(PhotosPatch {
			photos: Some(vec![PhotoRef {
				file_name: "front.jpg".into(),
				content_type: "image/jpeg".into(),
				size_bytes: 1024,
			}]),
		});
		assert!(!draft.photos_skipped);
		assert_eq!(draft.photos.len(), 1);
	}
}
