//! Extended state attached to one wizard run.
//!
//! The context is a typed struct with one optional slot per stage. A second,
//! key-oriented view (`get`/`set`/`remove`) addresses the same slots by their
//! wire names; it goes through serde, so a value of the wrong shape is
//! rejected instead of silently stored.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::item::{DraftItem, OrderItem};
use crate::order::{
	AdditionalInfo, Client, DiscountSelection, ExecutionParams, LegalAcceptance, OrderInfo,
	OrderSummary, OrderTotals, PaymentPlan, ReceiptArtifact, ReceiptConfig,
};
use crate::state::ItemStep;
use crate::transition::WizardEvent;

/// Errors raised by the key-oriented context view.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContextError {
	#[error("Unknown context key: {0}")]
	UnknownKey(String),
	#[error("Context key '{key}' has the wrong type: {message}")]
	TypeMismatch { key: String, message: String },
	#[error("Context key '{0}' is managed by the wizard and cannot be written")]
	Protected(String),
}

/// Whether the sub-wizard is composing a new item or editing a committed one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ItemWizardMode {
	Add,
	Edit { item_id: String },
}

/// Active item sub-wizard. Its presence is the inner-region-active flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemWizardSession {
	pub step: ItemStep,
	pub mode: ItemWizardMode,
	pub draft: DraftItem,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
	GuardRejected,
	ActionFailed,
}

/// Diagnostic left by the last rejected or failed transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WizardFailure {
	pub kind: FailureKind,
	pub event: WizardEvent,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub action: Option<String>,
	pub message: String,
	pub at: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WizardContext {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub started_at: Option<u64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub client: Option<Client>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub order_info: Option<OrderInfo>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub item_wizard: Option<ItemWizardSession>,
	#[serde(default)]
	pub committed_items: Vec<OrderItem>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub totals: Option<OrderTotals>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub execution: Option<ExecutionParams>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub discount: Option<DiscountSelection>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub payment: Option<PaymentPlan>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub additional_info: Option<AdditionalInfo>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub summary: Option<OrderSummary>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub legal: Option<LegalAcceptance>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub receipt_config: Option<ReceiptConfig>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub receipt: Option<ReceiptArtifact>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub order_id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub last_error: Option<WizardFailure>,
}

impl WizardContext {
	/// Wire keys accepted by the key-oriented view.
	pub const KEYS: [&'static str; 17] = [
		"started_at",
		"client",
		"order_info",
		"item_wizard",
		"committed_items",
		"totals",
		"execution",
		"discount",
		"payment",
		"additional_info",
		"summary",
		"legal",
		"receipt_config",
		"receipt",
		"order_id",
		"last_error",
		"draft_item",
	];

	/// Keys only the wizard's own actions may write.
	const PROTECTED: [&'static str; 3] = ["item_wizard", "committed_items", "draft_item"];

	/// The item being composed, present iff the sub-wizard is active.
	pub fn draft_item(&self) -> Option<&DraftItem> {
		self.item_wizard.as_ref().map(|session| &session.draft)
	}

	pub fn item_step(&self) -> Option<ItemStep> {
		self.item_wizard.as_ref().map(|session| session.step)
	}

	pub fn find_item(&self, item_id: &str) -> Option<&OrderItem> {
		self.committed_items.iter().find(|item| item.id == item_id)
	}

	/// Serializable form of the whole context.
	pub fn snapshot(&self) -> Value {
		serde_json::to_value(self).unwrap_or(Value::Null)
	}

	/// Reads a slot by wire key. Absent slots read as `None`.
	pub fn get(&self, key: &str) -> Result<Option<Value>, ContextError> {
		Self::check_key(key)?;
		if key == "draft_item" {
			return Ok(self
				.draft_item()
				.and_then(|draft| serde_json::to_value(draft).ok()));
		}
		let snapshot = self.snapshot();
		Ok(snapshot.get(key).filter(|v| !v.is_null()).cloned())
	}

	/// Reads a slot and decodes it.
	///
	/// A present value that does not decode as `T` is a programming error and
	/// is reported as `TypeMismatch`.
	pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ContextError> {
		match self.get(key)? {
			None => Ok(None),
			Some(value) => serde_json::from_value(value)
				.map(Some)
				.map_err(|e| ContextError::TypeMismatch {
					key: key.to_string(),
					message: e.to_string(),
				}),
		}
	}

	/// Writes a slot by wire key.
	pub fn set(&mut self, key: &str, value: Value) -> Result<(), ContextError> {
		Self::check_key(key)?;
		if Self::PROTECTED.contains(&key) {
			return Err(ContextError::Protected(key.to_string()));
		}
		let mut snapshot = match self.snapshot() {
			Value::Object(map) => map,
			_ => serde_json::Map::new(),
		};
		snapshot.insert(key.to_string(), value);
		let updated: WizardContext =
			serde_json::from_value(Value::Object(snapshot)).map_err(|e| {
				ContextError::TypeMismatch {
					key: key.to_string(),
					message: e.to_string(),
				}
			})?;
		*self = updated;
		Ok(())
	}

	/// Clears a slot by wire key.
	pub fn remove(&mut self, key: &str) -> Result<(), ContextError> {
		self.set(key, Value::Null)
	}

	fn check_key(key: &str) -> Result<(), ContextError> {
		if Self::KEYS.contains(&key) {
			Ok(())
		} else {
			Err(ContextError::UnknownKey(key.to_string()))
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::item::DraftItem;
	use serde_json::json;

	fn client_json() -> Value {
		json!({
			"id": "c-1",
			"first_name": "Olena",
			"last_name": "Koval",
			"phone": "+380501112233"
		})
	}

	#[test]
	fn test_set_and_get_by_key() {
		let mut ctx = WizardContext::default();
		ctx.set("client", client_json()).unwrap();

		assert_eq!(ctx.client.as_ref().map(|c| c.id.as_str()), Some("c-1"));
		assert_eq!(ctx.get("client").unwrap(), Some(client_json()));

		let client: Client = ctx.get_as("client").unwrap().unwrap();
		assert_eq!(client.full_name(), "Olena Koval");
	}

	#[test]
	fn test_set_wrong_shape_is_type_mismatch() {
		let mut ctx = WizardContext::default();
		let err = ctx.set("client", json!(42)).unwrap_err();
		assert!(matches!(err, ContextError::TypeMismatch { ref key, .. } if key == "client"));
		assert!(ctx.client.is_none());
	}

	#[test]
	fn test_get_as_wrong_type_is_type_mismatch() {
		let mut ctx = WizardContext::default();
		ctx.set("order_id", json!("ORD-1")).unwrap();
		let err = ctx.get_as::<u64>("order_id").unwrap_err();
		assert!(matches!(err, ContextError::TypeMismatch { .. }));
	}

	#[test]
	fn test_remove_and_unknown_keys() {
		let mut ctx = WizardContext::default();
		ctx.set("order_id", json!("ORD-1")).unwrap();
		ctx.remove("order_id").unwrap();
		assert_eq!(ctx.get("order_id").unwrap(), None);

		assert_eq!(
			ctx.get("nope").unwrap_err(),
			ContextError::UnknownKey("nope".into())
		);
	}

	#[test]
	fn test_protected_keys() {
		let mut ctx = WizardContext::default();
		assert_eq!(
			ctx.set("committed_items", json!([])).unwrap_err(),
			ContextError::Protected("committed_items".into())
		);
		assert!(matches!(
			ctx.remove("item_wizard").unwrap_err(),
			ContextError::Protected(_)
		));
	}

	#[test]
	fn test_draft_item_derived_from_session() {
		let mut ctx = WizardContext::default();
		assert!(ctx.draft_item().is_none());
		assert_eq!(ctx.get("draft_item").unwrap(), None);

		ctx.item_wizard = Some(ItemWizardSession {
			step: ItemStep::BasicInfo,
			mode: ItemWizardMode::Add,
			draft: DraftItem::default(),
		});
		assert!(ctx.draft_item().is_some());
		assert!(ctx.get("draft_item").unwrap().is_some());
		assert_eq!(ctx.item_step(), Some(ItemStep::BasicInfo));
	}
}
