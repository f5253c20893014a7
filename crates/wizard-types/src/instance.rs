//! Wizard instance, its history, and the engine's response types.

use serde::{Deserialize, Serialize};

use crate::context::WizardContext;
use crate::state::WizardState;
use crate::transition::WizardEvent;
use crate::utils::current_timestamp;

/// How one submitted event ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransitionOutcome {
	Accepted,
	GuardRejected { reason: String },
	ActionFailed { action: String, reason: String },
	InvalidTransition,
}

/// Append-only record of one submitted event.
///
/// `from` and `to` are step labels: the main state name, or
/// `ITEM_MANAGEMENT/<STEP>` while the item sub-wizard is active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
	pub from: String,
	pub event: WizardEvent,
	pub to: String,
	pub outcome: TransitionOutcome,
	pub timestamp: u64,
}

/// One running order wizard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WizardInstance {
	pub id: String,
	pub state: WizardState,
	#[serde(default)]
	pub context: WizardContext,
	#[serde(default)]
	pub history: Vec<HistoryEntry>,
	pub created_at: u64,
	pub updated_at: u64,
}

impl WizardInstance {
	pub fn new(id: impl Into<String>) -> Self {
		let now = current_timestamp();
		Self {
			id: id.into(),
			state: WizardState::Initial,
			context: WizardContext::default(),
			history: Vec::new(),
			created_at: now,
			updated_at: now,
		}
	}

	pub fn is_terminal(&self) -> bool {
		self.state.is_terminal()
	}

	/// Current step label.
	pub fn step_label(&self) -> String {
		match (self.state, self.context.item_step()) {
			(WizardState::ItemManagement, Some(step)) => {
				format!("{}/{}", WizardState::ItemManagement, step)
			},
			(state, _) => state.as_str().to_string(),
		}
	}

	pub fn record(&mut self, from: String, event: WizardEvent, outcome: TransitionOutcome) {
		let now = current_timestamp();
		self.history.push(HistoryEntry {
			from,
			event,
			to: self.step_label(),
			outcome,
			timestamp: now,
		});
		self.updated_at = now;
	}

	pub fn snapshot(&self) -> WizardSnapshot {
		WizardSnapshot {
			wizard_id: self.id.clone(),
			state: self.state,
			step: self.step_label(),
			context: self.context.clone(),
			history: self.history.clone(),
		}
	}
}

/// Recoverable result of a submitted event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SubmitOutcome {
	Accepted,
	GuardRejected { reason: String },
	ActionFailed { action: String, reason: String },
}

impl SubmitOutcome {
	pub fn is_accepted(&self) -> bool {
		matches!(self, Self::Accepted)
	}
}

impl From<SubmitOutcome> for TransitionOutcome {
	fn from(outcome: SubmitOutcome) -> Self {
		match outcome {
			SubmitOutcome::Accepted => Self::Accepted,
			SubmitOutcome::GuardRejected { reason } => Self::GuardRejected { reason },
			SubmitOutcome::ActionFailed { action, reason } => {
				Self::ActionFailed { action, reason }
			},
		}
	}
}

/// Engine response to `submit`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitResponse {
	pub wizard_id: String,
	pub state: WizardState,
	pub step: String,
	pub context: WizardContext,
	pub outcome: SubmitOutcome,
}

/// Read-only view of an instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WizardSnapshot {
	pub wizard_id: String,
	pub state: WizardState,
	pub step: String,
	pub context: WizardContext,
	pub history: Vec<HistoryEntry>,
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::context::{ItemWizardMode, ItemWizardSession};
	use crate::item::DraftItem;
	use crate::state::ItemStep;

	#[test]
	fn test_step_label_includes_item_step() {
		let mut instance = WizardInstance::new("w-1");
		instance.state = WizardState::ItemManagement;
		assert_eq!(instance.step_label(), "ITEM_MANAGEMENT");

		instance.context.item_wizard = Some(ItemWizardSession {
			step: ItemStep::Pricing,
			mode: ItemWizardMode::Add,
			draft: DraftItem::default(),
		});
		assert_eq!(instance.step_label(), "ITEM_MANAGEMENT/PRICING");
	}

	#[test]
	fn test_record_appends_with_current_label() {
		let mut instance = WizardInstance::new("w-1");
		instance.state = WizardState::ClientSelection;
		instance.record(
			"INITIAL".into(),
			WizardEvent::StartOrder,
			TransitionOutcome::Accepted,
		);

		assert_eq!(instance.history.len(), 1);
		assert_eq!(instance.history[0].to, "CLIENT_SELECTION");
	}

	#[test]
	fn test_outcome_wire_format() {
		let json = serde_json::to_value(TransitionOutcome::GuardRejected {
			reason: "no items".into(),
		})
		.unwrap();
		assert_eq!(
			json,
			serde_json::json!({ "kind": "guard_rejected", "reason": "no items" })
		);
	}
}
