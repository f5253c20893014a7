//! Notifications published on the engine's event bus.

use serde::{Deserialize, Serialize};

use crate::instance::TransitionOutcome;
use crate::transition::WizardEvent;

/// Something observable happened to a wizard instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EngineEvent {
	/// A new instance was created and started.
	Created { wizard_id: String },
	/// An event was applied or refused.
	Transition {
		wizard_id: String,
		from: String,
		event: WizardEvent,
		to: String,
		outcome: TransitionOutcome,
	},
	/// The order was finalized and stored.
	Completed { wizard_id: String, order_id: String },
	Cancelled { wizard_id: String },
}

impl EngineEvent {
	pub fn wizard_id(&self) -> &str {
		match self {
			Self::Created { wizard_id }
			| Self::Transition { wizard_id, .. }
			| Self::Completed { wizard_id, .. }
			| Self::Cancelled { wizard_id } => wizard_id,
		}
	}
}
