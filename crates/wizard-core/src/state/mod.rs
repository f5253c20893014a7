//! Transition tables.
//!
//! The main machine and the item sub-wizard are two `match` tables from
//! `(position, event)` to a [`Transition`]. [`resolve`] picks the table: the
//! sub-wizard's while it is active inside `ITEM_MANAGEMENT`, the main one
//! otherwise. `CANCEL_ORDER` always goes to the main table.

use crate::actions::Action;
use crate::guards::GuardFn;
use wizard_types::{ItemStep, WizardEvent, WizardState};

pub mod item;
pub mod machine;

/// Where an allowed transition leads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
	/// A main state. Leaving the sub-wizard is done by the action.
	State(WizardState),
	/// A sub-wizard step within `ITEM_MANAGEMENT`.
	Step(ItemStep),
	/// Internal transition: position unchanged.
	Stay,
}

#[derive(Clone, Copy)]
pub struct Transition {
	pub target: Target,
	pub guard: Option<GuardFn>,
	pub action: Option<Action>,
}

impl Transition {
	pub(crate) fn to(target: Target) -> Self {
		Self {
			target,
			guard: None,
			action: None,
		}
	}

	pub(crate) fn guarded(mut self, guard: GuardFn) -> Self {
		self.guard = Some(guard);
		self
	}

	pub(crate) fn run(mut self, action: Action) -> Self {
		self.action = Some(action);
		self
	}
}

/// Looks up the transition for `event` at the given position.
///
/// `None` means the pair is undefined: an invalid transition.
pub fn resolve(
	state: WizardState,
	item_step: Option<ItemStep>,
	event: WizardEvent,
) -> Option<Transition> {
	match (state, item_step) {
		(WizardState::ItemManagement, Some(step)) if event != WizardEvent::CancelOrder => {
			item::transition(step, event)
		},
		_ => machine::transition(state, event),
	}
}
