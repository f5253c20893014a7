//! Item sub-wizard table.
//!
//! `WIZARD_ACTIVE` is the pseudo-entry: entering the region seeds the draft
//! there and the entry edge is followed at once, so no event is ever
//! resolved at that step. `GO_BACK` at `BASIC_INFO` leaves the region the
//! same way `CANCEL_ITEM_WIZARD` does.

use super::{Target, Transition};
use crate::actions::Action;
use crate::guards::item as guard;
use wizard_types::{ItemStep, WizardEvent, WizardState};

/// The step `GO_BACK` returns to. `ITEM_COMPLETE` always goes back to
/// `PRICING`, whether photos were added or skipped.
fn previous(step: ItemStep) -> Option<ItemStep> {
	use ItemStep::*;

	match step {
		Characteristics => Some(BasicInfo),
		DefectsStains => Some(Characteristics),
		Pricing => Some(DefectsStains),
		Photos => Some(Pricing),
		ItemComplete => Some(Pricing),
		WizardActive | BasicInfo => None,
	}
}

pub fn transition(step: ItemStep, event: WizardEvent) -> Option<Transition> {
	use ItemStep as S;
	use WizardEvent as E;

	let t = match (step, event) {
		(S::WizardActive, _) => return None,
		(S::BasicInfo, E::BasicInfoCompleted) => Transition::to(Target::Step(S::Characteristics))
			.guarded(guard::basic_info_valid)
			.run(Action::MergeBasicInfo),
		(S::Characteristics, E::CharacteristicsCompleted) => {
			Transition::to(Target::Step(S::DefectsStains))
				.guarded(guard::characteristics_valid)
				.run(Action::MergeCharacteristics)
		},
		(S::DefectsStains, E::DefectsCompleted) => Transition::to(Target::Step(S::Pricing))
			.guarded(guard::defects_valid)
			.run(Action::MergeDefects),
		(S::Pricing, E::RecalculatePrice) => {
			Transition::to(Target::Stay).run(Action::RecalculatePrice)
		},
		(S::Pricing, E::PricingCompleted) => Transition::to(Target::Step(S::Photos))
			.guarded(guard::modifiers_valid)
			.run(Action::MergeModifiers),
		(S::Photos, E::PhotosCompleted) => Transition::to(Target::Step(S::ItemComplete))
			.guarded(guard::photos_valid)
			.run(Action::MergePhotos),
		(S::Photos, E::SkipPhotos) => {
			Transition::to(Target::Step(S::ItemComplete)).run(Action::SkipPhotos)
		},
		(S::ItemComplete, E::ItemAdded) => {
			Transition::to(Target::State(WizardState::ItemManagement))
				.guarded(guard::draft_priced)
				.run(Action::CommitItem)
		},
		(_, E::CancelItemWizard) | (S::BasicInfo, E::GoBack) => {
			Transition::to(Target::State(WizardState::ItemManagement)).run(Action::DiscardDraft)
		},
		(_, E::GoBack) => Transition::to(Target::Step(previous(step)?)),
		_ => return None,
	};
	Some(t)
}
