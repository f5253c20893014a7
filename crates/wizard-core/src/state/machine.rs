//! Main wizard table.

use super::{Target, Transition};
use crate::actions::Action;
use crate::guards::order as guard;
use wizard_types::{ItemStep, WizardEvent, WizardState};

/// The stage before `state` for `GO_BACK`.
fn previous(state: WizardState) -> Option<WizardState> {
	use WizardState::*;

	Some(match state {
		ClientSelection => Initial,
		OrderInitialization => ClientSelection,
		ItemManagement => OrderInitialization,
		ExecutionParams => ItemManagement,
		GlobalDiscounts => ExecutionParams,
		PaymentProcessing => GlobalDiscounts,
		AdditionalInfo => PaymentProcessing,
		OrderConfirmation => AdditionalInfo,
		OrderReview => OrderConfirmation,
		LegalAspects => OrderReview,
		ReceiptGeneration => LegalAspects,
		Initial | Completed | Cancelled => return None,
	})
}

pub fn transition(state: WizardState, event: WizardEvent) -> Option<Transition> {
	use WizardEvent as E;
	use WizardState as S;

	let t = match (state, event) {
		(S::Initial, E::StartOrder) => {
			Transition::to(Target::State(S::ClientSelection)).run(Action::SeedContext)
		},
		(S::ClientSelection, E::ClientSelected) => {
			Transition::to(Target::State(S::OrderInitialization))
				.guarded(guard::client_selected)
				.run(Action::SelectClient)
		},
		(S::OrderInitialization, E::OrderInfoCompleted) => {
			Transition::to(Target::State(S::ItemManagement))
				.guarded(guard::order_info_valid)
				.run(Action::StoreOrderInfo)
		},
		(S::ItemManagement, E::AddItem | E::StartItemWizard) => {
			Transition::to(Target::Step(ItemStep::BasicInfo))
				.guarded(guard::item_slot_available)
				.run(Action::StartItemWizard)
		},
		(S::ItemManagement, E::EditItem) => Transition::to(Target::Step(ItemStep::BasicInfo))
			.guarded(guard::item_exists)
			.run(Action::EditItem),
		(S::ItemManagement, E::DeleteItem) => Transition::to(Target::Stay)
			.guarded(guard::item_exists)
			.run(Action::DeleteItem),
		(S::ItemManagement, E::ItemsCompleted) => {
			Transition::to(Target::State(S::ExecutionParams))
				.guarded(guard::has_items)
				.run(Action::RecomputeTotals)
		},
		(S::ExecutionParams, E::ExecutionParamsSet) => {
			Transition::to(Target::State(S::GlobalDiscounts)).run(Action::StoreExecutionParams)
		},
		(S::GlobalDiscounts, E::DiscountsApplied) => {
			Transition::to(Target::State(S::PaymentProcessing)).run(Action::ApplyDiscount)
		},
		(S::PaymentProcessing, E::PaymentProcessed) => {
			Transition::to(Target::State(S::AdditionalInfo)).run(Action::ProcessPayment)
		},
		(S::AdditionalInfo, E::AdditionalInfoCompleted) => {
			Transition::to(Target::State(S::OrderConfirmation)).run(Action::StoreAdditionalInfo)
		},
		(S::OrderConfirmation, E::ReviewOrder) => {
			Transition::to(Target::State(S::OrderReview)).run(Action::SnapshotSummary)
		},
		(S::OrderReview, E::OrderApproved) => Transition::to(Target::State(S::LegalAspects)),
		(S::LegalAspects, E::TermsAccepted) => {
			Transition::to(Target::State(S::ReceiptGeneration))
				.guarded(guard::terms_signed)
				.run(Action::CaptureSignature)
		},
		(S::ReceiptGeneration, E::GenerateReceipt) => {
			Transition::to(Target::Stay).run(Action::GenerateReceipt)
		},
		(S::ReceiptGeneration, E::ReceiptGenerated) => {
			Transition::to(Target::State(S::Completed))
				.guarded(guard::receipt_generated)
				.run(Action::FinalizeOrder)
		},
		(_, E::GoBack) => Transition::to(Target::State(previous(state)?)),
		(S::Initial | S::Completed | S::Cancelled, E::CancelOrder) => return None,
		(_, E::CancelOrder) => {
			Transition::to(Target::State(S::Cancelled)).run(Action::CancelOrder)
		},
		_ => return None,
	};
	Some(t)
}
