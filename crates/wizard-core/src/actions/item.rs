//! Actions of the item sub-wizard.

use super::{decode, non_blank, ActionError, ActionExecutor};
use serde_json::Value;
use wizard_types::{
	new_id, BasicInfoPatch, CharacteristicsPatch, DefectsPatch, DraftItem, ItemReference,
	ItemStep, ItemWizardMode, ItemWizardSession, PhotosPatch, PricingPatch, WizardContext,
};

fn session(ctx: &mut WizardContext) -> Result<&mut ItemWizardSession, ActionError> {
	ctx.item_wizard
		.as_mut()
		.ok_or(ActionError::MissingContext("draft_item"))
}

fn draft(ctx: &mut WizardContext) -> Result<&mut DraftItem, ActionError> {
	Ok(&mut session(ctx)?.draft)
}

/// Enters the region at its pseudo-entry with an empty draft.
pub(super) fn start_item_wizard(ctx: &mut WizardContext) -> Result<(), ActionError> {
	ctx.item_wizard = Some(ItemWizardSession {
		step: ItemStep::WizardActive,
		mode: ItemWizardMode::Add,
		draft: DraftItem::default(),
	});
	Ok(())
}

pub(super) fn edit_item(ctx: &mut WizardContext, payload: &Value) -> Result<(), ActionError> {
	let reference: ItemReference = decode(payload)?;
	let item_id = non_blank(reference.item_id).ok_or(ActionError::MissingContext("item_id"))?;
	let draft = ctx
		.find_item(&item_id)
		.map(DraftItem::from_order_item)
		.ok_or_else(|| ActionError::Validation(format!("Item not found: {}", item_id)))?;
	ctx.item_wizard = Some(ItemWizardSession {
		step: ItemStep::WizardActive,
		mode: ItemWizardMode::Edit { item_id },
		draft,
	});
	Ok(())
}

pub(super) fn discard_draft(ctx: &mut WizardContext) -> Result<(), ActionError> {
	ctx.item_wizard = None;
	Ok(())
}

pub(super) fn merge_basic_info(ctx: &mut WizardContext, payload: &Value) -> Result<(), ActionError> {
	let mut patch: BasicInfoPatch = decode(payload)?;
	patch.item_name = patch.item_name.map(|name| name.trim().to_string());
	draft(ctx)?.apply_basic(patch);
	Ok(())
}

pub(super) fn merge_characteristics(
	ctx: &mut WizardContext,
	payload: &Value,
) -> Result<(), ActionError> {
	let patch: CharacteristicsPatch = decode(payload)?;
	draft(ctx)?.apply_characteristics(patch);
	Ok(())
}

pub(super) fn merge_defects(ctx: &mut WizardContext, payload: &Value) -> Result<(), ActionError> {
	let patch: DefectsPatch = decode(payload)?;
	draft(ctx)?.apply_defects(patch);
	Ok(())
}

pub(super) fn merge_photos(ctx: &mut WizardContext, payload: &Value) -> Result<(), ActionError> {
	let patch: PhotosPatch = decode(payload)?;
	draft(ctx)?.apply_photos(patch);
	Ok(())
}

pub(super) fn skip_photos(ctx: &mut WizardContext) -> Result<(), ActionError> {
	draft(ctx)?.photos_skipped = true;
	Ok(())
}

impl ActionExecutor {
	/// Prices the draft as it stands. Same draft, same pricing.
	pub(super) async fn price_draft(&self, ctx: &mut WizardContext) -> Result<(), ActionError> {
		let draft = draft(ctx)?;
		let pricing = self
			.call("pricing", self.pricing.price_item(draft))
			.await?;
		draft.pricing = Some(pricing);
		Ok(())
	}

	pub(super) async fn merge_modifiers(
		&self,
		ctx: &mut WizardContext,
		payload: &Value,
	) -> Result<(), ActionError> {
		let patch: PricingPatch = decode(payload)?;
		draft(ctx)?.apply_pricing(patch);
		self.price_draft(ctx).await
	}

	/// Appends a new item or replaces the edited one, then leaves the region.
	pub(super) async fn commit_item(&self, ctx: &mut WizardContext) -> Result<(), ActionError> {
		let session = ctx
			.item_wizard
			.take()
			.ok_or(ActionError::MissingContext("draft_item"))?;
		let item = session
			.draft
			.into_order_item(new_id())
			.map_err(ActionError::Validation)?;

		match session.mode {
			ItemWizardMode::Add => ctx.committed_items.push(item),
			ItemWizardMode::Edit { item_id } => {
				let slot = ctx
					.committed_items
					.iter_mut()
					.find(|committed| committed.id == item_id)
					.ok_or_else(|| ActionError::Validation(format!("Item not found: {}", item_id)))?;
				*slot = item;
			},
		}
		self.recompute_totals(ctx).await
	}
}
