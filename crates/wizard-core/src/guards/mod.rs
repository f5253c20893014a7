//! Guard evaluator.
//!
//! Guards are plain functions consulted before a transition fires. They read
//! the context and the event payload and never mutate anything. A business
//! condition that does not hold is a rejection (`GuardResult::reject`); an
//! `Err` is reserved for states the machine should never reach, such as a
//! sub-wizard guard running without a draft.

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use wizard_types::{decode_payload, DraftItem, WizardContext, WizardEvent, WizardState};

pub mod item;
pub mod order;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GuardError {
	#[error("Required context missing: {0}")]
	MissingContext(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardResult {
	pub allowed: bool,
	pub reason: Option<String>,
}

impl GuardResult {
	pub fn allow() -> Self {
		Self {
			allowed: true,
			reason: None,
		}
	}

	pub fn reject(reason: impl Into<String>) -> Self {
		Self {
			allowed: false,
			reason: Some(reason.into()),
		}
	}
}

/// Limits taken from the `[wizard]` configuration section.
#[derive(Debug, Clone, Copy)]
pub struct GuardLimits {
	pub max_items_per_order: usize,
}

impl Default for GuardLimits {
	fn default() -> Self {
		Self {
			max_items_per_order: 50,
		}
	}
}

pub struct GuardInput<'a> {
	pub state: WizardState,
	pub event: WizardEvent,
	pub context: &'a WizardContext,
	pub payload: &'a Value,
	pub limits: &'a GuardLimits,
}

impl GuardInput<'_> {
	/// Decodes the payload; a malformed payload becomes a rejection.
	fn payload<T: DeserializeOwned + Default>(&self) -> Result<T, GuardResult> {
		decode_payload(self.payload).map_err(GuardResult::reject)
	}

	fn draft(&self) -> Result<&DraftItem, GuardError> {
		self.context
			.draft_item()
			.ok_or(GuardError::MissingContext("draft_item"))
	}
}

pub type GuardFn = fn(&GuardInput) -> Result<GuardResult, GuardError>;

/// Collapses a list of validation failures into one result.
fn verdict(problems: Vec<String>) -> GuardResult {
	if problems.is_empty() {
		GuardResult::allow()
	} else {
		GuardResult::reject(problems.join("; "))
	}
}

fn is_blank(value: Option<&str>) -> bool {
	value.map(str::trim).is_none_or(str::is_empty)
}
