//! Wizard endpoints: create, submit an event, read a snapshot.

use crate::server::AppState;
use serde_json::json;
use std::str::FromStr;
use wizard_core::WizardError;
use wizard_types::{APIError, SubmitEventRequest, SubmitResponse, WizardEvent, WizardSnapshot};

/// Maps an engine error to its API error.
pub fn api_error(err: WizardError, busy_retry_after: u64) -> APIError {
	match err {
		WizardError::InvalidTransition { ref state, event } => APIError::Conflict {
			error_type: "INVALID_TRANSITION".to_string(),
			message: err.to_string(),
			details: Some(json!({ "state": state, "event": event })),
		},
		WizardError::ConcurrencyConflict(_) => APIError::ServiceUnavailable {
			error_type: "WIZARD_BUSY".to_string(),
			message: err.to_string(),
			retry_after: Some(busy_retry_after),
		},
		WizardError::NotFound(_) => APIError::NotFound {
			error_type: "WIZARD_NOT_FOUND".to_string(),
			message: err.to_string(),
		},
		WizardError::Persistence(_) => APIError::InternalServerError {
			error_type: "PERSISTENCE_FAILURE".to_string(),
			message: err.to_string(),
		},
	}
}

pub async fn create_wizard(state: &AppState) -> Result<WizardSnapshot, APIError> {
	state
		.engine
		.create()
		.await
		.map_err(|e| api_error(e, state.busy_retry_after))
}

pub async fn submit_event(
	state: &AppState,
	id: &str,
	request: SubmitEventRequest,
) -> Result<SubmitResponse, APIError> {
	let event = WizardEvent::from_str(&request.event).map_err(|e| APIError::BadRequest {
		error_type: "UNKNOWN_EVENT".to_string(),
		message: e.to_string(),
		details: None,
	})?;

	state
		.engine
		.submit(id, event, request.payload)
		.await
		.map_err(|e| api_error(e, state.busy_retry_after))
}

pub async fn get_wizard(state: &AppState, id: &str) -> Result<WizardSnapshot, APIError> {
	state
		.engine
		.snapshot(id)
		.await
		.map_err(|e| api_error(e, state.busy_retry_after))
}
