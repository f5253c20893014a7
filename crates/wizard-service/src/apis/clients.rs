//! Client search and registration for the client selection screen.

use crate::server::AppState;
use serde::Deserialize;
use wizard_clients::ClientError;
use wizard_types::{APIError, Client, NewClient};

const DEFAULT_LIMIT: usize = 20;
const MAX_LIMIT: usize = 100;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ClientSearchQuery {
	pub query: String,
	pub limit: Option<usize>,
}

pub async fn search_clients(
	state: &AppState,
	query: ClientSearchQuery,
) -> Result<Vec<Client>, APIError> {
	let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
	state
		.engine
		.search_clients(query.query.trim(), limit)
		.await
		.map_err(|e| APIError::InternalServerError {
			error_type: "CLIENT_LOOKUP_FAILED".to_string(),
			message: e.to_string(),
		})
}
