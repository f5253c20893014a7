//! HTTP server for the order wizard API.

use axum::{
	extract::{DefaultBodyLimit, Path, Query, State},
	http::StatusCode,
	response::Json,
	routing::{get, post},
	Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use wizard_config::ApiConfig;
use wizard_core::WizardEngine;
use wizard_types::{
	APIError, Client, HealthResponse, NewClient, SubmitEventRequest, SubmitResponse,
	WizardSnapshot,
};

use crate::apis::clients::ClientSearchQuery;

/// Shared application state for the API server.
#[derive(Clone)]
pub struct AppState {
	pub engine: Arc<WizardEngine>,
	/// Seconds a client is told to wait after `WIZARD_BUSY`.
	pub busy_retry_after: u64,
}

/// Builds the `/api` router over the given state.
pub fn router(state: AppState, max_request_size: usize) -> Router {
	Router::new()
		.nest(
			"/api",
			Router::new()
				.route("/health", get(handle_health))
				.route("/clients", get(handle_search_clients).post(handle_create_client))
				.route("/wizards", post(handle_create_wizard))
				.route("/wizards/{id}", get(handle_get_wizard))
				.route("/wizards/{id}/events", post(handle_submit_event)),
		)
		.layer(
			ServiceBuilder::new()
				.layer(TraceLayer::new_for_http())
				.layer(CorsLayer::permissive())
				.layer(DefaultBodyLimit::max(max_request_size)),
		)
		.with_state(state)
}

pub async fn start_server(
	api_config: ApiConfig,
	engine: Arc<WizardEngine>,
) -> Result<(), Box<dyn std::error::Error>> {
	let state = AppState {
		engine,
		busy_retry_after: api_config.busy_retry_after_seconds,
	};
	let app = router(state, api_config.max_request_size);

	let bind_address = format!("{}:{}", api_config.host, api_config.port);
	let listener = TcpListener::bind(&bind_address).await?;

	tracing::info!("Order wizard API server starting on {}", bind_address);

	axum::serve(listener, app).await?;

	Ok(())
}

async fn handle_health() -> Json<HealthResponse> {
	Json(HealthResponse {
		status: "ok".to_string(),
	})
}

/// Handles POST /api/wizards.
async fn handle_create_wizard(
	State(state): State<AppState>,
) -> Result<(StatusCode, Json<WizardSnapshot>), APIError> {
	crate::apis::wizard::create_wizard(&state)
		.await
		.map(|snapshot| (StatusCode::CREATED, Json(snapshot)))
}

/// Handles POST /api/wizards/{id}/events.
///
/// Guard rejections and action failures are part of a 200 response; only
/// errors that left the wizard untouched map to error statuses.
async fn handle_submit_event(
	Path(id): Path<String>,
	State(state): State<AppState>,
	Json(request): Json<SubmitEventRequest>,
) -> Result<Json<SubmitResponse>, APIError> {
	match crate::apis::wizard::submit_event(&state, &id, request).await {
		Ok(response) => Ok(Json(response)),
		Err(e) => {
			tracing::warn!(wizard_id = %id, "Event submission failed: {}", e);
			Err(e)
		},
	}
}

/// Handles GET /api/wizards/{id}.
async fn handle_get_wizard(
	Path(id): Path<String>,
	State(state): State<AppState>,
) -> Result<Json<WizardSnapshot>, APIError> {
	crate::apis::wizard::get_wizard(&state, &id).await.map(Json)
}

/// Handles GET /api/clients?query=...
async fn handle_search_clients(
	State(state): State<AppState>,
	Query(query): Query<ClientSearchQuery>,
) -> Result<Json<Vec<Client>>, APIError> {
	crate::apis::clients::search_clients(&state, query).await.map(Json)
}

/// Handles POST /api/clients.
async fn handle_create_client(
	State(state): State<AppState>,
	Json(client): Json<NewClient>,
) -> Result<(StatusCode, Json<Client>), APIError> {
	crate::apis::clients::create_client(&state, client)
		.await
		.map(|client| (StatusCode::CREATED, Json(client)))
}
