//! HTTP API request/response types and the API error model.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Body of `POST /api/wizards/{id}/events`.
///
/// The event is kept as a string so an unknown name can be reported as a
/// bad request rather than a body deserialization failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitEventRequest {
	pub event: String,
	#[serde(default)]
	pub payload: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
	pub status: String,
}

/// API error body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
	/// Error code, e.g. `INVALID_TRANSITION`.
	pub error: String,
	pub message: String,
	pub details: Option<serde_json::Value>,
	/// Suggested retry delay in seconds
	#[serde(rename = "retryAfter")]
	pub retry_after: Option<u64>,
}

/// API error with its HTTP status mapping.
#[derive(Debug)]
pub enum APIError {
	/// 400
	BadRequest {
		error_type: String,
		message: String,
		details: Option<serde_json::Value>,
	},
	/// 404
	NotFound { error_type: String, message: String },
	/// 409
	Conflict {
		error_type: String,
		message: String,
		details: Option<serde_json::Value>,
	},
	/// 503, retryable
	ServiceUnavailable {
		error_type: String,
		message: String,
		retry_after: Option<u64>,
	},
	/// 500
	InternalServerError { error_type: String, message: String },
}

impl APIError {
	pub fn status_code(&self) -> u16 {
		match self {
			APIError::BadRequest { .. } => 400,
			APIError::NotFound { .. } => 404,
			APIError::Conflict { .. } => 409,
			APIError::ServiceUnavailable { .. } => 503,
			APIError::InternalServerError { .. } => 500,
		}
	}

	pub fn to_error_response(&self) -> ErrorResponse {
		let (error, message, details, retry_after) = match self {
			APIError::BadRequest {
				error_type,
				message,
				details,
			}
			| APIError::Conflict {
				error_type,
				message,
				details,
			} => (error_type, message, details.clone(), None),
			APIError::NotFound {
				error_type,
				message,
			}
			| APIError::InternalServerError {
				error_type,
				message,
			} => (error_type, message, None, None),
			APIError::ServiceUnavailable {
				error_type,
				message,
				retry_after,
			} => (error_type, message, None, *retry_after),
		};
		ErrorResponse {
			error: error.clone(),
			message: message.clone(),
			details,
			retry_after,
		}
	}
}

impl fmt::Display for APIError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			APIError::BadRequest { message, .. } => write!(f, "Bad Request: {}", message),
			APIError::NotFound { message, .. } => write!(f, "Not Found: {}", message),
			APIError::Conflict { message, .. } => write!(f, "Conflict: {}", message),
			APIError::ServiceUnavailable { message, .. } => {
				write!(f, "Service Unavailable: {}", message)
			},
			APIError::InternalServerError { message, .. } => {
				write!(f, "Internal Server Error: {}", message)
			},
		}
	}
}

impl std::error::Error for APIError {}

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for APIError {
	fn into_response(self) -> axum::response::Response {
		use axum::{http::StatusCode, response::Json};

		let status = StatusCode::from_u16(self.status_code())
			.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
		(status, Json(self.to_error_response())).into_response()
	}
}
