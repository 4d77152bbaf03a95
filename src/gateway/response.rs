// crates.io
use axum::{
	Json,
	http::{StatusCode, header::CONTENT_TYPE},
	response::{IntoResponse, Response},
};
use serde_json::{Value, json};
// self
use crate::{_prelude::*, gateway::UpstreamResponse};

impl Error {
	/// HTTP status reported to the caller.
	///
	/// Credential-state failures are client errors; only transport and configuration failures
	/// are reported as server errors.
	pub fn status_code(&self) -> StatusCode {
		if matches!(self, Self::Validation(_)) || self.is_credential_state() {
			StatusCode::BAD_REQUEST
		} else {
			StatusCode::INTERNAL_SERVER_ERROR
		}
	}
}
impl IntoResponse for Error {
	fn into_response(self) -> Response {
		let status = self.status_code();
		let body = match &self {
			Self::Validation(_) | Self::MissingCredentials => json!({ "error": self.to_string() }),
			Self::UpstreamAuth { status: upstream_status, body } => json!({
				"error": self.to_string(),
				"upstream_status": upstream_status,
				"detail": upstream_detail(body),
			}),
			Self::UpstreamRequest(e) => json!({
				"error": format!("{} request failed", e.endpoint()),
				"detail": error_chain(e),
			}),
			Self::Config(e) => json!({ "error": "proxy misconfigured", "detail": error_chain(e) }),
		};

		if status.is_server_error() {
			tracing::error!(%status, error = %self, "request failed");
		} else {
			tracing::debug!(%status, error = %self, "request rejected");
		}

		(status, Json(body)).into_response()
	}
}

impl IntoResponse for UpstreamResponse {
	fn into_response(self) -> Response {
		let Self { status, content_type, body } = self;
		let mut response = (status, body).into_response();
		let headers = response.headers_mut();

		match content_type {
			Some(value) => {
				headers.insert(CONTENT_TYPE, value);
			},
			None => {
				headers.remove(CONTENT_TYPE);
			},
		}

		response
	}
}

fn upstream_detail(body: &str) -> Value {
	serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_owned()))
}

fn error_chain(e: &(dyn StdError + 'static)) -> String {
	let mut messages = vec![e.to_string()];
	let mut source = e.source();

	while let Some(cause) = source {
		messages.push(cause.to_string());
		source = cause.source();
	}

	messages.join(": ")
}
