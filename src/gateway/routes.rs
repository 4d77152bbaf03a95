//! Route table and request handlers.
//!
//! Every route has a legacy alias kept for existing browser clients, so both `POST /credentials`
//! and `POST /api/save-kkbox-keys` reach the same handler.

// crates.io
use axum::{
	Json, Router,
	extract::{
		Path, Query, State,
		rejection::{JsonRejection, PathRejection, QueryRejection},
	},
	routing::{get, post},
};
use serde_json::{Value, json};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
// self
use crate::{
	_prelude::*,
	error::ValidationError,
	gateway::{CredentialSubmission, ProxyGateway, TokenIntrospection, UpstreamResponse},
};

/// Credential submission route.
pub const CREDENTIALS_PATH: &str = "/credentials";
/// Legacy alias for [`CREDENTIALS_PATH`].
pub const LEGACY_CREDENTIALS_PATH: &str = "/api/save-kkbox-keys";
/// Resource relay route.
pub const RESOURCE_PATH: &str = "/resource/{id}";
/// Legacy alias for [`RESOURCE_PATH`].
pub const LEGACY_RESOURCE_PATH: &str = "/kkbox/playlist/{id}";
/// Token introspection route, only routed when enabled.
pub const TOKEN_PATH: &str = "/token";
/// Legacy alias for [`TOKEN_PATH`].
pub const LEGACY_TOKEN_PATH: &str = "/api/token";
/// Liveness route.
pub const HEALTH_PATH: &str = "/health";

type GatewayState = State<Arc<ProxyGateway>>;

/// Region selector accepted on resource routes.
///
/// `region` takes precedence over `territory`; empty values count as absent.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RegionQuery {
	/// Preferred parameter name.
	#[serde(default)]
	pub region: Option<String>,
	/// Parameter name used by the upstream and the legacy route.
	#[serde(default)]
	pub territory: Option<String>,
}
impl RegionQuery {
	/// Returns the first non-empty region code, if any.
	pub fn region(&self) -> Option<&str> {
		[&self.region, &self.territory]
			.into_iter()
			.flatten()
			.map(String::as_str)
			.find(|value| !value.is_empty())
	}
}

impl ProxyGateway {
	/// Builds the axum router with permissive CORS and request tracing.
	pub fn router(self) -> Router {
		let mut router = Router::new()
			.route(HEALTH_PATH, get(health))
			.route(CREDENTIALS_PATH, post(submit_credentials))
			.route(LEGACY_CREDENTIALS_PATH, post(submit_credentials))
			.route(RESOURCE_PATH, get(fetch_resource))
			.route(LEGACY_RESOURCE_PATH, get(fetch_resource));

		if self.expose_token_endpoint {
			router = router
				.route(TOKEN_PATH, get(introspect_token))
				.route(LEGACY_TOKEN_PATH, get(introspect_token));
		}

		router
			.layer(TraceLayer::new_for_http())
			.layer(CorsLayer::permissive())
			.with_state(Arc::new(self))
	}
}

async fn health() -> Json<Value> {
	Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}

async fn submit_credentials(
	State(gateway): GatewayState,
	payload: Result<Json<CredentialSubmission>, JsonRejection>,
) -> Result<Json<Value>> {
	let Json(submission) =
		payload.map_err(|e| ValidationError::MalformedBody { message: e.body_text() })?;

	gateway.submit_credentials(submission)?;

	Ok(Json(json!({ "ok": true })))
}

async fn fetch_resource(
	State(gateway): GatewayState,
	id: Result<Path<String>, PathRejection>,
	query: Result<Query<RegionQuery>, QueryRejection>,
) -> Result<UpstreamResponse> {
	let Path(id) = id.map_err(|e| ValidationError::InvalidParameters { message: e.body_text() })?;
	let Query(query) =
		query.map_err(|e| ValidationError::InvalidParameters { message: e.body_text() })?;

	gateway.fetch_resource(&id, query.region()).await
}

async fn introspect_token(State(gateway): GatewayState) -> Result<Json<TokenIntrospection>> {
	Ok(Json(gateway.introspect_token().await?))
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn region_wins_over_territory() {
		let query = RegionQuery { region: Some("JP".into()), territory: Some("HK".into()) };

		assert_eq!(query.region(), Some("JP"));
	}

	#[test]
	fn empty_values_fall_through() {
		let query = RegionQuery { region: Some(String::new()), territory: Some("SG".into()) };
		let empty = RegionQuery { region: None, territory: Some(String::new()) };

		assert_eq!(query.region(), Some("SG"));
		assert_eq!(empty.region(), None);
		assert_eq!(RegionQuery::default().region(), None);
	}
}
