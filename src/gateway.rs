//! Externally reachable HTTP surface.
//!
//! [`ProxyGateway`] accepts credential submissions, relays catalog resources with the bearer token
//! obtained from [`TokenGuard`], and optionally exposes the live token for diagnostics. Routing
//! lives in [`routes`]; the mapping from [`Error`] and [`UpstreamResponse`] to HTTP responses lives
//! in `response`.

pub mod routes;

mod response;

// crates.io
use axum::{
	body::Bytes,
	http::{HeaderValue, StatusCode},
};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::de::IgnoredAny;
use tokio::net::TcpListener;
// self
use crate::{
	_prelude::*,
	auth::Credentials,
	config::Config,
	error::{ConfigError, TransportError, UpstreamEndpoint},
	flows::TokenGuard,
	http::ReqwestHttpClient,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	provider::UpstreamDescriptor,
	store::CredentialEpoch,
};

/// Credential pair as submitted by the browser client.
///
/// Both fields are optional on the wire so that absent and empty values are rejected with the
/// same validation error.
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialSubmission {
	/// OAuth 2.0 client identifier.
	#[serde(default)]
	pub client_id: Option<String>,
	/// OAuth 2.0 client secret.
	#[serde(default)]
	pub client_secret: Option<String>,
}
impl Debug for CredentialSubmission {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialSubmission")
			.field("client_id", &self.client_id)
			.field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
			.finish()
	}
}

/// Upstream catalog response, relayed without interpretation.
#[derive(Clone, Debug)]
pub struct UpstreamResponse {
	/// Status returned by the upstream.
	pub status: StatusCode,
	/// Upstream `content-type`, if any.
	pub content_type: Option<HeaderValue>,
	/// Raw response body.
	pub body: Bytes,
}

/// Live token view returned by the diagnostic endpoint.
#[derive(Clone, Serialize)]
pub struct TokenIntrospection {
	/// Bearer token currently in use.
	pub access_token: String,
	/// Margin-adjusted expiry as Unix epoch milliseconds.
	pub expires_at: i64,
}
impl Debug for TokenIntrospection {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenIntrospection")
			.field("access_token", &"<redacted>")
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

/// Credential holder and resource relay shared by every HTTP handler.
#[derive(Clone, Debug)]
pub struct ProxyGateway {
	/// Token lifecycle shared by all requests.
	pub guard: Arc<TokenGuard>,
	/// Outbound transport for resource requests.
	pub http_client: ReqwestHttpClient,
	/// Upstream endpoints and region defaults.
	pub descriptor: UpstreamDescriptor,
	/// Whether `GET /token` is routed.
	pub expose_token_endpoint: bool,
}
impl ProxyGateway {
	/// Creates a gateway with the token-introspection endpoint disabled.
	pub fn new(
		guard: Arc<TokenGuard>,
		http_client: ReqwestHttpClient,
		descriptor: UpstreamDescriptor,
	) -> Self {
		Self { guard, http_client, descriptor, expose_token_endpoint: false }
	}

	/// Builds the token lifecycle and transport described by `config`.
	pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
		let descriptor = config.descriptor()?;
		let http_client = config.http_client()?;
		let guard = TokenGuard::for_descriptor(&descriptor, http_client.clone())
			.with_safety_margin(config.safety_margin());

		Ok(Self::new(Arc::new(guard), http_client, descriptor)
			.with_token_endpoint(config.expose_token_endpoint))
	}

	/// Enables or disables `GET /token`.
	pub fn with_token_endpoint(mut self, expose: bool) -> Self {
		self.expose_token_endpoint = expose;

		self
	}

	/// Validates and stores a credential pair, discarding any cached token.
	pub fn submit_credentials(&self, submission: CredentialSubmission) -> Result<CredentialEpoch> {
		let credentials = Credentials::from_parts(submission.client_id, submission.client_secret)?;

		Ok(self.guard.set_credentials(credentials))
	}

	/// Fetches `resource_id` from the catalog with a valid bearer token.
	///
	/// `region` falls back to the descriptor's default when absent or empty. Any upstream status
	/// is returned as-is with the original bytes, provided the body is JSON. A non-JSON body, or a
	/// failure to obtain a token or to complete the request, is an error.
	pub async fn fetch_resource(
		&self,
		resource_id: &str,
		region: Option<&str>,
	) -> Result<UpstreamResponse> {
		const KIND: FlowKind = FlowKind::ResourceProxy;
		const ENDPOINT: UpstreamEndpoint = UpstreamEndpoint::Resource;

		let span = FlowSpan::new(KIND, "fetch_resource");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let token = self.guard.access_token().await?;
				let url =
					self.descriptor.resource_url(resource_id, region).map_err(ConfigError::from)?;
				let response = self
					.http_client
					.get(url)
					.bearer_auth(token.access_token.expose())
					.header(ACCEPT, "application/json")
					.send()
					.await
					.map_err(|e| TransportError::from_reqwest(ENDPOINT, e))?;
				let status = response.status();
				let content_type = response.headers().get(CONTENT_TYPE).cloned();
				let body =
					response.bytes().await.map_err(|e| TransportError::from_reqwest(ENDPOINT, e))?;

				serde_json::from_slice::<IgnoredAny>(&body)
					.map_err(|e| TransportError::malformed(ENDPOINT, status.as_u16(), e))?;

				tracing::debug!(resource_id, %status, bytes = body.len(), "relaying upstream response");

				Ok(UpstreamResponse { status, content_type, body })
			})
			.await;

		obs::record_flow_result(KIND, &result);

		result
	}

	/// Returns the token currently in use, acquiring one if needed.
	pub async fn introspect_token(&self) -> Result<TokenIntrospection> {
		let token = self.guard.access_token().await?;

		Ok(TokenIntrospection {
			access_token: token.access_token.expose().to_owned(),
			expires_at: token.expires_at_millis(),
		})
	}

	/// Serves the router on `listener` until Ctrl-C is received.
	pub async fn serve(self, listener: TcpListener) -> std::io::Result<()> {
		if let Ok(addr) = listener.local_addr() {
			tracing::info!(%addr, version = env!("CARGO_PKG_VERSION"), "kkbox proxy listening");
		}
		if self.expose_token_endpoint {
			tracing::warn!("GET /token is enabled and returns the live bearer token to any caller");
		}

		axum::serve(listener, self.router()).with_graceful_shutdown(shutdown_signal()).await
	}
}

async fn shutdown_signal() {
	match tokio::signal::ctrl_c().await {
		Ok(()) => tracing::info!("shutdown signal received"),
		Err(e) => {
			tracing::error!(error = %e, "failed to install the Ctrl-C handler");

			std::future::pending::<()>().await;
		},
	}
}
