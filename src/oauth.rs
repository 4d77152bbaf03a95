//! OAuth 2.0 client-credentials exchange against the upstream token endpoint.
//!
//! [`TokenAcquirer`] is the seam between the token lifecycle and the network: the guard only
//! ever asks it for a fresh [`TokenGrant`], and [`ClientCredentialsAcquirer`] is the reqwest
//! implementation used in production. Failures are never retried here; a non-success status is
//! surfaced as [`Error::UpstreamAuth`] carrying the upstream status and body verbatim.

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
use reqwest::header::{ACCEPT, AUTHORIZATION};
// self
use crate::{
	_prelude::*,
	auth::{Credentials, TokenSecret},
	error::{TransportError, UpstreamEndpoint},
	http::ReqwestHttpClient,
	provider::UpstreamDescriptor,
};

/// Boxed future returned by [`TokenAcquirer::acquire`].
pub type AcquireFuture<'a> = Pin<Box<dyn Future<Output = Result<TokenGrant>> + 'a + Send>>;

/// Performs one credential exchange per call.
pub trait TokenAcquirer
where
	Self: Send + Sync,
{
	/// Exchanges `credentials` for a fresh bearer token.
	fn acquire<'a>(&'a self, credentials: &'a Credentials) -> AcquireFuture<'a>;
}

/// Token issued by the upstream, before the caller turns it into a cache entry.
#[derive(Clone)]
pub struct TokenGrant {
	/// Bearer token value.
	pub access_token: TokenSecret,
	/// Lifetime reported by the upstream.
	pub expires_in: Duration,
	/// Token type reported by the upstream, usually `Bearer`.
	pub token_type: Option<String>,
}
impl Debug for TokenGrant {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenGrant")
			.field("access_token", &"<redacted>")
			.field("expires_in", &self.expires_in)
			.field("token_type", &self.token_type)
			.finish()
	}
}

/// Semantic problems in an otherwise well-formed token response.
#[derive(Debug, ThisError)]
pub enum TokenResponseError {
	/// The upstream issued an empty bearer token.
	#[error("Token endpoint returned an empty access_token.")]
	EmptyAccessToken,
}

#[derive(Deserialize)]
struct TokenResponse {
	access_token: String,
	expires_in: i64,
	#[serde(default)]
	token_type: Option<String>,
}

/// Client-credentials acquirer backed by reqwest.
///
/// Sends `POST <token endpoint>` with `Authorization: Basic base64(client_id:client_secret)` and
/// a form body of `grant_type=client_credentials`.
#[derive(Clone, Debug)]
pub struct ClientCredentialsAcquirer {
	http_client: ReqwestHttpClient,
	token_endpoint: Url,
}
impl ClientCredentialsAcquirer {
	/// Creates an acquirer that posts to `token_endpoint`.
	pub fn new(http_client: ReqwestHttpClient, token_endpoint: Url) -> Self {
		Self { http_client, token_endpoint }
	}

	/// Creates an acquirer targeting the descriptor's token endpoint.
	pub fn from_descriptor(descriptor: &UpstreamDescriptor, http_client: ReqwestHttpClient) -> Self {
		Self::new(http_client, descriptor.endpoints.token.clone())
	}

	async fn exchange(&self, credentials: &Credentials) -> Result<TokenGrant> {
		const ENDPOINT: UpstreamEndpoint = UpstreamEndpoint::Token;

		tracing::debug!(
			endpoint = %self.token_endpoint,
			client_id = credentials.client_id(),
			"requesting client-credentials token"
		);

		let response = self
			.http_client
			.post(self.token_endpoint.clone())
			.header(AUTHORIZATION, basic_authorization(credentials))
			.header(ACCEPT, "application/json")
			.form(&[("grant_type", "client_credentials")])
			.send()
			.await
			.map_err(|e| TransportError::from_reqwest(ENDPOINT, e))?;
		let status = response.status();
		let body = response.bytes().await.map_err(|e| TransportError::from_reqwest(ENDPOINT, e))?;

		if !status.is_success() {
			return Err(Error::UpstreamAuth {
				status: status.as_u16(),
				body: String::from_utf8_lossy(&body).into_owned(),
			});
		}

		parse_token_response(status.as_u16(), &body)
	}
}
impl TokenAcquirer for ClientCredentialsAcquirer {
	fn acquire<'a>(&'a self, credentials: &'a Credentials) -> AcquireFuture<'a> {
		Box::pin(self.exchange(credentials))
	}
}

/// Renders the HTTP Basic authorization value for `credentials`.
///
/// The pair is encoded exactly as `client_id:client_secret`, without form-encoding either half.
pub fn basic_authorization(credentials: &Credentials) -> String {
	let pair = format!("{}:{}", credentials.client_id(), credentials.client_secret().expose());

	format!("Basic {}", STANDARD.encode(pair))
}

fn parse_token_response(status: u16, body: &[u8]) -> Result<TokenGrant> {
	const ENDPOINT: UpstreamEndpoint = UpstreamEndpoint::Token;

	let mut deserializer = serde_json::Deserializer::from_slice(body);
	let response: TokenResponse = serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|e| TransportError::malformed(ENDPOINT, status, e))?;

	if response.access_token.is_empty() {
		return Err(
			TransportError::malformed(ENDPOINT, status, TokenResponseError::EmptyAccessToken).into()
		);
	}

	Ok(TokenGrant {
		access_token: TokenSecret::new(response.access_token),
		expires_in: Duration::seconds(response.expires_in),
		token_type: response.token_type,
	})
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn basic_authorization_encodes_raw_pair() {
		let credentials =
			Credentials::new("abc", "xyz").expect("Credential fixture should be valid.");

		assert_eq!(basic_authorization(&credentials), "Basic YWJjOnh5eg==");
	}

	#[test]
	fn parses_standard_token_response() {
		let grant = parse_token_response(
			200,
			br#"{"access_token":"kk-token","token_type":"Bearer","expires_in":2592000}"#,
		)
		.expect("Well-formed token responses should parse.");

		assert_eq!(grant.access_token.expose(), "kk-token");
		assert_eq!(grant.expires_in, Duration::days(30));
		assert_eq!(grant.token_type.as_deref(), Some("Bearer"));
	}

	#[test]
	fn missing_expires_in_is_malformed() {
		let err = parse_token_response(200, br#"{"access_token":"kk-token"}"#)
			.expect_err("Responses without expires_in should be rejected.");

		assert!(matches!(
			err,
			Error::UpstreamRequest(TransportError::MalformedResponse {
				endpoint: UpstreamEndpoint::Token,
				status: 200,
				..
			})
		));
		assert!(!err.is_credential_state());
	}

	#[test]
	fn empty_access_token_is_malformed() {
		let err = parse_token_response(200, br#"{"access_token":"","expires_in":60}"#)
			.expect_err("Empty access tokens should be rejected.");

		assert!(matches!(err, Error::UpstreamRequest(TransportError::MalformedResponse { .. })));
	}
}
