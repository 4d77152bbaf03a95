//! Proxy-wide error types shared across the token lifecycle and the HTTP gateway.

// self
use crate::_prelude::*;

/// Proxy-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Clonable, type-erased error source.
///
/// A single failed acquisition is handed to every caller waiting on it, so sources that are not
/// `Clone` themselves (reqwest, serde) are shared behind an [`Arc`].
pub type SharedError = Arc<dyn StdError + Send + Sync>;

/// Canonical proxy error exposed by public APIs.
#[derive(Clone, Debug, ThisError)]
pub enum Error {
	/// Caller supplied malformed input.
	#[error(transparent)]
	Validation(#[from] ValidationError),
	/// No credentials have been submitted yet.
	#[error("No upstream credentials have been configured on this server.")]
	MissingCredentials,
	/// Upstream rejected the client-credentials exchange.
	#[error("Upstream rejected the configured credentials with HTTP {status}.")]
	UpstreamAuth {
		/// HTTP status code returned by the authorization endpoint.
		status: u16,
		/// Raw response body returned by the authorization endpoint.
		body: String,
	},
	/// Upstream could not be reached or answered with something unusable.
	#[error(transparent)]
	UpstreamRequest(#[from] TransportError),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
}
impl Error {
	/// Returns `true` when the failure stems from the credential configuration rather than from a
	/// malfunction.
	pub fn is_credential_state(&self) -> bool {
		matches!(self, Self::MissingCredentials | Self::UpstreamAuth { .. })
	}
}

/// Caller input failures.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ValidationError {
	/// A required field was absent or empty.
	#[error("The `{field}` field is required and cannot be empty.")]
	MissingField {
		/// Wire name of the missing field.
		field: &'static str,
	},
	/// The request body could not be decoded.
	#[error("Request body is not valid JSON: {message}.")]
	MalformedBody {
		/// Decoder message.
		message: String,
	},
	/// The request path or query string could not be decoded.
	#[error("Request parameters are invalid: {message}.")]
	InvalidParameters {
		/// Extractor message.
		message: String,
	},
}

/// Upstream endpoints the proxy talks to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UpstreamEndpoint {
	/// OAuth 2.0 token endpoint.
	Token,
	/// Catalog resource endpoint.
	Resource,
}
impl UpstreamEndpoint {
	/// Returns a stable label suitable for messages and log fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			UpstreamEndpoint::Token => "token",
			UpstreamEndpoint::Resource => "resource",
		}
	}
}
impl Display for UpstreamEndpoint {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Transport-level failures (timeouts, network, undecodable responses).
#[derive(Clone, Debug, ThisError)]
pub enum TransportError {
	/// The request did not complete within the configured bound.
	#[error("Request to the {endpoint} endpoint timed out.")]
	Timeout {
		/// Endpoint being called.
		endpoint: UpstreamEndpoint,
	},
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the {endpoint} endpoint.")]
	Network {
		/// Endpoint being called.
		endpoint: UpstreamEndpoint,
		/// Transport-specific network error.
		#[source]
		source: SharedError,
	},
	/// Upstream answered successfully but the payload could not be decoded.
	#[error("The {endpoint} endpoint returned a malformed response.")]
	MalformedResponse {
		/// Endpoint being called.
		endpoint: UpstreamEndpoint,
		/// HTTP status code of the response.
		status: u16,
		/// Structured decoding failure.
		#[source]
		source: SharedError,
	},
}
impl TransportError {
	/// Classifies a reqwest failure raised while calling `endpoint`.
	pub fn from_reqwest(endpoint: UpstreamEndpoint, e: ReqwestError) -> Self {
		if e.is_timeout() {
			Self::Timeout { endpoint }
		} else {
			Self::Network { endpoint, source: Arc::new(e) }
		}
	}

	/// Wraps a decoding failure for a response that carried `status`.
	pub fn malformed(
		endpoint: UpstreamEndpoint,
		status: u16,
		src: impl 'static + Send + Sync + StdError,
	) -> Self {
		Self::MalformedResponse { endpoint, status, source: Arc::new(src) }
	}

	/// Returns the endpoint that failed.
	pub fn endpoint(&self) -> UpstreamEndpoint {
		match self {
			Self::Timeout { endpoint }
			| Self::Network { endpoint, .. }
			| Self::MalformedResponse { endpoint, .. } => *endpoint,
		}
	}
}

/// Configuration and startup failures.
#[derive(Clone, Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying builder failure.
		#[source]
		source: SharedError,
	},
	/// Upstream descriptor failed validation.
	#[error(transparent)]
	Descriptor(#[from] crate::provider::DescriptorError),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::HttpClientBuild { source: Arc::new(src) }
	}
}
