//! Client credential pair submitted by the operator.

// self
use crate::{_prelude::*, auth::TokenSecret, error::ValidationError};

/// OAuth 2.0 client identifier + secret issued by the upstream provider.
///
/// Construction validates that both halves are present; a value of this type is therefore always
/// usable for a client-credentials exchange.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
	client_id: String,
	client_secret: TokenSecret,
}
impl Credentials {
	/// Validates and wraps a credential pair.
	pub fn new(
		client_id: impl Into<String>,
		client_secret: impl Into<String>,
	) -> Result<Self, ValidationError> {
		let client_id = client_id.into();
		let client_secret = TokenSecret::new(client_secret);

		if client_id.is_empty() {
			return Err(ValidationError::MissingField { field: "clientId" });
		}
		if client_secret.is_empty() {
			return Err(ValidationError::MissingField { field: "clientSecret" });
		}

		Ok(Self { client_id, client_secret })
	}

	/// Builds a pair from optional wire fields, treating absent and empty values alike.
	pub fn from_parts(
		client_id: Option<String>,
		client_secret: Option<String>,
	) -> Result<Self, ValidationError> {
		Self::new(client_id.unwrap_or_default(), client_secret.unwrap_or_default())
	}

	/// Returns the client identifier.
	pub fn client_id(&self) -> &str {
		&self.client_id
	}

	/// Returns the client secret.
	pub fn client_secret(&self) -> &TokenSecret {
		&self.client_secret
	}
}
impl Debug for Credentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credentials")
			.field("client_id", &self.client_id)
			.field("client_secret", &"<redacted>")
			.finish()
	}
}
