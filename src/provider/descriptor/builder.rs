// self
use crate::{
	_prelude::*,
	provider::{
		DEFAULT_REGION, KKBOX_REGION_PARAM, KKBOX_RESOURCE_ENDPOINT, KKBOX_TOKEN_ENDPOINT,
		UpstreamDescriptor, UpstreamEndpoints,
	},
};

/// Errors raised while constructing or validating descriptors.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum DescriptorError {
	/// An endpoint string could not be parsed.
	#[error("The {endpoint} endpoint is not a valid URL: {value}.")]
	InvalidUrl {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Rejected input.
		value: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Endpoints must be reached over HTTP(S).
	#[error("The {endpoint} endpoint must use http or https: {url}.")]
	UnsupportedScheme {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// Resource identifiers are appended as path segments, so the base must accept them.
	#[error("The {endpoint} endpoint cannot be used as a base URL: {url}.")]
	CannotBeABase {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// The region query parameter name is empty.
	#[error("Region parameter name cannot be empty.")]
	EmptyRegionParam,
	/// The default region code is empty.
	#[error("Default region code cannot be empty.")]
	EmptyDefaultRegion,
}

/// Builder for [`UpstreamDescriptor`] values.
///
/// Unset endpoints fall back to the KKBOX Open API.
#[derive(Debug, Default)]
pub struct UpstreamDescriptorBuilder {
	/// Token endpoint override.
	pub token_endpoint: Option<Url>,
	/// Resource endpoint override.
	pub resource_endpoint: Option<Url>,
	/// Region query parameter override.
	pub region_param: Option<String>,
	/// Default region override.
	pub default_region: Option<String>,
}
impl UpstreamDescriptorBuilder {
	/// Sets the token endpoint.
	pub fn token_endpoint(mut self, url: Url) -> Self {
		self.token_endpoint = Some(url);

		self
	}

	/// Sets the resource endpoint.
	pub fn resource_endpoint(mut self, url: Url) -> Self {
		self.resource_endpoint = Some(url);

		self
	}

	/// Sets the query parameter carrying the region code.
	pub fn region_param(mut self, name: impl Into<String>) -> Self {
		self.region_param = Some(name.into());

		self
	}

	/// Sets the region code used when callers omit one.
	pub fn default_region(mut self, region: impl Into<String>) -> Self {
		self.default_region = Some(region.into());

		self
	}

	/// Consumes the builder and validates the resulting descriptor.
	pub fn build(self) -> Result<UpstreamDescriptor, DescriptorError> {
		let token = match self.token_endpoint {
			Some(url) => url,
			None => parse_endpoint("token", KKBOX_TOKEN_ENDPOINT)?,
		};
		let resource = match self.resource_endpoint {
			Some(url) => url,
			None => parse_endpoint("resource", KKBOX_RESOURCE_ENDPOINT)?,
		};
		let descriptor = UpstreamDescriptor {
			endpoints: UpstreamEndpoints { token, resource },
			region_param: self.region_param.unwrap_or_else(|| KKBOX_REGION_PARAM.into()),
			default_region: self.default_region.unwrap_or_else(|| DEFAULT_REGION.into()),
		};

		descriptor.validate()?;

		Ok(descriptor)
	}
}

impl UpstreamDescriptor {
	/// Validates invariants for the descriptor.
	fn validate(&self) -> Result<(), DescriptorError> {
		validate_endpoint("token", &self.endpoints.token)?;
		validate_endpoint("resource", &self.endpoints.resource)?;

		if self.endpoints.resource.cannot_be_a_base() {
			return Err(DescriptorError::CannotBeABase {
				endpoint: "resource",
				url: self.endpoints.resource.to_string(),
			});
		}
		if self.region_param.is_empty() {
			return Err(DescriptorError::EmptyRegionParam);
		}
		if self.default_region.is_empty() {
			return Err(DescriptorError::EmptyDefaultRegion);
		}

		Ok(())
	}
}

fn parse_endpoint(endpoint: &'static str, value: &str) -> Result<Url, DescriptorError> {
	Url::parse(value).map_err(|source| DescriptorError::InvalidUrl {
		endpoint,
		value: value.into(),
		source,
	})
}

fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), DescriptorError> {
	match url.scheme() {
		"http" | "https" => Ok(()),
		_ => Err(DescriptorError::UnsupportedScheme { endpoint: name, url: url.to_string() }),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn url(value: &str) -> Url {
		Url::parse(value).expect("Failed to parse fixture URL.")
	}

	#[test]
	fn overrides_replace_defaults() {
		let descriptor = UpstreamDescriptor::builder()
			.token_endpoint(url("http://127.0.0.1:9000/oauth2/token"))
			.resource_endpoint(url("http://127.0.0.1:9000/v1.1/featured-playlists"))
			.region_param("region")
			.default_region("JP")
			.build()
			.expect("Descriptor with local endpoints should build.");
		let resource =
			descriptor.resource_url("abc", None).expect("Resource URL should build.");

		assert_eq!(descriptor.endpoints.token.path(), "/oauth2/token");
		assert_eq!(resource.as_str(), "http://127.0.0.1:9000/v1.1/featured-playlists/abc?region=JP");
	}

	#[test]
	fn rejects_non_http_schemes_and_unusable_bases() {
		let err = UpstreamDescriptor::builder()
			.token_endpoint(url("ftp://example.com/token"))
			.build()
			.expect_err("Non-HTTP token endpoints should be rejected.");

		assert!(matches!(err, DescriptorError::UnsupportedScheme { endpoint: "token", .. }));

		let err = UpstreamDescriptor::builder()
			.resource_endpoint(url("data:text/plain,playlists"))
			.build()
			.expect_err("Opaque resource endpoints should be rejected.");

		assert!(matches!(err, DescriptorError::UnsupportedScheme { endpoint: "resource", .. }));
	}

	#[test]
	fn rejects_empty_region_settings() {
		assert_eq!(
			UpstreamDescriptor::builder()
				.region_param("")
				.build()
				.expect_err("Empty region parameter should be rejected."),
			DescriptorError::EmptyRegionParam,
		);
		assert_eq!(
			UpstreamDescriptor::builder()
				.default_region("")
				.build()
				.expect_err("Empty default region should be rejected."),
			DescriptorError::EmptyDefaultRegion,
		);
	}
}
