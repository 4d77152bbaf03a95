//! Upstream descriptor data structures and resource URL construction.

/// Builder API for assembling upstream descriptors.
pub mod builder;

pub use builder::*;

// self
use crate::_prelude::*;

/// KKBOX OAuth 2.0 token endpoint.
pub const KKBOX_TOKEN_ENDPOINT: &str = "https://account.kkbox.com/oauth2/token";
/// KKBOX featured-playlist endpoint; the resource identifier is appended as a path segment.
pub const KKBOX_RESOURCE_ENDPOINT: &str = "https://api.kkbox.com/v1.1/featured-playlists/";
/// Query parameter KKBOX uses for the region code.
pub const KKBOX_REGION_PARAM: &str = "territory";
/// Region code used when the caller does not supply one.
pub const DEFAULT_REGION: &str = "TW";

/// Endpoint set declared by an upstream descriptor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpstreamEndpoints {
	/// Token endpoint used for the client-credentials exchange.
	pub token: Url,
	/// Base URL for catalog resources.
	pub resource: Url,
}

/// Immutable upstream descriptor consumed by the acquirer and the gateway.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpstreamDescriptor {
	/// Endpoint definitions.
	pub endpoints: UpstreamEndpoints,
	/// Query parameter carrying the region code on resource requests.
	pub region_param: String,
	/// Region code applied when the caller omits one.
	pub default_region: String,
}
impl UpstreamDescriptor {
	/// Creates a new builder seeded with the KKBOX defaults.
	pub fn builder() -> UpstreamDescriptorBuilder {
		UpstreamDescriptorBuilder::default()
	}

	/// Returns the validated KKBOX descriptor.
	pub fn kkbox() -> Result<Self, DescriptorError> {
		Self::builder().build()
	}

	/// Builds the URL for `resource_id`, falling back to the default region when `region` is
	/// absent or empty.
	///
	/// The identifier is pushed as one percent-encoded path segment, so it can never escape the
	/// resource base path.
	pub fn resource_url(
		&self,
		resource_id: &str,
		region: Option<&str>,
	) -> Result<Url, DescriptorError> {
		let region = region.filter(|value| !value.is_empty()).unwrap_or(&self.default_region);
		let mut url = self.endpoints.resource.clone();

		url.path_segments_mut()
			.map_err(|_| DescriptorError::CannotBeABase {
				endpoint: "resource",
				url: self.endpoints.resource.to_string(),
			})?
			.pop_if_empty()
			.push(resource_id);
		url.query_pairs_mut().append_pair(&self.region_param, region);

		Ok(url)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn default_descriptor_targets_kkbox() {
		let descriptor =
			UpstreamDescriptor::kkbox().expect("Built-in descriptor should validate.");
		let url = descriptor
			.resource_url("-lP7qjXsI1RZ-Iutny", None)
			.expect("Default descriptor should build resource URLs.");

		assert_eq!(descriptor.endpoints.token.as_str(), KKBOX_TOKEN_ENDPOINT);
		assert_eq!(
			url.as_str(),
			"https://api.kkbox.com/v1.1/featured-playlists/-lP7qjXsI1RZ-Iutny?territory=TW"
		);
	}

	#[test]
	fn explicit_region_overrides_default_and_empty_falls_back() {
		let descriptor =
			UpstreamDescriptor::kkbox().expect("Built-in descriptor should validate.");
		let jp = descriptor.resource_url("pl1", Some("JP")).expect("URL should build.");
		let empty = descriptor.resource_url("pl1", Some("")).expect("URL should build.");

		assert_eq!(jp.query(), Some("territory=JP"));
		assert_eq!(empty.query(), Some("territory=TW"));
	}

	#[test]
	fn resource_id_cannot_escape_base_path() {
		let descriptor =
			UpstreamDescriptor::kkbox().expect("Built-in descriptor should validate.");
		let url = descriptor.resource_url("../../me?x=1", None).expect("URL should build.");

		assert_eq!(url.path(), "/v1.1/featured-playlists/..%2F..%2Fme%3Fx=1");
		assert_eq!(url.query(), Some("territory=TW"));
	}
}
