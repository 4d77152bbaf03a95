//! Command-line and environment configuration for the proxy binary.

// std
use std::time::Duration as StdDuration;
// crates.io
use clap::Parser;
// self
use crate::{
	_prelude::*,
	error::ConfigError,
	http::ReqwestHttpClient,
	obs::LogFormat,
	provider::{
		DEFAULT_REGION, KKBOX_REGION_PARAM, KKBOX_RESOURCE_ENDPOINT, KKBOX_TOKEN_ENDPOINT,
		UpstreamDescriptor,
	},
};

/// KKBOX Open API credential holder and catalog proxy.
#[derive(Clone, Debug, Parser)]
#[command(name = "kkbox-proxy", version, about, long_about = None)]
pub struct Config {
	/// Host to bind to.
	#[arg(long, default_value = "0.0.0.0")]
	pub host: String,

	/// Port to listen on.
	#[arg(short, long, env = "PORT", default_value_t = 4000)]
	pub port: u16,

	/// Region code used when a resource request does not carry one.
	#[arg(long, env = "DEFAULT_REGION", default_value = DEFAULT_REGION)]
	pub default_region: String,

	/// OAuth 2.0 token endpoint.
	#[arg(long, default_value = KKBOX_TOKEN_ENDPOINT)]
	pub token_endpoint: Url,

	/// Base URL for catalog resources; the resource id is appended as a path segment.
	#[arg(long, default_value = KKBOX_RESOURCE_ENDPOINT)]
	pub resource_endpoint: Url,

	/// Query parameter carrying the region code upstream.
	#[arg(long, default_value = KKBOX_REGION_PARAM)]
	pub region_param: String,

	/// Deadline, in seconds, for every upstream request.
	#[arg(long, default_value_t = 10)]
	pub upstream_timeout_secs: u64,

	/// Seconds subtracted from every upstream token lifetime before caching.
	#[arg(long, default_value_t = 30)]
	pub token_safety_margin_secs: u64,

	/// Serve `GET /token`, which returns the live bearer token to any caller.
	#[arg(long)]
	pub expose_token_endpoint: bool,

	/// Log level (trace, debug, info, warn, error); `RUST_LOG` overrides it.
	#[arg(long, default_value = "info")]
	pub log_level: String,

	/// Log format.
	#[arg(long, value_enum, default_value_t = LogFormat::Text)]
	pub log_format: LogFormat,
}
impl Config {
	/// Validates the upstream settings into a descriptor.
	pub fn descriptor(&self) -> Result<UpstreamDescriptor, ConfigError> {
		let descriptor = UpstreamDescriptor::builder()
			.token_endpoint(self.token_endpoint.clone())
			.resource_endpoint(self.resource_endpoint.clone())
			.region_param(&self.region_param)
			.default_region(&self.default_region)
			.build()?;

		Ok(descriptor)
	}

	/// Builds the outbound HTTP client bounded by the configured deadline.
	pub fn http_client(&self) -> Result<ReqwestHttpClient, ConfigError> {
		ReqwestHttpClient::with_timeout(self.upstream_timeout())
	}

	/// Deadline applied to every upstream request.
	pub fn upstream_timeout(&self) -> StdDuration {
		StdDuration::from_secs(self.upstream_timeout_secs)
	}

	/// Margin subtracted from upstream token lifetimes.
	pub fn safety_margin(&self) -> Duration {
		Duration::seconds(i64::try_from(self.token_safety_margin_secs).unwrap_or(i64::MAX))
	}

	/// Address the listener binds to.
	pub fn listen_addr(&self) -> (&str, u16) {
		(&self.host, self.port)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn parse(args: &[&str]) -> Config {
		Config::try_parse_from(std::iter::once("kkbox-proxy").chain(args.iter().copied()))
			.expect("Arguments should parse.")
	}

	#[test]
	fn defaults_target_kkbox() {
		let config = parse(&["--port", "4000", "--default-region", "TW"]);
		let descriptor = config.descriptor().expect("Default descriptor should validate.");

		assert_eq!(config.host, "0.0.0.0");
		assert_eq!(config.listen_addr(), ("0.0.0.0", 4000));
		assert_eq!(config.upstream_timeout(), StdDuration::from_secs(10));
		assert_eq!(config.safety_margin(), Duration::seconds(30));
		assert!(!config.expose_token_endpoint);
		assert_eq!(config.log_format, LogFormat::Text);
		assert_eq!(descriptor, UpstreamDescriptor::kkbox().expect("Built-in descriptor should validate."));
	}

	#[test]
	fn flags_override_upstream_settings() {
		let config = parse(&[
			"--port",
			"8080",
			"--default-region",
			"JP",
			"--token-endpoint",
			"http://127.0.0.1:9000/oauth2/token",
			"--resource-endpoint",
			"http://127.0.0.1:9000/playlists",
			"--region-param",
			"region",
			"--expose-token-endpoint",
			"--log-format",
			"json",
		]);
		let descriptor = config.descriptor().expect("Overridden descriptor should validate.");
		let url = descriptor.resource_url("pl1", None).expect("Resource URL should build.");

		assert_eq!(url.as_str(), "http://127.0.0.1:9000/playlists/pl1?region=JP");
		assert!(config.expose_token_endpoint);
		assert_eq!(config.log_format, LogFormat::Json);
	}

	#[test]
	fn empty_region_param_is_rejected() {
		let config = parse(&["--region-param", ""]);

		assert!(matches!(config.descriptor(), Err(ConfigError::Descriptor(_))));
	}

	#[test]
	fn malformed_endpoint_fails_to_parse() {
		let result = Config::try_parse_from(["kkbox-proxy", "--token-endpoint", "not a url"]);

		assert!(result.is_err());
	}
}
