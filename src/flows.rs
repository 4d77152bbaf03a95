//! Token lifecycle orchestration.
//!
//! [`TokenGuard`] is the single place that answers "give me a token I can use right now". It
//! owns the [`TokenStore`] handle, the [`TokenAcquirer`] used to mint new tokens, and the
//! single-flight registry that keeps concurrent callers from stampeding the token endpoint.
//! Refresh is strictly pull-based: nothing happens until a request finds the cache empty or
//! expired.

mod client_credentials;
mod metrics;
mod single_flight;

pub use metrics::AcquireMetrics;

// self
use crate::{
	_prelude::*,
	auth::Credentials,
	http::ReqwestHttpClient,
	oauth::{ClientCredentialsAcquirer, TokenAcquirer},
	provider::UpstreamDescriptor,
	store::{CredentialEpoch, TokenStore},
};

/// Returns usable bearer tokens, acquiring them on demand.
pub struct TokenGuard {
	/// Store holding the credential pair and cached token.
	pub store: Arc<TokenStore>,
	/// Exchange implementation invoked on cache misses.
	pub acquirer: Arc<dyn TokenAcquirer>,
	/// Amount subtracted from every upstream lifetime before caching.
	pub safety_margin: Duration,
	/// Counters for real exchanges.
	pub metrics: Arc<AcquireMetrics>,
	flights: single_flight::SingleFlight,
}
impl TokenGuard {
	/// Margin applied when callers do not pick one.
	pub const DEFAULT_SAFETY_MARGIN: Duration = Duration::seconds(30);

	/// Creates a guard over `store` that mints tokens with `acquirer`.
	pub fn new(store: Arc<TokenStore>, acquirer: Arc<dyn TokenAcquirer>) -> Self {
		Self {
			store,
			acquirer,
			safety_margin: Self::DEFAULT_SAFETY_MARGIN,
			metrics: Default::default(),
			flights: Default::default(),
		}
	}

	/// Creates a guard backed by a reqwest client-credentials acquirer for `descriptor`.
	pub fn for_descriptor(descriptor: &UpstreamDescriptor, http_client: ReqwestHttpClient) -> Self {
		let acquirer = ClientCredentialsAcquirer::from_descriptor(descriptor, http_client);

		Self::new(Arc::new(TokenStore::default()), Arc::new(acquirer))
	}

	/// Overrides the safety margin (defaults to 30 seconds). Negative values clamp to zero.
	pub fn with_safety_margin(mut self, margin: Duration) -> Self {
		self.safety_margin = if margin.is_negative() { Duration::ZERO } else { margin };

		self
	}

	/// Replaces the credentials, invalidating any cached token in the same step.
	pub fn set_credentials(&self, credentials: Credentials) -> CredentialEpoch {
		let client_id = credentials.client_id().to_owned();
		let epoch = self.store.set_credentials(credentials);

		tracing::info!(%epoch, client_id, "stored new upstream credentials; cached token cleared");

		epoch
	}

	/// Returns `true` while an exchange is registered as in flight.
	pub fn is_acquiring(&self) -> bool {
		self.flights.in_flight()
	}
}
impl Debug for TokenGuard {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenGuard")
			.field("epoch", &self.store.epoch())
			.field("safety_margin", &self.safety_margin)
			.field("metrics", &self.metrics)
			.finish()
	}
}
