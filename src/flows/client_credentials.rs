//! Cached client-credentials token retrieval with single-flight exchange.
//!
//! [`TokenGuard::access_token`] returns the cached token when it is still inside its
//! margin-adjusted lifetime and otherwise joins (or starts) the flight for the current credential
//! epoch. A successful exchange is cached only if no rotation happened meanwhile; a failed one is
//! returned unchanged to every waiter and leaves the cache untouched.

// self
use crate::{
	_prelude::*,
	auth::{CachedToken, Credentials},
	flows::{TokenGuard, single_flight::Boarding},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	store::CredentialEpoch,
};

impl TokenGuard {
	/// Returns a token that is valid right now, exchanging credentials if needed.
	///
	/// Fails with [`Error::MissingCredentials`] before any credentials were submitted, and with the
	/// acquirer's error (typically [`Error::UpstreamAuth`] or [`Error::UpstreamRequest`]) when the
	/// exchange fails. Nothing is retried automatically.
	pub async fn access_token(&self) -> Result<CachedToken> {
		const KIND: FlowKind = FlowKind::ClientCredentials;

		let span = FlowSpan::new(KIND, "access_token");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let now = OffsetDateTime::now_utc();

				if let Some(token) = self.store.cached_token().filter(|token| token.is_valid_at(now))
				{
					return Ok(token);
				}

				match self.flights.board(&self.store, now)? {
					Boarding::Ready(token) => Ok(token),
					Boarding::Flight { flight, credentials } => {
						let epoch = flight.epoch();
						let outcome = flight.join(|| self.exchange(epoch, credentials)).await;

						self.flights.land(&flight);

						outcome
					},
				}
			})
			.await;

		obs::record_flow_result(KIND, &result);

		result
	}

	async fn exchange(&self, epoch: CredentialEpoch, credentials: Credentials) -> Result<CachedToken> {
		self.metrics.record_attempt();

		let issued_at = OffsetDateTime::now_utc();
		let grant = self.acquirer.acquire(&credentials).await.inspect_err(|e| {
			self.metrics.record_failure();

			tracing::warn!(%epoch, error = %e, "client-credentials exchange failed");
		})?;
		let token =
			CachedToken::issue(grant.access_token, issued_at, grant.expires_in, self.safety_margin);

		if self.store.install(epoch, token.clone()) {
			tracing::info!(%epoch, expires_at = %token.expires_at, "cached fresh access token");
		} else {
			tracing::debug!(%epoch, "credentials rotated during exchange; token not cached");
		}

		self.metrics.record_success();

		Ok(token)
	}
}
