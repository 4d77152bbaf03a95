//! Cached bearer token and its lifecycle helpers.

// self
use crate::{_prelude::*, auth::token::secret::TokenSecret};

/// Lifecycle status of a cached token at a given instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenStatus {
	/// Token may be attached to outbound requests.
	Active,
	/// Token reached its (margin-adjusted) expiry instant.
	Expired,
}

/// Bearer token held in the proxy's cache.
///
/// `expires_at` already has the safety margin subtracted, so the proxy stops using a token
/// strictly before the upstream stops accepting it.
#[derive(Clone, PartialEq, Eq)]
pub struct CachedToken {
	/// Access token secret; callers must avoid logging it.
	pub access_token: TokenSecret,
	/// Instant the acquisition that produced this token was started.
	pub issued_at: OffsetDateTime,
	/// Instant from which the token is no longer handed out.
	pub expires_at: OffsetDateTime,
}
impl CachedToken {
	/// Builds a cache entry from an upstream lifetime.
	///
	/// `expires_at = issued_at + (expires_in - safety_margin)`, floored at `issued_at`: a grant
	/// whose lifetime does not exceed the margin can serve the request that fetched it but is
	/// never reused.
	pub fn issue(
		access_token: TokenSecret,
		issued_at: OffsetDateTime,
		expires_in: Duration,
		safety_margin: Duration,
	) -> Self {
		let lifetime = expires_in.saturating_sub(safety_margin).max(Duration::ZERO);

		Self { access_token, issued_at, expires_at: issued_at.saturating_add(lifetime) }
	}

	/// Computes the lifecycle status at a given instant.
	pub fn status_at(&self, instant: OffsetDateTime) -> TokenStatus {
		if instant < self.expires_at { TokenStatus::Active } else { TokenStatus::Expired }
	}

	/// Returns `true` if the token may be used at `instant`.
	pub fn is_valid_at(&self, instant: OffsetDateTime) -> bool {
		matches!(self.status_at(instant), TokenStatus::Active)
	}

	/// Convenience helper that checks validity against the current UTC instant.
	pub fn is_valid(&self) -> bool {
		self.is_valid_at(OffsetDateTime::now_utc())
	}

	/// Expiry instant as Unix epoch milliseconds.
	pub fn expires_at_millis(&self) -> i64 {
		i64::try_from(self.expires_at.unix_timestamp_nanos() / 1_000_000).unwrap_or(i64::MAX)
	}
}
impl Debug for CachedToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CachedToken")
			.field("access_token", &"<redacted>")
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}
