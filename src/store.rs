//! Process-lifetime holder for the current credential pair and cached token.
//!
//! Both values live behind one lock together with a monotonically increasing
//! [`CredentialEpoch`], so replacing credentials and invalidating the token is a single atomic
//! step: no reader can observe new credentials next to a token minted for the old ones.

// self
use crate::{
	_prelude::*,
	auth::{CachedToken, Credentials},
};

/// Identifies one credential epoch, i.e. the span during which one [`Credentials`] value is
/// authoritative. Bumped on every submission.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CredentialEpoch(u64);
impl CredentialEpoch {
	/// Returns the raw counter value.
	pub const fn get(self) -> u64 {
		self.0
	}

	fn next(self) -> Self {
		Self(self.0.wrapping_add(1))
	}
}
impl Display for CredentialEpoch {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "{}", self.0)
	}
}

/// Consistent view of the store taken under a single lock acquisition.
#[derive(Clone, Debug, Default)]
pub struct StoreSnapshot {
	/// Epoch the snapshot belongs to.
	pub epoch: CredentialEpoch,
	/// Current credentials, if any were submitted.
	pub credentials: Option<Credentials>,
	/// Cached token, if one was acquired during this epoch.
	pub token: Option<CachedToken>,
}
impl StoreSnapshot {
	/// Returns the cached token when it is still usable at `now`.
	pub fn valid_token(&self, now: OffsetDateTime) -> Option<&CachedToken> {
		self.token.as_ref().filter(|token| token.is_valid_at(now))
	}
}

/// Single-tenant store for credentials and the cached token.
#[derive(Debug, Default)]
pub struct TokenStore(Mutex<StoreSnapshot>);
impl TokenStore {
	/// Replaces the credentials and clears any cached token, returning the new epoch.
	pub fn set_credentials(&self, credentials: Credentials) -> CredentialEpoch {
		let mut state = self.0.lock();

		state.epoch = state.epoch.next();
		state.credentials = Some(credentials);
		state.token = None;

		state.epoch
	}

	/// Returns the current credentials, if any.
	pub fn credentials(&self) -> Option<Credentials> {
		self.0.lock().credentials.clone()
	}

	/// Returns the cached token regardless of its expiry.
	pub fn cached_token(&self) -> Option<CachedToken> {
		self.0.lock().token.clone()
	}

	/// Overwrites the cached token for the current epoch.
	pub fn set_cached_token(&self, token: CachedToken) {
		self.0.lock().token = Some(token);
	}

	/// Returns the current epoch.
	pub fn epoch(&self) -> CredentialEpoch {
		self.0.lock().epoch
	}

	/// Takes a consistent snapshot of credentials, token, and epoch.
	pub fn snapshot(&self) -> StoreSnapshot {
		self.0.lock().clone()
	}

	/// Caches `token` only if the credentials it was minted with are still current.
	///
	/// Returns `false` when a rotation happened while the token was being acquired; the token is
	/// then discarded so it can never be served under the new credentials.
	pub fn install(&self, epoch: CredentialEpoch, token: CachedToken) -> bool {
		let mut state = self.0.lock();

		if state.epoch != epoch {
			return false;
		}

		state.token = Some(token);

		true
	}
}
