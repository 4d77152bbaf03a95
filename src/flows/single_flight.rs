//! Single-flight coordination for token acquisition.
//!
//! At most one [`Flight`] is registered at a time and it is tagged with the credential epoch it
//! serves. The first caller that finds no usable token registers a flight and runs the exchange
//! inside the flight's [`AsyncOnceCell`]; concurrent callers of the same epoch attach to that cell
//! and receive a clone of its outcome, success or failure. A flight is removed once it has
//! resolved, so a failed exchange is retried by the next request rather than cached.

// self
use crate::{
	_prelude::*,
	auth::{CachedToken, Credentials},
	store::{CredentialEpoch, TokenStore},
};

/// One in-flight exchange shared by every caller of its epoch.
#[derive(Clone)]
pub(crate) struct Flight {
	epoch: CredentialEpoch,
	outcome: Arc<AsyncOnceCell<Result<CachedToken>>>,
}
impl Flight {
	fn new(epoch: CredentialEpoch) -> Self {
		Self { epoch, outcome: Default::default() }
	}

	pub(crate) fn epoch(&self) -> CredentialEpoch {
		self.epoch
	}

	/// Waits for the flight's outcome, running `acquire` if no other caller is already doing so.
	///
	/// If the caller driving the exchange is cancelled, a waiting caller takes over with its own
	/// `acquire`.
	pub(crate) async fn join<F, Fut>(&self, acquire: F) -> Result<CachedToken>
	where
		F: FnOnce() -> Fut,
		Fut: Future<Output = Result<CachedToken>>,
	{
		self.outcome.get_or_init(acquire).await.clone()
	}

	fn is(&self, other: &Flight) -> bool {
		Arc::ptr_eq(&self.outcome, &other.outcome)
	}
}
impl Debug for Flight {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Flight")
			.field("epoch", &self.epoch)
			.field("resolved", &self.outcome.is_initialized())
			.finish()
	}
}

/// Result of asking for a seat on the current flight.
#[derive(Debug)]
pub(crate) enum Boarding {
	/// A usable token is already cached; no exchange is needed.
	Ready(CachedToken),
	/// The caller must wait on `flight`, which exchanges `credentials`.
	Flight {
		/// Flight to join.
		flight: Flight,
		/// Credentials of the flight's epoch.
		credentials: Credentials,
	},
}

/// Registry holding the current flight, if any.
#[derive(Debug, Default)]
pub(crate) struct SingleFlight(Mutex<Option<Flight>>);
impl SingleFlight {
	/// Returns a cached token or a flight to join, registering a new flight when needed.
	///
	/// The store is re-read while the registry lock is held. Flights are removed only after their
	/// token has been installed, so a caller arriving between completion and removal still sees
	/// either the flight or the installed token and never starts a duplicate exchange.
	pub(crate) fn board(&self, store: &TokenStore, now: OffsetDateTime) -> Result<Boarding> {
		let mut current = self.0.lock();
		let snapshot = store.snapshot();

		if let Some(token) = snapshot.valid_token(now) {
			return Ok(Boarding::Ready(token.clone()));
		}

		let credentials = snapshot.credentials.ok_or(Error::MissingCredentials)?;

		if let Some(flight) = current.as_ref().filter(|flight| flight.epoch == snapshot.epoch) {
			return Ok(Boarding::Flight { flight: flight.clone(), credentials });
		}

		// Any registered flight belongs to an older epoch; its waiters keep their own handle.
		let flight = Flight::new(snapshot.epoch);

		*current = Some(flight.clone());

		Ok(Boarding::Flight { flight, credentials })
	}

	/// Removes `flight` from the registry unless it has already been replaced.
	pub(crate) fn land(&self, flight: &Flight) {
		let mut current = self.0.lock();

		if current.as_ref().is_some_and(|registered| registered.is(flight)) {
			*current = None;
		}
	}

	/// Returns `true` while a flight is registered.
	pub(crate) fn in_flight(&self) -> bool {
		self.0.lock().is_some()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::auth::TokenSecret;

	fn credentials() -> Credentials {
		Credentials::new("client", "secret").expect("Credential fixture should be valid.")
	}

	fn token(value: &str) -> CachedToken {
		CachedToken::issue(
			TokenSecret::new(value),
			OffsetDateTime::now_utc(),
			Duration::hours(1),
			Duration::ZERO,
		)
	}

	fn expect_flight(boarding: Boarding) -> Flight {
		match boarding {
			Boarding::Flight { flight, .. } => flight,
			Boarding::Ready(_) => panic!("Expected a flight, got a cached token."),
		}
	}

	#[test]
	fn boarding_without_credentials_fails() {
		let deck = SingleFlight::default();
		let store = TokenStore::default();
		let err = deck
			.board(&store, OffsetDateTime::now_utc())
			.expect_err("Boarding without credentials should fail.");

		assert!(matches!(err, Error::MissingCredentials));
		assert!(!deck.in_flight());
	}

	#[test]
	fn same_epoch_shares_one_flight() {
		let deck = SingleFlight::default();
		let store = TokenStore::default();

		store.set_credentials(credentials());

		let now = OffsetDateTime::now_utc();
		let first = expect_flight(deck.board(&store, now).expect("Boarding should succeed."));
		let second = expect_flight(deck.board(&store, now).expect("Boarding should succeed."));

		assert!(first.is(&second));

		deck.land(&first);

		assert!(!deck.in_flight());
	}

	#[test]
	fn rotation_starts_a_new_flight_and_old_landing_is_ignored() {
		let deck = SingleFlight::default();
		let store = TokenStore::default();

		store.set_credentials(credentials());

		let now = OffsetDateTime::now_utc();
		let old = expect_flight(deck.board(&store, now).expect("Boarding should succeed."));

		store.set_credentials(credentials());

		let new = expect_flight(deck.board(&store, now).expect("Boarding should succeed."));

		assert!(!old.is(&new));
		assert!(new.epoch() > old.epoch());

		deck.land(&old);

		assert!(deck.in_flight());
	}

	#[test]
	fn cached_token_short_circuits_boarding() {
		let deck = SingleFlight::default();
		let store = TokenStore::default();
		let epoch = store.set_credentials(credentials());

		assert!(store.install(epoch, token("cached")));

		match deck.board(&store, OffsetDateTime::now_utc()).expect("Boarding should succeed.") {
			Boarding::Ready(token) => assert_eq!(token.access_token.expose(), "cached"),
			Boarding::Flight { .. } => panic!("Expected the cached token."),
		}
	}

	#[tokio::test]
	async fn joiners_receive_the_first_outcome() {
		let flight = Flight::new(CredentialEpoch::default());
		let first = flight.join(|| async { Ok(token("first")) }).await;
		let second = flight.join(|| async { Ok(token("second")) }).await;

		assert_eq!(first.expect("First join should succeed.").access_token.expose(), "first");
		assert_eq!(second.expect("Second join should succeed.").access_token.expose(), "first");
	}
}
