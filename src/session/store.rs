//! The session store: who is signed in, if anyone.
//!
//! Exactly one `SessionStore` exists per running client. It hydrates from
//! durable storage once, at creation, and afterwards every `login`/`logout`
//! updates durable storage and the in-memory pair in one uninterrupted step,
//! so no reader ever observes a half-updated session. Observers registered
//! with `subscribe` are invoked synchronously, in registration order, after
//! both copies of the state have been updated.

// Allow dead code: the full store contract outlives any one consumer
#![allow(dead_code)]

use thiserror::Error;
use tracing::{debug, warn};

use super::storage::{KeyValueStorage, StorageError};

/// Fixed durable-storage key for the bearer token.
pub const TOKEN_KEY: &str = "token";

/// Fixed durable-storage key for the signed-in user id.
pub const USER_ID_KEY: &str = "user_id";

/// The current session. Both fields are present (authenticated) or both are
/// absent (anonymous); the store never holds one without the other.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionState {
    pub user_id: Option<i64>,
    pub token: Option<String>,
}

impl SessionState {
    fn authenticated(user_id: i64, token: String) -> Self {
        Self {
            user_id: Some(user_id),
            token: Some(token),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }

    /// Bearer token for outgoing requests, if signed in.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

#[derive(Error, Debug)]
pub enum SessionError {
    /// Durable storage could not be read or written. The in-memory session
    /// is left as it was; the two never silently diverge.
    #[error("session storage unavailable: {0}")]
    StorageUnavailable(#[from] StorageError),

    /// The caller supplied an empty token or a non-positive user id. This is
    /// a programming error in the caller, not a user-facing condition.
    #[error("invalid credential payload: {0}")]
    InvalidCredentials(&'static str),
}

/// Handle returned by `subscribe`, used to deregister the observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObserverId(u64);

type Observer = Box<dyn FnMut(&SessionState) + Send>;

pub struct SessionStore<S> {
    storage: S,
    state: SessionState,
    observers: Vec<(ObserverId, Observer)>,
    next_observer: u64,
}

impl<S: KeyValueStorage> SessionStore<S> {
    /// Create the store, hydrating in-memory state from durable storage.
    ///
    /// A half-written pair (one key present without the other, or an
    /// unparseable user id) is an invalid state; hydration repairs it by
    /// clearing both keys and starting anonymous.
    pub fn open(mut storage: S) -> Result<Self, SessionError> {
        let token = storage.get(TOKEN_KEY)?;
        let raw_user_id = storage.get(USER_ID_KEY)?;
        let user_id = raw_user_id.as_deref().and_then(|raw| {
            let parsed = raw.trim().parse::<i64>().ok().filter(|id| *id > 0);
            if parsed.is_none() {
                warn!(raw = %raw, "stored user id is not a positive integer");
            }
            parsed
        });

        let state = match (user_id, token) {
            (Some(user_id), Some(token)) => SessionState::authenticated(user_id, token),
            (None, None) if raw_user_id.is_none() => SessionState::default(),
            _ => {
                warn!("invalid session pair in durable storage, clearing");
                storage.remove(TOKEN_KEY)?;
                storage.remove(USER_ID_KEY)?;
                SessionState::default()
            }
        };

        debug!(authenticated = state.is_authenticated(), "session hydrated");

        Ok(Self {
            storage,
            state,
            observers: Vec::new(),
            next_observer: 0,
        })
    }

    /// The current session pair. No side effects.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Sign in as `user_id` with `token`.
    ///
    /// Writes both durable keys, then updates the in-memory pair, then
    /// notifies observers, all before returning. Token format is not
    /// validated here; whether it is a usable credential is the auth
    /// service's concern. Calling again with the same values is a no-op.
    pub fn login(&mut self, user_id: i64, token: &str) -> Result<(), SessionError> {
        if user_id <= 0 {
            return Err(SessionError::InvalidCredentials(
                "user id must be positive",
            ));
        }
        if token.is_empty() {
            return Err(SessionError::InvalidCredentials("token must be non-empty"));
        }

        let next = SessionState::authenticated(user_id, token.to_string());
        if next == self.state {
            return Ok(());
        }

        self.storage.set(TOKEN_KEY, token)?;
        if let Err(e) = self.storage.set(USER_ID_KEY, &user_id.to_string()) {
            // Roll back the token so the stored pair stays all-or-nothing.
            // Hydration repair covers the case where even this fails.
            if self.state.token.is_none() {
                let _ = self.storage.remove(TOKEN_KEY);
            } else if let Some(prev) = self.state.token.clone() {
                let _ = self.storage.set(TOKEN_KEY, &prev);
            }
            return Err(e.into());
        }

        self.state = next;
        debug!(user_id, "session login");
        self.notify();
        Ok(())
    }

    /// Sign out. Removes both durable keys and resets the in-memory pair to
    /// anonymous. A no-op when already anonymous.
    pub fn logout(&mut self) -> Result<(), SessionError> {
        if !self.state.is_authenticated() {
            return Ok(());
        }

        self.storage.remove(USER_ID_KEY)?;
        if let Err(e) = self.storage.remove(TOKEN_KEY) {
            if let Some(user_id) = self.state.user_id {
                let _ = self.storage.set(USER_ID_KEY, &user_id.to_string());
            }
            return Err(e.into());
        }

        self.state = SessionState::default();
        debug!("session logout");
        self.notify();
        Ok(())
    }

    /// Register `observer` to be called whenever `login` or `logout` changes
    /// the state. Returns a handle for `unsubscribe`.
    pub fn subscribe(
        &mut self,
        observer: impl FnMut(&SessionState) + Send + 'static,
    ) -> ObserverId {
        let id = ObserverId(self.next_observer);
        self.next_observer += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Deregister a previously subscribed observer. Unknown handles are
    /// ignored.
    pub fn unsubscribe(&mut self, id: ObserverId) {
        self.observers.retain(|(observer_id, _)| *observer_id != id);
    }

    fn notify(&mut self) {
        let state = self.state.clone();
        for (_, observer) in &mut self.observers {
            observer(&state);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::super::storage::{FileStorage, MemoryStorage};
    use super::*;

    fn record_states(
        store: &mut SessionStore<impl KeyValueStorage>,
    ) -> Arc<Mutex<Vec<SessionState>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        store.subscribe(move |state| sink.lock().expect("lock").push(state.clone()));
        seen
    }

    #[test]
    fn login_then_state_returns_the_pair() {
        let mut store = SessionStore::open(MemoryStorage::new()).expect("open");
        store.login(7, "tok-7").expect("login");

        assert_eq!(store.state().user_id, Some(7));
        assert_eq!(store.state().token(), Some("tok-7"));
        assert!(store.state().is_authenticated());
    }

    #[test]
    fn logout_always_returns_anonymous() {
        let mut store = SessionStore::open(MemoryStorage::new()).expect("open");
        store.logout().expect("logout while anonymous");
        assert_eq!(*store.state(), SessionState::default());

        store.login(3, "abc").expect("login");
        store.logout().expect("logout");
        assert_eq!(*store.state(), SessionState::default());
        assert!(!store.state().is_authenticated());
    }

    #[test]
    fn relogin_replaces_credentials() {
        let mut store = SessionStore::open(MemoryStorage::new()).expect("open");
        store.login(1, "first").expect("login");
        store.login(2, "second").expect("relogin");

        assert_eq!(store.state().user_id, Some(2));
        assert_eq!(store.state().token(), Some("second"));
    }

    #[test]
    fn login_and_logout_are_idempotent() {
        let mut store = SessionStore::open(MemoryStorage::new()).expect("open");
        let seen = record_states(&mut store);

        store.login(5, "tok").expect("login");
        store.login(5, "tok").expect("repeat login");
        assert_eq!(store.state().user_id, Some(5));
        assert_eq!(seen.lock().expect("lock").len(), 1);

        store.logout().expect("logout");
        store.logout().expect("repeat logout");
        assert_eq!(*store.state(), SessionState::default());
        assert_eq!(seen.lock().expect("lock").len(), 2);
    }

    #[test]
    fn observer_sees_new_state_once_before_login_returns() {
        let mut store = SessionStore::open(MemoryStorage::new()).expect("open");
        let seen = record_states(&mut store);

        store.login(1, "abc").expect("login");

        let seen = seen.lock().expect("lock");
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].user_id, Some(1));
        assert_eq!(seen[0].token(), Some("abc"));
    }

    #[test]
    fn observers_run_in_registration_order() {
        let mut store = SessionStore::open(MemoryStorage::new()).expect("open");
        let order = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let sink = Arc::clone(&order);
            store.subscribe(move |_| sink.lock().expect("lock").push(tag));
        }

        store.login(9, "tok").expect("login");
        assert_eq!(*order.lock().expect("lock"), vec!["first", "second", "third"]);
    }

    #[test]
    fn unsubscribed_observer_is_not_called() {
        let mut store = SessionStore::open(MemoryStorage::new()).expect("open");
        let seen = Arc::new(Mutex::new(0usize));
        let sink = Arc::clone(&seen);
        let id = store.subscribe(move |_| *sink.lock().expect("lock") += 1);

        store.login(1, "a").expect("login");
        store.unsubscribe(id);
        store.logout().expect("logout");

        assert_eq!(*seen.lock().expect("lock"), 1);
    }

    #[test]
    fn invalid_payload_fails_fast_without_side_effects() {
        let mut store = SessionStore::open(MemoryStorage::new()).expect("open");
        let seen = record_states(&mut store);

        assert!(matches!(
            store.login(0, "tok"),
            Err(SessionError::InvalidCredentials(_))
        ));
        assert!(matches!(
            store.login(-4, "tok"),
            Err(SessionError::InvalidCredentials(_))
        ));
        assert!(matches!(
            store.login(1, ""),
            Err(SessionError::InvalidCredentials(_))
        ));

        assert_eq!(*store.state(), SessionState::default());
        assert!(seen.lock().expect("lock").is_empty());
    }

    #[test]
    fn fresh_store_rehydrates_to_the_live_state() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage_dir = dir.path().join("session");

        let mut live = SessionStore::open(FileStorage::new(storage_dir.clone())).expect("open");
        live.login(42, "tok-xyz").expect("login");

        let rehydrated = SessionStore::open(FileStorage::new(storage_dir.clone())).expect("open");
        assert_eq!(rehydrated.state(), live.state());

        live.logout().expect("logout");
        let rehydrated = SessionStore::open(FileStorage::new(storage_dir)).expect("open");
        assert_eq!(rehydrated.state(), live.state());
    }

    #[test]
    fn durable_keys_track_the_session_lifecycle() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage_dir = dir.path().join("session");

        let mut store = SessionStore::open(FileStorage::new(storage_dir.clone())).expect("open");
        assert_eq!(*store.state(), SessionState::default());

        store.login(42, "tok-xyz").expect("login");
        assert_eq!(store.state().user_id, Some(42));
        assert_eq!(store.state().token(), Some("tok-xyz"));
        assert!(storage_dir.join(TOKEN_KEY).exists());
        assert!(storage_dir.join(USER_ID_KEY).exists());

        store.logout().expect("logout");
        assert_eq!(*store.state(), SessionState::default());
        assert!(!storage_dir.join(TOKEN_KEY).exists());
        assert!(!storage_dir.join(USER_ID_KEY).exists());
    }

    #[test]
    fn half_written_pair_is_cleared_at_hydration() {
        let mut storage = MemoryStorage::new();
        storage.set(TOKEN_KEY, "dangling").expect("seed");

        let store = SessionStore::open(storage).expect("open");
        assert_eq!(*store.state(), SessionState::default());
    }

    #[test]
    fn garbage_user_id_is_cleared_at_hydration() {
        let mut storage = MemoryStorage::new();
        storage.set(TOKEN_KEY, "tok").expect("seed token");
        storage.set(USER_ID_KEY, "not-a-number").expect("seed id");

        let store = SessionStore::open(storage).expect("open");
        assert_eq!(*store.state(), SessionState::default());
    }

    #[test]
    fn lone_garbage_user_id_does_not_survive_rehydration() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage_dir = dir.path().join("session");

        let mut seed = FileStorage::new(storage_dir.clone());
        seed.set(USER_ID_KEY, "zero").expect("seed id");

        let store = SessionStore::open(FileStorage::new(storage_dir.clone())).expect("open");
        assert_eq!(*store.state(), SessionState::default());
        assert!(!storage_dir.join(USER_ID_KEY).exists());
    }
}
