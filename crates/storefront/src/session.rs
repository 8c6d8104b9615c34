//! Session state holder.
//!
//! Owns the current [`SessionState`] and its persisted copy. All transitions
//! go through a single `watch` sender, so a transition and its persistence
//! happen as one step and subscribers only ever see `Unauthenticated` or a
//! complete `Authenticated` session.
//!
//! The identity-transition operations (login, registration, logout) live in
//! [`crate::services::auth::AuthService`]; this type only stores the result.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};

use emporium_core::Credential;

use crate::models::session::keys;
use crate::models::{Session, SessionState, User};
use crate::store::KeyValueStore;

/// Cloneable handle to the session state.
#[derive(Debug, Clone)]
pub struct SessionStore {
    inner: Arc<SessionStoreInner>,
}

#[derive(Debug)]
struct SessionStoreInner {
    state: watch::Sender<SessionState>,
    store: Arc<dyn KeyValueStore>,
}

impl SessionStore {
    /// Restore the session persisted in `store`, if any.
    ///
    /// A credential without a parseable identity (or the reverse) is not a
    /// session: both keys are cleared and the state starts unauthenticated.
    #[must_use]
    pub fn restore(store: Arc<dyn KeyValueStore>) -> Self {
        let state = restore_state(store.as_ref());
        let (sender, _) = watch::channel(state);

        Self {
            inner: Arc::new(SessionStoreInner {
                state: sender,
                store,
            }),
        }
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    /// The active session, if any.
    #[must_use]
    pub fn current(&self) -> Option<Session> {
        self.inner.state.borrow().session().cloned()
    }

    /// The signed-in user, if any.
    #[must_use]
    pub fn user(&self) -> Option<User> {
        self.inner.state.borrow().session().map(|s| s.user.clone())
    }

    /// The active credential, if any.
    #[must_use]
    pub fn credential(&self) -> Option<Credential> {
        self.inner
            .state
            .borrow()
            .session()
            .map(|s| s.credential.clone())
    }

    /// Whether a user is signed in.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.inner.state.borrow().is_authenticated()
    }

    /// Watch for state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    /// Replace the state with an authenticated session and persist it.
    pub(crate) fn establish(&self, session: Session) {
        let store = &self.inner.store;
        self.inner.state.send_modify(|state| {
            persist(store.as_ref(), &session);
            *state = SessionState::Authenticated(session);
        });
    }

    /// Drop the session and its persisted copy.
    ///
    /// Returns whether a session was active.
    pub(crate) fn clear(&self) -> bool {
        let store = &self.inner.store;
        let mut was_authenticated = false;
        self.inner.state.send_modify(|state| {
            was_authenticated = state.is_authenticated();
            forget(store.as_ref());
            *state = SessionState::Unauthenticated;
        });
        was_authenticated
    }

    /// Drop the session only if it still holds `credential`.
    ///
    /// Several in-flight requests rejected for the same credential all call
    /// this; only the first one finds a match and tears the session down.
    /// Returns whether this call cleared the session.
    pub(crate) fn expire(&self, credential: &Credential) -> bool {
        let store = &self.inner.store;
        self.inner.state.send_if_modified(|state| {
            let matches = state
                .session()
                .is_some_and(|session| &session.credential == credential);
            if matches {
                forget(store.as_ref());
                *state = SessionState::Unauthenticated;
            }
            matches
        })
    }
}

fn restore_state(store: &dyn KeyValueStore) -> SessionState {
    let credential = store.get(keys::CREDENTIAL).filter(|t| !t.is_empty());
    let identity = store.get(keys::IDENTITY);

    match (credential, identity) {
        (None, None) => SessionState::Unauthenticated,
        (Some(token), Some(raw)) => match serde_json::from_str::<User>(&raw) {
            Ok(user) => {
                info!(user_id = %user.id, "Restored persisted session");
                SessionState::Authenticated(Session {
                    user,
                    credential: Credential::new(token),
                })
            }
            Err(e) => {
                warn!(error = %e, "Discarding persisted session with unreadable identity");
                forget(store);
                SessionState::Unauthenticated
            }
        },
        (credential, identity) => {
            warn!(
                has_credential = credential.is_some(),
                has_identity = identity.is_some(),
                "Discarding incomplete persisted session"
            );
            forget(store);
            SessionState::Unauthenticated
        }
    }
}

fn persist(store: &dyn KeyValueStore, session: &Session) {
    let identity = match serde_json::to_string(&session.user) {
        Ok(identity) => identity,
        Err(e) => {
            warn!(error = %e, "Failed to encode session identity");
            return;
        }
    };

    if let Err(e) = store
        .set(keys::CREDENTIAL, session.credential.expose())
        .and_then(|()| store.set(keys::IDENTITY, &identity))
    {
        warn!(error = %e, "Failed to persist session");
    }
}

fn forget(store: &dyn KeyValueStore) {
    for key in [keys::CREDENTIAL, keys::IDENTITY] {
        if let Err(e) = store.remove(key) {
            warn!(key, error = %e, "Failed to clear persisted session key");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use emporium_core::{Email, UserId};

    use super::*;
    use crate::store::MemoryStore;

    fn user() -> User {
        User {
            id: UserId::new(7),
            email: Email::parse("ada@example.com").unwrap(),
            name: "Ada".to_string(),
            phone: None,
            active: true,
        }
    }

    fn session(token: &str) -> Session {
        Session {
            user: user(),
            credential: Credential::new(token),
        }
    }

    #[test]
    fn test_starts_unauthenticated_with_empty_store() {
        let sessions = SessionStore::restore(Arc::new(MemoryStore::new()));
        assert_eq!(sessions.state(), SessionState::Unauthenticated);
        assert!(sessions.credential().is_none());
        assert!(sessions.user().is_none());
    }

    #[test]
    fn test_establish_persists_and_restores() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let sessions = SessionStore::restore(Arc::clone(&store));
        sessions.establish(session("tok-1"));

        assert_eq!(store.get(keys::CREDENTIAL).as_deref(), Some("tok-1"));
        assert!(store.get(keys::IDENTITY).is_some());

        let restored = SessionStore::restore(store);
        assert_eq!(restored.current(), Some(session("tok-1")));
    }

    #[test]
    fn test_credential_without_identity_is_cleared() {
        let store: Arc<dyn KeyValueStore> =
            Arc::new(MemoryStore::with_entries([(keys::CREDENTIAL, "tok")]));
        let sessions = SessionStore::restore(Arc::clone(&store));

        assert!(!sessions.is_authenticated());
        assert_eq!(store.get(keys::CREDENTIAL), None);
    }

    #[test]
    fn test_unparseable_identity_is_cleared() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::with_entries([
            (keys::CREDENTIAL, "tok"),
            (keys::IDENTITY, "{broken"),
        ]));
        let sessions = SessionStore::restore(Arc::clone(&store));

        assert!(!sessions.is_authenticated());
        assert_eq!(store.get(keys::CREDENTIAL), None);
        assert_eq!(store.get(keys::IDENTITY), None);
    }

    #[test]
    fn test_identity_without_credential_is_cleared() {
        let identity = serde_json::to_string(&user()).unwrap();
        let store: Arc<dyn KeyValueStore> =
            Arc::new(MemoryStore::with_entries([(keys::IDENTITY, identity)]));
        let sessions = SessionStore::restore(Arc::clone(&store));

        assert!(!sessions.is_authenticated());
        assert_eq!(store.get(keys::IDENTITY), None);
    }

    #[test]
    fn test_clear_leaves_nothing_behind() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let sessions = SessionStore::restore(Arc::clone(&store));
        sessions.establish(session("tok"));

        assert!(sessions.clear());
        assert!(!sessions.clear());
        assert_eq!(sessions.state(), SessionState::Unauthenticated);
        assert_eq!(store.get(keys::CREDENTIAL), None);
        assert_eq!(store.get(keys::IDENTITY), None);
    }

    #[test]
    fn test_expire_only_matches_current_credential() {
        let sessions = SessionStore::restore(Arc::new(MemoryStore::new()));
        sessions.establish(session("new"));

        assert!(!sessions.expire(&Credential::new("old")));
        assert!(sessions.is_authenticated());

        assert!(sessions.expire(&Credential::new("new")));
        assert!(!sessions.expire(&Credential::new("new")));
        assert!(!sessions.is_authenticated());
    }

    #[tokio::test]
    async fn test_subscribers_see_whole_transitions() {
        let sessions = SessionStore::restore(Arc::new(MemoryStore::new()));
        let mut rx = sessions.subscribe();

        sessions.establish(session("tok"));
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_authenticated());

        sessions.clear();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), SessionState::Unauthenticated);
    }
}
