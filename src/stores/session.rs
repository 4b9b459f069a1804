use std::convert::TryFrom;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::{
    api::ApiClient,
    models::{AuthResponse, Credentials, ProfileUpdate, Registration, Role, SessionToken, User},
    storage::{KeyValueStore, TOKEN_KEY},
    FarmhubError, Result,
};

#[derive(Debug)]
struct SessionState {
    token: Option<SessionToken>,
    /// Bumped whenever a session starts or ends. Requests capture it before
    /// they're sent and are discarded if it moved while they were in flight
    generation: u64,
}

/// Single source of truth for who is logged in.
///
/// The store is either anonymous (no token, no user) or authenticated
/// (token and user). The token is persisted so the session can be restored
/// on the next start, the user is always re-fetched with it.
///
/// There is one more state: a persisted token whose profile couldn't be
/// fetched on [`SessionStore::restore`]. The token is kept so a later
/// [`SessionStore::fetch_profile`] can recover the identity, but the store
/// isn't authenticated and a profile update sent from it carries no account
/// id. Only [`SessionStore::logout`] drops the token.
///
/// Responses that arrive after a logout (or after another login) are
/// discarded rather than bringing back the old identity.
///
/// Identity changes are published on a `watch` channel, see
/// [`SessionStore::subscribe`]
pub struct SessionStore<A, S> {
    api: A,
    storage: Arc<S>,
    state: Mutex<SessionState>,
    identity: watch::Sender<Option<User>>,
    timeout: Duration,
}

impl<A: ApiClient, S: KeyValueStore> SessionStore<A, S> {
    /// Creates the store, picking up a persisted token if there is one.
    ///
    /// This doesn't talk to the API, use [`SessionStore::restore`] to also
    /// load the user behind a persisted token
    pub fn new(api: A, storage: Arc<S>, timeout: Duration) -> Self {
        let token = read_persisted_token(storage.as_ref());
        let (identity, _) = watch::channel(None);
        Self {
            api,
            storage,
            state: Mutex::new(SessionState {
                token,
                generation: 0,
            }),
            identity,
            timeout,
        }
    }

    /// Creates the store and, when a token was persisted, fetches the
    /// profile it belongs to
    #[tracing::instrument(skip(api, storage), fields(store = "session"))]
    pub async fn restore(api: A, storage: Arc<S>, timeout: Duration) -> Self {
        let store = Self::new(api, storage, timeout);
        if store.token().is_some() {
            store.fetch_profile().await;
        }
        store
    }

    #[tracing::instrument(skip(self, password), fields(store = "session"))]
    pub async fn login(&self, email: &str, password: &str) -> Result<User> {
        let credentials = Credentials::new(email.trim(), password);
        let generation = self.generation();
        let response = self
            .call(self.api.login(&credentials))
            .await
            .map_err(|e| {
                warn!(err = ?e, "login failed");
                e
            })?;
        self.establish(response, generation)
    }

    #[tracing::instrument(skip(self, password), fields(store = "session"))]
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<User> {
        let registration = Registration::new(name.trim(), email.trim(), password);
        let generation = self.generation();
        let response = self
            .call(self.api.register(&registration))
            .await
            .map_err(|e| {
                warn!(err = ?e, "registration failed");
                e
            })?;
        self.establish(response, generation)
    }

    /// Refreshes the current user from the API.
    ///
    /// This runs in the background of an existing session, so failures are
    /// logged and the current identity is kept as it is
    #[tracing::instrument(skip(self), fields(store = "session"))]
    pub async fn fetch_profile(&self) {
        let (token, generation) = match self.snapshot() {
            (Some(token), generation) => (token, generation),
            (None, _) => {
                debug!("no session token, skipping profile fetch");
                return;
            }
        };

        match self.call(self.api.get_profile(&token)).await {
            Ok(user) => {
                if self.adopt(user, generation).is_err() {
                    debug!("session changed during profile fetch, discarding result");
                } else {
                    debug!("profile refreshed");
                }
            }
            Err(e) => {
                error!(err = ?e, "failed to fetch profile, keeping current identity");
            }
        }
    }

    /// Sends the editable profile fields to the API and adopts the user it
    /// returns.
    ///
    /// Fails with `Unauthorized` before anything is sent if there's no
    /// session token, and with `SessionChanged` if the session ended while
    /// the request was in flight
    #[tracing::instrument(skip(self), fields(store = "session"))]
    pub async fn update_profile(&self, update: ProfileUpdate) -> Result<User> {
        let (token, generation) = match self.snapshot() {
            (Some(token), generation) => (token, generation),
            (None, _) => {
                warn!("attempted to update the profile without a session");
                return Err(FarmhubError::Unauthorized);
            }
        };
        let update = update.validate()?;
        let payload = update.into_payload(self.current_user().map(|u| u.id));

        match self.call(self.api.update_profile(&payload, &token)).await {
            Ok(user) => {
                self.adopt(user.clone(), generation).map_err(|e| {
                    warn!("session changed during profile update, discarding result");
                    e
                })?;
                info!(account = %user.id, "profile updated");
                Ok(user)
            }
            Err(e) => {
                error!(err = ?e, "failed to update profile");
                Err(e)
            }
        }
    }

    /// Forgets the user and the token, both in memory and in storage
    #[tracing::instrument(skip(self), fields(store = "session"))]
    pub fn logout(&self) {
        let mut state = self.lock_state();
        state.token = None;
        state.generation = state.generation.wrapping_add(1);
        if let Err(e) = self.storage.remove(TOKEN_KEY) {
            error!(err = ?e, "failed to remove persisted session token");
        }
        self.identity.send_replace(None);
        info!("logged out");
    }

    pub fn current_user(&self) -> Option<User> {
        self.identity.borrow().clone()
    }

    pub fn token(&self) -> Option<SessionToken> {
        self.lock_state().token.clone()
    }

    pub fn role(&self) -> Option<Role> {
        self.identity.borrow().as_ref().map(|u| u.role)
    }

    pub fn is_authenticated(&self) -> bool {
        self.lock_state().token.is_some() && self.identity.borrow().is_some()
    }

    /// Receiver that observes every identity change, `None` means anonymous
    pub fn subscribe(&self) -> watch::Receiver<Option<User>> {
        self.identity.subscribe()
    }
}

/// Private API
impl<A: ApiClient, S: KeyValueStore> SessionStore<A, S> {
    /// Bounds an API call by the configured timeout
    async fn call<T, F>(&self, request: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match tokio::time::timeout(self.timeout, request).await {
            Ok(result) => result,
            Err(_) => {
                warn!(timeout = ?self.timeout, "API request timed out");
                Err(FarmhubError::Timeout(self.timeout))
            }
        }
    }

    /// Starts a new session, unless another one started or ended since
    /// `generation` was read
    fn establish(&self, response: AuthResponse, generation: u64) -> Result<User> {
        let AuthResponse { token, user } = response;
        let mut state = self.lock_state();
        if state.generation != generation {
            warn!("session changed while authenticating, discarding response");
            return Err(FarmhubError::SessionChanged);
        }
        if let Err(e) = self.storage.set(TOKEN_KEY, &token) {
            // The session still works, it just won't survive a restart
            error!(err = ?e, "failed to persist session token");
        }
        state.token = Some(token);
        state.generation = state.generation.wrapping_add(1);
        info!(account = %user.id, role = %user.role.to_string(), "session established");
        self.identity.send_replace(Some(user.clone()));
        Ok(user)
    }

    /// Publishes a refreshed user for the session that requested it
    fn adopt(&self, user: User, generation: u64) -> Result<()> {
        let state = self.lock_state();
        if state.generation != generation || state.token.is_none() {
            return Err(FarmhubError::SessionChanged);
        }
        self.identity.send_replace(Some(user));
        Ok(())
    }

    fn generation(&self) -> u64 {
        self.lock_state().generation
    }

    fn snapshot(&self) -> (Option<SessionToken>, u64) {
        let state = self.lock_state();
        (state.token.clone(), state.generation)
    }

    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn read_persisted_token<S: KeyValueStore + ?Sized>(storage: &S) -> Option<SessionToken> {
    let raw = match storage.get(TOKEN_KEY) {
        Ok(raw) => raw?,
        Err(e) => {
            error!(err = ?e, "failed to read persisted session token");
            return None;
        }
    };
    match SessionToken::try_from(raw) {
        Ok(token) => Some(token),
        Err(e) => {
            warn!(err = ?e, "discarding unusable persisted session token");
            if let Err(e) = storage.remove(TOKEN_KEY) {
                error!(err = ?e, "failed to remove unusable session token");
            }
            None
        }
    }
}
