//! Shared session state
//!
//! [`SessionContext`] is the one piece of cross-component mutable state. Readers
//! (the role gate, list screens, the CLI) get snapshots or a `watch` receiver.
//! Writers are crate-private and go through a single commit path, so every change
//! is persisted and published as one transition.

use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;

use crate::auth::models::Session;
use crate::auth::storage::{PersistedSession, SessionStorage};
use crate::error::{Error, Result};

/// Resolution state of the session
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// Not resolved yet since start-up
    Resolving,
    Anonymous,
    Authenticated(Session),
}

impl SessionState {
    pub fn is_resolved(&self) -> bool {
        !matches!(self, SessionState::Resolving)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }

    pub fn session(&self) -> Option<&Session> {
        match self {
            SessionState::Authenticated(session) => Some(session),
            _ => None,
        }
    }
}

/// Marker of the last committed write; stale markers cannot commit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Epoch(u64);

struct Inner {
    storage: Arc<dyn SessionStorage>,
    state: watch::Sender<SessionState>,
    epoch: Mutex<u64>,
}

/// Handle to the session shared by the store, the API client and the gate
#[derive(Clone)]
pub struct SessionContext {
    inner: Arc<Inner>,
}

impl SessionContext {
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        let (state, _) = watch::channel(SessionState::Resolving);
        Self {
            inner: Arc::new(Inner {
                storage,
                state,
                epoch: Mutex::new(0),
            }),
        }
    }

    /// Current state snapshot
    pub fn state(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    pub fn session(&self) -> Option<Session> {
        self.inner.state.borrow().session().cloned()
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.state.borrow().is_authenticated()
    }

    /// Bearer token as of right now
    pub fn token(&self) -> Option<String> {
        self.inner
            .state
            .borrow()
            .session()
            .map(|s| s.token.clone())
    }

    pub fn is_elevated(&self) -> bool {
        self.inner
            .state
            .borrow()
            .session()
            .is_some_and(|s| s.elevated)
    }

    pub fn clinic_id(&self) -> Option<String> {
        self.inner
            .state
            .borrow()
            .session()
            .and_then(|s| s.clinic_id.clone())
    }

    /// Receiver notified on every committed transition
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    pub(crate) fn epoch(&self) -> Result<Epoch> {
        Ok(Epoch(*self.lock_epoch()?))
    }

    /// Token and the epoch it belongs to, read under the same lock
    pub(crate) fn token_at(&self) -> Result<(Option<String>, Epoch)> {
        let epoch = self.lock_epoch()?;
        Ok((self.token(), Epoch(*epoch)))
    }

    pub(crate) fn load_persisted(&self) -> Result<PersistedSession> {
        self.inner.storage.load()
    }

    /// Persist then publish an authenticated session.
    /// Nothing is published if the write fails.
    pub(crate) fn establish(&self, session: Session) -> Result<()> {
        let mut epoch = self.lock_epoch()?;
        self.commit_session(&mut epoch, session)
    }

    /// Same as [`establish`](Self::establish) unless another write landed after `since`
    pub(crate) fn establish_if(&self, since: Epoch, session: Session) -> Result<bool> {
        let mut epoch = self.lock_epoch()?;
        if *epoch != since.0 {
            tracing::warn!("Discarding restored session: session changed while it was in flight");
            return Ok(false);
        }
        self.commit_session(&mut epoch, session)?;
        Ok(true)
    }

    /// Drop the session from memory and storage. Memory is cleared even if the
    /// storage write fails, so protected checks never see a half-cleared session.
    pub(crate) fn clear(&self) -> Result<()> {
        let mut epoch = self.lock_epoch()?;
        self.commit_clear(&mut epoch)
    }

    pub(crate) fn clear_if(&self, since: Epoch) -> Result<bool> {
        let mut epoch = self.lock_epoch()?;
        if *epoch != since.0 {
            return Ok(false);
        }
        self.commit_clear(&mut epoch)?;
        Ok(true)
    }

    /// Mark the session resolved without touching storage
    pub(crate) fn resolve_anonymous_if(&self, since: Epoch) -> Result<bool> {
        let mut epoch = self.lock_epoch()?;
        if *epoch != since.0 {
            return Ok(false);
        }
        *epoch += 1;
        self.inner.state.send_replace(SessionState::Anonymous);
        Ok(true)
    }

    /// Apply `update` to the current session, persisting the result
    pub(crate) fn update_session<F>(&self, update: F) -> Result<Session>
    where
        F: FnOnce(&mut Session),
    {
        let mut epoch = self.lock_epoch()?;
        let mut session = self.session().ok_or(Error::NotAuthenticated)?;
        update(&mut session);
        self.commit_session(&mut epoch, session.clone())?;
        Ok(session)
    }

    fn commit_session(&self, epoch: &mut MutexGuard<'_, u64>, session: Session) -> Result<()> {
        self.inner.storage.store(&PersistedSession::from(&session))?;
        **epoch += 1;
        tracing::debug!(user = %session.user.username, role = %session.role(), "session established");
        self.inner
            .state
            .send_replace(SessionState::Authenticated(session));
        Ok(())
    }

    fn commit_clear(&self, epoch: &mut MutexGuard<'_, u64>) -> Result<()> {
        **epoch += 1;
        let previous = self.inner.state.send_replace(SessionState::Anonymous);
        if previous.is_authenticated() {
            tracing::debug!("session cleared");
        }
        self.inner.storage.clear()
    }

    fn lock_epoch(&self) -> Result<MutexGuard<'_, u64>> {
        self.inner
            .epoch
            .lock()
            .map_err(|e| Error::Storage(format!("session lock poisoned: {}", e)))
    }
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("state", &*self.inner.state.borrow())
            .finish()
    }
}
