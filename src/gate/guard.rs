//! Per-visit guard
//!
//! A [`PageVisit`] starts in `Checking`, waits for the session to resolve, and
//! then settles on `Allowed` or a denial. Denials navigate away exactly once per
//! transition. The protected content is only reachable through
//! [`PageVisit::render`], which yields nothing unless the visit is `Allowed`.

use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

use crate::auth::{SessionContext, SessionState};
use crate::gate::machine::{evaluate, GateState};
use crate::gate::routes::{Access, RouteRule, RouteTable};
use crate::navigation::{self, Navigator};

/// Entry point for page visits
#[derive(Clone)]
pub struct RoleGate {
    routes: Arc<RouteTable>,
    session: SessionContext,
    navigator: Arc<dyn Navigator>,
}

impl RoleGate {
    pub fn new(routes: RouteTable, session: SessionContext, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            routes: Arc::new(routes),
            session,
            navigator,
        }
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Decision for `path` against the current snapshot, without side effects
    pub fn check(&self, path: &str) -> GateState {
        evaluate(path, self.routes.rule_for(path), &self.session.state())
    }

    /// Begin a visit. The visit is always `Checking` until resolved.
    pub fn visit(&self, path: &str) -> PageVisit {
        let path = navigation::normalize(path).to_string();
        let rule = self.routes.rule_for(&path).clone();
        debug!(path = %path, "page visit");
        PageVisit {
            path,
            rule,
            session: self.session.subscribe(),
            navigator: Arc::clone(&self.navigator),
            state: GateState::Checking,
        }
    }

    /// Where `/` sends the current session
    pub fn landing_route(&self) -> &'static str {
        match self.session.session() {
            Some(session) => session.role().home_route(),
            None => navigation::LOGIN,
        }
    }
}

impl std::fmt::Debug for RoleGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoleGate").field("routes", &self.routes).finish()
    }
}

pub struct PageVisit {
    path: String,
    rule: RouteRule,
    session: watch::Receiver<SessionState>,
    navigator: Arc<dyn Navigator>,
    state: GateState,
}

impl PageVisit {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn state(&self) -> &GateState {
        &self.state
    }

    /// Wait for the session to resolve and settle the visit.
    ///
    /// Public routes settle immediately. If the session context goes away before
    /// resolving, the visit stays `Checking`.
    pub async fn resolve(&mut self) -> &GateState {
        if self.rule.access == Access::Public {
            return self.refresh();
        }

        let resolved = self
            .session
            .wait_for(SessionState::is_resolved)
            .await
            .map(|state| (*state).clone());
        let snapshot = match resolved {
            Ok(state) => state,
            Err(_) => self.session.borrow().clone(),
        };
        self.apply(&snapshot);
        &self.state
    }

    /// Wait for the next session change and re-evaluate. Returns `None` once the
    /// session context is gone.
    pub async fn changed(&mut self) -> Option<&GateState> {
        self.session.changed().await.ok()?;
        let snapshot = self.session.borrow_and_update().clone();
        self.apply(&snapshot);
        Some(&self.state)
    }

    /// Re-evaluate against whatever the session is right now, without waiting
    pub fn refresh(&mut self) -> &GateState {
        let snapshot = self.session.borrow_and_update().clone();
        self.apply(&snapshot);
        &self.state
    }

    /// Produce the protected content, only when allowed
    pub fn render<T>(&self, content: impl FnOnce() -> T) -> Option<T> {
        if self.state.is_allowed() {
            Some(content())
        } else {
            None
        }
    }

    fn apply(&mut self, snapshot: &SessionState) {
        let next = evaluate(&self.path, &self.rule, snapshot);
        if next == self.state {
            return;
        }

        debug!(path = %self.path, from = self.state.label(), to = next.label(), "gate transition");
        if let Some(target) = next.redirect_target() {
            // The API client may already have sent the user there after a 401
            if navigation::normalize(&self.navigator.location()) == target {
                debug!(path = %self.path, to = target, "already at redirect target");
            } else {
                self.navigator.navigate(target);
            }
        }
        self.state = next;
    }
}

impl std::fmt::Debug for PageVisit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageVisit")
            .field("path", &self.path)
            .field("state", &self.state)
            .finish()
    }
}
