//! Gate decision for a single page visit

use crate::auth::SessionState;
use crate::gate::routes::{Access, RouteRule};
use crate::navigation::{self, ROOT};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateState {
    /// Session not resolved yet; show a neutral loader
    Checking,
    DeniedUnauthenticated { redirect: String },
    DeniedWrongRole { redirect: String },
    Allowed,
}

impl GateState {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GateState::Allowed)
    }

    pub fn is_denied(&self) -> bool {
        self.redirect_target().is_some()
    }

    pub fn redirect_target(&self) -> Option<&str> {
        match self {
            GateState::DeniedUnauthenticated { redirect }
            | GateState::DeniedWrongRole { redirect } => Some(redirect),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            GateState::Checking => "CHECKING",
            GateState::DeniedUnauthenticated { .. } => "DENIED_UNAUTHENTICATED",
            GateState::DeniedWrongRole { .. } => "DENIED_WRONG_ROLE",
            GateState::Allowed => "ALLOWED",
        }
    }
}

/// The only place a gate outcome is computed
pub fn evaluate(path: &str, rule: &RouteRule, session: &SessionState) -> GateState {
    if rule.access == Access::Public {
        return GateState::Allowed;
    }

    match session {
        SessionState::Resolving => GateState::Checking,
        SessionState::Anonymous => GateState::DeniedUnauthenticated {
            redirect: rule.login_route.to_string(),
        },
        SessionState::Authenticated(session) => {
            if rule.access.permits(session.role()) {
                GateState::Allowed
            } else {
                GateState::DeniedWrongRole {
                    redirect: wrong_role_redirect(path, session.role().home_route()),
                }
            }
        }
    }
}

fn wrong_role_redirect(path: &str, home: &'static str) -> String {
    if navigation::normalize(path) == home {
        ROOT.to_string()
    } else {
        home.to_string()
    }
}
