//! Session lifecycle: login, logout, restore

use tracing::{debug, info, warn};

use crate::api::ApiClient;
use crate::auth::context::{SessionContext, SessionState};
use crate::auth::jwt;
use crate::auth::models::{Credentials, LoginResponse, Registration, Role, Session, UserProfile};
use crate::error::{Error, Result};
use crate::resources::Validate;

const LOGIN_PATH: &str = "/auth/login";
const REGISTER_PATH: &str = "/auth/register";
const PROFILE_PATH: &str = "/auth/me";
const SUPER_ADMIN_LOGIN_PATH: &str = "/super-admin/auth/login";
const SUPER_ADMIN_PROFILE_PATH: &str = "/super-admin/auth/me";

fn profile_path(elevated: bool) -> &'static str {
    if elevated {
        SUPER_ADMIN_PROFILE_PATH
    } else {
        PROFILE_PATH
    }
}

/// Operations on the current session
#[derive(Clone, Debug)]
pub struct SessionStore {
    context: SessionContext,
    api: ApiClient,
}

impl SessionStore {
    pub fn new(api: ApiClient) -> Self {
        Self {
            context: api.session().clone(),
            api,
        }
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    /// Current session, if any
    pub fn get_session(&self) -> Option<Session> {
        self.context.session()
    }

    /// Authenticate with email and password
    pub async fn login(&self, credentials: &Credentials) -> Result<Session> {
        self.authenticate(LOGIN_PATH, credentials, false).await
    }

    /// Authenticate through the super-admin surface
    pub async fn login_super_admin(&self, credentials: &Credentials) -> Result<Session> {
        self.authenticate(SUPER_ADMIN_LOGIN_PATH, credentials, true)
            .await
    }

    async fn authenticate(
        &self,
        path: &str,
        credentials: &Credentials,
        elevated: bool,
    ) -> Result<Session> {
        credentials.validate()?;

        let response: LoginResponse = self
            .api
            .post_public(path, &credentials.to_request())
            .await?;

        if elevated && response.user.role != Role::SuperAdmin {
            warn!(user = %response.user.username, "Non super-admin account used on the super-admin login");
            return Err(Error::Forbidden(
                "this login is reserved for super administrators".to_string(),
            ));
        }

        let session = Session::new(response.user, response.token, elevated);
        self.context.establish(session.clone())?;

        info!(user = %session.username(), role = %session.role(), "Logged in");
        Ok(session)
    }

    /// Create an account and log into it
    pub async fn register(&self, registration: &Registration) -> Result<Session> {
        registration.validate()?;

        let response: LoginResponse = self
            .api
            .post_public(REGISTER_PATH, &registration.to_request())
            .await?;

        let session = Session::new(response.user, response.token, false);
        self.context.establish(session.clone())?;

        info!(user = %session.username(), "Registered and logged in");
        Ok(session)
    }

    /// Forget the session locally. Calling it again has no further effect.
    pub fn logout(&self) -> Result<()> {
        let was_authenticated = self.context.is_authenticated();
        self.context.clear()?;
        if was_authenticated {
            info!("Logged out");
        }
        Ok(())
    }

    /// Resolve the session left behind by a previous run.
    ///
    /// Commits exactly one transition out of `Resolving`. If a login or logout
    /// happens while the profile fetch is in flight, that newer state wins and the
    /// restore result is dropped.
    pub async fn restore_session(&self) -> Result<SessionState> {
        let epoch = self.context.epoch()?;

        let persisted = match self.context.load_persisted() {
            Ok(persisted) => persisted,
            Err(e) => {
                warn!("Discarding unreadable session record: {}", e);
                self.context.clear_if(epoch)?;
                return Ok(self.context.state());
            }
        };

        let Some(token) = persisted.token.clone() else {
            debug!("No stored session");
            self.context.resolve_anonymous_if(epoch)?;
            return Ok(self.context.state());
        };

        if jwt::is_expired(&token) {
            info!("Stored token has expired, discarding session");
            self.context.clear_if(epoch)?;
            return Ok(self.context.state());
        }

        let elevated = persisted.is_super_admin;
        match self
            .api
            .get_with_token::<UserProfile>(profile_path(elevated), &token)
            .await
        {
            Ok(user) => {
                let mut session = Session::new(user, token, elevated);
                if persisted.selected_clinic_id.is_some() {
                    session.clinic_id = persisted.selected_clinic_id;
                }
                if self.context.establish_if(epoch, session)? {
                    info!("Session restored");
                }
            }
            Err(e) if e.is_auth_failure() => {
                info!("Stored session rejected by server, discarding");
                self.context.clear_if(epoch)?;
            }
            Err(e) => {
                warn!("Could not verify stored session: {}", e);
                self.context.resolve_anonymous_if(epoch)?;
                return Err(e);
            }
        }

        Ok(self.context.state())
    }

    /// Re-read the profile of the logged-in user
    pub async fn refresh_profile(&self) -> Result<Session> {
        let elevated = self.context.is_elevated();
        if !self.context.is_authenticated() {
            return Err(Error::NotAuthenticated);
        }

        let user: UserProfile = self.api.get(profile_path(elevated)).await?;
        self.context.update_session(|session| session.user = user)
    }

    /// Scope the session to a clinic, or back to the user's own with `None`
    pub fn select_clinic(&self, clinic_id: Option<String>) -> Result<Session> {
        self.context.update_session(|session| {
            session.clinic_id = clinic_id.or_else(|| session.user.clinic_id.clone());
        })
    }
}
