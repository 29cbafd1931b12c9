//! Composition root: wires config, storage, session, API client and gate

use std::sync::Arc;

use crate::api::ApiClient;
use crate::auth::{FileStorage, SessionContext, SessionStorage, SessionStore};
use crate::config::Config;
use crate::error::Result;
use crate::gate::{RoleGate, RouteTable};
use crate::navigation::Navigator;
use crate::resources::{ListQuery, ListScreen, Resource, ResourceApi};

/// Everything a client of the clinic API needs, built once per run
#[derive(Clone)]
pub struct Portal {
    pub config: Config,
    pub session: SessionContext,
    pub api: ApiClient,
    pub auth: SessionStore,
    pub gate: RoleGate,
    navigator: Arc<dyn Navigator>,
}

impl Portal {
    pub fn new(
        config: Config,
        storage: Arc<dyn SessionStorage>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self> {
        let session = SessionContext::new(storage);
        let api = ApiClient::new(&config.api, session.clone(), Arc::clone(&navigator))?;
        let auth = SessionStore::new(api.clone());
        let gate = RoleGate::new(
            RouteTable::clinic_portal(),
            session.clone(),
            Arc::clone(&navigator),
        );

        Ok(Self {
            config,
            session,
            api,
            auth,
            gate,
            navigator,
        })
    }

    /// Portal persisting its session to `storage.session_file`
    pub fn from_config(config: Config, navigator: Arc<dyn Navigator>) -> Result<Self> {
        let storage = Arc::new(FileStorage::new(config.storage.session_file.clone()));
        Self::new(config, storage, navigator)
    }

    pub fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.navigator
    }

    pub fn resources<R: Resource>(&self) -> ResourceApi<R> {
        ResourceApi::new(self.api.clone())
    }

    pub fn list_screen<R: Resource>(&self, query: ListQuery) -> ListScreen<R> {
        ListScreen::mount(self.resources(), query)
    }
}

impl std::fmt::Debug for Portal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Portal")
            .field("config", &self.config)
            .field("session", &self.session)
            .finish()
    }
}
