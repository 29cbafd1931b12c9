//! Authenticated HTTP client for the clinic REST API

use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::envelope::{decode_data, decode_error};
use crate::auth::context::Epoch;
use crate::auth::SessionContext;
use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::navigation::{self, Navigator};

/// How a request is authenticated
enum Auth {
    /// Bearer token read from the session at send time; 401 triggers global handling
    Session,
    /// Explicit token, 401 is returned to the caller untouched
    Token(String),
    /// No credentials at all
    Public,
}

struct ClientInner {
    http: reqwest::Client,
    base_url: Url,
    session: SessionContext,
    navigator: Arc<dyn Navigator>,
    redirect_lock: Mutex<()>,
}

/// Gateway every business request goes through
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

impl ApiClient {
    pub fn new(
        config: &ApiConfig,
        session: SessionContext,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self> {
        let base_url = Url::parse(config.base_url.trim_end_matches('/')).map_err(|e| {
            Error::Config(format!("Invalid api.base_url '{}': {}", config.base_url, e))
        })?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            inner: Arc::new(ClientInner {
                http,
                base_url,
                session,
                navigator,
                redirect_lock: Mutex::new(()),
            }),
        })
    }

    pub fn session(&self) -> &SessionContext {
        &self.inner.session
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.execute(Method::GET, path, &[], None, Auth::Session)
            .await
    }

    /// GET with query parameters; `None` values are left out
    pub async fn get_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, Option<String>)],
    ) -> Result<T> {
        let query: Vec<(&str, String)> = query
            .iter()
            .filter_map(|(k, v)| v.clone().map(|v| (*k, v)))
            .collect();
        self.execute(Method::GET, path, &query, None, Auth::Session)
            .await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let body = serde_json::to_value(body)?;
        self.execute(Method::POST, path, &[], Some(body), Auth::Session)
            .await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let body = serde_json::to_value(body)?;
        self.execute(Method::PUT, path, &[], Some(body), Auth::Session)
            .await
    }

    pub async fn delete(&self, path: &str) -> Result<()> {
        self.execute::<Value>(Method::DELETE, path, &[], None, Auth::Session)
            .await
            .map(|_| ())
    }

    /// Unauthenticated POST, used for login and registration
    pub(crate) async fn post_public<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let body = serde_json::to_value(body)?;
        self.execute(Method::POST, path, &[], Some(body), Auth::Public)
            .await
    }

    /// GET with a token that is not (yet) the session's, used while restoring
    pub(crate) async fn get_with_token<T: DeserializeOwned>(
        &self,
        path: &str,
        token: &str,
    ) -> Result<T> {
        self.execute(Method::GET, path, &[], None, Auth::Token(token.to_string()))
            .await
    }

    /// `endpoint/id` with `id` percent-encoded as one path segment
    pub(crate) fn item_path(&self, endpoint: &str, id: &str) -> Result<String> {
        let mut url = self.inner.base_url.clone();
        let base_len = url.path().trim_end_matches('/').len();
        url.path_segments_mut()
            .map_err(|_| {
                Error::Config(format!("api.base_url '{}' cannot take a path", self.inner.base_url))
            })?
            .pop_if_empty()
            .push(id);
        Ok(format!(
            "{}/{}",
            endpoint.trim_end_matches('/'),
            &url.path()[base_len + 1..]
        ))
    }

    fn url(&self, path: &str, query: &[(&str, String)]) -> Result<Url> {
        let joined = format!(
            "{}/{}",
            self.inner.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        let mut url = Url::parse(&joined)
            .map_err(|e| Error::Config(format!("Invalid request path '{}': {}", path, e)))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<Value>,
        auth: Auth,
    ) -> Result<T> {
        let url = self.url(path, query)?;
        let request_id = Uuid::new_v4();

        let mut request = self
            .inner
            .http
            .request(method.clone(), url)
            .header("X-Request-Id", request_id.to_string());

        // Epoch of the session whose token went out; a 401 only concerns that session
        let sent_with = match auth {
            Auth::Session => {
                let (token, epoch) = self.inner.session.token_at()?;
                if let Some(token) = token {
                    request = request.bearer_auth(token);
                }
                Some(epoch)
            }
            Auth::Token(token) => {
                request = request.bearer_auth(token);
                None
            }
            Auth::Public => None,
        };

        if let Some(body) = body {
            request = request.json(&body);
        }

        debug!(%method, path, %request_id, "api request");

        let response = request.send().await.map_err(|e| {
            warn!(%method, path, %request_id, "Request failed: {}", e);
            Error::Http(e)
        })?;

        let status = response.status();
        let bytes = response.bytes().await?;
        debug!(%method, path, %request_id, status = status.as_u16(), "api response");

        if status == StatusCode::UNAUTHORIZED {
            if let Some(epoch) = sent_with {
                self.handle_unauthorized(epoch);
                return Err(Error::Unauthorized);
            }
        }

        if !status.is_success() {
            return Err(decode_error(status, &bytes));
        }

        decode_data(&bytes)
    }

    /// Clear the session and send the user to the matching login page, once.
    /// A 401 for a session that has since been replaced or cleared changes nothing.
    fn handle_unauthorized(&self, sent_with: Epoch) {
        let _guard = self
            .inner
            .redirect_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let location = self.inner.navigator.location();
        let elevated = self.inner.session.is_elevated()
            || navigation::normalize(&location).starts_with("/super-admin");

        match self.inner.session.clear_if(sent_with) {
            Ok(true) => {}
            Ok(false) => {
                debug!(location = %location, "401 for a replaced session, ignoring");
                return;
            }
            Err(e) => warn!("Failed to clear persisted session after 401: {}", e),
        }

        if navigation::is_login_surface(&location) {
            debug!(location = %location, "401 on a login surface, not redirecting");
            return;
        }

        let target = navigation::login_surface(elevated);
        info!(from = %location, to = target, "Session rejected by server, redirecting to login");
        self.inner.navigator.navigate(target);
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish()
    }
}
