//! Mock clinic backend for integration tests
//!
//! Serves the auth and patient endpoints on an ephemeral port, issues real JWTs
//! and records what each request carried.

#![allow(dead_code)]

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clinic_portal::auth::{MemoryStorage, PersistedSession, SessionStorage};
use clinic_portal::config::{ApiConfig, Config};
use clinic_portal::navigation::MemoryNavigator;
use clinic_portal::Portal;

pub const PASSWORD: &str = "password123";
pub const ADMIN: &str = "admin@clinic.test";
pub const DOCTOR: &str = "doctor@clinic.test";
pub const SECRETARY: &str = "secretary@clinic.test";
pub const ROOT_USER: &str = "root@clinic.test";

const SIGNING_KEY: &[u8] = b"mock-backend-secret";

/// One request as the backend saw it
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
    pub request_id: Option<String>,
    pub query: HashMap<String, String>,
}

#[derive(Default)]
pub struct MockState {
    users: Mutex<Vec<(String, Value)>>,
    tokens: Mutex<HashMap<String, Value>>,
    patients: Mutex<Vec<Value>>,
    seen: Mutex<Vec<SeenRequest>>,
    list_delays: Mutex<VecDeque<u64>>,
    list_failures: AtomicU64,
    profile_delay_ms: AtomicU64,
    counter: AtomicU64,
}

impl MockState {
    fn record(&self, method: &str, path: &str, headers: &HeaderMap, query: HashMap<String, String>) {
        let header_value = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        self.seen.lock().unwrap().push(SeenRequest {
            method: method.to_string(),
            path: path.to_string(),
            authorization: header_value(header::AUTHORIZATION.as_str()),
            request_id: header_value("x-request-id"),
            query,
        });
    }

    fn authorize(&self, headers: &HeaderMap) -> Option<Value> {
        let token = headers
            .get(header::AUTHORIZATION)?
            .to_str()
            .ok()?
            .strip_prefix("Bearer ")?
            .to_string();
        self.tokens.lock().unwrap().get(&token).cloned()
    }

    fn issue_token(&self, user: &Value) -> String {
        let jti = self.counter.fetch_add(1, Ordering::SeqCst);
        let token = mint_token(user["id"].as_str().unwrap_or_default(), 3600, jti);
        self.tokens
            .lock()
            .unwrap()
            .insert(token.clone(), user.clone());
        token
    }

    fn next_id(&self, prefix: &str) -> String {
        format!("{}{}", prefix, self.counter.fetch_add(1, Ordering::SeqCst))
    }
}

pub struct MockBackend {
    pub base_url: String,
    pub state: Arc<MockState>,
    handle: tokio::task::JoinHandle<()>,
}

impl MockBackend {
    pub async fn spawn() -> Self {
        let state = Arc::new(MockState::default());
        seed(&state);

        let app = Router::new()
            .route("/api/auth/login", post(login))
            .route("/api/auth/register", post(register))
            .route("/api/auth/me", get(profile))
            .route("/api/super-admin/auth/login", post(login))
            .route("/api/super-admin/auth/me", get(profile))
            .route("/api/patients", get(list_patients).post(create_patient))
            .route(
                "/api/patients/{id}",
                get(get_patient).put(update_patient).delete(delete_patient),
            )
            .route("/api/failing", get(failing))
            .route("/api/forbidden", get(forbidden))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock backend");
        let addr = listener.local_addr().expect("mock backend address");
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            base_url: format!("http://{}/api", addr),
            state,
            handle,
        }
    }

    pub fn config(&self) -> Config {
        config_for(&self.base_url)
    }

    /// Portal over in-memory storage, starting at `start`
    pub fn portal(&self, start: &str) -> (Portal, Arc<MemoryNavigator>, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        let (portal, navigator) = self.portal_with(storage.clone(), start);
        (portal, navigator, storage)
    }

    pub fn portal_with(
        &self,
        storage: Arc<dyn SessionStorage>,
        start: &str,
    ) -> (Portal, Arc<MemoryNavigator>) {
        let navigator = Arc::new(MemoryNavigator::new(start));
        let portal = Portal::new(self.config(), storage, navigator.clone()).expect("portal");
        (portal, navigator)
    }

    /// A valid token for a seeded user, without going through a client
    pub fn token_for(&self, email: &str) -> String {
        let user = self.user(email);
        self.state.issue_token(&user)
    }

    pub fn user(&self, email: &str) -> Value {
        self.state
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|(_, user)| user["email"] == email)
            .map(|(_, user)| user.clone())
            .expect("seeded user")
    }

    /// Persisted record holding a fresh token for `email`
    pub fn persisted(&self, email: &str, elevated: bool) -> PersistedSession {
        PersistedSession {
            token: Some(self.token_for(email)),
            is_super_admin: elevated,
            selected_clinic_id: None,
            user: None,
        }
    }

    /// Invalidate every issued token
    pub fn revoke_all(&self) {
        self.state.tokens.lock().unwrap().clear();
    }

    pub fn set_profile_delay(&self, delay: Duration) {
        self.state
            .profile_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// Delays applied to the next list requests, in order
    pub fn queue_list_delays(&self, delays: &[u64]) {
        self.state.list_delays.lock().unwrap().extend(delays);
    }

    /// Answer the next `count` patient lists with a 500
    pub fn fail_next_lists(&self, count: u64) {
        self.state.list_failures.store(count, Ordering::SeqCst);
    }

    pub fn add_patient(&self, first_name: &str, last_name: &str) -> String {
        let id = self.state.next_id("p");
        self.state.patients.lock().unwrap().push(json!({
            "id": id,
            "firstName": first_name,
            "lastName": last_name,
            "phone": "555-0100",
            "clinicId": "c1",
        }));
        id
    }

    pub fn patient_count(&self) -> usize {
        self.state.patients.lock().unwrap().len()
    }

    pub fn seen(&self) -> Vec<SeenRequest> {
        self.state.seen.lock().unwrap().clone()
    }

    pub fn seen_on(&self, method: &str, path: &str) -> Vec<SeenRequest> {
        self.seen()
            .into_iter()
            .filter(|r| r.method == method && r.path == path)
            .collect()
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub fn config_for(base_url: &str) -> Config {
    Config {
        api: ApiConfig {
            base_url: base_url.to_string(),
            timeout_secs: 5,
        },
        ..Config::default()
    }
}

/// JWT signed with the backend key, expiring `ttl_secs` from now (negative for
/// an already expired token)
pub fn mint_token(sub: &str, ttl_secs: i64, jti: u64) -> String {
    let now = chrono::Utc::now().timestamp();
    let claims = json!({
        "sub": sub,
        "iat": now,
        "exp": now + ttl_secs,
        "jti": jti,
    });
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SIGNING_KEY),
    )
    .expect("mint token")
}

/// Base URL nothing listens on
pub async fn unreachable_base_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/api", addr)
}

fn seed(state: &MockState) {
    let user = |id: &str, username: &str, email: &str, role: &str, clinic: Option<&str>| {
        (
            PASSWORD.to_string(),
            json!({
                "id": id,
                "username": username,
                "email": email,
                "role": role,
                "clinicId": clinic,
            }),
        )
    };

    let mut users = state.users.lock().unwrap();
    users.push(user("u1", "ada", ADMIN, "ADMIN", Some("c1")));
    users.push(user("u2", "drhouse", DOCTOR, "DOCTOR", Some("c1")));
    users.push(user("u3", "pam", SECRETARY, "SECRETARY", Some("c1")));
    users.push(user("u4", "root", ROOT_USER, "SUPER_ADMIN", None));
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "message": "Invalid or expired token" })),
    )
        .into_response()
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "message": "Patient not found" }))).into_response()
}

async fn login(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.record("POST", "/auth/login", &headers, HashMap::new());

    let found = state
        .users
        .lock()
        .unwrap()
        .iter()
        .find(|(password, user)| user["email"] == body["email"] && *password == body["password"])
        .map(|(_, user)| user.clone());

    match found {
        Some(user) => {
            let token = state.issue_token(&user);
            Json(json!({ "data": { "token": token, "user": user } })).into_response()
        }
        None => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Invalid email or password" })),
        )
            .into_response(),
    }
}

async fn register(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.record("POST", "/auth/register", &headers, HashMap::new());

    let user = json!({
        "id": state.next_id("u"),
        "username": body["username"],
        "email": body["email"],
        "role": "USER",
        "clinicId": null,
    });
    let password = body["password"].as_str().unwrap_or_default().to_string();
    state.users.lock().unwrap().push((password, user.clone()));

    let token = state.issue_token(&user);
    (
        StatusCode::CREATED,
        Json(json!({ "data": { "token": token, "user": user } })),
    )
        .into_response()
}

async fn profile(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    state.record("GET", "/auth/me", &headers, HashMap::new());

    let delay = state.profile_delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }

    match state.authorize(&headers) {
        Some(user) => Json(json!({ "data": user })).into_response(),
        None => unauthorized(),
    }
}

async fn list_patients(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    state.record("GET", "/patients", &headers, query.clone());

    let delay = state.list_delays.lock().unwrap().pop_front().unwrap_or(0);
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }

    if state.authorize(&headers).is_none() {
        return unauthorized();
    }

    let failing = state
        .list_failures
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok();
    if failing {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": "Database unavailable" })),
        )
            .into_response();
    }

    let search = query.get("search").map(|s| s.to_lowercase());
    let patients: Vec<Value> = state
        .patients
        .lock()
        .unwrap()
        .iter()
        .filter(|p| match &search {
            Some(term) => p["firstName"]
                .as_str()
                .unwrap_or_default()
                .to_lowercase()
                .contains(term.as_str()),
            None => true,
        })
        .cloned()
        .collect();

    Json(json!({ "data": patients })).into_response()
}

async fn create_patient(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(mut body): Json<Value>,
) -> Response {
    state.record("POST", "/patients", &headers, HashMap::new());
    if state.authorize(&headers).is_none() {
        return unauthorized();
    }

    body["id"] = json!(state.next_id("p"));
    state.patients.lock().unwrap().push(body.clone());
    (StatusCode::CREATED, Json(json!({ "data": body }))).into_response()
}

async fn get_patient(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    state.record("GET", &format!("/patients/{}", id), &headers, HashMap::new());
    if state.authorize(&headers).is_none() {
        return unauthorized();
    }

    let found = state
        .patients
        .lock()
        .unwrap()
        .iter()
        .find(|p| p["id"] == id)
        .cloned();
    match found {
        Some(patient) => Json(json!({ "data": patient })).into_response(),
        None => not_found(),
    }
}

async fn update_patient(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(mut body): Json<Value>,
) -> Response {
    state.record("PUT", &format!("/patients/{}", id), &headers, HashMap::new());
    if state.authorize(&headers).is_none() {
        return unauthorized();
    }

    let mut patients = state.patients.lock().unwrap();
    match patients.iter_mut().find(|p| p["id"] == id) {
        Some(patient) => {
            body["id"] = json!(id);
            *patient = body.clone();
            Json(json!({ "data": body })).into_response()
        }
        None => not_found(),
    }
}

async fn delete_patient(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    state.record("DELETE", &format!("/patients/{}", id), &headers, HashMap::new());
    if state.authorize(&headers).is_none() {
        return unauthorized();
    }

    let mut patients = state.patients.lock().unwrap();
    let before = patients.len();
    patients.retain(|p| p["id"] != id);
    if patients.len() == before {
        return not_found();
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn failing(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    state.record("GET", "/failing", &headers, HashMap::new());
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "message": "Database unavailable" })),
    )
        .into_response()
}

async fn forbidden(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    state.record("GET", "/forbidden", &headers, HashMap::new());
    (
        StatusCode::FORBIDDEN,
        Json(json!({ "error": "Insufficient permissions" })),
    )
        .into_response()
}
