//! Helper condivisi dai test dei moduli

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Request, StatusCode, Uri};
use axum::response::Response;
use axum::Router;
use tower::ServiceExt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::auth::AuthResolver;
use crate::config::{AnonymousSettings, Environment};
use crate::db::api_keys::ApiKeyRecord;
use crate::db::{IdentityStore, SqliteStore, StoreError};
use crate::middleware::auth::AuthState;
use crate::middleware::context::RequestContext;
use crate::models::{Org, OrgRole, SignedInUser};
use crate::services::create_metrics;
use crate::session::{
    MemoryProvider, SessionData, SessionError, SessionManager, SessionOptions, SessionProvider,
    SessionStore, SESS_KEY_USERID,
};

pub const ADMIN_PASSWORD: &str = "admin-secret";

pub fn session_manager() -> Arc<SessionManager> {
    SessionManager::with_provider(Arc::new(MemoryProvider::new()), SessionOptions::default())
}

fn header_map(headers: &[(&str, &str)]) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        map.append(
            HeaderName::from_bytes(name.as_bytes()).unwrap(),
            HeaderValue::from_str(value).unwrap(),
        );
    }
    map
}

pub fn context_with_manager(
    manager: &Arc<SessionManager>,
    path: &str,
    headers: &[(&str, &str)],
) -> RequestContext {
    context_full(manager, path, headers, Environment::Development)
}

pub fn context_with_env(path: &str, headers: &[(&str, &str)], env: Environment) -> RequestContext {
    context_full(&session_manager(), path, headers, env)
}

pub fn context(path: &str, headers: &[(&str, &str)]) -> RequestContext {
    context_with_env(path, headers, Environment::Development)
}

fn context_full(
    manager: &Arc<SessionManager>,
    path: &str,
    headers: &[(&str, &str)],
    env: Environment,
) -> RequestContext {
    let uri: Uri = path.parse().unwrap();
    RequestContext::new(
        header_map(headers),
        uri,
        SessionStore::new(manager.clone()),
        env,
        create_metrics(),
    )
}

/// Salva una sessione con l'utente indicato e restituisce il valore dell'header `Cookie`
pub async fn session_cookie_for(manager: &Arc<SessionManager>, user_id: i64) -> String {
    let store = SessionStore::new(manager.clone());
    store.start(&HeaderMap::new()).await.unwrap();
    store.set(SESS_KEY_USERID, user_id).await.unwrap();
    let sid = store.id().await;
    store.release().await.unwrap();
    format!("{}={}", manager.options().cookie_name, sid)
}

/// Applicazione completa su database SQLite in memoria
pub struct TestApp {
    pub router: Router,
}

pub async fn app(anonymous: bool) -> TestApp {
    let db = crate::db::init_memory_db().await.unwrap();
    crate::db::ensure_initial_setup(&db, "Main Org.", "admin", Some(ADMIN_PASSWORD))
        .await
        .unwrap();

    let resolver = AuthResolver::new(
        Arc::new(SqliteStore::new(db.clone())),
        AnonymousSettings {
            enabled: anonymous,
            org_name: "Main Org.".to_string(),
            org_role: OrgRole::Viewer,
        },
    );
    let state = AuthState {
        resolver: Arc::new(resolver),
        sessions: session_manager(),
        metrics: create_metrics(),
        environment: Environment::Development,
    };

    TestApp {
        router: crate::routes::create_router(db, state),
    }
}

impl TestApp {
    /// Login come admin, restituisce il valore dell'header `Cookie`
    pub async fn login_admin(&self) -> String {
        let response = self
            .router
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/v1/login",
                &[],
                serde_json::json!({ "user": "admin", "password": ADMIN_PASSWORD }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        cookie_pair(&response)
    }
}

pub fn get_request(uri: &str, headers: &[(&str, &str)]) -> Request<Body> {
    let mut builder = Request::get(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn json_request(
    method: &str,
    uri: &str,
    headers: &[(&str, &str)],
    body: serde_json::Value,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

/// Coppia `nome=valore` dal `Set-Cookie` della risposta
pub fn cookie_pair(response: &Response) -> String {
    let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    set_cookie.split(';').next().unwrap().to_string()
}

/// Archivio in memoria che conta le interrogazioni ricevute
#[derive(Default)]
pub struct MemoryStore {
    pub orgs: Vec<Org>,
    pub users: Vec<SignedInUser>,
    pub api_keys: Vec<ApiKeyRecord>,
    /// Tutte le query falliscono con un errore di database
    pub fail_all: bool,
    pub org_calls: AtomicUsize,
    pub user_calls: AtomicUsize,
    pub api_key_calls: AtomicUsize,
    pub touch_calls: AtomicUsize,
}

impl MemoryStore {
    pub fn with_users(users: Vec<SignedInUser>) -> Self {
        Self {
            users,
            ..Default::default()
        }
    }

    pub fn org_lookups(&self) -> usize {
        self.org_calls.load(Ordering::SeqCst)
    }

    pub fn user_lookups(&self) -> usize {
        self.user_calls.load(Ordering::SeqCst)
    }

    pub fn api_key_lookups(&self) -> usize {
        self.api_key_calls.load(Ordering::SeqCst)
    }

    pub fn api_key_touches(&self) -> usize {
        self.touch_calls.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.fail_all {
            Err(StoreError::Database(sqlx::Error::PoolTimedOut))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl IdentityStore for MemoryStore {
    async fn get_org_by_name(&self, name: &str) -> Result<Org, StoreError> {
        self.org_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.orgs
            .iter()
            .find(|org| org.name == name)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(name.to_string()))
    }

    async fn get_signed_in_user(&self, user_id: i64) -> Result<SignedInUser, StoreError> {
        self.user_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.users
            .iter()
            .find(|user| user.user_id == user_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(user_id.to_string()))
    }

    async fn get_api_key_by_name(
        &self,
        name: &str,
        org_id: i64,
    ) -> Result<ApiKeyRecord, StoreError> {
        self.api_key_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.api_keys
            .iter()
            .find(|key| key.name == name && key.org_id == org_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(name.to_string()))
    }

    async fn touch_api_key(&self, _id: i64) -> Result<(), StoreError> {
        self.touch_calls.fetch_add(1, Ordering::SeqCst);
        self.check()
    }
}

/// Provider di sessione che fallisce sempre
pub struct FailingProvider;

#[async_trait]
impl SessionProvider for FailingProvider {
    fn name(&self) -> &'static str {
        "failing"
    }

    async fn read(&self, _sid: &str) -> Result<SessionData, SessionError> {
        Err(SessionError::Database(sqlx::Error::PoolClosed))
    }

    async fn exists(&self, _sid: &str) -> Result<bool, SessionError> {
        Err(SessionError::Database(sqlx::Error::PoolClosed))
    }

    async fn write(&self, _sid: &str, _data: &SessionData) -> Result<(), SessionError> {
        Err(SessionError::Database(sqlx::Error::PoolClosed))
    }

    async fn destroy(&self, _sid: &str) -> Result<(), SessionError> {
        Err(SessionError::Database(sqlx::Error::PoolClosed))
    }

    async fn gc(&self, _max_lifetime: Duration) -> Result<u64, SessionError> {
        Err(SessionError::Database(sqlx::Error::PoolClosed))
    }
}
