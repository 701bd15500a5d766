use std::net::SocketAddr;
use std::sync::Arc;

use axum::{routing::get, Json, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;

use authgate::auth::AuthResolver;
use authgate::config::Config;
use authgate::db::{self, api_keys::ApiKeyRecord, SqliteStore};
use authgate::middleware::auth::AuthState;
use authgate::models::*;
use authgate::routes;
use authgate::services::{create_metrics, MetricsSnapshot};
use authgate::session::SessionManager;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Authgate API",
        version = "0.1.0",
        description = "Risoluzione dell'identità per richiesta (API Key, sessione, anonimo) e gestione delle sessioni",
        license(name = "MIT"),
    ),
    paths(
        authgate::routes::health::health_check,
        authgate::routes::health::get_metrics,
        authgate::routes::auth::login,
        authgate::routes::auth::logout,
        authgate::routes::auth::get_current_user,
        authgate::routes::admin::list_api_keys,
        authgate::routes::admin::create_api_key,
        authgate::routes::admin::delete_api_key,
    ),
    components(schemas(
        HealthResponse,
        MetricsSnapshot,
        MessageResponse,
        ApiErrorResponse,
        LoginRequest,
        CurrentUserResponse,
        SignedInUser,
        OrgRole,
        ApiKeyRecord,
        CreateApiKeyRequest,
        ApiKeyCreatedResponse,
    )),
    tags(
        (name = "Sistema", description = "Health check e metriche"),
        (name = "Auth", description = "Login, logout e identità corrente"),
        (name = "Admin", description = "Gestione API Keys dell'organizzazione"),
    ),
    servers(
        (url = "http://localhost:4000", description = "Server locale"),
    ),
    modifiers(&SecurityAddon)
)]
struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "api_key",
                utoipa::openapi::security::SecurityScheme::ApiKey(
                    utoipa::openapi::security::ApiKey::Header(
                        utoipa::openapi::security::ApiKeyValue::new("X-API-Key"),
                    ),
                ),
            );
        }
    }
}

#[tokio::main]
async fn main() {
    // Carica variabili da .env
    dotenvy::dotenv().ok();

    // Inizializza logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "authgate=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Carica configurazione
    let config = Config::from_env();

    tracing::info!("Connessione al database: {}", config.database_url);

    let db_pool = match db::init_db(&config.database_url).await {
        Ok(pool) => {
            tracing::info!("Database SQLite inizializzato");
            pool
        }
        Err(e) => {
            tracing::error!("Errore inizializzazione database: {}", e);
            std::process::exit(1);
        }
    };

    // Crea organizzazione e admin iniziali se non esistono
    match db::ensure_initial_setup(
        &db_pool,
        &config.anonymous.org_name,
        &config.admin_login,
        config.admin_password.as_deref(),
    )
    .await
    {
        Ok(Some(admin)) => {
            tracing::warn!("========================================");
            tracing::warn!("  UTENTE ADMIN INIZIALE CREATO!");
            tracing::warn!("========================================");
            tracing::warn!("  Login: {}", admin.login);
            if let Some(password) = admin.generated_password {
                tracing::warn!("  Password: {}", password);
                tracing::warn!("  SALVA QUESTA PASSWORD - NON SARA' PIU' MOSTRATA!");
            }
            tracing::warn!("========================================");
        }
        Ok(None) => {
            tracing::info!("Admin esistente trovato");
        }
        Err(e) => {
            tracing::error!("Errore creazione admin: {}", e);
        }
    }

    // Senza session manager non si può servire nessuna richiesta
    let sessions = match SessionManager::new(config.session.clone(), &db_pool).await {
        Ok(sessions) => sessions,
        Err(e) => {
            tracing::error!("Errore inizializzazione sessioni: {}", e);
            std::process::exit(1);
        }
    };

    let metrics = create_metrics();

    let resolver = AuthResolver::new(
        Arc::new(SqliteStore::new(db_pool.clone())),
        config.anonymous.clone(),
    );

    // Auth state per middleware
    let auth_state = AuthState {
        resolver: Arc::new(resolver),
        sessions: sessions.clone(),
        metrics,
        environment: config.environment,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let openapi = ApiDoc::openapi();
    let app = Router::new()
        .route(
            "/api-docs/openapi.json",
            get(move || async move { Json(openapi) }),
        )
        .merge(routes::create_router(db_pool, auth_state))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Avvia server
    let addr: SocketAddr = match format!("{}:{}", config.host, config.port).parse() {
        Ok(addr) => addr,
        Err(e) => {
            tracing::error!("Indirizzo non valido {}:{}: {}", config.host, config.port, e);
            std::process::exit(1);
        }
    };

    tracing::info!("========================================");
    tracing::info!("  Authgate API v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("========================================");
    tracing::info!("Server: http://{}", addr);
    tracing::info!("OpenAPI: http://{}/api-docs/openapi.json", addr);
    tracing::info!("----------------------------------------");
    tracing::info!("Sessioni: provider '{}'", sessions.provider_name());
    if config.anonymous.enabled {
        tracing::info!(
            "Accesso anonimo: abilitato (org '{}', ruolo {})",
            config.anonymous.org_name,
            config.anonymous.org_role
        );
    } else {
        tracing::info!("Accesso anonimo: disabilitato");
    }
    tracing::info!("----------------------------------------");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /api/v1/health           - Health check");
    tracing::info!("  GET  /api/v1/metrics          - Contatori risposte");
    tracing::info!("  POST /api/v1/login            - Login con sessione");
    tracing::info!("  POST /api/v1/logout           - Logout");
    tracing::info!("  GET  /api/v1/user             - Identità corrente");
    tracing::info!("  GET  /api/v1/auth/keys        - Lista API Keys (admin)");
    tracing::info!("  POST /api/v1/auth/keys        - Crea API Key (admin)");
    tracing::info!("  DEL  /api/v1/auth/keys/:id    - Elimina API Key (admin)");
    tracing::info!("----------------------------------------");

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Impossibile aprire {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!("Errore server: {}", e);
    }

    // Ferma la garbage collection delle sessioni
    sessions.shutdown().await;
    tracing::info!("Server arrestato");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Errore attesa segnale di arresto: {}", e);
    }
    tracing::info!("Arresto in corso...");
}
