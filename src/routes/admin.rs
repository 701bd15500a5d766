use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    routing::{delete, get},
    Extension, Json, Router,
};

use crate::db::api_keys::{self, ApiKeyRecord};
use crate::db::DbPool;
use crate::error::{AppError, Result};
use crate::middleware::auth::require_org_admin;
use crate::middleware::context::RequestContext;
use crate::models::{ApiKeyCreatedResponse, CreateApiKeyRequest, MessageResponse, OrgRole};

#[derive(Clone)]
pub struct AdminState {
    pub db: DbPool,
}

/// Gestione delle API Keys dell'organizzazione corrente, riservata agli admin
pub fn router(db: DbPool) -> Router {
    let state = AdminState { db };
    Router::new()
        .route("/api/v1/auth/keys", get(list_api_keys).post(create_api_key))
        .route("/api/v1/auth/keys/:id", delete(delete_api_key))
        .route_layer(middleware::from_fn(require_org_admin))
        .with_state(state)
}

/// Lista le API Keys dell'organizzazione
#[utoipa::path(
    get,
    path = "/api/v1/auth/keys",
    responses(
        (status = 200, description = "Lista API Keys", body = Vec<ApiKeyRecord>),
        (status = 401, description = "Non autenticato"),
        (status = 403, description = "Solo admin"),
    ),
    security(("api_key" = [])),
    tag = "Admin"
)]
pub async fn list_api_keys(
    State(state): State<AdminState>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<Json<Vec<ApiKeyRecord>>> {
    let keys = api_keys::list_by_org(&state.db, ctx.signed_in_user.org_id).await?;
    Ok(Json(keys))
}

/// Crea una nuova API Key
#[utoipa::path(
    post,
    path = "/api/v1/auth/keys",
    request_body = CreateApiKeyRequest,
    responses(
        (status = 201, description = "API Key creata", body = ApiKeyCreatedResponse),
        (status = 400, description = "Nome o ruolo non validi"),
        (status = 401, description = "Non autenticato"),
        (status = 403, description = "Solo admin"),
        (status = 409, description = "Nome già usato nell'organizzazione"),
    ),
    security(("api_key" = [])),
    tag = "Admin"
)]
pub async fn create_api_key(
    State(state): State<AdminState>,
    Extension(ctx): Extension<RequestContext>,
    Json(request): Json<CreateApiKeyRequest>,
) -> Result<(StatusCode, Json<ApiKeyCreatedResponse>)> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("Il nome è obbligatorio".to_string()));
    }
    let role = parse_role(&request.role)?;

    let org_id = ctx.signed_in_user.org_id;
    let (record, key) = match api_keys::create_api_key(&state.db, org_id, name, role).await {
        Ok(created) => created,
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            return Err(AppError::Conflict(format!(
                "Esiste già una API Key chiamata '{}'",
                name
            )));
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!(
        "API Key '{}' creata nell'organizzazione {} con ruolo {}",
        record.name,
        org_id,
        record.role
    );

    Ok((
        StatusCode::CREATED,
        Json(ApiKeyCreatedResponse {
            id: record.id,
            name: record.name,
            role: record.role,
            key,
        }),
    ))
}

/// Elimina API Key
#[utoipa::path(
    delete,
    path = "/api/v1/auth/keys/{id}",
    params(
        ("id" = i64, Path, description = "ID API Key")
    ),
    responses(
        (status = 200, description = "API Key eliminata", body = MessageResponse),
        (status = 404, description = "Non trovata"),
        (status = 401, description = "Non autenticato"),
        (status = 403, description = "Solo admin"),
    ),
    security(("api_key" = [])),
    tag = "Admin"
)]
pub async fn delete_api_key(
    State(state): State<AdminState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>> {
    let deleted = api_keys::delete_api_key(&state.db, ctx.signed_in_user.org_id, id).await?;

    if deleted {
        Ok(Json(MessageResponse {
            message: "API Key eliminata".to_string(),
        }))
    } else {
        Err(AppError::NotFound("API Key non trovata".to_string()))
    }
}

/// Il ruolo della richiesta deve essere uno dei tre noti
fn parse_role(value: &str) -> Result<OrgRole> {
    let role = OrgRole::from(value);
    if role.to_string().eq_ignore_ascii_case(value.trim()) {
        Ok(role)
    } else {
        Err(AppError::BadRequest(format!("Ruolo non valido: {}", value)))
    }
}
