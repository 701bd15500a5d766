use axum::{
    extract::State,
    response::Response,
    routing::{get, post},
    Extension, Json, Router,
};

use crate::db::{users, DbPool};
use crate::error::{AppError, Result};
use crate::middleware::context::RequestContext;
use crate::models::{CurrentUserResponse, LoginRequest};
use crate::session::SESS_KEY_USERID;

/// State per le route di autenticazione
#[derive(Clone)]
pub struct AuthRouteState {
    pub db: DbPool,
}

pub fn router(db: DbPool) -> Router {
    let state = AuthRouteState { db };
    Router::new()
        .route("/api/v1/login", post(login))
        .route("/api/v1/logout", post(logout))
        .route("/api/v1/user", get(get_current_user))
        .with_state(state)
}

/// Login con utente e password: lega la sessione all'utente
#[utoipa::path(
    post,
    path = "/api/v1/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login effettuato, cookie di sessione impostato", body = crate::models::MessageResponse),
        (status = 401, description = "Credenziali non valide"),
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AuthRouteState>,
    Extension(ctx): Extension<RequestContext>,
    Json(request): Json<LoginRequest>,
) -> Result<Response> {
    let user = users::authenticate(&state.db, request.user.trim(), &request.password)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Credenziali non valide".to_string()))?;

    // Nuovo ID di sessione ad ogni login
    ctx.session.destroy().await?;
    ctx.session.start(&ctx.headers).await?;
    ctx.session.set(SESS_KEY_USERID, user.id).await?;

    tracing::info!("Login utente '{}' (id {})", user.login, user.id);

    Ok(ctx.json_ok("Logged in"))
}

/// Logout: invalida la sessione corrente
#[utoipa::path(
    post,
    path = "/api/v1/logout",
    responses(
        (status = 200, description = "Sessione invalidata", body = crate::models::MessageResponse),
    ),
    tag = "Auth"
)]
pub async fn logout(Extension(ctx): Extension<RequestContext>) -> Result<Response> {
    ctx.session.destroy().await?;
    Ok(ctx.json_ok("Logged out"))
}

/// Identità della richiesta corrente
#[utoipa::path(
    get,
    path = "/api/v1/user",
    responses(
        (status = 200, description = "Identità risolta", body = CurrentUserResponse),
        (status = 401, description = "Nessuna identità"),
    ),
    security(("api_key" = [])),
    tag = "Auth"
)]
pub async fn get_current_user(
    Extension(ctx): Extension<RequestContext>,
) -> Result<Json<CurrentUserResponse>> {
    if !ctx.is_signed_in && !ctx.allow_anonymous {
        return Err(AppError::Unauthorized("Autenticazione richiesta".to_string()));
    }

    Ok(Json(CurrentUserResponse {
        user: ctx.signed_in_user,
        is_signed_in: ctx.is_signed_in,
        allow_anonymous: ctx.allow_anonymous,
    }))
}
