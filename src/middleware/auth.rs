use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::Response,
    Extension, Router,
};
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;

use crate::auth::AuthResolver;
use crate::config::Environment;
use crate::middleware::context::RequestContext;
use crate::models::OrgRole;
use crate::services::SharedMetrics;
use crate::session::{SessionManager, SessionStore};

/// Stato per il middleware di autenticazione
#[derive(Clone)]
pub struct AuthState {
    pub resolver: Arc<AuthResolver>,
    pub sessions: Arc<SessionManager>,
    pub metrics: SharedMetrics,
    pub environment: Environment,
}

/// Applica [`context_handler`] alle route indicate.
///
/// Il panic di un handler diventa una risposta 500 prima di risalire al
/// middleware, così la sessione viene comunque rilasciata.
pub fn with_request_context(router: Router, state: AuthState) -> Router {
    router
        .layer(CatchPanicLayer::new())
        .layer(middleware::from_fn_with_state(state, context_handler))
}

/// Middleware che crea il [`RequestContext`] e risolve l'identità.
///
/// Se una strategia rifiuta la richiesta la sua risposta viene restituita
/// senza eseguire l'handler. In ogni caso, al termine, la sessione viene
/// salvata una sola volta e il cookie di sessione allegato alla risposta.
pub async fn context_handler(
    State(state): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Response {
    let session = SessionStore::new(state.sessions.clone());
    let mut ctx = RequestContext::new(
        request.headers().clone(),
        request.uri().clone(),
        session,
        state.environment,
        state.metrics.clone(),
    );

    let response = match state.resolver.resolve(&mut ctx).await {
        Some(rejection) => rejection,
        None => {
            request.extensions_mut().insert(ctx.clone());
            next.run(request).await
        }
    };

    release_session(&ctx, response).await
}

async fn release_session(ctx: &RequestContext, mut response: Response) -> Response {
    let cookie = ctx.session.pending_cookie().await;

    if let Err(e) = ctx.session.release().await {
        // La sessione non è stata salvata: la risposta dell'handler non è più valida
        return ctx.error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Impossibile salvare la sessione",
            Some(&e),
        );
    }

    if let Some(cookie) = cookie {
        response.headers_mut().append(header::SET_COOKIE, cookie);
    }

    response
}

/// Middleware per richiedere un utente autenticato (no anonimo)
pub async fn require_signed_in(
    Extension(ctx): Extension<RequestContext>,
    request: Request,
    next: Next,
) -> Response {
    if !ctx.is_signed_in {
        return ctx.error_response(StatusCode::UNAUTHORIZED, "Autenticazione richiesta", None);
    }

    next.run(request).await
}

/// Middleware per richiedere il ruolo Admin nell'organizzazione corrente
pub async fn require_org_admin(
    Extension(ctx): Extension<RequestContext>,
    request: Request,
    next: Next,
) -> Response {
    if !ctx.is_signed_in {
        return ctx.error_response(StatusCode::UNAUTHORIZED, "Autenticazione richiesta", None);
    }

    if !ctx.signed_in_user.has_role(OrgRole::Admin) {
        return ctx.error_response(StatusCode::FORBIDDEN, "Privilegi admin richiesti", None);
    }

    next.run(request).await
}
