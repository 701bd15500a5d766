//! Contesto della singola richiesta: identità risolta, sessione e helper di risposta

use axum::{
    http::{HeaderMap, StatusCode, Uri},
    response::{Html, IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::config::Environment;
use crate::models::{ApiErrorResponse, SignedInUser};
use crate::services::SharedMetrics;
use crate::session::SessionStore;

/// Creato dal middleware per ogni richiesta e disponibile agli handler come
/// `Extension<RequestContext>`.
#[derive(Clone)]
pub struct RequestContext {
    pub headers: HeaderMap,
    pub uri: Uri,
    pub signed_in_user: SignedInUser,
    pub session: SessionStore,
    pub is_signed_in: bool,
    pub allow_anonymous: bool,
    environment: Environment,
    metrics: SharedMetrics,
}

impl RequestContext {
    pub fn new(
        headers: HeaderMap,
        uri: Uri,
        session: SessionStore,
        environment: Environment,
        metrics: SharedMetrics,
    ) -> Self {
        Self {
            headers,
            uri,
            signed_in_user: SignedInUser::default(),
            session,
            is_signed_in: false,
            allow_anonymous: false,
            environment,
            metrics,
        }
    }

    pub fn metrics(&self) -> &SharedMetrics {
        &self.metrics
    }

    pub fn is_api_request(&self) -> bool {
        self.uri.path().starts_with("/api")
    }

    /// Pagina HTML con il codice di stato
    pub fn handle(
        &self,
        status: StatusCode,
        title: &str,
        err: Option<&dyn std::error::Error>,
    ) -> Response {
        let detail = err.and_then(|err| self.log_error(status, title, err));

        self.metrics.record_page_status(status.as_u16());

        let mut body = format!(
            "<!DOCTYPE html>\n<html><head><title>{title}</title></head><body><h1>{code}</h1><p>{title}</p>",
            title = escape_html(title),
            code = status.as_u16()
        );
        if let Some(detail) = detail {
            body.push_str(&format!("<pre>{}</pre>", escape_html(&detail)));
        }
        body.push_str("</body></html>");

        (status, Html(body)).into_response()
    }

    pub fn json_ok(&self, message: &str) -> Response {
        self.metrics.record_api_status(200);
        (StatusCode::OK, Json(json!({ "message": message }))).into_response()
    }

    /// Risposta di errore API `{"message", "error"}`; `error` solo fuori da produzione
    pub fn json_api_err(
        &self,
        status: StatusCode,
        message: &str,
        err: Option<&dyn std::error::Error>,
    ) -> Response {
        let error = err.and_then(|err| self.log_error(status, message, err));

        let message = match (message.is_empty(), status) {
            (false, _) => message.to_string(),
            (true, StatusCode::NOT_FOUND) => "Not Found".to_string(),
            (true, StatusCode::INTERNAL_SERVER_ERROR) => "Internal Server Error".to_string(),
            (true, _) => status.canonical_reason().unwrap_or("Error").to_string(),
        };

        self.metrics.record_api_status(status.as_u16());

        (status, Json(ApiErrorResponse { message, error })).into_response()
    }

    /// Errore in JSON per le route `/api`, in HTML per le altre
    pub fn error_response(
        &self,
        status: StatusCode,
        message: &str,
        err: Option<&dyn std::error::Error>,
    ) -> Response {
        if self.is_api_request() {
            self.json_api_err(status, message, err)
        } else {
            self.handle(status, message, err)
        }
    }

    /// Logga la causa e restituisce il testo da esporre (mai in produzione)
    fn log_error(
        &self,
        status: StatusCode,
        message: &str,
        err: &dyn std::error::Error,
    ) -> Option<String> {
        if status.as_u16() >= 400 {
            tracing::error!("{}: {}", message, err);
        } else {
            tracing::debug!("{}: {}", message, err);
        }

        if self.environment.is_production() {
            None
        } else {
            Some(err.to_string())
        }
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
