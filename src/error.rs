use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::db::users::UserError;
use crate::db::StoreError;
use crate::session::SessionError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Non trovato: {0}")]
    NotFound(String),

    #[error("Non autorizzato: {0}")]
    Unauthorized(String),

    #[error("Accesso negato: {0}")]
    Forbidden(String),

    #[error("Richiesta non valida: {0}")]
    BadRequest(String),

    #[error("Conflitto: {0}")]
    Conflict(String),

    #[error("Errore database: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Errore utenti: {0}")]
    User(#[from] UserError),

    #[error("Errore archivio: {0}")]
    Store(#[from] StoreError),

    #[error("Errore sessione: {0}")]
    Session(#[from] SessionError),

    #[error("Errore interno: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, self.to_string()),
            AppError::Forbidden(_) => (StatusCode::FORBIDDEN, self.to_string()),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::Conflict(_) => (StatusCode::CONFLICT, self.to_string()),
            // Gli errori di persistenza vengono loggati ma non esposti al chiamante
            AppError::Database(_)
            | AppError::User(_)
            | AppError::Store(_)
            | AppError::Session(_)
            | AppError::Internal(_) => {
                tracing::error!("{}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "message": message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::Unauthorized("x".into()).into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Forbidden("x".into()).into_response().status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::Conflict("x".into()).into_response().status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Internal("boom".into()).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_internal_errors_are_not_exposed() {
        let response = AppError::Internal("connessione persa a 10.0.0.1".into()).into_response();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(value["message"], "Internal Server Error");
        assert_eq!(value["status"], 500);
    }
}
