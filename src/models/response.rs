use serde::Serialize;
use utoipa::ToSchema;

use super::{OrgRole, SignedInUser};

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Stato dell'API
    pub status: String,
    /// Versione dell'API
    pub version: String,
    /// Provider di sessione attivo
    pub session_provider: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// Corpo delle risposte di errore API
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiErrorResponse {
    pub message: String,
    /// Dettaglio dell'errore, presente solo fuori da produzione
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Identità della richiesta corrente
#[derive(Debug, Serialize, ToSchema)]
pub struct CurrentUserResponse {
    #[serde(flatten)]
    pub user: SignedInUser,
    pub is_signed_in: bool,
    pub allow_anonymous: bool,
}

/// API Key creata: il segreto è mostrato solo in questa risposta
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiKeyCreatedResponse {
    pub id: i64,
    pub name: String,
    pub role: OrgRole,
    /// La chiave da presentare nelle richieste - mostrata solo una volta!
    pub key: String,
}
