use serde::Deserialize;
use utoipa::ToSchema;

/// Credenziali per il login con sessione
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    /// Login o email dell'utente
    pub user: String,
    pub password: String,
}

/// Request per creare una nuova API Key nell'organizzazione corrente
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateApiKeyRequest {
    /// Nome univoco della chiave all'interno dell'organizzazione
    pub name: String,
    /// Ruolo: "Viewer", "Editor" o "Admin"
    #[serde(default = "default_role")]
    pub role: String,
}

fn default_role() -> String {
    "Viewer".to_string()
}
