//! Identità risolta per una richiesta

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Ruolo di un utente (o di una API Key) all'interno di un'organizzazione
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub enum OrgRole {
    Viewer,
    Editor,
    Admin,
}

impl std::fmt::Display for OrgRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrgRole::Viewer => write!(f, "Viewer"),
            OrgRole::Editor => write!(f, "Editor"),
            OrgRole::Admin => write!(f, "Admin"),
        }
    }
}

impl From<&str> for OrgRole {
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "admin" => OrgRole::Admin,
            "editor" => OrgRole::Editor,
            _ => OrgRole::Viewer,
        }
    }
}

/// Organizzazione
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Org {
    pub id: i64,
    pub name: String,
}

/// Identità associata alla richiesta corrente.
///
/// Il valore di default è l'identità "zero": nessun utente, nessuna
/// organizzazione, nessun ruolo. Ogni strategia di autenticazione che ha
/// successo la sostituisce per intero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SignedInUser {
    /// ID utente, 0 se l'identità non proviene da una sessione
    pub user_id: i64,
    pub org_id: i64,
    pub org_role: Option<OrgRole>,
    pub org_name: String,
    /// ID della API Key, 0 se l'identità non proviene da una API Key
    pub api_key_id: i64,
    pub login: String,
    pub email: String,
    pub name: String,
}

impl SignedInUser {
    pub fn is_zero(&self) -> bool {
        *self == SignedInUser::default()
    }

    pub fn has_role(&self, role: OrgRole) -> bool {
        match (self.org_role, role) {
            (Some(OrgRole::Admin), _) => true,
            (Some(OrgRole::Editor), OrgRole::Editor | OrgRole::Viewer) => true,
            (Some(OrgRole::Viewer), OrgRole::Viewer) => true,
            _ => false,
        }
    }
}
