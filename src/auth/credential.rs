//! Formato delle API Key presentate dai client.
//!
//! La chiave consegnata al client è un JSON `{"k": segreto, "n": nome, "id": org}`
//! codificato in base64 URL-safe senza padding. Nel database viene salvato solo
//! l'hash del segreto, legato al nome della chiave.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::utils::{constant_time_eq, sha256_hex};

/// Errori di decodifica di una API Key
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("codifica base64 non valida: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("contenuto non valido: {0}")]
    Json(#[from] serde_json::Error),
    #[error("campi obbligatori mancanti")]
    MissingFields,
}

/// Credenziale decodificata da una API Key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKeyCredential {
    #[serde(rename = "n")]
    pub name: String,
    #[serde(rename = "id")]
    pub org_id: i64,
    /// Segreto in chiaro
    #[serde(rename = "k")]
    pub key: String,
}

/// Chiave appena generata
#[derive(Debug, Clone)]
pub struct GeneratedKey {
    /// Valore da consegnare al client
    pub client_secret: String,
    /// Hash da salvare nel database
    pub hashed_key: String,
}

impl ApiKeyCredential {
    /// Codifica la credenziale nel formato consegnato al client
    pub fn encode(&self) -> String {
        // La serializzazione di una struct con soli campi String/i64 non può fallire
        let json = serde_json::to_vec(self).unwrap_or_default();
        URL_SAFE_NO_PAD.encode(json)
    }

    /// Decodifica una API Key presentata da un client
    pub fn decode(key: &str) -> Result<Self, CredentialError> {
        let bytes = URL_SAFE_NO_PAD.decode(key.trim().trim_end_matches('='))?;
        let credential: ApiKeyCredential = serde_json::from_slice(&bytes)?;

        if credential.name.is_empty() || credential.key.is_empty() {
            return Err(CredentialError::MissingFields);
        }

        Ok(credential)
    }

    /// Verifica la credenziale contro l'hash salvato
    pub fn is_valid(&self, hashed_key: &str) -> bool {
        constant_time_eq(&hash_key(&self.key, &self.name), hashed_key)
    }
}

/// Hash del segreto, legato al nome della chiave
pub fn hash_key(secret: &str, name: &str) -> String {
    sha256_hex(&[name, ":", secret])
}

/// Genera una nuova API Key per l'organizzazione indicata
pub fn generate(org_id: i64, name: &str) -> GeneratedKey {
    let mut rng = rand::thread_rng();
    let secret_bytes: [u8; 32] = rng.gen();
    let secret = URL_SAFE_NO_PAD.encode(secret_bytes);

    let credential = ApiKeyCredential {
        name: name.to_string(),
        org_id,
        key: secret,
    };

    GeneratedKey {
        client_secret: credential.encode(),
        hashed_key: hash_key(&credential.key, name),
    }
}
