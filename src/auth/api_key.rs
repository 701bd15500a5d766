use async_trait::async_trait;
use axum::http::{header, HeaderMap, StatusCode, Uri};
use std::sync::Arc;

use super::{ApiKeyCredential, AuthOutcome, AuthStrategy};
use crate::db::IdentityStore;
use crate::middleware::context::RequestContext;
use crate::models::SignedInUser;

/// Messaggio unico per ogni rifiuto: decodifica, lookup e verifica non devono
/// essere distinguibili dal chiamante
pub const INVALID_API_KEY: &str = "Invalid API key";

/// Autenticazione tramite API Key
pub struct ApiKeyStrategy {
    store: Arc<dyn IdentityStore>,
}

impl ApiKeyStrategy {
    pub fn new(store: Arc<dyn IdentityStore>) -> Self {
        Self { store }
    }

    fn reject(&self, ctx: &RequestContext, reason: &str) -> AuthOutcome {
        tracing::warn!("API Key rifiutata ({}): {}", ctx.uri.path(), reason);
        ctx.metrics().record_api_key_rejection();
        AuthOutcome::Rejected(ctx.json_api_err(StatusCode::UNAUTHORIZED, INVALID_API_KEY, None))
    }
}

/// Estrae la API Key dalla richiesta.
///
/// Cerca nell'header `X-API-Key`, nel parametro `api_key` della query string
/// e infine in `Authorization: Bearer`.
pub fn extract_api_key(headers: &HeaderMap, uri: &Uri) -> Option<String> {
    // Controlla header X-API-Key
    let api_key_header = headers
        .get("X-API-Key")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    // Controlla query parameter api_key
    let api_key_query = || {
        uri.query().and_then(|q| {
            q.split('&')
                .find_map(|p| p.strip_prefix("api_key="))
                .and_then(|v| urlencoding::decode(v).ok())
                .map(|v| v.into_owned())
        })
    };

    // Controlla Authorization Bearer
    let api_key_bearer = || {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::to_string)
    };

    api_key_header
        .or_else(api_key_query)
        .or_else(api_key_bearer)
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
}

#[async_trait]
impl AuthStrategy for ApiKeyStrategy {
    fn name(&self) -> &'static str {
        "api_key"
    }

    async fn try_authenticate(&self, ctx: &mut RequestContext) -> AuthOutcome {
        let Some(key) = extract_api_key(&ctx.headers, &ctx.uri) else {
            return AuthOutcome::Declined;
        };

        let decoded = match ApiKeyCredential::decode(&key) {
            Ok(decoded) => decoded,
            Err(e) => return self.reject(ctx, &format!("decodifica fallita: {}", e)),
        };

        let record = match self
            .store
            .get_api_key_by_name(&decoded.name, decoded.org_id)
            .await
        {
            Ok(record) => record,
            Err(e) => return self.reject(ctx, &format!("lookup fallito: {}", e)),
        };

        if !decoded.is_valid(&record.key) {
            return self.reject(
                ctx,
                &format!(
                    "segreto non corrispondente per '{}' (org {})",
                    decoded.name, decoded.org_id
                ),
            );
        }

        // Solo una chiave verificata aggiorna l'ultimo uso
        if let Err(e) = self.store.touch_api_key(record.id).await {
            tracing::warn!("Errore aggiornamento ultimo uso API Key {}: {}", record.id, e);
        }

        ctx.signed_in_user = SignedInUser {
            org_id: record.org_id,
            org_role: Some(record.role),
            api_key_id: record.id,
            ..Default::default()
        };
        ctx.is_signed_in = true;

        AuthOutcome::Accepted
    }
}
