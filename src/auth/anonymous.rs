use async_trait::async_trait;
use std::sync::Arc;

use super::{AuthOutcome, AuthStrategy};
use crate::config::AnonymousSettings;
use crate::db::IdentityStore;
use crate::middleware::context::RequestContext;
use crate::models::SignedInUser;

/// Accesso anonimo con l'organizzazione e il ruolo configurati.
/// Ultima strategia della catena, attiva solo se abilitata.
pub struct AnonymousStrategy {
    store: Arc<dyn IdentityStore>,
    settings: AnonymousSettings,
}

impl AnonymousStrategy {
    pub fn new(store: Arc<dyn IdentityStore>, settings: AnonymousSettings) -> Self {
        Self { store, settings }
    }
}

#[async_trait]
impl AuthStrategy for AnonymousStrategy {
    fn name(&self) -> &'static str {
        "anonymous"
    }

    async fn try_authenticate(&self, ctx: &mut RequestContext) -> AuthOutcome {
        if !self.settings.enabled {
            return AuthOutcome::Declined;
        }

        match self.store.get_org_by_name(&self.settings.org_name).await {
            Ok(org) => {
                ctx.is_signed_in = false;
                ctx.allow_anonymous = true;
                ctx.signed_in_user = SignedInUser {
                    org_id: org.id,
                    org_name: org.name,
                    org_role: Some(self.settings.org_role),
                    ..Default::default()
                };
                AuthOutcome::Accepted
            }
            Err(e) => {
                tracing::error!(
                    "Errore organizzazione per accesso anonimo '{}': {}",
                    self.settings.org_name,
                    e
                );
                AuthOutcome::Declined
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Org, OrgRole};
    use crate::testing::{self, MemoryStore};

    fn settings(enabled: bool) -> AnonymousSettings {
        AnonymousSettings {
            enabled,
            org_name: "Public".to_string(),
            org_role: OrgRole::Viewer,
        }
    }

    fn store() -> Arc<MemoryStore> {
        Arc::new(MemoryStore {
            orgs: vec![Org {
                id: 3,
                name: "Public".to_string(),
            }],
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_disabled_declines_without_lookup() {
        let store = store();
        let strategy = AnonymousStrategy::new(store.clone(), settings(false));
        let mut ctx = testing::context("/", &[]);

        assert!(matches!(
            strategy.try_authenticate(&mut ctx).await,
            AuthOutcome::Declined
        ));
        assert_eq!(store.org_lookups(), 0);
        assert!(!ctx.allow_anonymous);
    }

    #[tokio::test]
    async fn test_enabled_assigns_configured_identity() {
        let strategy = AnonymousStrategy::new(store(), settings(true));
        let mut ctx = testing::context("/", &[]);

        assert!(matches!(
            strategy.try_authenticate(&mut ctx).await,
            AuthOutcome::Accepted
        ));
        assert!(!ctx.is_signed_in);
        assert!(ctx.allow_anonymous);
        assert_eq!(ctx.signed_in_user.org_id, 3);
        assert_eq!(ctx.signed_in_user.org_name, "Public");
        assert_eq!(ctx.signed_in_user.org_role, Some(OrgRole::Viewer));
        assert_eq!(ctx.signed_in_user.user_id, 0);
    }

    #[tokio::test]
    async fn test_missing_org_declines() {
        let strategy = AnonymousStrategy::new(Arc::new(MemoryStore::default()), settings(true));
        let mut ctx = testing::context("/", &[]);

        assert!(matches!(
            strategy.try_authenticate(&mut ctx).await,
            AuthOutcome::Declined
        ));
        assert!(!ctx.allow_anonymous);
        assert!(ctx.signed_in_user.is_zero());
    }
}
