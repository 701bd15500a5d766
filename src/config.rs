use crate::models::OrgRole;
use crate::session::SessionOptions;

/// Ambiente di esecuzione: in produzione i dettagli degli errori non vengono esposti
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn is_production(&self) -> bool {
        *self == Environment::Production
    }
}

impl From<&str> for Environment {
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            _ => Environment::Development,
        }
    }
}

/// Configurazione dell'accesso anonimo
#[derive(Debug, Clone)]
pub struct AnonymousSettings {
    pub enabled: bool,
    /// Nome dell'organizzazione assegnata ai visitatori anonimi
    pub org_name: String,
    /// Ruolo assegnato ai visitatori anonimi
    pub org_role: OrgRole,
}

impl Default for AnonymousSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            org_name: "Main Org.".to_string(),
            org_role: OrgRole::Viewer,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub environment: Environment,
    pub anonymous: AnonymousSettings,
    pub session: SessionOptions,
    pub admin_login: String,
    pub admin_password: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 4000,
            database_url: "sqlite:authgate.db?mode=rwc".to_string(),
            environment: Environment::Development,
            anonymous: AnonymousSettings::default(),
            session: SessionOptions::default(),
            admin_login: "admin".to_string(),
            admin_password: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Costruisce la configurazione leggendo le variabili tramite `lookup`
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(host) = lookup("AUTHGATE_HOST") {
            config.host = host;
        }

        if let Some(port) = lookup("AUTHGATE_PORT") {
            if let Ok(p) = port.parse() {
                config.port = p;
            }
        }

        if let Some(url) = lookup("DATABASE_URL") {
            config.database_url = url;
        }

        if let Some(env) = lookup("APP_ENV") {
            config.environment = Environment::from(env.as_str());
        }

        // Accesso anonimo
        if let Some(enabled) = lookup("AUTHGATE_ANONYMOUS_ENABLED") {
            config.anonymous.enabled = parse_bool(&enabled);
        }

        if let Some(org_name) = lookup("AUTHGATE_ANONYMOUS_ORG_NAME") {
            config.anonymous.org_name = org_name;
        }

        if let Some(role) = lookup("AUTHGATE_ANONYMOUS_ORG_ROLE") {
            config.anonymous.org_role = OrgRole::from(role.as_str());
        }

        // Sessioni
        if let Some(provider) = lookup("AUTHGATE_SESSION_PROVIDER") {
            config.session.provider = provider.trim().to_lowercase();
        }

        if let Some(provider_config) = lookup("AUTHGATE_SESSION_PROVIDER_CONFIG") {
            config.session.provider_config = provider_config;
        }

        if let Some(cookie_name) = lookup("AUTHGATE_SESSION_COOKIE_NAME") {
            config.session.cookie_name = cookie_name;
        }

        if let Some(secure) = lookup("AUTHGATE_SESSION_COOKIE_SECURE") {
            config.session.cookie_secure = parse_bool(&secure);
        }

        if let Some(lifetime) = lookup("AUTHGATE_SESSION_LIFETIME") {
            if let Ok(secs) = lifetime.parse() {
                config.session.cookie_lifetime_secs = secs;
                config.session.max_lifetime_secs = secs;
            }
        }

        if let Some(gc) = lookup("AUTHGATE_SESSION_GC_INTERVAL") {
            if let Ok(secs) = gc.parse() {
                config.session.gc_lifetime_secs = secs;
            }
        }

        if let Some(login) = lookup("AUTHGATE_ADMIN_LOGIN") {
            config.admin_login = login;
        }

        if let Some(password) = lookup("AUTHGATE_ADMIN_PASSWORD") {
            config.admin_password = Some(password);
        }

        config
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
