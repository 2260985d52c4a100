//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// JWT configuration.
    pub jwt: JwtConfig,
    /// Cookie, CSRF and rate-limit settings.
    #[serde(default)]
    pub security: SecurityConfig,
    /// CRM provider settings.
    #[serde(default)]
    pub crm: CrmConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// JWT configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    /// Secret key for signing tokens.
    pub secret: String,
    /// Access token expiration in seconds.
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry_secs: u64,
    /// Refresh token expiration in seconds.
    #[serde(default = "default_refresh_token_expiry")]
    pub refresh_token_expiry_secs: u64,
}

fn default_access_token_expiry() -> u64 {
    900 // 15 minutes
}

fn default_refresh_token_expiry() -> u64 {
    604_800 // 7 days
}

/// Cookie, CSRF and rate-limit settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Cookie carrying the access token.
    pub access_cookie: String,
    /// Cookie carrying the refresh token.
    pub refresh_cookie: String,
    /// Marks auth cookies `Secure` (HTTPS only).
    pub cookie_secure: bool,
    /// Requires `X-CSRF-Token` on mutating requests.
    pub csrf_enabled: bool,
    /// CSRF token lifetime in seconds.
    pub csrf_ttl_secs: u64,
    /// Failed logins allowed inside the window before blocking.
    pub login_max_attempts: u32,
    /// Window for counting failed logins, in seconds.
    pub login_window_secs: u64,
    /// Block duration after too many failed logins, in seconds.
    pub login_block_secs: u64,
    /// Requests per IP allowed on the public auth routes inside the window.
    pub auth_max_requests: u32,
    /// Window for the auth route limit, in seconds.
    pub auth_window_secs: u64,
    /// Block duration for the auth route limit, in seconds.
    pub auth_block_secs: u64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            access_cookie: "gestor_access".to_string(),
            refresh_cookie: "gestor_refresh".to_string(),
            cookie_secure: false,
            csrf_enabled: true,
            csrf_ttl_secs: 7200,
            login_max_attempts: 5,
            login_window_secs: 900,
            login_block_secs: 900,
            auth_max_requests: 60,
            auth_window_secs: 60,
            auth_block_secs: 60,
        }
    }
}

/// Which CRM the adapters talk to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrmProviderKind {
    /// CRM synchronization disabled.
    #[default]
    None,
    /// HubSpot contacts API.
    Hubspot,
    /// Pipedrive persons API.
    Pipedrive,
}

/// CRM provider settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrmConfig {
    /// Provider to use.
    pub provider: CrmProviderKind,
    /// Base URL of the provider API. Empty uses the provider default.
    pub base_url: String,
    /// API token (HubSpot private app token or Pipedrive `api_token`).
    pub api_token: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Page size used when listing contacts.
    pub page_size: u32,
}

impl Default for CrmConfig {
    fn default() -> Self {
        Self {
            provider: CrmProviderKind::None,
            base_url: String::new(),
            api_token: String::new(),
            timeout_secs: 15,
            page_size: 100,
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(
                config::Environment::with_prefix("GESTOR")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_environment_with_defaults() {
        temp_env::with_vars(
            [
                ("GESTOR__DATABASE__URL", Some("postgres://localhost/gestor_test")),
                ("GESTOR__JWT__SECRET", Some("segredo-de-teste")),
                ("GESTOR__SERVER__PORT", Some("9090")),
                ("GESTOR__CRM__PROVIDER", Some("hubspot")),
            ],
            || {
                let config = AppConfig::load().expect("config should load");

                assert_eq!(config.database.url, "postgres://localhost/gestor_test");
                assert_eq!(config.database.max_connections, 10);
                assert_eq!(config.jwt.secret, "segredo-de-teste");
                assert_eq!(config.jwt.access_token_expiry_secs, 900);
                assert_eq!(config.server.port, 9090);
                assert_eq!(config.server.host, "0.0.0.0");
                assert_eq!(config.crm.provider, CrmProviderKind::Hubspot);
                assert_eq!(config.security.login_max_attempts, 5);
                assert!(config.security.csrf_enabled);
            },
        );
    }

    #[test]
    fn test_missing_database_url_fails() {
        temp_env::with_vars(
            [
                ("GESTOR__DATABASE__URL", None::<&str>),
                ("GESTOR__JWT__SECRET", Some("segredo")),
            ],
            || {
                assert!(AppConfig::load().is_err());
            },
        );
    }

    #[test]
    fn test_security_defaults() {
        let security = SecurityConfig::default();
        assert_eq!(security.access_cookie, "gestor_access");
        assert_eq!(security.csrf_ttl_secs, 7200);
        assert_eq!(security.login_block_secs, 900);
    }
}
