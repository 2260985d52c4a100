//! CRM synchronization adapters for Gestor.
//!
//! [`CrmProvider`] abstracts contact CRUD against an external CRM. Two adapters
//! are provided:
//!
//! - [`HubspotProvider`] - HubSpot CRM v3 contacts, bearer token, cursor paging
//! - [`PipedriveProvider`] - Pipedrive v1 persons, `api_token` query parameter,
//!   offset paging
//!
//! [`build_provider`] picks the adapter from configuration.

mod error;
mod hubspot;
mod pipedrive;
mod provider;

use std::sync::Arc;
use std::time::Duration;

use gestor_shared::config::{CrmConfig, CrmProviderKind};

pub use error::CrmError;
pub use hubspot::HubspotProvider;
pub use pipedrive::PipedriveProvider;
pub use provider::{CrmContato, CrmPagina, CrmProvider, CrmRegistro};

/// Builds the configured provider, or `None` when CRM sync is disabled.
///
/// # Errors
///
/// Returns `CrmError::Configuracao` when the token is missing, the base URL is
/// invalid or the HTTP client cannot be built.
pub fn build_provider(config: &CrmConfig) -> Result<Option<Arc<dyn CrmProvider>>, CrmError> {
    if config.provider == CrmProviderKind::None {
        return Ok(None);
    }
    if config.api_token.trim().is_empty() {
        return Err(CrmError::Configuracao("crm.api_token is required".into()));
    }

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs.max(1)))
        .user_agent(concat!("gestor/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| CrmError::Configuracao(e.to_string()))?;

    let provider: Arc<dyn CrmProvider> = match config.provider {
        CrmProviderKind::Hubspot => Arc::new(HubspotProvider::new(
            client,
            base_url_or(&config.base_url, HubspotProvider::DEFAULT_BASE_URL)?,
            config.api_token.clone(),
            config.page_size,
        )),
        CrmProviderKind::Pipedrive => Arc::new(PipedriveProvider::new(
            client,
            base_url_or(&config.base_url, PipedriveProvider::DEFAULT_BASE_URL)?,
            config.api_token.clone(),
            config.page_size,
        )),
        CrmProviderKind::None => return Ok(None),
    };

    tracing::info!(provider = provider.nome(), "CRM provider configured");
    Ok(Some(provider))
}

fn base_url_or(configured: &str, default: &str) -> Result<String, CrmError> {
    let raw = if configured.trim().is_empty() {
        default
    } else {
        configured.trim()
    };
    url::Url::parse(raw).map_err(|e| CrmError::Configuracao(format!("crm.base_url: {e}")))?;
    Ok(raw.trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(provider: CrmProviderKind) -> CrmConfig {
        CrmConfig {
            provider,
            base_url: String::new(),
            api_token: "token".into(),
            timeout_secs: 5,
            page_size: 50,
        }
    }

    #[test]
    fn test_disabled_provider() {
        assert!(build_provider(&config(CrmProviderKind::None)).unwrap().is_none());
    }

    #[test]
    fn test_selects_adapter() {
        let hubspot = build_provider(&config(CrmProviderKind::Hubspot)).unwrap().unwrap();
        assert_eq!(hubspot.nome(), "hubspot");
        let pipedrive = build_provider(&config(CrmProviderKind::Pipedrive)).unwrap().unwrap();
        assert_eq!(pipedrive.nome(), "pipedrive");
    }

    #[test]
    fn test_requires_token_and_valid_url() {
        let mut sem_token = config(CrmProviderKind::Hubspot);
        sem_token.api_token = " ".into();
        assert!(matches!(build_provider(&sem_token), Err(CrmError::Configuracao(_))));

        let mut url_ruim = config(CrmProviderKind::Pipedrive);
        url_ruim.base_url = "nao e url".into();
        assert!(matches!(build_provider(&url_ruim), Err(CrmError::Configuracao(_))));
    }
}
