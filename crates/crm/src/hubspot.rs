//! HubSpot CRM v3 contacts adapter.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::debug;

use crate::error::check_status;
use crate::provider::{dividir_nome, juntar_nome, nao_vazio};
use crate::{CrmContato, CrmError, CrmPagina, CrmProvider, CrmRegistro};

const CONTACTS_PATH: &str = "/crm/v3/objects/contacts";
const PROPERTIES: &str = "firstname,lastname,email,phone,company,documento";

/// HubSpot contacts through a private-app bearer token.
pub struct HubspotProvider {
    client: Client,
    base_url: String,
    token: String,
    page_size: u32,
}

#[derive(Debug, Deserialize)]
struct HubspotContact {
    id: String,
    #[serde(default)]
    properties: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct HubspotList {
    #[serde(default)]
    results: Vec<HubspotContact>,
    paging: Option<HubspotPaging>,
}

#[derive(Debug, Deserialize)]
struct HubspotPaging {
    next: Option<HubspotNext>,
}

#[derive(Debug, Deserialize)]
struct HubspotNext {
    after: String,
}

impl HubspotContact {
    fn prop(&self, name: &str) -> Option<&str> {
        self.properties.get(name).and_then(Value::as_str)
    }

    fn into_registro(self) -> CrmRegistro {
        let contato = CrmContato {
            nome: juntar_nome(self.prop("firstname"), self.prop("lastname")),
            email: nao_vazio(self.prop("email")),
            telefone: nao_vazio(self.prop("phone")),
            documento: nao_vazio(self.prop("documento")),
            empresa: nao_vazio(self.prop("company")),
        };
        CrmRegistro {
            external_id: self.id,
            contato,
        }
    }
}

impl HubspotProvider {
    /// Public API host.
    pub const DEFAULT_BASE_URL: &'static str = "https://api.hubapi.com";

    /// Creates the adapter. `base_url` has no trailing slash.
    #[must_use]
    pub fn new(client: Client, base_url: String, token: String, page_size: u32) -> Self {
        Self {
            client,
            base_url,
            token,
            page_size: page_size.clamp(1, 100),
        }
    }

    fn url(&self, suffix: &str) -> String {
        format!("{}{CONTACTS_PATH}{suffix}", self.base_url)
    }

    fn body(contato: &CrmContato) -> Value {
        let (firstname, lastname) = dividir_nome(&contato.nome);
        let mut properties = Map::new();
        properties.insert("firstname".into(), json!(firstname));
        properties.insert("lastname".into(), json!(lastname));
        let opcionais = [
            ("email", &contato.email),
            ("phone", &contato.telefone),
            ("documento", &contato.documento),
            ("company", &contato.empresa),
        ];
        for (key, value) in opcionais {
            if let Some(value) = value {
                properties.insert(key.into(), json!(value));
            }
        }
        json!({ "properties": properties })
    }
}

#[async_trait]
impl CrmProvider for HubspotProvider {
    fn nome(&self) -> &'static str {
        "hubspot"
    }

    async fn criar(&self, contato: &CrmContato) -> Result<String, CrmError> {
        let response = self
            .client
            .post(self.url(""))
            .bearer_auth(&self.token)
            .json(&Self::body(contato))
            .send()
            .await?;
        let created: HubspotContact = check_status(response).await?.json().await?;
        debug!(external_id = %created.id, "hubspot contact created");
        Ok(created.id)
    }

    async fn atualizar(&self, external_id: &str, contato: &CrmContato) -> Result<(), CrmError> {
        let response = self
            .client
            .patch(self.url(&format!("/{external_id}")))
            .bearer_auth(&self.token)
            .json(&Self::body(contato))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(CrmError::NaoEncontrado(external_id.to_string()));
        }
        check_status(response).await?;
        Ok(())
    }

    async fn buscar(&self, external_id: &str) -> Result<Option<CrmRegistro>, CrmError> {
        let response = self
            .client
            .get(self.url(&format!("/{external_id}")))
            .bearer_auth(&self.token)
            .query(&[("properties", PROPERTIES)])
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let contact: HubspotContact = check_status(response).await?.json().await?;
        Ok(Some(contact.into_registro()))
    }

    async fn listar(&self, cursor: Option<&str>) -> Result<CrmPagina, CrmError> {
        let mut query = vec![
            ("limit", self.page_size.to_string()),
            ("properties", PROPERTIES.to_string()),
        ];
        if let Some(after) = cursor {
            query.push(("after", after.to_string()));
        }

        let response = self
            .client
            .get(self.url(""))
            .bearer_auth(&self.token)
            .query(&query)
            .send()
            .await?;
        let list: HubspotList = check_status(response).await?.json().await?;

        Ok(CrmPagina {
            proximo_cursor: list.paging.and_then(|p| p.next).map(|n| n.after),
            itens: list
                .results
                .into_iter()
                .map(HubspotContact::into_registro)
                .collect(),
        })
    }

    async fn remover(&self, external_id: &str) -> Result<(), CrmError> {
        let response = self
            .client
            .delete(self.url(&format!("/{external_id}")))
            .bearer_auth(&self.token)
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(CrmError::NaoEncontrado(external_id.to_string()));
        }
        check_status(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::Method::PATCH;
    use httpmock::prelude::*;

    fn provider(server: &MockServer) -> HubspotProvider {
        HubspotProvider::new(Client::new(), server.base_url(), "pat-123".into(), 2)
    }

    fn contato() -> CrmContato {
        CrmContato {
            nome: "Maria da Silva".into(),
            email: Some("maria@loja.com".into()),
            telefone: Some("11987654321".into()),
            documento: Some("52998224725".into()),
            empresa: None,
        }
    }

    #[tokio::test]
    async fn test_create_sends_bearer_and_properties() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/crm/v3/objects/contacts")
                    .header("Authorization", "Bearer pat-123")
                    .json_body(json!({
                        "properties": {
                            "firstname": "Maria",
                            "lastname": "da Silva",
                            "email": "maria@loja.com",
                            "phone": "11987654321",
                            "documento": "52998224725"
                        }
                    }));
                then.status(201).json_body(json!({"id": "501", "properties": {}}));
            })
            .await;

        let id = provider(&server).criar(&contato()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(id, "501");
    }

    #[tokio::test]
    async fn test_list_first_page() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/crm/v3/objects/contacts")
                    .query_param("limit", "2");
                then.status(200).json_body(json!({
                    "results": [
                        {"id": "1", "properties": {"firstname": "Ana", "lastname": "Lima", "email": "ana@x.com"}},
                        {"id": "2", "properties": {"firstname": "Rui", "lastname": null}}
                    ],
                    "paging": {"next": {"after": "2"}}
                }));
            })
            .await;

        let pagina = provider(&server).listar(None).await.unwrap();

        mock.assert_async().await;
        assert_eq!(pagina.itens.len(), 2);
        assert_eq!(pagina.itens[0].contato.nome, "Ana Lima");
        assert_eq!(pagina.itens[0].contato.email.as_deref(), Some("ana@x.com"));
        assert_eq!(pagina.itens[1].contato.nome, "Rui");
        assert_eq!(pagina.proximo_cursor.as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn test_list_last_page_uses_after() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/crm/v3/objects/contacts")
                    .query_param("after", "2");
                then.status(200).json_body(json!({
                    "results": [{"id": "3", "properties": {"firstname": "Bia"}}]
                }));
            })
            .await;

        let pagina = provider(&server).listar(Some("2")).await.unwrap();

        mock.assert_async().await;
        assert_eq!(pagina.itens[0].external_id, "3");
        assert!(pagina.proximo_cursor.is_none());
    }

    #[tokio::test]
    async fn test_fetch_missing_is_none() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/crm/v3/objects/contacts/999");
                then.status(404).json_body(json!({"status": "error"}));
            })
            .await;

        assert!(provider(&server).buscar("999").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(PATCH).path("/crm/v3/objects/contacts/7");
                then.status(401).body("expired token");
            })
            .await;

        let err = provider(&server).atualizar("7", &contato()).await.unwrap_err();
        assert!(matches!(err, CrmError::Status { status: 401, ref body } if body == "expired token"));
    }

    #[tokio::test]
    async fn test_delete() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(DELETE).path("/crm/v3/objects/contacts/7");
                then.status(204);
            })
            .await;

        provider(&server).remover("7").await.unwrap();
        mock.assert_async().await;
    }
}
