//! Pipedrive v1 persons adapter.
//!
//! Every response is wrapped in `{"success": bool, "data": ...}`; listing pages
//! by `start`/`limit` and reports `additional_data.pagination.next_start`.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;

use crate::error::check_status;
use crate::provider::nao_vazio;
use crate::{CrmContato, CrmError, CrmPagina, CrmProvider, CrmRegistro};

const PERSONS_PATH: &str = "/api/v1/persons";

/// Pipedrive persons through an `api_token` query parameter.
pub struct PipedriveProvider {
    client: Client,
    base_url: String,
    token: String,
    page_size: u32,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    data: Option<T>,
    error: Option<String>,
    additional_data: Option<AdditionalData>,
}

#[derive(Debug, Deserialize)]
struct AdditionalData {
    pagination: Option<Pagination>,
}

#[derive(Debug, Deserialize)]
struct Pagination {
    #[serde(default)]
    more_items_in_collection: bool,
    next_start: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct Person {
    id: u64,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Vec<ContactValue>,
    #[serde(default)]
    phone: Vec<ContactValue>,
    #[serde(default)]
    org_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContactValue {
    value: String,
    #[serde(default)]
    primary: bool,
}

fn principal(values: &[ContactValue]) -> Option<String> {
    values
        .iter()
        .find(|v| v.primary)
        .or_else(|| values.first())
        .and_then(|v| nao_vazio(Some(v.value.as_str())))
}

impl Person {
    fn into_registro(self) -> CrmRegistro {
        CrmRegistro {
            external_id: self.id.to_string(),
            contato: CrmContato {
                nome: self.name.unwrap_or_default().trim().to_string(),
                email: principal(&self.email),
                telefone: principal(&self.phone),
                documento: None,
                empresa: nao_vazio(self.org_name.as_deref()),
            },
        }
    }
}

impl PipedriveProvider {
    /// Public API host.
    pub const DEFAULT_BASE_URL: &'static str = "https://api.pipedrive.com";

    /// Creates the adapter. `base_url` has no trailing slash.
    #[must_use]
    pub fn new(client: Client, base_url: String, token: String, page_size: u32) -> Self {
        Self {
            client,
            base_url,
            token,
            page_size: page_size.clamp(1, 500),
        }
    }

    fn url(&self, suffix: &str) -> String {
        format!("{}{PERSONS_PATH}{suffix}", self.base_url)
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        request.query(&[("api_token", self.token.as_str())])
    }

    fn body(contato: &CrmContato) -> Value {
        let mut body = json!({ "name": contato.nome.trim() });
        if let Some(email) = &contato.email {
            body["email"] = json!([{ "value": email, "primary": true }]);
        }
        if let Some(telefone) = &contato.telefone {
            body["phone"] = json!([{ "value": telefone, "primary": true }]);
        }
        body
    }

    async fn envelope<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<Envelope<T>, CrmError> {
        let envelope: Envelope<T> = check_status(response).await?.json().await?;
        if !envelope.success {
            return Err(CrmError::RespostaInvalida(
                envelope.error.unwrap_or_else(|| "success=false".into()),
            ));
        }
        Ok(envelope)
    }
}

#[async_trait]
impl CrmProvider for PipedriveProvider {
    fn nome(&self) -> &'static str {
        "pipedrive"
    }

    async fn criar(&self, contato: &CrmContato) -> Result<String, CrmError> {
        let response = self
            .authed(self.client.post(self.url("")))
            .json(&Self::body(contato))
            .send()
            .await?;
        let person = Self::envelope::<Person>(response)
            .await?
            .data
            .ok_or_else(|| CrmError::RespostaInvalida("missing data".into()))?;
        debug!(external_id = person.id, "pipedrive person created");
        Ok(person.id.to_string())
    }

    async fn atualizar(&self, external_id: &str, contato: &CrmContato) -> Result<(), CrmError> {
        let response = self
            .authed(self.client.put(self.url(&format!("/{external_id}"))))
            .json(&Self::body(contato))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(CrmError::NaoEncontrado(external_id.to_string()));
        }
        Self::envelope::<Value>(response).await?;
        Ok(())
    }

    async fn buscar(&self, external_id: &str) -> Result<Option<CrmRegistro>, CrmError> {
        let response = self
            .authed(self.client.get(self.url(&format!("/{external_id}"))))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let envelope = Self::envelope::<Person>(response).await?;
        Ok(envelope.data.map(Person::into_registro))
    }

    async fn listar(&self, cursor: Option<&str>) -> Result<CrmPagina, CrmError> {
        let start = cursor.unwrap_or("0");
        let response = self
            .authed(self.client.get(self.url("")))
            .query(&[("start", start.to_string()), ("limit", self.page_size.to_string())])
            .send()
            .await?;
        let envelope = Self::envelope::<Vec<Person>>(response).await?;

        let proximo_cursor = envelope
            .additional_data
            .and_then(|a| a.pagination)
            .filter(|p| p.more_items_in_collection)
            .and_then(|p| p.next_start)
            .map(|n| n.to_string());

        Ok(CrmPagina {
            itens: envelope
                .data
                .unwrap_or_default()
                .into_iter()
                .map(Person::into_registro)
                .collect(),
            proximo_cursor,
        })
    }

    async fn remover(&self, external_id: &str) -> Result<(), CrmError> {
        let response = self
            .authed(self.client.delete(self.url(&format!("/{external_id}"))))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(CrmError::NaoEncontrado(external_id.to_string()));
        }
        Self::envelope::<Value>(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn provider(server: &MockServer) -> PipedriveProvider {
        PipedriveProvider::new(Client::new(), server.base_url(), "tok".into(), 2)
    }

    #[tokio::test]
    async fn test_create_uses_api_token_query() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/v1/persons")
                    .query_param("api_token", "tok")
                    .json_body(json!({
                        "name": "Joao Souza",
                        "email": [{"value": "joao@x.com", "primary": true}]
                    }));
                then.status(201)
                    .json_body(json!({"success": true, "data": {"id": 42, "name": "Joao Souza"}}));
            })
            .await;

        let contato = CrmContato {
            nome: "Joao Souza".into(),
            email: Some("joao@x.com".into()),
            ..CrmContato::default()
        };
        let id = provider(&server).criar(&contato).await.unwrap();

        mock.assert_async().await;
        assert_eq!(id, "42");
    }

    #[tokio::test]
    async fn test_list_reads_next_start() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/api/v1/persons")
                    .query_param("start", "0")
                    .query_param("limit", "2");
                then.status(200).json_body(json!({
                    "success": true,
                    "data": [
                        {
                            "id": 1,
                            "name": "Ana",
                            "email": [{"value": "outro@x.com", "primary": false}, {"value": "ana@x.com", "primary": true}],
                            "phone": [{"value": "1133334444", "primary": true}],
                            "org_name": "Loja Ana"
                        },
                        {"id": 2, "name": " ", "email": [], "phone": []}
                    ],
                    "additional_data": {"pagination": {"start": 0, "limit": 2, "more_items_in_collection": true, "next_start": 2}}
                }));
            })
            .await;

        let pagina = provider(&server).listar(None).await.unwrap();

        assert_eq!(pagina.itens.len(), 2);
        assert_eq!(pagina.itens[0].contato.email.as_deref(), Some("ana@x.com"));
        assert_eq!(pagina.itens[0].contato.empresa.as_deref(), Some("Loja Ana"));
        assert_eq!(pagina.itens[1].contato.nome, "");
        assert_eq!(pagina.proximo_cursor.as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn test_last_page_and_empty_data() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/v1/persons").query_param("start", "4");
                then.status(200).json_body(json!({
                    "success": true,
                    "data": null,
                    "additional_data": {"pagination": {"more_items_in_collection": false}}
                }));
            })
            .await;

        let pagina = provider(&server).listar(Some("4")).await.unwrap();
        assert!(pagina.itens.is_empty());
        assert!(pagina.proximo_cursor.is_none());
    }

    #[tokio::test]
    async fn test_success_false_is_an_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(PUT).path("/api/v1/persons/9");
                then.status(200)
                    .json_body(json!({"success": false, "error": "Person is deleted"}));
            })
            .await;

        let err = provider(&server)
            .atualizar("9", &CrmContato::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CrmError::RespostaInvalida(ref m) if m == "Person is deleted"));
    }

    #[tokio::test]
    async fn test_fetch_and_missing() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/v1/persons/5");
                then.status(200)
                    .json_body(json!({"success": true, "data": {"id": 5, "name": "Bia"}}));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/v1/persons/6");
                then.status(404)
                    .json_body(json!({"success": false, "error": "not found"}));
            })
            .await;

        let crm = provider(&server);
        let registro = crm.buscar("5").await.unwrap().unwrap();
        assert_eq!(registro.external_id, "5");
        assert_eq!(registro.contato.nome, "Bia");
        assert!(crm.buscar("6").await.unwrap().is_none());
    }
}
