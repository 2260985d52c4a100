//! Provider-neutral contact model and the adapter trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::CrmError;

/// Contact fields exchanged with a CRM.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrmContato {
    /// Full name.
    pub nome: String,
    /// E-mail.
    pub email: Option<String>,
    /// Phone.
    pub telefone: Option<String>,
    /// CPF or CNPJ, digits only.
    pub documento: Option<String>,
    /// Company name.
    pub empresa: Option<String>,
}

/// A contact as stored in the CRM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrmRegistro {
    /// CRM identifier, stored locally as `external_id`.
    pub external_id: String,
    /// Contact data.
    pub contato: CrmContato,
}

/// One page of a listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrmPagina {
    /// Contacts on this page.
    pub itens: Vec<CrmRegistro>,
    /// Cursor of the next page; `None` on the last page.
    pub proximo_cursor: Option<String>,
}

/// Contact operations against an external CRM.
#[async_trait]
pub trait CrmProvider: Send + Sync {
    /// Provider name used in logs and audit rows.
    fn nome(&self) -> &'static str;

    /// Creates a contact and returns its external id.
    async fn criar(&self, contato: &CrmContato) -> Result<String, CrmError>;

    /// Overwrites a contact.
    async fn atualizar(&self, external_id: &str, contato: &CrmContato) -> Result<(), CrmError>;

    /// Fetches a contact; `None` when it does not exist.
    async fn buscar(&self, external_id: &str) -> Result<Option<CrmRegistro>, CrmError>;

    /// Lists one page starting at `cursor` (`None` for the first page).
    async fn listar(&self, cursor: Option<&str>) -> Result<CrmPagina, CrmError>;

    /// Deletes a contact.
    async fn remover(&self, external_id: &str) -> Result<(), CrmError>;
}

/// Splits a full name into first name and the rest.
pub(crate) fn dividir_nome(nome: &str) -> (String, String) {
    let nome = nome.trim();
    match nome.split_once(char::is_whitespace) {
        Some((primeiro, resto)) => (primeiro.to_string(), resto.trim().to_string()),
        None => (nome.to_string(), String::new()),
    }
}

/// Joins first and last name, skipping blanks.
pub(crate) fn juntar_nome(primeiro: Option<&str>, ultimo: Option<&str>) -> String {
    [primeiro, ultimo]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

pub(crate) fn nao_vazio(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_helpers() {
        assert_eq!(
            dividir_nome(" Maria da Silva "),
            ("Maria".to_string(), "da Silva".to_string())
        );
        assert_eq!(dividir_nome("Cher"), ("Cher".to_string(), String::new()));
        assert_eq!(juntar_nome(Some("Maria"), Some(" ")), "Maria");
        assert_eq!(juntar_nome(None, None), "");
        assert_eq!(nao_vazio(Some("  ")), None);
    }
}
