//! CRM error types.

use gestor_shared::AppError;
use thiserror::Error;

/// Errors raised by CRM adapters.
#[derive(Debug, Error)]
pub enum CrmError {
    /// Transport failure (connect, timeout, TLS, body decode).
    #[error("CRM request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status.
    #[error("CRM answered {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated.
        body: String,
    },

    /// Response did not have the expected shape.
    #[error("unexpected CRM response: {0}")]
    RespostaInvalida(String),

    /// Contact does not exist in the CRM.
    #[error("CRM contact not found: {0}")]
    NaoEncontrado(String),

    /// Provider misconfigured.
    #[error("CRM configuration error: {0}")]
    Configuracao(String),
}

impl From<CrmError> for AppError {
    fn from(err: CrmError) -> Self {
        match err {
            CrmError::NaoEncontrado(id) => Self::NotFound(format!("contato {id} nao existe no CRM")),
            CrmError::Configuracao(msg) => Self::Unavailable(msg),
            other => Self::ExternalService(other.to_string()),
        }
    }
}

/// Maps a non-success response into [`CrmError::Status`].
pub(crate) async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, CrmError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let mut body = response.text().await.unwrap_or_default();
    body.truncate(500);
    Err(CrmError::Status {
        status: status.as_u16(),
        body,
    })
}
