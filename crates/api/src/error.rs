//! JSON error envelope returned by every handler.
//!
//! Errors render as `{"error": "<code>", "message": "<text>"}`; validation
//! failures add `"details": {"campo": ["mensagem", ...]}` and rate-limit blocks
//! add `"retry_after"` plus the `Retry-After` header.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header::RETRY_AFTER},
    response::{IntoResponse, Response},
};
use gestor_core::validation::FieldErrors;
use gestor_crm::CrmError;
use gestor_db::RepositoryError;
use gestor_shared::AppError;
use sea_orm::DbErr;
use serde_json::json;
use tracing::error;

/// Error returned by handlers and middleware.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: String,
    message: String,
    details: Option<FieldErrors>,
    retry_after: Option<u64>,
}

impl ApiError {
    /// Builds an error with an explicit status and code.
    #[must_use]
    pub fn new(status: StatusCode, code: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.to_string(),
            message: message.into(),
            details: None,
            retry_after: None,
        }
    }

    /// 401 with the given code.
    #[must_use]
    pub fn unauthorized(code: &str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, code, message)
    }

    /// 403 with the given code.
    #[must_use]
    pub fn forbidden(code: &str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, code, message)
    }

    /// 429 carrying the seconds left on the block.
    #[must_use]
    pub fn too_many_requests(retry_after_secs: u64) -> Self {
        AppError::TooManyRequests { retry_after_secs }.into()
    }

    /// 400 with per-field messages.
    #[must_use]
    pub fn validation(details: FieldErrors) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code: "validation_error".to_string(),
            message: "Dados invalidos".to_string(),
            details: Some(details),
            retry_after: None,
        }
    }

    /// 503 returned by CRM endpoints when no provider is configured.
    #[must_use]
    pub fn crm_desabilitado() -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "crm_desabilitado",
            "Nenhum provedor de CRM configurado",
        )
    }

    /// HTTP status of this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let message = if err.is_internal() {
            error!(error = %err, "internal error");
            "Erro interno do servidor".to_string()
        } else {
            match &err {
                AppError::Unauthorized(m)
                | AppError::Forbidden(m)
                | AppError::NotFound(m)
                | AppError::Validation(m)
                | AppError::BusinessRule(m)
                | AppError::Conflict(m)
                | AppError::ExternalService(m)
                | AppError::Unavailable(m) => m.clone(),
                other => other.to_string(),
            }
        };
        let retry_after = match err {
            AppError::TooManyRequests { retry_after_secs } => Some(retry_after_secs),
            _ => None,
        };
        Self {
            status,
            code: err.error_code().to_ascii_lowercase(),
            message,
            details: None,
            retry_after,
        }
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Validation(details) => Self::validation(details),
            other => AppError::from(other).into(),
        }
    }
}

impl From<FieldErrors> for ApiError {
    fn from(errors: FieldErrors) -> Self {
        Self::validation(errors)
    }
}

impl From<DbErr> for ApiError {
    fn from(err: DbErr) -> Self {
        AppError::Database(err.to_string()).into()
    }
}

impl From<CrmError> for ApiError {
    fn from(err: CrmError) -> Self {
        if !matches!(err, CrmError::NaoEncontrado(_)) {
            error!(error = %err, "CRM request failed");
        }
        AppError::from(err).into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = json!({
            "error": self.code,
            "message": self.message,
        });
        if let Some(details) = &self.details {
            body["details"] = json!(details);
        }
        if let Some(secs) = self.retry_after {
            body["retry_after"] = json!(secs);
        }

        let mut response = (self.status, Json(body)).into_response();
        if let Some(secs) = self.retry_after
            && let Ok(value) = HeaderValue::from_str(&secs.to_string())
        {
            response.headers_mut().insert(RETRY_AFTER, value);
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use rstest::rstest;
    use uuid::Uuid;

    async fn corpo(err: ApiError) -> (StatusCode, serde_json::Value, Option<String>) {
        let response = err.into_response();
        let status = response.status();
        let retry = response
            .headers()
            .get(RETRY_AFTER)
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap(), retry)
    }

    #[tokio::test]
    async fn test_validation_carries_details() {
        let mut errors = FieldErrors::new();
        errors.add("email", "email invalido");
        errors.add("email", "obrigatorio");
        let (status, body, _) = corpo(RepositoryError::Validation(errors).into()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation_error");
        assert_eq!(body["details"]["email"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_database_errors_are_not_leaked() {
        let err: ApiError = DbErr::Custom("relation \"x\" does not exist".into()).into();
        let (status, body, _) = corpo(err).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "database_error");
        assert!(!body["message"].as_str().unwrap().contains("relation"));
    }

    #[tokio::test]
    async fn test_rate_limit_sets_retry_after() {
        let (status, body, retry) = corpo(ApiError::too_many_requests(42)).await;

        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["retry_after"], 42);
        assert_eq!(retry.as_deref(), Some("42"));
    }

    #[rstest]
    #[case(RepositoryError::NotFound { entidade: "clientes", id: Uuid::nil() }, StatusCode::NOT_FOUND, "not_found")]
    #[case(RepositoryError::Duplicate { campo: "cnpj", valor: "1".into() }, StatusCode::CONFLICT, "conflict")]
    #[case(RepositoryError::InUse("roles".into()), StatusCode::CONFLICT, "conflict")]
    #[case(RepositoryError::InvalidState("cancelada".into()), StatusCode::UNPROCESSABLE_ENTITY, "business_rule_violation")]
    fn test_repository_error_status(
        #[case] err: RepositoryError,
        #[case] status: StatusCode,
        #[case] code: &str,
    ) {
        let api: ApiError = err.into();
        assert_eq!(api.status(), status);
        assert_eq!(api.code(), code);
    }

    #[test]
    fn test_crm_disabled() {
        let err = ApiError::crm_desabilitado();
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.code(), "crm_desabilitado");
    }
}
