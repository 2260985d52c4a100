//! Authentication middleware for protected routes.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use gestor_core::permissions::{self, Acao};
use gestor_db::Ator;
use gestor_db::repositories::RbacRepository;
use gestor_shared::{Claims, JwtError};
use tracing::warn;
use uuid::Uuid;

use crate::extractors::ClientIp;
use crate::{ApiError, AppState};

/// Extracts the bearer token from the Authorization header.
fn extract_bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
}

/// Access token from `Authorization: Bearer` or, failing that, the access cookie.
pub(crate) fn access_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(extract_bearer_token)
        .map(str::to_string);
    bearer.or_else(|| {
        CookieJar::from_headers(headers)
            .get(cookie_name)
            .map(|c| c.value().to_string())
    })
}

/// Authentication middleware that validates JWT access tokens.
///
/// Stores the [`Claims`] in the request extensions for [`AuthUser`].
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = access_token(request.headers(), &state.security.access_cookie) else {
        return ApiError::unauthorized(
            "missing_token",
            "Authorization header with Bearer token is required",
        )
        .into_response();
    };

    match state.jwt_service.validate_access_token(&token) {
        Ok(claims) => {
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(JwtError::Expired) => {
            ApiError::unauthorized("token_expired", "Token has expired").into_response()
        }
        Err(_) => {
            ApiError::unauthorized("invalid_token", "Invalid or malformed token").into_response()
        }
    }
}

/// Extractor for the authenticated colaborador.
///
/// ```ignore
/// async fn handler(State(state): State<AppState>, auth: AuthUser) -> Result<_, ApiError> {
///     auth.exigir(&state, "vendas.criar").await?;
///     // ...
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// Validated token claims.
    pub claims: Claims,
    /// Client address.
    pub ip: Option<String>,
}

impl AuthUser {
    /// Colaborador id from the claims.
    #[must_use]
    pub const fn colaborador_id(&self) -> Uuid {
        self.claims.colaborador_id()
    }

    /// Role id from the claims.
    #[must_use]
    pub const fn role_id(&self) -> Uuid {
        self.claims.role_id()
    }

    /// Degree of the colaborador's level.
    #[must_use]
    pub const fn grau(&self) -> i32 {
        self.claims.nivel
    }

    /// Audit actor for writes made by this request.
    #[must_use]
    pub fn ator(&self) -> Ator {
        Ator::new(self.colaborador_id(), self.ip.clone())
    }

    /// Fails with 403 unless the role grants `codigo`.
    pub async fn exigir(&self, state: &AppState, codigo: &str) -> Result<(), ApiError> {
        let permitido = RbacRepository::new(state.conn())
            .role_tem_permissao(self.role_id(), codigo)
            .await?;
        if permitido {
            return Ok(());
        }
        warn!(colaborador_id = %self.colaborador_id(), permissao = codigo, "permission denied");
        Err(ApiError::forbidden(
            "sem_permissao",
            format!("Permissao necessaria: {codigo}"),
        ))
    }

    /// Shorthand for `<modulo>.<acao>`.
    pub async fn exigir_acao(
        &self,
        state: &AppState,
        modulo: &str,
        acao: Acao,
    ) -> Result<(), ApiError> {
        self.exigir(state, &permissions::codigo(modulo, acao)).await
    }

    /// Read check for listings; `incluir_deletados` also needs `<modulo>.excluir`.
    pub async fn exigir_listagem(
        &self,
        state: &AppState,
        modulo: &str,
        incluir_deletados: bool,
    ) -> Result<(), ApiError> {
        self.exigir_acao(state, modulo, Acao::Visualizar).await?;
        if incluir_deletados {
            self.exigir_acao(state, modulo, Acao::Excluir).await?;
        }
        Ok(())
    }

    /// Fails with 403 when the target level is above the colaborador's own.
    pub fn exigir_grau(&self, grau_alvo: i32) -> Result<(), ApiError> {
        if permissions::pode_gerenciar(self.grau(), grau_alvo) {
            return Ok(());
        }
        warn!(
            colaborador_id = %self.colaborador_id(),
            grau = self.grau(),
            grau_alvo,
            "level rule denied"
        );
        Err(ApiError::forbidden(
            "nivel_insuficiente",
            "Nivel hierarquico superior ao seu",
        ))
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let claims = parts
            .extensions
            .get::<Claims>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("unauthorized", "Authentication required"))?;
        Ok(Self {
            claims,
            ip: ClientIp::from_headers(&parts.headers).0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use axum::http::header::COOKIE;

    #[test]
    fn test_bearer_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        headers.insert(COOKIE, HeaderValue::from_static("gestor_access=def"));
        assert_eq!(access_token(&headers, "gestor_access").as_deref(), Some("abc"));

        headers.remove(AUTHORIZATION);
        assert_eq!(access_token(&headers, "gestor_access").as_deref(), Some("def"));
        assert_eq!(access_token(&headers, "outro"), None);
    }

    #[test]
    fn test_non_bearer_scheme_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic Zm9vOmJhcg=="));
        assert_eq!(access_token(&headers, "gestor_access"), None);
    }
}
