//! Request extractors shared by handlers.

use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::USER_AGENT, request::Parts},
};
use gestor_db::repositories::SessionMeta;
use serde::Deserialize;

/// Client address taken from `X-Forwarded-For` (first hop) or `X-Real-IP`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientIp(pub Option<String>);

impl ClientIp {
    /// Reads the address from proxy headers.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|h| h.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        let real = headers
            .get("x-real-ip")
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        Self(forwarded.or(real).map(str::to_string))
    }

    /// The address, or `"desconhecido"` for keys that need one.
    #[must_use]
    pub fn chave(&self) -> &str {
        self.0.as_deref().unwrap_or("desconhecido")
    }
}

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}

/// Session metadata (user agent and address) of the current request.
#[derive(Debug, Clone, Default)]
pub struct Sessao(pub SessionMeta);

impl<S> FromRequestParts<S> for Sessao
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(SessionMeta {
            user_agent: parts
                .headers
                .get(USER_AGENT)
                .and_then(|h| h.to_str().ok())
                .map(|ua| ua.chars().take(255).collect()),
            ip: ClientIp::from_headers(&parts.headers).0,
        }))
    }
}

/// `?incluir_deletados=true` on single-resource reads.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct DetalheQuery {
    /// Also return soft-deleted rows.
    #[serde(default)]
    pub incluir_deletados: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_client_ip_prefers_first_forwarded_hop() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("10.0.0.1, 172.16.0.1"));
        headers.insert("x-real-ip", HeaderValue::from_static("192.168.0.9"));
        assert_eq!(ClientIp::from_headers(&headers).0.as_deref(), Some("10.0.0.1"));

        headers.remove("x-forwarded-for");
        assert_eq!(ClientIp::from_headers(&headers).0.as_deref(), Some("192.168.0.9"));
    }

    #[test]
    fn test_client_ip_missing() {
        let ip = ClientIp::from_headers(&HeaderMap::new());
        assert_eq!(ip, ClientIp(None));
        assert_eq!(ip.chave(), "desconhecido");
    }
}
