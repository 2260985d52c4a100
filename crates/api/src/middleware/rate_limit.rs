//! Per-IP limit on the public authentication routes.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use gestor_core::security::{RateLimitPolicy, RateLimitStatus};
use gestor_db::repositories::RateLimitRepository;
use gestor_shared::SecurityConfig;
use tracing::warn;

use crate::extractors::ClientIp;
use crate::{ApiError, AppState};

/// Action name of the general auth-route limit.
pub const ACAO_AUTH: &str = "auth";
/// Action name of the login brute-force guard.
pub const ACAO_LOGIN: &str = "login";

/// Brute-force policy for `POST /auth/login`.
#[must_use]
pub fn politica_login(config: &SecurityConfig) -> RateLimitPolicy {
    RateLimitPolicy::from_secs(
        config.login_max_attempts,
        config.login_window_secs,
        config.login_block_secs,
    )
}

/// Request-rate policy for the public auth routes.
#[must_use]
pub fn politica_auth(config: &SecurityConfig) -> RateLimitPolicy {
    RateLimitPolicy::from_secs(
        config.auth_max_requests,
        config.auth_window_secs,
        config.auth_block_secs,
    )
}

/// Counts every request per client IP; answers 429 while the IP is blocked.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let ip = ClientIp::from_headers(request.headers());
    let policy = politica_auth(&state.security);
    let repo = RateLimitRepository::new(state.conn());
    let agora = Utc::now();

    let status = match repo.status(&policy, ip.chave(), ACAO_AUTH, agora).await {
        Ok(RateLimitStatus::Liberado) => repo.registrar(&policy, ip.chave(), ACAO_AUTH, agora).await,
        Ok(bloqueado) => Ok(bloqueado),
        Err(e) => Err(e),
    };

    match status {
        Ok(RateLimitStatus::Liberado) => next.run(request).await,
        Ok(bloqueado) => {
            warn!(ip = ip.chave(), path = %request.uri().path(), "auth rate limit reached");
            ApiError::too_many_requests(bloqueado.retry_after_secs(agora)).into_response()
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policies_follow_config() {
        let config = SecurityConfig {
            login_max_attempts: 3,
            login_window_secs: 60,
            login_block_secs: 120,
            auth_max_requests: 10,
            ..SecurityConfig::default()
        };
        let login = politica_login(&config);
        assert_eq!(login.max_tentativas, 3);
        assert_eq!(login.bloqueio.num_seconds(), 120);
        assert_eq!(politica_auth(&config).max_tentativas, 10);
    }
}
