//! CSRF validation for state-changing requests.
//!
//! Runs after [`super::auth::auth_middleware`]: the token in `X-CSRF-Token` must
//! belong to the authenticated colaborador and be unexpired.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use gestor_core::security::metodo_exige_csrf;
use gestor_db::repositories::CsrfRepository;
use gestor_shared::Claims;
use tracing::warn;

use crate::{ApiError, AppState, CSRF_HEADER};

/// Rejects mutating requests without a valid CSRF token with 403 `csrf_invalido`.
pub async fn csrf_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if !state.security.csrf_enabled || !metodo_exige_csrf(request.method().as_str()) {
        return next.run(request).await;
    }

    let Some(colaborador_id) = request.extensions().get::<Claims>().map(|c| c.sub) else {
        return ApiError::unauthorized("unauthorized", "Authentication required").into_response();
    };
    let token = request
        .headers()
        .get(&CSRF_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|t| !t.is_empty());

    let valido = match token {
        Some(token) => match CsrfRepository::new(state.conn())
            .validate(colaborador_id, token)
            .await
        {
            Ok(valido) => valido,
            Err(e) => return ApiError::from(e).into_response(),
        },
        None => false,
    };

    if valido {
        next.run(request).await
    } else {
        warn!(%colaborador_id, method = %request.method(), "CSRF token rejected");
        ApiError::forbidden("csrf_invalido", "Token CSRF ausente, invalido ou expirado")
            .into_response()
    }
}
