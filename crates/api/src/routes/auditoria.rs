//! Audit trail query.

use axum::{
    Json, Router,
    extract::{Query, State},
    response::IntoResponse,
    routing::get,
};
use gestor_db::repositories::{AuditoriaFilter, AuditoriaRepository};
use gestor_shared::PageRequest;

use crate::middleware::auth::AuthUser;
use crate::{ApiError, AppState};

/// Creates the auditoria router.
pub fn routes() -> Router<AppState> {
    Router::new().route("/auditoria", get(list))
}

/// GET /auditoria - Newest first; filters `entidade`, `entidade_id`, `colaborador_id`, `acao`.
async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(page): Query<PageRequest>,
    Query(filter): Query<AuditoriaFilter>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir(&state, "auditoria.visualizar").await?;
    let pagina = AuditoriaRepository::new(state.conn())
        .list(&filter, page)
        .await?;
    Ok(Json(pagina))
}
