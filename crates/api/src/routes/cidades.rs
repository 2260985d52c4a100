//! City lookup routes (read-only).

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
};
use gestor_core::permissions::{Acao, modulos};
use gestor_db::repositories::{CidadeFilter, CidadeRepository};
use gestor_shared::PageRequest;
use uuid::Uuid;

use crate::middleware::auth::AuthUser;
use crate::{ApiError, AppState};

/// Creates the cidades router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/cidades", get(list))
        .route("/cidades/{id}", get(get_one))
}

/// GET /cidades - Filter by `uf` and name (`busca`).
async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(page): Query<PageRequest>,
    Query(filter): Query<CidadeFilter>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_acao(&state, modulos::CIDADES, Acao::Visualizar)
        .await?;
    Ok(Json(CidadeRepository::new(state.conn()).list(&filter, page).await?))
}

/// GET /cidades/{id}
async fn get_one(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_acao(&state, modulos::CIDADES, Acao::Visualizar)
        .await?;
    Ok(Json(CidadeRepository::new(state.conn()).find(id).await?))
}
