//! Cost center routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use gestor_core::permissions::{Acao, modulos};
use gestor_db::repositories::{CreateCentroCustoInput, CentroCustoFilter, CentroCustoRepository, UpdateCentroCustoInput};
use gestor_shared::PageRequest;
use tracing::info;
use uuid::Uuid;

use crate::extractors::DetalheQuery;
use crate::middleware::auth::AuthUser;
use crate::{ApiError, AppState};

/// Creates the centros-custo router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/centros-custo", get(list).post(create))
        .route("/centros-custo/{id}", get(get_one).put(update).delete(delete))
        .route("/centros-custo/{id}/restaurar", post(restore))
}

/// GET /centros-custo - List cost centers.
async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(page): Query<PageRequest>,
    Query(filter): Query<CentroCustoFilter>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_listagem(&state, modulos::CENTROS_CUSTO, filter.incluir_deletados)
        .await?;
    let pagina = CentroCustoRepository::new(state.conn()).list(&filter, page).await?;
    Ok(Json(pagina))
}

/// GET /centros-custo/{id}
async fn get_one(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Query(query): Query<DetalheQuery>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_listagem(&state, modulos::CENTROS_CUSTO, query.incluir_deletados)
        .await?;
    let centro = CentroCustoRepository::new(state.conn())
        .find(id, query.incluir_deletados)
        .await?;
    Ok(Json(centro))
}

/// POST /centros-custo
async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<CreateCentroCustoInput>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_acao(&state, modulos::CENTROS_CUSTO, Acao::Criar).await?;
    let centro = CentroCustoRepository::new(state.conn())
        .create(&auth.ator(), input)
        .await?;
    info!(centro_id = %centro.id, "centro created");
    Ok((StatusCode::CREATED, Json(centro)))
}

/// PUT /centros-custo/{id} - Partial update.
async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateCentroCustoInput>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_acao(&state, modulos::CENTROS_CUSTO, Acao::Editar).await?;
    let centro = CentroCustoRepository::new(state.conn())
        .update(&auth.ator(), id, input)
        .await?;
    info!(centro_id = %id, "centro updated");
    Ok(Json(centro))
}

/// DELETE /centros-custo/{id} - Soft delete.
async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_acao(&state, modulos::CENTROS_CUSTO, Acao::Excluir).await?;
    CentroCustoRepository::new(state.conn())
        .delete(&auth.ator(), id)
        .await?;
    info!(centro_id = %id, "centro deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /centros-custo/{id}/restaurar
async fn restore(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_acao(&state, modulos::CENTROS_CUSTO, Acao::Editar).await?;
    let centro = CentroCustoRepository::new(state.conn())
        .restore(&auth.ator(), id)
        .await?;
    info!(centro_id = %id, "centro restored");
    Ok(Json(centro))
}
