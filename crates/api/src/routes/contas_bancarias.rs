//! Bank account routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use gestor_core::permissions::{Acao, modulos};
use gestor_db::repositories::{CreateContaBancariaInput, ContaBancariaFilter, ContaBancariaRepository, UpdateContaBancariaInput};
use gestor_shared::PageRequest;
use tracing::info;
use uuid::Uuid;

use crate::extractors::DetalheQuery;
use crate::middleware::auth::AuthUser;
use crate::{ApiError, AppState};

/// Creates the contas-bancarias router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/contas-bancarias", get(list).post(create))
        .route("/contas-bancarias/{id}", get(get_one).put(update).delete(delete))
        .route("/contas-bancarias/{id}/restaurar", post(restore))
}

/// GET /contas-bancarias - List bank accounts.
async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(page): Query<PageRequest>,
    Query(filter): Query<ContaBancariaFilter>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_listagem(&state, modulos::CONTAS_BANCARIAS, filter.incluir_deletados)
        .await?;
    let pagina = ContaBancariaRepository::new(state.conn()).list(&filter, page).await?;
    Ok(Json(pagina))
}

/// GET /contas-bancarias/{id}
async fn get_one(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Query(query): Query<DetalheQuery>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_listagem(&state, modulos::CONTAS_BANCARIAS, query.incluir_deletados)
        .await?;
    let conta = ContaBancariaRepository::new(state.conn())
        .find(id, query.incluir_deletados)
        .await?;
    Ok(Json(conta))
}

/// POST /contas-bancarias
async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<CreateContaBancariaInput>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_acao(&state, modulos::CONTAS_BANCARIAS, Acao::Criar).await?;
    let conta = ContaBancariaRepository::new(state.conn())
        .create(&auth.ator(), input)
        .await?;
    info!(conta_id = %conta.id, "conta created");
    Ok((StatusCode::CREATED, Json(conta)))
}

/// PUT /contas-bancarias/{id} - Partial update.
async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateContaBancariaInput>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_acao(&state, modulos::CONTAS_BANCARIAS, Acao::Editar).await?;
    let conta = ContaBancariaRepository::new(state.conn())
        .update(&auth.ator(), id, input)
        .await?;
    info!(conta_id = %id, "conta updated");
    Ok(Json(conta))
}

/// DELETE /contas-bancarias/{id} - Soft delete.
async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_acao(&state, modulos::CONTAS_BANCARIAS, Acao::Excluir).await?;
    ContaBancariaRepository::new(state.conn())
        .delete(&auth.ator(), id)
        .await?;
    info!(conta_id = %id, "conta deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /contas-bancarias/{id}/restaurar
async fn restore(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_acao(&state, modulos::CONTAS_BANCARIAS, Acao::Editar).await?;
    let conta = ContaBancariaRepository::new(state.conn())
        .restore(&auth.ator(), id)
        .await?;
    info!(conta_id = %id, "conta restored");
    Ok(Json(conta))
}
