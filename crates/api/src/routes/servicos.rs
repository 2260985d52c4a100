//! Service catalog routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use gestor_core::permissions::{Acao, modulos};
use gestor_db::repositories::{CreateServicoInput, ServicoFilter, ServicoRepository, UpdateServicoInput};
use gestor_shared::PageRequest;
use tracing::info;
use uuid::Uuid;

use crate::extractors::DetalheQuery;
use crate::middleware::auth::AuthUser;
use crate::{ApiError, AppState};

/// Creates the servicos router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/servicos", get(list).post(create))
        .route("/servicos/{id}", get(get_one).put(update).delete(delete))
        .route("/servicos/{id}/restaurar", post(restore))
}

/// GET /servicos - List services.
async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(page): Query<PageRequest>,
    Query(filter): Query<ServicoFilter>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_listagem(&state, modulos::SERVICOS, filter.incluir_deletados)
        .await?;
    let pagina = ServicoRepository::new(state.conn()).list(&filter, page).await?;
    Ok(Json(pagina))
}

/// GET /servicos/{id}
async fn get_one(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Query(query): Query<DetalheQuery>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_listagem(&state, modulos::SERVICOS, query.incluir_deletados)
        .await?;
    let servico = ServicoRepository::new(state.conn())
        .find(id, query.incluir_deletados)
        .await?;
    Ok(Json(servico))
}

/// POST /servicos
async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<CreateServicoInput>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_acao(&state, modulos::SERVICOS, Acao::Criar).await?;
    let servico = ServicoRepository::new(state.conn())
        .create(&auth.ator(), input)
        .await?;
    info!(servico_id = %servico.id, "servico created");
    Ok((StatusCode::CREATED, Json(servico)))
}

/// PUT /servicos/{id} - Partial update.
async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateServicoInput>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_acao(&state, modulos::SERVICOS, Acao::Editar).await?;
    let servico = ServicoRepository::new(state.conn())
        .update(&auth.ator(), id, input)
        .await?;
    info!(servico_id = %id, "servico updated");
    Ok(Json(servico))
}

/// DELETE /servicos/{id} - Soft delete.
async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_acao(&state, modulos::SERVICOS, Acao::Excluir).await?;
    ServicoRepository::new(state.conn())
        .delete(&auth.ator(), id)
        .await?;
    info!(servico_id = %id, "servico deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /servicos/{id}/restaurar
async fn restore(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_acao(&state, modulos::SERVICOS, Acao::Editar).await?;
    let servico = ServicoRepository::new(state.conn())
        .restore(&auth.ator(), id)
        .await?;
    info!(servico_id = %id, "servico restored");
    Ok(Json(servico))
}
