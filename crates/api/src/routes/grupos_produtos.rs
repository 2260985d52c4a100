//! Product group routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use gestor_core::permissions::{Acao, modulos};
use gestor_db::repositories::{CreateGrupoProdutoInput, GrupoProdutoFilter, GrupoProdutoRepository, UpdateGrupoProdutoInput};
use gestor_shared::PageRequest;
use tracing::info;
use uuid::Uuid;

use crate::extractors::DetalheQuery;
use crate::middleware::auth::AuthUser;
use crate::{ApiError, AppState};

/// Creates the grupos-produtos router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/grupos-produtos", get(list).post(create))
        .route("/grupos-produtos/{id}", get(get_one).put(update).delete(delete))
        .route("/grupos-produtos/{id}/restaurar", post(restore))
}

/// GET /grupos-produtos - List product groups.
async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(page): Query<PageRequest>,
    Query(filter): Query<GrupoProdutoFilter>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_listagem(&state, modulos::GRUPOS_PRODUTOS, filter.incluir_deletados)
        .await?;
    let pagina = GrupoProdutoRepository::new(state.conn()).list(&filter, page).await?;
    Ok(Json(pagina))
}

/// GET /grupos-produtos/{id}
async fn get_one(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Query(query): Query<DetalheQuery>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_listagem(&state, modulos::GRUPOS_PRODUTOS, query.incluir_deletados)
        .await?;
    let grupo = GrupoProdutoRepository::new(state.conn())
        .find(id, query.incluir_deletados)
        .await?;
    Ok(Json(grupo))
}

/// POST /grupos-produtos
async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<CreateGrupoProdutoInput>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_acao(&state, modulos::GRUPOS_PRODUTOS, Acao::Criar).await?;
    let grupo = GrupoProdutoRepository::new(state.conn())
        .create(&auth.ator(), input)
        .await?;
    info!(grupo_id = %grupo.id, "grupo created");
    Ok((StatusCode::CREATED, Json(grupo)))
}

/// PUT /grupos-produtos/{id} - Partial update.
async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateGrupoProdutoInput>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_acao(&state, modulos::GRUPOS_PRODUTOS, Acao::Editar).await?;
    let grupo = GrupoProdutoRepository::new(state.conn())
        .update(&auth.ator(), id, input)
        .await?;
    info!(grupo_id = %id, "grupo updated");
    Ok(Json(grupo))
}

/// DELETE /grupos-produtos/{id} - Soft delete.
async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_acao(&state, modulos::GRUPOS_PRODUTOS, Acao::Excluir).await?;
    GrupoProdutoRepository::new(state.conn())
        .delete(&auth.ator(), id)
        .await?;
    info!(grupo_id = %id, "grupo deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /grupos-produtos/{id}/restaurar
async fn restore(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_acao(&state, modulos::GRUPOS_PRODUTOS, Acao::Editar).await?;
    let grupo = GrupoProdutoRepository::new(state.conn())
        .restore(&auth.ator(), id)
        .await?;
    info!(grupo_id = %id, "grupo restored");
    Ok(Json(grupo))
}
