//! Product routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use gestor_core::permissions::{Acao, modulos};
use gestor_db::repositories::{CreateProdutoInput, ProdutoFilter, ProdutoRepository, UpdateProdutoInput};
use gestor_shared::PageRequest;
use tracing::info;
use uuid::Uuid;

use crate::extractors::DetalheQuery;
use crate::middleware::auth::AuthUser;
use crate::{ApiError, AppState};

/// Creates the produtos router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/produtos", get(list).post(create))
        .route("/produtos/{id}", get(get_one).put(update).delete(delete))
        .route("/produtos/{id}/restaurar", post(restore))
}

/// GET /produtos - List products.
async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(page): Query<PageRequest>,
    Query(filter): Query<ProdutoFilter>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_listagem(&state, modulos::PRODUTOS, filter.incluir_deletados)
        .await?;
    let pagina = ProdutoRepository::new(state.conn()).list(&filter, page).await?;
    Ok(Json(pagina))
}

/// GET /produtos/{id}
async fn get_one(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Query(query): Query<DetalheQuery>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_listagem(&state, modulos::PRODUTOS, query.incluir_deletados)
        .await?;
    let produto = ProdutoRepository::new(state.conn())
        .find(id, query.incluir_deletados)
        .await?;
    Ok(Json(produto))
}

/// POST /produtos
async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<CreateProdutoInput>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_acao(&state, modulos::PRODUTOS, Acao::Criar).await?;
    let produto = ProdutoRepository::new(state.conn())
        .create(&auth.ator(), input)
        .await?;
    info!(produto_id = %produto.id, "produto created");
    Ok((StatusCode::CREATED, Json(produto)))
}

/// PUT /produtos/{id} - Partial update.
async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateProdutoInput>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_acao(&state, modulos::PRODUTOS, Acao::Editar).await?;
    let produto = ProdutoRepository::new(state.conn())
        .update(&auth.ator(), id, input)
        .await?;
    info!(produto_id = %id, "produto updated");
    Ok(Json(produto))
}

/// DELETE /produtos/{id} - Soft delete.
async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_acao(&state, modulos::PRODUTOS, Acao::Excluir).await?;
    ProdutoRepository::new(state.conn())
        .delete(&auth.ator(), id)
        .await?;
    info!(produto_id = %id, "produto deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /produtos/{id}/restaurar
async fn restore(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_acao(&state, modulos::PRODUTOS, Acao::Editar).await?;
    let produto = ProdutoRepository::new(state.conn())
        .restore(&auth.ator(), id)
        .await?;
    info!(produto_id = %id, "produto restored");
    Ok(Json(produto))
}
