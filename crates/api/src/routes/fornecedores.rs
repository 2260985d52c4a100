//! Supplier (fornecedor) routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use gestor_core::permissions::{Acao, modulos};
use gestor_db::repositories::{CreateFornecedorInput, FornecedorFilter, FornecedorRepository, UpdateFornecedorInput};
use gestor_shared::PageRequest;
use tracing::info;
use uuid::Uuid;

use crate::extractors::DetalheQuery;
use crate::middleware::auth::AuthUser;
use crate::{ApiError, AppState};

/// Creates the fornecedores router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/fornecedores", get(list).post(create))
        .route("/fornecedores/{id}", get(get_one).put(update).delete(delete))
        .route("/fornecedores/{id}/restaurar", post(restore))
}

/// GET /fornecedores - List suppliers.
async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(page): Query<PageRequest>,
    Query(filter): Query<FornecedorFilter>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_listagem(&state, modulos::FORNECEDORES, filter.incluir_deletados)
        .await?;
    let pagina = FornecedorRepository::new(state.conn()).list(&filter, page).await?;
    Ok(Json(pagina))
}

/// GET /fornecedores/{id}
async fn get_one(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Query(query): Query<DetalheQuery>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_listagem(&state, modulos::FORNECEDORES, query.incluir_deletados)
        .await?;
    let fornecedor = FornecedorRepository::new(state.conn())
        .find(id, query.incluir_deletados)
        .await?;
    Ok(Json(fornecedor))
}

/// POST /fornecedores
async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<CreateFornecedorInput>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_acao(&state, modulos::FORNECEDORES, Acao::Criar).await?;
    let fornecedor = FornecedorRepository::new(state.conn())
        .create(&auth.ator(), input)
        .await?;
    info!(fornecedor_id = %fornecedor.id, "fornecedor created");
    Ok((StatusCode::CREATED, Json(fornecedor)))
}

/// PUT /fornecedores/{id} - Partial update.
async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateFornecedorInput>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_acao(&state, modulos::FORNECEDORES, Acao::Editar).await?;
    let fornecedor = FornecedorRepository::new(state.conn())
        .update(&auth.ator(), id, input)
        .await?;
    info!(fornecedor_id = %id, "fornecedor updated");
    Ok(Json(fornecedor))
}

/// DELETE /fornecedores/{id} - Soft delete.
async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_acao(&state, modulos::FORNECEDORES, Acao::Excluir).await?;
    FornecedorRepository::new(state.conn())
        .delete(&auth.ator(), id)
        .await?;
    info!(fornecedor_id = %id, "fornecedor deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /fornecedores/{id}/restaurar
async fn restore(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_acao(&state, modulos::FORNECEDORES, Acao::Editar).await?;
    let fornecedor = FornecedorRepository::new(state.conn())
        .restore(&auth.ator(), id)
        .await?;
    info!(fornecedor_id = %id, "fornecedor restored");
    Ok(Json(fornecedor))
}
