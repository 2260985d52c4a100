//! Payment method routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use gestor_core::permissions::{Acao, modulos};
use gestor_db::repositories::{CreateFormaPagamentoInput, FormaPagamentoFilter, FormaPagamentoRepository, UpdateFormaPagamentoInput};
use gestor_shared::PageRequest;
use tracing::info;
use uuid::Uuid;

use crate::extractors::DetalheQuery;
use crate::middleware::auth::AuthUser;
use crate::{ApiError, AppState};

/// Creates the formas-pagamento router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/formas-pagamento", get(list).post(create))
        .route("/formas-pagamento/{id}", get(get_one).put(update).delete(delete))
        .route("/formas-pagamento/{id}/restaurar", post(restore))
}

/// GET /formas-pagamento - List payment methods.
async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(page): Query<PageRequest>,
    Query(filter): Query<FormaPagamentoFilter>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_listagem(&state, modulos::FORMAS_PAGAMENTO, filter.incluir_deletados)
        .await?;
    let pagina = FormaPagamentoRepository::new(state.conn()).list(&filter, page).await?;
    Ok(Json(pagina))
}

/// GET /formas-pagamento/{id}
async fn get_one(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Query(query): Query<DetalheQuery>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_listagem(&state, modulos::FORMAS_PAGAMENTO, query.incluir_deletados)
        .await?;
    let forma = FormaPagamentoRepository::new(state.conn())
        .find(id, query.incluir_deletados)
        .await?;
    Ok(Json(forma))
}

/// POST /formas-pagamento
async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<CreateFormaPagamentoInput>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_acao(&state, modulos::FORMAS_PAGAMENTO, Acao::Criar).await?;
    let forma = FormaPagamentoRepository::new(state.conn())
        .create(&auth.ator(), input)
        .await?;
    info!(forma_id = %forma.id, "forma created");
    Ok((StatusCode::CREATED, Json(forma)))
}

/// PUT /formas-pagamento/{id} - Partial update.
async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateFormaPagamentoInput>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_acao(&state, modulos::FORMAS_PAGAMENTO, Acao::Editar).await?;
    let forma = FormaPagamentoRepository::new(state.conn())
        .update(&auth.ator(), id, input)
        .await?;
    info!(forma_id = %id, "forma updated");
    Ok(Json(forma))
}

/// DELETE /formas-pagamento/{id} - Soft delete.
async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_acao(&state, modulos::FORMAS_PAGAMENTO, Acao::Excluir).await?;
    FormaPagamentoRepository::new(state.conn())
        .delete(&auth.ator(), id)
        .await?;
    info!(forma_id = %id, "forma deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /formas-pagamento/{id}/restaurar
async fn restore(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_acao(&state, modulos::FORMAS_PAGAMENTO, Acao::Editar).await?;
    let forma = FormaPagamentoRepository::new(state.conn())
        .restore(&auth.ator(), id)
        .await?;
    info!(forma_id = %id, "forma restored");
    Ok(Json(forma))
}
