//! Accounts receivable routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use gestor_core::permissions::{Acao, modulos};
use gestor_db::repositories::{
    BaixaInput, CreateRecebimentoInput, RecebimentoFilter, RecebimentoRepository, UpdateRecebimentoInput,
};
use gestor_shared::PageRequest;
use tracing::info;
use uuid::Uuid;

use crate::extractors::DetalheQuery;
use crate::middleware::auth::AuthUser;
use crate::{ApiError, AppState};

/// Creates the recebimentos router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/recebimentos", get(list).post(create))
        .route("/recebimentos/resumo", get(resumo))
        .route("/recebimentos/{id}", get(get_one).put(update).delete(delete))
        .route("/recebimentos/{id}/restaurar", post(restore))
        .route("/recebimentos/{id}/baixar", post(baixar))
        .route("/recebimentos/{id}/estornar", post(estornar))
        .route("/recebimentos/{id}/cancelar", post(cancelar))
}

/// GET /recebimentos - Filter by `cliente_id` or `venda_id` to see a schedule.
async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(page): Query<PageRequest>,
    Query(filter): Query<RecebimentoFilter>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_listagem(&state, modulos::RECEBIMENTOS, filter.incluir_deletados)
        .await?;
    let pagina = RecebimentoRepository::new(state.conn())
        .list(&filter, page)
        .await?;
    Ok(Json(pagina))
}

/// GET /recebimentos/resumo - Open, overdue and settled totals for the same filters.
async fn resumo(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(filter): Query<RecebimentoFilter>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_listagem(&state, modulos::RECEBIMENTOS, filter.incluir_deletados)
        .await?;
    Ok(Json(RecebimentoRepository::new(state.conn()).resumo(&filter).await?))
}

/// GET /recebimentos/{id}
async fn get_one(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Query(query): Query<DetalheQuery>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_listagem(&state, modulos::RECEBIMENTOS, query.incluir_deletados)
        .await?;
    let recebimento = RecebimentoRepository::new(state.conn())
        .find(id, query.incluir_deletados)
        .await?;
    Ok(Json(recebimento))
}

/// POST /recebimentos
async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<CreateRecebimentoInput>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_acao(&state, modulos::RECEBIMENTOS, Acao::Criar)
        .await?;
    let recebimento = RecebimentoRepository::new(state.conn())
        .create(&auth.ator(), input)
        .await?;
    info!(recebimento_id = %recebimento.registro.id, valor = %recebimento.registro.valor, "recebimento created");
    Ok((StatusCode::CREATED, Json(recebimento)))
}

/// PUT /recebimentos/{id}
async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateRecebimentoInput>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_acao(&state, modulos::RECEBIMENTOS, Acao::Editar)
        .await?;
    let recebimento = RecebimentoRepository::new(state.conn())
        .update(&auth.ator(), id, input)
        .await?;
    info!(recebimento_id = %id, "recebimento updated");
    Ok(Json(recebimento))
}

/// DELETE /recebimentos/{id} - Manual receivables only; sale installments follow their sale.
async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_acao(&state, modulos::RECEBIMENTOS, Acao::Excluir)
        .await?;
    RecebimentoRepository::new(state.conn())
        .delete(&auth.ator(), id)
        .await?;
    info!(recebimento_id = %id, "recebimento deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /recebimentos/{id}/restaurar
async fn restore(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_acao(&state, modulos::RECEBIMENTOS, Acao::Editar)
        .await?;
    let recebimento = RecebimentoRepository::new(state.conn())
        .restore(&auth.ator(), id)
        .await?;
    info!(recebimento_id = %id, "recebimento restored");
    Ok(Json(recebimento))
}

/// POST /recebimentos/{id}/baixar - Registers a full or partial receipt.
async fn baixar(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(input): Json<BaixaInput>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir(&state, "recebimentos.baixar").await?;
    let valor = input.valor;
    let recebimento = RecebimentoRepository::new(state.conn())
        .baixar(&auth.ator(), id, input)
        .await?;
    info!(recebimento_id = %id, %valor, status = %recebimento.registro.status, "recebimento settled");
    Ok(Json(recebimento))
}

/// POST /recebimentos/{id}/estornar
async fn estornar(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir(&state, "recebimentos.baixar").await?;
    let recebimento = RecebimentoRepository::new(state.conn())
        .estornar(&auth.ator(), id)
        .await?;
    Ok(Json(recebimento))
}

/// POST /recebimentos/{id}/cancelar - Only while nothing was received.
async fn cancelar(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_acao(&state, modulos::RECEBIMENTOS, Acao::Editar)
        .await?;
    let recebimento = RecebimentoRepository::new(state.conn())
        .cancelar(&auth.ator(), id)
        .await?;
    info!(recebimento_id = %id, "recebimento cancelled");
    Ok(Json(recebimento))
}
