//! Accounts payable routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use gestor_core::permissions::{Acao, modulos};
use gestor_db::repositories::{
    BaixaInput, CreatePagamentoInput, PagamentoFilter, PagamentoRepository, UpdatePagamentoInput,
};
use gestor_shared::PageRequest;
use tracing::info;
use uuid::Uuid;

use crate::extractors::DetalheQuery;
use crate::middleware::auth::AuthUser;
use crate::{ApiError, AppState};

/// Creates the pagamentos router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/pagamentos", get(list).post(create))
        .route("/pagamentos/resumo", get(resumo))
        .route("/pagamentos/{id}", get(get_one).put(update).delete(delete))
        .route("/pagamentos/{id}/restaurar", post(restore))
        .route("/pagamentos/{id}/baixar", post(baixar))
        .route("/pagamentos/{id}/estornar", post(estornar))
        .route("/pagamentos/{id}/cancelar", post(cancelar))
}

/// GET /pagamentos - Each item carries its derived `situacao`.
async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(page): Query<PageRequest>,
    Query(filter): Query<PagamentoFilter>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_listagem(&state, modulos::PAGAMENTOS, filter.incluir_deletados)
        .await?;
    let pagina = PagamentoRepository::new(state.conn())
        .list(&filter, page)
        .await?;
    Ok(Json(pagina))
}

/// GET /pagamentos/resumo - Open, overdue and settled totals for the same filters.
async fn resumo(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(filter): Query<PagamentoFilter>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_listagem(&state, modulos::PAGAMENTOS, filter.incluir_deletados)
        .await?;
    Ok(Json(PagamentoRepository::new(state.conn()).resumo(&filter).await?))
}

/// GET /pagamentos/{id}
async fn get_one(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Query(query): Query<DetalheQuery>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_listagem(&state, modulos::PAGAMENTOS, query.incluir_deletados)
        .await?;
    let pagamento = PagamentoRepository::new(state.conn())
        .find(id, query.incluir_deletados)
        .await?;
    Ok(Json(pagamento))
}

/// POST /pagamentos
async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<CreatePagamentoInput>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_acao(&state, modulos::PAGAMENTOS, Acao::Criar)
        .await?;
    let pagamento = PagamentoRepository::new(state.conn())
        .create(&auth.ator(), input)
        .await?;
    info!(pagamento_id = %pagamento.registro.id, valor = %pagamento.registro.valor, "pagamento created");
    Ok((StatusCode::CREATED, Json(pagamento)))
}

/// PUT /pagamentos/{id}
async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdatePagamentoInput>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_acao(&state, modulos::PAGAMENTOS, Acao::Editar)
        .await?;
    let pagamento = PagamentoRepository::new(state.conn())
        .update(&auth.ator(), id, input)
        .await?;
    info!(pagamento_id = %id, "pagamento updated");
    Ok(Json(pagamento))
}

/// DELETE /pagamentos/{id}
async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_acao(&state, modulos::PAGAMENTOS, Acao::Excluir)
        .await?;
    PagamentoRepository::new(state.conn())
        .delete(&auth.ator(), id)
        .await?;
    info!(pagamento_id = %id, "pagamento deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /pagamentos/{id}/restaurar
async fn restore(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_acao(&state, modulos::PAGAMENTOS, Acao::Editar)
        .await?;
    let pagamento = PagamentoRepository::new(state.conn())
        .restore(&auth.ator(), id)
        .await?;
    info!(pagamento_id = %id, "pagamento restored");
    Ok(Json(pagamento))
}

/// POST /pagamentos/{id}/baixar - Registers a full or partial payment.
async fn baixar(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(input): Json<BaixaInput>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir(&state, "pagamentos.baixar").await?;
    let valor = input.valor;
    let pagamento = PagamentoRepository::new(state.conn())
        .baixar(&auth.ator(), id, input)
        .await?;
    info!(pagamento_id = %id, %valor, status = %pagamento.registro.status, "pagamento settled");
    Ok(Json(pagamento))
}

/// POST /pagamentos/{id}/estornar
async fn estornar(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir(&state, "pagamentos.baixar").await?;
    let pagamento = PagamentoRepository::new(state.conn())
        .estornar(&auth.ator(), id)
        .await?;
    Ok(Json(pagamento))
}

/// POST /pagamentos/{id}/cancelar - Only while nothing was paid.
async fn cancelar(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_acao(&state, modulos::PAGAMENTOS, Acao::Editar)
        .await?;
    let pagamento = PagamentoRepository::new(state.conn())
        .cancelar(&auth.ator(), id)
        .await?;
    info!(pagamento_id = %id, "pagamento cancelled");
    Ok(Json(pagamento))
}
