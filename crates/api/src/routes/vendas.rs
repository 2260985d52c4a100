//! Sales routes.
//!
//! A sale is created with its items and receivable schedule in one go; after that
//! it moves through `aberta -> concluida` or `-> cancelada`.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use gestor_core::permissions::{Acao, modulos};
use gestor_db::repositories::{CreateVendaInput, UpdateVendaInput, VendaFilter, VendaRepository};
use gestor_shared::PageRequest;
use tracing::info;
use uuid::Uuid;

use crate::extractors::DetalheQuery;
use crate::middleware::auth::AuthUser;
use crate::{ApiError, AppState};

/// Creates the vendas router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/vendas", get(list).post(create))
        .route("/vendas/{id}", get(get_one).put(update).delete(delete))
        .route("/vendas/{id}/restaurar", post(restore))
        .route("/vendas/{id}/concluir", post(concluir))
        .route("/vendas/{id}/cancelar", post(cancelar))
}

/// GET /vendas - Filters: `cliente_id`, `colaborador_id`, `status`, `data_inicio`, `data_fim`.
async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(page): Query<PageRequest>,
    Query(filter): Query<VendaFilter>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_listagem(&state, modulos::VENDAS, filter.incluir_deletados)
        .await?;
    let pagina = VendaRepository::new(state.conn()).list(&filter, page).await?;
    Ok(Json(pagina))
}

/// GET /vendas/{id} - Sale with items and receivables.
async fn get_one(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Query(query): Query<DetalheQuery>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_listagem(&state, modulos::VENDAS, query.incluir_deletados)
        .await?;
    let venda = VendaRepository::new(state.conn())
        .find(id, query.incluir_deletados)
        .await?;
    Ok(Json(venda))
}

/// POST /vendas
async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<CreateVendaInput>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_acao(&state, modulos::VENDAS, Acao::Criar).await?;
    let venda = VendaRepository::new(state.conn())
        .create(&auth.ator(), input)
        .await?;
    info!(
        venda_id = %venda.venda.id,
        numero = venda.venda.numero,
        total = %venda.venda.total,
        parcelas = venda.recebimentos.len(),
        "venda created"
    );
    Ok((StatusCode::CREATED, Json(venda)))
}

/// PUT /vendas/{id}
async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateVendaInput>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_acao(&state, modulos::VENDAS, Acao::Editar).await?;
    let venda = VendaRepository::new(state.conn())
        .update(&auth.ator(), id, input)
        .await?;
    info!(venda_id = %id, "venda updated");
    Ok(Json(venda))
}

/// DELETE /vendas/{id} - Only cancelled sales.
async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_acao(&state, modulos::VENDAS, Acao::Excluir).await?;
    VendaRepository::new(state.conn())
        .delete(&auth.ator(), id)
        .await?;
    info!(venda_id = %id, "venda deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /vendas/{id}/restaurar
async fn restore(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_acao(&state, modulos::VENDAS, Acao::Editar).await?;
    let venda = VendaRepository::new(state.conn())
        .restore(&auth.ator(), id)
        .await?;
    info!(venda_id = %id, "venda restored");
    Ok(Json(venda))
}

/// POST /vendas/{id}/concluir
async fn concluir(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir(&state, "vendas.concluir").await?;
    let venda = VendaRepository::new(state.conn())
        .concluir(&auth.ator(), id)
        .await?;
    info!(venda_id = %id, "venda completed");
    Ok(Json(venda))
}

/// POST /vendas/{id}/cancelar - Cancels the sale and its pending receivables.
async fn cancelar(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir(&state, "vendas.cancelar").await?;
    let venda = VendaRepository::new(state.conn())
        .cancelar(&auth.ator(), id)
        .await?;
    info!(venda_id = %id, "venda cancelled");
    Ok(Json(venda))
}
