//! Customer (cliente) routes.
//!
//! CPF is required for `tipo_pessoa = F`, CNPJ for `J`; both are stored as digits.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use gestor_core::permissions::{Acao, modulos};
use gestor_db::repositories::{CreateClienteInput, ClienteFilter, ClienteRepository, UpdateClienteInput};
use gestor_shared::PageRequest;
use tracing::info;
use uuid::Uuid;

use crate::extractors::DetalheQuery;
use crate::middleware::auth::AuthUser;
use crate::{ApiError, AppState};

/// Creates the clientes router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/clientes", get(list).post(create))
        .route("/clientes/{id}", get(get_one).put(update).delete(delete))
        .route("/clientes/{id}/restaurar", post(restore))
}

/// GET /clientes - List customers; `busca` matches name, e-mail or document.
async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(page): Query<PageRequest>,
    Query(filter): Query<ClienteFilter>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_listagem(&state, modulos::CLIENTES, filter.incluir_deletados)
        .await?;
    let pagina = ClienteRepository::new(state.conn()).list(&filter, page).await?;
    Ok(Json(pagina))
}

/// GET /clientes/{id}
async fn get_one(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Query(query): Query<DetalheQuery>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_listagem(&state, modulos::CLIENTES, query.incluir_deletados)
        .await?;
    let cliente = ClienteRepository::new(state.conn())
        .find(id, query.incluir_deletados)
        .await?;
    Ok(Json(cliente))
}

/// POST /clientes
async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<CreateClienteInput>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_acao(&state, modulos::CLIENTES, Acao::Criar).await?;
    let cliente = ClienteRepository::new(state.conn())
        .create(&auth.ator(), input)
        .await?;
    info!(cliente_id = %cliente.id, "cliente created");
    Ok((StatusCode::CREATED, Json(cliente)))
}

/// PUT /clientes/{id} - Partial update; `null` clears optional fields.
async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateClienteInput>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_acao(&state, modulos::CLIENTES, Acao::Editar).await?;
    let cliente = ClienteRepository::new(state.conn())
        .update(&auth.ator(), id, input)
        .await?;
    info!(cliente_id = %id, "cliente updated");
    Ok(Json(cliente))
}

/// DELETE /clientes/{id} - Soft delete.
async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_acao(&state, modulos::CLIENTES, Acao::Excluir).await?;
    ClienteRepository::new(state.conn())
        .delete(&auth.ator(), id)
        .await?;
    info!(cliente_id = %id, "cliente deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /clientes/{id}/restaurar
async fn restore(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_acao(&state, modulos::CLIENTES, Acao::Editar).await?;
    let cliente = ClienteRepository::new(state.conn())
        .restore(&auth.ator(), id)
        .await?;
    info!(cliente_id = %id, "cliente restored");
    Ok(Json(cliente))
}
