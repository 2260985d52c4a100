//! Carrier (transportadora) routes.
//!
//! Carrier, contacts and addresses are written together; an update that sends
//! `contatos` or `enderecos` replaces that whole collection.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use gestor_core::permissions::{Acao, modulos};
use gestor_db::repositories::{CreateTransportadoraInput, TransportadoraFilter, TransportadoraRepository, UpdateTransportadoraInput};
use gestor_shared::PageRequest;
use tracing::info;
use uuid::Uuid;

use crate::extractors::DetalheQuery;
use crate::middleware::auth::AuthUser;
use crate::{ApiError, AppState};

/// Creates the transportadoras router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/transportadoras", get(list).post(create))
        .route("/transportadoras/{id}", get(get_one).put(update).delete(delete))
        .route("/transportadoras/{id}/restaurar", post(restore))
}

/// GET /transportadoras - List carriers.
async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(page): Query<PageRequest>,
    Query(filter): Query<TransportadoraFilter>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_listagem(&state, modulos::TRANSPORTADORAS, filter.incluir_deletados)
        .await?;
    let pagina = TransportadoraRepository::new(state.conn()).list(&filter, page).await?;
    Ok(Json(pagina))
}

/// GET /transportadoras/{id}
async fn get_one(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Query(query): Query<DetalheQuery>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_listagem(&state, modulos::TRANSPORTADORAS, query.incluir_deletados)
        .await?;
    let transportadora = TransportadoraRepository::new(state.conn())
        .find(id, query.incluir_deletados)
        .await?;
    Ok(Json(transportadora))
}

/// POST /transportadoras
async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<CreateTransportadoraInput>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_acao(&state, modulos::TRANSPORTADORAS, Acao::Criar).await?;
    let transportadora = TransportadoraRepository::new(state.conn())
        .create(&auth.ator(), input)
        .await?;
    info!(transportadora_id = %transportadora.transportadora.id, "transportadora created");
    Ok((StatusCode::CREATED, Json(transportadora)))
}

/// PUT /transportadoras/{id} - Partial update; child collections are replaced when present.
async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateTransportadoraInput>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_acao(&state, modulos::TRANSPORTADORAS, Acao::Editar).await?;
    let transportadora = TransportadoraRepository::new(state.conn())
        .update(&auth.ator(), id, input)
        .await?;
    info!(transportadora_id = %id, "transportadora updated");
    Ok(Json(transportadora))
}

/// DELETE /transportadoras/{id} - Soft delete.
async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_acao(&state, modulos::TRANSPORTADORAS, Acao::Excluir).await?;
    TransportadoraRepository::new(state.conn())
        .delete(&auth.ator(), id)
        .await?;
    info!(transportadora_id = %id, "transportadora deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /transportadoras/{id}/restaurar
async fn restore(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_acao(&state, modulos::TRANSPORTADORAS, Acao::Editar).await?;
    let transportadora = TransportadoraRepository::new(state.conn())
        .restore(&auth.ator(), id)
        .await?;
    info!(transportadora_id = %id, "transportadora restored");
    Ok(Json(transportadora))
}
