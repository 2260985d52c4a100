//! CRM synchronization endpoints.
//!
//! All of them answer 503 `crm_desabilitado` when no provider is configured.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::{delete, post},
};
use gestor_crm::CrmProvider;
use gestor_db::repositories::{AuditoriaRepository, ClienteRepository, FornecedorRepository};
use uuid::Uuid;

use crate::crm_sync;
use crate::middleware::auth::AuthUser;
use crate::{ApiError, AppState};

/// Creates the CRM router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/crm/clientes/importar", post(importar_clientes))
        .route("/crm/clientes/{id}/sincronizar", post(sincronizar_cliente))
        .route("/crm/clientes/{id}/vinculo", delete(desvincular_cliente))
        .route(
            "/crm/fornecedores/{id}/sincronizar",
            post(sincronizar_fornecedor),
        )
}

/// Permission check plus the configured provider.
async fn provedor(state: &AppState, auth: &AuthUser) -> Result<Arc<dyn CrmProvider>, ApiError> {
    auth.exigir(state, "crm.sincronizar").await?;
    state.crm.clone().ok_or_else(ApiError::crm_desabilitado)
}

/// POST /crm/clientes/{id}/sincronizar
async fn sincronizar_cliente(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let provider = provedor(&state, &auth).await?;
    let repo = ClienteRepository::new(state.conn());
    let cliente = crm_sync::sincronizar_cliente(provider.as_ref(), &repo, &auth.ator(), id).await?;
    Ok(Json(cliente))
}

/// POST /crm/clientes/importar - Returns `{criados, atualizados, ignorados}`.
async fn importar_clientes(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let provider = provedor(&state, &auth).await?;
    let repo = ClienteRepository::new(state.conn());
    let auditoria = AuditoriaRepository::new(state.conn());
    let resumo =
        crm_sync::importar_clientes(provider.as_ref(), &repo, &auditoria, &auth.ator()).await?;
    Ok(Json(resumo))
}

/// DELETE /crm/clientes/{id}/vinculo
async fn desvincular_cliente(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let provider = provedor(&state, &auth).await?;
    let repo = ClienteRepository::new(state.conn());
    let cliente = crm_sync::desvincular_cliente(provider.as_ref(), &repo, &auth.ator(), id).await?;
    Ok(Json(cliente))
}

/// POST /crm/fornecedores/{id}/sincronizar
async fn sincronizar_fornecedor(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let provider = provedor(&state, &auth).await?;
    let repo = FornecedorRepository::new(state.conn());
    let fornecedor =
        crm_sync::sincronizar_fornecedor(provider.as_ref(), &repo, &auth.ator(), id).await?;
    Ok(Json(fornecedor))
}
