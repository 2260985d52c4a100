//! Levels, roles and the permission catalog.
//!
//! Every write is subject to the level rule: nobody manages a level or a role whose
//! degree is above their own.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};
use gestor_core::permissions::{Acao, modulos};
use gestor_db::repositories::{
    CreateNivelInput, CreateRoleInput, RbacRepository, RoleFilter, UpdateNivelInput,
    UpdateRoleInput,
};
use gestor_shared::PageRequest;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::extractors::DetalheQuery;
use crate::middleware::auth::AuthUser;
use crate::{ApiError, AppState};

/// Creates the RBAC router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/niveis", get(list_niveis).post(create_nivel))
        .route("/niveis/{id}", put(update_nivel).delete(delete_nivel))
        .route("/roles", get(list_roles).post(create_role))
        .route(
            "/roles/{id}",
            get(get_role).put(update_role).delete(delete_role),
        )
        .route("/roles/{id}/restaurar", post(restore_role))
        .route(
            "/roles/{id}/permissoes",
            get(get_permissoes).put(put_permissoes),
        )
        .route("/permissoes", get(list_permissoes))
}

/// Body of `PUT /roles/{id}/permissoes`.
#[derive(Debug, Deserialize)]
struct PermissoesRequest {
    permissoes: Vec<String>,
}

/// Permission codes of a role.
#[derive(Debug, Serialize)]
struct PermissoesResponse {
    role_id: Uuid,
    permissoes: Vec<String>,
}

// ============================================================================
// Niveis
// ============================================================================

/// GET /niveis - Highest degree first.
async fn list_niveis(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_acao(&state, modulos::NIVEIS, Acao::Visualizar)
        .await?;
    Ok(Json(RbacRepository::new(state.conn()).list_niveis().await?))
}

/// POST /niveis
async fn create_nivel(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<CreateNivelInput>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_acao(&state, modulos::NIVEIS, Acao::Criar).await?;
    auth.exigir_grau(input.grau)?;
    let nivel = RbacRepository::new(state.conn())
        .create_nivel(&auth.ator(), input)
        .await?;
    info!(nivel_id = %nivel.id, grau = nivel.grau, "nivel created");
    Ok((StatusCode::CREATED, Json(nivel)))
}

/// PUT /niveis/{id}
async fn update_nivel(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateNivelInput>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_acao(&state, modulos::NIVEIS, Acao::Editar).await?;
    let repo = RbacRepository::new(state.conn());
    auth.exigir_grau(repo.find_nivel(id).await?.grau)?;
    if let Some(grau) = input.grau {
        auth.exigir_grau(grau)?;
    }
    let nivel = repo.update_nivel(&auth.ator(), id, input).await?;
    info!(nivel_id = %id, "nivel updated");
    Ok(Json(nivel))
}

/// DELETE /niveis/{id} - Fails while roles use the level.
async fn delete_nivel(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_acao(&state, modulos::NIVEIS, Acao::Excluir).await?;
    let repo = RbacRepository::new(state.conn());
    auth.exigir_grau(repo.find_nivel(id).await?.grau)?;
    repo.delete_nivel(&auth.ator(), id).await?;
    info!(nivel_id = %id, "nivel deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Roles
// ============================================================================

/// GET /roles
async fn list_roles(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(page): Query<PageRequest>,
    Query(filter): Query<RoleFilter>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_listagem(&state, modulos::ROLES, filter.incluir_deletados)
        .await?;
    let pagina = RbacRepository::new(state.conn())
        .list_roles(&filter, page)
        .await?;
    Ok(Json(pagina))
}

/// GET /roles/{id} - Role with its level and permission codes.
async fn get_role(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Query(query): Query<DetalheQuery>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_listagem(&state, modulos::ROLES, query.incluir_deletados)
        .await?;
    let role = RbacRepository::new(state.conn())
        .role_detalhe(id, query.incluir_deletados)
        .await?;
    Ok(Json(role))
}

/// POST /roles
async fn create_role(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<CreateRoleInput>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_acao(&state, modulos::ROLES, Acao::Criar).await?;
    let repo = RbacRepository::new(state.conn());
    auth.exigir_grau(repo.find_nivel(input.nivel_id).await?.grau)?;
    let role = repo.create_role(&auth.ator(), input).await?;
    info!(role_id = %role.id, nome = %role.nome, "role created");
    Ok((StatusCode::CREATED, Json(role)))
}

/// PUT /roles/{id}
async fn update_role(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateRoleInput>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_acao(&state, modulos::ROLES, Acao::Editar).await?;
    let repo = RbacRepository::new(state.conn());
    auth.exigir_grau(repo.grau_do_role(id).await?)?;
    if let Some(nivel_id) = input.nivel_id {
        auth.exigir_grau(repo.find_nivel(nivel_id).await?.grau)?;
    }
    let role = repo.update_role(&auth.ator(), id, input).await?;
    info!(role_id = %id, "role updated");
    Ok(Json(role))
}

/// DELETE /roles/{id} - Fails while active colaboradores hold the role.
async fn delete_role(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_acao(&state, modulos::ROLES, Acao::Excluir).await?;
    let repo = RbacRepository::new(state.conn());
    auth.exigir_grau(repo.grau_do_role(id).await?)?;
    repo.delete_role(&auth.ator(), id).await?;
    info!(role_id = %id, "role deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /roles/{id}/restaurar
async fn restore_role(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_acao(&state, modulos::ROLES, Acao::Editar).await?;
    let repo = RbacRepository::new(state.conn());
    auth.exigir_grau(repo.grau_do_role(id).await?)?;
    let role = repo.restore_role(&auth.ator(), id).await?;
    info!(role_id = %id, "role restored");
    Ok(Json(role))
}

/// GET /roles/{id}/permissoes
async fn get_permissoes(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_acao(&state, modulos::ROLES, Acao::Visualizar)
        .await?;
    let permissoes = RbacRepository::new(state.conn())
        .permissoes_do_role(id)
        .await?
        .into_iter()
        .map(|p| p.codigo)
        .collect();
    Ok(Json(PermissoesResponse {
        role_id: id,
        permissoes,
    }))
}

/// PUT /roles/{id}/permissoes - Replaces the whole set.
async fn put_permissoes(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<PermissoesRequest>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_acao(&state, modulos::ROLES, Acao::Editar).await?;
    let repo = RbacRepository::new(state.conn());
    auth.exigir_grau(repo.grau_do_role(id).await?)?;
    let permissoes = repo
        .substituir_permissoes(&auth.ator(), id, &payload.permissoes)
        .await?;
    info!(role_id = %id, total = permissoes.len(), "role permissions replaced");
    Ok(Json(PermissoesResponse {
        role_id: id,
        permissoes,
    }))
}

/// GET /permissoes - The synchronized catalog.
async fn list_permissoes(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_acao(&state, modulos::ROLES, Acao::Visualizar)
        .await?;
    Ok(Json(RbacRepository::new(state.conn()).list_permissoes().await?))
}
