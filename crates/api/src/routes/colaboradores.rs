//! Colaborador (employee) routes.
//!
//! Besides the module permission, writes obey the level rule: the target's role
//! (current and requested) may not sit above the caller's own level.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use gestor_core::permissions::{Acao, modulos};
use gestor_db::repositories::{
    ColaboradorFilter, ColaboradorRepository, CreateColaboradorInput, RbacRepository,
    SessionRepository, UpdateColaboradorInput,
};
use gestor_shared::PageRequest;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::extractors::DetalheQuery;
use crate::middleware::auth::AuthUser;
use crate::{ApiError, AppState};

/// Creates the colaboradores router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/colaboradores", get(list).post(create))
        .route(
            "/colaboradores/{id}",
            get(get_one).put(update).delete(delete),
        )
        .route("/colaboradores/{id}/restaurar", post(restore))
        .route("/colaboradores/{id}/redefinir-senha", post(redefinir_senha))
}

/// Body of `POST /colaboradores/{id}/redefinir-senha`.
#[derive(Debug, Deserialize)]
struct RedefinirSenhaRequest {
    nova_senha: String,
}

/// Applies the level rule to the role a colaborador has (or will have).
async fn exigir_grau_do_role(
    state: &AppState,
    auth: &AuthUser,
    role_id: Uuid,
) -> Result<(), ApiError> {
    let grau = RbacRepository::new(state.conn()).grau_do_role(role_id).await?;
    auth.exigir_grau(grau)
}

/// Level check against the role a colaborador currently holds.
async fn exigir_grau_do_colaborador(
    state: &AppState,
    auth: &AuthUser,
    id: Uuid,
) -> Result<(), ApiError> {
    let alvo = ColaboradorRepository::new(state.conn()).find(id, true).await?;
    exigir_grau_do_role(state, auth, alvo.role_id).await
}

/// GET /colaboradores
async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(page): Query<PageRequest>,
    Query(filter): Query<ColaboradorFilter>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_listagem(&state, modulos::COLABORADORES, filter.incluir_deletados)
        .await?;
    let pagina = ColaboradorRepository::new(state.conn())
        .list(&filter, page)
        .await?;
    Ok(Json(pagina))
}

/// GET /colaboradores/{id}
async fn get_one(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Query(query): Query<DetalheQuery>,
) -> Result<impl IntoResponse, ApiError> {
    if id != auth.colaborador_id() {
        auth.exigir_listagem(&state, modulos::COLABORADORES, query.incluir_deletados)
            .await?;
    }
    let colaborador = ColaboradorRepository::new(state.conn())
        .find(id, query.incluir_deletados)
        .await?;
    Ok(Json(colaborador))
}

/// POST /colaboradores
async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<CreateColaboradorInput>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_acao(&state, modulos::COLABORADORES, Acao::Criar)
        .await?;
    exigir_grau_do_role(&state, &auth, input.role_id).await?;

    let colaborador = ColaboradorRepository::new(state.conn())
        .create(&auth.ator(), input)
        .await?;
    info!(colaborador_id = %colaborador.id, "colaborador created");
    Ok((StatusCode::CREATED, Json(colaborador)))
}

/// PUT /colaboradores/{id}
async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateColaboradorInput>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_acao(&state, modulos::COLABORADORES, Acao::Editar)
        .await?;
    exigir_grau_do_colaborador(&state, &auth, id).await?;
    if let Some(role_id) = input.role_id {
        exigir_grau_do_role(&state, &auth, role_id).await?;
    }

    let desativado = input.ativo == Some(false);
    let colaborador = ColaboradorRepository::new(state.conn())
        .update(&auth.ator(), id, input)
        .await?;
    if desativado {
        SessionRepository::new(state.conn()).revoke_all(id, None).await?;
    }
    info!(colaborador_id = %id, "colaborador updated");
    Ok(Json(colaborador))
}

/// DELETE /colaboradores/{id}
async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_acao(&state, modulos::COLABORADORES, Acao::Excluir)
        .await?;
    if id == auth.colaborador_id() {
        return Err(ApiError::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "business_rule_violation",
            "Nao e possivel excluir o proprio usuario",
        ));
    }
    exigir_grau_do_colaborador(&state, &auth, id).await?;

    ColaboradorRepository::new(state.conn())
        .delete(&auth.ator(), id)
        .await?;
    SessionRepository::new(state.conn()).revoke_all(id, None).await?;
    info!(colaborador_id = %id, "colaborador deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /colaboradores/{id}/restaurar
async fn restore(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_acao(&state, modulos::COLABORADORES, Acao::Editar)
        .await?;
    exigir_grau_do_colaborador(&state, &auth, id).await?;

    let colaborador = ColaboradorRepository::new(state.conn())
        .restore(&auth.ator(), id)
        .await?;
    info!(colaborador_id = %id, "colaborador restored");
    Ok(Json(colaborador))
}

/// POST /colaboradores/{id}/redefinir-senha - Admin password reset; ends all sessions.
async fn redefinir_senha(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<RedefinirSenhaRequest>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir(&state, "colaboradores.redefinir_senha").await?;
    exigir_grau_do_colaborador(&state, &auth, id).await?;

    ColaboradorRepository::new(state.conn())
        .alterar_senha(&auth.ator(), id, &payload.nova_senha)
        .await?;
    let revogadas = SessionRepository::new(state.conn()).revoke_all(id, None).await?;
    info!(colaborador_id = %id, revogadas, "password reset");
    Ok(StatusCode::NO_CONTENT)
}
