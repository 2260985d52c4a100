//! Fleet routes: vehicles, fuel fills and the consumption report.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::NaiveDate;
use gestor_core::permissions::{Acao, modulos};
use gestor_db::repositories::{
    AbastecimentoFilter, CreateAbastecimentoInput, CreateVeiculoInput, FrotaRepository,
    UpdateVeiculoInput, VeiculoFilter,
};
use gestor_shared::PageRequest;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::extractors::DetalheQuery;
use crate::middleware::auth::AuthUser;
use crate::{ApiError, AppState};

/// Creates the fleet router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/veiculos", get(list_veiculos).post(create_veiculo))
        .route(
            "/veiculos/{id}",
            get(get_veiculo).put(update_veiculo).delete(delete_veiculo),
        )
        .route("/veiculos/{id}/restaurar", post(restore_veiculo))
        .route(
            "/abastecimentos",
            get(list_abastecimentos).post(create_abastecimento),
        )
        .route(
            "/abastecimentos/{id}",
            get(get_abastecimento).delete(delete_abastecimento),
        )
        .route("/relatorios/frota/combustivel", get(relatorio_combustivel))
}

/// Query of the fuel report.
#[derive(Debug, Deserialize)]
struct RelatorioQuery {
    inicio: NaiveDate,
    fim: NaiveDate,
    veiculo_id: Option<Uuid>,
}

// ============================================================================
// Veiculos
// ============================================================================

/// GET /veiculos
async fn list_veiculos(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(page): Query<PageRequest>,
    Query(filter): Query<VeiculoFilter>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_listagem(&state, modulos::VEICULOS, filter.incluir_deletados)
        .await?;
    let pagina = FrotaRepository::new(state.conn())
        .list_veiculos(&filter, page)
        .await?;
    Ok(Json(pagina))
}

/// GET /veiculos/{id}
async fn get_veiculo(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Query(query): Query<DetalheQuery>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_listagem(&state, modulos::VEICULOS, query.incluir_deletados)
        .await?;
    let veiculo = FrotaRepository::new(state.conn())
        .find_veiculo(id, query.incluir_deletados)
        .await?;
    Ok(Json(veiculo))
}

/// POST /veiculos
async fn create_veiculo(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<CreateVeiculoInput>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_acao(&state, modulos::VEICULOS, Acao::Criar).await?;
    let veiculo = FrotaRepository::new(state.conn())
        .create_veiculo(&auth.ator(), input)
        .await?;
    info!(veiculo_id = %veiculo.id, placa = %veiculo.placa, "veiculo created");
    Ok((StatusCode::CREATED, Json(veiculo)))
}

/// PUT /veiculos/{id}
async fn update_veiculo(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateVeiculoInput>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_acao(&state, modulos::VEICULOS, Acao::Editar).await?;
    let veiculo = FrotaRepository::new(state.conn())
        .update_veiculo(&auth.ator(), id, input)
        .await?;
    info!(veiculo_id = %id, "veiculo updated");
    Ok(Json(veiculo))
}

/// DELETE /veiculos/{id}
async fn delete_veiculo(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_acao(&state, modulos::VEICULOS, Acao::Excluir)
        .await?;
    FrotaRepository::new(state.conn())
        .delete_veiculo(&auth.ator(), id)
        .await?;
    info!(veiculo_id = %id, "veiculo deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /veiculos/{id}/restaurar
async fn restore_veiculo(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_acao(&state, modulos::VEICULOS, Acao::Editar).await?;
    let veiculo = FrotaRepository::new(state.conn())
        .restore_veiculo(&auth.ator(), id)
        .await?;
    info!(veiculo_id = %id, "veiculo restored");
    Ok(Json(veiculo))
}

// ============================================================================
// Abastecimentos
// ============================================================================

/// GET /abastecimentos
async fn list_abastecimentos(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(page): Query<PageRequest>,
    Query(filter): Query<AbastecimentoFilter>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_listagem(&state, modulos::ABASTECIMENTOS, filter.incluir_deletados)
        .await?;
    let pagina = FrotaRepository::new(state.conn())
        .list_abastecimentos(&filter, page)
        .await?;
    Ok(Json(pagina))
}

/// GET /abastecimentos/{id}
async fn get_abastecimento(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Query(query): Query<DetalheQuery>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_listagem(&state, modulos::ABASTECIMENTOS, query.incluir_deletados)
        .await?;
    let abastecimento = FrotaRepository::new(state.conn())
        .find_abastecimento(id, query.incluir_deletados)
        .await?;
    Ok(Json(abastecimento))
}

/// POST /abastecimentos - The odometer may not go backwards for the vehicle.
async fn create_abastecimento(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<CreateAbastecimentoInput>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_acao(&state, modulos::ABASTECIMENTOS, Acao::Criar)
        .await?;
    let abastecimento = FrotaRepository::new(state.conn())
        .create_abastecimento(&auth.ator(), input)
        .await?;
    info!(
        abastecimento_id = %abastecimento.id,
        veiculo_id = %abastecimento.veiculo_id,
        litros = %abastecimento.litros,
        "abastecimento recorded"
    );
    Ok((StatusCode::CREATED, Json(abastecimento)))
}

/// DELETE /abastecimentos/{id}
async fn delete_abastecimento(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_acao(&state, modulos::ABASTECIMENTOS, Acao::Excluir)
        .await?;
    FrotaRepository::new(state.conn())
        .delete_abastecimento(&auth.ator(), id)
        .await?;
    info!(abastecimento_id = %id, "abastecimento deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Relatorio
// ============================================================================

/// GET /relatorios/frota/combustivel?inicio&fim&veiculo_id
async fn relatorio_combustivel(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<RelatorioQuery>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir(&state, "relatorios.frota").await?;
    let linhas = FrotaRepository::new(state.conn())
        .relatorio_consumo(query.inicio, query.fim, query.veiculo_id)
        .await?;
    Ok(Json(linhas))
}
