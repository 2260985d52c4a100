//! Store information (`loja_informacoes`), a single row.

use axum::{Json, Router, extract::State, response::IntoResponse, routing::get};
use gestor_core::permissions::{Acao, modulos};
use gestor_db::repositories::{LojaInput, LojaRepository};
use gestor_shared::AppError;
use tracing::info;

use crate::middleware::auth::AuthUser;
use crate::{ApiError, AppState};

/// Creates the loja router.
pub fn routes() -> Router<AppState> {
    Router::new().route("/loja", get(get_loja).put(put_loja))
}

/// GET /loja
async fn get_loja(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_acao(&state, modulos::LOJA, Acao::Visualizar).await?;
    let loja = LojaRepository::new(state.conn())
        .get()
        .await?
        .ok_or_else(|| AppError::NotFound("loja nao configurada".to_string()))?;
    Ok(Json(loja))
}

/// PUT /loja - Creates or replaces the store data.
async fn put_loja(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<LojaInput>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_acao(&state, modulos::LOJA, Acao::Editar).await?;
    let loja = LojaRepository::new(state.conn())
        .upsert(&auth.ator(), input)
        .await?;
    info!(loja_id = %loja.id, "store information saved");
    Ok(Json(loja))
}
